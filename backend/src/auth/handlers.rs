//! Handler functions for authentication-related API endpoints.
//!
//! These functions process incoming HTTP requests for registration, login,
//! logout and session status, parse request data, and hand off to
//! `auth::service` for the core logic.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse};
use axum::Json;

use super::middleware::session_token;
use super::models::{AuthResponse, Credentials, MessageResponse, SessionStatus};
use super::service::{clearing_cookies, session_cookie};
use crate::errors::AppError;
use crate::AppState;

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(credentials) = payload?;
    let store = state.store.get().await?;
    let (user, issued) = state.auth.register(store.as_ref(), credentials).await?;
    let cookie = session_cookie(&issued, state.auth.tokens().max_age(), state.config.secure_cookies());

    Ok((
        StatusCode::CREATED,
        [(SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Registration successful",
            user,
            exp: None,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(credentials) = payload?;
    let store = state.store.get().await?;
    let (user, issued) = state.auth.login(store.as_ref(), credentials).await?;
    let cookie = session_cookie(&issued, state.auth.tokens().max_age(), state.config.secure_cookies());

    Ok((
        [(SET_COOKIE, cookie)],
        Json(AuthResponse {
            message: "Login successful",
            user,
            exp: Some(issued.expires_at.timestamp()),
        }),
    ))
}

/// Clears the session cookie. The token itself stays valid until it expires.
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    let cookies = clearing_cookies(state.config.secure_cookies());
    (
        AppendHeaders(cookies.into_iter().map(|cookie| (SET_COOKIE, cookie))),
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    )
}

pub async fn me(State(state): State<AppState>, headers: HeaderMap) -> Result<Json<SessionStatus>, AppError> {
    let Some(token) = session_token(&headers) else {
        return Ok(Json(SessionStatus { user: None, exp: None }));
    };
    let store = state.store.get().await?;
    let (user, claims) = state.auth.resolve(store.as_ref(), &token).await?;
    Ok(Json(SessionStatus {
        user: Some(user),
        exp: Some(claims.exp),
    }))
}
