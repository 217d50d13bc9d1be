//! Handler functions for user management API endpoints.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use walletfolio_adapters::FieldError;

use crate::auth::{AuthError, AuthResponse, CreateUserRequest, CurrentUser, Role};
use crate::errors::AppError;
use crate::AppState;

pub async fn create_user(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    payload: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    if !identity.is_admin() {
        return Err(AppError::Forbidden);
    }
    let Json(request) = payload?;
    let role = match request.role.as_deref() {
        None => Role::User,
        Some(raw) => Role::parse(raw).ok_or_else(|| {
            AppError::Validation(vec![FieldError::new("role", "This field has an invalid selection.")])
        })?,
    };
    let (email, password) = match (request.email, request.password) {
        (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => (email, password),
        _ => return Err(AuthError::MissingCredentials.into()),
    };

    let store = state.store.get().await?;
    let user = state
        .auth
        .create_user(store.as_ref(), &email, &password, role)
        .await?;
    tracing::info!(user_id = %user.id, role = %user.role, created_by = %identity.id, "user created");

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User created successfully",
            user,
            exp: None,
        }),
    ))
}
