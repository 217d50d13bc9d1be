//! Defines the HTTP routes specifically for authentication.
//!
//! Mounted under `/api/users` alongside the user management routes.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{login, logout, me, register};
use crate::AppState;

pub fn auth_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login).delete(logout))
        .route("/me", get(me))
}
