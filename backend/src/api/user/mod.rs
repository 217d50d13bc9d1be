//! Module for user management API endpoints.
//!
//! Account creation on behalf of others is reserved for admins; self-service
//! registration lives in the auth routes.

pub mod handlers;

use axum::routing::post;
use axum::Router;

use crate::AppState;

pub fn user_router() -> Router<AppState> {
    Router::new().route("/", post(handlers::create_user))
}
