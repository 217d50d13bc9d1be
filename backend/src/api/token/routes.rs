//! Defines the HTTP routes for token holdings.
//!
//! Mounted under `/api/tokens`.

use axum::routing::get;
use axum::Router;

use super::handlers::{create_token, delete_token, get_token, list_tokens, update_token};
use crate::AppState;

pub fn token_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tokens).post(create_token))
        .route("/:id", get(get_token).patch(update_token).delete(delete_token))
}
