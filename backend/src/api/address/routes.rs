//! Defines the HTTP routes for the wallet address catalog.
//!
//! Mounted under `/api/addresses`; every route requires a session.

use axum::routing::get;
use axum::Router;

use super::handlers::{create_address, delete_address, get_address, list_addresses, update_address};
use crate::AppState;

pub fn address_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_addresses).post(create_address))
        .route("/:id", get(get_address).patch(update_address).delete(delete_address))
}
