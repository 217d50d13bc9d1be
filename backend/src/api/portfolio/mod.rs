//! Module for the portfolio summary endpoint.

pub mod handlers;

use axum::routing::get;
use axum::Router;

use crate::AppState;

pub fn portfolio_router() -> Router<AppState> {
    Router::new().route("/", get(handlers::get_portfolio))
}
