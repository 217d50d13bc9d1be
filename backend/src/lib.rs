//! Walletfolio backend: an HTTP service for cataloguing wallet addresses and
//! the token balances held at them.
//!
//! [`build_router`] assembles every route over an [`AppState`]; `main.rs`
//! only loads configuration, prepares the store and serves.

pub mod api;
pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod middleware;
pub mod services;

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use walletfolio_adapters::StoreConnector;

use crate::auth::AuthService;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::services::StoreClient;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: AuthService,
    pub store: StoreClient,
}

impl AppState {
    /// State using the connector selected by the configured store URL.
    pub fn new(config: AppConfig) -> Result<Self, AppError> {
        let connector = database::connector_for(&config.store)?;
        Self::with_connector(config, connector)
    }

    pub fn with_connector(config: AppConfig, connector: Arc<dyn StoreConnector>) -> Result<Self, AppError> {
        let auth = AuthService::new(&config)?;
        let store = StoreClient::new(connector, config.store.clone());
        Ok(Self {
            config: Arc::new(config),
            auth,
            store,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let users = Router::new()
        .merge(auth::auth_router())
        .merge(api::user::user_router());

    Router::new()
        .route("/", get(root_handler))
        .route("/api/health", get(health))
        .nest("/api/users", users)
        .nest("/api/addresses", api::address::routes::address_router())
        .nest("/api/tokens", api::token::routes::token_router())
        .nest("/api/portfolio", api::portfolio::portfolio_router())
        .layer(middleware::trace_layer())
        .with_state(state)
}

async fn root_handler() -> &'static str {
    "Welcome to Walletfolio!"
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    state.store.get().await?.ping().await?;
    Ok(Json(json!({ "status": "ok" })))
}
