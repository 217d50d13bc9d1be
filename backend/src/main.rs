//! Main entry point for the Walletfolio backend.
//!
//! This file initializes tracing, loads configuration from the environment,
//! connects the record store, seeds the bootstrap admin, and serves the
//! router built in the library crate.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use walletfolio_backend::config::AppConfig;
use walletfolio_backend::errors::AppError;
use walletfolio_backend::{build_router, database, AppState};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "walletfolio_backend=debug,walletfolio_adapters=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env()?;
    let addr = config.socket_addr()?;
    let state = AppState::new(config)?;

    let store = state.store.get().await?;
    store.ping().await?;
    if let Some(admin) = &state.config.admin {
        database::bootstrap_admin(store.as_ref(), &state.auth, admin).await?;
    }

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::Config(format!("cannot bind {addr}: {e}")))?;
    tracing::info!("listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::Internal(e.to_string()))
}
