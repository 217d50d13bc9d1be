//! Module for record store connection setup and common utilities.
//!
//! This module picks the store connector for the configured URL, registers
//! the application's collection schemas with it, and seeds the bootstrap
//! admin account.

pub mod models;
pub mod queries;

use std::sync::Arc;

use walletfolio_adapters::memory::MEMORY_SCHEME;
use walletfolio_adapters::{ConnectOptions, DocumentStore, MemoryConnector, StoreConnector};

pub use models::{AccessType, Address, HistoricalValue, StorageType, Tag, Token, ADDRESSES, TOKENS, USERS};

use crate::auth::{AuthService, Role};
use crate::config::AdminBootstrap;
use crate::errors::AppError;

/// Connector for the store named by `options.url`.
pub fn connector_for(options: &ConnectOptions) -> Result<Arc<dyn StoreConnector>, AppError> {
    match options.scheme() {
        Some(MEMORY_SCHEME) => Ok(Arc::new(MemoryConnector::new(models::collections()))),
        Some(other) => Err(AppError::Config(format!("unsupported store scheme `{other}`"))),
        None => Err(AppError::Config(format!("invalid store url `{}`", options.url))),
    }
}

/// Creates the configured admin account unless a user with that email
/// already exists.
pub async fn bootstrap_admin(
    store: &dyn DocumentStore,
    auth: &AuthService,
    admin: &AdminBootstrap,
) -> Result<(), AppError> {
    if queries::find_user_by_email(store, &admin.email).await?.is_some() {
        tracing::debug!(email = %admin.email, "admin account already present");
        return Ok(());
    }
    let user = auth
        .create_user(store, &admin.email, &admin.password, Role::Admin)
        .await?;
    tracing::info!(user_id = %user.id, "bootstrap admin created");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_for_rejects_unknown_schemes() {
        assert!(connector_for(&ConnectOptions::new("memory://portfolio")).is_ok());
        assert!(matches!(
            connector_for(&ConnectOptions::new("mongodb://localhost/portfolio")),
            Err(AppError::Config(_))
        ));
        assert!(matches!(
            connector_for(&ConnectOptions::new("no-scheme")),
            Err(AppError::Config(_))
        ));
    }
}
