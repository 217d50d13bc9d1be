//! Central module for organizing the application's main API endpoints.
//!
//! This module acts as a top-level container for the catalog domains
//! (addresses, tokens, portfolio) and user management, excluding core
//! authentication routes which are handled separately.

pub mod address;
pub mod portfolio;
pub mod token;
pub mod user;

use walletfolio_adapters::Filter;

use crate::auth::{evaluate, AuthError, Identity, Operation};
use crate::database::queries;
use crate::errors::AppError;

/// Store filter selecting the addresses `identity` may act on with `op`.
pub(crate) fn address_scope(identity: &Identity, op: Operation) -> Result<Filter, AppError> {
    let decision = evaluate(Some(identity), op);
    queries::owner_filter(&decision).ok_or_else(|| AuthError::Unauthenticated.into())
}
