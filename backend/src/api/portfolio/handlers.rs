//! Handler functions for the portfolio summary endpoint.
//!
//! Loads the addresses and tokens the requester can see and hands them to
//! `services::portfolio` for aggregation.

use axum::extract::State;
use axum::Json;
use walletfolio_adapters::FindOptions;

use crate::api::address_scope;
use crate::auth::{CurrentUser, Operation};
use crate::database::queries;
use crate::errors::AppError;
use crate::services::portfolio::{summarize, Portfolio};
use crate::AppState;

/// Summary of every address and token the requester can see.
pub async fn get_portfolio(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
) -> Result<Json<Portfolio>, AppError> {
    let visible = address_scope(&identity, Operation::Read)?;
    let store = state.store.get().await?;
    let addresses = queries::list_addresses(store.as_ref(), &visible, FindOptions::unlimited()).await?;
    let token_scope = queries::token_filter(store.as_ref(), &visible).await?;
    let tokens = queries::list_tokens(store.as_ref(), &token_scope, FindOptions::unlimited()).await?;
    Ok(Json(summarize(&addresses.docs, &tokens.docs)))
}
