//! Handler functions for token holdings.
//!
//! Creating or modifying a token counts as an update of its parent address,
//! so the requester must be allowed to update that address.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use walletfolio_adapters::{Document, DocumentStore, Filter, FindOptions, FindResult};

use crate::api::address_scope;
use crate::auth::{CurrentUser, Operation};
use crate::database::{queries, Token, ADDRESSES, TOKENS};
use crate::errors::AppError;
use crate::AppState;

/// Rejects a write naming a parent address the requester may not update.
///
/// A missing or unknown address is left to store validation.
async fn check_parent(store: &dyn DocumentStore, doc: &Document, writable: &Filter) -> Result<(), AppError> {
    let Some(address_id) = doc.get("address").and_then(Value::as_str) else {
        return Ok(());
    };
    if queries::find_address(store, address_id, writable).await?.is_none()
        && queries::exists(store, ADDRESSES, address_id).await?
    {
        tracing::debug!(address_id, "token write on foreign address refused");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn create_token(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(doc) = payload?;
    let writable = address_scope(&identity, Operation::Update)?;
    let store = state.store.get().await?;
    check_parent(store.as_ref(), &doc, &writable).await?;

    let token = queries::insert_token(store.as_ref(), doc).await?;
    tracing::info!(token_id = %token.id, address_id = %token.address, "token created");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Token created successfully", "token": token })),
    ))
}

pub async fn list_tokens(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    options: Result<Query<FindOptions>, QueryRejection>,
) -> Result<Json<FindResult<Token>>, AppError> {
    let Query(options) = options.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let visible = address_scope(&identity, Operation::Read)?;
    let store = state.store.get().await?;
    let scope = queries::token_filter(store.as_ref(), &visible).await?;
    Ok(Json(queries::list_tokens(store.as_ref(), &scope, options).await?))
}

pub async fn get_token(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let visible = address_scope(&identity, Operation::Read)?;
    let store = state.store.get().await?;
    let scope = queries::token_filter(store.as_ref(), &visible).await?;
    let token = queries::find_token(store.as_ref(), &id, &scope)
        .await?
        .ok_or(AppError::NotFound("Token"))?;
    Ok(Json(json!({ "token": token })))
}

pub async fn update_token(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(patch) = payload?;
    let writable = address_scope(&identity, Operation::Update)?;
    let store = state.store.get().await?;
    let scope = queries::token_filter(store.as_ref(), &writable).await?;
    if queries::find_token(store.as_ref(), &id, &scope).await?.is_none() {
        return Err(missing_or_forbidden(store.as_ref(), &id).await?);
    }
    check_parent(store.as_ref(), &patch, &writable).await?;

    let token = queries::update_token(store.as_ref(), &id, &scope, patch)
        .await?
        .ok_or(AppError::NotFound("Token"))?;
    Ok(Json(json!({ "message": "Token updated successfully", "token": token })))
}

pub async fn delete_token(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let writable = address_scope(&identity, Operation::Delete)?;
    let store = state.store.get().await?;
    let scope = queries::token_filter(store.as_ref(), &writable).await?;
    match queries::delete_token(store.as_ref(), &id, &scope).await? {
        Some(token) => Ok(Json(json!({ "message": "Token deleted successfully", "id": token.id }))),
        None => Err(missing_or_forbidden(store.as_ref(), &id).await?),
    }
}

async fn missing_or_forbidden(store: &dyn DocumentStore, id: &str) -> Result<AppError, AppError> {
    Ok(if queries::exists(store, TOKENS, id).await? {
        AppError::Forbidden
    } else {
        AppError::NotFound("Token")
    })
}
