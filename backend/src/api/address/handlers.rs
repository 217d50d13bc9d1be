//! Handler functions for the wallet address catalog.
//!
//! Every handler requires a session. Reads are scoped to what the requester
//! may see; writes to an existing record outside that scope are forbidden.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use walletfolio_adapters::{Document, FindOptions, FindResult};

use crate::api::address_scope;
use crate::auth::{CurrentUser, Operation};
use crate::database::{queries, Address, ADDRESSES};
use crate::errors::AppError;
use crate::services::ownership::{bind_owner, strip_owner};
use crate::AppState;

/// Rewrites `tags` into `[{"tag": ...}]` rows.
///
/// Plain strings and `{tag}` objects are both accepted; blank tags are
/// dropped and a value that is not an array becomes empty.
pub fn normalize_tags(doc: &mut Document) {
    let Some(tags) = doc.get_mut("tags") else {
        return;
    };
    let rows = match tags.take() {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| {
                let text = match item {
                    Value::String(s) => s,
                    Value::Object(mut row) => match row.remove("tag") {
                        Some(Value::String(s)) => s,
                        _ => return None,
                    },
                    _ => return None,
                };
                let text = text.trim();
                (!text.is_empty()).then(|| json!({ "tag": text }))
            })
            .collect(),
        _ => Vec::new(),
    };
    *tags = Value::Array(rows);
}

pub async fn create_address(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let Json(mut doc) = payload?;
    address_scope(&identity, Operation::Create)?;
    normalize_tags(&mut doc);
    bind_owner(&mut doc, &identity);

    let store = state.store.get().await?;
    let address = queries::insert_address(store.as_ref(), doc).await?;
    tracing::info!(address_id = %address.id, owner = %address.owner, "address created");

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Address created successfully", "address": address })),
    ))
}

pub async fn list_addresses(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    options: Result<Query<FindOptions>, QueryRejection>,
) -> Result<Json<FindResult<Address>>, AppError> {
    let Query(options) = options.map_err(|e| AppError::BadRequest(e.body_text()))?;
    let scope = address_scope(&identity, Operation::Read)?;
    let store = state.store.get().await?;
    let page = queries::list_addresses(store.as_ref(), &scope, options).await?;
    Ok(Json(page))
}

pub async fn get_address(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let scope = address_scope(&identity, Operation::Read)?;
    let store = state.store.get().await?;
    let address = queries::find_address(store.as_ref(), &id, &scope)
        .await?
        .ok_or(AppError::NotFound("Address"))?;
    Ok(Json(json!({ "address": address })))
}

pub async fn update_address(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
    payload: Result<Json<Document>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let Json(mut patch) = payload?;
    let scope = address_scope(&identity, Operation::Update)?;
    strip_owner(&mut patch);
    normalize_tags(&mut patch);

    let store = state.store.get().await?;
    match queries::update_address(store.as_ref(), &id, &scope, patch).await? {
        Some(address) => Ok(Json(json!({ "message": "Address updated successfully", "address": address }))),
        None => Err(missing_or_forbidden(store.as_ref(), &id).await?),
    }
}

pub async fn delete_address(
    State(state): State<AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let scope = address_scope(&identity, Operation::Delete)?;
    let store = state.store.get().await?;
    match queries::delete_address(store.as_ref(), &id, &scope).await? {
        Some(address) => {
            tracing::info!(address_id = %address.id, "address deleted");
            Ok(Json(json!({ "message": "Address deleted successfully", "id": address.id })))
        }
        None => Err(missing_or_forbidden(store.as_ref(), &id).await?),
    }
}

async fn missing_or_forbidden(
    store: &dyn walletfolio_adapters::DocumentStore,
    id: &str,
) -> Result<AppError, AppError> {
    Ok(if queries::exists(store, ADDRESSES, id).await? {
        AppError::Forbidden
    } else {
        AppError::NotFound("Address")
    })
}
