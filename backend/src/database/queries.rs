//! Database query functions (Data Access Objects).
//!
//! This module centralizes all direct record store operations, providing
//! typed functions over the `users`, `addresses` and `tokens` collections and
//! translating access decisions into store filters, so handlers and services
//! never build raw documents or filters themselves.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use walletfolio_adapters::{AdapterError, Document, DocumentStore, Filter, FindOptions, FindResult};

use super::models::{Address, Token, ADDRESSES, TOKENS, USERS};
use crate::auth::{Decision, Role, StoredUser, User};

type Result<T> = std::result::Result<T, AdapterError>;

/// Converts a stored document into its typed model.
pub fn from_document<T: DeserializeOwned>(doc: Document) -> Result<T> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| AdapterError::InvalidDocument(e.to_string()))
}

/// Store filter for the records of an owned collection that `decision`
/// puts in scope; `None` when nothing is.
pub fn owner_filter(decision: &Decision) -> Option<Filter> {
    match decision {
        Decision::AllowAll => Some(Filter::All),
        Decision::AllowOwned(id) => Some(Filter::equals("owner", id.as_str())),
        Decision::Deny => None,
    }
}

// ─── Users ───

pub async fn insert_user(store: &dyn DocumentStore, email: &str, hash: &str, role: Role) -> Result<User> {
    let mut doc = Document::new();
    doc.insert("email".into(), json!(email));
    doc.insert("hash".into(), json!(hash));
    doc.insert("role".into(), json!(role.as_str()));
    let created = store.create(USERS, doc).await?;
    from_document::<StoredUser>(created).map(User::from)
}

pub async fn find_user_by_email(store: &dyn DocumentStore, email: &str) -> Result<Option<StoredUser>> {
    let filter = Filter::equals("email", email.trim().to_lowercase());
    let page = store.find(USERS, &filter, FindOptions { limit: 1, page: 1 }).await?;
    page.docs.into_iter().next().map(from_document).transpose()
}

pub async fn find_user_by_id(store: &dyn DocumentStore, id: &str) -> Result<Option<User>> {
    store
        .find_by_id(USERS, id, &Filter::All)
        .await?
        .map(|doc| from_document::<StoredUser>(doc).map(User::from))
        .transpose()
}

// ─── Addresses ───

pub async fn insert_address(store: &dyn DocumentStore, doc: Document) -> Result<Address> {
    from_document(store.create(ADDRESSES, doc).await?)
}

pub async fn list_addresses(
    store: &dyn DocumentStore,
    scope: &Filter,
    options: FindOptions,
) -> Result<FindResult<Address>> {
    store.find(ADDRESSES, scope, options).await?.try_map(from_document)
}

pub async fn find_address(store: &dyn DocumentStore, id: &str, scope: &Filter) -> Result<Option<Address>> {
    store
        .find_by_id(ADDRESSES, id, scope)
        .await?
        .map(from_document)
        .transpose()
}

pub async fn update_address(
    store: &dyn DocumentStore,
    id: &str,
    scope: &Filter,
    patch: Document,
) -> Result<Option<Address>> {
    store
        .update(ADDRESSES, id, scope, patch)
        .await?
        .map(from_document)
        .transpose()
}

/// Deletes the address and every token held at it.
pub async fn delete_address(store: &dyn DocumentStore, id: &str, scope: &Filter) -> Result<Option<Address>> {
    let Some(removed) = store.delete(ADDRESSES, id, scope).await? else {
        return Ok(None);
    };
    let held = store
        .find(TOKENS, &Filter::equals("address", id), FindOptions::unlimited())
        .await?;
    for token in held.docs {
        if let Some(token_id) = token.get("id").and_then(Value::as_str) {
            store.delete(TOKENS, token_id, &Filter::All).await?;
        }
    }
    from_document(removed).map(Some)
}

/// Whether a record with `id` exists in `collection`, ignoring access scope.
pub async fn exists(store: &dyn DocumentStore, collection: &str, id: &str) -> Result<bool> {
    Ok(store.find_by_id(collection, id, &Filter::All).await?.is_some())
}

// ─── Tokens ───

/// Store filter for tokens held at addresses within `address_scope`.
pub async fn token_filter(store: &dyn DocumentStore, address_scope: &Filter) -> Result<Filter> {
    if *address_scope == Filter::All {
        return Ok(Filter::All);
    }
    let visible = store
        .find(ADDRESSES, address_scope, FindOptions::unlimited())
        .await?;
    let ids = visible.docs.iter().filter_map(|doc| doc.get("id").cloned());
    Ok(Filter::any_of("address", ids))
}

pub async fn insert_token(store: &dyn DocumentStore, doc: Document) -> Result<Token> {
    from_document(store.create(TOKENS, doc).await?)
}

pub async fn list_tokens(
    store: &dyn DocumentStore,
    scope: &Filter,
    options: FindOptions,
) -> Result<FindResult<Token>> {
    store.find(TOKENS, scope, options).await?.try_map(from_document)
}

pub async fn find_token(store: &dyn DocumentStore, id: &str, scope: &Filter) -> Result<Option<Token>> {
    store
        .find_by_id(TOKENS, id, scope)
        .await?
        .map(from_document)
        .transpose()
}

pub async fn update_token(
    store: &dyn DocumentStore,
    id: &str,
    scope: &Filter,
    patch: Document,
) -> Result<Option<Token>> {
    store
        .update(TOKENS, id, scope, patch)
        .await?
        .map(from_document)
        .transpose()
}

pub async fn delete_token(store: &dyn DocumentStore, id: &str, scope: &Filter) -> Result<Option<Token>> {
    store
        .delete(TOKENS, id, scope)
        .await?
        .map(from_document)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_filter() {
        assert_eq!(owner_filter(&Decision::AllowAll), Some(Filter::All));
        assert_eq!(
            owner_filter(&Decision::AllowOwned("u1".into())),
            Some(Filter::equals("owner", "u1"))
        );
        assert_eq!(owner_filter(&Decision::Deny), None);
    }

    #[test]
    fn test_from_document_reports_shape_errors() {
        let mut doc = Document::new();
        doc.insert("id".into(), json!("x"));
        let err = from_document::<Address>(doc).unwrap_err();
        assert!(matches!(err, AdapterError::InvalidDocument(_)));
    }
}
