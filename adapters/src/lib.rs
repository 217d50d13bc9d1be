//! Core `adapters` crate for abstracting record store interactions.
//!
//! This crate defines the [`DocumentStore`] trait, which outlines the generic
//! document operations the backend relies on, the [`StoreConnector`] trait
//! used to open a store from connection options, and a concrete in-memory
//! implementation ([`memory`]).

use std::sync::Arc;

use async_trait::async_trait;

pub mod errors;
pub mod memory;
pub mod models;
pub mod schema;

pub use errors::{AdapterError, FieldError, Result};
pub use memory::{InMemoryStore, MemoryConnector};
pub use models::{ConnectOptions, Document, Filter, FindOptions, FindResult};
pub use schema::{CollectionSchema, FieldKind, FieldSpec};

/// Generic document collection operations.
///
/// Every operation that addresses existing records takes a [`Filter`] that
/// the record must also match; a record outside the filter behaves exactly
/// as if it did not exist.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Validates `data` against the collection schema and inserts it,
    /// returning the stored document with `id` and timestamps.
    async fn create(&self, collection: &str, data: Document) -> Result<Document>;

    /// Returns the page of documents matching `filter`, newest first.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<FindResult<Document>>;

    async fn find_by_id(&self, collection: &str, id: &str, filter: &Filter) -> Result<Option<Document>>;

    /// Applies `patch` to the record and re-validates it. `Ok(None)` when
    /// no record with `id` matches `filter`.
    async fn update(
        &self,
        collection: &str,
        id: &str,
        filter: &Filter,
        patch: Document,
    ) -> Result<Option<Document>>;

    /// Removes the record, returning it. `Ok(None)` when no record with `id`
    /// matches `filter`.
    async fn delete(&self, collection: &str, id: &str, filter: &Filter) -> Result<Option<Document>>;

    async fn count(&self, collection: &str, filter: &Filter) -> Result<usize>;

    /// Round-trip health check.
    async fn ping(&self) -> Result<()>;
}

/// Opens a [`DocumentStore`] from connection options.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn DocumentStore>>;
}
