//! In-memory adapter implementation of the record store.
//!
//! This file contains the complete concrete implementation of the
//! [`DocumentStore`] trait backed by process memory, plus the connector that
//! hands it out for `memory://` URLs. Collections are registered up front
//! with their schemas; writes to an unregistered collection are rejected.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::errors::{AdapterError, FieldError, Result};
use crate::models::{
    document_id, generate_id, timestamp_now, ConnectOptions, Document, Filter, FindOptions,
    FindResult, FIELD_CREATED_AT, FIELD_ID, FIELD_UPDATED_AT,
};
use crate::schema::CollectionSchema;
use crate::{DocumentStore, StoreConnector};

pub const MEMORY_SCHEME: &str = "memory";

type Collections = HashMap<String, Vec<Document>>;

/// Document store holding every collection in a single `RwLock`.
///
/// Validation, uniqueness checks and the write itself happen under one
/// write guard, so concurrent creates cannot both pass a uniqueness check.
pub struct InMemoryStore {
    schemas: HashMap<String, CollectionSchema>,
    collections: RwLock<Collections>,
}

impl InMemoryStore {
    pub fn new(schemas: Vec<CollectionSchema>) -> Self {
        let collections = schemas
            .iter()
            .map(|s| (s.slug.clone(), Vec::new()))
            .collect();
        let schemas = schemas.into_iter().map(|s| (s.slug.clone(), s)).collect();
        Self {
            schemas,
            collections: RwLock::new(collections),
        }
    }

    fn schema(&self, collection: &str) -> Result<&CollectionSchema> {
        self.schemas
            .get(collection)
            .ok_or_else(|| AdapterError::UnknownCollection(collection.to_string()))
    }

    /// Checks unique fields and relationship targets for `doc`.
    fn check_constraints(
        schema: &CollectionSchema,
        collections: &Collections,
        doc: &Document,
        self_id: Option<&str>,
    ) -> Result<()> {
        let rows = collections.get(&schema.slug).map(Vec::as_slice).unwrap_or_default();
        for field in schema.unique_fields() {
            let Some(value) = doc.get(&field.name) else {
                continue;
            };
            let taken = rows
                .iter()
                .filter(|row| document_id(row) != self_id)
                .any(|row| row.get(&field.name) == Some(value));
            if taken {
                return Err(AdapterError::Duplicate {
                    collection: schema.slug.clone(),
                    field: field.name.clone(),
                });
            }
        }

        let mut errors = Vec::new();
        for (field, target) in schema.relationships() {
            let Some(Value::String(id)) = doc.get(field) else {
                continue;
            };
            let exists = collections
                .get(target)
                .map(|rows| rows.iter().any(|row| document_id(row) == Some(id.as_str())))
                .unwrap_or(false);
            if !exists {
                errors.push(FieldError::new(field, "This relationship field has an invalid value."));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AdapterError::Validation {
                collection: schema.slug.clone(),
                errors,
            })
        }
    }

    fn position(rows: &[Document], id: &str, filter: &Filter) -> Option<usize> {
        rows.iter()
            .position(|row| document_id(row) == Some(id) && filter.matches(row))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn create(&self, collection: &str, data: Document) -> Result<Document> {
        let schema = self.schema(collection)?;
        let mut doc = schema
            .sanitize_create(&data)
            .map_err(|errors| AdapterError::Validation {
                collection: collection.to_string(),
                errors,
            })?;

        let mut collections = self.collections.write().await;
        Self::check_constraints(schema, &collections, &doc, None)?;

        let now = timestamp_now();
        doc.insert(FIELD_ID.to_string(), Value::String(generate_id()));
        doc.insert(FIELD_CREATED_AT.to_string(), Value::String(now.clone()));
        doc.insert(FIELD_UPDATED_AT.to_string(), Value::String(now));

        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        log::debug!("created {collection} record {:?}", document_id(&doc));
        Ok(doc)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        options: FindOptions,
    ) -> Result<FindResult<Document>> {
        self.schema(collection)?;
        let collections = self.collections.read().await;
        let matches: Vec<Document> = collections
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .rev()
                    .filter(|row| filter.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(FindResult::paginate(matches, options))
    }

    async fn find_by_id(&self, collection: &str, id: &str, filter: &Filter) -> Result<Option<Document>> {
        self.schema(collection)?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).and_then(|rows| {
            Self::position(rows, id, filter).map(|i| rows[i].clone())
        }))
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        filter: &Filter,
        patch: Document,
    ) -> Result<Option<Document>> {
        let schema = self.schema(collection)?;
        let mut collections = self.collections.write().await;
        let Some(index) = collections
            .get(collection)
            .and_then(|rows| Self::position(rows, id, filter))
        else {
            return Ok(None);
        };

        let existing = collections[collection][index].clone();
        let mut doc = schema
            .sanitize_update(&existing, &patch)
            .map_err(|errors| AdapterError::Validation {
                collection: collection.to_string(),
                errors,
            })?;
        Self::check_constraints(schema, &collections, &doc, Some(id))?;

        for key in [FIELD_ID, FIELD_CREATED_AT] {
            if let Some(value) = existing.get(key) {
                doc.insert(key.to_string(), value.clone());
            }
        }
        doc.insert(FIELD_UPDATED_AT.to_string(), Value::String(timestamp_now()));

        if let Some(rows) = collections.get_mut(collection) {
            rows[index] = doc.clone();
        }
        log::debug!("updated {collection} record {id}");
        Ok(Some(doc))
    }

    async fn delete(&self, collection: &str, id: &str, filter: &Filter) -> Result<Option<Document>> {
        self.schema(collection)?;
        let mut collections = self.collections.write().await;
        let removed = collections.get_mut(collection).and_then(|rows| {
            Self::position(rows, id, filter).map(|i| rows.remove(i))
        });
        if removed.is_some() {
            log::debug!("deleted {collection} record {id}");
        }
        Ok(removed)
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<usize> {
        self.schema(collection)?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|rows| rows.iter().filter(|row| filter.matches(row)).count())
            .unwrap_or(0))
    }

    async fn ping(&self) -> Result<()> {
        let _guard = self.collections.read().await;
        Ok(())
    }
}

/// Connector for `memory://<name>` URLs.
///
/// Every successful `connect` hands out the same underlying store.
pub struct MemoryConnector {
    store: Arc<InMemoryStore>,
    connects: AtomicUsize,
}

impl MemoryConnector {
    pub fn new(schemas: Vec<CollectionSchema>) -> Self {
        Self::with_store(Arc::new(InMemoryStore::new(schemas)))
    }

    pub fn with_store(store: Arc<InMemoryStore>) -> Self {
        Self {
            store,
            connects: AtomicUsize::new(0),
        }
    }

    /// Number of successful `connect` calls so far.
    pub fn connections(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for MemoryConnector {
    async fn connect(&self, options: &ConnectOptions) -> Result<Arc<dyn DocumentStore>> {
        if options.scheme() != Some(MEMORY_SCHEME) {
            return Err(AdapterError::Connection(format!(
                "memory connector cannot open {}",
                options.url
            )));
        }
        self.connects.fetch_add(1, Ordering::SeqCst);
        log::info!(
            "opened in-memory store {:?} (pool {}..{})",
            options.database().unwrap_or("default"),
            options.min_pool_size,
            options.max_pool_size
        );
        let store: Arc<dyn DocumentStore> = self.store.clone();
        Ok(store)
    }
}
