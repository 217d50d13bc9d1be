//! Custom error types specific to the `adapters` crate.
//!
//! This module defines errors that can occur while connecting to a record
//! store, validating documents against a collection schema, or executing
//! store operations, giving the backend one error type for every store
//! interaction.

use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// Dotted path of the offending field, e.g. `tags.0.tag`.
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Unified error type for all record store operations.
#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("ValidationError: {collection} failed validation ({} field errors)", errors.len())]
    Validation {
        collection: String,
        errors: Vec<FieldError>,
    },

    #[error("duplicate key error: {collection}.{field} must be unique")]
    Duplicate { collection: String, field: String },

    #[error("Collection not registered: {0}")]
    UnknownCollection(String),

    /// A stored document does not have the shape its reader expects.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Operation timed out after {0} ms")]
    Timeout(u64),
}

impl AdapterError {
    /// Shorthand for a validation error carrying a single field failure.
    pub fn field(collection: &str, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            collection: collection.to_string(),
            errors: vec![FieldError::new(field, message)],
        }
    }

    /// True for errors caused by the submitted data rather than the store.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Duplicate { .. })
    }
}

/// Result type alias for store operations.
pub type Result<T, E = AdapterError> = std::result::Result<T, E>;
