//! Global application error types and handlers.
//!
//! This module defines the error type shared by every handler and service in
//! the backend and converts it into a consistent JSON response of the form
//! `{"message": ..., "errors": [...]}`. Unexpected failures are logged and
//! reported to clients with a generic message only.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use walletfolio_adapters::{AdapterError, FieldError};

use crate::auth::AuthError;

pub const FORBIDDEN_MESSAGE: &str = "You are not allowed to perform this action.";
const INTERNAL_MESSAGE: &str = "Internal server error";

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("validation failed")]
    Validation(Vec<FieldError>),

    #[error("store error: {0}")]
    Store(#[source] AdapterError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<AdapterError> for AppError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::Validation { errors, .. } => AppError::Validation(errors),
            AdapterError::Duplicate { field, .. } => AppError::Validation(vec![FieldError::new(
                field,
                "Value must be unique",
            )]),
            other => AppError::Store(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    errors: Vec<FieldError>,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(err) => err.status(),
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) | AppError::Config(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            AppError::Auth(err) => {
                if status.is_server_error() {
                    tracing::error!(error = %err, "authentication failure");
                    ErrorBody { message: INTERNAL_MESSAGE.into(), errors: Vec::new() }
                } else {
                    ErrorBody { message: err.client_message().into(), errors: Vec::new() }
                }
            }
            AppError::Forbidden => ErrorBody { message: FORBIDDEN_MESSAGE.into(), errors: Vec::new() },
            AppError::NotFound(what) => ErrorBody {
                message: format!("{what} not found"),
                errors: Vec::new(),
            },
            AppError::BadRequest(message) => ErrorBody { message, errors: Vec::new() },
            AppError::Validation(errors) => ErrorBody {
                message: "Validation error".into(),
                errors,
            },
            other => {
                tracing::error!(error = %other, "request failed");
                ErrorBody { message: INTERNAL_MESSAGE.into(), errors: Vec::new() }
            }
        };
        (status, Json(body)).into_response()
    }
}
