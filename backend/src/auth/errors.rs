//! Custom error types specific to authentication failures.
//!
//! This module defines the errors that can occur while registering, logging
//! in, or resolving the session token carried by a request, together with
//! the status code and client-facing message each one maps to.

use axum::http::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("email and password are required")]
    MissingCredentials,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("email already registered")]
    EmailTaken,

    /// No session token on a request that needs one.
    #[error("no session token")]
    Unauthenticated,

    /// A token was presented but is malformed, badly signed, expired, or
    /// names a user that no longer exists.
    #[error("invalid session token: {0}")]
    InvalidToken(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    /// The configured session lifetime does not yield a representable expiry.
    #[error("session lifetime out of range: {0} s")]
    LifetimeOutOfRange(u64),

    #[error("token encoding failed: {0}")]
    TokenEncoding(#[from] jsonwebtoken::errors::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingCredentials | Self::EmailTaken => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::Unauthenticated | Self::InvalidToken(_) => {
                StatusCode::UNAUTHORIZED
            }
            Self::PasswordHash(_) | Self::LifetimeOutOfRange(_) | Self::TokenEncoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message safe to show to clients.
    pub fn client_message(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "Email and password are required",
            Self::InvalidCredentials => "Invalid credentials",
            Self::EmailTaken => "Email already exists",
            Self::Unauthenticated => "You must be logged in to perform this action",
            Self::InvalidToken(_) => "Invalid authentication token",
            Self::PasswordHash(_) | Self::LifetimeOutOfRange(_) | Self::TokenEncoding(_) => {
                "Internal server error"
            }
        }
    }
}
