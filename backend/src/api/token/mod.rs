//! Module for the token holdings API.
//!
//! Tokens carry no owner of their own; access follows the address that
//! holds them.

pub mod handlers;
pub mod routes;
