//! Module for the wallet address catalog API.

pub mod handlers;
pub mod routes;
