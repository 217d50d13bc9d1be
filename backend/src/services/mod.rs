//! Module for core business logic services.
//!
//! This module encapsulates services that sit between the HTTP handlers and
//! the record store: the lazily connected store client, the ownership binder
//! applied to owned records, and the portfolio aggregation.

pub mod ownership;
pub mod portfolio;
pub mod store_client;

pub use store_client::StoreClient;
