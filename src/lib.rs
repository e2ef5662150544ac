//! Argus: a bucketed, owner-scoped key/value store with item-level TTL.
//!
//! Clients create, read, update, delete, and enumerate small JSON records
//! ("items") within named buckets; each item may carry an owner label that
//! scopes visibility and mutation, and an optional TTL enforced at read
//! time. The real backend is DynamoDB, with an expiry-ordered secondary
//! index serving single-query bucket enumeration; an in-memory backend
//! covers tests and local development. The companion `chrysom` crate talks
//! to the HTTP surface and adds a poll-driven subscription abstraction.
//!
//! # Module Organization
//!
//! - [`model`] - Key, Item, and OwnableItem shapes
//! - [`error`] - The store error taxonomy with status/sanitized projections
//! - [`validation`] - Regex-bounded formats, depth checking, TTL clamping
//! - [`auth`] - Admin-mode derivation from request auth attributes
//! - [`store`] - The `Dao` contract and its DynamoDB and in-memory backends
//! - [`service`] - The axum transport: routes, codecs, endpoint logic
//! - [`metrics`] - Registry-agnostic counter/gauge/histogram sinks
//! - [`clock`] - Epoch-second clock abstraction for testable expiry
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use argus::service::{router, StoreHandler};
//! use argus::store::memory::InMemoryDao;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = Arc::new(StoreHandler::new(Arc::new(InMemoryDao::new())));
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6600").await?;
//! axum::serve(listener, router(handler)).await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod clock;
pub mod error;
pub mod metrics;
pub mod model;
pub mod service;
pub mod store;
pub mod validation;

// Re-exports for ergonomic access
pub use clock::{Clock, ManualClock, SystemClock};
pub use error::StoreError;
pub use metrics::StoreMeasures;
pub use model::{Item, Key, OwnableItem};
pub use store::dynamodb::{DynamoConfig, DynamoDao};
pub use store::memory::InMemoryDao;
pub use store::Dao;
