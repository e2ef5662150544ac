//! Chrysom: client library for the argus key/value store.
//!
//! Two layers:
//!
//! - [`client::BasicClient`] -- CRUD calls against one bucket of one
//!   service instance, with pluggable `Authorization` acquisition and a
//!   typed translation of non-success responses.
//! - [`listener::ListenerClient`] -- a poll-driven subscription: a single
//!   background task fetches the bucket on a fixed interval and hands the
//!   full contents to a user callback, with an atomic start/stop state
//!   machine and per-poll outcome metrics.
//!
//! # Module Organization
//!
//! - [`client`] - The basic HTTP client
//! - [`listener`] - The polling listener client and its traits
//! - [`auth`] - `Authorization` header acquirers
//! - [`measures`] - Poll outcome metrics
//! - [`error`] - Client and listener error types
//!
//! # Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use chrysom::client::{BasicClient, ClientConfig};
//! use chrysom::listener::{ListenerClient, ListenerFn};
//! use chrysom::measures::PollMeasures;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = BasicClient::new(ClientConfig {
//!     address: "http://localhost:6600".to_string(),
//!     bucket: "bucket01".to_string(),
//!     ..ClientConfig::default()
//! })?;
//!
//! let listener = ListenerClient::builder()
//!     .listener(Arc::new(ListenerFn(|items: Vec<argus::model::Item>| {
//!         println!("bucket now holds {} items", items.len());
//!     })))
//!     .reader(Arc::new(client))
//!     .measures(PollMeasures::disabled())
//!     .pull_interval(Duration::from_secs(5))
//!     .build()?;
//!
//! listener.start()?;
//! // ... later ...
//! listener.stop().await?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod listener;
pub mod measures;

// Re-exports for ergonomic access
pub use auth::{Acquirer, NoopAcquirer, StaticBearerAcquirer};
pub use client::{BasicClient, ClientConfig, PushResult};
pub use error::{ClientError, ListenerError};
pub use listener::{Listener, ListenerClient, ListenerConfig, ListenerFn, Reader};
pub use measures::PollMeasures;
