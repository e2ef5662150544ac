//! HTTP transport for the store: routes, decoding, encoding,
//! authorization, and endpoint logic.
//!
//! # Routes
//!
//! | Method | Path                            | Operation              |
//! |--------|---------------------------------|------------------------|
//! | GET    | `/api/v1/store/{bucket}`        | list owner-visible items |
//! | PUT    | `/api/v1/store/{bucket}/{id}`   | upsert                 |
//! | GET    | `/api/v1/store/{bucket}/{id}`   | fetch                  |
//! | DELETE | `/api/v1/store/{bucket}/{id}`   | delete                 |
//!
//! # Headers
//!
//! Requests may claim an owner through [`OWNER_HEADER`]. Every non-2xx
//! response carries the sanitized error message in [`ERROR_HEADER`] and an
//! empty body; 2xx bodies are JSON.
//!
//! # Authorization
//!
//! The authentication layer is out of scope; it installs
//! [`AuthAttributes`](crate::auth::AuthAttributes) into the request
//! extensions, and this layer derives admin mode from the configured
//! access-level attribute. Admin mode bypasses owner checks but never
//! transfers ownership.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use argus::service::{router, StoreHandler};
//! use argus::store::memory::InMemoryDao;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let handler = Arc::new(StoreHandler::new(Arc::new(InMemoryDao::new())));
//! let app = router(handler);
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:6600").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

mod codec;
mod handlers;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::auth::AccessConfig;
use crate::store::Dao;
use crate::validation::Validators;

/// Request header carrying the caller's owner claim.
pub const OWNER_HEADER: &str = "X-Midt-Owner";

/// Response header carrying the sanitized error message on non-2xx.
pub const ERROR_HEADER: &str = "X-Midt-Error";

/// Shared state behind the store routes: the DAO plus the validation and
/// access configuration.
pub struct StoreHandler {
    pub(crate) dao: Arc<dyn Dao>,
    pub(crate) validators: Validators,
    pub(crate) access: AccessConfig,
}

impl StoreHandler {
    /// Creates a handler over `dao` with default validation and access
    /// configuration.
    pub fn new(dao: Arc<dyn Dao>) -> Self {
        Self {
            dao,
            validators: Validators::default(),
            access: AccessConfig::default(),
        }
    }

    /// Replaces the compiled validators.
    pub fn with_validators(mut self, validators: Validators) -> Self {
        self.validators = validators;
        self
    }

    /// Replaces the access-level configuration.
    pub fn with_access(mut self, access: AccessConfig) -> Self {
        self.access = access;
        self
    }
}

impl std::fmt::Debug for StoreHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreHandler")
            .field("access", &self.access)
            .finish_non_exhaustive()
    }
}

/// Builds the store router. The embedding application nests or serves it
/// directly.
pub fn router(handler: Arc<StoreHandler>) -> Router {
    Router::new()
        .route("/api/v1/store/{bucket}", get(handlers::get_all_items))
        .route(
            "/api/v1/store/{bucket}/{id}",
            get(handlers::get_item)
                .put(handlers::set_item)
                .delete(handlers::delete_item),
        )
        .with_state(handler)
}
