//! Storage abstraction and its backends.
//!
//! # Architecture
//!
//! The storage system has three layers:
//!
//! 1. **[`Dao`]** -- the four-operation contract the transport programs
//!    against, used as `Arc<dyn Dao>`. Push/Get/Delete/GetAll, nothing
//!    else.
//!
//! 2. **[`dynamodb::DynamoService`]** -- the DynamoDB call layer. Its
//!    methods return the domain value *and* the call's consumed capacity so
//!    the instrumentation middleware
//!    ([`instrument::MeasuredService`]) can observe capacity even on read
//!    misses. [`dynamodb::DynamoDao`] adapts the (instrumented) service
//!    back to `Dao`.
//!
//! 3. **Backends** -- [`dynamodb::DynamoExecutor`] against real DynamoDB,
//!    and [`memory::InMemoryDao`] for tests and local development.
//!
//! # TTL semantics
//!
//! Every stored record carries an `expires` deadline in epoch seconds;
//! records written without a TTL carry the [`EXPIRES_SENTINEL`] so the
//! expiry-ordered index still enumerates them. Expiry is enforced at read
//! time: any read observing a real deadline at or before "now" treats the
//! record as absent. Nothing sweeps expired rows; DynamoDB's own
//! table-level TTL reclaims them eventually.

pub mod dynamodb;
pub mod instrument;
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Key, OwnableItem};

/// The `expires` value written for records with no TTL.
///
/// Far enough in the future to be unreachable, yet a real number, so the
/// expiry-ordered index query (`expires > now`) returns immortal records
/// alongside mortal ones.
pub const EXPIRES_SENTINEL: i64 = i64::MAX;

/// The four-operation storage contract.
///
/// All operations are keyed by `(bucket, id)`. Implementations must be
/// `Send + Sync`; the transport shares one as `Arc<dyn Dao>` across
/// request tasks. Middlewares wrapping a `Dao` must preserve these
/// semantics exactly.
#[async_trait]
pub trait Dao: Send + Sync {
    /// Creates or overwrites the record at `key`. The prior value, if
    /// any, is not returned.
    async fn push(&self, key: &Key, item: &OwnableItem) -> Result<(), StoreError>;

    /// Fetches the record at `key`.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the record is absent or expired.
    async fn get(&self, key: &Key) -> Result<OwnableItem, StoreError>;

    /// Deletes the record at `key` and returns the deleted value.
    ///
    /// # Errors
    ///
    /// [`StoreError::NotFound`] if the record is absent or expired.
    async fn delete(&self, key: &Key) -> Result<OwnableItem, StoreError>;

    /// Returns all live records in `bucket`, keyed by id. Expired records
    /// are excluded; order is unspecified; the result is not a snapshot.
    async fn get_all(&self, bucket: &str) -> Result<HashMap<String, OwnableItem>, StoreError>;
}
