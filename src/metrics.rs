//! Metric sink traits and the store instrument bundle.
//!
//! The core does not depend on any metrics registry. Instead it emits
//! through the object-safe [`Counter`], [`Gauge`], and [`Histogram`] traits,
//! which an embedder backs with its registry of choice. [`NullMetric`]
//! implements all three as no-ops, and [`StoreMeasures::disabled`] wires a
//! fully silent bundle.
//!
//! Sinks must never fail or block a request; implementations are expected
//! to log and continue on export problems.

use std::fmt;
use std::sync::Arc;

/// Metric and label name constants, published so embedders can
/// pre-register metric families that match what the core emits.
pub mod names {
    /// Histogram of storage query durations, labeled by query type.
    pub const QUERY_DURATION_SECONDS: &str = "query_duration_seconds";
    /// Counter of storage queries, labeled by outcome and query type.
    pub const QUERIES: &str = "queries";
    /// Counter of DynamoDB consumed capacity units, labeled by op and
    /// query type.
    pub const DYNAMODB_CONSUMED_CAPACITY: &str = "dynamodb_consumed_capacity";
    /// Gauge of rows returned by the latest bucket enumeration.
    pub const GET_ALL_RESULT_SIZE: &str = "get_all_result_size";
}

/// Label keys and well-known label values.
pub mod labels {
    /// Label key for the query type: `push`, `get`, `getall`, `delete`.
    pub const QUERY_TYPE: &str = "query_type";
    /// Label key for the query outcome.
    pub const OUTCOME: &str = "outcome";
    /// Label key for the capacity direction: `read` or `write`.
    pub const OP: &str = "op";
    /// Label key for the bucket a gauge observation refers to.
    pub const BUCKET: &str = "bucket";

    /// Outcome value for successful queries (including read misses).
    pub const OUTCOME_SUCCESS: &str = "success";
    /// Outcome value for failed queries.
    pub const OUTCOME_FAIL: &str = "fail";

    /// Capacity direction for get/getall.
    pub const OP_READ: &str = "read";
    /// Capacity direction for push/delete.
    pub const OP_WRITE: &str = "write";
}

/// A monotonically increasing metric.
pub trait Counter: Send + Sync {
    /// Adds `value` to the series selected by `labels`.
    fn add(&self, value: f64, labels: &[(&str, &str)]);

    /// Adds one to the series selected by `labels`.
    fn inc(&self, labels: &[(&str, &str)]) {
        self.add(1.0, labels);
    }
}

/// A metric that holds the latest observed value.
pub trait Gauge: Send + Sync {
    /// Sets the series selected by `labels` to `value`.
    fn set(&self, value: f64, labels: &[(&str, &str)]);
}

/// A metric that records a distribution of observations.
pub trait Histogram: Send + Sync {
    /// Records one observation on the series selected by `labels`.
    fn observe(&self, value: f64, labels: &[(&str, &str)]);
}

/// No-op sink implementing all three metric traits.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullMetric;

impl Counter for NullMetric {
    fn add(&self, _value: f64, _labels: &[(&str, &str)]) {}
}

impl Gauge for NullMetric {
    fn set(&self, _value: f64, _labels: &[(&str, &str)]) {}
}

impl Histogram for NullMetric {
    fn observe(&self, _value: f64, _labels: &[(&str, &str)]) {}
}

/// The instruments the storage instrumentation middleware emits through.
///
/// See [`crate::store::instrument`] for what each instrument records.
#[derive(Clone)]
pub struct StoreMeasures {
    /// Backs [`names::QUERY_DURATION_SECONDS`].
    pub query_duration_seconds: Arc<dyn Histogram>,
    /// Backs [`names::QUERIES`].
    pub queries: Arc<dyn Counter>,
    /// Backs [`names::DYNAMODB_CONSUMED_CAPACITY`].
    pub consumed_capacity: Arc<dyn Counter>,
    /// Backs [`names::GET_ALL_RESULT_SIZE`].
    pub get_all_result_size: Arc<dyn Gauge>,
}

impl StoreMeasures {
    /// A bundle where every instrument is a no-op.
    pub fn disabled() -> Self {
        Self {
            query_duration_seconds: Arc::new(NullMetric),
            queries: Arc::new(NullMetric),
            consumed_capacity: Arc::new(NullMetric),
            get_all_result_size: Arc::new(NullMetric),
        }
    }
}

impl fmt::Debug for StoreMeasures {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreMeasures").finish_non_exhaustive()
    }
}
