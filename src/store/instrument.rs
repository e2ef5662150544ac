//! Instrumentation middleware for the DynamoDB service layer.
//!
//! [`MeasuredService`] decorates any [`DynamoService`], timing every call
//! and emitting through a [`StoreMeasures`] bundle:
//!
//! - `query_duration_seconds{query_type}` histogram.
//! - `queries{outcome, query_type}` counter. A read miss (`NotFound`)
//!   counts as `success`: normal miss traffic must not inflate failure
//!   counts or page anyone.
//! - `dynamodb_consumed_capacity{op, query_type}` counter, fed from the
//!   capacity the call reported, under `op = read` for get/getall and
//!   `op = write` for push/delete.
//! - `get_all_result_size{bucket}` gauge with the row count of each
//!   successful enumeration.
//!
//! Instrumentation never alters results: the decorated service returns
//! exactly what the delegate returned.

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::ConsumedCapacity;

use crate::error::StoreError;
use crate::metrics::{labels, StoreMeasures};
use crate::model::{Key, OwnableItem};
use crate::store::dynamodb::DynamoService;

/// The four storage query types, as metric label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryType {
    /// Upsert.
    Push,
    /// Single-record fetch.
    Get,
    /// Bucket enumeration.
    GetAll,
    /// Single-record delete.
    Delete,
}

impl QueryType {
    /// The `query_type` label value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Push => "push",
            Self::Get => "get",
            Self::GetAll => "getall",
            Self::Delete => "delete",
        }
    }

    /// The capacity direction this query consumes.
    fn op(self) -> &'static str {
        match self {
            Self::Get | Self::GetAll => labels::OP_READ,
            Self::Push | Self::Delete => labels::OP_WRITE,
        }
    }
}

/// Decorates a [`DynamoService`] with duration, outcome, and capacity
/// metrics.
#[derive(Debug)]
pub struct MeasuredService<S> {
    inner: S,
    measures: StoreMeasures,
}

impl<S> MeasuredService<S> {
    /// Wraps `inner`, emitting through `measures`.
    pub fn new(inner: S, measures: StoreMeasures) -> Self {
        Self { inner, measures }
    }

    fn record<T>(
        &self,
        query_type: QueryType,
        start: Instant,
        result: &Result<T, StoreError>,
        capacity: Option<&ConsumedCapacity>,
    ) {
        let query_label = query_type.as_str();
        self.measures.query_duration_seconds.observe(
            start.elapsed().as_secs_f64(),
            &[(labels::QUERY_TYPE, query_label)],
        );
        self.measures.queries.inc(&[
            (labels::OUTCOME, outcome(result)),
            (labels::QUERY_TYPE, query_label),
        ]);
        if let Some(units) = capacity.and_then(|cap| capacity_units(cap, query_type)) {
            if units > 0.0 {
                self.measures.consumed_capacity.add(
                    units,
                    &[(labels::OP, query_type.op()), (labels::QUERY_TYPE, query_label)],
                );
            }
        }
    }
}

/// A read miss is normal traffic, not a failure.
fn outcome<T>(result: &Result<T, StoreError>) -> &'static str {
    match result {
        Ok(_) | Err(StoreError::NotFound) => labels::OUTCOME_SUCCESS,
        Err(_) => labels::OUTCOME_FAIL,
    }
}

fn capacity_units(capacity: &ConsumedCapacity, query_type: QueryType) -> Option<f64> {
    let directional = match query_type.op() {
        labels::OP_READ => capacity.read_capacity_units(),
        _ => capacity.write_capacity_units(),
    };
    directional.or(capacity.capacity_units())
}

#[async_trait]
impl<S: DynamoService> DynamoService for MeasuredService<S> {
    async fn push(
        &self,
        key: &Key,
        item: &OwnableItem,
    ) -> (Result<(), StoreError>, Option<ConsumedCapacity>) {
        let start = Instant::now();
        let (result, capacity) = self.inner.push(key, item).await;
        self.record(QueryType::Push, start, &result, capacity.as_ref());
        (result, capacity)
    }

    async fn get(
        &self,
        key: &Key,
    ) -> (Result<OwnableItem, StoreError>, Option<ConsumedCapacity>) {
        let start = Instant::now();
        let (result, capacity) = self.inner.get(key).await;
        self.record(QueryType::Get, start, &result, capacity.as_ref());
        (result, capacity)
    }

    async fn delete(
        &self,
        key: &Key,
    ) -> (Result<OwnableItem, StoreError>, Option<ConsumedCapacity>) {
        let start = Instant::now();
        let (result, capacity) = self.inner.delete(key).await;
        self.record(QueryType::Delete, start, &result, capacity.as_ref());
        (result, capacity)
    }

    async fn get_all(
        &self,
        bucket: &str,
    ) -> (
        Result<HashMap<String, OwnableItem>, StoreError>,
        Option<ConsumedCapacity>,
    ) {
        let start = Instant::now();
        let (result, capacity) = self.inner.get_all(bucket).await;
        self.record(QueryType::GetAll, start, &result, capacity.as_ref());
        if let Ok(items) = &result {
            self.measures
                .get_all_result_size
                .set(items.len() as f64, &[(labels::BUCKET, bucket)]);
        }
        (result, capacity)
    }
}
