//! DynamoDB storage backend.
//!
//! [`DynamoDao`] implements [`Dao`] over a single DynamoDB table with
//! composite primary keys:
//!
//! | Attribute | Type   | Description                                   |
//! |-----------|--------|-----------------------------------------------|
//! | `bucket`  | String | Partition key                                 |
//! | `id`      | String | Sort key: lower-case SHA-256 hex digest       |
//! | `owner`   | String | Owner label; empty means public               |
//! | `data`    | Map    | Opaque JSON document                          |
//! | `ttl`     | Number | Requested lifetime in seconds (mortal only)   |
//! | `expires` | Number | Epoch-second deadline, or the sentinel        |
//!
//! A global secondary index, [`EXPIRES_INDEX`], keys on `(bucket, expires)`
//! and serves bucket enumeration with the single condition
//! `expires > now`: records written without a TTL carry the
//! [`EXPIRES_SENTINEL`] deadline, so one query returns every live record
//! and skips every expired one. Table-level TTL on `expires` reclaims
//! expired rows in the background; correctness never depends on it because
//! every read re-checks the deadline.
//!
//! # Layering
//!
//! [`DynamoService`] is the call layer: each method returns the domain
//! result *and* the call's consumed capacity, so the instrumentation
//! middleware ([`MeasuredService`](crate::store::instrument::MeasuredService))
//! can observe capacity even when a read misses. [`DynamoExecutor`]
//! implements it with real SDK calls; [`DynamoDao`] adapts the instrumented
//! service back to the clean four-operation [`Dao`] contract.
//!
//! # Usage
//!
//! ```rust,no_run
//! use argus::metrics::StoreMeasures;
//! use argus::store::dynamodb::{DynamoConfig, DynamoDao};
//!
//! # async fn example() {
//! let config = DynamoConfig::default()
//!     .with_region("us-east-2")
//!     .with_get_all_limit(500);
//! let dao = DynamoDao::new(&config, StoreMeasures::disabled()).await;
//! # }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_dynamodb::config::Credentials;
use aws_sdk_dynamodb::error::ProvideErrorMetadata;
use aws_sdk_dynamodb::types::{
    AttributeValue, ConsumedCapacity, ReturnConsumedCapacity, ReturnValue,
};
use aws_sdk_dynamodb::Client;
use serde_json::Value;

use crate::clock::{system_clock, Clock};
use crate::error::StoreError;
use crate::metrics::StoreMeasures;
use crate::model::{Item, Key, OwnableItem};
use crate::store::instrument::MeasuredService;
use crate::store::{Dao, EXPIRES_SENTINEL};

/// Default table name.
pub const DEFAULT_TABLE_NAME: &str = "gifnoc";

/// Default cap on SDK-level retries.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Name of the expiry-ordered global secondary index.
pub const EXPIRES_INDEX: &str = "Expires-index";

const BUCKET_ATTRIBUTE: &str = "bucket";
const ID_ATTRIBUTE: &str = "id";
const OWNER_ATTRIBUTE: &str = "owner";
const DATA_ATTRIBUTE: &str = "data";
const TTL_ATTRIBUTE: &str = "ttl";
const EXPIRES_ATTRIBUTE: &str = "expires";

/// Static AWS credential pair; omit to use the default chain.
#[derive(Debug, Clone)]
pub struct StaticCredentials {
    /// AWS access key id.
    pub access_key_id: String,
    /// AWS secret access key.
    pub secret_access_key: String,
}

/// DynamoDB backend configuration.
///
/// When `region` is unset the default chain applies, which consults
/// `AWS_REGION` among its usual sources. `endpoint` overrides the service
/// endpoint for local stacks. `get_all_limit` bounds the single page the
/// index query returns; there is no pagination beyond it.
#[derive(Debug, Clone)]
pub struct DynamoConfig {
    /// Table holding the records.
    pub table_name: String,
    /// AWS region; unset defers to the default chain.
    pub region: Option<String>,
    /// Endpoint override for local or non-AWS deployments.
    pub endpoint: Option<String>,
    /// Static credentials; unset defers to the default chain.
    pub credentials: Option<StaticCredentials>,
    /// Cap on SDK-level retries per call.
    pub max_retries: u32,
    /// Optional bound on rows returned per bucket enumeration.
    pub get_all_limit: Option<i32>,
}

impl Default for DynamoConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.to_string(),
            region: None,
            endpoint: None,
            credentials: None,
            max_retries: DEFAULT_MAX_RETRIES,
            get_all_limit: None,
        }
    }
}

impl DynamoConfig {
    /// Overrides the table name.
    pub fn with_table_name(mut self, name: impl Into<String>) -> Self {
        self.table_name = name.into();
        self
    }

    /// Sets the AWS region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Sets an endpoint override.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Uses a static credential pair instead of the default chain.
    pub fn with_credentials(mut self, credentials: StaticCredentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Overrides the retry cap.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Bounds the rows returned per bucket enumeration.
    pub fn with_get_all_limit(mut self, limit: i32) -> Self {
        self.get_all_limit = Some(limit);
        self
    }

    /// Builds a DynamoDB client from this configuration and the standard
    /// AWS config chain.
    pub async fn connect(&self) -> Client {
        let retries = aws_config::retry::RetryConfig::standard()
            .with_max_attempts(self.max_retries + 1);
        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).retry_config(retries);
        if let Some(region) = self.region.as_ref().filter(|r| !r.is_empty()) {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &self.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        if let Some(credentials) = &self.credentials {
            loader = loader.credentials_provider(Credentials::new(
                credentials.access_key_id.clone(),
                credentials.secret_access_key.clone(),
                None,
                None,
                "static",
            ));
        }
        let config = loader.load().await;
        Client::new(&config)
    }
}

/// The DynamoDB call layer.
///
/// Each method returns the domain result paired with the consumed capacity
/// the call reported, so instrumentation sees capacity even on read
/// misses. [`MeasuredService`](crate::store::instrument::MeasuredService)
/// wraps any implementation; [`DynamoDao`] adapts one to [`Dao`].
#[async_trait]
pub trait DynamoService: Send + Sync {
    /// Upserts the record at `key`.
    async fn push(
        &self,
        key: &Key,
        item: &OwnableItem,
    ) -> (Result<(), StoreError>, Option<ConsumedCapacity>);

    /// Fetches the record at `key`.
    async fn get(&self, key: &Key)
        -> (Result<OwnableItem, StoreError>, Option<ConsumedCapacity>);

    /// Deletes the record at `key`, returning the deleted value.
    async fn delete(
        &self,
        key: &Key,
    ) -> (Result<OwnableItem, StoreError>, Option<ConsumedCapacity>);

    /// Enumerates the live records in `bucket`.
    async fn get_all(
        &self,
        bucket: &str,
    ) -> (
        Result<HashMap<String, OwnableItem>, StoreError>,
        Option<ConsumedCapacity>,
    );
}

/// [`DynamoService`] implementation issuing real SDK calls.
#[derive(Debug, Clone)]
pub struct DynamoExecutor {
    client: Client,
    table_name: String,
    get_all_limit: Option<i32>,
    clock: Arc<dyn Clock>,
}

impl DynamoExecutor {
    /// Creates an executor over a pre-built client.
    pub fn new(
        client: Client,
        table_name: impl Into<String>,
        get_all_limit: Option<i32>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            client,
            table_name: table_name.into(),
            get_all_limit,
            clock,
        }
    }
}

#[async_trait]
impl DynamoService for DynamoExecutor {
    async fn push(
        &self,
        key: &Key,
        item: &OwnableItem,
    ) -> (Result<(), StoreError>, Option<ConsumedCapacity>) {
        let now = self.clock.now_epoch_secs();
        let record = marshal_record(key, item, now);
        let result = self
            .client
            .put_item()
            .table_name(&self.table_name)
            .set_item(Some(record))
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await;
        match result {
            Ok(out) => {
                let capacity = out.consumed_capacity().cloned();
                (Ok(()), capacity)
            }
            Err(err) => (Err(classify_sdk_error(err, "push", false)), None),
        }
    }

    async fn get(
        &self,
        key: &Key,
    ) -> (Result<OwnableItem, StoreError>, Option<ConsumedCapacity>) {
        let now = self.clock.now_epoch_secs();
        let result = self
            .client
            .get_item()
            .table_name(&self.table_name)
            .key(BUCKET_ATTRIBUTE, AttributeValue::S(key.bucket.clone()))
            .key(ID_ATTRIBUTE, AttributeValue::S(key.id.clone()))
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await;
        match result {
            Ok(out) => {
                let capacity = out.consumed_capacity().cloned();
                let record = match out.item().filter(|attrs| !attrs.is_empty()) {
                    Some(attrs) => unmarshal_record(attrs, now),
                    None => Err(StoreError::NotFound),
                };
                (record, capacity)
            }
            Err(err) => (Err(classify_sdk_error(err, "get", true)), None),
        }
    }

    async fn delete(
        &self,
        key: &Key,
    ) -> (Result<OwnableItem, StoreError>, Option<ConsumedCapacity>) {
        let now = self.clock.now_epoch_secs();
        let result = self
            .client
            .delete_item()
            .table_name(&self.table_name)
            .key(BUCKET_ATTRIBUTE, AttributeValue::S(key.bucket.clone()))
            .key(ID_ATTRIBUTE, AttributeValue::S(key.id.clone()))
            .return_values(ReturnValue::AllOld)
            .return_consumed_capacity(ReturnConsumedCapacity::Total)
            .send()
            .await;
        match result {
            Ok(out) => {
                let capacity = out.consumed_capacity().cloned();
                let record = match out.attributes().filter(|attrs| !attrs.is_empty()) {
                    Some(attrs) => unmarshal_record(attrs, now),
                    None => Err(StoreError::NotFound),
                };
                (record, capacity)
            }
            Err(err) => (Err(classify_sdk_error(err, "delete", true)), None),
        }
    }

    async fn get_all(
        &self,
        bucket: &str,
    ) -> (
        Result<HashMap<String, OwnableItem>, StoreError>,
        Option<ConsumedCapacity>,
    ) {
        let now = self.clock.now_epoch_secs();
        let mut query = self
            .client
            .query()
            .table_name(&self.table_name)
            .index_name(EXPIRES_INDEX)
            .key_condition_expression("#bucket = :bucket AND #expires > :now")
            .expression_attribute_names("#bucket", BUCKET_ATTRIBUTE)
            .expression_attribute_names("#expires", EXPIRES_ATTRIBUTE)
            .expression_attribute_values(":bucket", AttributeValue::S(bucket.to_owned()))
            .expression_attribute_values(":now", AttributeValue::N(now.to_string()))
            .return_consumed_capacity(ReturnConsumedCapacity::Total);
        if let Some(limit) = self.get_all_limit {
            query = query.limit(limit);
        }
        match query.send().await {
            Ok(out) => {
                let capacity = out.consumed_capacity().cloned();
                let mut items = HashMap::new();
                for attrs in out.items() {
                    match unmarshal_record(attrs, now) {
                        Ok(record) => {
                            items.insert(record.item.id.clone(), record);
                        }
                        Err(StoreError::NotFound) => {
                            tracing::debug!(bucket, "skipping expired or partial row");
                        }
                        Err(err) => {
                            tracing::warn!(bucket, error = %err, "failed to decode row");
                        }
                    }
                }
                (Ok(items), capacity)
            }
            Err(err) => (Err(classify_sdk_error(err, "getall", true)), None),
        }
    }
}

/// DynamoDB-backed [`Dao`].
pub struct DynamoDao {
    service: Arc<dyn DynamoService>,
}

impl DynamoDao {
    /// Connects through the standard AWS config chain and wraps the
    /// executor with instrumentation.
    pub async fn new(config: &DynamoConfig, measures: StoreMeasures) -> Self {
        let client = config.connect().await;
        Self::with_client(client, config, measures)
    }

    /// Builds the DAO over a pre-built client, wrapping the executor with
    /// instrumentation.
    pub fn with_client(client: Client, config: &DynamoConfig, measures: StoreMeasures) -> Self {
        let executor = DynamoExecutor::new(
            client,
            config.table_name.clone(),
            config.get_all_limit,
            system_clock(),
        );
        Self::from_service(Arc::new(MeasuredService::new(executor, measures)))
    }

    /// Adapts any [`DynamoService`] to the [`Dao`] contract.
    pub fn from_service(service: Arc<dyn DynamoService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl Dao for DynamoDao {
    async fn push(&self, key: &Key, item: &OwnableItem) -> Result<(), StoreError> {
        self.service.push(key, item).await.0
    }

    async fn get(&self, key: &Key) -> Result<OwnableItem, StoreError> {
        self.service.get(key).await.0
    }

    async fn delete(&self, key: &Key) -> Result<OwnableItem, StoreError> {
        self.service.delete(key).await.0
    }

    async fn get_all(&self, bucket: &str) -> Result<HashMap<String, OwnableItem>, StoreError> {
        self.service.get_all(bucket).await.0
    }
}

// ---------------------------------------------------------------------------
// Marshaling
// ---------------------------------------------------------------------------

/// Builds the stored attribute map for an upsert.
///
/// Mortal records keep their requested `ttl` and gain an absolute
/// `expires` deadline; immortal records carry the sentinel deadline and no
/// `ttl` attribute.
fn marshal_record(key: &Key, item: &OwnableItem, now: i64) -> HashMap<String, AttributeValue> {
    let mut attrs = HashMap::new();
    attrs.insert(
        BUCKET_ATTRIBUTE.to_string(),
        AttributeValue::S(key.bucket.clone()),
    );
    attrs.insert(ID_ATTRIBUTE.to_string(), AttributeValue::S(key.id.clone()));
    attrs.insert(
        OWNER_ATTRIBUTE.to_string(),
        AttributeValue::S(item.owner.clone()),
    );
    attrs.insert(
        DATA_ATTRIBUTE.to_string(),
        AttributeValue::M(
            item.item
                .data
                .iter()
                .map(|(k, v)| (k.clone(), json_to_attr(v)))
                .collect(),
        ),
    );
    match item.item.ttl {
        Some(ttl) => {
            attrs.insert(TTL_ATTRIBUTE.to_string(), AttributeValue::N(ttl.to_string()));
            attrs.insert(
                EXPIRES_ATTRIBUTE.to_string(),
                AttributeValue::N(now.saturating_add(ttl).to_string()),
            );
        }
        None => {
            attrs.insert(
                EXPIRES_ATTRIBUTE.to_string(),
                AttributeValue::N(EXPIRES_SENTINEL.to_string()),
            );
        }
    }
    attrs
}

/// Decodes a stored attribute map, enforcing expiry.
///
/// Rows with an empty `bucket` or `id`, or with a real deadline at or
/// before `now`, decode to [`StoreError::NotFound`]; expired rows are not
/// re-deleted, just treated as gone. The returned `ttl` is the remaining
/// lifetime for mortal records and absent for sentinel rows.
fn unmarshal_record(
    attrs: &HashMap<String, AttributeValue>,
    now: i64,
) -> Result<OwnableItem, StoreError> {
    let bucket = string_attribute(attrs, BUCKET_ATTRIBUTE);
    let id = string_attribute(attrs, ID_ATTRIBUTE);
    if bucket.is_empty() || id.is_empty() {
        return Err(StoreError::NotFound);
    }
    let expires = attrs
        .get(EXPIRES_ATTRIBUTE)
        .and_then(|attr| attr.as_n().ok())
        .and_then(|raw| raw.parse::<i64>().ok());
    if let Some(deadline) = expires {
        if deadline < EXPIRES_SENTINEL && deadline <= now {
            return Err(StoreError::NotFound);
        }
    }
    let ttl = expires
        .filter(|deadline| *deadline < EXPIRES_SENTINEL)
        .map(|deadline| deadline - now);
    let owner = string_attribute(attrs, OWNER_ATTRIBUTE);
    let data = attrs
        .get(DATA_ATTRIBUTE)
        .and_then(|attr| attr.as_m().ok())
        .map(|map| {
            map.iter()
                .map(|(k, v)| (k.clone(), attr_to_json(v)))
                .collect()
        })
        .unwrap_or_default();
    Ok(OwnableItem {
        item: Item { id, data, ttl },
        owner,
    })
}

fn string_attribute(attrs: &HashMap<String, AttributeValue>, name: &str) -> String {
    attrs
        .get(name)
        .and_then(|attr| attr.as_s().ok())
        .cloned()
        .unwrap_or_default()
}

fn json_to_attr(value: &Value) -> AttributeValue {
    match value {
        Value::Null => AttributeValue::Null(true),
        Value::Bool(b) => AttributeValue::Bool(*b),
        Value::Number(n) => AttributeValue::N(n.to_string()),
        Value::String(s) => AttributeValue::S(s.clone()),
        Value::Array(values) => AttributeValue::L(values.iter().map(json_to_attr).collect()),
        Value::Object(map) => AttributeValue::M(
            map.iter()
                .map(|(k, v)| (k.clone(), json_to_attr(v)))
                .collect(),
        ),
    }
}

fn attr_to_json(attr: &AttributeValue) -> Value {
    match attr {
        AttributeValue::Null(_) => Value::Null,
        AttributeValue::Bool(b) => Value::Bool(*b),
        AttributeValue::N(raw) => parse_number(raw),
        AttributeValue::S(s) => Value::String(s.clone()),
        AttributeValue::L(values) => Value::Array(values.iter().map(attr_to_json).collect()),
        AttributeValue::M(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), attr_to_json(v)))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn parse_number(raw: &str) -> Value {
    if let Ok(n) = raw.parse::<i64>() {
        return Value::from(n);
    }
    if let Ok(n) = raw.parse::<u64>() {
        return Value::from(n);
    }
    raw.parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Classification {
    Retryable,
    Terminal,
    NotFound,
    BadRequest,
}

/// Buckets an AWS error code into the store taxonomy.
///
/// `ResourceNotFoundException` maps to `NotFound` only for read-style
/// operations (`missing_as_not_found`); on push a missing table is an
/// operator problem, not an absent record.
fn classify(code: Option<&str>, message: &str, missing_as_not_found: bool) -> Classification {
    match code {
        Some("ProvisionedThroughputExceededException" | "InternalServerError") => {
            Classification::Retryable
        }
        Some("RequestLimitExceeded") => Classification::Terminal,
        Some("ResourceNotFoundException") if missing_as_not_found => Classification::NotFound,
        Some("ValidationException") => Classification::BadRequest,
        Some("TransactionCanceledException") if message.contains("ValidationException") => {
            Classification::BadRequest
        }
        _ => Classification::Terminal,
    }
}

fn classify_sdk_error<E>(err: E, op: &str, missing_as_not_found: bool) -> StoreError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
    let code = err.code().map(str::to_owned);
    let aws_message = err.message().unwrap_or_default().to_owned();
    let detail = if aws_message.is_empty() {
        format!("dynamodb {op} failed: {err}")
    } else {
        format!("dynamodb {op} failed: {err}: {aws_message}")
    };
    match classify(code.as_deref(), &aws_message, missing_as_not_found) {
        Classification::Retryable => StoreError::Internal {
            message: detail,
            retryable: true,
            source: Some(Box::new(err)),
        },
        Classification::Terminal => StoreError::Internal {
            message: detail,
            retryable: false,
            source: Some(Box::new(err)),
        },
        Classification::NotFound => StoreError::NotFound,
        Classification::BadRequest => {
            tracing::warn!(op, error = %detail, "dynamodb rejected the item");
            StoreError::bad_request("item failed backend validation")
        }
    }
}
