//! Basic HTTP client for the store service.
//!
//! [`BasicClient`] issues the CRUD calls against one bucket of one service
//! instance. Every request flows through the configured
//! [`Acquirer`](crate::auth::Acquirer) for its `Authorization` header and
//! carries the owner claim in `X-Midt-Owner` when one is given. Non-2xx
//! responses translate into the typed [`ClientError`] kinds: 400 becomes
//! `BadRequest` with the sanitized message from the error header, 401/403
//! become `FailedAuthentication`, anything else `NonSuccess`.

use std::fmt;
use std::sync::Arc;

use argus::model::Item;
use argus::service::{ERROR_HEADER, OWNER_HEADER};
use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use url::Url;

use crate::auth::{Acquirer, NoopAcquirer};
use crate::error::ClientError;
use crate::listener::Reader;

/// The result of an upsert: whether the service created or updated the
/// record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushResult {
    /// The record did not exist before; the service responded 201.
    Created,
    /// An existing record was overwritten; the service responded 200.
    Updated,
}

/// Configuration for [`BasicClient`].
#[derive(Clone, Default)]
pub struct ClientConfig {
    /// Base address of the service, e.g. `http://localhost:6600`.
    pub address: String,
    /// The bucket all calls operate on.
    pub bucket: String,
    /// Credential source; defaults to unauthenticated.
    pub auth: Option<Arc<dyn Acquirer>>,
    /// HTTP client to reuse; defaults to a fresh pooled client.
    pub http_client: Option<reqwest::Client>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("address", &self.address)
            .field("bucket", &self.bucket)
            .field("auth", &self.auth.is_some())
            .finish_non_exhaustive()
    }
}

/// HTTP client bound to one bucket of one store service.
///
/// Cheap to clone; the underlying connection pool is shared.
///
/// # Examples
///
/// ```rust,no_run
/// use chrysom::client::{BasicClient, ClientConfig};
///
/// # fn example() -> Result<(), chrysom::ClientError> {
/// let client = BasicClient::new(ClientConfig {
///     address: "http://localhost:6600".to_string(),
///     bucket: "bucket01".to_string(),
///     ..ClientConfig::default()
/// })?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct BasicClient {
    http: reqwest::Client,
    bucket_url: Url,
    auth: Arc<dyn Acquirer>,
}

impl fmt::Debug for BasicClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicClient")
            .field("bucket_url", &self.bucket_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BasicClient {
    /// Builds a client, validating the bucket name and the service
    /// address.
    ///
    /// # Errors
    ///
    /// [`ClientError::InvalidBucket`] when the bucket name does not
    /// satisfy the bucket format; [`ClientError::InvalidAddress`] when
    /// the address does not parse as a URL.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        if !argus::validation::is_bucket_valid(&config.bucket) {
            return Err(ClientError::InvalidBucket {
                bucket: config.bucket,
            });
        }
        let bucket_url = Url::parse(&format!(
            "{}/api/v1/store/{}",
            config.address.trim_end_matches('/'),
            config.bucket
        ))?;
        Ok(Self {
            http: config.http_client.unwrap_or_default(),
            bucket_url,
            auth: config.auth.unwrap_or_else(|| Arc::new(NoopAcquirer)),
        })
    }

    fn item_url(&self, id: &str) -> String {
        format!("{}/{}", self.bucket_url, id)
    }

    async fn send(
        &self,
        mut request: reqwest::RequestBuilder,
        owner: &str,
    ) -> Result<(StatusCode, Option<String>, Vec<u8>), ClientError> {
        if let Some(credential) = self.auth.acquire().await? {
            request = request.header(AUTHORIZATION, credential);
        }
        if !owner.is_empty() {
            request = request.header(OWNER_HEADER, owner);
        }
        let response = request.send().await?;
        let status = response.status();
        let error_header = response
            .headers()
            .get(ERROR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?.to_vec();
        Ok((status, error_header, body))
    }

    /// Upserts `item` under the claimed owner.
    ///
    /// # Errors
    ///
    /// [`ClientError::MissingItemId`] / [`ClientError::MissingItemData`]
    /// before any request is sent; otherwise the translated non-success
    /// kinds.
    pub async fn push_item(&self, owner: &str, item: &Item) -> Result<PushResult, ClientError> {
        if item.id.is_empty() {
            return Err(ClientError::MissingItemId);
        }
        if item.data.is_empty() {
            return Err(ClientError::MissingItemData);
        }
        let request = self.http.put(self.item_url(&item.id)).json(item);
        let (status, error_header, _body) = self.send(request, owner).await?;
        match status {
            StatusCode::CREATED => Ok(PushResult::Created),
            StatusCode::OK => Ok(PushResult::Updated),
            _ => Err(translate_non_success(status, error_header)),
        }
    }

    /// Fetches the items visible to the claimed owner.
    pub async fn get_items(&self, owner: &str) -> Result<Vec<Item>, ClientError> {
        let request = self.http.get(self.bucket_url.clone());
        let (status, error_header, body) = self.send(request, owner).await?;
        if !status.is_success() {
            return Err(translate_non_success(status, error_header));
        }
        serde_json::from_slice(&body).map_err(ClientError::Decode)
    }

    /// Deletes the item with `id` and returns the deleted value.
    pub async fn remove_item(&self, id: &str, owner: &str) -> Result<Item, ClientError> {
        let request = self.http.delete(self.item_url(id));
        let (status, error_header, body) = self.send(request, owner).await?;
        if !status.is_success() {
            return Err(translate_non_success(status, error_header));
        }
        serde_json::from_slice(&body).map_err(ClientError::Decode)
    }
}

#[async_trait]
impl Reader for BasicClient {
    async fn get_items(&self, owner: &str) -> Result<Vec<Item>, ClientError> {
        BasicClient::get_items(self, owner).await
    }
}

fn translate_non_success(status: StatusCode, error_header: Option<String>) -> ClientError {
    match status.as_u16() {
        400 => ClientError::BadRequest {
            message: error_header.unwrap_or_else(|| "bad request".to_string()),
        },
        401 | 403 => ClientError::FailedAuthentication {
            status: status.as_u16(),
        },
        _ => ClientError::NonSuccess {
            status: status.as_u16(),
        },
    }
}
