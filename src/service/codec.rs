//! Request decoding and response encoding for the store routes.
//!
//! Decoding validates everything before the DAO sees it: path variables
//! against the configured regexes, the owner header, and (for PUT) the
//! body in the fixed order JSON → non-empty data → id match → ttl sign →
//! ttl clamp → depth. Encoding is a single rule: errors become an empty
//! body with the sanitized message in `X-Midt-Error`; successes are JSON.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderName, HeaderValue};
use axum::response::{IntoResponse, Response};

use crate::auth::{self, AuthAttributes};
use crate::error::{StoreError, INTERNAL_SANITIZED_MESSAGE};
use crate::model::Item;
use crate::service::{StoreHandler, OWNER_HEADER};
use crate::validation::Validators;

static ERROR_HEADER_NAME: HeaderName = HeaderName::from_static("x-midt-error");

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Internal { .. }) {
            tracing::error!(error = %self, "request failed");
        }
        let sanitized = HeaderValue::from_str(&self.sanitized())
            .unwrap_or_else(|_| HeaderValue::from_static(INTERNAL_SANITIZED_MESSAGE));
        let mut response = self.status_code().into_response();
        response
            .headers_mut()
            .insert(ERROR_HEADER_NAME.clone(), sanitized);
        response
    }
}

/// Whether the request's auth attributes grant elevated access.
///
/// Reads the [`AuthAttributes`] extension the authentication layer
/// installed; an absent extension means normal access.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AdminMode(pub bool);

impl FromRequestParts<Arc<StoreHandler>> for AdminMode {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<StoreHandler>,
    ) -> Result<Self, Self::Rejection> {
        let attrs = parts.extensions.get::<AuthAttributes>();
        Ok(Self(auth::admin_mode(attrs, &state.access)))
    }
}

/// Validates a bucket path variable.
pub(crate) fn decode_bucket(validators: &Validators, bucket: &str) -> Result<String, StoreError> {
    if !validators.is_bucket_valid(bucket) {
        return Err(StoreError::bad_request("Invalid bucket format"));
    }
    Ok(bucket.to_string())
}

/// Lower-cases and validates an id path variable.
pub(crate) fn decode_id(validators: &Validators, id: &str) -> Result<String, StoreError> {
    let id = id.to_lowercase();
    if !validators.is_id_valid(&id) {
        return Err(StoreError::bad_request("Invalid ID format"));
    }
    Ok(id)
}

/// Extracts and validates the owner claim from the request headers.
/// Absent headers decode to the empty (public) owner.
pub(crate) fn decode_owner(
    validators: &Validators,
    headers: &axum::http::HeaderMap,
) -> Result<String, StoreError> {
    let owner = headers
        .get(OWNER_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !validators.is_owner_valid(owner) {
        return Err(StoreError::bad_request("Invalid owner format"));
    }
    Ok(owner.to_string())
}

/// Decodes a PUT body into an [`Item`], enforcing the fixed validation
/// order from the transport contract.
pub(crate) fn decode_item_body(
    validators: &Validators,
    path_id: &str,
    body: &[u8],
) -> Result<Item, StoreError> {
    let mut item: Item = serde_json::from_slice(body)
        .map_err(|err| StoreError::bad_request(format!("Invalid JSON payload: {err}")))?;
    if item.data.is_empty() {
        return Err(StoreError::bad_request("Item data must not be empty"));
    }
    if item.id != path_id {
        return Err(StoreError::bad_request(
            "Item ID must match the ID in the resource path",
        ));
    }
    if item.ttl.is_some_and(|ttl| ttl < 0) {
        return Err(StoreError::bad_request("TTL must be a non-negative number"));
    }
    validators.clamp_ttl(&mut item);
    if !validators.valid_depth(&item.data) {
        return Err(StoreError::bad_request(
            "Item data exceeds the maximum allowed nesting depth",
        ));
    }
    Ok(item)
}
