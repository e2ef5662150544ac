//! Error taxonomy for store operations.
//!
//! [`StoreError`] is the closed set of failures the storage and transport
//! layers produce. Every kind has three projections: the primary message
//! (`Display`), an HTTP status ([`StoreError::status_code`]), and a
//! sanitized message ([`StoreError::sanitized`]) that is safe to surface
//! across trust boundaries in the `X-Midt-Error` response header.
//!
//! `Internal` failures keep the raw backend text in their `Display` output
//! and `source` chain so logs retain full detail, while `sanitized()`
//! collapses them to a generic message that leaks nothing.

use http::StatusCode;
use thiserror::Error;

/// The sanitized message surfaced for all internal failures.
pub const INTERNAL_SANITIZED_MESSAGE: &str = "store operation failed";

/// Errors produced by store operations and request handling.
///
/// # Examples
///
/// ```
/// use argus::error::StoreError;
/// use http::StatusCode;
///
/// let err = StoreError::bad_request("Invalid ID format");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.sanitized(), "Invalid ID format");
///
/// let err = StoreError::internal("connection reset by dynamodb endpoint");
/// assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
/// assert_eq!(err.sanitized(), "store operation failed");
/// assert!(!err.is_retryable());
/// ```
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request was malformed: bad JSON, invalid id/bucket/owner
    /// format, id mismatch, empty data, or excessive nesting depth.
    #[error("{message}")]
    BadRequest {
        /// Names the faulty field; safe to surface.
        message: String,
    },

    /// The caller does not own the resource and lacks elevated access.
    #[error("resource owner mismatch")]
    Forbidden,

    /// The record is absent or has expired.
    #[error("item not found")]
    NotFound,

    /// A backend or marshaling failure. The message and source keep the
    /// raw detail for logs; `sanitized()` hides it from responses.
    #[error("{message}")]
    Internal {
        /// Raw failure detail; log-only.
        message: String,
        /// Whether upstream retry middleware may re-issue the operation.
        retryable: bool,
        /// The underlying error, if available.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl StoreError {
    /// Creates a `BadRequest` with the given message.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Creates a non-retryable `Internal` error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            retryable: false,
            source: None,
        }
    }

    /// Creates a retryable `Internal` error.
    pub fn retryable(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            retryable: true,
            source: None,
        }
    }

    /// Attaches an underlying error to an `Internal` kind; no-op for the
    /// other kinds.
    pub fn with_source(mut self, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        if let Self::Internal { source, .. } = &mut self {
            *source = Some(Box::new(err));
        }
        self
    }

    /// The HTTP status the encoder writes for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The message safe to surface across trust boundaries.
    ///
    /// `BadRequest`, `Forbidden`, and `NotFound` messages are their own
    /// sanitized form; `Internal` collapses to
    /// [`INTERNAL_SANITIZED_MESSAGE`].
    pub fn sanitized(&self) -> String {
        match self {
            Self::Internal { .. } => INTERNAL_SANITIZED_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }

    /// Whether upstream retry middleware may re-issue the operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Internal { retryable: true, .. })
    }
}
