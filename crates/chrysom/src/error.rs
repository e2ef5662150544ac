//! Error types for the client and the listener lifecycle.

use thiserror::Error;

/// Errors from HTTP calls against the store service.
///
/// # Examples
///
/// ```
/// use chrysom::ClientError;
///
/// let err = ClientError::FailedAuthentication { status: 403 };
/// assert!(err.to_string().contains("403"));
/// ```
#[derive(Debug, Error)]
pub enum ClientError {
    /// `push_item` was called with an empty item id.
    #[error("item ID is required")]
    MissingItemId,

    /// `push_item` was called with empty item data.
    #[error("item data is required")]
    MissingItemData,

    /// The configured bucket name does not satisfy the bucket format.
    #[error("invalid bucket name: {bucket}")]
    InvalidBucket {
        /// The rejected bucket name.
        bucket: String,
    },

    /// The configured service address is not a valid URL.
    #[error("invalid service address: {0}")]
    InvalidAddress(#[from] url::ParseError),

    /// The service rejected the request as malformed (HTTP 400).
    #[error("bad request: {message}")]
    BadRequest {
        /// The sanitized message from the error header, when present.
        message: String,
    },

    /// The service rejected the request's credentials (HTTP 401/403).
    #[error("failed authentication with status {status}")]
    FailedAuthentication {
        /// The rejecting status code.
        status: u16,
    },

    /// Any other non-2xx response.
    #[error("request failed with status {status}")]
    NonSuccess {
        /// The response status code.
        status: u16,
    },

    /// The auth acquirer could not produce a credential.
    #[error("failed to acquire authorization: {0}")]
    Acquire(String),

    /// The HTTP request itself failed.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// A 2xx response body did not decode as expected.
    #[error("failed to decode response body: {0}")]
    Decode(#[source] serde_json::Error),
}

/// Errors from listener construction and lifecycle transitions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ListenerError {
    /// The builder was not given a listener.
    #[error("no listener provided")]
    NoListenerProvided,

    /// The builder was not given a reader.
    #[error("no reader provided")]
    NoReaderProvided,

    /// The builder was not given a measures handle.
    #[error("no measures provided")]
    NoMeasuresProvided,

    /// `start` was called with a zero pull interval.
    #[error("interval ticker is undefined")]
    UndefinedIntervalTicker,

    /// `start` was called while the client was not stopped.
    #[error("listener is not in the stopped state")]
    NotStopped,

    /// `stop` was called while the client was not running.
    #[error("listener is not in the running state")]
    NotRunning,
}
