//! Pluggable acquisition of the `Authorization` header.
//!
//! Every outgoing request asks its [`Acquirer`] for a credential; the
//! default [`NoopAcquirer`] sends none. Acquirers may cache tokens
//! internally and must be safe for concurrent use, because the client is
//! shared across request tasks.

use std::fmt;

use async_trait::async_trait;

use crate::error::ClientError;

/// Produces the `Authorization` header value for outgoing requests, or
/// `None` to send the request unauthenticated.
#[async_trait]
pub trait Acquirer: Send + Sync {
    /// Acquires the current credential.
    ///
    /// # Errors
    ///
    /// [`ClientError::Acquire`] when no credential can be produced; the
    /// request is not sent.
    async fn acquire(&self) -> Result<Option<String>, ClientError>;
}

/// Sends requests unauthenticated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopAcquirer;

#[async_trait]
impl Acquirer for NoopAcquirer {
    async fn acquire(&self) -> Result<Option<String>, ClientError> {
        Ok(None)
    }
}

/// Sends a fixed bearer token on every request.
///
/// # Examples
///
/// ```
/// use chrysom::auth::StaticBearerAcquirer;
///
/// let acquirer = StaticBearerAcquirer::new("my-token");
/// assert!(!format!("{acquirer:?}").contains("my-token"));
/// ```
#[derive(Clone)]
pub struct StaticBearerAcquirer {
    token: String,
}

impl StaticBearerAcquirer {
    /// Wraps a bearer token.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl fmt::Debug for StaticBearerAcquirer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticBearerAcquirer")
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl Acquirer for StaticBearerAcquirer {
    async fn acquire(&self) -> Result<Option<String>, ClientError> {
        Ok(Some(format!("Bearer {}", self.token)))
    }
}
