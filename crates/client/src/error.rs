//! Remote client error types.

use std::sync::Arc;

/// Errors from the backend REST and storage endpoints.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// The configured base URL or a derived endpoint is not a valid URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Authentication failed (invalid or missing API key).
    #[error("authentication failed: HTTP {status}")]
    Auth { status: u16 },

    /// The addressed row or object does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Rate limited by the backend.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { RemoteError::Timeout } else { RemoteError::Network(Arc::new(err)) }
    }
}

impl From<RemoteError> for petrank_core::Error {
    fn from(err: RemoteError) -> Self {
        use petrank_core::Error;

        match err {
            RemoteError::InvalidUrl(msg) => Error::InvalidUrl(msg),
            RemoteError::Auth { .. } => Error::RemoteAuth(err.to_string()),
            RemoteError::NotFound(msg) => Error::NotFound(msg),
            RemoteError::Timeout => Error::RemoteTimeout(err.to_string()),
            RemoteError::RateLimited
            | RemoteError::HttpError { .. }
            | RemoteError::Network(_)
            | RemoteError::Parse(_) => Error::Remote(err.to_string()),
        }
    }
}
