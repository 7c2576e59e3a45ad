//! Unified error types for petrank.
//!
//! The display prefix of each variant is a stable code that also shows up in
//! MCP error messages and log lines.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

/// Unified error types for the petrank components.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty entity id).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Durable cache database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Invalid URL or base URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Remote call timed out.
    #[error("REMOTE_TIMEOUT: {0}")]
    RemoteTimeout(String),

    /// Remote service rejected the credentials.
    #[error("REMOTE_AUTH_ERROR: {0}")]
    RemoteAuth(String),

    /// Remote service returned an error status or an unusable body.
    #[error("REMOTE_ERROR: {0}")]
    Remote(String),

    /// The requested row does not exist in the remote store.
    #[error("NOT_FOUND: {0}")]
    NotFound(String),

    /// The remote store does not offer the requested operation.
    #[error("UNSUPPORTED: {0}")]
    Unsupported(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::InvalidUrl(msg) => (-32003, msg.clone()),
            Error::RemoteTimeout(msg) => (-32006, msg.clone()),
            Error::Remote(msg) => (-32008, msg.clone()),
            Error::RemoteAuth(msg) => (-32009, msg.clone()),
            Error::NotFound(msg) => (-32001, msg.clone()),
            Error::Unsupported(msg) => (-32013, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
