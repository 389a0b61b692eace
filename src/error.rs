//! Error types shared across the pipeline.

use thiserror::Error;

/// Result type used throughout the library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the harvesting pipeline.
///
/// Filter rejections are not errors; they are ordinary negative outcomes
/// and components model them as `Option`/`bool` returns instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Request exceeded the per-fetch timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Server answered with a non-success status
    #[error("HTTP {status} for {path}")]
    HttpStatus { status: u16, path: String },

    /// Connection-level failure (reset, DNS, TLS, ...)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Database operation error (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// I/O operation error (wraps std::io::Error)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Release archive creation failure
    #[error("Archive error: {0}")]
    Archive(String),

    /// Internal invariant violation
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether a retry of the same request may succeed.
    ///
    /// All transport-level failures are retryable; everything else is not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Error::Timeout(_) | Error::HttpStatus { .. } | Error::Connection(_)
        )
    }
}
