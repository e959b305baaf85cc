//! Error types for data operations.
//!
//! This module defines [`DataError`] which covers all error cases that can occur
//! when invoking the gateway, reading a direct source, parsing a payload, or
//! touching the cache.

use thiserror::Error;

/// Errors that can occur during data operations.
#[derive(Error, Debug)]
pub enum DataError {
    /// Transport failures (connection errors, timeouts, non-success status).
    #[error("Network error: {0}")]
    Network(String),

    /// The upstream provider reported its call limit.
    ///
    /// Callers should back off rather than retry immediately.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The upstream provider answered with an explicit error message.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Error parsing data from a source.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Error interacting with the cache.
    #[error("Cache error: {0}")]
    Cache(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl DataError {
    /// Returns true if this error is a rate-limit notice.
    #[must_use]
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;
