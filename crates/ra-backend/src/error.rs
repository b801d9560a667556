//! Backend construction errors.
//!
//! Runtime failures never surface here: they are reported through
//! [`crate::ApiResponse`].

use thiserror::Error;

/// Errors raised while building a backend client.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    /// A configured URL is unusable.
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type for backend construction.
pub type BackendResult<T> = Result<T, BackendError>;
