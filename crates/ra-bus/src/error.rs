//! Bus errors.

use thiserror::Error;

/// Result type alias for bus operations.
pub type BusResult<T> = std::result::Result<T, BusError>;

/// Errors talking to the message bus.
#[derive(Debug, Error)]
pub enum BusError {
    /// The bus could not be reached.
    #[error("bus request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The bus answered with a non-success status.
    #[error("bus returned HTTP {status}: {message}")]
    Status {
        /// HTTP status.
        status: u16,
        /// Response body or error message.
        message: String,
    },

    /// A response or message payload could not be decoded.
    #[error("failed to decode bus payload: {0}")]
    Decode(String),

    /// The configured endpoint is not usable.
    #[error("invalid bus endpoint '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// Endpoint as configured.
        endpoint: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl BusError {
    /// Returns whether the error came from the network rather than the bus
    /// rejecting the request.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<serde_json::Error> for BusError {
    fn from(e: serde_json::Error) -> Self {
        Self::Decode(e.to_string())
    }
}
