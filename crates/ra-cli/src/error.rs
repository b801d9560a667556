//! CLI error types.

use ra_backend::BackendError;
use ra_bus::BusError;
use ra_core::CoreError;
use ra_transform::TransformError;
use thiserror::Error;

/// CLI error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] CoreError),

    /// A backend client could not be built.
    #[error("backend setup failed: {0}")]
    Backend(#[from] BackendError),

    /// The message bus could not be reached or rejected a request.
    #[error("message bus error: {0}")]
    Bus(#[from] BusError),

    /// A message could not be mapped to a backend payload.
    #[error("transformation failed: {0}")]
    Transform(#[from] TransformError),

    /// No pairing with the given name.
    #[error("no pairing named '{0}' in the configuration")]
    UnknownPairing(String),

    /// One or more pairing cycles were aborted.
    #[error("{failed} of {total} pairing cycles failed")]
    CyclesFailed {
        /// Aborted cycles.
        failed: usize,
        /// Cycles run.
        total: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML serialization error.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// CLI result type.
pub type CliResult<T> = Result<T, CliError>;
