//! Error handling for configuration and process setup.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using the core error type.
pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Errors raised while loading configuration or initialising the process.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration is invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// Path that failed.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file is not valid TOML for the expected shape.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// Logging could not be initialised.
    #[error("logging error: {0}")]
    Logging(String),
}

impl CoreError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns whether this error was caused by the configuration content
    /// rather than the environment.
    #[must_use]
    pub const fn is_config_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::Parse(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_message() {
        let error = CoreError::config("batch_size must be at least 1");
        assert_eq!(
            error.to_string(),
            "configuration error: batch_size must be at least 1"
        );
        assert!(error.is_config_error());
    }

    #[test]
    fn io_error_is_not_config_error() {
        let error = CoreError::Io {
            path: PathBuf::from("/nope.toml"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        };
        assert!(!error.is_config_error());
        assert!(error.to_string().contains("/nope.toml"));
    }
}
