//! Validation errors raised while building backend payloads.

use ra_model::ServiceProtocol;
use thiserror::Error;

/// Result type alias for transformations.
pub type TransformResult<T> = std::result::Result<T, TransformError>;

/// A change request that cannot be mapped to a backend payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    /// A field the backend needs is absent or empty.
    #[error("missing required field '{0}'")]
    MissingField(&'static str),

    /// A field carries a value the backend cannot represent.
    #[error("invalid value for '{field}': {reason}")]
    InvalidField {
        /// Offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// The request targets a protocol this backend does not serve.
    #[error("protocol {found:?} is not supported by this backend (expected {expected:?})")]
    UnsupportedProtocol {
        /// Protocol the backend serves.
        expected: ServiceProtocol,
        /// Protocol the request carries.
        found: ServiceProtocol,
    },
}

impl TransformError {
    /// Creates an invalid-field error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Returns the non-empty value of a required field.
pub(crate) fn required<'a>(field: &'static str, value: Option<&'a str>) -> TransformResult<&'a str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(TransformError::MissingField(field))
}
