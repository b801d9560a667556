//! Per-item deployment errors.
//!
//! A [`DeployError`] never leaves the reconciler: it is converted into an
//! error outcome for the item that caused it.

use ra_backend::ApiFailure;
use ra_bus::BusError;
use ra_model::DeploymentType;
use ra_transform::TransformError;
use thiserror::Error;

/// Result type alias for deployer operations.
pub type DeployResult<T> = std::result::Result<T, DeployError>;

/// Why a change request could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    /// The request could not be mapped to a backend payload.
    #[error("invalid change request: {0}")]
    Transform(#[from] TransformError),

    /// The backend call failed or was never answered.
    #[error("{description}")]
    Backend {
        /// HTTP status, `0` when no response was obtained.
        status: u16,
        /// Failure description.
        description: String,
    },

    /// An edit or delete arrived without a backend identifier.
    #[error("external_id is required for {0} requests")]
    MissingExternalId(DeploymentType),

    /// A follow-up call after the primary operation failed and policy says
    /// to report it.
    #[error("{operation} failed after the primary operation: {description}")]
    FollowUp {
        /// Follow-up operation that failed.
        operation: &'static str,
        /// HTTP status, `0` when no response was obtained.
        status: u16,
        /// Failure description.
        description: String,
    },
}

impl DeployError {
    /// Returns the status to report: the backend status where one exists,
    /// `0` otherwise.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::Backend { status, .. } | Self::FollowUp { status, .. } => *status,
            Self::Transform(_) | Self::MissingExternalId(_) => 0,
        }
    }

    /// Returns whether the request itself was at fault.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Transform(_) | Self::MissingExternalId(_))
    }

    /// Returns whether no backend response was obtained.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Backend { status: 0, .. } | Self::FollowUp { status: 0, .. })
    }
}

impl From<ApiFailure> for DeployError {
    fn from(failure: ApiFailure) -> Self {
        Self::Backend {
            status: failure.status,
            description: failure.description,
        }
    }
}

/// Bus step of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    /// Pulling pending messages.
    Pull,
    /// Publishing outcomes.
    Publish,
    /// Acknowledging pulled messages.
    Ack,
}

impl std::fmt::Display for CycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Pull => "pull",
            Self::Publish => "publish",
            Self::Ack => "ack",
        })
    }
}

/// A cycle aborted by a bus failure. Messages pulled in the cycle are not
/// acknowledged and will be delivered again.
#[derive(Debug, Error)]
#[error("{stage} failed for pairing '{pairing}': {source}")]
pub struct CycleError {
    /// Pairing name.
    pub pairing: String,
    /// Step that failed.
    pub stage: CycleStage,
    /// Bus error.
    #[source]
    pub source: BusError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let transport = DeployError::from(ApiFailure::new(0, "connection refused"));
        assert!(transport.is_transport());
        assert_eq!(transport.status(), 0);

        let conflict = DeployError::from(ApiFailure::new(409, "Client exists"));
        assert!(!conflict.is_transport());
        assert_eq!(conflict.status(), 409);
        assert_eq!(conflict.to_string(), "Client exists");

        let missing = DeployError::MissingExternalId(DeploymentType::Edit);
        assert!(missing.is_validation());
        assert_eq!(missing.to_string(), "external_id is required for edit requests");
    }
}
