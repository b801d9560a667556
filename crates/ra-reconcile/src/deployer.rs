//! Backend deployment strategies.

use async_trait::async_trait;
use ra_backend::ApiFailure;
use ra_model::ChangeRequest;
use tracing::warn;

use crate::error::{DeployError, DeployResult};

/// Identifiers and status of an applied change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Deployment {
    /// Status of the primary backend call.
    pub status: u16,
    /// Backend identifier of the entity.
    pub external_id: Option<String>,
    /// Client or entity identifier of the service.
    pub client_id: Option<String>,
}

impl Deployment {
    /// Creates a deployment result.
    #[must_use]
    pub const fn new(status: u16) -> Self {
        Self {
            status,
            external_id: None,
            client_id: None,
        }
    }

    /// Sets the backend identifier.
    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Sets the client identifier.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

/// Applies change requests to one backend.
///
/// Implementations are chosen once per pairing. Each method runs its backend
/// calls strictly in sequence and never rolls back the primary operation
/// when a follow-up call fails.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Backend kind, for logs.
    fn backend(&self) -> &'static str;

    /// Description reported when the backend could not be reached.
    fn unreachable_description(&self) -> &'static str;

    /// Returns whether entities are addressed by the registry service ID.
    /// Edits and deletes then ignore the request's `external_id`.
    fn locates_by_natural_key(&self) -> bool {
        false
    }

    /// Called at the start of every cycle, before any request is applied.
    async fn begin_cycle(&self) {}

    /// Creates the entity for `request`.
    async fn create(&self, request: &ChangeRequest) -> DeployResult<Deployment>;

    /// Updates the entity identified by `external_id`.
    async fn update(&self, request: &ChangeRequest, external_id: &str) -> DeployResult<Deployment>;

    /// Deletes the entity identified by `external_id`.
    async fn delete(&self, request: &ChangeRequest, external_id: &str) -> DeployResult<Deployment>;
}

/// What to do when a call following a successful primary operation fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FollowUpPolicy {
    /// Log the failure and report the primary outcome.
    #[default]
    Warn,
    /// Report the first failure as the item's outcome.
    Fail,
}

impl FollowUpPolicy {
    /// Policy from the `fail_on_follow_up_error` setting.
    #[must_use]
    pub const fn from_flag(fail_on_follow_up_error: bool) -> Self {
        if fail_on_follow_up_error {
            Self::Fail
        } else {
            Self::Warn
        }
    }
}

/// Collects follow-up failures of one request.
#[derive(Debug, Default)]
pub struct FollowUps {
    failures: Vec<(&'static str, ApiFailure)>,
}

impl FollowUps {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the outcome of a follow-up call, returning its value on
    /// success.
    pub fn check<T>(&mut self, operation: &'static str, result: Result<T, ApiFailure>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(failure) => {
                warn!(
                    operation,
                    status = failure.status,
                    error = %failure.description,
                    "follow-up call failed"
                );
                self.failures.push((operation, failure));
                None
            }
        }
    }

    /// Returns whether every follow-up succeeded.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Applies `policy` to the primary result.
    pub fn settle(self, policy: FollowUpPolicy, deployment: Deployment) -> DeployResult<Deployment> {
        match (policy, self.failures.into_iter().next()) {
            (FollowUpPolicy::Fail, Some((operation, failure))) => Err(DeployError::FollowUp {
                operation,
                status: failure.status,
                description: failure.description,
            }),
            _ => Ok(deployment),
        }
    }
}
