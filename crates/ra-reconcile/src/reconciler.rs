//! Per-request reconciliation.

use std::sync::Arc;

use ra_backend::response::NO_RESPONSE;
use ra_model::{is_success_status, ChangeRequest, DeploymentType, OutcomeRecord, ServiceId};
use tracing::{info, warn};

use crate::deployer::{Deployer, Deployment};
use crate::error::{DeployError, DeployResult};

/// Applies change requests through one deployer and turns every result,
/// successful or not, into an [`OutcomeRecord`].
#[derive(Clone)]
pub struct Reconciler {
    deployer: Arc<dyn Deployer>,
    agent_id: Option<u64>,
    deployer_name: Option<String>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("backend", &self.deployer.backend())
            .field("agent_id", &self.agent_id)
            .field("deployer_name", &self.deployer_name)
            .finish()
    }
}

impl Reconciler {
    /// Creates a reconciler over `deployer`.
    #[must_use]
    pub fn new(deployer: Arc<dyn Deployer>) -> Self {
        Self {
            deployer,
            agent_id: None,
            deployer_name: None,
        }
    }

    /// Sets the identity echoed in every outcome.
    #[must_use]
    pub fn with_identity(mut self, agent_id: Option<u64>, deployer_name: Option<String>) -> Self {
        self.agent_id = agent_id;
        self.deployer_name = deployer_name;
        self
    }

    /// Returns the deployer.
    #[must_use]
    pub fn deployer(&self) -> &Arc<dyn Deployer> {
        &self.deployer
    }

    /// Applies `request` and reports the outcome. Never fails.
    pub async fn reconcile(&self, request: &ChangeRequest) -> OutcomeRecord {
        let result = self.apply(request).await;
        let outcome = match result {
            Ok(deployment) => self.deployed(request, deployment),
            Err(error) => self.failed(request, &error),
        };
        outcome.with_deployer(self.agent_id, self.deployer_name.as_deref())
    }

    /// Error outcome for a request that could not be applied.
    #[must_use]
    pub fn failure(&self, request: &ChangeRequest, error: &DeployError) -> OutcomeRecord {
        self.failed(request, error)
            .with_deployer(self.agent_id, self.deployer_name.as_deref())
    }

    /// Error outcome carrying a fixed description, for inputs that never
    /// became a [`ChangeRequest`].
    #[must_use]
    pub fn rejection(&self, id: ServiceId, description: impl Into<String>) -> OutcomeRecord {
        OutcomeRecord::failure(id, description)
            .with_deployer(self.agent_id, self.deployer_name.as_deref())
    }

    async fn apply(&self, request: &ChangeRequest) -> DeployResult<Deployment> {
        match request.deployment_type {
            DeploymentType::Create => self.deployer.create(request).await,
            DeploymentType::Edit => {
                let locator = self.locator(request)?;
                self.deployer.update(request, &locator).await
            }
            DeploymentType::Delete => {
                let locator = self.locator(request)?;
                self.deployer.delete(request, &locator).await
            }
        }
    }

    /// Backend identifier for edits and deletes. Natural-key backends always
    /// use the registry ID and ignore any `external_id` on the request.
    fn locator(&self, request: &ChangeRequest) -> DeployResult<String> {
        if self.deployer.locates_by_natural_key() {
            return Ok(request.id.to_string());
        }
        request
            .external_id()
            .map(str::to_string)
            .ok_or(DeployError::MissingExternalId(request.deployment_type))
    }

    fn deployed(&self, request: &ChangeRequest, deployment: Deployment) -> OutcomeRecord {
        let outcome = OutcomeRecord::from_status(request.id.clone(), deployment.status, None)
            .with_external_id(deployment.external_id)
            .with_client_id(deployment.client_id);

        if outcome.is_deployed() {
            info!(
                backend = self.deployer.backend(),
                service_id = %request.id,
                deployment_type = %request.deployment_type,
                status = deployment.status,
                "change deployed"
            );
        } else {
            warn!(
                backend = self.deployer.backend(),
                service_id = %request.id,
                deployment_type = %request.deployment_type,
                status = deployment.status,
                "backend answered with a non-success status"
            );
        }
        outcome
    }

    fn failed(&self, request: &ChangeRequest, error: &DeployError) -> OutcomeRecord {
        let description = if error.is_transport() {
            self.deployer.unreachable_description().to_string()
        } else {
            error.to_string()
        };

        // A failure never reports a success status.
        let status = if is_success_status(error.status()) {
            NO_RESPONSE
        } else {
            error.status()
        };

        warn!(
            backend = self.deployer.backend(),
            service_id = %request.id,
            deployment_type = %request.deployment_type,
            status,
            error = %error,
            "change failed"
        );
        OutcomeRecord::from_status(request.id.clone(), status, Some(description))
    }
}
