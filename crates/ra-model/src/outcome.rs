//! Deployment outcomes reported back to the registry.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::request::ServiceId;

/// HTTP statuses a backend answers with on success.
pub const SUCCESS_STATUSES: [u16; 3] = [200, 201, 204];

/// Returns whether `status` is one of the backend success codes.
#[must_use]
pub fn is_success_status(status: u16) -> bool {
    SUCCESS_STATUSES.contains(&status)
}

/// Deployment state as tracked by the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentState {
    /// The backend accepted the change.
    Deployed,
    /// The change failed.
    Error,
    /// The change is queued on the backend side.
    WaitingDeployment,
}

/// Result of processing one change request.
///
/// Construct through [`OutcomeRecord::from_status`], which derives `state`
/// from `status_code`: the state is `error` exactly when the status is not a
/// success code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Registry service identifier.
    pub id: ServiceId,

    /// Backend identifier; present only on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,

    /// Numeric agent identifier of the deployer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<u64>,

    /// Name of the deployer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployer_name: Option<String>,

    /// Backend HTTP status, `0` when no response was obtained.
    pub status_code: u16,

    /// Resulting state.
    pub state: DeploymentState,

    /// Failure description; present only on error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,

    /// Client or entity identifier of the deployed service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

impl OutcomeRecord {
    /// Creates an outcome for `status`. `error_description` is kept only when
    /// the status is not a success code.
    #[must_use]
    pub fn from_status(id: ServiceId, status_code: u16, error_description: Option<String>) -> Self {
        let success = is_success_status(status_code);
        Self {
            id,
            external_id: None,
            agent_id: None,
            deployer_name: None,
            status_code,
            state: if success {
                DeploymentState::Deployed
            } else {
                DeploymentState::Error
            },
            error_description: if success {
                None
            } else {
                Some(error_description.unwrap_or_else(|| format!("HTTP {status_code}")))
            },
            client_id: None,
        }
    }

    /// Creates an error outcome for a failure where no backend response was
    /// obtained.
    #[must_use]
    pub fn failure(id: ServiceId, error_description: impl Into<String>) -> Self {
        Self::from_status(id, 0, Some(error_description.into()))
    }

    /// Sets the backend identifier. Ignored on error outcomes and for empty
    /// identifiers.
    #[must_use]
    pub fn with_external_id(mut self, external_id: Option<String>) -> Self {
        if self.is_deployed() {
            self.external_id = external_id.filter(|s| !s.is_empty());
        }
        self
    }

    /// Sets the client identifier. Ignored on error outcomes and for empty
    /// identifiers.
    #[must_use]
    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        if self.is_deployed() {
            self.client_id = client_id.filter(|s| !s.is_empty());
        }
        self
    }

    /// Stamps the deployer identity.
    #[must_use]
    pub fn with_deployer(mut self, agent_id: Option<u64>, deployer_name: Option<&str>) -> Self {
        self.agent_id = agent_id;
        self.deployer_name = deployer_name.filter(|s| !s.is_empty()).map(str::to_string);
        self
    }

    /// Returns whether the change was deployed.
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        self.state == DeploymentState::Deployed
    }
}

/// Message published to the bus: `{attributes: {}, data: OutcomeRecord}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// Message attributes (always empty today).
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Outcome payload.
    pub data: OutcomeRecord,
}

impl From<OutcomeRecord> for OutboundMessage {
    fn from(data: OutcomeRecord) -> Self {
        Self {
            attributes: BTreeMap::new(),
            data,
        }
    }
}
