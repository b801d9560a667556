//! MITREid Connect deployer.

use async_trait::async_trait;
use ra_backend::EntityApi;
use ra_model::{ChangeRequest, MitreidClient};
use ra_transform::mitreid::mitreid_client;
use ra_transform::Transformer;
use tracing::{debug, instrument};

use super::MITREID_UNREACHABLE;
use crate::deployer::{Deployer, Deployment};
use crate::error::DeployResult;

/// Deploys OpenID Connect services as MITREid clients. The client API
/// echoes the stored client, so no read-back is needed.
#[derive(Debug)]
pub struct MitreidDeployer<A> {
    api: A,
}

impl<A: EntityApi<Entity = MitreidClient>> MitreidDeployer<A> {
    /// Creates a deployer over `api`.
    #[must_use]
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    fn payload(request: &ChangeRequest) -> DeployResult<MitreidClient> {
        Transformer::Mitreid.check_protocol(request)?;
        Ok(mitreid_client(request)?)
    }
}

#[async_trait]
impl<A: EntityApi<Entity = MitreidClient>> Deployer for MitreidDeployer<A> {
    fn backend(&self) -> &'static str {
        "mitreid"
    }

    fn unreachable_description(&self) -> &'static str {
        MITREID_UNREACHABLE
    }

    #[instrument(skip_all, fields(service_id = %request.id))]
    async fn create(&self, request: &ChangeRequest) -> DeployResult<Deployment> {
        let payload = Self::payload(request)?;
        let (status, id) = self.api.create_entity(&payload).await.into_result()?;
        debug!(client = %id, status, "client created");
        Ok(Deployment::new(status)
            .with_external_id(id)
            .with_client_id(payload.client_id))
    }

    #[instrument(skip_all, fields(service_id = %request.id, external_id = %external_id))]
    async fn update(&self, request: &ChangeRequest, external_id: &str) -> DeployResult<Deployment> {
        let payload = Self::payload(request)?;
        let (status, ()) = self
            .api
            .update_entity(external_id, &payload)
            .await
            .into_result()?;
        debug!(status, "client updated");
        Ok(Deployment::new(status)
            .with_external_id(external_id)
            .with_client_id(payload.client_id))
    }

    #[instrument(skip_all, fields(service_id = %request.id, external_id = %external_id))]
    async fn delete(&self, request: &ChangeRequest, external_id: &str) -> DeployResult<Deployment> {
        let (status, ()) = self.api.delete_entity(external_id).await.into_result()?;
        debug!(status, "client deleted");
        Ok(Deployment::new(status).with_external_id(external_id))
    }
}
