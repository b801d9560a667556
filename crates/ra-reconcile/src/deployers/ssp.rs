//! SimpleSAMLphp aggregator deployer.

use async_trait::async_trait;
use ra_backend::EntityApi;
use ra_model::{ChangeRequest, MetadataSource};
use ra_transform::ssp::metadata_source;
use ra_transform::Transformer;
use tracing::{debug, instrument};

use super::SSP_UNREACHABLE;
use crate::deployer::{Deployer, Deployment};
use crate::error::DeployResult;

/// Registers SAML service providers as metarefresh sources.
///
/// Sources are keyed by the registry service ID, so outcomes carry no
/// `external_id` and edits and deletes do not need one.
#[derive(Debug)]
pub struct SspDeployer<A> {
    api: A,
}

impl<A: EntityApi<Entity = MetadataSource>> SspDeployer<A> {
    /// Creates a deployer over `api`.
    #[must_use]
    pub const fn new(api: A) -> Self {
        Self { api }
    }

    fn payload(request: &ChangeRequest) -> DeployResult<MetadataSource> {
        Transformer::Ssp.check_protocol(request)?;
        Ok(metadata_source(request)?)
    }
}

#[async_trait]
impl<A: EntityApi<Entity = MetadataSource>> Deployer for SspDeployer<A> {
    fn backend(&self) -> &'static str {
        "ssp"
    }

    fn unreachable_description(&self) -> &'static str {
        SSP_UNREACHABLE
    }

    fn locates_by_natural_key(&self) -> bool {
        true
    }

    #[instrument(skip_all, fields(service_id = %request.id))]
    async fn create(&self, request: &ChangeRequest) -> DeployResult<Deployment> {
        let source = Self::payload(request)?;
        let (status, _) = self.api.create_entity(&source).await.into_result()?;
        debug!(status, src = %source.src, "metadata source registered");
        Ok(Deployment::new(status).with_client_id(source.entity_id().unwrap_or_default()))
    }

    #[instrument(skip_all, fields(service_id = %request.id, key = %key))]
    async fn update(&self, request: &ChangeRequest, key: &str) -> DeployResult<Deployment> {
        let source = Self::payload(request)?;
        let (status, ()) = self.api.update_entity(key, &source).await.into_result()?;
        debug!(status, src = %source.src, "metadata source updated");
        Ok(Deployment::new(status).with_client_id(source.entity_id().unwrap_or_default()))
    }

    #[instrument(skip_all, fields(service_id = %request.id, key = %key))]
    async fn delete(&self, request: &ChangeRequest, key: &str) -> DeployResult<Deployment> {
        let (status, ()) = self.api.delete_entity(key).await.into_result()?;
        debug!(status, "metadata source removed");
        Ok(Deployment::new(status))
    }
}
