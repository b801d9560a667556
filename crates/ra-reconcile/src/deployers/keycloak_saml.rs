//! Keycloak SAML deployer.

use async_trait::async_trait;
use ra_backend::{KeycloakApi, ScopeKind};
use ra_model::keycloak::{ClientRepresentation, PROTOCOL_SAML};
use ra_model::ChangeRequest;
use ra_transform::keycloak_saml::{custom_mappers, desired_default_scopes, saml_client};
use ra_transform::Transformer;
use tracing::{debug, info, instrument};

use super::keycloak::KeycloakRealm;
use super::KEYCLOAK_UNREACHABLE;
use crate::deployer::{Deployer, Deployment, FollowUpPolicy, FollowUps};
use crate::error::DeployResult;

/// Deploys SAML service providers as Keycloak clients.
#[derive(Debug)]
pub struct KeycloakSamlDeployer<A> {
    realm: KeycloakRealm<A>,
    policy: FollowUpPolicy,
}

impl<A: KeycloakApi> KeycloakSamlDeployer<A> {
    /// Creates a deployer over `api`.
    #[must_use]
    pub fn new(api: A, policy: FollowUpPolicy) -> Self {
        Self {
            realm: KeycloakRealm::new(api, PROTOCOL_SAML),
            policy,
        }
    }

    async fn payload(&self, request: &ChangeRequest) -> DeployResult<(ClientRepresentation, Vec<String>)> {
        Transformer::KeycloakSaml.check_protocol(request)?;
        let defaults = self.realm.default_scopes().await?;
        let payload = saml_client(request, &defaults)?;
        Ok((payload, defaults))
    }

    /// Adds the custom attribute mappers the client lacks, matched by name.
    async fn add_missing_mappers(
        &self,
        id: &str,
        request: &ChangeRequest,
        client: &ClientRepresentation,
        follow_ups: &mut FollowUps,
    ) {
        for mapper in custom_mappers(&request.requested_attributes) {
            if client.mappers().iter().any(|m| m.name == mapper.name) {
                continue;
            }
            let added = self.realm.api().add_protocol_mapper(id, &mapper).await;
            if follow_ups.check("add protocol mapper", added.into_value()).is_some() {
                info!(client = id, mapper = %mapper.name, "protocol mapper added");
            }
        }
    }
}

#[async_trait]
impl<A: KeycloakApi> Deployer for KeycloakSamlDeployer<A> {
    fn backend(&self) -> &'static str {
        "keycloak-saml"
    }

    fn unreachable_description(&self) -> &'static str {
        KEYCLOAK_UNREACHABLE
    }

    async fn begin_cycle(&self) {
        self.realm.reset().await;
    }

    #[instrument(skip_all, fields(service_id = %request.id))]
    async fn create(&self, request: &ChangeRequest) -> DeployResult<Deployment> {
        let (payload, _) = self.payload(request).await?;
        let (status, id) = self.realm.api().create_entity(&payload).await.into_result()?;
        debug!(client = %id, status, "client created");

        let mut follow_ups = FollowUps::new();
        let created = self.realm.api().get_entity(&id).await.into_value();
        let client_id = follow_ups
            .check("read created client", created)
            .map_or(payload.client_id, |client| client.client_id);

        follow_ups.settle(
            self.policy,
            Deployment::new(status)
                .with_external_id(id)
                .with_client_id(client_id),
        )
    }

    #[instrument(skip_all, fields(service_id = %request.id, external_id = %external_id))]
    async fn update(&self, request: &ChangeRequest, external_id: &str) -> DeployResult<Deployment> {
        let (payload, defaults) = self.payload(request).await?;
        let (status, ()) = self
            .realm
            .api()
            .update_entity(external_id, &payload)
            .await
            .into_result()?;
        debug!(status, "client updated");

        let mut follow_ups = FollowUps::new();
        let current = self.realm.api().get_entity(external_id).await.into_value();
        let current = follow_ups.check("read updated client", current);

        if let Some(ref client) = current {
            self.add_missing_mappers(external_id, request, client, &mut follow_ups)
                .await;

            let desired = desired_default_scopes(request, &defaults);
            self.realm
                .sync_client_scopes(
                    external_id,
                    ScopeKind::Default,
                    client.default_scopes(),
                    &desired,
                    &mut follow_ups,
                )
                .await;
        }

        let client_id = current.map_or(payload.client_id, |client| client.client_id);
        follow_ups.settle(
            self.policy,
            Deployment::new(status)
                .with_external_id(external_id)
                .with_client_id(client_id),
        )
    }

    #[instrument(skip_all, fields(service_id = %request.id, external_id = %external_id))]
    async fn delete(&self, request: &ChangeRequest, external_id: &str) -> DeployResult<Deployment> {
        let (status, ()) = self
            .realm
            .api()
            .delete_entity(external_id)
            .await
            .into_result()?;
        debug!(status, "client deleted");
        Ok(Deployment::new(status).with_external_id(external_id))
    }
}
