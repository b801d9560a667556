//! Keycloak OpenID Connect deployer.

use async_trait::async_trait;
use ra_backend::{KeycloakApi, ScopeKind};
use ra_core::{KeycloakConfig, ServiceAccountConfig};
use ra_model::keycloak::{ClientRepresentation, PROTOCOL_OPENID_CONNECT};
use ra_model::ChangeRequest;
use ra_transform::keycloak_oidc::{oidc_client, requested_optional_scopes, wants_token_exchange};
use ra_transform::Transformer;
use tracing::{debug, instrument};

use super::keycloak::KeycloakRealm;
use super::KEYCLOAK_UNREACHABLE;
use crate::deployer::{Deployer, Deployment, FollowUpPolicy, FollowUps};
use crate::error::DeployResult;

/// Deploys OpenID Connect services as Keycloak clients.
#[derive(Debug)]
pub struct KeycloakOidcDeployer<A> {
    realm: KeycloakRealm<A>,
    service_account: Option<ServiceAccountConfig>,
    policy: FollowUpPolicy,
}

impl<A: KeycloakApi> KeycloakOidcDeployer<A> {
    /// Creates a deployer over `api`.
    #[must_use]
    pub fn new(api: A, policy: FollowUpPolicy) -> Self {
        Self {
            realm: KeycloakRealm::new(api, PROTOCOL_OPENID_CONNECT),
            service_account: None,
            policy,
        }
    }

    /// Creates a deployer with the optional behaviour set in `config`.
    #[must_use]
    pub fn from_config(api: A, config: &KeycloakConfig, policy: FollowUpPolicy) -> Self {
        let mut deployer = Self::new(api, policy).with_service_account(config.service_account.clone());
        deployer.realm = deployer.realm.with_create_missing_scopes(config.create_missing_scopes);
        deployer
    }

    /// Enables service-account profile sync.
    #[must_use]
    pub fn with_service_account(mut self, config: Option<ServiceAccountConfig>) -> Self {
        self.service_account = config;
        self
    }

    async fn payload(&self, request: &ChangeRequest) -> DeployResult<(ClientRepresentation, Vec<String>)> {
        Transformer::KeycloakOidc.check_protocol(request)?;
        let defaults = self.realm.default_scopes().await?;
        let payload = oidc_client(request, &defaults)?;
        Ok((payload, defaults))
    }

    async fn sync_service_account(
        &self,
        id: &str,
        request: &ChangeRequest,
        client: &ClientRepresentation,
        follow_ups: &mut FollowUps,
    ) {
        if let Some(ref config) = self.service_account {
            if client.service_accounts_enabled == Some(true) {
                self.realm
                    .sync_service_account(id, request, config, follow_ups)
                    .await;
            }
        }
    }
}

#[async_trait]
impl<A: KeycloakApi> Deployer for KeycloakOidcDeployer<A> {
    fn backend(&self) -> &'static str {
        "keycloak-oidc"
    }

    fn unreachable_description(&self) -> &'static str {
        KEYCLOAK_UNREACHABLE
    }

    async fn begin_cycle(&self) {
        self.realm.reset().await;
    }

    #[instrument(skip_all, fields(service_id = %request.id))]
    async fn create(&self, request: &ChangeRequest) -> DeployResult<Deployment> {
        let (payload, defaults) = self.payload(request).await?;
        let (status, id) = self.realm.api().create_entity(&payload).await.into_result()?;
        debug!(client = %id, status, "client created");

        let mut follow_ups = FollowUps::new();
        let optional = requested_optional_scopes(request, &defaults);
        self.realm
            .sync_client_scopes(&id, ScopeKind::Optional, &[], &optional, &mut follow_ups)
            .await;

        if wants_token_exchange(request) {
            self.realm
                .sync_permissions(&id, true, Some(false), &mut follow_ups)
                .await;
        }

        self.sync_service_account(&id, request, &payload, &mut follow_ups)
            .await;

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
            let desired = requested_optional_scopes(request, &defaults);
            self.realm
                .sync_client_scopes(
                    external_id,
                    ScopeKind::Optional,
                    client.optional_scopes(),
                    &desired,
                    &mut follow_ups,
                )
                .await;
        }

        self.realm
            .sync_permissions(external_id, wants_token_exchange(request), None, &mut follow_ups)
            .await;

        self.sync_service_account(external_id, request, &payload, &mut follow_ups)
            .await;

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
