//! Keycloak admin REST API client.

use std::time::Duration;

use async_trait::async_trait;
use ra_core::KeycloakConfig;
use ra_model::keycloak::{
    ClientRepresentation, ClientScopeRepresentation, ManagementPermission,
    ProtocolMapperRepresentation, UserRepresentation,
};
use serde_json::json;
use tracing::debug;
use url::Url;

use crate::error::BackendResult;
use crate::http::{id_from_location, AdminHttp};
use crate::response::ApiResponse;
use crate::EntityApi;

/// Which client scope list of a client to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// Scopes always applied.
    Default,
    /// Scopes applied when requested.
    Optional,
}

impl ScopeKind {
    const fn path(self) -> &'static str {
        match self {
            Self::Default => "default-client-scopes",
            Self::Optional => "optional-client-scopes",
        }
    }
}

/// Keycloak realm administration capabilities used by the deployers.
///
/// `get_entity`/`create_entity`/`update_entity`/`delete_entity` operate on
/// clients addressed by their internal ID.
#[async_trait]
pub trait KeycloakApi: EntityApi<Entity = ClientRepresentation> {
    /// Lists the realm's default-default client scopes for `protocol`.
    async fn realm_default_client_scopes(
        &self,
        protocol: &str,
    ) -> ApiResponse<Vec<ClientScopeRepresentation>>;

    /// Lists every client scope of the realm.
    async fn realm_client_scopes(&self) -> ApiResponse<Vec<ClientScopeRepresentation>>;

    /// Creates a realm client scope.
    async fn create_client_scope(&self, scope: &ClientScopeRepresentation) -> ApiResponse<()>;

    /// Attaches a realm scope to a client.
    async fn add_client_scope(&self, id: &str, scope_id: &str, kind: ScopeKind) -> ApiResponse<()>;

    /// Detaches a realm scope from a client.
    async fn remove_client_scope(
        &self,
        id: &str,
        scope_id: &str,
        kind: ScopeKind,
    ) -> ApiResponse<()>;

    /// Reads the client's fine-grained permission state.
    async fn authz_permissions(&self, id: &str) -> ApiResponse<ManagementPermission>;

    /// Enables or disables the client's fine-grained permissions.
    async fn set_authz_permissions(
        &self,
        id: &str,
        enabled: bool,
    ) -> ApiResponse<ManagementPermission>;

    /// Adds a protocol mapper to a client.
    async fn add_protocol_mapper(
        &self,
        id: &str,
        mapper: &ProtocolMapperRepresentation,
    ) -> ApiResponse<()>;

    /// Reads the service-account user of a client.
    async fn service_account_user(&self, id: &str) -> ApiResponse<UserRepresentation>;

    /// Replaces a user.
    async fn update_user(&self, user: &UserRepresentation) -> ApiResponse<()>;
}

/// HTTP implementation of [`KeycloakApi`] for one realm.
#[derive(Debug, Clone)]
pub struct KeycloakAdminClient {
    http: AdminHttp,
    realm: String,
}

impl KeycloakAdminClient {
    /// Creates a client for `realm` on `server_url`.
    pub fn new(
        server_url: &str,
        realm: impl Into<String>,
        token: impl Into<String>,
        timeout: Option<Duration>,
    ) -> BackendResult<Self> {
        Ok(Self {
            http: AdminHttp::new(server_url, token, timeout)?,
            realm: realm.into(),
        })
    }

    /// Creates a client from configuration.
    pub fn from_config(config: &KeycloakConfig) -> BackendResult<Self> {
        Self::new(
            &config.server_url,
            config.realm.clone(),
            config.token.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    /// Returns the realm.
    #[must_use]
    pub fn realm(&self) -> &str {
        &self.realm
    }

    /// `<base>/admin/realms/{realm}/{rest..}`
    fn realm_url(&self, rest: &[&str]) -> Url {
        self.http.endpoint(
            ["admin", "realms", self.realm.as_str()]
                .into_iter()
                .chain(rest.iter().copied()),
        )
    }

    /// `<base>/admin/realms/{realm}/clients/{id}/{rest..}`
    fn client_url(&self, id: &str, rest: &[&str]) -> Url {
        let mut segments = vec!["clients", id];
        segments.extend_from_slice(rest);
        self.realm_url(&segments)
    }

    /// Looks up a client's internal ID by its `clientId`.
    async fn find_client_id(&self, client_id: &str) -> ApiResponse<String> {
        let mut url = self.realm_url(&["clients"]);
        url.query_pairs_mut().append_pair("clientId", client_id);
        let response: ApiResponse<Vec<ClientRepresentation>> = self.http.get(url).await;
        let status = response.status;

        match response.body {
            Ok(clients) => clients
                .into_iter()
                .find(|c| c.client_id == client_id)
                .and_then(|c| c.id)
                .map_or_else(
                    || ApiResponse::error(404, format!("client {client_id} not found after create")),
                    |id| ApiResponse::ok(status, id),
                ),
            Err(e) => ApiResponse::error(status, e),
        }
    }
}

#[async_trait]
impl EntityApi for KeycloakAdminClient {
    type Entity = ClientRepresentation;

    async fn get_entity(&self, id: &str) -> ApiResponse<ClientRepresentation> {
        self.http.get(self.client_url(id, &[])).await
    }

    /// Creates the client. Keycloak answers `201` with a `Location` header;
    /// when the header is missing the ID is looked up by `clientId`.
    async fn create_entity(&self, payload: &ClientRepresentation) -> ApiResponse<String> {
        let response = self
            .http
            .post_location(self.realm_url(&["clients"]), payload)
            .await;
        let status = response.status;

        let location = match response.body {
            Ok(location) => location,
            Err(e) => return ApiResponse::error(status, e),
        };
        if let Some(id) = location.as_deref().and_then(id_from_location) {
            return ApiResponse::ok(status, id);
        }

        debug!(client_id = %payload.client_id, "no usable Location header, looking up client");
        let found = self.find_client_id(&payload.client_id).await;
        match found.body {
            Ok(id) => ApiResponse::ok(status, id),
            Err(e) => ApiResponse::error(found.status, e),
        }
    }

    async fn update_entity(&self, id: &str, payload: &ClientRepresentation) -> ApiResponse<()> {
        self.http
            .put_empty(self.client_url(id, &[]), Some(payload))
            .await
    }

    async fn delete_entity(&self, id: &str) -> ApiResponse<()> {
        self.http.delete(self.client_url(id, &[])).await
    }
}

#[async_trait]
impl KeycloakApi for KeycloakAdminClient {
    async fn realm_default_client_scopes(
        &self,
        protocol: &str,
    ) -> ApiResponse<Vec<ClientScopeRepresentation>> {
        self.http
            .get::<Vec<ClientScopeRepresentation>>(self.realm_url(&["default-default-client-scopes"]))
            .await
            .map(|scopes| {
                scopes
                    .into_iter()
                    .filter(|s| s.protocol.as_deref() == Some(protocol))
                    .collect()
            })
    }

    async fn realm_client_scopes(&self) -> ApiResponse<Vec<ClientScopeRepresentation>> {
        self.http.get(self.realm_url(&["client-scopes"])).await
    }

    async fn create_client_scope(&self, scope: &ClientScopeRepresentation) -> ApiResponse<()> {
        self.http
            .post_location(self.realm_url(&["client-scopes"]), scope)
            .await
            .map(|_| ())
    }

    async fn add_client_scope(&self, id: &str, scope_id: &str, kind: ScopeKind) -> ApiResponse<()> {
        let url = self.client_url(id, &[kind.path(), scope_id]);
        self.http.put_empty::<()>(url, None).await
    }

    async fn remove_client_scope(
        &self,
        id: &str,
        scope_id: &str,
        kind: ScopeKind,
    ) -> ApiResponse<()> {
        let url = self.client_url(id, &[kind.path(), scope_id]);
        self.http.delete(url).await
    }

    async fn authz_permissions(&self, id: &str) -> ApiResponse<ManagementPermission> {
        self.http
            .get(self.client_url(id, &["management", "permissions"]))
            .await
    }

    async fn set_authz_permissions(
        &self,
        id: &str,
        enabled: bool,
    ) -> ApiResponse<ManagementPermission> {
        self.http
            .put(
                self.client_url(id, &["management", "permissions"]),
                &json!({ "enabled": enabled }),
            )
            .await
    }

    async fn add_protocol_mapper(
        &self,
        id: &str,
        mapper: &ProtocolMapperRepresentation,
    ) -> ApiResponse<()> {
        self.http
            .post_location(self.client_url(id, &["protocol-mappers", "models"]), mapper)
            .await
            .map(|_| ())
    }

    async fn service_account_user(&self, id: &str) -> ApiResponse<UserRepresentation> {
        self.http
            .get(self.client_url(id, &["service-account-user"]))
            .await
    }

    async fn update_user(&self, user: &UserRepresentation) -> ApiResponse<()> {
        let url = self.realm_url(&["users", user.id.as_str()]);
        self.http.put_empty(url, Some(user)).await
    }
}
