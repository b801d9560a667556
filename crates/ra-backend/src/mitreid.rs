//! MITREid Connect client API (`<issuer>/api/clients`).

use std::time::Duration;

use async_trait::async_trait;
use ra_core::MitreidConfig;
use ra_model::MitreidClient;
use url::Url;

use crate::error::BackendResult;
use crate::http::AdminHttp;
use crate::response::ApiResponse;
use crate::EntityApi;

/// HTTP client for the MITREid Connect admin API.
#[derive(Debug, Clone)]
pub struct MitreidClientApi {
    http: AdminHttp,
}

impl MitreidClientApi {
    /// Creates a client for the authorization server at `issuer`.
    pub fn new(issuer: &str, token: impl Into<String>, timeout: Option<Duration>) -> BackendResult<Self> {
        Ok(Self {
            http: AdminHttp::new(issuer, token, timeout)?,
        })
    }

    /// Creates a client from configuration.
    pub fn from_config(config: &MitreidConfig) -> BackendResult<Self> {
        Self::new(
            &config.issuer,
            config.token.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    /// Lists every registered client.
    pub async fn list_clients(&self) -> ApiResponse<Vec<MitreidClient>> {
        self.http.get(self.clients_url(&[])).await
    }

    /// `<issuer>/api/clients/{rest..}`
    fn clients_url(&self, rest: &[&str]) -> Url {
        self.http
            .endpoint(["api", "clients"].into_iter().chain(rest.iter().copied()))
    }
}

#[async_trait]
impl EntityApi for MitreidClientApi {
    type Entity = MitreidClient;

    async fn get_entity(&self, id: &str) -> ApiResponse<MitreidClient> {
        self.http.get(self.clients_url(&[id])).await
    }

    /// Creates the client; the numeric ID from the echoed representation
    /// becomes the backend identifier.
    async fn create_entity(&self, payload: &MitreidClient) -> ApiResponse<String> {
        let response: ApiResponse<MitreidClient> = self.http.post(self.clients_url(&[]), payload).await;
        let status = response.status;

        match response.body {
            Ok(created) => match created.id {
                Some(id) => ApiResponse::ok(status, id),
                None => ApiResponse::error(status, "created client carries no id"),
            },
            Err(e) => ApiResponse::error(status, e),
        }
    }

    async fn update_entity(&self, id: &str, payload: &MitreidClient) -> ApiResponse<()> {
        self.http
            .put_empty(self.clients_url(&[id]), Some(payload))
            .await
    }

    async fn delete_entity(&self, id: &str) -> ApiResponse<()> {
        self.http.delete(self.clients_url(&[id])).await
    }
}
