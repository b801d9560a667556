//! # ra-backend
//!
//! Backend clients for the systems the agent deploys services to:
//!
//! - Keycloak admin REST API (OIDC and SAML clients)
//! - MITREid Connect client API
//! - SimpleSAMLphp metarefresh aggregator (local configuration + cron trigger)
//!
//! Every operation returns an [`ApiResponse`]: transport failures, timeouts
//! and non-2xx statuses are absorbed into the response instead of being
//! raised, so callers always get a status and, on failure, a description.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod keycloak;
pub mod mitreid;
pub mod response;
pub mod ssp;

use async_trait::async_trait;

pub use error::{BackendError, BackendResult};
pub use http::AdminHttp;
pub use keycloak::{KeycloakAdminClient, KeycloakApi, ScopeKind};
pub use mitreid::MitreidClientApi;
pub use response::{ApiFailure, ApiResponse};
pub use ssp::SspAggregator;

/// Create/read/update/delete of the entity a backend stores per service.
///
/// Each call is one round trip to the backend, except where an
/// implementation documents a follow-up read.
#[async_trait]
pub trait EntityApi: Send + Sync {
    /// Backend representation of a registered service.
    type Entity: Send + Sync;

    /// Reads an entity by backend identifier.
    async fn get_entity(&self, id: &str) -> ApiResponse<Self::Entity>;

    /// Creates an entity and returns its backend identifier.
    async fn create_entity(&self, payload: &Self::Entity) -> ApiResponse<String>;

    /// Replaces an entity.
    async fn update_entity(&self, id: &str, payload: &Self::Entity) -> ApiResponse<()>;

    /// Deletes an entity.
    async fn delete_entity(&self, id: &str) -> ApiResponse<()>;
}
