//! # ra-transform
//!
//! Pure mapping of registry change requests into backend payloads.
//!
//! Transformers never perform I/O. Anything the payload depends on that
//! lives in the backend (the realm's default client scopes) is passed in by
//! the caller. A request missing a field the backend needs is rejected with
//! a [`TransformError`] instead of producing a partial payload.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod contact;
pub mod error;
pub mod grants;
pub mod keycloak_oidc;
pub mod keycloak_saml;
pub mod mitreid;
pub mod ssp;

use ra_core::BackendConfig;
use ra_model::keycloak::ClientRepresentation;
use ra_model::{ChangeRequest, MetadataSource, MitreidClient, ServiceProtocol};
use serde::Serialize;

pub use contact::{contact_email, select_contact};
pub use error::{TransformError, TransformResult};

/// Payload for one of the supported backends.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BackendPayload {
    /// Keycloak client (OIDC or SAML).
    Keycloak(ClientRepresentation),
    /// MITREid Connect client.
    Mitreid(MitreidClient),
    /// SimpleSAMLphp metarefresh source.
    Metadata(MetadataSource),
}

/// Per-backend transformation, chosen once per pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transformer {
    /// Keycloak OpenID Connect clients.
    KeycloakOidc,
    /// Keycloak SAML clients.
    KeycloakSaml,
    /// MITREid Connect clients.
    Mitreid,
    /// SimpleSAMLphp metarefresh sources.
    Ssp,
}

impl Transformer {
    /// Returns the transformer for a configured backend.
    #[must_use]
    pub const fn for_backend(backend: &BackendConfig) -> Self {
        match backend {
            BackendConfig::KeycloakOidc(_) => Self::KeycloakOidc,
            BackendConfig::KeycloakSaml(_) => Self::KeycloakSaml,
            BackendConfig::Mitreid(_) => Self::Mitreid,
            BackendConfig::Ssp(_) => Self::Ssp,
        }
    }

    /// Returns the protocol this backend serves.
    #[must_use]
    pub const fn protocol(self) -> ServiceProtocol {
        match self {
            Self::KeycloakOidc | Self::Mitreid => ServiceProtocol::Oidc,
            Self::KeycloakSaml | Self::Ssp => ServiceProtocol::Saml,
        }
    }

    /// Rejects requests that explicitly carry another protocol. Requests
    /// without a protocol are accepted.
    pub fn check_protocol(self, request: &ChangeRequest) -> TransformResult<()> {
        match request.protocol {
            Some(found) if found != self.protocol() => Err(TransformError::UnsupportedProtocol {
                expected: self.protocol(),
                found,
            }),
            _ => Ok(()),
        }
    }

    /// Builds the backend payload for `request`. `default_scopes` is only
    /// used by the Keycloak transformers.
    pub fn transform(
        self,
        request: &ChangeRequest,
        default_scopes: &[String],
    ) -> TransformResult<BackendPayload> {
        self.check_protocol(request)?;

        Ok(match self {
            Self::KeycloakOidc => {
                BackendPayload::Keycloak(keycloak_oidc::oidc_client(request, default_scopes)?)
            }
            Self::KeycloakSaml => {
                BackendPayload::Keycloak(keycloak_saml::saml_client(request, default_scopes)?)
            }
            Self::Mitreid => BackendPayload::Mitreid(mitreid::mitreid_client(request)?),
            Self::Ssp => BackendPayload::Metadata(ssp::metadata_source(request)?),
        })
    }
}
