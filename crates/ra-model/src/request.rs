//! Change requests delivered by the federation registry.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::serde_ext::opt_string_or_number;

/// Contact type preferred when a backend stores a single contact.
pub const TECHNICAL_CONTACT: &str = "technical";

/// Registry-side service identifier, echoed verbatim in the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceId {
    /// Numeric identifier.
    Number(i64),
    /// Textual identifier.
    Text(String),
}

impl fmt::Display for ServiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ServiceId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ServiceId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

/// Requested operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentType {
    /// Register a new service.
    Create,
    /// Update a previously deployed service.
    Edit,
    /// Remove a previously deployed service.
    Delete,
}

impl DeploymentType {
    /// Returns the wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for DeploymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service protocol discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceProtocol {
    /// OpenID Connect relying party.
    Oidc,
    /// SAML service provider.
    Saml,
    /// Anything else the registry may send.
    #[serde(other)]
    Other,
}

/// A service contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Email address.
    pub email: String,
    /// Contact type (`technical`, `security`, `admin`, ...).
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub contact_type: Option<String>,
}

impl Contact {
    /// Creates a typed contact.
    #[must_use]
    pub fn new(email: impl Into<String>, contact_type: impl Into<String>) -> Self {
        Self {
            name: None,
            email: email.into(),
            contact_type: Some(contact_type.into()),
        }
    }

    /// Returns whether this is a technical contact.
    #[must_use]
    pub fn is_technical(&self) -> bool {
        self.contact_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(TECHNICAL_CONTACT))
    }
}

/// A SAML attribute requested by a service provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestedAttribute {
    /// Short attribute name, also used as the client scope name.
    pub friendly_name: String,
    /// Full attribute name (usually an OID URN).
    pub name: String,
    /// `standard` for attributes the realm already maps, `custom` otherwise.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub attribute_type: Option<String>,
    /// Whether the service requires the attribute.
    #[serde(default)]
    pub required: bool,
    /// SAML name format URN.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_format: Option<String>,
}

impl RequestedAttribute {
    /// Returns whether the attribute needs a dedicated protocol mapper.
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.attribute_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("custom"))
    }
}

/// One pending create/edit/delete instruction.
///
/// Field presence is not checked here; each transformer validates the
/// fields its backend needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    /// Registry service identifier.
    pub id: ServiceId,

    /// Backend identifier assigned by a previous deployment.
    #[serde(
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub external_id: Option<String>,

    /// Requested operation.
    pub deployment_type: DeploymentType,

    /// Service protocol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<ServiceProtocol>,

    /// OAuth client identifier (OIDC services).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,

    /// SAML entity identifier (SAML services).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_id: Option<String>,

    /// Human-readable service name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,

    /// Service description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_description: Option<String>,

    /// Ordered contact list.
    #[serde(default)]
    pub contacts: Vec<Contact>,

    /// Requested OAuth scopes (OIDC).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,

    /// Requested attributes (SAML).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requested_attributes: Vec<RequestedAttribute>,

    /// SAML metadata location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_url: Option<String>,

    /// Requested OAuth grant types.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grant_types: Vec<String>,

    /// Allowed redirect URIs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub redirect_uris: Vec<String>,

    /// Token endpoint authentication method (RFC 7591 name).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_endpoint_auth_method: Option<String>,

    /// Client secret for confidential clients.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Inline JSON Web Key Set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks: Option<serde_json::Value>,

    /// JSON Web Key Set URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwks_uri: Option<String>,

    /// Access token lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token_validity_seconds: Option<i64>,

    /// Refresh token lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_validity_seconds: Option<i64>,

    /// Device code lifetime in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_code_validity_seconds: Option<i64>,

    /// PKCE code challenge method.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_challenge_method: Option<String>,

    /// Logo URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_uri: Option<String>,

    /// Privacy policy URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_uri: Option<String>,

    /// Service home page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website_url: Option<String>,
}

impl ChangeRequest {
    /// Creates a request carrying only the mandatory fields.
    #[must_use]
    pub fn new(id: impl Into<ServiceId>, deployment_type: DeploymentType) -> Self {
        Self {
            id: id.into(),
            external_id: None,
            deployment_type,
            protocol: None,
            client_id: None,
            entity_id: None,
            service_name: None,
            service_description: None,
            contacts: Vec::new(),
            scope: Vec::new(),
            requested_attributes: Vec::new(),
            metadata_url: None,
            grant_types: Vec::new(),
            redirect_uris: Vec::new(),
            token_endpoint_auth_method: None,
            client_secret: None,
            jwks: None,
            jwks_uri: None,
            access_token_validity_seconds: None,
            refresh_token_validity_seconds: None,
            device_code_validity_seconds: None,
            code_challenge_method: None,
            logo_uri: None,
            policy_uri: None,
            website_url: None,
        }
    }

    /// Returns the backend identifier, if any.
    #[must_use]
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref().filter(|s| !s.is_empty())
    }

    /// Returns the natural service identifier: the entity ID for SAML
    /// services, the client ID otherwise.
    #[must_use]
    pub fn service_identifier(&self) -> Option<&str> {
        let preferred = match self.protocol {
            Some(ServiceProtocol::Saml) => self.entity_id.as_deref().or(self.client_id.as_deref()),
            _ => self.client_id.as_deref().or(self.entity_id.as_deref()),
        };
        preferred.filter(|s| !s.is_empty())
    }

    /// Returns whether `grant` was requested.
    #[must_use]
    pub fn has_grant(&self, grant: &str) -> bool {
        self.grant_types.iter().any(|g| g == grant)
    }
}
