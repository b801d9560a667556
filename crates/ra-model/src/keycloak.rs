//! Keycloak admin API representations.
//!
//! Only the fields the agent reads or writes are modelled. Unset optional
//! fields are left out of the JSON so that updates do not reset values the
//! agent does not own.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Keycloak protocol name for OpenID Connect clients.
pub const PROTOCOL_OPENID_CONNECT: &str = "openid-connect";

/// Keycloak protocol name for SAML clients.
pub const PROTOCOL_SAML: &str = "saml";

/// Client representation (`/admin/realms/{realm}/clients`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[allow(clippy::struct_excessive_bools)]
pub struct ClientRepresentation {
    /// Internal identifier (UUID), assigned by Keycloak.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Client identifier (OAuth `client_id` or SAML entity ID).
    pub client_id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Protocol (`openid-connect` or `saml`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Whether the client is enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Whether this is a public client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_client: Option<bool>,
    /// Client authenticator (`client-secret`, `client-jwt`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_authenticator_type: Option<String>,
    /// Client secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    /// Require user consent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_required: Option<bool>,
    /// Authorization Code flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub standard_flow_enabled: Option<bool>,
    /// Implicit flow.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implicit_flow_enabled: Option<bool>,
    /// Resource Owner Password grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direct_access_grants_enabled: Option<bool>,
    /// Client Credentials grant.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_accounts_enabled: Option<bool>,
    /// Base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Allowed redirect URIs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_uris: Option<Vec<String>>,
    /// Allowed web origins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web_origins: Option<Vec<String>>,
    /// Default client scope names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_client_scopes: Option<Vec<String>>,
    /// Optional client scope names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub optional_client_scopes: Option<Vec<String>>,
    /// Protocol mappers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol_mappers: Option<Vec<ProtocolMapperRepresentation>>,
    /// Free-form client attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl ClientRepresentation {
    /// Returns an attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Returns whether a boolean attribute is set to `"true"`.
    #[must_use]
    pub fn attribute_enabled(&self, key: &str) -> bool {
        self.attribute(key)
            .is_some_and(|v| v.eq_ignore_ascii_case("true"))
    }

    /// Returns the optional client scope names, empty when unknown.
    #[must_use]
    pub fn optional_scopes(&self) -> &[String] {
        self.optional_client_scopes.as_deref().unwrap_or_default()
    }

    /// Returns the default client scope names, empty when unknown.
    #[must_use]
    pub fn default_scopes(&self) -> &[String] {
        self.default_client_scopes.as_deref().unwrap_or_default()
    }

    /// Returns the protocol mappers, empty when unknown.
    #[must_use]
    pub fn mappers(&self) -> &[ProtocolMapperRepresentation] {
        self.protocol_mappers.as_deref().unwrap_or_default()
    }
}

/// Protocol mapper attached to a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolMapperRepresentation {
    /// Internal identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Mapper name, unique per client.
    pub name: String,
    /// Protocol the mapper applies to.
    pub protocol: String,
    /// Mapper type (e.g. `saml-user-attribute-mapper`).
    pub protocol_mapper: String,
    /// Whether consent is required.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_required: Option<bool>,
    /// Mapper configuration.
    #[serde(default)]
    pub config: BTreeMap<String, String>,
}

/// Realm client scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientScopeRepresentation {
    /// Internal identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Scope name.
    pub name: String,
    /// Protocol the scope applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    /// Scope attributes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl ClientScopeRepresentation {
    /// Creates an OpenID Connect scope that is included in tokens and shown
    /// on the consent screen, but hidden from provider metadata.
    #[must_use]
    pub fn oidc(name: impl Into<String>) -> Self {
        let attributes = [
            ("include.in.token.scope", "true"),
            ("hide.from.openID.provider.metadata", "true"),
            ("display.on.consent.screen", "true"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            id: None,
            name: name.into(),
            protocol: Some(PROTOCOL_OPENID_CONNECT.to_string()),
            attributes,
        }
    }
}

/// Fine-grained authorization ("permissions") state of a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementPermission {
    /// Whether permissions are enabled.
    pub enabled: bool,
    /// Authorization resource identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    /// Scope name to policy identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope_permissions: Option<BTreeMap<String, String>>,
}

/// User representation, used for service-account users.
///
/// Fields the agent does not touch are carried in `other` so that a full
/// `PUT` writes them back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRepresentation {
    /// Internal identifier.
    pub id: String,
    /// Username.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    /// Multi-valued user attributes.
    #[serde(default)]
    pub attributes: BTreeMap<String, Vec<String>>,
    /// Everything else.
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl UserRepresentation {
    /// Returns a top-level field as a string, for the fields commonly used as
    /// identifier candidates.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<String> {
        match name {
            "id" => Some(self.id.clone()),
            "username" => self.username.clone(),
            "email" => self.email.clone(),
            "firstName" => self.first_name.clone(),
            other => self.other.get(other).and_then(|v| match v {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Number(n) => Some(n.to_string()),
                _ => None,
            }),
        }
    }
}
