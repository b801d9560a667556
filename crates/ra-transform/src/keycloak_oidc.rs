//! Keycloak OpenID Connect client payloads.

use std::collections::BTreeMap;

use ra_model::keycloak::{ClientRepresentation, PROTOCOL_OPENID_CONNECT};
use ra_model::ChangeRequest;

use crate::contact::contact_email;
use crate::error::{required, TransformError, TransformResult};
use crate::grants;

/// Scope every OpenID Connect request carries; not a Keycloak client scope.
pub const OPENID_SCOPE: &str = "openid";

/// Attribute holding the flattened contact.
pub const CONTACTS_ATTRIBUTE: &str = "contacts";

/// Attribute toggling the token-exchange grant.
pub const TOKEN_EXCHANGE_ATTRIBUTE: &str = "oauth2.token.exchange.grant.enabled";

/// Attributes applied to every client regardless of the request.
const POLICY_ATTRIBUTES: [(&str, &str); 4] = [
    ("client_credentials.use_refresh_token", "false"),
    ("oidc.ciba.grant.enabled", "false"),
    ("refresh.token.max.reuse", "0"),
    ("revoke.refresh.token", "false"),
];

/// Builds the Keycloak client for an OpenID Connect service.
///
/// `default_scopes` are the realm's default OpenID Connect client scope
/// names; they become the client's default scopes. Requested scopes are not
/// part of the payload, see [`requested_optional_scopes`].
pub fn oidc_client(
    request: &ChangeRequest,
    default_scopes: &[String],
) -> TransformResult<ClientRepresentation> {
    let client_id = required("client_id", request.client_id.as_deref())?;

    let mut attributes: BTreeMap<String, String> = POLICY_ATTRIBUTES
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();

    if let Some(email) = contact_email(&request.contacts) {
        attributes.insert(CONTACTS_ATTRIBUTE.to_string(), email.to_string());
    }

    let mut flag = |key: &str, enabled: bool| {
        attributes.insert(key.to_string(), enabled.to_string());
    };
    flag("use.refresh.tokens", request.has_grant(grants::REFRESH_TOKEN));
    flag(
        "oauth2.device.authorization.grant.enabled",
        request.has_grant(grants::DEVICE_CODE),
    );
    flag(TOKEN_EXCHANGE_ATTRIBUTE, request.has_grant(grants::TOKEN_EXCHANGE));
    flag("use.jwks.url", request.jwks_uri.is_some());
    flag("use.jwks.string", request.jwks.is_some());

    if let Some(ref uri) = request.jwks_uri {
        attributes.insert("jwks.url".to_string(), uri.clone());
    }
    if let Some(ref jwks) = request.jwks {
        let encoded = serde_json::to_string(jwks)
            .map_err(|e| TransformError::invalid("jwks", e.to_string()))?;
        attributes.insert("jwks.string".to_string(), encoded);
    }

    let lifetimes = [
        ("access.token.lifespan", request.access_token_validity_seconds),
        ("client.session.idle.timeout", request.refresh_token_validity_seconds),
        ("oauth2.device.code.lifespan", request.device_code_validity_seconds),
    ];
    for (key, seconds) in lifetimes {
        if let Some(seconds) = seconds {
            if seconds < 0 {
                return Err(TransformError::invalid(key_field(key), "must not be negative"));
            }
            attributes.insert(key.to_string(), seconds.to_string());
        }
    }

    if let Some(ref method) = request.code_challenge_method {
        attributes.insert("pkce.code.challenge.method".to_string(), method.clone());
    }
    if let Some(ref logo) = request.logo_uri {
        attributes.insert("logoUri".to_string(), logo.clone());
    }
    if let Some(ref policy) = request.policy_uri {
        attributes.insert("policyUri".to_string(), policy.clone());
    }

    let (public_client, authenticator) = match request.token_endpoint_auth_method.as_deref() {
        None => (false, None),
        Some("none") => (true, None),
        Some("private_key_jwt") => (false, Some("client-jwt")),
        Some(_) => (false, Some("client-secret")),
    };

    Ok(ClientRepresentation {
        client_id: client_id.to_string(),
        name: request.service_name.clone(),
        description: request.service_description.clone(),
        protocol: Some(PROTOCOL_OPENID_CONNECT.to_string()),
        public_client: Some(public_client),
        client_authenticator_type: authenticator.map(str::to_string),
        secret: request.client_secret.clone(),
        consent_required: Some(false),
        standard_flow_enabled: Some(request.has_grant(grants::AUTHORIZATION_CODE)),
        implicit_flow_enabled: Some(request.has_grant(grants::IMPLICIT)),
        direct_access_grants_enabled: Some(request.has_grant(grants::PASSWORD)),
        service_accounts_enabled: Some(request.has_grant(grants::CLIENT_CREDENTIALS)),
        base_url: request.website_url.clone(),
        redirect_uris: (!request.redirect_uris.is_empty()).then(|| request.redirect_uris.clone()),
        web_origins: Some(vec!["+".to_string()]),
        default_client_scopes: Some(default_scopes.to_vec()),
        attributes,
        ..Default::default()
    })
}

fn key_field(attribute: &str) -> &'static str {
    match attribute {
        "access.token.lifespan" => "access_token_validity_seconds",
        "client.session.idle.timeout" => "refresh_token_validity_seconds",
        _ => "device_code_validity_seconds",
    }
}

/// Returns the requested scope names the client should carry as optional
/// scopes: everything requested except `openid` and the realm defaults,
/// deduplicated, in request order.
#[must_use]
pub fn requested_optional_scopes(request: &ChangeRequest, default_scopes: &[String]) -> Vec<String> {
    let mut scopes: Vec<String> = Vec::new();
    for scope in &request.scope {
        let scope = scope.trim();
        if scope.is_empty()
            || scope == OPENID_SCOPE
            || default_scopes.iter().any(|d| d == scope)
            || scopes.iter().any(|s| s == scope)
        {
            continue;
        }
        scopes.push(scope.to_string());
    }
    scopes
}

/// Returns whether the request asks for the token-exchange grant, which is
/// what enables fine-grained permissions on the client.
#[must_use]
pub fn wants_token_exchange(request: &ChangeRequest) -> bool {
    request.has_grant(grants::TOKEN_EXCHANGE)
}

#[cfg(test)]
mod tests {
    use ra_model::{Contact, DeploymentType, ServiceProtocol};
    use serde_json::json;

    use super::*;

    fn request() -> ChangeRequest {
        let mut request = ChangeRequest::new(12, DeploymentType::Create);
        request.client_id = Some("testOidcId".into());
        request.service_name = Some("testName".into());
        request.service_description = Some("testDescription".into());
        request.protocol = Some(ServiceProtocol::Oidc);
        request.contacts = vec![
            Contact::new("email1", "technical"),
            Contact::new("email2", "security"),
        ];
        request
    }

    #[test]
    fn builds_client_with_security_defaults() {
        let client = oidc_client(&request(), &["example".to_string()]).unwrap();

        assert_eq!(
            serde_json::to_value(&client).unwrap(),
            json!({
                "attributes": {
                    "client_credentials.use_refresh_token": "false",
                    "contacts": "email1",
                    "oauth2.device.authorization.grant.enabled": "false",
                    "oauth2.token.exchange.grant.enabled": "false",
                    "oidc.ciba.grant.enabled": "false",
                    "refresh.token.max.reuse": "0",
                    "revoke.refresh.token": "false",
                    "use.jwks.string": "false",
                    "use.jwks.url": "false",
                    "use.refresh.tokens": "false"
                },
                "clientId": "testOidcId",
                "consentRequired": false,
                "defaultClientScopes": ["example"],
                "description": "testDescription",
                "directAccessGrantsEnabled": false,
                "implicitFlowEnabled": false,
                "name": "testName",
                "protocol": "openid-connect",
                "publicClient": false,
                "serviceAccountsEnabled": false,
                "standardFlowEnabled": false,
                "webOrigins": ["+"]
            })
        );
    }

    #[test]
    fn security_defaults_ignore_requested_scopes() {
        let mut with_scopes = request();
        with_scopes.scope = vec!["openid".into(), "email".into(), "offline_access".into()];

        let plain = oidc_client(&request(), &[]).unwrap();
        let scoped = oidc_client(&with_scopes, &[]).unwrap();
        assert_eq!(plain, scoped);
    }

    #[test]
    fn grants_enable_flows() {
        let mut request = request();
        request.grant_types = vec![
            grants::AUTHORIZATION_CODE.into(),
            grants::REFRESH_TOKEN.into(),
            grants::CLIENT_CREDENTIALS.into(),
            grants::TOKEN_EXCHANGE.into(),
        ];
        request.token_endpoint_auth_method = Some("client_secret_basic".into());
        request.client_secret = Some("s3cr3t".into());
        request.redirect_uris = vec!["https://app.example.org/cb".into()];
        request.access_token_validity_seconds = Some(3600);

        let client = oidc_client(&request, &[]).unwrap();
        assert_eq!(client.standard_flow_enabled, Some(true));
        assert_eq!(client.implicit_flow_enabled, Some(false));
        assert_eq!(client.service_accounts_enabled, Some(true));
        assert_eq!(client.client_authenticator_type.as_deref(), Some("client-secret"));
        assert_eq!(client.secret.as_deref(), Some("s3cr3t"));
        assert_eq!(client.redirect_uris, Some(vec!["https://app.example.org/cb".to_string()]));
        assert!(client.attribute_enabled("use.refresh.tokens"));
        assert!(client.attribute_enabled(TOKEN_EXCHANGE_ATTRIBUTE));
        assert_eq!(client.attribute("access.token.lifespan"), Some("3600"));
        assert!(wants_token_exchange(&request));
    }

    #[test]
    fn auth_method_none_makes_public_client() {
        let mut request = request();
        request.token_endpoint_auth_method = Some("none".into());
        let client = oidc_client(&request, &[]).unwrap();
        assert_eq!(client.public_client, Some(true));
        assert_eq!(client.client_authenticator_type, None);

        request.token_endpoint_auth_method = Some("private_key_jwt".into());
        request.jwks_uri = Some("https://app.example.org/jwks".into());
        let client = oidc_client(&request, &[]).unwrap();
        assert_eq!(client.client_authenticator_type.as_deref(), Some("client-jwt"));
        assert!(client.attribute_enabled("use.jwks.url"));
        assert_eq!(client.attribute("jwks.url"), Some("https://app.example.org/jwks"));
    }

    #[test]
    fn missing_client_id_is_rejected() {
        let mut request = request();
        request.client_id = None;
        assert_eq!(
            oidc_client(&request, &[]),
            Err(TransformError::MissingField("client_id"))
        );
    }

    #[test]
    fn negative_lifetime_is_rejected() {
        let mut request = request();
        request.device_code_validity_seconds = Some(-1);
        assert!(matches!(
            oidc_client(&request, &[]),
            Err(TransformError::InvalidField {
                field: "device_code_validity_seconds",
                ..
            })
        ));
    }

    #[test]
    fn optional_scopes_skip_openid_and_defaults() {
        let mut request = request();
        request.scope = vec![
            "openid".into(),
            "email".into(),
            "example".into(),
            "profile".into(),
            "email".into(),
        ];
        assert_eq!(
            requested_optional_scopes(&request, &["example".to_string()]),
            ["email", "profile"]
        );
    }
}
