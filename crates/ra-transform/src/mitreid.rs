//! MITREid Connect client payloads.

use ra_model::{ChangeRequest, MitreidClient};

use crate::contact::contact_email;
use crate::error::{required, TransformError, TransformResult};

/// Builds the MITREid client for an OpenID Connect service.
///
/// The selected contact is sent as a one-element list.
pub fn mitreid_client(request: &ChangeRequest) -> TransformResult<MitreidClient> {
    let client_id = required("client_id", request.client_id.as_deref())?;

    let auth_method = request
        .token_endpoint_auth_method
        .as_deref()
        .map(auth_method_name)
        .transpose()?;

    Ok(MitreidClient {
        id: None,
        client_id: client_id.to_string(),
        client_name: request.service_name.clone(),
        client_description: request.service_description.clone(),
        contacts: contact_email(&request.contacts)
            .map(|email| vec![email.to_string()])
            .unwrap_or_default(),
        redirect_uris: request.redirect_uris.clone(),
        grant_types: request.grant_types.clone(),
        scope: request.scope.clone(),
        token_endpoint_auth_method: auth_method.map(str::to_string),
        client_secret: request.client_secret.clone(),
        logo_uri: request.logo_uri.clone(),
        policy_uri: request.policy_uri.clone(),
        access_token_validity_seconds: request.access_token_validity_seconds,
        refresh_token_validity_seconds: request.refresh_token_validity_seconds,
    })
}

/// Maps an RFC 7591 authentication method to the MITREid enum name.
fn auth_method_name(method: &str) -> TransformResult<&'static str> {
    match method {
        "client_secret_basic" => Ok("SECRET_BASIC"),
        "client_secret_post" => Ok("SECRET_POST"),
        "client_secret_jwt" => Ok("SECRET_JWT"),
        "private_key_jwt" => Ok("PRIVATE_KEY"),
        "none" => Ok("NONE"),
        other => Err(TransformError::invalid(
            "token_endpoint_auth_method",
            format!("unsupported method '{other}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use ra_model::{Contact, DeploymentType};
    use serde_json::json;

    use super::*;

    fn request() -> ChangeRequest {
        let mut request = ChangeRequest::new(12, DeploymentType::Create);
        request.client_id = Some("testId1".into());
        request.service_name = Some("testName1".into());
        request.service_description = Some("testDescription1".into());
        request.contacts = vec![
            Contact::new("email1", "technical"),
            Contact::new("email2", "security"),
        ];
        request
    }

    #[test]
    fn builds_mitreid_client() {
        let client = mitreid_client(&request()).unwrap();
        assert_eq!(
            serde_json::to_value(&client).unwrap(),
            json!({
                "clientId": "testId1",
                "clientName": "testName1",
                "clientDescription": "testDescription1",
                "contacts": ["email1"]
            })
        );
    }

    #[test]
    fn auth_method_is_translated() {
        let mut request = request();
        request.token_endpoint_auth_method = Some("client_secret_post".into());
        let client = mitreid_client(&request).unwrap();
        assert_eq!(client.token_endpoint_auth_method.as_deref(), Some("SECRET_POST"));

        request.token_endpoint_auth_method = Some("tls_client_auth".into());
        assert!(matches!(
            mitreid_client(&request),
            Err(TransformError::InvalidField { field: "token_endpoint_auth_method", .. })
        ));
    }
}
