//! Keycloak SAML client payloads.

use std::collections::BTreeMap;

use ra_model::keycloak::{ClientRepresentation, ProtocolMapperRepresentation, PROTOCOL_SAML};
use ra_model::{ChangeRequest, RequestedAttribute};

use crate::contact::contact_email;
use crate::error::{required, TransformResult};
use crate::keycloak_oidc::CONTACTS_ATTRIBUTE;

/// Mapper type releasing a user attribute as a SAML attribute.
pub const USER_ATTRIBUTE_MAPPER: &str = "saml-user-attribute-mapper";

/// Metadata refresh period in seconds.
const METADATA_REFRESH_PERIOD: &str = "3600";

/// Builds the Keycloak client for a SAML service provider.
///
/// Default scopes are the realm SAML defaults followed by the friendly name
/// of every requested attribute. Only `custom` attributes get a dedicated
/// protocol mapper; standard ones are served by realm scopes.
pub fn saml_client(
    request: &ChangeRequest,
    default_scopes: &[String],
) -> TransformResult<ClientRepresentation> {
    let entity_id = required("entity_id", request.service_identifier())?;
    let metadata_url = required("metadata_url", request.metadata_url.as_deref())?;

    let mut attributes = BTreeMap::new();
    if let Some(email) = contact_email(&request.contacts) {
        attributes.insert(CONTACTS_ATTRIBUTE.to_string(), email.to_string());
    }
    attributes.insert("saml.auto.updated".to_string(), "true".to_string());
    attributes.insert("saml.metadata.url".to_string(), metadata_url.to_string());
    attributes.insert(
        "saml.refresh.period".to_string(),
        METADATA_REFRESH_PERIOD.to_string(),
    );
    attributes.insert("saml.skip.requested.attributes".to_string(), "true".to_string());

    let mappers = custom_mappers(&request.requested_attributes);

    Ok(ClientRepresentation {
        client_id: entity_id.to_string(),
        name: request.service_name.clone(),
        description: request.service_description.clone(),
        protocol: Some(PROTOCOL_SAML.to_string()),
        consent_required: Some(true),
        default_client_scopes: Some(desired_default_scopes(request, default_scopes)),
        protocol_mappers: (!mappers.is_empty()).then_some(mappers),
        attributes,
        ..Default::default()
    })
}

/// Realm defaults followed by the requested attribute names, deduplicated,
/// in order.
#[must_use]
pub fn desired_default_scopes(request: &ChangeRequest, default_scopes: &[String]) -> Vec<String> {
    let mut scopes: Vec<String> = Vec::with_capacity(default_scopes.len() + request.requested_attributes.len());
    let names = default_scopes
        .iter()
        .map(String::as_str)
        .chain(request.requested_attributes.iter().map(|a| a.friendly_name.as_str()));

    for name in names {
        if !name.is_empty() && !scopes.iter().any(|s| s == name) {
            scopes.push(name.to_string());
        }
    }
    scopes
}

/// Protocol mappers for the request's `custom` attributes.
#[must_use]
pub fn custom_mappers(attributes: &[RequestedAttribute]) -> Vec<ProtocolMapperRepresentation> {
    attributes
        .iter()
        .filter(|a| a.is_custom())
        .map(attribute_mapper)
        .collect()
}

/// Builds the user-attribute mapper releasing `attribute`.
#[must_use]
pub fn attribute_mapper(attribute: &RequestedAttribute) -> ProtocolMapperRepresentation {
    let config = [
        ("attribute.name", attribute.name.as_str()),
        (
            "attribute.nameformat",
            name_format_label(attribute.name_format.as_deref()),
        ),
        ("friendly.name", attribute.friendly_name.as_str()),
        ("user.attribute", attribute.friendly_name.as_str()),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    ProtocolMapperRepresentation {
        id: None,
        name: attribute.friendly_name.clone(),
        protocol: PROTOCOL_SAML.to_string(),
        protocol_mapper: USER_ATTRIBUTE_MAPPER.to_string(),
        consent_required: None,
        config,
    }
}

/// Maps a SAML name format URN to the label Keycloak expects.
#[must_use]
pub fn name_format_label(name_format: Option<&str>) -> &'static str {
    match name_format {
        Some(format) if format.ends_with(":uri") => "URI Reference",
        Some(format) if format.ends_with(":basic") => "Basic",
        _ => "Unspecified",
    }
}

#[cfg(test)]
mod tests {
    use ra_model::{Contact, DeploymentType, ServiceProtocol};
    use serde_json::json;

    use super::*;
    use crate::error::TransformError;

    const URI_FORMAT: &str = "urn:oasis:names:tc:SAML:2.0:attrname-format:uri";

    fn attribute(friendly_name: &str, name: &str, kind: &str) -> RequestedAttribute {
        RequestedAttribute {
            friendly_name: friendly_name.into(),
            name: name.into(),
            attribute_type: Some(kind.into()),
            required: true,
            name_format: Some(URI_FORMAT.into()),
        }
    }

    fn request() -> ChangeRequest {
        let mut request = ChangeRequest::new(12, DeploymentType::Create);
        request.entity_id = Some("https://example.org/testSamlId".into());
        request.service_name = Some("testName".into());
        request.service_description = Some("testDescription".into());
        request.protocol = Some(ServiceProtocol::Saml);
        request.metadata_url = Some("https://example.org/testSamlId/Shibboleth.sso/Metadata".into());
        request.contacts = vec![
            Contact::new("email1", "technical"),
            Contact::new("email2", "security"),
        ];
        request.requested_attributes = vec![
            attribute("uid", "urn:oid:uid", "custom"),
            attribute("voPersonID", "urn:oid:1.3.6.1.4.1.25178.4.1.6", "standard"),
        ];
        request
    }

    #[test]
    fn builds_saml_client() {
        let client = saml_client(&request(), &["example".to_string()]).unwrap();

        assert_eq!(
            serde_json::to_value(&client).unwrap(),
            json!({
                "attributes": {
                    "contacts": "email1",
                    "saml.auto.updated": "true",
                    "saml.metadata.url": "https://example.org/testSamlId/Shibboleth.sso/Metadata",
                    "saml.refresh.period": "3600",
                    "saml.skip.requested.attributes": "true"
                },
                "clientId": "https://example.org/testSamlId",
                "consentRequired": true,
                "defaultClientScopes": ["example", "uid", "voPersonID"],
                "description": "testDescription",
                "name": "testName",
                "protocol": "saml",
                "protocolMappers": [{
                    "config": {
                        "attribute.name": "urn:oid:uid",
                        "attribute.nameformat": "URI Reference",
                        "friendly.name": "uid",
                        "user.attribute": "uid"
                    },
                    "name": "uid",
                    "protocol": "saml",
                    "protocolMapper": "saml-user-attribute-mapper"
                }]
            })
        );
    }

    #[test]
    fn no_custom_attributes_means_no_mappers() {
        let mut request = request();
        request.requested_attributes.retain(|a| !a.is_custom());
        let client = saml_client(&request, &[]).unwrap();
        assert_eq!(client.protocol_mappers, None);
        assert_eq!(client.default_scopes(), ["voPersonID"]);
    }

    #[test]
    fn metadata_url_is_required() {
        let mut request = request();
        request.metadata_url = None;
        assert_eq!(
            saml_client(&request, &[]),
            Err(TransformError::MissingField("metadata_url"))
        );
    }

    #[test]
    fn default_scopes_are_deduplicated() {
        let mut request = request();
        request.requested_attributes.push(attribute("example", "urn:oid:example", "standard"));
        assert_eq!(
            desired_default_scopes(&request, &["example".to_string()]),
            ["example", "uid", "voPersonID"]
        );
    }

    #[test]
    fn name_format_labels() {
        assert_eq!(name_format_label(Some(URI_FORMAT)), "URI Reference");
        assert_eq!(
            name_format_label(Some("urn:oasis:names:tc:SAML:2.0:attrname-format:basic")),
            "Basic"
        );
        assert_eq!(
            name_format_label(Some("urn:oasis:names:tc:SAML:2.0:attrname-format:unspecified")),
            "Unspecified"
        );
        assert_eq!(name_format_label(None), "Unspecified");
    }
}
