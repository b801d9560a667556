//! SimpleSAMLphp metarefresh sources.

use ra_model::{ChangeRequest, MetadataSource};

use crate::error::{required, TransformResult};

/// Builds the metarefresh source for a SAML service provider, keyed by the
/// registry service identifier.
pub fn metadata_source(request: &ChangeRequest) -> TransformResult<MetadataSource> {
    let entity_id = required("entity_id", request.entity_id.as_deref())?;
    let metadata_url = required("metadata_url", request.metadata_url.as_deref())?;

    Ok(MetadataSource::new(
        request.id.to_string(),
        entity_id,
        metadata_url,
    ))
}

#[cfg(test)]
mod tests {
    use ra_model::DeploymentType;

    use super::*;
    use crate::error::TransformError;

    #[test]
    fn builds_source_from_request() {
        let mut request = ChangeRequest::new("testId2", DeploymentType::Create);
        request.entity_id = Some("testEntityId2".into());
        request.metadata_url = Some("TestMetadataUrl2".into());

        assert_eq!(
            metadata_source(&request).unwrap(),
            MetadataSource::new("testId2", "testEntityId2", "TestMetadataUrl2")
        );
    }

    #[test]
    fn entity_id_is_required() {
        let mut request = ChangeRequest::new(7, DeploymentType::Edit);
        request.metadata_url = Some("https://md".into());
        assert_eq!(
            metadata_source(&request),
            Err(TransformError::MissingField("entity_id"))
        );
    }
}
