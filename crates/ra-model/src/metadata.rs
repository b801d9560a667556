//! Metadata sources registered with the SimpleSAMLphp aggregator.

use serde::{Deserialize, Serialize};

/// One metarefresh source: a metadata URL restricted to one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSource {
    /// Registry service identifier; the natural key of the entry.
    pub registry_service_id: String,
    /// Entity IDs accepted from `src`.
    pub whitelist: Vec<String>,
    /// Metadata URL.
    pub src: String,
}

impl MetadataSource {
    /// Creates a source for a single entity.
    #[must_use]
    pub fn new(
        registry_service_id: impl Into<String>,
        entity_id: impl Into<String>,
        src: impl Into<String>,
    ) -> Self {
        Self {
            registry_service_id: registry_service_id.into(),
            whitelist: vec![entity_id.into()],
            src: src.into(),
        }
    }

    /// Returns the first whitelisted entity ID.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        self.whitelist.first().map(String::as_str)
    }
}
