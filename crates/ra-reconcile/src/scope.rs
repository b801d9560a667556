//! Realm client scope lookup.

use std::collections::BTreeMap;

use ra_model::keycloak::ClientScopeRepresentation;

/// Client scope name to internal ID, built from the realm's scope list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeIndex {
    by_name: BTreeMap<String, String>,
}

impl ScopeIndex {
    /// Indexes every scope that carries an ID.
    #[must_use]
    pub fn from_scopes(scopes: &[ClientScopeRepresentation]) -> Self {
        let by_name = scopes
            .iter()
            .filter_map(|s| s.id.as_ref().map(|id| (s.name.clone(), id.clone())))
            .collect();
        Self { by_name }
    }

    /// Returns the ID of the scope called `name`.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.by_name.get(name).map(String::as_str)
    }

    /// Returns the number of indexed scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Returns whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
