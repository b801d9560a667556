//! Realm-level state shared by the Keycloak deployers.

use ra_backend::{ApiFailure, KeycloakApi, ScopeKind};
use ra_core::ServiceAccountConfig;
use ra_model::keycloak::{ClientScopeRepresentation, PROTOCOL_OPENID_CONNECT};
use ra_model::ChangeRequest;
use ra_transform::contact_email;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::deployer::FollowUps;
use crate::scope::ScopeIndex;

/// Per-cycle cache of realm scope data.
#[derive(Debug, Default)]
struct RealmCache {
    defaults: Option<Vec<String>>,
    index: Option<ScopeIndex>,
}

/// A Keycloak realm seen through one protocol, with the realm's scope data
/// cached for the duration of a cycle.
#[derive(Debug)]
pub struct KeycloakRealm<A> {
    api: A,
    protocol: &'static str,
    create_missing_scopes: bool,
    cache: Mutex<RealmCache>,
}

impl<A: KeycloakApi> KeycloakRealm<A> {
    /// Wraps `api` for clients of `protocol`.
    #[must_use]
    pub fn new(api: A, protocol: &'static str) -> Self {
        Self {
            api,
            protocol,
            create_missing_scopes: false,
            cache: Mutex::new(RealmCache::default()),
        }
    }

    /// Creates unknown OpenID Connect scopes instead of skipping them.
    #[must_use]
    pub fn with_create_missing_scopes(mut self, enabled: bool) -> Self {
        self.create_missing_scopes = enabled;
        self
    }

    /// Returns the admin API.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Drops cached realm data.
    pub async fn reset(&self) {
        *self.cache.lock().await = RealmCache::default();
    }

    /// Returns the names of the realm's default client scopes for this
    /// protocol.
    pub async fn default_scopes(&self) -> Result<Vec<String>, ApiFailure> {
        let mut cache = self.cache.lock().await;
        if let Some(ref defaults) = cache.defaults {
            return Ok(defaults.clone());
        }

        let scopes = self
            .api
            .realm_default_client_scopes(self.protocol)
            .await
            .into_value()?;
        let names: Vec<String> = scopes.into_iter().map(|s| s.name).collect();
        debug!(protocol = self.protocol, scopes = ?names, "loaded realm default scopes");
        cache.defaults = Some(names.clone());
        Ok(names)
    }

    /// Resolves a scope name to its ID. Unknown scopes resolve to `None`,
    /// unless missing OpenID Connect scopes are to be created.
    pub async fn resolve_scope(&self, name: &str) -> Result<Option<String>, ApiFailure> {
        let mut cache = self.cache.lock().await;
        let mut index = match cache.index.take() {
            Some(index) => index,
            None => ScopeIndex::from_scopes(&self.api.realm_client_scopes().await.into_value()?),
        };

        let resolved = self.resolve_in(&mut index, name).await;
        cache.index = Some(index);
        resolved
    }

    async fn resolve_in(
        &self,
        index: &mut ScopeIndex,
        name: &str,
    ) -> Result<Option<String>, ApiFailure> {
        if let Some(id) = index.resolve(name) {
            return Ok(Some(id.to_string()));
        }

        if !self.create_missing_scopes || self.protocol != PROTOCOL_OPENID_CONNECT {
            warn!(scope = name, "client scope does not exist in the realm, skipping");
            return Ok(None);
        }

        info!(scope = name, "creating missing client scope");
        self.api
            .create_client_scope(&ClientScopeRepresentation::oidc(name))
            .await
            .into_value()?;
        *index = ScopeIndex::from_scopes(&self.api.realm_client_scopes().await.into_value()?);
        Ok(index.resolve(name).map(str::to_string))
    }

    /// Makes the client's `kind` scopes equal to `desired`: scopes missing
    /// from `current` are added, extra ones removed.
    pub async fn sync_client_scopes(
        &self,
        id: &str,
        kind: ScopeKind,
        current: &[String],
        desired: &[String],
        follow_ups: &mut FollowUps,
    ) {
        for name in desired.iter().filter(|n| !current.contains(n)) {
            let Some(Some(scope_id)) =
                follow_ups.check("resolve client scope", self.resolve_scope(name).await)
            else {
                continue;
            };
            let added = self.api.add_client_scope(id, &scope_id, kind).await;
            if follow_ups.check("add client scope", added.into_value()).is_some() {
                debug!(client = id, scope = %name, ?kind, "client scope added");
            }
        }

        for name in current.iter().filter(|n| !desired.contains(n)) {
            let Some(Some(scope_id)) =
                follow_ups.check("resolve client scope", self.resolve_scope(name).await)
            else {
                continue;
            };
            let removed = self.api.remove_client_scope(id, &scope_id, kind).await;
            if follow_ups.check("remove client scope", removed.into_value()).is_some() {
                debug!(client = id, scope = %name, ?kind, "client scope removed");
            }
        }
    }

    /// Sets fine-grained permissions to `wanted`. `current` of `None` means
    /// the state is unknown and is read first.
    pub async fn sync_permissions(
        &self,
        id: &str,
        wanted: bool,
        current: Option<bool>,
        follow_ups: &mut FollowUps,
    ) {
        let current = match current {
            Some(enabled) => enabled,
            None => {
                let read = self.api.authz_permissions(id).await.into_value();
                match follow_ups.check("read permissions", read) {
                    Some(permissions) => permissions.enabled,
                    None => return,
                }
            }
        };

        if current != wanted {
            let set = self.api.set_authz_permissions(id, wanted).await.into_value();
            if follow_ups.check("set permissions", set).is_some() {
                info!(client = id, enabled = wanted, "client permissions updated");
            }
        }
    }

    /// Copies the service identity onto the client's service-account user.
    /// The user is written only when something changed.
    pub async fn sync_service_account(
        &self,
        id: &str,
        request: &ChangeRequest,
        config: &ServiceAccountConfig,
        follow_ups: &mut FollowUps,
    ) {
        let read = self.api.service_account_user(id).await.into_value();
        let Some(mut user) = follow_ups.check("read service account", read) else {
            return;
        };

        let mut changed = false;
        if let Some(email) = contact_email(&request.contacts) {
            if user.email.as_deref() != Some(email) {
                user.email = Some(email.to_string());
                changed = true;
            }
        }
        if let Some(ref name) = request.service_name {
            if user.first_name.as_ref() != Some(name) {
                user.first_name = Some(name.clone());
                changed = true;
            }
        }
        if let Some(candidate) = user.field(&config.candidate) {
            let value = if config.scope.is_empty() {
                candidate
            } else {
                format!("{candidate}@{}", config.scope)
            };
            let values = vec![value];
            if user.attributes.get(&config.attribute_name) != Some(&values) {
                user.attributes.insert(config.attribute_name.clone(), values);
                changed = true;
            }
        } else {
            warn!(
                candidate = %config.candidate,
                "service account user has no such field, identifier attribute not set"
            );
        }

        if changed {
            let updated = self.api.update_user(&user).await.into_value();
            if follow_ups.check("update service account", updated).is_some() {
                info!(client = id, user = %user.id, "service account profile updated");
            }
        }
    }
}
