//! Deployer implementations, one per backend kind.

mod keycloak;
mod keycloak_oidc;
mod keycloak_saml;
mod mitreid;
mod ssp;

pub use keycloak::KeycloakRealm;
pub use keycloak_oidc::KeycloakOidcDeployer;
pub use keycloak_saml::KeycloakSamlDeployer;
pub use mitreid::MitreidDeployer;
pub use ssp::SspDeployer;

/// Reported when Keycloak could not be reached.
pub const KEYCLOAK_UNREACHABLE: &str = "An error occurred while calling Keycloak";

/// Reported when MITREid Connect could not be reached.
pub const MITREID_UNREACHABLE: &str = "An error occurred while calling mitreId";

/// Reported when the SimpleSAMLphp aggregator could not be updated.
pub const SSP_UNREACHABLE: &str = "An error occurred while calling SimpleSAMLphp";
