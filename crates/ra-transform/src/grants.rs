//! OAuth 2.0 grant type identifiers as sent by the registry.

/// Authorization Code grant.
pub const AUTHORIZATION_CODE: &str = "authorization_code";
/// Implicit grant.
pub const IMPLICIT: &str = "implicit";
/// Resource Owner Password Credentials grant.
pub const PASSWORD: &str = "password";
/// Client Credentials grant.
pub const CLIENT_CREDENTIALS: &str = "client_credentials";
/// Refresh Token grant.
pub const REFRESH_TOKEN: &str = "refresh_token";
/// Device Authorization grant (RFC 8628).
pub const DEVICE_CODE: &str = "urn:ietf:params:oauth:grant-type:device_code";
/// Token Exchange grant (RFC 8693).
pub const TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
