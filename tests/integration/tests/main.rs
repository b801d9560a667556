//! End-to-end agent cycles.
//!
//! Each test runs real cycles through the AMS client and the backend
//! clients against wiremock servers standing in for the messaging service
//! and the identity backends.

mod keycloak_cycle;
mod mitreid_cycle;
mod ssp_cycle;
