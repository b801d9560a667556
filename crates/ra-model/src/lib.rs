//! # ra-model
//!
//! Data model of the registry deployment agent.
//!
//! - [`ChangeRequest`]: one pending create/edit/delete instruction pulled from
//!   the bus.
//! - [`OutcomeRecord`]: the deployment result published back to the registry.
//! - Backend representations: the JSON shapes exchanged with Keycloak,
//!   MITREid Connect and the SimpleSAMLphp metadata aggregator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod keycloak;
pub mod metadata;
pub mod mitreid;
pub mod outcome;
pub mod request;

mod serde_ext;

pub use metadata::MetadataSource;
pub use mitreid::MitreidClient;
pub use outcome::{is_success_status, DeploymentState, OutboundMessage, OutcomeRecord};
pub use request::{
    ChangeRequest, Contact, DeploymentType, RequestedAttribute, ServiceId, ServiceProtocol,
};
