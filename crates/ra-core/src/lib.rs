//! # ra-core
//!
//! Foundational types shared by every crate of the registry deployment agent:
//! configuration loading, the core error type, and logging setup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod logging;

pub use config::{
    AgentConfig, BackendConfig, BusConfig, DeployerConfig, KeycloakConfig, LogFormat,
    LoggingConfig, MitreidConfig, PolicyConfig, ScheduleConfig, ServiceAccountConfig, SspConfig,
};
pub use error::{CoreError, CoreResult};
