//! Wiring of pairings from configuration.

use std::sync::Arc;

use ra_backend::{BackendResult, KeycloakAdminClient, MitreidClientApi, SspAggregator};
use ra_bus::MessageBus;
use ra_core::{AgentConfig, BackendConfig, DeployerConfig};
use tracing::debug;

use crate::deployer::{Deployer, FollowUpPolicy};
use crate::deployers::{KeycloakOidcDeployer, KeycloakSamlDeployer, MitreidDeployer, SspDeployer};
use crate::driver::{BatchDriver, Pairing};
use crate::reconciler::Reconciler;
use crate::scheduler::Scheduler;

/// Builds the deployer for a backend.
pub fn deployer(backend: &BackendConfig, policy: FollowUpPolicy) -> BackendResult<Arc<dyn Deployer>> {
    let deployer: Arc<dyn Deployer> = match backend {
        BackendConfig::KeycloakOidc(config) => Arc::new(KeycloakOidcDeployer::from_config(
            KeycloakAdminClient::from_config(config)?,
            config,
            policy,
        )),
        BackendConfig::KeycloakSaml(config) => Arc::new(KeycloakSamlDeployer::new(
            KeycloakAdminClient::from_config(config)?,
            policy,
        )),
        BackendConfig::Mitreid(config) => {
            Arc::new(MitreidDeployer::new(MitreidClientApi::from_config(config)?))
        }
        BackendConfig::Ssp(config) => Arc::new(SspDeployer::new(SspAggregator::from_config(config)?)),
    };
    Ok(deployer)
}

/// Builds one pairing.
pub fn pairing(config: &DeployerConfig, policy: FollowUpPolicy) -> BackendResult<Pairing> {
    let reconciler = Reconciler::new(deployer(&config.backend, policy)?)
        .with_identity(config.agent_id, config.deployer_name.clone());
    debug!(pairing = %config.name, backend = config.backend.kind(), "pairing built");

    Ok(Pairing::new(
        &config.name,
        &config.pull_subscription,
        &config.publish_topic,
        reconciler,
    ))
}

/// Builds every configured pairing.
pub fn pairings(config: &AgentConfig) -> BackendResult<Vec<Pairing>> {
    let policy = FollowUpPolicy::from_flag(config.policy.fail_on_follow_up_error);
    config
        .deployers
        .iter()
        .map(|deployer| pairing(deployer, policy))
        .collect()
}

/// Builds the scheduler for `config` over `bus`.
pub fn scheduler(config: &AgentConfig, bus: Arc<dyn MessageBus>) -> BackendResult<Scheduler> {
    let driver = BatchDriver::new(bus, config.schedule.batch_size);
    Ok(Scheduler::new(
        driver,
        pairings(config)?,
        config.schedule.interval(),
    ))
}
