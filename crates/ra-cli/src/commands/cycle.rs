//! Agent loop and single-round commands.

use std::sync::Arc;

use ra_bus::{AmsClient, MessageBus};
use ra_core::AgentConfig;
use ra_reconcile::{build, BatchDriver, CycleReport, Scheduler};
use tracing::{info, warn};

use crate::cli::OutputFormat;
use crate::output;
use crate::CliError;

fn bus(config: &AgentConfig) -> crate::CliResult<Arc<dyn MessageBus>> {
    Ok(Arc::new(AmsClient::from_config(&config.bus)?))
}

/// Builds the scheduler, optionally restricted to one pairing.
pub fn scheduler(
    config: &AgentConfig,
    bus: Arc<dyn MessageBus>,
    only: Option<&str>,
) -> crate::CliResult<Scheduler> {
    let Some(name) = only else {
        return Ok(build::scheduler(config, bus)?);
    };

    let deployer = config
        .deployer(name)
        .ok_or_else(|| CliError::UnknownPairing(name.to_string()))?;
    let policy = ra_reconcile::FollowUpPolicy::from_flag(config.policy.fail_on_follow_up_error);
    Ok(Scheduler::new(
        BatchDriver::new(bus, config.schedule.batch_size),
        vec![build::pairing(deployer, policy)?],
        config.schedule.interval(),
    ))
}

/// Polls every pairing until Ctrl-C.
pub async fn run_agent(config: &AgentConfig) -> crate::CliResult<()> {
    let scheduler = scheduler(config, bus(config)?, None)?;
    info!(
        bus = %config.bus.host,
        project = %config.bus.project,
        pairings = scheduler.pairings().len(),
        "agent starting"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl-C, stopping");
        }
    };
    let rounds = scheduler.run_until(shutdown).await;
    info!(rounds, "agent stopped");
    Ok(())
}

/// Runs one round and prints the outcomes.
pub async fn run_once(
    config: &AgentConfig,
    pairing: Option<&str>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let scheduler = scheduler(config, bus(config)?, pairing)?;
    let results = scheduler.run_once().await;
    let total = results.len();

    let mut reports: Vec<CycleReport> = Vec::with_capacity(total);
    let mut failed = 0;
    for result in results {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => {
                failed += 1;
                output::error(&e.to_string());
            }
        }
    }

    output::reports(&reports, format)?;
    if failed > 0 {
        return Err(CliError::CyclesFailed { failed, total });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"
[bus]
host = "msg.example.org"
project = "registry"
token = "secret"

[[deployers]]
name = "legacy"
pull_subscription = "mitreid-pending"
publish_topic = "deployer-results"
agent_id = 1

[deployers.backend]
kind = "mitreid"
issuer = "https://legacy.example.org/oidc"
token = "mitre-secret"
"#;

    #[test]
    fn restricts_to_named_pairing() {
        let config = AgentConfig::from_toml_str(CONFIG).unwrap();
        let bus = bus(&config).unwrap();

        let scheduler = scheduler(&config, bus.clone(), Some("legacy")).unwrap();
        assert_eq!(scheduler.pairings().len(), 1);

        let error = scheduler_error(&config, bus, "missing");
        assert!(matches!(error, CliError::UnknownPairing(name) if name == "missing"));
    }

    fn scheduler_error(config: &AgentConfig, bus: Arc<dyn MessageBus>, name: &str) -> CliError {
        match scheduler(config, bus, Some(name)) {
            Ok(_) => panic!("pairing {name} should not exist"),
            Err(e) => e,
        }
    }
}
