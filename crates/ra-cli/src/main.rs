//! # ra-agent
//!
//! Registry deployment agent.

#![forbid(unsafe_code)]

use anyhow::Context;
use clap::Parser;
use ra_cli::{
    cli::{Cli, Command},
    commands::{run_agent, run_config, run_once, run_transform},
    output::error,
};
use ra_core::AgentConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let path = cli.config.as_deref();

    match cli.command {
        Command::Config(cmd) => run_config(cmd, path, cli.output)?,
        Command::Transform(ref args) => {
            let config = AgentConfig::load(path).context("failed to load configuration")?;
            run_transform(args, &config, cli.output)?;
        }
        Command::Run => {
            let config = load_with_logging(path, cli.verbose)?;
            run_agent(&config).await?;
        }
        Command::Once { ref pairing } => {
            let config = load_with_logging(path, cli.verbose)?;
            run_once(&config, pairing.as_deref(), cli.output).await?;
        }
    }
    Ok(())
}

fn load_with_logging(path: Option<&std::path::Path>, verbose: bool) -> anyhow::Result<AgentConfig> {
    let mut config = AgentConfig::load(path).context("failed to load configuration")?;
    if verbose {
        config.logging.level = "debug".to_string();
    }
    ra_core::logging::init(&config.logging).context("failed to initialise logging")?;
    Ok(config)
}
