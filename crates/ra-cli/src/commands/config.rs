//! Configuration commands.

use std::path::Path;

use ra_core::AgentConfig;

use crate::cli::{ConfigCommand, OutputFormat};
use crate::output::{info, single, success};

/// Runs a config command.
pub fn run_config(
    cmd: ConfigCommand,
    path: Option<&Path>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    match cmd {
        ConfigCommand::Show => show_config(path, format),
        ConfigCommand::Validate => validate_config(path),
        ConfigCommand::Path => {
            let path = match path {
                Some(p) => p.to_path_buf(),
                None => AgentConfig::resolve_path()?,
            };
            println!("{}", path.display());
            Ok(())
        }
    }
}

/// Shows the configuration with secrets redacted.
fn show_config(path: Option<&Path>, format: OutputFormat) -> crate::CliResult<()> {
    let config = AgentConfig::load(path)?.redacted();
    match format {
        OutputFormat::Table => print!("{}", toml::to_string_pretty(&config)?),
        OutputFormat::Json | OutputFormat::Quiet => single(&config, format)?,
    }
    Ok(())
}

/// Loads and validates the configuration.
fn validate_config(path: Option<&Path>) -> crate::CliResult<()> {
    let config = AgentConfig::load(path)?;
    success("Configuration is valid");
    for deployer in &config.deployers {
        info(&format!(
            "{}: {} ({} -> {})",
            deployer.name,
            deployer.backend.kind(),
            deployer.pull_subscription,
            deployer.publish_topic
        ));
    }
    Ok(())
}
