//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Registry deployment agent: applies service registrations from the
/// message bus to identity backends.
#[derive(Debug, Parser)]
#[command(name = "ra-agent")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Configuration file (overrides `RA_CONFIG` and the default locations).
    #[arg(short, long, env = "RA_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value = "table")]
    pub output: OutputFormat,

    /// Log at debug level regardless of configuration.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Poll every pairing until interrupted.
    Run,

    /// Run a single cycle over every pairing and print the outcomes.
    Once {
        /// Only run this pairing.
        #[arg(long)]
        pairing: Option<String>,
    },

    /// Print the backend payload a change request maps to, without
    /// contacting any backend.
    Transform(TransformArgs),

    /// Configuration management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Arguments of `transform`.
#[derive(Debug, clap::Args)]
pub struct TransformArgs {
    /// Pairing whose backend decides the payload shape.
    #[arg(long)]
    pub pairing: String,

    /// Change request JSON file (`-` for stdin).
    #[arg(long)]
    pub file: PathBuf,

    /// Realm default client scope, for Keycloak backends. Repeatable.
    #[arg(long = "default-scope")]
    pub default_scopes: Vec<String>,
}

/// Config commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show the effective configuration with secrets redacted.
    Show,

    /// Check the configuration and report the pairings.
    Validate,

    /// Print the configuration file that would be used.
    Path,
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON format.
    Json,
    /// Quiet (exit status only).
    Quiet,
}
