//! # ra-cli
//!
//! Command-line entry point of the registry deployment agent:
//! - `run`: poll every pairing until interrupted
//! - `once`: a single cycle over every pairing, with a summary
//! - `transform`: dry-run of the payload mapping for one message
//! - `config`: inspect and validate the configuration

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use error::{CliError, CliResult};
