//! Command implementations.

pub mod config;
pub mod cycle;
pub mod transform;

pub use config::run_config;
pub use cycle::{run_agent, run_once};
pub use transform::run_transform;
