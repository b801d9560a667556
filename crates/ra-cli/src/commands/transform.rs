//! Transformation dry-run.

use std::io::Read;
use std::path::Path;

use ra_core::AgentConfig;
use ra_model::ChangeRequest;
use ra_transform::{BackendPayload, Transformer};

use crate::cli::{OutputFormat, TransformArgs};
use crate::output::single;
use crate::CliError;

/// Maps the change request in `args.file` through the pairing's transformer
/// and prints the payload.
pub fn run_transform(
    args: &TransformArgs,
    config: &AgentConfig,
    format: OutputFormat,
) -> crate::CliResult<()> {
    let deployer = config
        .deployer(&args.pairing)
        .ok_or_else(|| CliError::UnknownPairing(args.pairing.clone()))?;

    let request = read_request(&args.file)?;
    let payload = transform(&deployer.backend, &request, &args.default_scopes)?;
    single(&payload, format)
}

/// Maps `request` for `backend`.
pub fn transform(
    backend: &ra_core::BackendConfig,
    request: &ChangeRequest,
    default_scopes: &[String],
) -> crate::CliResult<BackendPayload> {
    Ok(Transformer::for_backend(backend).transform(request, default_scopes)?)
}

fn read_request(path: &Path) -> crate::CliResult<ChangeRequest> {
    let content = if path == Path::new("-") {
        let mut buffer = String::new();
        std::io::stdin().read_to_string(&mut buffer)?;
        buffer
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(serde_json::from_str(&content)?)
}
