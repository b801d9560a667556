//! Tracing subscriber setup.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{CoreError, CoreResult};

/// Builds the filter: `RUST_LOG` wins over the configured level.
fn env_filter(config: &LoggingConfig) -> CoreResult<EnvFilter> {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives),
        _ => EnvFilter::try_new(&config.level),
    }
    .map_err(|e| CoreError::Logging(format!("invalid log filter: {e}")))
}

/// Installs the global tracing subscriber.
///
/// ## Errors
///
/// Fails when the filter directive is invalid or a subscriber is already set.
pub fn init(config: &LoggingConfig) -> CoreResult<()> {
    let filter = env_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Full => registry.with(tracing_subscriber::fmt::layer()).try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact())
            .try_init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init(),
    };

    result.map_err(|e| CoreError::Logging(e.to_string()))?;
    tracing::debug!(level = %config.level, format = ?config.format, "logging initialized");
    Ok(())
}
