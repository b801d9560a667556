//! Agent configuration.
//!
//! Configuration is read from a TOML file and then overlaid with a small set
//! of environment variables (a `.env` file is honoured when present).

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// Environment variable naming an explicit configuration file.
pub const CONFIG_ENV: &str = "RA_CONFIG";

/// Configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "ra-agent.toml";

const REDACTED: &str = "***";

/// Top-level agent configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Message bus connection.
    pub bus: BusConfig,

    /// Poll schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Logging setup.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Outcome policy.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Backend-tenant pairings, processed in declaration order.
    #[serde(default)]
    pub deployers: Vec<DeployerConfig>,
}

/// Message bus (ARGO Messaging Service) connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusConfig {
    /// Base URL of the messaging service.
    pub host: String,

    /// Project owning the topics and subscriptions.
    pub project: String,

    /// API token.
    pub token: String,

    /// Request timeout in seconds. `None` keeps the transport default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Poll schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Seconds between the end of one cycle and the start of the next.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Maximum number of messages pulled per pairing and cycle.
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

fn default_interval_secs() -> u64 {
    3
}

fn default_batch_size() -> u32 {
    1
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            batch_size: default_batch_size(),
        }
    }
}

impl ScheduleConfig {
    /// Returns the poll interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Default multi-field single-line format.
    #[default]
    Full,
    /// Compact single-line format.
    Compact,
    /// Multi-line human-friendly format.
    Pretty,
    /// Newline-delimited JSON.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Outcome reporting policy.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Report an error outcome when a follow-up call (scope, permission,
    /// service-account update) fails after the primary operation succeeded.
    #[serde(default)]
    pub fail_on_follow_up_error: bool,
}

/// One backend-tenant pairing: a bus subscription feeding one backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployerConfig {
    /// Unique pairing name, used in logs and on the command line.
    pub name: String,

    /// Subscription pulled for change requests.
    pub pull_subscription: String,

    /// Topic outcome records are published to.
    pub publish_topic: String,

    /// Numeric agent identifier echoed in every outcome.
    #[serde(default)]
    pub agent_id: Option<u64>,

    /// Deployer name echoed in every outcome.
    #[serde(default)]
    pub deployer_name: Option<String>,

    /// Target backend.
    pub backend: BackendConfig,
}

/// Target backend, tagged by `kind`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum BackendConfig {
    /// Keycloak, OpenID Connect clients.
    KeycloakOidc(KeycloakConfig),
    /// Keycloak, SAML service providers.
    KeycloakSaml(KeycloakConfig),
    /// MITREid Connect client API.
    Mitreid(MitreidConfig),
    /// SimpleSAMLphp metadata aggregator.
    Ssp(SspConfig),
}

impl BackendConfig {
    /// Returns the backend kind as written in configuration.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::KeycloakOidc(_) => "keycloak-oidc",
            Self::KeycloakSaml(_) => "keycloak-saml",
            Self::Mitreid(_) => "mitreid",
            Self::Ssp(_) => "ssp",
        }
    }

    fn validate(&self, pairing: &str) -> CoreResult<()> {
        match self {
            Self::KeycloakOidc(kc) | Self::KeycloakSaml(kc) => {
                require(pairing, "server_url", &kc.server_url)?;
                require(pairing, "realm", &kc.realm)?;
                require(pairing, "token", &kc.token)?;
                if let Some(ref sa) = kc.service_account {
                    require(pairing, "service_account.attribute_name", &sa.attribute_name)?;
                    require(pairing, "service_account.candidate", &sa.candidate)?;
                }
                Ok(())
            }
            Self::Mitreid(mitreid) => {
                require(pairing, "issuer", &mitreid.issuer)?;
                require(pairing, "token", &mitreid.token)
            }
            Self::Ssp(ssp) => {
                if ssp.syncer_url.is_some() && ssp.syncer_key.is_none() {
                    return Err(CoreError::config(format!(
                        "deployer '{pairing}': syncer_key is required when syncer_url is set"
                    )));
                }
                Ok(())
            }
        }
    }

    fn redact(&mut self) {
        match self {
            Self::KeycloakOidc(kc) | Self::KeycloakSaml(kc) => kc.token = REDACTED.to_string(),
            Self::Mitreid(mitreid) => mitreid.token = REDACTED.to_string(),
            Self::Ssp(ssp) => {
                if ssp.syncer_key.is_some() {
                    ssp.syncer_key = Some(REDACTED.to_string());
                }
            }
        }
    }
}

/// Keycloak admin API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeycloakConfig {
    /// Server URL including any context path (e.g. `https://idp.example.org/auth`).
    pub server_url: String,

    /// Realm the clients live in.
    pub realm: String,

    /// Bearer token with realm admin privileges.
    pub token: String,

    /// Request timeout in seconds. `None` keeps the transport default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Service-account profile synchronisation.
    #[serde(default)]
    pub service_account: Option<ServiceAccountConfig>,

    /// Create realm client scopes that a request names but the realm lacks.
    #[serde(default)]
    pub create_missing_scopes: bool,
}

/// Service-account user profile settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceAccountConfig {
    /// User attribute receiving the scoped identifier.
    pub attribute_name: String,

    /// Service-account user field used as the identifier's local part.
    pub candidate: String,

    /// Scope appended after `@`.
    pub scope: String,
}

/// MITREid Connect API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MitreidConfig {
    /// Issuer URL; the client API lives under `<issuer>/api/clients`.
    pub issuer: String,

    /// Bearer token with admin privileges.
    pub token: String,

    /// Request timeout in seconds. `None` keeps the transport default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// SimpleSAMLphp metadata aggregator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SspConfig {
    /// JSON file holding the registered metadata sources.
    pub state_file: PathBuf,

    /// Generated PHP metarefresh configuration.
    pub config_file: PathBuf,

    /// Cron endpoint triggering a metadata refresh.
    #[serde(default)]
    pub syncer_url: Option<String>,

    /// Cron key.
    #[serde(default)]
    pub syncer_key: Option<String>,

    /// Cron tag.
    #[serde(default = "default_syncer_tag")]
    pub syncer_tag: String,

    /// Cron request timeout in seconds.
    #[serde(default = "default_syncer_timeout_secs")]
    pub syncer_timeout_secs: u64,
}

fn default_syncer_tag() -> String {
    "hourly".to_string()
}

fn default_syncer_timeout_secs() -> u64 {
    60
}

fn require(pairing: &str, field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(CoreError::config(format!(
            "deployer '{pairing}': {field} must not be empty"
        )));
    }
    Ok(())
}

impl AgentConfig {
    /// Loads configuration from `path`, or from the default location when
    /// `path` is `None`, then applies environment overrides and validates.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        let _ = dotenvy::dotenv();

        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::resolve_path()?,
        };

        let content = std::fs::read_to_string(&path).map_err(|source| CoreError::Io {
            path: path.clone(),
            source,
        })?;

        let mut config = Self::from_toml_str(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parses configuration from TOML without validating it.
    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Finds the configuration file: `$RA_CONFIG`, then `./ra-agent.toml`,
    /// then `~/.config/ra-agent/config.toml`.
    pub fn resolve_path() -> CoreResult<PathBuf> {
        if let Ok(explicit) = std::env::var(CONFIG_ENV) {
            return Ok(PathBuf::from(explicit));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            return Ok(local);
        }

        let home = dirs_next::config_dir()
            .ok_or_else(|| CoreError::config("could not determine configuration directory"))?;
        Ok(home.join("ra-agent").join("config.toml"))
    }

    /// Applies `RA_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> CoreResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("RA_BUS_HOST") {
            self.bus.host = host;
        }
        if let Some(project) = lookup("RA_BUS_PROJECT") {
            self.bus.project = project;
        }
        if let Some(token) = lookup("RA_BUS_TOKEN") {
            self.bus.token = token;
        }
        if let Some(interval) = lookup("RA_POLL_INTERVAL_SECS") {
            self.schedule.interval_secs = interval.parse().map_err(|_| {
                CoreError::config(format!("RA_POLL_INTERVAL_SECS is not a number: {interval}"))
            })?;
        }
        if let Some(batch) = lookup("RA_BATCH_SIZE") {
            self.schedule.batch_size = batch
                .parse()
                .map_err(|_| CoreError::config(format!("RA_BATCH_SIZE is not a number: {batch}")))?;
        }
        if let Some(level) = lookup("RA_LOG_LEVEL") {
            self.logging.level = level;
        }
        Ok(())
    }

    /// Checks the configuration for values the agent cannot run with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.bus.host.trim().is_empty() {
            return Err(CoreError::config("bus.host must not be empty"));
        }
        if self.bus.project.trim().is_empty() {
            return Err(CoreError::config("bus.project must not be empty"));
        }
        if self.schedule.batch_size == 0 {
            return Err(CoreError::config("schedule.batch_size must be at least 1"));
        }
        if self.schedule.interval_secs == 0 {
            return Err(CoreError::config("schedule.interval_secs must be at least 1"));
        }
        if self.deployers.is_empty() {
            return Err(CoreError::config("at least one [[deployers]] entry is required"));
        }

        let mut names = HashSet::new();
        for deployer in &self.deployers {
            if deployer.name.trim().is_empty() {
                return Err(CoreError::config("deployer name must not be empty"));
            }
            if !names.insert(deployer.name.as_str()) {
                return Err(CoreError::config(format!(
                    "duplicate deployer name '{}'",
                    deployer.name
                )));
            }
            require(&deployer.name, "pull_subscription", &deployer.pull_subscription)?;
            require(&deployer.name, "publish_topic", &deployer.publish_topic)?;
            deployer.backend.validate(&deployer.name)?;
        }
        Ok(())
    }

    /// Looks up a pairing by name.
    #[must_use]
    pub fn deployer(&self, name: &str) -> Option<&DeployerConfig> {
        self.deployers.iter().find(|d| d.name == name)
    }

    /// Returns a copy with every secret replaced, suitable for display.
    #[must_use]
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.bus.token = REDACTED.to_string();
        for deployer in &mut copy.deployers {
            deployer.backend.redact();
        }
        copy
    }
}
