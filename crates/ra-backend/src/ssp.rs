//! SimpleSAMLphp metarefresh aggregator.
//!
//! Sources live in a JSON state file. After every change the metarefresh
//! PHP configuration is regenerated from that file and, when configured, the
//! cron syncer is triggered so the aggregator fetches the new metadata. The
//! syncer's status becomes the status of the operation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use askama::Template;
use async_trait::async_trait;
use ra_core::SspConfig;
use ra_model::MetadataSource;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::BackendResult;
use crate::http::parse_base_url;
use crate::response::ApiResponse;
use crate::EntityApi;

/// Status reported when no syncer is configured.
const LOCAL_OK: u16 = 200;

/// Cron trigger of the SimpleSAMLphp installation.
#[derive(Debug, Clone)]
struct Syncer {
    client: reqwest::Client,
    url: Url,
    key: String,
    tag: String,
}

impl Syncer {
    async fn trigger(&self) -> ApiResponse<()> {
        let request = self
            .client
            .get(self.url.clone())
            .query(&[("key", self.key.as_str()), ("tag", self.tag.as_str())]);

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(url = %self.url, error = %e, "syncer unreachable");
                return ApiResponse::transport(e.to_string());
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!(url = %self.url, status = status.as_u16(), "syncer triggered");
            return ApiResponse::ok(status.as_u16(), ());
        }

        let text = response.text().await.unwrap_or_default();
        warn!(url = %self.url, status = status.as_u16(), response = %text, "syncer returned an error");
        let description = if text.trim().is_empty() {
            format!("syncer returned HTTP {}", status.as_u16())
        } else {
            text.trim().to_string()
        };
        ApiResponse::error(status.as_u16(), description)
    }
}

/// File-backed metadata source registry with an optional cron trigger.
#[derive(Debug)]
pub struct SspAggregator {
    state_file: PathBuf,
    config_file: PathBuf,
    tag: String,
    syncer: Option<Syncer>,
    lock: Mutex<()>,
}

impl SspAggregator {
    /// Creates an aggregator without a syncer.
    #[must_use]
    pub fn new(state_file: impl Into<PathBuf>, config_file: impl Into<PathBuf>) -> Self {
        Self {
            state_file: state_file.into(),
            config_file: config_file.into(),
            tag: "hourly".to_string(),
            syncer: None,
            lock: Mutex::new(()),
        }
    }

    /// Creates an aggregator from configuration.
    pub fn from_config(config: &SspConfig) -> BackendResult<Self> {
        let mut aggregator = Self::new(&config.state_file, &config.config_file);
        aggregator.tag.clone_from(&config.syncer_tag);

        if let (Some(url), Some(key)) = (&config.syncer_url, &config.syncer_key) {
            let client = reqwest::Client::builder()
                .timeout(Duration::from_secs(config.syncer_timeout_secs))
                .build()?;
            aggregator.syncer = Some(Syncer {
                client,
                url: parse_base_url(url)?,
                key: key.clone(),
                tag: config.syncer_tag.clone(),
            });
        }

        Ok(aggregator)
    }

    /// Returns every registered source.
    pub async fn sources(&self) -> ApiResponse<Vec<MetadataSource>> {
        match load_sources(&self.state_file).await {
            Ok(sources) => ApiResponse::ok(LOCAL_OK, sources),
            Err(e) => ApiResponse::transport(e),
        }
    }

    /// Persists `sources`, regenerates the PHP configuration and triggers
    /// the syncer.
    async fn commit(&self, sources: &[MetadataSource]) -> ApiResponse<()> {
        if let Err(e) = save_sources(&self.state_file, sources).await {
            return ApiResponse::transport(e);
        }

        let php = match render_config(sources, &self.tag) {
            Ok(php) => php,
            Err(e) => {
                warn!(error = %e, "failed to render metarefresh config");
                return ApiResponse::transport(format!("failed to render metarefresh config: {e}"));
            }
        };
        if let Err(e) = tokio::fs::write(&self.config_file, php).await {
            warn!(path = %self.config_file.display(), error = %e, "failed to write metarefresh config");
            return ApiResponse::transport(format!(
                "failed to write {}: {e}",
                self.config_file.display()
            ));
        }
        info!(path = %self.config_file.display(), sources = sources.len(), "metarefresh config written");

        match &self.syncer {
            Some(syncer) => syncer.trigger().await,
            None => ApiResponse::ok(LOCAL_OK, ()),
        }
    }
}

#[async_trait]
impl EntityApi for SspAggregator {
    type Entity = MetadataSource;

    async fn get_entity(&self, id: &str) -> ApiResponse<MetadataSource> {
        let sources = match load_sources(&self.state_file).await {
            Ok(sources) => sources,
            Err(e) => return ApiResponse::transport(e),
        };

        sources
            .into_iter()
            .find(|s| s.registry_service_id == id)
            .map_or_else(
                || ApiResponse::error(404, format!("no metadata source for service {id}")),
                |source| ApiResponse::ok(LOCAL_OK, source),
            )
    }

    /// Adds the source. An existing entry for the same service is left
    /// untouched and reported as success.
    async fn create_entity(&self, payload: &MetadataSource) -> ApiResponse<String> {
        let _guard = self.lock.lock().await;
        let mut sources = match load_sources(&self.state_file).await {
            Ok(sources) => sources,
            Err(e) => return ApiResponse::transport(e),
        };

        let id = payload.registry_service_id.clone();
        if sources.iter().any(|s| s.registry_service_id == id) {
            debug!(service_id = %id, "metadata source already registered");
            return ApiResponse::ok(LOCAL_OK, id);
        }

        sources.push(payload.clone());
        self.commit(&sources).await.map(|()| id)
    }

    /// Replaces the source for `id`, adding it when missing.
    async fn update_entity(&self, id: &str, payload: &MetadataSource) -> ApiResponse<()> {
        let _guard = self.lock.lock().await;
        let mut sources = match load_sources(&self.state_file).await {
            Ok(sources) => sources,
            Err(e) => return ApiResponse::transport(e),
        };

        let mut replacement = payload.clone();
        replacement.registry_service_id = id.to_string();
        match sources.iter_mut().find(|s| s.registry_service_id == id) {
            Some(existing) => *existing = replacement,
            None => sources.push(replacement),
        }

        self.commit(&sources).await
    }

    /// Removes the source for `id`. Removing a missing source is a no-op.
    async fn delete_entity(&self, id: &str) -> ApiResponse<()> {
        let _guard = self.lock.lock().await;
        let mut sources = match load_sources(&self.state_file).await {
            Ok(sources) => sources,
            Err(e) => return ApiResponse::transport(e),
        };

        let before = sources.len();
        sources.retain(|s| s.registry_service_id != id);
        if sources.len() == before {
            debug!(service_id = %id, "metadata source already absent");
            return ApiResponse::ok(LOCAL_OK, ());
        }

        self.commit(&sources).await
    }
}

/// Reads the state file. A missing file is an empty registry.
async fn load_sources(path: &Path) -> Result<Vec<MetadataSource>, String> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read metadata sources");
            return Err(format!("failed to read {}: {e}", path.display()));
        }
    };

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    serde_json::from_str(&content).map_err(|e| {
        warn!(path = %path.display(), error = %e, "invalid metadata source state");
        format!("invalid state file {}: {e}", path.display())
    })
}

async fn save_sources(path: &Path, sources: &[MetadataSource]) -> Result<(), String> {
    let content = serde_json::to_string_pretty(sources)
        .map_err(|e| format!("failed to encode metadata sources: {e}"))?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| format!("failed to create {}: {e}", parent.display()))?;
    }

    tokio::fs::write(path, content).await.map_err(|e| {
        warn!(path = %path.display(), error = %e, "failed to write metadata sources");
        format!("failed to write {}: {e}", path.display())
    })
}

/// The metarefresh module configuration.
#[derive(Template)]
#[template(path = "metarefresh.php", escape = "none")]
struct MetarefreshConfig<'a> {
    sources: &'a [MetadataSource],
    tag: &'a str,
}

mod filters {
    /// Renders `value` as a single-quoted PHP string literal.
    #[allow(clippy::unnecessary_wraps)]
    pub fn php_str<T: std::fmt::Display>(value: T) -> ::askama::Result<String> {
        let escaped = value.to_string().replace('\\', "\\\\").replace('\'', "\\'");
        Ok(format!("'{escaped}'"))
    }
}

/// Renders the metarefresh module configuration for `sources`.
pub fn render_config(sources: &[MetadataSource], tag: &str) -> askama::Result<String> {
    MetarefreshConfig { sources, tag }.render()
}
