//! ARGO Messaging Service REST client.

use std::time::Duration;

use async_trait::async_trait;
use ra_core::BusConfig;
use ra_model::OutboundMessage;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::error::{BusError, BusResult};
use crate::message::{
    AckRequest, PublishRequest, PublishResponse, PullRequest, PullResponse, PulledMessage,
    ReceivedMessage, WireMessage,
};
use crate::MessageBus;

/// AMS client bound to one project.
#[derive(Debug, Clone)]
pub struct AmsClient {
    client: reqwest::Client,
    base_url: Url,
    project: String,
    token: String,
}

impl AmsClient {
    /// Creates a client. `host` may omit the scheme, in which case HTTPS is
    /// used.
    pub fn new(
        host: &str,
        project: impl Into<String>,
        token: impl Into<String>,
        timeout: Option<Duration>,
    ) -> BusResult<Self> {
        let base_url = parse_endpoint(host)?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
            project: project.into(),
            token: token.into(),
        })
    }

    /// Creates a client from configuration.
    pub fn from_config(config: &BusConfig) -> BusResult<Self> {
        Self::new(
            &config.host,
            config.project.clone(),
            config.token.clone(),
            config.timeout_secs.map(Duration::from_secs),
        )
    }

    /// Returns the parsed endpoint.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// `<base>/v1/projects/<project>/<kind>/<name>:<action>`
    fn url(&self, kind: &str, name: &str, action: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend([
                "v1",
                "projects",
                self.project.as_str(),
                kind,
                &format!("{name}:{action}"),
            ]);
        }
        url
    }

    async fn post<B, T>(&self, url: &Url, body: &B) -> BusResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Default,
    {
        let response = self
            .client
            .post(url.clone())
            .query(&[("key", self.token.as_str())])
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!(%url, error = %e, "bus unreachable");
                e
            })?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            warn!(%url, status = status.as_u16(), response = %text, "bus returned an error");
            return Err(BusError::Status {
                status: status.as_u16(),
                message: text,
            });
        }

        if text.trim().is_empty() {
            return Ok(T::default());
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl MessageBus for AmsClient {
    #[instrument(skip(self), fields(project = %self.project))]
    async fn pull(&self, subscription: &str, max_messages: u32) -> BusResult<Vec<PulledMessage>> {
        let url = self.url("subscriptions", subscription, "pull");
        let body = PullRequest {
            max_messages: max_messages.to_string(),
            return_immediately: "true".to_string(),
        };

        let response: PullResponse = self.post(&url, &body).await?;
        let messages: Vec<PulledMessage> = response
            .received_messages
            .into_iter()
            .map(ReceivedMessage::decode)
            .collect();

        for message in messages.iter().filter(|m| !m.is_decoded()) {
            warn!(ack_id = %message.ack_id, error = ?message.decode_error, "pulled message has undecodable data");
        }
        debug!(count = messages.len(), "pulled messages");
        Ok(messages)
    }

    #[instrument(skip(self, ack_ids), fields(count = ack_ids.len()))]
    async fn ack(&self, subscription: &str, ack_ids: &[String]) -> BusResult<()> {
        if ack_ids.is_empty() {
            return Ok(());
        }
        let url = self.url("subscriptions", subscription, "acknowledge");
        let _: serde_json::Value = self.post(&url, &AckRequest { ack_ids }).await?;
        Ok(())
    }

    #[instrument(skip(self, messages), fields(count = messages.len()))]
    async fn publish(&self, topic: &str, messages: &[OutboundMessage]) -> BusResult<Vec<String>> {
        if messages.is_empty() {
            return Ok(Vec::new());
        }

        let wire = messages
            .iter()
            .map(|m| {
                let payload = serde_json::to_vec(&m.data)?;
                Ok(WireMessage::encode(m.attributes.clone(), &payload))
            })
            .collect::<BusResult<Vec<_>>>()?;

        let url = self.url("topics", topic, "publish");
        let response: PublishResponse = self
            .post(&url, &PublishRequest { messages: wire })
            .await?;

        debug!(message_ids = ?response.message_ids, "published outcomes");
        Ok(response.message_ids)
    }
}


/// Parses the configured host. A bare host name gets the `https` scheme.
fn parse_endpoint(host: &str) -> BusResult<Url> {
    let host = host.trim();
    let invalid = |reason: &str| BusError::InvalidEndpoint {
        endpoint: host.to_string(),
        reason: reason.to_string(),
    };

    let raw = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    let url = Url::parse(&raw).map_err(|e| invalid(&e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("scheme must be http or https"));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host"));
    }
    Ok(url)
}
