//! Shared harness for end-to-end agent cycles: a mock messaging service
//! plus the agent wired to it.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use ra_bus::{AmsClient, MessageBus};
use ra_core::AgentConfig;
use ra_reconcile::{build, Scheduler};
use serde_json::{json, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

/// AMS project.
pub const PROJECT: &str = "registry";
/// Subscription change requests are pulled from.
pub const SUBSCRIPTION: &str = "pending";
/// Topic outcomes are published to.
pub const TOPIC: &str = "deployer-results";

/// A mock messaging service plus the agent wired to it.
pub struct TestEnv {
    /// Mock AMS.
    pub bus: MockServer,
    /// Agent configuration, pointing at `bus`.
    pub config: AgentConfig,
}

impl TestEnv {
    /// Starts a bus and configures one pairing whose backend table is
    /// `backend` (TOML, without the `[deployers.backend]` header).
    pub async fn new(backend: &str) -> anyhow::Result<Self> {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("ra_reconcile=debug,ra_backend=debug")
            .with_test_writer()
            .try_init();

        let bus = MockServer::start().await;
        let config = AgentConfig::from_toml_str(&format!(
            r#"
[bus]
host = "{host}"
project = "{PROJECT}"
token = "bus-token"

[schedule]
batch_size = 10

[[deployers]]
name = "pairing"
pull_subscription = "{SUBSCRIPTION}"
publish_topic = "{TOPIC}"
agent_id = 1

[deployers.backend]
{backend}
"#,
            host = bus.uri(),
        ))?;
        config.validate()?;

        Ok(Self { bus, config })
    }

    /// Builds the scheduler over the real AMS client.
    pub fn scheduler(&self) -> anyhow::Result<Scheduler> {
        let bus: Arc<dyn MessageBus> = Arc::new(AmsClient::from_config(&self.config.bus)?);
        Ok(build::scheduler(&self.config, bus)?)
    }

    /// Queues `requests` on the subscription, served once.
    pub async fn queue(&self, requests: &[Value]) {
        let received: Vec<Value> = requests
            .iter()
            .enumerate()
            .map(|(i, request)| {
                json!({
                    "ackId": format!("ack-{i}"),
                    "message": {
                        "messageId": format!("{i}"),
                        "attributes": {},
                        "data": STANDARD.encode(request.to_string())
                    }
                })
            })
            .collect();

        Mock::given(method("POST"))
            .and(path(format!(
                "/v1/projects/{PROJECT}/subscriptions/{SUBSCRIPTION}:pull"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "receivedMessages": received
            })))
            .up_to_n_times(1)
            .mount(&self.bus)
            .await;
    }

    /// Accepts publishes to the results topic.
    pub async fn accept_publish(&self) {
        Mock::given(method("POST"))
            .and(path(format!("/v1/projects/{PROJECT}/topics/{TOPIC}:publish")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "messageIds": ["m-1"]
            })))
            .mount(&self.bus)
            .await;
    }

    /// Accepts acknowledgements, expecting exactly `times` of them.
    pub async fn expect_ack(&self, times: u64) {
        Mock::given(method("POST"))
            .and(path(format!(
                "/v1/projects/{PROJECT}/subscriptions/{SUBSCRIPTION}:acknowledge"
            )))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(times)
            .mount(&self.bus)
            .await;
    }

    /// Returns the outcome records published so far, decoded.
    pub async fn published(&self) -> anyhow::Result<Vec<Value>> {
        let mut outcomes = Vec::new();
        for request in self.requests(":publish").await {
            let body: Value = serde_json::from_slice(&request.body)?;
            for message in body["messages"].as_array().into_iter().flatten() {
                let data = STANDARD.decode(message["data"].as_str().unwrap_or_default())?;
                outcomes.push(serde_json::from_slice(&data)?);
            }
        }
        Ok(outcomes)
    }

    /// Returns the ack IDs acknowledged so far.
    pub async fn acknowledged(&self) -> anyhow::Result<Vec<String>> {
        let mut ack_ids = Vec::new();
        for request in self.requests(":acknowledge").await {
            let body: Value = serde_json::from_slice(&request.body)?;
            ack_ids.extend(
                body["ackIds"]
                    .as_array()
                    .into_iter()
                    .flatten()
                    .filter_map(|id| id.as_str().map(str::to_string)),
            );
        }
        Ok(ack_ids)
    }

    async fn requests(&self, action: &str) -> Vec<Request> {
        self.bus
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().ends_with(action))
            .collect()
    }
}
