//! Batch cycle behaviour against a recording bus.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use ra_bus::{BusError, BusResult, MessageBus, PulledMessage};
use ra_model::{ChangeRequest, DeploymentState, OutboundMessage, ServiceId};
use ra_reconcile::{
    BatchDriver, CycleStage, DeployError, DeployResult, Deployer, Deployment, Pairing,
    Reconciler, Scheduler,
};

// ============================================================================
// Doubles
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum BusCall {
    Pull(String, u32),
    Publish(String, Vec<OutboundMessage>),
    Ack(String, Vec<String>),
}

#[derive(Default)]
struct FakeBus {
    pending: Mutex<Vec<PulledMessage>>,
    calls: Mutex<Vec<BusCall>>,
    fail_publish: bool,
}

impl FakeBus {
    fn with_messages(payloads: &[&str]) -> Self {
        let pending = payloads
            .iter()
            .enumerate()
            .map(|(i, payload)| PulledMessage::new(format!("ack-{i}"), *payload))
            .collect();
        Self {
            pending: Mutex::new(pending),
            ..Default::default()
        }
    }

    fn calls(&self) -> Vec<BusCall> {
        self.calls.lock().unwrap().clone()
    }

    fn published(&self) -> Vec<OutboundMessage> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BusCall::Publish(_, messages) => Some(messages),
                _ => None,
            })
            .flatten()
            .collect()
    }
}

#[async_trait]
impl MessageBus for FakeBus {
    async fn pull(&self, subscription: &str, max_messages: u32) -> BusResult<Vec<PulledMessage>> {
        self.calls
            .lock()
            .unwrap()
            .push(BusCall::Pull(subscription.to_string(), max_messages));
        let mut pending = self.pending.lock().unwrap();
        let take = pending.len().min(max_messages as usize);
        Ok(pending.drain(..take).collect())
    }

    async fn ack(&self, subscription: &str, ack_ids: &[String]) -> BusResult<()> {
        self.calls
            .lock()
            .unwrap()
            .push(BusCall::Ack(subscription.to_string(), ack_ids.to_vec()));
        Ok(())
    }

    async fn publish(&self, topic: &str, messages: &[OutboundMessage]) -> BusResult<Vec<String>> {
        if self.fail_publish {
            return Err(BusError::Status {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        self.calls
            .lock()
            .unwrap()
            .push(BusCall::Publish(topic.to_string(), messages.to_vec()));
        Ok((0..messages.len()).map(|i| format!("msg-{i}")).collect())
    }
}

/// Deploys everything except client `broken`, which the backend rejects.
#[derive(Default)]
struct ScriptedDeployer {
    cycles: Mutex<u32>,
}

#[async_trait]
impl Deployer for ScriptedDeployer {
    fn backend(&self) -> &'static str {
        "scripted"
    }

    fn unreachable_description(&self) -> &'static str {
        "An error occurred while calling the scripted backend"
    }

    async fn begin_cycle(&self) {
        *self.cycles.lock().unwrap() += 1;
    }

    async fn create(&self, request: &ChangeRequest) -> DeployResult<Deployment> {
        match request.client_id.as_deref() {
            Some("broken") => Err(DeployError::Backend {
                status: 500,
                description: "internal error".to_string(),
            }),
            Some(client_id) => Ok(Deployment::new(201)
                .with_external_id(format!("ext-{}", request.id))
                .with_client_id(client_id)),
            None => Err(DeployError::Backend {
                status: 400,
                description: "client_id missing".to_string(),
            }),
        }
    }

    async fn update(&self, _request: &ChangeRequest, external_id: &str) -> DeployResult<Deployment> {
        Ok(Deployment::new(204).with_external_id(external_id))
    }

    async fn delete(&self, _request: &ChangeRequest, external_id: &str) -> DeployResult<Deployment> {
        Ok(Deployment::new(204).with_external_id(external_id))
    }
}

fn pairing(deployer: Arc<ScriptedDeployer>) -> Pairing {
    let reconciler = Reconciler::new(deployer).with_identity(Some(1), None);
    Pairing::new("egi-oidc", "sub-oidc", "results", reconciler)
}

// ============================================================================
// Cycles
// ============================================================================

#[tokio::test]
async fn cycle_publishes_one_outcome_per_usable_message_then_acks() {
    let bus = Arc::new(FakeBus::with_messages(&[
        r#"{"id":1,"deployment_type":"create","client_id":"first"}"#,
        r#"{"id":2,"deployment_type":"create","client_id":"broken"}"#,
        r#"{"id":3,"deployment_type":"rename"}"#,
        r#"{"deployment_type":"create"}"#,
        r#"{"id":5,"deployment_type":"delete","external_id":"ext-5"}"#,
    ]));
    let deployer = Arc::new(ScriptedDeployer::default());
    let driver = BatchDriver::new(bus.clone(), 10);

    let report = driver.run_cycle(&pairing(deployer.clone())).await.unwrap();

    assert_eq!(report.pulled, 5);
    assert_eq!(report.deployed, 2);
    assert_eq!(report.failed, 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.published, 4);
    assert_eq!(report.acked, 5);
    assert_eq!(*deployer.cycles.lock().unwrap(), 1);

    let published = bus.published();
    let ids: Vec<ServiceId> = published.iter().map(|m| m.data.id.clone()).collect();
    assert_eq!(
        ids,
        [1, 2, 3, 5].map(ServiceId::Number).to_vec(),
        "outcomes keep message order"
    );
    assert_eq!(published[0].data.external_id.as_deref(), Some("ext-1"));
    assert_eq!(published[1].data.status_code, 500);
    assert_eq!(published[2].data.state, DeploymentState::Error);
    assert_eq!(published[2].data.status_code, 0);
    assert!(published.iter().all(|m| m.data.agent_id == Some(1)));

    let calls = bus.calls();
    assert!(matches!(calls.last(), Some(BusCall::Ack(sub, ids)) if sub == "sub-oidc" && ids.len() == 5));
    assert!(matches!(calls[1], BusCall::Publish(ref topic, _) if topic == "results"));
}

#[tokio::test]
async fn undecodable_message_is_dropped_without_failing_the_batch() {
    let bus = Arc::new(FakeBus {
        pending: Mutex::new(vec![
            PulledMessage::undecodable("ack-bad", "%%%", "Invalid symbol 37, offset 0."),
            PulledMessage::new(
                "ack-good",
                r#"{"id":1,"deployment_type":"create","client_id":"first"}"#,
            ),
        ]),
        ..Default::default()
    });
    let driver = BatchDriver::new(bus.clone(), 10);

    let report = driver
        .run_cycle(&pairing(Arc::new(ScriptedDeployer::default())))
        .await
        .unwrap();

    assert_eq!(report.pulled, 2);
    assert_eq!(report.dropped, 1);
    assert_eq!(report.deployed, 1);
    assert_eq!(report.published, 1);
    assert_eq!(report.acked, 2);

    let published = bus.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].data.id, ServiceId::Number(1));

    let acked = bus.calls().into_iter().find_map(|call| match call {
        BusCall::Ack(_, ids) => Some(ids),
        _ => None,
    });
    assert_eq!(
        acked,
        Some(vec!["ack-bad".to_string(), "ack-good".to_string()])
    );
}

#[tokio::test]
async fn publish_failure_leaves_messages_unacknowledged() {
    let bus = Arc::new(FakeBus {
        fail_publish: true,
        ..FakeBus::with_messages(&[r#"{"id":1,"deployment_type":"create","client_id":"first"}"#])
    });
    let driver = BatchDriver::new(bus.clone(), 10);

    let error = driver
        .run_cycle(&pairing(Arc::new(ScriptedDeployer::default())))
        .await
        .unwrap_err();

    assert_eq!(error.stage, CycleStage::Publish);
    assert_eq!(error.pairing, "egi-oidc");
    assert!(!bus.calls().iter().any(|c| matches!(c, BusCall::Ack(..))));
}

#[tokio::test]
async fn empty_pull_skips_publish_and_ack() {
    let bus = Arc::new(FakeBus::default());
    let deployer = Arc::new(ScriptedDeployer::default());
    let driver = BatchDriver::new(bus.clone(), 10);

    let report = driver.run_cycle(&pairing(deployer.clone())).await.unwrap();

    assert_eq!(report.pulled, 0);
    assert_eq!(bus.calls(), [BusCall::Pull("sub-oidc".to_string(), 10)]);
    assert_eq!(*deployer.cycles.lock().unwrap(), 0);
}

#[tokio::test]
async fn batch_size_bounds_each_pull() {
    let bus = Arc::new(FakeBus::with_messages(&[
        r#"{"id":1,"deployment_type":"create","client_id":"a"}"#,
        r#"{"id":2,"deployment_type":"create","client_id":"b"}"#,
        r#"{"id":3,"deployment_type":"create","client_id":"c"}"#,
    ]));
    let driver = BatchDriver::new(bus.clone(), 2);
    let pairing = pairing(Arc::new(ScriptedDeployer::default()));

    assert_eq!(driver.run_cycle(&pairing).await.unwrap().pulled, 2);
    assert_eq!(driver.run_cycle(&pairing).await.unwrap().pulled, 1);
}

#[tokio::test]
async fn scheduler_runs_every_pairing_and_stops_on_shutdown() {
    let bus = Arc::new(FakeBus::with_messages(&[
        r#"{"id":1,"deployment_type":"create","client_id":"a"}"#,
    ]));
    let first = Arc::new(ScriptedDeployer::default());
    let second = Arc::new(ScriptedDeployer::default());
    let scheduler = Scheduler::new(
        BatchDriver::new(bus.clone(), 10),
        vec![pairing(first), pairing(second)],
        Duration::from_secs(3600),
    );

    let results = scheduler.run_once().await;
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(Result::is_ok));

    let rounds = scheduler
        .run_until(tokio::time::sleep(Duration::from_millis(50)))
        .await;
    assert_eq!(rounds, 1);
}
