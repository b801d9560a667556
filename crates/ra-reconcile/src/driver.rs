//! One pull/reconcile/publish/ack cycle per pairing.

use std::sync::Arc;

use ra_bus::{BusError, MessageBus, PulledMessage};
use ra_model::{ChangeRequest, OutboundMessage, ServiceId};
use tracing::{debug, info, instrument, warn};

use crate::error::{CycleError, CycleStage};
use crate::reconciler::Reconciler;
use crate::report::CycleReport;

/// A backend-tenant pairing: where change requests come from, where
/// outcomes go, and how they are applied.
#[derive(Debug, Clone)]
pub struct Pairing {
    /// Pairing name.
    pub name: String,
    /// Subscription to pull change requests from.
    pub subscription: String,
    /// Topic outcomes are published to.
    pub publish_topic: String,
    /// Reconciler for the pairing's backend.
    pub reconciler: Reconciler,
}

impl Pairing {
    /// Creates a pairing.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        subscription: impl Into<String>,
        publish_topic: impl Into<String>,
        reconciler: Reconciler,
    ) -> Self {
        Self {
            name: name.into(),
            subscription: subscription.into(),
            publish_topic: publish_topic.into(),
            reconciler,
        }
    }
}

/// A pulled message, decoded.
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded {
    /// A valid change request.
    Request(Box<ChangeRequest>),
    /// An invalid request whose service ID is known, so an error outcome can
    /// be reported for it.
    Invalid {
        /// Service ID found in the payload.
        id: ServiceId,
        /// Why the payload was rejected.
        reason: String,
    },
    /// A payload without a usable service ID.
    Unusable(String),
}

/// Decodes a pulled message into a change request.
#[must_use]
pub fn decode_message(message: &PulledMessage) -> Decoded {
    let value: serde_json::Value = match message.json() {
        Ok(value) => value,
        Err(e) => return Decoded::Unusable(e.to_string()),
    };

    let id = value
        .get("id")
        .and_then(|id| serde_json::from_value::<ServiceId>(id.clone()).ok());

    match serde_json::from_value::<ChangeRequest>(value) {
        Ok(request) => Decoded::Request(Box::new(request)),
        Err(e) => match id {
            Some(id) => Decoded::Invalid {
                id,
                reason: e.to_string(),
            },
            None => Decoded::Unusable(e.to_string()),
        },
    }
}

/// Runs cycles against a bus.
#[derive(Clone)]
pub struct BatchDriver {
    bus: Arc<dyn MessageBus>,
    batch_size: u32,
}

impl std::fmt::Debug for BatchDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchDriver")
            .field("batch_size", &self.batch_size)
            .finish_non_exhaustive()
    }
}

impl BatchDriver {
    /// Creates a driver pulling up to `batch_size` messages per cycle.
    #[must_use]
    pub fn new(bus: Arc<dyn MessageBus>, batch_size: u32) -> Self {
        Self {
            bus,
            batch_size: batch_size.max(1),
        }
    }

    /// Runs one cycle for `pairing`: pull, reconcile each message, publish
    /// the outcomes as one batch, then acknowledge every pulled message.
    ///
    /// Item failures become error outcomes. A bus failure aborts the cycle
    /// before the acknowledgement.
    #[instrument(skip_all, fields(pairing = %pairing.name))]
    pub async fn run_cycle(&self, pairing: &Pairing) -> Result<CycleReport, CycleError> {
        let mut report = CycleReport::new(&pairing.name);
        let fail = |stage: CycleStage, source: BusError| CycleError {
            pairing: pairing.name.clone(),
            stage,
            source,
        };

        let messages = self
            .bus
            .pull(&pairing.subscription, self.batch_size)
            .await
            .map_err(|e| fail(CycleStage::Pull, e))?;
        report.pulled = messages.len();
        if messages.is_empty() {
            debug!("no pending messages");
            return Ok(report.complete());
        }

        pairing.reconciler.deployer().begin_cycle().await;

        for message in &messages {
            match decode_message(message) {
                Decoded::Request(request) => {
                    let outcome = pairing.reconciler.reconcile(&request).await;
                    report.record(outcome);
                }
                Decoded::Invalid { id, reason } => {
                    warn!(message_id = %message.message_id, service_id = %id, %reason, "invalid change request");
                    let outcome = pairing
                        .reconciler
                        .rejection(id, format!("invalid change request: {reason}"));
                    report.record(outcome);
                }
                Decoded::Unusable(reason) => {
                    warn!(
                        message_id = %message.message_id,
                        %reason,
                        payload = %message.text(),
                        "dropping message without a service id"
                    );
                    report.record_dropped();
                }
            }
        }

        if !report.outcomes.is_empty() {
            let outbound: Vec<OutboundMessage> =
                report.outcomes.iter().cloned().map(OutboundMessage::from).collect();
            self.bus
                .publish(&pairing.publish_topic, &outbound)
                .await
                .map_err(|e| fail(CycleStage::Publish, e))?;
            report.published = outbound.len();
        }

        let ack_ids: Vec<String> = messages.iter().map(|m| m.ack_id.clone()).collect();
        self.bus
            .ack(&pairing.subscription, &ack_ids)
            .await
            .map_err(|e| fail(CycleStage::Ack, e))?;
        report.acked = ack_ids.len();

        let report = report.complete();
        info!(
            pulled = report.pulled,
            deployed = report.deployed,
            failed = report.failed,
            dropped = report.dropped,
            duration_ms = report.duration_ms(),
            "{}",
            report.summary()
        );
        Ok(report)
    }
}
