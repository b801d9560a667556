//! # ra-bus
//!
//! Message bus adapter for the registry deployment agent.
//!
//! The [`MessageBus`] trait is the seam the batch driver talks to;
//! [`AmsClient`] implements it over the ARGO Messaging Service REST API.
//! Topic and subscription provisioning are left to the bus operator.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod ams;
pub mod error;
pub mod message;

use async_trait::async_trait;
use ra_model::OutboundMessage;

pub use ams::AmsClient;
pub use error::{BusError, BusResult};
pub use message::PulledMessage;

/// Pull/ack/publish operations of a pull-based message bus.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Pulls up to `max_messages` pending messages without waiting for new
    /// ones.
    async fn pull(&self, subscription: &str, max_messages: u32) -> BusResult<Vec<PulledMessage>>;

    /// Acknowledges pulled messages so they are not delivered again.
    async fn ack(&self, subscription: &str, ack_ids: &[String]) -> BusResult<()>;

    /// Publishes messages to `topic` as one batch and returns their IDs.
    async fn publish(&self, topic: &str, messages: &[OutboundMessage]) -> BusResult<Vec<String>>;
}
