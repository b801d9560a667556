//! # ra-reconcile
//!
//! Turns change requests into backend calls and outcome records:
//!
//! - [`Deployer`] implementations, one per backend kind
//! - [`Reconciler`], which maps every result to an [`ra_model::OutcomeRecord`]
//! - [`BatchDriver`], one pull/reconcile/publish/ack cycle per pairing
//! - [`Scheduler`], periodic rounds over every pairing
//!
//! Messages are acknowledged only after their outcomes were published, so
//! delivery is at-least-once.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod build;
pub mod deployer;
pub mod deployers;
pub mod driver;
pub mod error;
pub mod reconciler;
pub mod report;
pub mod scheduler;
pub mod scope;

pub use deployer::{Deployer, Deployment, FollowUpPolicy, FollowUps};
pub use driver::{decode_message, BatchDriver, Decoded, Pairing};
pub use error::{CycleError, CycleStage, DeployError, DeployResult};
pub use reconciler::Reconciler;
pub use report::CycleReport;
pub use scheduler::Scheduler;
