//! Per-cycle bookkeeping.

use chrono::{DateTime, Utc};
use ra_model::OutcomeRecord;
use serde::Serialize;

/// What one cycle of one pairing did.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    /// Pairing name.
    pub pairing: String,

    /// Messages pulled.
    pub pulled: usize,

    /// Outcomes in state `deployed`.
    pub deployed: usize,

    /// Outcomes in state `error`.
    pub failed: usize,

    /// Messages acknowledged without an outcome (no usable service ID).
    pub dropped: usize,

    /// Outcomes published.
    pub published: usize,

    /// Messages acknowledged.
    pub acked: usize,

    /// When the cycle started.
    pub started_at: DateTime<Utc>,

    /// When the cycle completed.
    pub completed_at: DateTime<Utc>,

    /// Outcomes produced, in processing order.
    pub outcomes: Vec<OutcomeRecord>,
}

impl CycleReport {
    /// Starts a report.
    #[must_use]
    pub fn new(pairing: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            pairing: pairing.into(),
            pulled: 0,
            deployed: 0,
            failed: 0,
            dropped: 0,
            published: 0,
            acked: 0,
            started_at: now,
            completed_at: now,
            outcomes: Vec::new(),
        }
    }

    /// Records an outcome.
    pub fn record(&mut self, outcome: OutcomeRecord) {
        if outcome.is_deployed() {
            self.deployed += 1;
        } else {
            self.failed += 1;
        }
        self.outcomes.push(outcome);
    }

    /// Records a message dropped without an outcome.
    pub fn record_dropped(&mut self) {
        self.dropped += 1;
    }

    /// Marks the cycle as complete.
    #[must_use]
    pub fn complete(mut self) -> Self {
        self.completed_at = Utc::now();
        self
    }

    /// Returns the cycle duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.completed_at - self.started_at).num_milliseconds()
    }

    /// Returns true if any outcome is an error or any message was dropped.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.dropped > 0
    }

    /// One-line summary for logs.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{}: {} pulled, {} deployed, {} failed, {} dropped, {} published, {} acked",
            self.pairing,
            self.pulled,
            self.deployed,
            self.failed,
            self.dropped,
            self.published,
            self.acked
        )
    }
}
