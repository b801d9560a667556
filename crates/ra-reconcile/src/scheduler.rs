//! Periodic cycle scheduling.

use std::future::Future;
use std::time::Duration;

use tracing::{error, info};

use crate::driver::{BatchDriver, Pairing};
use crate::error::CycleError;
use crate::report::CycleReport;

/// Runs the configured pairings one after another, then waits for the
/// interval before the next round. A round never overlaps the previous one.
#[derive(Debug)]
pub struct Scheduler {
    driver: BatchDriver,
    pairings: Vec<Pairing>,
    interval: Duration,
}

impl Scheduler {
    /// Creates a scheduler.
    #[must_use]
    pub fn new(driver: BatchDriver, pairings: Vec<Pairing>, interval: Duration) -> Self {
        Self {
            driver,
            pairings,
            interval,
        }
    }

    /// Returns the pairings.
    #[must_use]
    pub fn pairings(&self) -> &[Pairing] {
        &self.pairings
    }

    /// Returns the interval between rounds.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Runs one cycle per pairing, in configuration order. A failing pairing
    /// does not stop the others.
    pub async fn run_once(&self) -> Vec<Result<CycleReport, CycleError>> {
        let mut results = Vec::with_capacity(self.pairings.len());
        for pairing in &self.pairings {
            let result = self.driver.run_cycle(pairing).await;
            if let Err(ref e) = result {
                error!(pairing = %pairing.name, stage = %e.stage, error = %e.source, "cycle aborted");
            }
            results.push(result);
        }
        results
    }

    /// Runs rounds until `shutdown` resolves and returns the number of
    /// completed rounds. A round in progress is abandoned on shutdown; its
    /// unacknowledged messages are delivered again.
    pub async fn run_until<F>(&self, shutdown: F) -> u64
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let mut rounds = 0u64;

        info!(
            pairings = self.pairings.len(),
            interval_secs = self.interval.as_secs(),
            "scheduler started"
        );

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = self.run_once() => rounds += 1,
            }

            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        info!(rounds, "scheduler stopped");
        rounds
    }
}
