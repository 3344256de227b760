//! Interval scheduler
//!
//! A single task drives the cycle runner. Each tick runs one cycle inline, so
//! a tick that arrives while a cycle is still running is dropped rather than
//! queued, and two cycles never overlap.

use chrono::Utc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::cycle::CycleRunner;

const MIN_PERIOD: Duration = Duration::from_millis(1);

pub struct CycleScheduler {
    cancel: CancellationToken,
    handle: JoinHandle<CycleRunner>,
}

impl CycleScheduler {
    /// Spawn the scheduling loop. The first cycle runs one `interval` from now.
    pub fn start(runner: CycleRunner, interval: Duration, cancel: CancellationToken) -> Self {
        let runner = runner.with_cancellation(cancel.clone());
        let handle = tokio::spawn(Self::run(runner, interval, cancel.clone()));
        Self { cancel, handle }
    }

    async fn run(mut runner: CycleRunner, period: Duration, cancel: CancellationToken) -> CycleRunner {
        // `interval_at` panics on a zero period.
        let period = period.max(MIN_PERIOD);
        tracing::info!(interval_secs = period.as_secs_f64(), "Upload scheduler started");

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Upload scheduler shutting down");
                    break;
                }
                _ = ticker.tick() => {
                    let report = runner.run_cycle(Utc::now()).await;
                    tracing::debug!(cycle_id = %report.cycle_id, phase = %report.phase, "Tick handled");
                }
            }
        }

        tracing::info!("Upload scheduler stopped");
        runner
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Cancel the loop and wait for it. An in-flight cycle stops after its
    /// current step. Returns the runner so its state can be inspected.
    pub async fn shutdown(self) -> Option<CycleRunner> {
        tracing::info!("Initiating upload scheduler shutdown");
        self.cancel.cancel();
        match self.handle.await {
            Ok(runner) => Some(runner),
            Err(e) => {
                tracing::error!(error = %e, "Upload scheduler task ended abnormally");
                None
            }
        }
    }
}
