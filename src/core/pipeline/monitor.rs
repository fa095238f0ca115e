use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::oneshot;
use tokio::time::MissedTickBehavior;

use crate::core::{
    domain::{Limits, Usage},
    error::HarnessError,
    sampler::{Baseline, PeakTracker, ResourceSampler, Sample},
    traits::runtime::Runtime,
};

/// How a monitored run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MonitorOutcome {
    MemoryLimitExceeded(Usage),
    TimeLimitExceeded(Usage),
    Finished(Usage),
}

impl MonitorOutcome {
    pub fn usage(&self) -> Usage {
        match self {
            MonitorOutcome::MemoryLimitExceeded(usage)
            | MonitorOutcome::TimeLimitExceeded(usage)
            | MonitorOutcome::Finished(usage) => *usage,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    MemoryLimit,
    TimeLimit,
    Finished,
}

/// Decides a single tick. Memory is checked before time, and liveness is
/// only queried when neither limit is breached, so a tick breaching both
/// limits always resolves as a memory breach.
pub fn evaluate(
    sample: &Sample,
    limits: &Limits,
    is_active: impl FnOnce() -> bool,
) -> Option<Resolution> {
    if sample.memory_delta > limits.memory_bytes {
        Some(Resolution::MemoryLimit)
    } else if sample.elapsed > limits.time() {
        Some(Resolution::TimeLimit)
    } else if !is_active() {
        Some(Resolution::Finished)
    } else {
        None
    }
}

/// Fixed-interval watcher running next to the program.
#[derive(Debug)]
pub struct MonitorLoop {
    runtime: Arc<dyn Runtime>,
    sampler: ResourceSampler,
    baseline: Baseline,
    limits: Limits,
    interval: Duration,
}

impl MonitorLoop {
    pub fn new(
        runtime: Arc<dyn Runtime>,
        sampler: ResourceSampler,
        baseline: Baseline,
        limits: Limits,
        interval: Duration,
    ) -> Self {
        Self {
            runtime,
            sampler,
            baseline,
            limits,
            interval,
        }
    }

    /// Spawns the ticker task. The receiver gets exactly one outcome, or the
    /// panic raised by the runtime or probe while watching.
    pub fn spawn(self) -> oneshot::Receiver<Result<MonitorOutcome, HarnessError>> {
        let (outcome_tx, outcome_rx) = oneshot::channel();

        tokio::spawn(async move {
            let outcome = AssertUnwindSafe(self.watch())
                .catch_unwind()
                .await
                .map_err(HarnessError::from_panic);
            if outcome_tx.send(outcome).is_err() {
                tracing::warn!("Run stage stopped waiting for the monitor outcome");
            }
        });

        outcome_rx
    }

    async fn watch(self) -> MonitorOutcome {
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut peak = PeakTracker::default();

        loop {
            ticker.tick().await;

            let sample = self.sampler.sample(&self.baseline);
            peak.observe(sample.memory_delta);

            let Some(resolution) = evaluate(&sample, &self.limits, || self.runtime.is_active())
            else {
                continue;
            };

            self.runtime.stop();

            let usage = Usage {
                time_ms: sample.elapsed_ms(),
                memory_bytes: sample.memory_delta,
                peak_memory_bytes: peak.peak(),
            };
            tracing::debug!(?resolution, ?usage, "Monitor resolved");

            return match resolution {
                Resolution::MemoryLimit => MonitorOutcome::MemoryLimitExceeded(usage),
                Resolution::TimeLimit => MonitorOutcome::TimeLimitExceeded(usage),
                Resolution::Finished => MonitorOutcome::Finished(usage),
            };
        }
    }
}
