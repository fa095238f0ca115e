use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use futures::FutureExt;
use itertools::Itertools;
use tracing::Instrument;
use uuid::Uuid;

use crate::{
    config::HarnessConfig,
    constants::{INPUT_CHANNEL, OUTPUT_CHANNEL},
    core::{
        domain::{TestPointRequest, Verdict},
        error::HarnessError,
        pipeline::monitor::{MonitorLoop, MonitorOutcome},
        sampler::{Baseline, ResourceSampler},
        traits::{
            reporter::VerdictReporter,
            runtime::{ChannelId, ChannelKind, Runtime},
        },
        verdict::VerdictBuilder,
    },
};

#[derive(Clone, Copy, Debug)]
struct Channels {
    input: ChannelId,
    output: ChannelId,
}

enum Comparison {
    Match,
    Mismatch(String),
}

/// Judges one test point: Load, InjectInput, Configure, RunAndMonitor,
/// CompareOutput. The first failing stage decides the verdict.
#[derive(Debug)]
pub struct ExecutionPipeline {
    request: TestPointRequest,
    runtime: Arc<dyn Runtime>,
    sampler: ResourceSampler,
    config: HarnessConfig,
}

impl ExecutionPipeline {
    pub fn new(
        request: TestPointRequest,
        runtime: Arc<dyn Runtime>,
        sampler: ResourceSampler,
        config: HarnessConfig,
    ) -> Self {
        Self {
            request,
            runtime,
            sampler,
            config,
        }
    }

    /// Runs the pipeline and hands its verdict to `reporter`, exactly once.
    pub async fn run_and_report(self, reporter: &dyn VerdictReporter) -> Verdict {
        let id = self.request.id.clone();
        let verdict = self.run().await;

        if let Err(err) = reporter.report(&verdict) {
            tracing::error!(point = %id, "Failed to report verdict: {}", err);
        }
        tracing::info!(point = %id, status = %verdict.status, "Test finished.");

        verdict
    }

    /// Runs the pipeline. Stage errors and panics raised by the runtime are
    /// turned into a verdict here, nothing propagates further.
    pub async fn run(self) -> Verdict {
        let span = tracing::info_span!("test_point", point = %self.request.id, run = %Uuid::new_v4());

        async move {
            let result = AssertUnwindSafe(self.judge()).catch_unwind().await;
            let err = match result {
                Ok(Ok(verdict)) => return verdict,
                Ok(Err(err)) => err,
                Err(payload) => HarnessError::from_panic(payload),
            };

            tracing::warn!("Error: {}", err);
            VerdictBuilder::new(&self.request.id).failed(&err)
        }
        .instrument(span)
        .await
    }

    async fn judge(&self) -> Result<Verdict, HarnessError> {
        self.load().await?;
        let (channels, setup) = self.inject_input()?;
        let configured = self.configure(setup);

        let builder = VerdictBuilder::new(&self.request.id);
        let usage = match self.run_and_monitor(configured).await? {
            MonitorOutcome::MemoryLimitExceeded(usage) => {
                return Ok(builder.with_usage(usage).memory_limit_exceeded());
            }
            MonitorOutcome::TimeLimitExceeded(usage) => {
                return Ok(builder.with_usage(usage).time_limit_exceeded());
            }
            MonitorOutcome::Finished(usage) => usage,
        };

        let builder = builder.with_usage(usage);
        let comparison = panic::catch_unwind(AssertUnwindSafe(|| self.compare_output(channels)))
            .unwrap_or_else(|payload| Err(HarnessError::from_panic(payload)));
        Ok(match comparison {
            Ok(Comparison::Match) => builder.accepted(),
            Ok(Comparison::Mismatch(answer)) => builder.wrong_answer(answer),
            Err(err) => {
                tracing::warn!("Error: {}", err);
                builder.failed(&err)
            }
        })
    }

    #[tracing::instrument(skip_all)]
    async fn load(&self) -> Result<(), HarnessError> {
        tracing::info!("Loading program...");
        self.runtime.load(&self.request.program).await?;
        Ok(())
    }

    #[tracing::instrument(skip_all)]
    fn inject_input(&self) -> Result<(Channels, Baseline), HarnessError> {
        tracing::info!("Importing list...");
        let channels = Channels {
            input: self.find_list(INPUT_CHANNEL)?,
            output: self.find_list(OUTPUT_CHANNEL)?,
        };

        self.runtime
            .write_list(channels.input, self.request.input_lines.clone())?;
        self.runtime.write_list(channels.output, Vec::new())?;

        Ok((channels, self.sampler.baseline()))
    }

    #[tracing::instrument(skip_all)]
    fn configure(&self, setup: Baseline) -> Baseline {
        self.runtime.set_turbo_mode(self.request.turbo_mode);

        let configured = self.sampler.baseline();
        tracing::debug!(
            turbo_mode = self.request.turbo_mode,
            setup_bytes = configured.memory_bytes.saturating_sub(setup.memory_bytes),
            "Runtime configured"
        );
        configured
    }

    #[tracing::instrument(skip_all)]
    async fn run_and_monitor(&self, configured: Baseline) -> Result<MonitorOutcome, HarnessError> {
        tracing::info!("Ready for test, wait a second...");

        let baseline = self.sampler.baseline();
        tracing::debug!(
            baseline_bytes = baseline.memory_bytes,
            since_configure_bytes = baseline.memory_bytes.saturating_sub(configured.memory_bytes),
            "Captured run baseline"
        );

        if let Err(err) = self.runtime.start().await {
            self.runtime.stop();
            return Err(err.into());
        }

        let outcome_rx = MonitorLoop::new(
            self.runtime.clone(),
            self.sampler.clone(),
            baseline,
            self.request.limits,
            self.config.poll_interval,
        )
        .spawn();

        let err = match outcome_rx.await {
            Ok(Ok(outcome)) => return Ok(outcome),
            Ok(Err(err)) => err,
            Err(_) => HarnessError::MonitorLost,
        };
        self.runtime.stop();
        Err(err)
    }

    #[tracing::instrument(skip_all)]
    fn compare_output(&self, channels: Channels) -> Result<Comparison, HarnessError> {
        let actual = self
            .runtime
            .read_list(channels.output)?
            .iter()
            .join(&self.config.line_separator);

        if actual == self.request.expected_output {
            Ok(Comparison::Match)
        } else {
            tracing::debug!(actual = %actual, "Output differs from expected");
            Ok(Comparison::Mismatch(actual))
        }
    }

    fn find_list(&self, name: &str) -> Result<ChannelId, HarnessError> {
        self.runtime
            .lookup(name, ChannelKind::List)
            .ok_or_else(|| HarnessError::MissingChannel {
                name: name.to_string(),
                kind: ChannelKind::List,
            })
    }
}
