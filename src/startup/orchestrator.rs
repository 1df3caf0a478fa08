//! Startup orchestrator
//!
//! Runs an ordered list of [`WorkStep`]s one at a time, dispatching each to
//! its declared execution context and reporting progress to a
//! [`ProgressSink`]. Step `i + 1` never starts before step `i`'s completion
//! has been observed on the coordinating task, so progress notifications
//! form a single global order even though the work itself may run on worker
//! threads.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::startup::batch::{BatchChannel, BatchSink};
use crate::startup::progress::ProgressSink;
use crate::startup::step::{ExecutableUnit, ExecutionContext, StepOutcome, WorkStep};

/// How a whole run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step completed; `on_all_completed` was delivered.
    Completed,
    /// The cancellation token was observed; remaining steps never started
    /// and no further notifications were delivered.
    Cancelled,
    /// A step failed; `on_failed` was delivered exactly once.
    Failed { message: String },
}

/// Trait for driving a startup sequence.
#[async_trait]
pub trait StartupOrchestrator: Send + Sync {
    /// Execute `steps` strictly in list order.
    ///
    /// Returns `Err` only for an invalid step list, detected before any
    /// notification is delivered. Step failures are reported through the
    /// sink and surface as [`RunOutcome::Failed`].
    async fn run(&self, steps: &[WorkStep]) -> Result<RunOutcome>;
}

/// Default orchestrator: one coordinating task, at most one outstanding
/// background unit at any time.
pub struct DefaultStartupOrchestrator {
    progress: Arc<dyn ProgressSink>,
    batches: Arc<dyn BatchSink>,
    token: CancellationToken,
}

impl DefaultStartupOrchestrator {
    pub fn new(
        progress: Arc<dyn ProgressSink>,
        batches: Arc<dyn BatchSink>,
        token: CancellationToken,
    ) -> Self {
        Self {
            progress,
            batches,
            token,
        }
    }

    fn validate(steps: &[WorkStep]) -> Result<()> {
        for (i, step) in steps.iter().enumerate() {
            if steps[..i].iter().any(|prior| prior.name == step.name) {
                return Err(Error::Config(format!(
                    "duplicate step name '{}' in step list",
                    step.name
                )));
            }
            if step.context == ExecutionContext::Inline
                && matches!(step.unit, ExecutableUnit::Streaming(_))
            {
                return Err(Error::Config(format!(
                    "streaming step '{}' cannot run inline",
                    step.name
                )));
            }
        }
        Ok(())
    }

    /// Dispatch one step and observe its completion on the coordinating
    /// task.
    async fn dispatch(&self, step: &WorkStep) -> Result<StepOutcome> {
        match &step.unit {
            ExecutableUnit::Action(action) => match step.context {
                ExecutionContext::Inline => {
                    // Yield once so notifications queued for this step are
                    // flushed before the action runs.
                    tokio::task::yield_now().await;
                    action(self.token.clone())
                }
                ExecutionContext::Background => {
                    let action = action.clone();
                    let token = self.token.clone();
                    let handle = tokio::task::spawn_blocking(move || action(token));
                    handle.await.map_err(join_error)?
                }
            },
            ExecutableUnit::Streaming(producer) => {
                let producer_fn = producer.clone();
                let token = self.token.clone();
                let (batch_tx, batch_rx) = BatchChannel::bounded();
                let handle =
                    tokio::task::spawn_blocking(move || producer_fn(batch_tx, token));
                // Integrate batches here while the producer runs; `drain`
                // returns once the producer has dropped its handle.
                batch_rx.drain(self.batches.as_ref()).await;
                handle.await.map_err(join_error)?
            }
        }
    }
}

fn join_error(e: tokio::task::JoinError) -> Error {
    if e.is_panic() {
        Error::Worker("background step panicked".to_string())
    } else {
        Error::Worker("background step was aborted".to_string())
    }
}

#[async_trait]
impl StartupOrchestrator for DefaultStartupOrchestrator {
    async fn run(&self, steps: &[WorkStep]) -> Result<RunOutcome> {
        Self::validate(steps)?;
        info!("starting initialization with {} steps", steps.len());

        for (index, step) in steps.iter().enumerate() {
            if self.token.is_cancelled() {
                debug!("cancellation observed before step '{}'", step.name);
                return Ok(RunOutcome::Cancelled);
            }

            debug!("step {index} '{}' starting ({:?})", step.name, step.context);
            self.progress.on_step_started(index, &step.description);

            match self.dispatch(step).await {
                Ok(StepOutcome::Completed) => {
                    debug!("step {index} '{}' completed", step.name);
                    self.progress.on_step_completed(index);
                }
                Ok(StepOutcome::Cancelled) => {
                    // Cancellation is an intentional stop, not an error; the
                    // interrupted step gets no completion notification.
                    info!("initialization cancelled during step '{}'", step.name);
                    return Ok(RunOutcome::Cancelled);
                }
                Err(e) => {
                    let message = format!("step '{}' failed: {e}", step.name);
                    warn!("{message}");
                    self.progress.on_failed(&message);
                    return Ok(RunOutcome::Failed { message });
                }
            }
        }

        info!("all initialization steps completed");
        self.progress.on_all_completed();
        Ok(RunOutcome::Completed)
    }
}
