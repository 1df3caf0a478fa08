//! Step descriptors for the startup sequence
//!
//! A [`WorkStep`] names one unit of startup work and declares where it runs.
//! Cheap steps run inline on the coordinating task; expensive steps run on a
//! worker thread; the dataset step streams its output back in batches.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::startup::batch::BatchProducer;

/// Where a step's work executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionContext {
    /// Runs on the coordinating task, scheduled cooperatively so pending
    /// progress notifications are flushed first.
    Inline,
    /// Runs on a worker thread; completion is signaled back to the
    /// coordinating task.
    Background,
}

/// How a step's action finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Completed,
    /// The action observed the cancellation token and returned early.
    Cancelled,
}

/// A step's executable body. The token is observed at chunk boundaries by
/// actions that split their work into increments.
pub type StepAction = Arc<dyn Fn(CancellationToken) -> Result<StepOutcome> + Send + Sync>;

/// Body of the streaming step. Always runs on a worker thread; hands batches
/// to the coordinating task through the [`BatchProducer`], blocking on each
/// hand-off until the batch has been integrated.
pub type StreamingProducer =
    Arc<dyn Fn(BatchProducer, CancellationToken) -> Result<StepOutcome> + Send + Sync>;

/// The executable unit a step dispatches.
#[derive(Clone)]
pub enum ExecutableUnit {
    Action(StepAction),
    Streaming(StreamingProducer),
}

/// One named unit of startup work.
#[derive(Clone)]
pub struct WorkStep {
    /// Short identifier, unique within a step list.
    pub name: String,
    /// Human-readable label surfaced to the progress sink.
    pub description: String,
    pub context: ExecutionContext,
    pub unit: ExecutableUnit,
}

impl WorkStep {
    /// Create a step that runs on the coordinating task.
    pub fn inline<F>(name: impl Into<String>, description: impl Into<String>, action: F) -> Self
    where
        F: Fn(CancellationToken) -> Result<StepOutcome> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            context: ExecutionContext::Inline,
            unit: ExecutableUnit::Action(Arc::new(action)),
        }
    }

    /// Create a step that runs on a worker thread.
    pub fn background<F>(name: impl Into<String>, description: impl Into<String>, action: F) -> Self
    where
        F: Fn(CancellationToken) -> Result<StepOutcome> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            context: ExecutionContext::Background,
            unit: ExecutableUnit::Action(Arc::new(action)),
        }
    }

    /// Create a streaming step. Streaming always runs on a worker thread so
    /// the coordinating task is free to integrate batches as they arrive.
    pub fn streaming<F>(name: impl Into<String>, description: impl Into<String>, producer: F) -> Self
    where
        F: Fn(BatchProducer, CancellationToken) -> Result<StepOutcome> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            description: description.into(),
            context: ExecutionContext::Background,
            unit: ExecutableUnit::Streaming(Arc::new(producer)),
        }
    }
}

impl fmt::Debug for WorkStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkStep")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("context", &self.context)
            .field(
                "unit",
                match self.unit {
                    ExecutableUnit::Action(_) => &"Action",
                    ExecutableUnit::Streaming(_) => &"Streaming",
                },
            )
            .finish()
    }
}
