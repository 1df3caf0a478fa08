//! Startup sequence orchestration
//!
//! The coordinating side of application startup: an ordered list of
//! [`WorkStep`]s driven by a [`StartupOrchestrator`], with progress reported
//! through a [`ProgressSink`] and large results streamed back through the
//! bounded batch channel.

pub mod batch;
pub mod dataset;
pub mod orchestrator;
pub mod progress;
pub mod simulate;
pub mod step;

pub use batch::{BatchChannel, BatchProducer, BatchSink, RecordStatus, TableRecord};
pub use dataset::{DatasetSpec, DatasetStore};
pub use orchestrator::{DefaultStartupOrchestrator, RunOutcome, StartupOrchestrator};
pub use progress::ProgressSink;
pub use step::{ExecutableUnit, ExecutionContext, StepOutcome, WorkStep};
