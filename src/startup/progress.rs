//! Progress notifications from the orchestrator to the presentation layer

/// Receives step lifecycle notifications from the orchestrator.
///
/// All methods are invoked on the coordinating task, strictly in step order:
/// `on_step_started(i)` always precedes `on_step_completed(i)`, and no
/// notification for step `i + 1` is delivered before step `i` has completed.
/// `on_failed` is delivered at most once per run and terminates it.
pub trait ProgressSink: Send + Sync {
    /// Step `index` is about to start; `description` is its display label.
    fn on_step_started(&self, index: usize, description: &str);

    /// Step `index` finished successfully.
    fn on_step_completed(&self, index: usize);

    /// Every step in the list completed.
    fn on_all_completed(&self);

    /// A step failed; no further steps will run.
    fn on_failed(&self, message: &str);
}
