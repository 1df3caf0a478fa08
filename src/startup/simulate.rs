//! Simulated startup work
//!
//! Stands in for the real configuration/database/plugin loading an
//! application would do at startup. Each simulated step sleeps for its
//! configured duration plus jitter; background steps sleep in chunks and
//! observe the cancellation token between chunks, the way real chunked work
//! would.

use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::StartupConfig;
use crate::error::{Error, Result};
use crate::startup::dataset::{produce_dataset, DatasetSpec};
use crate::startup::step::{ExecutionContext, StepOutcome, WorkStep};

/// Chunk length for cancellable background sleeps.
pub const WORK_CHUNK: Duration = Duration::from_millis(50);

/// name, description, runs in background, base duration ms, jitter ms
const SIMULATED_STEPS: [(&str, &str, bool, u64, u64); 7] = [
    ("config", "Loading configuration files", false, 300, 200),
    ("database", "Initializing database connection", true, 800, 400),
    ("preferences", "Loading user preferences", false, 200, 150),
    ("ui", "Preparing UI components", true, 600, 300),
    ("plugins", "Loading plugins", true, 1000, 500),
    ("license", "Verifying license", false, 150, 100),
    ("services", "Connecting to services", true, 500, 200),
];

/// Sleep for `total`, in [`WORK_CHUNK`] increments, observing `token`
/// between increments.
pub fn chunked_sleep(token: &CancellationToken, total: Duration) -> StepOutcome {
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        if token.is_cancelled() {
            return StepOutcome::Cancelled;
        }
        let slice = WORK_CHUNK.min(total - elapsed);
        std::thread::sleep(slice);
        elapsed += slice;
    }
    StepOutcome::Completed
}

fn resolved_duration(base_ms: u64, jitter_ms: u64, override_ms: Option<u64>) -> Duration {
    let millis = match override_ms {
        Some(ms) => ms,
        None if jitter_ms == 0 => base_ms,
        None => base_ms + rand::rng().random_range(0..jitter_ms),
    };
    Duration::from_millis(millis)
}

/// Build the standard startup sequence from configuration: seven simulated
/// steps plus the streaming data-table step.
pub fn standard_steps(config: &StartupConfig) -> Result<Vec<WorkStep>> {
    for step_override in &config.steps {
        if !SIMULATED_STEPS
            .iter()
            .any(|(name, ..)| *name == step_override.name)
        {
            return Err(Error::Config(format!(
                "override for unknown step '{}'",
                step_override.name
            )));
        }
    }

    let mut steps = Vec::with_capacity(SIMULATED_STEPS.len() + 1);
    for (name, description, background, base_ms, jitter_ms) in SIMULATED_STEPS {
        let step_override = config.steps.iter().find(|o| o.name == name);
        let duration =
            resolved_duration(base_ms, jitter_ms, step_override.and_then(|o| o.duration_ms));
        let context = step_override.and_then(|o| o.context).unwrap_or(if background {
            ExecutionContext::Background
        } else {
            ExecutionContext::Inline
        });
        debug!("step '{name}' will take {duration:?} ({context:?})");

        let step = match context {
            ExecutionContext::Background => WorkStep::background(name, description, move |token| {
                Ok(chunked_sleep(&token, duration))
            }),
            ExecutionContext::Inline => WorkStep::inline(name, description, move |token| {
                if token.is_cancelled() {
                    return Ok(StepOutcome::Cancelled);
                }
                std::thread::sleep(duration);
                Ok(StepOutcome::Completed)
            }),
        };
        steps.push(step);
    }

    let spec = DatasetSpec {
        total_rows: config.dataset.total_rows,
        batch_size: config.dataset.batch_size,
        seed: config
            .dataset
            .seed
            .unwrap_or_else(|| rand::rng().random()),
        origin: Utc::now(),
        inter_batch_delay: Duration::from_millis(config.dataset.inter_batch_delay_ms),
    };
    let description = format!("Populating data table ({} rows)", spec.total_rows);
    steps.push(WorkStep::streaming("datatable", description, move |producer, token| {
        produce_dataset(&producer, &token, &spec)
    }));

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::startup::step::{ExecutableUnit, ExecutionContext};

    #[test]
    fn standard_sequence_has_eight_uniquely_named_steps() {
        let steps = standard_steps(&StartupConfig::default()).unwrap();
        assert_eq!(steps.len(), 8);
        for (i, step) in steps.iter().enumerate() {
            assert!(steps[..i].iter().all(|prior| prior.name != step.name));
        }
        assert!(matches!(
            steps.last().unwrap().unit,
            ExecutableUnit::Streaming(_)
        ));
    }

    #[test]
    fn quick_steps_run_inline_and_heavy_steps_in_background() {
        let steps = standard_steps(&StartupConfig::default()).unwrap();
        let context_of = |name: &str| {
            steps
                .iter()
                .find(|s| s.name == name)
                .map(|s| s.context)
                .unwrap()
        };
        assert_eq!(context_of("config"), ExecutionContext::Inline);
        assert_eq!(context_of("license"), ExecutionContext::Inline);
        assert_eq!(context_of("database"), ExecutionContext::Background);
        assert_eq!(context_of("datatable"), ExecutionContext::Background);
    }

    #[test]
    fn unknown_override_names_are_rejected() {
        let mut config = StartupConfig::default();
        config.steps.push(crate::config::StepOverride {
            name: "telemetry".to_string(),
            duration_ms: Some(100),
            context: None,
        });
        assert!(matches!(
            standard_steps(&config),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn context_override_moves_a_step_between_contexts() {
        let mut config = StartupConfig::default();
        config.steps.push(crate::config::StepOverride {
            name: "plugins".to_string(),
            duration_ms: None,
            context: Some(ExecutionContext::Inline),
        });
        let steps = standard_steps(&config).unwrap();
        let plugins = steps.iter().find(|s| s.name == "plugins").unwrap();
        assert_eq!(plugins.context, ExecutionContext::Inline);
    }

    #[test]
    fn overrides_win_over_base_and_jitter() {
        assert_eq!(
            resolved_duration(300, 200, Some(25)),
            Duration::from_millis(25)
        );
        let jittered = resolved_duration(300, 200, None);
        assert!(jittered >= Duration::from_millis(300));
        assert!(jittered < Duration::from_millis(500));
    }

    #[test]
    fn chunked_sleep_observes_cancellation_immediately() {
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(
            chunked_sleep(&token, Duration::from_secs(3600)),
            StepOutcome::Cancelled
        );
    }

    #[test]
    fn chunked_sleep_completes_short_work() {
        let token = CancellationToken::new();
        assert_eq!(
            chunked_sleep(&token, Duration::from_millis(5)),
            StepOutcome::Completed
        );
    }
}
