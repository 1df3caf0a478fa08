//! End-to-end scenarios for the startup sequence: ordering across execution
//! contexts, the splash lifecycle gate, failure propagation, and the
//! streaming dataset step.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use overture::config::{StartupConfig, StepOverride};
use overture::error::{Error, Result};
use overture::splash::{GatePhase, ProgressMode, SplashScreen};
use overture::startup::dataset::produce_dataset;
use overture::startup::simulate::standard_steps;
use overture::startup::{
    BatchSink, DatasetSpec, DatasetStore, DefaultStartupOrchestrator, ProgressSink, RunOutcome,
    StartupOrchestrator, StepOutcome, TableRecord, WorkStep,
};

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<String>>,
}

impl RecordingSink {
    fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn on_step_started(&self, index: usize, description: &str) {
        self.events
            .lock()
            .unwrap()
            .push(format!("started {index}: {description}"));
    }

    fn on_step_completed(&self, index: usize) {
        self.events.lock().unwrap().push(format!("completed {index}"));
    }

    fn on_all_completed(&self) {
        self.events.lock().unwrap().push("all completed".to_string());
    }

    fn on_failed(&self, message: &str) {
        self.events.lock().unwrap().push(format!("failed: {message}"));
    }
}

#[derive(Default)]
struct NoBatches;

impl BatchSink for NoBatches {
    fn on_batch_ready(&self, _rows: Vec<TableRecord>) -> Result<()> {
        Ok(())
    }
}

/// Counts integrations while delegating to the real store.
struct CountingStore {
    inner: DatasetStore,
    batches: AtomicUsize,
}

impl CountingStore {
    fn new() -> Self {
        Self {
            inner: DatasetStore::new(),
            batches: AtomicUsize::new(0),
        }
    }
}

impl BatchSink for CountingStore {
    fn on_batch_ready(&self, rows: Vec<TableRecord>) -> Result<()> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.inner.on_batch_ready(rows)
    }
}

fn noop_step(name: &str) -> WorkStep {
    WorkStep::inline(name, format!("Running {name}"), |_| Ok(StepOutcome::Completed))
}

// Scenario A: three inline steps produce exactly three start/complete pairs
// in order, then the terminal notification.
#[tokio::test]
async fn inline_steps_notify_in_strict_order() {
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = DefaultStartupOrchestrator::new(
        sink.clone(),
        Arc::new(NoBatches),
        CancellationToken::new(),
    );
    let steps = vec![noop_step("one"), noop_step("two"), noop_step("three")];

    let outcome = orchestrator.run(&steps).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(
        sink.events(),
        vec![
            "started 0: Running one",
            "completed 0",
            "started 1: Running two",
            "completed 1",
            "started 2: Running three",
            "completed 2",
            "all completed",
        ]
    );
}

// Scenario B: work finishes almost immediately but the splash holds until
// the 5 s minimum has elapsed.
#[tokio::test(start_paused = true)]
async fn splash_holds_for_the_minimum_duration() {
    let splash = SplashScreen::new("Test", "v0", ProgressMode::Determinate, 3, true);
    let orchestrator = DefaultStartupOrchestrator::new(
        splash.clone(),
        Arc::new(NoBatches),
        CancellationToken::new(),
    );
    let steps = vec![noop_step("one"), noop_step("two"), noop_step("three")];

    let started = tokio::time::Instant::now();
    splash.start(Duration::from_secs(5));
    tokio::task::yield_now().await;

    let outcome = orchestrator.run(&steps).await.unwrap();
    assert_eq!(outcome, RunOutcome::Completed);

    // Startup is done but the timer has not fired.
    tokio::time::advance(Duration::from_millis(200)).await;
    tokio::task::yield_now().await;
    assert_eq!(splash.gate().phase(), GatePhase::WaitingForBoth);

    splash.finished().await;
    assert_eq!(splash.gate().phase(), GatePhase::Closed);
    assert!(started.elapsed() >= Duration::from_secs(5));
}

// Scenario C: a failure at index 2 of 5 stops the run, reports once, and
// the remaining steps never start.
#[tokio::test]
async fn failure_midway_skips_remaining_steps() {
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = DefaultStartupOrchestrator::new(
        sink.clone(),
        Arc::new(NoBatches),
        CancellationToken::new(),
    );
    let steps = vec![
        noop_step("one"),
        noop_step("two"),
        WorkStep::background("broken", "Running broken", |_| {
            Err(Error::Step("simulated fault".to_string()))
        }),
        noop_step("four"),
        noop_step("five"),
    ];

    let outcome = orchestrator.run(&steps).await.unwrap();

    assert!(matches!(outcome, RunOutcome::Failed { .. }));
    let events = sink.events();
    assert_eq!(events.iter().filter(|e| e.starts_with("failed")).count(), 1);
    assert!(!events.iter().any(|e| e.contains("Running four")));
    assert!(!events.iter().any(|e| e.contains("Running five")));
    assert!(!events.iter().any(|e| e.as_str() == "all completed"));
}

// Scenario C, gate side: failure counts as finished, so the splash still
// comes down.
#[tokio::test(start_paused = true)]
async fn gate_closes_after_a_failed_run() {
    let splash = SplashScreen::new("Test", "v0", ProgressMode::Indeterminate, 2, true);
    let orchestrator = DefaultStartupOrchestrator::new(
        splash.clone(),
        Arc::new(NoBatches),
        CancellationToken::new(),
    );
    let steps = vec![
        noop_step("one"),
        WorkStep::inline("broken", "Running broken", |_| {
            Err(Error::Step("simulated fault".to_string()))
        }),
    ];

    splash.start(Duration::from_millis(100));
    tokio::task::yield_now().await;

    let outcome = orchestrator.run(&steps).await.unwrap();
    assert!(matches!(outcome, RunOutcome::Failed { .. }));

    splash.finished().await;
    assert_eq!(splash.gate().phase(), GatePhase::Closed);
}

// Scenario D: 10,000 rows in batches of 500 arrive as exactly 20
// integrations with ids 1..=10000, no gaps or duplicates.
#[tokio::test]
async fn streaming_step_delivers_every_row_in_bounded_batches() {
    let store = Arc::new(CountingStore::new());
    let orchestrator = DefaultStartupOrchestrator::new(
        Arc::new(RecordingSink::default()),
        store.clone(),
        CancellationToken::new(),
    );

    let spec = DatasetSpec {
        total_rows: 10_000,
        batch_size: 500,
        seed: 99,
        origin: "2025-06-01T00:00:00Z".parse().unwrap(),
        inter_batch_delay: Duration::ZERO,
    };
    let steps = vec![WorkStep::streaming(
        "datatable",
        "Populating data table (10,000 rows)",
        move |producer, token| produce_dataset(&producer, &token, &spec),
    )];

    let outcome = orchestrator.run(&steps).await.unwrap();

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(store.batches.load(Ordering::SeqCst), 20);
    let rows = store.inner.rows();
    assert_eq!(rows.len(), 10_000);
    for (i, row) in rows.iter().enumerate() {
        assert_eq!(row.id, i as u32 + 1);
    }
}

// Full wiring with the standard step list, sped up through configuration.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn standard_sequence_runs_end_to_end() {
    let mut config = StartupConfig::default();
    config.minimum_splash_duration = Duration::from_millis(50);
    for name in ["config", "database", "preferences", "ui", "plugins", "license", "services"] {
        config.steps.push(StepOverride {
            name: name.to_string(),
            duration_ms: Some(5),
            context: None,
        });
    }
    config.dataset.total_rows = 200;
    config.dataset.batch_size = 50;
    config.dataset.seed = Some(1);
    config.dataset.inter_batch_delay_ms = 0;
    config.validate().unwrap();

    let steps = standard_steps(&config).unwrap();
    let splash = SplashScreen::new(
        &config.app_name,
        &config.app_version,
        config.progress_mode,
        steps.len(),
        true,
    );
    let store = Arc::new(DatasetStore::new());
    let orchestrator = DefaultStartupOrchestrator::new(
        splash.clone(),
        store.clone(),
        CancellationToken::new(),
    );

    splash.start(config.minimum_splash_duration);
    let outcome = orchestrator.run(&steps).await.unwrap();
    splash.finished().await;

    assert_eq!(outcome, RunOutcome::Completed);
    assert_eq!(splash.gate().phase(), GatePhase::Closed);
    assert_eq!(store.row_count(), 200);
}
