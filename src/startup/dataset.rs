//! Deterministic dataset generation for the streaming startup step
//!
//! Row values are derived independently from a seeded RNG consumed in row
//! order, so the concatenated output depends only on the seed and origin
//! timestamp, never on how the rows are partitioned into batches.

use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::{Error, Result};
use crate::startup::batch::{BatchProducer, BatchSink, RecordStatus, TableRecord};
use crate::startup::step::StepOutcome;

pub const DEFAULT_TOTAL_ROWS: u32 = 10_000;
pub const DEFAULT_BATCH_SIZE: u32 = 500;
pub const DEFAULT_INTER_BATCH_DELAY: Duration = Duration::from_millis(10);

/// Parameters for one dataset production run.
#[derive(Debug, Clone)]
pub struct DatasetSpec {
    pub total_rows: u32,
    pub batch_size: u32,
    /// Seed for the row RNG; a fixed seed reproduces the exact row sequence.
    pub seed: u64,
    /// Reference time that row timestamps are derived from.
    pub origin: DateTime<Utc>,
    /// Pause between batches, after integration of the previous one.
    pub inter_batch_delay: Duration,
}

impl DatasetSpec {
    pub fn new(seed: u64) -> Self {
        Self {
            total_rows: DEFAULT_TOTAL_ROWS,
            batch_size: DEFAULT_BATCH_SIZE,
            seed,
            origin: Utc::now(),
            inter_batch_delay: DEFAULT_INTER_BATCH_DELAY,
        }
    }
}

/// Generate rows for the 0-based index range `[start, end)`, advancing `rng`
/// by a fixed number of draws per row.
fn generate_rows(rng: &mut StdRng, origin: DateTime<Utc>, start: u32, end: u32) -> Vec<TableRecord> {
    let mut rows = Vec::with_capacity((end - start) as usize);
    for index in start..end {
        let id = index + 1;
        let noise = rng.random_range(0..50u32);
        let status = RecordStatus::ALL[rng.random_range(0..RecordStatus::ALL.len())];
        let age_secs = rng.random_range(0..86_400i64);
        rows.push(TableRecord {
            id,
            label: format!("Item_{id:05}"),
            value: (index as f64 * 0.1).sin() * 100.0 + noise as f64,
            status,
            timestamp: origin - chrono::Duration::seconds(age_secs),
        });
    }
    rows
}

/// Produce the full dataset in batches, blocking on each hand-off.
///
/// Runs on a worker thread. Observes `token` between batches and returns
/// [`StepOutcome::Cancelled`] without emitting further batches once it is
/// set.
pub fn produce_dataset(
    producer: &BatchProducer,
    token: &CancellationToken,
    spec: &DatasetSpec,
) -> Result<StepOutcome> {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let mut start = 0u32;
    while start < spec.total_rows {
        if token.is_cancelled() {
            debug!("dataset production cancelled at row {start}");
            return Ok(StepOutcome::Cancelled);
        }

        let end = (start + spec.batch_size).min(spec.total_rows);
        let rows = generate_rows(&mut rng, spec.origin, start, end);
        producer.send(rows)?;
        start = end;

        if start < spec.total_rows && !spec.inter_batch_delay.is_zero() {
            std::thread::sleep(spec.inter_batch_delay);
        }
    }
    Ok(StepOutcome::Completed)
}

/// Ordered store the coordinating task integrates batches into.
#[derive(Default)]
pub struct DatasetStore {
    rows: Mutex<Vec<TableRecord>>,
}

impl DatasetStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn rows(&self) -> Vec<TableRecord> {
        self.rows.lock().unwrap().clone()
    }
}

impl BatchSink for DatasetStore {
    fn on_batch_ready(&self, batch: Vec<TableRecord>) -> Result<()> {
        let mut rows = self.rows.lock().unwrap();
        let mut expected = rows.len() as u32 + 1;
        for record in &batch {
            if record.id != expected {
                return Err(Error::BatchIntegration(format!(
                    "row id {} arrived where {} was expected",
                    record.id, expected
                )));
            }
            expected += 1;
        }
        rows.extend(batch);
        Ok(())
    }
}
