//! Bounded batch hand-off between a producing worker and the coordinator
//!
//! The streaming step generates a large ordered result set on a worker
//! thread. Handing the whole set over at once would either buffer it all in
//! memory or flood the coordinating task, so rows travel in bounded batches
//! through a [`BatchChannel`]: the producer blocks on every `send` until the
//! coordinating task has integrated that exact batch, which caps the
//! in-flight data at one batch.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::error::{Error, Result};

/// Status column values for generated records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordStatus {
    Active,
    Pending,
    Completed,
    Failed,
    Processing,
}

impl RecordStatus {
    pub const ALL: [RecordStatus; 5] = [
        RecordStatus::Active,
        RecordStatus::Pending,
        RecordStatus::Completed,
        RecordStatus::Failed,
        RecordStatus::Processing,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "Active",
            RecordStatus::Pending => "Pending",
            RecordStatus::Completed => "Completed",
            RecordStatus::Failed => "Failed",
            RecordStatus::Processing => "Processing",
        }
    }
}

/// One row of the streamed result set.
#[derive(Debug, Clone, Serialize)]
pub struct TableRecord {
    /// 1-based row index.
    pub id: u32,
    /// Zero-padded textual form of the id, e.g. `Item_00042`.
    pub label: String,
    pub value: f64,
    pub status: RecordStatus,
    pub timestamp: DateTime<Utc>,
}

/// Integrates batches into the coordinating side's ordered store.
///
/// Called only from the coordinating task, in strict delivery order. The
/// producer is blocked until this returns, so implementations should do the
/// integration and nothing slower.
pub trait BatchSink: Send + Sync {
    fn on_batch_ready(&self, rows: Vec<TableRecord>) -> Result<()>;
}

struct BatchEnvelope {
    rows: Vec<TableRecord>,
    ack: oneshot::Sender<Result<()>>,
}

/// Single-producer/single-consumer bounded hand-off of record batches.
pub struct BatchChannel;

impl BatchChannel {
    /// Create a connected producer/consumer pair.
    pub fn bounded() -> (BatchProducer, BatchConsumer) {
        // Capacity 1 plus the per-batch ack keeps the producer at most one
        // batch ahead of integration.
        let (tx, rx) = mpsc::channel(1);
        (BatchProducer { tx }, BatchConsumer { rx })
    }
}

/// Worker-side handle. Dropped when the producer is done, which ends the
/// consumer's drain loop.
pub struct BatchProducer {
    tx: mpsc::Sender<BatchEnvelope>,
}

impl BatchProducer {
    /// Hand a batch to the coordinating task and block until it has been
    /// integrated.
    ///
    /// Must be called from a worker thread, never from the coordinating
    /// task. Ownership of `rows` transfers to the consumer. An integration
    /// failure on the consumer side is returned here, failing the streaming
    /// step.
    pub fn send(&self, rows: Vec<TableRecord>) -> Result<()> {
        let (ack_tx, ack_rx) = oneshot::channel();
        let envelope = BatchEnvelope {
            rows,
            ack: ack_tx,
        };
        self.tx
            .blocking_send(envelope)
            .map_err(|_| Error::BatchIntegration("consumer dropped before hand-off".to_string()))?;
        match ack_rx.blocking_recv() {
            Ok(result) => result,
            Err(_) => Err(Error::BatchIntegration(
                "consumer dropped before acknowledging batch".to_string(),
            )),
        }
    }
}

/// Coordinator-side handle.
pub struct BatchConsumer {
    rx: mpsc::Receiver<BatchEnvelope>,
}

impl BatchConsumer {
    /// Integrate batches into `sink` as they arrive, acknowledging each one,
    /// until the producer side closes.
    ///
    /// Integration errors are acknowledged back to the producer rather than
    /// returned here; the producer surfaces them as the streaming step's
    /// failure.
    pub async fn drain(mut self, sink: &dyn BatchSink) {
        let mut delivered = 0usize;
        while let Some(envelope) = self.rx.recv().await {
            let result = sink.on_batch_ready(envelope.rows);
            delivered += 1;
            if let Err(ref e) = result {
                debug!("batch {delivered} failed to integrate: {e}");
            }
            // The producer may already be gone if it panicked mid-send.
            let _ = envelope.ack.send(result);
        }
        debug!("batch channel drained after {delivered} batches");
    }
}
