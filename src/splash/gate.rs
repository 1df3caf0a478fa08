//! Two-condition close gate for the splash lifecycle
//!
//! The splash screen must stay up for a minimum duration and must not
//! disappear while startup work is still running. [`LifecycleGate`] tracks
//! both conditions independently and performs the close action exactly once,
//! when the second of the two arrives. A near-instant startup therefore
//! cannot make the splash flash and vanish, and a slow startup is never cut
//! off by the timer.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tracing::debug;

/// Gate lifecycle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatePhase {
    /// Constructed, not yet started.
    Armed,
    /// Started; waiting for the timer, the finish request, or both.
    WaitingForBoth,
    /// Close action has run. Terminal.
    Closed,
}

/// How startup finished. Failure still closes the gate; the message is
/// handed to the close action so the terminal state can surface it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishStatus {
    Success,
    Failure(String),
}

type CloseAction = Box<dyn FnOnce(&FinishStatus) + Send>;

struct GateState {
    phase: GatePhase,
    minimum_elapsed: bool,
    finish_requested: bool,
    status: FinishStatus,
    on_close: Option<CloseAction>,
}

struct GateInner {
    state: Mutex<GateState>,
    closed_tx: watch::Sender<bool>,
}

/// Tracks the two readiness conditions and fires the close action exactly
/// once. Cheap to clone; clones share the same gate.
#[derive(Clone)]
pub struct LifecycleGate {
    inner: Arc<GateInner>,
}

impl LifecycleGate {
    /// Create a gate whose close action runs when both conditions hold.
    pub fn new<F>(on_close: F) -> Self
    where
        F: FnOnce(&FinishStatus) + Send + 'static,
    {
        let (closed_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(GateInner {
                state: Mutex::new(GateState {
                    phase: GatePhase::Armed,
                    minimum_elapsed: false,
                    finish_requested: false,
                    status: FinishStatus::Success,
                    on_close: Some(Box::new(on_close)),
                }),
                closed_tx,
            }),
        }
    }

    /// Start the gate: enter `WaitingForBoth` and schedule the one-shot
    /// minimum-duration timer.
    pub fn start(&self, minimum_duration: Duration) {
        {
            let mut state = self.inner.state.lock().unwrap();
            state.phase = GatePhase::WaitingForBoth;
            state.minimum_elapsed = false;
            state.finish_requested = false;
        }
        let gate = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(minimum_duration).await;
            gate.note_minimum_elapsed();
        });
    }

    /// The minimum-duration timer fired.
    pub fn note_minimum_elapsed(&self) {
        {
            let mut state = self.inner.state.lock().unwrap();
            state.minimum_elapsed = true;
        }
        debug!("minimum splash duration elapsed");
        self.try_close();
    }

    /// Startup finished (successfully or not). The first request wins;
    /// later ones are ignored.
    pub fn request_finish(&self, status: FinishStatus) {
        {
            let mut state = self.inner.state.lock().unwrap();
            if !state.finish_requested {
                state.finish_requested = true;
                state.status = status;
            }
        }
        self.try_close();
    }

    /// Attempt the close transition. Safe to call any number of times; the
    /// close action runs exactly once, when both conditions hold.
    pub fn try_close(&self) {
        let fired = {
            let mut state = self.inner.state.lock().unwrap();
            if state.phase == GatePhase::Closed
                || !state.minimum_elapsed
                || !state.finish_requested
            {
                None
            } else {
                state.phase = GatePhase::Closed;
                state
                    .on_close
                    .take()
                    .map(|action| (action, state.status.clone()))
            }
        };

        if let Some((action, status)) = fired {
            debug!("lifecycle gate closing ({status:?})");
            action(&status);
            self.inner.closed_tx.send_replace(true);
        }
    }

    pub fn phase(&self) -> GatePhase {
        self.inner.state.lock().unwrap().phase
    }

    pub fn is_ready_to_close(&self) -> bool {
        let state = self.inner.state.lock().unwrap();
        state.minimum_elapsed && state.finish_requested
    }

    /// Resolve once the gate has closed.
    pub async fn closed(&self) {
        let mut rx = self.inner.closed_tx.subscribe();
        if *rx.borrow_and_update() {
            return;
        }
        while rx.changed().await.is_ok() {
            if *rx.borrow_and_update() {
                return;
            }
        }
    }
}
