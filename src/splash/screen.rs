//! Console splash screen
//!
//! The presentation layer for the startup sequence: an `indicatif` progress
//! bar plus the lifecycle gate that keeps it visible for the minimum
//! duration. Implements [`ProgressSink`] so the orchestrator can drive it
//! without knowing anything about rendering.

use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::splash::animation::{BounceRamp, BOUNCE_INTERVAL};
use crate::splash::gate::{FinishStatus, LifecycleGate};
use crate::startup::progress::ProgressSink;

/// How the bar reports progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// Bouncing fill until the gate closes.
    Indeterminate,
    /// Fill tracks completed steps out of the total.
    Determinate,
}

/// Kept on screen briefly after the gate closes so the completed state is
/// visible.
pub const CLOSE_LINGER: Duration = Duration::from_millis(200);

pub struct SplashScreen {
    bar: ProgressBar,
    mode: ProgressMode,
    total_steps: usize,
    gate: LifecycleGate,
}

impl SplashScreen {
    /// Build the splash screen and its gate. `plain` suppresses the bar
    /// (transitions still go to the log), for headless runs.
    pub fn new(
        app_name: &str,
        app_version: &str,
        mode: ProgressMode,
        total_steps: usize,
        plain: bool,
    ) -> Arc<Self> {
        let bar = if plain {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(100)
        };
        let style = ProgressStyle::with_template("{prefix} [{bar:40.cyan/blue}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        bar.set_style(style);
        bar.set_prefix(format!("{app_name} {app_version}"));
        if mode == ProgressMode::Determinate {
            bar.set_length(total_steps.max(1) as u64);
        }
        bar.set_message("Initializing...");

        let close_bar = bar.clone();
        let close_mode = mode;
        let close_total = total_steps.max(1) as u64;
        let gate = LifecycleGate::new(move |status: &FinishStatus| {
            let full = match close_mode {
                ProgressMode::Determinate => close_total,
                ProgressMode::Indeterminate => 100,
            };
            close_bar.set_position(full);
            match status {
                FinishStatus::Success => {
                    close_bar.finish_with_message("Ready!");
                    info!("splash finished");
                }
                FinishStatus::Failure(message) => {
                    close_bar.abandon_with_message(format!("Error: {message}"));
                    error!("splash finished with error: {message}");
                }
            }
        });

        Arc::new(Self {
            bar,
            mode,
            total_steps,
            gate,
        })
    }

    /// Show the splash: start the gate's minimum-duration timer and, in
    /// indeterminate mode, the bounce animation.
    pub fn start(&self, minimum_duration: Duration) {
        self.gate.start(minimum_duration);

        if self.mode == ProgressMode::Indeterminate {
            let gate = self.gate.clone();
            let bar = self.bar.clone();
            tokio::spawn(async move {
                let mut ramp = BounceRamp::new();
                let mut ticker = tokio::time::interval(BOUNCE_INTERVAL);
                let closed = gate.closed();
                tokio::pin!(closed);
                loop {
                    tokio::select! {
                        _ = &mut closed => break,
                        _ = ticker.tick() => {
                            bar.set_position(ramp.tick());
                        }
                    }
                }
            });
        }
    }

    pub fn gate(&self) -> &LifecycleGate {
        &self.gate
    }

    pub fn total_steps(&self) -> usize {
        self.total_steps
    }

    /// Resolve once the gate has closed and the final state has lingered on
    /// screen.
    pub async fn finished(&self) {
        self.gate.closed().await;
        tokio::time::sleep(CLOSE_LINGER).await;
    }
}

impl ProgressSink for SplashScreen {
    fn on_step_started(&self, index: usize, description: &str) {
        info!(">> {description}...");
        if self.mode == ProgressMode::Determinate {
            self.bar.set_position(index as u64);
        }
        self.bar.set_message(description.to_string());
    }

    fn on_step_completed(&self, index: usize) {
        info!("   [OK]");
        if self.mode == ProgressMode::Determinate {
            self.bar.set_position(index as u64 + 1);
        }
    }

    fn on_all_completed(&self) {
        info!("all initialization tasks completed");
        self.gate.request_finish(FinishStatus::Success);
    }

    fn on_failed(&self, message: &str) {
        error!("initialization failed: {message}");
        self.bar.set_message(format!("Error: {message}"));
        self.gate.request_finish(FinishStatus::Failure(message.to_string()));
    }
}
