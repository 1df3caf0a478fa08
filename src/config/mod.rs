//! Configuration for the startup sequence and splash presentation
//!
//! Loaded from a TOML file, with environment-variable overrides layered on
//! top. Everything is optional; the defaults reproduce the standard demo
//! sequence.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::splash::screen::ProgressMode;
use crate::startup::dataset::{DEFAULT_BATCH_SIZE, DEFAULT_TOTAL_ROWS};
use crate::startup::step::ExecutionContext;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StartupConfig {
    /// Caption shown on the splash screen.
    pub app_name: String,
    pub app_version: String,
    /// How long the splash must stay visible even if startup finishes
    /// sooner.
    #[serde(with = "humantime_serde")]
    pub minimum_splash_duration: Duration,
    pub progress_mode: ProgressMode,
    /// Per-step overrides, keyed by step name.
    pub steps: Vec<StepOverride>,
    pub dataset: DatasetConfig,
}

/// Overrides one step of the standard sequence. An override may change the
/// simulated duration, the execution context, or both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepOverride {
    pub name: String,
    #[serde(default)]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub context: Option<ExecutionContext>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    pub total_rows: u32,
    pub batch_size: u32,
    /// Fixed seed for reproducible rows; generated per run when absent.
    pub seed: Option<u64>,
    pub inter_batch_delay_ms: u64,
}

impl Default for StartupConfig {
    fn default() -> Self {
        Self {
            app_name: "Overture Demo".to_string(),
            app_version: "v0.1.0".to_string(),
            minimum_splash_duration: Duration::from_secs(2),
            progress_mode: ProgressMode::Determinate,
            steps: Vec::new(),
            dataset: DatasetConfig::default(),
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            total_rows: DEFAULT_TOTAL_ROWS,
            batch_size: DEFAULT_BATCH_SIZE,
            seed: None,
            inter_batch_delay_ms: 10,
        }
    }
}

impl StartupConfig {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: StartupConfig = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Layer environment-variable overrides on top of the loaded values.
    pub fn merge_env_vars(&mut self) {
        if let Ok(ms) = std::env::var("OVERTURE_MIN_SPLASH_MS") {
            if let Ok(value) = ms.parse::<u64>() {
                self.minimum_splash_duration = Duration::from_millis(value);
            }
        }

        if let Ok(mode) = std::env::var("OVERTURE_PROGRESS_MODE") {
            match mode.to_lowercase().as_str() {
                "determinate" => self.progress_mode = ProgressMode::Determinate,
                "indeterminate" => self.progress_mode = ProgressMode::Indeterminate,
                _ => {}
            }
        }

        if let Ok(seed) = std::env::var("OVERTURE_SEED") {
            if let Ok(value) = seed.parse::<u64>() {
                self.dataset.seed = Some(value);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.dataset.total_rows == 0 {
            return Err(Error::Config("dataset.total_rows must be at least 1".to_string()));
        }
        if self.dataset.batch_size == 0 {
            return Err(Error::Config("dataset.batch_size must be at least 1".to_string()));
        }
        for step_override in &self.steps {
            if step_override.duration_ms.is_none() && step_override.context.is_none() {
                return Err(Error::Config(format!(
                    "step '{}' override sets neither duration nor context",
                    step_override.name
                )));
            }
            if step_override.duration_ms == Some(0) {
                return Err(Error::Config(format!(
                    "step '{}' duration override must be greater than zero",
                    step_override.name
                )));
            }
        }
        Ok(())
    }
}
