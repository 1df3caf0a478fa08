use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use overture::config::StartupConfig;
use overture::splash::{ProgressMode, SplashScreen};
use overture::startup::simulate::standard_steps;
use overture::startup::{DatasetStore, DefaultStartupOrchestrator, RunOutcome, StartupOrchestrator};

/// Run a coordinated startup sequence behind a splash screen
#[derive(Parser)]
#[command(name = "overture")]
#[command(about = "Coordinated application startup behind a splash-screen lifecycle", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Minimum splash duration in milliseconds
    #[arg(long)]
    min_duration_ms: Option<u64>,

    /// Progress display mode
    #[arg(long, value_enum)]
    mode: Option<ModeArg>,

    /// Fixed seed for the simulated dataset
    #[arg(long)]
    seed: Option<u64>,

    /// Disable the animated progress bar
    #[arg(long)]
    plain: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Determinate,
    Indeterminate,
}

impl From<ModeArg> for ProgressMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Determinate => ProgressMode::Determinate,
            ModeArg::Indeterminate => ProgressMode::Indeterminate,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    let mut config = match &cli.config {
        Some(path) => StartupConfig::load(path)?,
        None => StartupConfig::default(),
    };
    config.merge_env_vars();
    if let Some(ms) = cli.min_duration_ms {
        config.minimum_splash_duration = Duration::from_millis(ms);
    }
    if let Some(mode) = cli.mode {
        config.progress_mode = mode.into();
    }
    if let Some(seed) = cli.seed {
        config.dataset.seed = Some(seed);
    }
    config.validate()?;

    let steps = standard_steps(&config)?;
    debug!("startup sequence: {} steps", steps.len());

    let token = CancellationToken::new();
    {
        let token = token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, cancelling initialization");
                token.cancel();
            }
        });
    }

    let splash = SplashScreen::new(
        &config.app_name,
        &config.app_version,
        config.progress_mode,
        steps.len(),
        cli.plain,
    );
    let store = Arc::new(DatasetStore::new());
    let orchestrator =
        DefaultStartupOrchestrator::new(splash.clone(), store.clone(), token.clone());

    let started = Instant::now();
    splash.start(config.minimum_splash_duration);
    let outcome = orchestrator.run(&steps).await?;

    match outcome {
        RunOutcome::Completed => {
            splash.finished().await;
            let rows = store.rows();
            println!(
                "Application initialized successfully in {:.1}s ({} rows loaded)",
                started.elapsed().as_secs_f32(),
                rows.len()
            );
            for record in rows.iter().take(3) {
                println!(
                    "  {:>5}  {}  {:>8.2}  {:<10}  {}",
                    record.id,
                    record.label,
                    record.value,
                    record.status.as_str(),
                    record.timestamp.format("%Y-%m-%d %H:%M:%S")
                );
            }
            if rows.len() > 3 {
                println!("  ... and {} more rows", rows.len() - 3);
            }
            Ok(())
        }
        RunOutcome::Failed { message } => {
            splash.finished().await;
            anyhow::bail!("initialization failed: {message}");
        }
        RunOutcome::Cancelled => {
            info!("initialization cancelled before completion");
            println!("Initialization cancelled.");
            Ok(())
        }
    }
}
