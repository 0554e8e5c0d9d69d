//! Engine binary for the Apis colony simulation.
//!
//! Loads the configuration, runs every replicate in parallel and writes
//! one JSON report with the replicate summaries and their periodic colony
//! snapshots.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `$APIS_CONFIG` or `apis-config.yaml`
//! 2. Initialize structured logging (tracing) to stderr
//! 3. Validate the configuration
//! 4. Run the replicates on the rayon pool
//! 5. Write the report to the configured path or stdout

mod error;
mod report;

use std::path::Path;

use apis_core::config::{self, SimulationConfig};
use apis_core::runner;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::report::{RunReport, SnapshotRecorder};

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, a replicate fails or
/// the report cannot be written.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Load configuration.
    let config_path = config::config_path();
    let config = load_config(&config_path)?;

    // 2. Initialize structured logging. stdout is reserved for the report.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    info!("apis-engine starting");
    if !config_path.exists() {
        info!(path = %config_path.display(), "Config file not found, using defaults");
    }
    info!(
        path = %config_path.display(),
        seed = config.run.seed,
        replicates = config.run.replicates,
        max_ticks = config.run.max_ticks,
        accounting_policy = ?config.run.accounting_policy,
        mortality_mode = ?config.run.mortality_mode,
        application = config.toxicant.application.enabled,
        "Configuration loaded"
    );

    // 3. Validate.
    config.validate().map_err(EngineError::from)?;

    // 4. Run the replicates.
    let interval = config.logging.snapshot_interval_ticks;
    let outcomes = runner::run_replicates(&config, |_| SnapshotRecorder::new(interval))
        .map_err(EngineError::from)?;
    let snapshots: usize = outcomes
        .iter()
        .map(|outcome| outcome.callback.snapshots().len())
        .sum();
    info!(replicates = outcomes.len(), snapshots, "Replicates finished");

    // 5. Write the report.
    let report = RunReport::from_outcomes(outcomes);
    report::write_report(&report, config.output.path.as_deref())?;

    info!(
        max_ticks_reached = report.end_reasons.max_ticks_reached,
        extinction = report.end_reasons.extinction,
        starvation = report.end_reasons.starvation,
        "apis-engine shutdown complete"
    );
    Ok(())
}

/// Load the simulation configuration from `path`.
///
/// A missing file means the built-in defaults.
fn load_config(path: &Path) -> Result<SimulationConfig, EngineError> {
    if path.exists() {
        Ok(SimulationConfig::from_file(path)?)
    } else {
        Ok(SimulationConfig::parse("{}")?)
    }
}
