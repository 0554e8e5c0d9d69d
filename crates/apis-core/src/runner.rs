//! Simulation loop runner and replicate fan-out.
//!
//! [`run_simulation`] drives the tick loop of one replicate until one of
//! its termination conditions holds:
//!
//! - **Max ticks**: the configured run length has been simulated
//! - **Extinction**: no bee is left in any stage
//! - **Starvation**: the honey stores could not cover a day's need
//!
//! [`run_replicate`] wraps it with setup, a tracing span and timestamps, and
//! [`run_replicates`] runs every configured replicate on the rayon pool. A
//! replicate never shares state with another; replicate `i` is seeded with
//! `seed + i`, so a run is reproducible from its configuration alone.

use chrono::Utc;
use rayon::prelude::*;
use tracing::{info, info_span, warn};

use apis_colony::ColonyError;
use apis_types::{EndReason, RunId, RunSummary};

use crate::clock::ClockError;
use crate::config::{ConfigError, SimulationConfig};
use crate::entitlement::{EntitlementSource, NurseCapacityEntitlements};
use crate::foraging::{ForagingSource, ScheduledForaging};
use crate::setup;
use crate::tick::{self, SimulationState, TickError, TickSummary};

/// Errors that can occur during a simulation run.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// A tick execution failed.
    #[error("tick error: {source}")]
    Tick {
        /// The underlying tick error.
        #[from]
        source: TickError,
    },

    /// The clock could not be built.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// The colony could not be built.
    #[error("colony error: {source}")]
    Colony {
        /// The underlying colony error.
        #[from]
        source: ColonyError,
    },

    /// The configuration was rejected.
    #[error("config error: {source}")]
    Config {
        /// The underlying configuration error.
        #[from]
        source: ConfigError,
    },
}

/// Result of one simulation run.
#[derive(Debug)]
pub struct SimulationResult {
    /// The reason the simulation ended.
    pub end_reason: EndReason,
    /// The last tick summary.
    pub final_summary: Option<TickSummary>,
    /// Total number of ticks executed.
    pub total_ticks: u64,
    /// Largest end-of-tick population, setup included.
    pub peak_population: u64,
}

/// Callback invoked after each tick completes.
///
/// Reporting hooks in here. The callback only ever sees the state through
/// a shared reference.
pub trait TickCallback: Send {
    /// Called after a tick completes successfully.
    fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState);
}

/// A no-op tick callback.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl TickCallback for NoOpCallback {
    fn on_tick(&mut self, _summary: &TickSummary, _state: &SimulationState) {}
}

/// A finished replicate together with the callback that observed it.
#[derive(Debug)]
pub struct ReplicateOutcome<C> {
    /// The replicate's summary.
    pub summary: RunSummary,
    /// The callback, holding whatever it recorded.
    pub callback: C,
}

/// Run the tick loop until a termination condition is met.
///
/// Termination is checked once per tick, after the callback has seen the
/// tick: extinction first, then starvation, then the tick limit.
///
/// # Errors
///
/// Returns [`RunnerError::Tick`] if a tick fails. The state is left as the
/// failed tick left it.
pub fn run_simulation(
    state: &mut SimulationState,
    foraging: &mut dyn ForagingSource,
    entitlements: &mut dyn EntitlementSource,
    callback: &mut dyn TickCallback,
) -> Result<SimulationResult, RunnerError> {
    let mut total_ticks: u64 = 0;
    let mut peak_population = state.colony.total_population();

    info!(
        max_ticks = state.clock.max_ticks(),
        population = peak_population,
        honey_kj = state.honey.total_energy(),
        "Simulation starting"
    );

    if state.clock.is_finished() {
        return Ok(SimulationResult {
            end_reason: EndReason::MaxTicksReached,
            final_summary: None,
            total_ticks,
            peak_population,
        });
    }

    loop {
        let summary = tick::run_tick(state, foraging, entitlements)?;
        total_ticks = total_ticks.saturating_add(1);
        peak_population = peak_population.max(summary.population);

        callback.on_tick(&summary, state);

        let end_reason = if summary.population == 0 {
            info!(tick = summary.tick, "No bees left -- extinction");
            Some(EndReason::Extinction)
        } else if summary.starved {
            info!(tick = summary.tick, population = summary.population, "Colony starved");
            Some(EndReason::Starvation)
        } else if state.clock.is_finished() {
            info!(tick = summary.tick, "Tick limit reached");
            Some(EndReason::MaxTicksReached)
        } else {
            None
        };

        if let Some(end_reason) = end_reason {
            return Ok(SimulationResult {
                end_reason,
                final_summary: Some(summary),
                total_ticks,
                peak_population,
            });
        }
    }
}

/// Log the end of a run.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        peak_population = result.peak_population,
        final_population = result.final_summary.as_ref().map(|s| s.population),
        "Simulation ended"
    );
    if result.final_summary.is_none() {
        warn!("Simulation ended with no ticks executed");
    }
}

/// Build and run replicate `replicate` with the stand-in collaborators.
///
/// # Errors
///
/// Returns [`RunnerError`] if setup or a tick fails.
pub fn run_replicate(
    config: &SimulationConfig,
    replicate: u32,
    callback: &mut dyn TickCallback,
) -> Result<RunSummary, RunnerError> {
    let seed = config.run.seed.wrapping_add(u64::from(replicate));
    let run_id = RunId::new();
    let span = info_span!("replicate", %run_id, replicate, seed);
    let _entered = span.enter();

    let started_at = Utc::now();
    let mut state = setup::build_state(config, seed)?;
    let mut foraging = ScheduledForaging::new(config.foraging, config.toxicant.application);
    let mut entitlements = NurseCapacityEntitlements::new(config.colony.nursing);

    let result = run_simulation(&mut state, &mut foraging, &mut entitlements, callback)?;
    log_simulation_end(&result);

    Ok(RunSummary {
        run_id,
        replicate,
        seed,
        end_reason: result.end_reason,
        total_ticks: result.total_ticks,
        started_at,
        finished_at: Utc::now(),
        peak_population: result.peak_population,
        final_snapshot: result.final_summary.map(|summary| summary.snapshot),
        fate: state.fate,
    })
}

/// Run every configured replicate in parallel.
///
/// `make_callback` builds one callback per replicate. Outcomes are returned
/// in replicate order.
///
/// # Errors
///
/// Returns [`RunnerError::Config`] if the configuration is invalid, or the
/// error of a failed replicate.
pub fn run_replicates<C, F>(
    config: &SimulationConfig,
    make_callback: F,
) -> Result<Vec<ReplicateOutcome<C>>, RunnerError>
where
    C: TickCallback,
    F: Fn(u32) -> C + Sync,
{
    config.validate()?;
    info!(
        replicates = config.run.replicates,
        base_seed = config.run.seed,
        threads = rayon::current_num_threads(),
        "Running replicates"
    );

    (0..config.run.replicates)
        .into_par_iter()
        .map(|replicate| {
            let mut callback = make_callback(replicate);
            let summary = run_replicate(config, replicate, &mut callback)?;
            Ok(ReplicateOutcome { summary, callback })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn short_config(max_ticks: u64) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.run.max_ticks = max_ticks;
        config
    }

    fn run(config: &SimulationConfig, callback: &mut dyn TickCallback) -> SimulationResult {
        let mut state = setup::build_state(config, config.run.seed).unwrap();
        let mut foraging = ScheduledForaging::new(config.foraging, config.toxicant.application);
        let mut entitlements = NurseCapacityEntitlements::new(config.colony.nursing);
        run_simulation(&mut state, &mut foraging, &mut entitlements, callback).unwrap()
    }

    #[test]
    fn bounded_by_max_ticks() {
        let config = short_config(5);
        let result = run(&config, &mut NoOpCallback);
        assert_eq!(result.end_reason, EndReason::MaxTicksReached);
        assert_eq!(result.total_ticks, 5);
        assert_eq!(result.final_summary.unwrap().tick, 5);
    }

    #[test]
    fn extinction_stops_simulation() {
        let mut config = short_config(100);
        config.population.initial_foragers = 0;
        config.laying.max_eggs_per_day = 0.0;
        let result = run(&config, &mut NoOpCallback);
        assert_eq!(result.end_reason, EndReason::Extinction);
        assert_eq!(result.total_ticks, 1);
    }

    #[test]
    fn starvation_stops_simulation() {
        let mut config = short_config(100);
        config.stores.initial_honey_kg = 0.0;
        let result = run(&config, &mut NoOpCallback);
        assert_eq!(result.end_reason, EndReason::Starvation);
        assert_eq!(result.total_ticks, 1);
    }

    #[test]
    fn tick_callback_is_called() {
        struct Counter {
            ticks: Vec<u64>,
        }

        impl TickCallback for Counter {
            fn on_tick(&mut self, summary: &TickSummary, state: &SimulationState) {
                assert_eq!(summary.tick, state.clock.tick());
                self.ticks.push(summary.tick);
            }
        }

        let config = short_config(3);
        let mut counter = Counter { ticks: Vec::new() };
        run(&config, &mut counter);
        assert_eq!(counter.ticks, vec![1, 2, 3]);
    }

    #[test]
    fn replicates_are_seeded_in_order() {
        let mut config = short_config(10);
        config.run.replicates = 3;
        let outcomes = run_replicates(&config, |_| NoOpCallback).unwrap();
        let seeds: Vec<u64> = outcomes.iter().map(|o| o.summary.seed).collect();
        assert_eq!(seeds, vec![42, 43, 44]);
        assert!(outcomes.iter().all(|o| o.summary.total_ticks == 10));
    }

    #[test]
    fn same_seed_reproduces_the_run() {
        let config = short_config(40);
        let first = run_replicate(&config, 1, &mut NoOpCallback).unwrap();
        let second = run_replicate(&config, 1, &mut NoOpCallback).unwrap();
        assert_ne!(first.run_id, second.run_id);
        assert_eq!(first.final_snapshot, second.final_snapshot);
        assert_eq!(first.fate, second.fate);
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let mut config = short_config(10);
        config.run.replicates = 0;
        let result = run_replicates(&config, |_| NoOpCallback);
        assert!(matches!(result, Err(RunnerError::Config { .. })));
    }
}
