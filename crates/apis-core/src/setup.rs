//! Initial simulation state from configuration.
//!
//! Setup is the only place configuration turns into live state: the stores
//! are filled, the initial foragers are seeded and the behaviour variants
//! chosen in `run` are fixed for the whole replicate.

use rand::SeedableRng;
use rand::rngs::SmallRng;
use tracing::debug;

use apis_colony::{Colony, ExposureAccountant, MortalityEngine};
use apis_ledger::{HoneyStore, PollenStore};
use apis_types::ToxicantFate;

use crate::clock::SimClock;
use crate::config::SimulationConfig;
use crate::runner::RunnerError;
use crate::tick::SimulationState;

/// Grams per kilogram.
const G_PER_KG: f64 = 1000.0;

/// The tick whose `day0` accepts the first deposits.
const FIRST_OPEN_DAY: u64 = 1;

/// Convert a honey mass to its energy content (kJ).
pub fn honey_kg_to_kj(config: &SimulationConfig, kg: f64) -> f64 {
    kg * G_PER_KG * config.colony.needs.honey_energy_kj_per_g
}

/// Build the state of one replicate, seeded with `seed`.
///
/// The colony starts with the configured foragers and no brood. All initial
/// honey is capped and uncontaminated.
///
/// # Errors
///
/// Returns [`RunnerError::Clock`] if the run length is zero and
/// [`RunnerError::Colony`] if a stage is configured with zero days.
pub fn build_state(config: &SimulationConfig, seed: u64) -> Result<SimulationState, RunnerError> {
    let clock = SimClock::new(config.run.max_ticks)?;
    let params = config.colony;

    let mut colony = Colony::new(&params.development)?;
    colony.foragers_mut().seed(
        config.population.initial_foragers,
        config.population.initial_forager_span,
    );

    let honey = HoneyStore::with_capped(
        FIRST_OPEN_DAY,
        honey_kg_to_kj(config, config.stores.max_honey_kg),
        honey_kg_to_kj(config, config.stores.initial_honey_kg),
    );
    let pollen = PollenStore::new(config.stores.initial_pollen_g);

    debug!(
        seed,
        foragers = colony.foragers().total(),
        honey_kj = honey.total_energy(),
        pollen_g = pollen.mass(),
        policy = ?config.run.accounting_policy,
        mortality_mode = ?config.run.mortality_mode,
        "Replicate state built"
    );

    Ok(SimulationState {
        clock,
        tracked_honey_kj: honey.total_energy(),
        colony,
        honey,
        pollen,
        fate: ToxicantFate::default(),
        params,
        mortality: MortalityEngine::new(config.run.mortality_mode),
        accountant: ExposureAccountant::new(config.run.accounting_policy, &params),
        laying: config.laying,
        toxicant: config.toxicant,
        rng: SmallRng::seed_from_u64(seed),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn stores_start_full_of_capped_honey() {
        let config = SimulationConfig::default();
        let state = build_state(&config, 7).unwrap();
        let expected = 25.0 * 1000.0 * 12.78;
        assert!((state.honey.total_energy() - expected).abs() < 1e-6);
        assert!((state.tracked_honey_kj - expected).abs() < 1e-6);
        assert!(state.honey.total_toxicant().abs() < 1e-12);
        assert_eq!(state.honey.open_day(), 1);
        assert_eq!(state.clock.tick(), 0);
    }

    #[test]
    fn initial_foragers_are_seeded() {
        let config = SimulationConfig::default();
        let state = build_state(&config, 7).unwrap();
        assert_eq!(state.colony.foragers().total(), 10_000);
        assert_eq!(state.colony.cohorts().total_brood(), 0);
    }

    #[test]
    fn zero_run_length_is_rejected() {
        let mut config = SimulationConfig::default();
        config.run.max_ticks = 0;
        let result = build_state(&config, 7);
        assert!(matches!(result, Err(RunnerError::Clock { .. })));
    }
}
