//! Tick cycle: one simulated day of the colony.
//!
//! Each tick runs these phases in a fixed order:
//!
//! 1. **Clock** -- advance to the next day.
//! 2. **Laying** -- the queen lays the day's eggs into the free comb.
//! 3. **Aging** -- every cohort shifts one day; graduates become foragers.
//! 4. **Mortality** -- background and dose deaths, assessed on the doses
//!    taken up during the previous tick.
//! 5. **Foraging** -- the [`ForagingSource`] deposits nectar into `day0`,
//!    pollen into the pollen store and contact doses onto the foragers.
//! 6. **Consumption** -- daily totals from head counts, rationed to what the
//!    stores hold; under the entitled policy an [`EntitlementSource`] sizes
//!    each group's draw.
//! 7. **Exposure** -- the [`ExposureAccountant`] feeds every group and
//!    records this tick's doses.
//! 8. **Store aging** -- optional toxicant degradation, then the honey
//!    layers advance and the next day opens.
//! 9. **Invariants** -- honey energy and honey toxicant must balance.
//!
//! Any failure aborts the tick with a [`TickError`] carrying the tick
//! number. Nothing is corrected or retried.
//!
//! [`ExposureAccountant`]: apis_colony::ExposureAccountant

use rand::rngs::SmallRng;
use tracing::{debug, info};

use apis_colony::{
    AccountingPolicy, Colony, ColonyError, ColonyParams, Entitlements, ExposureAccountant,
    ExposureReport, MortalityEngine, MortalityReport,
};
use apis_ledger::conservation::{self, ConservationResult, ToxicantFlows};
use apis_ledger::{DepositBuilder, HoneyStore, PollenStore, StoreAnomaly, StoreError};
use apis_types::{Caste, ColonySnapshot, PopulationGroup, ToxicantFate};

use crate::clock::{ClockError, SimClock};
use crate::config::{LayingConfig, ToxicantConfig};
use crate::consumption::{self, Rations};
use crate::entitlement::{EntitlementContext, EntitlementSource};
use crate::foraging::{ForagingContext, ForagingSource};
use crate::laying;

/// Errors that can occur during tick execution.
#[derive(Debug, thiserror::Error)]
pub enum TickError {
    /// A clock operation failed.
    #[error("clock error: {source}")]
    Clock {
        /// The underlying clock error.
        #[from]
        source: ClockError,
    },

    /// A colony operation failed.
    #[error("colony error at tick {tick}: {source}")]
    Colony {
        /// Tick of the failure.
        tick: u64,
        /// The underlying colony error.
        source: ColonyError,
    },

    /// A store rejected a deposit, degradation or advance.
    #[error("store error at tick {tick}: {source}")]
    Store {
        /// Tick of the failure.
        tick: u64,
        /// The underlying store error.
        source: StoreError,
    },

    /// An end-of-tick conservation check failed.
    #[error("conservation violated: {anomaly}")]
    Conservation {
        /// Details of the violation.
        anomaly: StoreAnomaly,
    },
}

/// Summary of a single tick's execution.
#[derive(Debug, Clone)]
pub struct TickSummary {
    /// The tick number that was executed.
    pub tick: u64,
    /// Zero-based day of year of the tick.
    pub day_of_year: u64,
    /// Worker and drone eggs laid.
    pub eggs: u32,
    /// Workers recruited into the forager pool.
    pub recruited: u32,
    /// Foragers that died of age.
    pub retired_foragers: u32,
    /// Deaths by group and cause.
    pub deaths: MortalityReport,
    /// Nectar energy accepted by the honey store (kJ).
    pub nectar_accepted_kj: f64,
    /// Pollen added to the pollen store (g).
    pub pollen_deposited_g: f64,
    /// Toxicant absorbed by foragers in flight (µg).
    pub contact_ug: f64,
    /// Share of the day's needs the stores covered.
    pub rations: Rations,
    /// What every group ate and the toxicant it took up.
    pub exposure: ExposureReport,
    /// Living bees at end of tick, brood included.
    pub population: u64,
    /// Honey could not cover the day's need.
    pub starved: bool,
    /// End-of-tick state.
    pub snapshot: ColonySnapshot,
}

/// The mutable simulation state passed through the tick cycle.
///
/// One replicate owns exactly one state; nothing in it is shared.
#[derive(Debug)]
pub struct SimulationState {
    /// The simulation clock.
    pub clock: SimClock,
    /// Cohorts, doses and foragers.
    pub colony: Colony,
    /// The layered honey store.
    pub honey: HoneyStore,
    /// The pollen store.
    pub pollen: PollenStore,
    /// Honey energy expected in the store, updated from flows (kJ).
    pub tracked_honey_kj: f64,
    /// Where every microgram of toxicant went.
    pub fate: ToxicantFate,
    /// Biological parameters.
    pub params: ColonyParams,
    /// Mortality mode chosen at setup.
    pub mortality: MortalityEngine,
    /// Feeding and toxicant routing.
    pub accountant: ExposureAccountant,
    /// Queen egg laying.
    pub laying: LayingConfig,
    /// In-hive toxicant fate settings.
    pub toxicant: ToxicantConfig,
    /// The replicate's random number generator.
    pub rng: SmallRng,
}

impl SimulationState {
    /// Capture the colony and stores as of now.
    pub fn snapshot(&self) -> ColonySnapshot {
        let tick = self.clock.tick();
        ColonySnapshot {
            tick,
            day_of_year: self.clock.day_of_year(),
            workers: self.colony.caste_counts(Caste::Worker),
            drones: self.colony.caste_counts(Caste::Drone),
            foragers: self.colony.foragers().total(),
            honey_kj: self.honey.total_energy(),
            honey_layers: self.honey.snapshot(),
            pollen_g: self.pollen.mass(),
            pollen_concentration: self.pollen.concentration(),
            honey_toxicant_ug: self.honey.total_toxicant(),
            mean_doses: PopulationGroup::ACCOUNTING_ORDER
                .into_iter()
                .map(|group| (group, self.colony.mean_dose(group)))
                .collect(),
        }
    }
}

/// Execute a single tick of the simulation.
///
/// # Errors
///
/// Returns [`TickError`] if the clock overflows, a store rejects an
/// operation, the accountant fails to reconcile its draws, or the stores
/// fail their end-of-tick conservation checks.
pub fn run_tick(
    state: &mut SimulationState,
    foraging: &mut dyn ForagingSource,
    entitlements: &mut dyn EntitlementSource,
) -> Result<TickSummary, TickError> {
    // --- Clock ---
    let tick = state.clock.advance()?;
    let day_of_year = state.clock.day_of_year();
    let store_error = |source| TickError::Store { tick, source };
    let colony_error = |source| TickError::Colony { tick, source };

    // --- Laying and aging ---
    let brood = state.colony.cohorts().total_brood();
    let eggs = laying::lay_eggs(&state.laying, day_of_year, brood);
    let aging = state.colony.age(eggs);

    // --- Mortality ---
    let deaths = state.colony.apply_mortality(
        state.mortality,
        &state.params,
        &aging,
        &mut state.rng,
    );

    // --- Foraging ---
    let mut flows = ToxicantFlows {
        before: state.honey.total_toxicant(),
        ..ToxicantFlows::default()
    };
    let returns = foraging.forage(&ForagingContext {
        tick,
        day_of_year,
        year: state.clock.year(),
        foragers: state.colony.foragers().total(),
    });

    let nectar = DepositBuilder::new(tick)
        .amount(returns.nectar_kj)
        .concentration(returns.nectar_concentration)
        .nectar()
        .map_err(store_error)?;
    let nectar_accepted_kj = state.honey.deposit(&nectar).map_err(store_error)?;
    flows.deposited = nectar_accepted_kj * nectar.concentration;
    state.tracked_honey_kj += nectar_accepted_kj;
    state.fate.deposited_honey += flows.deposited;

    let pollen = DepositBuilder::new(tick)
        .amount(returns.pollen_g)
        .concentration(returns.pollen_concentration)
        .pollen()
        .map_err(store_error)?;
    state.pollen.deposit(&pollen);
    state.fate.deposited_pollen += pollen.toxicant();

    let contact_ug = if returns.contact_dose > 0.0 {
        state.colony.foragers_mut().expose_contact(returns.contact_dose)
    } else {
        0.0
    };
    state.fate.flight_contact += contact_ug;

    // --- Consumption ---
    let grants = match state.accountant.policy() {
        AccountingPolicy::Entitled => entitlements.entitlements(&EntitlementContext {
            tick,
            colony: &state.colony,
            accountant: &state.accountant,
        }),
        AccountingPolicy::PerCapita => Entitlements::new(),
    };
    let demand =
        consumption::daily_demand(&state.accountant, &state.colony, &state.params, &grants);
    let rations = demand.rations(state.honey.total_energy(), state.pollen.mass());
    let plan = demand.plan(tick, rations, &grants);
    state.tracked_honey_kj -= plan.expected_honey_kj;

    // --- Exposure ---
    let exposure = state
        .accountant
        .account(
            &plan,
            &mut state.colony,
            &mut state.honey,
            &mut state.pollen,
            &mut state.fate,
        )
        .map_err(colony_error)?;
    flows.withdrawn = exposure.honey_toxicant_ug;

    // --- Store aging ---
    if state.toxicant.honey_degradation {
        flows.degraded = state
            .honey
            .degrade(state.toxicant.honey_dt50_days)
            .map_err(store_error)?;
        state.fate.degraded_honey += flows.degraded;
    }
    state.honey.advance(tick).map_err(store_error)?;

    // --- Invariants ---
    let checks = [
        conservation::verify_honey_balance(tick, &state.honey, state.tracked_honey_kj),
        conservation::verify_toxicant_balance(tick, &flows, &state.honey),
    ];
    for check in checks {
        if let ConservationResult::Anomaly(anomaly) = check {
            return Err(TickError::Conservation { anomaly });
        }
    }

    let population = state.colony.total_population();
    let starved = rations.honey_short();
    let summary = TickSummary {
        tick,
        day_of_year,
        eggs: eggs.worker.saturating_add(eggs.drone),
        recruited: aging.workers.graduated,
        retired_foragers: aging.retired_foragers,
        deaths,
        nectar_accepted_kj,
        pollen_deposited_g: pollen.mass_g,
        contact_ug,
        rations,
        exposure,
        population,
        starved,
        snapshot: state.snapshot(),
    };

    debug!(
        tick,
        day_of_year,
        eggs = summary.eggs,
        deaths = summary.deaths.total(),
        honey_kj = summary.snapshot.honey_kj,
        pollen_g = summary.snapshot.pollen_g,
        population,
        "Tick complete"
    );
    if starved {
        info!(tick, honey_ration = rations.honey, "Honey stores exhausted");
    }
    Ok(summary)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::config::SimulationConfig;
    use crate::entitlement::NurseCapacityEntitlements;
    use crate::foraging::{ForagingYield, ScheduledForaging};
    use crate::setup;

    /// Delivers the same returns every day.
    struct FixedForaging(ForagingYield);

    impl ForagingSource for FixedForaging {
        fn forage(&mut self, _ctx: &ForagingContext) -> ForagingYield {
            self.0
        }
    }

    fn state(config: &SimulationConfig) -> SimulationState {
        setup::build_state(config, config.run.seed).unwrap()
    }

    fn sources(config: &SimulationConfig) -> (ScheduledForaging, NurseCapacityEntitlements) {
        (
            ScheduledForaging::new(config.foraging, config.toxicant.application),
            NurseCapacityEntitlements::new(config.colony.nursing),
        )
    }

    #[test]
    fn tick_advances_clock_and_opens_next_day() {
        let config = SimulationConfig::default();
        let mut state = state(&config);
        let (mut foraging, mut grants) = sources(&config);

        let summary = run_tick(&mut state, &mut foraging, &mut grants).unwrap();
        assert_eq!(summary.tick, 1);
        assert_eq!(summary.day_of_year, 0);
        assert_eq!(state.honey.open_day(), 2);
        assert!(!summary.starved);
    }

    #[test]
    fn tracked_honey_matches_store() {
        let config = SimulationConfig::default();
        let mut state = state(&config);
        let (mut foraging, mut grants) = sources(&config);

        for _ in 0..30 {
            run_tick(&mut state, &mut foraging, &mut grants).unwrap();
        }
        let relative = (state.tracked_honey_kj - state.honey.total_energy()).abs()
            / state.honey.total_energy().max(1.0);
        assert!(relative < 1e-3);
    }

    #[test]
    fn contaminated_nectar_reaches_the_colony() {
        let config = SimulationConfig::default();
        let mut state = state(&config);
        let (_, mut grants) = sources(&config);
        let mut foraging = FixedForaging(ForagingYield {
            nectar_kj: 500.0,
            nectar_concentration: 2.0,
            pollen_g: 20.0,
            pollen_concentration: 1.0,
            contact_dose: 0.01,
        });

        let summary = run_tick(&mut state, &mut foraging, &mut grants).unwrap();
        assert!((state.fate.deposited_honey - 1_000.0).abs() < 1e-9);
        assert!((state.fate.deposited_pollen - 20.0).abs() < 1e-9);
        assert!(summary.contact_ug > 0.0);
        // Fresh nectar is drained first, so the day's draw is contaminated.
        assert!(summary.exposure.honey_toxicant_ug > 0.0);
        assert!(state.fate.total_ingested() > 0.0);
    }

    #[test]
    fn empty_stores_report_starvation() {
        let mut config = SimulationConfig::default();
        config.stores.initial_honey_kg = 0.0;
        config.stores.initial_pollen_g = 0.0;
        let mut state = state(&config);
        let (mut foraging, mut grants) = sources(&config);

        let summary = run_tick(&mut state, &mut foraging, &mut grants).unwrap();
        assert!(summary.starved);
        assert_eq!(summary.rations.honey, 0.0);
        assert_eq!(summary.exposure.honey_drawn_kj, 0.0);
    }

    #[test]
    fn entitled_policy_consults_the_source() {
        struct Counting(u32);

        impl EntitlementSource for Counting {
            fn entitlements(&mut self, _ctx: &EntitlementContext<'_>) -> Entitlements {
                self.0 += 1;
                Entitlements::new()
            }
        }

        let mut config = SimulationConfig::default();
        config.run.accounting_policy = AccountingPolicy::Entitled;
        let mut state = state(&config);
        let (mut foraging, _) = sources(&config);
        let mut grants = Counting(0);

        let summary = run_tick(&mut state, &mut foraging, &mut grants).unwrap();
        assert_eq!(grants.0, 1);
        // Nothing granted: only brood warming draws honey, and no pollen is eaten.
        assert_eq!(summary.exposure.pollen_drawn_g, 0.0);
        let thermo = summary.exposure.thermoregulation_group.is_some();
        assert_eq!(summary.exposure.honey_drawn_kj > 0.0, thermo);
    }
}
