//! Daily honey and pollen consumption totals.
//!
//! Totals are computed from aggregate head counts, independently of the
//! accountant's per-cohort loop, and are what the accountant's withdrawals
//! are reconciled against. Honey for brood thermoregulation is charged per
//! brood cell:
//!
//! ```text
//! thermo = (worker_nurse - worker_resting) / max_brood_nurse_ratio    (mg per brood)
//! ```
//!
//! and is zero once no adult worker is left to warm the brood.
//!
//! When the stores cannot cover the day's totals every draw is scaled by
//! the same ration `available / need`, so no withdrawal ever exceeds what is
//! stored.

use apis_colony::{
    AccountingPolicy, Colony, ColonyParams, DailyPlan, Entitlements, ExposureAccountant,
    GroupBudget,
};
use apis_types::{Caste, PopulationGroup};

/// Unrationed needs of the whole colony for one day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DailyDemand {
    /// Honey eaten by the groups (kJ).
    pub honey_kj: f64,
    /// Honey burnt warming the brood (kJ).
    pub thermoregulation_kj: f64,
    /// Pollen eaten by the groups (g).
    pub pollen_g: f64,
}

/// Fractions of the day's needs the stores can cover.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rations {
    /// Share of the honey need drawn, in `[0, 1]`.
    pub honey: f64,
    /// Share of the pollen need drawn, in `[0, 1]`.
    pub pollen: f64,
}

impl Rations {
    /// Every need is covered in full.
    pub const FULL: Self = Self {
        honey: 1.0,
        pollen: 1.0,
    };

    /// Returns `true` if honey could not cover the day's need.
    pub fn honey_short(&self) -> bool {
        self.honey < 1.0
    }
}

impl DailyDemand {
    /// Honey needed in total, thermoregulation included (kJ).
    pub fn total_honey_kj(&self) -> f64 {
        self.honey_kj + self.thermoregulation_kj
    }

    /// Rations given what the stores hold.
    pub fn rations(&self, honey_available_kj: f64, pollen_available_g: f64) -> Rations {
        Rations {
            honey: ration(self.total_honey_kj(), honey_available_kj),
            pollen: ration(self.pollen_g, pollen_available_g),
        }
    }

    /// The accounting plan for `tick` under the given rations.
    pub fn plan<'a>(
        &self,
        tick: u64,
        rations: Rations,
        entitlements: &'a Entitlements,
    ) -> DailyPlan<'a> {
        DailyPlan {
            tick,
            thermoregulation_kj: self.thermoregulation_kj * rations.honey,
            honey_ration: rations.honey,
            pollen_ration: rations.pollen,
            entitlements,
            expected_honey_kj: self.total_honey_kj() * rations.honey,
            expected_pollen_g: self.pollen_g * rations.pollen,
        }
    }
}

fn ration(need: f64, available: f64) -> f64 {
    if need <= available || need <= 0.0 {
        1.0
    } else {
        (available.max(0.0) / need).clamp(0.0, 1.0)
    }
}

/// Thermoregulation honey per brood cell (mg), zero without adult workers.
pub fn thermoregulation_per_brood_mg(params: &ColonyParams, adult_workers: u64) -> f64 {
    if adult_workers == 0 {
        return 0.0;
    }
    let honey = &params.needs.honey;
    (honey.worker_nurse - honey.worker_resting) / params.nursing.max_brood_nurse_ratio
}

/// Colony-wide daily need from aggregate head counts.
///
/// Adult workers (in-hive and foragers) eat at the resting rate, worker
/// larvae spread their total need over the larval stage, drones and drone
/// larvae eat their daily rates.
pub fn colony_needs(params: &ColonyParams, colony: &Colony) -> GroupBudget {
    let workers = colony.caste_counts(Caste::Worker);
    let drones = colony.caste_counts(Caste::Drone);
    let adult_workers =
        crate::count_to_f64(workers.in_hive.saturating_add(colony.foragers().total()));
    let worker_larvae = crate::count_to_f64(workers.larvae);
    let adult_drones = crate::count_to_f64(drones.in_hive);
    let drone_larvae = crate::count_to_f64(drones.larvae);
    let larva_days = f64::from(params.development.worker.larvae.max(1));

    let honey = &params.needs.honey;
    let pollen = &params.needs.pollen;
    let honey_mg = adult_workers * honey.worker_resting
        + adult_drones * honey.drone
        + worker_larvae * honey.worker_larva_total / larva_days
        + drone_larvae * honey.drone_larva;
    let pollen_mg = adult_workers * pollen.worker
        + adult_drones * pollen.drone
        + worker_larvae * pollen.worker_larva_total / larva_days
        + drone_larvae * pollen.drone_larva;
    GroupBudget {
        honey_kj: params.needs.honey_mg_to_kj(honey_mg),
        pollen_g: pollen_mg * 0.001,
    }
}

/// The colony's unrationed needs for one day.
///
/// Under [`AccountingPolicy::PerCapita`] the totals come from
/// [`colony_needs`]; under [`AccountingPolicy::Entitled`] they are the sum
/// of the grants to groups that have members.
pub fn daily_demand(
    accountant: &ExposureAccountant,
    colony: &Colony,
    params: &ColonyParams,
    entitlements: &Entitlements,
) -> DailyDemand {
    let groups = match accountant.policy() {
        AccountingPolicy::PerCapita => colony_needs(params, colony),
        AccountingPolicy::Entitled => PopulationGroup::ACCOUNTING_ORDER
            .into_iter()
            .filter(|&group| colony.group_counts(group).iter().any(|&count| count > 0))
            .fold(GroupBudget::default(), |total, group| {
                total.plus(entitlements.get(group))
            }),
    };

    let adult_workers = colony
        .caste_counts(Caste::Worker)
        .in_hive
        .saturating_add(colony.foragers().total());
    let brood = colony.cohorts().total_brood();
    let thermo_mg =
        thermoregulation_per_brood_mg(params, adult_workers) * crate::count_to_f64(brood);

    DailyDemand {
        honey_kj: groups.honey_kj,
        thermoregulation_kj: params.needs.honey_mg_to_kj(thermo_mg),
        pollen_g: groups.pollen_g,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;
    use apis_ledger::{HoneyStore, PollenStore};
    use apis_types::{Stage, ToxicantFate};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    fn small_colony(params: &ColonyParams) -> Colony {
        let mut colony = Colony::new(&params.development).unwrap();
        let workers = colony.cohorts_mut().caste_mut(Caste::Worker);
        workers.stage_mut(Stage::InHive).add(3, 200);
        workers.stage_mut(Stage::Larva).add(1, 60);
        workers.stage_mut(Stage::Egg).add(0, 40);
        colony
            .cohorts_mut()
            .caste_mut(Caste::Drone)
            .stage_mut(Stage::InHive)
            .add(2, 10);
        colony.foragers_mut().seed(100, 10);
        colony
    }

    #[test]
    fn honey_total_follows_population_formula() {
        let params = ColonyParams::default();
        let accountant = ExposureAccountant::new(AccountingPolicy::PerCapita, &params);
        let colony = small_colony(&params);
        let demand = daily_demand(&accountant, &colony, &params, &Entitlements::new());

        let honey = &params.needs.honey;
        let thermo = (honey.worker_nurse - honey.worker_resting) / 3.0;
        let mg = 300.0 * honey.worker_resting
            + 10.0 * honey.drone
            + 60.0 * honey.worker_larva_total / 6.0
            + 100.0 * thermo;
        let expected_kj = mg * 0.001 * 12.78;
        assert!(close(demand.total_honey_kj(), expected_kj));

        let pollen = &params.needs.pollen;
        let pollen_mg =
            300.0 * pollen.worker + 10.0 * pollen.drone + 60.0 * pollen.worker_larva_total / 6.0;
        assert!(close(demand.pollen_g, pollen_mg * 0.001));
    }

    #[test]
    fn accountant_with_other_needs_fails_reconciliation() {
        let params = ColonyParams::default();
        let colony = small_colony(&params);
        let entitlements = Entitlements::new();
        let demand = daily_demand(
            &ExposureAccountant::new(AccountingPolicy::PerCapita, &params),
            &colony,
            &params,
            &entitlements,
        );
        let plan = demand.plan(1, Rations::FULL, &entitlements);

        let mut hungry = params;
        hungry.needs.honey.worker_resting *= 2.0;
        let accountant = ExposureAccountant::new(AccountingPolicy::PerCapita, &hungry);
        let mut colony = colony;
        let mut honey = HoneyStore::with_capped(1, 1e6, 1e5);
        let mut pollen = PollenStore::new(1e4);
        let mut fate = ToxicantFate::default();
        let result = accountant.account(&plan, &mut colony, &mut honey, &mut pollen, &mut fate);
        assert!(matches!(
            result,
            Err(apis_colony::ColonyError::Reconciliation { .. })
        ));

        // The matching accountant reconciles against the same plan.
        let accountant = ExposureAccountant::new(AccountingPolicy::PerCapita, &params);
        let mut colony = small_colony(&params);
        let mut honey = HoneyStore::with_capped(1, 1e6, 1e5);
        let mut pollen = PollenStore::new(1e4);
        let result = accountant.account(&plan, &mut colony, &mut honey, &mut pollen, &mut fate);
        assert!(result.is_ok());
    }

    #[test]
    fn entitled_demand_sums_grants_to_occupied_groups() {
        let params = ColonyParams::default();
        let accountant = ExposureAccountant::new(AccountingPolicy::Entitled, &params);
        let colony = small_colony(&params);
        let mut entitlements = Entitlements::new();
        let grant = GroupBudget {
            honey_kj: 2.0,
            pollen_g: 0.5,
        };
        entitlements.insert(PopulationGroup::Foragers, grant);
        entitlements.insert(PopulationGroup::Larvae(Caste::Drone), grant);

        let demand = daily_demand(&accountant, &colony, &params, &entitlements);
        // No drone larvae, so only the forager grant counts.
        assert!(close(demand.honey_kj, 2.0));
        assert!(close(demand.pollen_g, 0.5));
    }

    #[test]
    fn no_thermoregulation_without_adult_workers() {
        let params = ColonyParams::default();
        assert_eq!(thermoregulation_per_brood_mg(&params, 0), 0.0);
        assert!(thermoregulation_per_brood_mg(&params, 1) > 0.0);
    }

    #[test]
    fn rations_cap_draws_at_store_contents() {
        let demand = DailyDemand {
            honey_kj: 80.0,
            thermoregulation_kj: 20.0,
            pollen_g: 4.0,
        };
        assert_eq!(demand.rations(1_000.0, 10.0), Rations::FULL);

        let rations = demand.rations(25.0, 1.0);
        assert!(close(rations.honey, 0.25));
        assert!(close(rations.pollen, 0.25));
        assert!(rations.honey_short());

        let entitlements = Entitlements::new();
        let plan = demand.plan(3, rations, &entitlements);
        assert!(close(plan.expected_honey_kj, 25.0));
        assert!(close(plan.thermoregulation_kj, 5.0));
        assert!(close(plan.expected_pollen_g, 1.0));
    }

    #[test]
    fn zero_need_is_fully_rationed() {
        let demand = DailyDemand::default();
        assert_eq!(demand.rations(0.0, 0.0), Rations::FULL);
    }
}
