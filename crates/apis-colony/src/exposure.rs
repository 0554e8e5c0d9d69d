//! Exposure accounting: the daily draw of honey and pollen by every group.
//!
//! # Design
//!
//! Groups are fed one after another in
//! [`PopulationGroup::ACCOUNTING_ORDER`]: foragers, in-hive workers, in-hive
//! drones, worker larvae, drone larvae. Within a group every non-empty age
//! cohort withdraws its own share, so the freshest (and usually most
//! contaminated) honey goes to whoever is fed first. That order is part of
//! the model and never varies between runs.
//!
//! The honey burnt for brood thermoregulation is a single carry. It is added
//! to the first non-empty cohort's withdrawal and then cleared, so it is
//! charged exactly once per tick.
//!
//! Larvae are fed through nurses. Only the filter fractions of the nectar
//! and pollen toxicant reach the larva; the remainder collects in a nurse
//! pool that is spread over the nurse-age in-hive workers once every group
//! has eaten. Without nurses the pool falls back to all in-hive workers,
//! then to foragers, and is otherwise recorded as undelivered.
//!
//! The summed withdrawals are reconciled against the daily totals computed
//! from the aggregate head counts. A mismatch is a fatal
//! [`ColonyError::Reconciliation`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use apis_ledger::conservation::{ConservationResult, verify_draw};
use apis_ledger::{HoneyStore, PollenStore};
use apis_types::{Caste, PopulationGroup, ToxicantFate};

use crate::colony::Colony;
use crate::config::{ColonyParams, NeedsConfig, NursingConfig};
use crate::error::ColonyError;

/// Grams per milligram.
const MG_TO_G: f64 = 0.001;

// ---------------------------------------------------------------------------
// Policy and budgets
// ---------------------------------------------------------------------------

/// How a group's daily draw is sized. Chosen once at setup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountingPolicy {
    /// Each individual draws its per-capita need.
    #[default]
    PerCapita,
    /// Each group draws a total granted by an external allocation, shared
    /// among its cohorts by head count.
    Entitled,
}

/// Honey and pollen for one group or individual.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupBudget {
    /// Honey energy (kJ).
    pub honey_kj: f64,
    /// Pollen mass (g).
    pub pollen_g: f64,
}

impl GroupBudget {
    /// Multiply both quantities by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self {
            honey_kj: self.honey_kj * factor,
            pollen_g: self.pollen_g * factor,
        }
    }

    /// Component-wise sum.
    pub fn plus(self, other: Self) -> Self {
        Self {
            honey_kj: self.honey_kj + other.honey_kj,
            pollen_g: self.pollen_g + other.pollen_g,
        }
    }
}

/// Daily totals granted to each group under [`AccountingPolicy::Entitled`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Entitlements {
    budgets: BTreeMap<PopulationGroup, GroupBudget>,
}

impl Entitlements {
    /// No group is entitled to anything.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant `budget` to `group`, replacing any earlier grant.
    pub fn insert(&mut self, group: PopulationGroup, budget: GroupBudget) {
        self.budgets.insert(group, budget);
    }

    /// The grant of one group; zero if none was made.
    pub fn get(&self, group: PopulationGroup) -> GroupBudget {
        self.budgets.get(&group).copied().unwrap_or_default()
    }

    /// Sum of all grants.
    pub fn total(&self) -> GroupBudget {
        self.budgets
            .values()
            .fold(GroupBudget::default(), |acc, budget| acc.plus(*budget))
    }
}

/// The day's inputs to the accounting pass.
///
/// Every amount is already rationed: when the stores cannot cover demand,
/// the caller scales the rations and the thermoregulation carry before
/// building the plan.
#[derive(Debug, Clone, Copy)]
pub struct DailyPlan<'a> {
    /// The tick being accounted; must be the store's open day.
    pub tick: u64,
    /// Honey burnt for brood thermoregulation (kJ).
    pub thermoregulation_kj: f64,
    /// Fraction of each group's honey need actually drawn.
    pub honey_ration: f64,
    /// Fraction of each group's pollen need actually drawn.
    pub pollen_ration: f64,
    /// Group grants, consulted only under [`AccountingPolicy::Entitled`].
    pub entitlements: &'a Entitlements,
    /// Honey the groups should draw in total, thermoregulation included.
    pub expected_honey_kj: f64,
    /// Pollen the groups should draw in total.
    pub expected_pollen_g: f64,
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Where the nurse pool ended up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NurseRecipient {
    /// No toxicant was retained by nurses this tick.
    #[default]
    Nothing,
    /// Spread over in-hive workers of nurse age.
    Nurses,
    /// No nurse-age workers; spread over every in-hive worker.
    InHiveWorkers,
    /// No in-hive workers; spread over the foragers.
    Foragers,
    /// No adult worker was alive to receive it.
    Undelivered,
}

/// What one group drew and absorbed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupExposure {
    /// The group.
    pub group: PopulationGroup,
    /// Head count at the time of feeding.
    pub individuals: u64,
    /// Honey drawn (kJ).
    pub honey_kj: f64,
    /// Pollen drawn (g).
    pub pollen_g: f64,
    /// Toxicant delivered to the group's individuals (µg).
    pub toxicant_ug: f64,
    /// Mean dose delivered per individual (µg).
    pub mean_dose: f64,
}

impl GroupExposure {
    const fn empty(group: PopulationGroup, individuals: u64) -> Self {
        Self {
            group,
            individuals,
            honey_kj: 0.0,
            pollen_g: 0.0,
            toxicant_ug: 0.0,
            mean_dose: 0.0,
        }
    }
}

/// Outcome of one accounting pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExposureReport {
    /// The accounted tick.
    pub tick: u64,
    /// Per-group draws, in accounting order.
    pub groups: Vec<GroupExposure>,
    /// Honey withdrawn in total (kJ).
    pub honey_drawn_kj: f64,
    /// Pollen consumed in total (g).
    pub pollen_drawn_g: f64,
    /// Toxicant removed from the honey store (µg).
    pub honey_toxicant_ug: f64,
    /// Toxicant removed from the pollen store (µg).
    pub pollen_toxicant_ug: f64,
    /// Group whose first cohort carried the thermoregulation honey.
    pub thermoregulation_group: Option<PopulationGroup>,
    /// Toxicant retained by nurses (µg).
    pub nurse_pool_ug: f64,
    /// Where the nurse pool was delivered.
    pub nurse_recipient: NurseRecipient,
}

impl ExposureReport {
    /// The draw of one group.
    pub fn group(&self, group: PopulationGroup) -> Option<&GroupExposure> {
        self.groups.iter().find(|exposure| exposure.group == group)
    }
}

// ---------------------------------------------------------------------------
// Accountant
// ---------------------------------------------------------------------------

/// Non-empty age slots of `counts` whose age passes `keep`.
fn occupied(counts: &[u32], keep: impl Fn(usize) -> bool) -> Vec<(usize, u32)> {
    counts
        .iter()
        .copied()
        .enumerate()
        .filter(|&(age, count)| count > 0 && keep(age))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
const fn headcount(individuals: u64) -> f64 {
    individuals as f64
}

/// Feeds every group from the stores and routes the toxicant it carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExposureAccountant {
    policy: AccountingPolicy,
    needs: NeedsConfig,
    nursing: NursingConfig,
    filter_nectar: f64,
    filter_pollen: f64,
    worker_larva_days: u32,
}

impl ExposureAccountant {
    /// Create an accountant for the given policy and colony parameters.
    pub const fn new(policy: AccountingPolicy, params: &ColonyParams) -> Self {
        Self {
            policy,
            needs: params.needs,
            nursing: params.nursing,
            filter_nectar: params.toxicity.nurse_filter_nectar,
            filter_pollen: params.toxicity.nurse_filter_pollen,
            worker_larva_days: params.development.worker.larvae,
        }
    }

    /// The policy chosen at setup.
    pub const fn policy(&self) -> AccountingPolicy {
        self.policy
    }

    /// Daily need of one individual of `group`.
    pub fn per_capita(&self, group: PopulationGroup) -> GroupBudget {
        let honey = &self.needs.honey;
        let pollen = &self.needs.pollen;
        let larva_days = f64::from(self.worker_larva_days.max(1));
        let (honey_mg, pollen_mg) = match group {
            PopulationGroup::Foragers | PopulationGroup::InHive(Caste::Worker) => {
                (honey.worker_resting, pollen.worker)
            }
            PopulationGroup::InHive(Caste::Drone) => (honey.drone, pollen.drone),
            PopulationGroup::Larvae(Caste::Worker) => (
                honey.worker_larva_total / larva_days,
                pollen.worker_larva_total / larva_days,
            ),
            PopulationGroup::Larvae(Caste::Drone) => (honey.drone_larva, pollen.drone_larva),
        };
        GroupBudget {
            honey_kj: self.needs.honey_mg_to_kj(honey_mg),
            pollen_g: pollen_mg * MG_TO_G,
        }
    }

    /// Unrationed daily need of a whole group of `individuals`.
    pub fn group_demand(
        &self,
        group: PopulationGroup,
        individuals: u64,
        entitlements: &Entitlements,
    ) -> GroupBudget {
        if individuals == 0 {
            return GroupBudget::default();
        }
        match self.policy {
            AccountingPolicy::PerCapita => self.per_capita(group).scaled(headcount(individuals)),
            AccountingPolicy::Entitled => entitlements.get(group),
        }
    }

    /// Feed every group for one tick.
    ///
    /// Withdrawals go through the stores, delivered doses are added to the
    /// colony's pending doses and every microgram is credited in `fate`.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::Store`] if a withdrawal is rejected by a store,
    /// [`ColonyError::AgeOutOfRange`] if a dose cannot be recorded against
    /// the cohort that drew it, and [`ColonyError::Reconciliation`] if the
    /// summed draws disagree with the plan's totals or toxicant was lost in
    /// routing.
    pub fn account(
        &self,
        plan: &DailyPlan<'_>,
        colony: &mut Colony,
        honey: &mut HoneyStore,
        pollen: &mut PollenStore,
        fate: &mut ToxicantFate,
    ) -> Result<ExposureReport, ColonyError> {
        let mut report = ExposureReport {
            tick: plan.tick,
            ..ExposureReport::default()
        };
        let honey_held = honey.total_energy();
        let pollen_held = pollen.mass();
        let toxicant_held = honey.total_toxicant() + pollen.toxicant();
        let mut thermoregulation = plan.thermoregulation_kj;
        let mut nurse_pool = 0.0;
        let mut delivered_total = 0.0;

        for group in PopulationGroup::ACCOUNTING_ORDER {
            let counts = colony.group_counts(group).to_vec();
            let individuals: u64 = counts.iter().map(|&c| u64::from(c)).sum();
            let mut exposure = GroupExposure::empty(group, individuals);
            if individuals == 0 {
                report.groups.push(exposure);
                continue;
            }
            let per_capita = match self.policy {
                AccountingPolicy::PerCapita => self.per_capita(group),
                AccountingPolicy::Entitled => plan
                    .entitlements
                    .get(group)
                    .scaled(1.0 / headcount(individuals)),
            };

            for (age, &count) in counts.iter().enumerate() {
                if count == 0 {
                    continue;
                }
                let share = f64::from(count);
                let mut honey_kj = per_capita.honey_kj * share * plan.honey_ration;
                let pollen_g = per_capita.pollen_g * share * plan.pollen_ration;
                if thermoregulation > 0.0 {
                    honey_kj += thermoregulation;
                    thermoregulation = 0.0;
                    report.thermoregulation_group = Some(group);
                }

                let store_error = |source| ColonyError::Store {
                    tick: plan.tick,
                    group,
                    source,
                };
                let drawn = honey
                    .withdraw(plan.tick, honey_kj, count)
                    .map_err(store_error)?;
                let eaten = pollen.consume(plan.tick, pollen_g).map_err(store_error)?;
                let pollen_dose = eaten.toxicant / share;

                let (dose, retained) = if group.is_larval() {
                    (
                        self.filter_nectar
                            .mul_add(drawn.dose, self.filter_pollen * pollen_dose),
                        (1.0 - self.filter_nectar)
                            .mul_add(drawn.toxicant, (1.0 - self.filter_pollen) * eaten.toxicant),
                    )
                } else {
                    (drawn.dose + pollen_dose, 0.0)
                };
                colony.add_dose(group, age, dose)?;
                nurse_pool += retained;

                let delivered = dose * share;
                fate.record_ingestion(group, delivered);
                delivered_total += delivered;

                exposure.honey_kj += drawn.energy;
                exposure.pollen_g += eaten.mass;
                exposure.toxicant_ug += delivered;
                report.honey_drawn_kj += drawn.energy;
                report.pollen_drawn_g += eaten.mass;
                report.honey_toxicant_ug += drawn.toxicant;
                report.pollen_toxicant_ug += eaten.toxicant;
            }

            exposure.mean_dose = exposure.toxicant_ug / headcount(individuals);
            debug!(
                tick = plan.tick,
                %group,
                individuals,
                honey_kj = exposure.honey_kj,
                pollen_g = exposure.pollen_g,
                mean_dose = exposure.mean_dose,
                "Group fed"
            );
            report.groups.push(exposure);
        }

        report.nurse_pool_ug = nurse_pool;
        report.nurse_recipient =
            self.distribute_nurse_pool(plan.tick, colony, nurse_pool, fate)?;

        let checks = [
            (
                "honey draw",
                plan.expected_honey_kj,
                report.honey_drawn_kj,
                honey_held,
            ),
            (
                "pollen draw",
                plan.expected_pollen_g,
                report.pollen_drawn_g,
                pollen_held,
            ),
            (
                "toxicant routing",
                report.honey_toxicant_ug + report.pollen_toxicant_ug,
                delivered_total + nurse_pool,
                toxicant_held,
            ),
        ];
        for (quantity, expected, actual, held) in checks {
            if let ConservationResult::Anomaly(anomaly) =
                verify_draw(plan.tick, quantity, expected, actual, held)
            {
                return Err(ColonyError::Reconciliation { anomaly });
            }
        }
        Ok(report)
    }

    /// Spread the toxicant retained by nurses over the adult workers.
    fn distribute_nurse_pool(
        &self,
        tick: u64,
        colony: &mut Colony,
        pool: f64,
        fate: &mut ToxicantFate,
    ) -> Result<NurseRecipient, ColonyError> {
        if pool <= 0.0 {
            return Ok(NurseRecipient::Nothing);
        }
        let in_hive = PopulationGroup::InHive(Caste::Worker);
        let window = self.nursing.nurse_age_min as usize..=self.nursing.nurse_age_max as usize;

        let in_hive_counts = colony.group_counts(in_hive);
        let nurses = occupied(in_hive_counts, |age| window.contains(&age));
        let (group, recipients, recipient) = if nurses.is_empty() {
            let workers = occupied(in_hive_counts, |_| true);
            if workers.is_empty() {
                let foragers = occupied(colony.group_counts(PopulationGroup::Foragers), |_| true);
                if foragers.is_empty() {
                    fate.undelivered += pool;
                    warn!(tick, pool, "No adult workers to receive nurse-retained toxicant");
                    return Ok(NurseRecipient::Undelivered);
                }
                (PopulationGroup::Foragers, foragers, NurseRecipient::Foragers)
            } else {
                (in_hive, workers, NurseRecipient::InHiveWorkers)
            }
        } else {
            (in_hive, nurses, NurseRecipient::Nurses)
        };

        let individuals: f64 = recipients.iter().map(|&(_, count)| f64::from(count)).sum();
        let dose = pool / individuals;
        for &(age, _) in &recipients {
            colony.add_dose(group, age, dose)?;
        }
        fate.nurse_retained += pool;
        debug!(tick, pool, dose, ?recipient, "Nurse pool distributed");
        Ok(recipient)
    }
}
