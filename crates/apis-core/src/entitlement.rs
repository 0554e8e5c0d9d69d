//! Entitlement source trait and the nurse-capacity stand-in.
//!
//! Under [`AccountingPolicy::Entitled`] each group draws the daily total an
//! external brood-care model grants it instead of its per-capita need. The
//! tick cycle asks an [`EntitlementSource`] for those grants once per tick,
//! after mortality and before the consumption totals are computed.
//!
//! [`NurseCapacityEntitlements`] is the stand-in shipped with the engine.
//! Adults are granted their per-capita need. Larvae are granted theirs
//! scaled down when the nurse workforce cannot care for all of them:
//!
//! ```text
//! capacity = (nurses + foragers * forager_nursing_contribution) * max_brood_nurse_ratio
//! factor   = min(1, capacity / larvae)
//! ```
//!
//! [`AccountingPolicy::Entitled`]: apis_colony::AccountingPolicy::Entitled

use tracing::debug;

use apis_colony::{Colony, Entitlements, ExposureAccountant, NursingConfig};
use apis_types::{Caste, PopulationGroup};

/// What the tick cycle tells the entitlement source.
#[derive(Debug, Clone, Copy)]
pub struct EntitlementContext<'a> {
    /// The current tick.
    pub tick: u64,
    /// The colony after mortality.
    pub colony: &'a Colony,
    /// Per-capita needs of every group.
    pub accountant: &'a ExposureAccountant,
}

/// A source of daily group entitlements.
pub trait EntitlementSource: Send {
    /// Grant each group its daily honey and pollen.
    fn entitlements(&mut self, ctx: &EntitlementContext<'_>) -> Entitlements;
}

/// Grants limited by the nurse workforce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NurseCapacityEntitlements {
    nursing: NursingConfig,
}

impl NurseCapacityEntitlements {
    /// Create a source using the given nurse workforce parameters.
    pub const fn new(nursing: NursingConfig) -> Self {
        Self { nursing }
    }

    /// Share of the larvae the workforce can feed, in `[0, 1]`.
    pub fn care_factor(&self, colony: &Colony) -> f64 {
        let larvae: u64 = Caste::ALL
            .into_iter()
            .map(|caste| group_size(colony, PopulationGroup::Larvae(caste)))
            .sum();
        if larvae == 0 {
            return 1.0;
        }
        let window = self.nursing.nurse_age_min as usize..=self.nursing.nurse_age_max as usize;
        let nurses: u64 = colony
            .group_counts(PopulationGroup::InHive(Caste::Worker))
            .iter()
            .enumerate()
            .filter(|(age, _)| window.contains(age))
            .map(|(_, &count)| u64::from(count))
            .sum();
        let foragers = colony.foragers().total();
        let workforce = crate::count_to_f64(foragers)
            .mul_add(self.nursing.forager_nursing_contribution, crate::count_to_f64(nurses));
        let capacity = workforce * self.nursing.max_brood_nurse_ratio;
        (capacity / crate::count_to_f64(larvae)).clamp(0.0, 1.0)
    }
}

fn group_size(colony: &Colony, group: PopulationGroup) -> u64 {
    colony
        .group_counts(group)
        .iter()
        .map(|&count| u64::from(count))
        .sum()
}

impl EntitlementSource for NurseCapacityEntitlements {
    fn entitlements(&mut self, ctx: &EntitlementContext<'_>) -> Entitlements {
        let care = self.care_factor(ctx.colony);
        let mut grants = Entitlements::new();
        for group in PopulationGroup::ACCOUNTING_ORDER {
            let individuals = group_size(ctx.colony, group);
            let need = ctx
                .accountant
                .per_capita(group)
                .scaled(crate::count_to_f64(individuals));
            let grant = if group.is_larval() {
                need.scaled(care)
            } else {
                need
            };
            grants.insert(group, grant);
        }
        debug!(tick = ctx.tick, care, "Entitlements granted");
        grants
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use apis_colony::{AccountingPolicy, ColonyParams};
    use apis_types::Stage;

    fn colony_with(nurses: u32, foragers: u32, larvae: u32) -> (Colony, ColonyParams) {
        let params = ColonyParams::default();
        let mut colony = Colony::new(&params.development).unwrap();
        colony
            .cohorts_mut()
            .caste_mut(Caste::Worker)
            .stage_mut(Stage::InHive)
            .add(5, nurses);
        colony
            .cohorts_mut()
            .caste_mut(Caste::Worker)
            .stage_mut(Stage::Larva)
            .add(2, larvae);
        colony.foragers_mut().seed(foragers, 1);
        (colony, params)
    }

    #[test]
    fn ample_nurses_grant_full_need() {
        let (colony, params) = colony_with(1_000, 0, 100);
        let source = NurseCapacityEntitlements::new(params.nursing);
        assert!((source.care_factor(&colony) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn scarce_nurses_scale_larval_grants() {
        let (colony, params) = colony_with(100, 500, 1_200);
        let accountant = ExposureAccountant::new(AccountingPolicy::Entitled, &params);
        let mut source = NurseCapacityEntitlements::new(params.nursing);

        // (100 + 500 * 0.2) * 3 = 600 of 1200 larvae.
        assert!((source.care_factor(&colony) - 0.5).abs() < 1e-12);

        let grants = source.entitlements(&EntitlementContext {
            tick: 1,
            colony: &colony,
            accountant: &accountant,
        });
        let larvae = PopulationGroup::Larvae(Caste::Worker);
        let full = accountant.per_capita(larvae).scaled(1_200.0);
        assert!((grants.get(larvae).honey_kj - 0.5 * full.honey_kj).abs() < 1e-9);

        let adults = PopulationGroup::InHive(Caste::Worker);
        let adult_need = accountant.per_capita(adults).scaled(100.0);
        assert!((grants.get(adults).honey_kj - adult_need.honey_kj).abs() < 1e-9);
    }

    #[test]
    fn no_larvae_means_full_care() {
        let (colony, params) = colony_with(0, 0, 0);
        let source = NurseCapacityEntitlements::new(params.nursing);
        assert!((source.care_factor(&colony) - 1.0).abs() < 1e-12);
    }
}
