//! The colony aggregate: cohorts, pending doses and the forager pool.
//!
//! [`Colony`] owns the three age-structured containers and keeps them in
//! step. The daily age shift moves cohorts and their pending doses together,
//! recruits worker graduates into the forager pool and retires the oldest
//! foragers. Mortality then consumes the previous tick's doses.

use rand::Rng;
use tracing::debug;

use apis_types::{Caste, CasteCounts, PopulationGroup, Stage};

use crate::cohorts::{AgingOutcome, CohortLedger};
use crate::config::{ColonyParams, DevelopmentConfig};
use crate::dose::{CarriedDoses, DoseLedger};
use crate::error::ColonyError;
use crate::foragers::ForagerPool;
use crate::guts::{GutsArray, GutsModel};
use crate::mortality::{MortalityEngine, MortalityTally};

/// Eggs laid by the queen in one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EggIntake {
    /// Fertilised eggs.
    pub worker: u32,
    /// Unfertilised eggs.
    pub drone: u32,
}

/// What the daily age shift moved.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AgingReport {
    /// Worker stage transitions.
    pub workers: AgingOutcome,
    /// Drone stage transitions.
    pub drones: AgingOutcome,
    /// Doses that crossed a stage boundary.
    pub carried: CarriedDoses,
    /// Foragers that died of age.
    pub retired_foragers: u32,
}

impl AgingReport {
    /// Stage transitions of one caste.
    pub const fn caste(&self, caste: Caste) -> &AgingOutcome {
        match caste {
            Caste::Worker => &self.workers,
            Caste::Drone => &self.drones,
        }
    }
}

/// Deaths removed by one mortality phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MortalityReport {
    /// Worker deaths across all stages.
    pub workers: MortalityTally,
    /// Drone deaths across all stages.
    pub drones: MortalityTally,
    /// Forager deaths.
    pub foragers: MortalityTally,
}

impl MortalityReport {
    /// Deaths across castes and the forager pool.
    pub const fn total(&self) -> u64 {
        self.workers
            .total()
            .saturating_add(self.drones.total())
            .saturating_add(self.foragers.total())
    }
}

/// Age-structured colony state.
#[derive(Debug, Clone, PartialEq)]
pub struct Colony {
    cohorts: CohortLedger,
    doses: DoseLedger,
    foragers: ForagerPool,
    in_hive_guts: GutsArray,
    forager_guts: GutsArray,
}

impl Colony {
    /// Create an empty colony sized from the development parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::ZeroLengthStage`] if any stage lasts zero days.
    pub fn new(development: &DevelopmentConfig) -> Result<Self, ColonyError> {
        let cohorts = CohortLedger::new(development)?;
        let doses = DoseLedger::new(development);
        doses.check_alignment(&cohorts)?;
        let foragers = ForagerPool::new(development.forager_days());
        Ok(Self {
            in_hive_guts: GutsArray::new(development.worker.in_hive as usize),
            forager_guts: GutsArray::new(foragers.counts().len()),
            cohorts,
            doses,
            foragers,
        })
    }

    /// The cohort ledger.
    pub const fn cohorts(&self) -> &CohortLedger {
        &self.cohorts
    }

    /// The mutable cohort ledger.
    pub const fn cohorts_mut(&mut self) -> &mut CohortLedger {
        &mut self.cohorts
    }

    /// Pending doses of larvae and in-hive adults.
    pub const fn doses(&self) -> &DoseLedger {
        &self.doses
    }

    /// Mutable pending doses.
    pub const fn doses_mut(&mut self) -> &mut DoseLedger {
        &mut self.doses
    }

    /// The forager pool.
    pub const fn foragers(&self) -> &ForagerPool {
        &self.foragers
    }

    /// The mutable forager pool.
    pub const fn foragers_mut(&mut self) -> &mut ForagerPool {
        &mut self.foragers
    }

    /// GUTS state of a group of adult workers.
    ///
    /// Only in-hive workers and foragers carry it; the state stays clear
    /// unless a GUTS effect model is selected.
    pub const fn guts(&self, group: PopulationGroup) -> Option<&GutsArray> {
        match group {
            PopulationGroup::InHive(Caste::Worker) => Some(&self.in_hive_guts),
            PopulationGroup::Foragers => Some(&self.forager_guts),
            PopulationGroup::InHive(Caste::Drone) | PopulationGroup::Larvae(_) => None,
        }
    }

    /// Head counts by age of one fed group.
    pub fn group_counts(&self, group: PopulationGroup) -> &[u32] {
        match group {
            PopulationGroup::Foragers => self.foragers.counts(),
            PopulationGroup::InHive(caste) => {
                self.cohorts.caste(caste).stage(Stage::InHive).counts()
            }
            PopulationGroup::Larvae(caste) => self.cohorts.caste(caste).stage(Stage::Larva).counts(),
        }
    }

    /// Add to the pending dose of one age slot of a fed group.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::AgeOutOfRange`] if the group has no slot for
    /// `age`; nothing is recorded in that case.
    pub fn add_dose(
        &mut self,
        group: PopulationGroup,
        age: usize,
        dose: f64,
    ) -> Result<(), ColonyError> {
        let array = match self.doses.group_mut(group) {
            Some(array) => array,
            None => self.foragers.oral_mut(),
        };
        if array.add(age, dose) {
            Ok(())
        } else {
            Err(ColonyError::AgeOutOfRange {
                group,
                age,
                slots: array.len(),
            })
        }
    }

    /// Count-weighted mean pending dose of a fed group.
    pub fn mean_dose(&self, group: PopulationGroup) -> f64 {
        let counts = self.group_counts(group);
        match self.doses.group(group) {
            Some(array) => array.weighted_mean(counts),
            None => self.foragers.mean_oral_dose(),
        }
    }

    /// Head counts of one caste.
    pub fn caste_counts(&self, caste: Caste) -> CasteCounts {
        self.cohorts.caste(caste).counts()
    }

    /// Every living bee, brood and foragers included.
    pub fn total_population(&self) -> u64 {
        self.cohorts.total().saturating_add(self.foragers.total())
    }

    /// Returns `true` once no bee remains in any stage.
    pub fn is_extinct(&self) -> bool {
        self.total_population() == 0
    }

    /// Advance every individual by one day.
    ///
    /// Foragers age first, then both castes shift with their pending doses.
    /// Worker graduates are recruited into the forager pool carrying their
    /// in-hive dose and GUTS state; drone graduates have reached their
    /// lifespan and leave.
    pub fn age(&mut self, eggs: EggIntake) -> AgingReport {
        let retired_foragers = self.foragers.age();
        self.forager_guts.shift();
        let workers = self.cohorts.caste_mut(Caste::Worker).shift(eggs.worker);
        let drones = self.cohorts.caste_mut(Caste::Drone).shift(eggs.drone);
        let carried = self.doses.shift();

        let resident = self.foragers.counts().first().copied().unwrap_or(0);
        let graduate_state = self.in_hive_guts.shift();
        self.forager_guts
            .merge_newest(resident, workers.graduated, graduate_state);
        self.foragers
            .recruit(workers.graduated, carried.worker_in_hive);
        debug!(
            recruited = workers.graduated,
            retired_foragers,
            drones_died_of_age = drones.graduated,
            "Cohorts aged"
        );
        AgingReport {
            workers,
            drones,
            carried,
            retired_foragers,
        }
    }

    /// Apply background and dose mortality to every stage and the pool.
    ///
    /// Larvae that pupated during `aging` are assessed on the dose they
    /// carried out of the larval stage before joining the youngest pupae.
    /// With a GUTS effect model, in-hive workers and foragers die of their
    /// accumulated damage instead of the day's dose-response.
    pub fn apply_mortality<R: Rng + ?Sized>(
        &mut self,
        engine: MortalityEngine,
        params: &ColonyParams,
        aging: &AgingReport,
        rng: &mut R,
    ) -> MortalityReport {
        let toxicity = &params.toxicity;
        let guts = GutsModel::for_toxicity(toxicity);
        let mut report = MortalityReport::default();

        for caste in Caste::ALL {
            let rates = params.mortality.caste(caste);
            let mut tally = MortalityTally::default();
            let cohorts = self.cohorts.caste_mut(caste);

            let pupated = aging.caste(caste).pupated;
            let survivors = engine.apply_carried_dose(
                pupated,
                aging.carried.larvae(caste),
                &toxicity.larval_oral,
                rng,
            );
            let pupae = cohorts.stage_mut(Stage::Pupa);
            if let Some(youngest) = pupae.counts_mut().first_mut() {
                *youngest = youngest.saturating_sub(pupated.saturating_sub(survivors));
            }
            tally.toxic = tally
                .toxic
                .saturating_add(u64::from(pupated.saturating_sub(survivors)));

            for stage in Stage::ALL {
                if let (Stage::InHive, Caste::Worker, Some(model)) = (stage, caste, guts) {
                    let counts = cohorts.stage_mut(stage).counts_mut();
                    tally.absorb(engine.apply(
                        counts,
                        None,
                        rates.rate(stage),
                        &toxicity.adult_oral,
                        rng,
                    ));
                    if let Some(doses) = self.doses.group_mut(PopulationGroup::InHive(caste)) {
                        let toxic =
                            model.apply(engine, counts, &mut self.in_hive_guts, doses, None, rng);
                        tally.toxic = tally.toxic.saturating_add(toxic);
                    }
                    continue;
                }
                let (doses, response) = match stage {
                    Stage::Larva => (
                        self.doses.group_mut(PopulationGroup::Larvae(caste)),
                        &toxicity.larval_oral,
                    ),
                    Stage::InHive => (
                        self.doses.group_mut(PopulationGroup::InHive(caste)),
                        &toxicity.adult_oral,
                    ),
                    Stage::Egg | Stage::Pupa => (None, &toxicity.adult_oral),
                };
                tally.absorb(engine.apply(
                    cohorts.stage_mut(stage).counts_mut(),
                    doses,
                    rates.rate(stage),
                    response,
                    rng,
                ));
            }

            match caste {
                Caste::Worker => report.workers = tally,
                Caste::Drone => report.drones = tally,
            }
        }

        let (counts, oral, contact) = self.foragers.parts_mut();
        if let Some(model) = guts {
            report.foragers = engine.apply(
                counts,
                None,
                params.mortality.forager,
                &toxicity.adult_oral,
                rng,
            );
            let toxic = model.apply(
                engine,
                counts,
                &mut self.forager_guts,
                oral,
                Some(contact),
                rng,
            );
            report.foragers.toxic = report.foragers.toxic.saturating_add(toxic);
        } else {
            report.foragers = engine.apply(
                counts,
                Some(oral),
                params.mortality.forager,
                &toxicity.adult_oral,
                rng,
            );
            report.foragers.absorb(engine.apply(
                counts,
                Some(contact),
                0.0,
                &toxicity.forager_contact,
                rng,
            ));
        }

        debug!(
            worker_deaths = report.workers.total(),
            drone_deaths = report.drones.total(),
            forager_deaths = report.foragers.total(),
            toxic_deaths = report
                .workers
                .toxic
                .saturating_add(report.drones.toxic)
                .saturating_add(report.foragers.toxic),
            "Mortality applied"
        );
        report
    }
}
