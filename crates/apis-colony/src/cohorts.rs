//! Age-indexed cohort arrays and the daily age shift.
//!
//! A [`CohortArray`] holds head counts indexed by exact day-of-age within one
//! stage of one caste. [`CasteCohorts`] chains the four stages of a caste and
//! [`CohortLedger`] holds both castes. Foragers are kept outside the ledger
//! in a [`ForagerPool`](crate::foragers::ForagerPool).
//!
//! # Age shift
//!
//! ```text
//! eggs[0..E] -> larvae[0..L] -> pupae[0..P] -> in_hive[0..A] -> graduates
//!   ^ queen                                                    (foragers or death)
//! ```
//!
//! Every slot moves one day older; the oldest slot of each stage becomes
//! slot 0 of the next stage.

use apis_types::{Caste, CasteCounts, Stage};

use crate::config::{DevelopmentConfig, StageDurations};
use crate::error::ColonyError;

// ---------------------------------------------------------------------------
// Cohort array
// ---------------------------------------------------------------------------

/// Head counts of one stage, indexed by day-of-age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortArray {
    counts: Vec<u32>,
}

impl CohortArray {
    /// Create an empty array covering `days` ages.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::ZeroLengthStage`] if `days` is zero.
    pub fn new(caste: Caste, stage: Stage, days: u32) -> Result<Self, ColonyError> {
        if days == 0 {
            return Err(ColonyError::ZeroLengthStage { caste, stage });
        }
        Ok(Self {
            counts: vec![0; days as usize],
        })
    }

    /// Number of age slots.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Always `false`; arrays are never built with zero slots.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Head counts, youngest first.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// Mutable head counts, youngest first.
    pub fn counts_mut(&mut self) -> &mut [u32] {
        &mut self.counts
    }

    /// Head count at one age. Ages beyond the stage hold nobody.
    pub fn get(&self, age: usize) -> u32 {
        self.counts.get(age).copied().unwrap_or(0)
    }

    /// Add individuals at one age. Returns `false` if the age is out of range.
    pub fn add(&mut self, age: usize, count: u32) -> bool {
        match self.counts.get_mut(age) {
            Some(slot) => {
                *slot = slot.saturating_add(count);
                true
            }
            None => false,
        }
    }

    /// Total head count across ages.
    pub fn total(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Move every slot one day older and place `entrants` at age 0.
    ///
    /// Returns the individuals that were in the oldest slot.
    pub fn shift(&mut self, entrants: u32) -> u32 {
        let graduates = match self.counts.last_mut() {
            Some(oldest) => core::mem::take(oldest),
            None => 0,
        };
        self.counts.rotate_right(1);
        if let Some(youngest) = self.counts.first_mut() {
            *youngest = entrants;
        }
        graduates
    }

    /// Overwrite the age-0 slot.
    pub fn set_newest(&mut self, count: u32) {
        if let Some(youngest) = self.counts.first_mut() {
            *youngest = count;
        }
    }
}

// ---------------------------------------------------------------------------
// Caste cohorts
// ---------------------------------------------------------------------------

/// Individuals that changed stage during one age shift.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgingOutcome {
    /// Eggs that hatched into larvae.
    pub hatched: u32,
    /// Larvae that were capped as pupae.
    pub pupated: u32,
    /// Pupae that emerged as in-hive adults.
    pub emerged: u32,
    /// In-hive adults that left the in-hive stage.
    pub graduated: u32,
}

/// The four stage arrays of one caste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CasteCohorts {
    eggs: CohortArray,
    larvae: CohortArray,
    pupae: CohortArray,
    in_hive: CohortArray,
}

impl CasteCohorts {
    /// Create empty arrays sized from the stage durations.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::ZeroLengthStage`] if any stage lasts zero days.
    pub fn new(caste: Caste, durations: &StageDurations) -> Result<Self, ColonyError> {
        Ok(Self {
            eggs: CohortArray::new(caste, Stage::Egg, durations.eggs)?,
            larvae: CohortArray::new(caste, Stage::Larva, durations.larvae)?,
            pupae: CohortArray::new(caste, Stage::Pupa, durations.pupae)?,
            in_hive: CohortArray::new(caste, Stage::InHive, durations.in_hive)?,
        })
    }

    /// The array of one stage.
    pub const fn stage(&self, stage: Stage) -> &CohortArray {
        match stage {
            Stage::Egg => &self.eggs,
            Stage::Larva => &self.larvae,
            Stage::Pupa => &self.pupae,
            Stage::InHive => &self.in_hive,
        }
    }

    /// The mutable array of one stage.
    pub const fn stage_mut(&mut self, stage: Stage) -> &mut CohortArray {
        match stage {
            Stage::Egg => &mut self.eggs,
            Stage::Larva => &mut self.larvae,
            Stage::Pupa => &mut self.pupae,
            Stage::InHive => &mut self.in_hive,
        }
    }

    /// Age every stage by one day; `new_eggs` enter the egg stage.
    ///
    /// Stages are shifted oldest first so each stage's graduates are taken
    /// before its own slot 0 is refilled.
    pub fn shift(&mut self, new_eggs: u32) -> AgingOutcome {
        let graduated = self.in_hive.shift(0);
        let emerged = self.pupae.shift(0);
        let pupated = self.larvae.shift(0);
        let hatched = self.eggs.shift(new_eggs);
        self.larvae.set_newest(hatched);
        self.pupae.set_newest(pupated);
        self.in_hive.set_newest(emerged);
        AgingOutcome {
            hatched,
            pupated,
            emerged,
            graduated,
        }
    }

    /// Head counts per stage.
    pub fn counts(&self) -> CasteCounts {
        CasteCounts {
            eggs: self.eggs.total(),
            larvae: self.larvae.total(),
            pupae: self.pupae.total(),
            in_hive: self.in_hive.total(),
        }
    }
}

// ---------------------------------------------------------------------------
// Cohort ledger
// ---------------------------------------------------------------------------

/// Cohort arrays for both castes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CohortLedger {
    workers: CasteCohorts,
    drones: CasteCohorts,
}

impl CohortLedger {
    /// Create empty cohorts sized from the development parameters.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::ZeroLengthStage`] if any stage lasts zero days.
    pub fn new(development: &DevelopmentConfig) -> Result<Self, ColonyError> {
        Ok(Self {
            workers: CasteCohorts::new(Caste::Worker, &development.worker)?,
            drones: CasteCohorts::new(Caste::Drone, &development.drone)?,
        })
    }

    /// Cohorts of one caste.
    pub const fn caste(&self, caste: Caste) -> &CasteCohorts {
        match caste {
            Caste::Worker => &self.workers,
            Caste::Drone => &self.drones,
        }
    }

    /// Mutable cohorts of one caste.
    pub const fn caste_mut(&mut self, caste: Caste) -> &mut CasteCohorts {
        match caste {
            Caste::Worker => &mut self.workers,
            Caste::Drone => &mut self.drones,
        }
    }

    /// Total brood (eggs, larvae and pupae) of both castes.
    pub fn total_brood(&self) -> u64 {
        self.workers
            .counts()
            .brood()
            .saturating_add(self.drones.counts().brood())
    }

    /// Total head count of both castes, foragers excluded.
    pub fn total(&self) -> u64 {
        self.workers
            .counts()
            .total()
            .saturating_add(self.drones.counts().total())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn durations(eggs: u32, larvae: u32, pupae: u32, in_hive: u32) -> StageDurations {
        StageDurations {
            eggs,
            larvae,
            pupae,
            in_hive,
        }
    }

    #[test]
    fn zero_length_array_is_rejected() {
        let result = CohortArray::new(Caste::Worker, Stage::Larva, 0);
        assert!(matches!(
            result,
            Err(ColonyError::ZeroLengthStage {
                caste: Caste::Worker,
                stage: Stage::Larva
            })
        ));
    }

    #[test]
    fn shift_moves_slots_and_returns_oldest() {
        let mut array = CohortArray::new(Caste::Worker, Stage::Egg, 3).unwrap();
        array.counts_mut().copy_from_slice(&[5, 6, 7]);
        let graduates = array.shift(9);
        assert_eq!(graduates, 7);
        assert_eq!(array.counts(), &[9, 5, 6]);
    }

    #[test]
    fn single_slot_stage_passes_everyone_through() {
        let mut array = CohortArray::new(Caste::Drone, Stage::Egg, 1).unwrap();
        array.set_newest(4);
        assert_eq!(array.shift(2), 4);
        assert_eq!(array.counts(), &[2]);
    }

    #[test]
    fn caste_shift_chains_stages() {
        let mut cohorts = CasteCohorts::new(Caste::Worker, &durations(1, 2, 1, 2)).unwrap();
        cohorts.stage_mut(Stage::Egg).set_newest(10);
        cohorts.stage_mut(Stage::Larva).counts_mut().copy_from_slice(&[0, 8]);
        cohorts.stage_mut(Stage::Pupa).set_newest(6);
        cohorts.stage_mut(Stage::InHive).counts_mut().copy_from_slice(&[0, 4]);

        let outcome = cohorts.shift(3);

        assert_eq!(
            outcome,
            AgingOutcome {
                hatched: 10,
                pupated: 8,
                emerged: 6,
                graduated: 4
            }
        );
        assert_eq!(cohorts.stage(Stage::Egg).counts(), &[3]);
        assert_eq!(cohorts.stage(Stage::Larva).counts(), &[10, 0]);
        assert_eq!(cohorts.stage(Stage::Pupa).counts(), &[8]);
        assert_eq!(cohorts.stage(Stage::InHive).counts(), &[6, 0]);
    }

    #[test]
    fn shift_conserves_individuals() {
        let mut cohorts = CasteCohorts::new(Caste::Drone, &durations(3, 7, 14, 37)).unwrap();
        for day in 0..40_u32 {
            let before = cohorts.counts().total();
            let outcome = cohorts.shift(day);
            let after = cohorts.counts().total();
            assert_eq!(
                before + u64::from(day),
                after + u64::from(outcome.graduated)
            );
        }
    }

    #[test]
    fn shift_of_empty_cohorts_stays_empty() {
        let mut ledger = CohortLedger::new(&DevelopmentConfig::default()).unwrap();
        let before = ledger.clone();
        for caste in Caste::ALL {
            let outcome = ledger.caste_mut(caste).shift(0);
            assert_eq!(outcome, AgingOutcome::default());
        }
        assert_eq!(ledger, before);
    }

    #[test]
    fn ledger_sizes_arrays_per_caste() {
        let ledger = CohortLedger::new(&DevelopmentConfig::default()).unwrap();
        assert_eq!(ledger.caste(Caste::Worker).stage(Stage::Larva).len(), 6);
        assert_eq!(ledger.caste(Caste::Drone).stage(Stage::Larva).len(), 7);
        assert_eq!(ledger.caste(Caste::Drone).stage(Stage::InHive).len(), 37);
        assert_eq!(ledger.total(), 0);
    }
}
