//! Per-cohort dose accumulators.
//!
//! A [`DoseArray`] is index-aligned with one [`CohortArray`]: slot `i` holds
//! the mean toxicant dose (µg) absorbed this tick by an individual of age
//! `i`. Doses accumulate within a tick and are reset once mortality has
//! consumed them. Only larvae and in-hive adults carry doses; eggs and pupae
//! do not feed.
//!
//! [`CohortArray`]: crate::cohorts::CohortArray

use apis_types::{Caste, PopulationGroup, Stage};

use crate::cohorts::CohortLedger;
use crate::config::DevelopmentConfig;
use crate::error::ColonyError;

/// Mean dose per individual, indexed by day-of-age.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseArray {
    doses: Vec<f64>,
}

impl DoseArray {
    /// Create a zeroed array with `len` slots.
    pub fn new(len: usize) -> Self {
        Self {
            doses: vec![0.0; len],
        }
    }

    /// Number of age slots.
    pub fn len(&self) -> usize {
        self.doses.len()
    }

    /// Returns `true` if the array has no slots.
    pub fn is_empty(&self) -> bool {
        self.doses.is_empty()
    }

    /// Doses, youngest first.
    pub fn doses(&self) -> &[f64] {
        &self.doses
    }

    /// Mutable doses, youngest first.
    pub fn doses_mut(&mut self) -> &mut [f64] {
        &mut self.doses
    }

    /// Dose at one age. Ages beyond the array carry no dose.
    pub fn get(&self, age: usize) -> f64 {
        self.doses.get(age).copied().unwrap_or(0.0)
    }

    /// Add to the dose of one age. Returns `false` if the age is out of range.
    pub fn add(&mut self, age: usize, dose: f64) -> bool {
        match self.doses.get_mut(age) {
            Some(slot) => {
                *slot += dose;
                true
            }
            None => false,
        }
    }

    /// Move every dose one day older, returning the oldest slot's dose.
    ///
    /// Mirrors [`CohortArray::shift`](crate::cohorts::CohortArray::shift) so
    /// pending doses stay with the individuals that absorbed them.
    pub fn shift(&mut self) -> f64 {
        let carried = match self.doses.last_mut() {
            Some(oldest) => core::mem::take(oldest),
            None => 0.0,
        };
        self.doses.rotate_right(1);
        carried
    }

    /// Zero every slot.
    pub fn reset(&mut self) {
        self.doses.fill(0.0);
    }

    /// Count-weighted mean dose over the given head counts.
    pub fn weighted_mean(&self, counts: &[u32]) -> f64 {
        let mut mass = 0.0;
        let mut individuals = 0.0;
        for (dose, &count) in self.doses.iter().zip(counts) {
            mass += dose * f64::from(count);
            individuals += f64::from(count);
        }
        if individuals > 0.0 {
            mass / individuals
        } else {
            0.0
        }
    }
}

/// Pending doses carried across a stage boundary by an age shift.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CarriedDoses {
    /// Dose of worker larvae that pupated.
    pub worker_larvae: f64,
    /// Dose of drone larvae that pupated.
    pub drone_larvae: f64,
    /// Dose of in-hive workers that became foragers.
    pub worker_in_hive: f64,
    /// Dose of in-hive drones that reached their lifespan.
    pub drone_in_hive: f64,
}

impl CarriedDoses {
    /// Dose carried out of the larval stage of one caste.
    pub const fn larvae(&self, caste: Caste) -> f64 {
        match caste {
            Caste::Worker => self.worker_larvae,
            Caste::Drone => self.drone_larvae,
        }
    }
}

/// Dose accumulators for larvae and in-hive adults of both castes.
#[derive(Debug, Clone, PartialEq)]
pub struct DoseLedger {
    worker_larvae: DoseArray,
    drone_larvae: DoseArray,
    worker_in_hive: DoseArray,
    drone_in_hive: DoseArray,
}

impl DoseLedger {
    /// Create zeroed accumulators sized like the cohort arrays.
    pub fn new(development: &DevelopmentConfig) -> Self {
        let len = |days: u32| days as usize;
        Self {
            worker_larvae: DoseArray::new(len(development.worker.larvae)),
            drone_larvae: DoseArray::new(len(development.drone.larvae)),
            worker_in_hive: DoseArray::new(len(development.worker.in_hive)),
            drone_in_hive: DoseArray::new(len(development.drone.in_hive)),
        }
    }

    /// Accumulator of one fed group, or `None` for the forager pool.
    pub const fn group(&self, group: PopulationGroup) -> Option<&DoseArray> {
        match group {
            PopulationGroup::Foragers => None,
            PopulationGroup::Larvae(Caste::Worker) => Some(&self.worker_larvae),
            PopulationGroup::Larvae(Caste::Drone) => Some(&self.drone_larvae),
            PopulationGroup::InHive(Caste::Worker) => Some(&self.worker_in_hive),
            PopulationGroup::InHive(Caste::Drone) => Some(&self.drone_in_hive),
        }
    }

    /// Mutable accumulator of one fed group, or `None` for the forager pool.
    pub const fn group_mut(&mut self, group: PopulationGroup) -> Option<&mut DoseArray> {
        match group {
            PopulationGroup::Foragers => None,
            PopulationGroup::Larvae(Caste::Worker) => Some(&mut self.worker_larvae),
            PopulationGroup::Larvae(Caste::Drone) => Some(&mut self.drone_larvae),
            PopulationGroup::InHive(Caste::Worker) => Some(&mut self.worker_in_hive),
            PopulationGroup::InHive(Caste::Drone) => Some(&mut self.drone_in_hive),
        }
    }

    /// Shift every accumulator alongside the cohort age shift.
    pub fn shift(&mut self) -> CarriedDoses {
        CarriedDoses {
            worker_larvae: self.worker_larvae.shift(),
            drone_larvae: self.drone_larvae.shift(),
            worker_in_hive: self.worker_in_hive.shift(),
            drone_in_hive: self.drone_in_hive.shift(),
        }
    }

    /// Zero every accumulator.
    pub fn reset(&mut self) {
        self.worker_larvae.reset();
        self.drone_larvae.reset();
        self.worker_in_hive.reset();
        self.drone_in_hive.reset();
    }

    /// Confirm every accumulator has one slot per cohort age.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::DoseMisaligned`] naming the first group whose
    /// lengths disagree.
    pub fn check_alignment(&self, cohorts: &CohortLedger) -> Result<(), ColonyError> {
        for caste in Caste::ALL {
            for (group, stage) in [
                (PopulationGroup::Larvae(caste), Stage::Larva),
                (PopulationGroup::InHive(caste), Stage::InHive),
            ] {
                let cohort_len = cohorts.caste(caste).stage(stage).len();
                let dose_len = self.group(group).map_or(0, DoseArray::len);
                if cohort_len != dose_len {
                    return Err(ColonyError::DoseMisaligned {
                        group,
                        cohorts: cohort_len,
                        doses: dose_len,
                    });
                }
            }
        }
        Ok(())
    }
}
