//! Error types for the apis-colony crate.
//!
//! All operations that can fail return typed errors rather than panicking.
//! Invariant failures carry the tick and the quantities involved so that a
//! run can be diagnosed from the error message alone.

use apis_ledger::{StoreAnomaly, StoreError};
use apis_types::{Caste, PopulationGroup, Stage};

/// Errors that can occur during colony operations.
#[derive(Debug, thiserror::Error)]
pub enum ColonyError {
    /// A stage was configured with zero days.
    #[error("{caste} {stage} stage must last at least one day")]
    ZeroLengthStage {
        /// Caste of the offending stage.
        caste: Caste,
        /// The offending stage.
        stage: Stage,
    },

    /// A numeric parameter is outside its valid range.
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        /// Parameter name as it appears in configuration.
        name: &'static str,
        /// The rejected value.
        value: f64,
        /// What the value must satisfy.
        reason: &'static str,
    },

    /// A dose accumulator is not index-aligned with its cohort array.
    #[error("dose ledger for {group} has {doses} slots but the cohort array has {cohorts}")]
    DoseMisaligned {
        /// Group whose arrays disagree.
        group: PopulationGroup,
        /// Length of the cohort array.
        cohorts: usize,
        /// Length of the dose array.
        doses: usize,
    },

    /// A dose was addressed to an age the group does not have.
    #[error("{group} has no age slot {age} (stage lasts {slots} days)")]
    AgeOutOfRange {
        /// Group the dose was meant for.
        group: PopulationGroup,
        /// The requested age.
        age: usize,
        /// Number of age slots in the group.
        slots: usize,
    },

    /// A store operation failed while a group was being fed.
    #[error("store error at tick {tick} while feeding {group}: {source}")]
    Store {
        /// Tick of the failure.
        tick: u64,
        /// Group being fed.
        group: PopulationGroup,
        /// The underlying store error.
        source: StoreError,
    },

    /// Withdrawn totals disagree with the daily consumption totals.
    #[error("reconciliation failed: {anomaly}")]
    Reconciliation {
        /// Details of the mismatch.
        anomaly: StoreAnomaly,
    },
}
