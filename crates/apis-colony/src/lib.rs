//! Cohorts, doses, mortality and exposure accounting for the Apis simulation.
//!
//! This crate holds the colony's living state and every rule that acts on it
//! within a tick, without touching I/O or the clock. It sits between
//! `apis-ledger` (the substance stores) and `apis-core` (the tick loop).
//!
//! # Modules
//!
//! - [`cohorts`] -- Age-indexed head counts per caste and stage ([`CohortLedger`])
//! - [`colony`] -- The colony aggregate and the daily age shift ([`Colony`])
//! - [`config`] -- Biological parameters ([`ColonyParams`])
//! - [`dose`] -- Per-cohort pending doses ([`DoseLedger`])
//! - [`error`] -- Error types for colony operations ([`ColonyError`])
//! - [`exposure`] -- Daily feeding and toxicant routing ([`ExposureAccountant`])
//! - [`foragers`] -- The age-indexed forager pool ([`ForagerPool`])
//! - [`guts`] -- Toxicokinetic-toxicodynamic effects for adult workers ([`GutsModel`])
//! - [`mortality`] -- Background and dose-response deaths ([`MortalityEngine`])

pub mod cohorts;
pub mod colony;
pub mod config;
pub mod dose;
pub mod error;
pub mod exposure;
pub mod foragers;
pub mod guts;
pub mod mortality;

// Re-export primary types at crate root for convenience.
pub use cohorts::{AgingOutcome, CasteCohorts, CohortArray, CohortLedger};
pub use colony::{AgingReport, Colony, EggIntake, MortalityReport};
pub use config::{
    ColonyParams, DevelopmentConfig, DoseResponse, EffectModel, GutsConfig, MortalityConfig,
    NeedsConfig, NursingConfig, StageDurations, StageMortality, ToxicityConfig,
};
pub use dose::{CarriedDoses, DoseArray, DoseLedger};
pub use error::ColonyError;
pub use exposure::{
    AccountingPolicy, DailyPlan, Entitlements, ExposureAccountant, ExposureReport, GroupBudget,
    GroupExposure, NurseRecipient,
};
pub use foragers::ForagerPool;
pub use guts::{GutsArray, GutsModel, GutsSlot, GutsVariant};
pub use mortality::{MortalityEngine, MortalityMode, MortalityTally};
