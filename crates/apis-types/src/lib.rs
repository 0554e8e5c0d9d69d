//! Shared type definitions for the Apis colony simulation.
//!
//! This crate is the single source of truth for the vocabulary used across
//! the Apis workspace: castes, life stages, honey layers, population groups,
//! run identifiers and the read-only snapshots handed to reporting.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for run identifiers
//! - [`enums`] -- Enumeration types (castes, stages, layers, groups, end reasons)
//! - [`structs`] -- Snapshot and summary structs (colony snapshot, toxicant fate)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{Caste, EndReason, HoneyLayer, PopulationGroup, Stage};
pub use ids::RunId;
pub use structs::{CasteCounts, ColonySnapshot, LayerSnapshot, RunSummary, ToxicantFate};
