//! Clock, tick cycle and replicate runner for the Apis colony simulation.
//!
//! This crate owns the daily cycle that drives the colony: laying, aging,
//! mortality, foraging deposits, consumption, exposure accounting and the
//! end-of-tick conservation checks. It also loads the YAML configuration
//! and runs independent replicates in parallel.
//!
//! # Modules
//!
//! - [`application`] -- Field residues of a scheduled toxicant application.
//! - [`clock`] -- Daily tick counter with day-of-year and year derivation.
//! - [`config`] -- Configuration loading from `apis-config.yaml` into
//!   strongly-typed structs.
//! - [`consumption`] -- Daily honey and pollen totals and their rations.
//! - [`entitlement`] -- [`EntitlementSource`] trait and
//!   [`NurseCapacityEntitlements`].
//! - [`foraging`] -- [`ForagingSource`] trait and [`ScheduledForaging`].
//! - [`laying`] -- Seasonal egg laying by the queen.
//! - [`runner`] -- The run loop, termination and replicate fan-out.
//! - [`setup`] -- Initial state of a replicate.
//! - [`tick`] -- The daily tick cycle.

pub mod application;
pub mod clock;
pub mod config;
pub mod consumption;
pub mod entitlement;
pub mod foraging;
pub mod laying;
pub mod runner;
pub mod setup;
pub mod tick;

pub use config::{ConfigError, SimulationConfig};
pub use entitlement::{EntitlementSource, NurseCapacityEntitlements};
pub use foraging::{ForagingSource, ScheduledForaging};
pub use runner::{
    NoOpCallback, ReplicateOutcome, RunnerError, SimulationResult, TickCallback, run_replicate,
    run_replicates, run_simulation,
};
pub use tick::{SimulationState, TickError, TickSummary, run_tick};

/// Head count as a float for rate arithmetic.
#[allow(clippy::cast_precision_loss)]
pub(crate) const fn count_to_f64(count: u64) -> f64 {
    count as f64
}
