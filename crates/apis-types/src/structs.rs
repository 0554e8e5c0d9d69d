//! Snapshot and summary structs for the Apis colony simulation.
//!
//! Everything here is read-only output: reporting consumers receive these
//! values after a tick completes and never feed them back into the core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::{Caste, EndReason, HoneyLayer, PopulationGroup};
use crate::ids::RunId;

// ---------------------------------------------------------------------------
// Colony snapshot
// ---------------------------------------------------------------------------

/// Head counts of one caste per life stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CasteCounts {
    /// Eggs across all ages.
    pub eggs: u64,
    /// Larvae across all ages.
    pub larvae: u64,
    /// Pupae across all ages.
    pub pupae: u64,
    /// In-hive adults across all ages.
    pub in_hive: u64,
}

impl CasteCounts {
    /// Eggs, larvae and pupae combined.
    pub const fn brood(&self) -> u64 {
        self.eggs
            .saturating_add(self.larvae)
            .saturating_add(self.pupae)
    }

    /// All stages combined.
    pub const fn total(&self) -> u64 {
        self.brood().saturating_add(self.in_hive)
    }
}

/// Energy and toxicant concentration held by one honey layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    /// The layer described.
    pub layer: HoneyLayer,
    /// Stored energy in kJ.
    pub energy_kj: f64,
    /// Toxicant concentration in µg/kJ.
    pub concentration: f64,
}

/// End-of-tick view of the colony handed to reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColonySnapshot {
    /// The tick this snapshot was taken after.
    pub tick: u64,
    /// Day of the simulated year (0-indexed).
    pub day_of_year: u64,
    /// Worker head counts per stage.
    pub workers: CasteCounts,
    /// Drone head counts per stage.
    pub drones: CasteCounts,
    /// Foragers alive.
    pub foragers: u64,
    /// Honey energy tracked by the consumption model, in kJ.
    pub honey_kj: f64,
    /// Per-layer honey store contents, freshest first.
    pub honey_layers: Vec<LayerSnapshot>,
    /// Pollen mass in g.
    pub pollen_g: f64,
    /// Pollen toxicant concentration in µg/g.
    pub pollen_concentration: f64,
    /// Toxicant mass held in honey, in µg.
    pub honey_toxicant_ug: f64,
    /// Mean per-individual dose delivered this tick, per group, in µg.
    pub mean_doses: Vec<(PopulationGroup, f64)>,
}

impl ColonySnapshot {
    /// Head counts of the given caste.
    pub const fn caste(&self, caste: Caste) -> &CasteCounts {
        match caste {
            Caste::Worker => &self.workers,
            Caste::Drone => &self.drones,
        }
    }

    /// Every living bee, brood and foragers included.
    pub const fn total_population(&self) -> u64 {
        self.workers
            .total()
            .saturating_add(self.drones.total())
            .saturating_add(self.foragers)
    }
}

// ---------------------------------------------------------------------------
// Toxicant fate
// ---------------------------------------------------------------------------

/// Cumulative toxicant mass, in µg, per destination over a whole run.
///
/// Honey deposits flow out through ingestion, nurse retention and
/// degradation. Whatever remains is still in the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ToxicantFate {
    /// Mass carried into the honey store with nectar.
    pub deposited_honey: f64,
    /// Mass carried into the pollen store.
    pub deposited_pollen: f64,
    /// Contact dose picked up by foragers in the field.
    pub flight_contact: f64,
    /// Oral mass taken up by foragers.
    pub ingested_foragers: f64,
    /// Oral mass taken up by in-hive workers, nurse share excluded.
    pub ingested_worker_in_hive: f64,
    /// Oral mass taken up by in-hive drones.
    pub ingested_drone_in_hive: f64,
    /// Mass delivered to worker larvae.
    pub ingested_worker_larvae: f64,
    /// Mass delivered to drone larvae.
    pub ingested_drone_larvae: f64,
    /// Mass filtered out by nurses while feeding larvae.
    pub nurse_retained: f64,
    /// Nurse-retained mass that found no adult to credit.
    pub undelivered: f64,
    /// Mass removed from honey by degradation.
    pub degraded_honey: f64,
}

impl ToxicantFate {
    /// Credit oral uptake to the group that consumed it.
    pub fn record_ingestion(&mut self, group: PopulationGroup, mass: f64) {
        let slot = match group {
            PopulationGroup::Foragers => &mut self.ingested_foragers,
            PopulationGroup::InHive(Caste::Worker) => &mut self.ingested_worker_in_hive,
            PopulationGroup::InHive(Caste::Drone) => &mut self.ingested_drone_in_hive,
            PopulationGroup::Larvae(Caste::Worker) => &mut self.ingested_worker_larvae,
            PopulationGroup::Larvae(Caste::Drone) => &mut self.ingested_drone_larvae,
        };
        *slot += mass;
    }

    /// Total oral uptake across groups, nurse retention included.
    pub fn total_ingested(&self) -> f64 {
        self.ingested_foragers
            + self.ingested_worker_in_hive
            + self.ingested_drone_in_hive
            + self.ingested_worker_larvae
            + self.ingested_drone_larvae
            + self.nurse_retained
    }
}

// ---------------------------------------------------------------------------
// Run summary
// ---------------------------------------------------------------------------

/// Outcome of one replicate run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Identifier of the run.
    pub run_id: RunId,
    /// Replicate index within the batch.
    pub replicate: u32,
    /// RNG seed used by the replicate.
    pub seed: u64,
    /// Why the run stopped.
    pub end_reason: EndReason,
    /// Number of ticks executed.
    pub total_ticks: u64,
    /// Wall-clock start of the run.
    pub started_at: DateTime<Utc>,
    /// Wall-clock end of the run.
    pub finished_at: DateTime<Utc>,
    /// Largest total population observed at the end of any tick.
    pub peak_population: u64,
    /// Snapshot after the last completed tick.
    pub final_snapshot: Option<ColonySnapshot>,
    /// Where the toxicant went over the run.
    pub fate: ToxicantFate,
}
