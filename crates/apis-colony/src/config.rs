//! Biological parameters for cohorts, mortality, needs and toxicity.
//!
//! These values correspond to the `colony` section of `apis-config.yaml`.
//! Every field has a serde default equal to the standard parameterisation of
//! the BEEHAVE family of models, so a partial YAML file only overrides what
//! it names. [`ColonyParams::validate`] rejects values the engine cannot run
//! with; it is called once at setup.

use serde::Deserialize;

use apis_types::{Caste, Stage};

use crate::error::ColonyError;

// ---------------------------------------------------------------------------
// Development
// ---------------------------------------------------------------------------

/// Number of days spent in each stage by one caste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct StageDurations {
    /// Days as an egg.
    pub eggs: u32,
    /// Days as a larva.
    pub larvae: u32,
    /// Days as a pupa.
    pub pupae: u32,
    /// Days as an in-hive adult before leaving the in-hive cohorts.
    ///
    /// Workers leave to become foragers; drones leave by dying of age.
    pub in_hive: u32,
}

impl StageDurations {
    /// Days spent in the given stage.
    pub const fn days(&self, stage: Stage) -> u32 {
        match stage {
            Stage::Egg => self.eggs,
            Stage::Larva => self.larvae,
            Stage::Pupa => self.pupae,
            Stage::InHive => self.in_hive,
        }
    }

    fn validate(&self, caste: Caste) -> Result<(), ColonyError> {
        for stage in Stage::ALL {
            if self.days(stage) == 0 {
                return Err(ColonyError::ZeroLengthStage { caste, stage });
            }
        }
        Ok(())
    }
}

const fn default_worker_durations() -> StageDurations {
    StageDurations {
        eggs: 3,
        larvae: 6,
        pupae: 12,
        in_hive: 21,
    }
}

const fn default_drone_durations() -> StageDurations {
    StageDurations {
        eggs: 3,
        larvae: 7,
        pupae: 14,
        in_hive: 37,
    }
}

const fn default_worker_max_lifespan() -> u32 {
    290
}

/// Stage lengths for both castes plus the worker adult lifespan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DevelopmentConfig {
    /// Worker stage lengths. `in_hive` is the age at first foraging.
    #[serde(default = "default_worker_durations")]
    pub worker: StageDurations,

    /// Drone stage lengths. `in_hive` is the drone adult lifespan.
    #[serde(default = "default_drone_durations")]
    pub drone: StageDurations,

    /// Maximum adult worker age in days, in-hive days included.
    #[serde(default = "default_worker_max_lifespan")]
    pub worker_max_lifespan: u32,
}

impl Default for DevelopmentConfig {
    fn default() -> Self {
        Self {
            worker: default_worker_durations(),
            drone: default_drone_durations(),
            worker_max_lifespan: default_worker_max_lifespan(),
        }
    }
}

impl DevelopmentConfig {
    /// Stage lengths of one caste.
    pub const fn caste(&self, caste: Caste) -> &StageDurations {
        match caste {
            Caste::Worker => &self.worker,
            Caste::Drone => &self.drone,
        }
    }

    /// Days a worker spends in the forager pool before dying of age.
    pub const fn forager_days(&self) -> u32 {
        self.worker_max_lifespan.saturating_sub(self.worker.in_hive)
    }
}

// ---------------------------------------------------------------------------
// Background mortality
// ---------------------------------------------------------------------------

/// Daily background mortality per stage for one caste.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StageMortality {
    /// Daily death probability of eggs.
    pub eggs: f64,
    /// Daily death probability of larvae.
    pub larvae: f64,
    /// Daily death probability of pupae.
    pub pupae: f64,
    /// Daily death probability of in-hive adults.
    pub in_hive: f64,
}

impl StageMortality {
    /// Daily rate for the given stage.
    pub const fn rate(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Egg => self.eggs,
            Stage::Larva => self.larvae,
            Stage::Pupa => self.pupae,
            Stage::InHive => self.in_hive,
        }
    }
}

const fn default_worker_mortality() -> StageMortality {
    StageMortality {
        eggs: 0.03,
        larvae: 0.01,
        pupae: 0.001,
        in_hive: 0.004,
    }
}

const fn default_drone_mortality() -> StageMortality {
    StageMortality {
        eggs: 0.064,
        larvae: 0.044,
        pupae: 0.005,
        in_hive: 0.05,
    }
}

const fn default_forager_mortality() -> f64 {
    0.004
}

/// Background mortality for all stages and the forager pool.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct MortalityConfig {
    /// Worker rates per stage.
    #[serde(default = "default_worker_mortality")]
    pub worker: StageMortality,

    /// Drone rates per stage.
    #[serde(default = "default_drone_mortality")]
    pub drone: StageMortality,

    /// Daily background rate of foragers.
    #[serde(default = "default_forager_mortality")]
    pub forager: f64,
}

impl Default for MortalityConfig {
    fn default() -> Self {
        Self {
            worker: default_worker_mortality(),
            drone: default_drone_mortality(),
            forager: default_forager_mortality(),
        }
    }
}

impl MortalityConfig {
    /// Rates of one caste.
    pub const fn caste(&self, caste: Caste) -> &StageMortality {
        match caste {
            Caste::Worker => &self.worker,
            Caste::Drone => &self.drone,
        }
    }
}

// ---------------------------------------------------------------------------
// Needs
// ---------------------------------------------------------------------------

/// Honey needs in mg of honey.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct HoneyNeeds {
    /// Daily need of a resting adult worker (mg/d).
    #[serde(default = "default_honey_worker_resting")]
    pub worker_resting: f64,
    /// Daily need of a nursing adult worker (mg/d).
    #[serde(default = "default_honey_worker_nurse")]
    pub worker_nurse: f64,
    /// Total need of a worker larva over its development (mg).
    #[serde(default = "default_honey_worker_larva_total")]
    pub worker_larva_total: f64,
    /// Daily need of a drone larva (mg/d).
    #[serde(default = "default_honey_drone_larva")]
    pub drone_larva: f64,
    /// Daily need of an adult drone (mg/d).
    #[serde(default = "default_honey_drone")]
    pub drone: f64,
}

const fn default_honey_worker_resting() -> f64 {
    11.0
}
const fn default_honey_worker_nurse() -> f64 {
    53.42
}
const fn default_honey_worker_larva_total() -> f64 {
    65.4
}
const fn default_honey_drone_larva() -> f64 {
    19.2
}
const fn default_honey_drone() -> f64 {
    10.0
}

impl Default for HoneyNeeds {
    fn default() -> Self {
        Self {
            worker_resting: default_honey_worker_resting(),
            worker_nurse: default_honey_worker_nurse(),
            worker_larva_total: default_honey_worker_larva_total(),
            drone_larva: default_honey_drone_larva(),
            drone: default_honey_drone(),
        }
    }
}

/// Pollen needs in mg of pollen.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct PollenNeeds {
    /// Total need of a worker larva over its development (mg).
    #[serde(default = "default_pollen_worker_larva_total")]
    pub worker_larva_total: f64,
    /// Daily need of a drone larva (mg/d).
    #[serde(default = "default_pollen_drone_larva")]
    pub drone_larva: f64,
    /// Daily need of an adult worker (mg/d).
    #[serde(default = "default_pollen_worker")]
    pub worker: f64,
    /// Daily need of an adult drone (mg/d).
    #[serde(default = "default_pollen_drone")]
    pub drone: f64,
}

const fn default_pollen_worker_larva_total() -> f64 {
    142.0
}
const fn default_pollen_drone_larva() -> f64 {
    50.0
}
const fn default_pollen_worker() -> f64 {
    1.5
}
const fn default_pollen_drone() -> f64 {
    2.0
}

impl Default for PollenNeeds {
    fn default() -> Self {
        Self {
            worker_larva_total: default_pollen_worker_larva_total(),
            drone_larva: default_pollen_drone_larva(),
            worker: default_pollen_worker(),
            drone: default_pollen_drone(),
        }
    }
}

const fn default_energy_per_gram() -> f64 {
    12.78
}

/// Per-capita needs and the honey energy density that converts them.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NeedsConfig {
    /// Honey needs.
    #[serde(default)]
    pub honey: HoneyNeeds,
    /// Pollen needs.
    #[serde(default)]
    pub pollen: PollenNeeds,
    /// Energy content of honey (kJ/g).
    #[serde(default = "default_energy_per_gram")]
    pub honey_energy_kj_per_g: f64,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            honey: HoneyNeeds::default(),
            pollen: PollenNeeds::default(),
            honey_energy_kj_per_g: default_energy_per_gram(),
        }
    }
}

impl NeedsConfig {
    /// Convert mg of honey to kJ.
    pub fn honey_mg_to_kj(&self, mg: f64) -> f64 {
        mg * 0.001 * self.honey_energy_kj_per_g
    }
}

// ---------------------------------------------------------------------------
// Nursing
// ---------------------------------------------------------------------------

const fn default_max_brood_nurse_ratio() -> f64 {
    3.0
}
const fn default_nurse_age_min() -> u32 {
    4
}
const fn default_nurse_age_max() -> u32 {
    13
}
const fn default_forager_nursing_contribution() -> f64 {
    0.2
}

/// Nurse workforce parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct NursingConfig {
    /// Brood one nurse can care for.
    #[serde(default = "default_max_brood_nurse_ratio")]
    pub max_brood_nurse_ratio: f64,
    /// Youngest in-hive worker age (days since emergence) counted as a nurse.
    #[serde(default = "default_nurse_age_min")]
    pub nurse_age_min: u32,
    /// Oldest in-hive worker age counted as a nurse.
    #[serde(default = "default_nurse_age_max")]
    pub nurse_age_max: u32,
    /// Share of a nurse's capacity that a forager contributes.
    #[serde(default = "default_forager_nursing_contribution")]
    pub forager_nursing_contribution: f64,
}

impl Default for NursingConfig {
    fn default() -> Self {
        Self {
            max_brood_nurse_ratio: default_max_brood_nurse_ratio(),
            nurse_age_min: default_nurse_age_min(),
            nurse_age_max: default_nurse_age_max(),
            forager_nursing_contribution: default_forager_nursing_contribution(),
        }
    }
}

// ---------------------------------------------------------------------------
// Toxicity
// ---------------------------------------------------------------------------

/// Log-logistic dose-response curve.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DoseResponse {
    /// Dose at which half the exposed individuals die (µg/bee).
    pub ld50: f64,
    /// Steepness of the curve.
    pub slope: f64,
}

const fn default_adult_oral() -> DoseResponse {
    DoseResponse {
        ld50: 1000.0,
        slope: 100.0,
    }
}
const fn default_forager_contact() -> DoseResponse {
    DoseResponse {
        ld50: 0.6,
        slope: 1.08,
    }
}
const fn default_larval_oral() -> DoseResponse {
    DoseResponse {
        ld50: 0.0014,
        slope: 1.6,
    }
}
const fn default_nurse_filter_nectar() -> f64 {
    0.25
}
const fn default_nurse_filter_pollen() -> f64 {
    1.0
}

/// How adult workers turn absorbed toxicant into deaths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectModel {
    /// The day's dose is read off the log-logistic curve and then cleared.
    #[default]
    DoseResponse,
    /// Toxicokinetic-toxicodynamic model with stochastic death.
    GutsSd,
    /// Toxicokinetic-toxicodynamic model with individual tolerance.
    GutsIt,
}

/// Rate constants of the toxicokinetic-toxicodynamic effect model.
///
/// Oral and contact residues on the bee decay exponentially; scaled damage
/// follows their sum at rate `kd`. Under stochastic death the hazard grows
/// with damage above `mw_sd`; under individual tolerance a bee dies once its
/// damage passes its own threshold, thresholds being log-logistic around
/// `mw_it` with spread `f_s`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct GutsConfig {
    /// Daily decay rate of the oral residue.
    #[serde(default = "default_guts_k_sr")]
    pub k_sr: f64,
    /// Daily decay rate of the contact residue.
    #[serde(default = "default_guts_k_ca")]
    pub k_ca: f64,
    /// Integration substeps per day.
    #[serde(default = "default_guts_steps_per_day")]
    pub steps_per_day: u32,
    /// Damage recovery rate under stochastic death (1/d).
    #[serde(default = "default_guts_kd_sd")]
    pub kd_sd: f64,
    /// Damage threshold for the hazard under stochastic death (µg/bee).
    #[serde(default = "default_guts_mw_sd")]
    pub mw_sd: f64,
    /// Killing rate under stochastic death (1/(µg/bee)/d).
    #[serde(default = "default_guts_bw_sd")]
    pub bw_sd: f64,
    /// Damage recovery rate under individual tolerance (1/d).
    #[serde(default = "default_guts_kd_it")]
    pub kd_it: f64,
    /// Median tolerance threshold (µg/bee).
    #[serde(default = "default_guts_mw_it")]
    pub mw_it: f64,
    /// Ratio of the 95th to the 50th threshold percentile.
    #[serde(default = "default_guts_f_s")]
    pub f_s: f64,
}

const fn default_guts_k_sr() -> f64 {
    0.625
}
const fn default_guts_k_ca() -> f64 {
    0.4
}
const fn default_guts_steps_per_day() -> u32 {
    24
}
const fn default_guts_kd_sd() -> f64 {
    0.36
}
const fn default_guts_mw_sd() -> f64 {
    0.014
}
const fn default_guts_bw_sd() -> f64 {
    21.0
}
const fn default_guts_kd_it() -> f64 {
    0.012
}
const fn default_guts_mw_it() -> f64 {
    0.0024
}
const fn default_guts_f_s() -> f64 {
    3.0
}

impl Default for GutsConfig {
    fn default() -> Self {
        Self {
            k_sr: default_guts_k_sr(),
            k_ca: default_guts_k_ca(),
            steps_per_day: default_guts_steps_per_day(),
            kd_sd: default_guts_kd_sd(),
            mw_sd: default_guts_mw_sd(),
            bw_sd: default_guts_bw_sd(),
            kd_it: default_guts_kd_it(),
            mw_it: default_guts_mw_it(),
            f_s: default_guts_f_s(),
        }
    }
}

impl GutsConfig {
    fn validate(&self) -> Result<(), ColonyError> {
        if self.steps_per_day == 0 {
            return Err(ColonyError::InvalidParameter {
                name: "guts.steps_per_day",
                value: 0.0,
                reason: "must be at least 1",
            });
        }
        non_negative("guts.k_sr", self.k_sr)?;
        non_negative("guts.k_ca", self.k_ca)?;
        non_negative("guts.kd_sd", self.kd_sd)?;
        non_negative("guts.mw_sd", self.mw_sd)?;
        non_negative("guts.bw_sd", self.bw_sd)?;
        non_negative("guts.kd_it", self.kd_it)?;
        positive("guts.mw_it", self.mw_it)?;
        if self.f_s.is_finite() && self.f_s > 1.0 {
            Ok(())
        } else {
            Err(ColonyError::InvalidParameter {
                name: "guts.f_s",
                value: self.f_s,
                reason: "must be finite and greater than 1",
            })
        }
    }
}

/// Dose-response curves and nurse filtering.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ToxicityConfig {
    /// Oral curve for in-hive adults and foragers.
    #[serde(default = "default_adult_oral")]
    pub adult_oral: DoseResponse,
    /// Contact curve for foragers exposed in the field.
    #[serde(default = "default_forager_contact")]
    pub forager_contact: DoseResponse,
    /// Oral curve for larvae.
    #[serde(default = "default_larval_oral")]
    pub larval_oral: DoseResponse,
    /// Fraction of nectar-borne toxicant passed by nurses to larvae.
    #[serde(default = "default_nurse_filter_nectar")]
    pub nurse_filter_nectar: f64,
    /// Fraction of pollen-borne toxicant passed by nurses to larvae.
    #[serde(default = "default_nurse_filter_pollen")]
    pub nurse_filter_pollen: f64,
    /// Effect model for in-hive workers and foragers.
    ///
    /// Drones and larvae always use their dose-response curves.
    #[serde(default)]
    pub effect_model: EffectModel,
    /// Rate constants used when a GUTS effect model is selected.
    #[serde(default)]
    pub guts: GutsConfig,
}

impl Default for ToxicityConfig {
    fn default() -> Self {
        Self {
            adult_oral: default_adult_oral(),
            forager_contact: default_forager_contact(),
            larval_oral: default_larval_oral(),
            nurse_filter_nectar: default_nurse_filter_nectar(),
            nurse_filter_pollen: default_nurse_filter_pollen(),
            effect_model: EffectModel::default(),
            guts: GutsConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Bundle
// ---------------------------------------------------------------------------

/// Every biological parameter of the colony.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct ColonyParams {
    /// Stage lengths.
    #[serde(default)]
    pub development: DevelopmentConfig,
    /// Background mortality.
    #[serde(default)]
    pub mortality: MortalityConfig,
    /// Per-capita needs.
    #[serde(default)]
    pub needs: NeedsConfig,
    /// Nurse workforce.
    #[serde(default)]
    pub nursing: NursingConfig,
    /// Dose-response and nurse filtering.
    #[serde(default)]
    pub toxicity: ToxicityConfig,
}

impl ColonyParams {
    /// Reject parameters the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ColonyError::ZeroLengthStage`] for any stage lasting zero
    /// days and [`ColonyError::InvalidParameter`] for out-of-range values.
    pub fn validate(&self) -> Result<(), ColonyError> {
        for caste in Caste::ALL {
            self.development.caste(caste).validate(caste)?;
            let rates = self.mortality.caste(caste);
            for stage in Stage::ALL {
                probability("mortality rate", rates.rate(stage))?;
            }
        }
        if self.development.forager_days() == 0 {
            return Err(ColonyError::InvalidParameter {
                name: "worker_max_lifespan",
                value: f64::from(self.development.worker_max_lifespan),
                reason: "must exceed the worker in-hive stage",
            });
        }
        probability("forager mortality rate", self.mortality.forager)?;

        non_negative("honey.worker_resting", self.needs.honey.worker_resting)?;
        non_negative("honey.worker_nurse", self.needs.honey.worker_nurse)?;
        non_negative("honey.worker_larva_total", self.needs.honey.worker_larva_total)?;
        non_negative("honey.drone_larva", self.needs.honey.drone_larva)?;
        non_negative("honey.drone", self.needs.honey.drone)?;
        non_negative("pollen.worker_larva_total", self.needs.pollen.worker_larva_total)?;
        non_negative("pollen.drone_larva", self.needs.pollen.drone_larva)?;
        non_negative("pollen.worker", self.needs.pollen.worker)?;
        non_negative("pollen.drone", self.needs.pollen.drone)?;
        positive("honey_energy_kj_per_g", self.needs.honey_energy_kj_per_g)?;

        positive("max_brood_nurse_ratio", self.nursing.max_brood_nurse_ratio)?;
        probability(
            "forager_nursing_contribution",
            self.nursing.forager_nursing_contribution,
        )?;
        if self.nursing.nurse_age_min > self.nursing.nurse_age_max {
            return Err(ColonyError::InvalidParameter {
                name: "nurse_age_min",
                value: f64::from(self.nursing.nurse_age_min),
                reason: "must not exceed nurse_age_max",
            });
        }

        for response in [
            self.toxicity.adult_oral,
            self.toxicity.forager_contact,
            self.toxicity.larval_oral,
        ] {
            positive("ld50", response.ld50)?;
            positive("slope", response.slope)?;
        }
        probability("nurse_filter_nectar", self.toxicity.nurse_filter_nectar)?;
        probability("nurse_filter_pollen", self.toxicity.nurse_filter_pollen)?;
        self.toxicity.guts.validate()
    }
}

fn probability(name: &'static str, value: f64) -> Result<(), ColonyError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ColonyError::InvalidParameter {
            name,
            value,
            reason: "must lie in [0, 1]",
        })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ColonyError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ColonyError::InvalidParameter {
            name,
            value,
            reason: "must be finite and non-negative",
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ColonyError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ColonyError::InvalidParameter {
            name,
            value,
            reason: "must be finite and positive",
        })
    }
}
