//! Configuration loading and typed config structures for the Apis simulation.
//!
//! The canonical configuration lives in `apis-config.yaml` at the project
//! root. This module defines strongly-typed structs that mirror the YAML
//! structure, and provides a loader that reads and validates the file.
//! Every field has a default, so an empty file describes the standard
//! colony without any toxicant application.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use apis_colony::{AccountingPolicy, ColonyError, ColonyParams, MortalityMode};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "APIS_CONFIG";

/// Configuration file used when [`CONFIG_PATH_ENV`] is unset.
pub const DEFAULT_CONFIG_PATH: &str = "apis-config.yaml";

/// Environment variable overriding `run.replicates`.
pub const REPLICATES_ENV: &str = "APIS_REPLICATES";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A value is outside its valid range.
    #[error("invalid config value {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What the value must satisfy.
        reason: String,
    },

    /// A biological parameter was rejected.
    #[error("invalid colony parameters: {source}")]
    Colony {
        /// The underlying parameter error.
        #[from]
        source: ColonyError,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Path of the configuration file: `$APIS_CONFIG` or `apis-config.yaml`.
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `apis-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Run length, seeds and behaviour variants.
    #[serde(default)]
    pub run: RunConfig,

    /// Biological parameters of the colony.
    #[serde(default)]
    pub colony: ColonyParams,

    /// Initial and maximum store contents.
    #[serde(default)]
    pub stores: StoresConfig,

    /// Initial population.
    #[serde(default)]
    pub population: PopulationConfig,

    /// Queen egg laying.
    #[serde(default)]
    pub laying: LayingConfig,

    /// Scheduled foraging.
    #[serde(default)]
    pub foraging: ForagingConfig,

    /// Toxicant application and in-hive fate.
    #[serde(default)]
    pub toxicant: ToxicantConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Report output.
    #[serde(default)]
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `APIS_REPLICATES` overrides `run.replicates`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, and
    /// [`ConfigError::Invalid`] if the override is not a number.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config: Self = serde_yml::from_str(yaml)?;
        config.run.apply_env_overrides()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for the first out-of-range value
    /// found and [`ConfigError::Colony`] for rejected colony parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.colony.validate()?;
        self.run.validate()?;
        self.stores.validate()?;
        self.laying.validate()?;
        self.foraging.validate()?;
        self.toxicant.validate()?;
        if self.logging.snapshot_interval_ticks == 0 {
            return Err(invalid("logging.snapshot_interval_ticks", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_owned(),
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be finite and non-negative, got {value}"),
        })
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be finite and positive, got {value}"),
        })
    }
}

fn day_of_year(field: &'static str, day: u64) -> Result<(), ConfigError> {
    if day < crate::clock::DAYS_PER_YEAR {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("must be a day of year below 365, got {day}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Run length, seeds and behaviour variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RunConfig {
    /// Seed of replicate 0; replicate `i` uses `seed + i`.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Number of independent replicates.
    #[serde(default = "default_replicates")]
    pub replicates: u32,

    /// Days simulated per replicate.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: u64,

    /// How group draws are sized.
    #[serde(default)]
    pub accounting_policy: AccountingPolicy,

    /// How dose deaths are turned into whole individuals.
    #[serde(default)]
    pub mortality_mode: MortalityMode,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            replicates: default_replicates(),
            max_ticks: default_max_ticks(),
            accounting_policy: AccountingPolicy::default(),
            mortality_mode: MortalityMode::default(),
        }
    }
}

impl RunConfig {
    /// Apply `APIS_REPLICATES` if it is set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if the value is not a whole number.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var(REPLICATES_ENV) {
            self.replicates = val.trim().parse().map_err(|e| ConfigError::Invalid {
                field: "run.replicates",
                reason: format!("{REPLICATES_ENV}={val}: {e}"),
            })?;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.replicates == 0 {
            return Err(invalid("run.replicates", "must be at least 1"));
        }
        if self.max_ticks == 0 {
            return Err(invalid("run.max_ticks", "must be at least 1"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Stores
// ---------------------------------------------------------------------------

/// Initial and maximum store contents.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct StoresConfig {
    /// Honey at setup (kg), all of it capped and uncontaminated.
    #[serde(default = "default_initial_honey_kg")]
    pub initial_honey_kg: f64,

    /// Honey the colony can store (kg).
    #[serde(default = "default_max_honey_kg")]
    pub max_honey_kg: f64,

    /// Pollen at setup (g).
    #[serde(default = "default_initial_pollen_g")]
    pub initial_pollen_g: f64,
}

impl Default for StoresConfig {
    fn default() -> Self {
        Self {
            initial_honey_kg: default_initial_honey_kg(),
            max_honey_kg: default_max_honey_kg(),
            initial_pollen_g: default_initial_pollen_g(),
        }
    }
}

impl StoresConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("stores.initial_honey_kg", self.initial_honey_kg)?;
        positive("stores.max_honey_kg", self.max_honey_kg)?;
        non_negative("stores.initial_pollen_g", self.initial_pollen_g)?;
        if self.initial_honey_kg > self.max_honey_kg {
            return Err(invalid(
                "stores.initial_honey_kg",
                "must not exceed stores.max_honey_kg",
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Population
// ---------------------------------------------------------------------------

/// Initial population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PopulationConfig {
    /// Foragers present at setup.
    #[serde(default = "default_initial_foragers")]
    pub initial_foragers: u32,

    /// Youngest forager ages the initial foragers are spread over.
    #[serde(default = "default_initial_forager_span")]
    pub initial_forager_span: u32,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            initial_foragers: default_initial_foragers(),
            initial_forager_span: default_initial_forager_span(),
        }
    }
}

// ---------------------------------------------------------------------------
// Laying
// ---------------------------------------------------------------------------

/// Queen egg laying.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LayingConfig {
    /// Eggs laid on the best day of the year.
    #[serde(default = "default_max_eggs_per_day")]
    pub max_eggs_per_day: f64,

    /// Brood (eggs, larvae and pupae) the comb can hold.
    #[serde(default = "default_max_brood_cells")]
    pub max_brood_cells: u64,

    /// First day of year on which drone eggs are laid.
    #[serde(default = "default_drone_season_start")]
    pub drone_season_start: u64,

    /// Last day of year on which drone eggs are laid.
    #[serde(default = "default_drone_season_end")]
    pub drone_season_end: u64,

    /// Share of the day's eggs laid as drones within the drone season.
    #[serde(default = "default_drone_egg_proportion")]
    pub drone_egg_proportion: f64,
}

impl Default for LayingConfig {
    fn default() -> Self {
        Self {
            max_eggs_per_day: default_max_eggs_per_day(),
            max_brood_cells: default_max_brood_cells(),
            drone_season_start: default_drone_season_start(),
            drone_season_end: default_drone_season_end(),
            drone_egg_proportion: default_drone_egg_proportion(),
        }
    }
}

impl LayingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        non_negative("laying.max_eggs_per_day", self.max_eggs_per_day)?;
        day_of_year("laying.drone_season_start", self.drone_season_start)?;
        day_of_year("laying.drone_season_end", self.drone_season_end)?;
        if !(0.0..=1.0).contains(&self.drone_egg_proportion) {
            return Err(invalid("laying.drone_egg_proportion", "must lie in [0, 1]"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Foraging
// ---------------------------------------------------------------------------

/// Scheduled foraging: a daily foraging period and per-forager yields.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ForagingConfig {
    /// First day of year with foraging.
    #[serde(default = "default_foraging_season_start")]
    pub season_start: u64,

    /// Last day of year with foraging.
    #[serde(default = "default_foraging_season_end")]
    pub season_end: u64,

    /// Foraging hours at the height of the season.
    #[serde(default = "default_max_foraging_hours")]
    pub max_hours: f64,

    /// Nectar energy one forager brings home per foraging hour (kJ).
    #[serde(default = "default_nectar_kj_per_forager_hour")]
    pub nectar_kj_per_forager_hour: f64,

    /// Pollen one forager brings home per foraging hour (g).
    #[serde(default = "default_pollen_g_per_forager_hour")]
    pub pollen_g_per_forager_hour: f64,
}

impl Default for ForagingConfig {
    fn default() -> Self {
        Self {
            season_start: default_foraging_season_start(),
            season_end: default_foraging_season_end(),
            max_hours: default_max_foraging_hours(),
            nectar_kj_per_forager_hour: default_nectar_kj_per_forager_hour(),
            pollen_g_per_forager_hour: default_pollen_g_per_forager_hour(),
        }
    }
}

impl ForagingConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        day_of_year("foraging.season_start", self.season_start)?;
        day_of_year("foraging.season_end", self.season_end)?;
        if self.season_start > self.season_end {
            return Err(invalid(
                "foraging.season_start",
                "must not be after foraging.season_end",
            ));
        }
        if !(0.0..=24.0).contains(&self.max_hours) {
            return Err(invalid("foraging.max_hours", "must lie in [0, 24]"));
        }
        non_negative(
            "foraging.nectar_kj_per_forager_hour",
            self.nectar_kj_per_forager_hour,
        )?;
        non_negative(
            "foraging.pollen_g_per_forager_hour",
            self.pollen_g_per_forager_hour,
        )
    }
}

// ---------------------------------------------------------------------------
// Toxicant
// ---------------------------------------------------------------------------

/// A single field application of the toxicant, repeated each exposure year.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ApplicationConfig {
    /// Whether any application takes place.
    #[serde(default)]
    pub enabled: bool,

    /// Day of year of the application.
    #[serde(default = "default_app_day")]
    pub app_day: u64,

    /// Days after the application day during which residues persist.
    #[serde(default = "default_exposure_period")]
    pub exposure_period: u64,

    /// Years before the first application.
    #[serde(default)]
    pub spinup_years: u64,

    /// Years with an application.
    #[serde(default = "default_exposure_years")]
    pub exposure_years: u64,

    /// Residue in field nectar right after application (µg/kg).
    #[serde(default = "default_nectar_ug_per_kg")]
    pub nectar_ug_per_kg: f64,

    /// Residue in field pollen right after application (µg/kg).
    #[serde(default = "default_pollen_ug_per_kg")]
    pub pollen_ug_per_kg: f64,

    /// Application rate relevant for contact exposure (kg/ha).
    #[serde(default = "default_contact_exposure_kg_per_ha")]
    pub contact_exposure_kg_per_ha: f64,

    /// Residue per unit dose ((ha·mg)/(kg·kg)).
    #[serde(default = "default_rud")]
    pub rud: f64,

    /// Whole-plant residue half-life (d).
    #[serde(default = "default_plant_dt50_days")]
    pub plant_dt50_days: f64,

    /// Contact exposure only on the application day itself.
    #[serde(default)]
    pub contact_on_application_day_only: bool,

    /// Sugar concentration of field nectar (mol/l).
    #[serde(default = "default_nectar_sugar_concentration")]
    pub nectar_sugar_concentration: f64,

    /// Energy content of sucrose (kJ/µmol).
    #[serde(default = "default_sucrose_kj_per_umol")]
    pub sucrose_kj_per_umol: f64,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            app_day: default_app_day(),
            exposure_period: default_exposure_period(),
            spinup_years: 0,
            exposure_years: default_exposure_years(),
            nectar_ug_per_kg: default_nectar_ug_per_kg(),
            pollen_ug_per_kg: default_pollen_ug_per_kg(),
            contact_exposure_kg_per_ha: default_contact_exposure_kg_per_ha(),
            rud: default_rud(),
            plant_dt50_days: default_plant_dt50_days(),
            contact_on_application_day_only: false,
            nectar_sugar_concentration: default_nectar_sugar_concentration(),
            sucrose_kj_per_umol: default_sucrose_kj_per_umol(),
        }
    }
}

/// Toxicant application and in-hive fate.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ToxicantConfig {
    /// The field application.
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Whether toxicant in stored honey degrades.
    #[serde(default)]
    pub honey_degradation: bool,

    /// Half-life of toxicant in stored honey (d).
    #[serde(default = "default_honey_dt50_days")]
    pub honey_dt50_days: f64,
}

impl Default for ToxicantConfig {
    fn default() -> Self {
        Self {
            application: ApplicationConfig::default(),
            honey_degradation: false,
            honey_dt50_days: default_honey_dt50_days(),
        }
    }
}

impl ToxicantConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let app = &self.application;
        day_of_year("toxicant.application.app_day", app.app_day)?;
        non_negative("toxicant.application.nectar_ug_per_kg", app.nectar_ug_per_kg)?;
        non_negative("toxicant.application.pollen_ug_per_kg", app.pollen_ug_per_kg)?;
        non_negative(
            "toxicant.application.contact_exposure_kg_per_ha",
            app.contact_exposure_kg_per_ha,
        )?;
        non_negative("toxicant.application.rud", app.rud)?;
        positive("toxicant.application.plant_dt50_days", app.plant_dt50_days)?;
        positive(
            "toxicant.application.sucrose_kj_per_umol",
            app.sucrose_kj_per_umol,
        )?;
        positive(
            "toxicant.application.nectar_sugar_concentration",
            app.nectar_sugar_concentration,
        )?;
        if crate::application::NECTAR_DENSITY_SLOPE * app.nectar_sugar_concentration >= 1.0 {
            return Err(invalid(
                "toxicant.application.nectar_sugar_concentration",
                "is above the range of the nectar density relation",
            ));
        }
        positive("toxicant.honey_dt50_days", self.honey_dt50_days)
    }
}

// ---------------------------------------------------------------------------
// Logging and output
// ---------------------------------------------------------------------------

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Ticks between recorded colony snapshots.
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            snapshot_interval_ticks: default_snapshot_interval_ticks(),
        }
    }
}

/// Report output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct OutputConfig {
    /// File the JSON report is written to; stdout when unset.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Default value functions for serde
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_replicates() -> u32 {
    1
}

const fn default_max_ticks() -> u64 {
    365
}

const fn default_initial_honey_kg() -> f64 {
    25.0
}

const fn default_max_honey_kg() -> f64 {
    50.0
}

const fn default_initial_pollen_g() -> f64 {
    100.0
}

const fn default_initial_foragers() -> u32 {
    10_000
}

const fn default_initial_forager_span() -> u32 {
    90
}

const fn default_max_eggs_per_day() -> f64 {
    1600.0
}

const fn default_max_brood_cells() -> u64 {
    200_000
}

const fn default_drone_season_start() -> u64 {
    115
}

const fn default_drone_season_end() -> u64 {
    240
}

const fn default_drone_egg_proportion() -> f64 {
    0.04
}

const fn default_foraging_season_start() -> u64 {
    60
}

const fn default_foraging_season_end() -> u64 {
    300
}

const fn default_max_foraging_hours() -> f64 {
    12.0
}

const fn default_nectar_kj_per_forager_hour() -> f64 {
    0.1
}

const fn default_pollen_g_per_forager_hour() -> f64 {
    0.004
}

const fn default_app_day() -> u64 {
    189
}

const fn default_exposure_period() -> u64 {
    8
}

const fn default_exposure_years() -> u64 {
    3
}

const fn default_nectar_ug_per_kg() -> f64 {
    990.0
}

const fn default_pollen_ug_per_kg() -> f64 {
    26_631.0
}

const fn default_contact_exposure_kg_per_ha() -> f64 {
    0.3
}

const fn default_rud() -> f64 {
    21.0
}

const fn default_plant_dt50_days() -> f64 {
    1000.0
}

const fn default_nectar_sugar_concentration() -> f64 {
    1.5
}

const fn default_sucrose_kj_per_umol() -> f64 {
    0.00582
}

const fn default_honey_dt50_days() -> f64 {
    60.0
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_snapshot_interval_ticks() -> u64 {
    30
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert_eq!(config.run.seed, 42);
        assert_eq!(config.run.max_ticks, 365);
        assert_eq!(config.stores.initial_honey_kg, 25.0);
        assert_eq!(config.laying.max_brood_cells, 200_000);
        assert!(!config.toxicant.application.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r"
run:
  seed: 7
  max_ticks: 730
  accounting_policy: entitled
  mortality_mode: small_cohort_stochastic
colony:
  development:
    worker:
      eggs: 3
      larvae: 6
      pupae: 12
      in_hive: 18
  toxicity:
    nurse_filter_nectar: 0.5
stores:
  initial_honey_kg: 10
laying:
  drone_egg_proportion: 0.1
foraging:
  max_hours: 10
toxicant:
  application:
    enabled: true
    app_day: 150
    exposure_years: 1
  honey_degradation: true
  honey_dt50_days: 30
logging:
  level: debug
  snapshot_interval_ticks: 7
output:
  path: report.json
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.run.seed, 7);
        assert_eq!(config.run.max_ticks, 730);
        assert_eq!(config.run.accounting_policy, AccountingPolicy::Entitled);
        assert_eq!(
            config.run.mortality_mode,
            MortalityMode::SmallCohortStochastic
        );
        assert_eq!(config.colony.development.worker.in_hive, 18);
        assert_eq!(config.colony.development.drone.in_hive, 37);
        assert_eq!(config.colony.toxicity.nurse_filter_nectar, 0.5);
        assert_eq!(config.colony.toxicity.nurse_filter_pollen, 1.0);
        assert_eq!(config.stores.initial_honey_kg, 10.0);
        assert_eq!(config.stores.max_honey_kg, 50.0);
        assert_eq!(config.laying.drone_egg_proportion, 0.1);
        assert_eq!(config.foraging.max_hours, 10.0);
        assert!(config.toxicant.application.enabled);
        assert_eq!(config.toxicant.application.app_day, 150);
        assert_eq!(config.toxicant.application.nectar_ug_per_kg, 990.0);
        assert!(config.toxicant.honey_degradation);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.snapshot_interval_ticks, 7);
        assert_eq!(config.output.path, Some(PathBuf::from("report.json")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parse_empty_yaml() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config.run.max_ticks, 365);
        assert_eq!(config.colony, ColonyParams::default());
    }

    #[test]
    fn zero_length_stage_is_rejected_at_setup() {
        let yaml = "colony:\n  development:\n    drone:\n      eggs: 3\n      larvae: 0\n      pupae: 14\n      in_hive: 37\n";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Colony {
                source: ColonyError::ZeroLengthStage { .. }
            })
        ));
    }

    #[test]
    fn initial_honey_above_capacity_is_rejected() {
        let mut config = SimulationConfig::default();
        config.stores.initial_honey_kg = 60.0;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "stores.initial_honey_kg",
                ..
            }
        ));
    }

    #[test]
    fn non_positive_half_life_is_rejected() {
        let mut config = SimulationConfig::default();
        config.toxicant.honey_dt50_days = 0.0;
        assert!(config.validate().is_err());

        let mut config = SimulationConfig::default();
        config.toxicant.application.plant_dt50_days = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_foraging_season_is_rejected() {
        let mut config = SimulationConfig::default();
        config.foraging.season_start = 200;
        config.foraging.season_end = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_yaml_is_yaml_error() {
        let err = SimulationConfig::parse("run: [unterminated").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn load_project_config_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../apis-config.yaml");
        let config = SimulationConfig::from_file(&path).unwrap();
        assert!(config.validate().is_ok());
        assert!(config.toxicant.application.enabled);
        assert_eq!(
            config.colony.toxicity.effect_model,
            apis_colony::EffectModel::DoseResponse
        );
        assert_eq!(config.colony.toxicity.guts.steps_per_day, 24);
    }
}
