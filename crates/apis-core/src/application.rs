//! Field residues left by a scheduled toxicant application.
//!
//! The schedule tracks three residue levels that foragers pick up in the
//! field: toxicant per unit nectar energy, toxicant per gram of pollen, and
//! the contact dose a forager receives in flight. Each exposure year the
//! application on `app_day` adds to the residues; on the following days
//! they decay with the whole-plant half-life until `exposure_period` days
//! after the application, when they are cleared.
//!
//! Nectar residues are configured per kilogram of nectar and converted to
//! µg/kJ through the nectar density and sugar energy:
//!
//! ```text
//! c_kJ = (c_kg / (1 - 0.1047 s)) / s / (10^6 * sucrose)
//! ```
//!
//! where `s` is the nectar sugar concentration (mol/l).

use tracing::info;

use crate::clock::DAYS_PER_YEAR;
use crate::config::ApplicationConfig;

/// Slope of nectar density (kg/l) against sugar concentration (mol/l).
pub const NECTAR_DENSITY_SLOPE: f64 = 0.1047;

/// Scales mol/l and µg/kg to µmol and kJ.
const NECTAR_UNIT_SCALE: f64 = 1_000_000.0;

/// Grams per kilogram.
const G_PER_KG: f64 = 1000.0;

/// Body mass of a forager (g) picking up surface residue.
const CONTACT_SCALE: f64 = 0.1;

/// Residue levels in the field on one day.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ResidueLevels {
    /// Toxicant per unit nectar energy (µg/kJ).
    pub nectar_ug_per_kj: f64,
    /// Toxicant per gram of pollen (µg/g).
    pub pollen_ug_per_g: f64,
    /// Contact dose per forager per day in the field (µg).
    pub contact_ug: f64,
}

impl ResidueLevels {
    fn is_clear(&self) -> bool {
        self.nectar_ug_per_kj + self.pollen_ug_per_g + self.contact_ug <= 0.0
    }

    fn decay(&mut self, factor: f64) {
        self.nectar_ug_per_kj *= factor;
        self.pollen_ug_per_g *= factor;
        self.contact_ug *= factor;
    }
}

/// Day-by-day residue levels of a configured application.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ApplicationSchedule {
    config: ApplicationConfig,
    levels: ResidueLevels,
}

impl ApplicationSchedule {
    /// Create a schedule with clean fields.
    pub const fn new(config: ApplicationConfig) -> Self {
        Self {
            config,
            levels: ResidueLevels {
                nectar_ug_per_kj: 0.0,
                pollen_ug_per_g: 0.0,
                contact_ug: 0.0,
            },
        }
    }

    /// Residue levels of the last updated day.
    pub const fn levels(&self) -> ResidueLevels {
        self.levels
    }

    /// Residues added by one application.
    pub fn application_residues(&self) -> ResidueLevels {
        let app = &self.config;
        let sugar = app.nectar_sugar_concentration;
        let nectar_ug_per_kj = if sugar > 0.0 {
            app.nectar_ug_per_kg / NECTAR_DENSITY_SLOPE.mul_add(-sugar, 1.0)
                / sugar
                / (NECTAR_UNIT_SCALE * app.sucrose_kj_per_umol)
        } else {
            0.0
        };
        ResidueLevels {
            nectar_ug_per_kj,
            pollen_ug_per_g: app.pollen_ug_per_kg / G_PER_KG,
            contact_ug: app.contact_exposure_kg_per_ha * app.rud * CONTACT_SCALE,
        }
    }

    /// Returns `true` if `year` is one of the exposure years.
    pub const fn is_exposure_year(&self, year: u64) -> bool {
        year >= self.config.spinup_years
            && year < self.config.spinup_years.saturating_add(self.config.exposure_years)
    }

    /// Move the residues to `day_of_year` of `year` and return them.
    ///
    /// Must be called once per simulated day, in order.
    pub fn update(&mut self, day_of_year: u64, year: u64) -> ResidueLevels {
        let app = self.config;
        if !app.enabled {
            return self.levels;
        }
        let exposure_year = self.is_exposure_year(year);
        if !exposure_year && self.levels.is_clear() {
            return self.levels;
        }

        let application_day = day_of_year == app.app_day;
        if application_day && exposure_year {
            let added = self.application_residues();
            self.levels.nectar_ug_per_kj += added.nectar_ug_per_kj;
            self.levels.pollen_ug_per_g += added.pollen_ug_per_g;
            self.levels.contact_ug += added.contact_ug;
            info!(
                day_of_year,
                year,
                nectar_ug_per_kj = self.levels.nectar_ug_per_kj,
                pollen_ug_per_g = self.levels.pollen_ug_per_g,
                contact_ug = self.levels.contact_ug,
                "Toxicant applied"
            );
        }
        if app.contact_on_application_day_only && !application_day {
            self.levels.contact_ug = 0.0;
        }

        let window_end = app.app_day.saturating_add(app.exposure_period);
        if day_of_year >= window_end || self.is_final_clearance(day_of_year, year) {
            self.levels = ResidueLevels::default();
        } else if !application_day {
            self.levels
                .decay((-core::f64::consts::LN_2 / app.plant_dt50_days).exp());
        }
        self.levels
    }

    /// The day the last exposure window closes, counted from the run start.
    ///
    /// Covers windows that run past the end of the final exposure year.
    fn is_final_clearance(&self, day_of_year: u64, year: u64) -> bool {
        let app = &self.config;
        let last_year = app
            .spinup_years
            .saturating_add(app.exposure_years)
            .saturating_sub(1);
        let today = year.saturating_mul(DAYS_PER_YEAR).saturating_add(day_of_year);
        let clearance = last_year
            .saturating_mul(DAYS_PER_YEAR)
            .saturating_add(app.app_day)
            .saturating_add(app.exposure_period);
        today == clearance
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn enabled() -> ApplicationConfig {
        ApplicationConfig {
            enabled: true,
            ..ApplicationConfig::default()
        }
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-9 * a.abs().max(b.abs()).max(1.0)
    }

    #[test]
    fn disabled_schedule_stays_clean() {
        let mut schedule = ApplicationSchedule::new(ApplicationConfig::default());
        for day in 0..365 {
            assert_eq!(schedule.update(day, 0), ResidueLevels::default());
        }
    }

    #[test]
    fn application_converts_units() {
        let schedule = ApplicationSchedule::new(enabled());
        let residues = schedule.application_residues();
        let expected_nectar = 990.0 / (1.0 - 0.1047 * 1.5) / 1.5 / (1e6 * 0.00582);
        assert!(close(residues.nectar_ug_per_kj, expected_nectar));
        assert!(close(residues.pollen_ug_per_g, 26.631));
        assert!(close(residues.contact_ug, 0.63));
    }

    #[test]
    fn residues_decay_then_clear() {
        let config = enabled();
        let mut schedule = ApplicationSchedule::new(config);
        for day in 0..config.app_day {
            assert_eq!(schedule.update(day, 0), ResidueLevels::default());
        }
        let applied = schedule.update(config.app_day, 0);
        assert!(applied.pollen_ug_per_g > 0.0);

        let next = schedule.update(config.app_day + 1, 0);
        let factor = (-core::f64::consts::LN_2 / config.plant_dt50_days).exp();
        assert!(close(next.pollen_ug_per_g, applied.pollen_ug_per_g * factor));

        for day in config.app_day + 2..config.app_day + config.exposure_period {
            assert!(schedule.update(day, 0).pollen_ug_per_g > 0.0);
        }
        let cleared = schedule.update(config.app_day + config.exposure_period, 0);
        assert_eq!(cleared, ResidueLevels::default());
    }

    #[test]
    fn no_application_outside_exposure_years() {
        let config = ApplicationConfig {
            spinup_years: 1,
            exposure_years: 1,
            ..enabled()
        };
        let mut schedule = ApplicationSchedule::new(config);
        assert_eq!(schedule.update(config.app_day, 0), ResidueLevels::default());
        assert!(schedule.update(config.app_day, 1).nectar_ug_per_kj > 0.0);
        let window_end = config.app_day + config.exposure_period;
        assert_eq!(schedule.update(window_end, 1), ResidueLevels::default());
        assert_eq!(schedule.update(config.app_day, 2), ResidueLevels::default());
    }

    #[test]
    fn contact_limited_to_application_day() {
        let config = ApplicationConfig {
            contact_on_application_day_only: true,
            ..enabled()
        };
        let mut schedule = ApplicationSchedule::new(config);
        assert!(schedule.update(config.app_day, 0).contact_ug > 0.0);
        let next = schedule.update(config.app_day + 1, 0);
        assert_eq!(next.contact_ug, 0.0);
        assert!(next.nectar_ug_per_kj > 0.0);
    }
}
