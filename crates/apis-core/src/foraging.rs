//! Foraging source trait and the scheduled stand-in.
//!
//! Once per tick, after mortality, the tick cycle asks a [`ForagingSource`]
//! what the foragers brought home: nectar energy and pollen with their
//! toxicant concentrations, plus the contact dose each forager picked up in
//! flight. The source could be a spatial foraging model, recorded field
//! data or a test script.
//!
//! [`ScheduledForaging`] is the stand-in shipped with the engine. Foraging
//! hours follow a sine over the foraging season, yields are a fixed amount
//! per forager-hour, and contamination comes from an
//! [`ApplicationSchedule`].

use tracing::debug;

use crate::application::{ApplicationSchedule, ResidueLevels};
use crate::config::{ApplicationConfig, ForagingConfig};

/// What the tick cycle tells the foraging source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForagingContext {
    /// The current tick.
    pub tick: u64,
    /// Zero-based day of year.
    pub day_of_year: u64,
    /// Zero-based year.
    pub year: u64,
    /// Living foragers after mortality.
    pub foragers: u64,
}

/// One day's returns from the field.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ForagingYield {
    /// Nectar energy brought home (kJ).
    pub nectar_kj: f64,
    /// Toxicant per unit nectar energy (µg/kJ).
    pub nectar_concentration: f64,
    /// Pollen brought home (g).
    pub pollen_g: f64,
    /// Toxicant per gram of pollen (µg/g).
    pub pollen_concentration: f64,
    /// Contact dose absorbed by each forager in flight (µg).
    pub contact_dose: f64,
}

/// A source of daily foraging returns.
///
/// Implementations are owned by one replicate and called exactly once per
/// tick, in tick order.
pub trait ForagingSource: Send {
    /// Report the day's returns for the given context.
    fn forage(&mut self, ctx: &ForagingContext) -> ForagingYield;
}

/// Foraging driven by configuration and an application schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduledForaging {
    config: ForagingConfig,
    schedule: ApplicationSchedule,
}

impl ScheduledForaging {
    /// Create a source from the foraging and application settings.
    pub const fn new(config: ForagingConfig, application: ApplicationConfig) -> Self {
        Self {
            config,
            schedule: ApplicationSchedule::new(application),
        }
    }

    /// Field residues of the last foraged day.
    pub const fn residues(&self) -> ResidueLevels {
        self.schedule.levels()
    }

    /// Foraging hours on `day_of_year`.
    ///
    /// Zero outside the season; inside it a half sine that peaks mid-season.
    pub fn foraging_hours(&self, day_of_year: u64) -> f64 {
        let ForagingConfig {
            season_start,
            season_end,
            max_hours,
            ..
        } = self.config;
        if !(season_start..=season_end).contains(&day_of_year) {
            return 0.0;
        }
        let into_season = crate::count_to_f64(day_of_year.saturating_sub(season_start)) + 1.0;
        let season_length = crate::count_to_f64(season_end.saturating_sub(season_start)) + 2.0;
        max_hours * (core::f64::consts::PI * into_season / season_length).sin()
    }
}

impl ForagingSource for ScheduledForaging {
    fn forage(&mut self, ctx: &ForagingContext) -> ForagingYield {
        let residues = self.schedule.update(ctx.day_of_year, ctx.year);
        let hours = self.foraging_hours(ctx.day_of_year);
        if hours <= 0.0 || ctx.foragers == 0 {
            return ForagingYield {
                nectar_concentration: residues.nectar_ug_per_kj,
                pollen_concentration: residues.pollen_ug_per_g,
                ..ForagingYield::default()
            };
        }

        let forager_hours = crate::count_to_f64(ctx.foragers) * hours;
        let returns = ForagingYield {
            nectar_kj: forager_hours * self.config.nectar_kj_per_forager_hour,
            nectar_concentration: residues.nectar_ug_per_kj,
            pollen_g: forager_hours * self.config.pollen_g_per_forager_hour,
            pollen_concentration: residues.pollen_ug_per_g,
            contact_dose: residues.contact_ug,
        };
        debug!(
            tick = ctx.tick,
            hours,
            nectar_kj = returns.nectar_kj,
            pollen_g = returns.pollen_g,
            contact_dose = returns.contact_dose,
            "Foragers returned"
        );
        returns
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;

    fn context(day_of_year: u64, foragers: u64) -> ForagingContext {
        ForagingContext {
            tick: day_of_year + 1,
            day_of_year,
            year: 0,
            foragers,
        }
    }

    #[test]
    fn no_foraging_outside_season() {
        let mut source = ScheduledForaging::new(ForagingConfig::default(), ApplicationConfig::default());
        let returns = source.forage(&context(10, 5_000));
        assert_eq!(returns.nectar_kj, 0.0);
        assert_eq!(returns.pollen_g, 0.0);
    }

    #[test]
    fn foraging_hours_peak_mid_season() {
        let source = ScheduledForaging::new(ForagingConfig::default(), ApplicationConfig::default());
        let early = source.foraging_hours(61);
        let middle = source.foraging_hours(180);
        assert!(early > 0.0);
        assert!(middle > early);
        assert!(middle <= 12.0);
    }

    #[test]
    fn yield_scales_with_foragers() {
        let mut a = ScheduledForaging::new(ForagingConfig::default(), ApplicationConfig::default());
        let mut b = a;
        let one = a.forage(&context(180, 1_000));
        let two = b.forage(&context(180, 2_000));
        assert!((two.nectar_kj - 2.0 * one.nectar_kj).abs() < 1e-9);
        assert!((two.pollen_g - 2.0 * one.pollen_g).abs() < 1e-9);
        assert_eq!(one.contact_dose, 0.0);
    }

    #[test]
    fn application_contaminates_returns() {
        let application = ApplicationConfig {
            enabled: true,
            ..ApplicationConfig::default()
        };
        let mut source = ScheduledForaging::new(ForagingConfig::default(), application);
        let returns = source.forage(&context(application.app_day, 1_000));
        assert!(returns.nectar_concentration > 0.0);
        assert!(returns.pollen_concentration > 0.0);
        assert!(returns.contact_dose > 0.0);
    }
}
