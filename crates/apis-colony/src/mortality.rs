//! Background and dose-dependent mortality.
//!
//! For every age slot of a cohort, once per tick:
//!
//! 1. **Background**: deaths ~ Poisson(rate x count), capped at the count.
//! 2. **Dose**: if the pending dose exceeds [`DOSE_THRESHOLD`], the
//!    log-logistic curve gives the lethal fraction
//!    `1 - 1 / (1 + (dose / LD50)^slope)`, saturated to 1 at
//!    [`LETHAL_CEILING`]. Deaths are `round(count x fraction)`, or one
//!    Bernoulli trial per individual for small cohorts when
//!    [`MortalityMode::SmallCohortStochastic`] is selected.
//! 3. The slot's dose is reset to zero.
//!
//! Survivors are always in `[0, count]`; mortality never fails.

use rand::Rng;
use rand_distr::{Distribution, Poisson};
use serde::{Deserialize, Serialize};

use crate::config::DoseResponse;
use crate::dose::DoseArray;

/// Doses at or below this value are treated as no exposure.
pub const DOSE_THRESHOLD: f64 = 1e-20;

/// Lethal fractions at or above this value are treated as certain death.
pub const LETHAL_CEILING: f64 = 0.99;

/// Largest cohort sampled per individual in small-cohort mode.
pub const SMALL_COHORT_LIMIT: u32 = 100;

/// How dose-dependent deaths are turned into whole individuals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MortalityMode {
    /// Deaths are the rounded expectation.
    #[default]
    Deterministic,
    /// Cohorts of at most [`SMALL_COHORT_LIMIT`] individuals are sampled
    /// one Bernoulli trial per individual.
    SmallCohortStochastic,
}

impl DoseResponse {
    /// Fraction of exposed individuals killed by `dose`.
    ///
    /// Monotone non-decreasing in dose, bounded in `[0, 1]`, exactly 0.5 at
    /// the LD50 and 1 once the curve passes [`LETHAL_CEILING`].
    pub fn lethal_fraction(&self, dose: f64) -> f64 {
        if dose.is_nan() || dose <= DOSE_THRESHOLD || self.ld50 <= 0.0 {
            return 0.0;
        }
        let fraction = 1.0 - 1.0 / (1.0 + (dose / self.ld50).powf(self.slope));
        if fraction >= LETHAL_CEILING {
            1.0
        } else {
            fraction.clamp(0.0, 1.0)
        }
    }
}

/// Deaths removed by one mortality pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MortalityTally {
    /// Deaths from background mortality.
    pub background: u64,
    /// Deaths from toxicant exposure.
    pub toxic: u64,
}

impl MortalityTally {
    /// Add another tally to this one.
    pub const fn absorb(&mut self, other: Self) {
        self.background = self.background.saturating_add(other.background);
        self.toxic = self.toxic.saturating_add(other.toxic);
    }

    /// All deaths.
    pub const fn total(&self) -> u64 {
        self.background.saturating_add(self.toxic)
    }
}

/// Convert a non-negative real number of individuals to a whole count.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_individuals(value: f64, cap: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        return 0;
    }
    value.min(f64::from(cap)) as u32
}

/// Applies background and dose-dependent mortality to cohorts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MortalityEngine {
    mode: MortalityMode,
}

impl MortalityEngine {
    /// Create an engine using the given sampling mode.
    pub const fn new(mode: MortalityMode) -> Self {
        Self { mode }
    }

    /// The sampling mode chosen at setup.
    pub const fn mode(self) -> MortalityMode {
        self.mode
    }

    /// Sample background deaths among `count` individuals.
    pub fn background_deaths<R: Rng + ?Sized>(self, count: u32, rate: f64, rng: &mut R) -> u32 {
        let lambda = rate * f64::from(count);
        if count == 0 || lambda.is_nan() || lambda <= 0.0 {
            return 0;
        }
        match Poisson::new(lambda) {
            Ok(poisson) => whole_individuals(poisson.sample(rng), count),
            Err(_) => whole_individuals(lambda.round(), count),
        }
    }

    /// Deaths among `count` individuals that each absorbed `dose`.
    pub fn dose_deaths<R: Rng + ?Sized>(
        self,
        count: u32,
        dose: f64,
        response: &DoseResponse,
        rng: &mut R,
    ) -> u32 {
        self.deaths_for_fraction(count, response.lethal_fraction(dose), rng)
    }

    /// Deaths among `count` individuals that each die with `fraction`.
    ///
    /// Fractions at or below zero kill nobody, at or above one kill all.
    pub fn deaths_for_fraction<R: Rng + ?Sized>(
        self,
        count: u32,
        fraction: f64,
        rng: &mut R,
    ) -> u32 {
        if count == 0 || fraction.is_nan() || fraction <= 0.0 {
            return 0;
        }
        if fraction >= 1.0 {
            return count;
        }
        match self.mode {
            MortalityMode::SmallCohortStochastic if count <= SMALL_COHORT_LIMIT => {
                let mut deaths = 0_u32;
                for _ in 0..count {
                    if rng.random::<f64>() < fraction {
                        deaths = deaths.saturating_add(1);
                    }
                }
                deaths
            }
            MortalityMode::Deterministic | MortalityMode::SmallCohortStochastic => {
                whole_individuals((f64::from(count) * fraction).round(), count)
            }
        }
    }

    /// Apply mortality to every age slot and reset the doses.
    ///
    /// `doses` is `None` for stages that do not feed (eggs, pupae) and for
    /// groups whose toxic deaths come from the GUTS model; they only receive
    /// background mortality here.
    pub fn apply<R: Rng + ?Sized>(
        self,
        counts: &mut [u32],
        mut doses: Option<&mut DoseArray>,
        rate: f64,
        response: &DoseResponse,
        rng: &mut R,
    ) -> MortalityTally {
        let mut tally = MortalityTally::default();
        for (age, count) in counts.iter_mut().enumerate() {
            let background = self.background_deaths(*count, rate, rng);
            *count = count.saturating_sub(background);
            tally.background = tally.background.saturating_add(u64::from(background));

            if let Some(doses) = doses.as_deref() {
                let toxic = self.dose_deaths(*count, doses.get(age), response, rng);
                *count = count.saturating_sub(toxic);
                tally.toxic = tally.toxic.saturating_add(u64::from(toxic));
            }
        }
        if let Some(doses) = doses.as_deref_mut() {
            doses.reset();
        }
        tally
    }

    /// Apply only dose-dependent mortality to a single group.
    ///
    /// Used for individuals whose pending dose crossed a stage boundary
    /// during the age shift. Returns the survivors.
    pub fn apply_carried_dose<R: Rng + ?Sized>(
        self,
        count: u32,
        dose: f64,
        response: &DoseResponse,
        rng: &mut R,
    ) -> u32 {
        count.saturating_sub(self.dose_deaths(count, dose, response, rng))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    const UNIT_SLOPE: DoseResponse = DoseResponse {
        ld50: 2.0,
        slope: 1.0,
    };

    #[test]
    fn lethal_fraction_is_half_at_ld50() {
        assert!((UNIT_SLOPE.lethal_fraction(2.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn lethal_fraction_is_monotone_and_bounded() {
        let response = DoseResponse {
            ld50: 0.0014,
            slope: 1.6,
        };
        let mut previous = 0.0;
        for step in 0..200 {
            let dose = f64::from(step) * 0.0002;
            let fraction = response.lethal_fraction(dose);
            assert!((0.0..=1.0).contains(&fraction));
            assert!(fraction >= previous);
            previous = fraction;
        }
    }

    #[test]
    fn lethal_fraction_saturates_at_ceiling() {
        // (d/LD50) = 100 with slope 1 gives 100/101 > 0.99.
        assert_eq!(UNIT_SLOPE.lethal_fraction(200.0), 1.0);
        assert_eq!(UNIT_SLOPE.lethal_fraction(0.0), 0.0);
        assert_eq!(UNIT_SLOPE.lethal_fraction(1e-21), 0.0);
    }

    #[test]
    fn deterministic_deaths_round_expectation() {
        let engine = MortalityEngine::new(MortalityMode::Deterministic);
        let mut rng = SmallRng::seed_from_u64(42);
        assert_eq!(engine.dose_deaths(100, 2.0, &UNIT_SLOPE, &mut rng), 50);
        // 7 x 0.5 = 3.5 rounds away from zero.
        assert_eq!(engine.dose_deaths(7, 2.0, &UNIT_SLOPE, &mut rng), 4);
    }

    #[test]
    fn stochastic_small_cohort_stays_within_bounds() {
        let engine = MortalityEngine::new(MortalityMode::SmallCohortStochastic);
        let mut rng = SmallRng::seed_from_u64(42);
        let mut total = 0_u32;
        for _ in 0..200 {
            let deaths = engine.dose_deaths(10, 2.0, &UNIT_SLOPE, &mut rng);
            assert!(deaths <= 10);
            total += deaths;
        }
        // Expectation is 1000; allow generous sampling noise.
        assert!((800..=1200).contains(&total), "total deaths {total}");
    }

    #[test]
    fn stochastic_mode_is_deterministic_above_limit() {
        let engine = MortalityEngine::new(MortalityMode::SmallCohortStochastic);
        let mut rng = SmallRng::seed_from_u64(7);
        assert_eq!(engine.dose_deaths(1_000, 2.0, &UNIT_SLOPE, &mut rng), 500);
    }

    #[test]
    fn fraction_deaths_clamp_to_the_cohort() {
        let engine = MortalityEngine::default();
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(engine.deaths_for_fraction(40, 0.25, &mut rng), 10);
        assert_eq!(engine.deaths_for_fraction(40, 1.5, &mut rng), 40);
        assert_eq!(engine.deaths_for_fraction(40, -0.1, &mut rng), 0);
        assert_eq!(engine.deaths_for_fraction(40, f64::NAN, &mut rng), 0);
    }

    #[test]
    fn zero_rate_and_zero_dose_kill_nobody() {
        let engine = MortalityEngine::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut counts = [1_000_u32];
        let mut doses = DoseArray::new(1);
        let tally = engine.apply(&mut counts, Some(&mut doses), 0.0, &UNIT_SLOPE, &mut rng);
        assert_eq!(counts, [1_000]);
        assert_eq!(tally.total(), 0);
    }

    #[test]
    fn apply_resets_doses_and_never_goes_negative() {
        let engine = MortalityEngine::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut counts = [3_u32, 0, 50];
        let mut doses = DoseArray::new(3);
        doses.doses_mut().copy_from_slice(&[500.0, 1.0, 2.0]);
        let tally = engine.apply(&mut counts, Some(&mut doses), 0.9, &UNIT_SLOPE, &mut rng);
        assert_eq!(counts.first(), Some(&0));
        assert_eq!(counts.get(1), Some(&0));
        assert!(counts.get(2).copied().unwrap() <= 25);
        assert!(doses.doses().iter().all(|d| *d == 0.0));
        assert!(tally.total() >= 28);
    }

    #[test]
    fn background_deaths_follow_rate_on_average() {
        let engine = MortalityEngine::default();
        let mut rng = SmallRng::seed_from_u64(42);
        let mut total = 0_u64;
        for _ in 0..100 {
            total += u64::from(engine.background_deaths(10_000, 0.01, &mut rng));
        }
        // Expectation 10_000 over 100 draws.
        assert!((9_000..=11_000).contains(&total), "total deaths {total}");
    }

    #[test]
    fn empty_cohort_is_unchanged() {
        let engine = MortalityEngine::new(MortalityMode::SmallCohortStochastic);
        let mut rng = SmallRng::seed_from_u64(1);
        let mut counts = [0_u32; 4];
        let tally = engine.apply(&mut counts, None, 0.5, &UNIT_SLOPE, &mut rng);
        assert_eq!(counts, [0; 4]);
        assert_eq!(tally, MortalityTally::default());
    }
}
