//! Toxicokinetic-toxicodynamic effects for adult workers (GUTS).
//!
//! Under the dose-response model a day's dose is read off a curve and then
//! forgotten. Here it is not: every age slot of in-hive workers and foragers
//! keeps the residue on its bees and the damage that residue caused, and
//! mortality follows the damage over the following days.
//!
//! Each day is integrated in [`GutsConfig::steps_per_day`] substeps:
//!
//! 1. Oral and contact residues decay exponentially at `k_sr` and `k_ca`.
//! 2. Scaled damage moves towards the total residue:
//!    `D += kd * (residue - D) * dt`, floored at zero.
//! 3. **Stochastic death (SD)**: the hazard `bw_sd * (D - mw_sd)` accrues
//!    while damage is above the threshold; the day's lethal fraction is
//!    `1 - exp(-H)`.
//! 4. **Individual tolerance (IT)**: thresholds are log-logistic around
//!    `mw_it`. A bee dies once damage passes its threshold, so the day kills
//!    the share of survivors whose threshold lies between the previous peak
//!    damage and the new one.
//!
//! Pending doses from [`DoseArray`]s are moved into the slots and the arrays
//! are reset, exactly as the dose-response path does.

use rand::Rng;

use crate::config::{EffectModel, GutsConfig, ToxicityConfig};
use crate::dose::DoseArray;
use crate::mortality::{DOSE_THRESHOLD, MortalityEngine};

/// Which toxicodynamic assumption turns damage into deaths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GutsVariant {
    /// Every bee shares one hazard rate.
    StochasticDeath,
    /// Every bee has its own damage threshold.
    IndividualTolerance,
}

impl EffectModel {
    /// The GUTS variant selected, if any.
    pub const fn guts_variant(self) -> Option<GutsVariant> {
        match self {
            Self::DoseResponse => None,
            Self::GutsSd => Some(GutsVariant::StochasticDeath),
            Self::GutsIt => Some(GutsVariant::IndividualTolerance),
        }
    }
}

/// Toxicokinetic state of the bees of one age.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GutsSlot {
    /// Oral residue per bee (µg).
    pub oral: f64,
    /// Contact residue per bee (µg).
    pub contact: f64,
    /// Scaled damage (µg/bee).
    pub damage: f64,
    /// Highest damage reached so far.
    pub peak: f64,
}

impl GutsSlot {
    fn is_clear(&self) -> bool {
        self.oral <= DOSE_THRESHOLD
            && self.contact <= DOSE_THRESHOLD
            && self.damage <= DOSE_THRESHOLD
    }

    fn blend(self, weight: f64, other: Self, other_weight: f64) -> Self {
        let total = weight + other_weight;
        if total <= 0.0 {
            return Self::default();
        }
        let mix = |a: f64, b: f64| a.mul_add(weight, b * other_weight) / total;
        Self {
            oral: mix(self.oral, other.oral),
            contact: mix(self.contact, other.contact),
            damage: mix(self.damage, other.damage),
            peak: mix(self.peak, other.peak),
        }
    }
}

/// GUTS state indexed by day-of-age, aligned with one head-count array.
#[derive(Debug, Clone, PartialEq)]
pub struct GutsArray {
    slots: Vec<GutsSlot>,
}

impl GutsArray {
    /// Create a clear array with `len` slots.
    pub fn new(len: usize) -> Self {
        Self {
            slots: vec![GutsSlot::default(); len],
        }
    }

    /// Number of age slots.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if the array has no slots.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// State at one age. Ages beyond the array are clear.
    pub fn get(&self, age: usize) -> GutsSlot {
        self.slots.get(age).copied().unwrap_or_default()
    }

    /// Mutable state at one age.
    pub fn slot_mut(&mut self, age: usize) -> Option<&mut GutsSlot> {
        self.slots.get_mut(age)
    }

    /// Move every slot one day older, returning the oldest slot's state.
    pub fn shift(&mut self) -> GutsSlot {
        let carried = match self.slots.last_mut() {
            Some(oldest) => core::mem::take(oldest),
            None => GutsSlot::default(),
        };
        self.slots.rotate_right(1);
        carried
    }

    /// Blend `incoming` bees carrying `state` into the youngest slot.
    ///
    /// `resident` is the head count already at age 0.
    pub fn merge_newest(&mut self, resident: u32, incoming: u32, state: GutsSlot) {
        if let Some(youngest) = self.slots.first_mut() {
            *youngest = youngest.blend(f64::from(resident), state, f64::from(incoming));
        }
    }
}

/// Integrates GUTS state and converts it into deaths.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GutsModel {
    variant: GutsVariant,
    config: GutsConfig,
}

impl GutsModel {
    /// Create a model of the given variant.
    pub const fn new(variant: GutsVariant, config: GutsConfig) -> Self {
        Self { variant, config }
    }

    /// The model selected by the toxicity parameters, if any.
    pub const fn for_toxicity(toxicity: &ToxicityConfig) -> Option<Self> {
        match toxicity.effect_model.guts_variant() {
            Some(variant) => Some(Self::new(variant, toxicity.guts)),
            None => None,
        }
    }

    /// The toxicodynamic variant.
    pub const fn variant(&self) -> GutsVariant {
        self.variant
    }

    /// Share of bees whose tolerance threshold lies at or below `damage`.
    pub fn threshold_fraction(&self, damage: f64) -> f64 {
        if damage.is_nan() || damage <= 0.0 {
            return 0.0;
        }
        let beta = 39.0_f64.ln() / self.config.f_s.ln();
        let odds = (damage / self.config.mw_it).powf(beta);
        if odds.is_infinite() {
            1.0
        } else {
            (odds / (1.0 + odds)).clamp(0.0, 1.0)
        }
    }

    /// Integrate one day of `slot` and return the day's lethal fraction.
    pub fn integrate(&self, slot: &mut GutsSlot) -> f64 {
        let steps = self.config.steps_per_day.max(1);
        let dt = 1.0 / f64::from(steps);
        let oral_decay = (-self.config.k_sr * dt).exp();
        let contact_decay = (-self.config.k_ca * dt).exp();
        let kd = match self.variant {
            GutsVariant::StochasticDeath => self.config.kd_sd,
            GutsVariant::IndividualTolerance => self.config.kd_it,
        };

        let previous_peak = slot.peak;
        let mut hazard = 0.0;
        for _ in 0..steps {
            slot.oral *= oral_decay;
            slot.contact *= contact_decay;
            let residue = slot.oral + slot.contact;
            slot.damage = (kd * dt).mul_add(residue - slot.damage, slot.damage).max(0.0);
            slot.peak = slot.peak.max(slot.damage);
            if self.variant == GutsVariant::StochasticDeath {
                hazard += (self.config.bw_sd * (slot.damage - self.config.mw_sd) * dt).max(0.0);
            }
        }

        match self.variant {
            GutsVariant::StochasticDeath => 1.0 - (-hazard).exp(),
            GutsVariant::IndividualTolerance => {
                let before = self.threshold_fraction(previous_peak);
                if before >= 1.0 {
                    return 1.0;
                }
                let after = self.threshold_fraction(slot.peak);
                ((after - before) / (1.0 - before)).clamp(0.0, 1.0)
            }
        }
    }

    /// Move pending doses into `states`, integrate one day and kill.
    ///
    /// Returns the toxic deaths. Both dose arrays are reset; slots of empty
    /// age classes are cleared.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        engine: MortalityEngine,
        counts: &mut [u32],
        states: &mut GutsArray,
        oral: &mut DoseArray,
        mut contact: Option<&mut DoseArray>,
        rng: &mut R,
    ) -> u64 {
        let mut toxic = 0_u64;
        for (age, count) in counts.iter_mut().enumerate() {
            let Some(slot) = states.slot_mut(age) else {
                continue;
            };
            if *count == 0 {
                *slot = GutsSlot::default();
                continue;
            }
            slot.oral += oral.get(age);
            slot.contact += contact.as_deref().map_or(0.0, |doses| doses.get(age));
            if slot.is_clear() {
                continue;
            }

            let fraction = self.integrate(slot);
            let deaths = engine.deaths_for_fraction(*count, fraction, rng);
            *count = count.saturating_sub(deaths);
            toxic = toxic.saturating_add(u64::from(deaths));
            if *count == 0 {
                *slot = GutsSlot::default();
            }
        }
        oral.reset();
        if let Some(contact) = contact.as_deref_mut() {
            contact.reset();
        }
        toxic
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::arithmetic_side_effects)]
mod tests {
    use super::*;
    use crate::mortality::MortalityMode;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn model(variant: GutsVariant) -> GutsModel {
        GutsModel::new(variant, GutsConfig::default())
    }

    /// Dose one cohort once, then run `days` days. Returns deaths per day.
    fn run(variant: GutsVariant, count: u32, dose: f64, days: usize) -> (Vec<u64>, GutsArray) {
        let engine = MortalityEngine::new(MortalityMode::Deterministic);
        let mut rng = SmallRng::seed_from_u64(42);
        let model = model(variant);
        let mut counts = [count];
        let mut states = GutsArray::new(1);
        let mut oral = DoseArray::new(1);
        oral.add(0, dose);

        let mut deaths = Vec::new();
        for _ in 0..days {
            deaths.push(model.apply(engine, &mut counts, &mut states, &mut oral, None, &mut rng));
            assert!(oral.doses().iter().all(|d| *d == 0.0));
        }
        (deaths, states)
    }

    #[test]
    fn unexposed_bees_do_not_die() {
        for variant in [GutsVariant::StochasticDeath, GutsVariant::IndividualTolerance] {
            let (deaths, states) = run(variant, 1_000, 0.0, 5);
            assert!(deaths.iter().all(|d| *d == 0));
            assert_eq!(states.get(0), GutsSlot::default());
        }
    }

    #[test]
    fn sd_damage_below_threshold_is_harmless() {
        // Damage can never exceed the residue, which stays under mw_sd.
        let (deaths, states) = run(GutsVariant::StochasticDeath, 10_000, 0.01, 10);
        assert!(deaths.iter().all(|d| *d == 0));
        assert!(states.get(0).damage > 0.0);
        assert!(states.get(0).damage < 0.014);
    }

    #[test]
    fn sd_damage_keeps_killing_after_exposure_stops() {
        let (deaths, states) = run(GutsVariant::StochasticDeath, 100_000, 1.0, 2);
        let first = deaths.first().copied().unwrap();
        let second = deaths.get(1).copied().unwrap();
        assert!(first > 0 && first < 100_000, "day one deaths {first}");
        assert!(second > 0, "no deaths on the day after exposure");
        assert!(states.get(0).damage > 0.014);
    }

    #[test]
    fn it_threshold_is_half_at_median() {
        let model = model(GutsVariant::IndividualTolerance);
        assert!((model.threshold_fraction(0.0024) - 0.5).abs() < 1e-12);
        assert_eq!(model.threshold_fraction(0.0), 0.0);
        // f_s = 3 puts the 95th percentile at three times the median.
        assert!((model.threshold_fraction(0.0072) - 0.975).abs() < 1e-9);
    }

    #[test]
    fn it_high_dose_kills_most_and_trace_dose_kills_none() {
        let (deaths, _) = run(GutsVariant::IndividualTolerance, 1_000, 1.0, 1);
        assert!(deaths.first().copied().unwrap() >= 900);

        let (deaths, _) = run(GutsVariant::IndividualTolerance, 1_000, 1e-4, 10);
        assert!(deaths.iter().all(|d| *d == 0));
    }

    #[test]
    fn it_deaths_stop_once_damage_peaks() {
        // Damage peaks about six days after a single dose and then recovers.
        let (deaths, _) = run(GutsVariant::IndividualTolerance, 1_000, 0.1, 20);
        let total: u64 = deaths.iter().sum();
        assert!((200..=340).contains(&total), "total deaths {total}");
        assert!(deaths.get(9..).unwrap().iter().all(|d| *d == 0));
    }

    #[test]
    fn contact_residue_adds_to_oral() {
        let engine = MortalityEngine::new(MortalityMode::Deterministic);
        let mut rng = SmallRng::seed_from_u64(42);
        let model = model(GutsVariant::StochasticDeath);
        let mut counts = [1_000_u32, 0];
        let mut states = GutsArray::new(2);
        let mut oral = DoseArray::new(2);
        let mut contact = DoseArray::new(2);
        contact.add(0, 1.0);
        contact.add(1, 1.0);

        let deaths = model.apply(
            engine,
            &mut counts,
            &mut states,
            &mut oral,
            Some(&mut contact),
            &mut rng,
        );
        assert!(deaths > 0);
        assert!(contact.doses().iter().all(|d| *d == 0.0));
        // The empty age class keeps no state.
        assert_eq!(states.get(1), GutsSlot::default());
    }

    #[test]
    fn shift_and_merge_follow_the_bees() {
        let mut states = GutsArray::new(2);
        states.slot_mut(1).unwrap().damage = 0.4;
        let graduate = states.shift();
        assert_eq!(graduate.damage, 0.4);
        assert_eq!(states.get(0), GutsSlot::default());

        let mut pool = GutsArray::new(3);
        pool.slot_mut(0).unwrap().damage = 0.1;
        pool.merge_newest(30, 10, graduate);
        assert!((pool.get(0).damage - 0.175).abs() < 1e-12);
    }

    #[test]
    fn effect_model_selects_variant() {
        let mut toxicity = ToxicityConfig::default();
        assert!(GutsModel::for_toxicity(&toxicity).is_none());
        toxicity.effect_model = EffectModel::GutsSd;
        let model = GutsModel::for_toxicity(&toxicity).unwrap();
        assert_eq!(model.variant(), GutsVariant::StochasticDeath);
    }
}
