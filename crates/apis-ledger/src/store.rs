//! The honey and pollen stores.
//!
//! [`HoneyStore`] holds six [`Compartment`]s, one per [`HoneyLayer`]. Each
//! compartment is a well-mixed pool of energy with a single toxicant
//! concentration. [`PollenStore`] is a single unlayered pool.
//!
//! # Ordering
//!
//! The honey store carries an *open day*: the tick whose `day0` currently
//! accepts deposits. A deposit stamped with any other tick is rejected, and
//! [`HoneyStore::advance`] only succeeds when called for the open day, after
//! which the next tick opens. This makes the deposit/advance ordering an
//! enforced precondition rather than a convention.

use apis_types::{HoneyLayer, LayerSnapshot};
use tracing::{debug, trace};

use crate::deposit::{NectarDeposit, PollenDeposit};
use crate::{StoreError, ensure_quantity};

/// Relative slack allowed when a withdrawal meets the exact store total.
const DRAW_TOLERANCE: f64 = 1e-9;

// ---------------------------------------------------------------------------
// Compartment
// ---------------------------------------------------------------------------

/// A well-mixed pool of honey energy with one toxicant concentration.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Compartment {
    /// Stored energy in kJ.
    pub energy: f64,
    /// Toxicant concentration in µg/kJ.
    pub concentration: f64,
}

impl Compartment {
    /// A compartment with no energy and no toxicant.
    pub const EMPTY: Self = Self {
        energy: 0.0,
        concentration: 0.0,
    };

    /// Toxicant mass held by the compartment, in µg.
    pub fn toxicant(&self) -> f64 {
        self.energy * self.concentration
    }

    /// Merge two pools, weighting concentration by energy.
    ///
    /// Blending with an empty pool returns the other pool unchanged. If both
    /// are empty the receiving pool is returned as-is.
    #[must_use]
    pub fn blend(self, other: Self) -> Self {
        let energy = self.energy + other.energy;
        if energy <= 0.0 {
            return self;
        }
        if other.energy <= 0.0 {
            return self;
        }
        if self.energy <= 0.0 {
            return other;
        }
        Self {
            energy,
            concentration: (self.toxicant() + other.toxicant()) / energy,
        }
    }
}

// ---------------------------------------------------------------------------
// Honey store
// ---------------------------------------------------------------------------

/// Result of a honey withdrawal.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Withdrawal {
    /// Energy removed from the store, in kJ.
    pub energy: f64,
    /// Toxicant mass removed with that energy, in µg.
    pub toxicant: f64,
    /// Toxicant mass per consumer, in µg. Zero when there are no consumers.
    pub dose: f64,
}

/// The layered honey store.
#[derive(Debug, Clone, PartialEq)]
pub struct HoneyStore {
    /// Compartments in [`HoneyLayer::ALL`] order.
    layers: [Compartment; HoneyLayer::COUNT],
    /// Tick whose `day0` accepts deposits.
    open_day: u64,
    /// Maximum total energy the store accepts, in kJ.
    capacity_kj: f64,
}

impl HoneyStore {
    /// Create an empty store whose `day0` is open for `open_day`.
    pub const fn new(open_day: u64, capacity_kj: f64) -> Self {
        Self {
            layers: [Compartment::EMPTY; HoneyLayer::COUNT],
            open_day,
            capacity_kj,
        }
    }

    /// Create a store holding uncontaminated capped honey.
    pub fn with_capped(open_day: u64, capacity_kj: f64, capped_kj: f64) -> Self {
        let mut store = Self::new(open_day, capacity_kj);
        let [.., capped] = &mut store.layers;
        capped.energy = capped_kj.max(0.0);
        store
    }

    /// Create a store whose capped honey already carries toxicant.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuantity`] if the energy or the
    /// concentration is negative or non-finite.
    pub fn with_capped_contaminated(
        open_day: u64,
        capacity_kj: f64,
        capped_kj: f64,
        concentration: f64,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new(open_day, capacity_kj);
        let [.., capped] = &mut store.layers;
        *capped = Compartment {
            energy: ensure_quantity("capped energy", capped_kj)?,
            concentration: ensure_quantity("capped concentration", concentration)?,
        };
        Ok(store)
    }

    /// Tick whose `day0` currently accepts deposits.
    pub const fn open_day(&self) -> u64 {
        self.open_day
    }

    /// Maximum total energy, in kJ.
    pub const fn capacity_kj(&self) -> f64 {
        self.capacity_kj
    }

    /// The compartment backing one layer.
    pub const fn layer(&self, layer: HoneyLayer) -> Compartment {
        match layer {
            HoneyLayer::Day0 => self.layers[0],
            HoneyLayer::Day1 => self.layers[1],
            HoneyLayer::Day2 => self.layers[2],
            HoneyLayer::Day3 => self.layers[3],
            HoneyLayer::Day4 => self.layers[4],
            HoneyLayer::Capped => self.layers[5],
        }
    }

    /// Total energy across all layers, in kJ.
    pub fn total_energy(&self) -> f64 {
        self.layers.iter().map(|c| c.energy).sum()
    }

    /// Total toxicant mass across all layers, in µg.
    pub fn total_toxicant(&self) -> f64 {
        self.layers.iter().map(Compartment::toxicant).sum()
    }

    /// Energy the store can still accept before reaching capacity.
    pub fn free_capacity(&self) -> f64 {
        (self.capacity_kj - self.total_energy()).max(0.0)
    }

    /// Deposit nectar into `day0`, blending with earlier same-day deposits.
    ///
    /// Energy beyond the store capacity is refused. Returns the accepted
    /// energy in kJ.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DepositOutOfOrder`] if the deposit was produced
    /// for a tick other than the open day.
    pub fn deposit(&mut self, deposit: &NectarDeposit) -> Result<f64, StoreError> {
        if deposit.tick != self.open_day {
            return Err(StoreError::DepositOutOfOrder {
                deposit_tick: deposit.tick,
                open_day: self.open_day,
            });
        }
        let accepted = deposit.energy_kj.min(self.free_capacity());
        if accepted < deposit.energy_kj {
            debug!(
                tick = deposit.tick,
                offered = deposit.energy_kj,
                accepted,
                "Honey store at capacity, nectar refused"
            );
        }
        let incoming = Compartment {
            energy: accepted,
            concentration: deposit.concentration,
        };
        self.layers[0] = self.layers[0].blend(incoming);
        Ok(accepted)
    }

    /// Withdraw `energy` kJ, freshest layer first, shared by `consumers`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuantity`] for a negative or non-finite
    /// request and [`StoreError::Overdraw`] if the store holds less than
    /// requested. The store is left untouched on error.
    pub fn withdraw(
        &mut self,
        tick: u64,
        energy: f64,
        consumers: u32,
    ) -> Result<Withdrawal, StoreError> {
        let requested = ensure_quantity("withdrawal energy", energy)?;
        let available = self.total_energy();
        if requested > available + DRAW_TOLERANCE * available.max(1.0) {
            return Err(StoreError::Overdraw {
                tick,
                substance: "honey",
                requested,
                available,
            });
        }

        let mut remaining = requested;
        let mut drawn = Withdrawal::default();
        for compartment in &mut self.layers {
            if remaining <= 0.0 {
                break;
            }
            let take = remaining.min(compartment.energy);
            if take <= 0.0 {
                continue;
            }
            compartment.energy -= take;
            drawn.energy += take;
            drawn.toxicant += take * compartment.concentration;
            remaining -= take;
        }

        if consumers > 0 {
            drawn.dose = drawn.toxicant / f64::from(consumers);
        }
        trace!(tick, energy = drawn.energy, toxicant = drawn.toxicant, "Honey withdrawn");
        Ok(drawn)
    }

    /// Age every layer by one day.
    ///
    /// `day4` blends into `capped` by energy weight, `day0..day3` move one
    /// layer older and `day0` is emptied. The next tick then opens.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AdvanceOutOfOrder`] if `tick` is not the open
    /// day and [`StoreError::DayOverflow`] if the day counter would overflow.
    pub fn advance(&mut self, tick: u64) -> Result<(), StoreError> {
        if tick != self.open_day {
            return Err(StoreError::AdvanceOutOfOrder {
                tick,
                open_day: self.open_day,
            });
        }
        let next = self.open_day.checked_add(1).ok_or(StoreError::DayOverflow)?;

        let [_, _, _, _, day4, capped] = &mut self.layers;
        *capped = capped.blend(*day4);
        self.layers.copy_within(0..4, 1);
        self.layers[0] = Compartment::EMPTY;

        self.open_day = next;
        Ok(())
    }

    /// Apply first-order decay with the given half-life to every layer.
    ///
    /// Returns the toxicant mass removed, in µg.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuantity`] if the half-life is not
    /// strictly positive and finite.
    pub fn degrade(&mut self, half_life_days: f64) -> Result<f64, StoreError> {
        if !(half_life_days.is_finite() && half_life_days > 0.0) {
            return Err(StoreError::InvalidQuantity {
                field: "half-life",
                value: half_life_days,
            });
        }
        let factor = (-core::f64::consts::LN_2 / half_life_days).exp();
        let before = self.total_toxicant();
        for compartment in &mut self.layers {
            compartment.concentration *= factor;
        }
        Ok(before - self.total_toxicant())
    }

    /// Per-layer contents, freshest first.
    pub fn snapshot(&self) -> Vec<LayerSnapshot> {
        HoneyLayer::ALL
            .iter()
            .zip(self.layers.iter())
            .map(|(&layer, c)| LayerSnapshot {
                layer,
                energy_kj: c.energy,
                concentration: c.concentration,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Pollen store
// ---------------------------------------------------------------------------

/// Result of a pollen draw.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PollenDraw {
    /// Pollen mass removed, in g.
    pub mass: f64,
    /// Toxicant mass removed with it, in µg.
    pub toxicant: f64,
}

/// The unlayered pollen store.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PollenStore {
    /// Stored pollen, in g.
    mass_g: f64,
    /// Toxicant concentration, in µg/g.
    concentration: f64,
}

impl PollenStore {
    /// Create an uncontaminated pollen store.
    pub const fn new(mass_g: f64) -> Self {
        Self {
            mass_g: mass_g.max(0.0),
            concentration: 0.0,
        }
    }

    /// Stored pollen, in g.
    pub const fn mass(&self) -> f64 {
        self.mass_g
    }

    /// Toxicant concentration, in µg/g.
    pub const fn concentration(&self) -> f64 {
        self.concentration
    }

    /// Toxicant mass held, in µg.
    pub fn toxicant(&self) -> f64 {
        self.mass_g * self.concentration
    }

    /// Blend a pollen deposit into the store.
    pub fn deposit(&mut self, deposit: &PollenDeposit) {
        let mass = self.mass_g + deposit.mass_g;
        if mass > 0.0 {
            self.concentration = (self.toxicant() + deposit.toxicant()) / mass;
        }
        self.mass_g = mass;
    }

    /// Remove `grams` of pollen at the current concentration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidQuantity`] for a negative or non-finite
    /// request and [`StoreError::Overdraw`] if the store holds less.
    pub fn consume(&mut self, tick: u64, grams: f64) -> Result<PollenDraw, StoreError> {
        let requested = ensure_quantity("pollen draw", grams)?;
        if requested > self.mass_g + DRAW_TOLERANCE * self.mass_g.max(1.0) {
            return Err(StoreError::Overdraw {
                tick,
                substance: "pollen",
                requested,
                available: self.mass_g,
            });
        }
        let mass = requested.min(self.mass_g);
        self.mass_g -= mass;
        Ok(PollenDraw {
            mass,
            toxicant: mass * self.concentration,
        })
    }
}
