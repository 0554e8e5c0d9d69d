//! Compartmental substance ledger for the Apis colony simulation.
//!
//! Every unit of honey energy and every microgram of toxicant that enters the
//! hive is tracked through this ledger. Honey is never created from nothing
//! (only deposited by foragers) and never destroyed into nothing (only
//! withdrawn by consumers). Toxicant mass only leaves the store through
//! withdrawal or degradation. Both laws are checked at the end of every tick.
//!
//! # Architecture
//!
//! - [`store`] -- The [`HoneyStore`] (six time layers) and the [`PollenStore`].
//! - [`deposit`] -- The [`DepositBuilder`] for validated deposit construction.
//! - [`conservation`] -- Balance verification and anomaly detection.
//!
//! # Layer state machine
//!
//! ```text
//! deposit -> day0 -> day1 -> day2 -> day3 -> day4 -> capped
//!                  (one step per advance; day4 blends into capped)
//! ```
//!
//! Withdrawal drains the freshest layer first. Deposits and the daily
//! advance are stamped with the tick whose `day0` is open; anything stamped
//! with another tick is rejected instead of silently landing in the wrong
//! layer.
//!
//! # Usage
//!
//! ```
//! use apis_ledger::{DepositBuilder, HoneyStore};
//! use apis_ledger::conservation::{verify_honey_balance, ConservationResult};
//!
//! // 900 kJ of capped honey at 1 µg/kJ, then 100 kJ of fresh nectar at 2 µg/kJ.
//! let mut store = HoneyStore::with_capped_contaminated(1, 1_000.0, 900.0, 1.0).unwrap();
//! let nectar = DepositBuilder::new(1).amount(100.0).concentration(2.0).nectar();
//! store.deposit(&nectar.unwrap()).ok();
//!
//! let drawn = store.withdraw(1, 150.0, 1).unwrap();
//! assert!((drawn.dose - 250.0).abs() < 1e-9);
//!
//! store.advance(1).ok();
//! assert_eq!(verify_honey_balance(1, &store, 850.0), ConservationResult::Balanced);
//! ```

pub mod conservation;
pub mod deposit;
pub mod store;

// Re-export primary types at crate root.
pub use conservation::{ConservationResult, ToxicantFlows};
pub use deposit::{DepositBuilder, NectarDeposit, PollenDeposit};
pub use store::{Compartment, HoneyStore, PollenDraw, PollenStore, Withdrawal};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur when moving substance through the store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A quantity was negative, NaN or infinite.
    #[error("invalid {field}: {value}")]
    InvalidQuantity {
        /// Name of the offending quantity.
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A required field was not set on the builder.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A deposit was stamped with a tick other than the open day.
    #[error("deposit for tick {deposit_tick} rejected: day0 is open for tick {open_day}")]
    DepositOutOfOrder {
        /// Tick the deposit was produced for.
        deposit_tick: u64,
        /// Tick whose day0 currently accepts deposits.
        open_day: u64,
    },

    /// The daily advance was requested for a tick other than the open day.
    #[error("advance at tick {tick} rejected: day0 is open for tick {open_day}")]
    AdvanceOutOfOrder {
        /// Tick that requested the advance.
        tick: u64,
        /// Tick whose day0 currently accepts deposits.
        open_day: u64,
    },

    /// More was requested than the store holds.
    #[error("overdraw of {substance} at tick {tick}: requested {requested}, available {available}")]
    Overdraw {
        /// Tick of the withdrawal.
        tick: u64,
        /// `"honey"` or `"pollen"`.
        substance: &'static str,
        /// Requested amount (kJ for honey, g for pollen).
        requested: f64,
        /// Amount held by the store.
        available: f64,
    },

    /// The open-day counter would overflow.
    #[error("open day counter overflow")]
    DayOverflow,
}

// ---------------------------------------------------------------------------
// Anomaly type
// ---------------------------------------------------------------------------

/// A conservation violation detected during end-of-tick verification.
///
/// Captures the tick, what was compared and both sides of the comparison.
/// The tick loop turns this into a fatal error; it is never corrected.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreAnomaly {
    /// The tick where the anomaly was detected.
    pub tick: u64,
    /// Name of the balance that failed (e.g. `"honey energy"`).
    pub quantity: &'static str,
    /// Value the balance expected.
    pub expected: f64,
    /// Value actually found.
    pub actual: f64,
    /// Human-readable description of the anomaly.
    pub message: String,
}

impl core::fmt::Display for StoreAnomaly {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Reject negative, NaN and infinite quantities.
pub(crate) fn ensure_quantity(field: &'static str, value: f64) -> Result<f64, StoreError> {
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(StoreError::InvalidQuantity { field, value })
    }
}
