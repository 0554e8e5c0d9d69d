//! Deposit builders and validation for the substance ledger.
//!
//! Provides a [`DepositBuilder`] that stamps every deposit with the tick that
//! produced it and validates quantities before a [`NectarDeposit`] or
//! [`PollenDeposit`] can reach a store.

use serde::{Deserialize, Serialize};

use crate::{StoreError, ensure_quantity};

// ---------------------------------------------------------------------------
// Deposit values
// ---------------------------------------------------------------------------

/// Validated nectar headed for the `day0` honey layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NectarDeposit {
    /// Tick the nectar was collected in.
    pub tick: u64,
    /// Energy content in kJ.
    pub energy_kj: f64,
    /// Toxicant concentration in µg/kJ.
    pub concentration: f64,
}

impl NectarDeposit {
    /// Toxicant mass carried by this deposit, in µg.
    pub fn toxicant(&self) -> f64 {
        self.energy_kj * self.concentration
    }
}

/// Validated pollen headed for the pollen store.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollenDeposit {
    /// Tick the pollen was collected in.
    pub tick: u64,
    /// Pollen mass in g.
    pub mass_g: f64,
    /// Toxicant concentration in µg/g.
    pub concentration: f64,
}

impl PollenDeposit {
    /// Toxicant mass carried by this deposit, in µg.
    pub fn toxicant(&self) -> f64 {
        self.mass_g * self.concentration
    }
}

// ---------------------------------------------------------------------------
// Deposit builder
// ---------------------------------------------------------------------------

/// Builder for constructing validated deposits.
///
/// The amount is required. The concentration defaults to zero, so an
/// uncontaminated deposit only needs a tick and an amount.
///
/// # Examples
///
/// ```
/// use apis_ledger::DepositBuilder;
///
/// let nectar = DepositBuilder::new(7).amount(120.0).concentration(0.5).nectar();
/// assert!(nectar.is_ok());
///
/// let bad = DepositBuilder::new(7).amount(-1.0).pollen();
/// assert!(bad.is_err());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct DepositBuilder {
    tick: u64,
    amount: Option<f64>,
    concentration: f64,
}

impl DepositBuilder {
    /// Start building a deposit collected in the given tick.
    pub const fn new(tick: u64) -> Self {
        Self {
            tick,
            amount: None,
            concentration: 0.0,
        }
    }

    /// Set the deposited amount (kJ for nectar, g for pollen).
    #[must_use]
    pub const fn amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Set the toxicant concentration (µg/kJ for nectar, µg/g for pollen).
    #[must_use]
    pub const fn concentration(mut self, concentration: f64) -> Self {
        self.concentration = concentration;
        self
    }

    /// Validate inputs and produce a [`NectarDeposit`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingField`] if no amount was set and
    /// [`StoreError::InvalidQuantity`] for negative or non-finite values.
    pub fn nectar(self) -> Result<NectarDeposit, StoreError> {
        let (amount, concentration) = self.validated()?;
        Ok(NectarDeposit {
            tick: self.tick,
            energy_kj: amount,
            concentration,
        })
    }

    /// Validate inputs and produce a [`PollenDeposit`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::MissingField`] if no amount was set and
    /// [`StoreError::InvalidQuantity`] for negative or non-finite values.
    pub fn pollen(self) -> Result<PollenDeposit, StoreError> {
        let (amount, concentration) = self.validated()?;
        Ok(PollenDeposit {
            tick: self.tick,
            mass_g: amount,
            concentration,
        })
    }

    fn validated(&self) -> Result<(f64, f64), StoreError> {
        let amount = self.amount.ok_or(StoreError::MissingField("amount"))?;
        let amount = ensure_quantity("amount", amount)?;
        let concentration = ensure_quantity("concentration", self.concentration)?;
        Ok((amount, concentration))
    }
}
