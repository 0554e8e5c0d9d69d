//! Conservation verification for the substance ledger.
//!
//! Three balances are checked at the end of every tick:
//!
//! ```text
//! honey energy:   sum(layer energy)            ~= tracked aggregate honey
//! toxicant mass:  before + deposited - drawn - degraded ~= after
//! daily draw:     energy withdrawn by groups    ~= daily consumption total
//! ```
//!
//! The honey energy balance uses a 0.1% relative tolerance because the
//! aggregate is maintained by a separate consumption model. The other two
//! are exact up to floating-point noise.
//!
//! A violation produces a [`StoreAnomaly`]; the tick loop treats every
//! anomaly as fatal.

use tracing::warn;

use crate::StoreAnomaly;
use crate::store::HoneyStore;

/// Relative tolerance between layered honey and the tracked aggregate.
pub const HONEY_RELATIVE_TOLERANCE: f64 = 0.001;

/// Relative tolerance for balances that should hold exactly.
pub const EXACT_RELATIVE_TOLERANCE: f64 = 1e-6;

/// Absolute floor below which differences are treated as rounding noise.
const ABSOLUTE_FLOOR: f64 = 1e-6;

/// The result of a conservation check.
#[derive(Debug, Clone, PartialEq)]
pub enum ConservationResult {
    /// The balance holds.
    Balanced,
    /// The balance is violated.
    Anomaly(StoreAnomaly),
}

impl ConservationResult {
    /// Returns `true` if the balance holds.
    pub const fn is_balanced(&self) -> bool {
        matches!(self, Self::Balanced)
    }
}

/// Compare two quantities under a relative tolerance.
///
/// The tolerance is taken relative to the largest of `magnitude`, `expected`
/// and `actual`. `magnitude` is the largest term that went into `expected`:
/// a balance of large flows that nets out near zero carries rounding noise
/// proportional to those flows, not to the small result.
fn check(
    tick: u64,
    quantity: &'static str,
    expected: f64,
    actual: f64,
    magnitude: f64,
    relative: f64,
) -> ConservationResult {
    let scale = magnitude.abs().max(expected.abs()).max(actual.abs());
    let allowed = (scale * relative).max(ABSOLUTE_FLOOR);
    let difference = (expected - actual).abs();
    if difference <= allowed {
        return ConservationResult::Balanced;
    }
    warn!(tick, quantity, expected, actual, allowed, "Store conservation violated");
    ConservationResult::Anomaly(StoreAnomaly {
        tick,
        quantity,
        expected,
        actual,
        message: format!(
            "STORE_ANOMALY at tick {tick}: {quantity} expected {expected}, found {actual} \
             (difference {difference}, allowed {allowed})",
        ),
    })
}

/// Verify that the layered honey matches the tracked aggregate.
pub fn verify_honey_balance(tick: u64, store: &HoneyStore, tracked_kj: f64) -> ConservationResult {
    check(
        tick,
        "honey energy",
        tracked_kj,
        store.total_energy(),
        0.0,
        HONEY_RELATIVE_TOLERANCE,
    )
}

/// Toxicant flows through the honey store during one tick, in µg.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ToxicantFlows {
    /// Mass held before the tick's first store operation.
    pub before: f64,
    /// Mass added by deposits.
    pub deposited: f64,
    /// Mass removed by withdrawals.
    pub withdrawn: f64,
    /// Mass removed by degradation.
    pub degraded: f64,
}

impl ToxicantFlows {
    /// Mass the store should hold after the tick.
    pub fn expected_after(&self) -> f64 {
        self.before + self.deposited - self.withdrawn - self.degraded
    }

    /// Largest single flow, the scale of the balance's rounding noise.
    pub fn magnitude(&self) -> f64 {
        [self.before, self.deposited, self.withdrawn, self.degraded]
            .into_iter()
            .fold(0.0, |largest, flow| largest.max(flow.abs()))
    }
}

/// Verify that honey toxicant mass is neither created nor lost.
pub fn verify_toxicant_balance(
    tick: u64,
    flows: &ToxicantFlows,
    store: &HoneyStore,
) -> ConservationResult {
    check(
        tick,
        "honey toxicant mass",
        flows.expected_after(),
        store.total_toxicant(),
        flows.magnitude(),
        EXACT_RELATIVE_TOLERANCE,
    )
}

/// Verify that what the groups drew matches an externally computed total.
///
/// `held` is what the store held before the draws. Withdrawals that empty
/// the store are clipped to its contents, so rounding scales with it.
pub fn verify_draw(
    tick: u64,
    quantity: &'static str,
    expected_total: f64,
    drawn_total: f64,
    held: f64,
) -> ConservationResult {
    check(
        tick,
        quantity,
        expected_total,
        drawn_total,
        held,
        EXACT_RELATIVE_TOLERANCE,
    )
}
