//! Enumeration types for the Apis colony simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Castes and life stages
// ---------------------------------------------------------------------------

/// A honeybee caste tracked by the cohort ledger.
///
/// Queens are not modelled as a cohort; the queen only appears as the
/// source of new eggs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Caste {
    /// Female workers: nurses, in-hive workers and eventually foragers.
    Worker,
    /// Male drones. Drones never forage.
    Drone,
}

impl Caste {
    /// Both castes in ledger order.
    pub const ALL: [Self; 2] = [Self::Worker, Self::Drone];
}

impl core::fmt::Display for Caste {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Worker => write!(f, "worker"),
            Self::Drone => write!(f, "drone"),
        }
    }
}

/// A life stage within one caste, in developmental order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Eggs laid by the queen.
    Egg,
    /// Open brood fed by nurses.
    Larva,
    /// Capped brood. Pupae do not feed.
    Pupa,
    /// Adults living inside the hive.
    InHive,
}

impl Stage {
    /// All stages in developmental order.
    pub const ALL: [Self; 4] = [Self::Egg, Self::Larva, Self::Pupa, Self::InHive];

    /// Returns `true` for brood stages (eggs, larvae, pupae).
    pub const fn is_brood(self) -> bool {
        matches!(self, Self::Egg | Self::Larva | Self::Pupa)
    }
}

impl core::fmt::Display for Stage {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Egg => write!(f, "egg"),
            Self::Larva => write!(f, "larva"),
            Self::Pupa => write!(f, "pupa"),
            Self::InHive => write!(f, "in-hive"),
        }
    }
}

// ---------------------------------------------------------------------------
// Honey store layers
// ---------------------------------------------------------------------------

/// A time layer of the honey store.
///
/// Fresh nectar enters [`HoneyLayer::Day0`] and moves one layer older per
/// tick until it is merged into [`HoneyLayer::Capped`], the long-term store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HoneyLayer {
    /// Nectar deposited during the current tick.
    Day0,
    /// Nectar deposited one tick ago.
    Day1,
    /// Nectar deposited two ticks ago.
    Day2,
    /// Nectar deposited three ticks ago.
    Day3,
    /// Nectar deposited four ticks ago.
    Day4,
    /// Capped long-term honey.
    Capped,
}

impl HoneyLayer {
    /// Number of layers in the store.
    pub const COUNT: usize = 6;

    /// All layers in withdrawal order, freshest first.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Day0,
        Self::Day1,
        Self::Day2,
        Self::Day3,
        Self::Day4,
        Self::Capped,
    ];

    /// Position of this layer in [`HoneyLayer::ALL`].
    pub const fn index(self) -> usize {
        match self {
            Self::Day0 => 0,
            Self::Day1 => 1,
            Self::Day2 => 2,
            Self::Day3 => 3,
            Self::Day4 => 4,
            Self::Capped => 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Population groups
// ---------------------------------------------------------------------------

/// A consuming group of the exposure accounting pass.
///
/// Groups are always processed in [`PopulationGroup::ACCOUNTING_ORDER`]:
/// foragers, then in-hive adults per caste, then larvae per caste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PopulationGroup {
    /// The forager pool.
    Foragers,
    /// In-hive adults of one caste.
    InHive(Caste),
    /// Larvae of one caste.
    Larvae(Caste),
}

impl PopulationGroup {
    /// Fixed processing order of the exposure accounting pass.
    pub const ACCOUNTING_ORDER: [Self; 5] = [
        Self::Foragers,
        Self::InHive(Caste::Worker),
        Self::InHive(Caste::Drone),
        Self::Larvae(Caste::Worker),
        Self::Larvae(Caste::Drone),
    ];

    /// Returns `true` for larval groups, which are fed through nurses.
    pub const fn is_larval(self) -> bool {
        matches!(self, Self::Larvae(_))
    }
}

impl core::fmt::Display for PopulationGroup {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Foragers => write!(f, "foragers"),
            Self::InHive(caste) => write!(f, "in-hive {caste}s"),
            Self::Larvae(caste) => write!(f, "{caste} larvae"),
        }
    }
}

// ---------------------------------------------------------------------------
// Run termination
// ---------------------------------------------------------------------------

/// The reason a replicate run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndReason {
    /// The configured number of ticks has been simulated.
    MaxTicksReached,
    /// No living bee remains in any stage.
    Extinction,
    /// The honey store could not cover the day's demand.
    Starvation,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn honey_layer_index_matches_position() {
        for (position, layer) in HoneyLayer::ALL.iter().enumerate() {
            assert_eq!(layer.index(), position);
        }
    }

    #[test]
    fn accounting_order_puts_foragers_first_and_larvae_last() {
        let order = PopulationGroup::ACCOUNTING_ORDER;
        assert_eq!(order.first(), Some(&PopulationGroup::Foragers));
        assert!(order.iter().skip(3).all(|g| g.is_larval()));
        assert!(order.iter().take(3).all(|g| !g.is_larval()));
    }

    #[test]
    fn only_pre_adult_stages_are_brood() {
        assert!(Stage::Egg.is_brood());
        assert!(Stage::Larva.is_brood());
        assert!(Stage::Pupa.is_brood());
        assert!(!Stage::InHive.is_brood());
    }

    #[test]
    fn group_display_names_caste() {
        assert_eq!(
            PopulationGroup::Larvae(Caste::Drone).to_string(),
            "drone larvae"
        );
        assert_eq!(
            PopulationGroup::InHive(Caste::Worker).to_string(),
            "in-hive workers"
        );
    }

    #[test]
    fn end_reason_serializes_as_variant_name() {
        let json = serde_json::to_string(&EndReason::Starvation).unwrap_or_default();
        assert_eq!(json, "\"Starvation\"");
    }
}
