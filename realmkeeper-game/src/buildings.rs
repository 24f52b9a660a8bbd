//! Building catalogue and per-unit economic effects.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Every upgrade token a region can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Building {
    Farm,
    Mine,
    Village,
    Town,
    City,
    Keep,
    Castle,
}

/// Grouping used by terrain caps and category-keyed bonuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildingCategory {
    Farm,
    Mine,
    Settlement,
    Fortification,
}

/// Settlement tiers, ordered from smallest to largest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementTier {
    Village,
    Town,
    City,
}

impl SettlementTier {
    pub const ALL: [Self; 3] = [Self::Village, Self::Town, Self::City];

    #[must_use]
    pub const fn building(self) -> Building {
        match self {
            Self::Village => Building::Village,
            Self::Town => Building::Town,
            Self::City => Building::City,
        }
    }
}

impl Building {
    pub const ALL: [Self; 7] = [
        Self::Farm,
        Self::Mine,
        Self::Village,
        Self::Town,
        Self::City,
        Self::Keep,
        Self::Castle,
    ];

    /// Token as stored in region records.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Farm => "Farm",
            Self::Mine => "Mine",
            Self::Village => "Village",
            Self::Town => "Town",
            Self::City => "City",
            Self::Keep => "Keep",
            Self::Castle => "Castle",
        }
    }

    #[must_use]
    pub const fn category(self) -> BuildingCategory {
        match self {
            Self::Farm => BuildingCategory::Farm,
            Self::Mine => BuildingCategory::Mine,
            Self::Village | Self::Town | Self::City => BuildingCategory::Settlement,
            Self::Keep | Self::Castle => BuildingCategory::Fortification,
        }
    }

    #[must_use]
    pub const fn settlement_tier(self) -> Option<SettlementTier> {
        match self {
            Self::Village => Some(SettlementTier::Village),
            Self::Town => Some(SettlementTier::Town),
            Self::City => Some(SettlementTier::City),
            _ => None,
        }
    }

    /// Base per-unit effects of one active copy of this building.
    #[must_use]
    pub const fn effects(self) -> BuildingEffects {
        BUILDING_EFFECTS[self as usize]
    }
}

impl fmt::Display for Building {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Returned when a token does not name a known building.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown building `{0}`")]
pub struct UnknownBuilding(pub String);

impl FromStr for Building {
    type Err = UnknownBuilding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|b| b.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownBuilding(trimmed.to_string()))
    }
}

/// Per-unit building effect row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BuildingEffects {
    pub gold: i64,
    pub manpower: i64,
    pub manpower_cost: i64,
    pub hsg_capacity: i64,
    pub farm_equivalent: i64,
    pub mine_equivalent: i64,
    pub levy_infantry: i64,
    pub levy_archers: i64,
}

#[allow(clippy::too_many_arguments)]
const fn row(
    gold: i64,
    manpower: i64,
    manpower_cost: i64,
    hsg_capacity: i64,
    farm_equivalent: i64,
    mine_equivalent: i64,
    levy_infantry: i64,
    levy_archers: i64,
) -> BuildingEffects {
    BuildingEffects {
        gold,
        manpower,
        manpower_cost,
        hsg_capacity,
        farm_equivalent,
        mine_equivalent,
        levy_infantry,
        levy_archers,
    }
}

// Indexed by `Building as usize`; keep in declaration order.
const BUILDING_EFFECTS: [BuildingEffects; 7] = [
    // Farm
    row(0, 1, 0, 0, 1, 0, 2, 1),
    // Mine
    row(3, 0, 1, 0, 0, 1, 0, 0),
    // Village
    row(2, 1, 0, 0, 0, 0, 2, 0),
    // Town
    row(4, 2, 0, 5, 0, 0, 4, 2),
    // City
    row(8, 3, 1, 10, 0, 0, 6, 4),
    // Keep
    row(1, 0, 1, 5, 0, 0, 0, 0),
    // Castle
    row(2, 0, 2, 10, 0, 0, 0, 0),
];
