//! Terrain categories and per-terrain building constraints.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::buildings::{Building, BuildingCategory, SettlementTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Terrain {
    Plains,
    Mountains,
    Forest,
    Coast,
    River,
    Hills,
}

impl Terrain {
    pub const ALL: [Self; 6] = [
        Self::Plains,
        Self::Mountains,
        Self::Forest,
        Self::Coast,
        Self::River,
        Self::Hills,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Plains => "plains",
            Self::Mountains => "mountains",
            Self::Forest => "forest",
            Self::Coast => "coast",
            Self::River => "river",
            Self::Hills => "hills",
        }
    }

    #[must_use]
    pub const fn rules(self) -> TerrainRules {
        match self {
            Self::Plains => TerrainRules {
                max_farms: 3,
                max_mines: 1,
                settlements: &SettlementTier::ALL,
                fortifications: true,
            },
            Self::Mountains => TerrainRules {
                max_farms: 0,
                max_mines: 3,
                settlements: &[SettlementTier::Village],
                fortifications: true,
            },
            Self::Forest => TerrainRules {
                max_farms: 1,
                max_mines: 1,
                settlements: &[SettlementTier::Village, SettlementTier::Town],
                fortifications: true,
            },
            Self::Coast => TerrainRules {
                max_farms: 2,
                max_mines: 0,
                settlements: &SettlementTier::ALL,
                fortifications: true,
            },
            Self::River => TerrainRules {
                max_farms: 3,
                max_mines: 0,
                settlements: &SettlementTier::ALL,
                fortifications: false,
            },
            Self::Hills => TerrainRules {
                max_farms: 1,
                max_mines: 2,
                settlements: &[SettlementTier::Village, SettlementTier::Town],
                fortifications: true,
            },
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown terrain `{0}`")]
pub struct UnknownTerrain(pub String);

impl FromStr for Terrain {
    type Err = UnknownTerrain;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        // "coastal" shows up in hand-written imports.
        if trimmed.eq_ignore_ascii_case("coastal") {
            return Ok(Self::Coast);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownTerrain(trimmed.to_string()))
    }
}

/// Building limits for a terrain category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerrainRules {
    pub max_farms: u32,
    pub max_mines: u32,
    /// Settlement tiers that may be built up to.
    pub settlements: &'static [SettlementTier],
    /// Whether a Keep or Castle may stand here.
    pub fortifications: bool,
}

impl TerrainRules {
    #[must_use]
    pub fn allows_tier(&self, tier: SettlementTier) -> bool {
        self.settlements.contains(&tier)
    }
}

/// Answer from a rules check; a denial always carries a reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleCheck {
    pub allowed: bool,
    pub reason: String,
}

impl RuleCheck {
    #[must_use]
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: String::new(),
        }
    }

    #[must_use]
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: reason.into(),
        }
    }
}

/// Highest settlement tier among the given upgrades.
#[must_use]
pub fn current_settlement(upgrades: &[Building]) -> Option<SettlementTier> {
    upgrades.iter().filter_map(|b| b.settlement_tier()).max()
}

/// Whether `building` may be added to a region of `terrain` carrying `current`.
///
/// Settlement tiers are handled as transitions: adding a smaller tier than
/// the one present is a downgrade and is always permitted.
#[must_use]
pub fn can_add_building(terrain: Terrain, building: Building, current: &[Building]) -> RuleCheck {
    let rules = terrain.rules();
    match building.category() {
        BuildingCategory::Farm => check_cap(terrain, building, current, rules.max_farms),
        BuildingCategory::Mine => check_cap(terrain, building, current, rules.max_mines),
        BuildingCategory::Settlement => {
            let Some(tier) = building.settlement_tier() else {
                return RuleCheck::deny(format!("{building} is not a settlement"));
            };
            can_change_settlement(terrain, current_settlement(current), Some(tier))
        }
        BuildingCategory::Fortification => check_fortification(terrain, building, current),
    }
}

/// Settlement transition check. Downgrades and removal are always allowed.
#[must_use]
pub fn can_change_settlement(
    terrain: Terrain,
    from: Option<SettlementTier>,
    to: Option<SettlementTier>,
) -> RuleCheck {
    let Some(target) = to else {
        return RuleCheck::allow();
    };
    match from {
        Some(existing) if existing == target => {
            RuleCheck::deny(format!("region already has a {}", target.building()))
        }
        Some(existing) if target < existing => RuleCheck::allow(),
        _ if terrain.rules().allows_tier(target) => RuleCheck::allow(),
        _ => RuleCheck::deny(format!(
            "{} cannot support a {}",
            terrain,
            target.building()
        )),
    }
}

fn check_cap(terrain: Terrain, building: Building, current: &[Building], cap: u32) -> RuleCheck {
    let category = building.category();
    let present = current.iter().filter(|b| b.category() == category).count();
    let present = u32::try_from(present).unwrap_or(u32::MAX);
    if cap == 0 {
        RuleCheck::deny(format!("{terrain} does not allow any {building}"))
    } else if present >= cap {
        RuleCheck::deny(format!("{terrain} allows at most {cap} {building}"))
    } else {
        RuleCheck::allow()
    }
}

fn check_fortification(terrain: Terrain, building: Building, current: &[Building]) -> RuleCheck {
    if !terrain.rules().fortifications {
        return RuleCheck::deny(format!("{terrain} cannot be fortified"));
    }
    let has_castle = current.contains(&Building::Castle);
    let has_keep = current.contains(&Building::Keep);
    match building {
        Building::Keep if has_castle => RuleCheck::deny("region already has a Castle"),
        Building::Keep if has_keep => RuleCheck::deny("region already has a Keep"),
        Building::Castle if has_castle => RuleCheck::deny("region already has a Castle"),
        _ => RuleCheck::allow(),
    }
}
