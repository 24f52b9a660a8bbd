//! Patron deities and the additive bonuses they grant.
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::buildings::{Building, BuildingCategory};
use crate::terrain::Terrain;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatronDeity {
    /// Trade and towns.
    Pynthar,
    /// Stone and deep mines.
    Durgrim,
    /// Harvest and rivers.
    Sylvara,
    /// Sea and shipping.
    Thalassa,
    /// War and marching.
    Korveth,
    /// Whispers and unrest.
    Veyra,
}

impl PatronDeity {
    pub const ALL: [Self; 6] = [
        Self::Pynthar,
        Self::Durgrim,
        Self::Sylvara,
        Self::Thalassa,
        Self::Korveth,
        Self::Veyra,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Pynthar => "pynthar",
            Self::Durgrim => "durgrim",
            Self::Sylvara => "sylvara",
            Self::Thalassa => "thalassa",
            Self::Korveth => "korveth",
            Self::Veyra => "veyra",
        }
    }

    #[must_use]
    pub const fn bonuses(self) -> DeityBonuses {
        match self {
            Self::Pynthar => DeityBonuses {
                town_gold: 2,
                city_gold: 3,
                ..DeityBonuses::NONE
            },
            Self::Durgrim => DeityBonuses {
                mine_gold: 1,
                mountain_gold: 2,
                hills_gold: 1,
                huscarl_upkeep: Some(1),
                ..DeityBonuses::NONE
            },
            Self::Sylvara => DeityBonuses {
                farm_levy_archers: 1,
                settlement_gold: 1,
                river_gold: 1,
                ..DeityBonuses::NONE
            },
            Self::Thalassa => DeityBonuses {
                coastal_gold: 2,
                river_gold: 1,
                warship_upkeep: Some(1),
                ..DeityBonuses::NONE
            },
            Self::Korveth => DeityBonuses {
                keep_hsg: 5,
                castle_hsg: 5,
                knight_upkeep: Some(2),
                army_moves_per_turn: Some(2),
                ..DeityBonuses::NONE
            },
            Self::Veyra => DeityBonuses {
                agitator_upkeep: Some(1),
                hills_gold: 1,
                ..DeityBonuses::NONE
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown patron deity `{0}`")]
pub struct UnknownDeity(pub String);

impl FromStr for PatronDeity {
    type Err = UnknownDeity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|d| d.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownDeity(trimmed.to_string()))
    }
}

/// Additive bonuses and rate overrides granted by a patron.
///
/// Gold, HSG and levy values are added per active building (or once per
/// region for terrain bonuses). `Option` fields replace a base rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeityBonuses {
    pub town_gold: i64,
    pub city_gold: i64,
    pub settlement_gold: i64,
    pub mine_gold: i64,
    pub keep_hsg: i64,
    pub castle_hsg: i64,
    pub farm_levy_archers: i64,
    pub river_gold: i64,
    pub coastal_gold: i64,
    pub mountain_gold: i64,
    pub hills_gold: i64,
    pub huscarl_upkeep: Option<i64>,
    pub knight_upkeep: Option<i64>,
    pub warship_upkeep: Option<i64>,
    pub agitator_upkeep: Option<i64>,
    pub army_moves_per_turn: Option<u32>,
}

/// Bonus contributed by `count` active copies of one building.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BuildingBonus {
    pub gold: i64,
    pub hsg_capacity: i64,
    pub levy_archers: i64,
}

impl DeityBonuses {
    pub const NONE: Self = Self {
        town_gold: 0,
        city_gold: 0,
        settlement_gold: 0,
        mine_gold: 0,
        keep_hsg: 0,
        castle_hsg: 0,
        farm_levy_archers: 0,
        river_gold: 0,
        coastal_gold: 0,
        mountain_gold: 0,
        hills_gold: 0,
        huscarl_upkeep: None,
        knight_upkeep: None,
        warship_upkeep: None,
        agitator_upkeep: None,
        army_moves_per_turn: None,
    };

    /// Exact-name bonuses first, then category bonuses.
    #[must_use]
    pub fn for_building(&self, building: Building, count: i64) -> BuildingBonus {
        let mut bonus = BuildingBonus::default();
        match building {
            Building::Town => bonus.gold += self.town_gold * count,
            Building::City => bonus.gold += self.city_gold * count,
            Building::Mine => bonus.gold += self.mine_gold * count,
            Building::Keep => bonus.hsg_capacity += self.keep_hsg * count,
            Building::Castle => bonus.hsg_capacity += self.castle_hsg * count,
            Building::Farm => bonus.levy_archers += self.farm_levy_archers * count,
            Building::Village => {}
        }
        if building.category() == BuildingCategory::Settlement {
            bonus.gold += self.settlement_gold * count;
        }
        bonus
    }

    /// Once-per-region gold keyed on terrain.
    #[must_use]
    pub const fn for_terrain(&self, terrain: Terrain) -> i64 {
        match terrain {
            Terrain::River => self.river_gold,
            Terrain::Coast => self.coastal_gold,
            Terrain::Mountains => self.mountain_gold,
            Terrain::Hills => self.hills_gold,
            Terrain::Plains | Terrain::Forest => 0,
        }
    }
}

/// Bonuses for an optional patron; no patron means no bonuses.
#[must_use]
pub fn bonuses_for(deity: Option<PatronDeity>) -> DeityBonuses {
    deity.map_or(DeityBonuses::NONE, PatronDeity::bonuses)
}
