//! Faction economy aggregation over owned regions.
//!
//! The engine is a pure fold: each region is reduced to a [`RegionEconomy`]
//! and the rows are summed into an [`EconomyLedger`]. Armies, agents and
//! court offices are combined later by the turn ledger.
use serde::{Deserialize, Serialize};

use crate::buildings::{Building, BuildingCategory};
use crate::deity::{DeityBonuses, PatronDeity, bonuses_for};
use crate::faction::RegionId;
use crate::region::Region;

/// Gold per turn split by where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IncomeBreakdown {
    pub settlements: i64,
    pub mines: i64,
    pub fortifications: i64,
    pub deity: i64,
}

impl IncomeBreakdown {
    #[must_use]
    pub const fn total(&self) -> i64 {
        self.settlements + self.mines + self.fortifications + self.deity
    }

    fn absorb(&mut self, other: &Self) {
        self.settlements += other.settlements;
        self.mines += other.mines;
        self.fortifications += other.fortifications;
        self.deity += other.deity;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SettlementCounts {
    pub villages: u32,
    pub towns: u32,
    pub cities: u32,
}

impl SettlementCounts {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.villages + self.towns + self.cities
    }
}

/// Contribution of a single region.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegionEconomy {
    pub region_id: Option<RegionId>,
    pub gold: i64,
    pub manpower: i64,
    pub manpower_cost: i64,
    pub hsg_capacity: i64,
    pub farm_equivalents: i64,
    pub mine_equivalents: i64,
    pub levy_infantry: i64,
    pub levy_archers: i64,
    pub settlements: SettlementCounts,
    pub income: IncomeBreakdown,
}

/// Per-turn economic ledger for one faction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EconomyLedger {
    pub gold_per_turn: i64,
    pub manpower_produced: i64,
    pub manpower_upkeep: i64,
    /// May be negative; callers surface it as a warning.
    pub net_manpower: i64,
    pub hsg_capacity: i64,
    pub farm_equivalents: i64,
    pub mine_equivalents: i64,
    pub levy_infantry_potential: i64,
    pub levy_archer_potential: i64,
    pub settlements: SettlementCounts,
    pub income: IncomeBreakdown,
    /// Regions skipped because they are under siege.
    pub besieged_regions: u32,
}

impl EconomyLedger {
    #[must_use]
    pub const fn manpower_deficit(&self) -> bool {
        self.net_manpower < 0
    }
}

/// Reduce one region. Besieged regions yield an empty row.
#[must_use]
pub fn calculate_region_economy(region: &Region, bonuses: &DeityBonuses) -> RegionEconomy {
    let mut row = RegionEconomy {
        region_id: Some(region.id.clone()),
        ..RegionEconomy::default()
    };
    if region.under_siege {
        return row;
    }

    for (building, active) in region.active_counts() {
        if active == 0 {
            continue;
        }
        let count = i64::from(active);
        let base = building.effects();
        let gold = base.gold * count;
        row.gold += gold;
        row.manpower += base.manpower * count;
        row.manpower_cost += base.manpower_cost * count;
        row.hsg_capacity += base.hsg_capacity * count;
        row.farm_equivalents += base.farm_equivalent * count;
        row.mine_equivalents += base.mine_equivalent * count;
        row.levy_infantry += base.levy_infantry * count;
        row.levy_archers += base.levy_archers * count;
        match building.category() {
            BuildingCategory::Farm | BuildingCategory::Settlement => row.income.settlements += gold,
            BuildingCategory::Mine => row.income.mines += gold,
            BuildingCategory::Fortification => row.income.fortifications += gold,
        }
        match building {
            Building::Village => row.settlements.villages += active,
            Building::Town => row.settlements.towns += active,
            Building::City => row.settlements.cities += active,
            _ => {}
        }

        let bonus = bonuses.for_building(building, count);
        row.gold += bonus.gold;
        row.income.deity += bonus.gold;
        row.hsg_capacity += bonus.hsg_capacity;
        row.levy_archers += bonus.levy_archers;
    }

    let terrain_gold = bonuses.for_terrain(region.terrain);
    row.gold += terrain_gold;
    row.income.deity += terrain_gold;
    row
}

/// Aggregate a faction's regions into its per-turn ledger.
#[must_use]
pub fn calculate_economy(regions: &[Region], deity: Option<PatronDeity>) -> EconomyLedger {
    let bonuses = bonuses_for(deity);
    let mut ledger = EconomyLedger::default();
    for region in regions {
        if region.under_siege {
            ledger.besieged_regions += 1;
            continue;
        }
        let row = calculate_region_economy(region, &bonuses);
        ledger.gold_per_turn += row.gold;
        ledger.manpower_produced += row.manpower;
        ledger.manpower_upkeep += row.manpower_cost;
        ledger.hsg_capacity += row.hsg_capacity;
        ledger.farm_equivalents += row.farm_equivalents;
        ledger.mine_equivalents += row.mine_equivalents;
        ledger.levy_infantry_potential += row.levy_infantry;
        ledger.levy_archer_potential += row.levy_archers;
        ledger.settlements.villages += row.settlements.villages;
        ledger.settlements.towns += row.settlements.towns;
        ledger.settlements.cities += row.settlements.cities;
        ledger.income.absorb(&row.income);
    }
    ledger.net_manpower = ledger.manpower_produced - ledger.manpower_upkeep;
    ledger
}
