//! Pure per-faction turn settlement and capacity caps.
use serde::{Deserialize, Serialize};

use super::LedgerConfig;
use crate::agent::Agent;
use crate::army::Army;
use crate::court::CourtBonus;
use crate::economy::{EconomyLedger, SettlementCounts, calculate_economy};
use crate::faction::{Faction, FactionId};
use crate::region::Region;
use crate::upkeep::{UpkeepBreakdown, calculate_upkeep};

/// Household-guard units fielded against capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HsgUsage {
    pub used: i64,
    pub capacity: i64,
}

impl HsgUsage {
    #[must_use]
    pub fn from_forces(armies: &[Army], capacity: i64) -> Self {
        let used = armies
            .iter()
            .filter(|a| a.is_active())
            .map(|a| i64::from(a.units.hsg_units()))
            .sum();
        Self { used, capacity }
    }

    #[must_use]
    pub const fn over_capacity(&self) -> bool {
        self.used > self.capacity
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnWarning {
    NegativeBalance { balance: i64 },
    ManpowerDeficit { net_manpower: i64 },
    OverHsgCapacity { used: i64, capacity: i64 },
    RegionsUnderSiege { count: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionTurnReport {
    pub faction: FactionId,
    pub name: String,
    pub economy: EconomyLedger,
    pub upkeep: UpkeepBreakdown,
    pub court_gold: i64,
    /// Income plus court gold minus upkeep.
    pub net_gold: i64,
    pub previous_balance: i64,
    pub new_balance: i64,
    pub hsg: HsgUsage,
    pub warnings: Vec<TurnWarning>,
}

/// Settle one faction's turn from its snapshots.
#[must_use]
pub fn settle_faction(
    faction: &Faction,
    regions: &[Region],
    armies: &[Army],
    agents: &[Agent],
    court: &CourtBonus,
    config: &LedgerConfig,
) -> FactionTurnReport {
    let economy = calculate_economy(regions, faction.patron_deity);
    let upkeep = calculate_upkeep(
        armies,
        faction.navy,
        agents,
        faction.patron_deity,
        config.levy_rounding,
    );
    let net_gold = economy
        .gold_per_turn
        .saturating_add(court.gold)
        .saturating_sub(upkeep.total);
    let new_balance = faction.gold.saturating_add(net_gold);
    let hsg = HsgUsage::from_forces(armies, economy.hsg_capacity);

    let mut warnings = Vec::new();
    if new_balance < 0 {
        warnings.push(TurnWarning::NegativeBalance {
            balance: new_balance,
        });
    }
    if economy.manpower_deficit() {
        warnings.push(TurnWarning::ManpowerDeficit {
            net_manpower: economy.net_manpower,
        });
    }
    if hsg.over_capacity() {
        warnings.push(TurnWarning::OverHsgCapacity {
            used: hsg.used,
            capacity: hsg.capacity,
        });
    }
    if economy.besieged_regions > 0 {
        warnings.push(TurnWarning::RegionsUnderSiege {
            count: economy.besieged_regions,
        });
    }

    FactionTurnReport {
        faction: faction.id,
        name: faction.name.clone(),
        court_gold: court.gold,
        net_gold,
        previous_balance: faction.gold,
        new_balance,
        hsg,
        warnings,
        economy,
        upkeep,
    }
}

/// Agents a faction may field: base allowance, one per settlement, plus
/// court free agents.
#[must_use]
pub const fn agent_cap(settlements: &SettlementCounts, court: &CourtBonus, config: &LedgerConfig) -> u32 {
    config.base_agent_allowance + settlements.total() + court.free_agents
}

/// Armies a faction may field: base cap, one per city, plus court bonus.
#[must_use]
pub const fn army_cap(settlements: &SettlementCounts, court: &CourtBonus, config: &LedgerConfig) -> u32 {
    config.base_army_cap + settlements.cities + court.army_cap
}
