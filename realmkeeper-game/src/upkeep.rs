//! Gold upkeep for armies, navy and agents.
use serde::{Deserialize, Serialize};

use crate::agent::{Agent, AgentType};
use crate::army::Army;
use crate::constants::{
    LEVY_UPKEEP_DENOMINATOR, LEVY_UPKEEP_NUMERATOR, UPKEEP_AGITATOR, UPKEEP_DISMOUNTED_KNIGHT,
    UPKEEP_ENFORCER, UPKEEP_HUSCARL, UPKEEP_LIGHT_HORSE, UPKEEP_MERC_CAVALRY, UPKEEP_MERC_CROSSBOW,
    UPKEEP_MOUNTED_KNIGHT, UPKEEP_SELLSWORD, UPKEEP_SPY, UPKEEP_WARSHIP,
};
use crate::deity::{PatronDeity, bonuses_for};
use crate::faction::Navy;

/// How fractional levy upkeep becomes whole gold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevyRounding {
    #[default]
    Floor,
    /// Half rounds up.
    Round,
}

impl LevyRounding {
    #[must_use]
    pub const fn apply(self, levy_units: i64) -> i64 {
        let scaled = levy_units * LEVY_UPKEEP_NUMERATOR;
        match self {
            Self::Floor => scaled.div_euclid(LEVY_UPKEEP_DENOMINATOR),
            Self::Round => (scaled * 2 + LEVY_UPKEEP_DENOMINATOR).div_euclid(LEVY_UPKEEP_DENOMINATOR * 2),
        }
    }
}

/// Per-unit gold rates after patron overrides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpkeepRates {
    pub huscarl: i64,
    pub dismounted_knight: i64,
    pub mounted_knight: i64,
    pub light_horse: i64,
    pub sellsword: i64,
    pub merc_crossbow: i64,
    pub merc_cavalry: i64,
    pub warship: i64,
    pub spy: i64,
    pub agitator: i64,
    pub enforcer: i64,
}

impl UpkeepRates {
    pub const BASE: Self = Self {
        huscarl: UPKEEP_HUSCARL,
        dismounted_knight: UPKEEP_DISMOUNTED_KNIGHT,
        mounted_knight: UPKEEP_MOUNTED_KNIGHT,
        light_horse: UPKEEP_LIGHT_HORSE,
        sellsword: UPKEEP_SELLSWORD,
        merc_crossbow: UPKEEP_MERC_CROSSBOW,
        merc_cavalry: UPKEEP_MERC_CAVALRY,
        warship: UPKEEP_WARSHIP,
        spy: UPKEEP_SPY,
        agitator: UPKEEP_AGITATOR,
        enforcer: UPKEEP_ENFORCER,
    };

    /// Base rates with the patron's overrides substituted.
    #[must_use]
    pub fn for_patron(deity: Option<PatronDeity>) -> Self {
        let bonuses = bonuses_for(deity);
        let mut rates = Self::BASE;
        if let Some(rate) = bonuses.huscarl_upkeep {
            rates.huscarl = rate;
        }
        if let Some(rate) = bonuses.knight_upkeep {
            rates.dismounted_knight = rate;
            rates.mounted_knight = rate;
        }
        if let Some(rate) = bonuses.warship_upkeep {
            rates.warship = rate;
        }
        if let Some(rate) = bonuses.agitator_upkeep {
            rates.agitator = rate;
        }
        rates
    }

    #[must_use]
    pub const fn agent(&self, kind: AgentType) -> i64 {
        match kind {
            AgentType::Spy => self.spy,
            AgentType::Agitator => self.agitator,
            AgentType::Enforcer => self.enforcer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpkeepBreakdown {
    /// Household guard plus mercenaries.
    pub hsg: i64,
    pub levy: i64,
    pub navy: i64,
    pub agents: i64,
    pub total: i64,
    /// Total levy units before the rate is applied.
    pub levy_units: i64,
}

/// Upkeep for a faction's forces. Deleted armies and dead agents are free.
#[must_use]
pub fn calculate_upkeep(
    armies: &[Army],
    navy: Navy,
    agents: &[Agent],
    deity: Option<PatronDeity>,
    rounding: LevyRounding,
) -> UpkeepBreakdown {
    let rates = UpkeepRates::for_patron(deity);
    let mut hsg = 0i64;
    let mut levy_units = 0i64;
    for army in armies.iter().filter(|a| a.is_active()) {
        let u = &army.units;
        hsg += i64::from(u.huscarls) * rates.huscarl
            + i64::from(u.dismounted_knights) * rates.dismounted_knight
            + i64::from(u.mounted_knights) * rates.mounted_knight
            + i64::from(u.light_horse) * rates.light_horse
            + i64::from(u.sellswords) * rates.sellsword
            + i64::from(u.merc_crossbows) * rates.merc_crossbow
            + i64::from(u.merc_cavalry) * rates.merc_cavalry;
        levy_units += i64::from(army.levy_units());
    }
    let levy = rounding.apply(levy_units);
    let navy_cost = i64::from(navy.warships) * rates.warship;
    let agents_cost = agents
        .iter()
        .filter(|a| a.is_active())
        .map(|a| rates.agent(a.kind))
        .sum::<i64>();

    UpkeepBreakdown {
        hsg,
        levy,
        navy: navy_cost,
        agents: agents_cost,
        total: hsg + levy + navy_cost + agents_cost,
        levy_units,
    }
}
