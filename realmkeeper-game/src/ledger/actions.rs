//! Per-turn action tracking stored on each faction.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::faction::{AgentId, ArmyId, RegionId};

/// Actions taken this turn, keyed by the acted-on entity.
///
/// Cleared on every turn advance.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TurnState {
    #[serde(default)]
    pub regions_built: BTreeMap<RegionId, u32>,
    #[serde(default)]
    pub armies_moved: BTreeMap<ArmyId, u32>,
    #[serde(default)]
    pub agents_moved: BTreeMap<AgentId, u32>,
}

/// Which per-turn limit an action counts against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnAction {
    Build,
    ArmyMove,
    AgentMove,
}

impl TurnAction {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Build => "build",
            Self::ArmyMove => "army move",
            Self::AgentMove => "agent move",
        }
    }
}

impl TurnState {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions_built.is_empty() && self.armies_moved.is_empty() && self.agents_moved.is_empty()
    }

    pub fn reset(&mut self) {
        self.regions_built.clear();
        self.armies_moved.clear();
        self.agents_moved.clear();
    }

    #[must_use]
    pub fn builds_in(&self, region: &RegionId) -> u32 {
        self.regions_built.get(region).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn moves_of_army(&self, army: &ArmyId) -> u32 {
        self.armies_moved.get(army).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn moves_of_agent(&self, agent: &AgentId) -> u32 {
        self.agents_moved.get(agent).copied().unwrap_or(0)
    }

    /// Count a build if `limit` allows it. Returns whether it was counted.
    pub fn try_record_build(&mut self, region: &RegionId, limit: u32) -> bool {
        bump(&mut self.regions_built, region, limit)
    }

    pub fn try_record_army_move(&mut self, army: &ArmyId, limit: u32) -> bool {
        bump(&mut self.armies_moved, army, limit)
    }

    pub fn try_record_agent_move(&mut self, agent: &AgentId, limit: u32) -> bool {
        bump(&mut self.agents_moved, agent, limit)
    }
}

fn bump<K: Ord + Clone>(map: &mut BTreeMap<K, u32>, key: &K, limit: u32) -> bool {
    let used = map.get(key).copied().unwrap_or(0);
    if used >= limit {
        return false;
    }
    map.insert(key.clone(), used + 1);
    true
}
