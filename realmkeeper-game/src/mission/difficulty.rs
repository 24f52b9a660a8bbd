//! Mission difficulty with an auditable modifier breakdown.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::{MissionTarget, MissionType};
use crate::agent::{Agent, AgentType};
use crate::army::Army;
use crate::buildings::Building;
use crate::constants::{
    DIFFICULTY_MAX, DIFFICULTY_MIN, DIFFICULTY_UNKNOWN_MISSION, GARRISON_STRENGTH_PER_POINT,
    MOD_CASTLE, MOD_KEEP, MOD_PER_ENEMY_ENFORCER, MOD_PER_FRIENDLY_AGENT, MOD_PER_TARGET_AGENT_LEVEL,
    MOD_PER_TARGET_INTRIGUE, MOD_PER_TARGET_PROWESS, MOD_TARGET_REVEALED,
};
use crate::faction::{AgentId, FactionId};
use crate::region::Region;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyLine {
    pub label: String,
    pub value: i32,
}

/// Base line first, then modifiers in application order.
pub type DifficultyBreakdown = SmallVec<[DifficultyLine; 8]>;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DifficultyReport {
    pub difficulty: i32,
    /// Sum of the breakdown before clamping.
    pub unclamped: i32,
    pub breakdown: DifficultyBreakdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DifficultyContext {
    #[serde(default)]
    pub has_keep: bool,
    #[serde(default)]
    pub has_castle: bool,
    #[serde(default)]
    pub enemy_enforcers: u32,
    #[serde(default)]
    pub garrison_strength: u32,
    #[serde(default)]
    pub target_prowess: i32,
    #[serde(default)]
    pub target_intrigue: i32,
    #[serde(default)]
    pub target_agent_level: u8,
    #[serde(default)]
    pub target_revealed: bool,
    #[serde(default)]
    pub friendly_agents: u32,
}

/// Snapshots a difficulty context is derived from.
#[derive(Debug, Clone, Copy, Default)]
pub struct MissionScene<'a> {
    pub region: Option<&'a Region>,
    pub armies: &'a [Army],
    pub agents: &'a [Agent],
}

impl DifficultyContext {
    /// Derive modifiers from the target region, the forces stationed there
    /// and the target descriptor.
    ///
    /// `acting_agent` is excluded from the friendly count. An army target
    /// supplies its own strength as the garrison; otherwise the region
    /// owner's active armies in the region are summed.
    #[must_use]
    pub fn gather(
        scene: &MissionScene<'_>,
        issuing: FactionId,
        acting_agent: Option<&AgentId>,
        target: Option<&MissionTarget>,
    ) -> Self {
        let mut ctx = Self::default();
        let code = scene.region.map(|r| r.code.as_str());

        if let Some(region) = scene.region {
            ctx.has_keep = region.has_active(Building::Keep);
            ctx.has_castle = region.has_active(Building::Castle);
        }

        if let Some(code) = code {
            let present = scene
                .agents
                .iter()
                .filter(|a| a.is_active() && a.location == code);
            for agent in present {
                if agent.owner == issuing {
                    if acting_agent != Some(&agent.id) {
                        ctx.friendly_agents += 1;
                    }
                } else if agent.kind == AgentType::Enforcer {
                    ctx.enemy_enforcers += 1;
                }
            }
        }

        ctx.garrison_strength = match target {
            Some(MissionTarget::Army { strength, .. }) => *strength,
            _ => match (scene.region, code) {
                (Some(region), Some(code)) => scene
                    .armies
                    .iter()
                    .filter(|a| a.is_active() && a.location == code)
                    .filter(|a| region.owner.is_some() && a.owner == region.owner)
                    .map(Army::strength)
                    .fold(0, u32::saturating_add),
                _ => 0,
            },
        };

        match target {
            Some(MissionTarget::Commander { prowess, .. }) => ctx.target_prowess = *prowess,
            Some(MissionTarget::Leader {
                prowess, intrigue, ..
            }) => {
                ctx.target_prowess = *prowess;
                ctx.target_intrigue = *intrigue;
            }
            Some(MissionTarget::Agent {
                level, revealed, ..
            }) => {
                ctx.target_agent_level = *level;
                ctx.target_revealed = *revealed;
            }
            Some(MissionTarget::Army { .. }) | None => {}
        }
        ctx
    }
}

struct Tally {
    total: i32,
    lines: DifficultyBreakdown,
}

impl Tally {
    fn apply(&mut self, label: impl Into<String>, value: i32) {
        self.total = self.total.saturating_add(value);
        self.lines.push(DifficultyLine {
            label: label.into(),
            value,
        });
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// Difficulty for a known mission type, clamped to [5, 95].
#[must_use]
pub fn calculate_mission_difficulty(
    mission: MissionType,
    ctx: &DifficultyContext,
) -> DifficultyReport {
    let spec = mission.spec();
    let mut tally = Tally {
        total: 0,
        lines: DifficultyBreakdown::new(),
    };
    tally.apply("Base difficulty", spec.base_difficulty);

    if spec.fortification {
        if ctx.has_castle {
            tally.apply("Castle", MOD_CASTLE);
        } else if ctx.has_keep {
            tally.apply("Keep", MOD_KEEP);
        }
    }
    if spec.enemy_enforcers && ctx.enemy_enforcers > 0 {
        tally.apply(
            format!("Enemy enforcers ({})", ctx.enemy_enforcers),
            saturating_i32(ctx.enemy_enforcers).saturating_mul(MOD_PER_ENEMY_ENFORCER),
        );
    }
    if spec.garrison && ctx.garrison_strength > 0 {
        let value = saturating_i32(ctx.garrison_strength / GARRISON_STRENGTH_PER_POINT);
        if value > 0 {
            tally.apply(format!("Garrison ({})", ctx.garrison_strength), value);
        }
    }
    if spec.target_prowess && ctx.target_prowess > 0 {
        tally.apply(
            format!("Target prowess ({})", ctx.target_prowess),
            ctx.target_prowess.saturating_mul(MOD_PER_TARGET_PROWESS),
        );
    }
    if spec.target_intrigue && ctx.target_intrigue > 0 {
        tally.apply(
            format!("Target intrigue ({})", ctx.target_intrigue),
            ctx.target_intrigue.saturating_mul(MOD_PER_TARGET_INTRIGUE),
        );
    }
    if spec.target_agent {
        if ctx.target_agent_level > 0 {
            tally.apply(
                format!("Target agent level ({})", ctx.target_agent_level),
                i32::from(ctx.target_agent_level) * MOD_PER_TARGET_AGENT_LEVEL,
            );
        }
        if ctx.target_revealed {
            tally.apply("Target already revealed", MOD_TARGET_REVEALED);
        }
    }
    if ctx.friendly_agents > 0 {
        tally.apply(
            format!("Friendly agents ({})", ctx.friendly_agents),
            saturating_i32(ctx.friendly_agents).saturating_mul(MOD_PER_FRIENDLY_AGENT),
        );
    }

    DifficultyReport {
        difficulty: tally.total.clamp(DIFFICULTY_MIN, DIFFICULTY_MAX),
        unclamped: tally.total,
        breakdown: tally.lines,
    }
}

/// Difficulty for a raw key. Unknown keys yield 100 and an empty breakdown.
#[must_use]
pub fn calculate_mission_difficulty_for_key(key: &str, ctx: &DifficultyContext) -> DifficultyReport {
    MissionType::from_key(key).map_or_else(
        || DifficultyReport {
            difficulty: DIFFICULTY_UNKNOWN_MISSION,
            unclamped: DIFFICULTY_UNKNOWN_MISSION,
            breakdown: DifficultyBreakdown::new(),
        },
        |mission| calculate_mission_difficulty(mission, ctx),
    )
}

#[must_use]
pub const fn agent_bonus(level: u8, mission: MissionType) -> i32 {
    level as i32 * mission.spec().level_bonus
}
