//! Agent missions: catalogue, lifecycle and resolution.
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::agent::{Agent, AgentType};
use crate::faction::{AgentId, ArmyId, CharacterId, FactionId, MissionId};

pub mod dice;
pub mod difficulty;
pub mod effects;
pub mod outcome;

pub use dice::{FixedRolls, MissionDice, RollSource};
pub use difficulty::{
    DifficultyBreakdown, DifficultyContext, DifficultyLine, DifficultyReport, MissionScene,
    agent_bonus, calculate_mission_difficulty, calculate_mission_difficulty_for_key,
};
pub use effects::{EffectContext, derive_mission_effects};
pub use outcome::{AgentFate, MissionOutcome, ResolvedOutcome, determine_mission_outcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissionType {
    ScoutRegion,
    ScoutArmy,
    InfiltrateCourt,
    InciteUnrest,
    SabotageBuilding,
    FomentRevolt,
    AssassinateCommander,
    AssassinateLeader,
    KillAgent,
}

/// Static definition of a mission type.
///
/// The boolean flags decide which difficulty modifiers are relevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissionSpec {
    pub label: &'static str,
    pub agent_type: AgentType,
    pub base_difficulty: i32,
    pub level_bonus: i32,
    pub fortification: bool,
    pub garrison: bool,
    pub enemy_enforcers: bool,
    pub target_prowess: bool,
    pub target_intrigue: bool,
    pub target_agent: bool,
}

const fn spec(label: &'static str, agent_type: AgentType, base: i32, per_level: i32) -> MissionSpec {
    MissionSpec {
        label,
        agent_type,
        base_difficulty: base,
        level_bonus: per_level,
        fortification: false,
        garrison: false,
        enemy_enforcers: false,
        target_prowess: false,
        target_intrigue: false,
        target_agent: false,
    }
}

impl MissionType {
    pub const ALL: [Self; 9] = [
        Self::ScoutRegion,
        Self::ScoutArmy,
        Self::InfiltrateCourt,
        Self::InciteUnrest,
        Self::SabotageBuilding,
        Self::FomentRevolt,
        Self::AssassinateCommander,
        Self::AssassinateLeader,
        Self::KillAgent,
    ];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::ScoutRegion => "SCOUT_REGION",
            Self::ScoutArmy => "SCOUT_ARMY",
            Self::InfiltrateCourt => "INFILTRATE_COURT",
            Self::InciteUnrest => "INCITE_UNREST",
            Self::SabotageBuilding => "SABOTAGE_BUILDING",
            Self::FomentRevolt => "FOMENT_REVOLT",
            Self::AssassinateCommander => "ASSASSINATE_COMMANDER",
            Self::AssassinateLeader => "ASSASSINATE_LEADER",
            Self::KillAgent => "KILL_AGENT",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        Self::ALL.into_iter().find(|m| m.key().eq_ignore_ascii_case(key))
    }

    #[must_use]
    pub const fn spec(self) -> MissionSpec {
        match self {
            Self::ScoutRegion => MissionSpec {
                fortification: true,
                enemy_enforcers: true,
                ..spec("Scout Region", AgentType::Spy, 20, 5)
            },
            Self::ScoutArmy => MissionSpec {
                garrison: true,
                enemy_enforcers: true,
                ..spec("Scout Army", AgentType::Spy, 25, 5)
            },
            Self::InfiltrateCourt => MissionSpec {
                fortification: true,
                enemy_enforcers: true,
                target_intrigue: true,
                ..spec("Infiltrate Court", AgentType::Spy, 45, 4)
            },
            Self::InciteUnrest => MissionSpec {
                garrison: true,
                enemy_enforcers: true,
                ..spec("Incite Unrest", AgentType::Agitator, 35, 5)
            },
            Self::SabotageBuilding => MissionSpec {
                fortification: true,
                enemy_enforcers: true,
                ..spec("Sabotage Building", AgentType::Agitator, 40, 5)
            },
            Self::FomentRevolt => MissionSpec {
                fortification: true,
                garrison: true,
                enemy_enforcers: true,
                ..spec("Foment Revolt", AgentType::Agitator, 60, 4)
            },
            Self::AssassinateCommander => MissionSpec {
                garrison: true,
                target_prowess: true,
                ..spec("Assassinate Commander", AgentType::Enforcer, 55, 5)
            },
            Self::AssassinateLeader => MissionSpec {
                fortification: true,
                target_prowess: true,
                target_intrigue: true,
                ..spec("Assassinate Leader", AgentType::Enforcer, 65, 4)
            },
            Self::KillAgent => MissionSpec {
                target_agent: true,
                ..spec("Kill Agent", AgentType::Enforcer, 50, 5)
            },
        }
    }

    /// Missions unlocked by an agent type.
    pub fn for_agent(agent_type: AgentType) -> impl Iterator<Item = Self> {
        Self::ALL
            .into_iter()
            .filter(move |m| m.spec().agent_type == agent_type)
    }
}

impl fmt::Display for MissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Mission type as stored; keeps unrecognised keys instead of failing the
/// whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MissionKey {
    Known(MissionType),
    Unknown(String),
}

impl MissionKey {
    #[must_use]
    pub fn parse(key: &str) -> Self {
        MissionType::from_key(key).map_or_else(|| Self::Unknown(key.to_string()), Self::Known)
    }

    #[must_use]
    pub const fn known(&self) -> Option<MissionType> {
        match self {
            Self::Known(m) => Some(*m),
            Self::Unknown(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(m) => m.key(),
            Self::Unknown(raw) => raw,
        }
    }
}

impl From<MissionType> for MissionKey {
    fn from(value: MissionType) -> Self {
        Self::Known(value)
    }
}

/// Agent fields frozen when the mission was submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub agent_id: AgentId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentType,
    pub level: u8,
    pub revealed: bool,
}

impl From<&Agent> for AgentSnapshot {
    fn from(agent: &Agent) -> Self {
        Self {
            agent_id: agent.id.clone(),
            name: agent.name.clone(),
            kind: agent.kind,
            level: agent.level,
            revealed: agent.revealed,
        }
    }
}

/// What a mission is aimed at, with the stats difficulty reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MissionTarget {
    Commander {
        character_id: CharacterId,
        name: String,
        prowess: i32,
    },
    Agent {
        agent_id: AgentId,
        name: String,
        level: u8,
        revealed: bool,
    },
    Leader {
        character_id: CharacterId,
        name: String,
        prowess: i32,
        intrigue: i32,
    },
    Army {
        army_id: ArmyId,
        name: String,
        strength: u32,
    },
}

impl MissionTarget {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Commander { name, .. }
            | Self::Agent { name, .. }
            | Self::Leader { name, .. }
            | Self::Army { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionStatus {
    Pending,
    Approved,
    Completed,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionResult {
    pub roll: u8,
    pub agent_bonus: i32,
    /// Roll plus agent bonus.
    pub final_score: i32,
    pub margin: i32,
    pub outcome: MissionOutcome,
    pub fate: AgentFate,
    pub critical: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MissionError {
    #[error("cannot {action} a mission that is {from:?}")]
    InvalidTransition {
        from: MissionStatus,
        action: &'static str,
    },
    #[error("approved mission has no frozen difficulty")]
    MissingDifficulty,
    #[error("mission type is not recognised and cannot be evaluated")]
    UnknownMissionType,
    #[error("a {agent} cannot run {mission}")]
    WrongAgentType {
        agent: AgentType,
        mission: MissionType,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: MissionId,
    pub faction: FactionId,
    pub agent: AgentSnapshot,
    pub mission_type: MissionKey,
    pub target_region: String,
    #[serde(default)]
    pub target: Option<MissionTarget>,
    pub status: MissionStatus,
    /// Set once at approval and never changed.
    #[serde(default)]
    pub final_difficulty: Option<i32>,
    #[serde(default)]
    pub difficulty_breakdown: DifficultyBreakdown,
    /// Present iff the mission is completed.
    #[serde(default)]
    pub result: Option<MissionResult>,
    #[serde(default)]
    pub effects: Vec<String>,
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

impl Mission {
    /// Build a pending mission for `agent`.
    ///
    /// # Errors
    ///
    /// Returns `MissionError::WrongAgentType` when the agent type does not
    /// unlock the mission type.
    pub fn submit(
        id: MissionId,
        agent: &Agent,
        mission_type: MissionKey,
        target_region: impl Into<String>,
        target: Option<MissionTarget>,
    ) -> Result<Self, MissionError> {
        if let Some(known) = mission_type.known()
            && known.spec().agent_type != agent.kind
        {
            return Err(MissionError::WrongAgentType {
                agent: agent.kind,
                mission: known,
            });
        }
        Ok(Self {
            id,
            faction: agent.owner,
            agent: AgentSnapshot::from(agent),
            mission_type,
            target_region: target_region.into(),
            target,
            status: MissionStatus::Pending,
            final_difficulty: None,
            difficulty_breakdown: DifficultyBreakdown::new(),
            result: None,
            effects: Vec::new(),
            rejection_reason: None,
        })
    }

    /// Freeze difficulty and move to approved.
    ///
    /// # Errors
    ///
    /// Returns `MissionError::InvalidTransition` unless the mission is pending,
    /// or `MissionError::UnknownMissionType` for a key with no rule row. Such
    /// a mission stays pending until the game master rejects it.
    pub fn approve(&mut self, report: DifficultyReport) -> Result<(), MissionError> {
        self.require(MissionStatus::Pending, "approve")?;
        if self.mission_type.known().is_none() {
            return Err(MissionError::UnknownMissionType);
        }
        self.final_difficulty = Some(report.difficulty);
        self.difficulty_breakdown = report.breakdown;
        self.status = MissionStatus::Approved;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `MissionError::InvalidTransition` for completed or rejected missions.
    pub fn reject(&mut self, reason: impl Into<String>) -> Result<(), MissionError> {
        match self.status {
            MissionStatus::Pending | MissionStatus::Approved => {
                self.status = MissionStatus::Rejected;
                self.rejection_reason = Some(reason.into());
                Ok(())
            }
            from => Err(MissionError::InvalidTransition {
                from,
                action: "reject",
            }),
        }
    }

    /// Roll and complete an approved mission.
    ///
    /// # Errors
    ///
    /// Returns `MissionError::InvalidTransition` unless the mission is approved,
    /// `MissionError::MissingDifficulty` when the record lost its frozen
    /// difficulty, or `MissionError::UnknownMissionType` for a stored record
    /// whose key has no rule row.
    pub fn resolve<R: RollSource + ?Sized>(
        &mut self,
        dice: &mut R,
    ) -> Result<MissionResult, MissionError> {
        self.require(MissionStatus::Approved, "resolve")?;
        let known = self.mission_type.known().ok_or(MissionError::UnknownMissionType)?;
        let difficulty = self.final_difficulty.ok_or(MissionError::MissingDifficulty)?;
        let bonus = agent_bonus(self.agent.level, known);
        let roll = dice.roll_d100();
        let resolved = determine_mission_outcome(roll, bonus, difficulty, self.agent.kind);
        let result = MissionResult {
            roll,
            agent_bonus: bonus,
            final_score: i32::from(roll) + bonus,
            margin: resolved.margin,
            outcome: resolved.outcome,
            fate: resolved.fate,
            critical: resolved.critical,
        };
        self.effects =
            derive_mission_effects(known, resolved.outcome, resolved.critical, &self.effect_context());
        self.result = Some(result);
        self.status = MissionStatus::Completed;
        Ok(result)
    }

    #[must_use]
    pub fn effect_context(&self) -> EffectContext {
        EffectContext {
            region_code: Some(self.target_region.clone()).filter(|code| !code.is_empty()),
            target_name: self.target.as_ref().map(|t| t.name().to_string()),
        }
    }

    fn require(&self, expected: MissionStatus, action: &'static str) -> Result<(), MissionError> {
        if self.status == expected {
            Ok(())
        } else {
            Err(MissionError::InvalidTransition {
                from: self.status,
                action,
            })
        }
    }
}
