//! Margin bands that turn a roll into an outcome and an agent fate.
use serde::{Deserialize, Serialize};

use crate::agent::AgentType;
use crate::constants::{
    MARGIN_COVERT_CLEAN_FAILURE, MARGIN_COVERT_EXPOSED_FAILURE, MARGIN_COVERT_EXPOSED_SUCCESS,
    MARGIN_CRITICAL, MARGIN_ENFORCER_FAILURE, MARGIN_SUCCESS,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionOutcome {
    CriticalSuccess,
    Success,
    Failure,
    Death,
}

impl MissionOutcome {
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::CriticalSuccess | Self::Success)
    }

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::CriticalSuccess => "critical_success",
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Death => "death",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentFate {
    Safe,
    Revealed,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedOutcome {
    pub outcome: MissionOutcome,
    pub fate: AgentFate,
    pub success: bool,
    pub critical: bool,
    pub margin: i32,
    pub description: &'static str,
}

const fn resolved(
    outcome: MissionOutcome,
    fate: AgentFate,
    margin: i32,
    description: &'static str,
) -> ResolvedOutcome {
    ResolvedOutcome {
        outcome,
        fate,
        success: outcome.is_success(),
        critical: matches!(outcome, MissionOutcome::CriticalSuccess),
        margin,
        description,
    }
}

/// Map a roll to an outcome tier.
///
/// `margin = roll + agent_bonus - difficulty`. Enforcers use a table without
/// a revealed band; spies and agitators walk six bands from the top down.
#[must_use]
pub const fn determine_mission_outcome(
    roll: u8,
    agent_bonus: i32,
    difficulty: i32,
    agent_type: AgentType,
) -> ResolvedOutcome {
    use AgentFate::{Dead, Revealed, Safe};
    use MissionOutcome::{CriticalSuccess, Death, Failure, Success};

    let margin = roll as i32 + agent_bonus - difficulty;
    if !agent_type.can_be_revealed() {
        return if margin >= MARGIN_CRITICAL {
            resolved(CriticalSuccess, Safe, margin, "Flawless execution. The agent returns unseen.")
        } else if margin >= MARGIN_SUCCESS {
            resolved(Success, Safe, margin, "The deed is done and the agent slips away.")
        } else if margin >= MARGIN_ENFORCER_FAILURE {
            resolved(Failure, Safe, margin, "The attempt fails, but the agent escapes.")
        } else {
            resolved(Death, Dead, margin, "The agent is cut down in the attempt.")
        };
    }

    if margin >= MARGIN_CRITICAL {
        resolved(CriticalSuccess, Safe, margin, "Flawless execution. No one suspects a thing.")
    } else if margin >= MARGIN_COVERT_EXPOSED_SUCCESS {
        resolved(Success, Revealed, margin, "The mission succeeds, but the agent's identity is exposed.")
    } else if margin >= MARGIN_SUCCESS {
        resolved(Success, Safe, margin, "The mission succeeds quietly.")
    } else if margin >= MARGIN_COVERT_CLEAN_FAILURE {
        resolved(Failure, Safe, margin, "The mission fails, but the agent withdraws unnoticed.")
    } else if margin >= MARGIN_COVERT_EXPOSED_FAILURE {
        resolved(Failure, Revealed, margin, "The mission fails and the agent is exposed.")
    } else {
        resolved(Death, Dead, margin, "The agent is captured and executed.")
    }
}
