//! Agents: spies, agitators and enforcers.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::constants::{AGENT_LEVEL_MAX, AGENT_LEVEL_MIN};
use crate::faction::{AgentId, FactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentType {
    Spy,
    Agitator,
    Enforcer,
}

impl AgentType {
    pub const ALL: [Self; 3] = [Self::Spy, Self::Agitator, Self::Enforcer];

    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Spy => "spy",
            Self::Agitator => "agitator",
            Self::Enforcer => "enforcer",
        }
    }

    /// Spies and agitators can be exposed; enforcers either live or die.
    #[must_use]
    pub const fn can_be_revealed(self) -> bool {
        !matches!(self, Self::Enforcer)
    }
}

impl fmt::Display for AgentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown agent type `{0}`")]
pub struct UnknownAgentType(pub String);

impl FromStr for AgentType {
    type Err = UnknownAgentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.key().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| UnknownAgentType(trimmed.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub owner: FactionId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: AgentType,
    pub level: u8,
    /// Region code.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub revealed: bool,
    /// Set when the agent dies on a mission.
    #[serde(default)]
    pub deleted: bool,
}

impl Agent {
    #[must_use]
    pub fn new(
        id: AgentId,
        owner: FactionId,
        name: impl Into<String>,
        kind: AgentType,
        level: u8,
    ) -> Self {
        Self {
            id,
            owner,
            name: name.into(),
            kind,
            level: clamp_level(level),
            location: String::new(),
            revealed: false,
            deleted: false,
        }
    }

    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.deleted
    }

    /// Change level by `delta`, staying within 1..=10.
    pub fn adjust_level(&mut self, delta: i8) {
        let next = i16::from(self.level) + i16::from(delta);
        self.level = clamp_level(u8::try_from(next.max(0)).unwrap_or(AGENT_LEVEL_MAX));
    }
}

const fn clamp_level(level: u8) -> u8 {
    if level < AGENT_LEVEL_MIN {
        AGENT_LEVEL_MIN
    } else if level > AGENT_LEVEL_MAX {
        AGENT_LEVEL_MAX
    } else {
        level
    }
}
