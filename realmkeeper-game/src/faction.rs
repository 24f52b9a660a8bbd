//! Identifiers and the per-faction economic record.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::deity::PatronDeity;
use crate::ledger::TurnState;

/// One of the fixed faction slots, numbered from 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactionId(pub u8);

impl fmt::Display for FactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "faction-{}", self.0)
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Document id of a region record.
    RegionId
);
string_id!(ArmyId);
string_id!(AgentId);
string_id!(CharacterId);
string_id!(MissionId);
string_id!(
    /// Document id of a pending gold transfer.
    TransferId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Navy {
    #[serde(default)]
    pub warships: u32,
}

/// Stored economic state of a faction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub id: FactionId,
    pub name: String,
    /// Stored treasury. May be negative after a bad turn; callers flag it.
    #[serde(default)]
    pub gold: i64,
    #[serde(default)]
    pub navy: Navy,
    #[serde(default)]
    pub patron_deity: Option<PatronDeity>,
    #[serde(default)]
    pub turn_state: TurnState,
}

impl Faction {
    #[must_use]
    pub fn new(id: FactionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            gold: 0,
            navy: Navy::default(),
            patron_deity: None,
            turn_state: TurnState::default(),
        }
    }

    #[must_use]
    pub fn with_gold(mut self, gold: i64) -> Self {
        self.gold = gold;
        self
    }

    #[must_use]
    pub fn with_patron(mut self, deity: PatronDeity) -> Self {
        self.patron_deity = Some(deity);
        self
    }

    #[must_use]
    pub fn with_warships(mut self, warships: u32) -> Self {
        self.navy.warships = warships;
        self
    }
}

/// Who is calling into the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "role", content = "faction")]
pub enum Role {
    GameMaster,
    Faction(FactionId),
}

/// Explicit per-call session, supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub role: Role,
}

impl SessionContext {
    #[must_use]
    pub const fn game_master() -> Self {
        Self {
            role: Role::GameMaster,
        }
    }

    #[must_use]
    pub const fn faction(id: FactionId) -> Self {
        Self {
            role: Role::Faction(id),
        }
    }

    #[must_use]
    pub const fn is_game_master(&self) -> bool {
        matches!(self.role, Role::GameMaster)
    }

    /// The GM may act for anyone; a faction only for itself.
    #[must_use]
    pub fn may_act_for(&self, faction: FactionId) -> bool {
        match self.role {
            Role::GameMaster => true,
            Role::Faction(own) => own == faction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_scopes_faction_actions() {
        let gm = SessionContext::game_master();
        let player = SessionContext::faction(FactionId(2));
        assert!(gm.may_act_for(FactionId(4)));
        assert!(player.may_act_for(FactionId(2)));
        assert!(!player.may_act_for(FactionId(3)));
        assert!(!player.is_game_master());
    }

    #[test]
    fn faction_record_defaults_missing_fields() {
        let faction: Faction = serde_json::from_str(r#"{"id":3,"name":"Ashfall"}"#).unwrap();
        assert_eq!(faction.id, FactionId(3));
        assert_eq!(faction.gold, 0);
        assert_eq!(faction.navy.warships, 0);
        assert!(faction.patron_deity.is_none());
        assert!(faction.turn_state.is_empty());
    }

    #[test]
    fn string_ids_are_transparent() {
        let id = RegionId::new("r-12");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""r-12""#);
        assert_eq!(id.to_string(), "r-12");
        assert_eq!(id.as_str(), "r-12");
    }
}
