//! Atomic write batches with optimistic preconditions.
use serde::{Deserialize, Serialize};

use super::{GoldTransfer, TurnState};
use crate::agent::Agent;
use crate::army::Army;
use crate::court::{CourtAppointment, CourtPosition};
use crate::faction::{Faction, FactionId, MissionId, TransferId};
use crate::mission::{Mission, MissionStatus};
use crate::region::Region;

/// A condition the store checks against its current state before applying
/// any write in the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Precondition {
    TurnEquals { turn: u32 },
    FactionGold { faction: FactionId, expected: i64 },
    FactionTurnState { faction: FactionId, expected: TurnState },
    TransferUnclaimed { transfer: TransferId },
    MissionStatus { mission: MissionId, expected: MissionStatus },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WriteOp {
    SetTurn { turn: u32 },
    PutFaction { faction: Faction },
    PutTransfer { transfer: GoldTransfer },
    PutRegion { region: Region },
    PutArmy { army: Army },
    PutAgent { agent: Agent },
    PutMission { mission: Mission },
    Appoint { appointment: CourtAppointment },
    Vacate { position: CourtPosition },
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WriteBatch {
    preconditions: Vec<Precondition>,
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn require(&mut self, precondition: Precondition) -> &mut Self {
        self.preconditions.push(precondition);
        self
    }

    /// Guard a whole-record faction write: treasury and turn state must both
    /// still match the snapshot the caller read.
    pub fn guard_faction(&mut self, snapshot: &Faction) -> &mut Self {
        self.require(Precondition::FactionGold {
            faction: snapshot.id,
            expected: snapshot.gold,
        })
        .require(Precondition::FactionTurnState {
            faction: snapshot.id,
            expected: snapshot.turn_state.clone(),
        })
    }

    pub fn push(&mut self, op: WriteOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    #[must_use]
    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    #[must_use]
    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<Precondition>, Vec<WriteOp>) {
        (self.preconditions, self.ops)
    }
}

/// Result of a commit that reached the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommitOutcome {
    Applied,
    /// Nothing was written; the first failing precondition is returned.
    Conflict { failed: Precondition },
}

impl CommitOutcome {
    #[must_use]
    pub const fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
