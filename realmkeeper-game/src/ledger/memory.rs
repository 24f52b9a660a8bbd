//! In-memory campaign store used by tests and the tester binary.
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use thiserror::Error;

use super::{CommitOutcome, GoldTransfer, Precondition, WriteBatch, WriteOp};
use crate::CampaignStore;
use crate::agent::Agent;
use crate::army::Army;
use crate::court::Court;
use crate::faction::{AgentId, ArmyId, Faction, FactionId, MissionId, RegionId, TransferId};
use crate::mission::Mission;
use crate::region::Region;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MemoryStoreError {
    #[error("injected commit failure")]
    InjectedCommitFailure,
    #[error("injected read failure")]
    InjectedReadFailure,
}

/// Everything the store holds, in a deterministic order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CampaignSnapshot {
    pub turn: u32,
    pub factions: BTreeMap<FactionId, Faction>,
    pub regions: BTreeMap<RegionId, Region>,
    pub armies: BTreeMap<ArmyId, Army>,
    pub agents: BTreeMap<AgentId, Agent>,
    pub court: Court,
    pub transfers: BTreeMap<TransferId, GoldTransfer>,
    pub missions: BTreeMap<MissionId, Mission>,
}

impl CampaignSnapshot {
    fn holds(&self, precondition: &Precondition) -> bool {
        match precondition {
            Precondition::TurnEquals { turn } => self.turn == *turn,
            Precondition::FactionGold { faction, expected } => self
                .factions
                .get(faction)
                .is_some_and(|f| f.gold == *expected),
            Precondition::FactionTurnState { faction, expected } => self
                .factions
                .get(faction)
                .is_some_and(|f| f.turn_state == *expected),
            Precondition::TransferUnclaimed { transfer } => self
                .transfers
                .get(transfer)
                .is_some_and(GoldTransfer::is_pending),
            Precondition::MissionStatus { mission, expected } => self
                .missions
                .get(mission)
                .is_some_and(|m| m.status == *expected),
        }
    }

    fn apply(&mut self, op: WriteOp) {
        match op {
            WriteOp::SetTurn { turn } => self.turn = turn,
            WriteOp::PutFaction { faction } => {
                self.factions.insert(faction.id, faction);
            }
            WriteOp::PutTransfer { transfer } => {
                self.transfers.insert(transfer.id.clone(), transfer);
            }
            WriteOp::PutRegion { region } => {
                self.regions.insert(region.id.clone(), region);
            }
            WriteOp::PutArmy { army } => {
                self.armies.insert(army.id.clone(), army);
            }
            WriteOp::PutAgent { agent } => {
                self.agents.insert(agent.id.clone(), agent);
            }
            WriteOp::PutMission { mission } => {
                self.missions.insert(mission.id.clone(), mission);
            }
            WriteOp::Appoint { appointment } => {
                self.court.install(appointment);
            }
            WriteOp::Vacate { position } => {
                self.court.vacate(position);
            }
        }
    }
}

/// Single-threaded store with all-or-nothing batch commits.
///
/// `fail_next_commit` and `fail_reads` simulate backend outages.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<CampaignSnapshot>,
    fail_next_commit: Cell<bool>,
    fail_reads: Cell<bool>,
    commits: Cell<u64>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_snapshot(snapshot: CampaignSnapshot) -> Self {
        Self {
            state: RefCell::new(snapshot),
            ..Self::default()
        }
    }

    /// Copy of the current contents.
    #[must_use]
    pub fn snapshot(&self) -> CampaignSnapshot {
        self.state.borrow().clone()
    }

    pub fn set_turn(&self, turn: u32) {
        self.state.borrow_mut().turn = turn;
    }

    pub fn insert_faction(&self, faction: Faction) {
        self.state.borrow_mut().apply(WriteOp::PutFaction { faction });
    }

    pub fn insert_region(&self, region: Region) {
        self.state.borrow_mut().apply(WriteOp::PutRegion { region });
    }

    pub fn insert_army(&self, army: Army) {
        self.state.borrow_mut().apply(WriteOp::PutArmy { army });
    }

    pub fn insert_agent(&self, agent: Agent) {
        self.state.borrow_mut().apply(WriteOp::PutAgent { agent });
    }

    pub fn insert_transfer(&self, transfer: GoldTransfer) {
        self.state.borrow_mut().apply(WriteOp::PutTransfer { transfer });
    }

    pub fn insert_mission(&self, mission: Mission) {
        self.state.borrow_mut().apply(WriteOp::PutMission { mission });
    }

    pub fn set_court(&self, court: Court) {
        self.state.borrow_mut().court = court;
    }

    /// Make the next commit fail before anything is applied.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.set(true);
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.set(fail);
    }

    /// Commits that were applied.
    #[must_use]
    pub fn commits(&self) -> u64 {
        self.commits.get()
    }

    fn read<T>(&self, f: impl FnOnce(&CampaignSnapshot) -> T) -> Result<T, MemoryStoreError> {
        if self.fail_reads.get() {
            return Err(MemoryStoreError::InjectedReadFailure);
        }
        Ok(f(&self.state.borrow()))
    }
}

fn collect<'a, T: Clone + 'a>(
    values: impl Iterator<Item = &'a T>,
    keep: impl Fn(&T) -> bool,
) -> Vec<T> {
    values.filter(|v| keep(v)).cloned().collect()
}

impl CampaignStore for MemoryStore {
    type Error = MemoryStoreError;

    fn current_turn(&self) -> Result<u32, Self::Error> {
        self.read(|s| s.turn)
    }

    fn faction(&self, id: FactionId) -> Result<Option<Faction>, Self::Error> {
        self.read(|s| s.factions.get(&id).cloned())
    }

    fn regions_owned_by(&self, faction: FactionId) -> Result<Vec<Region>, Self::Error> {
        self.read(|s| collect(s.regions.values(), |r| r.owner == Some(faction)))
    }

    fn region(&self, id: &RegionId) -> Result<Option<Region>, Self::Error> {
        self.read(|s| s.regions.get(id).cloned())
    }

    fn region_by_code(&self, code: &str) -> Result<Option<Region>, Self::Error> {
        self.read(|s| s.regions.values().find(|r| r.code == code).cloned())
    }

    fn armies_owned_by(&self, faction: FactionId) -> Result<Vec<Army>, Self::Error> {
        self.read(|s| collect(s.armies.values(), |a| a.owner == Some(faction)))
    }

    fn armies_at(&self, code: &str) -> Result<Vec<Army>, Self::Error> {
        self.read(|s| collect(s.armies.values(), |a| a.location == code))
    }

    fn army(&self, id: &ArmyId) -> Result<Option<Army>, Self::Error> {
        self.read(|s| s.armies.get(id).cloned())
    }

    fn agents_owned_by(&self, faction: FactionId) -> Result<Vec<Agent>, Self::Error> {
        self.read(|s| collect(s.agents.values(), |a| a.owner == faction))
    }

    fn agents_at(&self, code: &str) -> Result<Vec<Agent>, Self::Error> {
        self.read(|s| collect(s.agents.values(), |a| a.location == code))
    }

    fn agent(&self, id: &AgentId) -> Result<Option<Agent>, Self::Error> {
        self.read(|s| s.agents.get(id).cloned())
    }

    fn court(&self) -> Result<Court, Self::Error> {
        self.read(|s| s.court.clone())
    }

    fn transfer(&self, id: &TransferId) -> Result<Option<GoldTransfer>, Self::Error> {
        self.read(|s| s.transfers.get(id).cloned())
    }

    fn mission(&self, id: &MissionId) -> Result<Option<Mission>, Self::Error> {
        self.read(|s| s.missions.get(id).cloned())
    }

    fn commit(&self, batch: WriteBatch) -> Result<CommitOutcome, Self::Error> {
        if self.fail_next_commit.replace(false) {
            return Err(MemoryStoreError::InjectedCommitFailure);
        }
        let (preconditions, ops) = batch.into_parts();
        let mut state = self.state.borrow_mut();
        if let Some(failed) = preconditions.into_iter().find(|p| !state.holds(p)) {
            return Ok(CommitOutcome::Conflict { failed });
        }
        for op in ops {
            state.apply(op);
        }
        self.commits.set(self.commits.get() + 1);
        Ok(CommitOutcome::Applied)
    }
}
