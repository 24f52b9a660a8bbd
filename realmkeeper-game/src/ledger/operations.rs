//! Per-turn orders, recruitment, missions and court changes.
use log::{debug, info};

use super::{
    ActionResult, LedgerError, LedgerResult, Precondition, Rejection, TurnAction, TurnLedger,
    WriteBatch, WriteOp, agent_cap, army_cap,
};
use crate::CampaignStore;
use crate::agent::{Agent, AgentType};
use crate::army::Army;
use crate::buildings::Building;
use crate::constants::{LOG_TARGET_LEDGER, LOG_TARGET_MISSION};
use crate::court::{CharacterStats, CourtAppointment, CourtPosition};
use crate::deity::bonuses_for;
use crate::economy::calculate_economy;
use crate::faction::{AgentId, ArmyId, CharacterId, Faction, FactionId, MissionId, RegionId, SessionContext};
use crate::mission::{
    AgentFate, DifficultyContext, Mission, MissionKey, MissionResult, MissionScene, MissionStatus,
    MissionTarget, RollSource, calculate_mission_difficulty, calculate_mission_difficulty_for_key,
};
use crate::region::Region;

/// Current agent and army caps for a faction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ForceCaps {
    pub agents: u32,
    pub agents_fielded: u32,
    pub armies: u32,
    pub armies_fielded: u32,
}

impl ForceCaps {
    #[must_use]
    pub const fn can_recruit_agent(&self) -> bool {
        self.agents_fielded < self.agents
    }

    #[must_use]
    pub const fn can_raise_army(&self) -> bool {
        self.armies_fielded < self.armies
    }
}

fn count(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl<S: CampaignStore> TurnLedger<S> {
    /// Agent and army caps against what the faction currently fields.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Store` when a read fails.
    pub fn force_caps(&self, faction: FactionId) -> Result<ForceCaps, LedgerError<S::Error>> {
        let record = self.store.faction(faction).map_err(LedgerError::Store)?;
        let regions = self.store.regions_owned_by(faction).map_err(LedgerError::Store)?;
        let armies = self.store.armies_owned_by(faction).map_err(LedgerError::Store)?;
        let agents = self.store.agents_owned_by(faction).map_err(LedgerError::Store)?;
        let court = self.store.court().map_err(LedgerError::Store)?.bonuses_for(faction);
        let economy = calculate_economy(&regions, record.and_then(|f| f.patron_deity));
        Ok(ForceCaps {
            agents: agent_cap(&economy.settlements, &court, &self.config),
            agents_fielded: count(agents.iter().filter(|a| a.is_active()).count()),
            armies: army_cap(&economy.settlements, &court, &self.config),
            armies_fielded: count(armies.iter().filter(|a| a.is_active()).count()),
        })
    }

    /// Add a new agent if the faction is under its cap.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure.
    pub fn recruit_agent(&self, ctx: &SessionContext, agent: Agent) -> LedgerResult<Agent, S::Error> {
        if !ctx.may_act_for(agent.owner) {
            return Ok(Rejection::NotAuthorized.into());
        }
        if self.store.agent(&agent.id).map_err(LedgerError::Store)?.is_some() {
            return Ok(Rejection::RuleViolation {
                reason: format!("agent {} already exists", agent.id),
            }
            .into());
        }
        let caps = self.force_caps(agent.owner)?;
        if !caps.can_recruit_agent() {
            return Ok(Rejection::CapReached {
                what: "agent",
                cap: caps.agents,
            }
            .into());
        }
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::PutAgent {
            agent: agent.clone(),
        });
        self.commit(batch)?;
        Ok(ActionResult::Accepted(agent))
    }

    /// Add a new army if the faction is under its cap.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure.
    pub fn raise_army(
        &self,
        ctx: &SessionContext,
        faction: FactionId,
        army: Army,
    ) -> LedgerResult<Army, S::Error> {
        if !ctx.may_act_for(faction) || army.owner != Some(faction) {
            return Ok(Rejection::NotAuthorized.into());
        }
        if self.store.army(&army.id).map_err(LedgerError::Store)?.is_some() {
            return Ok(Rejection::RuleViolation {
                reason: format!("army {} already exists", army.id),
            }
            .into());
        }
        let caps = self.force_caps(faction)?;
        if !caps.can_raise_army() {
            return Ok(Rejection::CapReached {
                what: "army",
                cap: caps.armies,
            }
            .into());
        }
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::PutArmy { army: army.clone() });
        self.commit(batch)?;
        Ok(ActionResult::Accepted(army))
    }

    /// Build in an owned region, at most once per region per turn.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure or a concurrent order.
    pub fn record_build(
        &self,
        ctx: &SessionContext,
        faction: FactionId,
        region_id: &RegionId,
        building: Building,
    ) -> LedgerResult<Region, S::Error> {
        if !ctx.may_act_for(faction) {
            return Ok(Rejection::NotAuthorized.into());
        }
        let mut record = match self.load_faction(faction)? {
            Ok(record) => record,
            Err(rejection) => return Ok(rejection.into()),
        };
        let Some(mut region) = self.store.region(region_id).map_err(LedgerError::Store)? else {
            return Ok(not_found("region", region_id.as_str()));
        };
        if region.owner != Some(faction) {
            return Ok(not_owned("region", region_id.as_str(), faction));
        }
        let mut batch = WriteBatch::new();
        batch.guard_faction(&record);
        let limit = self.config.region_builds_per_turn;
        if !record.turn_state.try_record_build(region_id, limit) {
            return Ok(limit_reached(TurnAction::Build, limit));
        }
        let check = region.try_build(building);
        if !check.allowed {
            return Ok(Rejection::RuleViolation {
                reason: check.reason,
            }
            .into());
        }

        batch.push(WriteOp::PutRegion {
            region: region.clone(),
        });
        batch.push(WriteOp::PutFaction { faction: record });
        self.commit(batch)?;
        debug!(target: LOG_TARGET_LEDGER, "{faction} built {building} in {}", region.code);
        Ok(ActionResult::Accepted(region))
    }

    /// Move an army. The patron may raise the per-turn allowance.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure or a concurrent order.
    pub fn record_army_move(
        &self,
        ctx: &SessionContext,
        faction: FactionId,
        army_id: &ArmyId,
        destination: &str,
    ) -> LedgerResult<Army, S::Error> {
        if !ctx.may_act_for(faction) {
            return Ok(Rejection::NotAuthorized.into());
        }
        let mut record = match self.load_faction(faction)? {
            Ok(record) => record,
            Err(rejection) => return Ok(rejection.into()),
        };
        let Some(mut army) = self.store.army(army_id).map_err(LedgerError::Store)? else {
            return Ok(not_found("army", army_id.as_str()));
        };
        if !army.is_active() {
            return Ok(not_found("army", army_id.as_str()));
        }
        if army.owner != Some(faction) {
            return Ok(not_owned("army", army_id.as_str(), faction));
        }
        let limit = self.army_move_limit(&record);
        let mut batch = WriteBatch::new();
        batch.guard_faction(&record);
        if !record.turn_state.try_record_army_move(army_id, limit) {
            return Ok(limit_reached(TurnAction::ArmyMove, limit));
        }
        army.location = destination.to_string();

        batch.push(WriteOp::PutArmy { army: army.clone() });
        batch.push(WriteOp::PutFaction { faction: record });
        self.commit(batch)?;
        Ok(ActionResult::Accepted(army))
    }

    /// Move an agent, at most twice per turn by default.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure or a concurrent order.
    pub fn record_agent_move(
        &self,
        ctx: &SessionContext,
        faction: FactionId,
        agent_id: &AgentId,
        destination: &str,
    ) -> LedgerResult<Agent, S::Error> {
        if !ctx.may_act_for(faction) {
            return Ok(Rejection::NotAuthorized.into());
        }
        let mut record = match self.load_faction(faction)? {
            Ok(record) => record,
            Err(rejection) => return Ok(rejection.into()),
        };
        let Some(mut agent) = self.store.agent(agent_id).map_err(LedgerError::Store)? else {
            return Ok(not_found("agent", agent_id.as_str()));
        };
        if !agent.is_active() {
            return Ok(not_found("agent", agent_id.as_str()));
        }
        if agent.owner != faction {
            return Ok(not_owned("agent", agent_id.as_str(), faction));
        }
        let limit = self.config.agent_moves_per_turn;
        let mut batch = WriteBatch::new();
        batch.guard_faction(&record);
        if !record.turn_state.try_record_agent_move(agent_id, limit) {
            return Ok(limit_reached(TurnAction::AgentMove, limit));
        }
        agent.location = destination.to_string();

        batch.push(WriteOp::PutAgent {
            agent: agent.clone(),
        });
        batch.push(WriteOp::PutFaction { faction: record });
        self.commit(batch)?;
        Ok(ActionResult::Accepted(agent))
    }

    fn army_move_limit(&self, faction: &Faction) -> u32 {
        bonuses_for(faction.patron_deity)
            .army_moves_per_turn
            .map_or(self.config.army_moves_per_turn, |bonus| {
                bonus.max(self.config.army_moves_per_turn)
            })
    }

    /// File a pending mission for one of the caller's agents.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure.
    pub fn submit_mission(
        &self,
        ctx: &SessionContext,
        id: MissionId,
        agent_id: &AgentId,
        mission_type: MissionKey,
        target_region: &str,
        target: Option<MissionTarget>,
    ) -> LedgerResult<Mission, S::Error> {
        let Some(agent) = self.store.agent(agent_id).map_err(LedgerError::Store)? else {
            return Ok(not_found("agent", agent_id.as_str()));
        };
        if !ctx.may_act_for(agent.owner) {
            return Ok(Rejection::NotAuthorized.into());
        }
        if !agent.is_active() {
            return Ok(not_found("agent", agent_id.as_str()));
        }
        if self.store.mission(&id).map_err(LedgerError::Store)?.is_some() {
            return Ok(Rejection::RuleViolation {
                reason: format!("mission {id} already exists"),
            }
            .into());
        }
        let mission = match Mission::submit(id, &agent, mission_type, target_region, target) {
            Ok(mission) => mission,
            Err(err) => return Ok(mission_rejection(&err)),
        };
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::PutMission {
            mission: mission.clone(),
        });
        self.commit(batch)?;
        Ok(ActionResult::Accepted(mission))
    }

    /// Compute and freeze difficulty from the current campaign state.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure or a concurrent status change.
    pub fn approve_mission(&self, ctx: &SessionContext, id: &MissionId) -> LedgerResult<Mission, S::Error> {
        if !ctx.is_game_master() {
            return Ok(Rejection::NotAuthorized.into());
        }
        let Some(mut mission) = self.store.mission(id).map_err(LedgerError::Store)? else {
            return Ok(not_found("mission", id.as_str()));
        };
        let code = mission.target_region.as_str();
        let region = self.store.region_by_code(code).map_err(LedgerError::Store)?;
        let armies = self.store.armies_at(code).map_err(LedgerError::Store)?;
        let agents = self.store.agents_at(code).map_err(LedgerError::Store)?;
        let scene = MissionScene {
            region: region.as_ref(),
            armies: &armies,
            agents: &agents,
        };
        let difficulty_ctx = DifficultyContext::gather(
            &scene,
            mission.faction,
            Some(&mission.agent.agent_id),
            mission.target.as_ref(),
        );
        let report = match mission.mission_type.known() {
            Some(known) => calculate_mission_difficulty(known, &difficulty_ctx),
            None => calculate_mission_difficulty_for_key(mission.mission_type.as_str(), &difficulty_ctx),
        };
        let difficulty = report.difficulty;
        if let Err(err) = mission.approve(report) {
            return Ok(mission_rejection(&err));
        }

        let mut batch = WriteBatch::new();
        batch.require(Precondition::MissionStatus {
            mission: id.clone(),
            expected: MissionStatus::Pending,
        });
        batch.push(WriteOp::PutMission {
            mission: mission.clone(),
        });
        self.commit(batch)?;
        info!(
            target: LOG_TARGET_MISSION,
            "mission {id} ({}) approved at difficulty {difficulty}",
            mission.mission_type.as_str()
        );
        Ok(ActionResult::Accepted(mission))
    }

    /// # Errors
    ///
    /// Returns `LedgerError` on store failure or a concurrent status change.
    pub fn reject_mission(
        &self,
        ctx: &SessionContext,
        id: &MissionId,
        reason: &str,
    ) -> LedgerResult<Mission, S::Error> {
        if !ctx.is_game_master() {
            return Ok(Rejection::NotAuthorized.into());
        }
        let Some(mut mission) = self.store.mission(id).map_err(LedgerError::Store)? else {
            return Ok(not_found("mission", id.as_str()));
        };
        let previous = mission.status;
        if let Err(err) = mission.reject(reason) {
            return Ok(mission_rejection(&err));
        }
        let mut batch = WriteBatch::new();
        batch.require(Precondition::MissionStatus {
            mission: id.clone(),
            expected: previous,
        });
        batch.push(WriteOp::PutMission {
            mission: mission.clone(),
        });
        self.commit(batch)?;
        Ok(ActionResult::Accepted(mission))
    }

    /// Roll an approved mission and write the agent's fate back.
    ///
    /// A dead agent is soft-deleted; a revealed agent is flagged. Both land in
    /// the same batch as the completed mission.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure or a concurrent status change.
    pub fn resolve_mission<R: RollSource + ?Sized>(
        &self,
        ctx: &SessionContext,
        id: &MissionId,
        dice: &mut R,
    ) -> LedgerResult<MissionResult, S::Error> {
        if !ctx.is_game_master() {
            return Ok(Rejection::NotAuthorized.into());
        }
        let Some(mut mission) = self.store.mission(id).map_err(LedgerError::Store)? else {
            return Ok(not_found("mission", id.as_str()));
        };
        let agent = self
            .store
            .agent(&mission.agent.agent_id)
            .map_err(LedgerError::Store)?;
        let result = match mission.resolve(dice) {
            Ok(result) => result,
            Err(err) => return Ok(mission_rejection(&err)),
        };

        let mut batch = WriteBatch::new();
        batch.require(Precondition::MissionStatus {
            mission: id.clone(),
            expected: MissionStatus::Approved,
        });
        if let Some(mut agent) = agent {
            match result.fate {
                AgentFate::Dead => agent.deleted = true,
                AgentFate::Revealed => agent.revealed = true,
                AgentFate::Safe => {}
            }
            batch.push(WriteOp::PutAgent { agent });
        }
        batch.push(WriteOp::PutMission { mission });
        self.commit(batch)?;
        debug!(
            target: LOG_TARGET_MISSION,
            "mission {id}: roll {} bonus {} margin {} -> {:?}/{:?}",
            result.roll,
            result.agent_bonus,
            result.margin,
            result.outcome,
            result.fate
        );
        Ok(ActionResult::Accepted(result))
    }

    /// Seat a character in a court office, replacing any holder.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure.
    pub fn appoint_court(
        &self,
        ctx: &SessionContext,
        position: CourtPosition,
        character_id: CharacterId,
        faction: FactionId,
        live: CharacterStats,
    ) -> LedgerResult<CourtAppointment, S::Error> {
        if !ctx.is_game_master() {
            return Ok(Rejection::NotAuthorized.into());
        }
        let mut court = self.store.court().map_err(LedgerError::Store)?;
        court.appoint(position, character_id, faction, live);
        let Some(appointment) = court.holder(position).cloned() else {
            return Ok(not_found("court position", &format!("{position:?}")));
        };
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Appoint {
            appointment: appointment.clone(),
        });
        self.commit(batch)?;
        Ok(ActionResult::Accepted(appointment))
    }

    /// # Errors
    ///
    /// Returns `LedgerError` on store failure.
    pub fn vacate_court(
        &self,
        ctx: &SessionContext,
        position: CourtPosition,
    ) -> LedgerResult<Option<CourtAppointment>, S::Error> {
        if !ctx.is_game_master() {
            return Ok(Rejection::NotAuthorized.into());
        }
        let previous = self.store.court().map_err(LedgerError::Store)?.vacate(position);
        let mut batch = WriteBatch::new();
        batch.push(WriteOp::Vacate { position });
        self.commit(batch)?;
        Ok(ActionResult::Accepted(previous))
    }
}

fn not_found<T>(kind: &'static str, id: &str) -> ActionResult<T> {
    Rejection::NotFound {
        kind,
        id: id.to_string(),
    }
    .into()
}

fn not_owned<T>(kind: &'static str, id: &str, faction: FactionId) -> ActionResult<T> {
    Rejection::NotOwned {
        kind,
        id: id.to_string(),
        faction,
    }
    .into()
}

const fn limit_reached<T>(action: TurnAction, limit: u32) -> ActionResult<T> {
    ActionResult::Rejected(Rejection::LimitReached { action, limit })
}

fn mission_rejection<T>(err: &crate::mission::MissionError) -> ActionResult<T> {
    Rejection::Mission {
        message: err.to_string(),
    }
    .into()
}
