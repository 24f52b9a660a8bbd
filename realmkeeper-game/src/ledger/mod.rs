//! Turn ledger: the orchestrator that reads campaign snapshots, runs the
//! engines and commits the results atomically.
//!
//! Validation failures come back as [`ActionResult::Rejected`]; only store
//! failures and lost optimistic races are errors.
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::CampaignStore;
use crate::constants::{
    DEFAULT_AGENT_MOVES_PER_TURN, DEFAULT_ARMY_MOVES_PER_TURN, DEFAULT_BASE_AGENT_ALLOWANCE,
    DEFAULT_BASE_ARMY_CAP, DEFAULT_FACTION_SLOTS, DEFAULT_REGION_BUILDS_PER_TURN, LOG_TARGET_LEDGER,
};
use crate::faction::{Faction, FactionId, SessionContext, TransferId};
use crate::upkeep::LevyRounding;

pub mod actions;
pub mod batch;
pub mod memory;
mod operations;
pub mod settlement;
pub mod transfer;

pub use actions::{TurnAction, TurnState};
pub use batch::{CommitOutcome, Precondition, WriteBatch, WriteOp};
pub use memory::{MemoryStore, MemoryStoreError};
pub use settlement::{
    FactionTurnReport, HsgUsage, TurnWarning, agent_cap, army_cap, settle_faction,
};
pub use transfer::GoldTransfer;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "LedgerConfig::default_faction_slots")]
    pub faction_slots: u8,
    #[serde(default = "LedgerConfig::default_region_builds_per_turn")]
    pub region_builds_per_turn: u32,
    #[serde(default = "LedgerConfig::default_army_moves_per_turn")]
    pub army_moves_per_turn: u32,
    #[serde(default = "LedgerConfig::default_agent_moves_per_turn")]
    pub agent_moves_per_turn: u32,
    #[serde(default)]
    pub levy_rounding: LevyRounding,
    #[serde(default = "LedgerConfig::default_base_agent_allowance")]
    pub base_agent_allowance: u32,
    #[serde(default = "LedgerConfig::default_base_army_cap")]
    pub base_army_cap: u32,
}

impl LedgerConfig {
    const fn default_faction_slots() -> u8 {
        DEFAULT_FACTION_SLOTS
    }

    const fn default_region_builds_per_turn() -> u32 {
        DEFAULT_REGION_BUILDS_PER_TURN
    }

    const fn default_army_moves_per_turn() -> u32 {
        DEFAULT_ARMY_MOVES_PER_TURN
    }

    const fn default_agent_moves_per_turn() -> u32 {
        DEFAULT_AGENT_MOVES_PER_TURN
    }

    const fn default_base_agent_allowance() -> u32 {
        DEFAULT_BASE_AGENT_ALLOWANCE
    }

    const fn default_base_army_cap() -> u32 {
        DEFAULT_BASE_ARMY_CAP
    }

    /// Parse and validate a JSON config. Missing fields take defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the JSON is malformed or a field is out of range.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::RangeViolation` naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_range("faction_slots", u32::from(self.faction_slots), 1, 16)?;
        check_range("region_builds_per_turn", self.region_builds_per_turn, 1, 10)?;
        check_range("army_moves_per_turn", self.army_moves_per_turn, 1, 10)?;
        check_range("agent_moves_per_turn", self.agent_moves_per_turn, 1, 10)?;
        check_range("base_agent_allowance", self.base_agent_allowance, 0, 20)?;
        check_range("base_army_cap", self.base_army_cap, 0, 20)?;
        Ok(())
    }

    /// Faction ids for every configured slot.
    pub fn slots(&self) -> impl Iterator<Item = FactionId> {
        (1..=self.faction_slots).map(FactionId)
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            faction_slots: Self::default_faction_slots(),
            region_builds_per_turn: Self::default_region_builds_per_turn(),
            army_moves_per_turn: Self::default_army_moves_per_turn(),
            agent_moves_per_turn: Self::default_agent_moves_per_turn(),
            levy_rounding: LevyRounding::default(),
            base_agent_allowance: Self::default_base_agent_allowance(),
            base_army_cap: Self::default_base_army_cap(),
        }
    }
}

fn check_range(field: &'static str, value: u32, min: u32, max: u32) -> Result<(), ConfigError> {
    if value < min || value > max {
        return Err(ConfigError::RangeViolation {
            field,
            min,
            max,
            value,
        });
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{field} must be between {min} and {max} (got {value})")]
    RangeViolation {
        field: &'static str,
        min: u32,
        max: u32,
        value: u32,
    },
    #[error("ledger config is not valid JSON")]
    Parse(#[from] serde_json::Error),
}

/// Orchestration failure. Nothing was written when this is returned.
#[derive(Debug, Error)]
pub enum LedgerError<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    #[error("campaign store failed")]
    Store(#[source] E),
    #[error("commit rejected: precondition {0:?} no longer holds")]
    Conflict(Precondition),
}

/// Why an action was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "rejection", rename_all = "snake_case")]
pub enum Rejection {
    #[error("caller may not perform this action")]
    NotAuthorized,
    #[error("no faction record for {faction}")]
    UnknownFaction { faction: FactionId },
    #[error("amount must be positive (got {amount})")]
    InvalidAmount { amount: i64 },
    #[error("insufficient gold: {available} available, {requested} requested")]
    InsufficientGold { available: i64, requested: i64 },
    #[error("treasury of {balance} cannot absorb {amount} more gold")]
    TreasuryOverflow { balance: i64, amount: i64 },
    #[error("a faction cannot send gold to itself")]
    SelfTransfer,
    #[error("no transfer {transfer}")]
    UnknownTransfer { transfer: TransferId },
    #[error("transfer {transfer} was already claimed")]
    AlreadyClaimed { transfer: TransferId },
    #[error("no {kind} `{id}`")]
    NotFound { kind: &'static str, id: String },
    #[error("{kind} `{id}` does not belong to {faction}")]
    NotOwned {
        kind: &'static str,
        id: String,
        faction: FactionId,
    },
    #[error("{} limit of {limit} reached this turn", .action.label())]
    LimitReached { action: TurnAction, limit: u32 },
    #[error("{what} cap of {cap} reached")]
    CapReached { what: &'static str, cap: u32 },
    #[error("{reason}")]
    RuleViolation { reason: String },
    #[error("{message}")]
    Mission { message: String },
}

/// Outcome of a validated action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "value", rename_all = "snake_case")]
pub enum ActionResult<T> {
    Accepted(T),
    Rejected(Rejection),
}

impl<T> ActionResult<T> {
    #[must_use]
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    #[must_use]
    pub fn accepted(self) -> Option<T> {
        match self {
            Self::Accepted(value) => Some(value),
            Self::Rejected(_) => None,
        }
    }

    #[must_use]
    pub const fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Accepted(_) => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}

impl<T> From<Rejection> for ActionResult<T> {
    fn from(reason: Rejection) -> Self {
        Self::Rejected(reason)
    }
}

pub type LedgerResult<T, E> = Result<ActionResult<T>, LedgerError<E>>;

/// Summary of a completed turn advance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReport {
    /// Turn that was settled.
    pub turn: u32,
    pub next_turn: u32,
    pub factions: Vec<FactionTurnReport>,
    /// Configured slots with no faction record.
    pub skipped_slots: Vec<FactionId>,
}

#[derive(Debug)]
pub struct TurnLedger<S: CampaignStore> {
    store: S,
    config: LedgerConfig,
}

impl<S: CampaignStore> TurnLedger<S> {
    pub const fn new(store: S, config: LedgerConfig) -> Self {
        Self { store, config }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Settle every faction slot and increment the turn in one batch.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if a read or the commit fails, or if another
    /// writer changed the turn or a treasury in the meantime. No faction is
    /// updated in that case.
    pub fn advance_turn(&self, ctx: &SessionContext) -> LedgerResult<TurnReport, S::Error> {
        if !ctx.is_game_master() {
            return Ok(Rejection::NotAuthorized.into());
        }
        let turn = self.store.current_turn().map_err(LedgerError::Store)?;
        let court = self.store.court().map_err(LedgerError::Store)?;

        let mut batch = WriteBatch::new();
        batch.require(Precondition::TurnEquals { turn });
        let mut factions = Vec::new();
        let mut skipped_slots = Vec::new();

        for slot in self.config.slots() {
            let Some(faction) = self.store.faction(slot).map_err(LedgerError::Store)? else {
                warn!(target: LOG_TARGET_LEDGER, "turn {turn}: no record for {slot}, skipping");
                skipped_slots.push(slot);
                continue;
            };
            let regions = self.store.regions_owned_by(slot).map_err(LedgerError::Store)?;
            let armies = self.store.armies_owned_by(slot).map_err(LedgerError::Store)?;
            let agents = self.store.agents_owned_by(slot).map_err(LedgerError::Store)?;
            let report = settle_faction(
                &faction,
                &regions,
                &armies,
                &agents,
                &court.bonuses_for(slot),
                &self.config,
            );
            debug!(
                target: LOG_TARGET_LEDGER,
                "turn {turn}: {slot} income {} court {} upkeep {} net {}",
                report.economy.gold_per_turn,
                report.court_gold,
                report.upkeep.total,
                report.net_gold
            );
            if report.new_balance < 0 {
                warn!(
                    target: LOG_TARGET_LEDGER,
                    "turn {turn}: {slot} treasury is negative ({})", report.new_balance
                );
            }

            batch.guard_faction(&faction);
            let mut updated = faction;
            updated.gold = report.new_balance;
            updated.turn_state.reset();
            batch.push(WriteOp::PutFaction { faction: updated });
            factions.push(report);
        }

        let next_turn = turn + 1;
        batch.push(WriteOp::SetTurn { turn: next_turn });
        self.commit(batch)?;
        info!(
            target: LOG_TARGET_LEDGER,
            "advanced turn {turn} -> {next_turn} ({} factions settled)",
            factions.len()
        );
        Ok(ActionResult::Accepted(TurnReport {
            turn,
            next_turn,
            factions,
            skipped_slots,
        }))
    }

    /// Deduct gold. Insufficient funds reject the whole amount.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure or a concurrent treasury change.
    pub fn spend_gold(
        &self,
        ctx: &SessionContext,
        faction: FactionId,
        amount: i64,
    ) -> LedgerResult<i64, S::Error> {
        if amount <= 0 {
            return Ok(Rejection::InvalidAmount { amount }.into());
        }
        if !ctx.may_act_for(faction) {
            return Ok(Rejection::NotAuthorized.into());
        }
        let mut record = match self.load_faction(faction)? {
            Ok(record) => record,
            Err(rejection) => return Ok(rejection.into()),
        };
        if record.gold < amount {
            return Ok(Rejection::InsufficientGold {
                available: record.gold,
                requested: amount,
            }
            .into());
        }
        let mut batch = WriteBatch::new();
        batch.guard_faction(&record);
        record.gold -= amount;
        let balance = record.gold;
        batch.push(WriteOp::PutFaction { faction: record });
        self.commit(batch)?;
        debug!(target: LOG_TARGET_LEDGER, "{faction} spent {amount}, balance {balance}");
        Ok(ActionResult::Accepted(balance))
    }

    /// Grant gold to a faction. Game master only.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure or a concurrent treasury change.
    pub fn add_gold(
        &self,
        ctx: &SessionContext,
        faction: FactionId,
        amount: i64,
    ) -> LedgerResult<i64, S::Error> {
        if !ctx.is_game_master() {
            return Ok(Rejection::NotAuthorized.into());
        }
        if amount <= 0 {
            return Ok(Rejection::InvalidAmount { amount }.into());
        }
        let mut record = match self.load_faction(faction)? {
            Ok(record) => record,
            Err(rejection) => return Ok(rejection.into()),
        };
        let Some(balance) = record.gold.checked_add(amount) else {
            return Ok(Rejection::TreasuryOverflow {
                balance: record.gold,
                amount,
            }
            .into());
        };
        let mut batch = WriteBatch::new();
        batch.guard_faction(&record);
        record.gold = balance;
        batch.push(WriteOp::PutFaction { faction: record });
        self.commit(batch)?;
        Ok(ActionResult::Accepted(balance))
    }

    /// Debit the sender now and leave a pending transfer for the recipient.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure or a concurrent treasury change.
    pub fn initiate_transfer(
        &self,
        ctx: &SessionContext,
        id: TransferId,
        from: FactionId,
        to: FactionId,
        amount: i64,
    ) -> LedgerResult<GoldTransfer, S::Error> {
        if !ctx.may_act_for(from) {
            return Ok(Rejection::NotAuthorized.into());
        }
        if from == to {
            return Ok(Rejection::SelfTransfer.into());
        }
        if amount <= 0 {
            return Ok(Rejection::InvalidAmount { amount }.into());
        }
        if let Err(rejection) = self.load_faction(to)? {
            return Ok(rejection.into());
        }
        let mut sender = match self.load_faction(from)? {
            Ok(record) => record,
            Err(rejection) => return Ok(rejection.into()),
        };
        if sender.gold < amount {
            return Ok(Rejection::InsufficientGold {
                available: sender.gold,
                requested: amount,
            }
            .into());
        }
        if self.store.transfer(&id).map_err(LedgerError::Store)?.is_some() {
            return Ok(Rejection::RuleViolation {
                reason: format!("transfer {id} already exists"),
            }
            .into());
        }
        let turn = self.store.current_turn().map_err(LedgerError::Store)?;
        let transfer = GoldTransfer {
            id,
            from,
            to,
            amount,
            claimed: false,
            turn,
            note: None,
        };

        let mut batch = WriteBatch::new();
        batch.guard_faction(&sender);
        sender.gold -= amount;
        batch.push(WriteOp::PutFaction { faction: sender });
        batch.push(WriteOp::PutTransfer {
            transfer: transfer.clone(),
        });
        self.commit(batch)?;
        info!(
            target: LOG_TARGET_LEDGER,
            "transfer {} sent: {from} -> {to}, {amount} gold", transfer.id
        );
        Ok(ActionResult::Accepted(transfer))
    }

    /// Credit the recipient and mark the transfer claimed.
    ///
    /// A transfer credits exactly once; a lost race surfaces as
    /// `LedgerError::Conflict` with nothing written.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` on store failure or a concurrent claim.
    pub fn claim_transfer(
        &self,
        ctx: &SessionContext,
        id: &TransferId,
    ) -> LedgerResult<i64, S::Error> {
        let Some(mut transfer) = self.store.transfer(id).map_err(LedgerError::Store)? else {
            return Ok(Rejection::UnknownTransfer {
                transfer: id.clone(),
            }
            .into());
        };
        if !ctx.may_act_for(transfer.to) {
            return Ok(Rejection::NotAuthorized.into());
        }
        if transfer.claimed {
            return Ok(Rejection::AlreadyClaimed {
                transfer: id.clone(),
            }
            .into());
        }
        let mut recipient = match self.load_faction(transfer.to)? {
            Ok(record) => record,
            Err(rejection) => return Ok(rejection.into()),
        };

        let Some(balance) = recipient.gold.checked_add(transfer.amount) else {
            return Ok(Rejection::TreasuryOverflow {
                balance: recipient.gold,
                amount: transfer.amount,
            }
            .into());
        };

        let mut batch = WriteBatch::new();
        batch
            .require(Precondition::TransferUnclaimed {
                transfer: id.clone(),
            })
            .guard_faction(&recipient);
        recipient.gold = balance;
        let (to, amount) = (recipient.id, transfer.amount);
        transfer.claimed = true;
        batch.push(WriteOp::PutFaction { faction: recipient });
        batch.push(WriteOp::PutTransfer { transfer });
        self.commit(batch)?;
        info!(target: LOG_TARGET_LEDGER, "transfer {id} claimed by {to}: {amount} gold");
        Ok(ActionResult::Accepted(balance))
    }

    fn load_faction(
        &self,
        faction: FactionId,
    ) -> Result<Result<Faction, Rejection>, LedgerError<S::Error>> {
        Ok(self
            .store
            .faction(faction)
            .map_err(LedgerError::Store)?
            .ok_or(Rejection::UnknownFaction { faction }))
    }

    fn commit(&self, batch: WriteBatch) -> Result<(), LedgerError<S::Error>> {
        match self.store.commit(batch).map_err(LedgerError::Store)? {
            CommitOutcome::Applied => Ok(()),
            CommitOutcome::Conflict { failed } => {
                warn!(target: LOG_TARGET_LEDGER, "commit rejected: {failed:?}");
                Err(LedgerError::Conflict(failed))
            }
        }
    }
}
