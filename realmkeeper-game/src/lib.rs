//! Realmkeeper Rules Engine
//!
//! Core campaign rules for Realmkeeper: region economy, upkeep, agent
//! missions and turn settlement. Storage and presentation live behind the
//! [`CampaignStore`] and [`ConfigSource`] traits.

pub mod agent;
pub mod army;
pub mod buildings;
pub mod constants;
pub mod court;
pub mod deity;
pub mod economy;
pub mod events;
pub mod faction;
pub mod import;
pub mod ledger;
pub mod mission;
pub mod region;
pub mod terrain;
pub mod upkeep;

use anyhow::Context;

// Re-export commonly used types
pub use agent::{Agent, AgentType};
pub use army::{Army, UnitCounts};
pub use buildings::{Building, BuildingCategory, BuildingEffects, SettlementTier};
pub use court::{CharacterStats, Court, CourtAppointment, CourtBonus, CourtPosition, StatSnapshot};
pub use deity::{DeityBonuses, PatronDeity, bonuses_for};
pub use economy::{EconomyLedger, IncomeBreakdown, RegionEconomy, calculate_economy, calculate_region_economy};
pub use events::{EventContext, RandomEventCatalog, pick_random_event};
pub use faction::{
    AgentId, ArmyId, CharacterId, Faction, FactionId, MissionId, Navy, RegionId, Role,
    SessionContext, TransferId,
};
pub use import::{ImportError, import_regions};
pub use ledger::{
    ActionResult, CommitOutcome, ConfigError, FactionTurnReport, GoldTransfer, LedgerConfig,
    LedgerError, MemoryStore, Precondition, Rejection, TurnLedger, TurnReport, TurnState,
    WriteBatch, WriteOp,
};
pub use mission::{
    AgentFate, DifficultyContext, DifficultyReport, Mission, MissionDice, MissionOutcome, MissionResult,
    MissionStatus, MissionTarget, MissionType, RollSource, agent_bonus,
    calculate_mission_difficulty, calculate_mission_difficulty_for_key, derive_mission_effects,
    determine_mission_outcome,
};
pub use region::{Region, RegionError};
pub use terrain::{RuleCheck, Terrain, can_add_building, can_change_settlement};
pub use upkeep::{LevyRounding, UpkeepBreakdown, calculate_upkeep};

/// Name under which [`open_ledger`] looks up the ledger config.
pub const LEDGER_CONFIG_NAME: &str = "ledger";
/// Name under which [`load_event_catalog`] looks up an event catalogue override.
pub const EVENT_CATALOG_NAME: &str = "random_events";

/// Trait for abstracting campaign persistence
/// Backend-specific implementations should provide this
pub trait CampaignStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Current turn number
    ///
    /// # Errors
    ///
    /// Returns an error if the campaign record cannot be read.
    fn current_turn(&self) -> Result<u32, Self::Error>;

    /// Load a faction record
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn faction(&self, id: FactionId) -> Result<Option<Faction>, Self::Error>;

    /// Regions owned by a faction
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn regions_owned_by(&self, faction: FactionId) -> Result<Vec<Region>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn region(&self, id: &RegionId) -> Result<Option<Region>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn region_by_code(&self, code: &str) -> Result<Option<Region>, Self::Error>;

    /// Armies owned by a faction, including soft-deleted ones
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn armies_owned_by(&self, faction: FactionId) -> Result<Vec<Army>, Self::Error>;

    /// Armies located in a region, any owner
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn armies_at(&self, code: &str) -> Result<Vec<Army>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn army(&self, id: &ArmyId) -> Result<Option<Army>, Self::Error>;

    /// Agents owned by a faction, including dead ones
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn agents_owned_by(&self, faction: FactionId) -> Result<Vec<Agent>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn agents_at(&self, code: &str) -> Result<Vec<Agent>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn agent(&self, id: &AgentId) -> Result<Option<Agent>, Self::Error>;

    /// All court appointments
    ///
    /// # Errors
    ///
    /// Returns an error if the appointments cannot be read.
    fn court(&self) -> Result<Court, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn transfer(&self, id: &TransferId) -> Result<Option<GoldTransfer>, Self::Error>;

    /// # Errors
    ///
    /// Returns an error if the record cannot be read.
    fn mission(&self, id: &MissionId) -> Result<Option<Mission>, Self::Error>;

    /// Apply every write in `batch` or none of them
    ///
    /// A failed precondition is reported as [`CommitOutcome::Conflict`], not
    /// as an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend could not run the commit.
    fn commit(&self, batch: WriteBatch) -> Result<CommitOutcome, Self::Error>;
}

/// Trait for abstracting where JSON configuration comes from
pub trait ConfigSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Raw JSON for a named config, or `None` when the source has none
    ///
    /// # Errors
    ///
    /// Returns an error if the source exists but cannot be read.
    fn load_raw(&self, name: &str) -> Result<Option<String>, Self::Error>;
}

/// Build a ledger over `store`, reading its config from `source`.
///
/// A missing config falls back to [`LedgerConfig::default`].
///
/// # Errors
///
/// Returns an error if the config cannot be read, parsed or validated.
pub fn open_ledger<S, C>(store: S, source: &C) -> anyhow::Result<TurnLedger<S>>
where
    S: CampaignStore,
    C: ConfigSource,
{
    let config = match source
        .load_raw(LEDGER_CONFIG_NAME)
        .context("reading ledger config")?
    {
        Some(json) => LedgerConfig::from_json(&json).context("invalid ledger config")?,
        None => LedgerConfig::default(),
    };
    Ok(TurnLedger::new(store, config))
}

/// The event catalogue from `source`, or the built-in one when absent.
///
/// # Errors
///
/// Returns an error if an override exists but cannot be read or parsed.
pub fn load_event_catalog<C: ConfigSource>(source: &C) -> anyhow::Result<RandomEventCatalog> {
    match source
        .load_raw(EVENT_CATALOG_NAME)
        .context("reading event catalogue")?
    {
        Some(json) => RandomEventCatalog::from_json(&json).context("invalid event catalogue"),
        None => Ok(events::catalog().clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::convert::Infallible;

    #[derive(Default)]
    struct FixtureSource {
        files: HashMap<String, String>,
    }

    impl FixtureSource {
        fn with(name: &str, json: &str) -> Self {
            let mut files = HashMap::new();
            files.insert(name.to_string(), json.to_string());
            Self { files }
        }
    }

    impl ConfigSource for FixtureSource {
        type Error = Infallible;

        fn load_raw(&self, name: &str) -> Result<Option<String>, Self::Error> {
            Ok(self.files.get(name).cloned())
        }
    }

    #[test]
    fn missing_config_uses_defaults() {
        let ledger = open_ledger(MemoryStore::new(), &FixtureSource::default()).unwrap();
        assert_eq!(ledger.config(), &LedgerConfig::default());
        let catalog = load_event_catalog(&FixtureSource::default()).unwrap();
        assert!(!catalog.events.is_empty());
    }

    #[test]
    fn config_overrides_are_validated() {
        let source = FixtureSource::with(LEDGER_CONFIG_NAME, r#"{"agent_moves_per_turn": 3, "levy_rounding": "round"}"#);
        let ledger = open_ledger(MemoryStore::new(), &source).unwrap();
        assert_eq!(ledger.config().agent_moves_per_turn, 3);
        assert_eq!(ledger.config().levy_rounding, LevyRounding::Round);
        assert_eq!(ledger.config().faction_slots, 5);

        let bad = FixtureSource::with(LEDGER_CONFIG_NAME, r#"{"faction_slots": 0}"#);
        let err = open_ledger(MemoryStore::new(), &bad).err().unwrap();
        assert!(format!("{err:#}").contains("faction_slots must be between 1 and 16"));
    }

    #[test]
    fn event_catalog_override() {
        let source = FixtureSource::with(
            EVENT_CATALOG_NAME,
            r#"{"chance_per_turn": 1.0, "events": [{"id": "comet", "title": "Comet"}]}"#,
        );
        let catalog = load_event_catalog(&source).unwrap();
        assert_eq!(catalog.events.len(), 1);
        assert_eq!(catalog.events[0].weight, 1);
        assert!(load_event_catalog(&FixtureSource::with(EVENT_CATALOG_NAME, "[")).is_err());
    }
}
