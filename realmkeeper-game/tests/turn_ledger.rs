use std::cell::RefCell;

use realmkeeper_game::ledger::{MemoryStoreError, TurnWarning};
use realmkeeper_game::{
    Agent, AgentId, AgentType, Army, ArmyId, Building, CampaignStore, CharacterId, CharacterStats,
    CommitOutcome, Court, CourtPosition, Faction, FactionId, GoldTransfer, LedgerConfig,
    LedgerError, MemoryStore, Mission, MissionId, PatronDeity, Precondition, Region, RegionId,
    Rejection, SessionContext, Terrain, TransferId, TurnLedger, WriteBatch,
};

fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store.set_turn(4);
    store.insert_faction(
        Faction::new(FactionId(1), "Vale")
            .with_gold(10)
            .with_patron(PatronDeity::Pynthar),
    );
    store.insert_faction(Faction::new(FactionId(2), "Korr").with_gold(3).with_warships(2));
    store.insert_region(
        Region::new(RegionId::new("region-A1"), "A1", Terrain::Plains)
            .owned_by(FactionId(1))
            .with_upgrades([Building::Town]),
    );
    store.insert_region(
        Region::new(RegionId::new("region-B1"), "B1", Terrain::Mountains)
            .owned_by(FactionId(2))
            .with_upgrades([Building::Mine]),
    );
    let mut host = Army::new(ArmyId::new("vale-host"), Some(FactionId(1)), "Vale Host").at("A1");
    host.units.huscarls = 2;
    store.insert_army(host);
    store.insert_agent(Agent::new(AgentId::new("oda"), FactionId(2), "Oda", AgentType::Agitator, 1).at("B1"));
    let mut court = Court::new();
    court.appoint(
        CourtPosition::Chancellor,
        CharacterId::new("lady-sera"),
        FactionId(1),
        CharacterStats::default(),
    );
    store.set_court(court);
    store
}

fn campaign() -> TurnLedger<MemoryStore> {
    TurnLedger::new(seeded_store(), LedgerConfig::default())
}

fn gold(ledger: &TurnLedger<impl CampaignStore>, faction: u8) -> i64 {
    ledger.store().faction(FactionId(faction)).ok().flatten().map_or(i64::MIN, |f| f.gold)
}

#[test]
fn advance_turn_settles_every_faction() {
    let ledger = campaign();
    let gm = SessionContext::game_master();
    let vale = SessionContext::faction(FactionId(1));
    assert!(
        ledger
            .record_build(&vale, FactionId(1), &RegionId::new("region-A1"), Building::Farm)
            .unwrap()
            .is_accepted()
    );

    let report = ledger.advance_turn(&gm).unwrap().accepted().unwrap();
    assert_eq!(report.turn, 4);
    assert_eq!(report.next_turn, 5);
    assert_eq!(report.skipped_slots, vec![FactionId(3), FactionId(4), FactionId(5)]);
    assert_eq!(report.factions.len(), 2);

    // Town 4 + Pynthar 2 + Chancellor 5 - two huscarls 4.
    let vale_report = &report.factions[0];
    assert_eq!(vale_report.court_gold, 5);
    assert_eq!(vale_report.net_gold, 7);
    assert_eq!(vale_report.new_balance, 17);
    assert!(vale_report.warnings.is_empty());

    // Mine 3 - agitator 3 - two warships 4.
    let korr_report = &report.factions[1];
    assert_eq!(korr_report.net_gold, -4);
    assert_eq!(korr_report.new_balance, -1);
    assert_eq!(
        korr_report.warnings,
        vec![
            TurnWarning::NegativeBalance { balance: -1 },
            TurnWarning::ManpowerDeficit { net_manpower: -1 },
        ]
    );

    assert_eq!(gold(&ledger, 1), 17);
    assert_eq!(gold(&ledger, 2), -1);
    assert_eq!(ledger.store().current_turn().unwrap(), 5);
    let vale_record = ledger.store().faction(FactionId(1)).unwrap().unwrap();
    assert!(vale_record.turn_state.is_empty());
}

#[test]
fn failed_commit_changes_nothing() {
    let ledger = campaign();
    ledger.store().fail_next_commit();
    let err = ledger.advance_turn(&SessionContext::game_master()).unwrap_err();
    assert!(matches!(err, LedgerError::Store(MemoryStoreError::InjectedCommitFailure)));
    assert_eq!(gold(&ledger, 1), 10);
    assert_eq!(gold(&ledger, 2), 3);
    assert_eq!(ledger.store().current_turn().unwrap(), 4);
    assert_eq!(ledger.store().commits(), 0);
}

#[test]
fn read_failures_surface_as_store_errors() {
    let ledger = campaign();
    ledger.store().fail_reads(true);
    let err = ledger
        .spend_gold(&SessionContext::faction(FactionId(1)), FactionId(1), 1)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Store(MemoryStoreError::InjectedReadFailure)));
}

#[test]
fn only_the_game_master_advances() {
    let ledger = campaign();
    let result = ledger.advance_turn(&SessionContext::faction(FactionId(1))).unwrap();
    assert_eq!(result.rejection(), Some(&Rejection::NotAuthorized));
    assert_eq!(ledger.store().current_turn().unwrap(), 4);
}

#[test]
fn overdraft_spends_nothing() {
    let ledger = campaign();
    let vale = SessionContext::faction(FactionId(1));
    let refused = ledger.spend_gold(&vale, FactionId(1), 11).unwrap();
    assert_eq!(
        refused.rejection(),
        Some(&Rejection::InsufficientGold {
            available: 10,
            requested: 11
        })
    );
    assert_eq!(gold(&ledger, 1), 10);
    assert_eq!(ledger.spend_gold(&vale, FactionId(1), 10).unwrap().accepted(), Some(0));
    let negative = ledger.spend_gold(&vale, FactionId(1), -5).unwrap();
    assert_eq!(negative.rejection(), Some(&Rejection::InvalidAmount { amount: -5 }));
}

#[test]
fn grants_are_game_master_only() {
    let ledger = campaign();
    let denied = ledger
        .add_gold(&SessionContext::faction(FactionId(1)), FactionId(1), 50)
        .unwrap();
    assert_eq!(denied.rejection(), Some(&Rejection::NotAuthorized));
    let granted = ledger
        .add_gold(&SessionContext::game_master(), FactionId(2), 50)
        .unwrap();
    assert_eq!(granted.accepted(), Some(53));
    let missing = ledger
        .add_gold(&SessionContext::game_master(), FactionId(9), 1)
        .unwrap();
    assert_eq!(
        missing.rejection(),
        Some(&Rejection::UnknownFaction {
            faction: FactionId(9)
        })
    );
}

#[test]
fn transfer_debits_now_and_credits_once() {
    let ledger = campaign();
    let vale = SessionContext::faction(FactionId(1));
    let korr = SessionContext::faction(FactionId(2));
    let id = TransferId::new("t-1");

    let transfer = ledger
        .initiate_transfer(&vale, id.clone(), FactionId(1), FactionId(2), 6)
        .unwrap()
        .accepted()
        .unwrap();
    assert!(transfer.is_pending());
    assert_eq!(transfer.turn, 4);
    assert_eq!(gold(&ledger, 1), 4);
    assert_eq!(gold(&ledger, 2), 3);

    let stranger = ledger.claim_transfer(&vale, &id).unwrap();
    assert_eq!(stranger.rejection(), Some(&Rejection::NotAuthorized));

    assert_eq!(ledger.claim_transfer(&korr, &id).unwrap().accepted(), Some(9));
    let again = ledger.claim_transfer(&korr, &id).unwrap();
    assert_eq!(
        again.rejection(),
        Some(&Rejection::AlreadyClaimed {
            transfer: id.clone()
        })
    );
    assert_eq!(gold(&ledger, 2), 9);
    assert!(ledger.store().transfer(&id).unwrap().unwrap().claimed);
}

#[test]
fn transfer_validation() {
    let ledger = campaign();
    let vale = SessionContext::faction(FactionId(1));
    let send = |id: &str, to: u8, amount: i64| {
        ledger
            .initiate_transfer(&vale, TransferId::new(id), FactionId(1), FactionId(to), amount)
            .unwrap()
    };
    assert_eq!(send("t-a", 1, 5).rejection(), Some(&Rejection::SelfTransfer));
    assert_eq!(send("t-b", 2, 0).rejection(), Some(&Rejection::InvalidAmount { amount: 0 }));
    assert_eq!(
        send("t-c", 7, 5).rejection(),
        Some(&Rejection::UnknownFaction {
            faction: FactionId(7)
        })
    );
    assert!(matches!(
        send("t-d", 2, 99).rejection(),
        Some(Rejection::InsufficientGold { .. })
    ));
    assert!(send("t-e", 2, 1).is_accepted());
    assert!(matches!(send("t-e", 2, 1).rejection(), Some(Rejection::RuleViolation { .. })));
    assert_eq!(gold(&ledger, 1), 9);

    let unknown = ledger
        .claim_transfer(&SessionContext::faction(FactionId(2)), &TransferId::new("t-zz"))
        .unwrap();
    assert!(matches!(unknown.rejection(), Some(Rejection::UnknownTransfer { .. })));
}

/// Lets another writer slip in between a ledger's reads and its commit.
struct RacingStore {
    inner: MemoryStore,
    interloper: RefCell<Option<Box<dyn FnOnce(&MemoryStore)>>>,
}

impl RacingStore {
    fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            interloper: RefCell::new(None),
        }
    }

    fn race_next_commit(&self, write: impl FnOnce(&MemoryStore) + 'static) {
        *self.interloper.borrow_mut() = Some(Box::new(write));
    }
}

impl CampaignStore for RacingStore {
    type Error = MemoryStoreError;

    fn current_turn(&self) -> Result<u32, Self::Error> {
        self.inner.current_turn()
    }

    fn faction(&self, id: FactionId) -> Result<Option<Faction>, Self::Error> {
        self.inner.faction(id)
    }

    fn regions_owned_by(&self, faction: FactionId) -> Result<Vec<Region>, Self::Error> {
        self.inner.regions_owned_by(faction)
    }

    fn region(&self, id: &RegionId) -> Result<Option<Region>, Self::Error> {
        self.inner.region(id)
    }

    fn region_by_code(&self, code: &str) -> Result<Option<Region>, Self::Error> {
        self.inner.region_by_code(code)
    }

    fn armies_owned_by(&self, faction: FactionId) -> Result<Vec<Army>, Self::Error> {
        self.inner.armies_owned_by(faction)
    }

    fn armies_at(&self, code: &str) -> Result<Vec<Army>, Self::Error> {
        self.inner.armies_at(code)
    }

    fn army(&self, id: &ArmyId) -> Result<Option<Army>, Self::Error> {
        self.inner.army(id)
    }

    fn agents_owned_by(&self, faction: FactionId) -> Result<Vec<Agent>, Self::Error> {
        self.inner.agents_owned_by(faction)
    }

    fn agents_at(&self, code: &str) -> Result<Vec<Agent>, Self::Error> {
        self.inner.agents_at(code)
    }

    fn agent(&self, id: &AgentId) -> Result<Option<Agent>, Self::Error> {
        self.inner.agent(id)
    }

    fn court(&self) -> Result<Court, Self::Error> {
        self.inner.court()
    }

    fn transfer(&self, id: &TransferId) -> Result<Option<GoldTransfer>, Self::Error> {
        self.inner.transfer(id)
    }

    fn mission(&self, id: &MissionId) -> Result<Option<Mission>, Self::Error> {
        self.inner.mission(id)
    }

    fn commit(&self, batch: WriteBatch) -> Result<CommitOutcome, Self::Error> {
        if let Some(write) = self.interloper.borrow_mut().take() {
            write(&self.inner);
        }
        self.inner.commit(batch)
    }
}

#[test]
fn stale_turn_is_a_conflict() {
    let ledger = TurnLedger::new(RacingStore::new(seeded_store()), LedgerConfig::default());
    ledger.store().race_next_commit(|store| store.set_turn(5));
    let err = ledger.advance_turn(&SessionContext::game_master()).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Conflict(Precondition::TurnEquals { turn: 4 })
    ));
    assert_eq!(gold(&ledger, 1), 10);
    assert_eq!(gold(&ledger, 2), 3);
    assert_eq!(ledger.store().current_turn().unwrap(), 5);
}

#[test]
fn racing_claims_credit_once() {
    let store = seeded_store();
    store.insert_transfer(GoldTransfer {
        id: TransferId::new("t-race"),
        from: FactionId(1),
        to: FactionId(2),
        amount: 8,
        claimed: false,
        turn: 4,
        note: None,
    });
    let ledger = TurnLedger::new(RacingStore::new(store), LedgerConfig::default());
    let korr = SessionContext::faction(FactionId(2));
    let id = TransferId::new("t-race");

    // The other claim lands between our read and our commit.
    ledger.store().race_next_commit(|store| {
        let mut claimed = store.transfer(&TransferId::new("t-race")).unwrap().unwrap();
        claimed.claimed = true;
        store.insert_transfer(claimed);
        if let Ok(Some(mut korr)) = store.faction(FactionId(2)) {
            korr.gold += 8;
            store.insert_faction(korr);
        }
    });
    let err = ledger.claim_transfer(&korr, &id).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Conflict(Precondition::TransferUnclaimed { .. })
    ));
    assert_eq!(gold(&ledger, 2), 11);

    let later = ledger.claim_transfer(&korr, &id).unwrap();
    assert!(matches!(later.rejection(), Some(Rejection::AlreadyClaimed { .. })));
    assert_eq!(gold(&ledger, 2), 11);
}

#[test]
fn racing_spend_is_not_undone_by_a_build_order() {
    let ledger = TurnLedger::new(RacingStore::new(seeded_store()), LedgerConfig::default());
    let vale = SessionContext::faction(FactionId(1));
    let a1 = RegionId::new("region-A1");

    ledger.store().race_next_commit(|store| {
        if let Ok(Some(mut record)) = store.faction(FactionId(1)) {
            record.gold -= 7;
            store.insert_faction(record);
        }
    });
    let err = ledger
        .record_build(&vale, FactionId(1), &a1, Building::Farm)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Conflict(Precondition::FactionGold { expected: 10, .. })
    ));
    assert_eq!(gold(&ledger, 1), 3);
    assert_eq!(ledger.store().region(&a1).unwrap().unwrap().upgrade_count(Building::Farm), 0);

    let retried = ledger
        .record_build(&vale, FactionId(1), &a1, Building::Farm)
        .unwrap();
    assert!(retried.is_accepted());
    assert_eq!(gold(&ledger, 1), 3);
}

#[test]
fn racing_order_is_not_erased_by_a_spend() {
    let ledger = TurnLedger::new(RacingStore::new(seeded_store()), LedgerConfig::default());
    let vale = SessionContext::faction(FactionId(1));

    ledger.store().race_next_commit(|store| {
        if let Ok(Some(mut record)) = store.faction(FactionId(1)) {
            record.turn_state.try_record_build(&RegionId::new("region-A1"), 1);
            store.insert_faction(record);
        }
    });
    let err = ledger.spend_gold(&vale, FactionId(1), 4).unwrap_err();
    assert!(matches!(
        err,
        LedgerError::Conflict(Precondition::FactionTurnState { .. })
    ));
    let record = ledger.store().faction(FactionId(1)).unwrap().unwrap();
    assert_eq!(record.gold, 10);
    assert_eq!(record.turn_state.builds_in(&RegionId::new("region-A1")), 1);

    assert_eq!(ledger.spend_gold(&vale, FactionId(1), 4).unwrap().accepted(), Some(6));
    let record = ledger.store().faction(FactionId(1)).unwrap().unwrap();
    assert_eq!(record.turn_state.builds_in(&RegionId::new("region-A1")), 1);
}

#[test]
fn treasury_overflow_is_refused() {
    let ledger = campaign();
    let gm = SessionContext::game_master();
    let refused = ledger.add_gold(&gm, FactionId(1), i64::MAX).unwrap();
    assert!(matches!(
        refused.rejection(),
        Some(Rejection::TreasuryOverflow { balance: 10, .. })
    ));
    assert_eq!(gold(&ledger, 1), 10);

    ledger.store().insert_transfer(GoldTransfer {
        id: TransferId::new("t-huge"),
        from: FactionId(1),
        to: FactionId(2),
        amount: i64::MAX,
        claimed: false,
        turn: 4,
        note: None,
    });
    let korr = SessionContext::faction(FactionId(2));
    let claim = ledger.claim_transfer(&korr, &TransferId::new("t-huge")).unwrap();
    assert!(matches!(claim.rejection(), Some(Rejection::TreasuryOverflow { .. })));
    assert_eq!(gold(&ledger, 2), 3);
    assert!(!ledger.store().transfer(&TransferId::new("t-huge")).unwrap().unwrap().claimed);
}
