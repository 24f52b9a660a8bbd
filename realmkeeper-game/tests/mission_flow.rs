use realmkeeper_game::mission::{FixedRolls, MissionKey};
use realmkeeper_game::{
    Agent, AgentFate, AgentId, AgentType, Army, ArmyId, Building, CampaignStore, CharacterId,
    DifficultyContext, Faction, FactionId, LedgerConfig, MemoryStore, MissionDice, MissionId,
    MissionOutcome, MissionStatus, MissionTarget, MissionType, Navy, Region, RegionId, Rejection,
    SessionContext, Terrain, TurnLedger, calculate_mission_difficulty, calculate_upkeep,
    determine_mission_outcome,
};

fn border_campaign() -> TurnLedger<MemoryStore> {
    let store = MemoryStore::new();
    store.insert_faction(Faction::new(FactionId(1), "Vale").with_gold(40));
    store.insert_faction(Faction::new(FactionId(2), "Korr").with_gold(40));
    store.insert_region(
        Region::new(RegionId::new("region-B1"), "B1", Terrain::Plains)
            .owned_by(FactionId(2))
            .with_upgrades([Building::Town, Building::Keep]),
    );
    let mut garrison = Army::new(ArmyId::new("korr-host"), Some(FactionId(2)), "Korr Host").at("B1");
    garrison.units.huscarls = 10;
    garrison.levy_infantry = 15;
    store.insert_army(garrison);
    store.insert_agent(Agent::new(AgentId::new("mirel"), FactionId(1), "Mirel", AgentType::Spy, 3).at("B1"));
    store.insert_agent(Agent::new(AgentId::new("dask"), FactionId(1), "Dask", AgentType::Enforcer, 2).at("B1"));
    store.insert_agent(Agent::new(AgentId::new("kest"), FactionId(2), "Kest", AgentType::Enforcer, 4).at("B1"));
    TurnLedger::new(store, LedgerConfig::default())
}

fn commander() -> MissionTarget {
    MissionTarget::Commander {
        character_id: CharacterId::new("lord-hadran"),
        name: "Hadran".into(),
        prowess: 4,
    }
}

#[test]
fn kill_agent_breakdown() {
    let ctx = DifficultyContext {
        target_agent_level: 3,
        target_revealed: true,
        ..DifficultyContext::default()
    };
    let report = calculate_mission_difficulty(MissionType::KillAgent, &ctx);
    assert_eq!(report.difficulty, 50);
    let values: Vec<i32> = report.breakdown.iter().map(|l| l.value).collect();
    assert_eq!(values, vec![50, 15, -15]);
}

#[test]
fn enforcer_success_is_never_exposed() {
    let resolved = determine_mission_outcome(80, 10, 70, AgentType::Enforcer);
    assert_eq!(resolved.margin, 20);
    assert_eq!(resolved.outcome, MissionOutcome::Success);
    assert_eq!(resolved.fate, AgentFate::Safe);
    assert!(resolved.success);
    assert!(!resolved.critical);
}

#[test]
fn spy_deep_failure_is_fatal() {
    let resolved = determine_mission_outcome(40, 5, 80, AgentType::Spy);
    assert_eq!(resolved.margin, -35);
    assert_eq!(resolved.outcome, MissionOutcome::Death);
    assert_eq!(resolved.fate, AgentFate::Dead);
    assert!(!resolved.success);
}

#[test]
fn failed_assassination_kills_the_enforcer() {
    let ledger = border_campaign();
    let vale = SessionContext::faction(FactionId(1));
    let gm = SessionContext::game_master();
    let id = MissionId::new("m-hadran");

    let mission = ledger
        .submit_mission(
            &vale,
            id.clone(),
            &AgentId::new("dask"),
            MissionType::AssassinateCommander.into(),
            "B1",
            Some(commander()),
        )
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(mission.status, MissionStatus::Pending);
    assert_eq!(mission.final_difficulty, None);

    let approved = ledger.approve_mission(&gm, &id).unwrap().accepted().unwrap();
    // Base 55, garrison 25 -> +5, prowess 4 -> +12, one friendly spy -5.
    assert_eq!(approved.final_difficulty, Some(67));
    let labels: Vec<&str> = approved
        .difficulty_breakdown
        .iter()
        .map(|l| l.label.as_str())
        .collect();
    assert_eq!(
        labels,
        vec!["Base difficulty", "Garrison (25)", "Target prowess (4)", "Friendly agents (1)"]
    );

    // Roll 20 + bonus 10 - 67 = margin -37.
    let result = ledger
        .resolve_mission(&gm, &id, &mut FixedRolls::new([20]))
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(result.final_score, 30);
    assert_eq!(result.margin, -37);
    assert_eq!(result.outcome, MissionOutcome::Death);
    assert_eq!(result.fate, AgentFate::Dead);

    let store = ledger.store();
    let dask = store.agent(&AgentId::new("dask")).unwrap().unwrap();
    assert!(dask.deleted);
    let stored = store.mission(&id).unwrap().unwrap();
    assert_eq!(stored.status, MissionStatus::Completed);
    assert!(stored.effects.is_empty());

    // The dead agent is gone from upkeep and cannot be sent again.
    let agents = store.agents_owned_by(FactionId(1)).unwrap();
    let upkeep = calculate_upkeep(&[], Navy::default(), &agents, None, LedgerConfig::default().levy_rounding);
    assert_eq!(upkeep.agents, 2);
    let again = ledger
        .submit_mission(
            &vale,
            MissionId::new("m-again"),
            &AgentId::new("dask"),
            MissionType::KillAgent.into(),
            "B1",
            None,
        )
        .unwrap();
    assert!(matches!(again.rejection(), Some(Rejection::NotFound { kind: "agent", .. })));
}

#[test]
fn critical_scouting_reveals_armies() {
    let ledger = border_campaign();
    let vale = SessionContext::faction(FactionId(1));
    let gm = SessionContext::game_master();
    let id = MissionId::new("m-scout");
    ledger
        .submit_mission(&vale, id.clone(), &AgentId::new("mirel"), MissionType::ScoutRegion.into(), "B1", None)
        .unwrap();
    let approved = ledger.approve_mission(&gm, &id).unwrap().accepted().unwrap();
    // Base 20, keep +10, enemy enforcer +10, friendly enforcer -5.
    assert_eq!(approved.final_difficulty, Some(35));

    // Roll 60 + bonus 15 - 35 = margin 40.
    let result = ledger
        .resolve_mission(&gm, &id, &mut FixedRolls::new([60]))
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(result.outcome, MissionOutcome::CriticalSuccess);
    assert!(result.critical);
    let stored = ledger.store().mission(&id).unwrap().unwrap();
    assert_eq!(
        stored.effects,
        vec!["Reveal all buildings in B1".to_string(), "Reveal all armies in B1".to_string()]
    );
    let mirel = ledger.store().agent(&AgentId::new("mirel")).unwrap().unwrap();
    assert!(!mirel.revealed);
}

#[test]
fn difficulty_is_frozen_at_approval() {
    let ledger = border_campaign();
    let vale = SessionContext::faction(FactionId(1));
    let gm = SessionContext::game_master();
    let id = MissionId::new("m-sabotage");
    let agitator = Agent::new(AgentId::new("oda"), FactionId(1), "Oda", AgentType::Agitator, 1).at("A1");
    ledger.store().insert_agent(agitator);
    ledger
        .submit_mission(&vale, id.clone(), &AgentId::new("oda"), MissionType::SabotageBuilding.into(), "B1", None)
        .unwrap();
    let approved = ledger.approve_mission(&gm, &id).unwrap().accepted().unwrap();
    let frozen = approved.final_difficulty;

    let mut fortified = ledger.store().region(&RegionId::new("region-B1")).unwrap().unwrap();
    assert!(fortified.try_build(Building::Castle).allowed);
    ledger.store().insert_region(fortified);

    let again = ledger.approve_mission(&gm, &id).unwrap();
    assert!(matches!(again.rejection(), Some(Rejection::Mission { .. })));
    let stored = ledger.store().mission(&id).unwrap().unwrap();
    assert_eq!(stored.final_difficulty, frozen);
}

#[test]
fn wrong_agent_type_is_refused() {
    let ledger = border_campaign();
    let vale = SessionContext::faction(FactionId(1));
    let refused = ledger
        .submit_mission(
            &vale,
            MissionId::new("m-bad"),
            &AgentId::new("mirel"),
            MissionType::AssassinateLeader.into(),
            "B1",
            None,
        )
        .unwrap();
    assert!(matches!(refused.rejection(), Some(Rejection::Mission { .. })));
    assert!(ledger.store().mission(&MissionId::new("m-bad")).unwrap().is_none());
}

#[test]
fn unknown_mission_key_stays_pending_until_rejected() {
    let ledger = border_campaign();
    let vale = SessionContext::faction(FactionId(1));
    let gm = SessionContext::game_master();
    let id = MissionId::new("m-odd");
    ledger
        .submit_mission(&vale, id.clone(), &AgentId::new("mirel"), MissionKey::parse("POISON_WELL"), "B1", None)
        .unwrap()
        .accepted()
        .unwrap();
    let approval = ledger.approve_mission(&gm, &id).unwrap();
    assert!(matches!(approval.rejection(), Some(Rejection::Mission { .. })));
    let stored = ledger.store().mission(&id).unwrap().unwrap();
    assert_eq!(stored.status, MissionStatus::Pending);
    assert_eq!(stored.final_difficulty, None);

    let resolve = ledger.resolve_mission(&gm, &id, &mut FixedRolls::new([100])).unwrap();
    assert!(matches!(resolve.rejection(), Some(Rejection::Mission { .. })));
    assert!(ledger.store().mission(&id).unwrap().unwrap().result.is_none());

    let rejected = ledger
        .reject_mission(&gm, &id, "no such orders")
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(rejected.status, MissionStatus::Rejected);
}

#[test]
fn rejected_missions_cannot_resolve() {
    let ledger = border_campaign();
    let vale = SessionContext::faction(FactionId(1));
    let gm = SessionContext::game_master();
    let id = MissionId::new("m-no");
    ledger
        .submit_mission(&vale, id.clone(), &AgentId::new("mirel"), MissionType::ScoutArmy.into(), "B1", None)
        .unwrap();
    let rejected = ledger
        .reject_mission(&gm, &id, "no army there")
        .unwrap()
        .accepted()
        .unwrap();
    assert_eq!(rejected.status, MissionStatus::Rejected);
    assert_eq!(rejected.rejection_reason.as_deref(), Some("no army there"));
    let resolve = ledger.resolve_mission(&gm, &id, &mut FixedRolls::new([50])).unwrap();
    assert!(matches!(resolve.rejection(), Some(Rejection::Mission { .. })));
}

#[test]
fn seeded_resolution_replays() {
    let run = || {
        let ledger = border_campaign();
        let vale = SessionContext::faction(FactionId(1));
        let gm = SessionContext::game_master();
        let id = MissionId::new("m-replay");
        ledger
            .submit_mission(&vale, id.clone(), &AgentId::new("mirel"), MissionType::InfiltrateCourt.into(), "B1", None)
            .unwrap();
        ledger.approve_mission(&gm, &id).unwrap();
        let mut dice = MissionDice::for_mission(0x5eed, &id);
        let result = ledger.resolve_mission(&gm, &id, &mut dice).unwrap().accepted().unwrap();
        assert_eq!(dice.draws(), 1);
        (result, ledger.store().agent(&AgentId::new("mirel")).unwrap())
    };
    assert_eq!(run(), run());
}
