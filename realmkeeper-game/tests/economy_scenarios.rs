use realmkeeper_game::{
    Agent, AgentId, AgentType, Army, ArmyId, Building, FactionId, LevyRounding, Navy, PatronDeity,
    Region, RegionId, SettlementTier, Terrain, calculate_economy, calculate_upkeep,
    can_add_building, can_change_settlement,
};

fn owned(code: &str, terrain: Terrain, upgrades: &[Building]) -> Region {
    Region::new(RegionId::new(format!("region-{code}")), code, terrain)
        .owned_by(FactionId(1))
        .with_upgrades(upgrades.iter().copied())
}

#[test]
fn pynthar_town_yields_six_gold() {
    let ledger = calculate_economy(
        &[owned("A1", Terrain::Plains, &[Building::Town])],
        Some(PatronDeity::Pynthar),
    );
    assert_eq!(ledger.gold_per_turn, 6);
    assert_eq!(ledger.income.settlements, 4);
    assert_eq!(ledger.income.deity, 2);
}

#[test]
fn plains_allow_a_single_mine() {
    let check = can_add_building(Terrain::Plains, Building::Mine, &[Building::Mine]);
    assert!(!check.allowed);
    assert!(!check.reason.is_empty());
    assert!(can_add_building(Terrain::Plains, Building::Mine, &[Building::Farm]).allowed);
}

#[test]
fn terrain_tiers_gate_settlements() {
    assert!(!can_change_settlement(Terrain::Mountains, Some(SettlementTier::Village), Some(SettlementTier::Town)).allowed);
    assert!(can_change_settlement(Terrain::Hills, Some(SettlementTier::Village), Some(SettlementTier::Town)).allowed);
    assert!(!can_change_settlement(Terrain::Hills, Some(SettlementTier::Town), Some(SettlementTier::City)).allowed);
    assert!(can_change_settlement(Terrain::Coast, Some(SettlementTier::City), Some(SettlementTier::Village)).allowed);
    assert!(can_change_settlement(Terrain::Forest, Some(SettlementTier::Town), None).allowed);
    assert!(!can_change_settlement(Terrain::Plains, Some(SettlementTier::Town), Some(SettlementTier::Town)).allowed);
}

#[test]
fn river_holdings_cannot_fortify() {
    let mut region = owned("R1", Terrain::River, &[Building::City]);
    assert!(!region.try_build(Building::Keep).allowed);
    assert!(region.try_build(Building::Farm).allowed);
    assert_eq!(region.upgrade_count(Building::Farm), 1);
}

#[test]
fn settlement_upgrade_replaces_previous_tier() {
    let mut region = owned("P1", Terrain::Plains, &[Building::Village]);
    region.disable_upgrade(Building::Village).unwrap();
    assert!(region.try_build(Building::Town).allowed);
    assert_eq!(region.upgrade_count(Building::Village), 0);
    assert_eq!(region.disabled_count(Building::Village), 0);
    assert_eq!(region.active_count(Building::Town), 1);
    assert!(region.is_consistent());

    assert!(region.try_build(Building::Keep).allowed);
    assert!(region.try_build(Building::Castle).allowed);
    assert_eq!(region.upgrade_count(Building::Keep), 0);
    assert!(!region.try_build(Building::Keep).allowed);
}

#[test]
fn realm_economy_matches_hand_count() {
    let mut sieged = owned("S1", Terrain::Plains, &[Building::City]);
    sieged.under_siege = true;
    let regions = [
        owned("M1", Terrain::Mountains, &[Building::Mine, Building::Mine, Building::Village]),
        owned("H1", Terrain::Hills, &[Building::Mine, Building::Keep, Building::Town]),
        sieged,
    ];
    let ledger = calculate_economy(&regions, Some(PatronDeity::Durgrim));
    // M1: mines 2x3 + village 2 + mine bonus 2 + mountain 2 = 12.
    // H1: mine 3 + keep 1 + town 4 + mine bonus 1 + hills 1 = 10.
    assert_eq!(ledger.gold_per_turn, 22);
    assert_eq!(ledger.income.mines, 9);
    assert_eq!(ledger.income.fortifications, 1);
    assert_eq!(ledger.income.settlements, 6);
    assert_eq!(ledger.income.deity, 6);
    assert_eq!(ledger.manpower_produced, 1 + 2);
    assert_eq!(ledger.manpower_upkeep, 2 + 1 + 1);
    assert_eq!(ledger.hsg_capacity, 5 + 5);
    assert_eq!(ledger.besieged_regions, 1);
}

#[test]
fn upkeep_for_a_mixed_force() {
    let mut host = Army::new(ArmyId::new("a1"), Some(FactionId(1)), "Host");
    host.units.huscarls = 3;
    host.units.dismounted_knights = 1;
    host.units.merc_cavalry = 2;
    host.levy_infantry = 6;
    host.levy_archers = 3;
    let agents = [
        Agent::new(AgentId::new("g1"), FactionId(1), "Spy", AgentType::Spy, 2),
        Agent::new(AgentId::new("g2"), FactionId(1), "Agitator", AgentType::Agitator, 2),
        Agent::new(AgentId::new("g3"), FactionId(1), "Enforcer", AgentType::Enforcer, 2),
    ];

    let floor = calculate_upkeep(&[host.clone()], Navy { warships: 2 }, &agents, None, LevyRounding::Floor);
    assert_eq!(floor.hsg, 3 * 2 + 3 + 2 * 4);
    assert_eq!(floor.levy_units, 9);
    assert_eq!(floor.levy, 2);
    assert_eq!(floor.navy, 4);
    assert_eq!(floor.agents, 2 + 3 + 2);
    assert_eq!(floor.total, 17 + 2 + 4 + 7);

    let round = calculate_upkeep(&[host], Navy { warships: 2 }, &agents, Some(PatronDeity::Veyra), LevyRounding::Round);
    assert_eq!(round.levy, 2);
    assert_eq!(round.agents, 2 + 1 + 2);
}
