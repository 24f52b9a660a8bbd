#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use realmkeeper_game::{
    AgentFate, AgentType, Building, DifficultyContext, FactionId, MissionType, Region, RegionId,
    Terrain, calculate_mission_difficulty, can_add_building, determine_mission_outcome,
};

#[derive(Debug, Clone, Copy)]
enum UpgradeOp {
    Add(Building),
    Remove(Building),
    Disable(Building),
    Enable(Building),
}

fn building() -> impl Strategy<Value = Building> {
    prop::sample::select(Building::ALL.to_vec())
}

fn upgrade_op() -> impl Strategy<Value = UpgradeOp> {
    prop_oneof![
        building().prop_map(UpgradeOp::Add),
        building().prop_map(UpgradeOp::Remove),
        building().prop_map(UpgradeOp::Disable),
        building().prop_map(UpgradeOp::Enable),
    ]
}

fn mission_type() -> impl Strategy<Value = MissionType> {
    prop::sample::select(MissionType::ALL.to_vec())
}

fn agent_type() -> impl Strategy<Value = AgentType> {
    prop::sample::select(AgentType::ALL.to_vec())
}

prop_compose! {
    fn difficulty_context()(
        has_keep in any::<bool>(),
        has_castle in any::<bool>(),
        enemy_enforcers in prop_oneof![0u32..50, any::<u32>()],
        garrison_strength in prop_oneof![0u32..200, any::<u32>()],
        target_prowess in prop_oneof![0i32..20, any::<i32>()],
        target_intrigue in prop_oneof![0i32..20, any::<i32>()],
        target_agent_level in any::<u8>(),
        target_revealed in any::<bool>(),
        friendly_agents in prop_oneof![0u32..30, any::<u32>()],
    ) -> DifficultyContext {
        DifficultyContext {
            has_keep,
            has_castle,
            enemy_enforcers,
            garrison_strength,
            target_prowess,
            target_intrigue,
            target_agent_level,
            target_revealed,
            friendly_agents,
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn prop_upgrade_bookkeeping_stays_consistent(ops in prop::collection::vec(upgrade_op(), 0..40)) {
        let mut region = Region::new(RegionId::new("region-P1"), "P1", Terrain::Plains)
            .owned_by(FactionId(1));
        for op in ops {
            match op {
                UpgradeOp::Add(b) => region.add_upgrade(b),
                UpgradeOp::Remove(b) => { let _ = region.remove_upgrade(b); }
                UpgradeOp::Disable(b) => { let _ = region.disable_upgrade(b); }
                UpgradeOp::Enable(b) => { let _ = region.enable_upgrade(b); }
            }
            prop_assert!(region.is_consistent());
            for b in Building::ALL {
                prop_assert!(region.disabled_count(b) <= region.upgrade_count(b));
                prop_assert_eq!(
                    region.active_count(b),
                    region.upgrade_count(b) - region.disabled_count(b)
                );
            }
        }
    }

    #[test]
    fn prop_active_count_floors_at_zero(total in 0usize..6, disabled in 0usize..12) {
        let mut region = Region::new(RegionId::new("region-P2"), "P2", Terrain::Plains);
        region.upgrades = vec![Building::Farm; total];
        region.disabled_upgrades = vec![Building::Farm; disabled];
        let expected = u32::try_from(total.saturating_sub(disabled)).unwrap();
        prop_assert_eq!(region.active_count(Building::Farm), expected);
    }

    #[test]
    fn prop_try_build_respects_terrain(
        terrain in prop::sample::select(Terrain::ALL.to_vec()),
        builds in prop::collection::vec(building(), 0..20),
    ) {
        let mut region = Region::new(RegionId::new("region-T1"), "T1", terrain);
        for b in builds {
            let before = region.upgrades.clone();
            let expected = can_add_building(terrain, b, &before).allowed;
            let check = region.try_build(b);
            prop_assert_eq!(check.allowed, expected);
            if !check.allowed {
                prop_assert_eq!(&region.upgrades, &before);
            }
            let rules = terrain.rules();
            let farms = region.upgrades.iter().filter(|u| **u == Building::Farm).count();
            let mines = region.upgrades.iter().filter(|u| **u == Building::Mine).count();
            prop_assert!(farms <= rules.max_farms as usize);
            prop_assert!(mines <= rules.max_mines as usize);
            let tiers = region.upgrades.iter().filter(|u| u.settlement_tier().is_some()).count();
            prop_assert!(tiers <= 1);
        }
    }

    #[test]
    fn prop_difficulty_is_clamped(mission in mission_type(), ctx in difficulty_context()) {
        let report = calculate_mission_difficulty(mission, &ctx);
        prop_assert!((5..=95).contains(&report.difficulty));
        prop_assert_eq!(report.difficulty, report.unclamped.clamp(5, 95));
        prop_assert_eq!(report.breakdown[0].value, mission.spec().base_difficulty);
        let sum: i64 = report.breakdown.iter().map(|l| i64::from(l.value)).sum();
        if let Ok(exact) = i32::try_from(sum) {
            prop_assert_eq!(exact, report.unclamped);
        }
    }

    #[test]
    fn prop_outcome_is_pure(
        roll in 1u8..=100,
        bonus in 0i32..60,
        difficulty in 5i32..=95,
        kind in agent_type(),
    ) {
        let first = determine_mission_outcome(roll, bonus, difficulty, kind);
        let second = determine_mission_outcome(roll, bonus, difficulty, kind);
        prop_assert_eq!(first, second);
        prop_assert_eq!(first.margin, i32::from(roll) + bonus - difficulty);
        prop_assert_eq!(first.success, first.margin >= 0);
    }

    #[test]
    fn prop_enforcers_are_never_revealed(
        roll in 1u8..=100,
        bonus in 0i32..60,
        difficulty in 5i32..=95,
    ) {
        let resolved = determine_mission_outcome(roll, bonus, difficulty, AgentType::Enforcer);
        prop_assert_ne!(resolved.fate, AgentFate::Revealed);
    }
}
