use anyhow::{Result, anyhow, ensure};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use realmkeeper_game::ledger::TurnWarning;
use realmkeeper_game::{
    AgentFate, AgentType, Building, CampaignStore, EventContext, RandomEventCatalog, Rejection,
    SessionContext, TransferId, bonuses_for, calculate_economy, calculate_region_economy,
    import_regions, pick_random_event,
};
use sha2::{Digest, Sha256};

use super::campaign::Campaign;
use crate::config::ConfigDir;

const TURNS_PER_RUN: u32 = 4;
const TRANSFERS_PER_RUN: u64 = 6;
const OVERDRAFT_MARGIN: i64 = 10;

/// Inputs shared by every iteration of a scenario.
pub struct ScenarioCtx<'a> {
    pub seed: u64,
    pub config: &'a ConfigDir,
    pub events: &'a RandomEventCatalog,
}

pub type ScenarioCheck = fn(&ScenarioCtx<'_>) -> Result<()>;

#[derive(Clone, Copy)]
pub struct TestScenario {
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub check: ScenarioCheck,
}

pub const SCENARIOS: [TestScenario; 5] = [
    TestScenario {
        key: "economy",
        name: "Region Economy",
        description: "Imported regions obey terrain caps and income adds up per region",
        check: economy_expectation,
    },
    TestScenario {
        key: "missions",
        name: "Mission Resolution",
        description: "Difficulty clamps, margins and agent fates across seeded missions",
        check: missions_expectation,
    },
    TestScenario {
        key: "turns",
        name: "Turn Settlement",
        description: "Balances, warnings and per-turn state across several turn advances",
        check: turns_expectation,
    },
    TestScenario {
        key: "transfers",
        name: "Gold Transfers",
        description: "Transfers conserve gold, refuse overdrafts and credit exactly once",
        check: transfers_expectation,
    },
    TestScenario {
        key: "replay",
        name: "Seeded Replay",
        description: "Two runs of the same seed produce identical ledgers",
        check: replay_expectation,
    },
];

pub fn get_scenario(key: &str) -> Option<&'static TestScenario> {
    SCENARIOS.iter().find(|s| s.key == key)
}

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS.iter().map(|s| (s.key, s.description))
}

fn economy_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let campaign = Campaign::generate(ctx.seed, ctx.config)?;
    let store = campaign.ledger.store();

    let reimported = import_regions(&campaign.import_lines)?;
    ensure!(reimported == campaign.generated, "import lines do not reproduce the regions");

    for region in &campaign.generated {
        ensure!(region.is_consistent(), "{} bookkeeping is inconsistent", region.code);
        let rules = region.terrain.rules();
        ensure!(
            region.upgrade_count(Building::Farm) <= rules.max_farms
                && region.upgrade_count(Building::Mine) <= rules.max_mines,
            "{} exceeds {} caps",
            region.code,
            region.terrain
        );
        let tiers = region
            .upgrades
            .iter()
            .filter(|b| b.settlement_tier().is_some())
            .count();
        ensure!(tiers <= 1, "{} holds {tiers} settlement tiers", region.code);
    }

    for &id in &campaign.factions {
        let faction = campaign.faction(id)?;
        let regions = store.regions_owned_by(id)?;
        let ledger = calculate_economy(&regions, faction.patron_deity);
        ensure!(
            ledger.income.total() == ledger.gold_per_turn,
            "{id}: income breakdown {} != gold {}",
            ledger.income.total(),
            ledger.gold_per_turn
        );

        let bonuses = bonuses_for(faction.patron_deity);
        let mut gold = 0;
        for region in &regions {
            let row = calculate_region_economy(region, &bonuses);
            if region.under_siege {
                ensure!(row.gold == 0 && row.manpower == 0, "{} pays out under siege", region.code);
            }
            gold += row.gold;
        }
        ensure!(
            gold == ledger.gold_per_turn,
            "{id}: region rows sum to {gold}, ledger says {}",
            ledger.gold_per_turn
        );
        let besieged = regions.iter().filter(|r| r.under_siege).count();
        ensure!(
            usize::try_from(ledger.besieged_regions)? == besieged,
            "{id}: besieged count mismatch"
        );
    }
    Ok(())
}

fn missions_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let campaign = Campaign::generate(ctx.seed, ctx.config)?;
    for round in 0..2 {
        for run in campaign.run_missions(round)? {
            let id = &run.approved.id;
            let difficulty = run
                .approved
                .final_difficulty
                .ok_or_else(|| anyhow!("{id} approved without a difficulty"))?;
            ensure!((5..=95).contains(&difficulty), "{id}: difficulty {difficulty} escaped the clamp");
            ensure!(
                run.result.margin == run.result.final_score - difficulty,
                "{id}: margin {} does not match score {} - {difficulty}",
                run.result.margin,
                run.result.final_score
            );
            ensure!(
                run.result.outcome.is_success() == (run.result.margin >= 0),
                "{id}: outcome {:?} contradicts margin {}",
                run.result.outcome,
                run.result.margin
            );

            let stored = campaign
                .ledger
                .store()
                .mission(id)?
                .ok_or_else(|| anyhow!("{id} vanished after resolution"))?;
            ensure!(
                stored.final_difficulty == run.approved.final_difficulty,
                "{id}: difficulty moved after approval"
            );

            let agent = run
                .agent_after
                .as_ref()
                .ok_or_else(|| anyhow!("{id}: agent record missing"))?;
            match run.result.fate {
                AgentFate::Dead => ensure!(agent.deleted, "{id}: dead agent still active"),
                AgentFate::Revealed => {
                    ensure!(agent.kind != AgentType::Enforcer, "{id}: enforcer was revealed");
                    ensure!(agent.revealed, "{id}: revealed flag not written");
                }
                AgentFate::Safe => ensure!(!agent.deleted, "{id}: safe agent was deleted"),
            }
        }
    }
    Ok(())
}

fn turns_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let campaign = Campaign::generate(ctx.seed, ctx.config)?;
    let store = campaign.ledger.store();
    let mut rng = ChaCha20Rng::seed_from_u64(ctx.seed);

    for _ in 0..TURNS_PER_RUN {
        let turn = store.current_turn()?;
        for region in &campaign.generated {
            let event_ctx = EventContext {
                terrain: Some(region.terrain),
                under_siege: region.under_siege,
            };
            if let Some(pick) = pick_random_event(ctx.events, &event_ctx, &mut rng) {
                ensure!(
                    pick.event.weight_for(&event_ctx) > 0,
                    "event {} picked with zero weight",
                    pick.event.id
                );
            }
        }

        let mut before = Vec::new();
        for &id in &campaign.factions {
            before.push((id, campaign.faction(id)?.gold));
        }
        let report = campaign
            .advance(1)?
            .pop()
            .ok_or_else(|| anyhow!("no report for turn {turn}"))?;

        ensure!(report.turn == turn && report.next_turn == turn + 1, "turn did not advance by one");
        ensure!(store.current_turn()? == turn + 1, "stored turn out of step");
        ensure!(
            report.factions.len() + report.skipped_slots.len()
                == usize::from(campaign.ledger.config().faction_slots),
            "every slot must be settled or skipped"
        );

        for settled in &report.factions {
            let id = settled.faction;
            let previous = before
                .iter()
                .find_map(|(faction, gold)| (*faction == id).then_some(*gold))
                .ok_or_else(|| anyhow!("{id} settled but was never generated"))?;
            ensure!(settled.previous_balance == previous, "{id}: stale opening balance");
            ensure!(
                settled.new_balance == settled.previous_balance + settled.net_gold,
                "{id}: {} + {} != {}",
                settled.previous_balance,
                settled.net_gold,
                settled.new_balance
            );
            let flagged = settled
                .warnings
                .iter()
                .any(|w| matches!(w, TurnWarning::NegativeBalance { .. }));
            ensure!(flagged == (settled.new_balance < 0), "{id}: negative balance flag wrong");
            let record = campaign.faction(id)?;
            ensure!(record.gold == settled.new_balance, "{id}: stored gold differs from report");
            ensure!(record.turn_state.is_empty(), "{id}: turn state not reset");
        }
    }
    Ok(())
}

fn transfers_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let campaign = Campaign::generate(ctx.seed, ctx.config)?;
    let total = campaign.total_gold()?;
    let mut rng = ChaCha20Rng::seed_from_u64(ctx.seed.rotate_left(17));
    let mut sent = Vec::new();

    for n in 0..TRANSFERS_PER_RUN {
        let from = campaign.factions[rng.random_range(0..campaign.factions.len())];
        let others: Vec<_> = campaign.factions.iter().copied().filter(|f| *f != from).collect();
        let to = others[rng.random_range(0..others.len())];
        let balance = campaign.faction(from)?.gold;
        let amount = rng.random_range(1..=balance.max(0) + OVERDRAFT_MARGIN);
        let id = TransferId::new(format!("t{n}"));

        let result = campaign.ledger.initiate_transfer(
            &SessionContext::faction(from),
            id.clone(),
            from,
            to,
            amount,
        )?;
        if amount > balance {
            ensure!(
                matches!(result.rejection(), Some(Rejection::InsufficientGold { .. })),
                "{id}: overdraft of {amount} from {balance} was not refused"
            );
            ensure!(campaign.faction(from)?.gold == balance, "{id}: refused transfer debited");
        } else {
            ensure!(result.is_accepted(), "{id}: valid transfer refused");
            ensure!(campaign.faction(from)?.gold == balance - amount, "{id}: debit mismatch");
            sent.push((id, to));
        }
    }

    for (id, to) in sent {
        let session = SessionContext::faction(to);
        ensure!(
            campaign.ledger.claim_transfer(&session, &id)?.is_accepted(),
            "{id}: first claim refused"
        );
        let again = campaign.ledger.claim_transfer(&session, &id)?;
        ensure!(
            matches!(again.rejection(), Some(Rejection::AlreadyClaimed { .. })),
            "{id}: second claim was not refused"
        );
    }

    let after = campaign.total_gold()?;
    ensure!(after == total, "gold not conserved: {total} before, {after} after");
    Ok(())
}

fn replay_expectation(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let play = || -> Result<Vec<u8>> {
        let campaign = Campaign::generate(ctx.seed, ctx.config)?;
        campaign.run_missions(0)?;
        campaign.advance(2)?;
        campaign.run_missions(1)?;
        Ok(Sha256::digest(campaign.snapshot_bytes()?).to_vec())
    };
    let first = play()?;
    let second = play()?;
    ensure!(first == second, "seed {} diverged between runs", ctx.seed);
    Ok(())
}
