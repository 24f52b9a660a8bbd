//! Seeded campaign generation and play-out.
//!
//! Every campaign is a pure function of its seed: regions are generated as
//! import lines and fed through [`import_regions`], forces and agents are
//! drawn from the same `ChaCha20` stream, and mission dice come from
//! [`MissionDice::for_mission`].
use anyhow::{Context, Result, anyhow};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use realmkeeper_game::{
    Agent, AgentId, AgentType, Army, ArmyId, Building, CampaignStore, CharacterId,
    CharacterStats, ConfigSource, CourtPosition, Faction, FactionId, MemoryStore, Mission,
    MissionDice, MissionId, MissionResult, MissionTarget, MissionType, PatronDeity, Region,
    RegionId, SessionContext, Terrain, TurnLedger, TurnReport, import_regions, open_ledger,
};

pub const FACTION_NAMES: [&str; 4] = ["Vale", "Korr", "Ashmere", "Tollan"];
pub const FACTION_COUNT: u8 = 3;
const REGION_ROWS: u8 = 3;
const REGION_COLUMNS: u8 = 4;
const MAX_BUILD_ATTEMPTS: u32 = 5;

/// Salt separating the mission-choice stream from the generation stream.
const MISSION_STREAM_SALT: u64 = 0x6d69_7373_696f_6e73;

pub struct Campaign {
    pub seed: u64,
    pub ledger: TurnLedger<MemoryStore>,
    pub factions: Vec<FactionId>,
    /// Regions exactly as generated, before import.
    pub generated: Vec<Region>,
    pub import_lines: String,
}

/// A mission carried from submission to resolution.
#[derive(Debug, Clone)]
pub struct MissionRun {
    pub approved: Mission,
    pub result: MissionResult,
    pub agent_after: Option<Agent>,
}

impl Campaign {
    /// Generate the campaign for `seed` with config overrides from `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config is invalid, the generated import does
    /// not parse, or the court cannot be seated.
    pub fn generate<C: ConfigSource>(seed: u64, source: &C) -> Result<Self> {
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let factions: Vec<FactionId> = (1..=FACTION_COUNT).map(FactionId).collect();
        let store = MemoryStore::new();

        for &id in &factions {
            let name = FACTION_NAMES[usize::from(id.0 - 1) % FACTION_NAMES.len()];
            let patron = PatronDeity::ALL[rng.random_range(0..PatronDeity::ALL.len())];
            store.insert_faction(
                Faction::new(id, name)
                    .with_gold(rng.random_range(5..=40))
                    .with_patron(patron)
                    .with_warships(rng.random_range(0..=2)),
            );
        }

        let (generated, import_lines) = generate_regions(&mut rng, &factions);
        let imported = import_regions(&import_lines)
            .with_context(|| format!("generated import for seed {seed} did not parse"))?;
        let codes: Vec<String> = imported.iter().map(|r| r.code.clone()).collect();
        for mut region in imported {
            region.under_siege = rng.random_ratio(1, 8);
            store.insert_region(region);
        }

        for &id in &factions {
            let home = store
                .regions_owned_by(id)?
                .first()
                .map(|r| r.code.clone())
                .unwrap_or_default();
            let mut army = Army::new(ArmyId::new(format!("host-{}", id.0)), Some(id), "Host").at(home);
            army.units.huscarls = rng.random_range(0..=6);
            army.units.light_horse = rng.random_range(0..=2);
            army.units.sellswords = rng.random_range(0..=3);
            army.levy_infantry = rng.random_range(0..=20);
            army.levy_archers = rng.random_range(0..=10);
            store.insert_army(army);

            for kind in AgentType::ALL {
                let location = &codes[rng.random_range(0..codes.len())];
                let agent_id = AgentId::new(format!("{}-{kind}", id.0));
                let level = rng.random_range(1..=5);
                store.insert_agent(
                    Agent::new(agent_id, id, format!("{kind} of {id}"), kind, level).at(location.as_str()),
                );
            }
        }

        let ledger = open_ledger(store, source)?;
        let chancellor = factions[rng.random_range(0..factions.len())];
        ledger
            .appoint_court(
                &SessionContext::game_master(),
                CourtPosition::Chancellor,
                CharacterId::new(format!("chancellor-{seed}")),
                chancellor,
                CharacterStats {
                    stewardship: rng.random_range(1..=6),
                    ..CharacterStats::default()
                },
            )?
            .accepted()
            .ok_or_else(|| anyhow!("game master could not seat the chancellor"))?;

        Ok(Self {
            seed,
            ledger,
            factions,
            generated,
            import_lines,
        })
    }

    /// Current treasury of every faction, summed.
    ///
    /// # Errors
    ///
    /// Returns an error if a faction record is missing.
    pub fn total_gold(&self) -> Result<i64> {
        let mut total = 0;
        for &id in &self.factions {
            total += self.faction(id)?.gold;
        }
        Ok(total)
    }

    /// # Errors
    ///
    /// Returns an error if the faction record is missing.
    pub fn faction(&self, id: FactionId) -> Result<Faction> {
        self.ledger
            .store()
            .faction(id)?
            .ok_or_else(|| anyhow!("no record for {id}"))
    }

    /// Send every living agent on one mission it is qualified for, then
    /// approve and resolve each with per-mission dice.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure or when a well-formed order is
    /// refused.
    pub fn run_missions(&self, round: u32) -> Result<Vec<MissionRun>> {
        let mut rng = ChaCha20Rng::seed_from_u64(self.seed ^ MISSION_STREAM_SALT ^ u64::from(round));
        let store = self.ledger.store();
        let gm = SessionContext::game_master();
        let mut runs = Vec::new();

        for &faction in &self.factions {
            let session = SessionContext::faction(faction);
            for agent in store.agents_owned_by(faction)? {
                if !agent.is_active() {
                    continue;
                }
                let options: Vec<MissionType> = MissionType::for_agent(agent.kind).collect();
                let mission = options[rng.random_range(0..options.len())];
                let region = &self.generated[rng.random_range(0..self.generated.len())];
                let target = self.target_for(mission, faction, region)?;
                let id = MissionId::new(format!("r{round}-{}", agent.id));

                let submitted = self.ledger.submit_mission(
                    &session,
                    id.clone(),
                    &agent.id,
                    mission.into(),
                    &region.code,
                    target,
                )?;
                if let Some(reason) = submitted.rejection() {
                    return Err(anyhow!("{mission} by {} refused: {reason}", agent.id));
                }
                let approved = self
                    .ledger
                    .approve_mission(&gm, &id)?
                    .accepted()
                    .ok_or_else(|| anyhow!("mission {id} could not be approved"))?;
                let mut dice = MissionDice::for_mission(self.seed, &id);
                let result = self
                    .ledger
                    .resolve_mission(&gm, &id, &mut dice)?
                    .accepted()
                    .ok_or_else(|| anyhow!("mission {id} could not be resolved"))?;
                runs.push(MissionRun {
                    approved,
                    result,
                    agent_after: store.agent(&agent.id)?,
                });
            }
        }
        Ok(runs)
    }

    /// Settle `turns` turns in a row.
    ///
    /// # Errors
    ///
    /// Returns an error on store failure or if the game master is refused.
    pub fn advance(&self, turns: u32) -> Result<Vec<TurnReport>> {
        let gm = SessionContext::game_master();
        (0..turns)
            .map(|_| {
                self.ledger
                    .advance_turn(&gm)?
                    .accepted()
                    .ok_or_else(|| anyhow!("game master could not advance the turn"))
            })
            .collect()
    }

    /// Serialized store contents, for replay comparison.
    ///
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be serialized.
    pub fn snapshot_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.ledger.store().snapshot())?)
    }

    fn target_for(
        &self,
        mission: MissionType,
        faction: FactionId,
        region: &Region,
    ) -> Result<Option<MissionTarget>> {
        let store = self.ledger.store();
        let target = match mission {
            MissionType::ScoutArmy => store
                .armies_at(&region.code)?
                .into_iter()
                .find(|army| army.owner != Some(faction) && army.is_active())
                .map(|army| MissionTarget::Army {
                    strength: army.strength(),
                    army_id: army.id,
                    name: army.name,
                }),
            MissionType::KillAgent => store
                .agents_at(&region.code)?
                .into_iter()
                .find(|agent| agent.owner != faction && agent.is_active())
                .map(|agent| MissionTarget::Agent {
                    agent_id: agent.id,
                    name: agent.name,
                    level: agent.level,
                    revealed: agent.revealed,
                }),
            MissionType::AssassinateCommander => Some(MissionTarget::Commander {
                character_id: CharacterId::new(format!("commander-{}", region.code)),
                name: format!("Commander of {}", region.code),
                prowess: 3,
            }),
            MissionType::AssassinateLeader => Some(MissionTarget::Leader {
                character_id: CharacterId::new(format!("leader-{}", region.code)),
                name: format!("Lord of {}", region.code),
                prowess: 2,
                intrigue: 4,
            }),
            _ => None,
        };
        Ok(target)
    }
}

/// Regions as import lines, plus the regions those lines must produce.
///
/// Every faction owns at least one region; the rest are shared out at
/// random or left unowned.
pub fn generate_regions(rng: &mut impl Rng, factions: &[FactionId]) -> (Vec<Region>, String) {
    let mut regions = Vec::new();
    let mut lines = String::from("# code,terrain,owner,upgrades\n");

    for index in 0..REGION_ROWS * REGION_COLUMNS {
        let code = format!(
            "{}{}",
            char::from(b'A' + index / REGION_COLUMNS),
            index % REGION_COLUMNS + 1
        );
        let terrain = Terrain::ALL[rng.random_range(0..Terrain::ALL.len())];
        let owner = match factions.get(usize::from(index)) {
            Some(&id) => Some(id),
            None if rng.random_bool(0.25) => None,
            None => Some(factions[rng.random_range(0..factions.len())]),
        };

        let mut region = Region::new(RegionId::new(format!("region-{code}")), code.as_str(), terrain);
        region.owner = owner;
        let mut built = Vec::new();
        for _ in 0..rng.random_range(0..=MAX_BUILD_ATTEMPTS) {
            let building = Building::ALL[rng.random_range(0..Building::ALL.len())];
            if region.try_build(building).allowed {
                built.push(building.to_string());
            }
        }

        let owner_field = owner.map_or_else(|| "-".to_string(), |id| id.0.to_string());
        lines.push_str(&format!("{code},{terrain},{owner_field},{}\n", built.join("|")));
        regions.push(region);
    }
    (regions, lines)
}
