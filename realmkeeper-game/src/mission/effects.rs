//! Narrative effect lines for a resolved mission.
use super::{MissionOutcome, MissionType};

/// Names substituted into effect text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectContext {
    pub region_code: Option<String>,
    pub target_name: Option<String>,
}

impl EffectContext {
    fn region(&self) -> &str {
        self.region_code.as_deref().unwrap_or("the region")
    }

    fn target(&self, fallback: &'static str) -> String {
        self.target_name
            .as_deref()
            .map_or_else(|| fallback.to_string(), str::to_string)
    }
}

/// Mechanical consequences for the GM to apply. Empty unless the mission
/// succeeded.
#[must_use]
pub fn derive_mission_effects(
    mission: MissionType,
    outcome: MissionOutcome,
    critical: bool,
    ctx: &EffectContext,
) -> Vec<String> {
    if !outcome.is_success() {
        return Vec::new();
    }
    let region = ctx.region();
    let mut effects = Vec::new();
    match mission {
        MissionType::ScoutRegion => {
            effects.push(format!("Reveal all buildings in {region}"));
            if critical {
                effects.push(format!("Reveal all armies in {region}"));
            }
        }
        MissionType::ScoutArmy => {
            let army = ctx.target("the army");
            effects.push(format!("Reveal the composition of {army}"));
            if critical {
                effects.push(format!("Reveal the commanders and orders of {army}"));
            }
        }
        MissionType::InfiltrateCourt => {
            effects.push(format!("Reveal the court appointments of the faction holding {region}"));
            if critical {
                effects.push("Reveal the faction's treasury".to_string());
            }
        }
        MissionType::InciteUnrest => {
            effects.push(format!("Disable one settlement upgrade in {region} for a turn"));
            if critical {
                effects.push(format!("Disable a second upgrade in {region}"));
            }
        }
        MissionType::SabotageBuilding => {
            effects.push(format!("Disable one upgrade in {region}"));
            if critical {
                effects.push("The saboteur chooses which upgrade is disabled".to_string());
            }
        }
        MissionType::FomentRevolt => {
            effects.push(format!("{region} is now under siege"));
            if critical {
                effects.push(format!("Rebels in {region} raise 2 levy units"));
            }
        }
        MissionType::AssassinateCommander => {
            effects.push(format!("Commander {} is killed", ctx.target("the commander")));
            if critical {
                effects.push("The killing is blamed on another faction".to_string());
            }
        }
        MissionType::AssassinateLeader => {
            effects.push(format!("{} is killed", ctx.target("The leader")));
            if critical {
                effects.push("The faction's court offices fall vacant".to_string());
            }
        }
        MissionType::KillAgent => {
            effects.push(format!("Agent {} is killed", ctx.target("the agent")));
            if critical {
                effects.push("The killing goes unnoticed".to_string());
            }
        }
    }
    effects
}
