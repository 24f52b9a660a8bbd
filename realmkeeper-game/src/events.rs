//! Weighted random events drawn at turn boundaries.
//!
//! The ledger never applies an event; the GM reads the pick and resolves it
//! by hand.
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::terrain::Terrain;

const DEFAULT_RANDOM_EVENTS_DATA: &str = include_str!("../data/random_events.json");

const fn default_weight() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventScope {
    #[default]
    Faction,
    Region,
    Campaign,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RandomEventDef {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scope: EventScope,
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Weight used instead of `weight` when the region is besieged.
    #[serde(default)]
    pub besieged_weight: Option<u32>,
    /// Terrains the event can strike; empty means any.
    #[serde(default)]
    pub terrains: Vec<Terrain>,
}

impl RandomEventDef {
    #[must_use]
    pub fn weight_for(&self, ctx: &EventContext) -> u32 {
        if let Some(terrain) = ctx.terrain
            && !self.terrains.is_empty()
            && !self.terrains.contains(&terrain)
        {
            return 0;
        }
        if ctx.under_siege {
            self.besieged_weight.unwrap_or(self.weight)
        } else {
            self.weight
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RandomEventCatalog {
    #[serde(default)]
    pub chance_per_turn: f32,
    #[serde(default)]
    pub events: Vec<RandomEventDef>,
}

impl RandomEventCatalog {
    /// # Errors
    ///
    /// Returns the parse error for malformed catalogue JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn load_from_static() -> Self {
        Self::from_json(DEFAULT_RANDOM_EVENTS_DATA).unwrap_or_default()
    }
}

#[must_use]
pub fn catalog() -> &'static RandomEventCatalog {
    static CATALOG: OnceLock<RandomEventCatalog> = OnceLock::new();
    CATALOG.get_or_init(RandomEventCatalog::load_from_static)
}

/// Where the event would land. `terrain` is `None` for faction or
/// campaign-wide draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventContext {
    pub terrain: Option<Terrain>,
    pub under_siege: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventPick<'a> {
    pub event: &'a RandomEventDef,
    pub chance_roll: f32,
    pub weight_roll: u32,
    pub total_weight: u32,
}

/// Roll whether an event fires this turn and, if so, which.
pub fn pick_random_event<'a, R>(
    catalog: &'a RandomEventCatalog,
    ctx: &EventContext,
    rng: &mut R,
) -> Option<EventPick<'a>>
where
    R: Rng + ?Sized,
{
    let chance = catalog.chance_per_turn.clamp(0.0, 1.0);
    if chance <= 0.0 {
        return None;
    }
    let chance_roll = rng.random::<f32>();
    if chance_roll >= chance {
        return None;
    }

    let weights: Vec<u32> = catalog.events.iter().map(|e| e.weight_for(ctx)).collect();
    let total_weight = weights.iter().fold(0u32, |acc, w| acc.saturating_add(*w));
    if total_weight == 0 {
        return None;
    }
    let weight_roll = rng.random_range(0..total_weight);
    let mut remaining = weight_roll;
    for (event, weight) in catalog.events.iter().zip(weights) {
        if remaining < weight {
            return Some(EventPick {
                event,
                chance_roll,
                weight_roll,
                total_weight,
            });
        }
        remaining -= weight;
    }
    None
}
