//! Region records and upgrade multiset bookkeeping.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::buildings::{Building, BuildingCategory};
use crate::faction::{FactionId, RegionId};
use crate::terrain::{RuleCheck, Terrain, can_add_building};

/// Count of each building kind in an upgrade list.
pub type UpgradeCounts = BTreeMap<Building, u32>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    /// Grid coordinate, e.g. `C7`.
    pub code: String,
    #[serde(default)]
    pub owner: Option<FactionId>,
    pub terrain: Terrain,
    #[serde(default)]
    pub upgrades: Vec<Building>,
    /// Sub-multiset of `upgrades` that is present but inactive.
    #[serde(default)]
    pub disabled_upgrades: Vec<Building>,
    #[serde(default)]
    pub under_siege: bool,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegionError {
    #[error("region has no {0} to remove")]
    NotPresent(Building),
    #[error("region has no active {0} to disable")]
    NothingToDisable(Building),
    #[error("region has no disabled {0} to enable")]
    NothingToEnable(Building),
}

/// Count map of a token list.
#[must_use]
pub fn count_upgrades(tokens: &[Building]) -> UpgradeCounts {
    let mut counts = UpgradeCounts::new();
    for token in tokens {
        *counts.entry(*token).or_insert(0) += 1;
    }
    counts
}

impl Region {
    #[must_use]
    pub fn new(id: RegionId, code: impl Into<String>, terrain: Terrain) -> Self {
        Self {
            id,
            code: code.into(),
            owner: None,
            terrain,
            upgrades: Vec::new(),
            disabled_upgrades: Vec::new(),
            under_siege: false,
            notes: String::new(),
        }
    }

    #[must_use]
    pub fn owned_by(mut self, owner: FactionId) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Hand the region to a new owner (or none); returns the previous one.
    pub const fn transfer_to(&mut self, owner: Option<FactionId>) -> Option<FactionId> {
        std::mem::replace(&mut self.owner, owner)
    }

    #[must_use]
    pub fn with_upgrades(mut self, upgrades: impl IntoIterator<Item = Building>) -> Self {
        self.upgrades.extend(upgrades);
        self
    }

    #[must_use]
    pub fn upgrade_count(&self, building: Building) -> u32 {
        count_in(&self.upgrades, building)
    }

    #[must_use]
    pub fn disabled_count(&self, building: Building) -> u32 {
        count_in(&self.disabled_upgrades, building)
    }

    /// `max(0, total - disabled)`.
    #[must_use]
    pub fn active_count(&self, building: Building) -> u32 {
        self.upgrade_count(building)
            .saturating_sub(self.disabled_count(building))
    }

    /// Active count for every building present.
    #[must_use]
    pub fn active_counts(&self) -> UpgradeCounts {
        let disabled = count_upgrades(&self.disabled_upgrades);
        count_upgrades(&self.upgrades)
            .into_iter()
            .map(|(building, total)| {
                let off = disabled.get(&building).copied().unwrap_or(0);
                (building, total.saturating_sub(off))
            })
            .collect()
    }

    #[must_use]
    pub fn has_active(&self, building: Building) -> bool {
        self.active_count(building) > 0
    }

    /// Terrain check for adding `building`.
    #[must_use]
    pub fn can_build(&self, building: Building) -> RuleCheck {
        can_add_building(self.terrain, building, &self.upgrades)
    }

    /// Build after a terrain check. A settlement replaces the current tier and
    /// a Castle replaces a Keep.
    pub fn try_build(&mut self, building: Building) -> RuleCheck {
        let check = self.can_build(building);
        if !check.allowed {
            return check;
        }
        match building {
            b if b.category() == BuildingCategory::Settlement => {
                self.strip(|existing| existing.category() == BuildingCategory::Settlement);
            }
            Building::Castle => self.strip(|existing| existing == Building::Keep),
            _ => {}
        }
        self.add_upgrade(building);
        check
    }

    pub fn add_upgrade(&mut self, building: Building) {
        self.upgrades.push(building);
    }

    /// Remove one copy. Active copies go first; a disabled token is only
    /// dropped when no active copy remains.
    ///
    /// # Errors
    ///
    /// Returns `RegionError::NotPresent` when the region has no such upgrade.
    pub fn remove_upgrade(&mut self, building: Building) -> Result<(), RegionError> {
        let Some(pos) = self.upgrades.iter().position(|b| *b == building) else {
            return Err(RegionError::NotPresent(building));
        };
        self.upgrades.remove(pos);
        if self.disabled_count(building) > self.upgrade_count(building)
            && let Some(dpos) = self.disabled_upgrades.iter().position(|b| *b == building)
        {
            self.disabled_upgrades.remove(dpos);
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RegionError::NothingToDisable` when no active copy exists.
    pub fn disable_upgrade(&mut self, building: Building) -> Result<(), RegionError> {
        if self.active_count(building) == 0 {
            return Err(RegionError::NothingToDisable(building));
        }
        self.disabled_upgrades.push(building);
        Ok(())
    }

    /// # Errors
    ///
    /// Returns `RegionError::NothingToEnable` when no disabled copy exists.
    pub fn enable_upgrade(&mut self, building: Building) -> Result<(), RegionError> {
        let Some(pos) = self.disabled_upgrades.iter().position(|b| *b == building) else {
            return Err(RegionError::NothingToEnable(building));
        };
        self.disabled_upgrades.remove(pos);
        Ok(())
    }

    /// Drop disabled tokens that exceed their totals, as found in
    /// hand-edited or imported records.
    pub fn normalize(&mut self) {
        let totals = count_upgrades(&self.upgrades);
        let mut kept = UpgradeCounts::new();
        self.disabled_upgrades.retain(|b| {
            let seen = kept.entry(*b).or_insert(0);
            if *seen < totals.get(b).copied().unwrap_or(0) {
                *seen += 1;
                true
            } else {
                false
            }
        });
    }

    /// Whether every disabled count is within its total.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        let totals = count_upgrades(&self.upgrades);
        count_upgrades(&self.disabled_upgrades)
            .iter()
            .all(|(b, off)| *off <= totals.get(b).copied().unwrap_or(0))
    }

    fn strip(&mut self, mut matches: impl FnMut(Building) -> bool) {
        self.upgrades.retain(|b| !matches(*b));
        self.disabled_upgrades.retain(|b| !matches(*b));
    }
}

fn count_in(tokens: &[Building], building: Building) -> u32 {
    let count = tokens.iter().filter(|b| **b == building).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}
