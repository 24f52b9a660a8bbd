//! Armies and their unit rosters.
use serde::{Deserialize, Serialize};

use crate::faction::{ArmyId, CharacterId, FactionId};

/// Household-guard and mercenary unit counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UnitCounts {
    #[serde(default)]
    pub huscarls: u32,
    #[serde(default)]
    pub dismounted_knights: u32,
    #[serde(default)]
    pub mounted_knights: u32,
    #[serde(default)]
    pub light_horse: u32,
    #[serde(default)]
    pub sellswords: u32,
    #[serde(default)]
    pub merc_crossbows: u32,
    #[serde(default)]
    pub merc_cavalry: u32,
}

impl UnitCounts {
    /// Units drawing on household-guard capacity.
    #[must_use]
    pub const fn hsg_units(&self) -> u32 {
        self.huscarls
            .saturating_add(self.dismounted_knights)
            .saturating_add(self.mounted_knights)
            .saturating_add(self.light_horse)
    }

    #[must_use]
    pub const fn mercenary_units(&self) -> u32 {
        self.sellswords
            .saturating_add(self.merc_crossbows)
            .saturating_add(self.merc_cavalry)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Army {
    pub id: ArmyId,
    /// `None` for neutral forces.
    #[serde(default)]
    pub owner: Option<FactionId>,
    pub name: String,
    /// Region code; empty while unplaced.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub units: UnitCounts,
    /// Levy infantry, in units of ten men.
    #[serde(default)]
    pub levy_infantry: u32,
    /// Levy archers, in units of ten men.
    #[serde(default)]
    pub levy_archers: u32,
    #[serde(default)]
    pub commanders: Vec<CharacterId>,
    /// Players never hard-delete armies.
    #[serde(default)]
    pub deleted: bool,
}

impl Army {
    #[must_use]
    pub fn new(id: ArmyId, owner: Option<FactionId>, name: impl Into<String>) -> Self {
        Self {
            id,
            owner,
            name: name.into(),
            location: String::new(),
            units: UnitCounts::default(),
            levy_infantry: 0,
            levy_archers: 0,
            commanders: Vec::new(),
            deleted: false,
        }
    }

    #[must_use]
    pub fn at(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.deleted
    }

    #[must_use]
    pub const fn levy_units(&self) -> u32 {
        self.levy_infantry.saturating_add(self.levy_archers)
    }

    /// Every unit counted toward a region garrison.
    #[must_use]
    pub const fn strength(&self) -> u32 {
        self.units
            .hsg_units()
            .saturating_add(self.units.mercenary_units())
            .saturating_add(self.levy_units())
    }

    pub fn soft_delete(&mut self) {
        self.deleted = true;
    }
}
