//! Court offices, appointments and the bonuses they grant.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::faction::{CharacterId, FactionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourtPosition {
    Chancellor,
    Marshal,
    Spymaster,
    Steward,
    Champion,
}

impl CourtPosition {
    pub const ALL: [Self; 5] = [
        Self::Chancellor,
        Self::Marshal,
        Self::Spymaster,
        Self::Steward,
        Self::Champion,
    ];

    #[must_use]
    pub const fn bonus(self) -> CourtBonus {
        match self {
            Self::Chancellor => CourtBonus {
                gold: 5,
                ..CourtBonus::NONE
            },
            Self::Marshal => CourtBonus {
                army_cap: 1,
                stats: StatBonus {
                    command: 1,
                    ..StatBonus::NONE
                },
                ..CourtBonus::NONE
            },
            Self::Spymaster => CourtBonus {
                free_agents: 1,
                stats: StatBonus {
                    intrigue: 2,
                    ..StatBonus::NONE
                },
                ..CourtBonus::NONE
            },
            Self::Steward => CourtBonus {
                gold: 3,
                stats: StatBonus {
                    stewardship: 2,
                    ..StatBonus::NONE
                },
                ..CourtBonus::NONE
            },
            Self::Champion => CourtBonus {
                stats: StatBonus {
                    prowess: 2,
                    ..StatBonus::NONE
                },
                ..CourtBonus::NONE
            },
        }
    }
}

/// The four character stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatBonus {
    pub prowess: i32,
    pub intrigue: i32,
    pub stewardship: i32,
    pub command: i32,
}

impl StatBonus {
    pub const NONE: Self = Self {
        prowess: 0,
        intrigue: 0,
        stewardship: 0,
        command: 0,
    };

    fn add(&mut self, other: Self) {
        self.prowess += other.prowess;
        self.intrigue += other.intrigue;
        self.stewardship += other.stewardship;
        self.command += other.command;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CourtBonus {
    pub gold: i64,
    pub army_cap: u32,
    pub free_agents: u32,
    pub stats: StatBonus,
}

impl CourtBonus {
    pub const NONE: Self = Self {
        gold: 0,
        army_cap: 0,
        free_agents: 0,
        stats: StatBonus::NONE,
    };
}

/// Live stats of a character, read from the character record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CharacterStats {
    pub prowess: i32,
    pub intrigue: i32,
    pub stewardship: i32,
    pub command: i32,
}

/// Stats frozen at the moment of appointment.
///
/// Distinct from [`CharacterStats`] so call sites must choose: the court
/// roster shows the snapshot, mission difficulty reads live stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatSnapshot {
    pub prowess: i32,
    pub intrigue: i32,
    pub stewardship: i32,
    pub command: i32,
}

impl From<CharacterStats> for StatSnapshot {
    fn from(live: CharacterStats) -> Self {
        Self {
            prowess: live.prowess,
            intrigue: live.intrigue,
            stewardship: live.stewardship,
            command: live.command,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourtAppointment {
    pub position: CourtPosition,
    pub character_id: CharacterId,
    pub faction_id: FactionId,
    pub snapshot: StatSnapshot,
}

/// One holder per office; appointing replaces the previous holder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Court {
    appointments: BTreeMap<CourtPosition, CourtAppointment>,
}

impl Court {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_appointments(appointments: impl IntoIterator<Item = CourtAppointment>) -> Self {
        let mut court = Self::new();
        for appointment in appointments {
            court.install(appointment);
        }
        court
    }

    /// Appoint a holder, returning whoever held the office before.
    pub fn appoint(
        &mut self,
        position: CourtPosition,
        character_id: CharacterId,
        faction_id: FactionId,
        live: CharacterStats,
    ) -> Option<CourtAppointment> {
        self.install(CourtAppointment {
            position,
            character_id,
            faction_id,
            snapshot: StatSnapshot::from(live),
        })
    }

    /// Store an appointment as-is, keeping its frozen snapshot.
    pub fn install(&mut self, appointment: CourtAppointment) -> Option<CourtAppointment> {
        self.appointments.insert(appointment.position, appointment)
    }

    pub fn vacate(&mut self, position: CourtPosition) -> Option<CourtAppointment> {
        self.appointments.remove(&position)
    }

    #[must_use]
    pub fn holder(&self, position: CourtPosition) -> Option<&CourtAppointment> {
        self.appointments.get(&position)
    }

    pub fn appointments(&self) -> impl Iterator<Item = &CourtAppointment> {
        self.appointments.values()
    }

    /// Sum of bonuses for every office held by `faction`.
    #[must_use]
    pub fn bonuses_for(&self, faction: FactionId) -> CourtBonus {
        self.appointments
            .values()
            .filter(|a| a.faction_id == faction)
            .fold(CourtBonus::NONE, |mut total, appointment| {
                let bonus = appointment.position.bonus();
                total.gold += bonus.gold;
                total.army_cap += bonus.army_cap;
                total.free_agents += bonus.free_agents;
                total.stats.add(bonus.stats);
                total
            })
    }
}
