//! d100 roll sources.
use hmac::{Hmac, Mac};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;
use std::collections::VecDeque;

use crate::constants::{ROLL_MAX, ROLL_MIN};
use crate::faction::MissionId;

/// Produces uniform integers on [1, 100].
pub trait RollSource {
    fn roll_d100(&mut self) -> u8;
}

impl<R: RngCore> RollSource for R {
    fn roll_d100(&mut self) -> u8 {
        self.random_range(ROLL_MIN..=ROLL_MAX)
    }
}

/// Per-mission dice stream derived from the campaign seed.
///
/// The same seed and mission id always roll the same sequence, so a
/// resolution can be replayed.
#[derive(Debug, Clone)]
pub struct MissionDice {
    rng: ChaCha20Rng,
    draws: u64,
}

impl MissionDice {
    #[must_use]
    pub fn for_mission(campaign_seed: u64, mission: &MissionId) -> Self {
        Self {
            rng: ChaCha20Rng::from_seed(derive_mission_seed(campaign_seed, mission)),
            draws: 0,
        }
    }

    /// Number of rolls taken from this stream.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl RollSource for MissionDice {
    fn roll_d100(&mut self) -> u8 {
        self.draws = self.draws.saturating_add(1);
        self.rng.random_range(ROLL_MIN..=ROLL_MAX)
    }
}

fn derive_mission_seed(campaign_seed: u64, mission: &MissionId) -> [u8; 32] {
    let mut mac = Hmac::<Sha256>::new_from_slice(&campaign_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(b"mission:");
    mac.update(mission.as_str().as_bytes());
    let digest = mac.finalize().into_bytes();
    let mut seed = [0u8; 32];
    seed.copy_from_slice(&digest);
    seed
}

/// Pre-entered rolls, e.g. physical dice read out at the table.
///
/// Rolls outside [1, 100] are clamped. An exhausted queue keeps repeating
/// its last roll.
#[derive(Debug, Clone, Default)]
pub struct FixedRolls {
    queue: VecDeque<u8>,
    last: Option<u8>,
}

impl FixedRolls {
    pub fn new(rolls: impl IntoIterator<Item = u8>) -> Self {
        Self {
            queue: rolls.into_iter().map(|r| r.clamp(ROLL_MIN, ROLL_MAX)).collect(),
            last: None,
        }
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl RollSource for FixedRolls {
    fn roll_d100(&mut self) -> u8 {
        let roll = self
            .queue
            .pop_front()
            .or(self.last)
            .unwrap_or(ROLL_MIN);
        self.last = Some(roll);
        roll
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mission_dice_are_reproducible() {
        let id = MissionId::new("m-17");
        let mut a = MissionDice::for_mission(42, &id);
        let mut b = MissionDice::for_mission(42, &id);
        let first: Vec<u8> = (0..16).map(|_| a.roll_d100()).collect();
        let second: Vec<u8> = (0..16).map(|_| b.roll_d100()).collect();
        assert_eq!(first, second);
        assert_eq!(a.draws(), 16);
        assert!(first.iter().all(|r| (1..=100).contains(r)));

        let mut other = MissionDice::for_mission(42, &MissionId::new("m-18"));
        let third: Vec<u8> = (0..16).map(|_| other.roll_d100()).collect();
        assert_ne!(first, third);
    }

    #[test]
    fn any_rng_is_a_roll_source() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        for _ in 0..500 {
            let roll = rng.roll_d100();
            assert!((ROLL_MIN..=ROLL_MAX).contains(&roll));
        }
    }

    #[test]
    fn fixed_rolls_replay_in_order() {
        let mut dice = FixedRolls::new([80, 0, 250]);
        assert_eq!(dice.roll_d100(), 80);
        assert_eq!(dice.roll_d100(), 1);
        assert_eq!(dice.roll_d100(), 100);
        assert_eq!(dice.remaining(), 0);
        assert_eq!(dice.roll_d100(), 100);
    }
}
