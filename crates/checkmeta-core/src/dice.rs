//! Dice/probability service: the only source of randomness in a matchday.
//!
//! A [`Dice`] is a seeded d20 roller. Components that need chance get
//! their own stream via [`Dice::fork`], derived deterministically from the
//! parent seed and a label, so results do not depend on which thread or
//! in what order the streams are consumed.
//!
//! For exact-outcome tests, [`Dice::scripted`] replays a fixed sequence
//! of d20 faces before falling back to its seed.

use std::collections::VecDeque;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Number of faces on the die.
pub const D20: i32 = 20;

/// Who won a contested roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestOutcome {
    /// The attacker rolled higher.
    Attacker,
    /// The defender rolled higher.
    Defender,
    /// Both rolls were equal after modifiers.
    Draw,
}

/// Result of [`Dice::contested_roll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContestedRoll {
    /// Attacker's final roll.
    pub attacker_roll: i32,
    /// Defender's final roll.
    pub defender_roll: i32,
    /// Who won.
    pub outcome: ContestOutcome,
}

impl ContestedRoll {
    /// Absolute difference between the two rolls.
    pub fn margin(&self) -> i32 {
        i32::try_from(self.attacker_roll.abs_diff(self.defender_roll)).unwrap_or(i32::MAX)
    }
}

/// A seedable d20 roller.
#[derive(Debug, Clone)]
pub struct Dice {
    seed: u64,
    rng: SmallRng,
    script: VecDeque<i32>,
}

impl Dice {
    /// A dice stream seeded with `seed`.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            rng: SmallRng::seed_from_u64(seed),
            script: VecDeque::new(),
        }
    }

    /// A dice stream that returns `faces` (clamped to `1..=20`) for its
    /// next d20 rolls, then continues from `seed`.
    pub fn scripted(faces: impl IntoIterator<Item = i32>, seed: u64) -> Self {
        Self {
            script: faces.into_iter().map(|f| f.clamp(1, D20)).collect(),
            ..Self::seeded(seed)
        }
    }

    /// Seed this stream was created with.
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Scripted faces not yet consumed.
    pub fn scripted_remaining(&self) -> usize {
        self.script.len()
    }

    /// An independent stream derived from this one's seed and `label`.
    ///
    /// Forking does not consume from the parent, and the same label always
    /// yields the same child seed.
    pub fn fork(&self, label: &str) -> Self {
        Self::seeded(derive_seed(self.seed, label))
    }

    fn face(&mut self) -> i32 {
        self.script
            .pop_front()
            .unwrap_or_else(|| self.rng.random_range(1..=D20))
    }

    /// Roll a d20, add `modifier`, and clamp into `[floor, ceiling]`.
    ///
    /// An inverted range is swapped, so the result is always inside it.
    pub fn roll_bounded(&mut self, modifier: i32, floor: i32, ceiling: i32) -> i32 {
        let (lo, hi) = if floor <= ceiling {
            (floor, ceiling)
        } else {
            (ceiling, floor)
        };
        self.face().saturating_add(modifier).clamp(lo, hi)
    }

    /// Roll a d20 plus `modifier`, clamped to `[1, 20]`.
    pub fn roll_d20(&mut self, modifier: i32) -> i32 {
        self.roll_bounded(modifier, 1, D20)
    }

    /// Roll for both sides; the attacker rolls first.
    pub fn contested_roll(&mut self, attacker_modifier: i32, defender_modifier: i32) -> ContestedRoll {
        let attacker_roll = self.roll_d20(attacker_modifier);
        let defender_roll = self.roll_d20(defender_modifier);
        let outcome = match attacker_roll.cmp(&defender_roll) {
            core::cmp::Ordering::Greater => ContestOutcome::Attacker,
            core::cmp::Ordering::Less => ContestOutcome::Defender,
            core::cmp::Ordering::Equal => ContestOutcome::Draw,
        };
        ContestedRoll {
            attacker_roll,
            defender_roll,
            outcome,
        }
    }

    /// `true` with probability `percent / 100`.
    ///
    /// Never fires at or below 0 and always fires at or above 100; neither
    /// extreme consumes randomness.
    pub fn trigger_by_chance(&mut self, percent: i32) -> bool {
        if percent <= 0 {
            return false;
        }
        if percent >= 100 {
            return true;
        }
        self.rng.random_range(0..100) < percent
    }

    /// Uniform index in `0..len`, or `None` for an empty range.
    pub fn pick_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.rng.random_range(0..len))
    }
}

/// splitmix64 over the parent seed mixed with an FNV-1a hash of the label.
fn derive_seed(seed: u64, label: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in label.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    let mut z = (seed ^ hash).wrapping_add(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
