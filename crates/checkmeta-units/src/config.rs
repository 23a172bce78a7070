//! Tunables for unit resources, progression, morale, end-of-round upkeep,
//! and roster limits.
//!
//! These are sections of the matchday configuration file; the core crate
//! embeds them in its top-level config. Every field has a default so a
//! partial YAML document is valid.

use serde::{Deserialize, Serialize};

use checkmeta_types::{BoundedResource, Resources};

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Clamp range and starting value for one bounded resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceBounds {
    /// Value a fresh unit starts with.
    pub initial: i32,
    /// Lower bound (inclusive).
    pub min: i32,
    /// Upper bound (inclusive).
    pub max: i32,
}

impl ResourceBounds {
    /// Build a clamped resource from these bounds.
    pub fn to_resource(self) -> BoundedResource {
        BoundedResource::new(self.initial, self.min, self.max)
    }
}

/// Resource ranges and damage spill-over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Hit points range.
    #[serde(default = "default_hit_points")]
    pub hit_points: ResourceBounds,

    /// Stamina range.
    #[serde(default = "default_stamina")]
    pub stamina: ResourceBounds,

    /// Morale range.
    #[serde(default = "default_morale")]
    pub morale: ResourceBounds,

    /// Percentage of damage beyond remaining hit points that is taken
    /// from stamina instead (default: 40).
    #[serde(default = "default_stamina_overflow_pct")]
    pub stamina_overflow_pct: i32,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            hit_points: default_hit_points(),
            stamina: default_stamina(),
            morale: default_morale(),
            stamina_overflow_pct: default_stamina_overflow_pct(),
        }
    }
}

impl ResourceConfig {
    /// Fresh resources for a unit entering the matchday.
    pub fn initial_resources(&self) -> Resources {
        Resources {
            hit_points: self.hit_points.to_resource(),
            stamina: self.stamina.to_resource(),
            morale: self.morale.to_resource(),
        }
    }
}

// ---------------------------------------------------------------------------
// Progression
// ---------------------------------------------------------------------------

/// Experience awards and level thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressionConfig {
    /// XP for a won board (default: 50).
    #[serde(default = "default_xp_win")]
    pub xp_win: u32,

    /// XP for a drawn board (default: 20).
    #[serde(default = "default_xp_draw")]
    pub xp_draw: u32,

    /// XP for any other completed board (default: 10).
    #[serde(default = "default_xp_other")]
    pub xp_other: u32,

    /// XP for giving an assist (default: 5).
    #[serde(default = "default_xp_assist")]
    pub xp_assist: u32,

    /// XP for knocking out an opponent (default: 15).
    #[serde(default = "default_xp_takedown")]
    pub xp_takedown: u32,

    /// Minimum XP for each level, starting at level 0.
    #[serde(default = "default_level_thresholds")]
    pub level_thresholds: Vec<u32>,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_win: default_xp_win(),
            xp_draw: default_xp_draw(),
            xp_other: default_xp_other(),
            xp_assist: default_xp_assist(),
            xp_takedown: default_xp_takedown(),
            level_thresholds: default_level_thresholds(),
        }
    }
}

impl ProgressionConfig {
    /// Level reached with `xp` experience.
    ///
    /// Level N is the highest N whose threshold is `<= xp`. An empty
    /// threshold list keeps everyone at level 0.
    pub fn level_for(&self, xp: u32) -> u32 {
        let reached = self.level_thresholds.iter().filter(|t| **t <= xp).count();
        u32::try_from(reached.saturating_sub(1)).unwrap_or(u32::MAX)
    }
}

// ---------------------------------------------------------------------------
// Morale
// ---------------------------------------------------------------------------

/// Morale swings applied by the morale subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoraleConfig {
    /// Morale change on a won board (default: +10).
    #[serde(default = "default_morale_win")]
    pub win: i32,

    /// Morale change on a lost board (default: -5).
    #[serde(default = "default_morale_loss")]
    pub loss: i32,

    /// Morale change for giving an assist (default: +2).
    #[serde(default = "default_morale_assist")]
    pub assist: i32,

    /// Morale change when a teammate is knocked out (default: -5).
    #[serde(default = "default_morale_teammate_down")]
    pub teammate_knocked_out: i32,
}

impl Default for MoraleConfig {
    fn default() -> Self {
        Self {
            win: default_morale_win(),
            loss: default_morale_loss(),
            assist: default_morale_assist(),
            teammate_knocked_out: default_morale_teammate_down(),
        }
    }
}

// ---------------------------------------------------------------------------
// End of round
// ---------------------------------------------------------------------------

/// Stamina upkeep applied to every active unit when a turn ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    /// Stamina drained per round before the multiplier (default: 5).
    #[serde(default = "default_base_stamina_decay")]
    pub base_stamina_decay: i32,

    /// Multiplier on the base decay, in percent (default: 115).
    #[serde(default = "default_stamina_decay_multiplier_pct")]
    pub stamina_decay_multiplier_pct: i32,

    /// Flat stamina regained per round after decay (default: 0).
    #[serde(default)]
    pub stamina_recovery: i32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            base_stamina_decay: default_base_stamina_decay(),
            stamina_decay_multiplier_pct: default_stamina_decay_multiplier_pct(),
            stamina_recovery: 0,
        }
    }
}

impl RoundConfig {
    /// Effective decay per round: base times multiplier, rounded half up,
    /// never negative.
    pub fn stamina_decay(&self) -> i32 {
        self.base_stamina_decay
            .saturating_mul(self.stamina_decay_multiplier_pct)
            .saturating_add(50)
            .checked_div(100)
            .unwrap_or(0)
            .max(0)
    }

    /// Recovery per round, never negative.
    pub fn stamina_recovery(&self) -> i32 {
        self.stamina_recovery.max(0)
    }
}

// ---------------------------------------------------------------------------
// Roster
// ---------------------------------------------------------------------------

/// Limits applied when units are registered for a matchday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Maximum traits per unit; extras are dropped (default: 3).
    #[serde(default = "default_max_traits")]
    pub max_traits: usize,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            max_traits: default_max_traits(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_hit_points() -> ResourceBounds {
    ResourceBounds {
        initial: 100,
        min: 0,
        max: 100,
    }
}

const fn default_stamina() -> ResourceBounds {
    ResourceBounds {
        initial: 100,
        min: 0,
        max: 100,
    }
}

const fn default_morale() -> ResourceBounds {
    ResourceBounds {
        initial: 50,
        min: 0,
        max: 100,
    }
}

const fn default_stamina_overflow_pct() -> i32 {
    40
}

const fn default_xp_win() -> u32 {
    50
}

const fn default_xp_draw() -> u32 {
    20
}

const fn default_xp_other() -> u32 {
    10
}

const fn default_xp_assist() -> u32 {
    5
}

const fn default_xp_takedown() -> u32 {
    15
}

fn default_level_thresholds() -> Vec<u32> {
    vec![0, 50, 120, 200, 300, 450]
}

const fn default_morale_win() -> i32 {
    10
}

const fn default_morale_loss() -> i32 {
    -5
}

const fn default_morale_assist() -> i32 {
    2
}

const fn default_morale_teammate_down() -> i32 {
    -5
}

const fn default_base_stamina_decay() -> i32 {
    5
}

const fn default_stamina_decay_multiplier_pct() -> i32 {
    115
}

const fn default_max_traits() -> usize {
    3
}
