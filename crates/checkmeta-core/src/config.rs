//! Configuration loading and typed config structures for a matchday.
//!
//! The canonical configuration lives in `checkmeta-config.yaml` at the
//! project root. Every section and field has a default, so an empty file
//! (or no file at all) yields a playable matchday.

use std::path::Path;

use serde::{Deserialize, Serialize};

use checkmeta_units::{MoraleConfig, ProgressionConfig, ResourceConfig, RosterConfig, RoundConfig};

/// Environment variable overriding `matchday.seed`.
pub const SEED_ENV: &str = "CHECKMETA_SEED";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level matchday configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchdayConfig {
    /// Turn loop settings.
    #[serde(default)]
    pub matchday: MatchdaySettings,

    /// Resource ranges.
    #[serde(default)]
    pub resources: ResourceConfig,

    /// Convergence resolution constants.
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// XP awards and level thresholds.
    #[serde(default)]
    pub progression: ProgressionConfig,

    /// Morale swings.
    #[serde(default)]
    pub morale: MoraleConfig,

    /// End-of-round stamina upkeep.
    #[serde(default)]
    pub round: RoundConfig,

    /// Event bus limits.
    #[serde(default)]
    pub bus: BusConfig,

    /// Roster limits.
    #[serde(default)]
    pub roster: RosterConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MatchdayConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `CHECKMETA_SEED`, if set to an integer, overrides `matchday.seed`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var(SEED_ENV)
            && let Ok(seed) = raw.trim().parse::<u64>()
        {
            self.matchday.seed = seed;
        }
    }
}

/// Turn loop settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchdaySettings {
    /// Seed for every random stream in the matchday.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Turn cap; boards still running are forced to `turn_limit`.
    /// 0 means no cap.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Worker threads for board stepping. 0 uses one per core.
    #[serde(default)]
    pub worker_threads: usize,

    /// Real-time milliseconds between turns in the async runner.
    #[serde(default)]
    pub turn_interval_ms: u64,

    /// Convergences a unit may take part in per matchday. 0 means no cap.
    #[serde(default = "default_max_convergences_per_unit")]
    pub max_convergences_per_unit: u32,
}

impl Default for MatchdaySettings {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            max_turns: default_max_turns(),
            worker_threads: 0,
            turn_interval_ms: 0,
            max_convergences_per_unit: default_max_convergences_per_unit(),
        }
    }
}

/// Constants used by the convergence resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Damage dealt before margin and trait adjustments.
    #[serde(default = "default_base_damage")]
    pub base_damage: i32,

    /// Roll margin is divided by this before being added to damage.
    #[serde(default = "default_margin_divisor")]
    pub margin_divisor: i32,

    /// Damage floor for a won cross-team contest.
    #[serde(default = "default_min_damage")]
    pub min_damage: i32,

    /// Morale at which the roll modifier is zero.
    #[serde(default = "default_morale_baseline")]
    pub morale_baseline: i32,

    /// Morale distance from the baseline per point of roll modifier.
    #[serde(default = "default_morale_modifier_divisor")]
    pub morale_modifier_divisor: i32,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            base_damage: default_base_damage(),
            margin_divisor: default_margin_divisor(),
            min_damage: default_min_damage(),
            morale_baseline: default_morale_baseline(),
            morale_modifier_divisor: default_morale_modifier_divisor(),
        }
    }
}

/// Event bus limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusConfig {
    /// Events published by subscribers during one drain that may be
    /// delivered before further ones are dropped. Events queued before
    /// the drain are always delivered. 0 means no limit.
    #[serde(default = "default_max_cascade")]
    pub max_cascade: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            max_cascade: default_max_cascade(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_max_turns() -> u32 {
    60
}

const fn default_max_convergences_per_unit() -> u32 {
    3
}

const fn default_base_damage() -> i32 {
    6
}

const fn default_margin_divisor() -> i32 {
    2
}

const fn default_min_damage() -> i32 {
    1
}

const fn default_morale_baseline() -> i32 {
    50
}

const fn default_morale_modifier_divisor() -> i32 {
    10
}

const fn default_max_cascade() -> usize {
    10_000
}

fn default_log_level() -> String {
    "info".to_owned()
}
