//! Demo roster spawner for the engine binary.
//!
//! Creates `units_per_team` units for every configured team. Roles rotate
//! through the role table so each team fields both divisions; traits are
//! drawn without replacement from the trait catalog with a dice stream
//! forked from the matchday seed, so the same seed always fields the same
//! roster.

use std::path::PathBuf;

use checkmeta_core::dice::Dice;
use checkmeta_types::Unit;
use checkmeta_units::{ResourceConfig, Role, TraitCatalog};
use serde::Deserialize;
use tracing::info;

use crate::error::EngineError;

// -----------------------------------------------------------------------
// Configuration
// -----------------------------------------------------------------------

/// Driver settings, read from the `engine` section of
/// `checkmeta-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EngineSettings {
    /// Team identifiers. Each must be alphabetic so unit ids keep the
    /// team as their prefix.
    #[serde(default = "default_teams")]
    pub teams: Vec<String>,

    /// Units fielded by each team.
    #[serde(default = "default_units_per_team")]
    pub units_per_team: u32,

    /// Traits drawn for each unit.
    #[serde(default = "default_traits_per_unit")]
    pub traits_per_unit: usize,

    /// Plies after which a book game is scored.
    #[serde(default = "default_game_length")]
    pub game_length: u32,

    /// Optional trait catalog file replacing the built-in catalog.
    #[serde(default)]
    pub trait_catalog: Option<PathBuf>,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            teams: default_teams(),
            units_per_team: default_units_per_team(),
            traits_per_unit: default_traits_per_unit(),
            game_length: default_game_length(),
            trait_catalog: None,
        }
    }
}

impl EngineSettings {
    /// Extract the `engine` section from a full config document.
    ///
    /// A document without the section yields the defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, EngineError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        let raw: serde_yml::Value = serde_yml::from_str(yaml).map_err(|e| EngineError::Settings {
            message: format!("failed to parse config YAML: {e}"),
        })?;
        match raw.get("engine") {
            Some(section) => {
                serde_yml::from_value(section.clone()).map_err(|e| EngineError::Settings {
                    message: format!("failed to parse engine section: {e}"),
                })
            }
            None => Ok(Self::default()),
        }
    }
}

fn default_teams() -> Vec<String> {
    vec![String::from("A"), String::from("B")]
}

const fn default_units_per_team() -> u32 {
    4
}

const fn default_traits_per_unit() -> usize {
    2
}

const fn default_game_length() -> u32 {
    40
}

// -----------------------------------------------------------------------
// Spawning
// -----------------------------------------------------------------------

/// Spawn the demo roster.
///
/// Unit ids are `{team}{n}` with `n` starting at 1. The nth unit of a
/// team takes the nth role of [`Role::ALL`], wrapping around.
///
/// # Errors
///
/// Returns [`EngineError::Roster`] if no teams are configured, a team id
/// is not alphabetic, or a team id repeats.
pub fn spawn_roster(
    settings: &EngineSettings,
    resources: &ResourceConfig,
    catalog: &TraitCatalog,
    dice: &mut Dice,
) -> Result<Vec<Unit>, EngineError> {
    if settings.teams.is_empty() {
        return Err(EngineError::Roster {
            message: String::from("no teams configured"),
        });
    }

    let mut units = Vec::new();
    for (position, team) in settings.teams.iter().enumerate() {
        if team.is_empty() || !team.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(EngineError::Roster {
                message: format!("team id {team:?} must be non-empty and alphabetic"),
            });
        }
        if settings.teams.iter().take(position).any(|t| t == team) {
            return Err(EngineError::Roster {
                message: format!("team id {team:?} is listed twice"),
            });
        }

        for (number, role) in (1..=settings.units_per_team).zip(Role::ALL.iter().cycle()) {
            let traits = draw_traits(catalog, settings.traits_per_unit, dice);
            let unit = Unit::new(format!("{team}{number}"), team.as_str(), role.code(), role.division())
                .with_resources(resources.initial_resources())
                .with_traits(traits);
            units.push(unit);
        }
    }

    info!(
        teams = settings.teams.len(),
        units = units.len(),
        "Demo roster spawned"
    );
    Ok(units)
}

/// Pick up to `count` distinct trait ids from the catalog.
fn draw_traits(catalog: &TraitCatalog, count: usize, dice: &mut Dice) -> Vec<String> {
    let mut available: Vec<&str> = catalog.trait_ids().collect();
    let mut drawn = Vec::with_capacity(count.min(available.len()));
    while drawn.len() < count {
        let Some(index) = dice.pick_index(available.len()) else {
            break;
        };
        if index >= available.len() {
            break;
        }
        drawn.push(available.swap_remove(index).to_owned());
    }
    drawn
}
