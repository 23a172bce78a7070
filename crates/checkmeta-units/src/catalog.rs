//! Trait/effect catalog: what each trait identifier does during
//! convergence resolution.
//!
//! The catalog is read-only configuration. It maps a trait identifier to
//! a [`TraitEffect`] describing when the trait may fire (triggers), how
//! likely it is to fire (chance), and what it does (formula and
//! magnitude). Unknown trait identifiers on a unit are simply inert.
//!
//! # YAML format
//!
//! ```yaml
//! traits:
//!   tactical:
//!     type: offensive
//!     triggers: [convergence]
//!     formula: roll_bonus
//!     magnitude: 2
//!     chance: 100
//!     stat_code: FFI
//!     cooldown: 0
//! ```
//!
//! `cooldown` is the number of turns a trait sits out after firing.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use checkmeta_types::{Classification, TraitFormula, TraitTrigger, TraitType};

use crate::error::CatalogError;

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitEffect {
    /// Broad category.
    #[serde(rename = "type")]
    pub trait_type: TraitType,

    /// Convergence classes in which the trait is eligible.
    pub triggers: Vec<TraitTrigger>,

    /// How the magnitude is applied.
    pub formula: TraitFormula,

    /// Size of the effect.
    pub magnitude: i32,

    /// Activation chance in percent (default: 100).
    #[serde(default = "default_chance")]
    pub chance: i32,

    /// Statistic credited each time the trait fires.
    #[serde(default)]
    pub stat_code: Option<String>,

    /// Turns the trait is unavailable after firing (default: 0).
    #[serde(default)]
    pub cooldown: u32,
}

impl TraitEffect {
    /// Whether the trait is eligible for a convergence of this class.
    pub fn applies_to(&self, classification: Classification) -> bool {
        self.triggers.iter().any(|t| t.matches(classification))
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    #[serde(default)]
    traits: BTreeMap<String, TraitEffect>,
}

/// Mapping of trait identifier to effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraitCatalog {
    entries: BTreeMap<String, TraitEffect>,
}

impl TraitCatalog {
    /// An empty catalog; every trait is inert.
    pub const fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Load a catalog from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read,
    /// [`CatalogError::Yaml`] if it is not valid YAML, or
    /// [`CatalogError::Invalid`] if an entry is unusable.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse a catalog from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Yaml`] for malformed YAML and
    /// [`CatalogError::Invalid`] for an entry with no triggers or a chance
    /// outside `0..=100`.
    pub fn parse(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yml::from_str(yaml)?;
        for (id, effect) in &file.traits {
            if effect.triggers.is_empty() {
                return Err(CatalogError::Invalid {
                    entry: id.clone(),
                    reason: String::from("no triggers declared"),
                });
            }
            if !(0..=100).contains(&effect.chance) {
                return Err(CatalogError::Invalid {
                    entry: id.clone(),
                    reason: format!("chance {} outside 0..=100", effect.chance),
                });
            }
        }
        Ok(Self {
            entries: file.traits,
        })
    }

    /// The catalog shipped with the engine.
    pub fn builtin() -> Self {
        use TraitFormula::{DamageBonus, DamageReduction, Heal, RollBonus};
        use TraitTrigger::{AllyConvergence, Convergence, EnemyConvergence};
        use TraitType::{Defensive, Offensive, Support, Utility};

        type Row = (&'static str, TraitType, &'static [TraitTrigger], TraitFormula, i32, i32, Option<&'static str>, u32);
        let rows: [Row; 12] = [
            ("tactical", Utility, &[Convergence], RollBonus, 2, 100, Some("FFI"), 0),
            ("leadership", Support, &[AllyConvergence], Heal, 5, 75, Some("LVS"), 1),
            ("command", Utility, &[AllyConvergence], RollBonus, 3, 100, None, 0),
            ("agile", Defensive, &[EnemyConvergence], DamageReduction, 2, 80, Some("EVS"), 0),
            ("shield", Defensive, &[EnemyConvergence], DamageReduction, 4, 60, Some("CTT"), 1),
            ("armor", Defensive, &[EnemyConvergence], DamageReduction, 3, 100, None, 0),
            ("strength", Offensive, &[EnemyConvergence], DamageBonus, 3, 100, Some("KNB"), 0),
            ("berserker", Offensive, &[EnemyConvergence], DamageBonus, 6, 50, Some("BRXo"), 3),
            ("genius", Utility, &[Convergence], RollBonus, 3, 70, Some("MBi"), 0),
            ("stealth", Offensive, &[EnemyConvergence], DamageBonus, 2, 100, Some("INFi"), 0),
            ("telepathy", Support, &[AllyConvergence], RollBonus, 2, 100, Some("RSPi"), 0),
            ("regenerative_core", Support, &[AllyConvergence], Heal, 4, 100, None, 2),
        ];

        let entries = rows
            .into_iter()
            .map(|(id, trait_type, triggers, formula, magnitude, chance, stat, cooldown)| {
                (
                    id.to_owned(),
                    TraitEffect {
                        trait_type,
                        triggers: triggers.to_vec(),
                        formula,
                        magnitude,
                        chance,
                        stat_code: stat.map(str::to_owned),
                        cooldown,
                    },
                )
            })
            .collect();
        Self { entries }
    }

    /// Look up a trait.
    pub fn get(&self, trait_id: &str) -> Option<&TraitEffect> {
        self.entries.get(trait_id)
    }

    /// Add or replace an entry.
    pub fn insert(&mut self, trait_id: impl Into<String>, effect: TraitEffect) {
        self.entries.insert(trait_id.into(), effect);
    }

    /// Known trait identifiers, sorted.
    pub fn trait_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// The unit's traits that are eligible for a convergence of this
    /// class, in the unit's trait order. Unknown identifiers are skipped.
    pub fn eligible<'a>(
        &'a self,
        traits: &'a [String],
        classification: Classification,
    ) -> impl Iterator<Item = (&'a str, &'a TraitEffect)> + 'a {
        traits.iter().filter_map(move |id| {
            self.entries
                .get(id)
                .filter(|effect| effect.applies_to(classification))
                .map(|effect| (id.as_str(), effect))
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

const fn default_chance() -> i32 {
    100
}
