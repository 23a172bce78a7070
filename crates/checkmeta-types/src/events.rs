//! Typed events exchanged over the matchday event bus.
//!
//! An [`Event`] is an immutable message: a bus-assigned sequence number,
//! the turn it belongs to, and a typed [`EventPayload`]. The payload
//! variant determines the [`EventKind`] used for subscription routing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::{BoardOutcome, Classification, TraitFormula};
use crate::ids::UnitId;

/// Routing key for subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A convergence record was resolved.
    ConvergenceTriggered,
    /// Two participants of a convergence rolled against each other.
    ContestedRoll,
    /// One unit assisted a teammate.
    AssistGiven,
    /// One unit damaged an opponent.
    DamageDealt,
    /// One unit healed a teammate.
    HealingApplied,
    /// A trait fired during resolution.
    TraitActivated,
    /// A unit's hit points and stamina were both depleted.
    UnitKnockedOut,
    /// A board reached its terminal state.
    BoardCompleted,
    /// A unit earned experience.
    ExperienceGained,
    /// A unit crossed a level threshold.
    LevelUp,
    /// A unit's morale moved.
    MoraleChanged,
    /// A turn's resolution finished for the listed units.
    RoundEnded,
    /// End-of-round stamina decay and recovery were applied.
    StaminaUpdated,
    /// A trait's cooldown ran out.
    TraitReady,
}

impl EventKind {
    /// Every kind, in declaration order.
    pub const ALL: [Self; 14] = [
        Self::ConvergenceTriggered,
        Self::ContestedRoll,
        Self::AssistGiven,
        Self::DamageDealt,
        Self::HealingApplied,
        Self::TraitActivated,
        Self::UnitKnockedOut,
        Self::BoardCompleted,
        Self::ExperienceGained,
        Self::LevelUp,
        Self::MoraleChanged,
        Self::RoundEnded,
        Self::StaminaUpdated,
        Self::TraitReady,
    ];

    /// The `snake_case` tag used in logs and serialized payloads.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConvergenceTriggered => "convergence_triggered",
            Self::ContestedRoll => "contested_roll",
            Self::AssistGiven => "assist_given",
            Self::DamageDealt => "damage_dealt",
            Self::HealingApplied => "healing_applied",
            Self::TraitActivated => "trait_activated",
            Self::UnitKnockedOut => "unit_knocked_out",
            Self::BoardCompleted => "board_completed",
            Self::ExperienceGained => "experience_gained",
            Self::LevelUp => "level_up",
            Self::MoraleChanged => "morale_changed",
            Self::RoundEnded => "round_ended",
            Self::StaminaUpdated => "stamina_updated",
            Self::TraitReady => "trait_ready",
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event-specific data. Serialized with a `kind` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventPayload {
    /// A convergence record was resolved.
    ConvergenceTriggered {
        /// Shared move notation.
        notation: String,
        /// Participants in identifier order.
        participants: Vec<UnitId>,
        /// Ally or enemy.
        classification: Classification,
    },
    /// Outcome of one pairwise roll. Emitted for every pair, draws
    /// included, before the assist or damage it leads to.
    ContestedRoll {
        /// Earlier participant in identifier order.
        attacker: UnitId,
        /// Later participant in identifier order.
        defender: UnitId,
        /// Move notation of the convergence.
        notation: String,
        /// Attacker's roll including modifiers.
        attacker_roll: i32,
        /// Defender's roll including modifiers.
        defender_roll: i32,
        /// Higher roller, or `None` on a draw.
        winner: Option<UnitId>,
    },
    /// The assister won the contested roll against a teammate.
    AssistGiven {
        /// Unit with the more favorable roll.
        assister: UnitId,
        /// Teammate being assisted.
        recipient: UnitId,
        /// Move notation of the convergence.
        notation: String,
        /// Roll difference in the assister's favor.
        margin: i32,
    },
    /// The source won the contested roll against an opponent.
    DamageDealt {
        /// Unit dealing damage.
        source: UnitId,
        /// Unit taking damage.
        target: UnitId,
        /// Damage after trait adjustments.
        amount: i32,
        /// Move notation of the convergence.
        notation: String,
    },
    /// A support trait restored a teammate's hit points.
    HealingApplied {
        /// Unit providing the healing.
        healer: UnitId,
        /// Unit being healed.
        target: UnitId,
        /// Hit points requested.
        amount: i32,
    },
    /// A trait fired during resolution.
    TraitActivated {
        /// Unit owning the trait.
        unit: UnitId,
        /// Trait identifier from the catalog.
        trait_id: String,
        /// How the magnitude was applied.
        formula: TraitFormula,
        /// Catalog magnitude.
        magnitude: i32,
        /// Statistic credited for the activation, if the catalog names one.
        stat_code: Option<String>,
        /// Rounds the trait stays unavailable afterwards (0 = none).
        #[serde(default)]
        cooldown: u32,
    },
    /// A unit was knocked out.
    UnitKnockedOut {
        /// Unit that went down.
        unit: UnitId,
        /// Unit whose damage caused it, if known.
        by: Option<UnitId>,
    },
    /// A board reached its terminal state.
    BoardCompleted {
        /// Owning unit.
        unit: UnitId,
        /// How the board ended.
        outcome: BoardOutcome,
        /// Turns completed on the board.
        turns: u32,
    },
    /// A unit earned experience.
    ExperienceGained {
        /// Receiving unit.
        unit: UnitId,
        /// Experience awarded.
        amount: u32,
        /// Total after the award.
        total: u32,
    },
    /// A unit reached a new level.
    LevelUp {
        /// Receiving unit.
        unit: UnitId,
        /// New level.
        level: u32,
    },
    /// A unit's morale moved.
    MoraleChanged {
        /// Affected unit.
        unit: UnitId,
        /// Change actually applied after clamping.
        delta: i32,
        /// Morale after the change.
        value: i32,
    },
    /// End of a turn, after its convergences were resolved and delivered.
    RoundEnded {
        /// Units that moved this turn and are still standing.
        units: Vec<UnitId>,
    },
    /// End-of-round stamina change.
    StaminaUpdated {
        /// Affected unit.
        unit: UnitId,
        /// Stamina before the change.
        previous: i32,
        /// Stamina after the change.
        value: i32,
        /// Decay requested this round.
        decay: i32,
        /// Recovery requested this round.
        recovery: i32,
    },
    /// A trait's cooldown expired; it may fire again from the next turn.
    TraitReady {
        /// Unit owning the trait.
        unit: UnitId,
        /// Trait identifier from the catalog.
        trait_id: String,
    },
}

impl EventPayload {
    /// Routing key for this payload.
    pub const fn kind(&self) -> EventKind {
        match self {
            Self::ConvergenceTriggered { .. } => EventKind::ConvergenceTriggered,
            Self::ContestedRoll { .. } => EventKind::ContestedRoll,
            Self::AssistGiven { .. } => EventKind::AssistGiven,
            Self::DamageDealt { .. } => EventKind::DamageDealt,
            Self::HealingApplied { .. } => EventKind::HealingApplied,
            Self::TraitActivated { .. } => EventKind::TraitActivated,
            Self::UnitKnockedOut { .. } => EventKind::UnitKnockedOut,
            Self::BoardCompleted { .. } => EventKind::BoardCompleted,
            Self::ExperienceGained { .. } => EventKind::ExperienceGained,
            Self::LevelUp { .. } => EventKind::LevelUp,
            Self::MoraleChanged { .. } => EventKind::MoraleChanged,
            Self::RoundEnded { .. } => EventKind::RoundEnded,
            Self::StaminaUpdated { .. } => EventKind::StaminaUpdated,
            Self::TraitReady { .. } => EventKind::TraitReady,
        }
    }
}

/// An immutable message delivered over the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Bus-assigned, strictly increasing within a matchday.
    pub sequence: u64,
    /// Turn the event belongs to (0 before the first turn).
    pub turn: u32,
    /// Typed data.
    pub payload: EventPayload,
}

impl Event {
    /// Routing key.
    pub const fn kind(&self) -> EventKind {
        self.payload.kind()
    }

    /// Payload as a flat map of named fields (without the `kind` tag).
    pub fn fields(&self) -> BTreeMap<String, serde_json::Value> {
        match serde_json::to_value(&self.payload) {
            Ok(serde_json::Value::Object(map)) => {
                map.into_iter().filter(|(key, _)| key != "kind").collect()
            }
            _ => BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_kind_matches_serialized_tag() {
        let payload = EventPayload::AssistGiven {
            assister: UnitId::from("A1"),
            recipient: UnitId::from("A2"),
            notation: String::from("Nf3"),
            margin: 4,
        };
        let value = serde_json::to_value(&payload).ok();
        let tag = value
            .as_ref()
            .and_then(|v| v.get("kind"))
            .and_then(serde_json::Value::as_str);
        assert_eq!(tag, Some(payload.kind().as_str()));
    }

    #[test]
    fn fields_exclude_kind_tag() {
        let event = Event {
            sequence: 1,
            turn: 3,
            payload: EventPayload::LevelUp {
                unit: UnitId::from("B2"),
                level: 2,
            },
        };
        let fields = event.fields();
        assert!(!fields.contains_key("kind"));
        assert_eq!(fields.get("unit"), Some(&serde_json::json!("B2")));
        assert_eq!(fields.get("level"), Some(&serde_json::json!(2)));
    }

    #[test]
    fn drawn_roll_serializes_without_winner() {
        let payload = EventPayload::ContestedRoll {
            attacker: UnitId::from("A1"),
            defender: UnitId::from("B1"),
            notation: String::from("e4"),
            attacker_roll: 7,
            defender_roll: 7,
            winner: None,
        };
        let value = serde_json::to_value(&payload).ok();
        let winner = value.as_ref().and_then(|v| v.get("winner"));
        assert_eq!(winner, Some(&serde_json::Value::Null));
        assert_eq!(payload.kind(), EventKind::ContestedRoll);
    }

    #[test]
    fn trait_activation_without_cooldown_field_still_parses() {
        let json = serde_json::json!({
            "kind": "trait_activated",
            "unit": "A1",
            "trait_id": "strength",
            "formula": "roll_bonus",
            "magnitude": 20,
            "stat_code": null,
        });
        let payload: Option<EventPayload> = serde_json::from_value(json).ok();
        assert!(matches!(
            payload,
            Some(EventPayload::TraitActivated { cooldown: 0, .. })
        ));
    }

    #[test]
    fn all_kinds_listed_once() {
        let mut seen = std::collections::BTreeSet::new();
        for kind in EventKind::ALL {
            assert!(seen.insert(kind));
        }
        assert_eq!(seen.len(), EventKind::ALL.len());
        let tags: std::collections::BTreeSet<&str> =
            EventKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(tags.len(), EventKind::ALL.len());
    }
}
