//! Convergence Resolver.
//!
//! Turns a [`ConvergenceRecord`] into events. The resolver reads the unit
//! roster and the trait catalog but never mutates either: every effect it
//! decides on is returned as an [`EventPayload`] for the bus to apply.
//!
//! Per record:
//!
//! 1. `convergence_triggered` with the full participant list.
//! 2. For each participant, every catalog trait eligible for the record's
//!    classification and not on cooldown is rolled against its chance;
//!    each hit emits `trait_activated` and contributes to that unit's
//!    bonuses.
//! 3. Each unordered pair is resolved once with a contested roll, reported
//!    as `contested_roll`. The lexicographically smaller identifier
//!    attacks. Teammates produce `assist_given` (plus `healing_applied`
//!    when the assister has an active heal trait); opponents produce
//!    `damage_dealt`. A draw stops at the roll event.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use checkmeta_types::{
    BoardOutcome, ConvergenceRecord, EventPayload, TeamId, TraitFormula, UnitId, UnitRoster,
};
use checkmeta_units::TraitCatalog;

use crate::config::ResolutionConfig;
use crate::dice::{ContestOutcome, Dice};

/// Bonuses a participant carries into its pairings for one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct TraitProfile {
    roll_bonus: i32,
    damage_bonus: i32,
    damage_reduction: i32,
    heal: i32,
}

impl TraitProfile {
    fn absorb(&mut self, formula: TraitFormula, magnitude: i32) {
        let slot = match formula {
            TraitFormula::RollBonus => &mut self.roll_bonus,
            TraitFormula::DamageBonus => &mut self.damage_bonus,
            TraitFormula::DamageReduction => &mut self.damage_reduction,
            TraitFormula::Heal => &mut self.heal,
        };
        *slot = slot.saturating_add(magnitude);
    }
}

/// Resolves convergence records into events.
#[derive(Debug, Clone)]
pub struct ConvergenceResolver {
    catalog: Arc<TraitCatalog>,
    config: ResolutionConfig,
    dice: Dice,
}

impl ConvergenceResolver {
    /// Create a resolver drawing chance from `dice`.
    pub const fn new(catalog: Arc<TraitCatalog>, config: ResolutionConfig, dice: Dice) -> Self {
        Self {
            catalog,
            config,
            dice,
        }
    }

    /// The trait catalog in use.
    pub fn catalog(&self) -> &TraitCatalog {
        &self.catalog
    }

    /// Events for one record, in emission order.
    pub fn resolve(&mut self, record: &ConvergenceRecord, units: &UnitRoster) -> Vec<EventPayload> {
        let mut events = vec![EventPayload::ConvergenceTriggered {
            notation: record.notation().to_owned(),
            participants: record.participants().to_vec(),
            classification: record.classification(),
        }];

        let mut profiles: BTreeMap<&UnitId, TraitProfile> = BTreeMap::new();
        for unit_id in record.participants() {
            let profile = self.activate_traits(record, unit_id, units, &mut events);
            profiles.insert(unit_id, profile);
        }

        for (attacker, defender) in record.pairs() {
            let a = profiles.get(attacker).copied().unwrap_or_default();
            let d = profiles.get(defender).copied().unwrap_or_default();
            let attacker_mod = self.roll_modifier(units, attacker, a);
            let defender_mod = self.roll_modifier(units, defender, d);
            let roll = self.dice.contested_roll(attacker_mod, defender_mod);
            let sides = match roll.outcome {
                ContestOutcome::Attacker => Some((attacker, defender, a, d)),
                ContestOutcome::Defender => Some((defender, attacker, d, a)),
                ContestOutcome::Draw => None,
            };
            events.push(EventPayload::ContestedRoll {
                attacker: attacker.clone(),
                defender: defender.clone(),
                notation: record.notation().to_owned(),
                attacker_roll: roll.attacker_roll,
                defender_roll: roll.defender_roll,
                winner: sides.map(|(winner, ..)| winner.clone()),
            });
            let Some((winner, loser, w, l)) = sides else {
                continue;
            };

            if team_of(units, winner) == team_of(units, loser) {
                events.push(EventPayload::AssistGiven {
                    assister: winner.clone(),
                    recipient: loser.clone(),
                    notation: record.notation().to_owned(),
                    margin: roll.margin(),
                });
                if w.heal > 0 {
                    events.push(EventPayload::HealingApplied {
                        healer: winner.clone(),
                        target: loser.clone(),
                        amount: w.heal,
                    });
                }
            } else {
                events.push(EventPayload::DamageDealt {
                    source: winner.clone(),
                    target: loser.clone(),
                    amount: self.damage(roll.margin(), w, l),
                    notation: record.notation().to_owned(),
                });
            }
        }

        debug!(
            turn = record.turn(),
            notation = record.notation(),
            participants = record.participants().len(),
            events = events.len(),
            "Convergence resolved"
        );
        events
    }

    /// The `board_completed` event for a board that just became terminal.
    pub fn board_completed(unit: &UnitId, outcome: BoardOutcome, turns: u32) -> EventPayload {
        EventPayload::BoardCompleted {
            unit: unit.clone(),
            outcome,
            turns,
        }
    }

    fn activate_traits(
        &mut self,
        record: &ConvergenceRecord,
        unit_id: &UnitId,
        units: &UnitRoster,
        events: &mut Vec<EventPayload>,
    ) -> TraitProfile {
        let mut profile = TraitProfile::default();
        let Some(unit) = units.get(unit_id) else {
            return profile;
        };
        for (trait_id, effect) in self.catalog.eligible(&unit.traits, record.classification()) {
            if !unit.trait_ready(trait_id) {
                debug!(unit = %unit_id, trait_id, "trait on cooldown");
                continue;
            }
            if !self.dice.trigger_by_chance(effect.chance) {
                continue;
            }
            profile.absorb(effect.formula, effect.magnitude);
            events.push(EventPayload::TraitActivated {
                unit: unit_id.clone(),
                trait_id: trait_id.to_owned(),
                formula: effect.formula,
                magnitude: effect.magnitude,
                stat_code: effect.stat_code.clone(),
                cooldown: effect.cooldown,
            });
        }
        profile
    }

    fn roll_modifier(&self, units: &UnitRoster, unit: &UnitId, profile: TraitProfile) -> i32 {
        let morale = units
            .get(unit)
            .map_or(self.config.morale_baseline, |u| u.resources.morale.value());
        let morale_mod = morale
            .saturating_sub(self.config.morale_baseline)
            .checked_div(self.config.morale_modifier_divisor)
            .unwrap_or(0);
        profile.roll_bonus.saturating_add(morale_mod)
    }

    fn damage(&self, margin: i32, winner: TraitProfile, loser: TraitProfile) -> i32 {
        let from_margin = margin.checked_div(self.config.margin_divisor).unwrap_or(0);
        self.config
            .base_damage
            .saturating_add(from_margin)
            .saturating_add(winner.damage_bonus)
            .saturating_sub(loser.damage_reduction)
            .max(self.config.min_damage)
    }
}

fn team_of(units: &UnitRoster, unit: &UnitId) -> TeamId {
    units
        .team_of(unit)
        .cloned()
        .unwrap_or_else(|| unit.team_prefix())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use checkmeta_types::{Division, Unit};

    use super::*;

    fn roster(units: Vec<Unit>) -> UnitRoster {
        let mut roster = UnitRoster::new();
        for unit in units {
            roster.insert(unit).unwrap();
        }
        roster
    }

    fn unit(id: &str, traits: &[&str]) -> Unit {
        let team = UnitId::from(id).team_prefix();
        Unit::new(id, team, "FL", Division::Ops).with_traits(traits.iter().copied())
    }

    fn record(ids: &[&str], notation: &str) -> ConvergenceRecord {
        ConvergenceRecord::new(
            1,
            notation,
            ids.iter().map(|id| {
                let id = UnitId::from(*id);
                let team = id.team_prefix();
                (id, team)
            }),
        )
        .unwrap()
    }

    fn resolver(faces: &[i32]) -> ConvergenceResolver {
        ConvergenceResolver::new(
            Arc::new(TraitCatalog::builtin()),
            ResolutionConfig::default(),
            Dice::scripted(faces.iter().copied(), 0),
        )
    }

    #[test]
    fn ally_pair_assist_goes_to_higher_roll() {
        let units = roster(vec![unit("A1", &[]), unit("A2", &[])]);
        let events = resolver(&[15, 9]).resolve(&record(&["A1", "A2"], "Nf3"), &units);

        assert_eq!(events.len(), 3);
        assert!(matches!(
            &events[0],
            EventPayload::ConvergenceTriggered { participants, .. } if participants.len() == 2
        ));
        assert_eq!(
            events[1],
            EventPayload::ContestedRoll {
                attacker: UnitId::from("A1"),
                defender: UnitId::from("A2"),
                notation: "Nf3".to_owned(),
                attacker_roll: 15,
                defender_roll: 9,
                winner: Some(UnitId::from("A1")),
            }
        );
        assert_eq!(
            events[2],
            EventPayload::AssistGiven {
                assister: UnitId::from("A1"),
                recipient: UnitId::from("A2"),
                notation: "Nf3".to_owned(),
                margin: 6,
            }
        );

        let events = resolver(&[3, 11]).resolve(&record(&["A1", "A2"], "Nf3"), &units);
        assert!(matches!(
            &events[2],
            EventPayload::AssistGiven { assister, .. } if assister.as_str() == "A2"
        ));
    }

    #[test]
    fn tie_is_reported_without_assist() {
        let units = roster(vec![unit("A1", &[]), unit("A2", &[])]);
        let events = resolver(&[10, 10]).resolve(&record(&["A1", "A2"], "e4"), &units);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind(), checkmeta_types::EventKind::ConvergenceTriggered);
        assert!(matches!(
            &events[1],
            EventPayload::ContestedRoll {
                attacker_roll: 10,
                defender_roll: 10,
                winner: None,
                ..
            }
        ));
    }

    #[test]
    fn enemy_pair_deals_margin_scaled_damage() {
        let units = roster(vec![unit("A1", &[]), unit("B1", &[])]);
        let events = resolver(&[15, 9]).resolve(&record(&["A1", "B1"], "e4"), &units);
        assert_eq!(
            events[2],
            EventPayload::DamageDealt {
                source: UnitId::from("A1"),
                target: UnitId::from("B1"),
                amount: 9,
                notation: "e4".to_owned(),
            }
        );
    }

    #[test]
    fn traits_fire_and_adjust_damage() {
        let units = roster(vec![unit("A1", &["strength"]), unit("B1", &["armor", "command"])]);
        let events = resolver(&[15, 9]).resolve(&record(&["A1", "B1"], "e4"), &units);

        let activated: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                EventPayload::TraitActivated { unit, trait_id, .. } => {
                    Some((unit.as_str(), trait_id.as_str()))
                }
                _ => None,
            })
            .collect();
        // command only triggers on ally convergences.
        assert_eq!(activated, vec![("A1", "strength"), ("B1", "armor")]);
        assert!(matches!(
            events.last(),
            Some(EventPayload::DamageDealt { amount: 9, .. })
        ));
    }

    #[test]
    fn damage_never_drops_below_floor() {
        let units = roster(vec![unit("A1", &[]), unit("B1", &[])]);
        let config = ResolutionConfig {
            base_damage: -50,
            ..ResolutionConfig::default()
        };
        let mut resolver = ConvergenceResolver::new(
            Arc::new(TraitCatalog::builtin()),
            config,
            Dice::scripted([2, 20], 0),
        );
        let events = resolver.resolve(&record(&["A1", "B1"], "e4"), &units);
        assert!(matches!(
            &events[2],
            EventPayload::DamageDealt { source, amount: 1, .. } if source.as_str() == "B1"
        ));
    }

    #[test]
    fn heal_trait_follows_assist() {
        let units = roster(vec![unit("A1", &["regenerative_core"]), unit("A2", &[])]);
        let events = resolver(&[12, 4]).resolve(&record(&["A1", "A2"], "d4"), &units);
        assert!(matches!(events[1], EventPayload::TraitActivated { .. }));
        assert!(matches!(events[2], EventPayload::ContestedRoll { .. }));
        assert!(matches!(events[3], EventPayload::AssistGiven { .. }));
        assert_eq!(
            events[4],
            EventPayload::HealingApplied {
                healer: UnitId::from("A1"),
                target: UnitId::from("A2"),
                amount: 4,
            }
        );
    }

    #[test]
    fn morale_shifts_the_roll() {
        let mut high = unit("A1", &[]);
        high.resources.morale.set(100);
        let units = roster(vec![high, unit("B1", &[])]);
        let events = resolver(&[10, 10]).resolve(&record(&["A1", "B1"], "e4"), &units);
        assert!(matches!(
            &events[1],
            EventPayload::ContestedRoll { attacker_roll, defender_roll: 10, .. } if *attacker_roll > 10
        ));
        assert!(matches!(
            &events[2],
            EventPayload::DamageDealt { source, .. } if source.as_str() == "A1"
        ));
    }

    #[test]
    fn every_pair_is_resolved_once() {
        use checkmeta_types::EventKind::{
            AssistGiven, ContestedRoll, ConvergenceTriggered, DamageDealt,
        };

        let units = roster(vec![unit("A1", &[]), unit("A2", &[]), unit("B1", &[])]);
        let events =
            resolver(&[20, 1, 20, 1, 20, 1]).resolve(&record(&["A1", "A2", "B1"], "e4"), &units);
        let kinds: Vec<_> = events.iter().map(EventPayload::kind).collect();
        assert_eq!(
            kinds,
            vec![
                ConvergenceTriggered,
                ContestedRoll,
                AssistGiven,
                ContestedRoll,
                DamageDealt,
                ContestedRoll,
                DamageDealt,
            ]
        );
    }

    #[test]
    fn traits_on_cooldown_stay_silent() {
        let mut tired = unit("A1", &["strength"]);
        tired.cooldowns.insert("strength".to_owned(), 2);
        let units = roster(vec![tired, unit("B1", &[])]);
        let events = resolver(&[15, 9]).resolve(&record(&["A1", "B1"], "e4"), &units);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, EventPayload::TraitActivated { .. }))
        );
        assert!(matches!(
            events.last(),
            Some(EventPayload::DamageDealt { amount: 9, .. })
        ));
    }

    #[test]
    fn activation_carries_catalog_cooldown() {
        let units = roster(vec![unit("A1", &["regenerative_core"]), unit("A2", &[])]);
        let events = resolver(&[12, 4]).resolve(&record(&["A1", "A2"], "d4"), &units);
        let expected = TraitCatalog::builtin()
            .get("regenerative_core")
            .unwrap()
            .cooldown;
        assert!(expected > 0);
        assert!(events.iter().any(|e| matches!(
            e,
            EventPayload::TraitActivated { trait_id, cooldown, .. }
                if trait_id == "regenerative_core" && *cooldown == expected
        )));
    }

    #[test]
    fn resolution_is_reproducible_for_a_seed() {
        let units = roster(vec![
            unit("A1", &["genius", "leadership"]),
            unit("A2", &["berserker"]),
            unit("B1", &["shield"]),
        ]);
        let rec = record(&["A1", "A2", "B1"], "c4");
        let run = |seed| {
            ConvergenceResolver::new(
                Arc::new(TraitCatalog::builtin()),
                ResolutionConfig::default(),
                Dice::seeded(seed),
            )
            .resolve(&rec, &units)
        };
        assert_eq!(run(5), run(5));
    }

    #[test]
    fn board_completed_payload() {
        assert_eq!(
            ConvergenceResolver::board_completed(&UnitId::from("A1"), BoardOutcome::Won, 12),
            EventPayload::BoardCompleted {
                unit: UnitId::from("A1"),
                outcome: BoardOutcome::Won,
                turns: 12,
            }
        );
    }
}
