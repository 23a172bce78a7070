//! Morale swings.
//!
//! Every applied change is announced with a `morale_changed` event
//! carrying the delta that survived clamping.

use checkmeta_events::{DispatchContext, Subscriber, SubscriberError};
use checkmeta_types::{BoardOutcome, Event, EventKind, EventPayload, UnitId};

use crate::config::MoraleConfig;

/// Adjusts morale on board results, assists, and teammate knockouts.
#[derive(Debug, Clone, Default)]
pub struct MoraleTracker {
    config: MoraleConfig,
}

impl MoraleTracker {
    /// Create a tracker with the given morale deltas.
    pub const fn new(config: MoraleConfig) -> Self {
        Self { config }
    }
}

fn adjust(
    ctx: &mut DispatchContext<'_>,
    unit_id: &UnitId,
    delta: i32,
) -> Result<(), SubscriberError> {
    if delta == 0 {
        return Ok(());
    }
    let unit = ctx.unit_mut(unit_id)?;
    let applied = unit.resources.morale.apply_delta(delta);
    let value = unit.resources.morale.value();
    ctx.publish(EventPayload::MoraleChanged {
        unit: unit_id.clone(),
        delta: applied,
        value,
    });
    Ok(())
}

impl Subscriber for MoraleTracker {
    fn name(&self) -> &str {
        "morale"
    }

    fn interests(&self) -> Vec<EventKind> {
        vec![
            EventKind::BoardCompleted,
            EventKind::AssistGiven,
            EventKind::UnitKnockedOut,
        ]
    }

    fn handle(
        &mut self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<(), SubscriberError> {
        match &event.payload {
            EventPayload::BoardCompleted { unit, outcome, .. } => {
                let delta = match outcome {
                    BoardOutcome::Won => self.config.win,
                    BoardOutcome::Lost => self.config.loss,
                    _ => 0,
                };
                adjust(ctx, unit, delta)
            }
            EventPayload::AssistGiven { assister, .. } => {
                adjust(ctx, assister, self.config.assist)
            }
            EventPayload::UnitKnockedOut { unit, .. } => {
                for teammate in ctx.units().teammates(unit) {
                    adjust(ctx, &teammate, self.config.teammate_knocked_out)?;
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use checkmeta_events::shared;
    use checkmeta_types::UnitRoster;

    use super::*;
    use crate::subscribers::testing::{roster, run};

    fn morale(roster: &UnitRoster, id: &str) -> i32 {
        roster
            .get(&UnitId::from(id))
            .unwrap()
            .resources
            .morale
            .value()
    }

    fn completed(unit: &str, outcome: BoardOutcome) -> EventPayload {
        EventPayload::BoardCompleted {
            unit: UnitId::from(unit),
            outcome,
            turns: 12,
        }
    }

    #[test]
    fn results_move_morale() {
        let mut units = roster();
        run(
            shared(MoraleTracker::default()),
            &mut units,
            vec![
                completed("A1", BoardOutcome::Won),
                completed("B1", BoardOutcome::Lost),
                completed("B2", BoardOutcome::TurnLimit),
            ],
        );
        assert_eq!(morale(&units, "A1"), 60);
        assert_eq!(morale(&units, "B1"), 45);
        assert_eq!(morale(&units, "B2"), 50);
    }

    #[test]
    fn teammates_lose_morale_on_knockout() {
        let mut units = roster();
        let log = run(
            shared(MoraleTracker::default()),
            &mut units,
            vec![EventPayload::UnitKnockedOut {
                unit: UnitId::from("A1"),
                by: Some(UnitId::from("B1")),
            }],
        );
        assert_eq!(morale(&units, "A1"), 50);
        assert_eq!(morale(&units, "A2"), 45);
        assert_eq!(morale(&units, "B1"), 50);
        assert_eq!(
            log.iter()
                .filter(|e| e.kind() == EventKind::MoraleChanged)
                .count(),
            1
        );
    }

    #[test]
    fn reported_delta_is_clamped() {
        let mut units = roster();
        units
            .get_mut(&UnitId::from("A1"))
            .unwrap()
            .resources
            .morale
            .set(96);
        let log = run(
            shared(MoraleTracker::default()),
            &mut units,
            vec![completed("A1", BoardOutcome::Won)],
        );
        let change = log.last().unwrap();
        assert_eq!(
            change.payload,
            EventPayload::MoraleChanged {
                unit: UnitId::from("A1"),
                delta: 4,
                value: 100,
            }
        );
    }

    #[test]
    fn assist_raises_assister() {
        let mut units = roster();
        run(
            shared(MoraleTracker::default()),
            &mut units,
            vec![EventPayload::AssistGiven {
                assister: UnitId::from("A2"),
                recipient: UnitId::from("A1"),
                notation: String::from("Nf3"),
                margin: 3,
            }],
        );
        assert_eq!(morale(&units, "A2"), 52);
        assert_eq!(morale(&units, "A1"), 50);
    }
}
