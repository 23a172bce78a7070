//! Experience awards and level progression.

use tracing::info;

use checkmeta_events::{DispatchContext, Subscriber, SubscriberError};
use checkmeta_types::{BoardOutcome, Event, EventKind, EventPayload, UnitId};

use crate::config::ProgressionConfig;

/// Awards XP for completed boards, assists, and takedowns, and raises
/// levels as thresholds are crossed.
#[derive(Debug, Clone, Default)]
pub struct ExperienceTracker {
    config: ProgressionConfig,
}

impl ExperienceTracker {
    /// Create a tracker with the given progression rules.
    pub const fn new(config: ProgressionConfig) -> Self {
        Self { config }
    }

    fn award(
        &self,
        ctx: &mut DispatchContext<'_>,
        unit_id: &UnitId,
        amount: u32,
    ) -> Result<(), SubscriberError> {
        if amount == 0 {
            return Ok(());
        }
        let unit = ctx.unit_mut(unit_id)?;
        unit.xp = unit.xp.saturating_add(amount);
        let total = unit.xp;
        let level = self.config.level_for(total);
        let leveled = level > unit.level;
        if leveled {
            unit.level = level;
        }

        ctx.publish(EventPayload::ExperienceGained {
            unit: unit_id.clone(),
            amount,
            total,
        });
        if leveled {
            info!(unit = %unit_id, level, xp = total, "Level up");
            ctx.publish(EventPayload::LevelUp {
                unit: unit_id.clone(),
                level,
            });
        }
        Ok(())
    }
}

impl Subscriber for ExperienceTracker {
    fn name(&self) -> &str {
        "experience"
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
                let amount = match outcome {
                    BoardOutcome::Won => self.config.xp_win,
                    BoardOutcome::Drawn => self.config.xp_draw,
                    _ => self.config.xp_other,
                };
                self.award(ctx, unit, amount)
            }
            EventPayload::AssistGiven { assister, .. } => {
                self.award(ctx, assister, self.config.xp_assist)
            }
            EventPayload::UnitKnockedOut { by: Some(by), .. } => {
                self.award(ctx, by, self.config.xp_takedown)
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use checkmeta_events::shared;

    use super::*;
    use crate::subscribers::testing::{roster, run};

    #[test]
    fn win_crosses_first_threshold() {
        let mut units = roster();
        let log = run(
            shared(ExperienceTracker::default()),
            &mut units,
            vec![EventPayload::BoardCompleted {
                unit: UnitId::from("A1"),
                outcome: BoardOutcome::Won,
                turns: 30,
            }],
        );
        let unit = units.get(&UnitId::from("A1")).unwrap();
        assert_eq!(unit.xp, 50);
        assert_eq!(unit.level, 1);
        let kinds: Vec<EventKind> = log.iter().map(Event::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::BoardCompleted,
                EventKind::ExperienceGained,
                EventKind::LevelUp,
            ]
        );
    }

    #[test]
    fn draw_and_other_outcomes() {
        let mut units = roster();
        run(
            shared(ExperienceTracker::default()),
            &mut units,
            vec![
                EventPayload::BoardCompleted {
                    unit: UnitId::from("A1"),
                    outcome: BoardOutcome::Drawn,
                    turns: 10,
                },
                EventPayload::BoardCompleted {
                    unit: UnitId::from("B1"),
                    outcome: BoardOutcome::TurnLimit,
                    turns: 10,
                },
            ],
        );
        assert_eq!(units.get(&UnitId::from("A1")).unwrap().xp, 20);
        assert_eq!(units.get(&UnitId::from("B1")).unwrap().xp, 10);
        assert_eq!(units.get(&UnitId::from("B1")).unwrap().level, 0);
    }

    #[test]
    fn takedown_credits_the_knocker() {
        let mut units = roster();
        run(
            shared(ExperienceTracker::default()),
            &mut units,
            vec![
                EventPayload::UnitKnockedOut {
                    unit: UnitId::from("A1"),
                    by: Some(UnitId::from("B2")),
                },
                EventPayload::UnitKnockedOut {
                    unit: UnitId::from("A2"),
                    by: None,
                },
            ],
        );
        assert_eq!(units.get(&UnitId::from("B2")).unwrap().xp, 15);
        assert_eq!(units.get(&UnitId::from("A1")).unwrap().xp, 0);
    }

    #[test]
    fn assists_accumulate() {
        let mut units = roster();
        let assist = EventPayload::AssistGiven {
            assister: UnitId::from("A1"),
            recipient: UnitId::from("A2"),
            notation: String::from("Nf3"),
            margin: 2,
        };
        run(
            shared(ExperienceTracker::default()),
            &mut units,
            vec![assist.clone(), assist],
        );
        assert_eq!(units.get(&UnitId::from("A1")).unwrap().xp, 10);
    }
}
