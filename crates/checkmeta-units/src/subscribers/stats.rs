//! rStat accumulation from resolution events.
//!
//! | Event | Credit |
//! |---|---|
//! | `damage_dealt` | source `DD` += amount, target `DS` += amount, unless the target is already knocked out |
//! | `assist_given` | assister `AST` += 1 |
//! | `healing_applied` | healer `HLG` += amount |
//! | `unit_knocked_out` | knocker `OTD` += 1, knocked-out unit `LLS` += 1 |
//! | `trait_activated` | the trait's `stat_code` += 1 |
//!
//! Codes are recorded as-is; the validator decides at completion which of
//! them the unit's division may keep.
//!
//! Register this subscriber ahead of the vitals tracker: damage is then
//! credited before it lands, so the knockout blow counts and anything
//! after it, which vitals ignores, does not.

use checkmeta_events::{DispatchContext, Subscriber, SubscriberError};
use checkmeta_types::{Event, EventKind, EventPayload, UnitId};

/// Credits statistic codes on units as events arrive.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatTracker;

fn credit(
    ctx: &mut DispatchContext<'_>,
    unit: &UnitId,
    code: &str,
    amount: i64,
) -> Result<(), SubscriberError> {
    ctx.unit_mut(unit)?.add_stat(code, amount);
    Ok(())
}

impl Subscriber for StatTracker {
    fn name(&self) -> &str {
        "stats"
    }

    fn interests(&self) -> Vec<EventKind> {
        vec![
            EventKind::DamageDealt,
            EventKind::AssistGiven,
            EventKind::HealingApplied,
            EventKind::UnitKnockedOut,
            EventKind::TraitActivated,
        ]
    }

    fn handle(
        &mut self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<(), SubscriberError> {
        match &event.payload {
            EventPayload::DamageDealt {
                source,
                target,
                amount,
                ..
            } => {
                if ctx.units().get(target).is_some_and(|u| u.knocked_out) {
                    return Ok(());
                }
                let amount = i64::from((*amount).max(0));
                credit(ctx, source, "DD", amount)?;
                credit(ctx, target, "DS", amount)
            }
            EventPayload::AssistGiven { assister, .. } => credit(ctx, assister, "AST", 1),
            EventPayload::HealingApplied { healer, amount, .. } => {
                credit(ctx, healer, "HLG", i64::from((*amount).max(0)))
            }
            EventPayload::UnitKnockedOut { unit, by } => {
                if let Some(by) = by {
                    credit(ctx, by, "OTD", 1)?;
                }
                credit(ctx, unit, "LLS", 1)
            }
            EventPayload::TraitActivated {
                unit,
                stat_code: Some(code),
                ..
            } => credit(ctx, unit, code, 1),
            _ => Ok(()),
        }
    }
}
