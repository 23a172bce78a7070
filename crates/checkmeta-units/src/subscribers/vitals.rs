//! Damage, healing, and knockouts.
//!
//! Damage lands on hit points first. Whatever hit points cannot absorb
//! spills into stamina, scaled by
//! [`ResourceConfig::stamina_overflow_pct`]. A unit whose hit points and
//! stamina are both depleted is knocked out: it ignores further damage and
//! healing, and a `unit_knocked_out` event is queued.

use tracing::info;

use checkmeta_events::{DispatchContext, Subscriber, SubscriberError};
use checkmeta_types::{Event, EventKind, EventPayload, UnitId};

use crate::config::ResourceConfig;

/// Applies `damage_dealt` and `healing_applied` to unit resources.
#[derive(Debug, Clone, Default)]
pub struct VitalsTracker {
    config: ResourceConfig,
}

impl VitalsTracker {
    /// Create a tracker with the given resource configuration.
    pub const fn new(config: ResourceConfig) -> Self {
        Self { config }
    }

    fn apply_damage(
        &self,
        ctx: &mut DispatchContext<'_>,
        source: &UnitId,
        target: &UnitId,
        amount: i32,
    ) -> Result<(), SubscriberError> {
        let overflow_pct = self.config.stamina_overflow_pct;
        let unit = ctx.unit_mut(target)?;
        if unit.knocked_out {
            return Ok(());
        }

        let amount = amount.max(0);
        let hp = &mut unit.resources.hit_points;
        let available = hp.value().saturating_sub(hp.min()).max(0);
        let absorbed = amount.min(available);
        hp.apply_delta(absorbed.saturating_neg());

        let overflow = amount.saturating_sub(absorbed);
        let stamina_loss = overflow
            .saturating_mul(overflow_pct)
            .checked_div(100)
            .unwrap_or(0);
        unit.resources
            .stamina
            .apply_delta(stamina_loss.saturating_neg());

        if unit.resources.hit_points.is_depleted() && unit.resources.stamina.is_depleted() {
            unit.knocked_out = true;
            info!(unit = %target, by = %source, "Unit knocked out");
            ctx.publish(EventPayload::UnitKnockedOut {
                unit: target.clone(),
                by: Some(source.clone()),
            });
        }
        Ok(())
    }
}

impl Subscriber for VitalsTracker {
    fn name(&self) -> &str {
        "vitals"
    }

    fn interests(&self) -> Vec<EventKind> {
        vec![EventKind::DamageDealt, EventKind::HealingApplied]
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
            } => self.apply_damage(ctx, source, target, *amount),
            EventPayload::HealingApplied { target, amount, .. } => {
                let unit = ctx.unit_mut(target)?;
                if !unit.knocked_out {
                    unit.resources.hit_points.apply_delta((*amount).max(0));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
