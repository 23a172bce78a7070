//! End-of-round upkeep: stamina drain and trait cooldowns.
//!
//! The orchestrator publishes `round_ended` once a turn's convergences
//! have been delivered, listing the units that moved and are still
//! standing. For each of them this subscriber:
//!
//! 1. ticks every trait cooldown down by one, publishing `trait_ready`
//!    for each that reaches zero. A cooldown armed by a `trait_activated`
//!    earlier in the same turn is not ticked, so a cooldown of N keeps
//!    the trait out of the next N turns;
//! 2. drains stamina by [`RoundConfig::stamina_decay`], adds
//!    [`RoundConfig::stamina_recovery`], and publishes `stamina_updated`;
//! 3. knocks the unit out (`unit_knocked_out` with no attacker) if hit
//!    points and stamina are now both depleted.

use std::collections::BTreeSet;

use tracing::{debug, info};

use checkmeta_events::{DispatchContext, Subscriber, SubscriberError};
use checkmeta_types::{Event, EventKind, EventPayload, UnitId};

use crate::config::RoundConfig;

/// Applies end-of-round stamina upkeep and cooldown ticks.
#[derive(Debug, Clone, Default)]
pub struct RoundTracker {
    config: RoundConfig,
    armed: BTreeSet<(UnitId, String)>,
}

impl RoundTracker {
    /// Create a tracker with the given upkeep rules.
    pub const fn new(config: RoundConfig) -> Self {
        Self {
            config,
            armed: BTreeSet::new(),
        }
    }

    fn arm(
        &mut self,
        ctx: &mut DispatchContext<'_>,
        unit_id: &UnitId,
        trait_id: &str,
        cooldown: u32,
    ) -> Result<(), SubscriberError> {
        if cooldown == 0 {
            return Ok(());
        }
        ctx.unit_mut(unit_id)?
            .cooldowns
            .insert(trait_id.to_owned(), cooldown);
        self.armed.insert((unit_id.clone(), trait_id.to_owned()));
        Ok(())
    }

    fn end_round(&self, ctx: &mut DispatchContext<'_>, unit_id: &UnitId) {
        let decay = self.config.stamina_decay();
        let recovery = self.config.stamina_recovery();
        let Ok(unit) = ctx.unit_mut(unit_id) else {
            debug!(unit = %unit_id, "round end for unknown unit");
            return;
        };
        if unit.knocked_out {
            return;
        }

        let mut ready = Vec::new();
        for (trait_id, left) in &mut unit.cooldowns {
            if *left == 0 || self.armed.contains(&(unit_id.clone(), trait_id.clone())) {
                continue;
            }
            *left = left.saturating_sub(1);
            if *left == 0 {
                ready.push(trait_id.clone());
            }
        }
        unit.cooldowns.retain(|_, left| *left > 0);

        let stamina = &mut unit.resources.stamina;
        let previous = stamina.value();
        stamina.apply_delta(decay.saturating_neg());
        stamina.apply_delta(recovery);
        let value = stamina.value();

        let exhausted =
            unit.resources.hit_points.is_depleted() && unit.resources.stamina.is_depleted();
        if exhausted {
            unit.knocked_out = true;
        }

        for trait_id in ready {
            ctx.publish(EventPayload::TraitReady {
                unit: unit_id.clone(),
                trait_id,
            });
        }
        ctx.publish(EventPayload::StaminaUpdated {
            unit: unit_id.clone(),
            previous,
            value,
            decay,
            recovery,
        });
        if exhausted {
            info!(unit = %unit_id, "Unit exhausted");
            ctx.publish(EventPayload::UnitKnockedOut {
                unit: unit_id.clone(),
                by: None,
            });
        }
    }
}

impl Subscriber for RoundTracker {
    fn name(&self) -> &str {
        "round"
    }

    fn interests(&self) -> Vec<EventKind> {
        vec![EventKind::TraitActivated, EventKind::RoundEnded]
    }

    fn handle(
        &mut self,
        event: &Event,
        ctx: &mut DispatchContext<'_>,
    ) -> Result<(), SubscriberError> {
        match &event.payload {
            EventPayload::TraitActivated {
                unit,
                trait_id,
                cooldown,
                ..
            } => self.arm(ctx, unit, trait_id, *cooldown),
            EventPayload::RoundEnded { units } => {
                for unit in units {
                    self.end_round(ctx, unit);
                }
                self.armed.clear();
                Ok(())
            }
            _ => Ok(()),
        }
    }
}
