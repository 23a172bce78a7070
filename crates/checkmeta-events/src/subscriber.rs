//! The [`Subscriber`] capability and the context handed to it on delivery.

use std::sync::{Arc, Mutex};

use checkmeta_types::{Event, EventKind, EventPayload, Unit, UnitId, UnitRoster};

use crate::bus::EventBus;
use crate::error::SubscriberError;

/// A component that consumes events and may mutate unit state.
///
/// Subscribers are registered explicitly at matchday setup. A failing
/// subscriber returns an error (or panics); the bus records the failure
/// and keeps delivering to everyone else.
pub trait Subscriber: Send {
    /// Stable name used in logs and failure reports.
    fn name(&self) -> &str;

    /// Event kinds this subscriber wants when registered with
    /// [`EventBus::subscribe_all`].
    fn interests(&self) -> Vec<EventKind>;

    /// Consume one event.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriberError`] when the event cannot be applied. The
    /// bus logs it and moves on; the error never reaches the publisher.
    fn handle(&mut self, event: &Event, ctx: &mut DispatchContext<'_>)
    -> Result<(), SubscriberError>;
}

/// A subscriber shared between several kind registrations.
///
/// The mutex guarantees a subscriber is never invoked concurrently with
/// itself.
pub type SharedSubscriber = Arc<Mutex<dyn Subscriber>>;

/// Wrap a subscriber for registration.
pub fn shared<S: Subscriber + 'static>(subscriber: S) -> SharedSubscriber {
    Arc::new(Mutex::new(subscriber))
}

/// What a subscriber may touch while handling an event.
///
/// Unit state is reachable mutably; follow-up events published here are
/// queued behind everything already pending, never delivered inline.
pub struct DispatchContext<'a> {
    units: &'a mut UnitRoster,
    bus: &'a EventBus,
    turn: u32,
}

impl<'a> DispatchContext<'a> {
    pub(crate) const fn new(units: &'a mut UnitRoster, bus: &'a EventBus, turn: u32) -> Self {
        Self { units, bus, turn }
    }

    /// Turn of the event being delivered.
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Read-only view of the roster.
    pub const fn units(&self) -> &UnitRoster {
        self.units
    }

    /// Mutable access to one unit.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriberError::UnknownUnit`] if the unit is not on the
    /// roster.
    pub fn unit_mut(&mut self, id: &UnitId) -> Result<&mut Unit, SubscriberError> {
        self.units
            .get_mut(id)
            .ok_or_else(|| SubscriberError::UnknownUnit { unit: id.clone() })
    }

    /// Queue a follow-up event for the current turn.
    ///
    /// Returns the sequence number assigned to it.
    pub fn publish(&self, payload: EventPayload) -> u64 {
        self.bus.publish(self.turn, payload)
    }
}
