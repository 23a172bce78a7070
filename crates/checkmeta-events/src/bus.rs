//! In-process publish/subscribe bus with a FIFO delivery queue.
//!
//! # Delivery model
//!
//! [`EventBus::publish`] assigns a sequence number and appends the event
//! to a queue; it never calls a handler. [`EventBus::drain`] pops events
//! in sequence order and invokes every handler registered for the event's
//! kind, in registration order. Handlers that publish from inside
//! `handle` append to the tail of the same queue, so a cascade
//! (damage -> knockout -> morale) is delivered breadth-first within the
//! same drain.
//!
//! The cascade limit applies only to events queued after the drain
//! started. Everything already pending when `drain` is called is
//! delivered; once the limit is reached, later cascade events are
//! discarded and counted in [`DrainReport::dropped`].
//!
//! Only one drain runs at a time. Handler errors and panics are caught,
//! logged, and reported in the [`DrainReport`]; they never abort
//! delivery to the remaining handlers or reach the publisher.

use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use checkmeta_types::{Event, EventKind, EventPayload, UnitRoster};
use tracing::{debug, error, warn};

use crate::error::SubscriberFailure;
use crate::subscriber::{DispatchContext, SharedSubscriber};

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Raw numeric value.
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Summary of one [`EventBus::drain`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Events popped and offered to their subscribers.
    pub delivered: usize,
    /// How many of the delivered events were queued during the drain.
    pub cascaded: usize,
    /// Handler failures caught during delivery.
    pub failures: Vec<SubscriberFailure>,
    /// Cascade events discarded because the limit was reached.
    pub dropped: usize,
}

#[derive(Clone)]
struct Registration {
    id: SubscriptionId,
    subscriber: SharedSubscriber,
}

/// The matchday event bus.
///
/// All methods take `&self`; the bus is `Send + Sync` and may be shared
/// behind an `Arc`.
pub struct EventBus {
    handlers: RwLock<BTreeMap<EventKind, Vec<Registration>>>,
    queue: Mutex<VecDeque<Event>>,
    dispatch: Mutex<()>,
    log: Mutex<Vec<Event>>,
    next_sequence: AtomicU64,
    next_subscription: AtomicU64,
    max_cascade: usize,
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.pending())
            .field("max_cascade", &self.max_cascade)
            .finish_non_exhaustive()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(0)
    }
}

fn lock<T: ?Sized>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl EventBus {
    /// Create a bus.
    ///
    /// `max_cascade` bounds how many events published during a single
    /// drain may be delivered by it; 0 means unbounded.
    pub fn new(max_cascade: usize) -> Self {
        Self {
            handlers: RwLock::new(BTreeMap::new()),
            queue: Mutex::new(VecDeque::new()),
            dispatch: Mutex::new(()),
            log: Mutex::new(Vec::new()),
            next_sequence: AtomicU64::new(1),
            next_subscription: AtomicU64::new(1),
            max_cascade,
        }
    }

    /// Register a handler for one kind.
    ///
    /// Handlers for a kind are invoked in the order they subscribed.
    pub fn subscribe(&self, kind: EventKind, subscriber: SharedSubscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription.fetch_add(1, Ordering::Relaxed));
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        handlers
            .entry(kind)
            .or_default()
            .push(Registration { id, subscriber });
        id
    }

    /// Register a handler for every kind it declares in
    /// [`Subscriber::interests`](crate::Subscriber::interests).
    pub fn subscribe_all(&self, subscriber: &SharedSubscriber) -> Vec<(EventKind, SubscriptionId)> {
        let interests = lock(subscriber).interests();
        interests
            .into_iter()
            .map(|kind| (kind, self.subscribe(kind, SharedSubscriber::clone(subscriber))))
            .collect()
    }

    /// Remove a registration. Returns `false` if it was not present.
    pub fn unsubscribe(&self, kind: EventKind, id: SubscriptionId) -> bool {
        let mut handlers = self
            .handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|r| r.id != id);
        list.len() != before
    }

    /// Number of handlers registered for a kind.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Queue an event for delivery and return its sequence number.
    ///
    /// A kind with no subscribers is accepted; the event is still
    /// sequenced and logged, it just reaches nobody.
    pub fn publish(&self, turn: u32, payload: EventPayload) -> u64 {
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let event = Event {
            sequence,
            turn,
            payload,
        };
        debug!(sequence, turn, kind = %event.kind(), "event queued");
        lock(&self.queue).push_back(event);
        sequence
    }

    /// Events waiting for delivery.
    pub fn pending(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Deliver queued events, including any published by handlers during
    /// this call, until the queue is empty.
    pub fn drain(&self, units: &mut UnitRoster) -> DrainReport {
        let _dispatching = lock(&self.dispatch);
        let mut report = DrainReport::default();
        let cutoff = self.next_sequence.load(Ordering::Relaxed);

        while let Some(event) = lock(&self.queue).pop_front() {
            let cascade = event.sequence >= cutoff;
            if cascade && self.max_cascade != 0 && report.cascaded >= self.max_cascade {
                if report.dropped == 0 {
                    warn!(
                        delivered = report.delivered,
                        cascaded = report.cascaded,
                        "cascade limit reached, discarding cascade events"
                    );
                }
                debug!(sequence = event.sequence, kind = %event.kind(), "cascade event dropped");
                report.dropped = report.dropped.saturating_add(1);
                continue;
            }

            let registrations: Vec<Registration> = self
                .handlers
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&event.kind())
                .cloned()
                .unwrap_or_default();

            for registration in registrations {
                if let Some(failure) = self.deliver(&event, &registration, units) {
                    report.failures.push(failure);
                }
            }

            lock(&self.log).push(event);
            report.delivered = report.delivered.saturating_add(1);
            if cascade {
                report.cascaded = report.cascaded.saturating_add(1);
            }
        }

        report
    }

    fn deliver(
        &self,
        event: &Event,
        registration: &Registration,
        units: &mut UnitRoster,
    ) -> Option<SubscriberFailure> {
        let name = lock(&registration.subscriber).name().to_owned();
        let mut ctx = DispatchContext::new(units, self, event.turn);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            lock(&registration.subscriber).handle(event, &mut ctx)
        }));

        let message = match outcome {
            Ok(Ok(())) => return None,
            Ok(Err(e)) => e.to_string(),
            Err(panic) => panic_message(panic.as_ref()),
        };

        error!(
            sequence = event.sequence,
            kind = %event.kind(),
            subscriber = %name,
            error = %message,
            "subscriber failed, continuing delivery"
        );

        Some(SubscriberFailure {
            sequence: event.sequence,
            kind: event.kind(),
            subscriber: name,
            message,
        })
    }

    /// Every delivered event so far, in delivery order. Clears the log.
    pub fn take_log(&self) -> Vec<Event> {
        core::mem::take(&mut *lock(&self.log))
    }
}

fn panic_message(panic: &(dyn core::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panicked: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panicked: {s}")
    } else {
        String::from("panicked")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use checkmeta_types::{Division, Unit, UnitId};

    use super::*;
    use crate::error::SubscriberError;
    use crate::subscriber::{Subscriber, shared};

    /// Records every sequence it sees into a shared vector.
    struct Recorder {
        name: String,
        seen: Arc<Mutex<Vec<(String, u64)>>>,
    }

    impl Subscriber for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn interests(&self) -> Vec<EventKind> {
            vec![EventKind::LevelUp, EventKind::MoraleChanged]
        }

        fn handle(
            &mut self,
            event: &Event,
            _ctx: &mut DispatchContext<'_>,
        ) -> Result<(), SubscriberError> {
            self.seen
                .lock()
                .unwrap()
                .push((self.name.clone(), event.sequence));
            Ok(())
        }
    }

    struct Failing;

    impl Subscriber for Failing {
        fn name(&self) -> &str {
            "failing"
        }

        fn interests(&self) -> Vec<EventKind> {
            vec![EventKind::LevelUp]
        }

        fn handle(
            &mut self,
            _event: &Event,
            _ctx: &mut DispatchContext<'_>,
        ) -> Result<(), SubscriberError> {
            Err(SubscriberError::Rejected {
                message: String::from("nope"),
            })
        }
    }

    struct Panicking;

    impl Subscriber for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn interests(&self) -> Vec<EventKind> {
            vec![EventKind::LevelUp]
        }

        fn handle(
            &mut self,
            _event: &Event,
            _ctx: &mut DispatchContext<'_>,
        ) -> Result<(), SubscriberError> {
            panic!("handler blew up");
        }
    }

    /// Turns every level-up into a morale change for the same unit.
    struct Chain;

    impl Subscriber for Chain {
        fn name(&self) -> &str {
            "chain"
        }

        fn interests(&self) -> Vec<EventKind> {
            vec![EventKind::LevelUp]
        }

        fn handle(
            &mut self,
            event: &Event,
            ctx: &mut DispatchContext<'_>,
        ) -> Result<(), SubscriberError> {
            if let EventPayload::LevelUp { unit, .. } = &event.payload {
                let applied = ctx.unit_mut(unit)?.resources.morale.apply_delta(1);
                ctx.publish(EventPayload::MoraleChanged {
                    unit: unit.clone(),
                    delta: applied,
                    value: 51,
                });
            }
            Ok(())
        }
    }

    fn level_up(unit: &str) -> EventPayload {
        EventPayload::LevelUp {
            unit: UnitId::from(unit),
            level: 1,
        }
    }

    fn roster() -> UnitRoster {
        let mut roster = UnitRoster::new();
        roster
            .insert(Unit::new("A1", "A", "FL", Division::Ops))
            .unwrap();
        roster
    }

    fn recorder(name: &str, seen: &Arc<Mutex<Vec<(String, u64)>>>) -> SharedSubscriber {
        shared(Recorder {
            name: name.to_owned(),
            seen: Arc::clone(seen),
        })
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventKind::LevelUp, recorder("first", &seen));
        bus.subscribe(EventKind::LevelUp, recorder("second", &seen));

        let seq = bus.publish(1, level_up("A1"));
        let report = bus.drain(&mut roster());

        assert_eq!(report.delivered, 1);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(String::from("first"), seq), (String::from("second"), seq)]
        );
    }

    #[test]
    fn publish_without_subscribers_is_harmless() {
        let bus = EventBus::default();
        bus.publish(1, level_up("A1"));
        let report = bus.drain(&mut roster());
        assert_eq!(report.delivered, 1);
        assert!(report.failures.is_empty());
        assert_eq!(bus.take_log().len(), 1);
    }

    #[test]
    fn sequences_are_strictly_increasing() {
        let bus = EventBus::default();
        let a = bus.publish(1, level_up("A1"));
        let b = bus.publish(1, level_up("A1"));
        let c = bus.publish(2, level_up("A1"));
        assert!(a < b && b < c);
    }

    #[test]
    fn failing_and_panicking_handlers_are_isolated() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventKind::LevelUp, shared(Failing));
        bus.subscribe(EventKind::LevelUp, shared(Panicking));
        bus.subscribe(EventKind::LevelUp, recorder("survivor", &seen));

        bus.publish(1, level_up("A1"));
        let report = bus.drain(&mut roster());

        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures[0].subscriber, "failing");
        assert_eq!(report.failures[1].subscriber, "panicking");
        assert!(report.failures[1].message.contains("handler blew up"));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn cascaded_events_are_delivered_after_the_current_one() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventKind::LevelUp, shared(Chain));
        bus.subscribe(EventKind::MoraleChanged, recorder("morale", &seen));

        let first = bus.publish(3, level_up("A1"));
        let second = bus.publish(3, level_up("A1"));
        let mut units = roster();
        let report = bus.drain(&mut units);

        assert_eq!(report.delivered, 4);
        let log = bus.take_log();
        let kinds: Vec<EventKind> = log.iter().map(Event::kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::LevelUp,
                EventKind::LevelUp,
                EventKind::MoraleChanged,
                EventKind::MoraleChanged,
            ]
        );
        assert_eq!(log[0].sequence, first);
        assert_eq!(log[1].sequence, second);
        assert!(log.iter().all(|e| e.turn == 3));
        assert_eq!(
            units
                .get(&UnitId::from("A1"))
                .unwrap()
                .resources
                .morale
                .value(),
            52
        );
    }

    #[test]
    fn unknown_unit_is_reported_not_fatal() {
        let bus = EventBus::default();
        bus.subscribe(EventKind::LevelUp, shared(Chain));
        bus.publish(1, level_up("Z9"));
        let report = bus.drain(&mut roster());
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].message.contains("Z9"));
    }

    #[test]
    fn unsubscribe_stops_delivery() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let id = bus.subscribe(EventKind::LevelUp, recorder("gone", &seen));
        assert!(bus.unsubscribe(EventKind::LevelUp, id));
        assert!(!bus.unsubscribe(EventKind::LevelUp, id));
        bus.publish(1, level_up("A1"));
        bus.drain(&mut roster());
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn subscribe_all_uses_declared_interests() {
        let bus = EventBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let registrations = bus.subscribe_all(&recorder("both", &seen));
        assert_eq!(registrations.len(), 2);
        assert_eq!(bus.subscriber_count(EventKind::LevelUp), 1);
        assert_eq!(bus.subscriber_count(EventKind::MoraleChanged), 1);
        assert_eq!(bus.subscriber_count(EventKind::DamageDealt), 0);
    }

    #[test]
    fn cascade_limit_only_counts_cascades() {
        let bus = EventBus::new(2);
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventKind::LevelUp, shared(Chain));
        bus.subscribe(EventKind::LevelUp, recorder("levels", &seen));
        for _ in 0..5 {
            bus.publish(1, level_up("A1"));
        }
        let report = bus.drain(&mut roster());

        assert_eq!(report.delivered, 7);
        assert_eq!(report.cascaded, 2);
        assert_eq!(report.dropped, 3);
        assert_eq!(bus.pending(), 0);
        assert_eq!(seen.lock().unwrap().len(), 5);
        let kinds: Vec<EventKind> = bus.take_log().iter().map(Event::kind).collect();
        assert_eq!(kinds.iter().filter(|k| **k == EventKind::LevelUp).count(), 5);
        assert_eq!(kinds.iter().filter(|k| **k == EventKind::MoraleChanged).count(), 2);
    }

    #[test]
    fn first_order_events_ignore_the_limit() {
        let bus = EventBus::new(1);
        for _ in 0..4 {
            bus.publish(1, level_up("A1"));
        }
        let report = bus.drain(&mut roster());
        assert_eq!(report.delivered, 4);
        assert_eq!(report.cascaded, 0);
        assert_eq!(report.dropped, 0);
    }

    #[test]
    fn concurrent_publishers_lose_nothing() {
        let bus = Arc::new(EventBus::default());
        let seen = Arc::new(Mutex::new(Vec::new()));
        bus.subscribe(EventKind::LevelUp, recorder("all", &seen));

        let mut workers = Vec::with_capacity(4);
        for _ in 0..4 {
            let bus = Arc::clone(&bus);
            workers.push(std::thread::spawn(move || {
                (0..50)
                    .map(|_| bus.publish(1, level_up("A1")))
                    .collect::<Vec<u64>>()
            }));
        }
        let mut issued: Vec<u64> = workers
            .into_iter()
            .flat_map(|w| w.join().unwrap())
            .collect();

        let report = bus.drain(&mut roster());
        assert_eq!(report.delivered, 200);
        assert_eq!(report.dropped, 0);
        assert!(report.failures.is_empty());

        issued.sort_unstable();
        issued.dedup();
        assert_eq!(issued.len(), 200);

        let mut delivered: Vec<u64> = bus.take_log().iter().map(|e| e.sequence).collect();
        assert!(delivered.windows(2).all(|w| w[0] != w[1]));
        delivered.sort_unstable();
        assert_eq!(delivered, issued);
        assert_eq!(seen.lock().unwrap().len(), 200);
    }
}
