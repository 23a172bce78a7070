//! Standard subscribers that turn matchday events into unit state.
//!
//! - [`vitals`] -- Damage, healing, and knockouts ([`VitalsTracker`])
//! - [`morale`] -- Morale swings from results, assists, and losses ([`MoraleTracker`])
//! - [`experience`] -- XP awards and level-ups ([`ExperienceTracker`])
//! - [`stats`] -- rStat accumulation ([`StatTracker`])
//! - [`round`] -- End-of-round stamina upkeep and trait cooldowns ([`RoundTracker`])
//! - [`journal`] -- Structured log line per delivered event ([`JournalSubscriber`])
//!
//! Each subscriber only touches units through the
//! [`DispatchContext`](checkmeta_events::DispatchContext) and reports
//! follow-up facts by publishing further events.

pub mod experience;
pub mod journal;
pub mod morale;
pub mod round;
pub mod stats;
pub mod vitals;

pub use experience::ExperienceTracker;
pub use journal::JournalSubscriber;
pub use morale::MoraleTracker;
pub use round::RoundTracker;
pub use stats::StatTracker;
pub use vitals::VitalsTracker;

#[cfg(test)]
pub(crate) mod testing {
    //! Helpers shared by the subscriber tests.

    use checkmeta_events::{EventBus, SharedSubscriber};
    use checkmeta_types::{Division, Event, EventPayload, Unit, UnitRoster};

    /// Two units per team: `A1`, `A2`, `B1`, `B2`.
    pub fn roster() -> UnitRoster {
        let mut roster = UnitRoster::new();
        for (id, team) in [("A1", "A"), ("A2", "A"), ("B1", "B"), ("B2", "B")] {
            let _ = roster.insert(Unit::new(id, team, "FL", Division::Ops));
        }
        roster
    }

    /// Publish `payloads` on a fresh bus with `subscriber` registered for
    /// its interests, drain, and return the delivered log.
    pub fn run(
        subscriber: SharedSubscriber,
        roster: &mut UnitRoster,
        payloads: Vec<EventPayload>,
    ) -> Vec<Event> {
        let bus = EventBus::default();
        bus.subscribe_all(&subscriber);
        for payload in payloads {
            bus.publish(1, payload);
        }
        let report = bus.drain(roster);
        assert!(report.failures.is_empty(), "{:?}", report.failures);
        bus.take_log()
    }
}
