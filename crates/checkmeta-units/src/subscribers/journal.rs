//! Structured log line per delivered event.

use tracing::debug;

use checkmeta_events::{DispatchContext, Subscriber, SubscriberError};
use checkmeta_types::{Event, EventKind};

/// Forwards every event it is subscribed to into `tracing` at debug level.
#[derive(Debug, Clone, Copy, Default)]
pub struct JournalSubscriber {
    written: u64,
}

impl JournalSubscriber {
    /// Create a journal.
    pub const fn new() -> Self {
        Self { written: 0 }
    }

    /// Events journaled so far.
    pub const fn written(&self) -> u64 {
        self.written
    }
}

impl Subscriber for JournalSubscriber {
    fn name(&self) -> &str {
        "journal"
    }

    fn interests(&self) -> Vec<EventKind> {
        EventKind::ALL.to_vec()
    }

    fn handle(
        &mut self,
        event: &Event,
        _ctx: &mut DispatchContext<'_>,
    ) -> Result<(), SubscriberError> {
        self.written = self.written.saturating_add(1);
        debug!(
            sequence = event.sequence,
            turn = event.turn,
            kind = %event.kind(),
            fields = ?event.fields(),
            "event"
        );
        Ok(())
    }
}
