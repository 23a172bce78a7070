//! Error and failure-report types for event delivery.

use checkmeta_types::{EventKind, UnitId};
use serde::{Deserialize, Serialize};

/// Errors a subscriber may return while handling an event.
#[derive(Debug, thiserror::Error)]
pub enum SubscriberError {
    /// The event names a unit that is not on the roster.
    #[error("unit not on roster: {unit}")]
    UnknownUnit {
        /// The missing unit.
        unit: UnitId,
    },

    /// The subscriber refused the event for its own reasons.
    #[error("event rejected: {message}")]
    Rejected {
        /// Description of why the event could not be applied.
        message: String,
    },
}

/// A caught handler failure, kept for the matchday diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriberFailure {
    /// Sequence number of the event being delivered.
    pub sequence: u64,
    /// Kind of that event.
    pub kind: EventKind,
    /// Name of the failing subscriber.
    pub subscriber: String,
    /// Error message or panic text.
    pub message: String,
}
