//! Turn callback that reports matchday progress through `tracing`.
//!
//! Quiet turns are logged at debug level; turns that produced a
//! convergence or closed a board are logged at info so a default run
//! shows the interesting moments only.

use checkmeta_core::matchday::{Matchday, TurnSummary};
use checkmeta_core::runner::TurnCallback;
use checkmeta_types::ConvergenceRecord;
use tracing::{debug, info};

/// Callback that logs each completed turn.
#[derive(Debug, Default)]
pub struct ProgressCallback {
    convergences: usize,
    events: usize,
}

impl ProgressCallback {
    /// Create a callback with zeroed running totals.
    pub const fn new() -> Self {
        Self {
            convergences: 0,
            events: 0,
        }
    }

    /// Convergences seen so far.
    pub const fn convergences(&self) -> usize {
        self.convergences
    }

    /// Events delivered so far.
    pub const fn events(&self) -> usize {
        self.events
    }
}

impl TurnCallback for ProgressCallback {
    fn on_turn(&mut self, summary: &TurnSummary, matchday: &Matchday) {
        self.convergences = self.convergences.saturating_add(summary.convergences);
        self.events = self.events.saturating_add(summary.events_delivered);

        if summary.convergences > 0 || summary.newly_terminal > 0 {
            let latest: Vec<&str> = matchday
                .convergences()
                .iter()
                .rev()
                .take(summary.convergences)
                .map(ConvergenceRecord::notation)
                .collect();
            info!(
                turn = summary.turn,
                convergences = summary.convergences,
                notations = ?latest,
                newly_terminal = summary.newly_terminal,
                boards_active = summary.boards_active,
                "Turn progress"
            );
        } else {
            debug!(
                turn = summary.turn,
                moves = summary.moves,
                boards_active = summary.boards_active,
                "Turn progress"
            );
        }
    }
}
