//! Shared control state for a running matchday.
//!
//! [`MatchdayControl`] is wrapped in an [`Arc`](std::sync::Arc) and shared
//! between the async runner and whatever drives it (a CLI signal handler,
//! a test). The runner checks it at every turn boundary: a stop request
//! cancels the matchday, a pause parks the runner until resumed.
//!
//! The flags are atomics, so checks on the turn loop take no locks.

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// Shared pause/stop/pacing state.
#[derive(Debug)]
pub struct MatchdayControl {
    /// Whether the runner should hold at the next turn boundary.
    paused: AtomicBool,

    /// Wakes a paused runner.
    resume_notify: Notify,

    /// Whether cancellation has been requested.
    stop_requested: AtomicBool,

    /// Real-time delay between turns, fixed for the run.
    turn_interval_ms: u64,
}

impl MatchdayControl {
    /// Create control state with the given turn pacing.
    pub fn new(turn_interval_ms: u64) -> Self {
        Self {
            paused: AtomicBool::new(false),
            resume_notify: Notify::new(),
            stop_requested: AtomicBool::new(false),
            turn_interval_ms,
        }
    }

    // -----------------------------------------------------------------------
    // Pause / Resume
    // -----------------------------------------------------------------------

    /// Whether the matchday is paused.
    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    /// Pause at the next turn boundary.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::Release);
    }

    /// Resume and wake the runner.
    pub fn resume(&self) {
        self.paused.store(false, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Wait until resumed or stopped.
    ///
    /// Returns immediately if not paused.
    pub async fn wait_if_paused(&self) {
        while self.is_paused() && !self.is_stop_requested() {
            self.resume_notify.notified().await;
        }
    }

    // -----------------------------------------------------------------------
    // Stop
    // -----------------------------------------------------------------------

    /// Request cancellation at the next turn boundary.
    ///
    /// Also wakes a paused runner so it can observe the request.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.resume_notify.notify_one();
    }

    /// Whether cancellation has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    // -----------------------------------------------------------------------
    // Pacing
    // -----------------------------------------------------------------------

    /// Delay between turns in milliseconds.
    pub const fn turn_interval_ms(&self) -> u64 {
        self.turn_interval_ms
    }
}

impl Default for MatchdayControl {
    fn default() -> Self {
        Self::new(0)
    }
}
