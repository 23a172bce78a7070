//! Async matchday runner with turn-boundary controls.
//!
//! [`run_matchday`] drives a [`Matchday`] to completion with support for:
//!
//! - **Cancellation**: a stop request closes running boards as `cancelled`
//! - **Pause/resume**: the runner parks between turns until resumed
//! - **Pacing**: an optional real-time delay between turns
//!
//! Turns themselves are synchronous; controls are only observed between
//! them, so a cancelled matchday never leaves the bus half-delivered.

use std::sync::Arc;

use tracing::{info, warn};

use crate::control::MatchdayControl;
use crate::matchday::{Matchday, MatchdayError, MatchdayResult, TurnSummary};

/// Callback invoked after each turn completes.
pub trait TurnCallback: Send {
    /// Called with the turn's summary and the matchday after the turn.
    fn on_turn(&mut self, summary: &TurnSummary, matchday: &Matchday);
}

/// A callback that does nothing.
pub struct NoOpCallback;

impl TurnCallback for NoOpCallback {
    fn on_turn(&mut self, _summary: &TurnSummary, _matchday: &Matchday) {}
}

/// Run the matchday until it completes or is cancelled.
///
/// # Errors
///
/// Returns [`MatchdayError`] if a turn cannot be executed.
pub async fn run_matchday(
    mut matchday: Matchday,
    control: &Arc<MatchdayControl>,
    callback: &mut dyn TurnCallback,
) -> Result<MatchdayResult, MatchdayError> {
    info!(
        matchday_id = %matchday.id(),
        boards = matchday.boards().len(),
        turn_interval_ms = control.turn_interval_ms(),
        "Matchday starting"
    );

    while !matchday.is_finished() {
        if control.is_paused() {
            info!(turn = matchday.turn(), "Matchday paused, waiting for resume...");
            control.wait_if_paused().await;
            info!(turn = matchday.turn(), "Matchday resumed");
        }

        if control.is_stop_requested() {
            info!(turn = matchday.turn(), "Stop requested");
            matchday.cancel();
            break;
        }

        let summary = matchday.run_turn()?;
        callback.on_turn(&summary, &matchday);

        if matchday.is_finished() {
            break;
        }

        let interval_ms = control.turn_interval_ms();
        if interval_ms > 0 {
            tokio::time::sleep(tokio::time::Duration::from_millis(interval_ms)).await;
        }
    }

    let result = matchday.finish();
    log_matchday_end(&result);
    Ok(result)
}

/// Log a one-line summary of a finished matchday.
pub fn log_matchday_end(result: &MatchdayResult) {
    let knocked_out = result.units.iter().filter(|u| u.knocked_out).count();
    info!(
        matchday_id = %result.matchday_id,
        reason = ?result.end_reason,
        turns = result.turns_played,
        units = result.units.len(),
        knocked_out,
        convergences = result.convergences.len(),
        events = result.events.len(),
        "Matchday ended"
    );
    if !result.diagnostics.is_empty() {
        warn!(
            diagnostics = result.diagnostics.len(),
            "Matchday finished with diagnostics"
        );
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use checkmeta_types::{BoardOutcome, Division, Unit};

    use super::*;
    use crate::config::MatchdayConfig;
    use crate::matchday::{EndReason, MatchdayBuilder};
    use crate::oracle::{ScriptedLine, ScriptedOracle};

    fn matchday(max_turns: u32) -> Matchday {
        let oracle = ScriptedOracle::new()
            .with_line("A1", ScriptedLine::repeating(["e4", "d4"]))
            .with_line("B1", ScriptedLine::repeating(["c4", "d4"]));
        let mut config = MatchdayConfig::default();
        config.matchday.max_turns = max_turns;
        config.matchday.worker_threads = 1;
        MatchdayBuilder::new(config)
            .oracle(Arc::new(oracle))
            .units([
                Unit::new("A1", "A", "FL", Division::Ops),
                Unit::new("B1", "B", "GO", Division::Intel),
            ])
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn bounded_by_turn_cap() {
        let control = Arc::new(MatchdayControl::new(0));
        let result = run_matchday(matchday(5), &control, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, EndReason::TurnLimit);
        assert_eq!(result.turns_played, 5);
    }

    #[tokio::test]
    async fn stop_before_first_turn() {
        let control = Arc::new(MatchdayControl::new(0));
        control.request_stop();
        let result = run_matchday(matchday(0), &control, &mut NoOpCallback)
            .await
            .unwrap();
        assert_eq!(result.end_reason, EndReason::Cancelled);
        assert_eq!(result.turns_played, 0);
        assert!(result
            .units
            .iter()
            .all(|u| u.outcome == Some(BoardOutcome::Cancelled)));
    }

    struct StopAfter {
        control: Arc<MatchdayControl>,
        turns: u32,
        seen: u32,
    }

    impl TurnCallback for StopAfter {
        fn on_turn(&mut self, _summary: &TurnSummary, _matchday: &Matchday) {
            self.seen = self.seen.saturating_add(1);
            if self.seen >= self.turns {
                self.control.request_stop();
            }
        }
    }

    #[tokio::test]
    async fn stop_at_turn_boundary() {
        let control = Arc::new(MatchdayControl::new(0));
        let mut callback = StopAfter {
            control: Arc::clone(&control),
            turns: 3,
            seen: 0,
        };
        let result = run_matchday(matchday(0), &control, &mut callback)
            .await
            .unwrap();
        assert_eq!(callback.seen, 3);
        assert_eq!(result.end_reason, EndReason::Cancelled);
        assert_eq!(result.turns_played, 3);
        // Turn 2 converged on d4 before the stop.
        assert_eq!(result.convergences.len(), 1);
    }

    #[tokio::test]
    async fn paused_runner_resumes() {
        let control = Arc::new(MatchdayControl::new(0));
        control.pause();
        let resumer = {
            let control = Arc::clone(&control);
            tokio::spawn(async move {
                tokio::time::sleep(tokio::time::Duration::from_millis(20)).await;
                control.resume();
            })
        };
        let result = run_matchday(matchday(2), &control, &mut NoOpCallback)
            .await
            .unwrap();
        resumer.await.unwrap();
        assert_eq!(result.end_reason, EndReason::TurnLimit);
    }

    #[tokio::test]
    async fn callback_sees_every_turn() {
        struct Count(u32);
        impl TurnCallback for Count {
            fn on_turn(&mut self, summary: &TurnSummary, _matchday: &Matchday) {
                self.0 = self.0.saturating_add(1);
                assert_eq!(summary.turn, self.0);
            }
        }

        let control = Arc::new(MatchdayControl::new(1));
        let mut count = Count(0);
        let _ = run_matchday(matchday(4), &control, &mut count).await.unwrap();
        assert_eq!(count.0, 4);
    }
}
