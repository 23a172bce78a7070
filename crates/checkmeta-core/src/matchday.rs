//! Matchday Orchestrator.
//!
//! A [`Matchday`] owns every board and unit for one run and drives the
//! turn loop:
//!
//! 1. **Stepping** -- every non-terminal board advances one move on the
//!    rayon worker pool. The pool join is the turn barrier.
//! 2. **Converging** -- the turn's moves (minus units over their
//!    participation cap) go through the [`ConvergenceDetector`].
//! 3. **Resolving** -- each record is resolved in detector order and its
//!    events published; boards that just ended publish `board_completed`.
//!    The bus is drained to empty.
//! 4. **End of round** -- `round_ended` lists the units that moved and are
//!    still standing; the bus is drained again so stamina upkeep and
//!    cooldown ticks land before the next turn. Boards of knocked-out
//!    units are then closed and their completions drained.
//!
//! The loop ends when every board is terminal, when the turn cap closes
//! the remaining boards with `turn_limit`, or on [`Matchday::cancel`].
//! [`Matchday::finish`] runs the Statistic Validator over every unit and
//! returns the [`MatchdayResult`].
//!
//! Only a missing collaborator is an error. Everything else (oracle
//! failures, subscriber failures, rejected statistics, roster problems)
//! is recorded as a [`Diagnostic`] on the result.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use checkmeta_events::{DrainReport, EventBus, SharedSubscriber, shared};
use checkmeta_types::{
    BoardOutcome, ConvergenceRecord, Division, Event, EventPayload, MatchdayId, Resources, TeamId,
    Unit, UnitId, UnitRoster,
};
use checkmeta_units::{
    ExperienceTracker, JournalSubscriber, MoraleTracker, RejectionReason, RoundTracker,
    StatTracker, StatValidator, TraitCatalog, VitalsTracker, check_unit,
};

use crate::board::{Board, BoardError, StepResult};
use crate::config::MatchdayConfig;
use crate::convergence::{ConvergenceDetector, ParticipationLedger};
use crate::dice::Dice;
use crate::oracle::{MoveOracle, MoveSelector, RandomSelector};
use crate::resolver::ConvergenceResolver;

/// Errors that abort a matchday.
#[derive(Debug, thiserror::Error)]
pub enum MatchdayError {
    /// A required collaborator was not supplied.
    #[error("missing collaborator: {collaborator}")]
    MissingCollaborator {
        /// Which collaborator.
        collaborator: &'static str,
    },

    /// The board-stepping worker pool could not be created.
    #[error("failed to build worker pool: {source}")]
    WorkerPool {
        /// The underlying rayon error.
        #[from]
        source: rayon::ThreadPoolBuildError,
    },

    /// A turn was requested after the matchday completed.
    #[error("matchday already completed")]
    AlreadyCompleted,
}

/// Orchestrator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchdayPhase {
    /// Boards constructed, none stepped.
    Initialized,
    /// Between turns.
    Running,
    /// Boards are being stepped.
    Stepping,
    /// The detector is grouping moves.
    Converging,
    /// Records are being resolved and events delivered.
    Resolving,
    /// Terminal.
    Completed,
}

/// Why the matchday ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// Every board reached a terminal state on its own.
    AllBoardsTerminal,
    /// The turn cap closed the remaining boards.
    TurnLimit,
    /// Cancellation was requested.
    Cancelled,
}

/// Category of a [`Diagnostic`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A terminal board was stepped.
    IllegalState,
    /// The move oracle failed; the board was aborted.
    OracleFailure,
    /// A subscriber failed while handling an event.
    SubscriberFailure,
    /// A statistic code was dropped by the validator.
    StatisticRejected,
    /// A unit's role is unknown or disagrees with its division.
    RoleIssue,
    /// A unit carried more traits than the roster allows.
    TraitsTruncated,
    /// The bus cascade limit discarded events.
    CascadeDropped,
    /// A unit identifier was registered twice; the later unit was ignored.
    DuplicateUnit,
}

/// A non-fatal problem recorded during the matchday.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Turn on which it happened (0 = setup).
    pub turn: u32,
    /// Affected unit, if any.
    pub unit: Option<UnitId>,
    /// Category.
    pub kind: DiagnosticKind,
    /// Human-readable detail.
    pub detail: String,
}

/// What one turn did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnSummary {
    /// The turn that ran.
    pub turn: u32,
    /// Boards that played a move.
    pub moves: usize,
    /// Boards still running after the turn.
    pub boards_active: usize,
    /// Convergence records detected.
    pub convergences: usize,
    /// Events delivered by the bus.
    pub events_delivered: usize,
    /// Boards that became terminal during the turn.
    pub newly_terminal: usize,
}

/// Final state of one unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitReport {
    /// Unit identifier.
    pub id: UnitId,
    /// Team.
    pub team: TeamId,
    /// Role code.
    pub role: String,
    /// Division.
    pub division: Division,
    /// Final resources.
    pub resources: Resources,
    /// Statistics accepted by the validator.
    pub stats: BTreeMap<String, i64>,
    /// Experience.
    pub xp: u32,
    /// Level.
    pub level: u32,
    /// Whether the unit was knocked out.
    pub knocked_out: bool,
    /// How the unit's board ended.
    pub outcome: Option<BoardOutcome>,
    /// Moves played.
    pub turns: u32,
    /// Move notations in order.
    pub history: Vec<String>,
}

/// Everything a matchday produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchdayResult {
    /// Matchday identifier.
    pub matchday_id: MatchdayId,
    /// When the matchday was built.
    pub started_at: DateTime<Utc>,
    /// When it completed.
    pub finished_at: DateTime<Utc>,
    /// Why it ended.
    pub end_reason: EndReason,
    /// Turns executed.
    pub turns_played: u32,
    /// Per-unit final state, in identifier order.
    pub units: Vec<UnitReport>,
    /// Every convergence, in detection order.
    pub convergences: Vec<ConvergenceRecord>,
    /// Every delivered event, in delivery order.
    pub events: Vec<Event>,
    /// Non-fatal problems.
    pub diagnostics: Vec<Diagnostic>,
}

impl MatchdayResult {
    /// Report for one unit.
    pub fn unit(&self, id: &UnitId) -> Option<&UnitReport> {
        self.units.iter().find(|u| &u.id == id)
    }

    /// Pretty-printed JSON for handing off to persistence.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Diagnostics of one kind.
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Wires a [`Matchday`] from its collaborators.
///
/// Only the move oracle is required. Defaults: [`RandomSelector`], the
/// built-in trait catalog, the canonical statistic schema, dice seeded
/// from `matchday.seed`, a fresh bus, and the standard subscribers
/// (vitals, morale, experience, statistics, journal).
pub struct MatchdayBuilder {
    config: MatchdayConfig,
    oracle: Option<Arc<dyn MoveOracle>>,
    selector: Option<Arc<dyn MoveSelector>>,
    catalog: Option<Arc<TraitCatalog>>,
    validator: Option<StatValidator>,
    dice: Option<Dice>,
    bus: Option<Arc<EventBus>>,
    units: Vec<Unit>,
    subscribers: Vec<SharedSubscriber>,
    standard_subscribers: bool,
}

impl core::fmt::Debug for MatchdayBuilder {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MatchdayBuilder")
            .field("config", &self.config)
            .field("has_oracle", &self.oracle.is_some())
            .field("units", &self.units.len())
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl MatchdayBuilder {
    /// Start from a configuration.
    pub const fn new(config: MatchdayConfig) -> Self {
        Self {
            config,
            oracle: None,
            selector: None,
            catalog: None,
            validator: None,
            dice: None,
            bus: None,
            units: Vec::new(),
            subscribers: Vec::new(),
            standard_subscribers: true,
        }
    }

    /// Set the move oracle.
    #[must_use]
    pub fn oracle(mut self, oracle: Arc<dyn MoveOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    /// Set the move selection policy.
    #[must_use]
    pub fn selector(mut self, selector: Arc<dyn MoveSelector>) -> Self {
        self.selector = Some(selector);
        self
    }

    /// Set the trait catalog.
    #[must_use]
    pub fn catalog(mut self, catalog: Arc<TraitCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Set the statistic validator.
    #[must_use]
    pub fn validator(mut self, validator: StatValidator) -> Self {
        self.validator = Some(validator);
        self
    }

    /// Set the root dice. Boards and the resolver fork from it.
    #[must_use]
    pub fn dice(mut self, dice: Dice) -> Self {
        self.dice = Some(dice);
        self
    }

    /// Use an existing bus.
    #[must_use]
    pub fn bus(mut self, bus: Arc<EventBus>) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Add one unit.
    #[must_use]
    pub fn unit(mut self, unit: Unit) -> Self {
        self.units.push(unit);
        self
    }

    /// Add several units.
    #[must_use]
    pub fn units(mut self, units: impl IntoIterator<Item = Unit>) -> Self {
        self.units.extend(units);
        self
    }

    /// Register an extra subscriber for all of its interests.
    #[must_use]
    pub fn subscriber(mut self, subscriber: SharedSubscriber) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Skip the standard subscribers.
    #[must_use]
    pub const fn without_standard_subscribers(mut self) -> Self {
        self.standard_subscribers = false;
        self
    }

    /// Validate the roster, open every board, and wire the bus.
    ///
    /// # Errors
    ///
    /// [`MatchdayError::MissingCollaborator`] without an oracle;
    /// [`MatchdayError::WorkerPool`] if the thread pool cannot start.
    pub fn build(self) -> Result<Matchday, MatchdayError> {
        let oracle = self.oracle.ok_or(MatchdayError::MissingCollaborator {
            collaborator: "move oracle",
        })?;
        let config = self.config;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.matchday.worker_threads)
            .thread_name(|i| format!("checkmeta-board-{i}"))
            .build()?;

        let root = self
            .dice
            .unwrap_or_else(|| Dice::seeded(config.matchday.seed));
        let mut diagnostics = Vec::new();
        let units = admit_units(self.units, config.roster.max_traits, &mut diagnostics);

        let bus = self
            .bus
            .unwrap_or_else(|| Arc::new(EventBus::new(config.bus.max_cascade)));
        if self.standard_subscribers {
            // Stats sees damage before vitals applies it, so it can tell
            // a knockout blow from damage against a unit already down.
            let standard = [
                shared(StatTracker),
                shared(VitalsTracker::new(config.resources.clone())),
                shared(MoraleTracker::new(config.morale.clone())),
                shared(ExperienceTracker::new(config.progression.clone())),
                shared(RoundTracker::new(config.round.clone())),
                shared(JournalSubscriber::new()),
            ];
            for subscriber in &standard {
                bus.subscribe_all(subscriber);
            }
        }
        for subscriber in &self.subscribers {
            bus.subscribe_all(subscriber);
        }

        let mut boards = Vec::with_capacity(units.len());
        for unit in units.iter() {
            let dice = root.fork(&format!("board:{}", unit.id));
            let board = match Board::start(unit.id.clone(), oracle.as_ref(), dice.clone()) {
                Ok(board) => board,
                Err(e) => {
                    warn!(unit = %unit.id, error = %e, "Board failed to start");
                    diagnostics.push(Diagnostic {
                        turn: 0,
                        unit: Some(unit.id.clone()),
                        kind: DiagnosticKind::OracleFailure,
                        detail: e.to_string(),
                    });
                    bus.publish(
                        0,
                        ConvergenceResolver::board_completed(&unit.id, BoardOutcome::Aborted, 0),
                    );
                    Board::aborted(unit.id.clone(), dice)
                }
            };
            boards.push(board);
        }

        let catalog = self
            .catalog
            .unwrap_or_else(|| Arc::new(TraitCatalog::builtin()));
        let resolver =
            ConvergenceResolver::new(catalog, config.resolution.clone(), root.fork("resolver"));

        let mut matchday = Matchday {
            id: MatchdayId::new(),
            phase: MatchdayPhase::Initialized,
            turn: 0,
            oracle,
            selector: self
                .selector
                .unwrap_or_else(|| Arc::new(RandomSelector)),
            validator: self.validator.unwrap_or_default(),
            detector: ConvergenceDetector::with_teams(units.team_index()),
            ledger: ParticipationLedger::new(config.matchday.max_convergences_per_unit),
            resolver,
            bus,
            boards,
            units,
            convergences: Vec::new(),
            diagnostics,
            end_reason: None,
            started_at: Utc::now(),
            pool,
            config,
        };

        let report = matchday.bus.drain(&mut matchday.units);
        matchday.absorb(&report);
        if matchday.active_boards() == 0 {
            matchday.complete(EndReason::AllBoardsTerminal);
        }

        info!(
            matchday_id = %matchday.id,
            units = matchday.units.len(),
            boards_active = matchday.active_boards(),
            seed = root.seed(),
            max_turns = matchday.config.matchday.max_turns,
            "Matchday initialized"
        );
        Ok(matchday)
    }
}

/// Apply roster limits and checks, recording problems as diagnostics.
fn admit_units(units: Vec<Unit>, max_traits: usize, diagnostics: &mut Vec<Diagnostic>) -> UnitRoster {
    let mut roster = UnitRoster::new();
    for mut unit in units {
        let dropped = unit.truncate_traits(max_traits);
        if !dropped.is_empty() {
            diagnostics.push(Diagnostic {
                turn: 0,
                unit: Some(unit.id.clone()),
                kind: DiagnosticKind::TraitsTruncated,
                detail: format!("dropped traits beyond {max_traits}: {}", dropped.join(", ")),
            });
        }
        if let Some(issue) = check_unit(&unit) {
            diagnostics.push(Diagnostic {
                turn: 0,
                unit: Some(unit.id.clone()),
                kind: DiagnosticKind::RoleIssue,
                detail: issue.to_string(),
            });
        }
        if let Err(id) = roster.insert(unit) {
            diagnostics.push(Diagnostic {
                turn: 0,
                detail: format!("unit {id} registered twice"),
                unit: Some(id),
                kind: DiagnosticKind::DuplicateUnit,
            });
        }
    }
    roster
}

// ---------------------------------------------------------------------------
// Matchday
// ---------------------------------------------------------------------------

/// One orchestrated run across all boards.
pub struct Matchday {
    id: MatchdayId,
    config: MatchdayConfig,
    phase: MatchdayPhase,
    turn: u32,
    oracle: Arc<dyn MoveOracle>,
    selector: Arc<dyn MoveSelector>,
    validator: StatValidator,
    detector: ConvergenceDetector,
    ledger: ParticipationLedger,
    resolver: ConvergenceResolver,
    bus: Arc<EventBus>,
    boards: Vec<Board>,
    units: UnitRoster,
    convergences: Vec<ConvergenceRecord>,
    diagnostics: Vec<Diagnostic>,
    end_reason: Option<EndReason>,
    started_at: DateTime<Utc>,
    pool: rayon::ThreadPool,
}

impl core::fmt::Debug for Matchday {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Matchday")
            .field("id", &self.id)
            .field("phase", &self.phase)
            .field("turn", &self.turn)
            .field("boards", &self.boards.len())
            .field("boards_active", &self.active_boards())
            .field("convergences", &self.convergences.len())
            .field("end_reason", &self.end_reason)
            .finish_non_exhaustive()
    }
}

impl Matchday {
    /// Run one full turn.
    ///
    /// # Errors
    ///
    /// [`MatchdayError::AlreadyCompleted`] once the matchday is over.
    pub fn run_turn(&mut self) -> Result<TurnSummary, MatchdayError> {
        if self.phase == MatchdayPhase::Completed {
            return Err(MatchdayError::AlreadyCompleted);
        }
        self.turn = self.turn.saturating_add(1);
        let turn = self.turn;

        // --- Stepping ---
        self.phase = MatchdayPhase::Stepping;
        let steps = self.step_boards();
        let mut moves = BTreeMap::new();
        let mut newly_terminal = Vec::new();
        for (index, result) in steps {
            match result {
                Ok(step) => {
                    if let Some(notation) = step.notation
                        && let Some(board) = self.boards.get(index)
                    {
                        moves.insert(board.unit().clone(), notation);
                    }
                    if step.outcome.is_some() {
                        newly_terminal.push(index);
                    }
                }
                Err(e) => self.board_failed(index, &e, &mut newly_terminal),
            }
        }
        let moves_played = moves.len();
        let movers: Vec<UnitId> = moves.keys().cloned().collect();

        // --- Converging ---
        self.phase = MatchdayPhase::Converging;
        let eligible = self.ledger.filter(moves);
        let records = self.detector.detect(turn, &eligible);
        self.ledger.record(&records);

        // --- Resolving ---
        self.phase = MatchdayPhase::Resolving;
        for record in &records {
            for payload in self.resolver.resolve(record, &self.units) {
                self.bus.publish(turn, payload);
            }
        }
        self.publish_completions(&newly_terminal);
        let mut delivered = self.drain();

        // --- End of round ---
        let standing: Vec<UnitId> = movers
            .into_iter()
            .filter(|id| self.units.get(id).is_some_and(|u| !u.knocked_out))
            .collect();
        if !standing.is_empty() {
            self.bus
                .publish(turn, EventPayload::RoundEnded { units: standing });
            delivered = delivered.saturating_add(self.drain());
        }

        let knocked_out = self.close_knocked_out();
        if !knocked_out.is_empty() {
            delivered = delivered.saturating_add(self.drain());
        }
        let closed = newly_terminal.len().saturating_add(knocked_out.len());
        let convergences = records.len();
        self.convergences.extend(records);

        let summary = TurnSummary {
            turn,
            moves: moves_played,
            boards_active: self.active_boards(),
            convergences,
            events_delivered: delivered,
            newly_terminal: closed,
        };

        info!(
            turn,
            moves = summary.moves,
            convergences = summary.convergences,
            events = summary.events_delivered,
            boards_active = summary.boards_active,
            "Turn completed"
        );

        if summary.boards_active == 0 {
            self.complete(EndReason::AllBoardsTerminal);
        } else if self.turn_cap_reached() {
            info!(turn, max_turns = self.config.matchday.max_turns, "Turn limit reached");
            self.close_active(BoardOutcome::TurnLimit);
            self.complete(EndReason::TurnLimit);
        } else {
            self.phase = MatchdayPhase::Running;
        }
        Ok(summary)
    }

    /// Cancel at the current turn boundary.
    ///
    /// Running boards are closed as `cancelled` and the matchday moves
    /// straight to `Completed`. Does nothing once completed.
    pub fn cancel(&mut self) {
        if self.phase == MatchdayPhase::Completed {
            return;
        }
        info!(turn = self.turn, "Matchday cancelled");
        self.close_active(BoardOutcome::Cancelled);
        self.complete(EndReason::Cancelled);
    }

    /// Run turns until completion and return the result.
    pub fn run(mut self) -> MatchdayResult {
        while self.phase != MatchdayPhase::Completed {
            if self.run_turn().is_err() {
                break;
            }
        }
        self.finish()
    }

    /// Validate statistics and produce the result.
    ///
    /// A matchday that has not completed is cancelled first.
    pub fn finish(mut self) -> MatchdayResult {
        self.cancel();

        for unit in self.units.iter_mut() {
            for rejection in self.validator.finalize(unit) {
                self.diagnostics.push(Diagnostic {
                    turn: self.turn,
                    unit: Some(unit.id.clone()),
                    kind: DiagnosticKind::StatisticRejected,
                    detail: match rejection.reason {
                        RejectionReason::NonCanonical => {
                            format!("{} is not a canonical statistic", rejection.code)
                        }
                        RejectionReason::DivisionMismatch { domain } => format!(
                            "{} belongs to {domain}, unit is {}",
                            rejection.code, unit.division
                        ),
                    },
                });
            }
        }

        let boards: BTreeMap<&UnitId, &Board> = self.boards.iter().map(|b| (b.unit(), b)).collect();
        let units = self
            .units
            .iter()
            .map(|unit| {
                let board = boards.get(&unit.id);
                UnitReport {
                    id: unit.id.clone(),
                    team: unit.team.clone(),
                    role: unit.role.clone(),
                    division: unit.division,
                    resources: unit.resources,
                    stats: unit.stats.clone(),
                    xp: unit.xp,
                    level: unit.level,
                    knocked_out: unit.knocked_out,
                    outcome: board.and_then(|b| b.outcome()),
                    turns: board.map_or(0, |b| b.turn()),
                    history: board.map(|b| b.history().to_vec()).unwrap_or_default(),
                }
            })
            .collect();

        let end_reason = self.end_reason.unwrap_or(EndReason::Cancelled);
        info!(
            matchday_id = %self.id,
            reason = ?end_reason,
            turns = self.turn,
            convergences = self.convergences.len(),
            diagnostics = self.diagnostics.len(),
            "Matchday completed"
        );

        MatchdayResult {
            matchday_id: self.id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            end_reason,
            turns_played: self.turn,
            units,
            convergences: self.convergences,
            events: self.bus.take_log(),
            diagnostics: self.diagnostics,
        }
    }

    // -----------------------------------------------------------------------
    // Turn internals
    // -----------------------------------------------------------------------

    /// Step every running board on the worker pool.
    fn step_boards(&mut self) -> Vec<(usize, Result<StepResult, BoardError>)> {
        let oracle = self.oracle.as_ref();
        let selector = self.selector.as_ref();
        let boards = &mut self.boards;
        self.pool.install(|| {
            boards
                .par_iter_mut()
                .enumerate()
                .filter(|(_, board)| !board.is_terminal())
                .map(|(index, board)| (index, board.step(oracle, selector)))
                .collect()
        })
    }

    fn board_failed(&mut self, index: usize, error: &BoardError, newly_terminal: &mut Vec<usize>) {
        let Some(board) = self.boards.get_mut(index) else {
            return;
        };
        let unit = board.unit().clone();
        let kind = match error {
            BoardError::IllegalState { .. } => DiagnosticKind::IllegalState,
            BoardError::Oracle { .. } => {
                if board.force_terminal(BoardOutcome::Aborted) {
                    newly_terminal.push(index);
                }
                DiagnosticKind::OracleFailure
            }
        };
        warn!(turn = self.turn, unit = %unit, error = %error, "Board step failed");
        self.diagnostics.push(Diagnostic {
            turn: self.turn,
            unit: Some(unit),
            kind,
            detail: error.to_string(),
        });
    }

    fn publish_completions(&self, indices: &[usize]) {
        for board in indices.iter().filter_map(|&i| self.boards.get(i)) {
            if let Some(outcome) = board.outcome() {
                self.bus.publish(
                    self.turn,
                    ConvergenceResolver::board_completed(board.unit(), outcome, board.turn()),
                );
            }
        }
    }

    /// Close running boards whose unit was knocked out.
    fn close_knocked_out(&mut self) -> Vec<usize> {
        let mut closed = Vec::new();
        for (index, board) in self.boards.iter_mut().enumerate() {
            let down = self
                .units
                .get(board.unit())
                .is_some_and(|u| u.knocked_out);
            if down && board.force_terminal(BoardOutcome::KnockedOut) {
                closed.push(index);
            }
        }
        self.publish_completions(&closed);
        closed
    }

    /// Close every running board with an imposed outcome.
    fn close_active(&mut self, outcome: BoardOutcome) {
        let mut closed = Vec::new();
        for (index, board) in self.boards.iter_mut().enumerate() {
            if board.force_terminal(outcome) {
                closed.push(index);
            }
        }
        if !closed.is_empty() {
            self.publish_completions(&closed);
            self.drain();
        }
    }

    fn drain(&mut self) -> usize {
        let report = self.bus.drain(&mut self.units);
        self.absorb(&report);
        report.delivered
    }

    fn absorb(&mut self, report: &DrainReport) {
        for failure in &report.failures {
            self.diagnostics.push(Diagnostic {
                turn: self.turn,
                unit: None,
                kind: DiagnosticKind::SubscriberFailure,
                detail: format!(
                    "{} failed on {} #{}: {}",
                    failure.subscriber, failure.kind, failure.sequence, failure.message
                ),
            });
        }
        if report.dropped > 0 {
            self.diagnostics.push(Diagnostic {
                turn: self.turn,
                unit: None,
                kind: DiagnosticKind::CascadeDropped,
                detail: format!(
                    "{} cascade events dropped after {} cascaded ({} delivered)",
                    report.dropped, report.cascaded, report.delivered
                ),
            });
        }
    }

    fn complete(&mut self, reason: EndReason) {
        self.phase = MatchdayPhase::Completed;
        self.end_reason = Some(reason);
    }

    const fn turn_cap_reached(&self) -> bool {
        self.config.matchday.max_turns > 0 && self.turn >= self.config.matchday.max_turns
    }

    fn active_boards(&self) -> usize {
        self.boards.iter().filter(|b| !b.is_terminal()).count()
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Matchday identifier.
    pub const fn id(&self) -> MatchdayId {
        self.id
    }

    /// Current phase.
    pub const fn phase(&self) -> MatchdayPhase {
        self.phase
    }

    /// Last turn started (0 before the first).
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Whether the matchday reached `Completed`.
    pub fn is_finished(&self) -> bool {
        self.phase == MatchdayPhase::Completed
    }

    /// Why the matchday ended, once it has.
    pub const fn end_reason(&self) -> Option<EndReason> {
        self.end_reason
    }

    /// Configuration in use.
    pub const fn config(&self) -> &MatchdayConfig {
        &self.config
    }

    /// Current unit state.
    pub const fn units(&self) -> &UnitRoster {
        &self.units
    }

    /// All boards, in unit identifier order.
    pub fn boards(&self) -> &[Board] {
        &self.boards
    }

    /// The board for one unit.
    pub fn board(&self, unit: &UnitId) -> Option<&Board> {
        self.boards.iter().find(|b| b.unit() == unit)
    }

    /// The event bus.
    pub const fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Convergences so far.
    pub fn convergences(&self) -> &[ConvergenceRecord] {
        &self.convergences
    }

    /// Diagnostics so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }
}
