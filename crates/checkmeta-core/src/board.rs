//! Board Simulation Unit: one unit's game, advanced one move per turn.
//!
//! A [`Board`] holds the oracle position, the turn counter, the move
//! history, and its own forked [`Dice`] for move selection. It never
//! touches unit resources; those change only through events.

use serde::{Deserialize, Serialize};
use tracing::debug;

use checkmeta_types::{BoardOutcome, UnitId};

use crate::dice::Dice;
use crate::oracle::{GameResult, MoveOracle, MoveSelector, OracleError, Position};

/// Errors that can occur while stepping a board.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    /// `step` was called on a board that already has an outcome.
    #[error("board for {unit} is already terminal ({outcome})")]
    IllegalState {
        /// The board's unit.
        unit: UnitId,
        /// The outcome it already reached.
        outcome: BoardOutcome,
    },

    /// The move oracle failed.
    #[error("oracle error on board {unit}: {source}")]
    Oracle {
        /// The board's unit.
        unit: UnitId,
        /// The underlying oracle error.
        source: OracleError,
    },
}

/// What one call to [`Board::step`] produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepResult {
    /// Board turn counter after the step.
    pub turn: u32,
    /// Notation of the move played, if any.
    pub notation: Option<String>,
    /// Set when this step made the board terminal.
    pub outcome: Option<BoardOutcome>,
}

impl StepResult {
    /// Whether the board became terminal on this step.
    pub const fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }
}

/// One unit's game.
#[derive(Debug, Clone)]
pub struct Board {
    unit: UnitId,
    position: Position,
    turn: u32,
    outcome: Option<BoardOutcome>,
    history: Vec<String>,
    dice: Dice,
}

impl Board {
    /// Open a board for `unit` at the oracle's initial position.
    pub fn start(unit: UnitId, oracle: &dyn MoveOracle, dice: Dice) -> Result<Self, BoardError> {
        let position = oracle
            .initial_position(&unit)
            .map_err(|source| BoardError::Oracle {
                unit: unit.clone(),
                source,
            })?;
        Ok(Self {
            unit,
            position,
            turn: 0,
            outcome: None,
            history: Vec::new(),
            dice,
        })
    }

    /// A board that never started because its oracle failed.
    pub(crate) fn aborted(unit: UnitId, dice: Dice) -> Self {
        Self {
            unit,
            position: Position::new(""),
            turn: 0,
            outcome: Some(BoardOutcome::Aborted),
            history: Vec::new(),
            dice,
        }
    }

    /// Advance one turn.
    ///
    /// Queries the oracle for legal moves, lets `selector` pick one, and
    /// applies it. No legal moves makes the board [`BoardOutcome::Stalled`]
    /// without advancing the turn counter. An oracle game-over maps to
    /// `Won`, `Lost`, or `Drawn`.
    ///
    /// # Errors
    ///
    /// [`BoardError::IllegalState`] if the board is already terminal;
    /// [`BoardError::Oracle`] if the oracle rejects the position or move.
    pub fn step(
        &mut self,
        oracle: &dyn MoveOracle,
        selector: &dyn MoveSelector,
    ) -> Result<StepResult, BoardError> {
        if let Some(outcome) = self.outcome {
            return Err(BoardError::IllegalState {
                unit: self.unit.clone(),
                outcome,
            });
        }

        let moves = oracle
            .legal_moves(&self.position)
            .map_err(|source| self.oracle_error(source))?;
        if moves.is_empty() {
            self.outcome = Some(BoardOutcome::Stalled);
            debug!(unit = %self.unit, turn = self.turn, "Board stalled");
            return Ok(StepResult {
                turn: self.turn,
                notation: None,
                outcome: self.outcome,
            });
        }

        let chosen = selector
            .select(&self.unit, &moves, &mut self.dice)
            .and_then(|i| moves.get(i))
            .or_else(|| moves.first());
        let Some(mv) = chosen else {
            return Ok(StepResult {
                turn: self.turn,
                notation: None,
                outcome: None,
            });
        };

        let transition = oracle
            .apply(&self.position, mv)
            .map_err(|source| self.oracle_error(source))?;
        self.position = transition.position;
        self.history.push(mv.notation().to_owned());
        self.turn = self.turn.saturating_add(1);
        self.outcome = transition.game_over.map(|result| match result {
            GameResult::UnitWon => BoardOutcome::Won,
            GameResult::UnitLost => BoardOutcome::Lost,
            GameResult::Drawn => BoardOutcome::Drawn,
        });

        Ok(StepResult {
            turn: self.turn,
            notation: Some(mv.notation().to_owned()),
            outcome: self.outcome,
        })
    }

    /// Mark the board terminal with an imposed outcome.
    ///
    /// Returns `false` and leaves the board unchanged if it already has
    /// an outcome.
    pub fn force_terminal(&mut self, outcome: BoardOutcome) -> bool {
        if self.outcome.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }

    fn oracle_error(&self, source: OracleError) -> BoardError {
        BoardError::Oracle {
            unit: self.unit.clone(),
            source,
        }
    }

    /// The unit playing this board.
    pub const fn unit(&self) -> &UnitId {
        &self.unit
    }

    /// Current oracle position.
    pub const fn position(&self) -> &Position {
        &self.position
    }

    /// Moves played so far.
    pub const fn turn(&self) -> u32 {
        self.turn
    }

    /// Terminal outcome, if reached.
    pub const fn outcome(&self) -> Option<BoardOutcome> {
        self.outcome
    }

    /// Whether the board has an outcome.
    pub const fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// Move notations, one per completed turn.
    pub fn history(&self) -> &[String] {
        &self.history
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::oracle::{FirstMoveSelector, Move, ScriptedLine, ScriptedOracle, Transition};

    fn oracle() -> ScriptedOracle {
        ScriptedOracle::new()
            .with_line("A1", ScriptedLine::finite(["e4", "e5", "Nf3"], Some(GameResult::UnitLost)))
            .with_line("A2", ScriptedLine::finite(["d4"], None))
    }

    #[test]
    fn plays_line_to_game_over() {
        let oracle = oracle();
        let mut board = Board::start(UnitId::from("A1"), &oracle, Dice::seeded(1)).unwrap();
        assert_eq!(board.turn(), 0);

        let first = board.step(&oracle, &FirstMoveSelector).unwrap();
        assert_eq!(first.notation.as_deref(), Some("e4"));
        assert!(!first.is_terminal());
        board.step(&oracle, &FirstMoveSelector).unwrap();
        let last = board.step(&oracle, &FirstMoveSelector).unwrap();

        assert_eq!(last.turn, 3);
        assert_eq!(last.outcome, Some(BoardOutcome::Lost));
        assert_eq!(board.history(), ["e4", "e5", "Nf3"]);
    }

    #[test]
    fn stepping_terminal_board_is_illegal() {
        let oracle = oracle();
        let mut board = Board::start(UnitId::from("A1"), &oracle, Dice::seeded(1)).unwrap();
        assert!(board.force_terminal(BoardOutcome::Cancelled));
        assert!(!board.force_terminal(BoardOutcome::TurnLimit));
        assert!(matches!(
            board.step(&oracle, &FirstMoveSelector),
            Err(BoardError::IllegalState {
                outcome: BoardOutcome::Cancelled,
                ..
            })
        ));
        assert!(board.history().is_empty());
    }

    #[test]
    fn no_legal_moves_stalls_without_advancing() {
        let oracle = oracle();
        let mut board = Board::start(UnitId::from("A2"), &oracle, Dice::seeded(1)).unwrap();
        board.step(&oracle, &FirstMoveSelector).unwrap();
        let stalled = board.step(&oracle, &FirstMoveSelector).unwrap();
        assert_eq!(stalled.outcome, Some(BoardOutcome::Stalled));
        assert_eq!(stalled.notation, None);
        assert_eq!(board.turn(), 1);
    }

    #[test]
    fn unknown_unit_fails_to_start() {
        let oracle = oracle();
        assert!(matches!(
            Board::start(UnitId::from("Q1"), &oracle, Dice::seeded(1)),
            Err(BoardError::Oracle { .. })
        ));
    }

    struct BrokenOracle;

    impl MoveOracle for BrokenOracle {
        fn initial_position(&self, _unit: &UnitId) -> Result<Position, OracleError> {
            Ok(Position::new("start"))
        }

        fn legal_moves(&self, _position: &Position) -> Result<Vec<Move>, OracleError> {
            Ok(vec![Move::new("e4")])
        }

        fn apply(&self, position: &Position, mv: &Move) -> Result<Transition, OracleError> {
            Err(OracleError::IllegalMove {
                position: position.to_string(),
                notation: mv.notation().to_owned(),
            })
        }
    }

    #[test]
    fn oracle_failure_leaves_board_untouched() {
        let mut board = Board::start(UnitId::from("A1"), &BrokenOracle, Dice::seeded(1)).unwrap();
        assert!(matches!(
            board.step(&BrokenOracle, &FirstMoveSelector),
            Err(BoardError::Oracle { .. })
        ));
        assert_eq!(board.turn(), 0);
        assert!(!board.is_terminal());
    }

    struct OutOfRange;

    impl MoveSelector for OutOfRange {
        fn select(&self, _unit: &UnitId, _moves: &[Move], _dice: &mut Dice) -> Option<usize> {
            Some(99)
        }
    }

    #[test]
    fn bad_selection_falls_back_to_first_move() {
        let oracle = oracle();
        let mut board = Board::start(UnitId::from("A1"), &oracle, Dice::seeded(1)).unwrap();
        let step = board.step(&oracle, &OutOfRange).unwrap();
        assert_eq!(step.notation.as_deref(), Some("e4"));
    }
}
