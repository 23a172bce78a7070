//! Move oracle and move selection interfaces.
//!
//! The chess rules live outside this crate. A [`MoveOracle`] enumerates
//! legal moves for an opaque [`Position`] and applies a move to produce
//! the next position plus an optional game result. A [`MoveSelector`]
//! picks one of the legal moves; the default [`RandomSelector`] draws from
//! the board's own [`Dice`].
//!
//! [`ScriptedOracle`] replays fixed move lines per unit and is what the
//! tests and demos drive boards with.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use checkmeta_types::UnitId;

use crate::dice::Dice;

/// Errors reported by a move oracle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OracleError {
    /// The oracle does not recognise the position.
    #[error("unknown position: {position}")]
    UnknownPosition {
        /// The offending position.
        position: String,
    },

    /// The move is not legal in the position.
    #[error("illegal move {notation} in position {position}")]
    IllegalMove {
        /// The position the move was applied to.
        position: String,
        /// The rejected move.
        notation: String,
    },

    /// The oracle has no game for this unit.
    #[error("no game for unit {unit}")]
    UnknownUnit {
        /// The unit whose board could not be started.
        unit: UnitId,
    },
}

/// An oracle-owned position. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    /// Wrap an oracle position encoding.
    pub fn new(encoding: impl Into<String>) -> Self {
        Self(encoding.into())
    }

    /// The oracle's encoding.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Position {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A move, identified by its notation.
///
/// Notation is the convergence key: two boards converge when they play
/// moves with equal notation on the same turn.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Move(String);

impl Move {
    /// Create a move from its notation.
    pub fn new(notation: impl Into<String>) -> Self {
        Self(notation.into())
    }

    /// The move notation.
    pub fn notation(&self) -> &str {
        &self.0
    }
}

/// Final result of a game from the unit's side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
    /// The unit's side won.
    UnitWon,
    /// The unit's side lost.
    UnitLost,
    /// Drawn game.
    Drawn,
}

/// The result of applying a move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Position after the move.
    pub position: Position,
    /// Set when the move ended the game.
    pub game_over: Option<GameResult>,
}

/// Legal-move enumeration and position transitions.
///
/// Implementations are shared across the board-stepping worker pool and
/// must be callable concurrently.
pub trait MoveOracle: Send + Sync {
    /// Starting position for a unit's board.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if the oracle cannot start a game for `unit`.
    fn initial_position(&self, unit: &UnitId) -> Result<Position, OracleError>;

    /// Legal moves in `position`. Empty means the side to move is stuck.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if the position is not recognised.
    fn legal_moves(&self, position: &Position) -> Result<Vec<Move>, OracleError>;

    /// Apply `mv` to `position`.
    ///
    /// # Errors
    ///
    /// Returns [`OracleError`] if the position is unknown or the move is
    /// not legal in it.
    fn apply(&self, position: &Position, mv: &Move) -> Result<Transition, OracleError>;
}

/// Chooses one move from a non-empty legal move list.
pub trait MoveSelector: Send + Sync {
    /// Index into `moves` of the chosen move. Out-of-range or `None`
    /// falls back to the first move.
    fn select(&self, unit: &UnitId, moves: &[Move], dice: &mut Dice) -> Option<usize>;
}

/// Picks uniformly at random using the board's dice.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSelector;

impl MoveSelector for RandomSelector {
    fn select(&self, _unit: &UnitId, moves: &[Move], dice: &mut Dice) -> Option<usize> {
        dice.pick_index(moves.len())
    }
}

/// Always plays the first legal move.
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstMoveSelector;

impl MoveSelector for FirstMoveSelector {
    fn select(&self, _unit: &UnitId, _moves: &[Move], _dice: &mut Dice) -> Option<usize> {
        Some(0)
    }
}

// ---------------------------------------------------------------------------
// ScriptedOracle
// ---------------------------------------------------------------------------

/// A fixed move line for one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedLine {
    moves: Vec<String>,
    result: Option<GameResult>,
    repeat: bool,
}

impl ScriptedLine {
    /// Play `moves` in order, then end the game with `result`.
    ///
    /// With `result = None` the board runs out of legal moves after the
    /// last one and stalls.
    pub fn finite<I, S>(moves: I, result: Option<GameResult>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            moves: moves.into_iter().map(Into::into).collect(),
            result,
            repeat: false,
        }
    }

    /// Cycle through `moves` forever; the game never ends on its own.
    pub fn repeating<I, S>(moves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            moves: moves.into_iter().map(Into::into).collect(),
            result: None,
            repeat: true,
        }
    }

    fn move_at(&self, ply: usize) -> Option<&str> {
        if self.repeat && !self.moves.is_empty() {
            let idx = ply.checked_rem(self.moves.len())?;
            return self.moves.get(idx).map(String::as_str);
        }
        self.moves.get(ply).map(String::as_str)
    }
}

/// Replays one [`ScriptedLine`] per unit.
///
/// Positions are encoded as `<unit>#<ply>`; each position offers exactly
/// one legal move, the next one in the unit's line.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOracle {
    lines: BTreeMap<UnitId, ScriptedLine>,
}

impl ScriptedOracle {
    /// An oracle with no lines.
    pub const fn new() -> Self {
        Self {
            lines: BTreeMap::new(),
        }
    }

    /// Builder-style line assignment.
    #[must_use]
    pub fn with_line(mut self, unit: impl Into<UnitId>, line: ScriptedLine) -> Self {
        self.lines.insert(unit.into(), line);
        self
    }

    fn decode(&self, position: &Position) -> Result<(&UnitId, &ScriptedLine, usize), OracleError> {
        let unknown = || OracleError::UnknownPosition {
            position: position.to_string(),
        };
        let (unit, ply) = position.as_str().rsplit_once('#').ok_or_else(unknown)?;
        let ply: usize = ply.parse().map_err(|_| unknown())?;
        let (unit, line) = self
            .lines
            .get_key_value(&UnitId::from(unit))
            .ok_or_else(unknown)?;
        Ok((unit, line, ply))
    }
}

impl MoveOracle for ScriptedOracle {
    fn initial_position(&self, unit: &UnitId) -> Result<Position, OracleError> {
        if self.lines.contains_key(unit) {
            Ok(Position::new(format!("{unit}#0")))
        } else {
            Err(OracleError::UnknownUnit { unit: unit.clone() })
        }
    }

    fn legal_moves(&self, position: &Position) -> Result<Vec<Move>, OracleError> {
        let (_, line, ply) = self.decode(position)?;
        Ok(line.move_at(ply).map(Move::new).into_iter().collect())
    }

    fn apply(&self, position: &Position, mv: &Move) -> Result<Transition, OracleError> {
        let (unit, line, ply) = self.decode(position)?;
        if line.move_at(ply) != Some(mv.notation()) {
            return Err(OracleError::IllegalMove {
                position: position.to_string(),
                notation: mv.notation().to_owned(),
            });
        }
        let next = ply.saturating_add(1);
        let game_over = if !line.repeat && next >= line.moves.len() {
            line.result
        } else {
            None
        };
        Ok(Transition {
            position: Position::new(format!("{unit}#{next}")),
            game_over,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn oracle() -> ScriptedOracle {
        ScriptedOracle::new()
            .with_line("A1", ScriptedLine::finite(["e4", "Nf3"], Some(GameResult::UnitWon)))
            .with_line("B1", ScriptedLine::repeating(["d4", "c4"]))
    }

    #[test]
    fn finite_line_ends_with_result() {
        let oracle = oracle();
        let start = oracle.initial_position(&UnitId::from("A1")).unwrap();
        assert_eq!(oracle.legal_moves(&start).unwrap(), vec![Move::new("e4")]);

        let t1 = oracle.apply(&start, &Move::new("e4")).unwrap();
        assert_eq!(t1.game_over, None);
        let t2 = oracle.apply(&t1.position, &Move::new("Nf3")).unwrap();
        assert_eq!(t2.game_over, Some(GameResult::UnitWon));
        assert!(oracle.legal_moves(&t2.position).unwrap().is_empty());
    }

    #[test]
    fn repeating_line_never_ends() {
        let oracle = oracle();
        let mut pos = oracle.initial_position(&UnitId::from("B1")).unwrap();
        let mut played = Vec::new();
        for _ in 0..5 {
            let mv = oracle.legal_moves(&pos).unwrap().remove(0);
            let t = oracle.apply(&pos, &mv).unwrap();
            assert_eq!(t.game_over, None);
            played.push(mv.notation().to_owned());
            pos = t.position;
        }
        assert_eq!(played, vec!["d4", "c4", "d4", "c4", "d4"]);
    }

    #[test]
    fn illegal_and_unknown_are_errors() {
        let oracle = oracle();
        let start = oracle.initial_position(&UnitId::from("A1")).unwrap();
        assert!(matches!(
            oracle.apply(&start, &Move::new("h4")),
            Err(OracleError::IllegalMove { .. })
        ));
        assert!(matches!(
            oracle.legal_moves(&Position::new("garbage")),
            Err(OracleError::UnknownPosition { .. })
        ));
        assert!(matches!(
            oracle.initial_position(&UnitId::from("Z9")),
            Err(OracleError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn unit_ids_with_hash_decode() {
        let oracle = ScriptedOracle::new().with_line("A#1", ScriptedLine::repeating(["a3"]));
        let start = oracle.initial_position(&UnitId::from("A#1")).unwrap();
        assert_eq!(oracle.legal_moves(&start).unwrap().len(), 1);
    }

    #[test]
    fn random_selector_stays_in_range() {
        let mut dice = Dice::seeded(8);
        let moves = vec![Move::new("a3"), Move::new("b3"), Move::new("c3")];
        for _ in 0..30 {
            let pick = RandomSelector.select(&UnitId::from("A1"), &moves, &mut dice);
            assert!(pick.is_some_and(|i| i < moves.len()));
        }
    }
}
