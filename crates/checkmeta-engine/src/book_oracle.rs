//! A deterministic opening-book move oracle for demo matchdays.
//!
//! Every board starts from the same empty position. While a position is
//! covered by the book, the legal moves are the book continuations of that
//! line, so boards that stay in book keep offering each other the same
//! notation and converge often. Out of book, each ply offers a fixed
//! four-move menu from a rotating pool. A game ends after `game_length`
//! plies and is scored from a hash of the move sequence.
//!
//! This is not chess: it only has to be legal by its own rules and
//! reproducible.

use checkmeta_core::oracle::{GameResult, Move, MoveOracle, OracleError, Position, Transition};
use checkmeta_types::UnitId;

/// Opening lines, one ply per token.
const BOOK: &[&str] = &[
    "e4 e5 Nf3 Nc6 Bb5 a6 Ba4 Nf6",
    "e4 e5 Nf3 Nc6 Bc4 Bc5 c3 Nf6",
    "e4 e5 Nf3 Nf6 Nxe5 d6 Nf3 Nxe4",
    "e4 c5 Nf3 d6 d4 cxd4 Nxd4 Nf6",
    "e4 c5 Nc3 Nc6 g3 g6 Bg2 Bg7",
    "e4 e6 d4 d5 Nc3 Bb4 e5 c5",
    "e4 c6 d4 d5 Nc3 dxe4 Nxe4 Bf5",
    "d4 d5 c4 e6 Nc3 Nf6 Bg5 Be7",
    "d4 d5 c4 c6 Nf3 Nf6 Nc3 dxc4",
    "d4 Nf6 c4 g6 Nc3 Bg7 e4 d6",
    "d4 Nf6 c4 e6 Nc3 Bb4 Qc2 O-O",
    "c4 e5 Nc3 Nf6 g3 d5 cxd5 Nxd5",
    "Nf3 d5 g3 Nf6 Bg2 c6 O-O Bg4",
];

/// Out-of-book move pool.
const POOL: &[&str] = &[
    "h3", "a3", "Re1", "Qd2", "Rd1", "Bd3", "Nd2", "c3", "Kh1", "Rb1", "b4", "g3", "Qe2", "Rc1",
    "Bf4", "a4",
];

/// Moves offered per out-of-book ply.
const MENU_SIZE: usize = 4;

/// Deterministic opening-book oracle.
#[derive(Debug, Clone)]
pub struct BookOracle {
    game_length: u32,
}

impl BookOracle {
    /// Create an oracle whose games end after `game_length` plies.
    ///
    /// A length of 0 means games never end on their own.
    pub const fn new(game_length: u32) -> Self {
        Self { game_length }
    }

    fn plies(position: &Position) -> Vec<&str> {
        position.as_str().split_whitespace().collect()
    }

    fn continuations(played: &[&str]) -> Vec<Move> {
        let mut moves: Vec<&str> = Vec::new();
        for line in BOOK {
            let mut tokens = line.split_whitespace();
            if played.iter().all(|p| tokens.next() == Some(*p))
                && let Some(next) = tokens.next()
                && !moves.contains(&next)
            {
                moves.push(next);
            }
        }
        if moves.is_empty() {
            moves = POOL
                .iter()
                .cycle()
                .skip(played.len())
                .step_by(3)
                .take(MENU_SIZE)
                .copied()
                .collect();
        }
        moves.into_iter().map(Move::new).collect()
    }

    fn score(position: &Position) -> GameResult {
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in position.as_str().bytes() {
            hash ^= u64::from(byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        match hash.checked_rem(3) {
            Some(0) => GameResult::UnitWon,
            Some(1) => GameResult::UnitLost,
            _ => GameResult::Drawn,
        }
    }
}

impl MoveOracle for BookOracle {
    fn initial_position(&self, _unit: &UnitId) -> Result<Position, OracleError> {
        Ok(Position::new(""))
    }

    fn legal_moves(&self, position: &Position) -> Result<Vec<Move>, OracleError> {
        Ok(Self::continuations(&Self::plies(position)))
    }

    fn apply(&self, position: &Position, mv: &Move) -> Result<Transition, OracleError> {
        let played = Self::plies(position);
        if !Self::continuations(&played).contains(mv) {
            return Err(OracleError::IllegalMove {
                position: position.to_string(),
                notation: mv.notation().to_owned(),
            });
        }

        let next = if played.is_empty() {
            Position::new(mv.notation())
        } else {
            Position::new(format!("{} {}", position.as_str(), mv.notation()))
        };
        let ply = u32::try_from(played.len().saturating_add(1)).unwrap_or(u32::MAX);
        let game_over = (self.game_length > 0 && ply >= self.game_length).then(|| Self::score(&next));
        Ok(Transition {
            position: next,
            game_over,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn notations(moves: &[Move]) -> Vec<&str> {
        moves.iter().map(Move::notation).collect()
    }

    #[test]
    fn opening_offers_book_first_moves() {
        let oracle = BookOracle::new(40);
        let start = oracle.initial_position(&UnitId::from("A1")).unwrap();
        assert_eq!(
            notations(&oracle.legal_moves(&start).unwrap()),
            ["e4", "d4", "c4", "Nf3"]
        );
    }

    #[test]
    fn book_lines_branch_on_shared_prefix() {
        let oracle = BookOracle::new(40);
        let after = oracle
            .apply(&Position::new("e4"), &Move::new("e5"))
            .unwrap()
            .position;
        assert_eq!(after.as_str(), "e4 e5");
        assert_eq!(notations(&oracle.legal_moves(&after).unwrap()), ["Nf3"]);
    }

    #[test]
    fn out_of_book_offers_a_menu() {
        let oracle = BookOracle::new(40);
        let deep = Position::new("e4 e5 Nf3 Nc6 Bb5 a6 Ba4 Nf6");
        let moves = oracle.legal_moves(&deep).unwrap();
        assert_eq!(moves.len(), MENU_SIZE);
        let next = oracle.apply(&deep, &moves[0]).unwrap();
        assert!(next.game_over.is_none());
    }

    #[test]
    fn illegal_move_is_rejected() {
        let oracle = BookOracle::new(40);
        let err = oracle
            .apply(&Position::new(""), &Move::new("Ke2"))
            .unwrap_err();
        assert!(matches!(err, OracleError::IllegalMove { .. }));
    }

    #[test]
    fn game_ends_at_length_with_stable_score() {
        let oracle = BookOracle::new(2);
        let first = oracle.apply(&Position::new(""), &Move::new("d4")).unwrap();
        assert!(first.game_over.is_none());
        let second = oracle.apply(&first.position, &Move::new("d5")).unwrap();
        let result = second.game_over.unwrap();
        let again = oracle.apply(&first.position, &Move::new("d5")).unwrap();
        assert_eq!(again.game_over, Some(result));
    }

    #[test]
    fn zero_length_never_ends() {
        let oracle = BookOracle::new(0);
        let mut position = Position::new("");
        for _ in 0..60 {
            let moves = oracle.legal_moves(&position).unwrap();
            let transition = oracle.apply(&position, &moves[0]).unwrap();
            assert!(transition.game_over.is_none());
            position = transition.position;
        }
    }
}
