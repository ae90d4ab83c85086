//! First-class action types for ultimate tic-tac-toe.
//!
//! Moves are domain events, not side effects. They carry no player: the
//! mover is always the state's current player, which keeps recorded move
//! lists replayable from the empty state.

use super::position::Position;
use serde::{Deserialize, Serialize};

/// A move: a cell inside a sub-board.
///
/// Serialized as `[bigIdx, smallIdx]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(Position, Position)", into = "(Position, Position)")]
pub struct Move {
    /// The sub-board (meta-board cell).
    pub board: Position,
    /// The cell inside that sub-board; also the next routed sub-board.
    pub cell: Position,
}

impl Move {
    /// Creates a new move.
    pub fn new(board: Position, cell: Position) -> Self {
        Self { board, cell }
    }

    /// Creates a move from raw indices, `None` when either is outside 0..=8.
    pub fn from_indices(board: usize, cell: usize) -> Option<Self> {
        Some(Self::new(
            Position::from_index(board)?,
            Position::from_index(cell)?,
        ))
    }

    /// Returns `(bigIdx, smallIdx)`.
    pub fn indices(&self) -> (usize, usize) {
        (self.board.to_index(), self.cell.to_index())
    }
}

impl From<(Position, Position)> for Move {
    fn from((board, cell): (Position, Position)) -> Self {
        Self::new(board, cell)
    }
}

impl From<Move> for (Position, Position) {
    fn from(mv: Move) -> Self {
        (mv.board, mv.cell)
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.board.to_index(), self.cell.to_index())
    }
}

/// Reason a move was rejected. The state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum Rejected {
    /// The game is already over.
    #[display("Game is already over")]
    GameOver,

    /// The move targets a sub-board other than the active one.
    #[display("Must play in board {}, not board {}", required.to_index(), attempted.to_index())]
    WrongBoard {
        /// The sub-board the move must target.
        required: Position,
        /// The sub-board the move targeted.
        attempted: Position,
    },

    /// Free choice, but the targeted sub-board is already won.
    #[display("Board {} is already decided", board.to_index())]
    BoardDecided {
        /// The won sub-board.
        board: Position,
    },

    /// The target cell is already marked.
    #[display("Cell {} of board {} is already occupied", cell.to_index(), board.to_index())]
    CellOccupied {
        /// The sub-board.
        board: Position,
        /// The occupied cell.
        cell: Position,
    },

    /// A postcondition failed after applying the move.
    #[display("Invariant violation: {_0}")]
    InvariantViolation(#[error(not(source))] String),
}
