//! Fullness and playability of sub-boards.

use super::super::{Board, GameState, Position, Square};

/// Checks if the board is full (all squares occupied).
pub fn is_full(board: &Board) -> bool {
    board.squares().iter().all(|s| *s != Square::Empty)
}

/// Checks if the board has at least one empty square.
pub fn has_empty(board: &Board) -> bool {
    !is_full(board)
}

/// A sub-board can receive moves when it is undecided and not full.
///
/// A drawn sub-board (full, no line) leaves its meta-board cell empty but
/// is never playable.
pub fn is_playable(state: &GameState, board: Position) -> bool {
    state.big_board().is_empty(board) && has_empty(state.small_board(board))
}
