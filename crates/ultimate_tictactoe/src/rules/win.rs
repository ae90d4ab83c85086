//! Three-in-a-row detection, shared by both board levels.

use super::super::{Board, Player, Position, Square};

/// The eight winning lines: rows, columns, diagonals.
pub const LINES: [[Position; 3]; 8] = [
    // Rows
    [Position::TopLeft, Position::TopCenter, Position::TopRight],
    [Position::MiddleLeft, Position::Center, Position::MiddleRight],
    [Position::BottomLeft, Position::BottomCenter, Position::BottomRight],
    // Columns
    [Position::TopLeft, Position::MiddleLeft, Position::BottomLeft],
    [Position::TopCenter, Position::Center, Position::BottomCenter],
    [Position::TopRight, Position::MiddleRight, Position::BottomRight],
    // Diagonals
    [Position::TopLeft, Position::Center, Position::BottomRight],
    [Position::TopRight, Position::Center, Position::BottomLeft],
];

/// True when `a`, `b` and `c` hold the same non-empty mark.
pub fn check_line(board: &Board, a: Position, b: Position, c: Position) -> bool {
    let sq = board.get(a);
    sq != Square::Empty && sq == board.get(b) && sq == board.get(c)
}

/// Returns the first completed line on the board.
///
/// On the meta-board this is the set of winning cells.
pub fn winning_line(board: &Board) -> Option<[Position; 3]> {
    LINES
        .into_iter()
        .find(|&[a, b, c]| check_line(board, a, b, c))
}

/// Returns the player owning a completed line, if any.
pub fn check_winner(board: &Board) -> Option<Player> {
    winning_line(board).and_then(|[a, _, _]| board.get(a).player())
}
