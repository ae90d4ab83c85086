//! Legal move generation.

use super::super::{ActiveBoard, GameState, Move, Position};
use super::draw::is_playable;
use tracing::instrument;

/// Returns every legal move, recomputed from the state on each call.
///
/// Empty when the game is locked. Otherwise the cross product of the
/// candidate sub-boards (the active one, or every undecided one) with
/// their empty cells, in index order.
#[instrument(skip(state), fields(active = ?state.active_board()))]
pub fn legal_moves(state: &GameState) -> Vec<Move> {
    let boards: Vec<Position> = match state.active_board() {
        ActiveBoard::Locked => return Vec::new(),
        ActiveBoard::Board(board) => vec![board],
        ActiveBoard::Any => Position::ALL
            .into_iter()
            .filter(|&b| state.big_board().is_empty(b))
            .collect(),
    };

    boards
        .into_iter()
        .flat_map(|board| {
            let small = state.small_board(board);
            Position::ALL
                .into_iter()
                .filter(move |&cell| small.is_empty(cell))
                .map(move |cell| Move::new(board, cell))
        })
        .collect()
}

/// Whether `mv` is in [`legal_moves`] without building the whole list.
pub fn is_legal(state: &GameState, mv: Move) -> bool {
    state.active_board().admits(mv.board)
        && is_playable(state, mv.board)
        && state.small_board(mv.board).is_empty(mv.cell)
}
