//! Fixed-size numeric encoding of a state for move-scoring models.
//!
//! Layout (101 values, from the mover's point of view: +1 own mark,
//! -1 opponent mark, 0 empty):
//!
//! | range    | content                                    |
//! |----------|--------------------------------------------|
//! | 0..9     | meta-board cells                           |
//! | 9..90    | sub-board cells, `9 + big * 9 + small`     |
//! | 90       | +1 when X is to move, -1 when O is          |
//! | 91..101  | one-hot active board: 91 any, 92 + i board i |
//!
//! A locked state leaves the one-hot block all zero.

use super::rules::legal_moves;
use super::{ActiveBoard, GameState, Move, Player, Position, Square};

/// Length of an encoded state.
pub const STATE_DIM: usize = 9 + 81 + 1 + 10;

/// Number of cells a model scores.
pub const MOVE_DIM: usize = 81;

/// Flattens a move to `big * 9 + small`.
pub fn move_to_index(mv: Move) -> usize {
    mv.board.to_index() * 9 + mv.cell.to_index()
}

/// Inverse of [`move_to_index`]; `None` past 80.
pub fn index_to_move(index: usize) -> Option<Move> {
    Move::from_indices(index / 9, index % 9).filter(|_| index < MOVE_DIM)
}

/// Encodes `state` for a model.
pub fn encode_state(state: &GameState) -> [f32; STATE_DIM] {
    let me = state.current_player();
    let value = |sq: Square| match sq {
        Square::Empty => 0.0,
        Square::Occupied(p) if p == me => 1.0,
        Square::Occupied(_) => -1.0,
    };

    let mut out = [0.0; STATE_DIM];
    for board in Position::ALL {
        out[board.to_index()] = value(state.big_board().get(board));
        for cell in Position::ALL {
            out[9 + move_to_index(Move::new(board, cell))] =
                value(state.small_board(board).get(cell));
        }
    }

    out[90] = if me == Player::X { 1.0 } else { -1.0 };

    match state.active_board() {
        ActiveBoard::Any => out[91] = 1.0,
        ActiveBoard::Board(board) => out[92 + board.to_index()] = 1.0,
        ActiveBoard::Locked => {}
    }

    out
}

/// 1.0 where the flattened move is legal, 0.0 elsewhere.
pub fn legal_mask(state: &GameState) -> [f32; MOVE_DIM] {
    let mut mask = [0.0; MOVE_DIM];
    for mv in legal_moves(state) {
        mask[move_to_index(mv)] = 1.0;
    }
    mask
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_index_bijection() {
        for i in 0..MOVE_DIM {
            let mv = index_to_move(i).unwrap();
            assert_eq!(move_to_index(mv), i);
        }
        assert_eq!(index_to_move(81), None);
    }

    #[test]
    fn test_opening_encoding() {
        let enc = encode_state(&GameState::new());
        assert_eq!(enc[90], 1.0);
        assert_eq!(enc[91], 1.0);
        assert_eq!(enc.iter().filter(|v| **v != 0.0).count(), 2);
    }

    #[test]
    fn test_encoding_is_from_movers_view() {
        let state = GameState::new()
            .apply(Move::from_indices(2, 3).unwrap())
            .unwrap()
            .state;
        let enc = encode_state(&state);
        // O to move: X's mark is the opponent's.
        assert_eq!(enc[9 + 2 * 9 + 3], -1.0);
        assert_eq!(enc[90], -1.0);
        assert_eq!(enc[91], 0.0);
        assert_eq!(enc[92 + 3], 1.0);
    }

    #[test]
    fn test_legal_mask_matches_routing() {
        let state = GameState::new()
            .apply(Move::from_indices(0, 8).unwrap())
            .unwrap()
            .state;
        let mask = legal_mask(&state);
        assert_eq!(mask.iter().sum::<f32>(), 9.0);
        assert_eq!(mask[8 * 9], 1.0);
    }
}
