//! Monotonic cells: a mark, once placed, never changes.

use super::super::{GameState, Player, Position, Square};
use super::TransitionInvariant;

/// Invariant: one transition adds exactly one mark and overwrites nothing.
///
/// Meta-board cells follow the same rule: once claimed, never changed.
pub struct MonotonicCells;

impl TransitionInvariant<GameState> for MonotonicCells {
    fn holds(before: &GameState, after: &GameState) -> bool {
        let kept = |b: Square, a: Square| b == Square::Empty || b == a;

        for board in Position::ALL {
            if !kept(before.big_board().get(board), after.big_board().get(board)) {
                return false;
            }
            let (sb, sa) = (before.small_board(board), after.small_board(board));
            if !Position::ALL
                .into_iter()
                .all(|cell| kept(sb.get(cell), sa.get(cell)))
            {
                return false;
            }
        }

        let marks = |s: &GameState| {
            s.small_boards()
                .iter()
                .map(|b| b.count(Player::X) + b.count(Player::O))
                .sum::<usize>()
        };
        marks(after) == marks(before) + 1
    }

    fn description() -> &'static str {
        "Cells are monotonic (exactly one new mark, never overwritten)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Move;

    #[test]
    fn test_single_move_holds() {
        let before = GameState::new();
        let after = before.apply(Move::from_indices(4, 4).unwrap()).unwrap().state;
        assert!(MonotonicCells::holds(&before, &after));
    }

    #[test]
    fn test_no_change_violates() {
        let state = GameState::new();
        assert!(!MonotonicCells::holds(&state, &state));
    }

    #[test]
    fn test_overwrite_violates() {
        let before = GameState::new()
            .apply(Move::from_indices(4, 4).unwrap())
            .unwrap()
            .state;
        let mut after = before.clone();
        after.place(Move::from_indices(4, 4).unwrap(), Player::O);
        after.place(Move::from_indices(4, 0).unwrap(), Player::O);
        assert!(!MonotonicCells::holds(&before, &after));
    }
}
