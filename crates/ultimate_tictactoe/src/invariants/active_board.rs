//! The active board always names a playable sub-board and follows routing.

use super::super::rules::is_playable;
use super::super::{ActiveBoard, GameState};
use super::Invariant;

/// Invariant: a required sub-board is playable, and after a known last
/// move the constraint is the routed board (or any board when the routed
/// one is decided or full).
pub struct ActiveBoardPlayable;

impl Invariant<GameState> for ActiveBoardPlayable {
    fn holds(state: &GameState) -> bool {
        if let ActiveBoard::Board(board) = state.active_board()
            && !is_playable(state, board)
        {
            return false;
        }

        match (state.last_move(), state.active_board()) {
            (_, ActiveBoard::Locked) | (None, _) => true,
            (Some(last), active) => {
                let routed = if is_playable(state, last.cell) {
                    ActiveBoard::Board(last.cell)
                } else {
                    ActiveBoard::Any
                };
                active == routed
            }
        }
    }

    fn description() -> &'static str {
        "Active board is playable and follows the last move"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Move, Position, replay};

    #[test]
    fn test_routed_state_holds() {
        let state = replay(&[Move::from_indices(0, 7).unwrap()]).unwrap();
        assert!(ActiveBoardPlayable::holds(&state));
    }

    #[test]
    fn test_misrouted_state_violates() {
        let mut state = replay(&[Move::from_indices(0, 7).unwrap()]).unwrap();
        state.set_turn(state.current_player(), ActiveBoard::Board(Position::TopLeft));
        assert!(!ActiveBoardPlayable::holds(&state));
    }

    #[test]
    fn test_free_choice_after_known_move_violates_when_routed_board_open() {
        let mut state = replay(&[Move::from_indices(0, 7).unwrap()]).unwrap();
        state.set_turn(state.current_player(), ActiveBoard::Any);
        assert!(!ActiveBoardPlayable::holds(&state));
    }
}
