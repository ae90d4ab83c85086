//! Meta-board cells and the outcome agree with the sub-boards.

use super::super::rules::{check_winner, is_playable};
use super::super::{GameState, Outcome, Position, Square};
use super::Invariant;

/// Invariant: `bigBoard[i]` is set iff sub-board `i` has a completed line.
///
/// A drawn sub-board (full, no line) keeps an empty meta-board cell.
pub struct BigBoardConsistent;

impl Invariant<GameState> for BigBoardConsistent {
    fn holds(state: &GameState) -> bool {
        Position::ALL.into_iter().all(|board| {
            let expected = check_winner(state.small_board(board))
                .map_or(Square::Empty, Square::Occupied);
            state.big_board().get(board) == expected
        })
    }

    fn description() -> &'static str {
        "Meta-board cells match the sub-boards' completed lines"
    }
}

/// Invariant: the outcome matches the meta-board.
///
/// - `Winner(p)`: `p` owns a meta-board line.
/// - `Draw`: no meta-board line and no undecided sub-board has room.
/// - in progress: no meta-board line and some move remains.
pub struct OutcomeConsistent;

impl Invariant<GameState> for OutcomeConsistent {
    fn holds(state: &GameState) -> bool {
        let line_owner = check_winner(state.big_board());
        let room_left = Position::ALL
            .into_iter()
            .any(|board| is_playable(state, board));

        match state.winner() {
            Some(Outcome::Winner(p)) => line_owner == Some(p),
            Some(Outcome::Draw) => line_owner.is_none() && !room_left,
            None => line_owner.is_none() && room_left,
        }
    }

    fn description() -> &'static str {
        "Outcome matches the meta-board"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Move, Player, replay};

    #[test]
    fn test_claimed_board_without_line_violates() {
        let mut state = GameState::new();
        state.claim_board(Position::Center, Player::X);
        assert!(!BigBoardConsistent::holds(&state));
    }

    #[test]
    fn test_played_game_holds() {
        let state = replay(&[Move::from_indices(4, 4).unwrap()]).unwrap();
        assert!(BigBoardConsistent::holds(&state));
        assert!(OutcomeConsistent::holds(&state));
    }

    #[test]
    fn test_premature_draw_violates() {
        let mut state = GameState::new();
        state.finish(Outcome::Draw);
        assert!(!OutcomeConsistent::holds(&state));
    }

    #[test]
    fn test_winner_without_line_violates() {
        let mut state = GameState::new();
        state.finish(Outcome::Winner(Player::O));
        assert!(!OutcomeConsistent::holds(&state));
    }
}
