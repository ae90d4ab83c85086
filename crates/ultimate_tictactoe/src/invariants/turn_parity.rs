//! Turn parity: X moves first and players alternate strictly.

use super::super::{GameState, Player, Square};
use super::Invariant;

/// Invariant: mark counts match the player to move.
///
/// With X first and a flip on every accepted move, X is to move when both
/// sides have placed the same number of marks and O when X leads by one.
/// A known last move must carry the previous mover's mark.
pub struct TurnParity;

impl Invariant<GameState> for TurnParity {
    fn holds(state: &GameState) -> bool {
        let (x, o) = state
            .small_boards()
            .iter()
            .fold((0, 0), |(x, o), b| (x + b.count(Player::X), o + b.count(Player::O)));

        let expected = if x == o {
            Player::X
        } else if x == o + 1 {
            Player::O
        } else {
            return false;
        };

        if state.current_player() != expected {
            return false;
        }

        match state.last_move() {
            None => true,
            Some(last) => {
                state.small_board(last.board).get(last.cell)
                    == Square::Occupied(state.current_player().opponent())
            }
        }
    }

    fn description() -> &'static str {
        "Players alternate turns (X, O, X, O, ...)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Move, replay};

    #[test]
    fn test_empty_game_holds() {
        assert!(TurnParity::holds(&GameState::new()));
    }

    #[test]
    fn test_alternating_sequence_holds() {
        let moves: Vec<Move> = [(4, 4), (4, 8), (8, 0), (0, 4), (4, 2)]
            .into_iter()
            .map(|(b, c)| Move::from_indices(b, c).unwrap())
            .collect();
        let state = replay(&moves).unwrap();
        assert!(TurnParity::holds(&state));
        assert_eq!(state.current_player(), Player::O);
    }

    #[test]
    fn test_same_player_twice_violates() {
        let mut state = GameState::new();
        state.place(Move::from_indices(0, 0).unwrap(), Player::X);
        state.place(Move::from_indices(1, 0).unwrap(), Player::X);
        state.set_turn(Player::O, state.active_board());
        assert!(!TurnParity::holds(&state));
    }
}
