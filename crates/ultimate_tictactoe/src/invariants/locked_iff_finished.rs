//! The active board is locked exactly when the game has an outcome.

use super::super::{ActiveBoard, GameState};
use super::Invariant;

/// Invariant: `winner != null` if and only if `activeBoard == Locked`.
pub struct LockedIffFinished;

impl Invariant<GameState> for LockedIffFinished {
    fn holds(state: &GameState) -> bool {
        state.is_over() == (state.active_board() == ActiveBoard::Locked)
    }

    fn description() -> &'static str {
        "Active board is locked exactly when the game is over"
    }
}
