//! The authoritative transition function.
//!
//! `apply_move` is pure: it reads a state and returns a new one, or a
//! rejection with the input untouched. Persistence, networking and
//! rendering react to the returned value.

use super::action::{Move, Rejected};
use super::contracts::{Contract, MoveContract};
use super::position::Position;
use super::rules::{check_winner, is_playable, legal_moves};
use super::types::{ActiveBoard, GameState, Outcome};
use derive_more::{Display, Error};
use tracing::{debug, instrument, warn};

/// An accepted move and the state it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// The new state.
    pub state: GameState,
    /// The move that was applied, for downstream propagation.
    pub applied: Move,
}

/// Applies a move for the current player.
///
/// Preconditions are checked in order and short-circuit: game not over,
/// board admitted by the active-board constraint and not yet decided,
/// cell empty. A move that passes them always yields a valid state.
///
/// # Errors
///
/// Returns [`Rejected`] when a precondition fails.
#[instrument(skip(state), fields(player = %state.current_player()))]
pub fn apply_move(
    state: &GameState,
    board: Position,
    cell: Position,
) -> Result<Transition, Rejected> {
    let action = Move::new(board, cell);

    if let Err(rejected) = MoveContract::pre(state, &action) {
        warn!(%action, error = %rejected, "Move rejected");
        return Err(rejected);
    }

    let player = state.current_player();
    let mut next = state.clone();
    next.place(action, player);

    if check_winner(next.small_board(board)) == Some(player) && next.claim_board(board, player) {
        debug!(board = board.to_index(), %player, "Sub-board won");
    }

    if check_winner(next.big_board()) == Some(player) {
        next.set_turn(player.opponent(), ActiveBoard::Locked);
        next.finish(Outcome::Winner(player));
    } else {
        let routed = if is_playable(&next, cell) {
            ActiveBoard::Board(cell)
        } else {
            ActiveBoard::Any
        };
        next.set_turn(player.opponent(), routed);

        if legal_moves(&next).is_empty() {
            next.finish(Outcome::Draw);
        }
    }

    debug_assert_eq!(MoveContract::post(state, &next), Ok(()));

    debug!(%action, active = ?next.active_board(), winner = ?next.winner(), "Move applied");

    Ok(Transition {
        state: next,
        applied: action,
    })
}

impl GameState {
    /// Applies `mv` for the current player. See [`apply_move`].
    ///
    /// # Errors
    ///
    /// Returns [`Rejected`] when the move is illegal.
    pub fn apply(&self, mv: Move) -> Result<Transition, Rejected> {
        apply_move(self, mv.board, mv.cell)
    }
}

/// A recorded move list that stops being legal part-way through.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("move {index} ({action}) rejected: {reason}")]
pub struct ReplayRejected {
    /// Zero-based index of the rejected move.
    pub index: usize,
    /// The rejected move.
    pub action: Move,
    /// Why the engine rejected it.
    #[error(source)]
    pub reason: Rejected,
}

/// Replays moves from the empty state.
///
/// Deterministic: the same list always yields the same state.
///
/// # Errors
///
/// Returns [`ReplayRejected`] at the first move the engine refuses.
#[instrument(skip(moves), fields(count = moves.len()))]
pub fn replay(moves: &[Move]) -> Result<GameState, ReplayRejected> {
    moves
        .iter()
        .enumerate()
        .try_fold(GameState::new(), |state, (index, &action)| {
            state
                .apply(action)
                .map(|t| t.state)
                .map_err(|reason| ReplayRejected {
                    index,
                    action,
                    reason,
                })
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Player;
    use crate::Square;

    fn mv(board: usize, cell: usize) -> Move {
        Move::from_indices(board, cell).unwrap()
    }

    #[test]
    fn test_first_move_routes_to_cell() {
        let t = apply_move(&GameState::new(), Position::TopLeft, Position::Center).unwrap();
        assert_eq!(t.applied, mv(0, 4));
        assert_eq!(t.state.current_player(), Player::O);
        assert_eq!(t.state.active_board(), ActiveBoard::Board(Position::Center));
        assert_eq!(
            t.state.small_board(Position::TopLeft).get(Position::Center),
            Square::Occupied(Player::X)
        );
        assert_eq!(t.state.last_move(), Some(mv(0, 4)));
    }

    #[test]
    fn test_game_over_checked_first() {
        let state = replay(&[mv(4, 4)]).unwrap();
        let mut locked = state.clone();
        locked.finish(Outcome::Draw);
        // Wrong board and occupied cell, but the lock is reported first.
        assert_eq!(
            apply_move(&locked, Position::Center, Position::Center),
            Err(Rejected::GameOver)
        );
    }

    #[test]
    fn test_wrong_board_before_occupied() {
        let state = replay(&[mv(4, 4)]).unwrap();
        // Board 0 is not active; board 4 cell 4 is occupied but never reached.
        assert_eq!(
            state.apply(mv(0, 0)),
            Err(Rejected::WrongBoard {
                required: Position::Center,
                attempted: Position::TopLeft,
            })
        );
        assert_eq!(
            state.apply(mv(4, 4)),
            Err(Rejected::CellOccupied {
                board: Position::Center,
                cell: Position::Center,
            })
        );
    }

    #[test]
    fn test_rejection_leaves_state_untouched() {
        let state = replay(&[mv(4, 4)]).unwrap();
        let before = state.clone();
        let _ = state.apply(mv(3, 0));
        assert_eq!(state, before);
    }

    #[test]
    fn test_routing_to_won_board_frees_choice() {
        // X takes board 0 with cells 0, 1, 2.
        let state = replay(&[
            mv(0, 0),
            mv(0, 3),
            mv(3, 1),
            mv(1, 0),
            mv(0, 1),
            mv(1, 3),
            mv(3, 0),
            mv(0, 6),
            mv(6, 2),
            mv(2, 0),
            mv(0, 2),
        ])
        .unwrap();
        assert_eq!(
            state.big_board().get(Position::TopLeft),
            Square::Occupied(Player::X)
        );
        // The winning cell (2) routes to board 2, which is still open.
        assert_eq!(state.active_board(), ActiveBoard::Board(Position::TopRight));

        let next = state.apply(mv(2, 4)).unwrap().state;
        assert_eq!(next.active_board(), ActiveBoard::Board(Position::Center));
        // Cell 0 routes to board 0, which is already won.
        let next = next.apply(mv(4, 0)).unwrap().state;
        assert_eq!(next.active_board(), ActiveBoard::Any);
    }

    #[test]
    fn test_replay_reports_bad_step() {
        let err = replay(&[mv(4, 4), mv(0, 0)]).unwrap_err();
        assert_eq!(err.index, 1);
        assert!(matches!(err.reason, Rejected::WrongBoard { .. }));
    }
}
