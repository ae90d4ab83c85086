//! Contract-based validation for ultimate tic-tac-toe.
//!
//! Contracts define correctness through preconditions and postconditions:
//! {P(state, action)} apply_move {Q(before, after)}.

use super::action::{Move, Rejected};
use super::invariants::{InvariantSet, MonotonicCells, StateInvariants, TransitionInvariant};
use super::types::{ActiveBoard, GameState};
use tracing::instrument;

// ─────────────────────────────────────────────────────────────
//  Contract Trait
// ─────────────────────────────────────────────────────────────

/// Preconditions and postconditions for a state transition.
pub trait Contract<S, A> {
    /// Checks preconditions before applying the action.
    fn pre(state: &S, action: &A) -> Result<(), Rejected>;

    /// Checks postconditions after applying the action.
    fn post(before: &S, after: &S) -> Result<(), Rejected>;
}

// ─────────────────────────────────────────────────────────────
//  Move Preconditions
// ─────────────────────────────────────────────────────────────

/// Precondition 1: the game is not over.
pub struct GameNotOver;

impl GameNotOver {
    /// Fails with [`Rejected::GameOver`] once a winner is set.
    pub fn check(_mov: &Move, state: &GameState) -> Result<(), Rejected> {
        if state.is_over() {
            Err(Rejected::GameOver)
        } else {
            Ok(())
        }
    }
}

/// Precondition 2: the move targets an admitted, undecided sub-board.
pub struct BoardIsActive;

impl BoardIsActive {
    /// Fails with [`Rejected::WrongBoard`] when another board is required,
    /// or [`Rejected::BoardDecided`] when a free choice lands on a won board.
    pub fn check(mov: &Move, state: &GameState) -> Result<(), Rejected> {
        match state.active_board() {
            ActiveBoard::Board(required) if required != mov.board => Err(Rejected::WrongBoard {
                required,
                attempted: mov.board,
            }),
            ActiveBoard::Any if !state.big_board().is_empty(mov.board) => {
                Err(Rejected::BoardDecided { board: mov.board })
            }
            ActiveBoard::Locked => Err(Rejected::GameOver),
            _ => Ok(()),
        }
    }
}

/// Precondition 3: the target cell is empty.
pub struct CellIsEmpty;

impl CellIsEmpty {
    /// Fails with [`Rejected::CellOccupied`] when the cell is marked.
    pub fn check(mov: &Move, state: &GameState) -> Result<(), Rejected> {
        if state.small_board(mov.board).is_empty(mov.cell) {
            Ok(())
        } else {
            Err(Rejected::CellOccupied {
                board: mov.board,
                cell: mov.cell,
            })
        }
    }
}

/// Composite precondition, checked in order, first failure wins.
pub struct LegalMove;

impl LegalMove {
    /// Validates all preconditions for a move.
    #[instrument(skip(state))]
    pub fn check(mov: &Move, state: &GameState) -> Result<(), Rejected> {
        GameNotOver::check(mov, state)?;
        BoardIsActive::check(mov, state)?;
        CellIsEmpty::check(mov, state)?;
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────
//  Move Contract (Pre + Post)
// ─────────────────────────────────────────────────────────────

/// Contract for move actions.
///
/// Postconditions: every state invariant holds on the new state and the
/// transition only added the mover's mark.
pub struct MoveContract;

impl Contract<GameState, Move> for MoveContract {
    fn pre(state: &GameState, action: &Move) -> Result<(), Rejected> {
        LegalMove::check(action, state)
    }

    fn post(before: &GameState, after: &GameState) -> Result<(), Rejected> {
        let mut violations = StateInvariants::check_all(after)
            .err()
            .unwrap_or_default();
        if !MonotonicCells::holds(before, after) {
            violations.push(MonotonicCells::violation());
        }

        if violations.is_empty() {
            Ok(())
        } else {
            let descriptions = violations
                .iter()
                .map(|v| v.description.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            Err(Rejected::InvariantViolation(format!(
                "Postcondition failed: {}",
                descriptions
            )))
        }
    }
}
