//! First-class invariants for ultimate tic-tac-toe.
//!
//! Invariants are logical properties that must hold for every state the
//! engine produces. They back the debug-build postcondition of
//! `apply_move` and the validation of every deserialized state.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// A property relating the state before and after one transition.
pub trait TransitionInvariant<S> {
    /// Checks if the invariant holds across the transition.
    fn holds(before: &S, after: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;

    /// The violation reported when [`TransitionInvariant::holds`] fails.
    fn violation() -> InvariantViolation {
        InvariantViolation::new(Self::description())
    }
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples of invariants; every member is checked so the
/// error lists all violations, not just the first.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

macro_rules! impl_invariant_set {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let mut violations = Vec::new();
                $(
                    if !<$inv as Invariant<S>>::holds(state) {
                        violations.push(InvariantViolation::new(
                            <$inv as Invariant<S>>::description(),
                        ));
                    }
                )+
                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

impl_invariant_set!(I1, I2);
impl_invariant_set!(I1, I2, I3);
impl_invariant_set!(I1, I2, I3, I4);
impl_invariant_set!(I1, I2, I3, I4, I5);

pub mod active_board;
pub mod board_consistency;
pub mod locked_iff_finished;
pub mod monotonic_cells;
pub mod turn_parity;

pub use active_board::ActiveBoardPlayable;
pub use board_consistency::{BigBoardConsistent, OutcomeConsistent};
pub use locked_iff_finished::LockedIffFinished;
pub use monotonic_cells::MonotonicCells;
pub use turn_parity::TurnParity;

/// Every state invariant as a composable set.
pub type StateInvariants = (
    LockedIffFinished,
    BigBoardConsistent,
    OutcomeConsistent,
    ActiveBoardPlayable,
    TurnParity,
);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GameState, Move, replay};

    #[test]
    fn test_invariant_set_holds_for_empty_game() {
        assert!(StateInvariants::check_all(&GameState::new()).is_ok());
    }

    #[test]
    fn test_invariant_set_holds_after_moves() {
        let moves: Vec<Move> = [(4, 4), (4, 0), (0, 0), (0, 4)]
            .into_iter()
            .map(|(b, c)| Move::from_indices(b, c).unwrap())
            .collect();
        let state = replay(&moves).unwrap();
        assert!(StateInvariants::check_all(&state).is_ok());
    }

    #[test]
    fn test_invariant_set_lists_every_violation() {
        let mut state = GameState::new();
        // Locked without a winner, and X has "moved" twice.
        state.set_turn(crate::Player::O, crate::ActiveBoard::Locked);
        let violations = StateInvariants::check_all(&state).unwrap_err();
        assert!(violations.len() >= 2);
    }

    #[test]
    fn test_two_invariants_as_set() {
        type TwoInvariants = (LockedIffFinished, TurnParity);
        assert!(TwoInvariants::check_all(&GameState::new()).is_ok());
    }
}
