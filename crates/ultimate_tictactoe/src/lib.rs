//! Ultimate tic-tac-toe game logic.
//!
//! Nine 3x3 sub-boards nested in one 3x3 meta-board. Each move is routed:
//! the cell just played names the sub-board the opponent must play in next,
//! unless that sub-board is already decided or full.
//!
//! # Architecture
//!
//! - **Types**: [`GameState`] is an immutable-per-turn value
//! - **Engine**: [`apply_move`] is the single, pure transition function
//! - **Rules**: [`legal_moves`] and the three-in-a-row predicates
//! - **Contracts / Invariants**: preconditions of a move and the
//!   properties every produced or deserialized state must satisfy
//! - **Encoding**: the numeric state layout consumed by move scorers
//!
//! # Example
//!
//! ```
//! use ultimate_tictactoe::{ActiveBoard, GameState, Move, Position};
//!
//! let state = GameState::new();
//! let next = state
//!     .apply(Move::new(Position::TopLeft, Position::Center))
//!     .expect("legal opening")
//!     .state;
//! assert_eq!(next.active_board(), ActiveBoard::Board(Position::Center));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod action;
pub mod contracts;
pub mod encoding;
mod engine;
pub mod invariants;
mod position;
pub mod rules;
mod types;

pub use action::{Move, Rejected};
pub use engine::{ReplayRejected, Transition, apply_move, replay};
pub use position::{Position, PositionOutOfRange};
pub use rules::{legal_moves, winning_line};
pub use types::{
    ActiveBoard, ActiveBoardOutOfRange, Board, GameState, InvalidState, Outcome, Player, Square,
};
