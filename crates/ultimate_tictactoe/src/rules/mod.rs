//! Game rules for ultimate tic-tac-toe.
//!
//! Pure predicates over boards and states, separated from the transition
//! function so contracts and invariants can compose them.

pub mod draw;
pub mod legal;
pub mod win;

pub use draw::{has_empty, is_full, is_playable};
pub use legal::{is_legal, legal_moves};
pub use win::{LINES, check_line, check_winner, winning_line};
