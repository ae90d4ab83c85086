//! AI opponent: a scoring seam, a JSON policy network, and random play.

mod policy;
mod random;
mod scorer;

pub use policy::PolicyModel;
pub use random::RandomScorer;
pub use scorer::{MoveScorer, ScorerError, Unavailable, select_move};
