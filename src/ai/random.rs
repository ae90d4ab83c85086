//! Uniformly random scores; a stand-in opponent and a game generator.

use super::{MoveScorer, ScorerError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use ultimate_tictactoe::encoding::{MOVE_DIM, STATE_DIM};

/// Scores every cell at random, so [`super::select_move`] picks a
/// uniformly random legal move.
#[derive(Debug)]
pub struct RandomScorer {
    rng: Mutex<StdRng>,
}

impl RandomScorer {
    /// Seeded from the OS.
    pub fn new() -> Self {
        Self::from_rng(StdRng::from_entropy())
    }

    /// Deterministic for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self::from_rng(StdRng::seed_from_u64(seed))
    }

    fn from_rng(rng: StdRng) -> Self {
        Self {
            rng: Mutex::new(rng),
        }
    }
}

impl Default for RandomScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl MoveScorer for RandomScorer {
    fn score(&self, _encoded: &[f32; STATE_DIM]) -> Result<Vec<f32>, ScorerError> {
        let mut rng = self.rng.lock().map_err(|e| ScorerError::Shape {
            detail: format!("random source poisoned: {}", e),
        })?;
        Ok((0..MOVE_DIM).map(|_| rng.r#gen::<f32>()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::select_move;
    use ultimate_tictactoe::GameState;
    use ultimate_tictactoe::rules::is_legal;

    #[test]
    fn test_random_moves_are_legal() {
        let scorer = RandomScorer::seeded(42);
        let mut state = GameState::new();
        while let Some(mv) = select_move(&state, &scorer).unwrap() {
            assert!(is_legal(&state, mv));
            state = state.apply(mv).unwrap().state;
        }
        assert!(state.is_over());
    }

    #[test]
    fn test_seeded_scores_repeat() {
        let a = RandomScorer::seeded(7).score(&[0.0; STATE_DIM]).unwrap();
        let b = RandomScorer::seeded(7).score(&[0.0; STATE_DIM]).unwrap();
        assert_eq!(a, b);
    }
}
