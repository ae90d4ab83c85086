//! Move scoring seam and greedy move selection.

use derive_more::{Display, Error, From};
use tracing::{debug, instrument};
use ultimate_tictactoe::encoding::{MOVE_DIM, STATE_DIM, encode_state, move_to_index};
use ultimate_tictactoe::{GameState, Move, legal_moves};

/// Errors from loading or running a scorer.
#[derive(Debug, Display, Error, From)]
pub enum ScorerError {
    /// No model is loaded.
    #[display("AI model not loaded")]
    Unavailable,

    /// Layer sizes do not chain from the input to the 81 scores.
    #[display("Model shape error: {detail}")]
    Shape {
        /// What did not line up.
        detail: String,
    },

    /// The model file could not be read.
    #[display("Failed to read model: {_0}")]
    #[from]
    Io(std::io::Error),

    /// The model file is not valid JSON for a model.
    #[display("Failed to parse model: {_0}")]
    #[from]
    Json(serde_json::Error),
}

/// Scores all 81 cells for an encoded state.
///
/// Higher is better. Scores for illegal cells are ignored by the caller.
pub trait MoveScorer: Send + Sync {
    /// Scores every cell for `encoded`.
    ///
    /// # Errors
    ///
    /// Returns [`ScorerError`] when no scores can be produced.
    fn score(&self, encoded: &[f32; STATE_DIM]) -> Result<Vec<f32>, ScorerError>;

    /// Whether this scorer can produce moves at all.
    fn is_ready(&self) -> bool {
        true
    }
}

/// A scorer that always reports [`ScorerError::Unavailable`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl MoveScorer for Unavailable {
    fn score(&self, _encoded: &[f32; STATE_DIM]) -> Result<Vec<f32>, ScorerError> {
        Err(ScorerError::Unavailable)
    }

    fn is_ready(&self) -> bool {
        false
    }
}

/// Picks the legal move with the highest score.
///
/// Ties go to the lowest flat index; NaN scores never win. Returns
/// `Ok(None)` when no move is legal.
///
/// # Errors
///
/// Returns [`ScorerError`] when the scorer fails or returns the wrong
/// number of scores.
#[instrument(skip(state, scorer), fields(player = %state.current_player()))]
pub fn select_move(state: &GameState, scorer: &dyn MoveScorer) -> Result<Option<Move>, ScorerError> {
    let legal = legal_moves(state);
    if legal.is_empty() {
        return Ok(None);
    }

    let scores = scorer.score(&encode_state(state))?;
    if scores.len() != MOVE_DIM {
        return Err(ScorerError::Shape {
            detail: format!("expected {} scores, got {}", MOVE_DIM, scores.len()),
        });
    }

    let mut best: Option<(Move, f32)> = None;
    for mv in legal {
        let score = scores[move_to_index(mv)];
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, top)) if top >= score => {}
            _ => best = Some((mv, score)),
        }
    }
    // All-NaN scores still yield a move.
    let choice = best.map(|(mv, _)| mv).or_else(|| legal_moves(state).first().copied());
    debug!(choice = ?choice, "Move selected");
    Ok(choice)
}
