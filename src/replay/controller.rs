//! Step-through playback of a recorded game.

use super::{ReplayError, ReplayFile};
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use ultimate_tictactoe::{GameState, Move, Outcome, ReplayRejected, replay};

/// Where the controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
pub enum ReplayPhase {
    /// Loaded, nothing shown yet.
    Idle,
    /// Rebuilding a state from the start.
    Seeking,
    /// Advancing on a timer.
    Playing,
    /// Stopped before the end.
    Paused,
    /// Showing the final position.
    Finished,
}

/// Replays a fixed move list through the engine.
///
/// Moves go through the same `apply` entry point as live play but have
/// no persistence or network side effects.
#[derive(Debug, Clone)]
pub struct ReplayController {
    moves: Arc<[Move]>,
    result: Option<Outcome>,
    step: usize,
    state: GameState,
    phase: ReplayPhase,
}

impl ReplayController {
    /// Loads a recording at step 0.
    pub fn new(file: ReplayFile) -> Self {
        Self {
            moves: file.moves.into(),
            result: file.result,
            step: 0,
            state: GameState::new(),
            phase: ReplayPhase::Idle,
        }
    }

    /// Number of recorded moves.
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Whether the recording has no moves.
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Moves applied so far.
    pub fn step(&self) -> usize {
        self.step
    }

    /// State after [`Self::step`] moves.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Current phase.
    pub fn phase(&self) -> ReplayPhase {
        self.phase
    }

    /// The recorded result label.
    pub fn result(&self) -> Option<Outcome> {
        self.result
    }

    /// The recorded moves.
    pub fn moves(&self) -> &[Move] {
        &self.moves
    }

    /// Rebuilds the state after `step` moves, clamped to the recording.
    ///
    /// Playback keeps running if it was.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Corrupt`] when a move before `step` is
    /// refused; the controller stops, paused, just before that move.
    #[instrument(skip(self), fields(len = self.len()))]
    pub fn seek_to(&mut self, step: usize) -> Result<&GameState, ReplayError> {
        let target = step.min(self.len());
        let was_playing = self.phase == ReplayPhase::Playing;
        self.phase = ReplayPhase::Seeking;

        match replay(&self.moves[..target]) {
            Ok(state) => {
                self.state = state;
                self.step = target;
                self.settle(was_playing);
                debug!(step = self.step, phase = %self.phase, "Seek complete");
                Ok(&self.state)
            }
            Err(rejected) => Err(self.halt(rejected)),
        }
    }

    /// Applies the next move. Returns `false` at the end.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Corrupt`] when the move is refused.
    pub fn advance(&mut self) -> Result<bool, ReplayError> {
        let Some(&action) = self.moves.get(self.step) else {
            self.phase = ReplayPhase::Finished;
            return Ok(false);
        };
        match self.state.apply(action) {
            Ok(transition) => {
                self.state = transition.state;
                self.step += 1;
                let playing = self.phase == ReplayPhase::Playing;
                self.settle(playing);
                Ok(true)
            }
            Err(reason) => Err(self.halt(ReplayRejected {
                index: self.step,
                action,
                reason,
            })),
        }
    }

    /// Steps back one move and pauses. Returns `false` at step 0.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Corrupt`] if rebuilding the state fails.
    pub fn retreat(&mut self) -> Result<bool, ReplayError> {
        if self.step == 0 {
            return Ok(false);
        }
        self.pause();
        self.seek_to(self.step - 1)?;
        Ok(true)
    }

    /// Starts playback. Returns `false` when already at the end.
    pub fn play(&mut self) -> bool {
        if self.step >= self.len() {
            self.phase = ReplayPhase::Finished;
            return false;
        }
        self.phase = ReplayPhase::Playing;
        true
    }

    /// Stops playback. Returns `false` when not playing.
    pub fn pause(&mut self) -> bool {
        if self.phase == ReplayPhase::Playing {
            self.phase = ReplayPhase::Paused;
            true
        } else {
            false
        }
    }

    /// One playback tick. Returns whether playback continues.
    ///
    /// Each tick rebuilds the state for `step + 1` from the recording
    /// rather than stepping the held state.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Corrupt`] when the next move is refused.
    pub fn tick(&mut self) -> Result<bool, ReplayError> {
        if self.phase != ReplayPhase::Playing {
            return Ok(false);
        }
        if self.step >= self.len() {
            self.phase = ReplayPhase::Finished;
            return Ok(false);
        }
        self.seek_to(self.step + 1)?;
        Ok(self.phase == ReplayPhase::Playing)
    }

    /// `Step i / n`, or `Finished: <result>` at the end of a labelled
    /// recording.
    pub fn label(&self) -> String {
        match self.result {
            Some(result) if self.step >= self.len() => format!("Finished: {}", result),
            _ => format!("Step {} / {}", self.step, self.len()),
        }
    }

    fn settle(&mut self, playing: bool) {
        self.phase = if self.step >= self.len() {
            ReplayPhase::Finished
        } else if playing {
            ReplayPhase::Playing
        } else {
            ReplayPhase::Paused
        };
    }

    fn halt(&mut self, rejected: ReplayRejected) -> ReplayError {
        warn!(error = %rejected, "Recording stopped at a refused move");
        // Every move before the refused one was accepted by this same replay.
        self.state = replay(&self.moves[..rejected.index]).unwrap_or_default();
        self.step = rejected.index;
        self.phase = ReplayPhase::Paused;
        ReplayError::Corrupt(rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ultimate_tictactoe::Player;

    fn mv(board: usize, cell: usize) -> Move {
        Move::from_indices(board, cell).unwrap()
    }

    fn recording() -> ReplayFile {
        ReplayFile::new(vec![mv(4, 4), mv(4, 0), mv(0, 4)], None)
    }

    #[test]
    fn test_starts_idle_at_zero() {
        let controller = ReplayController::new(recording());
        assert_eq!(controller.phase(), ReplayPhase::Idle);
        assert_eq!(controller.step(), 0);
        assert_eq!(controller.label(), "Step 0 / 3");
    }

    #[test]
    fn test_seek_clamps_and_matches_stepping() {
        let mut stepped = ReplayController::new(recording());
        while stepped.advance().unwrap() {}
        assert_eq!(stepped.phase(), ReplayPhase::Finished);

        let mut seeked = ReplayController::new(recording());
        seeked.seek_to(99).unwrap();
        assert_eq!(seeked.step(), 3);
        assert_eq!(seeked.state(), stepped.state());
        assert_eq!(seeked.phase(), ReplayPhase::Finished);

        seeked.seek_to(1).unwrap();
        assert_eq!(seeked.phase(), ReplayPhase::Paused);
        assert_eq!(seeked.state().current_player(), Player::O);
    }

    #[test]
    fn test_retreat_pauses_playback() {
        let mut controller = ReplayController::new(recording());
        assert!(controller.play());
        assert!(controller.tick().unwrap());
        assert!(controller.retreat().unwrap());
        assert_eq!(controller.phase(), ReplayPhase::Paused);
        assert_eq!(controller.step(), 0);
        assert!(!controller.retreat().unwrap());
    }

    #[test]
    fn test_playback_finishes() {
        let mut controller = ReplayController::new(recording());
        assert!(controller.play());
        assert!(controller.tick().unwrap());
        assert!(controller.tick().unwrap());
        assert!(!controller.tick().unwrap());
        assert_eq!(controller.phase(), ReplayPhase::Finished);
        assert!(!controller.play());
        assert!(!controller.pause());
    }

    #[test]
    fn test_tick_rebuilds_from_recording() {
        let mut controller = ReplayController::new(recording());
        controller.play();
        assert!(controller.tick().unwrap());
        // A state that drifted from the recording is replaced on the next tick.
        controller.state = GameState::new();
        assert!(controller.tick().unwrap());
        assert_eq!(controller.step(), 2);
        assert_eq!(controller.state(), &replay(&[mv(4, 4), mv(4, 0)]).unwrap());
    }

    #[test]
    fn test_corrupt_recording_halts() {
        // The third move ignores the routed board.
        let file = ReplayFile::new(vec![mv(4, 4), mv(4, 0), mv(5, 5)], None);
        let mut controller = ReplayController::new(file);
        let err = controller.seek_to(3).unwrap_err();
        assert!(matches!(err, ReplayError::Corrupt(ReplayRejected { index: 2, .. })));
        assert_eq!(controller.step(), 2);
        assert_eq!(controller.phase(), ReplayPhase::Paused);
        assert!(controller.advance().is_err());
        assert_eq!(controller.step(), 2);
    }

    #[test]
    fn test_finished_label_uses_result() {
        let file = ReplayFile::new(vec![mv(4, 4)], Some(Outcome::Draw));
        let mut controller = ReplayController::new(file);
        controller.seek_to(1).unwrap();
        assert_eq!(controller.label(), "Finished: Draw");
    }
}
