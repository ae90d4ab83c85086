//! Timer-driven replay viewer loop.

use super::{ReplayController, ReplayError, ReplayPhase};
use crate::scheduler::Timer;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};
use ultimate_tictactoe::GameState;

/// User actions on a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayCommand {
    /// Step forward.
    Advance,
    /// Step back.
    Retreat,
    /// Jump to a step.
    SeekTo(usize),
    /// Start the timer.
    Play,
    /// Stop the timer.
    Pause,
    /// Leave the viewer.
    Quit,
}

/// What the viewer shows after each change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplayEvent {
    /// The shown position changed.
    Step {
        /// Moves applied.
        step: usize,
        /// Phase after the change.
        phase: ReplayPhase,
        /// Position to render.
        state: GameState,
        /// `Step i / n` or `Finished: ...`.
        label: String,
    },
    /// The recording stopped at a refused move.
    Corrupt(String),
}

fn snapshot(controller: &ReplayController) -> ReplayEvent {
    ReplayEvent::Step {
        step: controller.step(),
        phase: controller.phase(),
        state: controller.state().clone(),
        label: controller.label(),
    }
}

/// Runs the viewer until [`ReplayCommand::Quit`] or the command channel
/// closes, advancing every `interval` while playing.
///
/// # Errors
///
/// Only the event channel closing ends the loop early; corrupt moves are
/// reported as [`ReplayEvent::Corrupt`] and playback stops.
#[instrument(skip_all, fields(len = controller.len(), interval_ms = interval.as_millis() as u64))]
pub async fn run_viewer(
    mut controller: ReplayController,
    interval: Duration,
    mut commands: mpsc::UnboundedReceiver<ReplayCommand>,
    events: mpsc::UnboundedSender<ReplayEvent>,
) -> ReplayController {
    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let mut ticker = Timer::new(tick_tx);
    info!("Replay viewer started");
    if controller.phase() == ReplayPhase::Playing {
        ticker.repeat(interval, ());
    }

    loop {
        let result = tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                debug!(?command, "Replay command");
                match command {
                    ReplayCommand::Quit => break,
                    ReplayCommand::Advance => controller.advance().map(|_| ()),
                    ReplayCommand::Retreat => controller.retreat().map(|_| ()),
                    ReplayCommand::SeekTo(step) => controller.seek_to(step).map(|_| ()),
                    ReplayCommand::Play => {
                        controller.play();
                        Ok(())
                    }
                    ReplayCommand::Pause => {
                        controller.pause();
                        Ok(())
                    }
                }
            }
            Some(fired) = tick_rx.recv() => {
                if ticker.accept(fired).is_none() {
                    continue;
                }
                controller.tick().map(|_| ())
            }
        };

        let event = match result {
            Ok(()) => snapshot(&controller),
            Err(e @ ReplayError::Corrupt(_)) => {
                warn!(error = %e, "Playback halted");
                ReplayEvent::Corrupt(e.to_string())
            }
            Err(e) => ReplayEvent::Corrupt(e.to_string()),
        };
        if events.send(event).is_err() {
            break;
        }

        match (controller.phase(), ticker.is_pending()) {
            (ReplayPhase::Playing, false) => ticker.repeat(interval, ()),
            (ReplayPhase::Playing, true) => {}
            (_, true) => ticker.cancel(),
            (_, false) => {}
        }
    }

    info!(step = controller.step(), "Replay viewer stopped");
    controller
}
