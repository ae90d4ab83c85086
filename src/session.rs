//! A live game: state, play mode, input gating and the reactions that
//! follow every accepted move.

use crate::persistence::{KeyValueStore, PersistedGame, Persistence, RoomRecord};
use crate::sync::{PeerSession, Received, Role, RoomId, WireMessage};
use derive_more::{Display, Error, From};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};
use ultimate_tictactoe::{GameState, Move, Outcome, Player, Rejected, Transition};

/// How a game is being played.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum GameMode {
    /// Two humans sharing one input.
    #[default]
    Two,
    /// One human against the AI.
    Ai,
    /// Two peers over a data channel.
    Online,
}

/// Where a move came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOrigin {
    /// The local player's input.
    Local,
    /// The scheduled AI turn.
    Ai,
}

/// A move refused before or by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error, From)]
pub enum InputError {
    /// The current player belongs to someone else.
    #[display("Not your turn: {expected} to move")]
    NotYourTurn {
        /// Who is to move.
        expected: Player,
    },

    /// Spectators never move.
    #[display("Spectators cannot move")]
    Spectator,

    /// Online play without an open channel.
    #[display("Not connected to a peer")]
    Disconnected,

    /// The engine refused the move.
    #[display("{_0}")]
    #[from]
    Rejected(Rejected),
}

/// An accepted local move and the messages to send because of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// The engine's transition.
    pub transition: Transition,
    /// Messages for the peer, empty offline.
    pub outbound: Vec<WireMessage>,
}

/// One game in progress.
///
/// Every state change goes through here so persistence and peer
/// propagation react to it the same way.
#[derive(Debug)]
pub struct GameSession<S> {
    state: GameState,
    mode: GameMode,
    human_side: Player,
    persistence: Persistence<S>,
    peer: Option<PeerSession>,
}

impl<S: KeyValueStore> GameSession<S> {
    /// Starts a fresh offline game.
    #[instrument(skip(persistence))]
    pub fn new(persistence: Persistence<S>, mode: GameMode, human_side: Player) -> Self {
        info!("Starting new game");
        let session = Self {
            state: GameState::new(),
            mode,
            human_side,
            persistence,
            peer: None,
        };
        session.persist();
        session
    }

    /// Resumes the saved offline game when it was played in the same
    /// mode and side, otherwise starts fresh.
    #[instrument(skip(persistence))]
    pub fn resume(persistence: Persistence<S>, mode: GameMode, human_side: Player) -> Self {
        match persistence.load_game() {
            Some(saved) if *saved.game_mode() == mode && *saved.human_side() == human_side => {
                let (mode, human_side, state) = saved.into_parts();
                info!(moves = state.move_count(), "Resuming saved game");
                Self {
                    state,
                    mode,
                    human_side,
                    persistence,
                    peer: None,
                }
            }
            Some(_) => {
                debug!("Saved game is for another mode");
                Self::new(persistence, mode, human_side)
            }
            None => Self::new(persistence, mode, human_side),
        }
    }

    /// Starts or resumes an online game for `peer`'s room.
    ///
    /// A saved record for the same room supplies the starting state.
    #[instrument(skip(persistence, peer), fields(room = %peer.room()))]
    pub fn online(persistence: Persistence<S>, peer: PeerSession) -> Self {
        let state = persistence
            .load_room(peer.room())
            .map(|record| {
                let (_, state) = record.into_session();
                state
            })
            .unwrap_or_default();
        let human_side = peer.role().player().unwrap_or(Player::X);
        let session = Self {
            state,
            mode: GameMode::Online,
            human_side,
            persistence,
            peer: Some(peer),
        };
        session.persist();
        session
    }

    /// Rebuilds an online game from its saved room record.
    #[instrument(skip(persistence))]
    pub fn rejoin(persistence: Persistence<S>, room: &RoomId) -> Option<Self> {
        let record = persistence.load_room(room)?;
        let (peer, state) = record.into_session();
        info!(role = %peer.role(), moves = state.move_count(), "Rejoining room");
        Some(Self {
            human_side: peer.role().player().unwrap_or(Player::X),
            state,
            mode: GameMode::Online,
            persistence,
            peer: Some(peer),
        })
    }

    /// Current state.
    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Play mode.
    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// The local human's side in AI mode.
    pub fn human_side(&self) -> Player {
        self.human_side
    }

    /// The peer session, in online mode.
    pub fn peer(&self) -> Option<&PeerSession> {
        self.peer.as_ref()
    }

    /// The persistence adapter.
    pub fn persistence(&self) -> &Persistence<S> {
        &self.persistence
    }

    /// Whether the AI should move next.
    pub fn ai_due(&self) -> bool {
        self.mode == GameMode::Ai
            && !self.state.is_over()
            && self.state.current_player() != self.human_side
    }

    /// Input gate for a move from `origin`, checked before the engine.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] when `origin` may not move now.
    pub fn check_input(&self, origin: MoveOrigin) -> Result<(), InputError> {
        let current = self.state.current_player();
        match (self.mode, origin) {
            (GameMode::Two, MoveOrigin::Local) => Ok(()),
            (GameMode::Ai, MoveOrigin::Local) if current == self.human_side => Ok(()),
            (GameMode::Ai, MoveOrigin::Ai) if current != self.human_side => Ok(()),
            (GameMode::Online, MoveOrigin::Local) => match &self.peer {
                Some(peer) => peer.check_turn(&self.state),
                None => Err(InputError::Disconnected),
            },
            _ => Err(InputError::NotYourTurn { expected: current }),
        }
    }

    /// Gates, applies and propagates a move.
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] when gated out or rejected by the engine;
    /// the state is unchanged.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub fn submit(&mut self, mv: Move, origin: MoveOrigin) -> Result<Applied, InputError> {
        if let Err(e) = self.check_input(origin) {
            debug!(error = %e, "Input gated");
            return Err(e);
        }
        let transition = self.state.apply(mv)?;
        self.state = transition.state.clone();

        let outbound = self
            .peer
            .as_ref()
            .map(|peer| peer.announce_move(transition.applied, &self.state))
            .unwrap_or_default();
        self.persist();

        if let Some(outcome) = self.state.winner() {
            info!(%outcome, "Game over");
        }
        Ok(Applied {
            transition,
            outbound,
        })
    }

    /// Handles one inbound peer message.
    #[instrument(skip(self, text))]
    pub fn receive(&mut self, text: &str) -> Received {
        let Some(peer) = self.peer.as_mut() else {
            warn!("Peer message without a room");
            return Received::Ignored;
        };
        let received = peer.receive(&self.state, text);
        if let Some(state) = received.state() {
            self.state = state.clone();
        }
        if !matches!(received, Received::Ignored) {
            self.persist();
        }
        received
    }

    /// Clears the board; returns the messages to send.
    #[instrument(skip(self))]
    pub fn reset(&mut self) -> Vec<WireMessage> {
        info!("Resetting game");
        self.state = GameState::new();
        self.persist();
        self.peer
            .as_ref()
            .map(PeerSession::announce_reset)
            .unwrap_or_default()
    }

    /// The channel opened; returns the opening messages.
    pub fn peer_opened(&mut self, remote: Option<&str>) -> Vec<WireMessage> {
        let outbound = match self.peer.as_mut() {
            Some(peer) => peer.opened(&self.state, remote),
            None => Vec::new(),
        };
        self.persist();
        outbound
    }

    /// The channel closed. State is kept.
    pub fn peer_closed(&mut self) {
        if let Some(peer) = self.peer.as_mut() {
            peer.closed();
        }
    }

    /// Leaves the room, deleting its record.
    #[instrument(skip(self))]
    pub fn leave(self) {
        if let Some(peer) = &self.peer {
            info!(room = %peer.room(), "Leaving room");
            self.persistence.remove_room(peer.room());
        }
    }

    /// One-line status for the player.
    ///
    /// `ai_ready` tells whether an AI model is loaded.
    pub fn status(&self, ai_ready: bool) -> String {
        let current = self.state.current_player();
        match (self.state.winner(), self.mode, &self.peer) {
            (Some(Outcome::Winner(p)), _, _) => format!("{} wins!", p),
            (Some(Outcome::Draw), _, _) => "Draw!".to_string(),
            (None, GameMode::Online, Some(peer)) => {
                let role = *peer.role();
                if role == Role::Spectator {
                    format!("Watching: {}'s turn", current)
                } else if !peer.is_connected() {
                    format!("Connecting... (You are {})", role)
                } else if role.player() != Some(current) {
                    format!("Waiting for opponent... (You are {})", role)
                } else {
                    format!("Your turn ({})", role)
                }
            }
            (None, GameMode::Online, None) => "Not connected".to_string(),
            (None, GameMode::Ai, _) if current != self.human_side => {
                if ai_ready {
                    "AI thinking…".to_string()
                } else {
                    "AI model not loaded".to_string()
                }
            }
            (None, _, _) => format!("{}'s turn", current),
        }
    }

    fn persist(&self) {
        match (&self.peer, self.mode) {
            (Some(peer), _) => self
                .persistence
                .save_room(&RoomRecord::capture(peer, &self.state)),
            (None, GameMode::Online) => {}
            (None, mode) => self.persistence.save_game(&PersistedGame::new(
                mode,
                self.human_side,
                self.state.clone(),
            )),
        }
    }
}
