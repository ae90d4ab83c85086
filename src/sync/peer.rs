//! Per-peer protocol state: roles, connection status and message handling.

use super::{Role, RoomId, SyncError, WireMessage};
use crate::InputError;
use derive_getters::Getters;
use tracing::{debug, info, instrument, warn};
use ultimate_tictactoe::{GameState, Move, Rejected, Transition};

/// One side of a two-peer room.
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
pub struct PeerSession {
    /// Room identifier.
    room: RoomId,
    /// This peer's role.
    role: Role,
    /// The creator's role, once known.
    creator_role: Option<Role>,
    /// Whether this peer created the room.
    is_host: bool,
    /// Last known address of the other side.
    peer_address: Option<String>,
    #[getter(skip)]
    connected: bool,
}

/// What an inbound message did to the local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Received {
    /// A remote move was applied.
    Applied(Transition),
    /// The remote state replaced ours.
    Replaced(GameState),
    /// The remote side reset the game.
    Reset(GameState),
    /// The creator's role was recorded.
    RoleRecorded(Role),
    /// A remote move our engine refused; the next `state` message resyncs.
    Rejected(Rejected),
    /// Unknown or malformed message.
    Ignored,
}

impl Received {
    /// The new local state, when the message produced one.
    pub fn state(&self) -> Option<&GameState> {
        match self {
            Self::Applied(t) => Some(&t.state),
            Self::Replaced(state) | Self::Reset(state) => Some(state),
            Self::RoleRecorded(_) | Self::Rejected(_) | Self::Ignored => None,
        }
    }
}

impl PeerSession {
    /// Creates the room creator's side.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SpectatorHost`] when `role` is a spectator.
    #[instrument]
    pub fn host(room: RoomId, role: Role) -> Result<Self, SyncError> {
        if role == Role::Spectator {
            return Err(SyncError::SpectatorHost);
        }
        info!(%room, %role, "Hosting room");
        Ok(Self {
            room,
            role,
            creator_role: Some(role),
            is_host: true,
            peer_address: None,
            connected: false,
        })
    }

    /// Creates a joiner's side.
    ///
    /// When the creator's role is known the request is checked against
    /// it; otherwise the joiner defaults to `O`.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RoleTaken`] when asking for the creator's side.
    #[instrument]
    pub fn join(
        room: RoomId,
        creator_role: Option<Role>,
        requested: Option<Role>,
        peer_address: Option<String>,
    ) -> Result<Self, SyncError> {
        let role = match creator_role {
            Some(creator) => Role::for_joiner(creator, requested)?,
            None => requested.unwrap_or(Role::O),
        };
        info!(%room, %role, "Joining room");
        Ok(Self {
            room,
            role,
            creator_role,
            is_host: false,
            peer_address,
            connected: false,
        })
    }

    /// Rebuilds a session from persisted fields, disconnected.
    pub fn restore(
        room: RoomId,
        role: Role,
        creator_role: Option<Role>,
        is_host: bool,
        peer_address: Option<String>,
    ) -> Self {
        Self {
            room,
            role,
            creator_role,
            is_host,
            peer_address,
            connected: false,
        }
    }

    /// Whether the data channel is open.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Input gate: may this peer originate a move now?
    ///
    /// # Errors
    ///
    /// Returns [`InputError`] while disconnected, for spectators, or when
    /// the current player belongs to the other side.
    pub fn check_turn(&self, state: &GameState) -> Result<(), InputError> {
        let Some(side) = self.role.player() else {
            return Err(InputError::Spectator);
        };
        if !self.connected {
            return Err(InputError::Disconnected);
        }
        if side != state.current_player() {
            return Err(InputError::NotYourTurn {
                expected: state.current_player(),
            });
        }
        Ok(())
    }

    /// Marks the channel open and returns the opening messages.
    ///
    /// The host announces its role and sends its full state, so both
    /// sides converge however long the channel was down.
    #[instrument(skip(self, state), fields(room = %self.room, host = self.is_host))]
    pub fn opened(&mut self, state: &GameState, remote: Option<&str>) -> Vec<WireMessage> {
        self.connected = true;
        if let Some(addr) = remote {
            self.peer_address = Some(addr.to_string());
        }
        info!("Peer connected");
        if self.is_host {
            vec![
                WireMessage::RoleAnnounce { role: self.role },
                WireMessage::for_state(state),
            ]
        } else {
            Vec::new()
        }
    }

    /// Marks the channel closed. Game state is left alone.
    #[instrument(skip(self), fields(room = %self.room))]
    pub fn closed(&mut self) {
        if self.connected {
            warn!("Peer disconnected");
        }
        self.connected = false;
    }

    /// Messages that follow a locally applied move: the move, then the
    /// full state.
    pub fn announce_move(&self, applied: Move, state: &GameState) -> Vec<WireMessage> {
        if self.connected {
            vec![WireMessage::for_move(applied), WireMessage::for_state(state)]
        } else {
            Vec::new()
        }
    }

    /// Messages that follow a local reset.
    pub fn announce_reset(&self) -> Vec<WireMessage> {
        if self.connected {
            vec![WireMessage::Reset]
        } else {
            Vec::new()
        }
    }

    /// Decodes and handles one inbound message against `state`.
    #[instrument(skip(self, state, text), fields(room = %self.room))]
    pub fn receive(&mut self, state: &GameState, text: &str) -> Received {
        match WireMessage::decode(text) {
            Ok(message) => self.handle(state, message),
            Err(e) => {
                warn!(error = %e, "Dropping malformed peer message");
                Received::Ignored
            }
        }
    }

    /// Handles one decoded message against `state`.
    pub fn handle(&mut self, state: &GameState, message: WireMessage) -> Received {
        match message {
            WireMessage::Move { big_idx, small_idx } => {
                match ultimate_tictactoe::apply_move(state, big_idx, small_idx) {
                    Ok(transition) => {
                        debug!(applied = %transition.applied, "Remote move applied");
                        Received::Applied(transition)
                    }
                    Err(rejected) => {
                        warn!(error = %rejected, "Remote move rejected locally");
                        Received::Rejected(rejected)
                    }
                }
            }
            WireMessage::State { state } => {
                debug!(moves = state.move_count(), "Remote state adopted");
                Received::Replaced(state)
            }
            WireMessage::Reset => Received::Reset(GameState::new()),
            WireMessage::RoleAnnounce { role } => {
                self.creator_role = Some(role);
                if !self.is_host && role == self.role && role != Role::Spectator {
                    warn!(%role, "Creator plays our side, watching instead");
                    self.role = Role::Spectator;
                }
                Received::RoleRecorded(role)
            }
            WireMessage::Unknown => {
                debug!("Ignoring unknown message type");
                Received::Ignored
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ultimate_tictactoe::{Player, Position};

    fn room() -> RoomId {
        RoomId::parse("QWE456").unwrap()
    }

    fn mv(board: usize, cell: usize) -> Move {
        Move::from_indices(board, cell).unwrap()
    }

    #[test]
    fn test_host_opens_with_role_and_state() {
        let mut host = PeerSession::host(room(), Role::O).unwrap();
        let state = GameState::new();
        let sent = host.opened(&state, Some("10.0.0.2:4747"));
        assert_eq!(
            sent,
            vec![
                WireMessage::RoleAnnounce { role: Role::O },
                WireMessage::for_state(&state),
            ]
        );
        assert_eq!(host.peer_address().as_deref(), Some("10.0.0.2:4747"));
    }

    #[test]
    fn test_spectator_cannot_host() {
        assert!(matches!(
            PeerSession::host(room(), Role::Spectator),
            Err(SyncError::SpectatorHost)
        ));
    }

    #[test]
    fn test_turn_gate() {
        let state = GameState::new();
        let mut x = PeerSession::host(room(), Role::X).unwrap();
        assert_eq!(x.check_turn(&state), Err(InputError::Disconnected));
        x.opened(&state, None);
        assert_eq!(x.check_turn(&state), Ok(()));

        let mut o = PeerSession::join(room(), Some(Role::X), None, None).unwrap();
        o.opened(&state, None);
        assert_eq!(
            o.check_turn(&state),
            Err(InputError::NotYourTurn {
                expected: Player::X
            })
        );

        let watcher = PeerSession::join(room(), None, Some(Role::Spectator), None).unwrap();
        assert_eq!(watcher.check_turn(&state), Err(InputError::Spectator));
    }

    #[test]
    fn test_close_keeps_nothing_but_flag() {
        let state = GameState::new();
        let mut x = PeerSession::host(room(), Role::X).unwrap();
        x.opened(&state, None);
        x.closed();
        assert!(!x.is_connected());
        assert!(x.announce_move(mv(0, 0), &state).is_empty());
    }

    #[test]
    fn test_remote_move_and_state() {
        let state = GameState::new();
        let mut o = PeerSession::join(room(), Some(Role::X), None, None).unwrap();
        let received = o.handle(
            &state,
            WireMessage::Move {
                big_idx: Position::TopLeft,
                small_idx: Position::Center,
            },
        );
        let after = received.state().unwrap().clone();
        assert_eq!(after.last_move(), Some(mv(0, 4)));

        // A move the local engine refuses is reported, not applied.
        let refused = o.handle(
            &after,
            WireMessage::Move {
                big_idx: Position::TopLeft,
                small_idx: Position::TopLeft,
            },
        );
        assert!(matches!(refused, Received::Rejected(Rejected::WrongBoard { .. })));
        assert_eq!(refused.state(), None);

        let replaced = o.handle(&state, WireMessage::for_state(&after));
        assert_eq!(replaced, Received::Replaced(after));
    }

    #[test]
    fn test_malformed_and_unknown_ignored() {
        let state = GameState::new();
        let mut o = PeerSession::join(room(), None, None, None).unwrap();
        assert_eq!(o.receive(&state, "{oops"), Received::Ignored);
        assert_eq!(o.receive(&state, r#"{"type":"ping"}"#), Received::Ignored);
    }

    #[test]
    fn test_role_announce_demotes_clashing_joiner() {
        let state = GameState::new();
        let mut joiner = PeerSession::join(room(), None, Some(Role::X), None).unwrap();
        let received = joiner.handle(&state, WireMessage::RoleAnnounce { role: Role::X });
        assert_eq!(received, Received::RoleRecorded(Role::X));
        assert_eq!(*joiner.role(), Role::Spectator);
        assert_eq!(*joiner.creator_role(), Some(Role::X));
    }
}
