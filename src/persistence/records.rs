//! Persisted record shapes.

use crate::GameMode;
use crate::sync::{PeerSession, Role, RoomId};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use ultimate_tictactoe::{GameState, Player};

/// A local game: mode metadata plus the flattened state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct PersistedGame {
    /// How the game is being played.
    game_mode: GameMode,
    /// The side the local human plays against the AI.
    human_side: Player,
    /// The game itself.
    #[serde(flatten)]
    state: GameState,
}

impl PersistedGame {
    /// Bundles a state with its mode metadata.
    pub fn new(game_mode: GameMode, human_side: Player, state: GameState) -> Self {
        Self {
            game_mode,
            human_side,
            state,
        }
    }

    /// Splits into mode, side and state.
    pub fn into_parts(self) -> (GameMode, Player, GameState) {
        (self.game_mode, self.human_side, self.state)
    }
}

/// Descriptor of an online room, enough to reconnect and resume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(rename_all = "camelCase")]
pub struct RoomRecord {
    /// Room identifier.
    room_id: RoomId,
    /// Creator's role, once known.
    #[serde(default)]
    creator_role: Option<Role>,
    /// This peer's role.
    assigned_role: Role,
    /// Whether this peer created the room.
    is_host: bool,
    /// Last known remote address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    peer_address: Option<String>,
    /// Last known game state.
    game_state: GameState,
}

impl RoomRecord {
    /// Captures a session and its state.
    pub fn capture(session: &PeerSession, state: &GameState) -> Self {
        Self {
            room_id: session.room().clone(),
            creator_role: *session.creator_role(),
            assigned_role: *session.role(),
            is_host: *session.is_host(),
            peer_address: session.peer_address().clone(),
            game_state: state.clone(),
        }
    }

    /// Whether the roles in this record can coexist.
    ///
    /// A host plays the creator's side; a joiner never does.
    pub fn roles_consistent(&self) -> bool {
        match (self.is_host, self.creator_role) {
            (true, Some(creator)) => creator == self.assigned_role && creator != Role::Spectator,
            (true, None) => false,
            (false, Some(creator)) => {
                self.assigned_role == Role::Spectator || creator != self.assigned_role
            }
            (false, None) => true,
        }
    }

    /// Rebuilds a disconnected session and the saved state.
    pub fn into_session(self) -> (PeerSession, GameState) {
        let session = PeerSession::restore(
            self.room_id,
            self.assigned_role,
            self.creator_role,
            self.is_host,
            self.peer_address,
        );
        (session, self.game_state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ultimate_tictactoe::{Move, replay};

    #[test]
    fn test_persisted_game_is_flat() {
        let state = replay(&[Move::from_indices(4, 4).unwrap()]).unwrap();
        let game = PersistedGame::new(GameMode::Ai, Player::O, state.clone());
        let json: serde_json::Value = serde_json::to_value(&game).unwrap();
        assert_eq!(json["gameMode"], "ai");
        assert_eq!(json["humanSide"], "O");
        assert_eq!(json["currentPlayer"], "O");
        assert_eq!(json["activeBoard"], 4);
        assert_eq!(json["lastMove"], serde_json::json!([4, 4]));

        let back: PersistedGame = serde_json::from_value(json).unwrap();
        assert_eq!(back, game);
    }

    #[test]
    fn test_room_record_shape() {
        let room = RoomId::parse("ZZ9ZZ9").unwrap();
        let session = PeerSession::host(room, Role::X).unwrap();
        let record = RoomRecord::capture(&session, &GameState::new());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["roomId"], "ZZ9ZZ9");
        assert_eq!(json["creatorRole"], "X");
        assert_eq!(json["assignedRole"], "X");
        assert_eq!(json["isHost"], true);
        assert!(json.get("peerAddress").is_none());
        assert!(record.roles_consistent());
    }

    #[test]
    fn test_joiner_with_creator_role_is_inconsistent() {
        let room = RoomId::parse("ZZ9ZZ9").unwrap();
        let session = PeerSession::restore(room, Role::O, Some(Role::O), false, None);
        assert!(!RoomRecord::capture(&session, &GameState::new()).roles_consistent());
    }
}
