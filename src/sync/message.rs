//! Wire messages exchanged between peers.
//!
//! Each message is one UTF-8 JSON object tagged by `type`. Unknown tags
//! decode to [`WireMessage::Unknown`] and are ignored by the receiver.

use super::{Role, SyncError};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use ultimate_tictactoe::{GameState, Move, Position};

/// A peer-to-peer protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WireMessage {
    /// A move the sender applied locally.
    #[serde(rename = "move")]
    Move {
        /// Sub-board index.
        #[serde(rename = "bigIdx", alias = "big_idx")]
        big_idx: Position,
        /// Cell index inside the sub-board.
        #[serde(rename = "smallIdx", alias = "small_idx")]
        small_idx: Position,
    },

    /// Full state; the receiver overwrites its own.
    #[serde(rename = "state")]
    State {
        /// The sender's state, validated on decode.
        state: GameState,
    },

    /// Start over from the empty state.
    #[serde(rename = "reset")]
    Reset,

    /// The side the room creator plays.
    #[serde(rename = "roleAnnounce", alias = "creator_role")]
    RoleAnnounce {
        /// Creator's role.
        role: Role,
    },

    /// Any other `type`.
    #[serde(other, skip_serializing)]
    Unknown,
}

impl WireMessage {
    /// A move message for `mv`.
    pub fn for_move(mv: Move) -> Self {
        Self::Move {
            big_idx: mv.board,
            small_idx: mv.cell,
        }
    }

    /// A full-state message.
    pub fn for_state(state: &GameState) -> Self {
        Self::State {
            state: state.clone(),
        }
    }

    /// Decodes one message.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] for malformed JSON, a missing `type`,
    /// or a payload that fails validation.
    #[instrument(skip(text), fields(bytes = text.len()))]
    pub fn decode(text: &str) -> Result<Self, SyncError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Encodes to a single line of JSON.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Codec`] when called on [`WireMessage::Unknown`].
    pub fn encode(&self) -> Result<String, SyncError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_wire_shape() {
        let msg = WireMessage::for_move(Move::new(Position::TopRight, Position::Center));
        assert_eq!(
            msg.encode().unwrap(),
            r#"{"type":"move","bigIdx":2,"smallIdx":4}"#
        );
        assert_eq!(WireMessage::decode(&msg.encode().unwrap()).unwrap(), msg);
    }

    #[test]
    fn test_snake_case_move_accepted() {
        let msg = WireMessage::decode(r#"{"type":"move","big_idx":0,"small_idx":8}"#).unwrap();
        assert_eq!(
            msg,
            WireMessage::Move {
                big_idx: Position::TopLeft,
                small_idx: Position::BottomRight,
            }
        );
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        let msg = WireMessage::decode(r#"{"type":"chat","text":"hi"}"#).unwrap();
        assert_eq!(msg, WireMessage::Unknown);
        assert!(msg.encode().is_err());
    }

    #[test]
    fn test_reset_and_role_announce() {
        assert_eq!(
            WireMessage::decode(r#"{"type":"reset"}"#).unwrap(),
            WireMessage::Reset
        );
        assert_eq!(
            WireMessage::decode(r#"{"type":"roleAnnounce","role":"O"}"#).unwrap(),
            WireMessage::RoleAnnounce { role: Role::O }
        );
    }

    #[test]
    fn test_state_payload_is_validated() {
        let state = GameState::new();
        let msg = WireMessage::for_state(&state);
        let text = msg.encode().unwrap();
        assert_eq!(WireMessage::decode(&text).unwrap(), msg);

        let truncated = text.replacen("\"bigBoard\":[\"\",", "\"bigBoard\":[", 1);
        assert!(WireMessage::decode(&truncated).is_err());
    }

    #[test]
    fn test_snake_case_state_accepted() {
        let mut small = vec![vec![""; 9]; 9];
        small[4][2] = "X";
        let text = serde_json::json!({
            "type": "state",
            "state": {
                "big": vec![""; 9],
                "small": small,
                "current_player": "O",
                "available_big": 2,
                "winner": null,
            }
        })
        .to_string();

        let expected = ultimate_tictactoe::replay(&[Move::new(Position::Center, Position::TopRight)])
            .unwrap();
        let WireMessage::State { state } = WireMessage::decode(&text).unwrap() else {
            panic!("expected a state message");
        };
        assert_eq!(state.small_boards(), expected.small_boards());
        assert_eq!(state.current_player(), expected.current_player());
        assert_eq!(state.active_board(), expected.active_board());
        assert_eq!(state.last_move(), None);
    }

    #[test]
    fn test_malformed_move_rejected() {
        assert!(WireMessage::decode(r#"{"type":"move","bigIdx":9,"smallIdx":0}"#).is_err());
        assert!(WireMessage::decode("not json").is_err());
    }
}
