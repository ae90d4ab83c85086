//! Room identifiers and role assignment.

use super::SyncError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use ultimate_tictactoe::Player;

const ROOM_ID_LEN: usize = 6;
const ROOM_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A six-character, upper-case base-36 room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Generates a random identifier.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let id = (0..ROOM_ID_LEN)
            .map(|_| ROOM_ALPHABET[rng.gen_range(0..ROOM_ALPHABET.len())] as char)
            .collect();
        Self(id)
    }

    /// Parses user input, trimming whitespace and upper-casing.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRoomId`] unless the result is six
    /// ASCII alphanumerics.
    pub fn parse(input: &str) -> Result<Self, SyncError> {
        let id = input.trim().to_ascii_uppercase();
        if id.len() == ROOM_ID_LEN && id.bytes().all(|b| ROOM_ALPHABET.contains(&b)) {
            Ok(Self(id))
        } else {
            Err(SyncError::InvalidRoomId {
                value: input.to_string(),
            })
        }
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage key for this room's record.
    pub fn storage_key(&self) -> String {
        format!("room_{}", self.0)
    }
}

impl TryFrom<String> for RoomId {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The part a peer plays in a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Plays the `X` marks.
    X,
    /// Plays the `O` marks.
    O,
    /// Watches without moving.
    #[serde(rename = "spectator")]
    Spectator,
}

impl Role {
    /// The side this role moves for, `None` for spectators.
    pub fn player(self) -> Option<Player> {
        match self {
            Self::X => Some(Player::X),
            Self::O => Some(Player::O),
            Self::Spectator => None,
        }
    }

    /// Parses `X`, `O` or `spectator`, case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "x" => Some(Self::X),
            "o" => Some(Self::O),
            "spectator" | "s" => Some(Self::Spectator),
            _ => None,
        }
    }

    /// Role taken by a joiner, given the creator's role and an optional request.
    ///
    /// Without a request the joiner takes the other side.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::RoleTaken`] when the request matches the
    /// creator's side.
    pub fn for_joiner(creator: Role, requested: Option<Role>) -> Result<Role, SyncError> {
        match requested {
            Some(Role::Spectator) => Ok(Role::Spectator),
            Some(role) if role == creator => Err(SyncError::RoleTaken { role }),
            Some(role) => Ok(role),
            None => Ok(match creator {
                Role::X => Role::O,
                _ => Role::X,
            }),
        }
    }
}

impl From<Player> for Role {
    fn from(player: Player) -> Self {
        match player {
            Player::X => Self::X,
            Player::O => Self::O,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => write!(f, "X"),
            Self::O => write!(f, "O"),
            Self::Spectator => write!(f, "spectator"),
        }
    }
}
