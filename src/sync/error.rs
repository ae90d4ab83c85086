//! Synchronization errors.

use super::Role;
use derive_more::{Display, Error, From};

/// Errors raised while setting up or running a peer session.
#[derive(Debug, Display, Error, From)]
pub enum SyncError {
    /// A room identifier is not six base-36 characters.
    #[display("Invalid room id: {value:?}")]
    InvalidRoomId {
        /// The rejected text.
        value: String,
    },

    /// The joiner asked for the role the creator already plays.
    #[display("Role {role} is taken by the room creator")]
    RoleTaken {
        /// The contested role.
        role: Role,
    },

    /// The room creator must play `X` or `O`.
    #[display("The room creator cannot be a spectator")]
    SpectatorHost,

    /// A joiner has no address to dial.
    #[display("No peer address for room {room}")]
    MissingPeerAddress {
        /// The room being joined.
        room: String,
    },

    /// The remote side announced a different room.
    #[display("Peer is in room {actual}, expected {expected}")]
    RoomMismatch {
        /// Our room.
        expected: String,
        /// The room the peer announced.
        actual: String,
    },

    /// The channel closed before the handshake completed.
    #[display("Channel closed")]
    Closed,

    /// Transport I/O failed.
    #[display("Transport error: {_0}")]
    #[from]
    Io(std::io::Error),

    /// A message could not be encoded or decoded.
    #[display("Message codec error: {_0}")]
    #[from]
    Codec(serde_json::Error),
}
