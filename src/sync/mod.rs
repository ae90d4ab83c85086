//! Peer-to-peer synchronization: wire messages, rooms, roles and
//! transports.

mod error;
mod link;
mod message;
mod peer;
mod room;
mod transport;

pub use error::SyncError;
pub use link::PeerLink;
pub use message::WireMessage;
pub use peer::{PeerSession, Received};
pub use room::{Role, RoomId};
pub use transport::{Connector, TcpConnector, connect_with_retry};
