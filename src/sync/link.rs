//! Bidirectional text channel to one peer.

use super::{SyncError, WireMessage};
use tokio::sync::mpsc;
use tracing::{debug, instrument};

/// An open data channel: outbound and inbound UTF-8 messages.
///
/// `recv` returning `None` is the channel's `close` event.
#[derive(Debug)]
pub struct PeerLink {
    outbound: mpsc::UnboundedSender<String>,
    inbound: mpsc::UnboundedReceiver<String>,
    remote: Option<String>,
}

impl PeerLink {
    /// Wraps a pair of channel halves.
    pub fn new(
        outbound: mpsc::UnboundedSender<String>,
        inbound: mpsc::UnboundedReceiver<String>,
        remote: Option<String>,
    ) -> Self {
        Self {
            outbound,
            inbound,
            remote,
        }
    }

    /// Two links wired to each other in memory.
    pub fn pair() -> (Self, Self) {
        let (a_tx, a_rx) = mpsc::unbounded_channel();
        let (b_tx, b_rx) = mpsc::unbounded_channel();
        (Self::new(a_tx, b_rx, None), Self::new(b_tx, a_rx, None))
    }

    /// Address of the remote side, when the transport knows it.
    pub fn remote(&self) -> Option<&str> {
        self.remote.as_deref()
    }

    /// Encodes and sends one message.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Closed`] when the remote side is gone.
    #[instrument(skip(self))]
    pub fn send(&self, message: &WireMessage) -> Result<(), SyncError> {
        let text = message.encode()?;
        debug!(bytes = text.len(), "Sending message");
        self.outbound.send(text).map_err(|_| SyncError::Closed)
    }

    /// Waits for the next raw message, `None` once the channel closed.
    pub async fn recv(&mut self) -> Option<String> {
        self.inbound.recv().await
    }
}
