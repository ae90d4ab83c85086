//! Channel establishment: the `Connector` seam and a TCP implementation.
//!
//! The TCP transport frames one JSON message per line. A joiner opens
//! with a hello line carrying the room id; the host drops connections
//! for other rooms.

use super::{PeerLink, PeerSession, SyncError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tracing::{debug, info, instrument, warn};

/// Establishes a data channel for a room.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a channel for `session`'s room and side.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] when no channel could be established.
    async fn connect(&self, session: &PeerSession) -> Result<PeerLink, SyncError>;
}

/// Line-delimited JSON over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    listen_addr: String,
}

impl TcpConnector {
    /// Creates a connector; hosts listen on `listen_addr`.
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            listen_addr: listen_addr.into(),
        }
    }

    #[instrument(skip(self, session), fields(room = %session.room()))]
    async fn accept(&self, session: &PeerSession) -> Result<PeerLink, SyncError> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        info!(addr = %self.listen_addr, "Waiting for peer");

        loop {
            let (stream, addr) = listener.accept().await?;
            let (reader, writer) = stream.into_split();
            let mut reader = BufReader::new(reader);
            match read_frame(&mut reader).await? {
                Some(hello) if String::from_utf8_lossy(&hello).trim() == session.room().as_str() => {
                    info!(%addr, "Peer joined");
                    return Ok(bridge(reader, writer, Some(addr.to_string())));
                }
                Some(hello) => {
                    let hello = String::from_utf8_lossy(&hello);
                    warn!(%addr, hello = %hello.trim(), "Peer asked for another room");
                }
                None => debug!(%addr, "Peer hung up before hello"),
            }
        }
    }

    #[instrument(skip(self, session), fields(room = %session.room()))]
    async fn dial(&self, session: &PeerSession) -> Result<PeerLink, SyncError> {
        let addr = session
            .peer_address()
            .clone()
            .ok_or_else(|| SyncError::MissingPeerAddress {
                room: session.room().to_string(),
            })?;
        let stream = TcpStream::connect(&addr).await?;
        let (reader, mut writer) = stream.into_split();
        writer
            .write_all(format!("{}\n", session.room()).as_bytes())
            .await?;
        writer.flush().await?;
        info!(%addr, "Connected to host");
        Ok(bridge(BufReader::new(reader), writer, Some(addr)))
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self, session: &PeerSession) -> Result<PeerLink, SyncError> {
        if *session.is_host() {
            self.accept(session).await
        } else {
            self.dial(session).await
        }
    }
}

/// Reads one newline-terminated frame without its line ending.
///
/// `None` at end of stream.
async fn read_frame(reader: &mut BufReader<OwnedReadHalf>) -> std::io::Result<Option<Vec<u8>>> {
    let mut frame = Vec::new();
    if reader.read_until(b'\n', &mut frame).await? == 0 {
        return Ok(None);
    }
    while matches!(frame.last(), Some(b'\n' | b'\r')) {
        frame.pop();
    }
    Ok(Some(frame))
}

/// Pumps socket lines to and from a [`PeerLink`].
///
/// Lines that are not UTF-8 are dropped; the link stays open.
fn bridge(
    mut reader: BufReader<OwnedReadHalf>,
    mut writer: OwnedWriteHalf,
    remote: Option<String>,
) -> PeerLink {
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<String>();
    let (in_tx, in_rx) = mpsc::unbounded_channel::<String>();

    tokio::spawn(async move {
        while let Some(text) = out_rx.recv().await {
            let framed = format!("{}\n", text);
            if writer.write_all(framed.as_bytes()).await.is_err() {
                break;
            }
            let _ = writer.flush().await;
        }
        debug!("Writer finished");
    });

    tokio::spawn(async move {
        loop {
            let frame = match read_frame(&mut reader).await {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => {
                    debug!(error = %e, "Read failed");
                    break;
                }
            };
            let line = match String::from_utf8(frame) {
                Ok(line) => line,
                Err(e) => {
                    warn!(error = %e, "Dropping line that is not UTF-8");
                    continue;
                }
            };
            if line.trim().is_empty() {
                continue;
            }
            if in_tx.send(line).is_err() {
                break;
            }
        }
        debug!("Reader finished");
    });

    PeerLink::new(out_tx, in_rx, remote)
}

/// Calls `connector` until it succeeds, sleeping `backoff` between tries.
///
/// # Errors
///
/// Returns the last [`SyncError`] once `attempts` tries have failed.
#[instrument(skip(connector, session), fields(room = %session.room()))]
pub async fn connect_with_retry(
    connector: &dyn Connector,
    session: &PeerSession,
    attempts: u32,
    backoff: Duration,
) -> Result<PeerLink, SyncError> {
    let mut last = SyncError::Closed;
    for attempt in 1..=attempts.max(1) {
        match connector.connect(session).await {
            Ok(link) => return Ok(link),
            Err(e) => {
                warn!(attempt, error = %e, "Connection attempt failed");
                last = e;
                if attempt < attempts {
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
    Err(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{Role, RoomId, WireMessage};

    #[tokio::test]
    async fn test_tcp_host_and_joiner_exchange_lines() {
        let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = reserved.local_addr().unwrap().to_string();
        drop(reserved);

        let room = RoomId::parse("ABC123").unwrap();
        let host = PeerSession::host(room.clone(), Role::X).unwrap();
        let joiner = PeerSession::join(room, Some(Role::X), None, Some(addr.clone())).unwrap();

        let host_connector = TcpConnector::new(addr.clone());
        let host_task = tokio::spawn(async move { host_connector.connect(&host).await });

        let joiner_connector = TcpConnector::new("127.0.0.1:0");
        let mut joined =
            connect_with_retry(&joiner_connector, &joiner, 20, Duration::from_millis(25))
                .await
                .unwrap();
        let mut hosted = host_task.await.unwrap().unwrap();

        joined.send(&WireMessage::Reset).unwrap();
        assert_eq!(hosted.recv().await.as_deref(), Some(r#"{"type":"reset"}"#));
        hosted
            .send(&WireMessage::RoleAnnounce { role: Role::X })
            .unwrap();
        assert_eq!(
            WireMessage::decode(&joined.recv().await.unwrap()).unwrap(),
            WireMessage::RoleAnnounce { role: Role::X }
        );

        drop(hosted);
        assert_eq!(joined.recv().await, None);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_skipped() {
        let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = reserved.local_addr().unwrap().to_string();
        drop(reserved);

        let room = RoomId::parse("ABC123").unwrap();
        let host = PeerSession::host(room, Role::X).unwrap();
        let host_connector = TcpConnector::new(addr.clone());
        let host_task = tokio::spawn(async move { host_connector.connect(&host).await });

        let mut stream = None;
        for _ in 0..40 {
            match TcpStream::connect(&addr).await {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(25)).await,
            }
        }
        let mut stream = stream.expect("host never listened");
        stream
            .write_all(b"ABC123\n\xff\xfe\n{\"type\":\"reset\"}\r\n")
            .await
            .unwrap();
        stream.flush().await.unwrap();

        let mut hosted = host_task.await.unwrap().unwrap();
        assert_eq!(hosted.recv().await.as_deref(), Some(r#"{"type":"reset"}"#));

        drop(stream);
        assert_eq!(hosted.recv().await, None);
    }

    #[tokio::test]
    async fn test_joiner_needs_address() {
        let room = RoomId::parse("ABC123").unwrap();
        let joiner = PeerSession::join(room, None, None, None).unwrap();
        let result = TcpConnector::new("127.0.0.1:0").connect(&joiner).await;
        assert!(matches!(result, Err(SyncError::MissingPeerAddress { .. })));
    }
}
