//! The live game loop.
//!
//! One task owns the [`GameSession`] and serializes local commands, AI
//! timer firings, inbound peer messages and reconnections through a
//! single `select!`, so no two transitions ever overlap.

use crate::ai::{MoveScorer, select_move};
use crate::persistence::KeyValueStore;
use crate::scheduler::Timer;
use crate::session::{GameSession, MoveOrigin};
use crate::sync::{Connector, PeerLink, Received, WireMessage, connect_with_retry};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, instrument, warn};
use ultimate_tictactoe::{GameState, Move, Player};

/// Input to the game loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameCommand {
    /// The local player picks a cell.
    Play(Move),
    /// Start over.
    Reset,
    /// Stop, keeping any room record.
    Quit,
    /// Stop and delete the room record.
    Leave,
}

/// Messages sent from the game loop to the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The state or status line changed.
    Updated {
        /// Current state.
        state: GameState,
        /// Status line.
        status: String,
    },
    /// A move was applied.
    MoveMade {
        /// The mover.
        by: Player,
        /// The move.
        mv: Move,
    },
    /// A local move was refused.
    Rejected(String),
    /// Informational message.
    Notice(String),
    /// The data channel opened.
    PeerConnected,
    /// The data channel closed.
    PeerDisconnected,
}

#[derive(Debug, Clone, Copy)]
struct AiTurn;

/// Drives one game session.
pub struct Orchestrator<S> {
    session: GameSession<S>,
    scorer: Arc<dyn MoveScorer>,
    ai_delay: Duration,
    connector: Option<Arc<dyn Connector>>,
    reconnect_attempts: u32,
    reconnect_backoff: Duration,
    event_tx: mpsc::UnboundedSender<GameEvent>,
}

impl<S: KeyValueStore> Orchestrator<S> {
    /// Creates an orchestrator with no reconnection support.
    pub fn new(
        session: GameSession<S>,
        scorer: Arc<dyn MoveScorer>,
        ai_delay: Duration,
        event_tx: mpsc::UnboundedSender<GameEvent>,
    ) -> Self {
        Self {
            session,
            scorer,
            ai_delay,
            connector: None,
            reconnect_attempts: 1,
            reconnect_backoff: Duration::from_secs(1),
            event_tx,
        }
    }

    /// Uses `connector` to (re)establish the peer channel.
    pub fn with_connector(
        mut self,
        connector: Arc<dyn Connector>,
        attempts: u32,
        backoff: Duration,
    ) -> Self {
        self.connector = Some(connector);
        self.reconnect_attempts = attempts;
        self.reconnect_backoff = backoff;
        self
    }

    /// Runs until [`GameCommand::Quit`], [`GameCommand::Leave`] or the command
    /// channel closes.
    ///
    /// Returns the session, or `None` after leaving the room.
    #[instrument(skip_all, fields(mode = %self.session.mode()))]
    pub async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<GameCommand>,
        link: Option<PeerLink>,
    ) -> Option<GameSession<S>> {
        info!("Starting game orchestration");
        let (timer_tx, mut timer_rx) = mpsc::unbounded_channel();
        let mut ai_timer = Timer::new(timer_tx);
        let (link_tx, mut link_rx) = mpsc::unbounded_channel::<PeerLink>();
        let mut connecting: Option<AbortHandle> = None;

        let mut link = link;
        match &link {
            Some(open) => self.opened(open),
            None if self.session.peer().is_some() => {
                connecting = self.spawn_connect(&link_tx);
            }
            None => {}
        }
        self.publish();

        let mut left = false;
        loop {
            self.sync_ai(&mut ai_timer);

            tokio::select! {
                command = commands.recv() => match command {
                    None | Some(GameCommand::Quit) => break,
                    Some(GameCommand::Leave) => {
                        left = true;
                        break;
                    }
                    Some(GameCommand::Play(mv)) => self.local_move(mv, MoveOrigin::Local, &link),
                    Some(GameCommand::Reset) => {
                        let outbound = self.session.reset();
                        self.send_all(&link, outbound);
                        self.publish();
                    }
                },
                Some(fired) = timer_rx.recv() => {
                    if ai_timer.accept(fired).is_some() {
                        self.ai_move(&link);
                    }
                }
                inbound = recv_from(&mut link) => match inbound {
                    Some(text) => {
                        let received = self.session.receive(&text);
                        self.on_received(received);
                    }
                    None => {
                        link = None;
                        self.session.peer_closed();
                        self.emit(GameEvent::PeerDisconnected);
                        self.publish();
                        connecting = self.spawn_connect(&link_tx);
                    }
                },
                Some(opened) = link_rx.recv() => {
                    connecting = None;
                    self.opened(&opened);
                    link = Some(opened);
                    self.publish();
                }
            }
        }

        ai_timer.cancel();
        if let Some(task) = connecting {
            task.abort();
        }
        info!(left, "Game orchestration stopped");
        if left {
            drop(link);
            self.session.leave();
            None
        } else {
            Some(self.session)
        }
    }

    fn opened(&mut self, link: &PeerLink) {
        let outbound = self.session.peer_opened(link.remote());
        for message in &outbound {
            if let Err(e) = link.send(message) {
                warn!(error = %e, "Opening message not sent");
            }
        }
        self.emit(GameEvent::PeerConnected);
    }

    fn spawn_connect(&self, link_tx: &mpsc::UnboundedSender<PeerLink>) -> Option<AbortHandle> {
        let connector = self.connector.clone()?;
        let peer = self.session.peer()?.clone();
        let attempts = self.reconnect_attempts;
        let backoff = self.reconnect_backoff;
        let link_tx = link_tx.clone();
        let event_tx = self.event_tx.clone();

        info!(room = %peer.room(), "Connecting to peer");
        let task = tokio::spawn(async move {
            match connect_with_retry(connector.as_ref(), &peer, attempts, backoff).await {
                Ok(link) => {
                    let _ = link_tx.send(link);
                }
                Err(e) => {
                    warn!(error = %e, "Giving up on peer connection");
                    let _ = event_tx.send(GameEvent::Notice(format!("Connection failed: {}", e)));
                }
            }
        });
        Some(task.abort_handle())
    }

    fn sync_ai(&self, timer: &mut Timer<AiTurn>) {
        let due = self.session.ai_due() && self.scorer.is_ready();
        match (due, timer.is_pending()) {
            (true, false) => {
                debug!(delay_ms = self.ai_delay.as_millis() as u64, "Scheduling AI move");
                timer.schedule(self.ai_delay, AiTurn);
            }
            (false, true) => timer.cancel(),
            _ => {}
        }
    }

    fn ai_move(&mut self, link: &Option<PeerLink>) {
        if !self.session.ai_due() {
            return;
        }
        match select_move(self.session.state(), self.scorer.as_ref()) {
            Ok(Some(mv)) => self.local_move(mv, MoveOrigin::Ai, link),
            Ok(None) => debug!("AI has no legal move"),
            Err(e) => {
                warn!(error = %e, "AI could not move");
                self.emit(GameEvent::Notice(e.to_string()));
            }
        }
    }

    fn local_move(&mut self, mv: Move, origin: MoveOrigin, link: &Option<PeerLink>) {
        let by = self.session.state().current_player();
        match self.session.submit(mv, origin) {
            Ok(applied) => {
                self.emit(GameEvent::MoveMade { by, mv });
                self.send_all(link, applied.outbound);
                self.publish();
            }
            Err(e) => {
                debug!(%mv, error = %e, "Move refused");
                self.emit(GameEvent::Rejected(e.to_string()));
            }
        }
    }

    fn on_received(&mut self, received: Received) {
        match received {
            Received::Applied(transition) => {
                self.emit(GameEvent::MoveMade {
                    by: transition.state.current_player().opponent(),
                    mv: transition.applied,
                });
                self.publish();
            }
            Received::Replaced(_) | Received::Reset(_) => self.publish(),
            Received::RoleRecorded(role) => {
                self.emit(GameEvent::Notice(format!("Room creator plays {}", role)));
                self.publish();
            }
            Received::Rejected(e) => {
                self.emit(GameEvent::Notice(format!("Peer move refused: {}", e)));
            }
            Received::Ignored => {}
        }
    }

    fn send_all(&self, link: &Option<PeerLink>, messages: Vec<WireMessage>) {
        let Some(link) = link else { return };
        for message in &messages {
            if let Err(e) = link.send(message) {
                warn!(error = %e, "Peer message not sent");
            }
        }
    }

    fn publish(&self) {
        self.emit(GameEvent::Updated {
            state: self.session.state().clone(),
            status: self.session.status(self.scorer.is_ready()),
        });
    }

    fn emit(&self, event: GameEvent) {
        if self.event_tx.send(event).is_err() {
            debug!("UI channel closed");
        }
    }
}

async fn recv_from(link: &mut Option<PeerLink>) -> Option<String> {
    match link {
        Some(link) => link.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{RandomScorer, Unavailable};
    use crate::persistence::{MemoryStore, Persistence};
    use crate::session::GameMode;

    fn mv(board: usize, cell: usize) -> Move {
        Move::from_indices(board, cell).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_ai_answers_after_delay() {
        let session = GameSession::new(
            Persistence::new(MemoryStore::new()),
            GameMode::Ai,
            Player::X,
        );
        let (event_tx, mut events) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let orchestrator = Orchestrator::new(
            session,
            Arc::new(RandomScorer::seeded(5)),
            Duration::from_millis(500),
            event_tx,
        );
        let task = tokio::spawn(orchestrator.run(cmd_rx, None));

        cmd_tx.send(GameCommand::Play(mv(4, 4))).unwrap();
        let mut ai_moved = None;
        while let Some(event) = events.recv().await {
            if let GameEvent::MoveMade { by: Player::O, mv } = event {
                ai_moved = Some(mv);
                break;
            }
        }
        assert_eq!(ai_moved.map(|m| m.board), Some(ultimate_tictactoe::Position::Center));

        cmd_tx.send(GameCommand::Quit).unwrap();
        let session = task.await.unwrap().unwrap();
        assert_eq!(session.state().move_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unavailable_ai_never_moves() {
        let session = GameSession::new(
            Persistence::new(MemoryStore::new()),
            GameMode::Ai,
            Player::O,
        );
        let (event_tx, mut events) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let orchestrator =
            Orchestrator::new(session, Arc::new(Unavailable), Duration::from_millis(500), event_tx);
        let task = tokio::spawn(orchestrator.run(cmd_rx, None));

        let Some(GameEvent::Updated { status, .. }) = events.recv().await else {
            panic!("expected initial update");
        };
        assert_eq!(status, "AI model not loaded");

        tokio::time::sleep(Duration::from_secs(5)).await;
        cmd_tx.send(GameCommand::Quit).unwrap();
        let session = task.await.unwrap().unwrap();
        assert_eq!(session.state().move_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_turn_is_reported() {
        let session = GameSession::new(
            Persistence::new(MemoryStore::new()),
            GameMode::Two,
            Player::X,
        );
        let (event_tx, mut events) = mpsc::unbounded_channel();
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let orchestrator =
            Orchestrator::new(session, Arc::new(Unavailable), Duration::from_millis(500), event_tx);
        let task = tokio::spawn(orchestrator.run(cmd_rx, None));

        cmd_tx.send(GameCommand::Play(mv(4, 4))).unwrap();
        cmd_tx.send(GameCommand::Play(mv(0, 0))).unwrap();
        cmd_tx.send(GameCommand::Quit).unwrap();
        task.await.unwrap();

        let mut rejected = Vec::new();
        while let Ok(event) = events.try_recv() {
            if let GameEvent::Rejected(text) = event {
                rejected.push(text);
            }
        }
        assert_eq!(rejected, vec!["Must play in board 4, not board 0".to_string()]);
    }
}
