//! Ultimate Games - Unified CLI
//!
//! Local, AI and online ultimate tic-tac-toe plus a replay viewer.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{Cli, Command};
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, instrument, warn};
use tracing_subscriber::EnvFilter;
use ultimate_games::{
    AppConfig, GameCommand, GameEvent, GameMode, GameSession, MoveScorer, Orchestrator,
    PeerSession, Persistence, PolicyModel, RandomScorer, ReplayCommand, ReplayController,
    ReplayEvent, ReplayFile, Role, RoomId, SqliteStore, TcpConnector, Unavailable,
    export_recordings, read_manifest, run_viewer,
};
use ultimate_tictactoe::{Move, Player, Position};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ultimate_games=debug")),
        )
        .init();

    let config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("Failed to load config from {}", cli.config.display()))?;

    match cli.command {
        Command::Play { mode, side, fresh } => run_play(&config, mode, side, fresh).await,
        Command::Host { room, role } => run_host(&config, room, role).await,
        Command::Join {
            room,
            addr,
            role,
            host_role,
        } => run_join(&config, room, addr, role, host_role).await,
        Command::Rejoin { room } => run_rejoin(&config, room).await,
        Command::Replay { source, step, play } => run_replay(&config, source, step, play).await,
        Command::Replays => list_replays(&config),
        Command::Record { count } => run_record(&config, count),
    }
}

fn open_persistence(config: &AppConfig) -> Result<Persistence<SqliteStore>> {
    let store = SqliteStore::open(config.store_path().clone())
        .with_context(|| format!("Failed to open store at {}", config.store_path()))?;
    Ok(Persistence::new(store))
}

/// Loads the policy network when configured; the AI stays unavailable otherwise.
fn load_scorer(config: &AppConfig) -> Arc<dyn MoveScorer> {
    match config.model_path() {
        Some(path) => match PolicyModel::from_file(path) {
            Ok(model) => {
                info!(path = %path.display(), "Policy model loaded");
                Arc::new(model)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Policy model failed to load");
                Arc::new(Unavailable)
            }
        },
        None => Arc::new(Unavailable),
    }
}

/// Play on this machine
#[instrument(skip(config))]
async fn run_play(config: &AppConfig, mode: GameMode, side: Player, fresh: bool) -> Result<()> {
    if mode == GameMode::Online {
        bail!("Online games start with `host` or `join`");
    }
    let persistence = open_persistence(config)?;
    let session = if fresh {
        GameSession::new(persistence, mode, side)
    } else {
        GameSession::resume(persistence, mode, side)
    };
    let orchestrator = Orchestrator::new(session, load_scorer(config), config.ai_delay(), events());
    drive(orchestrator).await
}

/// Create a room and wait for a peer
#[instrument(skip(config))]
async fn run_host(config: &AppConfig, room: Option<RoomId>, role: Role) -> Result<()> {
    let room = room.unwrap_or_else(|| RoomId::generate(&mut rand::thread_rng()));
    let peer = PeerSession::host(room.clone(), role)?;
    println!("Room {} on {} (you are {})", room, config.listen_addr(), role);
    let session = GameSession::online(open_persistence(config)?, peer);
    drive(online(config, session)).await
}

/// Join an existing room
#[instrument(skip(config))]
async fn run_join(
    config: &AppConfig,
    room: RoomId,
    addr: Option<String>,
    role: Option<Role>,
    host_role: Option<Role>,
) -> Result<()> {
    let addr = addr.unwrap_or_else(|| config.listen_addr().clone());
    let peer = PeerSession::join(room, host_role, role, Some(addr))?;
    println!("Joining room {} as {}", peer.room(), peer.role());
    let session = GameSession::online(open_persistence(config)?, peer);
    drive(online(config, session)).await
}

/// Reconnect to a saved room
#[instrument(skip(config))]
async fn run_rejoin(config: &AppConfig, room: RoomId) -> Result<()> {
    let session = GameSession::rejoin(open_persistence(config)?, &room)
        .with_context(|| format!("No saved record for room {}", room))?;
    drive(online(config, session)).await
}

fn online(
    config: &AppConfig,
    session: GameSession<SqliteStore>,
) -> Orchestrator<SqliteStore> {
    let connector = Arc::new(TcpConnector::new(config.listen_addr().clone()));
    Orchestrator::new(session, load_scorer(config), config.ai_delay(), events()).with_connector(
        connector,
        *config.reconnect_attempts(),
        config.reconnect_backoff(),
    )
}

/// Spawns the event printer and returns its sender.
fn events() -> mpsc::UnboundedSender<GameEvent> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match event {
                GameEvent::Updated { state, status } => {
                    println!("\n{}\n{}", state.display(), status);
                }
                GameEvent::MoveMade { by, mv } => {
                    let (board, cell) = mv.indices();
                    println!("{} played {} {}", by, board, cell);
                }
                GameEvent::Rejected(reason) => println!("Not allowed: {}", reason),
                GameEvent::Notice(text) => println!("{}", text),
                GameEvent::PeerConnected => println!("Peer connected"),
                GameEvent::PeerDisconnected => println!("Peer disconnected"),
            }
        }
    });
    tx
}

/// Feeds stdin to the orchestrator until it stops.
async fn drive(orchestrator: Orchestrator<SqliteStore>) -> Result<()> {
    println!("Enter moves as `<board> <cell>` (0-8), or `new`, `leave`, `quit`.");
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_game_input(&line) {
                Some(command) => {
                    let stop = matches!(command, GameCommand::Quit | GameCommand::Leave);
                    if cmd_tx.send(command).is_err() || stop {
                        break;
                    }
                }
                None if line.trim().is_empty() => {}
                None => println!("Unrecognized input: {}", line.trim()),
            }
        }
    });

    let session = orchestrator.run(cmd_rx, None).await;
    reader.abort();
    if session.is_none() {
        println!("Left the room");
    }
    Ok(())
}

/// Step through a recorded game
#[instrument(skip(config))]
async fn run_replay(config: &AppConfig, source: String, step: usize, play: bool) -> Result<()> {
    let file = ReplayFile::load(&source)
        .await
        .with_context(|| format!("Failed to load replay {}", source))?;
    let mut controller = ReplayController::new(file);
    if step > 0 {
        controller.seek_to(step)?;
    }
    if play {
        controller.play();
    }
    println!("{}\n{}", controller.state().display(), controller.label());
    println!("Commands: n(ext), p(rev), <step>, play, pause, q(uit)");

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                ReplayEvent::Step { state, label, .. } => {
                    println!("\n{}\n{}", state.display(), label)
                }
                ReplayEvent::Corrupt(reason) => println!("Replay stopped: {}", reason),
            }
        }
    });
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if let Some(command) = parse_replay_input(&line) {
                if cmd_tx.send(command).is_err() || command == ReplayCommand::Quit {
                    break;
                }
            }
        }
    });

    let controller = run_viewer(controller, config.replay_interval(), cmd_rx, event_tx).await;
    reader.abort();
    let _ = printer.await;
    info!(step = controller.step(), "Replay viewer closed");
    Ok(())
}

/// List recordings
fn list_replays(config: &AppConfig) -> Result<()> {
    let entries = read_manifest(config.replay_dir());
    if entries.is_empty() {
        println!("No recordings in {}", config.replay_dir().display());
    }
    for entry in entries {
        let result = entry
            .result
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unfinished".to_string());
        println!("{}  {} moves  {}", entry.file, entry.steps, result);
    }
    Ok(())
}

/// Record AI-vs-AI games
#[instrument(skip(config))]
fn run_record(config: &AppConfig, count: usize) -> Result<()> {
    let scorer: Arc<dyn MoveScorer> = match config.model_path() {
        Some(_) => load_scorer(config),
        None => Arc::new(RandomScorer::new()),
    };
    let dir: &Path = config.replay_dir();
    let written = export_recordings(dir, count, scorer.as_ref())
        .with_context(|| format!("Failed to record into {}", dir.display()))?;
    for path in written {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

fn parse_game_input(line: &str) -> Option<GameCommand> {
    let words: Vec<&str> = line.split_whitespace().collect();
    match words.as_slice() {
        ["new" | "reset"] => Some(GameCommand::Reset),
        ["quit" | "q"] => Some(GameCommand::Quit),
        ["leave"] => Some(GameCommand::Leave),
        [board, cell] => {
            let board = Position::from_label_or_number(board)?;
            let cell = Position::from_label_or_number(cell)?;
            Some(GameCommand::Play(Move::new(board, cell)))
        }
        _ => None,
    }
}

fn parse_replay_input(line: &str) -> Option<ReplayCommand> {
    match line.trim() {
        "n" | "next" => Some(ReplayCommand::Advance),
        "p" | "prev" => Some(ReplayCommand::Retreat),
        "play" => Some(ReplayCommand::Play),
        "pause" => Some(ReplayCommand::Pause),
        "q" | "quit" => Some(ReplayCommand::Quit),
        other => other.parse().ok().map(ReplayCommand::SeekTo),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_input() {
        assert_eq!(
            parse_game_input("4 0"),
            Move::from_indices(4, 0).map(GameCommand::Play)
        );
        assert_eq!(parse_game_input(" new "), Some(GameCommand::Reset));
        assert_eq!(parse_game_input("leave"), Some(GameCommand::Leave));
        assert_eq!(parse_game_input("9 0"), None);
        assert_eq!(parse_game_input("4"), None);
    }

    #[test]
    fn test_replay_input() {
        assert_eq!(parse_replay_input("n"), Some(ReplayCommand::Advance));
        assert_eq!(parse_replay_input("12"), Some(ReplayCommand::SeekTo(12)));
        assert_eq!(parse_replay_input("q"), Some(ReplayCommand::Quit));
        assert_eq!(parse_replay_input("later"), None);
    }
}
