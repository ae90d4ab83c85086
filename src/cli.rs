//! Command-line interface for ultimate_games.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use ultimate_games::{DEFAULT_CONFIG_FILE, GameMode, Role, RoomId};
use ultimate_tictactoe::Player;

/// Ultimate tic-tac-toe in the terminal
#[derive(Parser, Debug)]
#[command(name = "ultimate_games")]
#[command(about = "Ultimate tic-tac-toe: local, AI, online and replays", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play on this machine, against a friend or the AI
    Play {
        /// `two` or `ai`
        #[arg(long, default_value = "two")]
        mode: GameMode,

        /// Side the human plays in AI mode
        #[arg(long, default_value = "X", value_parser = parse_player)]
        side: Player,

        /// Discard any saved game
        #[arg(long)]
        fresh: bool,
    },

    /// Create a room and wait for a peer
    Host {
        /// Room code; generated when omitted
        #[arg(long, value_parser = parse_room)]
        room: Option<RoomId>,

        /// Side the host plays
        #[arg(long, default_value = "X", value_parser = parse_role)]
        role: Role,
    },

    /// Join an existing room
    Join {
        /// Room code shared by the host
        #[arg(value_parser = parse_room)]
        room: RoomId,

        /// Host address; defaults to the configured listen address
        #[arg(long)]
        addr: Option<String>,

        /// `X`, `O` or `spectator`
        #[arg(long, value_parser = parse_role)]
        role: Option<Role>,

        /// Side the host plays, when known
        #[arg(long, value_parser = parse_role)]
        host_role: Option<Role>,
    },

    /// Reconnect to a room saved by an earlier session
    Rejoin {
        /// Room code
        #[arg(value_parser = parse_room)]
        room: RoomId,
    },

    /// Step through a recorded game
    Replay {
        /// Replay file path or http(s) URL
        source: String,

        /// Start at this step
        #[arg(long, default_value = "0")]
        step: usize,

        /// Start playing immediately
        #[arg(long)]
        play: bool,
    },

    /// List recordings in the replay directory
    Replays,

    /// Record AI-vs-AI games into the replay directory
    Record {
        /// Number of games
        #[arg(long, default_value = "1")]
        count: usize,
    },
}

fn parse_player(s: &str) -> Result<Player, String> {
    match Role::parse(s).and_then(Role::player) {
        Some(player) => Ok(player),
        None => Err(format!("expected X or O, got '{}'", s)),
    }
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse(s).ok_or_else(|| format!("expected X, O or spectator, got '{}'", s))
}

fn parse_room(s: &str) -> Result<RoomId, String> {
    RoomId::parse(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_play_defaults() {
        let cli = Cli::try_parse_from(["ultimate_games", "play"]).unwrap();
        match cli.command {
            Command::Play { mode, side, fresh } => {
                assert_eq!(mode, GameMode::Two);
                assert_eq!(side, Player::X);
                assert!(!fresh);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_join_parses_room_and_role() {
        let cli = Cli::try_parse_from([
            "ultimate_games",
            "join",
            "abc123",
            "--role",
            "spectator",
            "--addr",
            "10.0.0.2:4747",
        ])
        .unwrap();
        match cli.command {
            Command::Join {
                room, role, addr, ..
            } => {
                assert_eq!(room.as_str(), "ABC123");
                assert_eq!(role, Some(Role::Spectator));
                assert_eq!(addr.as_deref(), Some("10.0.0.2:4747"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_bad_values_rejected() {
        assert!(Cli::try_parse_from(["ultimate_games", "join", "toolongroom"]).is_err());
        assert!(Cli::try_parse_from(["ultimate_games", "play", "--side", "Z"]).is_err());
        assert!(Cli::try_parse_from(["ultimate_games", "play", "--mode", "online"]).is_ok());
    }
}
