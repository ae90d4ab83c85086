//! Ultimate tic-tac-toe application layer.
//!
//! The rules live in the [`ultimate_tictactoe`] crate. This crate adds
//! everything around them:
//!
//! - **Session**: play modes, input gating, and the reactions to each
//!   accepted move (persistence, peer propagation)
//! - **Orchestrator**: the single event loop that serializes local input,
//!   AI timers and peer messages
//! - **Sync**: the peer wire protocol, rooms, roles and transports
//! - **Replay**: recorded games, a step-through controller and playback
//! - **Persistence**: best-effort key-value storage (SQLite or memory)
//! - **AI**: move scoring and greedy selection
//!
//! # Example
//!
//! ```
//! use ultimate_games::{GameMode, GameSession, MemoryStore, MoveOrigin, Persistence};
//! use ultimate_tictactoe::{Move, Player};
//!
//! let mut session = GameSession::new(Persistence::new(MemoryStore::new()), GameMode::Two, Player::X);
//! let mv = Move::from_indices(4, 4).expect("in range");
//! session.submit(mv, MoveOrigin::Local).expect("legal opening move");
//! assert_eq!(session.status(false), "O's turn");
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod ai;
mod config;
mod orchestrator;
mod persistence;
mod replay;
mod scheduler;
mod session;
mod sync;

// Crate-level exports - AI
pub use ai::{MoveScorer, PolicyModel, RandomScorer, ScorerError, Unavailable, select_move};

// Crate-level exports - Configuration
pub use config::{AppConfig, ConfigError, DEFAULT_CONFIG_FILE};

// Crate-level exports - Game loop
pub use orchestrator::{GameCommand, GameEvent, Orchestrator};

// Crate-level exports - Persistence
pub use persistence::{
    KeyValueStore, LOCAL_GAME_KEY, MemoryStore, PersistedGame, Persistence, RoomRecord,
    SqliteStore, StoreError,
};

// Crate-level exports - Replay
pub use replay::{
    MANIFEST_FILE, ManifestEntry, ReplayCommand, ReplayController, ReplayError, ReplayEvent,
    ReplayFile, ReplayPhase, export_recordings, read_manifest, record_game, run_viewer,
    write_manifest,
};

// Crate-level exports - Scheduling
pub use scheduler::{Fired, Timer};

// Crate-level exports - Session
pub use session::{Applied, GameMode, GameSession, InputError, MoveOrigin};

// Crate-level exports - Synchronization
pub use sync::{
    Connector, PeerLink, PeerSession, Received, Role, RoomId, SyncError, TcpConnector,
    WireMessage, connect_with_retry,
};
