//! Replay errors.

use crate::ai::ScorerError;
use derive_more::{Display, Error, From};
use ultimate_tictactoe::ReplayRejected;

/// Errors from loading, stepping or recording replays.
#[derive(Debug, Display, Error, From)]
pub enum ReplayError {
    /// A replay or manifest file could not be read or written.
    #[display("Replay I/O error: {_0}")]
    Io(std::io::Error),

    /// A replay or manifest is not valid JSON of the expected shape.
    #[display("Replay format error: {_0}")]
    Json(serde_json::Error),

    /// A remote replay could not be fetched.
    #[display("Replay fetch error: {_0}")]
    Http(reqwest::Error),

    /// The recording contains a move the engine refuses.
    #[display("Corrupt recording: {_0}")]
    Corrupt(ReplayRejected),

    /// The recorded result disagrees with the replayed game.
    #[display("Recording claims {claimed}, replay ends with {actual}")]
    #[from(skip)]
    ResultMismatch {
        /// The result stored in the file.
        claimed: String,
        /// The result the moves produce.
        actual: String,
    },

    /// A bot could not pick a move while recording.
    #[display("Recording failed: {_0}")]
    Scorer(ScorerError),
}
