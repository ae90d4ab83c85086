//! Replay files and the manifest that lists them.
//!
//! A replay is `{"moves": [[big, small], ...], "result": "X", "steps": n}`.
//! The manifest `list.json` is an array of `{file, result, steps, date}`.

use super::ReplayError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};
use ultimate_tictactoe::{GameState, Move, Outcome, replay};

/// Manifest file name inside a replay directory.
pub const MANIFEST_FILE: &str = "list.json";

/// A recorded game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFile {
    /// Moves in play order, starting with `X`.
    pub moves: Vec<Move>,
    /// Final result label, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Outcome>,
    /// Number of moves, when recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<usize>,
}

impl ReplayFile {
    /// A recording of `moves` ending in `result`.
    pub fn new(moves: Vec<Move>, result: Option<Outcome>) -> Self {
        let steps = Some(moves.len());
        Self {
            moves,
            result,
            steps,
        }
    }

    /// Parses a replay.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Json`] when the text is not a replay.
    pub fn from_json(text: &str) -> Result<Self, ReplayError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Reads a replay file.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] when the file is unreadable or invalid.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn read(path: impl AsRef<Path>) -> Result<Self, ReplayError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let file = Self::from_json(&text)?;
        debug!(moves = file.moves.len(), "Replay read");
        Ok(file)
    }

    /// Downloads a replay.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Http`] on transport or status failures and
    /// [`ReplayError::Json`] when the body is not a replay.
    #[instrument]
    pub async fn fetch(url: &str) -> Result<Self, ReplayError> {
        let body = reqwest::get(url).await?.error_for_status()?.text().await?;
        let file = Self::from_json(&body)?;
        info!(moves = file.moves.len(), "Replay fetched");
        Ok(file)
    }

    /// Loads from an `http(s)://` URL or a local path.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] when the source cannot be loaded.
    pub async fn load(source: &str) -> Result<Self, ReplayError> {
        if source.starts_with("http://") || source.starts_with("https://") {
            Self::fetch(source).await
        } else {
            Self::read(source)
        }
    }

    /// Writes pretty-printed JSON to `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError`] when the file cannot be written.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ReplayError> {
        std::fs::write(path.as_ref(), serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Replays every move and checks the recorded result.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::Corrupt`] at the first refused move and
    /// [`ReplayError::ResultMismatch`] when the stored result differs.
    #[instrument(skip(self), fields(moves = self.moves.len()))]
    pub fn verify(&self) -> Result<GameState, ReplayError> {
        let state = replay(&self.moves)?;
        if let Some(claimed) = self.result {
            if state.winner() != Some(claimed) {
                return Err(ReplayError::ResultMismatch {
                    claimed: claimed.to_string(),
                    actual: state
                        .winner()
                        .map_or_else(|| "no result".to_string(), |o| o.to_string()),
                });
            }
        }
        Ok(state)
    }
}

/// One manifest line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// File name relative to the manifest.
    pub file: String,
    /// Final result.
    #[serde(default)]
    pub result: Option<Outcome>,
    /// Number of moves.
    pub steps: usize,
    /// Recording timestamp, `YYYYmmdd_HHMMSS`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Reads `list.json` in `dir`; missing or malformed manifests read as empty.
#[instrument(skip(dir), fields(dir = %dir.as_ref().display()))]
pub fn read_manifest(dir: impl AsRef<Path>) -> Vec<ManifestEntry> {
    let path = dir.as_ref().join(MANIFEST_FILE);
    let Ok(text) = std::fs::read_to_string(&path) else {
        debug!("No manifest yet");
        return Vec::new();
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring malformed manifest");
        Vec::new()
    })
}

/// Writes `list.json` in `dir`.
///
/// # Errors
///
/// Returns [`ReplayError`] when the manifest cannot be written.
#[instrument(skip(dir, entries), fields(dir = %dir.as_ref().display(), count = entries.len()))]
pub fn write_manifest(dir: impl AsRef<Path>, entries: &[ManifestEntry]) -> Result<(), ReplayError> {
    let path = dir.as_ref().join(MANIFEST_FILE);
    std::fs::write(path, serde_json::to_string_pretty(entries)?)?;
    Ok(())
}
