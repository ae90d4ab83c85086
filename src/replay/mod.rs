//! Recorded games: file format, step-through controller, timed
//! playback and bot-vs-bot recording.

mod controller;
mod error;
mod file;
mod playback;
mod recorder;

pub use controller::{ReplayController, ReplayPhase};
pub use error::ReplayError;
pub use file::{MANIFEST_FILE, ManifestEntry, ReplayFile, read_manifest, write_manifest};
pub use playback::{ReplayCommand, ReplayEvent, run_viewer};
pub use recorder::{export_recordings, record_game};
