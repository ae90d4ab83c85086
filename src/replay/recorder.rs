//! Bot-vs-bot game generation for the replay library.

use super::{ManifestEntry, ReplayError, ReplayFile, read_manifest, write_manifest};
use crate::ai::{MoveScorer, select_move};
use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use ultimate_tictactoe::{GameState, ReplayRejected};

/// Plays one game with `scorer` choosing for both sides.
///
/// # Errors
///
/// Returns [`ReplayError::Scorer`] when the scorer fails.
#[instrument(skip(scorer))]
pub fn record_game(scorer: &dyn MoveScorer) -> Result<ReplayFile, ReplayError> {
    let mut state = GameState::new();
    let mut moves = Vec::new();
    while let Some(mv) = select_move(&state, scorer)? {
        state = state
            .apply(mv)
            .map_err(|reason| ReplayRejected {
                index: moves.len(),
                action: mv,
                reason,
            })?
            .state;
        moves.push(mv);
    }
    Ok(ReplayFile::new(moves, state.winner()))
}

/// Records `count` games into `dir` as `replay_<timestamp>[_n].json` and
/// appends them to the manifest.
///
/// # Errors
///
/// Returns [`ReplayError`] when a game fails or a file cannot be written.
#[instrument(skip(dir, scorer), fields(dir = %dir.as_ref().display()))]
pub fn export_recordings(
    dir: impl AsRef<Path>,
    count: usize,
    scorer: &dyn MoveScorer,
) -> Result<Vec<PathBuf>, ReplayError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;
    let mut entries = read_manifest(dir);
    let mut written = Vec::with_capacity(count);

    for n in 1..=count {
        let game = record_game(scorer)?;
        let stamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let suffix = if count > 1 {
            format!("_{}", n)
        } else {
            String::new()
        };
        let file = format!("replay_{}{}.json", stamp, suffix);
        let path = dir.join(&file);
        game.write(&path)?;

        info!(%file, steps = game.moves.len(), result = ?game.result, "Recorded game");
        entries.push(ManifestEntry {
            file,
            result: game.result,
            steps: game.moves.len(),
            date: Some(stamp),
        });
        written.push(path);
    }

    write_manifest(dir, &entries)?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::RandomScorer;

    #[test]
    fn test_recorded_games_verify() {
        let scorer = RandomScorer::seeded(3);
        for _ in 0..5 {
            let game = record_game(&scorer).unwrap();
            assert_eq!(game.steps, Some(game.moves.len()));
            assert!(game.result.is_some());
            assert_eq!(game.verify().unwrap().winner(), game.result);
        }
    }

    #[test]
    fn test_export_appends_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let scorer = RandomScorer::seeded(11);
        let first = export_recordings(dir.path(), 2, &scorer).unwrap();
        let second = export_recordings(dir.path(), 1, &scorer).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(second.len(), 1);

        let manifest = read_manifest(dir.path());
        assert_eq!(manifest.len(), 3);
        for entry in &manifest {
            let game = ReplayFile::read(dir.path().join(&entry.file)).unwrap();
            assert_eq!(game.moves.len(), entry.steps);
        }
    }
}
