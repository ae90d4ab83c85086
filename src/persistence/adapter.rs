//! Best-effort save and revalidating load over a [`KeyValueStore`].
//!
//! Saves never fail from the caller's point of view. Loads return `None`
//! for anything that is missing, unreadable, or fails validation; a
//! partially valid record is never used.

use super::{KeyValueStore, PersistedGame, RoomRecord};
use crate::sync::RoomId;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};

/// Key of the local (non-room) game.
pub const LOCAL_GAME_KEY: &str = "superTttState";

/// Typed records over a string store.
#[derive(Debug, Clone)]
pub struct Persistence<S> {
    store: S,
}

impl<S: KeyValueStore> Persistence<S> {
    /// Wraps a store.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Serializes and writes `value`. Failures are logged and dropped.
    #[instrument(skip(self, value))]
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let text = match serde_json::to_string(value) {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "Could not encode record, not saved");
                return;
            }
        };
        match self.store.set(key, &text) {
            Ok(()) => debug!(bytes = text.len(), "Record saved"),
            Err(e) => warn!(error = %e, "Save failed, continuing"),
        }
    }

    /// Reads and fully decodes `key`, `None` on any failure.
    #[instrument(skip(self))]
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let text = match self.store.get(key) {
            Ok(Some(text)) => text,
            Ok(None) => {
                debug!("No record");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Load failed, treating as absent");
                return None;
            }
        };
        match serde_json::from_str(&text) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(error = %e, "Stored record is invalid, treating as absent");
                None
            }
        }
    }

    /// Removes `key`. Failures are logged and dropped.
    #[instrument(skip(self))]
    pub fn remove(&self, key: &str) {
        if let Err(e) = self.store.remove(key) {
            warn!(error = %e, "Remove failed, continuing");
        }
    }

    /// Saves the local game.
    pub fn save_game(&self, game: &PersistedGame) {
        self.save(LOCAL_GAME_KEY, game);
    }

    /// Loads the local game.
    pub fn load_game(&self) -> Option<PersistedGame> {
        self.load(LOCAL_GAME_KEY)
    }

    /// Forgets the local game.
    pub fn clear_game(&self) {
        self.remove(LOCAL_GAME_KEY);
    }

    /// Saves a room record under `room_<ID>`.
    pub fn save_room(&self, record: &RoomRecord) {
        self.save(&record.room_id().storage_key(), record);
    }

    /// Loads a room record, checking it belongs to `room` and that its
    /// roles are consistent.
    #[instrument(skip(self), fields(room = %room))]
    pub fn load_room(&self, room: &RoomId) -> Option<RoomRecord> {
        let record: RoomRecord = self.load(&room.storage_key())?;
        if record.room_id() != room {
            warn!(stored = %record.room_id(), "Room record under the wrong key");
            return None;
        }
        if !record.roles_consistent() {
            warn!("Room record has inconsistent roles");
            return None;
        }
        Some(record)
    }

    /// Deletes a room record; called when leaving a room.
    pub fn remove_room(&self, room: &RoomId) {
        self.remove(&room.storage_key());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GameMode;
    use crate::persistence::{MemoryStore, StoreError};
    use crate::sync::{PeerSession, Role};
    use ultimate_tictactoe::{GameState, Move, Player, replay};

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
            Err(StoreError::new("unavailable"))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Err(StoreError::new("quota exceeded"))
        }
        fn remove(&self, _key: &str) -> Result<(), StoreError> {
            Err(StoreError::new("unavailable"))
        }
    }

    #[test]
    fn test_game_roundtrip() {
        let persistence = Persistence::new(MemoryStore::new());
        let state = replay(&[Move::from_indices(2, 6).unwrap()]).unwrap();
        let game = PersistedGame::new(GameMode::Two, Player::X, state);
        persistence.save_game(&game);
        assert_eq!(persistence.load_game(), Some(game));
        persistence.clear_game();
        assert_eq!(persistence.load_game(), None);
    }

    #[test]
    fn test_broken_store_is_silent() {
        let persistence = Persistence::new(BrokenStore);
        let game = PersistedGame::new(GameMode::Two, Player::X, GameState::new());
        persistence.save_game(&game);
        assert_eq!(persistence.load_game(), None);
        persistence.clear_game();
    }

    #[test]
    fn test_invalid_record_is_absent() {
        let store = MemoryStore::new();
        let persistence = Persistence::new(store.clone());
        let game = PersistedGame::new(GameMode::Two, Player::X, GameState::new());
        persistence.save_game(&game);

        let text = store.get(LOCAL_GAME_KEY).unwrap().unwrap();
        let broken = text.replace("\"activeBoard\":-1", "\"activeBoard\":12");
        assert_ne!(broken, text);
        store.set(LOCAL_GAME_KEY, &broken).unwrap();
        assert_eq!(persistence.load_game(), None);

        store.set(LOCAL_GAME_KEY, "{\"gameMode\":\"two\"").unwrap();
        assert_eq!(persistence.load_game(), None);
    }

    #[test]
    fn test_room_lifecycle() {
        let persistence = Persistence::new(MemoryStore::new());
        let room = RoomId::parse("R00M42").unwrap();
        let session = PeerSession::host(room.clone(), Role::O).unwrap();
        let record = RoomRecord::capture(&session, &GameState::new());
        persistence.save_room(&record);
        assert_eq!(persistence.load_room(&room), Some(record));

        persistence.remove_room(&room);
        assert_eq!(persistence.load_room(&room), None);
    }

    #[test]
    fn test_room_under_wrong_key_is_absent() {
        let store = MemoryStore::new();
        let persistence = Persistence::new(store.clone());
        let room = RoomId::parse("AAAAAA").unwrap();
        let other = RoomId::parse("BBBBBB").unwrap();
        let session = PeerSession::host(room, Role::X).unwrap();
        let record = RoomRecord::capture(&session, &GameState::new());
        persistence.save(&other.storage_key(), &record);
        assert_eq!(persistence.load_room(&other), None);
    }
}
