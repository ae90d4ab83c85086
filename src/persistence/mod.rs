//! Persistence: a string key-value seam, its SQLite and in-memory
//! backends, and the typed records stored in them.

mod adapter;
mod error;
mod models;
mod records;
mod repository;
mod schema;
mod store;

pub use adapter::{LOCAL_GAME_KEY, Persistence};
pub use error::StoreError;
pub use records::{PersistedGame, RoomRecord};
pub use repository::SqliteStore;
pub use store::{KeyValueStore, MemoryStore};
