//! Opaque key-value persistence.
//!
//! The preference model, bandit statistics and the lookup caches are all
//! stored as JSON records under fixed keys. Backends only need to move
//! `serde_json::Value`s in and out; typing happens in [`load_json`] and
//! [`save_json`].

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::error::{NpError, Result};

pub mod json_file;
pub mod memory;
pub mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

pub const PREFERENCE_MODEL_KEY: &str = "preference_model";
pub const TAG_STATS_KEY: &str = "tag_stats";
pub const MACROS_CACHE_KEY: &str = "macros_cache";
pub const EVIDENCE_CACHE_KEY: &str = "evidence_cache";

pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    fn set(&self, key: &str, value: &serde_json::Value) -> Result<()>;
}

/// Read a typed record. A record that no longer matches the expected shape
/// is reported and treated as absent so the caller starts from empty state.
pub fn load_json<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>> {
    let Some(raw) = store.get(key)? else {
        return Ok(None);
    };
    match serde_json::from_value(raw) {
        Ok(value) => Ok(Some(value)),
        Err(err) => {
            warn!(key, error = %err, "discarding malformed stored record");
            Ok(None)
        }
    }
}

/// Write a typed record, folding every backend failure into
/// [`NpError::Persistence`].
pub fn save_json<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_value(value)
        .map_err(|err| NpError::Serialization(format!("{key}: {err}")))?;
    store
        .set(key, &raw)
        .map_err(|err| NpError::Persistence(format!("{key}: {err}")))
}
