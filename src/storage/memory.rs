//! In-process store, used by tests and dry runs.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::error::{NpError, Result};

use super::KeyValueStore;

#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, serde_json::Value>>,
    fail_writes: bool,
    writes: Mutex<u64>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every write fails, for exercising the fatal path.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    /// Number of successful writes so far.
    #[must_use]
    pub fn write_count(&self) -> u64 {
        *self.writes.lock()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.records.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        if self.fail_writes {
            return Err(NpError::Io(std::io::Error::other(format!(
                "write to {key} rejected"
            ))));
        }
        self.records.lock().insert(key.to_string(), value.clone());
        *self.writes.lock() += 1;
        Ok(())
    }
}
