//! JSON document store: every key lives in one file, rewritten atomically.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

use crate::error::{NpError, Result};

use super::KeyValueStore;

pub struct JsonFileStore {
    path: PathBuf,
    records: Mutex<BTreeMap<String, serde_json::Value>>,
}

impl JsonFileStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let records = read_records(&path)?;
        Ok(Self {
            path,
            records: Mutex::new(records),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.records.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &serde_json::Value) -> Result<()> {
        let mut records = self.records.lock();
        let previous = records.insert(key.to_string(), value.clone());
        if let Err(err) = write_records(&self.path, &records) {
            // Keep memory consistent with disk.
            match previous {
                Some(previous) => records.insert(key.to_string(), previous),
                None => records.remove(key),
            };
            return Err(err);
        }
        Ok(())
    }
}

fn read_records(path: &Path) -> Result<BTreeMap<String, serde_json::Value>> {
    if !path.exists() {
        return Ok(BTreeMap::new());
    }
    let raw = fs::read_to_string(path)?;
    if raw.trim().is_empty() {
        return Ok(BTreeMap::new());
    }
    serde_json::from_str(&raw)
        .map_err(|err| NpError::Serialization(format!("store {}: {err}", path.display())))
}

fn write_records(path: &Path, records: &BTreeMap<String, serde_json::Value>) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(records)?;
    let temp_path = path.with_extension("tmp");
    fs::write(&temp_path, json)?;
    match fs::rename(&temp_path, path) {
        Ok(()) => {}
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            fs::remove_file(path)?;
            if let Err(err) = fs::rename(&temp_path, path) {
                let _ = fs::remove_file(&temp_path);
                return Err(NpError::Io(err));
            }
        }
        Err(err) => return Err(NpError::Io(err)),
    }
    Ok(())
}
