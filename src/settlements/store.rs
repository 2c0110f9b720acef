//! Key-value persistence for the settlement list
//!
//! The whole record set is one serialized string under one key: read once at
//! startup, overwritten after every mutation.

use crate::core::error::{RaidError, Result};
use std::fs;
use std::path::PathBuf;

/// Storage key under which the settlement list is kept
pub const SETTLEMENTS_KEY: &str = "settlement_raids.settlements";

/// External key-value store holding serialized state
pub trait KeyValueStore {
    fn read(&self, key: &str) -> Result<Option<String>>;
    fn write(&mut self, key: &str, value: &str) -> Result<()>;
}

/// In-process store, mostly for tests and the headless driver
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: ahash::AHashMap<String, String>,
    /// When set, every write fails
    pub fail_writes: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.values.insert(key.to_string(), value.into());
        store
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }
}

impl KeyValueStore for MemoryStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes {
            return Err(RaidError::Persistence(format!("write to {key} rejected")));
        }
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl KeyValueStore for FileStore {
    fn read(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read_to_string(path)?))
    }

    fn write(&mut self, key: &str, value: &str) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        // Replace via a temp file and rename
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, value)?;
        fs::rename(tmp, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryStore::new();
        assert!(store.read("k").unwrap().is_none());
        store.write("k", "[]").unwrap();
        assert_eq!(store.read("k").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_memory_store_write_failure() {
        let mut store = MemoryStore::new();
        store.fail_writes = true;
        assert!(matches!(store.write("k", "[]"), Err(RaidError::Persistence(_))));
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = std::env::temp_dir().join(format!("settlement_raids_store_{}", uuid::Uuid::new_v4()));
        let mut store = FileStore::new(&dir);
        assert!(store.read(SETTLEMENTS_KEY).unwrap().is_none());

        store.write(SETTLEMENTS_KEY, "[1]").unwrap();
        store.write(SETTLEMENTS_KEY, "[2]").unwrap();
        assert_eq!(store.read(SETTLEMENTS_KEY).unwrap().as_deref(), Some("[2]"));

        let _ = fs::remove_dir_all(dir);
    }
}
