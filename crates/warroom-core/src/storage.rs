//! Key-value storage port behind the persisted store.
//!
//! The store never touches the filesystem directly; it talks to a [`Storage`]
//! so tests can swap in [`MemoryStorage`] and hosts can supply their own.

use crate::error::{Result, WarRoomError};
use crate::{io, paths};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

pub trait Storage {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// FileStorage
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        paths::validate_key(key)?;
        let path = paths::key_path(&self.dir, key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(&path)?))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        paths::validate_key(key)?;
        let path = paths::key_path(&self.dir, key);
        tracing::debug!(path = %path.display(), bytes = value.len(), "writing key");
        io::atomic_write(&path, value.as_bytes())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        paths::validate_key(key)?;
        io::remove_if_exists(&paths::key_path(&self.dir, key))
    }
}

// ---------------------------------------------------------------------------
// MemoryStorage
// ---------------------------------------------------------------------------

/// In-process storage. Clones share the same entries, so a test can keep a
/// handle after moving one into a store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entry(key: &str, value: &str) -> Self {
        let storage = Self::default();
        if let Ok(mut entries) = storage.entries.lock() {
            entries.insert(key.to_string(), value.to_string());
        }
        storage
    }

    /// Make every subsequent `set` fail, simulating a full or revoked store.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().ok().and_then(|e| e.get(key).cloned())
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| WarRoomError::Storage("memory storage lock poisoned".to_string()))
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(WarRoomError::Storage(format!(
                "quota exceeded writing '{key}'"
            )));
        }
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_storage_roundtrip() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path());
        assert_eq!(storage.get("warroom_state").unwrap(), None);

        storage.set("warroom_state", "{\"xp\":1}").unwrap();
        assert_eq!(
            storage.get("warroom_state").unwrap().as_deref(),
            Some("{\"xp\":1}")
        );
        assert!(dir.path().join("warroom_state.json").exists());

        storage.remove("warroom_state").unwrap();
        assert_eq!(storage.get("warroom_state").unwrap(), None);
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = TempDir::new().unwrap();
        let mut storage = FileStorage::new(dir.path());
        assert!(matches!(
            storage.set("../outside", "x"),
            Err(WarRoomError::InvalidKey(_))
        ));
    }

    #[test]
    fn memory_storage_clones_share_entries() {
        let handle = MemoryStorage::new();
        let mut moved = handle.clone();
        moved.set("k", "v").unwrap();
        assert_eq!(handle.raw("k").as_deref(), Some("v"));
    }

    #[test]
    fn memory_storage_can_fail_writes() {
        let mut storage = MemoryStorage::new();
        storage.fail_writes(true);
        assert!(matches!(storage.set("k", "v"), Err(WarRoomError::Storage(_))));
        storage.fail_writes(false);
        storage.set("k", "v").unwrap();
    }
}
