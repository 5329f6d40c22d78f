//! Durable storage for cache snapshots
//!
//! A store loads the snapshot once at startup and rewrites it in full after every
//! mutation. Loading never fails: a missing or unreadable snapshot is replaced by an
//! empty one so the service can always start.

use chrono::Utc;
use directories::ProjectDirs;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

use crate::data::CacheSnapshot;

/// File name used for the snapshot when no explicit path is configured
pub const DEFAULT_CACHE_FILE: &str = "cache.json";

/// Errors that can occur when saving a snapshot
#[derive(Debug, Error)]
pub enum StoreError {
    /// Directory creation or file writing failed
    #[error("Failed to write cache snapshot: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be serialized
    #[error("Failed to serialize cache snapshot: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A previous writer panicked while holding the store
    #[error("Cache store is poisoned")]
    Poisoned,
}

/// Durable copy of the cache
pub trait SnapshotStore: Send + Sync {
    /// Reads the last saved snapshot
    ///
    /// Returns an empty snapshot if nothing was saved yet or the saved data cannot be
    /// parsed. Failures are logged and never returned to the caller.
    fn load(&self) -> CacheSnapshot;

    /// Stamps `fetched_at` with the current time and writes the full snapshot
    fn save(&self, snapshot: &mut CacheSnapshot) -> Result<(), StoreError>;
}

/// Stores the snapshot as a pretty-printed JSON file
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store backed by the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the default snapshot location
    ///
    /// Uses `~/.cache/pokecache/cache.json` on Linux, or the equivalent XDG path on
    /// other platforms. Falls back to `cache.json` in the working directory when no
    /// home directory can be determined.
    pub fn default_path() -> PathBuf {
        ProjectDirs::from("", "", "pokecache")
            .map(|dirs| dirs.cache_dir().join(DEFAULT_CACHE_FILE))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_FILE))
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_dir(&self) -> std::io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

impl SnapshotStore for FileStore {
    fn load(&self) -> CacheSnapshot {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return CacheSnapshot::default(),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cache file unreadable, starting empty");
                return CacheSnapshot::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Cache file corrupt, starting empty");
                CacheSnapshot::default()
            }
        }
    }

    fn save(&self, snapshot: &mut CacheSnapshot) -> Result<(), StoreError> {
        self.ensure_dir()?;
        snapshot.fetched_at = Some(Utc::now());
        let json = serde_json::to_string_pretty(snapshot)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

/// Keeps the serialized snapshot in memory
///
/// Behaves like [`FileStore`] without touching the filesystem, including the
/// fall-back-to-empty rule for unparsable contents.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    saved: Option<String>,
    saves: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose next `load` reads the given raw contents
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            inner: Mutex::new(MemoryInner {
                saved: Some(contents.into()),
                saves: 0,
            }),
        }
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.inner.lock().map(|inner| inner.saves).unwrap_or(0)
    }

    /// Raw contents of the last save
    pub fn contents(&self) -> Option<String> {
        self.inner.lock().ok().and_then(|inner| inner.saved.clone())
    }
}

impl SnapshotStore for MemoryStore {
    fn load(&self) -> CacheSnapshot {
        let Some(contents) = self.contents() else {
            return CacheSnapshot::default();
        };
        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Stored snapshot corrupt, starting empty");
            CacheSnapshot::default()
        })
    }

    fn save(&self, snapshot: &mut CacheSnapshot) -> Result<(), StoreError> {
        snapshot.fetched_at = Some(Utc::now());
        let json = serde_json::to_string(snapshot)?;
        let mut inner = self.inner.lock().map_err(|_| StoreError::Poisoned)?;
        inner.saved = Some(json);
        inner.saves += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Pokemon;
    use serde_json::Map;
    use tempfile::TempDir;

    fn create_test_store() -> (FileStore, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let store = FileStore::new(temp_dir.path().join("cache.json"));
        (store, temp_dir)
    }

    fn snapshot_with(name: &str, id: u32) -> CacheSnapshot {
        let mut snapshot = CacheSnapshot::default();
        snapshot.pokemon.insert(
            name.to_string(),
            Pokemon {
                id,
                name: name.to_string(),
                height: 7,
                weight: 69,
                types: vec!["grass".to_string(), "poison".to_string()],
                abilities: vec!["overgrow".to_string()],
                sprites: Map::new(),
            },
        );
        snapshot
    }

    #[test]
    fn test_load_returns_empty_for_missing_file() {
        let (store, _temp_dir) = create_test_store();

        let snapshot = store.load();

        assert!(snapshot.fetched_at.is_none());
        assert!(snapshot.pokemon.is_empty());
    }

    #[test]
    fn test_load_returns_empty_for_corrupt_file() {
        let (store, _temp_dir) = create_test_store();
        fs::write(store.path(), "{ not json").expect("Should write file");

        let snapshot = store.load();

        assert_eq!(snapshot, CacheSnapshot::default());
    }

    #[test]
    fn test_save_stamps_fetched_at() {
        let (store, _temp_dir) = create_test_store();
        let mut snapshot = CacheSnapshot::default();

        let before = Utc::now();
        store.save(&mut snapshot).expect("Save should succeed");
        let after = Utc::now();

        let stamped = snapshot.fetched_at.expect("fetched_at should be set");
        assert!(stamped >= before && stamped <= after);
    }

    #[test]
    fn test_saved_snapshot_is_loaded_back() {
        let (store, _temp_dir) = create_test_store();
        let mut snapshot = snapshot_with("bulbasaur", 1);

        store.save(&mut snapshot).expect("Save should succeed");
        let loaded = store.load();

        assert_eq!(loaded, snapshot);
        assert!(loaded.pokemon.contains_key("bulbasaur"));
    }

    #[test]
    fn test_file_uses_snapshot_field_names() {
        let (store, _temp_dir) = create_test_store();
        let mut snapshot = snapshot_with("bulbasaur", 1);

        store.save(&mut snapshot).expect("Save should succeed");

        let content = fs::read_to_string(store.path()).expect("Should read file");
        assert!(content.contains("\"fetched_at\""));
        assert!(content.contains("\"pokemon\""));
        assert!(content.contains("\"bulbasaur\""));
    }

    #[test]
    fn test_save_creates_directory_if_missing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("nested").join("dir").join("cache.json");
        let store = FileStore::new(nested.clone());

        store
            .save(&mut CacheSnapshot::default())
            .expect("Save should succeed");

        assert!(nested.exists(), "Cache file should be created");
    }

    #[test]
    fn test_default_path_ends_with_cache_file() {
        let path = FileStore::default_path();
        assert!(path.ends_with(DEFAULT_CACHE_FILE));
    }

    #[test]
    fn test_memory_store_round_trip_and_count() {
        let store = MemoryStore::new();
        assert_eq!(store.load(), CacheSnapshot::default());

        let mut snapshot = snapshot_with("charmander", 4);
        store.save(&mut snapshot).expect("Save should succeed");
        store.save(&mut snapshot).expect("Save should succeed");

        assert_eq!(store.save_count(), 2);
        assert_eq!(store.load(), snapshot);
    }

    #[test]
    fn test_memory_store_falls_back_on_garbage() {
        let store = MemoryStore::with_contents("garbage");
        assert_eq!(store.load(), CacheSnapshot::default());
    }
}
