//! In-memory cache manager with write-through persistence
//!
//! Provides a `CacheManager` that owns the current snapshot, serves reads from memory
//! and saves the full snapshot to its store before any mutation returns.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::store::{SnapshotStore, StoreError};
use crate::data::{normalize_key, CacheSnapshot, Pokemon};

/// Owns the cached snapshot and mediates every read and write
///
/// The snapshot is loaded once when the manager is opened. Mutations hold the write
/// lock until the store has saved, so memory and the durable copy agree whenever no
/// save is in flight.
pub struct CacheManager {
    snapshot: RwLock<CacheSnapshot>,
    store: Box<dyn SnapshotStore>,
}

impl CacheManager {
    /// Loads the last snapshot from `store`, or starts empty if there is none
    pub fn open(store: impl SnapshotStore + 'static) -> Self {
        let snapshot = store.load();
        Self {
            snapshot: RwLock::new(snapshot),
            store: Box::new(store),
        }
    }

    /// Looks up a record by name, ignoring case
    pub async fn get(&self, key: &str) -> Option<Pokemon> {
        let snapshot = self.snapshot.read().await;
        snapshot.pokemon.get(&normalize_key(key)).cloned()
    }

    /// Finds a record by its numeric id
    ///
    /// Scans every cached record; there is no secondary index.
    pub async fn find_by_id(&self, id: u32) -> Option<Pokemon> {
        let snapshot = self.snapshot.read().await;
        snapshot.pokemon.values().find(|p| p.id == id).cloned()
    }

    /// Inserts or replaces a record under its lowercase name and saves the snapshot
    ///
    /// The stored record's name is normalized to the same lowercase form as its key.
    pub async fn upsert(&self, mut pokemon: Pokemon) -> Result<(), StoreError> {
        pokemon.name = pokemon.cache_key();
        let mut snapshot = self.snapshot.write().await;
        snapshot.pokemon.insert(pokemon.name.clone(), pokemon);
        self.store.save(&mut snapshot)
    }

    /// Saves the snapshot as it is, refreshing `fetched_at`
    pub async fn persist(&self) -> Result<(), StoreError> {
        let mut snapshot = self.snapshot.write().await;
        self.store.save(&mut snapshot)
    }

    /// Point-in-time copy of every cached record
    pub async fn values(&self) -> Vec<Pokemon> {
        let snapshot = self.snapshot.read().await;
        snapshot.pokemon.values().cloned().collect()
    }

    /// Number of cached records
    pub async fn len(&self) -> usize {
        self.snapshot.read().await.pokemon.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// When the snapshot was last saved
    pub async fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().await.fetched_at
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager").finish_non_exhaustive()
    }
}
