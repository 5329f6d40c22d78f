//! Cache module for storing catalog records locally
//!
//! This module provides the in-memory cache manager that owns the current snapshot,
//! and the stores it writes through to after every mutation. A snapshot that cannot
//! be read at startup is replaced by an empty one, so a damaged cache file never keeps
//! the service from starting.

mod manager;
mod store;

pub use manager::CacheManager;
pub use store::{FileStore, MemoryStore, SnapshotStore, StoreError, DEFAULT_CACHE_FILE};
