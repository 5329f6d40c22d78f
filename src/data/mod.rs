//! Core data models for the Pokémon cache
//!
//! This module contains the record type served by the API, the snapshot that is
//! persisted to disk, and the client used to fetch records from the remote catalog.

pub mod catalog;

pub use catalog::{CatalogClient, CatalogEntry, CatalogSource, RemoteError, DEFAULT_API_BASE};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// A single normalized catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pokemon {
    /// Stable identifier from the remote catalog
    pub id: u32,
    /// Canonical lowercase name, unique within a snapshot
    pub name: String,
    pub height: u32,
    pub weight: u32,
    /// Type names in source order
    #[serde(default)]
    pub types: Vec<String>,
    /// Ability names in source order
    #[serde(default)]
    pub abilities: Vec<String>,
    /// Sprite URLs and nested sprite data, passed through untouched
    #[serde(default)]
    pub sprites: Map<String, Value>,
}

impl Pokemon {
    /// The key this record is stored under in a snapshot
    pub fn cache_key(&self) -> String {
        normalize_key(&self.name)
    }
}

/// The full cache state as persisted to disk
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheSnapshot {
    /// When the snapshot was last saved, `None` if it never was
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    /// Records keyed by lowercase name
    #[serde(default)]
    pub pokemon: HashMap<String, Pokemon>,
}

/// Normalizes a name or lookup key to its cache form
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}
