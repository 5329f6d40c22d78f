//! Shared fixtures for unit tests

use async_trait::async_trait;
use serde_json::Map;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::data::{CatalogEntry, CatalogSource, Pokemon, RemoteError};

pub fn pokemon(id: u32, name: &str, weight: u32, types: &[&str]) -> Pokemon {
    Pokemon {
        id,
        name: name.to_string(),
        height: 10,
        weight,
        types: types.iter().map(|t| t.to_string()).collect(),
        abilities: Vec::new(),
        sprites: Map::new(),
    }
}

/// In-memory catalog with scripted failures and call counting
#[derive(Default)]
pub struct FakeCatalog {
    listing: Option<Vec<String>>,
    details: HashMap<String, Pokemon>,
    failing: HashSet<String>,
    list_calls: AtomicUsize,
    detail_calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record served by both the listing and detail endpoints
    pub fn with(mut self, pokemon: Pokemon) -> Self {
        self.listing
            .get_or_insert_with(Vec::new)
            .push(pokemon.name.clone());
        self.details.insert(pokemon.name.clone(), pokemon.clone());
        self.details.insert(pokemon.id.to_string(), pokemon);
        self
    }

    /// Lists `name` but fails its detail fetch with a server error
    pub fn with_failing(mut self, name: &str) -> Self {
        self.listing.get_or_insert_with(Vec::new).push(name.to_string());
        self.failing.insert(name.to_string());
        self
    }

    /// Makes the listing call fail
    pub fn without_listing(mut self) -> Self {
        self.listing = None;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CatalogSource for FakeCatalog {
    async fn list_identifiers(&self, limit: usize) -> Result<Vec<CatalogEntry>, RemoteError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let listing = self.listing.as_ref().ok_or(RemoteError::Timeout)?;
        Ok(listing
            .iter()
            .take(limit)
            .map(|name| CatalogEntry { name: name.clone() })
            .collect())
    }

    async fn fetch_detail(&self, name_or_id: &str) -> Result<Pokemon, RemoteError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(name_or_id.to_string());
        }
        if self.failing.contains(name_or_id) {
            return Err(RemoteError::HttpStatus(500));
        }
        self.details
            .get(name_or_id)
            .cloned()
            .ok_or(RemoteError::HttpStatus(404))
    }
}
