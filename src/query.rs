//! Filtered list queries and single-record lookups
//!
//! List queries run against a point-in-time copy of the cache. Lookups try the cache
//! first and fall back to the remote catalog, storing whatever they fetch.

use std::sync::Arc;
use thiserror::Error;

use crate::cache::CacheManager;
use crate::data::{normalize_key, CatalogSource, Pokemon};

/// Number of results returned when the caller gives no limit
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Errors returned by single-record lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// Neither the cache nor the remote catalog had the record
    #[error("not found")]
    NotFound(String),
}

/// A weight bound taken from user input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightBound {
    /// Inclusive bound; may lie outside the range any weight can take
    At(i64),
    /// The input was not a number, so no record satisfies the bound
    Unsatisfiable,
}

/// Filters for a list query
///
/// Every filter that is set must match (logical AND).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListQuery {
    /// Case-insensitive substring of the name
    pub name_contains: Option<String>,
    /// Matches when any of the record's types equals any of these (case-insensitive)
    pub types: Vec<String>,
    /// Lower bound on weight
    pub min_weight: Option<WeightBound>,
    /// Upper bound on weight
    pub max_weight: Option<WeightBound>,
    /// Maximum number of results, applied after sorting by id
    pub limit: usize,
}

impl Default for ListQuery {
    fn default() -> Self {
        Self {
            name_contains: None,
            types: Vec::new(),
            min_weight: None,
            max_weight: None,
            limit: DEFAULT_LIST_LIMIT,
        }
    }
}

impl ListQuery {
    /// Whether a single record passes every filter
    pub fn matches(&self, pokemon: &Pokemon) -> bool {
        if let Some(needle) = &self.name_contains {
            if !pokemon.name.to_lowercase().contains(&needle.to_lowercase()) {
                return false;
            }
        }

        if !self.types.is_empty() {
            let hit = pokemon
                .types
                .iter()
                .map(|t| t.to_lowercase())
                .any(|t| self.types.iter().any(|wanted| wanted.to_lowercase() == t));
            if !hit {
                return false;
            }
        }

        let weight = i64::from(pokemon.weight);
        match self.min_weight {
            Some(WeightBound::At(min)) if weight < min => return false,
            Some(WeightBound::Unsatisfiable) => return false,
            _ => {}
        }
        match self.max_weight {
            Some(WeightBound::At(max)) if weight > max => return false,
            Some(WeightBound::Unsatisfiable) => return false,
            _ => {}
        }

        true
    }
}

/// Answers list queries and lookups against the cache
#[derive(Clone)]
pub struct QueryEngine {
    cache: Arc<CacheManager>,
    catalog: Arc<dyn CatalogSource>,
}

impl QueryEngine {
    pub fn new(cache: Arc<CacheManager>, catalog: Arc<dyn CatalogSource>) -> Self {
        Self { cache, catalog }
    }

    /// Filters, sorts by ascending id and truncates the cached records
    pub async fn list(&self, query: &ListQuery) -> Vec<Pokemon> {
        let mut results: Vec<Pokemon> = self
            .cache
            .values()
            .await
            .into_iter()
            .filter(|p| query.matches(p))
            .collect();

        results.sort_by_key(|p| p.id);
        results.truncate(query.limit);
        results
    }

    /// Resolves a record by name or numeric id
    ///
    /// Tries, in order: the cache key, a cached record whose id matches the key, and a
    /// remote fetch. A fetched record is stored so the next lookup is served from the
    /// cache. Any remote failure is reported as [`LookupError::NotFound`].
    pub async fn lookup(&self, key: &str) -> Result<Pokemon, LookupError> {
        let key = normalize_key(key);
        if key.is_empty() {
            return Err(LookupError::NotFound(key));
        }

        if let Some(pokemon) = self.cache.get(&key).await {
            return Ok(pokemon);
        }

        // Only keys that render back identically count as ids ("007" is not 7).
        if let Some(id) = key.parse::<u32>().ok().filter(|id| id.to_string() == key) {
            if let Some(pokemon) = self.cache.find_by_id(id).await {
                return Ok(pokemon);
            }
        }

        let pokemon = match self.catalog.fetch_detail(&key).await {
            Ok(pokemon) => pokemon,
            Err(e) => {
                tracing::debug!(%key, error = %e, "Remote lookup failed");
                return Err(LookupError::NotFound(key));
            }
        };

        if let Err(e) = self.cache.upsert(pokemon.clone()).await {
            tracing::warn!(name = %pokemon.name, error = %e, "Failed to persist fetched record");
        }
        Ok(pokemon)
    }
}
