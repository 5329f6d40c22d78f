//! Bulk refresh of the cache from the remote catalog
//!
//! A refresh lists identifiers once and then fetches each record in turn. Only the
//! listing step can fail the whole operation; a failed record is logged, reported
//! and skipped.

use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

use crate::cache::{CacheManager, StoreError};
use crate::data::{CatalogSource, RemoteError};

/// Number of records requested when the caller gives no limit
pub const DEFAULT_REFRESH_LIMIT: usize = 150;

/// Errors that abort a refresh
#[derive(Debug, Error)]
pub enum RefreshError {
    /// The identifier listing could not be fetched; the cache is unchanged
    #[error("Failed to list catalog: {0}")]
    Listing(#[from] RemoteError),

    /// The final snapshot save failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A record that could not be refreshed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    pub name: String,
    pub error: String,
}

/// Outcome of a completed refresh
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RefreshReport {
    /// Identifiers returned by the listing
    pub requested: usize,
    /// Records fetched and stored
    pub refreshed: usize,
    /// Records skipped because their fetch or save failed
    pub failures: Vec<ItemFailure>,
    /// Total records cached after the refresh, including pre-existing ones
    pub cached: usize,
}

/// Drives bulk population of the cache
#[derive(Clone)]
pub struct Refresher {
    cache: Arc<CacheManager>,
    catalog: Arc<dyn CatalogSource>,
}

impl Refresher {
    pub fn new(cache: Arc<CacheManager>, catalog: Arc<dyn CatalogSource>) -> Self {
        Self { cache, catalog }
    }

    /// Fetches up to `limit` records and stores every one that succeeds
    ///
    /// Records are fetched sequentially to bound load on the remote catalog. The
    /// snapshot is saved once more at the end so `fetched_at` reflects this refresh
    /// even when no record succeeded.
    pub async fn refresh(&self, limit: usize) -> Result<RefreshReport, RefreshError> {
        let entries = self.catalog.list_identifiers(limit).await?;
        tracing::info!(limit, listed = entries.len(), "Refreshing cache");

        let mut report = RefreshReport {
            requested: entries.len(),
            ..Default::default()
        };

        for entry in entries {
            let result = match self.catalog.fetch_detail(&entry.name).await {
                Ok(pokemon) => self.cache.upsert(pokemon).await.map_err(|e| e.to_string()),
                Err(e) => Err(e.to_string()),
            };

            match result {
                Ok(()) => report.refreshed += 1,
                Err(error) => {
                    tracing::warn!(name = %entry.name, %error, "Failed to refresh record");
                    report.failures.push(ItemFailure {
                        name: entry.name,
                        error,
                    });
                }
            }
        }

        self.cache.persist().await?;
        report.cached = self.cache.len().await;

        tracing::info!(
            refreshed = report.refreshed,
            failed = report.failures.len(),
            cached = report.cached,
            "Refresh complete"
        );
        Ok(report)
    }
}
