//! PokéAPI catalog client
//!
//! This module fetches the list of known Pokémon and per-Pokémon detail payloads from
//! the remote catalog, classifying failures and normalizing the loosely-typed detail
//! payload into a [`Pokemon`] once, at this boundary.

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use thiserror::Error;

use super::Pokemon;

/// Base URL for the public PokéAPI
pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";

/// Default timeout for a single remote request in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Errors that can occur when talking to the remote catalog
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The request did not complete within the configured timeout
    #[error("Request timed out")]
    Timeout,

    /// The remote answered with a non-success status
    #[error("API error: {0}")]
    HttpStatus(u16),

    /// Any other transport failure
    #[error("Network error: {0}")]
    Network(String),

    /// The remote answered successfully but the body could not be decoded
    #[error("Failed to decode API response: {0}")]
    Decode(String),

    /// The base URL or a key cannot be turned into a catalog URL
    #[error("Invalid catalog URL: {0}")]
    InvalidUrl(String),
}

impl RemoteError {
    /// Whether the remote reported that the requested item does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::HttpStatus(code) if *code == StatusCode::NOT_FOUND.as_u16())
    }

    fn classify(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RemoteError::Timeout
        } else if let Some(status) = err.status() {
            RemoteError::HttpStatus(status.as_u16())
        } else if err.is_decode() {
            RemoteError::Decode(err.to_string())
        } else {
            RemoteError::Network(err.to_string())
        }
    }
}

/// One entry of the catalog listing
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
}

/// Source of catalog records
///
/// Implemented by [`CatalogClient`] for the real API; the refresher and the query
/// engine only depend on this trait.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Lists up to `limit` entries starting at offset 0
    async fn list_identifiers(&self, limit: usize) -> Result<Vec<CatalogEntry>, RemoteError>;

    /// Fetches one record by name or numeric id
    async fn fetch_detail(&self, name_or_id: &str) -> Result<Pokemon, RemoteError>;
}

/// HTTP client for the PokéAPI
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: Url,
}

impl CatalogClient {
    /// Creates a client for the public API with the default timeout
    pub fn new() -> Result<Self, RemoteError> {
        Self::with_base_url(DEFAULT_API_BASE, Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    /// Creates a client for a custom base URL and request timeout
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RemoteError> {
        let raw = base_url.into();
        let base_url = Url::parse(raw.trim_end_matches('/'))
            .map_err(|e| RemoteError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(raw));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Network(e.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    /// Appends path segments to the base URL
    ///
    /// Each segment is percent-encoded, so `/`, `?` and `#` inside a key stay part of
    /// that segment. `.` and `..` would be dropped by the URL builder and are rejected.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, RemoteError> {
        if let Some(bad) = segments.iter().find(|s| matches!(**s, "" | "." | "..")) {
            return Err(RemoteError::InvalidUrl(format!("invalid path segment '{}'", bad)));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T, RemoteError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(RemoteError::classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::HttpStatus(status.as_u16()));
        }

        let text = response.text().await.map_err(RemoteError::classify)?;
        serde_json::from_str(&text).map_err(|e| RemoteError::Decode(e.to_string()))
    }
}

#[async_trait]
impl CatalogSource for CatalogClient {
    async fn list_identifiers(&self, limit: usize) -> Result<Vec<CatalogEntry>, RemoteError> {
        let url = self.endpoint(&["pokemon"])?;
        let listing: ListResponse = self
            .get_json(url, &[("limit", limit.to_string()), ("offset", "0".to_string())])
            .await?;
        Ok(listing.results.unwrap_or_default())
    }

    async fn fetch_detail(&self, name_or_id: &str) -> Result<Pokemon, RemoteError> {
        let url = self.endpoint(&["pokemon", name_or_id])?;
        let detail: DetailResponse = self.get_json(url, &[]).await?;
        detail.into_pokemon()
    }
}

/// Listing response from `/pokemon`
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Option<Vec<CatalogEntry>>,
}

/// Detail response from `/pokemon/{name}`
///
/// Only the fields we keep are modeled. The nested lists and the sprite map are
/// optional in practice and default to empty.
#[derive(Debug, Deserialize)]
struct DetailResponse {
    id: u32,
    name: String,
    height: u32,
    weight: u32,
    #[serde(default)]
    types: Option<Vec<TypeSlot>>,
    #[serde(default)]
    abilities: Option<Vec<AbilitySlot>>,
    #[serde(default)]
    sprites: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct TypeSlot {
    #[serde(rename = "type")]
    kind: NamedResource,
}

#[derive(Debug, Deserialize)]
struct AbilitySlot {
    ability: NamedResource,
}

impl DetailResponse {
    /// Validates the payload and normalizes it into a record
    fn into_pokemon(self) -> Result<Pokemon, RemoteError> {
        if self.id == 0 {
            return Err(RemoteError::Decode("id must be positive".to_string()));
        }
        if self.name.trim().is_empty() {
            return Err(RemoteError::Decode("name must not be empty".to_string()));
        }

        Ok(Pokemon {
            id: self.id,
            name: self.name.to_lowercase(),
            height: self.height,
            weight: self.weight,
            types: self
                .types
                .unwrap_or_default()
                .into_iter()
                .map(|slot| slot.kind.name)
                .collect(),
            abilities: self
                .abilities
                .unwrap_or_default()
                .into_iter()
                .map(|slot| slot.ability.name)
                .collect(),
            sprites: self.sprites.unwrap_or_default(),
        })
    }
}
