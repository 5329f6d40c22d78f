//! Command-line interface parsing for the cache service
//!
//! This module handles parsing of CLI arguments using clap. Every option can also be
//! supplied through an environment variable, and the parsed arguments are validated
//! into a [`StartupConfig`] before the server starts.

use clap::Parser;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::cache::FileStore;
use crate::data::catalog::{DEFAULT_API_BASE, DEFAULT_TIMEOUT_MS};

/// Error types for CLI argument validation
#[derive(Debug, Error)]
pub enum CliError {
    /// The catalog base URL is not an absolute http(s) URL
    #[error("Invalid API base URL: '{0}'. Expected an http:// or https:// URL")]
    InvalidApiBase(String),

    /// A zero timeout would fail every remote request
    #[error("Invalid timeout: must be greater than 0 ms")]
    InvalidTimeout,
}

/// Pokécache - serve PokéAPI records from a local cache
#[derive(Parser, Debug)]
#[command(name = "pokecache")]
#[command(about = "HTTP service that caches PokéAPI records and serves filtered queries")]
#[command(version)]
pub struct Cli {
    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// Address to bind
    #[arg(long, env = "POKECACHE_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Snapshot file (defaults to cache.json in the user cache directory)
    #[arg(long, env = "POKECACHE_CACHE_FILE", value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Base URL of the remote catalog API
    #[arg(long, env = "POKECACHE_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Timeout for each remote request, in milliseconds
    #[arg(long, env = "POKECACHE_TIMEOUT_MS", default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub log_json: bool,
}

/// Configuration derived from CLI arguments for application startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupConfig {
    /// Address the HTTP server binds to
    pub listen_addr: SocketAddr,
    /// Where the cache snapshot lives
    pub cache_file: PathBuf,
    /// Remote catalog base URL, without a trailing slash
    pub api_base: String,
    /// Timeout for a single remote request
    pub timeout: Duration,
    /// Whether logs are formatted as JSON
    pub log_json: bool,
}

impl StartupConfig {
    /// Creates a StartupConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(StartupConfig)` with defaults filled in
    /// * `Err(CliError)` if the API base or timeout is invalid
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let api_base = cli.api_base.trim().trim_end_matches('/').to_string();
        let valid_scheme = api_base.starts_with("http://") || api_base.starts_with("https://");
        if !valid_scheme || reqwest::Url::parse(&api_base).is_err() {
            return Err(CliError::InvalidApiBase(cli.api_base.clone()));
        }

        if cli.timeout_ms == 0 {
            return Err(CliError::InvalidTimeout);
        }

        Ok(StartupConfig {
            listen_addr: SocketAddr::new(cli.host, cli.port),
            cache_file: cli.cache_file.clone().unwrap_or_else(FileStore::default_path),
            api_base,
            timeout: Duration::from_millis(cli.timeout_ms),
            log_json: cli.log_json,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_explicit_values() {
        let cli = Cli::parse_from([
            "pokecache",
            "--port",
            "8080",
            "--host",
            "127.0.0.1",
            "--cache-file",
            "/tmp/pokemon.json",
            "--api-base",
            "http://localhost:9000/api/v2/",
            "--timeout-ms",
            "2500",
            "--log-json",
        ]);
        let config = StartupConfig::from_cli(&cli).unwrap();

        assert_eq!(config.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(config.cache_file, PathBuf::from("/tmp/pokemon.json"));
        assert_eq!(config.api_base, "http://localhost:9000/api/v2");
        assert_eq!(config.timeout, Duration::from_millis(2500));
        assert!(config.log_json);
    }

    #[test]
    fn test_startup_config_rejects_non_http_api_base() {
        let cli = Cli::parse_from(["pokecache", "--api-base", "ftp://pokeapi.co"]);
        let err = StartupConfig::from_cli(&cli).unwrap_err();
        assert!(err.to_string().contains("ftp://pokeapi.co"));
    }

    #[test]
    fn test_startup_config_rejects_zero_timeout() {
        let cli = Cli::parse_from(["pokecache", "--timeout-ms", "0"]);
        assert!(matches!(
            StartupConfig::from_cli(&cli),
            Err(CliError::InvalidTimeout)
        ));
    }

    #[test]
    fn test_cli_rejects_invalid_port() {
        assert!(Cli::try_parse_from(["pokecache", "--port", "not-a-port"]).is_err());
    }
}
