//! Pokécache library
//!
//! A small HTTP service that proxies the PokéAPI catalog, keeps fetched records in a
//! local cache file and serves filtered queries from that cache. The modules are
//! exposed for the binary and for integration tests.

pub mod cache;
pub mod cli;
pub mod data;
pub mod logging;
pub mod query;
pub mod refresh;
pub mod server;

#[cfg(test)]
mod testing;
