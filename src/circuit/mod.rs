//! Circuit session management
//!
//! A circuit is one outbound network identity. The crawl controller acquires
//! a circuit, fetches pages through it until something goes wrong, and then
//! drops it and acquires a fresh one. Dropping a circuit releases it; a
//! circuit is never reused after a failure.
//!
//! This module only moves bytes. Deciding whether a page is a ban is the
//! controller's job.

mod tor;

pub use tor::{build_header_map, build_http_client, isolation_credentials, HttpCircuit, TorCircuitManager};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that make a circuit impossible to set up
///
/// These come from configuration (bad proxy URL, bad header) and are fatal
/// to the run.
#[derive(Debug, Error)]
pub enum CircuitError {
    #[error("Invalid proxy '{proxy}': {message}")]
    Proxy { proxy: String, message: String },

    #[error("Invalid header '{name}'")]
    Header { name: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Transient fetch failures
///
/// Any of these means "this circuit is unusable", never "this film cannot be
/// scraped".
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Request failed for {url}: {message}")]
    Other { url: String, message: String },
}

/// One acquired network identity
#[async_trait]
pub trait Circuit: Send + Sync {
    /// Sequence number of this circuit within its provider
    fn id(&self) -> u64;

    /// Fetches the page for `target` and returns its body
    ///
    /// The body is returned for any HTTP status: block pages often come with
    /// an error status and are recognized by their content.
    async fn fetch(&self, target: &str) -> Result<String, FetchError>;
}

/// Source of fresh circuits
#[async_trait]
pub trait CircuitProvider: Send {
    /// Establishes a new circuit, distinct from every previous one
    async fn acquire(&mut self) -> Result<Box<dyn Circuit>, CircuitError>;
}
