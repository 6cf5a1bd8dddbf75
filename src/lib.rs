//! Reelmine: a resumable film-page harvester
//!
//! This crate fetches film pages through an anonymizing SOCKS proxy (Tor),
//! extracts a flat movie record from each page, and appends every record to a
//! dataset as soon as it is parsed. Blocked or timed-out requests are retried
//! for the same film under a fresh circuit, so a run can be stopped at any
//! point and resumed later without losing progress.

pub mod circuit;
pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod record;
pub mod storage;

use thiserror::Error;

/// Main error type for Reelmine operations
#[derive(Debug, Error)]
pub enum ReelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Circuit error: {0}")]
    Circuit(#[from] circuit::CircuitError),

    #[error("Failed to load targets from {path}: {message}")]
    Targets { path: String, message: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Reelmine operations
pub type Result<T> = std::result::Result<T, ReelError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{Controller, CrawlStats};
pub use record::MovieRecord;
