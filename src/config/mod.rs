//! Configuration module for Reelmine
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use reelmine::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("reelmine.toml")).unwrap();
//! println!("Fetching pages from: {}", config.target.url_template);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DatasetFormat, NetworkConfig, OutputConfig, RetryConfig, TargetConfig,
    DEFAULT_BROWSER_HEADERS, DEFAULT_REQUEST_TIMEOUT_MS,
};
pub use validation::ID_PLACEHOLDER;

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
