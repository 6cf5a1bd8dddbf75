//! Output module for reporting on the scraped dataset
//!
//! This module handles:
//! - Summarizing rows, identifiers and per-field coverage
//! - Showing the latest recorded run

pub mod stats;

pub use stats::{load_statistics, print_statistics, DatasetStatistics};
