//! Crawler module for resumable film harvesting
//!
//! This module contains the core crawling logic, including:
//! - The target queue and resume logic
//! - The retry state machine that drives circuits, extraction and storage

mod controller;
pub mod queue;

pub use controller::{run_crawl, Controller, CrawlStats};
pub use queue::{build_queue, load_targets, Dataset, TargetQueue};

use crate::config::Config;
use crate::ReelError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Load the candidate film ids
/// 2. Open the dataset and drop rows that need a refetch
/// 3. Fetch every remaining film, rotating circuits on failure
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `config_hash` - Hash of the configuration file, recorded with the run
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Every film is in the dataset (or was skipped)
/// * `Err(ReelError)` - The crawl could not continue
pub async fn crawl(config: Config, config_hash: &str) -> Result<CrawlStats, ReelError> {
    run_crawl(config, config_hash).await
}
