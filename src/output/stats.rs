//! Statistics over a persisted dataset
//!
//! This module provides functionality for summarizing what has been scraped
//! so far and printing it for `--stats`.

use crate::record::{MovieRecord, FIELD_NAMES};
use crate::storage::{RunRecord, Storage};
use crate::ReelError;
use std::collections::HashSet;

/// Dataset statistics summary
#[derive(Debug, Clone)]
pub struct DatasetStatistics {
    /// Rows in the dataset, before any cleaning
    pub total_rows: u64,

    /// Distinct identifiers
    pub unique_ids: u64,

    /// Rows with a title
    pub titled_rows: u64,

    /// Non-null count per field, in column order (identifier excluded)
    pub field_coverage: Vec<(&'static str, u64)>,

    /// Most recent run, for backends that track runs
    pub latest_run: Option<RunRecord>,
}

impl DatasetStatistics {
    /// Computes statistics for a set of rows
    pub fn from_records(records: &[MovieRecord], latest_run: Option<RunRecord>) -> Self {
        let unique_ids = records
            .iter()
            .map(|r| r.id.as_str())
            .collect::<HashSet<_>>()
            .len() as u64;

        let field_coverage = FIELD_NAMES[1..]
            .iter()
            .enumerate()
            .map(|(index, name)| {
                let filled = records
                    .iter()
                    .filter(|r| r.values()[index].is_some())
                    .count() as u64;
                (*name, filled)
            })
            .collect();

        Self {
            total_rows: records.len() as u64,
            unique_ids,
            titled_rows: records.iter().filter(|r| r.is_titled()).count() as u64,
            field_coverage,
            latest_run,
        }
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The dataset to summarize
///
/// # Returns
///
/// * `Ok(DatasetStatistics)` - Successfully loaded statistics
/// * `Err(ReelError)` - Failed to read the dataset
pub fn load_statistics(storage: &dyn Storage) -> Result<DatasetStatistics, ReelError> {
    let records = storage.load_records()?;
    let latest_run = storage.latest_run()?;
    Ok(DatasetStatistics::from_records(&records, latest_run))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &DatasetStatistics) {
    println!("=== Dataset Statistics ===\n");

    println!("Overview:");
    println!("  Rows: {}", stats.total_rows);
    println!("  Unique ids: {}", stats.unique_ids);
    println!("  Titled rows: {}", stats.titled_rows);
    println!();

    println!("Field Coverage:");
    for (name, filled) in &stats.field_coverage {
        let percentage = if stats.total_rows > 0 {
            (*filled as f64 / stats.total_rows as f64) * 100.0
        } else {
            0.0
        };
        println!("  {:<16} {:>8} ({:.1}%)", name, filled, percentage);
    }
    println!();

    if let Some(run) = &stats.latest_run {
        println!("Latest Run:");
        println!("  ID: {}", run.id);
        println!("  Started: {}", run.started_at);
        println!(
            "  Finished: {}",
            run.finished_at.as_deref().unwrap_or("(not finished)")
        );
        println!("  Status: {}", run.status.to_db_string());
        println!("  Config hash: {}", run.config_hash);
    }
}
