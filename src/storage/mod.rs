//! Storage module for persisting the scraped dataset
//!
//! This module handles all dataset I/O, including:
//! - CSV and SQLite dataset backends behind one `Storage` trait
//! - Write-through appends, so a crash loses at most the film in flight
//! - Run tracking for backends that support it

mod csv_store;
mod schema;
mod sqlite;
mod traits;

pub use csv_store::CsvStorage;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::{DatasetFormat, OutputConfig};
use std::path::Path;

/// Opens the dataset described by the output configuration
///
/// # Arguments
///
/// * `config` - The output configuration (path and format)
///
/// # Returns
///
/// * `Ok(Box<dyn Storage>)` - The opened (or newly created) dataset
/// * `Err(StorageError)` - Failed to open the dataset
pub fn open_storage(config: &OutputConfig) -> StorageResult<Box<dyn Storage>> {
    let path = Path::new(&config.dataset_path);
    let storage: Box<dyn Storage> = match config.format {
        DatasetFormat::Csv => Box::new(CsvStorage::new(path)?),
        DatasetFormat::Sqlite => Box::new(SqliteStorage::new(path)?),
    };
    Ok(storage)
}

/// Opens the dataset only if its file already exists
///
/// Read-only reporting uses this so that looking at a missing dataset does
/// not create an empty one.
pub fn open_existing_storage(config: &OutputConfig) -> StorageResult<Option<Box<dyn Storage>>> {
    if !Path::new(&config.dataset_path).exists() {
        return Ok(None);
    }
    open_storage(config).map(Some)
}

/// Represents a scrape run
#[derive(Debug, Clone)]
pub struct RunRecord {
    pub id: i64,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub config_hash: String,
    pub status: RunStatus,
}

/// Status of a scrape run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Running,
    Completed,
    Interrupted,
    Failed,
}

impl RunStatus {
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Interrupted => "interrupted",
            Self::Failed => "failed",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "running" => Some(Self::Running),
            "completed" => Some(Self::Completed),
            "interrupted" => Some(Self::Interrupted),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}
