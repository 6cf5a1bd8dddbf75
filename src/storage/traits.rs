//! Storage traits and error types
//!
//! This module defines the trait interface for dataset backends and
//! associated error types.

use crate::record::MovieRecord;
use crate::storage::{RunRecord, RunStatus};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Schema error: {0}")]
    Schema(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for dataset backends
///
/// Rows are kept in insertion order. `append_record` is write-through: when
/// it returns `Ok`, the row survives a crash of the process.
pub trait Storage: Send {
    // ===== Records =====

    /// Loads every stored row, in stored order, without any cleaning
    fn load_records(&self) -> StorageResult<Vec<MovieRecord>>;

    /// Appends one row and makes it durable before returning
    fn append_record(&mut self, record: &MovieRecord) -> StorageResult<()>;

    /// Replaces all stored rows with `records`
    fn rewrite(&mut self, records: &[MovieRecord]) -> StorageResult<()>;

    /// Counts stored rows
    fn count_records(&self) -> StorageResult<u64>;

    // ===== Run Management =====
    //
    // Backends without run bookkeeping keep the defaults.

    /// Records the start of a run, returning its ID if runs are tracked
    fn begin_run(&mut self, _config_hash: &str) -> StorageResult<Option<i64>> {
        Ok(None)
    }

    /// Records the end of a run
    fn finish_run(&mut self, _run_id: i64, _status: RunStatus) -> StorageResult<()> {
        Ok(())
    }

    /// Gets the most recent run
    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        Ok(None)
    }
}
