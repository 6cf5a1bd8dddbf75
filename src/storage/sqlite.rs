//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.
//! Unlike the CSV backend it keeps `NULL` and empty strings apart and records
//! every run in a `runs` table.

use crate::record::MovieRecord;
use crate::storage::schema::{initialize_schema, insert_record_sql, select_records_sql};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{RunRecord, RunStatus};
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Opens or creates the database at `path`
    ///
    /// Uses `synchronous = FULL` so every committed row is on disk before
    /// the append returns.
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = FULL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Gets a run by ID
    pub fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        self.conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs WHERE id = ?1",
                params![run_id],
                map_run,
            )
            .optional()?
            .ok_or(StorageError::RunNotFound(run_id))
    }

    fn insert(conn: &Connection, record: &MovieRecord, scraped_at: &str) -> StorageResult<()> {
        let mut values: Vec<Option<&str>> = Vec::with_capacity(25);
        values.push(Some(record.id.as_str()));
        values.extend(record.values());
        values.push(Some(scraped_at));

        conn.execute(&insert_record_sql(), params_from_iter(values))?;
        Ok(())
    }
}

fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<RunRecord> {
    Ok(RunRecord {
        id: row.get(0)?,
        started_at: row.get(1)?,
        finished_at: row.get(2)?,
        config_hash: row.get(3)?,
        status: RunStatus::from_db_string(&row.get::<_, String>(4)?)
            .unwrap_or(RunStatus::Failed),
    })
}

impl Storage for SqliteStorage {
    // ===== Records =====

    fn load_records(&self) -> StorageResult<Vec<MovieRecord>> {
        let mut stmt = self.conn.prepare(&select_records_sql())?;
        let rows = stmt.query_map([], |row| {
            let id: String = row.get(0)?;
            let mut values: [Option<String>; 23] = Default::default();
            for (i, value) in values.iter_mut().enumerate() {
                *value = row.get(i + 1)?;
            }
            Ok(MovieRecord::from_values(id, values))
        })?;

        let mut records = Vec::new();
        for record in rows {
            records.push(record?);
        }
        Ok(records)
    }

    fn append_record(&mut self, record: &MovieRecord) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        Self::insert(&self.conn, record, &now)
    }

    fn rewrite(&mut self, records: &[MovieRecord]) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM movies", [])?;
        for record in records {
            Self::insert(&tx, record, &now)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    // ===== Run Management =====

    fn begin_run(&mut self, config_hash: &str) -> StorageResult<Option<i64>> {
        // A run still marked as running was cut short
        let stale = self.conn.execute(
            "UPDATE runs SET status = ?1 WHERE status = ?2",
            params![
                RunStatus::Interrupted.to_db_string(),
                RunStatus::Running.to_db_string()
            ],
        )?;
        if stale > 0 {
            tracing::info!("Marked {} unfinished run(s) as interrupted", stale);
        }

        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT INTO runs (started_at, config_hash, status) VALUES (?1, ?2, ?3)",
            params![now, config_hash, RunStatus::Running.to_db_string()],
        )?;
        Ok(Some(self.conn.last_insert_rowid()))
    }

    fn finish_run(&mut self, run_id: i64, status: RunStatus) -> StorageResult<()> {
        let now = Utc::now().to_rfc3339();
        let updated = self.conn.execute(
            "UPDATE runs SET status = ?1, finished_at = ?2 WHERE id = ?3",
            params![status.to_db_string(), now, run_id],
        )?;
        if updated == 0 {
            return Err(StorageError::RunNotFound(run_id));
        }
        Ok(())
    }

    fn latest_run(&self) -> StorageResult<Option<RunRecord>> {
        let run = self
            .conn
            .query_row(
                "SELECT id, started_at, finished_at, config_hash, status FROM runs ORDER BY id DESC LIMIT 1",
                [],
                map_run,
            )
            .optional()?;
        Ok(run)
    }
}
