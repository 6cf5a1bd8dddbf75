//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the SQLite dataset.

use crate::record::FIELD_NAMES;

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Track scrape runs
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    started_at TEXT NOT NULL,
    finished_at TEXT,
    config_hash TEXT NOT NULL,
    status TEXT NOT NULL
);

-- One row per scraped film, in scrape order
CREATE TABLE IF NOT EXISTS movies (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    "id" TEXT NOT NULL,
    "title_ru" TEXT,
    "title_orig" TEXT,
    "duration" TEXT,
    "slogan" TEXT,
    "year" TEXT,
    "country" TEXT,
    "director" TEXT,
    "cast" TEXT,
    "script" TEXT,
    "producer" TEXT,
    "operator" TEXT,
    "composer" TEXT,
    "artist" TEXT,
    "montage" TEXT,
    "genre" TEXT,
    "budget" TEXT,
    "cash_USA" TEXT,
    "cash_total" TEXT,
    "cash_russia" TEXT,
    "kinopoisk_score" TEXT,
    "imdb_score" TEXT,
    "critics_score" TEXT,
    "synopsis" TEXT,
    scraped_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_movies_id ON movies("id");
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

/// Quoted, comma-separated record columns in [`FIELD_NAMES`] order
pub fn record_columns() -> String {
    FIELD_NAMES
        .iter()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Statement inserting one record plus its `scraped_at` timestamp
pub fn insert_record_sql() -> String {
    let placeholders = (1..=FIELD_NAMES.len() + 1)
        .map(|i| format!("?{}", i))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "INSERT INTO movies ({}, scraped_at) VALUES ({})",
        record_columns(),
        placeholders
    )
}

/// Statement selecting all records in scrape order
pub fn select_records_sql() -> String {
    format!("SELECT {} FROM movies ORDER BY seq", record_columns())
}
