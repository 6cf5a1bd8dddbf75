//! CSV storage implementation
//!
//! The dataset is a single CSV file with a header row in [`FIELD_NAMES`]
//! order. Appends go straight to the end of the file and are flushed and
//! synced before returning; full rewrites go through a temporary file and a
//! rename so a crash never leaves a half-written dataset behind.
//!
//! An empty cell reads back as `None`, so `Some("")` does not survive a
//! round trip through this backend.

use crate::record::{MovieRecord, FIELD_NAMES};
use crate::storage::traits::{Storage, StorageError, StorageResult};
use csv::{ReaderBuilder, WriterBuilder};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

/// CSV dataset backend
pub struct CsvStorage {
    path: PathBuf,
}

impl CsvStorage {
    /// Opens the dataset at `path`, creating it (with a header) if needed
    ///
    /// An existing file whose header is not in [`FIELD_NAMES`] order is
    /// rewritten in that order, since appends always use it. A header
    /// without an `id` column, or with unknown columns, is rejected.
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut storage = Self {
            path: path.to_path_buf(),
        };

        let is_empty = match fs::metadata(path) {
            Ok(meta) => meta.len() == 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => return Err(e.into()),
        };
        if is_empty {
            tracing::debug!("Creating dataset {}", path.display());
            storage.rewrite(&[])?;
        } else {
            storage.normalize_columns()?;
        }

        Ok(storage)
    }

    /// Brings an existing file's columns into [`FIELD_NAMES`] order
    fn normalize_columns(&mut self) -> StorageResult<()> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;
        let headers = reader.headers()?.clone();
        drop(reader);

        if headers.iter().eq(FIELD_NAMES.iter().copied()) {
            return Ok(());
        }
        if !headers.iter().any(|name| name == "id") {
            return Err(StorageError::Schema(format!(
                "{} has no id column",
                self.path.display()
            )));
        }
        if let Some(unknown) = headers.iter().find(|name| !FIELD_NAMES.contains(name)) {
            return Err(StorageError::Schema(format!(
                "{} has unknown column '{}'",
                self.path.display(),
                unknown
            )));
        }

        let records = self.load_records()?;
        tracing::info!(
            "Rewriting {} ({} rows) in canonical column order",
            self.path.display(),
            records.len()
        );
        self.rewrite(&records)
    }

    /// Path of the dataset file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl Storage for CsvStorage {
    fn load_records(&self) -> StorageResult<Vec<MovieRecord>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)?;

        let mut records = Vec::new();
        for row in reader.deserialize::<MovieRecord>() {
            records.push(row?);
        }
        Ok(records)
    }

    fn append_record(&mut self, record: &MovieRecord) -> StorageResult<()> {
        let file = OpenOptions::new().append(true).open(&self.path)?;
        let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
        writer.serialize(record)?;
        writer.flush()?;
        writer.get_ref().sync_data()?;
        Ok(())
    }

    fn rewrite(&mut self, records: &[MovieRecord]) -> StorageResult<()> {
        let temp_path = self.temp_path();
        {
            let file = File::create(&temp_path)?;
            let mut writer = WriterBuilder::new().has_headers(false).from_writer(file);
            writer.write_record(FIELD_NAMES)?;
            for record in records {
                writer.serialize(record)?;
            }
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&temp_path, &self.path)?;
        Ok(())
    }

    fn count_records(&self) -> StorageResult<u64> {
        Ok(self.load_records()?.len() as u64)
    }
}
