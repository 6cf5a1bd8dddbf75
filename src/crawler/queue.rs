//! Resumable target queue
//!
//! This module handles:
//! - Loading the candidate film identifiers
//! - Cleaning a previously persisted dataset (null titles, duplicate ids)
//! - Working out which films still need a fetch, in candidate order
//! - Holding the crawl position, which only moves on success or skip

use crate::record::MovieRecord;
use crate::ReelError;
use std::collections::HashSet;
use std::path::Path;

/// Loads candidate identifiers from a text file
///
/// One identifier per line; blank lines and `#` comments are ignored and
/// repeated identifiers keep their first position.
pub fn load_targets(path: &Path) -> Result<Vec<String>, ReelError> {
    let content = std::fs::read_to_string(path).map_err(|e| ReelError::Targets {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let targets = parse_targets(&content);
    tracing::info!("Loaded {} target ids from {}", targets.len(), path.display());
    Ok(targets)
}

/// Parses identifier list content (see [`load_targets`])
pub fn parse_targets(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter(|id| seen.insert(*id))
        .map(str::to_string)
        .collect()
}

/// A persisted dataset after cleaning
///
/// Holds only titled rows, at most one per id, in their original order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<MovieRecord>,
}

impl Dataset {
    /// Cleans raw rows loaded from storage
    ///
    /// Rows without a title are left over from bans and are dropped; of
    /// several titled rows with the same id, the first one wins.
    pub fn from_rows(rows: Vec<MovieRecord>) -> Self {
        let mut seen = HashSet::new();
        let records = rows
            .into_iter()
            .filter(MovieRecord::is_titled)
            .filter(|record| seen.insert(record.id.clone()))
            .collect();
        Self { records }
    }

    /// The cleaned rows
    pub fn records(&self) -> &[MovieRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Ids that already have a titled record
    pub fn completed_ids(&self) -> HashSet<&str> {
        self.records.iter().map(|r| r.id.as_str()).collect()
    }
}

/// Candidates that still need a fetch, in candidate order
pub fn build_queue(candidates: &[String], dataset: &Dataset) -> Vec<String> {
    let done = dataset.completed_ids();
    candidates
        .iter()
        .filter(|id| !done.contains(id.as_str()))
        .cloned()
        .collect()
}

/// Ordered targets with a cursor
#[derive(Debug, Clone, Default)]
pub struct TargetQueue {
    targets: Vec<String>,
    position: usize,
}

impl TargetQueue {
    pub fn new(targets: Vec<String>) -> Self {
        Self {
            targets,
            position: 0,
        }
    }

    /// The target being worked on, or `None` once the queue is exhausted
    pub fn current(&self) -> Option<&str> {
        self.targets.get(self.position).map(String::as_str)
    }

    /// Moves past the current target and returns the next one
    pub fn advance(&mut self) -> Option<&str> {
        if self.position < self.targets.len() {
            self.position += 1;
        }
        self.current()
    }

    /// Index of the current target
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total number of targets
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Targets not yet finished, including the current one
    pub fn remaining(&self) -> usize {
        self.targets.len() - self.position
    }

    /// All targets, in order
    pub fn targets(&self) -> &[String] {
        &self.targets
    }
}
