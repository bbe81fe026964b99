//! The undo log and its on-disk form.
//!
//! Every successful move during a sort produces one [`MoveRecord`]; the
//! ordered records of one sort make up an [`UndoLog`]. The log is a plain
//! value handed back to the caller. The CLI persists it as JSON next to the
//! sorted files so an undo can happen in a later process.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the persisted undo log inside a sorted directory.
pub const HISTORY_FILE_NAME: &str = ".filesorter_history.json";

/// Errors reading or writing the persisted undo log.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to read history file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write history file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid history file format in {}: {source}", .path.display())]
    InvalidFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// One completed move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Where the file was before the sort.
    pub original_path: PathBuf,
    /// Where the sort put it.
    pub destination_path: PathBuf,
    /// Category folder the file was moved into.
    pub category: String,
}

/// Ordered record of the moves made by one sort.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UndoLog {
    /// When the sort ran.
    pub created_at: DateTime<Utc>,
    /// The directory that was sorted.
    pub base_path: PathBuf,
    records: Vec<MoveRecord>,
}

impl UndoLog {
    /// Creates an empty log for a directory.
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            created_at: Utc::now(),
            base_path,
            records: Vec::new(),
        }
    }

    /// An empty log for the same directory and timestamp.
    pub(crate) fn empty_like(&self) -> Self {
        Self {
            created_at: self.created_at,
            base_path: self.base_path.clone(),
            records: Vec::new(),
        }
    }

    pub fn push(&mut self, record: MoveRecord) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[MoveRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub(crate) fn into_records(self) -> Vec<MoveRecord> {
        self.records
    }

    /// Path of the history file for a directory.
    pub fn history_file_path(base_path: &Path) -> PathBuf {
        base_path.join(HISTORY_FILE_NAME)
    }

    /// Writes this log to `<base_path>/.filesorter_history.json`, replacing
    /// any earlier one.
    pub fn save(&self, base_path: &Path) -> Result<(), HistoryError> {
        let path = Self::history_file_path(base_path);
        let json = serde_json::to_string_pretty(self).map_err(|source| {
            HistoryError::InvalidFormat {
                path: path.clone(),
                source,
            }
        })?;

        fs::write(&path, json).map_err(|source| HistoryError::Write { path, source })
    }

    /// Loads the persisted log for a directory, if there is one.
    pub fn load(base_path: &Path) -> Result<Option<Self>, HistoryError> {
        let path = Self::history_file_path(base_path);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(|source| HistoryError::Read {
            path: path.clone(),
            source,
        })?;

        serde_json::from_str(&json)
            .map(Some)
            .map_err(|source| HistoryError::InvalidFormat { path, source })
    }

    /// Deletes the persisted log for a directory. Missing files are fine.
    pub fn delete(base_path: &Path) -> Result<(), HistoryError> {
        let path = Self::history_file_path(base_path);
        if path.exists() {
            fs::remove_file(&path).map_err(|source| HistoryError::Write { path, source })?;
        }
        Ok(())
    }
}
