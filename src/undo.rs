//! Undo functionality for reverting a sort.
//!
//! [`UndoManager::undo`] takes ownership of an [`UndoLog`], moves every file
//! back to where it was, then removes the category folders the undo emptied.
//! Entries that could not be restored come back in [`UndoReport::remaining`]
//! so a later undo can retry just those.
//!
//! A folder counts as touched when any record points into it, including
//! records whose sorted file has since disappeared. So a category folder the
//! user emptied by hand is still cleaned up.
use crate::file_organizer::move_file;
use crate::history::{MoveRecord, UndoLog};
use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// A file that could not be moved back.
#[derive(Debug, Error)]
#[error(
    "Failed to restore {} to {}: {source}",
    .record.destination_path.display(),
    .record.original_path.display()
)]
pub struct RestoreFailure {
    pub record: MoveRecord,
    #[source]
    pub source: io::Error,
}

/// A category folder that could not be removed after the undo.
#[derive(Debug, Error)]
#[error("Failed to remove directory {}: {source}", .path.display())]
pub struct DirectoryRemovalFailure {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Represents the result of an undo operation.
#[derive(Debug)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Records whose sorted file no longer exists; nothing left to restore.
    pub missing_files: Vec<MoveRecord>,
    pub failed_restores: Vec<RestoreFailure>,
    /// Emptied category folders that were removed.
    pub removed_directories: Vec<PathBuf>,
    pub failed_removals: Vec<DirectoryRemovalFailure>,
    /// The records of `failed_restores`, in their original order.
    pub remaining: UndoLog,
}

impl UndoReport {
    /// Returns the total number of records processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.missing_files.len() + self.failed_restores.len()
    }

    pub fn directories_removed(&self) -> usize {
        self.removed_directories.len()
    }

    /// Returns true if every file came back and every emptied folder went away.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty()
            && self.missing_files.is_empty()
            && self.failed_removals.is_empty()
    }
}

/// Result of [`UndoManager::undo`].
#[derive(Debug)]
pub enum UndoOutcome {
    Completed(UndoReport),
    /// The log had no records.
    NothingToUndo,
}

enum Restore {
    Restored,
    Missing,
}

/// Reverses sorts recorded in an [`UndoLog`].
pub struct UndoManager;

impl UndoManager {
    /// Undoes every move in `log`.
    ///
    /// # Examples
    ///
    /// ```
    /// use filesorter::file_organizer::{SortOutcome, Sorter};
    /// use filesorter::undo::{UndoManager, UndoOutcome};
    /// use std::fs;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// fs::write(dir.path().join("song.mp3"), "la").unwrap();
    ///
    /// let SortOutcome::Sorted(report) = Sorter::default().sort(dir.path()).unwrap() else {
    ///     unreachable!()
    /// };
    /// let UndoOutcome::Completed(undo) = UndoManager::undo(report.log) else {
    ///     unreachable!()
    /// };
    ///
    /// assert_eq!(undo.restored_files, 1);
    /// assert_eq!(undo.directories_removed(), 1);
    /// assert!(undo.remaining.is_empty());
    /// assert!(dir.path().join("song.mp3").exists());
    /// ```
    pub fn undo(log: UndoLog) -> UndoOutcome {
        Self::undo_with_progress(log, |_, _| {})
    }

    /// Like [`UndoManager::undo`], calling `progress(processed, total)` after
    /// each record.
    ///
    /// Records are processed newest first. A file is never restored over
    /// something that now occupies its original path.
    pub fn undo_with_progress<F>(log: UndoLog, mut progress: F) -> UndoOutcome
    where
        F: FnMut(usize, usize),
    {
        if log.is_empty() {
            return UndoOutcome::NothingToUndo;
        }

        let total = log.len();
        let mut remaining = log.empty_like();
        info!(
            "Undoing {} moves in {}",
            total,
            remaining.base_path.display()
        );

        let mut restored_files = 0;
        let mut missing_files = Vec::new();
        let mut failed_restores = Vec::new();
        let mut touched_dirs = BTreeSet::new();

        for (index, record) in log.into_records().into_iter().rev().enumerate() {
            match Self::restore_file(&record) {
                Ok(Restore::Restored) => {
                    debug!(
                        "Restored {} -> {}",
                        record.destination_path.display(),
                        record.original_path.display()
                    );
                    restored_files += 1;
                    touched_dirs.extend(record.destination_path.parent().map(Path::to_path_buf));
                }
                Ok(Restore::Missing) => {
                    warn!(
                        "Sorted file no longer exists: {}",
                        record.destination_path.display()
                    );
                    touched_dirs.extend(record.destination_path.parent().map(Path::to_path_buf));
                    missing_files.push(record);
                }
                Err(source) => {
                    warn!(
                        "Failed to restore {}: {}",
                        record.destination_path.display(),
                        source
                    );
                    touched_dirs.extend(record.destination_path.parent().map(Path::to_path_buf));
                    failed_restores.push(RestoreFailure { record, source });
                }
            }
            progress(index + 1, total);
        }

        for failure in failed_restores.iter().rev() {
            remaining.push(failure.record.clone());
        }

        let mut removed_directories = Vec::new();
        let mut failed_removals = Vec::new();
        for dir in touched_dirs {
            match remove_if_empty(&dir) {
                Ok(true) => {
                    debug!("Removed empty folder {}", dir.display());
                    removed_directories.push(dir);
                }
                Ok(false) => {}
                Err(source) => {
                    warn!("Failed to remove folder {}: {}", dir.display(), source);
                    failed_removals.push(DirectoryRemovalFailure { path: dir, source });
                }
            }
        }

        info!(
            "Undo finished: {} restored, {} missing, {} failed, {} folders removed",
            restored_files,
            missing_files.len(),
            failed_restores.len(),
            removed_directories.len()
        );

        UndoOutcome::Completed(UndoReport {
            restored_files,
            missing_files,
            failed_restores,
            removed_directories,
            failed_removals,
            remaining,
        })
    }

    /// Restores a single file to its original location.
    fn restore_file(record: &MoveRecord) -> io::Result<Restore> {
        if record.destination_path.symlink_metadata().is_err() {
            return Ok(Restore::Missing);
        }

        if record.original_path.symlink_metadata().is_ok() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!(
                    "original location {} is occupied",
                    record.original_path.display()
                ),
            ));
        }

        move_file(&record.destination_path, &record.original_path)?;
        Ok(Restore::Restored)
    }
}

/// Removes `dir` if it exists and is empty. Returns whether it was removed.
fn remove_if_empty(dir: &Path) -> io::Result<bool> {
    if !dir.is_dir() {
        return Ok(false);
    }
    if fs::read_dir(dir)?.next().is_some() {
        return Ok(false);
    }
    fs::remove_dir(dir)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_organizer::{SortOutcome, Sorter};
    use tempfile::TempDir;

    fn sort_dir(base: &Path) -> UndoLog {
        match Sorter::default().sort(base).expect("Sort failed") {
            SortOutcome::Sorted(report) => report.log,
            SortOutcome::EmptyDirectory => panic!("Expected files to sort"),
        }
    }

    fn completed(outcome: UndoOutcome) -> UndoReport {
        match outcome {
            UndoOutcome::Completed(report) => report,
            UndoOutcome::NothingToUndo => panic!("Expected an undo report"),
        }
    }

    #[test]
    fn test_undo_empty_log() {
        let log = UndoLog::new(PathBuf::from("/tmp"));
        assert!(matches!(UndoManager::undo(log), UndoOutcome::NothingToUndo));
    }

    #[test]
    fn test_undo_single_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("test.txt"), "test content").expect("Failed to write test file");

        let log = sort_dir(base);
        assert!(base.join("Documents").join("test.txt").exists());

        let report = completed(UndoManager::undo(log));

        assert_eq!(report.restored_files, 1);
        assert!(report.is_complete_success());
        assert!(report.remaining.is_empty());
        assert_eq!(report.removed_directories, vec![base.join("Documents")]);
        assert_eq!(
            fs::read_to_string(base.join("test.txt")).expect("read"),
            "test content"
        );
        assert!(!base.join("Documents").exists());
    }

    #[test]
    fn test_undo_keeps_non_empty_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.pdf"), "a").expect("Failed to write file");

        let log = sort_dir(base);
        fs::write(base.join("Documents").join("user_added.pdf"), "u")
            .expect("Failed to write file");

        let report = completed(UndoManager::undo(log));

        assert_eq!(report.restored_files, 1);
        assert_eq!(report.directories_removed(), 0);
        assert!(base.join("Documents").join("user_added.pdf").exists());
    }

    #[test]
    fn test_undo_leaves_untouched_empty_folders() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::create_dir(base.join("Videos")).expect("Failed to create dir");
        fs::write(base.join("a.pdf"), "a").expect("Failed to write file");

        let log = sort_dir(base);
        completed(UndoManager::undo(log));

        assert!(base.join("Videos").is_dir());
    }

    #[test]
    fn test_undo_with_missing_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.pdf"), "a").expect("Failed to write file");
        fs::write(base.join("b.pdf"), "b").expect("Failed to write file");

        let log = sort_dir(base);
        fs::remove_file(base.join("Documents").join("a.pdf")).expect("Failed to remove");

        let report = completed(UndoManager::undo(log));

        assert_eq!(report.restored_files, 1);
        assert_eq!(report.missing_files.len(), 1);
        assert!(report.remaining.is_empty());
        assert!(!report.is_complete_success());
        assert!(base.join("b.pdf").exists());
        assert!(!base.join("Documents").exists());
    }

    #[test]
    fn test_undo_removes_folder_emptied_by_user() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.mp3"), "a").expect("Failed to write file");

        let log = sort_dir(base);
        fs::remove_file(base.join("Audio").join("a.mp3")).expect("Failed to remove");

        let report = completed(UndoManager::undo(log));

        assert_eq!(report.restored_files, 0);
        assert_eq!(report.missing_files.len(), 1);
        assert_eq!(report.removed_directories, vec![base.join("Audio")]);
    }

    #[test]
    fn test_undo_never_overwrites_original_location() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.pdf"), "sorted").expect("Failed to write file");
        fs::write(base.join("b.jpg"), "b").expect("Failed to write file");

        let log = sort_dir(base);
        fs::write(base.join("a.pdf"), "newcomer").expect("Failed to write file");

        let report = completed(UndoManager::undo(log));

        assert_eq!(report.restored_files, 1);
        assert_eq!(report.failed_restores.len(), 1);
        assert_eq!(
            fs::read_to_string(base.join("a.pdf")).expect("read"),
            "newcomer"
        );
        assert!(base.join("Documents").join("a.pdf").exists());
        assert!(!base.join("Images").exists());

        // Only the failed entry is left for a retry.
        assert_eq!(report.remaining.len(), 1);
        assert_eq!(
            report.remaining.records()[0].original_path,
            base.join("a.pdf")
        );

        fs::remove_file(base.join("a.pdf")).expect("Failed to remove");
        let retry = completed(UndoManager::undo(report.remaining));
        assert_eq!(retry.restored_files, 1);
        assert!(retry.is_complete_success());
        assert_eq!(
            fs::read_to_string(base.join("a.pdf")).expect("read"),
            "sorted"
        );
        assert!(!base.join("Documents").exists());
    }

    #[test]
    fn test_undo_progress() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        fs::write(base.join("a.pdf"), "a").expect("Failed to write file");
        fs::write(base.join("b.jpg"), "b").expect("Failed to write file");

        let log = sort_dir(base);
        let mut calls = Vec::new();
        UndoManager::undo_with_progress(log, |done, total| calls.push((done, total)));

        assert_eq!(calls, vec![(1, 2), (2, 2)]);
    }
}
