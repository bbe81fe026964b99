//! Sorting the files of one directory into category subdirectories.
//!
//! Sorting runs in two phases. [`Sorter::plan`] lists and classifies every
//! direct file without touching the filesystem, producing a [`SortPlan`].
//! [`Sorter::execute`] then creates the needed category folders and moves the
//! files, recording each completed move in an [`UndoLog`]. A failure on one
//! file is recorded and the batch carries on.
use crate::config::{CompiledFilters, Config, ConfigError};
use crate::conflict::resolve_destination;
use crate::file_category::{Category, CategoryTable};
use crate::history::{HISTORY_FILE_NAME, MoveRecord, UndoLog};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Fatal sort errors. Nothing has been moved when one of these is returned.
#[derive(Debug, Error)]
pub enum SortError {
    /// The path is missing or is not a directory.
    #[error("Invalid directory {}: not an existing directory", .path.display())]
    InvalidDirectory { path: PathBuf },

    #[error("Error reading directory {}: {source}", .path.display())]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// A file that could not be moved. It stays where it was.
#[derive(Debug, Error)]
#[error("Failed to move {} to {}: {source}", .source_path.display(), .destination.display())]
pub struct MoveFailure {
    pub source_path: PathBuf,
    pub destination: PathBuf,
    #[source]
    pub source: io::Error,
}

/// A direct file of the directory being sorted.
#[derive(Debug, Clone)]
pub struct FileEntry {
    pub path: PathBuf,
    pub file_name: String,
    /// Computed once from the name; a conflict rename never changes it.
    pub category: Category,
}

/// Files assigned to one category.
#[derive(Debug, Clone)]
pub struct PlanGroup {
    pub category: Category,
    pub files: Vec<FileEntry>,
}

/// Classification of a directory, computed before any file is moved.
#[derive(Debug, Clone)]
pub struct SortPlan {
    base_path: PathBuf,
    groups: Vec<PlanGroup>,
    already_sorted: Vec<FileEntry>,
    excluded: Vec<PathBuf>,
}

impl SortPlan {
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Non-empty category groups in table order.
    pub fn groups(&self) -> &[PlanGroup] {
        &self.groups
    }

    /// Files whose parent folder is already named after their category.
    pub fn already_sorted(&self) -> &[FileEntry] {
        &self.already_sorted
    }

    /// Files left out by the filter rules.
    pub fn excluded(&self) -> &[PathBuf] {
        &self.excluded
    }

    /// Number of files that would be moved.
    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Per-category file counts, in table order.
    pub fn category_counts(&self) -> Vec<(&Category, usize)> {
        self.groups
            .iter()
            .map(|g| (&g.category, g.files.len()))
            .collect()
    }
}

/// Destination paths produced by a sort, grouped by category in table order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortResult {
    groups: Vec<(Category, Vec<PathBuf>)>,
}

impl SortResult {
    fn push(&mut self, category: &Category, destination: PathBuf) {
        match self.groups.iter_mut().find(|(c, _)| c == category) {
            Some((_, paths)) => paths.push(destination),
            None => self.groups.push((category.clone(), vec![destination])),
        }
    }

    /// Destinations for a category name, if any file was moved there.
    pub fn get(&self, category: &str) -> Option<&[PathBuf]> {
        self.groups
            .iter()
            .find(|(c, _)| c.name() == category)
            .map(|(_, paths)| paths.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &[PathBuf])> {
        self.groups.iter().map(|(c, paths)| (c, paths.as_slice()))
    }

    pub fn total(&self) -> usize {
        self.groups.iter().map(|(_, paths)| paths.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Everything a finished sort produced.
#[derive(Debug)]
pub struct SortReport {
    pub results: SortResult,
    /// One record per completed move, in move order.
    pub log: UndoLog,
    pub failures: Vec<MoveFailure>,
    /// Files left alone because they were already in place.
    pub skipped: usize,
}

impl SortReport {
    pub fn moved(&self) -> usize {
        self.log.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Result of [`Sorter::sort`].
#[derive(Debug)]
pub enum SortOutcome {
    Sorted(SortReport),
    /// There were no files to sort. No directories were created.
    EmptyDirectory,
}

/// Sorts directories using a category table and filter rules.
#[derive(Debug, Clone, Default)]
pub struct Sorter {
    table: CategoryTable,
    filters: CompiledFilters,
}

impl Sorter {
    pub fn new(table: CategoryTable, filters: CompiledFilters) -> Self {
        Self { table, filters }
    }

    /// Builds a sorter from a loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(config.category_table()?, config.compile_filters()?))
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Lists and classifies the direct files of `dir` without changing anything.
    ///
    /// The directory is resolved to its canonical absolute path first, so the
    /// plan and the resulting undo log never hold relative paths.
    ///
    /// Subdirectories, the persisted history file, filtered files and files
    /// whose parent folder already carries their category name are not
    /// scheduled for a move.
    pub fn plan(&self, dir: &Path) -> Result<SortPlan, SortError> {
        if !dir.is_dir() {
            return Err(SortError::InvalidDirectory {
                path: dir.to_path_buf(),
            });
        }

        // Records must stay valid from any working directory, and `.` or
        // `Images/..` have no usable final component.
        let dir = fs::canonicalize(dir).map_err(|source| SortError::ReadDirectory {
            path: dir.to_path_buf(),
            source,
        })?;
        let dir = dir.as_path();

        let entries = fs::read_dir(dir).map_err(|source| SortError::ReadDirectory {
            path: dir.to_path_buf(),
            source,
        })?;

        let dir_name = dir.file_name().and_then(|n| n.to_str());
        let mut by_category: HashMap<Category, Vec<FileEntry>> = HashMap::new();
        let mut already_sorted = Vec::new();
        let mut excluded = Vec::new();

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            if !entry.file_type().is_ok_and(|t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let Some(file_name) = entry.file_name().to_str().map(str::to_string) else {
                warn!("Skipping file with non UTF-8 name: {}", path.display());
                excluded.push(path);
                continue;
            };

            if file_name == HISTORY_FILE_NAME {
                continue;
            }
            if let Some(reason) = self.filters.exclusion(&file_name) {
                debug!("Skipping {} ({})", file_name, reason);
                excluded.push(path);
                continue;
            }

            let category = self.table.categorize(&file_name);
            let file = FileEntry {
                path,
                file_name,
                category,
            };

            if dir_name == Some(file.category.dir_name()) {
                debug!("Already in place: {}", file.path.display());
                already_sorted.push(file);
            } else {
                by_category
                    .entry(file.category.clone())
                    .or_default()
                    .push(file);
            }
        }

        let mut groups: Vec<PlanGroup> = by_category
            .into_iter()
            .map(|(category, mut files)| {
                files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
                PlanGroup { category, files }
            })
            .collect();
        groups.sort_by_key(|g| self.table.rank(&g.category));

        Ok(SortPlan {
            base_path: dir.to_path_buf(),
            groups,
            already_sorted,
            excluded,
        })
    }

    /// Plans and executes a sort of `dir`.
    ///
    /// # Examples
    ///
    /// ```
    /// use filesorter::file_organizer::{SortOutcome, Sorter};
    /// use std::fs;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// fs::write(dir.path().join("a.pdf"), "pdf").unwrap();
    ///
    /// match Sorter::default().sort(dir.path()).unwrap() {
    ///     SortOutcome::Sorted(report) => {
    ///         assert_eq!(report.moved(), 1);
    ///         assert!(dir.path().join("Documents").join("a.pdf").exists());
    ///     }
    ///     SortOutcome::EmptyDirectory => unreachable!(),
    /// }
    /// ```
    pub fn sort(&self, dir: &Path) -> Result<SortOutcome, SortError> {
        self.sort_with_progress(dir, |_, _| {})
    }

    /// Like [`Sorter::sort`], calling `progress(processed, total)` after each
    /// file attempt.
    pub fn sort_with_progress<F>(&self, dir: &Path, progress: F) -> Result<SortOutcome, SortError>
    where
        F: FnMut(usize, usize),
    {
        let plan = self.plan(dir)?;
        if plan.is_empty() && plan.already_sorted.is_empty() {
            info!("No files to sort in {}", dir.display());
            return Ok(SortOutcome::EmptyDirectory);
        }
        Ok(SortOutcome::Sorted(self.execute(plan, progress)))
    }

    /// Moves every file of `plan` into its category folder.
    ///
    /// Category folders are created only for groups that have files. Failed
    /// moves are collected in the report and have no undo record.
    pub fn execute<F>(&self, plan: SortPlan, mut progress: F) -> SortReport
    where
        F: FnMut(usize, usize),
    {
        let total = plan.total_files();
        let skipped = plan.already_sorted.len();
        let base_path = plan.base_path;
        info!("Sorting {} files in {}", total, base_path.display());

        let mut log = UndoLog::new(base_path.clone());
        let mut results = SortResult::default();
        let mut failures = Vec::new();
        let mut processed = 0;

        for group in plan.groups {
            let category_dir = base_path.join(group.category.dir_name());

            if let Err(e) = ensure_category_dir(&category_dir) {
                warn!(
                    "Cannot create category folder {}: {}",
                    category_dir.display(),
                    e
                );
                for file in group.files {
                    failures.push(MoveFailure {
                        source_path: file.path,
                        destination: category_dir.clone(),
                        source: io::Error::new(
                            e.kind(),
                            format!("cannot create category folder: {}", e),
                        ),
                    });
                    processed += 1;
                    progress(processed, total);
                }
                continue;
            }

            for file in group.files {
                let destination = resolve_destination(&category_dir, &file.file_name);
                match move_file(&file.path, &destination) {
                    Ok(()) => {
                        debug!("Moved {} -> {}", file.path.display(), destination.display());
                        results.push(&group.category, destination.clone());
                        log.push(MoveRecord {
                            original_path: file.path,
                            destination_path: destination,
                            category: group.category.name().to_string(),
                        });
                    }
                    Err(source) => {
                        warn!("Failed to move {}: {}", file.path.display(), source);
                        failures.push(MoveFailure {
                            source_path: file.path,
                            destination,
                            source,
                        });
                    }
                }
                processed += 1;
                progress(processed, total);
            }
        }

        info!(
            "Sort finished: {} moved, {} failed, {} already in place",
            log.len(),
            failures.len(),
            skipped
        );

        SortReport {
            results,
            log,
            failures,
            skipped,
        }
    }
}

fn ensure_category_dir(path: &Path) -> io::Result<()> {
    match fs::create_dir(path) {
        Ok(()) => {
            debug!("Created category folder {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

/// Moves a file, falling back to copy and delete across filesystems.
///
/// On fallback failure the copy is removed again, so the file ends up in
/// exactly one of the two places.
pub(crate) fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!("Cross-device move, copying {}", from.display());
            if let Err(e) = fs::copy(from, to) {
                let _ = fs::remove_file(to);
                return Err(e);
            }
            if let Err(e) = fs::remove_file(from) {
                let _ = fs::remove_file(to);
                return Err(e);
            }
            Ok(())
        }
        Err(e) => Err(e),
    }
}
