//! Command-line interface module for filesorter.
//!
//! This module handles all CLI-related functionality including:
//! - Argument parsing
//! - Configuration loading
//! - Driving the sort and undo engines with a progress bar
//! - Persisting the undo log between invocations
//! - Result listings and summaries

use crate::config::Config;
use crate::file_organizer::{SortOutcome, SortPlan, SortReport, Sorter};
use crate::history::UndoLog;
use crate::output::{OutputFormatter, file_word};
use crate::undo::{UndoManager, UndoOutcome, UndoReport};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Number of file names listed per category after a sort.
const LISTING_LIMIT: usize = 5;

#[derive(Parser, Debug)]
#[command(name = "filesorter")]
#[command(author, version, long_about = None)]
#[command(about = "Sort the files of a directory into category folders, with undo")]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Move the files of DIR into category subfolders
    Sort {
        /// Directory whose files should be sorted
        dir: PathBuf,

        /// Show what would be moved without changing anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Configuration file (defaults to .filesorterrc.toml, then ~/.config/filesorter/config.toml)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Undo the last sort of DIR
    Undo {
        /// Directory that was sorted
        dir: PathBuf,
    },
}

impl Cli {
    /// Splits parsed arguments into the command, target directory and config path.
    pub fn invocation(&self) -> (SortCommand, &Path, Option<&Path>) {
        match &self.command {
            Command::Sort {
                dir,
                dry_run,
                config,
            } => (
                SortCommand::Sort { dry_run: *dry_run },
                dir.as_path(),
                config.as_deref(),
            ),
            Command::Undo { dir } => (SortCommand::Undo, dir.as_path(), None),
        }
    }
}

/// Represents a CLI command to execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortCommand {
    /// Sort files in a directory.
    Sort {
        /// If true, only show the plan.
        dry_run: bool,
    },
    /// Undo the previous sort.
    Undo,
}

/// Runs a command against a directory using the default configuration lookup.
///
/// # Examples
///
/// ```no_run
/// use filesorter::cli::{run_cli, SortCommand};
/// use std::path::Path;
///
/// let result = run_cli(SortCommand::Sort { dry_run: true }, Path::new("/path/to/directory"));
/// if let Err(e) = result {
///     eprintln!("Error: {}", e);
/// }
/// ```
pub fn run_cli(command: SortCommand, dir_path: &Path) -> Result<(), String> {
    run_cli_with_config(command, dir_path, None)
}

/// Runs a command with an optional explicit configuration file.
///
/// Fatal problems (bad directory, bad configuration, unreadable history) are
/// returned as errors. Per-file failures are reported and do not fail the call.
pub fn run_cli_with_config(
    command: SortCommand,
    dir_path: &Path,
    config_path: Option<&Path>,
) -> Result<(), String> {
    match command {
        SortCommand::Sort { dry_run } => {
            let sorter = load_sorter(config_path)?;
            if dry_run {
                sort_directory_dry_run(&sorter, dir_path)
            } else {
                sort_directory(&sorter, dir_path)
            }
        }
        SortCommand::Undo => undo_sort(dir_path),
    }
}

fn load_sorter(config_path: Option<&Path>) -> Result<Sorter, String> {
    let config =
        Config::load(config_path).map_err(|e| format!("Error loading configuration: {}", e))?;
    Sorter::from_config(&config).map_err(|e| format!("Error in configuration: {}", e))
}

/// Sorts a directory and saves the undo log next to the sorted files.
fn sort_directory(sorter: &Sorter, base_path: &Path) -> Result<(), String> {
    OutputFormatter::info(&format!("Sorting contents of: {}", base_path.display()));

    let pb = OutputFormatter::create_progress_bar();
    let outcome = sorter
        .sort_with_progress(base_path, |processed, total| {
            OutputFormatter::update_progress(&pb, processed, total)
        })
        .map_err(|e| e.to_string())?;
    pb.finish_and_clear();

    let report = match outcome {
        SortOutcome::Sorted(report) => report,
        SortOutcome::EmptyDirectory => {
            OutputFormatter::warning("No files found in the selected directory.");
            return Ok(());
        }
    };

    print_sort_report(&report);

    // An empty log would overwrite the previous undo slot with nothing.
    if report.log.is_empty() {
        return Ok(());
    }

    match report.log.save(base_path) {
        Ok(()) => {
            info!("Undo log saved for {}", base_path.display());
            OutputFormatter::plain(&format!(
                "History saved. Use 'filesorter undo {}' to revert changes.",
                base_path.display()
            ));
        }
        Err(e) => {
            warn!("{}", e);
            OutputFormatter::warning(&format!("Could not save history: {}", e));
            OutputFormatter::warning("Undo will not be available for this sort.");
        }
    }

    Ok(())
}

fn print_sort_report(report: &SortReport) {
    OutputFormatter::header("Sorting Results");

    for (category, paths) in report.results.iter() {
        let names: Vec<String> = paths
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        OutputFormatter::category_listing(category.name(), &names, LISTING_LIMIT);
    }

    if report.skipped > 0 {
        OutputFormatter::plain(&format!(
            "{} {} already in place",
            report.skipped,
            file_word(report.skipped)
        ));
    }

    if !report.failures.is_empty() {
        OutputFormatter::header("Failures");
        for failure in &report.failures {
            OutputFormatter::error(&failure.to_string());
        }
    }

    let counts: Vec<(String, usize)> = report
        .results
        .iter()
        .map(|(category, paths)| (category.name().to_string(), paths.len()))
        .collect();
    OutputFormatter::summary_table(&counts, report.moved());

    if report.is_complete_success() {
        OutputFormatter::success(&format!(
            "Sorting complete. {} {} sorted into categories.",
            report.moved(),
            file_word(report.moved())
        ));
    } else {
        OutputFormatter::warning(&format!(
            "Sorting finished with errors: {} moved, {} failed.",
            report.moved(),
            report.failures.len()
        ));
    }
}

/// Shows the plan for a directory without moving anything.
fn sort_directory_dry_run(sorter: &Sorter, base_path: &Path) -> Result<(), String> {
    OutputFormatter::dry_run_notice(&format!("Analyzing contents of: {}", base_path.display()));

    let plan = sorter.plan(base_path).map_err(|e| e.to_string())?;
    if plan.is_empty() && plan.already_sorted().is_empty() {
        OutputFormatter::warning("No files found to sort.");
        return Ok(());
    }

    print_plan(&plan);

    OutputFormatter::success("Dry run complete. No files were modified.");
    OutputFormatter::plain(&format!(
        "Run 'filesorter sort {}' (without --dry-run) to execute the sort.",
        base_path.display()
    ));
    Ok(())
}

fn print_plan(plan: &SortPlan) {
    OutputFormatter::dry_run_notice("Files would be sorted as follows:");
    for group in plan.groups() {
        for file in &group.files {
            OutputFormatter::plain(&format!(
                " - {}  → {}/",
                file.file_name,
                group.category.dir_name()
            ));
        }
    }

    if !plan.already_sorted().is_empty() {
        OutputFormatter::plain(&format!(
            "{} {} already in place",
            plan.already_sorted().len(),
            file_word(plan.already_sorted().len())
        ));
    }
    if !plan.excluded().is_empty() {
        OutputFormatter::plain(&format!(
            "{} {} excluded by filters",
            plan.excluded().len(),
            file_word(plan.excluded().len())
        ));
    }

    let counts: Vec<(String, usize)> = plan
        .category_counts()
        .into_iter()
        .map(|(category, count)| (category.name().to_string(), count))
        .collect();
    OutputFormatter::summary_table(&counts, plan.total_files());
}

/// Undoes the sort recorded in the directory's history file.
///
/// The history file is deleted when every entry was handled and rewritten
/// with the failed entries otherwise, so a second undo retries only those.
fn undo_sort(base_path: &Path) -> Result<(), String> {
    OutputFormatter::info("Undoing last sort operation...");

    let log = UndoLog::load(base_path).map_err(|e| format!("Error: {}", e))?;
    let Some(log) = log else {
        OutputFormatter::warning("Nothing to undo.");
        return Ok(());
    };

    let pb = OutputFormatter::create_progress_bar();
    let outcome = UndoManager::undo_with_progress(log, |processed, total| {
        OutputFormatter::update_progress(&pb, processed, total)
    });
    pb.finish_and_clear();

    let report = match outcome {
        UndoOutcome::Completed(report) => report,
        UndoOutcome::NothingToUndo => {
            UndoLog::delete(base_path).map_err(|e| e.to_string())?;
            OutputFormatter::warning("Nothing to undo.");
            return Ok(());
        }
    };

    print_undo_report(&report);

    if report.remaining.is_empty() {
        if let Err(e) = UndoLog::delete(base_path) {
            OutputFormatter::warning(&format!("Could not delete history file: {}", e));
        }
    } else {
        report
            .remaining
            .save(base_path)
            .map_err(|e| format!("Could not update history file: {}", e))?;
        OutputFormatter::warning(&format!(
            "{} {} could not be restored and remain in the history. Fix the issues and run undo again.",
            report.remaining.len(),
            file_word(report.remaining.len())
        ));
    }

    Ok(())
}

fn print_undo_report(report: &UndoReport) {
    OutputFormatter::success(&format!(
        "Undo complete. {} {} restored to their original locations.",
        report.restored_files,
        file_word(report.restored_files)
    ));

    if report.directories_removed() > 0 {
        OutputFormatter::plain(&format!(
            "Removed {} empty {}.",
            report.directories_removed(),
            if report.directories_removed() == 1 {
                "directory"
            } else {
                "directories"
            }
        ));
    }

    if !report.missing_files.is_empty() {
        OutputFormatter::warning(&format!("Skipped: {}", report.missing_files.len()));
        for record in &report.missing_files {
            OutputFormatter::plain(&format!(
                "    - {}: no longer exists",
                record.destination_path.display()
            ));
        }
    }

    for failure in &report.failed_restores {
        OutputFormatter::error(&failure.to_string());
    }
    for failure in &report.failed_removals {
        OutputFormatter::error(&failure.to_string());
    }
}
