//! filesorter - sort the files of a directory into category folders
//!
//! This library classifies files by extension, moves them into one
//! subdirectory per category, and records every move so the sort can be
//! undone exactly. The command-line front end lives in [`cli`].

pub mod cli;
pub mod config;
pub mod conflict;
pub mod file_category;
pub mod file_organizer;
pub mod history;
pub mod logging;
pub mod output;
pub mod undo;

pub use config::{CompiledFilters, Config, ConfigError, Exclusion};
pub use conflict::resolve_destination;
pub use file_category::{Category, CategoryTable};
pub use file_organizer::{MoveFailure, SortError, SortOutcome, SortPlan, SortReport, SortResult, Sorter};
pub use history::{HistoryError, MoveRecord, UndoLog};
pub use undo::{UndoManager, UndoOutcome, UndoReport};

pub use cli::{SortCommand, run_cli, run_cli_with_config};
