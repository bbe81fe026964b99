//! Configuration: file filters and the category table.
//!
//! Configuration is read from a TOML file. Every section is optional; an
//! empty file (or no file at all) gives the built-in behavior of sorting every
//! direct file with the default category table.
//!
//! # Configuration File Format
//!
//! ```toml
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db", "desktop.ini"]
//! patterns = ["*.part", "*.crdownload"]
//! extensions = ["tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//!
//! # Replaces the default table when present. Order decides ties.
//! [[categories]]
//! name = "Photos"
//! extensions = [".jpg", ".png"]
//! ```

use crate::file_category::{CategoryTable, split_extension};
use glob::Pattern;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// Name of the per-directory configuration file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = ".filesorterrc.toml";

/// Errors that can occur during configuration loading and compilation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),

    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },

    /// A `[[categories]]` entry that cannot be used as a folder or lookup key.
    #[error("Invalid category '{name}': {reason}")]
    InvalidCategory { name: String, reason: String },

    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Top-level configuration file contents.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub filters: FilterSection,

    /// Replacement category table, in priority order.
    pub categories: Vec<CategoryDefinition>,
}

/// One `[[categories]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDefinition {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
}

/// `[filters]`: which direct files of a directory take part in a sort.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FilterSection {
    /// Sort names starting with "." too.
    pub enable_hidden_files: bool,
    pub exclude: ExcludeSection,
    /// Whitelist; a match here overrides every exclude rule.
    pub include: IncludeSection,
}

impl Default for FilterSection {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude: ExcludeSection::default(),
            include: IncludeSection::default(),
        }
    }
}

/// `[filters.exclude]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ExcludeSection {
    /// Exact file names, e.g. "Thumbs.db".
    pub filenames: Vec<String>,
    /// Glob patterns, e.g. "*.part".
    pub patterns: Vec<String>,
    /// Case-insensitive, with or without the leading dot.
    pub extensions: Vec<String>,
    pub regex: Vec<String>,
}

/// `[filters.include]`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IncludeSection {
    pub patterns: Vec<String>,
}

impl Config {
    /// Load configuration, falling back to the built-in defaults.
    ///
    /// An explicit `config_path` must exist. Otherwise the first existing
    /// file among `./.filesorterrc.toml` and
    /// `~/.config/filesorter/config.toml` is used.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        match Self::discovered_path() {
            Some(path) => {
                debug!("Using configuration {}", path.display());
                Self::load_from_file(&path)
            }
            None => Ok(Self::default()),
        }
    }

    fn discovered_path() -> Option<PathBuf> {
        let user_config = std::env::var_os("HOME").map(|home| {
            PathBuf::from(home)
                .join(".config")
                .join("filesorter")
                .join("config.toml")
        });

        std::iter::once(PathBuf::from(LOCAL_CONFIG_FILE))
            .chain(user_config)
            .find(|path| path.is_file())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| match source.kind() {
            io::ErrorKind::NotFound => ConfigError::ConfigNotFound(path.to_path_buf()),
            _ => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))
    }

    /// Builds the category table: the configured one, or the default table
    /// when no `[[categories]]` are given.
    pub fn category_table(&self) -> Result<CategoryTable, ConfigError> {
        if self.categories.is_empty() {
            return Ok(CategoryTable::default());
        }

        let mut seen = HashSet::new();
        let mut table = CategoryTable::empty();
        for definition in &self.categories {
            validate_category(definition)?;
            if !seen.insert(definition.name.as_str()) {
                return Err(ConfigError::InvalidCategory {
                    name: definition.name.clone(),
                    reason: "defined more than once".to_string(),
                });
            }
            table.add_category(&definition.name, &definition.extensions);
        }
        Ok(table)
    }

    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::compile(&self.filters)
    }
}

fn validate_category(definition: &CategoryDefinition) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidCategory {
        name: definition.name.clone(),
        reason: reason.to_string(),
    };

    let name = definition.name.as_str();
    if name.trim().is_empty() {
        return Err(invalid("name must not be empty"));
    }
    if name == "." || name == ".." || name.contains(['/', '\\']) {
        return Err(invalid("name must be a plain folder name"));
    }
    if let Some(ext) = definition
        .extensions
        .iter()
        .find(|ext| !ext.starts_with('.') || ext.len() < 2)
    {
        return Err(invalid(&format!(
            "extension '{}' must start with a dot, e.g. \".pdf\"",
            ext
        )));
    }
    Ok(())
}

/// The rule that left a file out of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    Hidden,
    Filename,
    Extension,
    Pattern,
    Regex,
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Exclusion::Hidden => "hidden file",
            Exclusion::Filename => "excluded file name",
            Exclusion::Extension => "excluded extension",
            Exclusion::Pattern => "excluded glob pattern",
            Exclusion::Regex => "excluded regex",
        };
        f.write_str(reason)
    }
}

/// Filter rules compiled into matchers. The default admits every file.
#[derive(Debug, Clone, Default)]
pub struct CompiledFilters {
    skip_hidden: bool,
    keep: Vec<Pattern>,
    names: HashSet<String>,
    extensions: HashSet<String>,
    globs: Vec<Pattern>,
    regexes: Vec<Regex>,
}

impl CompiledFilters {
    fn compile(section: &FilterSection) -> Result<Self, ConfigError> {
        let exclude = &section.exclude;
        Ok(Self {
            skip_hidden: !section.enable_hidden_files,
            keep: compile_globs(&section.include.patterns)?,
            names: exclude.filenames.iter().cloned().collect(),
            extensions: exclude
                .extensions
                .iter()
                .map(|ext| normalize_extension(ext))
                .collect(),
            globs: compile_globs(&exclude.patterns)?,
            regexes: exclude
                .regex
                .iter()
                .map(|pattern| compile_regex(pattern))
                .collect::<Result<_, _>>()?,
        })
    }

    /// The first rule that leaves `file_name` out, if any.
    ///
    /// Include patterns win over everything. The exclude rules are then
    /// tried in order: hidden, name, extension, glob, regex.
    pub fn exclusion(&self, file_name: &str) -> Option<Exclusion> {
        if self.keep.iter().any(|p| p.matches(file_name)) {
            return None;
        }

        let extension = split_extension(file_name).1.map(normalize_extension);
        if self.skip_hidden && file_name.starts_with('.') {
            Some(Exclusion::Hidden)
        } else if self.names.contains(file_name) {
            Some(Exclusion::Filename)
        } else if extension.is_some_and(|ext| self.extensions.contains(&ext)) {
            Some(Exclusion::Extension)
        } else if self.globs.iter().any(|p| p.matches(file_name)) {
            Some(Exclusion::Pattern)
        } else if self.regexes.iter().any(|r| r.is_match(file_name)) {
            Some(Exclusion::Regex)
        } else {
            None
        }
    }

    pub fn should_include(&self, file_name: &str) -> bool {
        self.exclusion(file_name).is_none()
    }
}

fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_lowercase()
}

fn compile_globs(patterns: &[String]) -> Result<Vec<Pattern>, ConfigError> {
    patterns
        .iter()
        .map(|p| Pattern::new(p).map_err(|_| ConfigError::InvalidGlobPattern(p.clone())))
        .collect()
}

fn compile_regex(pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}
