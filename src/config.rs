//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults
//! 2. A TOML file: `--config <PATH>`, or `config.toml` in the platform
//!    config directory if it exists
//! 3. Environment variables prefixed `DUPEBRIDGE_` (e.g. `DUPEBRIDGE_MIN_SIZE`)
//! 4. Command-line flags
//!
//! The merged values are checked once and turned into [`ReportSettings`] or
//! [`PruneSettings`], which are passed down explicitly.
//!
//! ```toml
//! recursive = true
//! min_size = 4096
//! duplicates_threshold = 2
//! blank_line_between_sets = true
//! backup_dir = "/mnt/backup/dupes"
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::actions::PruneOptions;
use crate::cli::{PruneArgs, ReportArgs};
use crate::duplicates::FinderConfig;
use crate::report::ReadOptions;
use crate::scanner::ScanConfig;

/// Prefix for configuration environment variables.
pub const ENV_PREFIX: &str = "DUPEBRIDGE_";

/// Smallest meaningful duplicate threshold.
pub const MIN_DUPLICATES_THRESHOLD: usize = 2;

/// Values that may come from the config file or environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Descend into subdirectories
    pub recursive: bool,
    /// Minimum file size in bytes
    pub min_size: u64,
    /// Members needed for a duplicate set
    pub duplicates_threshold: usize,
    /// Skip and log per-item errors
    pub ignore_errors: bool,
    /// Blank line between sets in the report and console
    pub blank_line_between_sets: bool,
    /// Print results to the terminal as well
    pub console_report: bool,
    /// Prune without changing anything
    pub dry_run: bool,
    /// Report has no header row
    pub use_first_row: bool,
    /// Backup root for pruned files
    pub backup_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            recursive: false,
            min_size: 1,
            duplicates_threshold: MIN_DUPLICATES_THRESHOLD,
            ignore_errors: false,
            blank_line_between_sets: false,
            console_report: false,
            dry_run: false,
            use_first_row: false,
            backup_dir: None,
        }
    }
}

/// Errors from loading or validating configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly named config file does not exist.
    #[error("config file not found: {0}")]
    FileNotFound(PathBuf),

    /// The config file or environment held a bad value.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),

    /// No directories were given to scan.
    #[error("at least one path to scan is required")]
    NoPaths,

    /// The duplicate threshold is below two.
    #[error("duplicate threshold must be at least 2, got {0}")]
    ThresholdTooLow(usize),

    /// The report's parent directory does not exist.
    #[error("output directory does not exist: {0}")]
    OutputDirMissing(PathBuf),

    /// The input report does not exist.
    #[error("input report not found: {0}")]
    InputMissing(PathBuf),

    /// The backup directory does not exist or is not a directory.
    #[error("backup directory does not exist: {0}")]
    BackupDirMissing(PathBuf),
}

impl Config {
    /// Platform-specific default config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupebridge", "dupebridge")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered figment without extracting it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if `config_file` is given but missing.
    pub fn figment(config_file: Option<&Path>) -> Result<Figment, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(ConfigError::FileNotFound(path.to_path_buf()));
                }
                figment = figment.merge(Toml::file(path));
            }
            None => {
                if let Some(path) = Self::default_path() {
                    log::debug!("Looking for config file at {}", path.display());
                    figment = figment.merge(Toml::file(path));
                }
            }
        }

        Ok(figment.merge(Env::prefixed(ENV_PREFIX)))
    }

    /// Load defaults, config file, and environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file is missing (when named) or malformed.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = Self::figment(config_file)?
            .extract()
            .map_err(|e| ConfigError::Invalid(Box::new(e)))?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// Merge `report` flags over this config and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if no paths are given, the threshold is below
    /// two, or the report's directory does not exist.
    pub fn report_settings(&self, args: &ReportArgs) -> Result<ReportSettings, ConfigError> {
        let settings = ReportSettings {
            paths: args.paths.clone(),
            recursive: flag(args.recurse, args.no_recurse, self.recursive),
            min_size: args.size.unwrap_or(self.min_size),
            duplicates_threshold: args.duplicates.unwrap_or(self.duplicates_threshold),
            ignore_errors: flag(args.ignore_errors, args.no_ignore_errors, self.ignore_errors),
            output_csv: args.csv_file.clone(),
            blank_line_between_sets: flag(
                args.blank_line,
                args.no_blank_line,
                self.blank_line_between_sets,
            ),
            console_report: flag(args.console, args.no_console, self.console_report),
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Merge `prune` flags over this config and validate the result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the input report or backup directory is missing.
    pub fn prune_settings(&self, args: &PruneArgs) -> Result<PruneSettings, ConfigError> {
        let settings = PruneSettings {
            input_csv: args.input_csv.clone(),
            backup_dir: args.backup_dir.clone().or_else(|| self.backup_dir.clone()),
            dry_run: flag(args.dry_run, args.no_dry_run, self.dry_run),
            ignore_errors: flag(args.ignore_errors, args.no_ignore_errors, self.ignore_errors),
            use_first_row: flag(args.use_first_row, args.no_use_first_row, self.use_first_row),
            blank_line_between_sets: flag(
                args.blank_line,
                args.no_blank_line,
                self.blank_line_between_sets,
            ),
            console_report: flag(args.console, args.no_console, self.console_report),
        };
        settings.validate()?;
        Ok(settings)
    }
}

/// Resolve a `--x`/`--no-x` pair over the configured value; the CLI wins.
fn flag(on: bool, off: bool, configured: bool) -> bool {
    if on {
        true
    } else if off {
        false
    } else {
        configured
    }
}

/// Validated settings for the `report` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSettings {
    /// Directories to scan
    pub paths: Vec<PathBuf>,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Minimum file size in bytes
    pub min_size: u64,
    /// Members needed for a duplicate set
    pub duplicates_threshold: usize,
    /// Skip and log per-file errors
    pub ignore_errors: bool,
    /// Report destination
    pub output_csv: PathBuf,
    /// Blank row between sets
    pub blank_line_between_sets: bool,
    /// Print the sets to the terminal
    pub console_report: bool,
}

impl ReportSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.paths.is_empty() {
            return Err(ConfigError::NoPaths);
        }
        if self.duplicates_threshold < MIN_DUPLICATES_THRESHOLD {
            return Err(ConfigError::ThresholdTooLow(self.duplicates_threshold));
        }
        let parent = match self.output_csv.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Err(ConfigError::OutputDirMissing(parent.to_path_buf()));
        }
        Ok(())
    }

    /// Finder inputs derived from these settings.
    #[must_use]
    pub fn finder_config(&self) -> FinderConfig {
        FinderConfig::new(self.paths.clone())
            .with_scan_config(ScanConfig::new(self.recursive, self.min_size))
            .with_duplicates_threshold(self.duplicates_threshold)
            .with_ignore_errors(self.ignore_errors)
    }
}

/// Validated settings for the `prune` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PruneSettings {
    /// Report to read
    pub input_csv: PathBuf,
    /// Backup root, if backups are wanted
    pub backup_dir: Option<PathBuf>,
    /// Report intended actions only
    pub dry_run: bool,
    /// Skip and log per-row errors
    pub ignore_errors: bool,
    /// Report has no header row
    pub use_first_row: bool,
    /// Blank line between sets in console output
    pub blank_line_between_sets: bool,
    /// Print the rows to the terminal
    pub console_report: bool,
}

impl PruneSettings {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.input_csv.is_file() {
            return Err(ConfigError::InputMissing(self.input_csv.clone()));
        }
        if let Some(ref dir) = self.backup_dir {
            if !dir.is_dir() {
                return Err(ConfigError::BackupDirMissing(dir.clone()));
            }
        }
        Ok(())
    }

    /// Reader options derived from these settings.
    #[must_use]
    pub fn read_options(&self) -> ReadOptions {
        ReadOptions {
            use_first_row: self.use_first_row,
            ignore_errors: self.ignore_errors,
        }
    }

    /// Engine options derived from these settings.
    #[must_use]
    pub fn prune_options(&self) -> PruneOptions {
        PruneOptions {
            backup_dir: self.backup_dir.clone(),
            dry_run: self.dry_run,
            ignore_errors: self.ignore_errors,
        }
    }
}
