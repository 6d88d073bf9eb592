//! Configuration for the foreman CLI
//!
//! This module provides the command-line surface and configuration types,
//! including the database path, the build subcommand flags, and logging
//! options.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use foreman_exec::pipeline::DEFAULT_TOOL;
use foreman_results::scanner::DEFAULT_ARTIFACT_SUFFIX;

/// Foreman - build execution and test-result ingestion
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "foreman")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Path to SQLite database file
    ///
    /// If the file doesn't exist, it will be created and initialized.
    /// Defaults to ~/.local/share/foreman/foreman.db (or platform equivalent).
    #[arg(short, long, env = "FOREMAN_DATABASE")]
    pub database: Option<PathBuf>,

    /// Enable verbose logging (debug level)
    #[arg(short, long, default_value = "false")]
    pub verbose: bool,

    /// Quiet mode - suppress info-level logs
    ///
    /// Only errors and warnings will be logged.
    #[arg(short, long, default_value = "false")]
    pub quiet: bool,

    /// Skip database initialization/migration check
    ///
    /// Useful for testing or when connecting to an externally managed database.
    #[arg(long, default_value = "false")]
    pub skip_init: bool,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run a clean-then-build cycle and ingest its test results
    ///
    /// Launches the build tool twice in the project directory (a clean
    /// phase, then the build proper), streams both phases' output into
    /// one log file, and afterwards scans the project tree for result
    /// artifacts to parse into the database.
    Run {
        /// Project directory to build in
        #[arg(short, long)]
        project: PathBuf,

        /// Build log destination (defaults to build.log inside the project)
        #[arg(short, long)]
        log: Option<PathBuf>,

        /// Build configuration override (e.g. Debug, Release)
        #[arg(long)]
        configuration: Option<String>,

        /// Build target override
        #[arg(long)]
        target: Option<String>,

        /// SDK override
        #[arg(long)]
        sdk: Option<String>,

        /// Build tool executable to invoke
        #[arg(long, default_value = DEFAULT_TOOL)]
        tool: String,

        /// File suffix identifying result artifacts
        #[arg(long, default_value = DEFAULT_ARTIFACT_SUFFIX)]
        artifact_suffix: String,

        /// Root path whose wrapper suite lines are filtered out of results
        #[arg(long)]
        data_root: Option<String>,

        /// Print the build summary as JSON
        #[arg(long, default_value = "false")]
        json: bool,
    },

    /// Show recent builds
    History {
        /// Maximum number of builds to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Store a configuration value (e.g. build.target)
    SetConfig {
        /// Configuration key
        key: String,

        /// Configuration value
        value: String,
    },

    /// Read a configuration value
    GetConfig {
        /// Configuration key
        key: String,
    },
}

impl Config {
    /// Get the database path, using a default if not specified
    ///
    /// Default location is platform-specific:
    /// - macOS: ~/Library/Application Support/foreman/foreman.db
    /// - Linux: ~/.local/share/foreman/foreman.db
    /// - Windows: %LOCALAPPDATA%\foreman\foreman.db
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.database.clone().unwrap_or_else(|| {
            dirs::data_local_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("foreman")
                .join("foreman.db")
        })
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The project directory doesn't exist or isn't a directory
    /// - The database parent directory cannot be created
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(Command::Run { ref project, .. }) = self.command {
            if !project.exists() {
                return Err(ConfigError::ProjectNotFound(project.clone()));
            }
            if !project.is_dir() {
                return Err(ConfigError::ProjectNotDirectory(project.clone()));
            }
        }

        // Make sure the database can be created where it is expected
        let db_path = self.database_path();
        if let Some(parent) = db_path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ConfigError::DatabaseDirectoryCreateFailed(parent.to_path_buf(), e)
                })?;
            }
        }

        Ok(())
    }

    /// Get the log level based on verbose/quiet flags
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        if self.verbose {
            tracing::Level::DEBUG
        } else if self.quiet {
            tracing::Level::WARN
        } else {
            tracing::Level::INFO
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Project directory not found
    #[error("Project directory not found: {0}")]
    ProjectNotFound(PathBuf),

    /// Project path is not a directory
    #[error("Project path is not a directory: {0}")]
    ProjectNotDirectory(PathBuf),

    /// Failed to create database directory
    #[error("Failed to create database directory {0}: {1}")]
    DatabaseDirectoryCreateFailed(PathBuf, std::io::Error),

    /// Database initialization failed
    #[error("Database initialization failed: {0}")]
    DatabaseInitFailed(String),
}
