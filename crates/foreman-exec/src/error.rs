// Copyright (c) 2026 - present the foreman developers
// SPDX-License-Identifier: MIT

//! Error types for foreman-exec

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while executing a build pipeline
#[derive(Debug, Error)]
pub enum ExecError {
    /// The tool executable or working directory is invalid
    #[error("Failed to launch '{program}' in {working_dir}: {source}")]
    Spawn {
        /// Program that could not be launched
        program: String,
        /// Working directory the launch was attempted in
        working_dir: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// The build log file could not be opened
    #[error("Failed to open build log {path}: {source}")]
    LogFile {
        /// Path of the log file
        path: PathBuf,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// I/O failure while waiting on the child process
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
