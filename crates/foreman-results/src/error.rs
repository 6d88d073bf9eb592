// Copyright (c) 2026 - present the foreman developers
// SPDX-License-Identifier: MIT

//! Error types for foreman-results

use thiserror::Error;

/// Errors that can occur while scanning or parsing build artifacts
#[derive(Debug, Error)]
pub enum ParseError {
    /// Error reading an artifact file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The result store rejected a record
    #[error("Result store error: {0}")]
    Store(#[source] anyhow::Error),
}
