//! Query helper functions for the foreman database
//!
//! This module provides high-level query functions for retrieving build
//! history and failing tests from the SQLite database.

use rusqlite::{Connection, params};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Query errors
#[derive(Debug, Error)]
pub enum QueryError {
    /// SQLite error during query
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// One entry of the build history listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildHistoryEntry {
    /// Build ID (UUID as string)
    pub id: String,
    /// Project directory the build ran in
    pub project_dir: String,
    /// ISO 8601 start timestamp
    pub started_at: String,
    /// ISO 8601 end timestamp, absent for interrupted builds
    pub finished_at: Option<String>,
    /// Status: 'running', 'succeeded', or 'failed'
    pub status: String,
    /// Aggregate test count
    pub tests: i64,
    /// Aggregate failure count
    pub failures: i64,
}

/// A failing test result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailingTest {
    /// Suite name, absent when the case never got a suite-close line
    pub suite_name: Option<String>,
    /// Test case name
    pub name: String,
    /// Duration in milliseconds
    pub duration_ms: i64,
    /// Failure message if one was recorded
    pub message: Option<String>,
    /// ISO 8601 timestamp of the owning build
    pub started_at: String,
}

/// List the most recent builds, newest first
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn recent_builds(conn: &Connection, limit: usize) -> Result<Vec<BuildHistoryEntry>, QueryError> {
    if limit == 0 {
        return Err(QueryError::InvalidParameter("Limit cannot be zero".into()));
    }

    let mut stmt = conn.prepare(
        r#"
        SELECT id, project_dir, started_at, finished_at, status, tests, failures
        FROM builds
        ORDER BY started_at DESC
        LIMIT ?
        "#,
    )?;

    let rows = stmt.query_map([limit as i64], |row| {
        Ok(BuildHistoryEntry {
            id: row.get(0)?,
            project_dir: row.get(1)?,
            started_at: row.get(2)?,
            finished_at: row.get(3)?,
            status: row.get(4)?,
            tests: row.get(5)?,
            failures: row.get(6)?,
        })
    })?;

    let mut builds = Vec::new();
    for row in rows {
        builds.push(row?);
    }
    Ok(builds)
}

/// Get failing tests for one build from the failing_tests view
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn failing_tests_for_build(
    conn: &Connection,
    build_id: &str,
) -> Result<Vec<FailingTest>, QueryError> {
    let mut stmt = conn.prepare(
        r#"
        SELECT suite_name, name, duration_ms, message, started_at
        FROM failing_tests
        WHERE build_id = ?
        ORDER BY id
        "#,
    )?;

    let rows = stmt.query_map(params![build_id], |row| {
        Ok(FailingTest {
            suite_name: row.get(0)?,
            name: row.get(1)?,
            duration_ms: row.get(2)?,
            message: row.get(3)?,
            started_at: row.get(4)?,
        })
    })?;

    let mut tests = Vec::new();
    for row in rows {
        tests.push(row?);
    }
    Ok(tests)
}
