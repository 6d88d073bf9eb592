//! Database migrations for foreman
//!
//! Versioned schema migrations so the database can evolve without manual
//! intervention. Each migration records its version in
//! `schema_migrations`.

use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

/// Migration errors
#[derive(Debug, Error)]
pub enum MigrationError {
    /// SQLite error during migration
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Current schema version
pub const CURRENT_VERSION: i32 = 1;

/// A database migration
pub struct Migration {
    /// Migration version number
    pub version: i32,
    /// Migration name/description
    pub name: &'static str,
    /// SQL to apply the migration
    pub up: &'static str,
    /// SQL to revert the migration (optional)
    pub down: Option<&'static str>,
}

/// All available migrations in order
pub static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    up: include_str!("schema.sql"),
    down: Some(
        r#"
        DROP VIEW IF EXISTS failing_tests;
        DROP TABLE IF EXISTS settings;
        DROP TABLE IF EXISTS test_results;
        DROP TABLE IF EXISTS test_suites;
        DROP TABLE IF EXISTS builds;
        DROP TABLE IF EXISTS schema_migrations;
    "#,
    ),
}];

/// Get the current schema version from the database
///
/// Returns 0 if no migrations have been applied.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn get_version(conn: &Connection) -> Result<i32, MigrationError> {
    let table_exists: i32 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='schema_migrations'",
        [],
        |row| row.get(0),
    )?;

    if table_exists == 0 {
        return Ok(0);
    }

    let version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_migrations",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(version)
}

/// Apply all pending migrations
///
/// # Errors
///
/// Returns an error if any migration fails.
pub fn migrate(conn: &Connection) -> Result<Vec<i32>, MigrationError> {
    let current_version = get_version(conn)?;
    let mut applied = Vec::new();

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(version = migration.version, name = migration.name, "applying migration");
            conn.execute_batch(migration.up)?;
            applied.push(migration.version);
        }
    }

    Ok(applied)
}

/// Rollback to a specific version
///
/// # Errors
///
/// Returns an error if the rollback fails.
#[allow(dead_code)]
pub fn rollback_to(conn: &Connection, target_version: i32) -> Result<Vec<i32>, MigrationError> {
    let current_version = get_version(conn)?;
    let mut rolled_back = Vec::new();

    for migration in MIGRATIONS.iter().rev() {
        if migration.version > target_version
            && migration.version <= current_version
            && let Some(down) = migration.down
        {
            conn.execute_batch(down)?;
            rolled_back.push(migration.version);
        }
    }

    Ok(rolled_back)
}

/// Check if the database is up to date
#[must_use]
pub fn is_up_to_date(conn: &Connection) -> bool {
    get_version(conn)
        .map(|v| v >= CURRENT_VERSION)
        .unwrap_or(false)
}
