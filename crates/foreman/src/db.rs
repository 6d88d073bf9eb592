//! Database module for foreman
//!
//! SQLite persistence for builds, test suites, test results, and the
//! settings key-value store the build parameters are resolved from. The
//! [`DbStore`] adapter is the persistence context handed to the result
//! parser for the duration of one build.

use std::collections::HashMap;
use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use thiserror::Error;

use foreman_results::model::{BuildRecord, TestCaseResult, TestOutcome, TestSuiteRecord};
use foreman_results::store::ResultStore;

use crate::migrations;

/// Database errors
#[derive(Debug, Error)]
pub enum DbError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Migration error
    #[error("Migration error: {0}")]
    Migration(#[from] migrations::MigrationError),

    /// Record not found
    #[error("Record not found: {table}/{id}")]
    NotFound {
        /// Table queried
        table: String,
        /// Identifier looked up
        id: String,
    },
}

/// One row of the `builds` table
#[derive(Debug, Clone)]
pub struct BuildRow {
    /// Build identifier (uuid)
    pub id: String,
    /// Project directory the build ran in
    pub project_dir: String,
    /// Location of the build log, if one was opened
    pub log_path: Option<String>,
    /// Start timestamp (RFC 3339)
    pub started_at: String,
    /// End timestamp (RFC 3339), None while running
    pub finished_at: Option<String>,
    /// Terminal status string
    pub status: String,
    /// Aggregate test count
    pub tests: i64,
    /// Aggregate failure count
    pub failures: i64,
}

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new in-memory database
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Open a database file
    ///
    /// # Errors
    ///
    /// Returns an error if the database file cannot be opened.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Initialize the database schema using migrations
    ///
    /// # Errors
    ///
    /// Returns an error if the schema cannot be created.
    pub fn initialize(&self) -> Result<(), DbError> {
        migrations::migrate(&self.conn)?;
        Ok(())
    }

    /// Check if the database is initialized and up to date
    pub fn is_initialized(&self) -> bool {
        migrations::is_up_to_date(&self.conn)
    }

    /// Get the underlying connection (for advanced queries)
    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Execute a simple query and return the count
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn count(&self, table: &str) -> Result<i64, DbError> {
        let query = format!("SELECT COUNT(*) FROM {table}");
        let count: i64 = self.conn.query_row(&query, [], |row| row.get(0))?;
        Ok(count)
    }

    // ========================================================================
    // Builds
    // ========================================================================

    /// Insert the row for a freshly started build
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub fn insert_build(
        &self,
        id: &str,
        project_dir: &str,
        log_path: Option<&str>,
        record: &BuildRecord,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO builds (id, project_dir, log_path, started_at, status, tests, failures)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                project_dir,
                log_path,
                record.started_at.to_rfc3339(),
                record.status.as_str(),
                record.tests,
                record.failures,
            ],
        )?;
        Ok(())
    }

    /// Write a finalized record back to its build row
    ///
    /// # Errors
    ///
    /// Returns an error if the update fails.
    pub fn finalize_build(&self, id: &str, record: &BuildRecord) -> Result<(), DbError> {
        self.conn.execute(
            "UPDATE builds SET finished_at = ?2, status = ?3, tests = ?4, failures = ?5
             WHERE id = ?1",
            params![
                id,
                record.finished_at.map(|t| t.to_rfc3339()),
                record.status.as_str(),
                record.tests,
                record.failures,
            ],
        )?;
        Ok(())
    }

    /// Fetch one build row by id
    ///
    /// # Errors
    ///
    /// Returns `DbError::NotFound` if no such build exists.
    pub fn get_build(&self, id: &str) -> Result<BuildRow, DbError> {
        self.conn
            .query_row(
                "SELECT id, project_dir, log_path, started_at, finished_at, status, tests, failures
                 FROM builds WHERE id = ?1",
                [id],
                |row| {
                    Ok(BuildRow {
                        id: row.get(0)?,
                        project_dir: row.get(1)?,
                        log_path: row.get(2)?,
                        started_at: row.get(3)?,
                        finished_at: row.get(4)?,
                        status: row.get(5)?,
                        tests: row.get(6)?,
                        failures: row.get(7)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| DbError::NotFound {
                table: "builds".to_string(),
                id: id.to_string(),
            })
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Read one configuration value
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn get_setting(&self, key: &str) -> Result<Option<String>, DbError> {
        let value = self
            .conn
            .query_row("SELECT value FROM settings WHERE key = ?1", [key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Write one configuration value, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn set_setting(&self, key: &str, value: &str) -> Result<(), DbError> {
        self.conn.execute(
            "INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value],
        )?;
        Ok(())
    }

    /// Load every configuration pair as a property bag
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn load_settings(&self) -> Result<HashMap<String, String>, DbError> {
        let mut stmt = self.conn.prepare("SELECT key, value FROM settings")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut bag = HashMap::new();
        for row in rows {
            let (key, value): (String, String) = row?;
            bag.insert(key, value);
        }
        Ok(bag)
    }
}

fn outcome_str(outcome: TestOutcome) -> &'static str {
    match outcome {
        TestOutcome::Passed => "passed",
        TestOutcome::Failed => "failed",
    }
}

/// SQLite-backed [`ResultStore`] scoped to one build
///
/// Test rows are inserted the moment their case line is parsed, before
/// their suite row exists; the suite linkage is backfilled when the
/// suite-close marker lands.
pub struct DbStore<'a> {
    db: &'a Database,
    build_id: String,
    pending_test_ids: Vec<i64>,
}

impl<'a> DbStore<'a> {
    /// Create a store writing under the given build id
    #[must_use]
    pub fn new(db: &'a Database, build_id: impl Into<String>) -> Self {
        Self {
            db,
            build_id: build_id.into(),
            pending_test_ids: Vec::new(),
        }
    }
}

impl ResultStore for DbStore<'_> {
    fn save_test(&mut self, test: &TestCaseResult) -> anyhow::Result<()> {
        self.db.connection().execute(
            "INSERT INTO test_results (build_id, suite_id, name, outcome, duration_ms, message)
             VALUES (?1, NULL, ?2, ?3, ?4, ?5)",
            params![
                self.build_id,
                test.name,
                outcome_str(test.outcome),
                test.duration_ms as i64,
                test.message,
            ],
        )?;
        self.pending_test_ids
            .push(self.db.connection().last_insert_rowid());
        Ok(())
    }

    fn save_suite(&mut self, suite: &TestSuiteRecord) -> anyhow::Result<()> {
        self.db.connection().execute(
            "INSERT INTO test_suites (build_id, name, tests, failures, duration_ms)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                self.build_id,
                suite.name,
                suite.tests,
                suite.failures,
                suite.duration_ms as i64,
            ],
        )?;
        let suite_id = self.db.connection().last_insert_rowid();

        for test_id in self.pending_test_ids.drain(..) {
            self.db.connection().execute(
                "UPDATE test_results SET suite_id = ?1 WHERE id = ?2",
                params![suite_id, test_id],
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use similar_asserts::assert_eq;

    fn test_db() -> Database {
        let db = Database::in_memory().expect("create db");
        db.initialize().expect("initialize");
        db
    }

    #[test]
    fn test_database_initialize_idempotent() {
        let db = test_db();
        db.initialize().expect("second init should succeed");
        assert!(db.is_initialized());
    }

    #[test]
    fn test_insert_and_finalize_build() {
        let db = test_db();
        let mut record = BuildRecord::begin();

        db.insert_build("b-1", "/work/project", Some("/work/build.log"), &record)
            .expect("insert");

        let row = db.get_build("b-1").expect("get");
        assert_eq!(row.status, "running");
        assert!(row.finished_at.is_none());

        record.tests = 4;
        record.failures = 1;
        record.finish(foreman_results::model::BuildStatus::Failed);
        db.finalize_build("b-1", &record).expect("finalize");

        let row = db.get_build("b-1").expect("get");
        assert_eq!(row.status, "failed");
        assert!(row.finished_at.is_some());
        assert_eq!(row.tests, 4);
        assert_eq!(row.failures, 1);
    }

    #[test]
    fn test_get_build_not_found() {
        let db = test_db();
        let result = db.get_build("missing");
        assert!(matches!(result, Err(DbError::NotFound { .. })));
    }

    #[test]
    fn test_settings_roundtrip() {
        let db = test_db();

        assert!(db.get_setting("build.target").expect("get").is_none());

        db.set_setting("build.target", "App").expect("set");
        assert_eq!(
            db.get_setting("build.target").expect("get").as_deref(),
            Some("App")
        );

        db.set_setting("build.target", "Other").expect("overwrite");
        assert_eq!(
            db.get_setting("build.target").expect("get").as_deref(),
            Some("Other")
        );

        let bag = db.load_settings().expect("load");
        assert_eq!(bag.len(), 1);
        assert_eq!(bag.get("build.target").map(String::as_str), Some("Other"));
    }

    #[test]
    fn test_db_store_links_tests_to_suite() {
        let db = test_db();
        let record = BuildRecord::begin();
        db.insert_build("b-1", "/p", None, &record).expect("insert");

        let mut store = DbStore::new(&db, "b-1");

        let test = TestCaseResult {
            name: "-[Foo testBar]".to_string(),
            outcome: TestOutcome::Passed,
            duration_ms: 250,
            message: None,
        };
        store.save_test(&test).expect("save test");

        // before the suite closes the row is unlinked
        let unlinked: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM test_results WHERE suite_id IS NULL",
                [],
                |row| row.get(0),
            )
            .expect("query");
        assert_eq!(unlinked, 1);

        let mut suite = TestSuiteRecord::new("Foo");
        suite.tests = 1;
        suite.duration_ms = 250;
        store.save_suite(&suite).expect("save suite");

        let linked: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM test_results WHERE suite_id IS NOT NULL",
                [],
                |row| row.get(0),
            )
            .expect("query");
        assert_eq!(linked, 1);
        assert_eq!(db.count("test_suites").expect("count"), 1);
    }

    #[test]
    fn test_db_store_pending_ids_reset_per_suite() {
        let db = test_db();
        let record = BuildRecord::begin();
        db.insert_build("b-1", "/p", None, &record).expect("insert");

        let mut store = DbStore::new(&db, "b-1");
        let test = TestCaseResult {
            name: "t".to_string(),
            outcome: TestOutcome::Failed,
            duration_ms: 1,
            message: None,
        };

        store.save_test(&test).expect("save");
        store.save_suite(&TestSuiteRecord::new("One")).expect("suite");
        store.save_test(&test).expect("save");
        store.save_suite(&TestSuiteRecord::new("Two")).expect("suite");

        // each test row points at its own suite
        let distinct: i64 = db
            .connection()
            .query_row(
                "SELECT COUNT(DISTINCT suite_id) FROM test_results",
                [],
                |row| row.get(0),
            )
            .expect("query");
        assert_eq!(distinct, 2);
    }
}
