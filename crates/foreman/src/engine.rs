//! Build engine
//!
//! Ties the crates together for one `run` invocation: opens the build row,
//! resolves build parameters from the settings table plus command-line
//! overrides, drives the two-phase pipeline, then scans the project tree
//! for result artifacts and parses them into the database.
//!
//! A failed or unlaunchable build still gets its artifacts scanned; a
//! half-broken run may have produced partial results, and stale artifacts
//! left by an earlier run are still worth recording against the attempt.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use foreman_exec::pipeline::BuildPipeline;
use foreman_exec::settings::{BuildSettings, KEY_CONFIGURATION, KEY_SDK, KEY_TARGET, PropertyBag};
use foreman_results::model::BuildRecord;
use foreman_results::parser::{ParseOptions, parse_artifact};
use foreman_results::scanner::scan_artifacts;

use crate::db::{Database, DbError, DbStore};

/// Engine errors
#[derive(Debug, Error)]
pub enum EngineError {
    /// Database error
    #[error("Database error: {0}")]
    Db(#[from] DbError),

    /// Project directory missing or unusable
    #[error("Project directory not found: {0}")]
    ProjectNotFound(PathBuf),
}

/// Everything one build run needs from the caller
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// Project directory to build in
    pub project: PathBuf,
    /// Build log destination, defaults to build.log inside the project
    pub log: Option<PathBuf>,
    /// Build tool executable
    pub tool: String,
    /// File suffix identifying result artifacts
    pub artifact_suffix: String,
    /// Root path whose wrapper suite lines are filtered out
    pub data_root: Option<String>,
    /// Configuration override, wins over the settings table
    pub configuration: Option<String>,
    /// Target override, wins over the settings table
    pub target: Option<String>,
    /// SDK override, wins over the settings table
    pub sdk: Option<String>,
}

/// Outcome of one build run, suitable for display or JSON output
#[derive(Debug, Clone, Serialize)]
pub struct BuildSummary {
    /// Build ID (UUID as string)
    pub build_id: String,
    /// Terminal status string
    pub status: String,
    /// Exit code of the last attempted phase, absent when no phase launched
    pub exit_code: Option<i32>,
    /// Location of the build log
    pub log_path: String,
    /// Number of result artifacts parsed
    pub artifacts: usize,
    /// Total tests recorded
    pub tests: u32,
    /// Total failures recorded
    pub failures: u32,
    /// Number of suites recorded
    pub suites: usize,
    /// Number of malformed or out-of-order marker lines seen while parsing
    pub diagnostics: usize,
}

/// Runs builds against one database
pub struct BuildEngine<'a> {
    db: &'a Database,
}

impl<'a> BuildEngine<'a> {
    /// Create an engine persisting into the given database
    #[must_use]
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Run one clean-then-build cycle and ingest its results
    ///
    /// The build row is inserted before anything launches, so an
    /// interrupted run stays visible as `running`. Pipeline failures are
    /// absorbed into the build status after being logged; only database
    /// failures propagate.
    ///
    /// # Errors
    ///
    /// Returns an error if the project directory does not exist or a
    /// database operation fails.
    pub async fn run_build(&self, request: &BuildRequest) -> Result<BuildSummary, EngineError> {
        if !request.project.is_dir() {
            return Err(EngineError::ProjectNotFound(request.project.clone()));
        }

        let build_id = Uuid::new_v4().to_string();
        let log_path = request
            .log
            .clone()
            .unwrap_or_else(|| request.project.join("build.log"));
        let mut record = BuildRecord::begin();

        self.db.insert_build(
            &build_id,
            &request.project.to_string_lossy(),
            Some(&log_path.to_string_lossy()),
            &record,
        )?;
        info!(build_id = %build_id, project = %request.project.display(), "build started");

        let settings = self.resolve_settings(request)?;
        let pipeline = BuildPipeline::new(&request.tool);

        let exit_code = match pipeline
            .execute(&settings, &request.project, &log_path, &mut record)
            .await
        {
            Ok(code) => Some(code),
            Err(e) => {
                warn!(build_id = %build_id, error = %e, "build pipeline failed");
                None
            }
        };

        let (artifacts, report) = self.ingest_artifacts(&build_id, request, &mut record);
        self.db.finalize_build(&build_id, &record)?;

        Ok(BuildSummary {
            build_id,
            status: record.status.as_str().to_string(),
            exit_code,
            log_path: log_path.to_string_lossy().into_owned(),
            artifacts,
            tests: record.tests,
            failures: record.failures,
            suites: report.0,
            diagnostics: report.1,
        })
    }

    /// Merge the settings table with the request's overrides
    fn resolve_settings(&self, request: &BuildRequest) -> Result<BuildSettings, EngineError> {
        let mut bag: PropertyBag = self.db.load_settings()?;
        apply_override(&mut bag, KEY_CONFIGURATION, &request.configuration);
        apply_override(&mut bag, KEY_TARGET, &request.target);
        apply_override(&mut bag, KEY_SDK, &request.sdk);
        Ok(BuildSettings::resolve(&bag))
    }

    /// Scan the project tree and parse every result artifact found
    ///
    /// Returns the artifact count and the (suites, diagnostics) totals. A
    /// bad artifact is logged and skipped, never fatal to the run.
    fn ingest_artifacts(
        &self,
        build_id: &str,
        request: &BuildRequest,
        record: &mut BuildRecord,
    ) -> (usize, (usize, usize)) {
        let mut options = ParseOptions::default();
        if let Some(ref root) = request.data_root {
            options = options.with_data_root(root.clone());
        }

        let mut artifacts = 0;
        let mut suites = 0;
        let mut diagnostics = 0;

        for path in scan_artifacts(&request.project, &request.artifact_suffix) {
            debug!(artifact = %path.display(), "parsing result artifact");
            let mut store = DbStore::new(self.db, build_id);
            match parse_artifact(&path, record, &mut store, &options) {
                Ok(report) => {
                    artifacts += 1;
                    suites += report.suites;
                    diagnostics += report.diagnostics.len();
                    for diagnostic in &report.diagnostics {
                        warn!(artifact = %path.display(), "{diagnostic}");
                    }
                }
                Err(e) => {
                    warn!(artifact = %path.display(), error = %e, "skipping unparseable artifact");
                }
            }
        }

        (artifacts, (suites, diagnostics))
    }
}

fn apply_override(bag: &mut PropertyBag, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        bag.insert(key.to_string(), value.clone());
    }
}
