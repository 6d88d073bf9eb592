//! Build and test result types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status of one build attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BuildStatus {
    /// Build is still executing
    Running,
    /// All attempted phases exited zero
    Succeeded,
    /// The last attempted phase exited non-zero, or the build could not run
    Failed,
}

impl BuildStatus {
    /// Stable string form used in the database and CLI output
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            BuildStatus::Running => "running",
            BuildStatus::Succeeded => "succeeded",
            BuildStatus::Failed => "failed",
        }
    }
}

/// Possible test outcomes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestOutcome {
    /// Test passed
    Passed,
    /// Test failed
    Failed,
}

/// Represents a single test case outcome
///
/// Immutable once constructed; persisted individually as it is parsed and
/// then appended to its parent suite's sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCaseResult {
    /// Test name
    pub name: String,
    /// Test outcome
    pub outcome: TestOutcome,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Optional failure message or captured output
    pub message: Option<String>,
}

impl TestCaseResult {
    /// Check if the test failed
    #[must_use]
    pub fn failed(&self) -> bool {
        self.outcome == TestOutcome::Failed
    }
}

/// One named test suite within a build
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteRecord {
    /// Suite name
    pub name: String,
    /// Number of test cases in the suite
    pub tests: u32,
    /// Number of failed test cases
    pub failures: u32,
    /// Cumulative duration in milliseconds
    pub duration_ms: u64,
    /// Ordered test case results
    pub results: Vec<TestCaseResult>,
}

impl TestSuiteRecord {
    /// Create an empty suite with the given name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: 0,
            failures: 0,
            duration_ms: 0,
            results: Vec::new(),
        }
    }
}

/// One build attempt
///
/// Created before the pipeline starts and finalized exactly once when the
/// pipeline concludes. Mutated only by the pipeline and the result parser
/// during the life of one invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    /// When the build started
    pub started_at: DateTime<Utc>,
    /// When the build finished (None while running)
    pub finished_at: Option<DateTime<Utc>>,
    /// Current status
    pub status: BuildStatus,
    /// Aggregate test count across all parsed suites
    pub tests: u32,
    /// Aggregate failure count across all parsed suites
    pub failures: u32,
    /// Ordered sequence of parsed suites
    pub suites: Vec<TestSuiteRecord>,
}

impl BuildRecord {
    /// Start a new build record with status `Running`
    #[must_use]
    pub fn begin() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            status: BuildStatus::Running,
            tests: 0,
            failures: 0,
            suites: Vec::new(),
        }
    }

    /// Finalize the record with an end time and terminal status
    ///
    /// Finalization happens exactly once; later calls are ignored so an
    /// error path that has already marked the build failed cannot be
    /// overwritten.
    pub fn finish(&mut self, status: BuildStatus) {
        if self.finished_at.is_none() {
            self.finished_at = Some(Utc::now());
            self.status = status;
        }
    }

    /// Check if the record has been finalized
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }
}

impl Default for BuildRecord {
    fn default() -> Self {
        Self::begin()
    }
}
