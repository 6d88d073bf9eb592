//! Artifact log parsing
//!
//! Build artifacts are plain-text tool-chain logs containing marker lines
//! for suite and test-case boundaries. Parsing is a single pass over the
//! lines with a two-state machine: outside any suite, or inside the suite
//! opened by the most recent suite-open marker. Results are persisted
//! through the [`ResultStore`](crate::store::ResultStore) as they are
//! discovered: each test case immediately, each suite when its close marker
//! arrives.
//!
//! Marker recognition is a fixed leading-prefix check so the overwhelming
//! majority of log lines are rejected without further inspection.
//!
//! # Example
//!
//! ```no_run
//! use foreman_results::model::BuildRecord;
//! use foreman_results::parser::{ParseOptions, parse_artifact};
//! use foreman_results::store::MemoryStore;
//!
//! let mut record = BuildRecord::begin();
//! let mut store = MemoryStore::new();
//! let report = parse_artifact(
//!     std::path::Path::new("build/results.dat"),
//!     &mut record,
//!     &mut store,
//!     &ParseOptions::default(),
//! ).unwrap();
//! println!("parsed {} suites", report.suites);
//! ```

use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::warn;

use crate::error::ParseError;
use crate::model::{BuildRecord, TestCaseResult, TestOutcome, TestSuiteRecord};
use crate::store::ResultStore;

const SUITE_MARKER: &str = "oTest Suite";
const CASE_MARKER: &str = "oTest Case";
const SUMMARY_MARKER: &str = "oExecuted";
const SUITE_OPEN: &str = " started at ";
const SUITE_CLOSE: &str = " finished at ";
const CASE_STARTED_SUFFIX: &str = "started.";
const CASE_PASSED: &str = " passed (";

/// Options controlling artifact parsing
#[derive(Debug, Clone, Default)]
pub struct ParseOptions {
    /// Local data-root path of the build host
    ///
    /// A suite-open line containing this path identifies the wrapper suite
    /// the tool chain emits around the whole run, not a real test suite; it
    /// is never treated as a suite boundary.
    pub data_root: Option<String>,
}

impl ParseOptions {
    /// Set the local data-root path filter
    #[must_use]
    pub fn with_data_root(mut self, path: impl Into<String>) -> Self {
        self.data_root = Some(path.into());
        self
    }
}

/// A recoverable protocol violation observed while parsing
///
/// Diagnostics never abort the scan; the offending line is skipped and the
/// machine state is left intact. They are collected into the
/// [`ParseReport`] so callers and tests can assert on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseDiagnostic {
    /// A suite-close marker arrived with no suite open
    UnmatchedSuiteClose {
        /// Name carried by the close marker
        suite: String,
    },
    /// A test-case marker arrived with no suite open
    OrphanTestCase {
        /// Name carried by the case marker
        test: String,
    },
    /// A suite-open marker arrived while another suite was still open
    AbandonedSuite {
        /// Name of the suite that was dropped unclosed
        suite: String,
    },
    /// A marker line that could not be decomposed (missing quotes or
    /// unparseable elapsed time)
    MalformedLine {
        /// The offending line
        line: String,
    },
}

impl fmt::Display for ParseDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseDiagnostic::UnmatchedSuiteClose { suite } => {
                write!(f, "no test suite to close for '{suite}'")
            }
            ParseDiagnostic::OrphanTestCase { test } => {
                write!(f, "no test suite for test '{test}'")
            }
            ParseDiagnostic::AbandonedSuite { suite } => {
                write!(f, "test suite '{suite}' was never closed")
            }
            ParseDiagnostic::MalformedLine { line } => {
                write!(f, "malformed marker line: {line}")
            }
        }
    }
}

/// Summary of one artifact parse
#[derive(Debug, Default)]
pub struct ParseReport {
    /// Number of suites persisted
    pub suites: usize,
    /// Number of test cases persisted
    pub tests: usize,
    /// Diagnostics emitted, in order
    pub diagnostics: Vec<ParseDiagnostic>,
}

/// Incremental line parser for artifact logs
///
/// Holds the open suite (if any) and the build-wide running totals, seeded
/// from the record so totals accumulate correctly across multiple
/// artifacts.
pub struct ArtifactParser {
    options: ParseOptions,
    current: Option<TestSuiteRecord>,
    total_tests: u32,
    total_failures: u32,
    report: ParseReport,
}

impl ArtifactParser {
    /// Create a parser for one artifact, seeded from the record's totals
    #[must_use]
    pub fn new(options: &ParseOptions, record: &BuildRecord) -> Self {
        Self {
            options: options.clone(),
            current: None,
            total_tests: record.tests,
            total_failures: record.failures,
            report: ParseReport::default(),
        }
    }

    /// Process a single artifact line
    ///
    /// # Errors
    ///
    /// Returns `ParseError::Store` if the store rejects a record. Malformed
    /// lines and protocol violations are diagnostics, not errors.
    pub fn process_line(
        &mut self,
        line: &str,
        record: &mut BuildRecord,
        store: &mut dyn ResultStore,
    ) -> Result<(), ParseError> {
        // cheap rejection for the bulk of the log
        if line.len() <= 1 || !line.starts_with('o') {
            return Ok(());
        }

        if line.starts_with(SUITE_MARKER) && !self.contains_data_root(line) {
            self.suite_marker(line, record, store)?;
        } else if line.starts_with(CASE_MARKER) && !line.ends_with(CASE_STARTED_SUFFIX) {
            self.case_marker(line, store)?;
        } else if line.starts_with(SUMMARY_MARKER) {
            // "Executed N tests" summary; the per-case counters already
            // cover it
        }

        Ok(())
    }

    /// Finish parsing and return the report
    ///
    /// A suite left open at end-of-input is dropped unpersisted, with a
    /// diagnostic.
    #[must_use]
    pub fn into_report(mut self) -> ParseReport {
        if let Some(suite) = self.current.take() {
            self.diagnose(ParseDiagnostic::AbandonedSuite { suite: suite.name });
        }
        self.report
    }

    fn contains_data_root(&self, line: &str) -> bool {
        self.options
            .data_root
            .as_deref()
            .is_some_and(|root| line.contains(root))
    }

    fn diagnose(&mut self, diagnostic: ParseDiagnostic) {
        warn!(%diagnostic, "artifact parse diagnostic");
        self.report.diagnostics.push(diagnostic);
    }

    fn suite_marker(
        &mut self,
        line: &str,
        record: &mut BuildRecord,
        store: &mut dyn ResultStore,
    ) -> Result<(), ParseError> {
        let Some((name, _)) = quoted_name(line) else {
            self.diagnose(ParseDiagnostic::MalformedLine {
                line: line.to_string(),
            });
            return Ok(());
        };

        if line.contains(SUITE_OPEN) {
            if let Some(open) = self.current.take() {
                self.diagnose(ParseDiagnostic::AbandonedSuite { suite: open.name });
            }
            // per-suite counters start from zero for the new suite
            self.current = Some(TestSuiteRecord::new(name));
        } else if line.contains(SUITE_CLOSE) {
            let Some(suite) = self.current.take() else {
                self.diagnose(ParseDiagnostic::UnmatchedSuiteClose {
                    suite: name.to_string(),
                });
                return Ok(());
            };

            store.save_suite(&suite).map_err(ParseError::Store)?;
            record.suites.push(suite);
            record.tests = self.total_tests;
            record.failures = self.total_failures;
            self.report.suites += 1;
        }

        Ok(())
    }

    fn case_marker(&mut self, line: &str, store: &mut dyn ResultStore) -> Result<(), ParseError> {
        let Some((name, name_end)) = quoted_name(line) else {
            self.diagnose(ParseDiagnostic::MalformedLine {
                line: line.to_string(),
            });
            return Ok(());
        };
        let name = name.to_string();

        if self.current.is_none() {
            self.diagnose(ParseDiagnostic::OrphanTestCase { test: name });
            return Ok(());
        }

        let Some(duration_ms) = elapsed_millis(line, name_end) else {
            self.diagnose(ParseDiagnostic::MalformedLine {
                line: line.to_string(),
            });
            return Ok(());
        };

        let outcome = if line.contains(CASE_PASSED) {
            TestOutcome::Passed
        } else {
            TestOutcome::Failed
        };

        let result = TestCaseResult {
            name,
            outcome,
            duration_ms,
            message: None,
        };
        store.save_test(&result).map_err(ParseError::Store)?;

        // the orphan check above guarantees an open suite here
        if let Some(suite) = self.current.as_mut() {
            suite.tests += 1;
            suite.duration_ms += duration_ms;
            self.total_tests += 1;
            if result.failed() {
                suite.failures += 1;
                self.total_failures += 1;
            }
            suite.results.push(result);
        }
        self.report.tests += 1;

        Ok(())
    }
}

/// Extract the name between the first pair of quote delimiters
///
/// Returns the name and the byte offset just past the closing quote.
fn quoted_name(line: &str) -> Option<(&str, usize)> {
    let start = line.find('\'')? + 1;
    let len = line[start..].find('\'')?;
    Some((&line[start..start + len], start + len + 1))
}

/// Extract the elapsed-time token after `from` and convert to milliseconds
///
/// The token sits between the first parenthesis and the following space,
/// as a floating-point number of seconds.
fn elapsed_millis(line: &str, from: usize) -> Option<u64> {
    let open = from + line[from..].find('(')? + 1;
    let len = line[open..].find(' ')?;
    let seconds: f64 = line[open..open + len].parse().ok()?;
    Some((seconds * 1000.0) as u64)
}

/// Parse one artifact file, persisting results through `store` as they are
/// discovered
///
/// # Errors
///
/// Returns `ParseError::Io` if the artifact cannot be read and
/// `ParseError::Store` if the store rejects a record. Both leave the record
/// with whatever was persisted before the failure; neither corrupts the
/// machine state of other artifacts.
pub fn parse_artifact(
    path: &Path,
    record: &mut BuildRecord,
    store: &mut dyn ResultStore,
    options: &ParseOptions,
) -> Result<ParseReport, ParseError> {
    let reader = BufReader::new(File::open(path)?);
    let mut parser = ArtifactParser::new(options, record);

    for line in reader.lines() {
        parser.process_line(&line?, record, store)?;
    }

    Ok(parser.into_report())
}
