//! Persistence seam for parsed results
//!
//! The parser persists records as it discovers them through a store handle
//! that is passed in explicitly. This keeps the persistence context scoped
//! to one build invocation rather than living in ambient global state, and
//! lets tests capture every persisted record in memory.

use crate::model::{TestCaseResult, TestSuiteRecord};

/// Destination for incrementally persisted test records
///
/// `save_test` is called once per test case, as soon as the case line is
/// parsed. `save_suite` is called once per suite, when the matching
/// suite-close line is parsed; by then every test of the suite has already
/// been saved.
pub trait ResultStore {
    /// Persist one test case result
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store rejects the record.
    fn save_test(&mut self, test: &TestCaseResult) -> anyhow::Result<()>;

    /// Persist one finalized test suite
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying store rejects the record.
    fn save_suite(&mut self, suite: &TestSuiteRecord) -> anyhow::Result<()>;
}

/// In-memory store that records everything it is given
///
/// Used by tests and dry runs to observe the persistence order without a
/// database.
#[derive(Debug, Default)]
pub struct MemoryStore {
    /// Test cases in the order they were saved
    pub tests: Vec<TestCaseResult>,
    /// Suites in the order they were saved
    pub suites: Vec<TestSuiteRecord>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultStore for MemoryStore {
    fn save_test(&mut self, test: &TestCaseResult) -> anyhow::Result<()> {
        self.tests.push(test.clone());
        Ok(())
    }

    fn save_suite(&mut self, suite: &TestSuiteRecord) -> anyhow::Result<()> {
        self.suites.push(suite.clone());
        Ok(())
    }
}
