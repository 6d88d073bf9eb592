// Copyright (c) 2026 - present the foreman developers
// SPDX-License-Identifier: MIT

//! foreman-results: build artifact scanning and test result parsing
//!
//! This library crate turns the plain-text artifact logs a build tool chain
//! leaves behind into a normalized test-result model. It ships the shared
//! result types, a lazy artifact scanner, and an incremental line parser
//! that persists through an injectable store.
//!
//! # Example
//!
//! ```no_run
//! use foreman_results::model::BuildRecord;
//! use foreman_results::parser::{ParseOptions, parse_artifact};
//! use foreman_results::scanner::scan_artifacts;
//! use foreman_results::store::MemoryStore;
//!
//! let mut record = BuildRecord::begin();
//! let mut store = MemoryStore::new();
//! for artifact in scan_artifacts(std::path::Path::new("build"), ".dat") {
//!     parse_artifact(&artifact, &mut record, &mut store, &ParseOptions::default()).unwrap();
//! }
//! ```

pub mod error;
pub mod model;
pub mod parser;
pub mod scanner;
pub mod store;

pub use error::ParseError;
pub use model::{BuildRecord, BuildStatus, TestCaseResult, TestOutcome, TestSuiteRecord};
pub use parser::{ArtifactParser, ParseDiagnostic, ParseOptions, ParseReport, parse_artifact};
pub use scanner::{ArtifactScan, DEFAULT_ARTIFACT_SUFFIX, scan_artifacts};
pub use store::{MemoryStore, ResultStore};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::error::ParseError;
    pub use crate::model::{BuildRecord, BuildStatus, TestCaseResult, TestOutcome};
    pub use crate::parser::{ParseOptions, parse_artifact};
    pub use crate::scanner::scan_artifacts;
    pub use crate::store::{MemoryStore, ResultStore};
}
