// Copyright (c) 2026 - present the foreman developers
// SPDX-License-Identifier: MIT

//! foreman-exec: child process execution for foreman builds
//!
//! This library crate runs one build invocation end to end: it resolves the
//! tool-chain parameters from a property bag, spawns the external tool for
//! the clean and build phases, and drains both output streams of each phase
//! into a single persisted log without deadlocking or truncation.
//!
//! # Example
//!
//! ```no_run
//! use foreman_exec::pipeline::BuildPipeline;
//! use foreman_exec::settings::{BuildSettings, PropertyBag};
//! use foreman_results::model::BuildRecord;
//!
//! # async fn run() -> Result<(), foreman_exec::ExecError> {
//! let settings = BuildSettings::resolve(&PropertyBag::new());
//! let mut record = BuildRecord::begin();
//! let pipeline = BuildPipeline::default();
//! let exit = pipeline
//!     .execute(
//!         &settings,
//!         std::path::Path::new("project"),
//!         std::path::Path::new("build.log"),
//!         &mut record,
//!     )
//!     .await?;
//! println!("build exited {exit}");
//! # Ok(())
//! # }
//! ```

pub mod drain;
pub mod error;
pub mod pipeline;
pub mod runner;
pub mod settings;

pub use drain::{DrainState, LogSink, OutputDrain, open_log_sink};
pub use error::ExecError;
pub use pipeline::{BuildPipeline, DEFAULT_TOOL};
pub use runner::{PhaseOutcome, run_phase};
pub use settings::{BuildSettings, PropertyBag};
