//! Two-phase build pipeline
//!
//! A build is exactly two tool invocations in strict sequence onto one
//! append-mode log: a fixed `clean`, then the configured build. The second
//! phase runs only if the clean exited zero. Whatever happens, the record
//! is finalized with an end time and a terminal status before control
//! returns to the caller.

use std::path::Path;

use tracing::{info, warn};

use foreman_results::model::{BuildRecord, BuildStatus};

use crate::drain::{LogSink, append_line, open_log_sink};
use crate::error::ExecError;
use crate::runner::run_phase;
use crate::settings::BuildSettings;

/// Default build tool invoked by the pipeline
pub const DEFAULT_TOOL: &str = "xcodebuild";

/// Orchestrates the clean and build phases of one invocation
#[derive(Debug, Clone)]
pub struct BuildPipeline {
    tool: String,
}

impl BuildPipeline {
    /// Create a pipeline invoking the given tool executable
    #[must_use]
    pub fn new(tool: impl Into<String>) -> Self {
        Self { tool: tool.into() }
    }

    /// The tool executable this pipeline invokes
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Run the clean and build phases, finalizing `record` on every path
    ///
    /// Returns the exit code of the last attempted phase. The record is
    /// marked `Succeeded` only when that code is zero; a launch or log
    /// failure marks it `Failed` before the error propagates, so the caller
    /// always holds a finalized best-effort record.
    ///
    /// # Errors
    ///
    /// Returns `ExecError::LogFile` if the log cannot be opened at all and
    /// `ExecError::Spawn` if a phase cannot be launched.
    pub async fn execute(
        &self,
        settings: &BuildSettings,
        working_dir: &Path,
        log_path: &Path,
        record: &mut BuildRecord,
    ) -> Result<i32, ExecError> {
        let sink = match open_log_sink(log_path).await {
            Ok(sink) => sink,
            Err(source) => {
                record.finish(BuildStatus::Failed);
                return Err(ExecError::LogFile {
                    path: log_path.to_path_buf(),
                    source,
                });
            }
        };

        match self.run_phases(settings, working_dir, &sink).await {
            Ok(exit_code) => {
                let status = if exit_code == 0 {
                    BuildStatus::Succeeded
                } else {
                    BuildStatus::Failed
                };
                record.finish(status);
                info!(tool = %self.tool, exit_code, status = status.as_str(), "build pipeline finished");
                Ok(exit_code)
            }
            Err(error) => {
                // the failure belongs in the build log too, when the log
                // is still writable
                if let Err(write_error) = append_line(&sink, &error.to_string()).await {
                    warn!(%write_error, "could not record launch failure in build log");
                }
                record.finish(BuildStatus::Failed);
                Err(error)
            }
        }
    }

    async fn run_phases(
        &self,
        settings: &BuildSettings,
        working_dir: &Path,
        sink: &LogSink,
    ) -> Result<i32, ExecError> {
        // phase 1: clean, ignoring the resolved settings
        let clean = run_phase(&self.tool, &["clean".to_string()], working_dir, sink).await?;
        if !clean.success() {
            warn!(exit_code = clean.exit_code, "clean phase failed; skipping build phase");
            return Ok(clean.exit_code);
        }

        // phase 2: build with the configured flag pairs
        let build = run_phase(&self.tool, &settings.build_args(), working_dir, sink).await?;
        Ok(build.exit_code)
    }
}

impl Default for BuildPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_TOOL)
    }
}
