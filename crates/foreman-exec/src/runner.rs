//! Child process execution
//!
//! Runs one build phase: spawn the tool with stdout and stderr piped,
//! attach one drain per pipe, wait for the process to exit, and only then
//! wait for both drains. The ordering is the correctness property the build
//! log depends on: the process exiting does not mean the OS has flushed all
//! buffered pipe data to the drains yet, so reclaiming the child or
//! returning before both drains report completion risks a truncated log.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, info};

use crate::drain::{DrainState, LogSink, OutputDrain};
use crate::error::ExecError;

/// Result of one finished phase
#[derive(Debug)]
pub struct PhaseOutcome {
    /// Exit code of the child (-1 when terminated by a signal)
    pub exit_code: i32,
    /// Completion flag of the stdout drain
    pub stdout_drained: DrainState,
    /// Completion flag of the stderr drain
    pub stderr_drained: DrainState,
}

impl PhaseOutcome {
    /// Whether the phase exited zero
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Whether both output drains finished flushing
    #[must_use]
    pub fn drains_complete(&self) -> bool {
        self.stdout_drained.is_complete() && self.stderr_drained.is_complete()
    }
}

/// Run one phase of the build tool and drain its output into `sink`
///
/// Returns after the child has exited and both drains have flushed. The
/// child is never force-killed: cancelling the surrounding future leaves it
/// running, and the drains keep copying until its pipes close.
///
/// # Errors
///
/// Returns `ExecError::Spawn` if the executable cannot be found or the
/// working directory is invalid, and `ExecError::Io` if waiting on the
/// child fails.
pub async fn run_phase(
    program: &str,
    args: &[String],
    working_dir: &Path,
    sink: &LogSink,
) -> Result<PhaseOutcome, ExecError> {
    debug!(program, ?args, working_dir = %working_dir.display(), "spawning build phase");

    let mut child = Command::new(program)
        .args(args)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(false)
        .spawn()
        .map_err(|source| ExecError::Spawn {
            program: program.to_string(),
            working_dir: working_dir.to_path_buf(),
            source,
        })?;

    let stdout_drain = child
        .stdout
        .take()
        .map(|pipe| OutputDrain::spawn(pipe, sink.clone()));
    let stderr_drain = child
        .stderr
        .take()
        .map(|pipe| OutputDrain::spawn(pipe, sink.clone()));

    // exit first, drain-completion second
    let status = child.wait().await?;

    let stdout_drained = join_drain(stdout_drain).await;
    let stderr_drained = join_drain(stderr_drain).await;

    let exit_code = status.code().unwrap_or(-1);
    info!(program, exit_code, "build phase finished");

    Ok(PhaseOutcome {
        exit_code,
        stdout_drained,
        stderr_drained,
    })
}

async fn join_drain(drain: Option<OutputDrain>) -> DrainState {
    match drain {
        Some(drain) => drain.join().await,
        // no pipe was handed out, so there is nothing left to flush
        None => DrainState::completed(),
    }
}
