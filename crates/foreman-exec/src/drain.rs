//! Output drains
//!
//! Each phase of a build produces two output streams (stdout and stderr)
//! that must both land in the single build log without blocking the caller
//! or deadlocking the child on a full pipe. A drain is a fire-and-forget
//! task that copies one stream to the shared sink line by line and marks a
//! completion flag exactly once when the stream reaches end-of-input.
//!
//! The sink mutex serializes the two drains of a phase so concurrent writes
//! never interleave partial lines.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

/// Shared append point for the build log
///
/// One sink is shared by all drains of a pipeline; the mutex is the single
/// serialized writer the log format depends on.
pub type LogSink = Arc<Mutex<File>>;

/// Open a log sink in append mode, creating the file if needed
///
/// # Errors
///
/// Returns the underlying OS error if the file cannot be opened.
pub async fn open_log_sink(path: &Path) -> std::io::Result<LogSink> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await?;
    Ok(Arc::new(Mutex::new(file)))
}

/// Append one line to the sink
///
/// Used by drains and by the pipeline itself for error traces that belong
/// in the build log.
pub async fn append_line(sink: &LogSink, line: &str) -> std::io::Result<()> {
    let mut file = sink.lock().await;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    // tokio files buffer internally; push the line out while we hold the lock
    file.flush().await
}

/// Completion flag of one drain
///
/// Set exactly once, when the drain has copied all available output and its
/// source stream reached end-of-input. Cheap to clone and safe to query
/// from any task.
#[derive(Debug, Clone, Default)]
pub struct DrainState(Arc<AtomicBool>);

impl DrainState {
    /// A flag that is already complete, for streams that were never handed
    /// out
    #[must_use]
    pub fn completed() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    fn mark_complete(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Check whether the drain has finished flushing
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// A running copy task from one child output stream to the log sink
pub struct OutputDrain {
    state: DrainState,
    task: JoinHandle<()>,
}

impl OutputDrain {
    /// Start draining `source` into `sink`
    ///
    /// The task runs independently of the caller. Lines are read as raw
    /// bytes and decoded lossily, so a tool emitting non-UTF-8 output never
    /// truncates the log. Write failures are logged and do not stall the
    /// drain; a read error ends the drain the same way end-of-input does,
    /// so a waiting runner can never block on it indefinitely.
    pub fn spawn<R>(source: R, sink: LogSink) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let state = DrainState::default();
        let flag = state.clone();

        let task = tokio::spawn(async move {
            let mut reader = BufReader::new(source);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                match reader.read_until(b'\n', &mut buf).await {
                    Ok(0) => break,
                    Ok(_) => {
                        while buf.last().is_some_and(|b| *b == b'\n' || *b == b'\r') {
                            buf.pop();
                        }
                        let line = String::from_utf8_lossy(&buf);
                        if let Err(error) = append_line(&sink, &line).await {
                            warn!(%error, "failed to append to build log");
                        }
                    }
                    Err(error) => {
                        warn!(%error, "build output stream closed with error");
                        break;
                    }
                }
            }
            flag.mark_complete();
        });

        Self { state, task }
    }

    /// Handle to the completion flag
    #[must_use]
    pub fn state(&self) -> DrainState {
        self.state.clone()
    }

    /// Check whether the drain has finished flushing
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state.is_complete()
    }

    /// Wait for the drain to finish and return its completion flag
    pub async fn join(self) -> DrainState {
        // a panicked drain task still must not wedge the runner
        let _ = self.task.await;
        self.state
    }
}
