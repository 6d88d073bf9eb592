//! Artifact discovery
//!
//! After the build phases finish, the working directory is walked for
//! tool-chain-produced artifact files, selected by filename suffix. The walk
//! is lazy and restartable; scanning twice yields the same files.

use std::fs::{self, ReadDir};
use std::path::{Path, PathBuf};

/// Default artifact suffix produced by the tool chain
pub const DEFAULT_ARTIFACT_SUFFIX: &str = ".dat";

/// Lazy depth-first walk over artifact files
///
/// Directories that cannot be listed are treated as empty rather than
/// failing the scan.
pub struct ArtifactScan {
    suffix: String,
    stack: Vec<ReadDir>,
    pending: Option<PathBuf>,
}

/// Scan `root` recursively for regular files whose name ends with `suffix`
///
/// If `root` itself is a matching regular file it is yielded once, matching
/// the recursive walk this scan replaces.
#[must_use]
pub fn scan_artifacts(root: &Path, suffix: &str) -> ArtifactScan {
    let mut stack = Vec::new();
    let mut pending = None;

    if root.is_dir() {
        if let Ok(entries) = fs::read_dir(root) {
            stack.push(entries);
        }
    } else if root.is_file() && matches_suffix(root, suffix) {
        pending = Some(root.to_path_buf());
    }

    ArtifactScan {
        suffix: suffix.to_string(),
        stack,
        pending,
    }
}

fn matches_suffix(path: &Path, suffix: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.ends_with(suffix))
}

impl Iterator for ArtifactScan {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        if let Some(path) = self.pending.take() {
            return Some(path);
        }

        while let Some(entries) = self.stack.last_mut() {
            match entries.next() {
                Some(Ok(entry)) => {
                    let path = entry.path();
                    match entry.file_type() {
                        Ok(kind) if kind.is_dir() => {
                            if let Ok(sub) = fs::read_dir(&path) {
                                self.stack.push(sub);
                            }
                        }
                        Ok(kind) if kind.is_file() => {
                            if matches_suffix(&path, &self.suffix) {
                                return Some(path);
                            }
                        }
                        // symlinks and unstat-able entries are skipped
                        _ => {}
                    }
                }
                Some(Err(_)) => {}
                None => {
                    self.stack.pop();
                }
            }
        }

        None
    }
}
