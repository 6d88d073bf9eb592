// Copyright (c) 2026 - present the foreman developers
// SPDX-License-Identifier: MIT

//! Test utilities for foreman integration tests
//!
//! This module provides utilities for:
//! - Temporary directory management
//! - Fake build-tool scaffolding (shell-script stand-ins for xcodebuild)
//! - Result-artifact fixtures
//! - Environment isolation

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};

// ============================================================================
// Temporary Directory Management
// ============================================================================

/// Counter for generating unique test directory names
static TEST_DIR_COUNTER: AtomicU32 = AtomicU32::new(0);

/// A temporary directory that is automatically cleaned up when dropped
///
/// This provides a unique, isolated directory for each test to avoid
/// interference between concurrent tests.
pub struct TempTestDir {
    path: PathBuf,
    cleanup: bool,
}

impl TempTestDir {
    /// Create a new temporary test directory
    ///
    /// The directory is created under the system temp directory with a
    /// unique name based on the test name and a counter.
    pub fn new(test_name: &str) -> Self {
        let counter = TEST_DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir_name = format!(
            "foreman-test-{}-{}-{}",
            test_name,
            std::process::id(),
            counter
        );
        let path = std::env::temp_dir().join(dir_name);

        fs::create_dir_all(&path).expect("Failed to create temp test directory");

        Self {
            path,
            cleanup: true,
        }
    }

    /// Get the path to the temporary directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create a subdirectory within the temp directory
    #[allow(dead_code)]
    pub fn create_subdir(&self, name: &str) -> PathBuf {
        let subdir = self.path.join(name);
        fs::create_dir_all(&subdir).expect("Failed to create subdirectory");
        subdir
    }

    /// Create a file within the temp directory with the given content
    pub fn create_file(&self, relative_path: &str, content: &str) -> PathBuf {
        let file_path = self.path.join(relative_path);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&file_path, content).expect("Failed to write file");
        file_path
    }

    /// Read a file from the temp directory
    #[allow(dead_code)]
    pub fn read_file(&self, relative_path: &str) -> String {
        let file_path = self.path.join(relative_path);
        fs::read_to_string(&file_path).expect("Failed to read file")
    }

    /// Check if a file exists in the temp directory
    #[allow(dead_code)]
    pub fn file_exists(&self, relative_path: &str) -> bool {
        self.path.join(relative_path).exists()
    }
}

impl Drop for TempTestDir {
    fn drop(&mut self) {
        if self.cleanup && self.path.exists() {
            let _ = fs::remove_dir_all(&self.path);
        }
    }
}

// ============================================================================
// Fake Build Tool Scaffolding
// ============================================================================

/// Write an executable shell script standing in for the build tool
///
/// Returns the absolute path to pass as the `tool` of a build request.
#[cfg(unix)]
#[allow(dead_code)]
pub fn write_tool_script(dir: &TempTestDir, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.create_file(name, &format!("#!/bin/sh\n{body}\n"));
    let mut perms = fs::metadata(&path)
        .expect("Failed to stat tool script")
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).expect("Failed to mark tool script executable");
    path
}

/// A tool that echoes its phase and succeeds
#[allow(dead_code)]
pub const ECHO_TOOL: &str = r#"echo "phase:$*""#;

/// A tool that fails during the clean phase
#[allow(dead_code)]
pub const FAILING_CLEAN_TOOL: &str = r#"if [ "$1" = "clean" ]; then exit 2; fi
echo "phase:$*""#;

/// A tool that cleans fine but fails the build phase
#[allow(dead_code)]
pub const FAILING_BUILD_TOOL: &str = r#"if [ "$1" = "clean" ]; then echo "phase:clean"; exit 0; fi
exit 65"#;

// ============================================================================
// Result-Artifact Fixtures
// ============================================================================

/// A result artifact with one suite of two tests, one of them failing
#[allow(dead_code)]
pub fn mixed_suite_artifact() -> String {
    [
        "oTest Suite 'LoginTests' started at 2026-08-28 10:00:00",
        "oTest Case '-[LoginTests testGoodPassword]' started.",
        "oTest Case '-[LoginTests testGoodPassword]' passed (0.25 seconds).",
        "oTest Case '-[LoginTests testBadPassword]' started.",
        "oTest Case '-[LoginTests testBadPassword]' failed (1.5 seconds).",
        "oTest Suite 'LoginTests' finished at 2026-08-28 10:00:02",
        "",
    ]
    .join("\n")
}

/// A result artifact with one suite of passing tests
#[allow(dead_code)]
pub fn passing_suite_artifact(suite: &str, cases: usize) -> String {
    let mut lines = vec![format!("oTest Suite '{suite}' started at 2026-08-28 09:00:00")];
    for i in 0..cases {
        lines.push(format!("oTest Case '-[{suite} testCase{i}]' started."));
        lines.push(format!(
            "oTest Case '-[{suite} testCase{i}]' passed (0.1 seconds)."
        ));
    }
    lines.push(format!(
        "oTest Suite '{suite}' finished at 2026-08-28 09:00:05"
    ));
    lines.push(String::new());
    lines.join("\n")
}

// ============================================================================
// Environment Isolation
// ============================================================================

/// Temporarily set an environment variable for a test
///
/// The original value is restored when the guard is dropped.
#[allow(dead_code)]
pub struct EnvGuard {
    key: String,
    original: Option<String>,
}

#[allow(dead_code)]
impl EnvGuard {
    /// Set an environment variable, returning a guard that restores it on drop
    pub fn set(key: &str, value: &str) -> Self {
        let original = std::env::var(key).ok();
        // SAFETY: We're in test code and control the environment variable access
        unsafe { std::env::set_var(key, value) };
        Self {
            key: key.to_string(),
            original,
        }
    }

    /// Remove an environment variable, returning a guard that restores it on drop
    pub fn remove(key: &str) -> Self {
        let original = std::env::var(key).ok();
        // SAFETY: We're in test code and control the environment variable access
        unsafe { std::env::remove_var(key) };
        Self {
            key: key.to_string(),
            original,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // SAFETY: We're in test code and control the environment variable access
        unsafe {
            match &self.original {
                Some(val) => std::env::set_var(&self.key, val),
                None => std::env::remove_var(&self.key),
            }
        }
    }
}

// ============================================================================
// Unit Tests for Utilities
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utils_temp_dir_creation() {
        let temp = TempTestDir::new("test_creation");
        assert!(temp.path().exists());
        assert!(temp.path().is_dir());
    }

    #[test]
    fn test_utils_temp_dir_cleanup() {
        let path;
        {
            let temp = TempTestDir::new("test_cleanup");
            path = temp.path().to_path_buf();
            assert!(path.exists());
        }
        // Directory should be cleaned up after drop
        assert!(!path.exists());
    }

    #[test]
    fn test_utils_temp_dir_create_file() {
        let temp = TempTestDir::new("test_create_file");
        let file_path = temp.create_file("subdir/test.txt", "hello world");

        assert!(file_path.exists());
        assert_eq!(temp.read_file("subdir/test.txt"), "hello world");
    }

    #[test]
    fn test_utils_artifact_fixture_shape() {
        let artifact = mixed_suite_artifact();
        assert!(artifact.starts_with("oTest Suite"));
        assert!(artifact.contains("failed (1.5 seconds)"));
        assert_eq!(artifact.lines().count(), 6);
    }

    #[cfg(unix)]
    #[test]
    fn test_utils_tool_script_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempTestDir::new("test_tool_script");
        let path = write_tool_script(&temp, "fake-tool", ECHO_TOOL);
        let mode = fs::metadata(&path).expect("stat").permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
