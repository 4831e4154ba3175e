//! Common test utilities for cohort integration tests.
//!
//! Provides `TestEnv` for isolated test environments that don't touch
//! the user's `~/.local/share/cohort/` directory.

#![allow(dead_code)]

use assert_cmd::Command;
pub use tempfile::TempDir;

/// A test environment with an isolated data directory.
///
/// The `ct()` method returns a `Command` that sets `COHORT_DATA_DIR`
/// per-invocation, making tests parallel-safe.
pub struct TestEnv {
    pub data_dir: TempDir,
}

impl TestEnv {
    /// Create a new test environment with an isolated data directory.
    pub fn new() -> Self {
        Self {
            data_dir: TempDir::new().unwrap(),
        }
    }

    /// Create a new test environment and initialize cohort.
    pub fn init() -> Self {
        let env = Self::new();
        env.ct().args(["system", "init"]).assert().success();
        env
    }

    /// Get a Command for the ct binary with the isolated data directory.
    pub fn ct(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ct"));
        cmd.env("COHORT_DATA_DIR", self.data_dir.path());
        cmd
    }

    /// Get the path to the data directory.
    pub fn data_path(&self) -> &std::path::Path {
        self.data_dir.path()
    }

    /// Add a study enrolled 45/100 running 2024-01-10 to 2026-06-01.
    pub fn add_study(&self, id: &str, title: &str, phase: &str, status: &str) {
        self.ct()
            .args([
                "study", "add", id, title, "--phase", phase, "--status", status, "--target",
                "100", "--current", "45", "--start", "2024-01-10", "--end", "2026-06-01",
            ])
            .assert()
            .success();
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}
