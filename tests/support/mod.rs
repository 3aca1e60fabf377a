//! Test support utilities for stagehand integration tests.
//!
//! Provides reusable test environment setup and helper commands.

#![allow(dead_code)]

pub mod assertions;

#[allow(unused_imports)]
pub use assertions::*;

use std::process::Output;

use tempfile::TempDir;

/// Test environment with an isolated temp project directory.
///
/// No process-global state is mutated; child processes use
/// `.current_dir()` so tests can safely run in parallel.
pub struct Test {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        Self { dir }
    }

    /// Create a test environment with a project initialized: stages
    /// `dev` and `prod`, regions `us-east`/`us-west` under `prod`.
    pub fn init() -> Self {
        let t = Self::new();
        let output = t
            .cmd()
            .args([
                "init",
                "--name",
                "demo",
                "--stage",
                "dev",
                "--stage",
                "prod",
                "--region",
                "prod:us-east",
                "--region",
                "prod:us-west",
            ])
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "failed to initialize project: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        t
    }

    /// Base command pointed at the test project directory.
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("stagehand").unwrap();
        cmd.current_dir(self.dir.path());
        cmd.env("NO_COLOR", "1");
        cmd
    }

    /// Set a plain stage variable.
    pub fn set_stage(&self, stage: &str, key: &str, value: &str) -> Output {
        self.cmd()
            .args([
                "variables", "set", "-t", "stage", "-s", stage, "-k", key, "-v", value,
            ])
            .output()
            .unwrap()
    }

    /// Set a plain common variable.
    pub fn set_common(&self, key: &str, value: &str) -> Output {
        self.cmd()
            .args(["variables", "set", "-t", "common", "-k", key, "-v", value])
            .output()
            .unwrap()
    }

    /// List everything.
    pub fn list_all(&self) -> Output {
        self.cmd()
            .args(["variables", "list", "--all"])
            .output()
            .unwrap()
    }

    /// Path to a common or stage scope's variables file.
    pub fn variables_file(&self, name: &str) -> std::path::PathBuf {
        self.dir
            .path()
            .join(".stagehand/variables")
            .join(format!("{}.toml", name))
    }

    /// Path to a region scope's variables file.
    pub fn region_variables_file(&self, stage: &str, region: &str) -> std::path::PathBuf {
        self.dir
            .path()
            .join(".stagehand/variables")
            .join(stage)
            .join(format!("{}.toml", region))
    }
}
