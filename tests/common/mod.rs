//! Common test utilities for rtree integration tests

// Not every helper is used by every test file
#![allow(dead_code)]

use anyhow::{Context, Result};
use restore_tree::test_utils::WorkspaceFixture;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A workspace of project files plus an isolated configuration file.
pub struct TestWorkspace {
    fixture: WorkspaceFixture,
    config_dir: tempfile::TempDir,
}

impl TestWorkspace {
    /// Create an empty workspace.
    pub fn new() -> Result<Self> {
        Ok(Self {
            fixture: WorkspaceFixture::new(),
            config_dir: tempfile::TempDir::new()?,
        })
    }

    /// Workspace root
    pub fn path(&self) -> &Path {
        self.fixture.path()
    }

    /// Add `<Name>/<Name>.csproj` referencing `references`.
    pub fn project(&self, name: &str, references: &[&str]) -> PathBuf {
        self.fixture.project(name, references)
    }

    /// Add a project with a custom extension.
    pub fn project_with_extension(&self, name: &str, extension: &str) -> PathBuf {
        self.fixture.project_file(name, extension, &[], "")
    }

    /// Add `<Name>/<Name>.csproj` with extra `PropertyGroup` content.
    pub fn project_with_properties(&self, name: &str, properties: &str) -> PathBuf {
        self.fixture.project_file(name, "csproj", &[], properties)
    }

    /// Location of the configuration file used by [`run_rtree`](Self::run_rtree).
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.path().join("config.toml")
    }

    /// Write the configuration file.
    pub fn write_config(&self, content: &str) -> Result<()> {
        std::fs::write(self.config_path(), content)?;
        Ok(())
    }

    /// Configure `sh -c <script>` as the restore tool.
    pub fn use_shell_tool(&self, script: &str) -> Result<()> {
        self.write_config(&format!(
            "tool = \"sh\"\ntool_args = [\"-c\", {script:?}, \"sh\"]\nmax_parallel = 2\n"
        ))
    }

    /// An `assert_cmd` command for rtree inside the workspace directory.
    pub fn rtree(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(env!("CARGO_BIN_EXE_rtree"));
        cmd.current_dir(self.path())
            .env("RESTORE_TREE_CONFIG", self.config_path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG");
        cmd
    }

    /// Run rtree inside the workspace directory.
    pub fn run_rtree(&self, args: &[&str]) -> Result<CommandOutput> {
        let output = Command::new(env!("CARGO_BIN_EXE_rtree"))
            .args(args)
            .current_dir(self.path())
            .env("RESTORE_TREE_CONFIG", self.config_path())
            .env("NO_COLOR", "1")
            .env_remove("RUST_LOG")
            .output()
            .context("Failed to run rtree command")?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        })
    }
}

/// Command output helper
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub success: bool,
    pub code: Option<i32>,
}

impl CommandOutput {
    /// Assert the command succeeded
    pub fn assert_success(&self) -> &Self {
        assert!(
            self.success,
            "Command failed with code {:?}\nStdout: {}\nStderr: {}",
            self.code, self.stdout, self.stderr
        );
        self
    }

    /// Assert the command failed
    pub fn assert_failure(&self) -> &Self {
        assert!(!self.success, "Command unexpectedly succeeded\nStdout: {}", self.stdout);
        self
    }

    /// Assert stdout contains the given text
    pub fn assert_stdout_contains(&self, text: &str) -> &Self {
        assert!(
            self.stdout.contains(text),
            "Expected stdout to contain '{}'\nActual stdout: {}",
            text,
            self.stdout
        );
        self
    }

    /// Assert stderr contains the given text
    pub fn assert_stderr_contains(&self, text: &str) -> &Self {
        assert!(
            self.stderr.contains(text),
            "Expected stderr to contain '{}'\nActual stderr: {}",
            text,
            self.stderr
        );
        self
    }
}
