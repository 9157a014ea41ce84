//! Recording fakes and on-disk workspace fixtures.

use crate::core::{ReloadError, Result};
use crate::restore::{RestoreRequest, Restorer};
use crate::sink::LogSink;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// [`LogSink`] that keeps every appended line.
#[derive(Debug, Default)]
pub struct RecordingSink {
    lines: Mutex<Vec<String>>,
}

impl RecordingSink {
    /// Empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines appended so far.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }
}

impl LogSink for RecordingSink {
    fn append_line(&self, line: &str) {
        self.lines.lock().unwrap().push(line.to_string());
    }
}

#[derive(Debug, Default)]
struct RestorerScript {
    restored: Vec<String>,
    events: Vec<String>,
    failures: HashSet<String>,
    exit_codes: HashMap<String, i32>,
    cancel_after: HashMap<String, CancellationToken>,
    delay: Option<Duration>,
}

/// [`Restorer`] that records requests instead of spawning processes.
///
/// Each call logs `start <Name>` and `end <Name>` events, optionally sleeps in
/// between, and tracks the highest number of overlapping calls.
#[derive(Debug, Default)]
pub struct RecordingRestorer {
    script: Mutex<RestorerScript>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl RecordingRestorer {
    /// Restorer that succeeds with exit code 0 for every project.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleep for `delay` inside every call.
    pub fn set_delay(&self, delay: Duration) {
        self.script.lock().unwrap().delay = Some(delay);
    }

    /// Return a launch error for project `name`.
    pub fn fail_for(&self, name: &str) {
        self.script.lock().unwrap().failures.insert(name.to_string());
    }

    /// Report `code` as the exit code for project `name`.
    pub fn exit_code_for(&self, name: &str, code: i32) {
        self.script.lock().unwrap().exit_codes.insert(name.to_string(), code);
    }

    /// Cancel `token` once project `name` has been restored.
    pub fn cancel_after(&self, name: &str, token: CancellationToken) {
        self.script.lock().unwrap().cancel_after.insert(name.to_string(), token);
    }

    /// Names of projects whose restore completed, in completion order.
    #[must_use]
    pub fn restored_names(&self) -> Vec<String> {
        self.script.lock().unwrap().restored.clone()
    }

    /// Start and end events, in order.
    #[must_use]
    pub fn events(&self) -> Vec<String> {
        self.script.lock().unwrap().events.clone()
    }

    /// Highest number of restores that overlapped.
    #[must_use]
    pub fn max_concurrency(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Restorer for RecordingRestorer {
    async fn restore(&self, request: &RestoreRequest) -> Result<i32> {
        let name = request.project_name.clone();
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);

        let delay = {
            let mut script = self.script.lock().unwrap();
            script.events.push(format!("start {name}"));
            script.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        let mut script = self.script.lock().unwrap();
        script.events.push(format!("end {name}"));
        if script.failures.contains(&name) {
            return Err(ReloadError::ProcessLaunch {
                tool: "fake".to_string(),
                project: name,
                reason: "simulated launch failure".to_string(),
            });
        }
        let code = script.exit_codes.get(&name).copied().unwrap_or(0);
        script.restored.push(name.clone());
        if let Some(token) = script.cancel_after.get(&name) {
            token.cancel();
        }
        Ok(code)
    }
}

/// A directory of MSBuild-style project files.
///
/// # Example
///
/// ```rust,no_run
/// use restore_tree::test_utils::WorkspaceFixture;
///
/// let ws = WorkspaceFixture::new();
/// ws.project("Core", &[]);
/// ws.project("App", &["Core"]);
/// ```
pub struct WorkspaceFixture {
    temp: TempDir,
}

impl Default for WorkspaceFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkspaceFixture {
    /// Empty workspace in a fresh temporary directory.
    ///
    /// # Panics
    ///
    /// Panics if the directory cannot be created.
    #[must_use]
    pub fn new() -> Self {
        Self {
            temp: TempDir::new().expect("create workspace dir"),
        }
    }

    /// Workspace root.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.temp.path()
    }

    /// Write `<Name>/<Name>.csproj` referencing the `.csproj` projects named in
    /// `references`.
    pub fn project(&self, name: &str, references: &[&str]) -> PathBuf {
        self.project_file(name, "csproj", references, "")
    }

    /// Write `<Name>/<Name>.<extension>` with project references and extra
    /// property XML placed inside a `PropertyGroup`.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn project_file(
        &self,
        name: &str,
        extension: &str,
        references: &[&str],
        properties: &str,
    ) -> PathBuf {
        let dir = self.path().join(name);
        std::fs::create_dir_all(&dir).expect("create project dir");

        let items: String = references
            .iter()
            .map(|r| format!("    <ProjectReference Include=\"..\\{r}\\{r}.csproj\" />\n"))
            .collect();
        let contents = format!(
            "<Project Sdk=\"Microsoft.NET.Sdk\">\n  <PropertyGroup>\n    <TargetFramework>net8.0</TargetFramework>\n{properties}  </PropertyGroup>\n  <ItemGroup>\n{items}  </ItemGroup>\n</Project>\n"
        );

        let path = dir.join(format!("{name}.{extension}"));
        std::fs::write(&path, contents).expect("write project file");
        path
    }
}
