//! Builder and executor for restore tool processes.

use crate::constants::{
    DEFAULT_RESTORE_ARGS, DEFAULT_RESTORE_TIMEOUT, DEFAULT_RESTORE_TOOL, EXIT_CODE_LINE_PREFIX,
    OUTPUT_DRAIN_TIMEOUT, SIGNAL_EXIT_CODE,
};
use crate::core::{ReloadError, Result};
use crate::environment::OutputDirs;
use crate::restore::{RestoreRequest, Restorer};
use crate::sink::LogSink;
use crate::utils::fs::remove_output_dir;
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

/// Runs the restore tool for one project at a time.
///
/// Each run:
/// 1. deletes the project's intermediate and output directories, refusing
///    any that contain the project itself
/// 2. spawns `<tool> <args...> <project path>` in the project directory with
///    stdin closed and both output streams piped
/// 3. forwards every non-blank line of either stream, trimmed, to the sink;
///    bytes that are not UTF-8 are replaced, never dropped
/// 4. waits for exit, drains remaining output for at most
///    [`OUTPUT_DRAIN_TIMEOUT`], and appends `Restore command exit code: <code>`
///
/// The exit code is returned, not interpreted. A configured timeout or a
/// cancelled token kills the child.
///
/// # Examples
///
/// ```rust,no_run
/// use restore_tree::environment::OutputDirs;
/// use restore_tree::restore::ProcessRunner;
/// use restore_tree::sink::TracingSink;
/// use std::path::Path;
/// use std::sync::Arc;
///
/// # async fn example() -> restore_tree::core::Result<()> {
/// let project = Path::new("/work/App/App.csproj");
/// let dirs = OutputDirs::resolve(Path::new("/work/App"), "obj", "bin");
/// let code = ProcessRunner::new(Arc::new(TracingSink))
///     .with_timeout(None)
///     .run(project, &dirs)
///     .await?;
/// println!("restore exited with {code}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ProcessRunner {
    /// Executable name or path
    tool: String,

    /// Arguments placed before the project path
    args: Vec<String>,

    /// Maximum duration of one restore (None = no timeout)
    timeout_duration: Option<Duration>,

    /// Destination of forwarded output
    sink: Arc<dyn LogSink>,

    /// Kills the running child when cancelled
    cancel: CancellationToken,
}

impl ProcessRunner {
    /// Runner for the default tool and flags, logging to `sink`.
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            tool: DEFAULT_RESTORE_TOOL.to_string(),
            args: DEFAULT_RESTORE_ARGS.iter().map(ToString::to_string).collect(),
            timeout_duration: Some(DEFAULT_RESTORE_TIMEOUT),
            sink,
            cancel: CancellationToken::new(),
        }
    }

    /// Use `tool` instead of the default executable.
    pub fn with_tool(mut self, tool: impl Into<String>) -> Self {
        self.tool = tool.into();
        self
    }

    /// Replace the arguments placed before the project path.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Set a custom timeout for one restore (None for no timeout)
    pub const fn with_timeout(mut self, duration: Option<Duration>) -> Self {
        self.timeout_duration = duration;
        self
    }

    /// Kill running children when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Restore the project at `project_path`.
    pub async fn run(&self, project_path: &Path, dirs: &OutputDirs) -> Result<i32> {
        let project = project_path.display().to_string();
        if self.cancel.is_cancelled() {
            return Err(ReloadError::Cancelled);
        }

        let project_dir = project_path.parent().unwrap_or_else(|| Path::new("."));
        remove_output_dir(&dirs.base_intermediate, project_dir).await?;
        remove_output_dir(&dirs.base_output, project_dir).await?;

        let mut cmd = Command::new(&self.tool);
        cmd.args(&self.args)
            .arg(project_path)
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            target: "restore",
            "Executing command: {} {} {}",
            self.tool,
            self.args.join(" "),
            project
        );
        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| self.launch_error(&project, &e))?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let finished = {
            let forward = forward_output(stdout, stderr, self.sink.as_ref());
            tokio::pin!(forward);
            let run = async {
                tokio::select! {
                    () = &mut forward => child.wait().await,
                    status = child.wait() => {
                        if tokio::time::timeout(OUTPUT_DRAIN_TIMEOUT, &mut forward).await.is_err() {
                            tracing::debug!(
                                target: "restore",
                                "Output of {project} still open after exit, no longer forwarding"
                            );
                        }
                        status
                    }
                }
            };
            tokio::select! {
                status = run => Ok(status),
                () = self.cancel.cancelled() => Err(ReloadError::Cancelled),
                () = expire(self.timeout_duration) => Err(ReloadError::Timeout {
                    project: project.clone(),
                    seconds: self.timeout_duration.map_or(0, |d| d.as_secs()),
                }),
            }
        };

        let status = match finished {
            Ok(status) => status?,
            Err(e) => {
                tracing::warn!(target: "restore", "Stopping restore of {project}: {e}");
                if let Err(kill_err) = child.kill().await {
                    tracing::debug!(target: "restore", "Failed to kill restore process: {kill_err}");
                }
                return Err(e);
            }
        };

        let code = status.code().unwrap_or(SIGNAL_EXIT_CODE);
        self.sink.append_line(&format!("{EXIT_CODE_LINE_PREFIX} {code}"));
        tracing::debug!(
            target: "restore",
            "Restore of {project} exited with {code} after {:.2}s",
            start.elapsed().as_secs_f64()
        );
        Ok(code)
    }

    fn launch_error(&self, project: &str, error: &std::io::Error) -> ReloadError {
        let reason = if error.kind() == std::io::ErrorKind::NotFound
            && which::which(&self.tool).is_err()
        {
            format!("'{}' was not found on PATH", self.tool)
        } else {
            error.to_string()
        };
        ReloadError::ProcessLaunch {
            tool: self.tool.clone(),
            project: project.to_string(),
            reason,
        }
    }
}

#[async_trait]
impl Restorer for ProcessRunner {
    async fn restore(&self, request: &RestoreRequest) -> Result<i32> {
        self.sink.append_line(&format!("Restoring {}...", request.project_name));
        self.run(&request.project_path, &request.dirs).await
    }
}

async fn expire(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending().await,
    }
}

/// Forward both output streams line by line until both are closed.
async fn forward_output<O, E>(stdout: Option<O>, stderr: Option<E>, sink: &dyn LogSink)
where
    O: AsyncRead + Unpin,
    E: AsyncRead + Unpin,
{
    tokio::join!(forward_stream(stdout, sink), forward_stream(stderr, sink));
}

const MAX_CONSECUTIVE_READ_ERRORS: usize = 3;

async fn forward_stream<R: AsyncRead + Unpin>(stream: Option<R>, sink: &dyn LogSink) {
    let Some(stream) = stream else {
        return;
    };
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    let mut errors = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                errors = 0;
                emit(sink, &String::from_utf8_lossy(&buf));
            }
            Err(e) => {
                errors += 1;
                tracing::warn!(target: "restore", "Error reading restore output: {e}");
                if errors >= MAX_CONSECUTIVE_READ_ERRORS {
                    break;
                }
            }
        }
    }
}

fn emit(sink: &dyn LogSink, line: &str) {
    let line = line.trim();
    if !line.is_empty() {
        sink.append_line(line);
    }
}
