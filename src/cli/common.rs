//! Shared setup and output helpers for the CLI commands.

use crate::config::RestoreConfig;
use crate::environment::{ProjectEnvironment, WorkspaceEnvironment, WorkspaceHandle};
use crate::main_thread::MainThread;
use crate::orchestrator::{NodeStatus, ReloadReport};
use crate::restore::ProcessRunner;
use crate::selection::SelectedItem;
use crate::sink::{ConsoleSink, DispatchingSink, LogSink, TracingSink};
use anyhow::{Context, Result};
use clap::ValueEnum;
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// How command results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text with tool output streamed to stdout
    #[default]
    Text,
    /// A single JSON document on stdout; tool output goes to the log
    Json,
}

/// Everything a command needs to talk to the workspace.
pub struct CommandContext {
    pub config: RestoreConfig,
    pub environment: Arc<WorkspaceEnvironment>,
    pub main_thread: MainThread,
    pub cancel: CancellationToken,
}

impl CommandContext {
    /// Load configuration and scan the workspace.
    pub async fn load(config_path: Option<PathBuf>, workspace: Option<PathBuf>) -> Result<Self> {
        let config = RestoreConfig::load_with_optional(config_path).await?;

        let root = match workspace {
            Some(root) => root,
            None => std::env::current_dir().context("Failed to read current directory")?,
        };
        let environment = WorkspaceEnvironment::discover(&root)
            .with_context(|| format!("Failed to scan workspace {}", root.display()))?;
        tracing::debug!("Workspace {} has {} projects", environment.root().display(), environment.len());

        Ok(Self {
            config,
            environment: Arc::new(environment),
            main_thread: MainThread::spawn()?,
            cancel: CancellationToken::new(),
        })
    }

    /// Resolve user-supplied project paths to workspace handles.
    pub fn handles(&self, projects: &[PathBuf]) -> Result<Vec<WorkspaceHandle>> {
        projects
            .iter()
            .map(|path| {
                self.environment.handle_for(path).with_context(|| {
                    format!("'{}' is not a project of workspace {}", path.display(), self.environment.root().display())
                })
            })
            .collect()
    }

    /// Selection items describing `handles`.
    pub fn selection(&self, handles: &[WorkspaceHandle]) -> Vec<SelectedItem> {
        handles
            .iter()
            .map(|handle| SelectedItem::project(handle.path(), self.environment.is_loaded(handle)))
            .collect()
    }

    /// Sink for tool output, appended on the main thread.
    pub fn sink(&self, format: OutputFormat) -> Arc<dyn LogSink> {
        let inner: Arc<dyn LogSink> = match format {
            OutputFormat::Text => Arc::new(ConsoleSink::dimmed()),
            OutputFormat::Json => Arc::new(TracingSink),
        };
        Arc::new(DispatchingSink::new(inner, self.main_thread.clone()))
    }

    /// Process runner built from the configuration; `timeout_secs` overrides
    /// the configured timeout (0 disables it).
    pub fn runner(&self, sink: Arc<dyn LogSink>, timeout_secs: Option<u64>) -> ProcessRunner {
        let timeout = match timeout_secs {
            Some(secs) => RestoreConfig {
                restore_timeout_secs: secs,
                ..self.config.clone()
            }
            .restore_timeout(),
            None => self.config.restore_timeout(),
        };
        ProcessRunner::new(sink)
            .with_tool(self.config.tool.clone())
            .with_args(self.config.tool_args.clone())
            .with_timeout(timeout)
            .with_cancellation(self.cancel.clone())
    }

    /// Cancel the operation when the user presses Ctrl-C.
    pub fn cancel_on_ctrl_c(&self) {
        let token = self.cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Interrupted, stopping running restores");
                token.cancel();
            }
        });
    }

    /// Wait for queued sink output to be printed.
    pub async fn flush(&self) -> Result<()> {
        self.main_thread.flush().await?;
        Ok(())
    }
}

/// Display `path` relative to `root` when possible.
pub fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

/// Print a report as text or JSON.
pub fn print_report(report: &ReloadReport, format: OutputFormat, root: &Path) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    println!();
    for failure in &report.root_failures {
        println!("{} {}: {}", "✗".red(), failure.root, failure.error);
    }
    for issue in &report.issues {
        println!("{} {}: {}", "⚠".yellow(), issue.project, issue.message);
    }

    for outcome in &report.outcomes {
        let path = display_path(&outcome.path, root);
        let elapsed = format!("{:.1}s", outcome.duration.as_secs_f64());
        match &outcome.status {
            NodeStatus::Restored {
                exit_code: 0,
            } => println!("{} {} ({path}, {elapsed})", "✓".green(), outcome.name.bold()),
            NodeStatus::Restored {
                exit_code,
            } => println!(
                "{} {} ({path}) exited with code {exit_code}",
                "✗".red(),
                outcome.name.bold()
            ),
            NodeStatus::Failed {
                error,
            } => println!("{} {}: {error}", "✗".red(), outcome.name.bold()),
            NodeStatus::Skipped {
                reason,
            } => println!("{} {} skipped: {reason}", "-".dimmed(), outcome.name),
            NodeStatus::Cancelled => println!("{} {} cancelled", "-".dimmed(), outcome.name),
        }
    }

    let summary = report.summary();
    let line = format!(
        "{} restored, {} failed, {} skipped, {} cancelled",
        summary.restored, summary.failed, summary.skipped, summary.cancelled
    );
    if report.has_failures() {
        println!("\n{}", line.red());
    } else {
        println!("\n{}", line.green());
    }
    Ok(())
}

/// Turn a report into the command's result.
pub fn finish(report: &ReloadReport) -> Result<()> {
    if report.cancelled {
        anyhow::bail!("Operation cancelled");
    }
    if report.has_failures() {
        let failed = report.summary().failed + report.root_failures.len();
        anyhow::bail!("{failed} project(s) failed");
    }
    Ok(())
}
