//! Reload selected projects together with their dependencies.

use crate::cli::common::{CommandContext, OutputFormat, finish, print_report};
use crate::environment::{WorkspaceEnvironment, WorkspaceHandle};
use crate::orchestrator::{ReloadOptions, ReloadOrchestrator, RootPlan};
use crate::selection::can_reload_selection;
use crate::session::ReloadSession;
use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

/// Unload, restore and reload projects dependencies-first.
#[derive(Args, Debug)]
pub struct ReloadCommand {
    /// Project files to reload; their dependencies are reloaded first
    #[arg(required = true, value_name = "PROJECT")]
    projects: Vec<PathBuf>,

    /// Maximum concurrent restores within one dependency level
    #[arg(long, value_name = "N")]
    max_parallel: Option<usize>,

    /// Timeout for one restore in seconds (0 disables it)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Skip projects whose dependency failed
    #[arg(long)]
    escalate_failures: bool,

    /// Reload each project immediately after its restore
    #[arg(long)]
    reload_after_restore: bool,

    /// Show the processing order without touching anything
    #[arg(long)]
    dry_run: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct PlannedRoot {
    root: String,
    levels: Vec<Vec<String>>,
}

impl ReloadCommand {
    /// Execute the reload.
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        if self.max_parallel == Some(0) {
            bail!("--max-parallel must be at least 1");
        }

        let handles = context.handles(&self.projects)?;
        if !can_reload_selection(&context.selection(&handles)) {
            bail!("Reload applies only to loaded project roots");
        }

        let options = ReloadOptions {
            max_parallel: self.max_parallel.unwrap_or(context.config.max_parallel),
            escalate_failures: self.escalate_failures || context.config.escalate_failures,
            reload_after_restore: self.reload_after_restore
                || context.config.reload_after_restore,
        };

        let sink = context.sink(self.format);
        let runner = context.runner(Arc::clone(&sink), self.timeout);
        let orchestrator = ReloadOrchestrator::new(
            Arc::clone(&context.environment),
            Arc::new(runner),
            context.main_thread.clone(),
            sink,
        )
        .with_options(options)
        .with_cancellation(context.cancel.clone());

        if self.dry_run {
            return self.print_plan(&orchestrator, &handles);
        }

        context.cancel_on_ctrl_c();
        let report = orchestrator.reload(&handles).await;
        context.flush().await?;

        print_report(&report, self.format, context.environment.root())?;
        finish(&report)
    }

    fn print_plan(
        &self,
        orchestrator: &ReloadOrchestrator<WorkspaceEnvironment>,
        handles: &[WorkspaceHandle],
    ) -> Result<()> {
        let (graphs, failures) = orchestrator.discover(handles);
        let session = ReloadSession::new();
        let plans: Vec<RootPlan<WorkspaceHandle>> =
            graphs.into_iter().map(|graph| orchestrator.plan(graph, &session)).collect();

        let planned: Vec<PlannedRoot> = plans
            .iter()
            .map(|plan| PlannedRoot {
                root: plan.graph.node(plan.graph.root()).name().to_string(),
                levels: plan
                    .levels
                    .iter()
                    .map(|level| {
                        level.iter().map(|i| plan.graph.node(*i).name().to_string()).collect()
                    })
                    .collect(),
            })
            .collect();

        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(&planned)?);
        } else {
            for root in &planned {
                println!("{}", root.root.bold());
                if root.levels.is_empty() {
                    println!("  (already covered by an earlier root)");
                }
                for (depth, level) in root.levels.iter().enumerate() {
                    println!("  level {depth}: {}", level.join(", "));
                }
            }
            for failure in &failures {
                println!("{} {}: {}", "✗".red(), failure.root, failure.error);
            }
        }

        if !failures.is_empty() {
            bail!("{} root(s) could not be discovered", failures.len());
        }
        Ok(())
    }
}
