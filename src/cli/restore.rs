//! Restore single projects in place.

use crate::cli::common::{CommandContext, OutputFormat, finish, print_report};
use crate::restore::RestoreInvoker;
use crate::selection::can_restore_selection;
use anyhow::{Result, bail};
use clap::Args;
use std::path::PathBuf;
use std::sync::Arc;

/// Restore projects one at a time without touching their dependencies.
///
/// Each project keeps its load state; an unloaded project is reloaded after
/// its restore.
#[derive(Args, Debug)]
pub struct RestoreCommand {
    /// Project files to restore
    #[arg(required = true, value_name = "PROJECT")]
    projects: Vec<PathBuf>,

    /// Timeout for one restore in seconds (0 disables it)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

impl RestoreCommand {
    /// Execute the restore.
    pub async fn execute(self, context: CommandContext) -> Result<()> {
        let handles = context.handles(&self.projects)?;
        let extensions = &context.config.restorable_extensions;
        if !can_restore_selection(&context.selection(&handles), extensions) {
            bail!("Restore applies only to project files with extensions: {}", extensions.join(", "));
        }

        let sink = context.sink(self.format);
        let runner = context.runner(Arc::clone(&sink), self.timeout);
        let invoker = RestoreInvoker::new(
            Arc::clone(&context.environment),
            Arc::new(runner),
            context.main_thread.clone(),
            sink,
        )
        .with_restorable_extensions(extensions.clone());

        context.cancel_on_ctrl_c();
        let report = invoker.restore_selected(&handles).await;
        context.flush().await?;

        print_report(&report, self.format, context.environment.root())?;
        finish(&report)
    }
}
