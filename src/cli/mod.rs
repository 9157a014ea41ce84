//! Command-line interface for restore-tree.
//!
//! `rtree` drives the orchestrator against a directory-backed workspace:
//!
//! - `reload` - unload, restore and reload projects dependencies-first
//! - `restore` - restore single projects without touching their dependencies
//! - `tree` - print the discovered dependency graph of a project
//! - `config` - show, locate or initialize the configuration file
//!
//! # Global Options
//!
//! - `--verbose` - debug logging
//! - `--quiet` - warnings and errors only
//! - `--config` - path to a custom config file
//! - `--workspace` - workspace root (defaults to the current directory)
//!
//! Logs go to stderr; command output goes to stdout. `RUST_LOG` overrides the
//! level chosen by `--verbose`/`--quiet`.
//!
//! ```bash
//! rtree reload src/App/App.csproj --max-parallel 2
//! rtree reload src/App/App.csproj --dry-run --format json
//! rtree tree src/App/App.csproj
//! ```

pub mod common;
mod config;
mod reload;
mod restore;
mod tree;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::common::CommandContext;

/// Runtime configuration derived from the global flags.
///
/// Kept separate from [`Cli`] so tests and embedders can run commands with an
/// explicit configuration.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    /// Default log filter, e.g. `"info"` or `"debug"`
    pub log_level: Option<String>,

    /// Custom configuration file
    pub config_path: Option<PathBuf>,

    /// Workspace root; the current directory when unset
    pub workspace: Option<PathBuf>,
}

impl CliConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the global tracing subscriber.
    ///
    /// `RUST_LOG` takes precedence over [`log_level`](Self::log_level). Calling
    /// this more than once is harmless.
    pub fn init_logging(&self) {
        let default_level = self.log_level.as_deref().unwrap_or("warn");
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_level));

        let _ = tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr).with_target(false))
            .try_init();
    }
}

/// Dependency-aware restore and reload of project graphs.
#[derive(Parser)]
#[command(
    name = "rtree",
    about = "Restore and reload projects together with their dependencies",
    version,
    long_about = "rtree unloads the selected projects and everything they reference, runs the \
                  restore tool on each of them dependencies-first, and reloads them."
)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to a custom config file
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Workspace root to scan for project files
    #[arg(short, long, global = true, value_name = "DIR")]
    workspace: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Unload, restore and reload projects dependencies-first
    Reload(reload::ReloadCommand),

    /// Restore single projects without their dependencies
    Restore(restore::RestoreCommand),

    /// Print the dependency tree of a project
    Tree(tree::TreeCommand),

    /// Manage the configuration file
    Config(config::ConfigCommand),
}

impl Cli {
    /// Execute the parsed command with a configuration built from the flags.
    pub async fn execute(self) -> Result<()> {
        let config = self.build_config();
        self.execute_with_config(config).await
    }

    /// Translate the global flags into a [`CliConfig`].
    #[must_use]
    pub fn build_config(&self) -> CliConfig {
        let log_level = if self.verbose {
            "debug"
        } else if self.quiet {
            "warn"
        } else {
            "info"
        };

        CliConfig {
            log_level: Some(log_level.to_string()),
            config_path: self.config.clone(),
            workspace: self.workspace.clone(),
        }
    }

    /// Execute the parsed command with an explicit configuration.
    pub async fn execute_with_config(self, config: CliConfig) -> Result<()> {
        config.init_logging();

        match self.command {
            Commands::Config(cmd) => cmd.execute(config.config_path).await,
            Commands::Reload(cmd) => {
                let context = CommandContext::load(config.config_path, config.workspace).await?;
                cmd.execute(context).await
            }
            Commands::Restore(cmd) => {
                let context = CommandContext::load(config.config_path, config.workspace).await?;
                cmd.execute(context).await
            }
            Commands::Tree(cmd) => {
                let context = CommandContext::load(config.config_path, config.workspace).await?;
                cmd.execute(&context)
            }
        }
    }
}
