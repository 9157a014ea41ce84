//! Manage the restore-tree configuration file.
//!
//! ```bash
//! rtree config init          # write a file with the defaults
//! rtree config show          # print the effective configuration
//! rtree config               # same as show
//! rtree config path          # print the file location
//! ```

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::RestoreConfig;

/// Command to manage the configuration file.
///
/// Without a subcommand the effective configuration is shown.
#[derive(Args, Debug)]
pub struct ConfigCommand {
    /// Configuration operation to perform
    #[command(subcommand)]
    command: Option<ConfigSubcommands>,
}

#[derive(Subcommand, Debug)]
enum ConfigSubcommands {
    /// Write a configuration file containing the defaults
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Show the effective configuration
    Show,

    /// Print the configuration file location
    Path,
}

impl ConfigCommand {
    /// Execute the subcommand against `config_path` or the default location.
    pub async fn execute(self, config_path: Option<PathBuf>) -> Result<()> {
        let path = match config_path {
            Some(path) => path,
            None => RestoreConfig::default_path()?,
        };

        match self.command {
            Some(ConfigSubcommands::Init {
                force,
            }) => Self::init(&path, force).await,
            Some(ConfigSubcommands::Show) | None => Self::show(path).await,
            Some(ConfigSubcommands::Path) => {
                println!("{}", path.display());
                Ok(())
            }
        }
    }

    async fn init(path: &std::path::Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            println!("❌ Config already exists at: {}", path.display());
            println!("   Use --force to overwrite");
            return Ok(());
        }

        let config = RestoreConfig::default();
        config.save_to(path).await?;

        println!("✅ Created config at: {}", path.display());
        println!("\n{}", "Configuration:".bold());
        println!("{}", toml::to_string_pretty(&config)?);
        Ok(())
    }

    async fn show(path: PathBuf) -> Result<()> {
        let exists = path.exists();
        let config = RestoreConfig::load_with_optional(Some(path.clone())).await?;

        println!("{}", "Configuration".bold());
        println!("Location: {}\n", path.display());
        println!("{}", toml::to_string_pretty(&config)?);

        if !exists {
            println!("{}", "Tip:".yellow());
            println!("  No file found, showing defaults. Run 'rtree config init' to create one");
        }
        Ok(())
    }
}
