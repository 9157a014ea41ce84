//! rtree - dependency-aware restore and reload of project graphs.
//!
//! Entry point of the command-line tool; see [`restore_tree::cli`] for the
//! available commands.

use anyhow::Result;
use clap::Parser;
use restore_tree::cli;
use restore_tree::core::user_friendly_error;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            user_friendly_error(e).display();
            std::process::exit(1);
        }
    }
}
