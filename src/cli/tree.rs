//! Print the dependency graph discovered for a project.

use crate::cli::common::{CommandContext, OutputFormat};
use crate::graph::{DependencyGraphBuilder, DiscoveryIssue};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;

/// Show the dependency tree of a project.
///
/// Shared dependencies and cycle back-edges are printed once and marked;
/// discovery problems are listed after the tree.
#[derive(Args, Debug)]
pub struct TreeCommand {
    /// Project file to start from
    #[arg(value_name = "PROJECT")]
    project: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

#[derive(Serialize)]
struct TreeSummary<'a> {
    root: &'a str,
    projects: usize,
    references: usize,
    has_cycles: bool,
    tree: String,
    issues: &'a [DiscoveryIssue],
}

impl TreeCommand {
    /// Execute the command.
    pub fn execute(self, context: &CommandContext) -> Result<()> {
        let handle = context
            .handles(std::slice::from_ref(&self.project))?
            .pop()
            .ok_or_else(|| anyhow::anyhow!("No project given"))?;

        let graph = DependencyGraphBuilder::new(context.environment.as_ref()).build(&handle)?;

        if self.format == OutputFormat::Json {
            let summary = TreeSummary {
                root: graph.node(graph.root()).name(),
                projects: graph.node_count(),
                references: graph.edge_count(),
                has_cycles: graph.has_cycles(),
                tree: graph.to_tree_string(),
                issues: graph.issues(),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
            return Ok(());
        }

        print!("{}", graph.to_tree_string());
        println!(
            "\n{} projects, {} references{}",
            graph.node_count(),
            graph.edge_count(),
            if graph.has_cycles() {
                ", contains cycles".yellow().to_string()
            } else {
                String::new()
            }
        );
        for issue in graph.issues() {
            println!("{} {}: {}", "⚠".yellow(), issue.project, issue.message);
        }
        Ok(())
    }
}
