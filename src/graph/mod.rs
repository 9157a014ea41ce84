//! Dependency graph of one selected root project.
//!
//! The graph is an arena: every distinct project (by [`ProjectId`]) is one
//! node of a `petgraph` [`DiGraph`], and an edge `a -> b` means "a depends on
//! b". A project reachable through several paths (a diamond) is one shared
//! node with several incoming edges, and a reference cycle is a back-edge.
//! Nothing is deduplicated at the level of *work*: deciding what to process
//! is the job of the [`worklist`](crate::orchestrator::worklist) pass and the
//! [`ReloadSession`](crate::session::ReloadSession).
//!
//! Graphs are built by [`DependencyGraphBuilder`] and are immutable afterwards.

mod builder;

pub use builder::DependencyGraphBuilder;

use crate::core::{ProjectId, ProjectInfo};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;
use std::collections::HashSet;

/// How a node's dependency list was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyState {
    /// The project kind does not support dependency enumeration.
    Unsupported,
    /// Dependencies were enumerated (the node may still have none).
    Enumerated,
    /// Enumeration raised an error; the node is treated as a leaf.
    Failed(String),
}

/// One project in the graph.
#[derive(Debug, Clone)]
pub struct ProjectNode<H> {
    /// Identity, name and path
    pub info: ProjectInfo,
    /// Environment handle used for mutations
    pub handle: H,
    /// Load state at discovery time
    pub loaded: bool,
    /// How the dependency list was obtained
    pub dependencies: DependencyState,
}

impl<H> ProjectNode<H> {
    /// Stable identifier of the project.
    #[must_use]
    pub const fn id(&self) -> ProjectId {
        self.info.id
    }

    /// Display name of the project.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.info.name
    }
}

/// A problem met during discovery that did not abort it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiscoveryIssue {
    /// Project the issue relates to
    pub project: String,
    /// What went wrong
    pub message: String,
}

/// Immutable dependency graph rooted at one selected project.
#[derive(Debug)]
pub struct ProjectGraph<H> {
    graph: DiGraph<ProjectNode<H>, ()>,
    root: NodeIndex,
    issues: Vec<DiscoveryIssue>,
}

impl<H> ProjectGraph<H> {
    /// Index of the root node.
    #[must_use]
    pub const fn root(&self) -> NodeIndex {
        self.root
    }

    /// The node at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` does not belong to this graph.
    #[must_use]
    pub fn node(&self, index: NodeIndex) -> &ProjectNode<H> {
        &self.graph[index]
    }

    /// Direct dependencies of `index`, in declaration order.
    #[must_use]
    pub fn dependencies(&self, index: NodeIndex) -> Vec<NodeIndex> {
        // petgraph lists neighbors most-recent edge first
        let mut deps: Vec<NodeIndex> = self.graph.neighbors(index).collect();
        deps.reverse();
        deps
    }

    /// Number of distinct projects.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of dependency edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Whether discovered references form at least one cycle.
    #[must_use]
    pub fn has_cycles(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Problems recorded during discovery.
    #[must_use]
    pub fn issues(&self) -> &[DiscoveryIssue] {
        &self.issues
    }

    /// Build a human-readable dependency tree.
    ///
    /// Projects already printed higher up are marked `(shared)` and not
    /// expanded again; references back to an ancestor are marked `(cycle)`.
    #[must_use]
    pub fn to_tree_string(&self) -> String {
        let mut result = String::new();
        let root = self.node(self.root);
        result.push_str(&format!("{}{}\n", root.name(), node_annotations(root)));

        let mut printed = HashSet::from([self.root]);
        let mut ancestors = vec![self.root];
        let deps = self.dependencies(self.root);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(
                *dep,
                &mut result,
                "",
                i == deps.len() - 1,
                &mut printed,
                &mut ancestors,
            );
        }
        result
    }

    fn build_tree_string(
        &self,
        index: NodeIndex,
        result: &mut String,
        prefix: &str,
        is_last: bool,
        printed: &mut HashSet<NodeIndex>,
        ancestors: &mut Vec<NodeIndex>,
    ) {
        let connector = if is_last {
            "└── "
        } else {
            "├── "
        };
        let node = self.node(index);

        if ancestors.contains(&index) {
            result.push_str(&format!("{prefix}{connector}{} (cycle)\n", node.name()));
            return;
        }
        if !printed.insert(index) {
            result.push_str(&format!("{prefix}{connector}{} (shared)\n", node.name()));
            return;
        }
        result.push_str(&format!("{prefix}{connector}{}{}\n", node.name(), node_annotations(node)));

        let child_prefix = if is_last {
            format!("{prefix}    ")
        } else {
            format!("{prefix}│   ")
        };

        ancestors.push(index);
        let deps = self.dependencies(index);
        for (i, dep) in deps.iter().enumerate() {
            self.build_tree_string(
                *dep,
                result,
                &child_prefix,
                i == deps.len() - 1,
                printed,
                ancestors,
            );
        }
        ancestors.pop();
    }
}

fn node_annotations<H>(node: &ProjectNode<H>) -> String {
    let mut notes = Vec::new();
    match &node.dependencies {
        DependencyState::Enumerated => {}
        DependencyState::Unsupported => notes.push("no dependency information"),
        DependencyState::Failed(_) => notes.push("discovery failed"),
    }
    if !node.loaded {
        notes.push("unloaded");
    }

    if notes.is_empty() {
        String::new()
    } else {
        format!(" ({})", notes.join(", "))
    }
}
