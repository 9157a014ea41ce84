//! Recursive discovery of a root project's build dependencies.

use crate::core::{ProjectInfo, ReloadError, Result};
use crate::environment::{DependencyListing, ProjectEnvironment};
use crate::graph::{DependencyState, DiscoveryIssue, ProjectGraph, ProjectNode};
use crate::utils::fs::resolve_relative;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::path::Path;

/// Builds a [`ProjectGraph`] by walking declared project references.
///
/// Discovery is best-effort below the root:
/// - entries that are not build-project references are ignored
/// - a reference whose path does not resolve to a known project is dropped
/// - a failure describing or enumerating one project is recorded as a
///   [`DiscoveryIssue`] and limited to that subtree
///
/// Only a failure to describe the root itself is returned as an error.
pub struct DependencyGraphBuilder<'a, E: ProjectEnvironment> {
    environment: &'a E,
}

struct BuildState<H> {
    graph: DiGraph<ProjectNode<H>, ()>,
    index: HashMap<crate::core::ProjectId, NodeIndex>,
    issues: Vec<DiscoveryIssue>,
}

impl<'a, E: ProjectEnvironment> DependencyGraphBuilder<'a, E> {
    /// Create a builder reading from `environment`.
    pub const fn new(environment: &'a E) -> Self {
        Self {
            environment,
        }
    }

    /// Discover the dependency graph of `root`.
    pub fn build(&self, root: &E::Handle) -> Result<ProjectGraph<E::Handle>> {
        let info = self
            .environment
            .describe(root)
            .map_err(|e| ReloadError::discovery(format!("{root:?}"), e))?;
        tracing::debug!(target: "graph", "Discovering dependencies of {}", info.name);

        let mut state = BuildState {
            graph: DiGraph::new(),
            index: HashMap::new(),
            issues: Vec::new(),
        };
        let root_index = self.visit(root.clone(), info, &mut state);

        let graph = ProjectGraph {
            graph: state.graph,
            root: root_index,
            issues: state.issues,
        };
        tracing::debug!(
            target: "graph",
            "Graph of {} has {} projects and {} references",
            graph.node(root_index).name(),
            graph.node_count(),
            graph.edge_count()
        );
        if graph.has_cycles() {
            tracing::warn!(
                target: "graph",
                "Project references under {} form a cycle",
                graph.node(root_index).name()
            );
        }
        Ok(graph)
    }

    fn visit(
        &self,
        handle: E::Handle,
        info: ProjectInfo,
        state: &mut BuildState<E::Handle>,
    ) -> NodeIndex {
        if let Some(&existing) = state.index.get(&info.id) {
            return existing;
        }

        let id = info.id;
        let project_dir = info.directory().to_path_buf();
        let name = info.name.clone();
        let loaded = self.environment.is_loaded(&handle);
        let index = state.graph.add_node(ProjectNode {
            info,
            handle: handle.clone(),
            loaded,
            dependencies: DependencyState::Enumerated,
        });
        // registered before recursing so a cycle resolves to this node
        state.index.insert(id, index);

        let entries = match self.environment.dependencies(&handle) {
            Ok(DependencyListing::Entries(entries)) => entries,
            Ok(DependencyListing::Unsupported) => {
                tracing::trace!(target: "graph", "{name} does not enumerate dependencies");
                state.graph[index].dependencies = DependencyState::Unsupported;
                return index;
            }
            Err(e) => {
                tracing::warn!(target: "graph", "Failed to read dependencies of {name}: {e}");
                state.issues.push(DiscoveryIssue {
                    project: name,
                    message: e.to_string(),
                });
                state.graph[index].dependencies = DependencyState::Failed(e.to_string());
                return index;
            }
        };

        for entry in entries.into_iter().filter(|entry| entry.is_build_project()) {
            let path = resolve_relative(&project_dir, Path::new(&entry.canonical_name));
            let Some(dep_handle) = self.environment.resolve(&path) else {
                tracing::debug!(
                    target: "graph",
                    "{name}: reference {} is not a known project, skipping",
                    path.display()
                );
                continue;
            };

            let dep_info = match self.environment.describe(&dep_handle) {
                Ok(dep_info) => dep_info,
                Err(e) => {
                    tracing::warn!(target: "graph", "{name}: cannot describe {}: {e}", path.display());
                    state.issues.push(DiscoveryIssue {
                        project: path.display().to_string(),
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let dep_index = self.visit(dep_handle, dep_info, state);
            if !state.graph.contains_edge(index, dep_index) {
                state.graph.add_edge(index, dep_index, ());
            }
        }

        index
    }
}
