//! Pure planning passes over a [`ProjectGraph`].
//!
//! Neither function mutates the graph or the session; claiming is done by the
//! orchestrator afterwards, in work-list order.

use crate::graph::ProjectGraph;
use crate::session::ReloadSession;
use petgraph::graph::NodeIndex;
use std::collections::{HashMap, HashSet};

/// Flatten `graph` into a dependencies-first work list.
///
/// Post-order traversal from the root: a node that the session can no longer
/// process contributes nothing (and hides its subtree), otherwise its
/// dependency subtrees are flattened in declared order and the node itself is
/// appended. A shared node is kept at its first occurrence, which always
/// follows all of its own dependencies. Edges back into a node that is still
/// being flattened (reference cycles) are ignored.
pub fn work_list<H>(graph: &ProjectGraph<H>, session: &ReloadSession) -> Vec<NodeIndex> {
    let mut order = Vec::new();
    let mut seen = HashSet::new();
    flatten(graph, session, graph.root(), &mut seen, &mut order);
    order
}

fn flatten<H>(
    graph: &ProjectGraph<H>,
    session: &ReloadSession,
    index: NodeIndex,
    seen: &mut HashSet<NodeIndex>,
    order: &mut Vec<NodeIndex>,
) {
    if !session.can_process(&graph.node(index).id()) {
        return;
    }
    // covers both shared nodes and back-edges of a cycle
    if !seen.insert(index) {
        return;
    }

    for dep in graph.dependencies(index) {
        flatten(graph, session, dep, seen, order);
    }
    order.push(index);
}

/// Partition `claimed` nodes (in work-list order) into dependency levels.
///
/// A node with no claimed dependency earlier in the list is level 0; any other
/// node is one level above its highest claimed dependency. Dependencies that
/// are not in `claimed` (processed by an earlier root, or reached through a
/// cycle back-edge) do not constrain the level.
pub fn dependency_levels<H>(graph: &ProjectGraph<H>, claimed: &[NodeIndex]) -> Vec<Vec<NodeIndex>> {
    let mut level_of: HashMap<NodeIndex, usize> = HashMap::with_capacity(claimed.len());
    let mut levels: Vec<Vec<NodeIndex>> = Vec::new();

    for &index in claimed {
        let level = graph
            .dependencies(index)
            .iter()
            .filter_map(|dep| level_of.get(dep))
            .map(|level| level + 1)
            .max()
            .unwrap_or(0);
        level_of.insert(index, level);

        if levels.len() <= level {
            levels.resize_with(level + 1, Vec::new);
        }
        levels[level].push(index);
    }

    levels
}
