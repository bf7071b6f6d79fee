//! Dependency graph with insert-time cycle rejection
//!
//! Guarantees:
//! - Acyclic: every committed edge set is a DAG
//! - Atomic: a rejected insertion leaves the graph untouched
//! - Deterministic: topological ties break by ascending id
//! - Bounded: with a depth limit set, no committed chain is longer than it
//!
//! Traversals keep their own stacks, so chain length is bounded by memory
//! rather than by the thread stack.

use crate::errors::{GateError, Result};
use crate::graph::types::{Node, NodeId};
use std::collections::{BTreeSet, HashMap, HashSet};

/// DFS visitation mark
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    OnPath,
    Done,
}

/// Directed acyclic graph of nodes keyed by id
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: HashMap<NodeId, Node>,
    max_depth: Option<usize>,
}

impl DependencyGraph {
    /// Create an empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject insertions that would leave any node deeper than `limit`
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }

    /// Set or clear the depth limit; already committed nodes are not rechecked
    pub fn set_max_depth(&mut self, limit: Option<usize>) {
        self.max_depth = limit;
    }

    /// Current depth limit
    pub fn max_depth(&self) -> Option<usize> {
        self.max_depth
    }

    /// Insert a node, or replace the node with the same id
    ///
    /// Fails with `NotFound` when a dependency is absent and with `Cycle`
    /// when the prospective edge set is cyclic. The graph is unchanged on
    /// failure.
    pub fn insert_node(&mut self, node: Node) -> Result<()> {
        self.insert_batch(vec![node])
    }

    /// Stage several nodes together and commit them all or none
    ///
    /// Members may depend on each other. A missing dependency, a cycle or a
    /// chain past the depth limit anywhere in the batch rejects the whole
    /// batch. When the batch repeats an id, the later entry wins.
    pub fn insert_batch(&mut self, nodes: Vec<Node>) -> Result<()> {
        let mut staged: HashMap<NodeId, Node> = HashMap::with_capacity(nodes.len());
        for mut node in nodes {
            node.dedup_deps();
            staged.insert(node.id.clone(), node);
        }

        {
            let mut staged_ids: Vec<&NodeId> = staged.keys().collect();
            staged_ids.sort();

            for id in &staged_ids {
                for dep in &staged[*id].deps {
                    if !staged.contains_key(dep) && !self.nodes.contains_key(dep) {
                        tracing::debug!(node = %id, dep = %dep, "rejecting insertion: dependency absent");
                        return Err(GateError::NotFound { id: dep.clone() });
                    }
                }
            }

            // The committed graph is acyclic, so any new cycle passes through a staged node.
            let view = EdgeView {
                staged: Some(&staged),
                committed: &self.nodes,
            };
            let mut marks = HashMap::new();
            for id in &staged_ids {
                if let Some(cycle) = find_cycle(id.as_str(), &view, &mut marks) {
                    tracing::warn!(cycle = ?cycle, "rejecting insertion: dependency cycle");
                    return Err(GateError::Cycle { cycle });
                }
            }

            if let Some(limit) = self.max_depth {
                // New ids have no committed dependents; replaced ids may deepen theirs.
                let mut affected: Vec<&str> = staged_ids.iter().map(|id| id.as_str()).collect();
                if staged.keys().any(|id| self.nodes.contains_key(id)) {
                    let mut committed: Vec<&str> = self
                        .nodes
                        .keys()
                        .map(String::as_str)
                        .filter(|id| !staged.contains_key(*id))
                        .collect();
                    committed.sort_unstable();
                    affected.extend(committed);
                }

                let mut memo = HashMap::new();
                for id in affected {
                    let depth = longest_chain(id, &view, &mut memo)?;
                    if depth > limit {
                        tracing::warn!(node = %id, depth, limit, "rejecting insertion: dependency chain too deep");
                        return Err(GateError::DepthExceeded {
                            id: id.to_string(),
                            depth,
                            limit,
                        });
                    }
                }
            }
        }

        for (id, node) in staged {
            tracing::debug!(node = %id, deps = ?node.deps, "node committed");
            self.nodes.insert(id, node);
        }
        Ok(())
    }

    /// Remove a node no other node depends on
    pub fn remove_node(&mut self, id: &str) -> Result<Node> {
        if !self.nodes.contains_key(id) {
            return Err(GateError::NotFound { id: id.to_string() });
        }

        let dependents = self.dependents_of(id);
        if !dependents.is_empty() {
            return Err(GateError::InUse {
                id: id.to_string(),
                dependents,
            });
        }

        tracing::debug!(node = %id, "node removed");
        self.nodes
            .remove(id)
            .ok_or_else(|| GateError::NotFound { id: id.to_string() })
    }

    /// Transitive dependencies of `root` plus `root`, dependencies first
    ///
    /// Kahn's algorithm over the induced subgraph; zero in-degree ties are
    /// taken in ascending id order.
    pub fn topological_order(&self, root: &str) -> Result<Vec<NodeId>> {
        let members = self.closure(root)?;
        self.kahn(&members)
    }

    /// Every node in the graph, dependencies first
    pub fn full_order(&self) -> Result<Vec<NodeId>> {
        let members: HashSet<&str> = self.nodes.keys().map(String::as_str).collect();
        self.kahn(&members)
    }

    /// Get node by id
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Check whether a node exists
    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in ascending order
    pub fn ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Nodes that directly depend on `id`, in ascending order
    pub fn dependents_of(&self, id: &str) -> Vec<NodeId> {
        let mut dependents: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.depends_on(id))
            .map(|n| n.id.clone())
            .collect();
        dependents.sort();
        dependents
    }

    /// Transitive dependencies of `id`, excluding `id`, in ascending order
    pub fn transitive_deps(&self, id: &str) -> Result<Vec<NodeId>> {
        let mut deps: Vec<NodeId> = self
            .closure(id)?
            .into_iter()
            .filter(|d| *d != id)
            .map(String::from)
            .collect();
        deps.sort();
        Ok(deps)
    }

    /// Length of the longest dependency chain below `id` (leaves are 0)
    pub fn depth_of(&self, id: &str) -> Result<usize> {
        let view = EdgeView {
            staged: None,
            committed: &self.nodes,
        };
        longest_chain(id, &view, &mut HashMap::new())
    }

    /// Whether neither node reaches the other through dependency edges
    pub fn independent(&self, a: &str, b: &str) -> Result<bool> {
        let below_a = self.closure(a)?;
        let below_b = self.closure(b)?;
        Ok(!below_a.contains(b) && !below_b.contains(a))
    }

    /// `root` plus everything it reaches
    fn closure<'a>(&'a self, root: &'a str) -> Result<HashSet<&'a str>> {
        if !self.nodes.contains_key(root) {
            return Err(GateError::NotFound { id: root.to_string() });
        }

        let mut seen: HashSet<&str> = HashSet::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !seen.insert(id) {
                continue;
            }
            let node = self
                .nodes
                .get(id)
                .ok_or_else(|| GateError::NotFound { id: id.to_string() })?;
            stack.extend(node.deps.iter().map(String::as_str));
        }
        Ok(seen)
    }

    fn kahn(&self, members: &HashSet<&str>) -> Result<Vec<NodeId>> {
        let mut in_degree: HashMap<&str, usize> = HashMap::with_capacity(members.len());
        let mut successors: HashMap<&str, Vec<&str>> = HashMap::new();

        for &id in members {
            let node = &self.nodes[id];
            let local_deps: Vec<&str> = node
                .deps
                .iter()
                .map(String::as_str)
                .filter(|d| members.contains(d))
                .collect();
            in_degree.insert(id, local_deps.len());
            for dep in local_deps {
                successors.entry(dep).or_default().push(id);
            }
        }

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();

        let mut order = Vec::with_capacity(members.len());
        while let Some(id) = ready.pop_first() {
            order.push(id.to_string());
            if let Some(children) = successors.get(id) {
                for &child in children {
                    if let Some(degree) = in_degree.get_mut(child) {
                        *degree -= 1;
                        if *degree == 0 {
                            ready.insert(child);
                        }
                    }
                }
            }
        }

        if order.len() != members.len() {
            let placed: HashSet<&str> = order.iter().map(String::as_str).collect();
            let mut remaining: Vec<&str> = members
                .iter()
                .copied()
                .filter(|id| !placed.contains(id))
                .collect();
            remaining.sort_unstable();

            let view = EdgeView {
                staged: None,
                committed: &self.nodes,
            };
            let mut marks = HashMap::new();
            let cycle = remaining
                .iter()
                .find_map(|&id| find_cycle(id, &view, &mut marks))
                .unwrap_or_else(|| remaining.iter().map(|id| id.to_string()).collect());
            tracing::error!(cycle = ?cycle, "committed graph contains a cycle");
            return Err(GateError::Cycle { cycle });
        }

        Ok(order)
    }

    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }
}

/// Edge lookup over committed nodes, optionally overlaid by a staged batch
struct EdgeView<'a> {
    staged: Option<&'a HashMap<NodeId, Node>>,
    committed: &'a HashMap<NodeId, Node>,
}

impl<'a> EdgeView<'a> {
    fn deps_of(&self, id: &str) -> Option<&'a [NodeId]> {
        self.staged
            .and_then(|staged| staged.get(id))
            .or_else(|| self.committed.get(id))
            .map(|n| n.deps.as_slice())
    }
}

/// Depth-first search for a cycle reachable from `start`
///
/// Returns the ids along the cycle, starting at the node that closes it.
fn find_cycle<'a>(
    start: &'a str,
    view: &EdgeView<'a>,
    marks: &mut HashMap<&'a str, Mark>,
) -> Option<Vec<NodeId>> {
    if marks.contains_key(start) {
        return None;
    }

    // Frames are (node, its deps, next dep to visit); together they are the current path.
    let mut path: Vec<(&'a str, &'a [NodeId], usize)> = Vec::new();
    marks.insert(start, Mark::OnPath);
    path.push((start, view.deps_of(start).unwrap_or_default(), 0));

    while let Some(top) = path.last_mut() {
        let (id, deps, next) = *top;
        let Some(dep) = deps.get(next) else {
            marks.insert(id, Mark::Done);
            path.pop();
            continue;
        };
        top.2 += 1;

        let dep = dep.as_str();
        match marks.get(dep) {
            Some(Mark::Done) => {}
            Some(Mark::OnPath) => {
                let at = path.iter().position(|(p, _, _)| *p == dep).unwrap_or(0);
                return Some(path[at..].iter().map(|(p, _, _)| p.to_string()).collect());
            }
            None => {
                marks.insert(dep, Mark::OnPath);
                path.push((dep, view.deps_of(dep).unwrap_or_default(), 0));
            }
        }
    }
    None
}

/// Longest dependency chain below `root` (leaves are 0), memoized across calls
fn longest_chain<'a>(
    root: &'a str,
    view: &EdgeView<'a>,
    memo: &mut HashMap<&'a str, usize>,
) -> Result<usize> {
    let mut expanding: HashSet<&'a str> = HashSet::new();
    let mut stack: Vec<(&'a str, bool)> = vec![(root, false)];

    while let Some((id, expanded)) = stack.pop() {
        if memo.contains_key(id) {
            continue;
        }
        let deps = view
            .deps_of(id)
            .ok_or_else(|| GateError::NotFound { id: id.to_string() })?;

        if expanded {
            let depth = deps
                .iter()
                .filter_map(|d| memo.get(d.as_str()))
                .map(|d| d + 1)
                .max()
                .unwrap_or(0);
            expanding.remove(id);
            memo.insert(id, depth);
        } else {
            if !expanding.insert(id) {
                let cycle = find_cycle(id, view, &mut HashMap::new()).unwrap_or_else(|| vec![id.to_string()]);
                return Err(GateError::Cycle { cycle });
            }
            stack.push((id, true));
            stack.extend(deps.iter().map(|d| (d.as_str(), false)));
        }
    }

    memo.get(root)
        .copied()
        .ok_or_else(|| GateError::NotFound { id: root.to_string() })
}
