//! Core data structures for the dependency graph

use crate::budget::ComplexityClass;
use serde::{Deserialize, Serialize};

/// Unique identifier for graph nodes
pub type NodeId = String;

/// A unit of work with an identity, a domain tag and dependency edges
///
/// `deps` lists the nodes that must be resolved before this one. The graph
/// collapses duplicate entries on insertion, keeping first-occurrence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Unique node identifier
    pub id: NodeId,

    /// Opaque domain tag supplied by the caller
    pub domain: String,

    /// Ordered dependency ids
    #[serde(default)]
    pub deps: Vec<NodeId>,

    /// Declared auxiliary cost as a function of input size
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aux_cost: Option<ComplexityClass>,
}

impl Node {
    /// Create a node with no dependencies
    pub fn new(id: impl Into<NodeId>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            deps: Vec::new(),
            aux_cost: None,
        }
    }

    /// Set the dependency list
    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self.dedup_deps();
        self
    }

    /// Declare the auxiliary-cost class
    pub fn with_aux_cost(mut self, cost: ComplexityClass) -> Self {
        self.aux_cost = Some(cost);
        self
    }

    /// Declared auxiliary cost at input size `n`, if a cost was declared
    pub fn aux_cost_at(&self, n: u64) -> Option<f64> {
        self.aux_cost.map(|class| class.cost_at(n))
    }

    /// Whether this node lists `id` as a direct dependency
    pub fn depends_on(&self, id: &str) -> bool {
        self.deps.iter().any(|d| d == id)
    }

    pub(crate) fn dedup_deps(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.deps.retain(|d| seen.insert(d.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_deps_dedups_in_order() {
        let node = Node::new("c", "iaas").with_deps(["b", "a", "b"]);
        assert_eq!(node.deps, vec!["b".to_string(), "a".to_string()]);
        assert!(node.depends_on("a"));
        assert!(!node.depends_on("c"));
    }

    #[test]
    fn test_aux_cost_at() {
        let node = Node::new("a", "iaas").with_aux_cost(ComplexityClass::Linear);
        assert_eq!(node.aux_cost_at(10), Some(10.0));
        assert_eq!(Node::new("b", "iaas").aux_cost_at(10), None);
    }
}
