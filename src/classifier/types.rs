//! Problem descriptor types

use crate::budget::ComplexityClass;
use crate::graph::NodeId;
use serde::{Deserialize, Serialize};

/// Incoming unit of work as declared by the caller
///
/// The domain tag and dependency ids are taken as given; nothing is
/// inferred from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    /// Identifier the node will carry in the graph
    pub id: NodeId,

    /// Declared domain tag
    pub domain: String,

    /// Declared dependency ids
    #[serde(default)]
    pub deps: Vec<NodeId>,

    /// Declared auxiliary-cost class
    #[serde(default)]
    pub aux_cost: Option<ComplexityClass>,
}

impl Problem {
    /// Create a problem with no dependencies
    pub fn new(id: impl Into<NodeId>, domain: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            domain: domain.into(),
            deps: Vec::new(),
            aux_cost: None,
        }
    }

    /// Set the declared dependencies
    pub fn with_deps<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<NodeId>,
    {
        self.deps = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Declare the auxiliary-cost class
    pub fn with_aux_cost(mut self, cost: ComplexityClass) -> Self {
        self.aux_cost = Some(cost);
        self
    }
}
