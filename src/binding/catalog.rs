//! Candidate target catalogs

use crate::binding::types::Target;
use crate::graph::Node;
use std::collections::HashSet;

/// Supplies the ordered candidate list for a node
pub trait CandidateSource: Send + Sync {
    /// Candidates for `node`, most preferred first
    fn candidates_for(&self, node: &Node) -> Vec<Target>;
}

/// Ordered list of targets offered to every node
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    targets: Vec<Target>,
    excluded: HashSet<String>,
}

impl Catalog {
    /// Catalog over `targets` in preference order
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets,
            excluded: HashSet::new(),
        }
    }

    /// Copy of this catalog with `target_id` skipped
    pub fn without(&self, target_id: &str) -> Self {
        let mut catalog = self.clone();
        catalog.excluded.insert(target_id.to_string());
        catalog
    }

    /// Look up a target by id
    pub fn get(&self, target_id: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.id == target_id)
    }

    /// Offered targets in preference order
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter().filter(|t| !self.excluded.contains(&t.id))
    }

    /// Number of offered targets
    pub fn len(&self) -> usize {
        self.targets().count()
    }

    /// Check if nothing is offered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CandidateSource for Catalog {
    fn candidates_for(&self, _node: &Node) -> Vec<Target> {
        self.targets().cloned().collect()
    }
}
