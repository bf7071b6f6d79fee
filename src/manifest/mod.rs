//! Problem and target manifests
//!
//! A manifest declares the problems to submit and the targets to offer them,
//! in TOML by default or JSON when the file ends in `.json`.

use crate::binding::{Catalog, Target};
use crate::classifier::{Problem, ProblemClassifier};
use crate::errors::{GateError, Result};
use crate::graph::{DependencyGraph, NodeId};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Problems and targets loaded from one file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub problems: Vec<Problem>,
    #[serde(default)]
    pub targets: Vec<Target>,
}

impl Manifest {
    /// Load a manifest, choosing the format by extension
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GateError::ManifestError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("json"));

        let manifest = if is_json {
            Self::from_json(&contents)?
        } else {
            Self::from_toml(&contents)?
        };

        tracing::debug!(
            path = %path.display(),
            problems = manifest.problems.len(),
            targets = manifest.targets.len(),
            "manifest loaded"
        );
        Ok(manifest)
    }

    /// Parse TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| GateError::ManifestError(format!("Failed to parse manifest: {}", e)))
    }

    /// Parse JSON text
    pub fn from_json(contents: &str) -> Result<Self> {
        serde_json::from_str(contents)
            .map_err(|e| GateError::ManifestError(format!("Failed to parse manifest: {}", e)))
    }

    /// Targets as a catalog, in declaration order
    pub fn catalog(&self) -> Catalog {
        Catalog::new(self.targets.clone())
    }

    /// Look up a declared problem
    pub fn problem(&self, id: &str) -> Option<&Problem> {
        self.problems.iter().find(|p| p.id == id)
    }

    /// Submit every problem as one batch
    ///
    /// Problems may be listed in any order; the batch is rejected whole if it
    /// names a missing dependency or closes a cycle.
    pub fn into_graph(&self, classifier: &ProblemClassifier) -> Result<DependencyGraph> {
        let mut graph = DependencyGraph::new();
        self.submit(classifier, &mut graph)?;
        Ok(graph)
    }

    /// Submit every problem into an existing graph
    pub fn submit(&self, classifier: &ProblemClassifier, graph: &mut DependencyGraph) -> Result<Vec<NodeId>> {
        classifier.submit_all(graph, &self.problems)
    }
}
