//! Binding type definitions

use crate::budget::ComplexityClass;
use crate::graph::NodeId;
use serde::{Deserialize, Serialize};

/// Candidate implementation target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Target {
    /// Opaque target identifier
    pub id: String,

    /// Declared complexity class
    pub complexity: ComplexityClass,

    /// Domains this target serves; empty means any domain
    #[serde(default)]
    pub domains: Vec<String>,

    /// Shell command run by the command executor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

impl Target {
    /// Create a target with no domain restriction or command
    pub fn new(id: impl Into<String>, complexity: ComplexityClass) -> Self {
        Self {
            id: id.into(),
            complexity,
            domains: Vec::new(),
            command: None,
        }
    }

    /// Restrict the target to the given domains
    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = domains.into_iter().map(Into::into).collect();
        self
    }

    /// Attach a command
    pub fn with_command(mut self, command: impl Into<String>) -> Self {
        self.command = Some(command.into());
        self
    }

    /// Declared complexity class
    pub fn complexity_of(&self) -> ComplexityClass {
        self.complexity
    }

    /// Whether the target lists `domain`, or lists nothing
    pub fn serves(&self, domain: &str) -> bool {
        self.domains.is_empty() || self.domains.iter().any(|d| d == domain)
    }
}

/// A node matched to a compatible target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Bound node
    pub node_id: NodeId,

    /// Domain of the bound node
    pub domain: String,

    /// Chosen target
    pub target: Target,

    /// Compatibility predicate result at resolution time
    pub compatible: bool,

    /// Declared complexity class of the chosen target
    pub complexity: ComplexityClass,
}

impl Binding {
    /// Chosen target id
    pub fn target_id(&self) -> &str {
        &self.target.id
    }
}
