//! Error types for bindgate
//!
//! Every pipeline stage returns a `Result` whose error names the exact
//! failure kind. No stage recovers from another stage's error.

use crate::budget::ComplexityClass;
use crate::graph::NodeId;
use thiserror::Error;

/// Failure reported by an external executor, carried through unchanged
pub type ExecutorError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for the gate pipeline
#[derive(Error, Debug)]
pub enum GateError {
    /// Insertion would close a dependency cycle
    #[error("Dependency cycle detected: {}", format_cycle(.cycle))]
    Cycle { cycle: Vec<NodeId> },

    /// Referenced node id is absent from the graph
    #[error("Node not found: {id}")]
    NotFound { id: NodeId },

    /// Insertion would leave a node deeper than the graph's depth limit
    #[error("Node {id} would sit at dependency depth {depth}, above the limit of {limit}")]
    DepthExceeded { id: NodeId, depth: usize, limit: usize },

    /// Removal blocked by nodes that still depend on this one
    #[error("Node {id} is still required by: {}", .dependents.join(", "))]
    InUse { id: NodeId, dependents: Vec<NodeId> },

    /// No candidate target satisfied the compatibility predicate
    #[error("No compatible target for node {node_id}")]
    NoCandidate { node_id: NodeId },

    /// Binding complexity above the caller's ceiling
    #[error("Target {target_id} for node {node_id} is {actual}, exceeds ceiling {ceiling}")]
    BudgetExceeded {
        node_id: NodeId,
        target_id: String,
        actual: ComplexityClass,
        ceiling: ComplexityClass,
    },

    /// Binding complexity above the node's declared auxiliary cost
    #[error("Target {target_id} for node {node_id} is {actual}, above the declared {declared}")]
    ComplexityMismatch {
        node_id: NodeId,
        target_id: String,
        actual: ComplexityClass,
        declared: ComplexityClass,
    },

    /// Executor failed while deploying a binding
    #[error("Deployment of node {node_id} failed: {source}")]
    Deploy {
        node_id: NodeId,
        #[source]
        source: ExecutorError,
    },

    /// Executor did not finish before the deadline; the run was abandoned
    #[error("Deployment of node {node_id} timed out after {duration_ms}ms")]
    Timeout { node_id: NodeId, duration_ms: u64 },

    /// Run state machine misuse
    #[error("Invalid run transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Manifest parse or content errors
    #[error("Manifest error: {0}")]
    ManifestError(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic errors with context
    #[error("Gate error: {0}")]
    Generic(String),
}

impl GateError {
    /// Short stable name of the failure kind, stored in the QA ledger
    pub fn kind(&self) -> &'static str {
        match self {
            GateError::Cycle { .. } => "cycle",
            GateError::NotFound { .. } => "not_found",
            GateError::DepthExceeded { .. } => "depth_exceeded",
            GateError::InUse { .. } => "in_use",
            GateError::NoCandidate { .. } => "no_candidate",
            GateError::BudgetExceeded { .. } => "budget_exceeded",
            GateError::ComplexityMismatch { .. } => "complexity_mismatch",
            GateError::Deploy { .. } => "deploy",
            GateError::Timeout { .. } => "timeout",
            GateError::InvalidTransition { .. } => "invalid_transition",
            GateError::ConfigError(_) => "config",
            GateError::ManifestError(_) => "manifest",
            GateError::IoError(_) => "io",
            GateError::SerializationError(_) => "serialization",
            GateError::Generic(_) => "generic",
        }
    }
}

fn format_cycle(cycle: &[NodeId]) -> String {
    match cycle.first() {
        Some(first) => format!("{} -> {}", cycle.join(" -> "), first),
        None => String::new(),
    }
}

/// Result type alias for gate operations
pub type Result<T> = std::result::Result<T, GateError>;

/// Convert anyhow errors to GateError
impl From<anyhow::Error> for GateError {
    fn from(err: anyhow::Error) -> Self {
        GateError::Generic(err.to_string())
    }
}
