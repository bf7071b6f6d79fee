//! Pipeline type definitions

use crate::binding::Binding;
use crate::deploy::ExecutionReport;
use crate::errors::GateError;
use crate::graph::NodeId;
use crate::pipeline::state::RunState;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Gates whose decisions are audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GateKind {
    Classify,
    Resolve,
    Budget,
    /// Binding class against the node's declared auxiliary cost, when enabled
    Declared,
    Deploy,
}

impl GateKind {
    /// Gate name stored in the ledger
    pub fn as_str(&self) -> &'static str {
        match self {
            GateKind::Classify => "classify",
            GateKind::Resolve => "resolve",
            GateKind::Budget => "budget",
            GateKind::Declared => "declared",
            GateKind::Deploy => "deploy",
        }
    }
}

impl fmt::Display for GateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Bindings for a root's dependency order, all within budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plan {
    /// Root node
    pub root: NodeId,

    /// Topological order, dependencies first
    pub order: Vec<NodeId>,

    /// One binding per node, in `order`
    pub bindings: Vec<Binding>,
}

/// Deployment outcome for one node
#[derive(Debug, Clone)]
pub struct NodeDeployment {
    pub node_id: NodeId,
    pub target_id: String,
    pub report: ExecutionReport,
    pub accepted: bool,
}

/// Outcome of one pipeline run
#[derive(Debug)]
pub struct RunReport {
    /// Run identifier
    pub run_id: Uuid,

    /// Root node of the run
    pub root: NodeId,

    /// Final state
    pub state: RunState,

    /// Bindings produced by planning (empty if planning failed)
    pub bindings: Vec<Binding>,

    /// Deployments performed, in order
    pub deployments: Vec<NodeDeployment>,

    /// Error that stopped the run
    pub error: Option<GateError>,
}

impl RunReport {
    pub(crate) fn new(root: NodeId, state: RunState) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            root,
            state,
            bindings: Vec::new(),
            deployments: Vec::new(),
            error: None,
        }
    }

    /// Whether the run reached `Verified`
    pub fn is_verified(&self) -> bool {
        self.state == RunState::Verified
    }

    /// Total executor latency across deployments
    pub fn total_latency_ms(&self) -> u64 {
        self.deployments.iter().map(|d| d.report.latency_ms()).sum()
    }
}
