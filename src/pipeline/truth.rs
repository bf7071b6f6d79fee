//! Ground truth for gate decisions
//!
//! Expected validity is only knowable in tests or simulation. Production
//! callers use `ExpectAccept`, which turns every rejection into a false
//! reject for later audit.

use crate::graph::NodeId;
use crate::pipeline::types::GateKind;
use std::collections::HashMap;

/// Supplies the expected decision for a (node, gate) pair
pub trait GroundTruth: Send + Sync {
    /// Whether the gate should accept `node_id`
    fn expected(&self, node_id: &str, gate: GateKind) -> bool;
}

/// Expects every gate to accept
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpectAccept;

impl GroundTruth for ExpectAccept {
    fn expected(&self, _node_id: &str, _gate: GateKind) -> bool {
        true
    }
}

/// Explicit expectations with a fallback
#[derive(Debug, Clone)]
pub struct ExpectationTable {
    default: bool,
    entries: HashMap<(NodeId, GateKind), bool>,
}

impl ExpectationTable {
    /// Table answering `default` for unlisted pairs
    pub fn new(default: bool) -> Self {
        Self {
            default,
            entries: HashMap::new(),
        }
    }

    /// Set the expectation for one pair
    pub fn expect(mut self, node_id: impl Into<NodeId>, gate: GateKind, valid: bool) -> Self {
        self.entries.insert((node_id.into(), gate), valid);
        self
    }
}

impl Default for ExpectationTable {
    fn default() -> Self {
        Self::new(true)
    }
}

impl GroundTruth for ExpectationTable {
    fn expected(&self, node_id: &str, gate: GateKind) -> bool {
        self.entries
            .get(&(node_id.to_string(), gate))
            .copied()
            .unwrap_or(self.default)
    }
}
