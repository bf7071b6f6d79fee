//! First-match binding resolver
//!
//! Candidates are scanned in caller order and the first compatible one wins.
//! Order encodes preference; no scoring or best-fit search is done, and the
//! complexity budget is a separate gate.

use crate::binding::types::{Binding, Target};
use crate::errors::{GateError, Result};
use crate::graph::Node;

/// Caller-supplied compatibility predicate
pub trait Compatibility: Send + Sync {
    /// Whether `target` can implement a node of `domain`
    fn compatible(&self, domain: &str, target: &Target) -> bool;
}

impl<F> Compatibility for F
where
    F: Fn(&str, &Target) -> bool + Send + Sync,
{
    fn compatible(&self, domain: &str, target: &Target) -> bool {
        self(domain, target)
    }
}

/// Accepts every target
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Compatibility for AcceptAll {
    fn compatible(&self, _domain: &str, _target: &Target) -> bool {
        true
    }
}

/// Accepts targets whose `domains` list serves the node's domain
#[derive(Debug, Clone, Copy, Default)]
pub struct DomainTable;

impl Compatibility for DomainTable {
    fn compatible(&self, domain: &str, target: &Target) -> bool {
        target.serves(domain)
    }
}

/// Selects the first compatible candidate for a node
#[derive(Debug, Clone, Default)]
pub struct BindingResolver<C = DomainTable> {
    predicate: C,
}

impl<C: Compatibility> BindingResolver<C> {
    /// Resolver using `predicate`
    pub fn new(predicate: C) -> Self {
        Self { predicate }
    }

    /// Predicate reference
    pub fn predicate(&self) -> &C {
        &self.predicate
    }

    /// Bind `node` to the first compatible candidate
    ///
    /// Fails with `NoCandidate` when nothing qualifies, including an empty
    /// candidate list. Never mutates the graph.
    pub fn resolve(&self, node: &Node, candidates: &[Target]) -> Result<Binding> {
        let chosen = candidates
            .iter()
            .find(|target| self.predicate.compatible(&node.domain, target));

        match chosen {
            Some(target) => {
                tracing::debug!(node = %node.id, target = %target.id, "binding resolved");
                Ok(Binding {
                    node_id: node.id.clone(),
                    domain: node.domain.clone(),
                    target: target.clone(),
                    compatible: true,
                    complexity: target.complexity_of(),
                })
            }
            None => {
                tracing::warn!(node = %node.id, candidates = candidates.len(), "no compatible target");
                Err(GateError::NoCandidate {
                    node_id: node.id.clone(),
                })
            }
        }
    }
}
