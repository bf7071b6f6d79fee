//! Complexity budget validator
//!
//! Guarantees:
//! - Pure: no state, no side effects
//! - Monotonic: admissible under c implies admissible under every c' >= c
//! - Strict: an over-budget binding is rejected, never downgraded

use crate::binding::Binding;
use crate::budget::types::{Budget, ComplexityClass};
use crate::errors::{GateError, Result};
use crate::graph::Node;

/// Checks bindings against a complexity ceiling
#[derive(Debug, Clone, Copy, Default)]
pub struct ComplexityBudgetValidator;

impl ComplexityBudgetValidator {
    /// Create a validator
    pub fn new() -> Self {
        Self
    }

    /// Admit `binding` iff its complexity class is at most `ceiling`
    pub fn validate(&self, binding: &Binding, ceiling: ComplexityClass) -> Result<()> {
        if Budget::new(ceiling).admits(binding.complexity) {
            tracing::debug!(
                node = %binding.node_id,
                target = %binding.target.id,
                complexity = %binding.complexity,
                ceiling = %ceiling,
                "binding within budget"
            );
            return Ok(());
        }

        tracing::warn!(
            node = %binding.node_id,
            target = %binding.target.id,
            complexity = %binding.complexity,
            ceiling = %ceiling,
            "binding exceeds budget"
        );
        Err(GateError::BudgetExceeded {
            node_id: binding.node_id.clone(),
            target_id: binding.target.id.clone(),
            actual: binding.complexity,
            ceiling,
        })
    }

    /// Admit `binding` iff its class is at most the node's declared auxiliary cost
    ///
    /// A node that declares no cost admits any binding.
    pub fn validate_declared(&self, binding: &Binding, node: &Node) -> Result<()> {
        let Some(declared) = node.aux_cost else {
            return Ok(());
        };
        if binding.complexity <= declared {
            return Ok(());
        }

        tracing::warn!(
            node = %node.id,
            target = %binding.target.id,
            complexity = %binding.complexity,
            declared = %declared,
            "binding exceeds declared cost"
        );
        Err(GateError::ComplexityMismatch {
            node_id: node.id.clone(),
            target_id: binding.target.id.clone(),
            actual: binding.complexity,
            declared,
        })
    }

    /// Validate every binding, stopping at the first rejection
    pub fn validate_all(&self, bindings: &[Binding], ceiling: ComplexityClass) -> Result<()> {
        bindings
            .iter()
            .try_for_each(|binding| self.validate(binding, ceiling))
    }
}
