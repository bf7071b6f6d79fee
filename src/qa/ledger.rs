//! Append-only QA ledger
//!
//! Records are never mutated after append. Counts are exact: after N
//! appends the four buckets sum to N.

use crate::errors::{GateError, Result};
use crate::qa::types::{GateOutcome, GateRecord, QaMetrics};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Correctness ledger over gate decisions
///
/// Lifetime is the caller's choice: one per run, or one shared across runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QAVerifier {
    records: Vec<GateRecord>,
    metrics: QaMetrics,
}

impl QAVerifier {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decision and return its bucket
    pub fn record(&mut self, node_id: &str, gate: &str, expected: bool, actual: bool) -> GateOutcome {
        self.append(node_id, gate, expected, actual, None)
    }

    /// Append a rejection caused by an error, keeping its kind
    pub fn record_failure(&mut self, node_id: &str, gate: &str, expected: bool, error: &GateError) -> GateOutcome {
        self.append(node_id, gate, expected, false, Some(error.kind().to_string()))
    }

    /// Current bucket counts
    pub fn metrics(&self) -> QaMetrics {
        self.metrics
    }

    /// All records in append order
    pub fn records(&self) -> &[GateRecord] {
        &self.records
    }

    /// Records about one node, in append order
    pub fn records_for<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a GateRecord> + 'a {
        self.records.iter().filter(move |r| r.node_id == node_id)
    }

    /// Records whose decision disagreed with ground truth
    pub fn mistakes(&self) -> impl Iterator<Item = &GateRecord> {
        self.records.iter().filter(|r| !r.outcome.is_correct())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Serialize the ledger as pretty JSON
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rebuild a ledger from JSON
    ///
    /// Each record's bucket is re-derived from its expected/actual pair and
    /// the counts are recomputed, so stored outcomes and totals are ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        let stored: QAVerifier = serde_json::from_str(json)?;
        let mut metrics = QaMetrics::default();
        let records = stored
            .records
            .into_iter()
            .map(|mut record| {
                let outcome = GateOutcome::classify(record.expected, record.actual);
                if outcome != record.outcome {
                    tracing::warn!(
                        node = %record.node_id,
                        ordinal = record.ordinal,
                        stored = ?record.outcome,
                        derived = ?outcome,
                        "ledger record outcome disagrees with its decision, re-deriving"
                    );
                    record.outcome = outcome;
                }
                metrics.add(outcome);
                record
            })
            .collect();
        Ok(Self { records, metrics })
    }

    /// Write the ledger to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Read a ledger from `path`
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    fn append(
        &mut self,
        node_id: &str,
        gate: &str,
        expected: bool,
        actual: bool,
        failure: Option<String>,
    ) -> GateOutcome {
        let outcome = GateOutcome::classify(expected, actual);
        let record = GateRecord {
            node_id: node_id.to_string(),
            gate: gate.to_string(),
            expected,
            actual,
            ordinal: self.records.len() as u64,
            recorded_at: Utc::now(),
            outcome,
            failure,
        };

        match outcome {
            GateOutcome::FalseAccept | GateOutcome::FalseReject => {
                tracing::warn!(node = %node_id, gate = %gate, outcome = ?outcome, "gate decision disagrees with ground truth");
            }
            _ => tracing::debug!(node = %node_id, gate = %gate, outcome = ?outcome, "gate decision recorded"),
        }

        self.metrics.add(outcome);
        self.records.push(record);
        outcome
    }
}
