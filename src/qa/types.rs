//! QA ledger type definitions

use crate::graph::NodeId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Confusion-matrix bucket of one gate decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateOutcome {
    /// Valid input accepted
    TrueAccept,

    /// Invalid input rejected
    TrueReject,

    /// Invalid input let through
    FalseAccept,

    /// Valid input wrongly blocked
    FalseReject,
}

impl GateOutcome {
    /// Bucket for an (expected, actual) pair
    pub fn classify(expected: bool, actual: bool) -> Self {
        match (expected, actual) {
            (true, true) => GateOutcome::TrueAccept,
            (false, false) => GateOutcome::TrueReject,
            (false, true) => GateOutcome::FalseAccept,
            (true, false) => GateOutcome::FalseReject,
        }
    }

    /// Whether the decision matched ground truth
    pub fn is_correct(&self) -> bool {
        matches!(self, GateOutcome::TrueAccept | GateOutcome::TrueReject)
    }
}

/// One immutable ledger entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateRecord {
    /// Node the decision was about
    pub node_id: NodeId,

    /// Gate that decided
    pub gate: String,

    /// Ground-truth validity
    pub expected: bool,

    /// Actual decision (true = accept)
    pub actual: bool,

    /// Position in the ledger, starting at 0
    pub ordinal: u64,

    /// Wall-clock time of the append
    pub recorded_at: DateTime<Utc>,

    /// Bucket derived from `expected` and `actual`
    pub outcome: GateOutcome,

    /// Failure kind for rejections caused by an error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

/// Current bucket counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaMetrics {
    pub true_accept: u64,
    pub true_reject: u64,
    pub false_accept: u64,
    pub false_reject: u64,
}

impl QaMetrics {
    /// Total decisions counted
    pub fn total(&self) -> u64 {
        self.true_accept + self.true_reject + self.false_accept + self.false_reject
    }

    /// Fraction of correct decisions (1.0 when empty)
    pub fn accuracy(&self) -> f64 {
        ratio(self.true_accept + self.true_reject, self.total(), 1.0)
    }

    /// False accepts over all invalid inputs (0.0 when none)
    pub fn false_accept_rate(&self) -> f64 {
        ratio(self.false_accept, self.false_accept + self.true_reject, 0.0)
    }

    /// False rejects over all valid inputs (0.0 when none)
    pub fn false_reject_rate(&self) -> f64 {
        ratio(self.false_reject, self.false_reject + self.true_accept, 0.0)
    }

    pub(crate) fn add(&mut self, outcome: GateOutcome) {
        match outcome {
            GateOutcome::TrueAccept => self.true_accept += 1,
            GateOutcome::TrueReject => self.true_reject += 1,
            GateOutcome::FalseAccept => self.false_accept += 1,
            GateOutcome::FalseReject => self.false_reject += 1,
        }
    }
}

fn ratio(num: u64, den: u64, empty: f64) -> f64 {
    if den == 0 {
        empty
    } else {
        num as f64 / den as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_all_buckets() {
        assert_eq!(GateOutcome::classify(true, true), GateOutcome::TrueAccept);
        assert_eq!(GateOutcome::classify(false, false), GateOutcome::TrueReject);
        assert_eq!(GateOutcome::classify(false, true), GateOutcome::FalseAccept);
        assert_eq!(GateOutcome::classify(true, false), GateOutcome::FalseReject);
    }

    #[test]
    fn test_rates() {
        let metrics = QaMetrics {
            true_accept: 6,
            true_reject: 2,
            false_accept: 1,
            false_reject: 1,
        };
        assert_eq!(metrics.total(), 10);
        assert!((metrics.accuracy() - 0.8).abs() < 1e-9);
        assert!((metrics.false_accept_rate() - 1.0 / 3.0).abs() < 1e-9);
        assert!((metrics.false_reject_rate() - 1.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_rates() {
        let metrics = QaMetrics::default();
        assert_eq!(metrics.accuracy(), 1.0);
        assert_eq!(metrics.false_accept_rate(), 0.0);
        assert_eq!(metrics.false_reject_rate(), 0.0);
    }
}
