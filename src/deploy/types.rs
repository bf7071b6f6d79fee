//! Deployment type definitions

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome reported by an executor for one binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionReport {
    /// Whether the deployed target behaved correctly
    pub functional_pass: bool,

    /// Measured wall-clock latency
    pub latency: Duration,

    /// Optional executor output or failure detail
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ExecutionReport {
    /// Passing report
    pub fn pass(latency: Duration) -> Self {
        Self {
            functional_pass: true,
            latency,
            detail: None,
        }
    }

    /// Failing report with a reason
    pub fn fail(latency: Duration, detail: impl Into<String>) -> Self {
        Self {
            functional_pass: false,
            latency,
            detail: Some(detail.into()),
        }
    }

    /// Attach detail text
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Latency in milliseconds
    pub fn latency_ms(&self) -> u64 {
        self.latency.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_constructors() {
        let ok = ExecutionReport::pass(Duration::from_millis(12));
        assert!(ok.functional_pass);
        assert_eq!(ok.latency_ms(), 12);
        assert!(ok.detail.is_none());

        let bad = ExecutionReport::fail(Duration::ZERO, "exit code 2");
        assert!(!bad.functional_pass);
        assert_eq!(bad.detail.as_deref(), Some("exit code 2"));
    }
}
