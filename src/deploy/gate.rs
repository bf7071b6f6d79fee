//! Deployment gate
//!
//! The gate never retries: one binding, one executor call. Retrying a
//! deployment is a caller decision because executor side effects need not be
//! idempotent.

use crate::binding::Binding;
use crate::deploy::executor::Executor;
use crate::deploy::types::ExecutionReport;
use crate::errors::{GateError, Result};
use std::time::Duration;

/// Drives a validated binding through an executor
#[derive(Debug, Clone, Default)]
pub struct DeploymentGate {
    /// Latency above which a passing report is still rejected
    max_latency: Option<Duration>,
}

impl DeploymentGate {
    /// Gate without a latency bound
    pub fn new() -> Self {
        Self::default()
    }

    /// Gate that also rejects reports slower than `max_latency`
    pub fn with_max_latency(max_latency: Duration) -> Self {
        Self {
            max_latency: Some(max_latency),
        }
    }

    /// Configured latency bound
    pub fn max_latency(&self) -> Option<Duration> {
        self.max_latency
    }

    /// Invoke the executor once and return its report
    ///
    /// An executor error becomes `GateError::Deploy` with the original error
    /// as its source.
    pub async fn deploy<E>(&self, binding: &Binding, executor: &E) -> Result<ExecutionReport>
    where
        E: Executor + ?Sized,
    {
        tracing::info!(node = %binding.node_id, target = %binding.target.id, "deploying binding");
        match executor.execute(binding).await {
            Ok(report) => {
                tracing::debug!(
                    node = %binding.node_id,
                    functional_pass = report.functional_pass,
                    latency_ms = report.latency_ms(),
                    "executor reported"
                );
                Ok(report)
            }
            Err(source) => {
                tracing::warn!(node = %binding.node_id, error = %source, "executor failed");
                Err(GateError::Deploy {
                    node_id: binding.node_id.clone(),
                    source,
                })
            }
        }
    }

    /// `deploy` with a deadline
    ///
    /// On expiry the executor future is dropped and `Timeout` is returned.
    /// Nothing outside the executor is touched, so graph and ledger stay
    /// valid.
    pub async fn deploy_with_timeout<E>(
        &self,
        binding: &Binding,
        executor: &E,
        deadline: Duration,
    ) -> Result<ExecutionReport>
    where
        E: Executor + ?Sized,
    {
        match tokio::time::timeout(deadline, self.deploy(binding, executor)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(node = %binding.node_id, deadline_ms = deadline.as_millis() as u64, "deployment abandoned");
                Err(GateError::Timeout {
                    node_id: binding.node_id.clone(),
                    duration_ms: deadline.as_millis() as u64,
                })
            }
        }
    }

    /// Gate decision for a report: functional pass within the latency bound
    pub fn accepts(&self, report: &ExecutionReport) -> bool {
        report.functional_pass
            && self
                .max_latency
                .map_or(true, |bound| report.latency <= bound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Target;
    use crate::budget::ComplexityClass;
    use crate::errors::ExecutorError;
    use async_trait::async_trait;
    use std::error::Error as _;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl Executor for Counting {
        async fn execute(&self, _binding: &Binding) -> std::result::Result<ExecutionReport, ExecutorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(Box::new(std::io::Error::new(std::io::ErrorKind::Other, "node unreachable")))
            } else {
                Ok(ExecutionReport::pass(Duration::from_millis(5)))
            }
        }
    }

    struct Stalled;

    #[async_trait]
    impl Executor for Stalled {
        async fn execute(&self, _binding: &Binding) -> std::result::Result<ExecutionReport, ExecutorError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(ExecutionReport::pass(Duration::from_secs(30)))
        }
    }

    fn binding() -> Binding {
        Binding {
            node_id: "n1".to_string(),
            domain: "iaas".to_string(),
            target: Target::new("rs", ComplexityClass::Logarithmic),
            compatible: true,
            complexity: ComplexityClass::Logarithmic,
        }
    }

    #[tokio::test]
    async fn test_invokes_executor_once() {
        let executor = Counting { calls: AtomicUsize::new(0), fail: false };
        let report = DeploymentGate::new().deploy(&binding(), &executor).await.unwrap();
        assert!(report.functional_pass);
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failure_not_retried_and_preserved() {
        let executor = Counting { calls: AtomicUsize::new(0), fail: true };
        let err = DeploymentGate::new().deploy(&binding(), &executor).await.unwrap_err();
        assert_eq!(executor.calls.load(Ordering::SeqCst), 1);
        assert!(matches!(err, GateError::Deploy { ref node_id, .. } if node_id == "n1"));
        assert_eq!(err.source().unwrap().to_string(), "node unreachable");
    }

    #[tokio::test]
    async fn test_timeout_abandons_run() {
        let err = DeploymentGate::new()
            .deploy_with_timeout(&binding(), &Stalled, Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, GateError::Timeout { duration_ms: 100, .. }));
    }

    #[test]
    fn test_latency_bound_decision() {
        let gate = DeploymentGate::with_max_latency(Duration::from_millis(10));
        assert!(gate.accepts(&ExecutionReport::pass(Duration::from_millis(10))));
        assert!(!gate.accepts(&ExecutionReport::pass(Duration::from_millis(11))));
        assert!(!gate.accepts(&ExecutionReport::fail(Duration::ZERO, "bad")));
        assert!(DeploymentGate::new().accepts(&ExecutionReport::pass(Duration::from_secs(60))));
    }
}
