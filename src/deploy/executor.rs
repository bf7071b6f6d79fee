//! Executor capability and built-in executors
//!
//! The executor is the side-effecting boundary of the pipeline. The gate
//! calls it at most once per binding; anything it returns as `Err` reaches
//! the caller unchanged inside `GateError::Deploy`.

use crate::binding::Binding;
use crate::deploy::types::ExecutionReport;
use crate::errors::ExecutorError;
use async_trait::async_trait;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;

/// Performs the actual deployment of a binding
#[async_trait]
pub trait Executor: Send + Sync {
    /// Deploy `binding` and report functional and latency results
    async fn execute(&self, binding: &Binding) -> std::result::Result<ExecutionReport, ExecutorError>;
}

/// Reports a pass for every binding without side effects
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl Executor for DryRunExecutor {
    async fn execute(&self, binding: &Binding) -> std::result::Result<ExecutionReport, ExecutorError> {
        Ok(ExecutionReport::pass(Duration::ZERO)
            .with_detail(format!("dry run: {} -> {}", binding.node_id, binding.target.id)))
    }
}

/// Runs the target's `command` through the platform shell
///
/// A zero exit status is a functional pass. A missing command, a spawn
/// failure or an expired deadline is an executor error.
#[derive(Debug, Clone)]
pub struct CommandExecutor {
    timeout: Duration,
}

impl CommandExecutor {
    /// Executor with a per-command deadline
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Per-command deadline
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn shell(command: &str) -> Command {
        #[cfg(unix)]
        {
            let mut c = Command::new("sh");
            c.arg("-c").arg(command);
            c
        }
        #[cfg(windows)]
        {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(command);
            c
        }
    }
}

impl Default for CommandExecutor {
    fn default() -> Self {
        Self::new(Duration::from_secs(60))
    }
}

#[async_trait]
impl Executor for CommandExecutor {
    async fn execute(&self, binding: &Binding) -> std::result::Result<ExecutionReport, ExecutorError> {
        let command = binding
            .target
            .command
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| format!("target {} has no command", binding.target.id))?;

        let mut cmd = Self::shell(command);
        cmd.kill_on_drop(true);

        let start = Instant::now();
        let output = match timeout(self.timeout, cmd.output()).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(format!(
                    "command for target {} timed out after {}ms",
                    binding.target.id,
                    self.timeout.as_millis()
                )
                .into())
            }
        };
        let latency = start.elapsed();

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if output.status.success() {
            return Ok(ExecutionReport::pass(latency).with_detail(stdout));
        }

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        let code = output.status.code().unwrap_or(-1);
        Ok(ExecutionReport::fail(
            latency,
            format!("exit code {}: {}", code, if stderr.is_empty() { stdout } else { stderr }),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::Target;
    use crate::budget::ComplexityClass;

    fn binding(command: Option<&str>) -> Binding {
        let mut target = Target::new("sh", ComplexityClass::Constant);
        target.command = command.map(String::from);
        Binding {
            node_id: "n1".to_string(),
            domain: "iaas".to_string(),
            target,
            compatible: true,
            complexity: ComplexityClass::Constant,
        }
    }

    #[tokio::test]
    async fn test_dry_run_passes() {
        let report = DryRunExecutor.execute(&binding(None)).await.unwrap();
        assert!(report.functional_pass);
        assert_eq!(report.latency, Duration::ZERO);
    }

    #[tokio::test]
    async fn test_missing_command_is_error() {
        let err = CommandExecutor::default().execute(&binding(None)).await.unwrap_err();
        assert!(err.to_string().contains("no command"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_success() {
        let report = CommandExecutor::default()
            .execute(&binding(Some("echo deployed")))
            .await
            .unwrap();
        assert!(report.functional_pass);
        assert_eq!(report.detail.as_deref(), Some("deployed"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_failure_is_report() {
        let report = CommandExecutor::default()
            .execute(&binding(Some("exit 3")))
            .await
            .unwrap();
        assert!(!report.functional_pass);
        assert!(report.detail.unwrap().contains("exit code 3"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_timeout_is_error() {
        let executor = CommandExecutor::new(Duration::from_millis(50));
        let err = executor.execute(&binding(Some("sleep 5"))).await.unwrap_err();
        assert!(err.to_string().contains("timed out after 50ms"));
    }
}
