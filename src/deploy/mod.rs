//! Deployment gate
//! Runs validated bindings through an external executor exactly once each

pub mod executor;
pub mod gate;
pub mod types;

pub use executor::{CommandExecutor, DryRunExecutor, Executor};
pub use gate::DeploymentGate;
pub use types::ExecutionReport;
