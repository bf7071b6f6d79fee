//! Gate pipeline
//!
//! Ties the classifier, graph, resolver, budget validator and deployment gate
//! together for one root per run, auditing every gate into the QA ledger.

pub mod runner;
pub mod state;
pub mod truth;
pub mod types;

pub use runner::Pipeline;
pub use state::{RunEvent, RunState};
pub use truth::{ExpectAccept, ExpectationTable, GroundTruth};
pub use types::{GateKind, NodeDeployment, Plan, RunReport};
