//! Gate decision auditing
//! Four-bucket correctness ledger over every gate decision

pub mod ledger;
pub mod types;

pub use ledger::QAVerifier;
pub use types::{GateOutcome, GateRecord, QaMetrics};
