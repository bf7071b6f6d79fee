//! bindgate - Dependency-ordered problem binding with auditable gates
//!
//! Problems are classified into nodes of an acyclic dependency graph, bound
//! to implementation targets in dependency order, checked against a
//! complexity budget and deployed through a caller-supplied executor. Every
//! gate decision lands in an append-only QA ledger.
//!
//! # Architecture
//!
//! - **Graph**: acyclic node store + topological ordering
//! - **Classifier / Binding / Budget**: per-node gates before deployment
//! - **Deploy / QA**: execution and decision audit
//! - **Pipeline**: per-run orchestration and state machine

pub mod errors;
pub mod graph;
pub mod classifier;
pub mod binding;
pub mod budget;
pub mod deploy;
pub mod qa;
pub mod pipeline;

// Re-export commonly used types
pub use errors::{GateError, Result};

// Ambient layers for the binary
pub mod telemetry;
pub mod manifest;
pub mod cli;
