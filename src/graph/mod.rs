//! Dependency graph of nodes with strict acyclicity
//! Provides insert-time cycle rejection and deterministic topological ordering

pub mod dag;
pub mod shared;
pub mod types;

pub use dag::DependencyGraph;
pub use shared::SharedGraph;
pub use types::{Node, NodeId};
