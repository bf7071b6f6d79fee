//! Binding resolution
//! Matches a classified node to the first compatible implementation target

pub mod catalog;
pub mod resolver;
pub mod types;

pub use catalog::{CandidateSource, Catalog};
pub use resolver::{AcceptAll, BindingResolver, Compatibility, DomainTable};
pub use types::{Binding, Target};
