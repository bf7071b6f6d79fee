//! Problem classification
//! Maps problem descriptors to graph nodes using caller-supplied domain rules

pub mod rules;
pub mod types;

pub use rules::{DomainRule, ProblemClassifier};
pub use types::Problem;
