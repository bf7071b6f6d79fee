//! Complexity budget gate
//! Admits a binding only when its declared complexity class sits at or below
//! the caller's ceiling under the fixed total order.

pub mod types;
pub mod validator;

pub use types::{Budget, ComplexityClass};
pub use validator::ComplexityBudgetValidator;
