//! Budget system type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Coarse ordinal label for a binding's auxiliary-resource cost
///
/// Variant order is the total order used by every budget comparison:
/// `Constant < Logarithmic < Linear < Polynomial < Exponential`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplexityClass {
    /// O(1)
    Constant,

    /// O(log n)
    Logarithmic,

    /// O(n)
    Linear,

    /// O(n^k)
    Polynomial,

    /// O(2^n)
    Exponential,
}

impl ComplexityClass {
    /// All classes in ascending order
    pub const ALL: [ComplexityClass; 5] = [
        ComplexityClass::Constant,
        ComplexityClass::Logarithmic,
        ComplexityClass::Linear,
        ComplexityClass::Polynomial,
        ComplexityClass::Exponential,
    ];

    /// Lowercase name used in manifests, config and the CLI
    pub fn as_str(&self) -> &'static str {
        match self {
            ComplexityClass::Constant => "constant",
            ComplexityClass::Logarithmic => "logarithmic",
            ComplexityClass::Linear => "linear",
            ComplexityClass::Polynomial => "polynomial",
            ComplexityClass::Exponential => "exponential",
        }
    }

    /// Big-O notation for display
    pub fn notation(&self) -> &'static str {
        match self {
            ComplexityClass::Constant => "O(1)",
            ComplexityClass::Logarithmic => "O(log n)",
            ComplexityClass::Linear => "O(n)",
            ComplexityClass::Polynomial => "O(n^2)",
            ComplexityClass::Exponential => "O(2^n)",
        }
    }

    /// Representative cost at input size `n`
    ///
    /// Polynomial is evaluated as quadratic. The result saturates at
    /// `f64::MAX` instead of overflowing to infinity.
    pub fn cost_at(&self, n: u64) -> f64 {
        let n = n.max(1) as f64;
        let cost = match self {
            ComplexityClass::Constant => 1.0,
            ComplexityClass::Logarithmic => n.log2().max(1.0),
            ComplexityClass::Linear => n,
            ComplexityClass::Polynomial => n * n,
            ComplexityClass::Exponential => 2f64.powf(n),
        };
        cost.min(f64::MAX)
    }
}

impl fmt::Display for ComplexityClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComplexityClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "constant" | "o(1)" => Ok(ComplexityClass::Constant),
            "logarithmic" | "log" | "o(log n)" => Ok(ComplexityClass::Logarithmic),
            "linear" | "o(n)" => Ok(ComplexityClass::Linear),
            "polynomial" | "o(n^2)" => Ok(ComplexityClass::Polynomial),
            "exponential" | "o(2^n)" => Ok(ComplexityClass::Exponential),
            other => Err(format!(
                "unknown complexity class '{}' (expected constant, logarithmic, linear, polynomial or exponential)",
                other
            )),
        }
    }
}

/// Caller-declared ceiling on binding complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Highest admissible complexity class
    pub ceiling: ComplexityClass,
}

impl Budget {
    /// Create a budget with the given ceiling
    pub fn new(ceiling: ComplexityClass) -> Self {
        Self { ceiling }
    }

    /// Whether `class` is admissible under this budget
    pub fn admits(&self, class: ComplexityClass) -> bool {
        class <= self.ceiling
    }
}

impl Default for Budget {
    fn default() -> Self {
        Self::new(ComplexityClass::Logarithmic)
    }
}
