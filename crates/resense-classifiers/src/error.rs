use std::error::Error;
use std::fmt;

/// Custom error type for cross-validated lambda selection failures.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectError {
    /// A precondition on shapes or label cardinality was violated. Fatal,
    /// raised before any fold work begins.
    InvalidInput(String),
    /// A fit failed to converge for one lambda. Recovered per (fold, lambda)
    /// cell during cross-validation; fatal only at the final refit.
    NumericalFailure { lambda: f64, detail: String },
    /// No lambda had enough valid folds to be eligible for selection.
    UnreliableSelection { min_valid_folds: usize },
}

impl fmt::Display for SelectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SelectError::InvalidInput(msg) => write!(f, "invalid input: {}", msg),
            SelectError::NumericalFailure { lambda, detail } => {
                write!(f, "fit failed for lambda {}: {}", lambda, detail)
            }
            SelectError::UnreliableSelection { min_valid_folds } => write!(
                f,
                "no lambda candidate reached the minimum of {} valid folds",
                min_valid_folds
            ),
        }
    }
}

impl Error for SelectError {}
