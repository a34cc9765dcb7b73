//! Risk analysis error types.

use credit_core::{ConfigurationError, CreditError};
use thiserror::Error;

/// Errors raised by tail analysis and attribution.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RiskError {
    /// Error from input validation or the simulation engine.
    #[error(transparent)]
    Credit(#[from] CreditError),

    /// Quantile level outside the open interval (0, 1).
    #[error("Invalid quantile {0}: must lie strictly between 0 and 1")]
    InvalidQuantile(f64),

    /// Tail statistics requested on an empty loss vector.
    #[error("Loss vector is empty")]
    EmptyLosses,

    /// Group label not present in the loss matrix.
    #[error("Group not found: {0}")]
    GroupNotFound(String),

    /// Tail re-run rows do not match the parent tail indices.
    #[error("Tail re-run row {position} has index {actual}, expected {expected}")]
    TailMismatch {
        /// Row position in the re-run.
        position: usize,
        /// Global index from the parent tail.
        expected: usize,
        /// Global index found in the re-run.
        actual: usize,
    },
}

impl From<ConfigurationError> for RiskError {
    fn from(err: ConfigurationError) -> Self {
        Self::Credit(err.into())
    }
}
