//! CLI error types.

use credit_core::{ConfigurationError, CreditError};
use credit_risk::RiskError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors raised by `credit-mc` commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file or environment problem.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Simulation input or engine failure.
    #[error(transparent)]
    Credit(#[from] CreditError),

    /// Tail analysis or attribution failure.
    #[error(transparent)]
    Risk(#[from] RiskError),

    /// Bad command-line argument.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Self-test mismatch reported by `check`.
    #[error("Self-test failed: {0}")]
    SelfTest(String),

    /// File or stream I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV report writing failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON report writing failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<ConfigurationError> for CliError {
    fn from(err: ConfigurationError) -> Self {
        Self::Credit(err.into())
    }
}

/// Result alias for CLI commands.
pub type Result<T> = std::result::Result<T, CliError>;
