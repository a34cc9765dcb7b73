//! Error types for credit loss simulation.
//!
//! This module provides structured error types using `thiserror`:
//! - [`ConfigurationError`]: Dimension mismatches, malformed aggregation keys,
//!   out-of-bounds subset indices and invalid sizing
//! - [`NumericDomainError`]: Obligor or matrix values outside their domain
//! - [`OutOfRangeError`]: Random stream coordinates outside the declared domain
//! - [`CreditError`]: Umbrella error returned by the simulation engine
//!
//! All of these are fatal and raised before any simulation work begins.
//! Values are never clamped into range.

use thiserror::Error;

use crate::types::ObligorId;

/// Configuration errors detected while validating simulation inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// Two dimensions that must agree do not.
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which dimension was checked.
        what: &'static str,
        /// Expected size.
        expected: usize,
        /// Actual size.
        actual: usize,
    },

    /// More scenarios requested than the scenario matrix provides.
    #[error("Requested {requested} scenarios but only {available} are available")]
    ScenarioCountExceeded {
        /// Scenarios requested by the caller.
        requested: usize,
        /// Rows in the scenario matrix.
        available: usize,
    },

    /// A scenario-draw subset entry lies outside `[0, M*K)`.
    #[error("Subset index {index} at position {position} is out of bounds (domain size {bound})")]
    SubsetIndexOutOfBounds {
        /// Position of the entry in the subset.
        position: usize,
        /// Offending global index.
        index: usize,
        /// Size of the scenario-draw domain.
        bound: usize,
    },

    /// Aggregation key cannot be applied to the portfolio.
    #[error("Invalid aggregation key: {0}")]
    InvalidAggregationKey(String),

    /// Invalid sizing parameter (scenario count, draws, threads, chunk size).
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidSizing {
        /// Parameter name.
        name: &'static str,
        /// Description of the problem.
        reason: String,
    },

    /// The same obligor id appears twice in a portfolio.
    #[error("Duplicate obligor ID: {0}")]
    DuplicateObligor(ObligorId),

    /// Obligor id cannot be used as a random sub-stream selector.
    #[error("Obligor ID {0} exceeds the addressable stream range (max {max})", max = u32::MAX)]
    UnaddressableObligor(ObligorId),

    /// Obligor position outside the portfolio.
    #[error("Obligor position {position} out of bounds for portfolio of {len}")]
    PositionOutOfBounds {
        /// Requested position.
        position: usize,
        /// Portfolio size.
        len: usize,
    },

    /// Worker thread pool could not be created.
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Portfolio has no obligors where at least one is required.
    #[error("Portfolio is empty")]
    EmptyPortfolio,
}

/// Numeric values outside their mathematical domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericDomainError {
    /// Probability of default outside `[0, 1]` or not finite.
    #[error("Obligor {obligor}: probability of default {value} outside [0, 1]")]
    ProbabilityOfDefault {
        /// Offending obligor.
        obligor: ObligorId,
        /// Offending value.
        value: f64,
    },

    /// Loss given default outside `[0, 1]` or not finite.
    #[error("Obligor {obligor}: loss given default {value} outside [0, 1]")]
    LossGivenDefault {
        /// Offending obligor.
        obligor: ObligorId,
        /// Offending value.
        value: f64,
    },

    /// Negative or non-finite exposure at default.
    #[error("Obligor {obligor}: exposure at default {value} must be finite and non-negative")]
    ExposureAtDefault {
        /// Offending obligor.
        obligor: ObligorId,
        /// Offending value.
        value: f64,
    },

    /// Factor loading magnitude greater than one.
    #[error("Obligor {obligor}: factor loading {value} outside [-1, 1]{}", scenario_suffix(.scenario))]
    FactorLoading {
        /// Offending obligor.
        obligor: ObligorId,
        /// Scenario row, when the loading comes from a loading matrix.
        scenario: Option<usize>,
        /// Offending value.
        value: f64,
    },

    /// Non-finite systematic factor realisation.
    #[error("Obligor {obligor}: systematic factor {value} in scenario {scenario} is not finite")]
    NonFiniteFactor {
        /// Offending obligor.
        obligor: ObligorId,
        /// Scenario row.
        scenario: usize,
        /// Offending value.
        value: f64,
    },
}

fn scenario_suffix(scenario: &Option<usize>) -> String {
    match scenario {
        Some(m) => format!(" in scenario {}", m),
        None => String::new(),
    }
}

/// A random stream coordinate outside its declared domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Stream coordinate {axis}={index} out of range (bound {bound})")]
pub struct OutOfRangeError {
    /// Coordinate axis (`scenario`, `draw`, `scenario_draw` or `obligor`).
    pub axis: &'static str,
    /// Offending coordinate value.
    pub index: u64,
    /// Exclusive upper bound of the axis.
    pub bound: u64,
}

/// Umbrella error for simulation calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CreditError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    /// Numeric domain violation.
    #[error("Numeric domain error: {0}")]
    NumericDomain(#[from] NumericDomainError),

    /// Stream addressing outside the declared domain.
    #[error("Out of range: {0}")]
    OutOfRange(#[from] OutOfRangeError),
}
