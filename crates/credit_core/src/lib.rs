//! # credit_core: Foundation Layer for Credit Loss Simulation
//!
//! ## Layer 1 (Foundation) Role
//!
//! credit_core is the bottom layer of the workspace, providing:
//! - Obligor and portfolio types with stable identifiers (`types`)
//! - Flat row-major factor and loading matrices (`types::matrix`)
//! - Standard normal distribution functions, including the inverse CDF used
//!   for default thresholds (`math::distributions`)
//! - Structured error types shared by every layer (`error`)
//! - A seeded synthetic portfolio and scenario generator (`synthetic`)
//!
//! ## Dependency Principle
//!
//! Layer 1 has no dependencies on other credit_* crates:
//! - num-traits: Generic numerical computation for the distribution functions
//! - rand / rand_distr: Synthetic data generation only
//! - thiserror: Error derivation
//! - serde: Serialisation support (optional)
//!
//! ## Usage Examples
//!
//! ```rust
//! use credit_core::types::{FactorMatrix, Obligor, ObligorId, Portfolio, RatingGroup, ScenarioSet};
//!
//! let obligors = vec![
//!     Obligor::new(ObligorId::new(1), 0.05, 100.0, 0.6, 0.5, RatingGroup::new("BBB")).unwrap(),
//!     Obligor::new(ObligorId::new(2), 0.20, 50.0, 0.4, 0.3, RatingGroup::new("B")).unwrap(),
//! ];
//! let portfolio = Portfolio::new(obligors).unwrap();
//!
//! let factors = FactorMatrix::column_constant(&[-1.5, 0.0, 1.0], portfolio.len());
//! let scenarios = ScenarioSet::with_obligor_loadings(factors, &portfolio).unwrap();
//!
//! assert_eq!(scenarios.n_scenarios(), 3);
//! assert_eq!(scenarios.n_obligors(), 2);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Enable serialisation for identifiers, obligors and matrices

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod error;
pub mod math;
pub mod synthetic;
pub mod types;

pub use error::{ConfigurationError, CreditError, NumericDomainError, OutOfRangeError};
