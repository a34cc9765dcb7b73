//! # credit_kernel: Simulation Layer for Credit Loss Monte Carlo
//!
//! ## Layer 2 (Kernel) Role
//!
//! Computes the loss distribution of a portfolio under the single-factor
//! structural default model:
//! - Counter-based random streams addressed by `(scenario, draw, obligor)`
//!   (`rng`)
//! - Default threshold and per-unit loss (`loss`)
//! - Obligor to output-column grouping (`aggregation`)
//! - Rayon-parallel loss matrix generation (`engine`)
//!
//! The same seed reproduces bit-identical losses for the full portfolio, an
//! obligor subset or a subset of scenario-draw indices, on any number of
//! threads.
//!
//! ## Usage Example
//!
//! ```rust
//! use credit_core::synthetic::SyntheticPortfolioConfig;
//! use credit_kernel::{simulate, AggregationKey};
//!
//! let data = SyntheticPortfolioConfig {
//!     n_obligors: 20,
//!     n_scenarios: 50,
//!     ..Default::default()
//! }
//! .generate()
//! .unwrap();
//!
//! let losses = simulate(
//!     &data.portfolio,
//!     &data.scenarios,
//!     50,
//!     4,
//!     AggregationKey::Rating,
//!     None,
//!     42,
//!     Some(2),
//! )
//! .unwrap();
//! assert_eq!(losses.rows(), 200);
//! ```
//!
//! ## Feature Flags
//!
//! - `serde`: Serialisation for [`LossMatrix`] and [`GroupLabel`]

#![warn(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod aggregation;
pub mod engine;
pub mod loss;
pub mod rng;

pub use aggregation::{AggregationKey, GroupLabel, GroupLayout};
pub use engine::{simulate, LossMatrix, SimulationConfig, SimulationEngine};
