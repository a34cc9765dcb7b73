//! # credit_risk: Tail Risk and Attribution (Layer 3)
//!
//! Consumes loss matrices from `credit_kernel` and provides:
//! - Value at Risk and Expected Shortfall with reproducible tail indices
//!   (`tail`)
//! - ES decomposition into group contributions (`contributions`)
//! - The drill-down workflow: portfolio run, tail extraction, tail-subset
//!   re-run, contributions (`attribution`)
//! - Wall-clock timing of pipeline steps (`timing`)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            credit_risk (L3)             │
//! │  tail/ contributions/ attribution/      │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │           credit_kernel (L2)            │
//! │  addressed RNG, loss model, engine      │
//! └─────────────────────────────────────────┘
//!          ↓
//! ┌─────────────────────────────────────────┐
//! │            credit_core (L1)             │
//! │  obligors, matrices, normal maths       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use credit_core::synthetic::SyntheticPortfolioConfig;
//! use credit_kernel::{simulate, AggregationKey};
//! use credit_risk::tail::{Quantile, TailAnalyzer};
//!
//! let data = SyntheticPortfolioConfig { n_obligors: 10, n_scenarios: 200, ..Default::default() }
//!     .generate()
//!     .unwrap();
//! let losses = simulate(
//!     &data.portfolio,
//!     &data.scenarios,
//!     200,
//!     5,
//!     AggregationKey::Portfolio,
//!     None,
//!     1,
//!     None,
//! )
//! .unwrap();
//!
//! let tail = TailAnalyzer::new(Quantile::ES99).analyze_totals(&losses).unwrap();
//! assert!(tail.tail_indices.len() >= 10);
//! assert!(tail.expected_shortfall >= tail.value_at_risk);
//! ```

#![warn(missing_docs)]

pub mod attribution;
pub mod contributions;
pub mod error;
pub mod tail;
pub mod timing;

pub use attribution::RiskAttribution;
pub use contributions::{Contribution, ContributionReport};
pub use error::RiskError;
pub use tail::{expected_shortfall, tail_rows, value_at_risk, Quantile, TailAnalysis, TailAnalyzer};
pub use timing::timed;
