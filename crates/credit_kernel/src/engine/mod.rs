//! # Parallel Simulation Engine
//!
//! Expands the work domain `{(m, k, j)}`, computes each unit's loss from its
//! addressed random stream and aggregates the result into a [`LossMatrix`].
//!
//! ## Execution Flow
//!
//! 1. Validate the scenario set, obligor ids, subset and aggregation key
//!    (no work starts if any check fails)
//! 2. Resolve output rows: the subset in its given order, else every `mk`
//!    ascending
//! 3. Fill rows in parallel chunks; within a row obligors are summed in
//!    portfolio order
//!
//! Step 3 makes the output bit-identical for every thread count and chunk
//! size, and makes a subset row equal to the same row of a full run.
//!
//! ## Usage Example
//!
//! ```rust
//! use credit_core::types::{FactorMatrix, Obligor, ObligorId, Portfolio, RatingGroup, ScenarioSet};
//! use credit_kernel::engine::{SimulationConfig, SimulationEngine};
//!
//! let portfolio = Portfolio::new(vec![
//!     Obligor::new(ObligorId::new(1), 0.05, 100.0, 0.6, 0.5, RatingGroup::new("BBB")).unwrap(),
//!     Obligor::new(ObligorId::new(2), 0.20, 50.0, 0.4, 0.3, RatingGroup::new("B")).unwrap(),
//! ])
//! .unwrap();
//! let factors = FactorMatrix::column_constant(&[-1.5, 0.0, 1.0], portfolio.len());
//! let scenarios = ScenarioSet::with_obligor_loadings(factors, &portfolio).unwrap();
//!
//! let config = SimulationConfig::builder()
//!     .n_scenarios(3)
//!     .draws_per_scenario(2)
//!     .seed(2024)
//!     .build()
//!     .unwrap();
//! let losses = SimulationEngine::new(config).simulate(&portfolio, &scenarios).unwrap();
//!
//! assert_eq!(losses.shape(), (6, 2));
//! ```

mod config;
mod matrix;
mod parallel;

pub use config::{SimulationConfig, SimulationConfigBuilder};
pub use matrix::LossMatrix;
pub use parallel::DEFAULT_CHUNK_ROWS;

use credit_core::types::{Portfolio, ScenarioSet};
use credit_core::{ConfigurationError, CreditError};
use tracing::{debug, info_span};

use crate::aggregation::{AggregationKey, GroupLayout};
use crate::loss::ObligorTerms;
use crate::rng::{RandomStreams, StreamDomain};

/// Monte Carlo credit loss engine for one configuration.
///
/// Stateless between calls: the same engine can simulate several portfolios,
/// and two calls with the same inputs return identical matrices.
#[derive(Clone, Debug)]
pub struct SimulationEngine {
    config: SimulationConfig,
}

impl SimulationEngine {
    /// Creates an engine for a validated configuration.
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }

    /// Configuration in use.
    #[inline]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Random stream factory of this run.
    pub fn streams(&self) -> RandomStreams {
        RandomStreams::new(
            self.config.seed(),
            StreamDomain::new(self.config.n_scenarios(), self.config.draws_per_scenario()),
        )
    }

    /// Simulates the loss matrix of `portfolio` under `scenarios`.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError` for dimension mismatches, too few scenario
    ///   rows, out-of-bounds subset entries, malformed aggregation keys,
    ///   obligor ids outside the stream selector range, or a failed thread
    ///   pool
    /// - `NumericDomainError` for non-finite factors or loadings with
    ///   `|r| > 1` in the scenarios used
    pub fn simulate(
        &self,
        portfolio: &Portfolio,
        scenarios: &ScenarioSet,
    ) -> Result<LossMatrix, CreditError> {
        let config = &self.config;
        config.validate()?;
        let n_scenarios = config.n_scenarios();
        let draws = config.draws_per_scenario();
        let domain_size = config.domain_size();

        scenarios.validate_against(portfolio, n_scenarios)?;

        let mut selectors = Vec::with_capacity(portfolio.len());
        for obligor in portfolio.obligors() {
            let selector = obligor
                .id()
                .stream_selector()
                .ok_or(ConfigurationError::UnaddressableObligor(obligor.id()))?;
            selectors.push(selector);
        }

        let row_ids: Vec<usize> = match config.subset() {
            Some(subset) => {
                if let Some(position) = subset.iter().position(|&mk| mk >= domain_size) {
                    return Err(ConfigurationError::SubsetIndexOutOfBounds {
                        position,
                        index: subset[position],
                        bound: domain_size,
                    }
                    .into());
                }
                subset.to_vec()
            }
            None => (0..domain_size).collect(),
        };

        let layout = GroupLayout::build(config.aggregation(), portfolio)?;
        let width = layout.n_groups();
        let terms: Vec<ObligorTerms> = portfolio.obligors().iter().map(ObligorTerms::new).collect();
        let streams = self.streams();
        let factors = scenarios.factors();
        let loadings = scenarios.loadings();
        let columns = layout.columns();

        let span = info_span!(
            "simulate",
            obligors = portfolio.len(),
            scenarios = n_scenarios,
            draws = draws,
            rows = row_ids.len(),
            groups = width,
            threads = parallel::effective_threads(config.threads()),
        );
        let _enter = span.enter();

        let mut buffer = vec![0.0_f64; row_ids.len() * width];
        parallel::run_in_pool(config.threads(), || {
            parallel::fill_rows(&mut buffer, &row_ids, width, config.chunk_rows(), |mk, out| {
                let m = mk / draws;
                let z_row = factors.row(m);
                let r_row = loadings.row(m);
                for (j, term) in terms.iter().enumerate() {
                    let eps = streams.stream_unchecked(mk as u64, selectors[j]).next_normal();
                    out[columns[j]] += term.loss(r_row[j], z_row[j], eps);
                }
            })
        })?;

        debug!(rows = row_ids.len(), groups = width, "simulation complete");
        Ok(LossMatrix::new(buffer, row_ids, layout.into_labels(), draws)?)
    }
}

/// Simulates a loss matrix in one call.
///
/// Convenience over [`SimulationConfig::builder`] and
/// [`SimulationEngine::simulate`] taking every run parameter explicitly.
#[allow(clippy::too_many_arguments)]
pub fn simulate(
    portfolio: &Portfolio,
    scenarios: &ScenarioSet,
    n_scenarios: usize,
    draws_per_scenario: usize,
    aggregation: AggregationKey,
    subset: Option<Vec<usize>>,
    seed: u64,
    threads: Option<usize>,
) -> Result<LossMatrix, CreditError> {
    let mut builder = SimulationConfig::builder()
        .n_scenarios(n_scenarios)
        .draws_per_scenario(draws_per_scenario)
        .aggregation(aggregation)
        .seed(seed)
        .maybe_threads(threads);
    if let Some(subset) = subset {
        builder = builder.subset(subset);
    }
    SimulationEngine::new(builder.build()?).simulate(portfolio, scenarios)
}
