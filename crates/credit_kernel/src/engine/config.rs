//! Simulation configuration.
//!
//! Sizing, seed, scheduling and output shape for one engine run. Use
//! [`SimulationConfig::builder`]; the builder validates everything that can
//! be checked without the portfolio.

use credit_core::ConfigurationError;

use super::parallel::DEFAULT_CHUNK_ROWS;
use crate::aggregation::AggregationKey;

/// Simulation configuration.
///
/// # Examples
///
/// ```rust
/// use credit_kernel::engine::SimulationConfig;
///
/// let config = SimulationConfig::builder()
///     .n_scenarios(1_000)
///     .draws_per_scenario(10)
///     .seed(42)
///     .threads(4)
///     .build()
///     .expect("valid configuration");
///
/// assert_eq!(config.domain_size(), 10_000);
/// assert_eq!(config.threads(), Some(4));
/// ```
#[derive(Clone, Debug)]
pub struct SimulationConfig {
    n_scenarios: usize,
    draws_per_scenario: usize,
    seed: u64,
    threads: Option<usize>,
    chunk_rows: usize,
    aggregation: AggregationKey,
    subset: Option<Vec<usize>>,
}

impl SimulationConfig {
    /// Creates a new configuration builder.
    #[inline]
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Number of systematic scenarios `M` to use.
    #[inline]
    pub fn n_scenarios(&self) -> usize {
        self.n_scenarios
    }

    /// Idiosyncratic draws per scenario `K`.
    #[inline]
    pub fn draws_per_scenario(&self) -> usize {
        self.draws_per_scenario
    }

    /// Size of the scenario-draw domain `M * K`.
    #[inline]
    pub fn domain_size(&self) -> usize {
        self.n_scenarios * self.draws_per_scenario
    }

    /// Global seed.
    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Dedicated worker count, or `None` for rayon's global pool.
    #[inline]
    pub fn threads(&self) -> Option<usize> {
        self.threads
    }

    /// Rows per parallel work chunk.
    #[inline]
    pub fn chunk_rows(&self) -> usize {
        self.chunk_rows
    }

    /// Output grouping.
    #[inline]
    pub fn aggregation(&self) -> &AggregationKey {
        &self.aggregation
    }

    /// Requested scenario-draw indices, if restricted.
    #[inline]
    pub fn subset(&self) -> Option<&[usize]> {
        self.subset.as_deref()
    }

    /// Same configuration restricted to the given scenario-draw indices.
    pub fn with_subset(&self, subset: Vec<usize>) -> Self {
        Self {
            subset: Some(subset),
            ..self.clone()
        }
    }

    /// Same configuration with another aggregation key.
    pub fn with_aggregation(&self, aggregation: AggregationKey) -> Self {
        Self {
            aggregation,
            ..self.clone()
        }
    }

    /// Same configuration with another worker count.
    pub fn with_threads(&self, threads: Option<usize>) -> Self {
        Self {
            threads,
            ..self.clone()
        }
    }

    /// Validates sizing and scheduling parameters.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::InvalidSizing` if `n_scenarios`,
    /// `draws_per_scenario`, `threads` or `chunk_rows` is zero, or if
    /// `M * K` overflows.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.n_scenarios == 0 {
            return Err(sizing("n_scenarios", "must be at least 1"));
        }
        if self.draws_per_scenario == 0 {
            return Err(sizing("draws_per_scenario", "must be at least 1"));
        }
        if self
            .n_scenarios
            .checked_mul(self.draws_per_scenario)
            .is_none()
        {
            return Err(sizing(
                "draws_per_scenario",
                format!(
                    "{} x {} scenario-draw pairs overflow",
                    self.n_scenarios, self.draws_per_scenario
                ),
            ));
        }
        if self.threads == Some(0) {
            return Err(sizing("threads", "must be at least 1"));
        }
        if self.chunk_rows == 0 {
            return Err(sizing("chunk_rows", "must be at least 1"));
        }
        Ok(())
    }
}

fn sizing(name: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidSizing {
        name,
        reason: reason.into(),
    }
}

/// Builder for [`SimulationConfig`].
#[derive(Clone, Debug)]
pub struct SimulationConfigBuilder {
    n_scenarios: Option<usize>,
    draws_per_scenario: usize,
    seed: u64,
    threads: Option<usize>,
    chunk_rows: usize,
    aggregation: AggregationKey,
    subset: Option<Vec<usize>>,
}

impl Default for SimulationConfigBuilder {
    fn default() -> Self {
        Self {
            n_scenarios: None,
            draws_per_scenario: 1,
            seed: 0,
            threads: None,
            chunk_rows: DEFAULT_CHUNK_ROWS,
            aggregation: AggregationKey::default(),
            subset: None,
        }
    }
}

impl SimulationConfigBuilder {
    /// Sets the number of scenarios `M` (required).
    #[inline]
    pub fn n_scenarios(mut self, n_scenarios: usize) -> Self {
        self.n_scenarios = Some(n_scenarios);
        self
    }

    /// Sets the idiosyncratic draws per scenario `K` (default 1).
    #[inline]
    pub fn draws_per_scenario(mut self, draws: usize) -> Self {
        self.draws_per_scenario = draws;
        self
    }

    /// Sets the global seed (default 0).
    #[inline]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Runs on a dedicated pool of `threads` workers.
    #[inline]
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Sets or clears the dedicated worker count.
    #[inline]
    pub fn maybe_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Rows per parallel chunk.
    #[inline]
    pub fn chunk_rows(mut self, chunk_rows: usize) -> Self {
        self.chunk_rows = chunk_rows;
        self
    }

    /// Output grouping (default: one column per obligor).
    #[inline]
    pub fn aggregation(mut self, aggregation: AggregationKey) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// Restricts the run to the given global scenario-draw indices.
    #[inline]
    pub fn subset(mut self, subset: Vec<usize>) -> Self {
        self.subset = Some(subset);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::InvalidSizing` if `n_scenarios` is missing or any
    /// check of [`SimulationConfig::validate`] fails.
    pub fn build(self) -> Result<SimulationConfig, ConfigurationError> {
        let n_scenarios = self
            .n_scenarios
            .ok_or_else(|| sizing("n_scenarios", "must be specified"))?;

        let config = SimulationConfig {
            n_scenarios,
            draws_per_scenario: self.draws_per_scenario,
            seed: self.seed,
            threads: self.threads,
            chunk_rows: self.chunk_rows,
            aggregation: self.aggregation,
            subset: self.subset,
        };

        config.validate()?;
        Ok(config)
    }
}
