//! Seeded synthetic portfolio and scenario generation.
//!
//! Portfolio ingestion is outside this workspace; demos, benchmarks and
//! tests build their inputs here instead. Generation uses its own seeded
//! `StdRng`, unrelated to the simulation's addressed random streams.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Beta, Distribution, LogNormal, StandardNormal, Uniform};
use tracing::debug;

use crate::error::{ConfigurationError, CreditError};
use crate::types::{FactorMatrix, Obligor, ObligorId, Portfolio, RatingGroup, ScenarioSet};

/// A rating bucket with its one-period probability of default.
#[derive(Clone, Debug, PartialEq)]
pub struct RatingBucket {
    /// Rating label.
    pub rating: RatingGroup,
    /// Probability of default assigned to every obligor in the bucket.
    pub probability_of_default: f64,
}

impl RatingBucket {
    /// Creates a rating bucket.
    pub fn new(rating: impl Into<String>, probability_of_default: f64) -> Self {
        Self {
            rating: RatingGroup::new(rating),
            probability_of_default,
        }
    }
}

/// Default rating scale (roughly S&P one-year average default rates).
pub fn default_rating_scale() -> Vec<RatingBucket> {
    vec![
        RatingBucket::new("AAA", 0.0001),
        RatingBucket::new("AA", 0.0003),
        RatingBucket::new("A", 0.0008),
        RatingBucket::new("BBB", 0.0025),
        RatingBucket::new("BB", 0.01),
        RatingBucket::new("B", 0.04),
        RatingBucket::new("CCC", 0.15),
    ]
}

/// Synthetic portfolio configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntheticPortfolioConfig {
    /// Number of obligors; ids are `1..=n_obligors`.
    pub n_obligors: usize,
    /// Number of systematic scenarios (rows of `Z`).
    pub n_scenarios: usize,
    /// Seed for the generator.
    pub seed: u64,
    /// Rating buckets; obligors are spread uniformly across them.
    pub ratings: Vec<RatingBucket>,
    /// Log-normal exposure: mean of log exposure.
    pub exposure_log_mean: f64,
    /// Log-normal exposure: standard deviation of log exposure.
    pub exposure_log_sd: f64,
    /// Beta(alpha, beta) distribution of loss given default.
    pub lgd_alpha: f64,
    /// See `lgd_alpha`.
    pub lgd_beta: f64,
    /// Lower bound of the uniform factor loading band.
    pub loading_min: f64,
    /// Upper bound of the uniform factor loading band.
    pub loading_max: f64,
}

impl Default for SyntheticPortfolioConfig {
    fn default() -> Self {
        Self {
            n_obligors: 100,
            n_scenarios: 1_000,
            seed: 1,
            ratings: default_rating_scale(),
            exposure_log_mean: 13.8, // ~1mn median exposure
            exposure_log_sd: 1.0,
            lgd_alpha: 2.0,
            lgd_beta: 2.0,
            loading_min: 0.2,
            loading_max: 0.6,
        }
    }
}

/// Generated inputs: a portfolio and its matching scenario set.
#[derive(Clone, Debug)]
pub struct SyntheticData {
    /// Obligors with ids `1..=n`.
    pub portfolio: Portfolio,
    /// Column-constant factor matrix with obligor-level loadings.
    pub scenarios: ScenarioSet,
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigurationError {
    ConfigurationError::InvalidSizing {
        name,
        reason: reason.into(),
    }
}

impl SyntheticPortfolioConfig {
    /// Generates the portfolio and a single-factor scenario matrix.
    ///
    /// Scenario `m` draws one `z_m ~ N(0, 1)` shared by every obligor.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError::EmptyPortfolio` when `n_obligors == 0`
    /// - `ConfigurationError::InvalidSizing` for unusable distribution
    ///   parameters or an empty rating scale
    /// - `NumericDomainError` when a rating bucket PD is outside `[0, 1]`
    pub fn generate(&self) -> Result<SyntheticData, CreditError> {
        if self.n_obligors == 0 {
            return Err(ConfigurationError::EmptyPortfolio.into());
        }
        if self.ratings.is_empty() {
            return Err(invalid("ratings", "at least one rating bucket is required").into());
        }
        if !(-1.0..=1.0).contains(&self.loading_min)
            || !(-1.0..=1.0).contains(&self.loading_max)
            || self.loading_min > self.loading_max
        {
            return Err(invalid(
                "loading",
                format!(
                    "band [{}, {}] must be ordered and inside [-1, 1]",
                    self.loading_min, self.loading_max
                ),
            )
            .into());
        }

        let exposure = LogNormal::new(self.exposure_log_mean, self.exposure_log_sd)
            .map_err(|e| invalid("exposure", e.to_string()))?;
        let lgd = Beta::new(self.lgd_alpha, self.lgd_beta)
            .map_err(|e| invalid("lgd", e.to_string()))?;
        let loading = Uniform::new_inclusive(self.loading_min, self.loading_max);
        let bucket = Uniform::new(0, self.ratings.len());

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut obligors = Vec::with_capacity(self.n_obligors);
        for i in 0..self.n_obligors {
            let b = &self.ratings[bucket.sample(&mut rng)];
            obligors.push(Obligor::new(
                ObligorId::new(i as u64 + 1),
                b.probability_of_default,
                exposure.sample(&mut rng),
                lgd.sample(&mut rng),
                loading.sample(&mut rng),
                b.rating.clone(),
            )?);
        }
        let portfolio = Portfolio::new(obligors)?;

        let z: Vec<f64> = (0..self.n_scenarios)
            .map(|_| -> f64 { StandardNormal.sample(&mut rng) })
            .collect();
        let factors = FactorMatrix::column_constant(&z, portfolio.len());
        let scenarios = ScenarioSet::with_obligor_loadings(factors, &portfolio)?;

        debug!(
            obligors = portfolio.len(),
            scenarios = self.n_scenarios,
            seed = self.seed,
            "generated synthetic portfolio"
        );

        Ok(SyntheticData {
            portfolio,
            scenarios,
        })
    }
}
