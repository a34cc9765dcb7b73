//! Drill-down risk attribution.
//!
//! ## Workflow
//!
//! 1. Portfolio-level run (single total column)
//! 2. Tail extraction: ES, VaR and the global tail indices
//! 3. Re-run restricted to the tail indices at the requested aggregation
//! 4. Per-group ES contributions, shares and decomposition residual
//!
//! Steps 3 and 4 can be repeated at other aggregations, or for arbitrary
//! obligor subsets, against the same parent tail without re-running step 1.

use credit_core::types::{Portfolio, ScenarioSet};
use credit_kernel::{AggregationKey, LossMatrix, SimulationConfig, SimulationEngine};
use tracing::{debug, info};

use crate::contributions::ContributionReport;
use crate::error::RiskError;
use crate::tail::{Quantile, TailAnalysis, TailAnalyzer};
use crate::timing::timed;

/// Drill-down attribution of a portfolio's tail risk.
///
/// # Examples
///
/// ```rust
/// use credit_core::synthetic::SyntheticPortfolioConfig;
/// use credit_kernel::{AggregationKey, SimulationConfig};
/// use credit_risk::attribution::RiskAttribution;
/// use credit_risk::tail::Quantile;
///
/// let data = SyntheticPortfolioConfig { n_obligors: 30, n_scenarios: 100, ..Default::default() }
///     .generate()
///     .unwrap();
/// let config = SimulationConfig::builder()
///     .n_scenarios(100)
///     .draws_per_scenario(10)
///     .seed(7)
///     .build()
///     .unwrap();
///
/// let attribution = RiskAttribution::new(&data.portfolio, &data.scenarios, config, Quantile::ES99);
/// let report = attribution.run(AggregationKey::Rating).unwrap();
/// assert!(report.residual.abs() <= 1e-9 * report.parent.expected_shortfall.max(1.0));
/// ```
#[derive(Clone, Debug)]
pub struct RiskAttribution<'a> {
    portfolio: &'a Portfolio,
    scenarios: &'a ScenarioSet,
    config: SimulationConfig,
    analyzer: TailAnalyzer,
}

impl<'a> RiskAttribution<'a> {
    /// Prepares an attribution.
    ///
    /// `config` supplies sizing, seed and threads. Its aggregation key is
    /// ignored; its subset, if any, bounds the parent run.
    pub fn new(
        portfolio: &'a Portfolio,
        scenarios: &'a ScenarioSet,
        config: SimulationConfig,
        quantile: Quantile,
    ) -> Self {
        Self {
            portfolio,
            scenarios,
            config,
            analyzer: TailAnalyzer::new(quantile),
        }
    }

    /// Tail analyser in use.
    pub fn analyzer(&self) -> &TailAnalyzer {
        &self.analyzer
    }

    /// Steps 1 and 2: portfolio-level run and tail extraction.
    ///
    /// # Errors
    ///
    /// Any engine error, or `RiskError::EmptyLosses` for an empty subset.
    pub fn portfolio_tail(&self) -> Result<TailAnalysis, RiskError> {
        let engine = SimulationEngine::new(self.config.with_aggregation(AggregationKey::Portfolio));
        let (totals, _) = timed("portfolio run", || {
            engine.simulate(self.portfolio, self.scenarios)
        });
        let parent = self.analyzer.analyze_totals(&totals?)?;
        info!(
            quantile = parent.quantile,
            var = parent.value_at_risk,
            es = parent.expected_shortfall,
            tail = parent.tail_size(),
            "portfolio tail"
        );
        Ok(parent)
    }

    /// Step 3: re-run on the parent tail rows at `aggregation`.
    ///
    /// # Errors
    ///
    /// Any engine error.
    pub fn tail_run(
        &self,
        parent: &TailAnalysis,
        aggregation: AggregationKey,
    ) -> Result<LossMatrix, RiskError> {
        let engine = SimulationEngine::new(
            self.config
                .with_subset(parent.tail_indices.clone())
                .with_aggregation(aggregation),
        );
        let (losses, _) = timed("tail re-run", || engine.simulate(self.portfolio, self.scenarios));
        Ok(losses?)
    }

    /// Steps 3 and 4 against an existing parent tail.
    ///
    /// # Errors
    ///
    /// Any engine error.
    pub fn contributions(
        &self,
        parent: &TailAnalysis,
        aggregation: AggregationKey,
    ) -> Result<ContributionReport, RiskError> {
        let tail = self.tail_run(parent, aggregation)?;
        let report = ContributionReport::from_tail_run(parent.clone(), &tail)?;
        debug!(
            groups = report.contributions.len(),
            residual = report.residual,
            "tail contributions"
        );
        Ok(report)
    }

    /// All four steps.
    ///
    /// # Errors
    ///
    /// Any engine or tail analysis error.
    pub fn run(&self, aggregation: AggregationKey) -> Result<ContributionReport, RiskError> {
        let parent = self.portfolio_tail()?;
        self.contributions(&parent, aggregation)
    }

    /// ES contribution of the obligors at `positions`, on the parent tail.
    ///
    /// The sub-portfolio keeps its obligor ids, so its tail rows reproduce
    /// those obligors' losses in the parent run and the result equals the sum
    /// of their individual contributions.
    ///
    /// # Errors
    ///
    /// `ConfigurationError` for invalid or repeated positions; any engine
    /// error.
    pub fn sub_portfolio_contribution(
        &self,
        parent: &TailAnalysis,
        positions: &[usize],
    ) -> Result<f64, RiskError> {
        let portfolio = self.portfolio.subset(positions)?;
        let scenarios = self.scenarios.select_obligors(positions)?;
        let engine = SimulationEngine::new(
            self.config
                .with_subset(parent.tail_indices.clone())
                .with_aggregation(AggregationKey::Portfolio),
        );
        let (losses, _) = timed("sub-portfolio re-run", || {
            engine.simulate(&portfolio, &scenarios)
        });
        let losses = losses?;
        if losses.is_empty() {
            return Err(RiskError::EmptyLosses);
        }
        Ok(losses.column_means().first().copied().unwrap_or(0.0))
    }
}
