//! Check command implementation
//!
//! Reports the effective configuration and thread pool, then runs a small
//! pinned simulation on one and on all configured worker threads.

use credit_core::types::{FactorMatrix, Obligor, ObligorId, Portfolio, RatingGroup, ScenarioSet};
use credit_core::CreditError;
use credit_kernel::{AggregationKey, SimulationConfig, SimulationEngine};
use tracing::{info, warn};

use crate::config::{CliConfig, ConfigError};
use crate::{CliError, Result};

const SELF_TEST_SEED: u64 = 2024;

/// Reference losses for the self-test portfolio, rows in ascending `mk`.
const SELF_TEST_EXPECTED: [[f64; 2]; 6] = [
    [60.0, 0.0],
    [0.0, 20.0],
    [0.0, 20.0],
    [0.0, 0.0],
    [0.0, 20.0],
    [0.0, 0.0],
];

/// Run the check command
pub fn run(config: &CliConfig, config_path: &str) -> Result<()> {
    info!("credit-mc {}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", config_path);
    info!("  Log level: {}", config.log_level);
    info!("  Scenarios: {}", config.simulation.scenarios);
    info!("  Draws per scenario: {}", config.simulation.draws);
    info!("  Seed: {}", config.simulation.seed);
    info!("  Chunk rows: {}", config.simulation.chunk_rows);
    info!("  Quantile: {}", config.simulation.quantile);
    info!("  Obligors: {}", config.portfolio.obligors);
    info!("  Rating buckets: {}", config.portfolio.ratings.len());

    info!("Thread pool:");
    info!("  Logical cores: {}", num_cpus::get());
    info!("  Physical cores: {}", num_cpus::get_physical());
    info!(
        "  Worker threads: {}{}",
        config.worker_threads(),
        if config.simulation.threads.is_none() { " (all logical cores)" } else { "" }
    );

    let validation = config.validate();
    match &validation {
        Ok(()) => info!("Configuration valid"),
        Err(ConfigError::Validation(errors)) => {
            for error in errors {
                warn!("  {}", error);
            }
        }
        Err(other) => warn!("  {}", other),
    }

    // The pool size comes from the config even when other settings are bad.
    let threads = config.simulation.threads.filter(|&n| n > 0).unwrap_or_else(num_cpus::get);
    self_test(threads)?;
    info!("Self-test passed on 1 and {} threads", threads);

    validation?;
    info!("All checks passed");
    Ok(())
}

/// Simulates the pinned two-obligor portfolio on one thread and on
/// `threads` threads and compares both against the reference losses.
pub fn self_test(threads: usize) -> Result<()> {
    let (portfolio, scenarios) = self_test_inputs()?;
    for pool in [1, threads] {
        let config = SimulationConfig::builder()
            .n_scenarios(3)
            .draws_per_scenario(2)
            .seed(SELF_TEST_SEED)
            .threads(pool)
            .chunk_rows(1)
            .aggregation(AggregationKey::Obligor)
            .build()?;
        let losses = SimulationEngine::new(config).simulate(&portfolio, &scenarios)?;
        for (row, expected) in SELF_TEST_EXPECTED.iter().enumerate() {
            if losses.row(row) != expected {
                return Err(CliError::SelfTest(format!(
                    "row {} on {} threads: expected {:?}, got {:?}",
                    row,
                    pool,
                    expected,
                    losses.row(row)
                )));
            }
        }
    }
    Ok(())
}

fn self_test_inputs() -> Result<(Portfolio, ScenarioSet)> {
    let obligors = vec![
        Obligor::new(ObligorId::new(1), 0.05, 100.0, 0.6, 0.5, RatingGroup::new("BBB"))
            .map_err(CreditError::from)?,
        Obligor::new(ObligorId::new(2), 0.20, 50.0, 0.4, 0.3, RatingGroup::new("B"))
            .map_err(CreditError::from)?,
    ];
    let portfolio = Portfolio::new(obligors)?;
    let factors = FactorMatrix::column_constant(&[-1.5, 0.0, 1.0], portfolio.len());
    let scenarios = ScenarioSet::with_obligor_loadings(factors, &portfolio)?;
    Ok((portfolio, scenarios))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_self_test_passes() {
        self_test(1).unwrap();
        self_test(4).unwrap();
    }

    #[test]
    fn test_check_reports_invalid_config() {
        let mut config = CliConfig::default();
        config.simulation.draws = 0;
        let err = run(&config, "credit-mc.toml").unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::Validation(_))));
    }

    #[test]
    fn test_check_default_config() {
        let mut config = CliConfig::default();
        config.simulation.threads = Some(2);
        run(&config, "credit-mc.toml").unwrap();
    }
}
