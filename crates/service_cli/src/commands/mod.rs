//! CLI command implementations
//!
//! Each submodule implements a specific CLI command.

pub mod attribute;
pub mod check;
pub mod simulate;

use credit_core::synthetic::SyntheticData;
use credit_kernel::AggregationKey;
use credit_risk::timed;
use tracing::info;

use crate::config::CliConfig;
use crate::{CliError, Result};

/// Parses an `--aggregation` value.
pub fn parse_aggregation(name: &str) -> Result<AggregationKey> {
    match name {
        "obligor" => Ok(AggregationKey::Obligor),
        "rating" => Ok(AggregationKey::Rating),
        "portfolio" => Ok(AggregationKey::Portfolio),
        other => Err(CliError::InvalidArgument(format!(
            "Unknown aggregation: {}. Supported: obligor, rating, portfolio",
            other
        ))),
    }
}

/// Generates the synthetic portfolio and scenarios described by `config`.
pub(crate) fn generate_inputs(config: &CliConfig) -> Result<SyntheticData> {
    let synthetic = config.synthetic();
    info!("Generating synthetic portfolio...");
    info!("  Obligors: {}", synthetic.n_obligors);
    info!("  Ratings: {}", synthetic.ratings.len());
    info!("  Scenarios: {}", synthetic.n_scenarios);
    let (data, _) = timed("generate portfolio", || synthetic.generate());
    Ok(data?)
}

#[cfg(test)]
pub(crate) fn small_config() -> CliConfig {
    let mut config = CliConfig::default();
    config.simulation.scenarios = 40;
    config.simulation.draws = 10;
    config.simulation.threads = Some(2);
    config.simulation.seed = 11;
    config.portfolio.obligors = 15;
    config
}
