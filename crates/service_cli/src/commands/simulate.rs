//! Simulate command implementation
//!
//! Runs one full simulation of the synthetic portfolio and reports expected
//! loss, Value at Risk and Expected Shortfall per group and in total.

use std::path::Path;

use credit_kernel::{AggregationKey, LossMatrix, SimulationEngine};
use credit_risk::{timed, TailAnalyzer};
use serde::Serialize;
use tracing::info;

use super::{generate_inputs, parse_aggregation};
use crate::config::CliConfig;
use crate::{CliError, Result};

/// Tail statistics of one loss column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    /// Group label.
    pub group: String,
    /// Mean loss over every scenario-draw pair.
    pub expected_loss: f64,
    /// Value at Risk of the group on its own.
    pub value_at_risk: f64,
    /// Expected Shortfall of the group on its own.
    pub expected_shortfall: f64,
}

/// Result of one `simulate` run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    /// Obligors in the generated portfolio.
    pub obligors: usize,
    /// Systematic scenarios `M`.
    pub scenarios: usize,
    /// Idiosyncratic draws per scenario `K`.
    pub draws: usize,
    /// Seed of the addressed random streams.
    pub seed: u64,
    /// Worker threads used.
    pub threads: usize,
    /// Tail confidence level.
    pub quantile: f64,
    /// Portfolio expected loss.
    pub expected_loss: f64,
    /// Portfolio Value at Risk.
    pub value_at_risk: f64,
    /// Portfolio Expected Shortfall.
    pub expected_shortfall: f64,
    /// Rows at or above the portfolio VaR.
    pub tail_size: usize,
    /// Per-group statistics in column order.
    pub groups: Vec<GroupSummary>,
    /// Wall-clock time of the simulation step.
    pub simulate_ms: f64,
}

/// Run the simulate command
pub fn run(config: &CliConfig, aggregation: &str, format: &str, output: Option<&Path>) -> Result<()> {
    let aggregation = parse_aggregation(aggregation)?;
    if !matches!(format, "table" | "json") {
        return Err(CliError::InvalidArgument(format!(
            "Unknown output format: {}. Supported: table, json",
            format
        )));
    }
    config.validate()?;

    let summary = execute(config, aggregation, output)?;
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&summary)?),
        _ => print_table(&summary),
    }
    Ok(())
}

/// Generates inputs, simulates and summarises; optionally dumps the loss
/// matrix to `output` as CSV.
pub fn execute(
    config: &CliConfig,
    aggregation: AggregationKey,
    output: Option<&Path>,
) -> Result<SimulationSummary> {
    let data = generate_inputs(config)?;
    let sim_config = config.simulation_config(aggregation)?;
    let quantile = config.quantile()?;

    info!("Running simulation...");
    info!("  Scenarios: {}", sim_config.n_scenarios());
    info!("  Draws per scenario: {}", sim_config.draws_per_scenario());
    info!("  Seed: {}", sim_config.seed());
    info!("  Threads: {}", config.worker_threads());

    let engine = SimulationEngine::new(sim_config);
    let (losses, elapsed) = timed("simulate", || engine.simulate(&data.portfolio, &data.scenarios));
    let losses = losses?;

    if let Some(path) = output {
        write_loss_matrix(&losses, path)?;
        info!("Loss matrix written to {}", path.display());
    }

    let analyzer = TailAnalyzer::new(quantile);
    let total = analyzer.analyze_totals(&losses)?;
    let columns = analyzer.analyze_columns(&losses)?;
    let means = losses.column_means();
    let groups = losses
        .group_labels()
        .iter()
        .zip(columns)
        .zip(&means)
        .map(|((label, tail), &mean)| GroupSummary {
            group: label.to_string(),
            expected_loss: mean,
            value_at_risk: tail.value_at_risk,
            expected_shortfall: tail.expected_shortfall,
        })
        .collect();

    Ok(SimulationSummary {
        obligors: data.portfolio.len(),
        scenarios: config.simulation.scenarios,
        draws: config.simulation.draws,
        seed: config.simulation.seed,
        threads: config.worker_threads(),
        quantile: quantile.value(),
        expected_loss: means.iter().sum(),
        value_at_risk: total.value_at_risk,
        expected_shortfall: total.expected_shortfall,
        tail_size: total.tail_size(),
        groups,
        simulate_ms: elapsed.as_secs_f64() * 1e3,
    })
}

/// Writes one CSV record per row: global index, scenario, draw, group losses.
pub fn write_loss_matrix(losses: &LossMatrix, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["index".to_string(), "scenario".to_string(), "draw".to_string()];
    header.extend(losses.group_labels().iter().map(|l| l.to_string()));
    writer.write_record(&header)?;

    for (row, values) in losses.iter_rows().enumerate() {
        let (m, k) = losses.scenario_draw(row);
        let mut record = vec![
            losses.global_index(row).to_string(),
            m.to_string(),
            k.to_string(),
        ];
        record.extend(values.iter().map(|v| v.to_string()));
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_table(summary: &SimulationSummary) {
    println!(
        "Obligors: {}  Scenarios: {}  Draws: {}  Seed: {}  Threads: {}",
        summary.obligors, summary.scenarios, summary.draws, summary.seed, summary.threads
    );
    println!(
        "Quantile: {}  Tail size: {}  Simulation: {:.1} ms",
        summary.quantile, summary.tail_size, summary.simulate_ms
    );
    println!();
    println!(
        "{:<16} {:>18} {:>18} {:>18}",
        "Group", "Expected loss", "VaR", "ES"
    );
    for group in &summary.groups {
        println!(
            "{:<16} {:>18.2} {:>18.2} {:>18.2}",
            group.group, group.expected_loss, group.value_at_risk, group.expected_shortfall
        );
    }
    println!(
        "{:<16} {:>18.2} {:>18.2} {:>18.2}",
        "TOTAL", summary.expected_loss, summary.value_at_risk, summary.expected_shortfall
    );
}
