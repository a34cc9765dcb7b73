//! Attribute command implementation
//!
//! Drill-down attribution of the portfolio Expected Shortfall: portfolio
//! run, tail extraction, tail re-run at the requested aggregation and
//! per-group contributions.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use credit_kernel::AggregationKey;
use credit_risk::RiskAttribution;
use serde::Serialize;
use tracing::info;

use super::{generate_inputs, parse_aggregation};
use crate::config::CliConfig;
use crate::{CliError, Result};

/// One group's contribution, as written to reports.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContributionRow {
    /// Group label.
    pub group: String,
    /// Mean group loss over the parent tail rows.
    pub expected_shortfall: f64,
    /// Fraction of the parent ES.
    pub share: f64,
}

/// Attribution output, contributions ranked largest first.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributionReport {
    /// Tail confidence level.
    pub quantile: f64,
    /// Portfolio Value at Risk.
    pub value_at_risk: f64,
    /// Portfolio Expected Shortfall.
    pub expected_shortfall: f64,
    /// Rows at or above the portfolio VaR.
    pub tail_size: usize,
    /// Parent ES minus the sum of contributions.
    pub residual: f64,
    /// Group contributions.
    pub contributions: Vec<ContributionRow>,
}

/// Run the attribute command
pub fn run(
    config: &CliConfig,
    aggregation: &str,
    format: &str,
    top: Option<usize>,
    output: Option<&Path>,
) -> Result<()> {
    let aggregation = parse_aggregation(aggregation)?;
    if !matches!(format, "table" | "csv" | "json") {
        return Err(CliError::InvalidArgument(format!(
            "Unknown output format: {}. Supported: table, csv, json",
            format
        )));
    }
    config.validate()?;

    let report = execute(config, aggregation)?;
    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout().lock()),
    };
    render(&report, format, top, &mut writer)?;
    writer.flush()?;

    if let Some(path) = output {
        info!("Attribution written to {}", path.display());
    }
    Ok(())
}

/// Runs the drill-down workflow on the synthetic portfolio.
pub fn execute(config: &CliConfig, aggregation: AggregationKey) -> Result<AttributionReport> {
    let data = generate_inputs(config)?;
    let sim_config = config.simulation_config(AggregationKey::Portfolio)?;
    let quantile = config.quantile()?;

    info!("Running drill-down attribution...");
    info!("  Scenario-draw pairs: {}", sim_config.domain_size());
    info!("  Quantile: {}", quantile.value());
    info!("  Threads: {}", config.worker_threads());

    let attribution = RiskAttribution::new(&data.portfolio, &data.scenarios, sim_config, quantile);
    let report = attribution.run(aggregation)?;

    Ok(AttributionReport {
        quantile: report.parent.quantile,
        value_at_risk: report.parent.value_at_risk,
        expected_shortfall: report.parent.expected_shortfall,
        tail_size: report.parent.tail_size(),
        residual: report.residual,
        contributions: report
            .ranked()
            .into_iter()
            .map(|c| ContributionRow {
                group: c.label.to_string(),
                expected_shortfall: c.expected_shortfall,
                share: c.share,
            })
            .collect(),
    })
}

/// Writes `report` in `format`; `top` limits the table to the largest rows.
pub fn render<W: Write>(
    report: &AttributionReport,
    format: &str,
    top: Option<usize>,
    writer: &mut W,
) -> Result<()> {
    match format {
        "json" => {
            serde_json::to_writer_pretty(&mut *writer, report)?;
            writeln!(writer)?;
        }
        "csv" => {
            let mut csv = csv::Writer::from_writer(writer);
            for row in &report.contributions {
                csv.serialize(row)?;
            }
            csv.flush()?;
        }
        "table" => {
            writeln!(
                writer,
                "Quantile: {}  Tail size: {}  VaR: {:.2}  ES: {:.2}",
                report.quantile, report.tail_size, report.value_at_risk, report.expected_shortfall
            )?;
            writeln!(writer)?;
            writeln!(writer, "{:<16} {:>18} {:>10}", "Group", "ES contribution", "Share")?;
            let shown = top.unwrap_or(report.contributions.len());
            for row in report.contributions.iter().take(shown) {
                writeln!(
                    writer,
                    "{:<16} {:>18.2} {:>9.2}%",
                    row.group,
                    row.expected_shortfall,
                    row.share * 100.0
                )?;
            }
            if shown < report.contributions.len() {
                writeln!(
                    writer,
                    "... {} more groups",
                    report.contributions.len() - shown
                )?;
            }
            writeln!(writer, "Residual: {:.3e}", report.residual)?;
        }
        other => {
            return Err(CliError::InvalidArgument(format!(
                "Unknown output format: {}. Supported: table, csv, json",
                other
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::small_config;
    use approx::assert_relative_eq;

    fn report() -> AttributionReport {
        AttributionReport {
            quantile: 0.99,
            value_at_risk: 80.0,
            expected_shortfall: 100.0,
            tail_size: 4,
            residual: 0.0,
            contributions: vec![
                ContributionRow {
                    group: "B".to_string(),
                    expected_shortfall: 70.0,
                    share: 0.7,
                },
                ContributionRow {
                    group: "BBB".to_string(),
                    expected_shortfall: 30.0,
                    share: 0.3,
                },
            ],
        }
    }

    #[test]
    fn test_contributions_decompose_es() {
        let config = small_config();
        let report = execute(&config, AggregationKey::Obligor).unwrap();

        assert_eq!(report.contributions.len(), 15);
        let total: f64 = report.contributions.iter().map(|c| c.expected_shortfall).sum();
        assert_relative_eq!(
            total,
            report.expected_shortfall,
            max_relative = 1e-9,
            epsilon = 1e-9
        );
        assert!(report
            .contributions
            .windows(2)
            .all(|w| w[0].expected_shortfall >= w[1].expected_shortfall));
    }

    #[test]
    fn test_render_csv() {
        let mut out = Vec::new();
        render(&report(), "csv", None, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "group,expected_shortfall,share");
        assert_eq!(lines[1], "B,70.0,0.7");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_render_json() {
        let mut out = Vec::new();
        render(&report(), "json", None, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["tail_size"], 4);
        assert_eq!(value["contributions"][1]["group"], "BBB");
    }

    #[test]
    fn test_render_table_top() {
        let mut out = Vec::new();
        render(&report(), "table", Some(1), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("70.00"));
        assert!(!text.contains("BBB"));
        assert!(text.contains("1 more groups"));
    }

    #[test]
    fn test_render_unknown_format() {
        let mut out = Vec::new();
        assert!(matches!(
            render(&report(), "xlsx", None, &mut out),
            Err(CliError::InvalidArgument(_))
        ));
    }
}
