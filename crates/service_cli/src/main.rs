//! credit-mc - Command Line Operations for Credit Portfolio Loss Simulation
//!
//! Operational entry point for the coordinate-addressed credit loss engine.
//!
//! # Commands
//!
//! - `credit-mc simulate` - Simulate the synthetic portfolio and report EL,
//!   VaR and ES
//! - `credit-mc attribute` - Decompose the portfolio ES into group
//!   contributions
//! - `credit-mc check` - Check configuration, thread pool and a pinned
//!   reference run
//!
//! # Configuration
//!
//! Settings are read from `credit-mc.toml` (see [`config`]), overridden by
//! `CREDIT_MC_*` environment variables, then by command-line flags.
//!
//! # Architecture
//!
//! As part of the **S**ervice layer, this crate orchestrates the core,
//! kernel and risk layers behind a single command-line interface.

#![warn(missing_docs)]

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;

pub use error::{CliError, Result};

use config::CliConfig;

/// Credit portfolio loss simulation CLI
#[derive(Parser)]
#[command(name = "credit-mc")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "credit-mc.toml")]
    config: String,

    /// Override the simulation seed
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Override the worker thread count
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    /// Override the number of systematic scenarios
    #[arg(long, global = true)]
    scenarios: Option<usize>,

    /// Override the idiosyncratic draws per scenario
    #[arg(long, global = true)]
    draws: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Simulate the portfolio and report expected loss, VaR and ES
    Simulate {
        /// Loss aggregation (obligor, rating, portfolio)
        #[arg(short, long, default_value = "portfolio")]
        aggregation: String,

        /// Output format (table, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Write the loss matrix to this CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decompose the portfolio ES into group contributions
    Attribute {
        /// Contribution aggregation (obligor, rating, portfolio)
        #[arg(short, long, default_value = "rating")]
        aggregation: String,

        /// Output format (table, csv, json)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Show only the largest contributions in table output
        #[arg(long)]
        top: Option<usize>,

        /// Write the report to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Check configuration, thread pool and a reference run
    Check,
}

impl Cli {
    /// Loads the config file, then applies environment and flag overrides.
    fn load_config(&self) -> anyhow::Result<CliConfig> {
        let mut config = CliConfig::load_or_default(Path::new(&self.config))
            .with_context(|| format!("failed to load configuration from {}", self.config))?
            .with_env_override();

        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(threads) = self.threads {
            config.simulation.threads = Some(threads);
        }
        if let Some(scenarios) = self.scenarios {
            config.simulation.scenarios = scenarios;
        }
        if let Some(draws) = self.draws {
            config.simulation.draws = draws;
        }
        if self.verbose {
            config.log_level = "debug".to_string();
        }
        Ok(config)
    }
}

fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config()?;

    init_tracing(&config.log_level);
    debug!(?config, "effective configuration");

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Simulate {
            aggregation,
            format,
            output,
        } => commands::simulate::run(&config, &aggregation, &format, output.as_deref())
            .context("simulate failed"),
        Commands::Attribute {
            aggregation,
            format,
            top,
            output,
        } => commands::attribute::run(&config, &aggregation, &format, top, output.as_deref())
            .context("attribute failed"),
        Commands::Check => commands::check::run(&config, &cli.config).context("check failed"),
    }
}
