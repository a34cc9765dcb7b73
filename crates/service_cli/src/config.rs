//! CLI configuration management.
//!
//! Settings come from an optional TOML file (`credit-mc.toml` by default)
//! with environment variable overrides:
//!
//! ```toml
//! log_level = "info"
//!
//! [simulation]
//! scenarios = 1000
//! draws = 100
//! seed = 42
//! threads = 8
//! chunk_rows = 64
//! quantile = 0.99
//!
//! [portfolio]
//! obligors = 200
//! seed = 1
//! ratings = [{ name = "BBB", pd = 0.0025 }, { name = "B", pd = 0.04 }]
//! ```

use std::path::{Path, PathBuf};

use credit_core::synthetic::{RatingBucket, SyntheticPortfolioConfig};
use credit_core::ConfigurationError;
use credit_kernel::engine::DEFAULT_CHUNK_ROWS;
use credit_kernel::{AggregationKey, SimulationConfig};
use credit_risk::{Quantile, RiskError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable overriding `simulation.seed`.
pub const ENV_SEED: &str = "CREDIT_MC_SEED";
/// Environment variable overriding `simulation.threads`.
pub const ENV_THREADS: &str = "CREDIT_MC_THREADS";
/// Environment variable overriding `simulation.scenarios`.
pub const ENV_SCENARIOS: &str = "CREDIT_MC_SCENARIOS";
/// Environment variable overriding `simulation.draws`.
pub const ENV_DRAWS: &str = "CREDIT_MC_DRAWS";
/// Environment variable overriding `log_level`.
pub const ENV_LOG: &str = "CREDIT_MC_LOG";

const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Simulation sizing and tail settings (`[simulation]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSettings {
    /// Systematic scenarios `M`; also the number of generated factor rows.
    pub scenarios: usize,
    /// Idiosyncratic draws per scenario `K`.
    pub draws: usize,
    /// Seed of the addressed random streams.
    pub seed: u64,
    /// Worker threads; all logical cores when unset.
    pub threads: Option<usize>,
    /// Rows per parallel work item.
    pub chunk_rows: usize,
    /// ES / VaR confidence level.
    pub quantile: f64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            scenarios: 1_000,
            draws: 100,
            seed: 42,
            threads: None,
            chunk_rows: DEFAULT_CHUNK_ROWS,
            quantile: 0.99,
        }
    }
}

/// One rating bucket of the synthetic portfolio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RatingSettings {
    /// Rating label.
    pub name: String,
    /// Probability of default.
    pub pd: f64,
}

/// Synthetic portfolio generator settings (`[portfolio]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PortfolioSettings {
    /// Number of obligors.
    pub obligors: usize,
    /// Generator seed, independent of the simulation seed.
    pub seed: u64,
    /// Rating scale.
    pub ratings: Vec<RatingSettings>,
    /// Mean of log exposure.
    pub exposure_log_mean: f64,
    /// Standard deviation of log exposure.
    pub exposure_log_sd: f64,
    /// LGD Beta alpha.
    pub lgd_alpha: f64,
    /// LGD Beta beta.
    pub lgd_beta: f64,
    /// Lower factor loading bound.
    pub loading_min: f64,
    /// Upper factor loading bound.
    pub loading_max: f64,
}

impl Default for PortfolioSettings {
    fn default() -> Self {
        let synthetic = SyntheticPortfolioConfig::default();
        Self {
            obligors: 200,
            seed: synthetic.seed,
            ratings: synthetic
                .ratings
                .iter()
                .map(|b| RatingSettings {
                    name: b.rating.as_str().to_string(),
                    pd: b.probability_of_default,
                })
                .collect(),
            exposure_log_mean: synthetic.exposure_log_mean,
            exposure_log_sd: synthetic.exposure_log_sd,
            lgd_alpha: synthetic.lgd_alpha,
            lgd_beta: synthetic.lgd_beta,
            loading_min: synthetic.loading_min,
            loading_max: synthetic.loading_max,
        }
    }
}

/// Complete `credit-mc` configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Default tracing level when `RUST_LOG` is unset.
    pub log_level: String,
    /// Simulation settings.
    pub simulation: SimulationSettings,
    /// Synthetic portfolio settings.
    pub portfolio: PortfolioSettings,
    /// Unparseable environment overrides, reported by `validate`.
    #[serde(skip)]
    env_errors: Vec<String>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            simulation: SimulationSettings::default(),
            portfolio: PortfolioSettings::default(),
            env_errors: Vec::new(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load `path` if it exists, otherwise return the defaults.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Apply `CREDIT_MC_*` environment variable overrides.
    pub fn with_env_override(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(seed) = lookup(ENV_SEED) {
            match seed.trim().parse() {
                Ok(seed) => self.simulation.seed = seed,
                Err(_) => self.env_errors.push(format!("{ENV_SEED}='{seed}' is not a u64")),
            }
        }
        if let Some(threads) = lookup(ENV_THREADS) {
            match threads.trim().parse() {
                Ok(threads) => self.simulation.threads = Some(threads),
                Err(_) => self
                    .env_errors
                    .push(format!("{ENV_THREADS}='{threads}' is not a thread count")),
            }
        }
        if let Some(scenarios) = lookup(ENV_SCENARIOS) {
            match scenarios.trim().parse() {
                Ok(scenarios) => self.simulation.scenarios = scenarios,
                Err(_) => self
                    .env_errors
                    .push(format!("{ENV_SCENARIOS}='{scenarios}' is not a scenario count")),
            }
        }
        if let Some(draws) = lookup(ENV_DRAWS) {
            match draws.trim().parse() {
                Ok(draws) => self.simulation.draws = draws,
                Err(_) => self
                    .env_errors
                    .push(format!("{ENV_DRAWS}='{draws}' is not a draw count")),
            }
        }
        if let Some(level) = lookup(ENV_LOG) {
            self.log_level = level;
        }
        self
    }

    /// Validate the configuration, collecting every problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = self.env_errors.clone();

        if !VALID_LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            errors.push(format!(
                "Invalid log_level '{}'. Valid values: {:?}",
                self.log_level, VALID_LOG_LEVELS
            ));
        }

        let sim = &self.simulation;
        if sim.scenarios == 0 {
            errors.push("simulation.scenarios must be greater than 0".to_string());
        }
        if sim.draws == 0 {
            errors.push("simulation.draws must be greater than 0".to_string());
        }
        if sim.scenarios.checked_mul(sim.draws).is_none() {
            errors.push(format!(
                "simulation.scenarios * simulation.draws overflows ({} * {})",
                sim.scenarios, sim.draws
            ));
        }
        if sim.threads == Some(0) {
            errors.push("simulation.threads must be greater than 0".to_string());
        }
        if sim.chunk_rows == 0 {
            errors.push("simulation.chunk_rows must be greater than 0".to_string());
        }
        if !(sim.quantile > 0.0 && sim.quantile < 1.0) {
            errors.push(format!(
                "simulation.quantile {} must lie strictly between 0 and 1",
                sim.quantile
            ));
        }

        let pf = &self.portfolio;
        if pf.obligors == 0 {
            errors.push("portfolio.obligors must be greater than 0".to_string());
        }
        if pf.obligors as u64 > u32::MAX as u64 {
            errors.push(format!(
                "portfolio.obligors {} exceeds the addressable maximum {}",
                pf.obligors,
                u32::MAX
            ));
        }
        if pf.ratings.is_empty() {
            errors.push("portfolio.ratings cannot be empty".to_string());
        }
        for rating in pf.ratings.iter().filter(|r| !(0.0..=1.0).contains(&r.pd)) {
            errors.push(format!(
                "portfolio rating '{}' has pd {} outside [0, 1]",
                rating.name, rating.pd
            ));
        }
        if !(-1.0..=1.0).contains(&pf.loading_min)
            || !(-1.0..=1.0).contains(&pf.loading_max)
            || pf.loading_min > pf.loading_max
        {
            errors.push(format!(
                "portfolio loading band [{}, {}] must be ordered and inside [-1, 1]",
                pf.loading_min, pf.loading_max
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Worker thread count: the configured value, or all logical cores.
    pub fn worker_threads(&self) -> usize {
        self.simulation.threads.unwrap_or_else(num_cpus::get)
    }

    /// Engine configuration for a full run at `aggregation`.
    pub fn simulation_config(
        &self,
        aggregation: AggregationKey,
    ) -> Result<SimulationConfig, ConfigurationError> {
        SimulationConfig::builder()
            .n_scenarios(self.simulation.scenarios)
            .draws_per_scenario(self.simulation.draws)
            .seed(self.simulation.seed)
            .threads(self.worker_threads())
            .chunk_rows(self.simulation.chunk_rows)
            .aggregation(aggregation)
            .build()
    }

    /// Synthetic generator settings; one factor row per simulated scenario.
    pub fn synthetic(&self) -> SyntheticPortfolioConfig {
        let pf = &self.portfolio;
        SyntheticPortfolioConfig {
            n_obligors: pf.obligors,
            n_scenarios: self.simulation.scenarios,
            seed: pf.seed,
            ratings: pf
                .ratings
                .iter()
                .map(|r| RatingBucket::new(r.name.clone(), r.pd))
                .collect(),
            exposure_log_mean: pf.exposure_log_mean,
            exposure_log_sd: pf.exposure_log_sd,
            lgd_alpha: pf.lgd_alpha,
            lgd_beta: pf.lgd_beta,
            loading_min: pf.loading_min,
            loading_max: pf.loading_max,
        }
    }

    /// Tail confidence level.
    pub fn quantile(&self) -> Result<Quantile, RiskError> {
        Quantile::new(self.simulation.quantile)
    }
}

/// Configuration error type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("IO error reading {}: {message}", path.display())]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error message.
        message: String,
    },
    /// Config file is not valid TOML for this schema.
    #[error("Parse error: {0}")]
    Parse(String),
    /// One or more settings are invalid.
    #[error("Validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn validation_errors(config: &CliConfig) -> Vec<String> {
        match config.validate() {
            Err(ConfigError::Validation(errors)) => errors,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config_validates() {
        let config = CliConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.simulation.chunk_rows, DEFAULT_CHUNK_ROWS);
        assert_eq!(config.portfolio.ratings.len(), 7);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            log_level = "debug"

            [simulation]
            scenarios = 250
            seed = 7

            [portfolio]
            obligors = 12
            ratings = [{{ name = "B", pd = 0.04 }}]
            "#
        )
        .unwrap();

        let config = CliConfig::load(file.path()).unwrap();
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.simulation.scenarios, 250);
        assert_eq!(config.simulation.seed, 7);
        assert_eq!(config.simulation.draws, SimulationSettings::default().draws);
        assert_eq!(config.portfolio.obligors, 12);
        assert_eq!(config.portfolio.ratings[0].name, "B");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[simulation]\npaths = 10").unwrap();
        assert!(matches!(
            CliConfig::load(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, CliConfig::default());
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            CliConfig::load(&dir.path().join("absent.toml")),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_overrides_apply() {
        let config = CliConfig::default().with_overrides(env(&[
            (ENV_SEED, "99"),
            (ENV_THREADS, "3"),
            (ENV_SCENARIOS, "500"),
            (ENV_DRAWS, "8"),
            (ENV_LOG, "warn"),
        ]));
        assert_eq!(config.simulation.seed, 99);
        assert_eq!(config.simulation.threads, Some(3));
        assert_eq!(config.simulation.scenarios, 500);
        assert_eq!(config.simulation.draws, 8);
        assert_eq!(config.log_level, "warn");
        assert_eq!(config.worker_threads(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_override_reported_by_validate() {
        let config = CliConfig::default().with_overrides(env(&[(ENV_SEED, "forty-two")]));
        assert_eq!(config.simulation.seed, SimulationSettings::default().seed);
        let errors = validation_errors(&config);
        assert!(errors.iter().any(|e| e.contains(ENV_SEED)));
    }

    #[test]
    fn test_env_override_reads_process_environment() {
        std::env::set_var(ENV_DRAWS, "17");
        let config = CliConfig::default().with_env_override();
        std::env::remove_var(ENV_DRAWS);
        assert_eq!(config.simulation.draws, 17);
    }

    #[test]
    fn test_validate_collects_multiple_errors() {
        let mut config = CliConfig::default();
        config.log_level = "loud".to_string();
        config.simulation.draws = 0;
        config.simulation.threads = Some(0);
        config.simulation.quantile = 1.0;
        config.portfolio.ratings.clear();

        let errors = validation_errors(&config);
        assert_eq!(errors.len(), 5);
        assert!(errors.iter().any(|e| e.contains("log_level")));
        assert!(errors.iter().any(|e| e.contains("quantile")));
    }

    #[test]
    fn test_validate_rating_pd_and_loading_band() {
        let mut config = CliConfig::default();
        config.portfolio.ratings[0].pd = 1.2;
        config.portfolio.loading_min = 0.8;
        config.portfolio.loading_max = 0.2;

        let errors = validation_errors(&config);
        assert!(errors.iter().any(|e| e.contains("AAA")));
        assert!(errors.iter().any(|e| e.contains("loading band")));
    }

    #[test]
    fn test_simulation_config_mirrors_settings() {
        let mut config = CliConfig::default();
        config.simulation.threads = Some(2);
        let sim = config.simulation_config(AggregationKey::Rating).unwrap();
        assert_eq!(sim.n_scenarios(), 1_000);
        assert_eq!(sim.draws_per_scenario(), 100);
        assert_eq!(sim.seed(), 42);
        assert_eq!(sim.threads(), Some(2));
        assert!(matches!(sim.aggregation(), AggregationKey::Rating));
    }

    #[test]
    fn test_synthetic_matches_simulation_rows() {
        let mut config = CliConfig::default();
        config.simulation.scenarios = 40;
        config.portfolio.obligors = 6;
        let synthetic = config.synthetic();
        assert_eq!(synthetic.n_scenarios, 40);
        assert_eq!(synthetic.n_obligors, 6);
        assert_eq!(synthetic.ratings.len(), config.portfolio.ratings.len());
    }

    #[test]
    fn test_config_error_display() {
        let error = ConfigError::Validation(vec!["Error 1".to_string(), "Error 2".to_string()]);
        assert_eq!(error.to_string(), "Validation errors: Error 1; Error 2");
    }
}
