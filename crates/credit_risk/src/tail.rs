//! Tail risk measures on simulated loss distributions.
//!
//! With `N` losses and level `q`, Value at Risk is the `n_tail`-th largest
//! loss,
//!
//! ```text
//! n_tail = max(1, ceil(N * (1 - q)))
//! ```
//!
//! and the tail is every loss at or above VaR, ordered worst first with ties
//! in ascending position. Losses tied at VaR all belong to the tail, so it can
//! hold more than `n_tail` rows. Expected Shortfall is the mean of the tail,
//! so `ES >= VaR` always holds and the tail is reproducible bit for bit.

use credit_core::ConfigurationError;
use credit_kernel::{GroupLabel, LossMatrix};
use rayon::prelude::*;
use tracing::debug;

use crate::error::RiskError;

/// Slack for `N * (1 - q)` landing just above an integer (`1000 * 0.01`).
const TAIL_SIZE_GUARD: f64 = 1e-9;

/// Quantile level in the open interval `(0, 1)`.
///
/// # Examples
///
/// ```rust
/// use credit_risk::tail::Quantile;
///
/// let q = Quantile::new(0.99).unwrap();
/// assert_eq!(q.tail_size(1_000), 10);
/// assert_eq!(q.tail_size(50), 1);
/// assert!(Quantile::new(1.0).is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quantile(f64);

impl Quantile {
    /// The 99% level used for ES99.
    pub const ES99: Quantile = Quantile(0.99);

    /// Creates a quantile level.
    ///
    /// # Errors
    ///
    /// `RiskError::InvalidQuantile` unless `0 < q < 1`.
    pub fn new(q: f64) -> Result<Self, RiskError> {
        if q > 0.0 && q < 1.0 {
            Ok(Self(q))
        } else {
            Err(RiskError::InvalidQuantile(q))
        }
    }

    /// Level as a probability.
    #[inline]
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Order of the VaR statistic among `n` losses: the minimum tail size
    /// (zero only when `n == 0`).
    pub fn tail_size(&self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        let raw = (n as f64 * (1.0 - self.0) - TAIL_SIZE_GUARD).ceil();
        (raw.max(1.0) as usize).min(n)
    }
}

impl Default for Quantile {
    fn default() -> Self {
        Self::ES99
    }
}

/// Empirical Value at Risk: the `n_tail`-th largest loss.
///
/// # Errors
///
/// `RiskError::EmptyLosses` if `losses` is empty.
pub fn value_at_risk(losses: &[f64], quantile: Quantile) -> Result<f64, RiskError> {
    if losses.is_empty() {
        return Err(RiskError::EmptyLosses);
    }
    let n_tail = quantile.tail_size(losses.len());
    let mut sorted = losses.to_vec();
    let (_, var, _) = sorted.select_nth_unstable_by(n_tail - 1, |a, b| b.total_cmp(a));
    Ok(*var)
}

/// Positions of every loss at or above VaR, worst first.
///
/// # Errors
///
/// `RiskError::EmptyLosses` if `losses` is empty.
///
/// # Examples
///
/// ```rust
/// use credit_risk::tail::{tail_rows, Quantile};
///
/// // VaR at 0.5 is the third largest loss, 5; all three 5s are in the tail.
/// let losses = [5.0, 9.0, 5.0, 0.0, 5.0, 1.0];
/// let rows = tail_rows(&losses, Quantile::new(0.5).unwrap()).unwrap();
/// assert_eq!(rows, vec![1, 0, 2, 4]);
/// ```
pub fn tail_rows(losses: &[f64], quantile: Quantile) -> Result<Vec<usize>, RiskError> {
    let var = value_at_risk(losses, quantile)?;
    let mut rows: Vec<usize> = (0..losses.len())
        .filter(|&r| losses[r].total_cmp(&var).is_ge())
        .collect();
    rows.sort_unstable_by(|&a, &b| losses[b].total_cmp(&losses[a]).then_with(|| a.cmp(&b)));
    Ok(rows)
}

/// Expected Shortfall: the mean of all losses at or above VaR.
///
/// # Errors
///
/// `RiskError::EmptyLosses` if `losses` is empty.
///
/// # Examples
///
/// ```rust
/// use credit_risk::tail::{expected_shortfall, Quantile};
///
/// let losses: Vec<f64> = (1..=100).map(f64::from).collect();
/// let q = Quantile::new(0.95).unwrap();
/// // Five worst losses: 96..=100.
/// assert_eq!(expected_shortfall(&losses, q).unwrap(), 98.0);
/// ```
pub fn expected_shortfall(losses: &[f64], quantile: Quantile) -> Result<f64, RiskError> {
    let rows = tail_rows(losses, quantile)?;
    Ok(mean_of(losses, &rows))
}

fn mean_of(losses: &[f64], rows: &[usize]) -> f64 {
    rows.iter().map(|&r| losses[r]).sum::<f64>() / rows.len() as f64
}

/// Tail statistics of one loss vector.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TailAnalysis {
    /// Quantile level.
    pub quantile: f64,
    /// Number of losses analysed.
    pub n_losses: usize,
    /// Smallest tail loss (the `n_tail`-th largest loss).
    pub value_at_risk: f64,
    /// Mean tail loss.
    pub expected_shortfall: f64,
    /// Positions of every loss at or above VaR, worst first.
    pub tail_rows: Vec<usize>,
    /// Global scenario-draw indices of the tail rows, ready for a subset re-run.
    pub tail_indices: Vec<usize>,
}

impl TailAnalysis {
    /// Analyses `losses`, mapping positions to global indices through
    /// `row_indices` (identity when `None`).
    ///
    /// # Errors
    ///
    /// `RiskError::EmptyLosses` if `losses` is empty; `DimensionMismatch` if
    /// `row_indices` has a different length.
    pub fn from_losses(
        losses: &[f64],
        row_indices: Option<&[usize]>,
        quantile: Quantile,
    ) -> Result<Self, RiskError> {
        if let Some(indices) = row_indices {
            if indices.len() != losses.len() {
                return Err(ConfigurationError::DimensionMismatch {
                    what: "row indices vs losses",
                    expected: losses.len(),
                    actual: indices.len(),
                }
                .into());
            }
        }
        let tail_rows = tail_rows(losses, quantile)?;
        let tail_indices = match row_indices {
            Some(indices) => tail_rows.iter().map(|&r| indices[r]).collect(),
            None => tail_rows.clone(),
        };
        let value_at_risk = tail_rows.last().map_or(0.0, |&r| losses[r]);
        let expected_shortfall = mean_of(losses, &tail_rows);
        Ok(Self {
            quantile: quantile.value(),
            n_losses: losses.len(),
            value_at_risk,
            expected_shortfall,
            tail_rows,
            tail_indices,
        })
    }

    /// Number of tail observations, including every row tied at VaR.
    #[inline]
    pub fn tail_size(&self) -> usize {
        self.tail_rows.len()
    }
}

/// Tail analysis of loss matrices at a fixed quantile.
#[derive(Clone, Copy, Debug, Default)]
pub struct TailAnalyzer {
    quantile: Quantile,
}

impl TailAnalyzer {
    /// Creates an analyser at `quantile`.
    pub fn new(quantile: Quantile) -> Self {
        Self { quantile }
    }

    /// Quantile level in use.
    #[inline]
    pub fn quantile(&self) -> Quantile {
        self.quantile
    }

    /// Tail of the row totals (portfolio loss per scenario-draw pair).
    ///
    /// # Errors
    ///
    /// `RiskError::EmptyLosses` if the matrix has no rows.
    pub fn analyze_totals(&self, losses: &LossMatrix) -> Result<TailAnalysis, RiskError> {
        let totals = losses.row_totals();
        let analysis = TailAnalysis::from_losses(&totals, Some(losses.row_indices()), self.quantile)?;
        debug!(
            rows = analysis.n_losses,
            tail = analysis.tail_size(),
            var = analysis.value_at_risk,
            es = analysis.expected_shortfall,
            "portfolio tail extracted"
        );
        Ok(analysis)
    }

    /// Independent tail of every column, in column order.
    ///
    /// # Errors
    ///
    /// `RiskError::EmptyLosses` if the matrix has no rows.
    pub fn analyze_columns(&self, losses: &LossMatrix) -> Result<Vec<TailAnalysis>, RiskError> {
        (0..losses.cols())
            .into_par_iter()
            .map(|col| self.analyze_column(losses, col))
            .collect()
    }

    /// Tail of the column labelled `label`.
    ///
    /// # Errors
    ///
    /// `RiskError::GroupNotFound` if no column carries the label.
    pub fn analyze_group(
        &self,
        losses: &LossMatrix,
        label: &GroupLabel,
    ) -> Result<TailAnalysis, RiskError> {
        let col = losses
            .position_of_group(label)
            .ok_or_else(|| RiskError::GroupNotFound(label.to_string()))?;
        self.analyze_column(losses, col)
    }

    fn analyze_column(&self, losses: &LossMatrix, col: usize) -> Result<TailAnalysis, RiskError> {
        TailAnalysis::from_losses(&losses.column(col), Some(losses.row_indices()), self.quantile)
    }
}
