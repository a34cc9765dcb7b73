//! Expected Shortfall contributions.
//!
//! Re-simulating exactly the parent tail rows at a finer aggregation gives
//! per-group losses on the tail scenarios. Because every random draw is
//! addressed by its coordinate, those rows reproduce the parent run, and the
//! column means add up to the parent ES:
//!
//! ```text
//! ES = (1 / |tail|) * sum_{rows in tail} sum_g L[row, g] = sum_g ES_g
//! ```

use credit_kernel::{GroupLabel, LossMatrix};

use crate::error::RiskError;
use crate::tail::TailAnalysis;

/// One group's share of the parent Expected Shortfall.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contribution {
    /// Group label.
    pub label: GroupLabel,
    /// Mean loss of the group over the parent tail rows.
    pub expected_shortfall: f64,
    /// Fraction of the parent ES (zero when the parent ES is zero).
    pub share: f64,
}

/// Decomposition of a parent ES into group contributions.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContributionReport {
    /// Tail of the parent run.
    pub parent: TailAnalysis,
    /// Contributions in the column order of the tail re-run.
    pub contributions: Vec<Contribution>,
    /// `parent ES - sum of contributions`; floating-point noise only.
    pub residual: f64,
}

impl ContributionReport {
    /// Builds the report from a re-run restricted to the parent tail.
    ///
    /// # Errors
    ///
    /// `RiskError::TailMismatch` if `tail_run` rows are not the parent's tail
    /// indices in the same order; `RiskError::EmptyLosses` if it has no rows.
    pub fn from_tail_run(parent: TailAnalysis, tail_run: &LossMatrix) -> Result<Self, RiskError> {
        if tail_run.is_empty() {
            return Err(RiskError::EmptyLosses);
        }
        check_rows(&parent.tail_indices, tail_run.row_indices())?;

        let parent_es = parent.expected_shortfall;
        let contributions: Vec<Contribution> = tail_run
            .group_labels()
            .iter()
            .cloned()
            .zip(tail_run.column_means())
            .map(|(label, es)| Contribution {
                label,
                expected_shortfall: es,
                share: if parent_es != 0.0 { es / parent_es } else { 0.0 },
            })
            .collect();
        let residual = parent_es - contributions.iter().map(|c| c.expected_shortfall).sum::<f64>();

        Ok(Self {
            parent,
            contributions,
            residual,
        })
    }

    /// Sum of group contributions.
    pub fn total(&self) -> f64 {
        self.contributions.iter().map(|c| c.expected_shortfall).sum()
    }

    /// Contribution of one group.
    pub fn get(&self, label: &GroupLabel) -> Option<&Contribution> {
        self.contributions.iter().find(|c| &c.label == label)
    }

    /// Contributions ordered largest first (ties keep column order).
    pub fn ranked(&self) -> Vec<&Contribution> {
        let mut ranked: Vec<&Contribution> = self.contributions.iter().collect();
        ranked.sort_by(|a, b| b.expected_shortfall.total_cmp(&a.expected_shortfall));
        ranked
    }
}

fn check_rows(expected: &[usize], actual: &[usize]) -> Result<(), RiskError> {
    if expected.len() != actual.len() {
        let position = expected.len().min(actual.len());
        return Err(RiskError::TailMismatch {
            position,
            expected: expected.get(position).copied().unwrap_or(usize::MAX),
            actual: actual.get(position).copied().unwrap_or(usize::MAX),
        });
    }
    match expected.iter().zip(actual).position(|(e, a)| e != a) {
        Some(position) => Err(RiskError::TailMismatch {
            position,
            expected: expected[position],
            actual: actual[position],
        }),
        None => Ok(()),
    }
}
