//! Systematic scenario and factor loading matrices.

use super::matrix::FactorMatrix;
use super::portfolio::Portfolio;
use crate::error::{ConfigurationError, NumericDomainError};

/// Systematic factor realisations `Z` paired with factor loadings `r`.
///
/// `Z[m, j]` is the factor value for scenario `m` seen by obligor column `j`,
/// `r[m, j]` the matching loading. Both matrices always share one shape.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioSet {
    factors: FactorMatrix,
    loadings: FactorMatrix,
}

impl ScenarioSet {
    /// Pairs a factor matrix with a scenario-obligor loading matrix.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if the two shapes differ.
    pub fn new(factors: FactorMatrix, loadings: FactorMatrix) -> Result<Self, ConfigurationError> {
        if factors.rows() != loadings.rows() {
            return Err(ConfigurationError::DimensionMismatch {
                what: "loading matrix rows",
                expected: factors.rows(),
                actual: loadings.rows(),
            });
        }
        if factors.cols() != loadings.cols() {
            return Err(ConfigurationError::DimensionMismatch {
                what: "loading matrix columns",
                expected: factors.cols(),
                actual: loadings.cols(),
            });
        }
        Ok(Self { factors, loadings })
    }

    /// Uses each obligor's own loading for every scenario (column-constant `r`).
    pub fn with_obligor_loadings(
        factors: FactorMatrix,
        portfolio: &Portfolio,
    ) -> Result<Self, ConfigurationError> {
        let per_obligor: Vec<f64> = portfolio
            .obligors()
            .iter()
            .map(|o| o.factor_loading())
            .collect();
        let loadings = FactorMatrix::row_constant(factors.rows(), &per_obligor);
        Self::new(factors, loadings)
    }

    /// Systematic factor matrix `Z`.
    #[inline]
    pub fn factors(&self) -> &FactorMatrix {
        &self.factors
    }

    /// Loading matrix `r`.
    #[inline]
    pub fn loadings(&self) -> &FactorMatrix {
        &self.loadings
    }

    /// Number of scenario rows.
    #[inline]
    pub fn n_scenarios(&self) -> usize {
        self.factors.rows()
    }

    /// Number of obligor columns.
    #[inline]
    pub fn n_obligors(&self) -> usize {
        self.factors.cols()
    }

    /// Slices both matrices to the given obligor columns.
    ///
    /// Use with the same positions passed to [`Portfolio::subset`] so columns
    /// and obligors stay aligned.
    pub fn select_obligors(&self, positions: &[usize]) -> Result<Self, ConfigurationError> {
        Ok(Self {
            factors: self.factors.select_columns(positions)?,
            loadings: self.loadings.select_columns(positions)?,
        })
    }

    /// Checks the first `n_scenarios` rows against the portfolio.
    ///
    /// # Errors
    ///
    /// - `ConfigurationError::DimensionMismatch` when the column count differs
    ///   from the portfolio size
    /// - `ConfigurationError::ScenarioCountExceeded` when fewer rows exist
    /// - `NumericDomainError::NonFiniteFactor` / `FactorLoading` naming the
    ///   obligor and scenario of the first offending entry
    pub fn validate_against(
        &self,
        portfolio: &Portfolio,
        n_scenarios: usize,
    ) -> Result<(), crate::error::CreditError> {
        if self.n_obligors() != portfolio.len() {
            return Err(ConfigurationError::DimensionMismatch {
                what: "scenario matrix columns vs portfolio size",
                expected: portfolio.len(),
                actual: self.n_obligors(),
            }
            .into());
        }
        if n_scenarios > self.n_scenarios() {
            return Err(ConfigurationError::ScenarioCountExceeded {
                requested: n_scenarios,
                available: self.n_scenarios(),
            }
            .into());
        }

        let obligors = portfolio.obligors();
        for m in 0..n_scenarios {
            let z_row = self.factors.row(m);
            let r_row = self.loadings.row(m);
            for (j, obligor) in obligors.iter().enumerate() {
                if !z_row[j].is_finite() {
                    return Err(NumericDomainError::NonFiniteFactor {
                        obligor: obligor.id(),
                        scenario: m,
                        value: z_row[j],
                    }
                    .into());
                }
                if !(-1.0..=1.0).contains(&r_row[j]) {
                    return Err(NumericDomainError::FactorLoading {
                        obligor: obligor.id(),
                        scenario: Some(m),
                        value: r_row[j],
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
