//! Simulated loss matrix.

use credit_core::ConfigurationError;

use crate::aggregation::GroupLabel;

/// Losses per realised scenario-draw pair (rows) and group (columns).
///
/// Stored flat and row-major. Each row remembers its global index
/// `mk = m * K + k`, so rows can be mapped back to `(m, k)` and fed into a
/// narrower re-run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LossMatrix {
    data: Vec<f64>,
    n_cols: usize,
    row_indices: Vec<usize>,
    labels: Vec<GroupLabel>,
    draws_per_scenario: usize,
}

impl LossMatrix {
    /// Assembles a matrix from flat row-major data.
    ///
    /// # Errors
    ///
    /// `ConfigurationError::DimensionMismatch` if `data` does not hold
    /// `row_indices.len() * labels.len()` values, `InvalidSizing` if
    /// `draws_per_scenario` is zero.
    pub fn new(
        data: Vec<f64>,
        row_indices: Vec<usize>,
        labels: Vec<GroupLabel>,
        draws_per_scenario: usize,
    ) -> Result<Self, ConfigurationError> {
        if data.len() != row_indices.len() * labels.len() {
            return Err(ConfigurationError::DimensionMismatch {
                what: "loss matrix data",
                expected: row_indices.len() * labels.len(),
                actual: data.len(),
            });
        }
        if draws_per_scenario == 0 {
            return Err(ConfigurationError::InvalidSizing {
                name: "draws_per_scenario",
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(Self {
            data,
            n_cols: labels.len(),
            row_indices,
            labels,
            draws_per_scenario,
        })
    }

    /// Number of rows (realised scenario-draw pairs).
    #[inline]
    pub fn rows(&self) -> usize {
        self.row_indices.len()
    }

    /// Number of columns (groups).
    #[inline]
    pub fn cols(&self) -> usize {
        self.n_cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows(), self.n_cols)
    }

    /// Whether the matrix has no rows.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.row_indices.is_empty()
    }

    /// Loss at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(col < self.n_cols, "column {} out of bounds", col);
        self.data[row * self.n_cols + col]
    }

    /// One row as a slice.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.n_cols;
        &self.data[start..start + self.n_cols]
    }

    /// Iterates rows in output order.
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        // chunks_exact panics on zero
        self.data.chunks_exact(self.n_cols.max(1))
    }

    /// One column, copied out in row order.
    pub fn column(&self, col: usize) -> Vec<f64> {
        assert!(col < self.n_cols, "column {} out of bounds", col);
        self.data
            .iter()
            .skip(col)
            .step_by(self.n_cols)
            .copied()
            .collect()
    }

    /// Row sums over all groups (total portfolio loss per row).
    pub fn row_totals(&self) -> Vec<f64> {
        if self.n_cols == 0 {
            return vec![0.0; self.rows()];
        }
        self.iter_rows().map(|r| r.iter().sum()).collect()
    }

    /// Mean loss per column; zero for every column when there are no rows.
    ///
    /// Over the full domain this is the simulated expected loss per group;
    /// over a tail subset it is the group's Expected Shortfall contribution.
    pub fn column_means(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_cols];
        for row in self.iter_rows() {
            for (s, v) in sums.iter_mut().zip(row) {
                *s += v;
            }
        }
        if !self.is_empty() {
            let n = self.rows() as f64;
            sums.iter_mut().for_each(|s| *s /= n);
        }
        sums
    }

    /// Global scenario-draw index `mk` of a row.
    #[inline]
    pub fn global_index(&self, row: usize) -> usize {
        self.row_indices[row]
    }

    /// Global indices of all rows, in output order.
    #[inline]
    pub fn row_indices(&self) -> &[usize] {
        &self.row_indices
    }

    /// `(m, k)` of a row.
    #[inline]
    pub fn scenario_draw(&self, row: usize) -> (usize, usize) {
        let mk = self.row_indices[row];
        (mk / self.draws_per_scenario, mk % self.draws_per_scenario)
    }

    /// Draws per scenario `K` of the run.
    #[inline]
    pub fn draws_per_scenario(&self) -> usize {
        self.draws_per_scenario
    }

    /// Column labels.
    #[inline]
    pub fn group_labels(&self) -> &[GroupLabel] {
        &self.labels
    }

    /// Column of a group label, if present.
    pub fn position_of_group(&self, label: &GroupLabel) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Flat row-major data.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use credit_core::types::ObligorId;

    fn matrix() -> LossMatrix {
        LossMatrix::new(
            vec![1.0, 2.0, 0.0, 4.0, 6.0, 0.0],
            vec![5, 0, 3],
            vec![
                GroupLabel::Obligor(ObligorId::new(1)),
                GroupLabel::Obligor(ObligorId::new(2)),
            ],
            2,
        )
        .unwrap()
    }

    #[test]
    fn test_accessors() {
        let m = matrix();
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.get(1, 1), 4.0);
        assert_eq!(m.row(2), &[6.0, 0.0]);
        assert_eq!(m.column(0), vec![1.0, 0.0, 6.0]);
        assert_eq!(m.global_index(0), 5);
        assert_eq!(m.scenario_draw(0), (2, 1));
        assert_eq!(m.scenario_draw(2), (1, 1));
    }

    #[test]
    fn test_row_totals_and_means() {
        let m = matrix();
        assert_eq!(m.row_totals(), vec![3.0, 4.0, 6.0]);
        let means = m.column_means();
        assert_relative_eq!(means[0], 7.0 / 3.0);
        assert_relative_eq!(means[1], 2.0);
    }

    #[test]
    fn test_position_of_group() {
        let m = matrix();
        assert_eq!(m.position_of_group(&GroupLabel::Obligor(ObligorId::new(2))), Some(1));
        assert_eq!(m.position_of_group(&GroupLabel::Portfolio), None);
    }

    #[test]
    fn test_empty_matrix() {
        let m = LossMatrix::new(Vec::new(), Vec::new(), vec![GroupLabel::Portfolio], 1).unwrap();
        assert!(m.is_empty());
        assert_eq!(m.column_means(), vec![0.0]);
        assert!(m.row_totals().is_empty());
    }

    #[test]
    fn test_shape_mismatch_rejected() {
        let result = LossMatrix::new(vec![1.0; 5], vec![0, 1, 2], vec![GroupLabel::Portfolio], 1);
        assert!(matches!(result, Err(ConfigurationError::DimensionMismatch { expected: 3, actual: 5, .. })));
    }
}
