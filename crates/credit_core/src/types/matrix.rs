//! Flat row-major matrices for systematic factors and loadings.
//!
//! Rows are scenarios and columns are obligors. The simulation engine
//! partitions work by scenario-draw rows, so a row-major layout keeps each
//! worker's reads contiguous.

use crate::error::ConfigurationError;

/// Dense `rows x cols` matrix stored in a single row-major buffer.
///
/// # Examples
///
/// ```
/// use credit_core::types::FactorMatrix;
///
/// let m = FactorMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
/// assert_eq!(m.get(1, 0), 3.0);
/// assert_eq!(m.row(0), &[1.0, 2.0]);
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FactorMatrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl FactorMatrix {
    /// Wraps an existing row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `data.len() != rows * cols`.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self, ConfigurationError> {
        if data.len() != rows * cols {
            return Err(ConfigurationError::DimensionMismatch {
                what: "matrix buffer length",
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Builds a matrix from nested rows; every row must have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, ConfigurationError> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for row in rows {
            if row.len() != n_cols {
                return Err(ConfigurationError::DimensionMismatch {
                    what: "matrix row length",
                    expected: n_cols,
                    actual: row.len(),
                });
            }
            data.extend(row);
        }
        Ok(Self {
            rows: n_rows,
            cols: n_cols,
            data,
        })
    }

    /// Builds a matrix by evaluating `f(row, col)` for every entry.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut data = Vec::with_capacity(rows * cols);
        for i in 0..rows {
            for j in 0..cols {
                data.push(f(i, j));
            }
        }
        Self { rows, cols, data }
    }

    /// Single-factor layout: row `m` repeats `per_row[m]` across all columns.
    pub fn column_constant(per_row: &[f64], cols: usize) -> Self {
        Self::from_fn(per_row.len(), cols, |i, _| per_row[i])
    }

    /// Loading layout: column `j` repeats `per_col[j]` down all rows.
    pub fn row_constant(rows: usize, per_col: &[f64]) -> Self {
        Self::from_fn(rows, per_col.len(), |_, j| per_col[j])
    }

    /// Number of rows (scenarios).
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns (obligors).
    #[inline]
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Entry at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        debug_assert!(col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Contiguous slice of one row.
    #[inline]
    pub fn row(&self, row: usize) -> &[f64] {
        let start = row * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Raw row-major buffer.
    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// New matrix holding the given columns, in the order supplied.
    pub fn select_columns(&self, columns: &[usize]) -> Result<Self, ConfigurationError> {
        if let Some(&bad) = columns.iter().find(|&&c| c >= self.cols) {
            return Err(ConfigurationError::PositionOutOfBounds {
                position: bad,
                len: self.cols,
            });
        }
        Ok(Self::from_fn(self.rows, columns.len(), |i, j| {
            self.get(i, columns[j])
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_checks_length() {
        assert!(FactorMatrix::new(2, 2, vec![0.0; 4]).is_ok());
        assert_eq!(
            FactorMatrix::new(2, 2, vec![0.0; 3]).unwrap_err(),
            ConfigurationError::DimensionMismatch {
                what: "matrix buffer length",
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn test_from_rows_ragged() {
        let err = FactorMatrix::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, ConfigurationError::DimensionMismatch { .. }));
    }

    #[test]
    fn test_column_constant() {
        let m = FactorMatrix::column_constant(&[-1.0, 2.0], 3);
        assert_eq!(m.shape(), (2, 3));
        assert_eq!(m.row(1), &[2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_row_constant() {
        let m = FactorMatrix::row_constant(3, &[0.1, 0.2]);
        assert_eq!(m.shape(), (3, 2));
        assert_eq!(m.get(2, 1), 0.2);
    }

    #[test]
    fn test_row_major_layout() {
        let m = FactorMatrix::from_fn(2, 3, |i, j| (i * 10 + j) as f64);
        assert_eq!(m.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
    }

    #[test]
    fn test_select_columns() {
        let m = FactorMatrix::from_fn(2, 3, |i, j| (i * 10 + j) as f64);
        let s = m.select_columns(&[2, 0]).unwrap();
        assert_eq!(s.shape(), (2, 2));
        assert_eq!(s.row(1), &[12.0, 10.0]);
        assert!(m.select_columns(&[3]).is_err());
    }

    #[test]
    fn test_empty_matrix() {
        let m = FactorMatrix::from_rows(Vec::new()).unwrap();
        assert_eq!(m.shape(), (0, 0));
    }
}
