//! Matrix type for 2D numeric data.

use serde::{Deserialize, Serialize};

/// A 2D matrix stored row-major (one row per graph node).
///
/// # Examples
///
/// ```
/// use ppi_features::primitives::Matrix;
///
/// let m = Matrix::from_vec(2, 3, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).expect("data length matches rows * cols");
/// assert_eq!(m.shape(), (2, 3));
/// assert_eq!(m.row(1), &[4.0, 5.0, 6.0]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T: Copy> Matrix<T> {
    /// Creates a new matrix from a vector of data.
    ///
    /// # Errors
    ///
    /// Returns an error if data length doesn't match rows * cols.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self, &'static str> {
        if data.len() != rows * cols {
            return Err("Data length must equal rows * cols");
        }
        Ok(Self { data, rows, cols })
    }

    /// Returns the shape as (rows, cols).
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.cols
    }

    /// True when the matrix holds no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Gets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> T {
        self.data[row * self.cols + col]
    }

    /// Sets element at (row, col).
    ///
    /// # Panics
    ///
    /// Panics if indices are out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        self.data[row * self.cols + col] = value;
    }

    /// Returns a row as a slice.
    #[must_use]
    pub fn row(&self, row_idx: usize) -> &[T] {
        let start = row_idx * self.cols;
        &self.data[start..start + self.cols]
    }

    /// Returns a column as an owned vector.
    #[must_use]
    pub fn column(&self, col_idx: usize) -> Vec<T> {
        (0..self.rows)
            .map(|row| self.data[row * self.cols + col_idx])
            .collect()
    }

    /// Returns the underlying data as a slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    /// Consumes the matrix, returning the row-major buffer.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Reinterprets the buffer with a new shape of equal size.
    ///
    /// # Errors
    ///
    /// Returns an error if `rows * cols` differs from the element count.
    pub fn reshape(self, rows: usize, cols: usize) -> Result<Self, &'static str> {
        Self::from_vec(rows, cols, self.data)
    }

    /// Applies `f` to every element.
    #[must_use]
    pub fn map<F: Fn(T) -> T>(&self, f: F) -> Self {
        Self {
            data: self.data.iter().map(|&x| f(x)).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Projects the given columns, in the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if any index is out of range.
    pub fn select_columns(&self, columns: &[usize]) -> Result<Self, &'static str> {
        if columns.iter().any(|&c| c >= self.cols) {
            return Err("Column index out of range");
        }
        let mut data = Vec::with_capacity(self.rows * columns.len());
        for i in 0..self.rows {
            let row = self.row(i);
            data.extend(columns.iter().map(|&c| row[c]));
        }
        Ok(Self {
            data,
            rows: self.rows,
            cols: columns.len(),
        })
    }

    /// Keeps the given rows, in the given order.
    ///
    /// # Errors
    ///
    /// Returns an error if any index is out of range.
    pub fn select_rows(&self, rows: &[usize]) -> Result<Self, &'static str> {
        if rows.iter().any(|&r| r >= self.rows) {
            return Err("Row index out of range");
        }
        let mut data = Vec::with_capacity(rows.len() * self.cols);
        for &r in rows {
            data.extend_from_slice(self.row(r));
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols: self.cols,
        })
    }

    /// Copies `block` into the contiguous column range starting at `col_offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if row counts differ or the block overruns the matrix.
    pub fn write_columns(&mut self, col_offset: usize, block: &Self) -> Result<(), &'static str> {
        if block.rows != self.rows {
            return Err("Block row count must match matrix row count");
        }
        if col_offset + block.cols > self.cols {
            return Err("Block overruns matrix columns");
        }
        for i in 0..self.rows {
            let dst = i * self.cols + col_offset;
            self.data[dst..dst + block.cols].copy_from_slice(block.row(i));
        }
        Ok(())
    }
}

impl Matrix<f64> {
    /// Creates a matrix of zeros.
    #[must_use]
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Builds a matrix from equal-length columns.
    ///
    /// # Errors
    ///
    /// Returns an error if the columns have different lengths.
    pub fn from_columns(columns: &[Vec<f64>]) -> Result<Self, &'static str> {
        let rows = columns.first().map_or(0, Vec::len);
        if columns.iter().any(|c| c.len() != rows) {
            return Err("All columns must have the same length");
        }
        let cols = columns.len();
        let mut data = vec![0.0; rows * cols];
        for (j, column) in columns.iter().enumerate() {
            for (i, &v) in column.iter().enumerate() {
                data[i * cols + j] = v;
            }
        }
        Ok(Self { data, rows, cols })
    }

    /// Bit-for-bit equality (NaN compares equal to the same NaN).
    #[must_use]
    pub fn bit_eq(&self, other: &Self) -> bool {
        self.shape() == other.shape()
            && self
                .data
                .iter()
                .zip(other.data.iter())
                .all(|(a, b)| a.to_bits() == b.to_bits())
    }
}

#[cfg(test)]
#[path = "matrix_tests.rs"]
mod tests;
