//! Minimal dense matrix used by the training engine.
//!
//! Storage is a row-major `Vec<f64>` plus a `(rows, cols)` shape. Every binary
//! operation checks shapes up front and reports a [`NetworkError::ShapeMismatch`]
//! instead of panicking, so callers can skip a bad sample and keep going.

use crate::error::{NetworkError, NetworkResult};

/// Row-major dense matrix of `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Matrix of the given shape filled with zeros.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    /// Matrix of the given shape filled with `value`.
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Builds a matrix by evaluating `f(row, col)` for every cell in row-major order.
    pub fn from_fn<F>(rows: usize, cols: usize, mut f: F) -> Self
    where
        F: FnMut(usize, usize) -> f64,
    {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    /// Wraps a row-major buffer, rejecting buffers whose length disagrees with the shape.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<f64>) -> NetworkResult<Self> {
        if data.len() != rows * cols {
            return Err(NetworkError::shape_mismatch(
                format!("{rows}x{cols} matrix buffer"),
                rows * cols,
                data.len(),
            ));
        }
        Ok(Self { rows, cols, data })
    }

    /// A `1 x n` row vector.
    pub fn row_vector(data: Vec<f64>) -> Self {
        Self {
            rows: 1,
            cols: data.len(),
            data,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Row-major view of the underlying buffer.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    /// Value at `(row, col)`, or `None` when out of bounds.
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Slice holding row `r`.
    ///
    /// # Panics
    /// Panics if `r >= self.rows()`.
    pub fn row(&self, r: usize) -> &[f64] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    fn row_mut(&mut self, r: usize) -> &mut [f64] {
        let cols = self.cols;
        &mut self.data[r * cols..(r + 1) * cols]
    }

    /// Matrix product `self · other`.
    pub fn dot(&self, other: &Matrix) -> NetworkResult<Matrix> {
        if self.cols != other.rows {
            return Err(NetworkError::shape_mismatch(
                "matrix product inner dimension",
                self.cols,
                other.rows,
            ));
        }

        let mut out = Matrix::zeros(self.rows, other.cols);
        for i in 0..self.rows {
            let lhs = self.row(i);
            let out_row = out.row_mut(i);
            for (k, &a) in lhs.iter().enumerate() {
                for (o, &b) in out_row.iter_mut().zip(other.row(k)) {
                    *o += a * b;
                }
            }
        }
        Ok(out)
    }

    pub fn transpose(&self) -> Matrix {
        Matrix::from_fn(self.cols, self.rows, |r, c| self.data[c * self.cols + r])
    }

    /// Adds the `1 x cols` row vector `bias` to every row.
    pub fn add_row(&self, bias: &Matrix) -> NetworkResult<Matrix> {
        if bias.rows != 1 || bias.cols != self.cols {
            return Err(NetworkError::shape_mismatch(
                "bias row width",
                self.cols,
                bias.data.len(),
            ));
        }

        let mut out = self.clone();
        for r in 0..out.rows {
            for (v, b) in out.row_mut(r).iter_mut().zip(&bias.data) {
                *v += b;
            }
        }
        Ok(out)
    }

    /// Element-wise `self - other`.
    pub fn sub(&self, other: &Matrix) -> NetworkResult<Matrix> {
        self.zip_with(other, "element-wise difference", |a, b| a - b)
    }

    /// Element-wise (Hadamard) product.
    pub fn hadamard(&self, other: &Matrix) -> NetworkResult<Matrix> {
        self.zip_with(other, "element-wise product", |a, b| a * b)
    }

    pub fn map<F>(&self, f: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// In-place `self -= scale * other`.
    pub fn scaled_sub_assign(&mut self, scale: f64, other: &Matrix) -> NetworkResult<()> {
        self.check_same_shape(other, "parameter update")?;
        for (v, g) in self.data.iter_mut().zip(&other.data) {
            *v -= scale * g;
        }
        Ok(())
    }

    /// Index of the largest entry in row `r`; the first index wins ties.
    ///
    /// Returns `None` for an empty or out-of-range row, or when the row holds a NaN.
    pub fn argmax_row(&self, r: usize) -> Option<usize> {
        if r >= self.rows || self.cols == 0 {
            return None;
        }

        let row = self.row(r);
        if row.iter().any(|v| v.is_nan()) {
            return None;
        }

        let mut best = 0;
        for (idx, &v) in row.iter().enumerate().skip(1) {
            if v > row[best] {
                best = idx;
            }
        }
        Some(best)
    }

    pub fn is_finite(&self) -> bool {
        self.data.iter().all(|v| v.is_finite())
    }

    fn check_same_shape(&self, other: &Matrix, what: &str) -> NetworkResult<()> {
        if self.rows != other.rows {
            return Err(NetworkError::shape_mismatch(
                format!("{what} rows"),
                self.rows,
                other.rows,
            ));
        }
        if self.cols != other.cols {
            return Err(NetworkError::shape_mismatch(
                format!("{what} columns"),
                self.cols,
                other.cols,
            ));
        }
        Ok(())
    }

    fn zip_with<F>(&self, other: &Matrix, what: &str, f: F) -> NetworkResult<Matrix>
    where
        F: Fn(f64, f64) -> f64,
    {
        self.check_same_shape(other, what)?;
        Ok(Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: usize, cols: usize, data: &[f64]) -> Matrix {
        Matrix::from_vec(rows, cols, data.to_vec()).unwrap()
    }

    #[test]
    fn test_dot_propagates_non_finite_through_zero_entries() {
        let lhs = m(1, 2, &[0.0, 1.0]);
        let rhs = m(2, 1, &[f64::INFINITY, 2.0]);
        let out = lhs.dot(&rhs).unwrap();
        assert!(out.as_slice()[0].is_nan());
        assert!(!out.is_finite());
    }

    #[test]
    fn test_from_vec_rejects_wrong_length() {
        let err = Matrix::from_vec(2, 3, vec![1.0; 5]).unwrap_err();
        assert!(matches!(
            err,
            NetworkError::ShapeMismatch {
                expected: 6,
                got: 5,
                ..
            }
        ));
    }

    #[test]
    fn test_dot_product() {
        let a = m(2, 3, &[1., 2., 3., 4., 5., 6.]);
        let b = m(3, 2, &[7., 8., 9., 10., 11., 12.]);
        let c = a.dot(&b).unwrap();
        assert_eq!(c.shape(), (2, 2));
        assert_eq!(c.as_slice(), &[58., 64., 139., 154.]);
    }

    #[test]
    fn test_dot_rejects_inner_mismatch() {
        let a = Matrix::zeros(1, 4);
        let b = Matrix::zeros(3, 2);
        assert!(matches!(
            a.dot(&b),
            Err(NetworkError::ShapeMismatch {
                expected: 4,
                got: 3,
                ..
            })
        ));
    }

    #[test]
    fn test_outer_product_via_transpose() {
        let a = Matrix::row_vector(vec![1., 2., 3.]);
        let outer = a.transpose().dot(&a).unwrap();
        assert_eq!(outer.as_slice(), &[1., 2., 3., 2., 4., 6., 3., 6., 9.]);
    }

    #[test]
    fn test_add_row_broadcasts() {
        let a = m(2, 2, &[1., 2., 3., 4.]);
        let bias = Matrix::row_vector(vec![10., 20.]);
        assert_eq!(a.add_row(&bias).unwrap().as_slice(), &[11., 22., 13., 24.]);
        assert!(a.add_row(&Matrix::row_vector(vec![1.])).is_err());
    }

    #[test]
    fn test_scaled_sub_assign() {
        let mut w = m(1, 3, &[1., 1., 1.]);
        let g = m(1, 3, &[1., 2., 3.]);
        w.scaled_sub_assign(0.5, &g).unwrap();
        assert_eq!(w.as_slice(), &[0.5, 0.0, -0.5]);
        assert!(w.scaled_sub_assign(1.0, &Matrix::zeros(3, 1)).is_err());
    }

    #[test]
    fn test_argmax_first_index_wins_ties() {
        let a = Matrix::row_vector(vec![0.2, 0.4, 0.4, 0.0]);
        assert_eq!(a.argmax_row(0), Some(1));
        assert_eq!(a.argmax_row(1), None);
        assert_eq!(Matrix::row_vector(vec![0.1, f64::NAN]).argmax_row(0), None);
    }
}
