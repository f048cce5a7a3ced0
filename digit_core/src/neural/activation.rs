//! Activation functions applied by the dense stack.

use super::matrix::Matrix;

/// Logistic sigmoid `1 / (1 + e^-x)`.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// `σ(x)·(1 − σ(x))`.
///
/// Backpropagation feeds this the already-activated value of a hidden layer,
/// so the factor it produces is `σ(a)·(1 − σ(a))` with `a = σ(z)`. Trained
/// models depend on that exact factor.
pub fn sigmoid_derivative(x: f64) -> f64 {
    let s = sigmoid(x);
    s * (1.0 - s)
}

/// Element-wise sigmoid.
pub fn sigmoid_matrix(z: &Matrix) -> Matrix {
    z.map(sigmoid)
}

/// Row-wise softmax. The row maximum is subtracted before exponentiating.
pub fn softmax(z: &Matrix) -> Matrix {
    let (rows, cols) = z.shape();
    let mut data = Vec::with_capacity(rows * cols);

    for r in 0..rows {
        let row = z.row(r);
        let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = row.iter().map(|&v| (v - max).exp()).collect();
        let sum: f64 = exp.iter().sum();
        data.extend(exp.into_iter().map(|e| e / sum));
    }

    Matrix::from_fn(rows, cols, |r, c| data[r * cols + c])
}
