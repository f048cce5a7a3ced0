//! Loss and label helpers for one-hot classification targets.

use super::matrix::Matrix;
use crate::error::{NetworkError, NetworkResult};

/// Added inside the logarithm so a zero probability never yields `ln(0)`.
pub const LOG_EPSILON: f64 = 1e-8;

/// Cross-entropy `−Σ target · ln(output + ε)` between a `1 x k` softmax row and a one-hot target.
pub fn cross_entropy_loss(output: &Matrix, target: &[f64]) -> NetworkResult<f64> {
    if output.rows() != 1 {
        return Err(NetworkError::shape_mismatch(
            "softmax output rows",
            1,
            output.rows(),
        ));
    }
    if output.cols() != target.len() {
        return Err(NetworkError::shape_mismatch(
            "target width",
            output.cols(),
            target.len(),
        ));
    }

    let loss = -output
        .as_slice()
        .iter()
        .zip(target)
        .map(|(&o, &t)| t * (o + LOG_EPSILON).ln())
        .sum::<f64>();

    if loss.is_finite() {
        Ok(loss)
    } else {
        Err(NetworkError::non_finite("cross-entropy loss"))
    }
}

/// Class encoded by a one-hot target: the first component above 0.5.
pub fn one_hot_index(target: &[f64]) -> Option<usize> {
    target.iter().position(|&v| v > 0.5)
}

/// One-hot vector of width `num_classes` with `label` set to 1.0.
///
/// Returns `None` when `label` is out of range.
pub fn one_hot(label: usize, num_classes: usize) -> Option<Vec<f64>> {
    if label >= num_classes {
        return None;
    }
    let mut target = vec![0.0; num_classes];
    target[label] = 1.0;
    Some(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cross_entropy_of_confident_correct_output_is_small() {
        let output = Matrix::row_vector(vec![0.98, 0.01, 0.01]);
        let loss = cross_entropy_loss(&output, &[1.0, 0.0, 0.0]).unwrap();
        assert!(loss > 0.0 && loss < 0.05);
    }

    #[test]
    fn test_cross_entropy_zero_probability_stays_finite() {
        let output = Matrix::row_vector(vec![0.0, 1.0]);
        let loss = cross_entropy_loss(&output, &[1.0, 0.0]).unwrap();
        assert!((loss - (-(LOG_EPSILON).ln())).abs() < 1e-9);
    }

    #[test]
    fn test_cross_entropy_rejects_width_mismatch() {
        let output = Matrix::row_vector(vec![0.5, 0.5]);
        assert!(cross_entropy_loss(&output, &[1.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn test_one_hot_round_trip() {
        let target = one_hot(7, 10).unwrap();
        assert_eq!(one_hot_index(&target), Some(7));
        assert_eq!(one_hot(10, 10), None);
        assert_eq!(one_hot_index(&[0.0, 0.2, 0.5]), None);
    }
}
