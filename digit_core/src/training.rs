//! Training configuration, per-epoch metrics and evaluation helpers.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::NetworkError;
use crate::neural::loss::one_hot_index;
use crate::neural::TrainableNetwork;

/// Training configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    /// Number of passes over the sample collection
    pub epochs: usize,
    /// Accepted for compatibility with batch-oriented callers. Updates stay
    /// strictly per-sample regardless of this value.
    pub batch_size: usize,
    /// When set, every epoch record is appended to this file as one JSON line
    #[serde(default)]
    pub log_path: Option<PathBuf>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 70,
            batch_size: 32,
            log_path: None,
        }
    }
}

/// Progress record emitted after every epoch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochMetrics {
    /// 1-based epoch index
    pub epoch: usize,
    /// Summed cross-entropy divided by the sample count
    pub avg_loss: f64,
    /// Percentage of samples predicted correctly right after their update
    pub accuracy: f64,
    pub correct: usize,
    /// Samples whose update or metrics failed and were left out
    pub skipped: usize,
    pub elapsed_ms: u128,
}

/// Why a training call did or did not run
#[derive(Debug, Clone, PartialEq)]
pub enum TrainingStatus {
    Completed,
    /// Preconditions failed; no parameter was touched
    Rejected(NetworkError),
}

/// Outcome of a whole training run
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingReport {
    pub status: TrainingStatus,
    pub epoch_metrics: Vec<EpochMetrics>,
    pub total_elapsed_ms: u128,
}

impl TrainingReport {
    pub(crate) fn completed(epoch_metrics: Vec<EpochMetrics>, total_elapsed_ms: u128) -> Self {
        Self {
            status: TrainingStatus::Completed,
            epoch_metrics,
            total_elapsed_ms,
        }
    }

    pub(crate) fn rejected(err: NetworkError) -> Self {
        Self {
            status: TrainingStatus::Rejected(err),
            epoch_metrics: Vec::new(),
            total_elapsed_ms: 0,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self.status, TrainingStatus::Rejected(_))
    }

    /// Last epoch's record, if any epoch ran.
    pub fn final_epoch(&self) -> Option<&EpochMetrics> {
        self.epoch_metrics.last()
    }

    /// `(average loss, accuracy %)` of the last epoch, or zeros when nothing ran.
    pub fn final_metrics(&self) -> (f64, f64) {
        self.final_epoch()
            .map(|m| (m.avg_loss, m.accuracy))
            .unwrap_or((0.0, 0.0))
    }
}

/// Held-out evaluation summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub correct: usize,
    pub total: usize,
    /// Samples for which the network returned no prediction
    pub unpredicted: usize,
    /// Fraction in `[0, 1]`
    pub accuracy: f64,
    /// `(correct, total)` per class index
    pub per_class: Vec<(usize, usize)>,
}

impl Evaluation {
    /// Accuracy for one class, or `None` if the class never occurred.
    pub fn class_accuracy(&self, class: usize) -> Option<f64> {
        self.per_class
            .get(class)
            .filter(|(_, total)| *total > 0)
            .map(|&(correct, total)| correct as f64 / total as f64)
    }
}

/// Scores `network` on labeled samples without touching its parameters.
///
/// Targets without a one-hot component count toward `total` but can never match.
pub fn evaluate<S, T>(network: &TrainableNetwork, samples: &[S], targets: &[T]) -> Evaluation
where
    S: AsRef<[f64]>,
    T: AsRef<[f64]>,
{
    let mut per_class = vec![(0usize, 0usize); network.output_width()];
    let mut correct = 0;
    let mut unpredicted = 0;
    let total = samples.len().min(targets.len());

    for (sample, target) in samples.iter().zip(targets) {
        let actual = one_hot_index(target.as_ref());
        let predicted = network.predict(sample.as_ref());

        if predicted.is_none() {
            unpredicted += 1;
        }

        if let Some(class) = actual {
            if let Some(slot) = per_class.get_mut(class) {
                slot.1 += 1;
                if predicted == Some(class) {
                    slot.0 += 1;
                }
            }
            if predicted == Some(class) {
                correct += 1;
            }
        }
    }

    let accuracy = if total > 0 {
        correct as f64 / total as f64
    } else {
        0.0
    };

    Evaluation {
        correct,
        total,
        unpredicted,
        accuracy,
        per_class,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_reference_driver() {
        let config = TrainingConfig::default();
        assert_eq!(config.epochs, 70);
        assert_eq!(config.batch_size, 32);
        assert!(config.log_path.is_none());
    }

    #[test]
    fn test_rejected_report_has_zero_metrics() {
        let report = TrainingReport::rejected(NetworkError::EmptyDataset);
        assert!(report.is_rejected());
        assert_eq!(report.final_metrics(), (0.0, 0.0));
        assert!(report.final_epoch().is_none());
    }

    #[test]
    fn test_evaluate_counts_per_class() {
        let network = TrainableNetwork::new(&[2, 3], 0.1, 1).unwrap();
        let samples = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let targets = vec![vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]];

        let eval = evaluate(&network, &samples, &targets);
        assert_eq!(eval.total, 2);
        assert_eq!(eval.unpredicted, 0);
        assert_eq!(eval.per_class[0].1, 1);
        assert!(eval.correct <= 1);
        assert_eq!(eval.class_accuracy(2), None);
    }
}
