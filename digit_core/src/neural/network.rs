//! Trainable multilayer perceptron.
//!
//! A stack of dense layers with sigmoid hidden activations and a softmax
//! output, trained one sample at a time with plain gradient descent on the
//! softmax cross-entropy loss.

use std::path::Path;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::activation::{sigmoid_derivative, sigmoid_matrix, softmax};
use super::loss::{cross_entropy_loss, one_hot_index};
use super::matrix::Matrix;
use crate::checkpoint::Checkpointable;
use crate::error::{NetworkError, NetworkResult};
use crate::logging;
use crate::training::{EpochMetrics, TrainingConfig, TrainingReport};

/// Weights are drawn uniformly from `(-WEIGHT_INIT_RANGE, WEIGHT_INIT_RANGE)`.
pub const WEIGHT_INIT_RANGE: f64 = 0.5;
/// Every bias starts at this value.
pub const BIAS_INIT: f64 = 0.1;

/// Intermediate vectors of one forward pass: the input, then one activated
/// `1 x width` row per layer.
#[derive(Debug, Clone)]
pub struct ActivationTrace {
    activations: Vec<Matrix>,
}

impl ActivationTrace {
    pub fn input(&self) -> &Matrix {
        &self.activations[0]
    }

    /// Softmax distribution of the last layer.
    pub fn output(&self) -> &Matrix {
        &self.activations[self.activations.len() - 1]
    }

    /// All entries, input first.
    pub fn layers(&self) -> &[Matrix] {
        &self.activations
    }

    pub fn len(&self) -> usize {
        self.activations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }
}

/// Fully-connected classifier: Input → Sigmoid hidden layers → Softmax output
#[derive(Debug, Clone, PartialEq)]
pub struct TrainableNetwork {
    layer_sizes: Vec<usize>,
    weights: Vec<Matrix>, // [layer_sizes[i], layer_sizes[i + 1]]
    biases: Vec<Matrix>,  // [1, layer_sizes[i + 1]]
    learning_rate: f64,
}

impl TrainableNetwork {
    /// Creates a network with parameters drawn from a `StdRng` seeded with `seed`.
    ///
    /// # Errors
    /// `NetworkError::InvalidTopology` if `topology` has fewer than two widths,
    /// contains a zero width, or `learning_rate` is not a positive finite number.
    pub fn new(topology: &[usize], learning_rate: f64, seed: u64) -> NetworkResult<Self> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::with_rng(topology, learning_rate, &mut rng)
    }

    /// Creates a network drawing initial weights from `rng`.
    pub fn with_rng<R: Rng>(
        topology: &[usize],
        learning_rate: f64,
        rng: &mut R,
    ) -> NetworkResult<Self> {
        validate_topology(topology)?;
        validate_learning_rate(learning_rate)?;

        let (weights, biases): (Vec<Matrix>, Vec<Matrix>) = topology
            .windows(2)
            .map(|pair| {
                let w = Matrix::from_fn(pair[0], pair[1], |_, _| {
                    rng.gen_range(-WEIGHT_INIT_RANGE..WEIGHT_INIT_RANGE)
                });
                let b = Matrix::filled(1, pair[1], BIAS_INIT);
                (w, b)
            })
            .unzip();

        Ok(Self {
            layer_sizes: topology.to_vec(),
            weights,
            biases,
            learning_rate,
        })
    }

    /// Reassembles a network from stored parameters, checking every shape invariant.
    pub(crate) fn from_parts(
        layer_sizes: Vec<usize>,
        learning_rate: f64,
        weights: Vec<Matrix>,
        biases: Vec<Matrix>,
    ) -> NetworkResult<Self> {
        validate_topology(&layer_sizes)?;
        validate_learning_rate(learning_rate)?;

        let pairs = layer_sizes.len() - 1;
        if weights.len() != pairs {
            return Err(NetworkError::shape_mismatch(
                "weight matrix count",
                pairs,
                weights.len(),
            ));
        }
        if biases.len() != pairs {
            return Err(NetworkError::shape_mismatch(
                "bias vector count",
                pairs,
                biases.len(),
            ));
        }

        for (idx, (w, b)) in weights.iter().zip(&biases).enumerate() {
            let (rows, cols) = (layer_sizes[idx], layer_sizes[idx + 1]);
            if w.rows() != rows {
                return Err(NetworkError::shape_mismatch(
                    format!("weight_{idx} rows"),
                    rows,
                    w.rows(),
                ));
            }
            if w.cols() != cols {
                return Err(NetworkError::shape_mismatch(
                    format!("weight_{idx} columns"),
                    cols,
                    w.cols(),
                ));
            }
            if b.rows() != 1 || b.cols() != cols {
                return Err(NetworkError::shape_mismatch(
                    format!("bias_{idx} width"),
                    cols,
                    b.as_slice().len(),
                ));
            }
        }

        Ok(Self {
            layer_sizes,
            weights,
            biases,
            learning_rate,
        })
    }

    pub fn topology(&self) -> &[usize] {
        &self.layer_sizes
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn weights(&self) -> &[Matrix] {
        &self.weights
    }

    pub fn biases(&self) -> &[Matrix] {
        &self.biases
    }

    pub fn input_width(&self) -> usize {
        self.layer_sizes[0]
    }

    pub fn output_width(&self) -> usize {
        self.layer_sizes[self.layer_sizes.len() - 1]
    }

    /// Total number of trainable scalars.
    pub fn num_parameters(&self) -> usize {
        self.weights
            .iter()
            .chain(&self.biases)
            .map(|m| m.as_slice().len())
            .sum()
    }

    /// Forward pass returning every intermediate activation.
    ///
    /// # Errors
    /// `ShapeMismatch` if `input` is not as wide as the input layer,
    /// `NonFinite` if the output distribution contains NaN or infinity.
    pub fn forward(&self, input: &[f64]) -> NetworkResult<ActivationTrace> {
        if input.len() != self.input_width() {
            return Err(NetworkError::shape_mismatch(
                "input sample",
                self.input_width(),
                input.len(),
            ));
        }

        let last = self.weights.len() - 1;
        let mut activations = Vec::with_capacity(self.weights.len() + 1);
        activations.push(Matrix::row_vector(input.to_vec()));

        for (idx, (w, b)) in self.weights.iter().zip(&self.biases).enumerate() {
            let z = activations[idx].dot(w)?.add_row(b)?;
            let a = if idx == last {
                softmax(&z)
            } else {
                sigmoid_matrix(&z)
            };
            activations.push(a);
        }

        let trace = ActivationTrace { activations };
        if !trace.output().is_finite() {
            return Err(NetworkError::non_finite("softmax output"));
        }
        Ok(trace)
    }

    /// One gradient-descent step on a single `(sample, one-hot target)` pair.
    ///
    /// All deltas and gradients are computed from the current parameters
    /// before any of them is updated; on error nothing is modified.
    pub fn backward(&mut self, input: &[f64], target: &[f64]) -> NetworkResult<()> {
        if target.len() != self.output_width() {
            return Err(NetworkError::shape_mismatch(
                "target",
                self.output_width(),
                target.len(),
            ));
        }

        let trace = self.forward(input)?;
        let activations = trace.layers();
        let n_layers = self.weights.len();

        // softmax + cross-entropy: the output error needs no derivative term
        let mut deltas = Vec::with_capacity(n_layers);
        deltas.push(trace.output().sub(&Matrix::row_vector(target.to_vec()))?);

        for idx in (0..n_layers - 1).rev() {
            let next = &deltas[deltas.len() - 1];
            let error = next.dot(&self.weights[idx + 1].transpose())?;
            // derivative taken on the activated value, not the pre-activation
            let slope = activations[idx + 1].map(sigmoid_derivative);
            let delta = error.hadamard(&slope)?;
            deltas.push(delta);
        }
        deltas.reverse();

        let grads = activations
            .iter()
            .zip(&deltas)
            .map(|(a, d)| a.transpose().dot(d))
            .collect::<NetworkResult<Vec<_>>>()?;

        let lr = self.learning_rate;
        for ((w, b), (dw, delta)) in self
            .weights
            .iter_mut()
            .zip(self.biases.iter_mut())
            .zip(grads.iter().zip(&deltas))
        {
            w.scaled_sub_assign(lr, dw)?;
            b.scaled_sub_assign(lr, delta)?;
        }

        Ok(())
    }

    /// Most likely class for `input`, or `None` when no prediction is available.
    ///
    /// Failures are logged and mapped to `None`; this never panics.
    pub fn predict(&self, input: &[f64]) -> Option<usize> {
        match self.try_predict(input) {
            Ok(class) => Some(class),
            Err(err) => {
                tracing::warn!("Prediction error: {err}");
                None
            }
        }
    }

    /// Like [`predict`](Self::predict) but returns the underlying error.
    pub fn try_predict(&self, input: &[f64]) -> NetworkResult<usize> {
        let trace = self.forward(input)?;
        trace
            .output()
            .argmax_row(0)
            .ok_or_else(|| NetworkError::non_finite("softmax output"))
    }

    /// Online training for `epochs` passes with default settings.
    pub fn train<S, T>(&mut self, samples: &[S], targets: &[T], epochs: usize) -> TrainingReport
    where
        S: AsRef<[f64]>,
        T: AsRef<[f64]>,
    {
        let config = TrainingConfig {
            epochs,
            ..Default::default()
        };
        self.train_with_config(samples, targets, &config)
    }

    /// Online training: one backward step per sample, samples in the given order.
    ///
    /// Empty or mismatched collections are rejected without touching any
    /// parameter. A sample that fails is skipped for that epoch's metrics and
    /// training moves on.
    pub fn train_with_config<S, T>(
        &mut self,
        samples: &[S],
        targets: &[T],
        config: &TrainingConfig,
    ) -> TrainingReport
    where
        S: AsRef<[f64]>,
        T: AsRef<[f64]>,
    {
        if samples.is_empty() || targets.is_empty() {
            tracing::error!(
                "No training data: {} samples, {} targets",
                samples.len(),
                targets.len()
            );
            return TrainingReport::rejected(NetworkError::EmptyDataset);
        }

        if samples.len() != targets.len() {
            tracing::error!(
                "Sample/target count mismatch: {} samples, {} targets",
                samples.len(),
                targets.len()
            );
            return TrainingReport::rejected(NetworkError::shape_mismatch(
                "target count",
                samples.len(),
                targets.len(),
            ));
        }

        if config.batch_size > 1 {
            tracing::debug!(
                "batch_size = {} is ignored; updates are applied per sample",
                config.batch_size
            );
        }

        tracing::info!(
            "Training: {} samples, {} epochs",
            samples.len(),
            config.epochs
        );

        let start = Instant::now();
        let mut epoch_metrics = Vec::with_capacity(config.epochs);

        for epoch in 1..=config.epochs {
            let metrics = self.run_epoch(epoch, samples, targets);

            tracing::info!(
                "Epoch {}/{} - Loss: {:.4} - Accuracy: {:.2}%",
                epoch,
                config.epochs,
                metrics.avg_loss,
                metrics.accuracy
            );
            if metrics.skipped > 0 {
                tracing::warn!("Epoch {epoch}: skipped {} samples", metrics.skipped);
            }

            if let Some(path) = &config.log_path {
                if let Err(err) = logging::log_epoch(path, &metrics) {
                    tracing::warn!("Failed to append epoch log to {}: {err}", path.display());
                }
            }

            epoch_metrics.push(metrics);
        }

        TrainingReport::completed(epoch_metrics, start.elapsed().as_millis())
    }

    fn run_epoch<S, T>(&mut self, epoch: usize, samples: &[S], targets: &[T]) -> EpochMetrics
    where
        S: AsRef<[f64]>,
        T: AsRef<[f64]>,
    {
        let epoch_start = Instant::now();
        let mut total_loss = 0.0;
        let mut correct = 0;
        let mut skipped = 0;

        for (idx, (sample, target)) in samples.iter().zip(targets).enumerate() {
            match self.train_sample(sample.as_ref(), target.as_ref()) {
                Ok((loss, hit)) => {
                    total_loss += loss;
                    if hit {
                        correct += 1;
                    }
                }
                Err(err) => {
                    skipped += 1;
                    tracing::debug!("Epoch {epoch}: skipping sample {idx}: {err}");
                }
            }
        }

        let count = samples.len() as f64;
        EpochMetrics {
            epoch,
            avg_loss: total_loss / count,
            accuracy: correct as f64 / count * 100.0,
            correct,
            skipped,
            elapsed_ms: epoch_start.elapsed().as_millis(),
        }
    }

    /// Update on one sample, then score it: `(loss, predicted == label)`.
    fn train_sample(&mut self, sample: &[f64], target: &[f64]) -> NetworkResult<(f64, bool)> {
        self.backward(sample, target)?;

        let predicted = self.try_predict(sample).ok();
        let hit = match one_hot_index(target) {
            Some(actual) => predicted == Some(actual),
            None => false,
        };

        let trace = self.forward(sample)?;
        let loss = cross_entropy_loss(trace.output(), target)?;
        Ok((loss, hit))
    }

    /// Writes the model to `path`; `.bin` selects the binary codec, anything else JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> NetworkResult<()> {
        self.save_checkpoint(&path)?;
        tracing::info!("Model saved: {}", path.as_ref().display());
        Ok(())
    }

    /// Reads a model written by [`save`](Self::save).
    pub fn load<P: AsRef<Path>>(path: P) -> NetworkResult<Self> {
        let network = Self::load_checkpoint(&path)?;
        tracing::info!(
            "Model loaded: {} (topology {:?})",
            path.as_ref().display(),
            network.layer_sizes
        );
        Ok(network)
    }
}

fn validate_topology(topology: &[usize]) -> NetworkResult<()> {
    if topology.len() < 2 {
        return Err(NetworkError::invalid_topology(format!(
            "need at least an input and an output width, got {} entries",
            topology.len()
        )));
    }
    if let Some(pos) = topology.iter().position(|&w| w == 0) {
        return Err(NetworkError::invalid_topology(format!(
            "layer {pos} has zero width"
        )));
    }
    Ok(())
}

fn validate_learning_rate(learning_rate: f64) -> NetworkResult<()> {
    if !learning_rate.is_finite() || learning_rate <= 0.0 {
        return Err(NetworkError::invalid_topology(format!(
            "learning rate must be positive and finite, got {learning_rate}"
        )));
    }
    Ok(())
}
