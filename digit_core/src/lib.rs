//! # Digit Recognition Core
//!
//! A small multilayer perceptron that learns to classify 28×28 digit images
//! with online stochastic gradient descent. Hidden layers use the logistic
//! sigmoid and the output layer a softmax distribution trained against one-hot
//! targets with cross-entropy.
//!
//! ## Quick Start
//!
//! ```rust
//! use digit_recognition_core::{DatasetConfig, DigitDataset, TrainableNetwork};
//!
//! let dataset = DigitDataset::generate(DatasetConfig { count: 20, ..Default::default() });
//! let mut network = TrainableNetwork::new(&[784, 16, 10], 0.05, 42).unwrap();
//!
//! let report = network.train(&dataset.inputs(), &dataset.targets(), 2);
//! let (loss, accuracy) = report.final_metrics();
//! println!("loss {loss:.4}, accuracy {accuracy:.1}%");
//!
//! let class = network.predict(&dataset.samples[0].pixels);
//! assert!(class.map_or(true, |c| c < 10));
//! ```
//!
//! ## Core Modules
//!
//! - [`neural`] - Matrix, activations, loss and the trainable network
//! - [`training`] - Training configuration, epoch metrics and evaluation
//! - [`checkpoint`] - JSON and binary model files
//! - [`data`] - Synthetic digit generation
//! - [`input`] - Raster-to-vector conversion for drawn digits
//! - [`config`] - Trainer configuration via TOML
//! - [`logging`] - JSON line-delimited run logs

pub mod checkpoint;
pub mod config;
pub mod data;
pub mod error;
pub mod input;
pub mod logging;
pub mod neural;
pub mod training;

pub use checkpoint::{Checkpointable, MatrixRecord, ModelDocument, ModelFormat};
pub use config::{ConfigError, NetworkSettings, TrainerConfig};
pub use data::{
    label_of, DatasetConfig, DigitDataset, DigitSample, SampleSource, SyntheticDigitSource,
    DIGIT_PIXELS, DIGIT_SIDE, NUM_DIGITS,
};
pub use error::{NetworkError, NetworkResult};
pub use input::{parse_pgm, read_pgm, render_ascii, CanvasAdapter, InputAdapter, PgmError, Polarity};
pub use neural::{one_hot, ActivationTrace, Matrix, TrainableNetwork};
pub use training::{
    evaluate, EpochMetrics, Evaluation, TrainingConfig, TrainingReport, TrainingStatus,
};
