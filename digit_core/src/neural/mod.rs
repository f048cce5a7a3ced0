//! Dense-network engine: matrix storage, activations, loss and the trainable network.
//!
//! The engine carries its own small matrix type and does not depend on any
//! numeric library.

pub mod activation;
pub mod loss;
pub mod matrix;
pub mod network;

pub use activation::{sigmoid, sigmoid_derivative, softmax};
pub use loss::{cross_entropy_loss, one_hot, one_hot_index, LOG_EPSILON};
pub use matrix::Matrix;
pub use network::{ActivationTrace, TrainableNetwork, BIAS_INIT, WEIGHT_INIT_RANGE};
