//! Error types for the training engine.
//!
//! Construction and persistence failures are returned to the caller. Per-sample
//! failures inside training and prediction are caught where they happen and
//! never abort a run, so every variant here is cheap to clone and compare.

use std::fmt;

/// Result type alias for engine operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Error type for network construction, evaluation and persistence
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// The layer-width sequence (or learning rate) cannot describe a network
    InvalidTopology { reason: String },

    /// A vector or matrix width disagrees with the layer it is fed to
    ShapeMismatch {
        what: String,
        expected: usize,
        got: usize,
    },

    /// A forward pass produced NaN or infinite values
    NonFinite { what: String },

    /// Training was requested without samples or targets
    EmptyDataset,

    /// A model file is missing, truncated or internally inconsistent
    Serialization(String),
}

impl NetworkError {
    pub(crate) fn invalid_topology(reason: impl Into<String>) -> Self {
        NetworkError::InvalidTopology {
            reason: reason.into(),
        }
    }

    pub(crate) fn shape_mismatch(what: impl Into<String>, expected: usize, got: usize) -> Self {
        NetworkError::ShapeMismatch {
            what: what.into(),
            expected,
            got,
        }
    }

    pub(crate) fn non_finite(what: impl Into<String>) -> Self {
        NetworkError::NonFinite { what: what.into() }
    }
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::InvalidTopology { reason } => {
                write!(f, "Invalid topology: {reason}")
            }
            NetworkError::ShapeMismatch {
                what,
                expected,
                got,
            } => write!(
                f,
                "Shape mismatch for {what}: expected {expected}, got {got}"
            ),
            NetworkError::NonFinite { what } => write!(f, "Non-finite values in {what}"),
            NetworkError::EmptyDataset => {
                write!(f, "No training data: samples and targets must be non-empty")
            }
            NetworkError::Serialization(msg) => write!(f, "Model file error: {msg}"),
        }
    }
}

impl std::error::Error for NetworkError {}

impl From<std::io::Error> for NetworkError {
    fn from(err: std::io::Error) -> Self {
        NetworkError::Serialization(format!("I/O error: {err}"))
    }
}

impl From<bincode::Error> for NetworkError {
    fn from(err: bincode::Error) -> Self {
        NetworkError::Serialization(format!("binary codec error: {err}"))
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        NetworkError::Serialization(format!("JSON codec error: {err}"))
    }
}
