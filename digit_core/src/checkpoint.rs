//! Model persistence.
//!
//! A saved model is a self-describing [`ModelDocument`]: the layer widths, the
//! learning rate and one named entry per parameter (`weight_0`, `bias_0`,
//! `weight_1`, ...). Paths ending in `.bin` use a deterministic binary codec;
//! every other path gets pretty-printed JSON. Both round-trip `f64` values
//! exactly.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::{NetworkError, NetworkResult};
use crate::neural::{Matrix, TrainableNetwork};

const MODEL_FORMAT_VERSION: u32 = 1;

/// On-disk encoding, picked from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelFormat {
    Json,
    Binary,
}

impl ModelFormat {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Self {
        match path.as_ref().extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("bin") => ModelFormat::Binary,
            _ => ModelFormat::Json,
        }
    }
}

/// Deterministic binary codec options.
fn codec() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .reject_trailing_bytes()
        .with_little_endian()
}

/// One stored matrix, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixRecord {
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<f64>,
}

impl From<&Matrix> for MatrixRecord {
    fn from(matrix: &Matrix) -> Self {
        Self {
            rows: matrix.rows(),
            cols: matrix.cols(),
            data: matrix.as_slice().to_vec(),
        }
    }
}

impl MatrixRecord {
    fn into_matrix(self, name: &str) -> NetworkResult<Matrix> {
        Matrix::from_vec(self.rows, self.cols, self.data).map_err(|err| {
            NetworkError::Serialization(format!("entry '{name}' is malformed: {err}"))
        })
    }
}

/// Serialized form of a [`TrainableNetwork`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDocument {
    pub format_version: u32,
    pub layer_sizes: Vec<usize>,
    pub learning_rate: f64,
    pub parameters: BTreeMap<String, MatrixRecord>,
}

pub fn weight_key(layer: usize) -> String {
    format!("weight_{layer}")
}

pub fn bias_key(layer: usize) -> String {
    format!("bias_{layer}")
}

impl ModelDocument {
    pub fn from_network(network: &TrainableNetwork) -> Self {
        let mut parameters = BTreeMap::new();
        for (idx, (w, b)) in network.weights().iter().zip(network.biases()).enumerate() {
            parameters.insert(weight_key(idx), MatrixRecord::from(w));
            parameters.insert(bias_key(idx), MatrixRecord::from(b));
        }

        Self {
            format_version: MODEL_FORMAT_VERSION,
            layer_sizes: network.topology().to_vec(),
            learning_rate: network.learning_rate(),
            parameters,
        }
    }

    /// Rebuilds the network, rejecting missing, extra or mis-shaped entries.
    pub fn into_network(self) -> NetworkResult<TrainableNetwork> {
        if self.format_version != MODEL_FORMAT_VERSION {
            return Err(NetworkError::Serialization(format!(
                "format version mismatch: expected {MODEL_FORMAT_VERSION}, found {}",
                self.format_version
            )));
        }
        if self.layer_sizes.len() < 2 {
            return Err(NetworkError::Serialization(format!(
                "layer_sizes must hold at least two widths, found {}",
                self.layer_sizes.len()
            )));
        }

        let mut parameters = self.parameters;
        let pairs = self.layer_sizes.len() - 1;
        let mut weights = Vec::with_capacity(pairs);
        let mut biases = Vec::with_capacity(pairs);

        for idx in 0..pairs {
            for (key, target) in [(weight_key(idx), &mut weights), (bias_key(idx), &mut biases)] {
                let record = parameters.remove(&key).ok_or_else(|| {
                    NetworkError::Serialization(format!(
                        "layer_sizes declares {pairs} layers but entry '{key}' is missing"
                    ))
                })?;
                target.push(record.into_matrix(&key)?);
            }
        }

        if !parameters.is_empty() {
            let extra: Vec<_> = parameters.keys().cloned().collect();
            return Err(NetworkError::Serialization(format!(
                "layer_sizes declares {pairs} layers but extra entries are present: {}",
                extra.join(", ")
            )));
        }

        TrainableNetwork::from_parts(self.layer_sizes, self.learning_rate, weights, biases)
            .map_err(|err| NetworkError::Serialization(format!("inconsistent model: {err}")))
    }
}

/// Components that can be written to and restored from a model file.
pub trait Checkpointable: Sized {
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> NetworkResult<()>;

    fn load_checkpoint<P: AsRef<Path>>(path: P) -> NetworkResult<Self>;

    /// Writes `snapshot` in the format implied by `path`, creating parent directories.
    fn write_snapshot<P, T>(snapshot: &T, path: P) -> NetworkResult<()>
    where
        P: AsRef<Path>,
        T: Serialize,
    {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        match ModelFormat::from_path(path) {
            ModelFormat::Json => serde_json::to_writer_pretty(&mut writer, snapshot)?,
            ModelFormat::Binary => codec().serialize_into(&mut writer, snapshot)?,
        }
        writer.flush()?;
        Ok(())
    }

    /// Reads a snapshot in the format implied by `path`.
    fn read_snapshot<P, T>(path: P) -> NetworkResult<T>
    where
        P: AsRef<Path>,
        T: serde::de::DeserializeOwned,
    {
        let path = path.as_ref();
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(match ModelFormat::from_path(path) {
            ModelFormat::Json => serde_json::from_reader(reader)?,
            ModelFormat::Binary => codec().deserialize_from(reader)?,
        })
    }
}

impl Checkpointable for TrainableNetwork {
    /// Refuses to write NaN or infinite parameters, which JSON cannot represent.
    fn save_checkpoint<P: AsRef<Path>>(&self, path: P) -> NetworkResult<()> {
        let layers = self.weights().iter().zip(self.biases()).enumerate();
        for (idx, (w, b)) in layers {
            for (key, matrix) in [(weight_key(idx), w), (bias_key(idx), b)] {
                if !matrix.is_finite() {
                    return Err(NetworkError::Serialization(format!(
                        "entry '{key}' holds non-finite values"
                    )));
                }
            }
        }
        Self::write_snapshot(&ModelDocument::from_network(self), path)
    }

    fn load_checkpoint<P: AsRef<Path>>(path: P) -> NetworkResult<Self> {
        let document: ModelDocument = Self::read_snapshot(path)?;
        document.into_network()
    }
}
