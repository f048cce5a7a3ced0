//! Trainer configuration via TOML files.
//!
//! Every section is optional; missing keys fall back to the values used by the
//! reference training run (a `784-128-64-10` network trained for 70 epochs on
//! 500 synthetic digits).

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::DatasetConfig;
use crate::input::Polarity;
use crate::training::TrainingConfig;

/// Complete trainer configuration.
///
/// # Examples
///
/// ```
/// use digit_recognition_core::TrainerConfig;
///
/// let config = TrainerConfig::from_str("[training]\nepochs = 5").unwrap();
/// assert_eq!(config.training.epochs, 5);
/// assert_eq!(config.network.topology, vec![784, 128, 64, 10]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrainerConfig {
    pub network: NetworkSettings,
    pub training: TrainingConfig,
    pub dataset: DatasetConfig,
    /// Fraction of the generated samples used for training; the rest is held out
    pub train_ratio: f64,
    /// Where the trained model is written
    pub model_path: PathBuf,
    /// Polarity of rasters fed to the interactive loop
    pub polarity: Polarity,
}

/// Network construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NetworkSettings {
    pub topology: Vec<usize>,
    pub learning_rate: f64,
    /// Seed for weight initialization
    pub seed: u64,
}

impl TrainerConfig {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_str(&contents)
    }

    pub fn from_str(toml_str: &str) -> Result<Self, ConfigError> {
        let raw: RawTrainerConfig =
            toml::from_str(toml_str).map_err(|err| ConfigError::Parse(err.to_string()))?;

        let network = NetworkSettings::try_from(&raw.network)?;
        let training = training_from_raw(raw.training)?;
        let (dataset, train_ratio) = dataset_from_raw(&raw.dataset)?;

        if raw.model.path.as_os_str().is_empty() {
            return Err(ConfigError::Parse("model.path must not be empty".into()));
        }

        Ok(Self {
            network,
            training,
            dataset,
            train_ratio,
            model_path: raw.model.path,
            polarity: raw.canvas.polarity,
        })
    }
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            network: NetworkSettings::default(),
            training: TrainingConfig::default(),
            dataset: DatasetConfig::default(),
            train_ratio: default_train_ratio(),
            model_path: default_model_path(),
            polarity: Polarity::default(),
        }
    }
}

impl NetworkSettings {
    fn try_from(raw: &RawNetwork) -> Result<Self, ConfigError> {
        if raw.topology.len() < 2 {
            return Err(ConfigError::Parse(
                "network.topology needs at least an input and an output width".into(),
            ));
        }
        if raw.topology.iter().any(|&width| width == 0) {
            return Err(ConfigError::Parse(
                "network.topology widths must be positive".into(),
            ));
        }
        if !raw.learning_rate.is_finite() || raw.learning_rate <= 0.0 {
            return Err(ConfigError::Parse(
                "network.learning_rate must be positive".into(),
            ));
        }

        Ok(Self {
            topology: raw.topology.clone(),
            learning_rate: raw.learning_rate,
            seed: raw.seed,
        })
    }
}

impl Default for NetworkSettings {
    fn default() -> Self {
        Self {
            topology: default_topology(),
            learning_rate: default_learning_rate(),
            seed: default_network_seed(),
        }
    }
}

fn training_from_raw(raw: RawTraining) -> Result<TrainingConfig, ConfigError> {
    if raw.batch_size == 0 {
        return Err(ConfigError::Parse(
            "training.batch_size must be non-zero".into(),
        ));
    }

    Ok(TrainingConfig {
        epochs: raw.epochs,
        batch_size: raw.batch_size,
        log_path: raw.log_path,
    })
}

fn dataset_from_raw(raw: &RawDataset) -> Result<(DatasetConfig, f64), ConfigError> {
    if !raw.noise_level.is_finite() || raw.noise_level < 0.0 {
        return Err(ConfigError::Parse(
            "dataset.noise_level must be non-negative".into(),
        ));
    }
    if !(raw.train_ratio > 0.0 && raw.train_ratio <= 1.0) {
        return Err(ConfigError::Parse(
            "dataset.train_ratio must be in (0, 1]".into(),
        ));
    }

    let dataset = DatasetConfig {
        count: raw.count,
        noise_level: raw.noise_level,
        seed: raw.seed,
    };
    Ok((dataset, raw.train_ratio))
}

#[derive(Debug, Default, Deserialize)]
struct RawTrainerConfig {
    #[serde(default)]
    network: RawNetwork,
    #[serde(default)]
    training: RawTraining,
    #[serde(default)]
    dataset: RawDataset,
    #[serde(default)]
    model: RawModel,
    #[serde(default)]
    canvas: RawCanvas,
}

#[derive(Debug, Deserialize)]
struct RawNetwork {
    #[serde(default = "default_topology")]
    topology: Vec<usize>,
    #[serde(default = "default_learning_rate")]
    learning_rate: f64,
    #[serde(default = "default_network_seed")]
    seed: u64,
}

impl Default for RawNetwork {
    fn default() -> Self {
        Self {
            topology: default_topology(),
            learning_rate: default_learning_rate(),
            seed: default_network_seed(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawTraining {
    #[serde(default = "default_epochs")]
    epochs: usize,
    #[serde(default = "default_batch_size")]
    batch_size: usize,
    #[serde(default)]
    log_path: Option<PathBuf>,
}

impl Default for RawTraining {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            log_path: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDataset {
    #[serde(default = "default_count")]
    count: usize,
    #[serde(default = "default_noise_level")]
    noise_level: f64,
    #[serde(default = "default_train_ratio")]
    train_ratio: f64,
    #[serde(default = "default_dataset_seed")]
    seed: u64,
}

impl Default for RawDataset {
    fn default() -> Self {
        Self {
            count: default_count(),
            noise_level: default_noise_level(),
            train_ratio: default_train_ratio(),
            seed: default_dataset_seed(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawModel {
    #[serde(default = "default_model_path")]
    path: PathBuf,
}

impl Default for RawModel {
    fn default() -> Self {
        Self {
            path: default_model_path(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawCanvas {
    #[serde(default)]
    polarity: Polarity,
}

fn default_topology() -> Vec<usize> {
    vec![784, 128, 64, 10]
}

fn default_learning_rate() -> f64 {
    0.01
}

fn default_network_seed() -> u64 {
    42
}

fn default_epochs() -> usize {
    TrainingConfig::default().epochs
}

fn default_batch_size() -> usize {
    TrainingConfig::default().batch_size
}

fn default_count() -> usize {
    DatasetConfig::default().count
}

fn default_noise_level() -> f64 {
    DatasetConfig::default().noise_level
}

fn default_dataset_seed() -> u64 {
    DatasetConfig::default().seed
}

fn default_train_ratio() -> f64 {
    0.8
}

fn default_model_path() -> PathBuf {
    PathBuf::from("digit_model.json")
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "IO error: {}", err),
            ConfigError::Parse(err) => write!(f, "Parse error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        ConfigError::Io(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = TrainerConfig::from_str("").unwrap();
        assert_eq!(config, TrainerConfig::default());
        assert_eq!(config.network.topology, vec![784, 128, 64, 10]);
        assert_eq!(config.network.learning_rate, 0.01);
        assert_eq!(config.training.epochs, 70);
        assert_eq!(config.dataset.count, 500);
        assert_eq!(config.model_path, PathBuf::from("digit_model.json"));
        assert_eq!(config.polarity, Polarity::LightOnDark);
    }

    #[test]
    fn parses_custom_values() {
        let toml = r#"
[network]
topology = [16, 8, 4]
learning_rate = 0.2
seed = 3

[training]
epochs = 12
log_path = "logs/run.jsonl"

[dataset]
count = 40
train_ratio = 0.5

[model]
path = "out/model.bin"

[canvas]
polarity = "dark_on_light"
"#;
        let config = TrainerConfig::from_str(toml).unwrap();
        assert_eq!(config.network.topology, vec![16, 8, 4]);
        assert_eq!(config.network.seed, 3);
        assert_eq!(config.training.epochs, 12);
        assert_eq!(config.training.batch_size, 32);
        assert_eq!(
            config.training.log_path,
            Some(PathBuf::from("logs/run.jsonl"))
        );
        assert_eq!(config.dataset.count, 40);
        assert_eq!(config.dataset.noise_level, 0.15);
        assert_eq!(config.train_ratio, 0.5);
        assert_eq!(config.model_path, PathBuf::from("out/model.bin"));
        assert_eq!(config.polarity, Polarity::DarkOnLight);
    }

    #[test]
    fn rejects_short_topology() {
        let err = TrainerConfig::from_str("[network]\ntopology = [784]").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(msg) if msg.contains("topology")));
    }

    #[test]
    fn rejects_zero_width_layer() {
        assert!(TrainerConfig::from_str("[network]\ntopology = [4, 0, 2]").is_err());
    }

    #[test]
    fn rejects_non_positive_learning_rate() {
        assert!(TrainerConfig::from_str("[network]\nlearning_rate = 0.0").is_err());
        assert!(TrainerConfig::from_str("[network]\nlearning_rate = -1.0").is_err());
    }

    #[test]
    fn rejects_out_of_range_train_ratio() {
        assert!(TrainerConfig::from_str("[dataset]\ntrain_ratio = 0.0").is_err());
        assert!(TrainerConfig::from_str("[dataset]\ntrain_ratio = 1.5").is_err());
    }

    #[test]
    fn rejects_unknown_polarity() {
        assert!(TrainerConfig::from_str("[canvas]\npolarity = \"sideways\"").is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TrainerConfig::load_from_file("/nonexistent/trainer.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
