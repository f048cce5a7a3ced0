//! Procedural handwritten-digit dataset.
//!
//! Each digit class is a set of geometric predicates over a 28×28 grid. Every
//! sample re-centres and rescales the grid with a small random jitter, then
//! adds uniform noise to each pixel, so the ten classes stay separable while no
//! two samples are identical.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::neural::loss::{one_hot, one_hot_index};

use super::SampleSource;

/// Side length of the square digit grid
pub const DIGIT_SIDE: usize = 28;
/// Flattened pixel count of one digit
pub const DIGIT_PIXELS: usize = DIGIT_SIDE * DIGIT_SIDE;
/// Number of digit classes
pub const NUM_DIGITS: usize = 10;

/// Configuration for dataset generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Total sample budget; each digit receives `count / 10` samples
    pub count: usize,
    /// Upper bound of the uniform noise added to every pixel
    pub noise_level: f64,
    /// Random seed for reproducibility
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            count: 500,
            noise_level: 0.15,
            seed: 7,
        }
    }
}

/// One labeled digit image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DigitSample {
    /// Row-major pixel intensities in `[0, 1]`
    pub pixels: Vec<f64>,
    /// One-hot encoding of `label`
    pub target: Vec<f64>,
    pub label: usize,
}

/// Synthetic digit dataset
#[derive(Debug, Clone)]
pub struct DigitDataset {
    pub samples: Vec<DigitSample>,
    pub config: DatasetConfig,
}

impl DigitDataset {
    /// Generate a new shuffled synthetic dataset.
    ///
    /// Pixels and targets travel together through the shuffle, so every
    /// sample keeps its own label.
    pub fn generate(config: DatasetConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let per_digit = config.count / NUM_DIGITS;
        let mut samples = Vec::with_capacity(per_digit * NUM_DIGITS);

        for digit in 0..NUM_DIGITS {
            for _ in 0..per_digit {
                let pixels = render_digit(digit, config.noise_level, &mut rng);
                let target = one_hot(digit, NUM_DIGITS).unwrap_or_default();
                samples.push(DigitSample {
                    pixels,
                    target,
                    label: digit,
                });
            }
        }

        samples.shuffle(&mut rng);

        tracing::info!(
            "Generated {} digit samples ({} per class, noise {:.2})",
            samples.len(),
            per_digit,
            config.noise_level
        );

        Self { samples, config }
    }

    /// Split dataset into train and held-out parts
    ///
    /// # Arguments
    /// * `train_ratio` - Fraction of data to use for training (e.g., 0.8)
    pub fn split(self, train_ratio: f64) -> (DigitDataset, DigitDataset) {
        let ratio = train_ratio.clamp(0.0, 1.0);
        let split_idx = (self.samples.len() as f64 * ratio) as usize;
        let mut train = self.samples;
        let held_out = train.split_off(split_idx);
        (
            Self {
                samples: train,
                config: self.config.clone(),
            },
            Self {
                samples: held_out,
                config: self.config,
            },
        )
    }

    /// Pixel vectors in sample order.
    pub fn inputs(&self) -> Vec<&[f64]> {
        self.samples.iter().map(|s| s.pixels.as_slice()).collect()
    }

    /// One-hot targets in sample order.
    pub fn targets(&self) -> Vec<&[f64]> {
        self.samples.iter().map(|s| s.target.as_slice()).collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Class label encoded by a one-hot target, if any component is set.
pub fn label_of(target: &[f64]) -> Option<usize> {
    one_hot_index(target)
}

/// Seeded generator of 28×28 ten-class digit samples.
#[derive(Debug, Clone, Default)]
pub struct SyntheticDigitSource {
    pub config: DatasetConfig,
}

impl SyntheticDigitSource {
    pub fn new(config: DatasetConfig) -> Self {
        Self { config }
    }
}

impl SampleSource for SyntheticDigitSource {
    fn input_width(&self) -> usize {
        DIGIT_PIXELS
    }

    fn num_classes(&self) -> usize {
        NUM_DIGITS
    }

    fn generate(&self) -> DigitDataset {
        DigitDataset::generate(self.config.clone())
    }
}

fn render_digit<R: Rng>(digit: usize, noise_level: f64, rng: &mut R) -> Vec<f64> {
    let scale: f64 = rng.gen_range(0.7..1.0);
    let offset_x = (rng.gen_range(0.7..1.0) - 0.5) * 4.0;
    let offset_y = (rng.gen_range(0.7..1.0) - 0.5) * 4.0;
    let half = (DIGIT_SIDE / 2) as f64;

    (0..DIGIT_PIXELS)
        .map(|idx| {
            let row = (idx / DIGIT_SIDE) as f64;
            let col = (idx % DIGIT_SIDE) as f64;
            let r = (row - half + offset_y) / scale;
            let c = (col - half + offset_x) / scale;

            let ink = if digit_covers(digit, r, c) { 1.0 } else { 0.0 };
            let noise = rng.gen::<f64>() * noise_level;
            (ink + noise).min(1.0)
        })
        .collect()
}

fn in_bars(r: f64) -> bool {
    (r > -9.0 && r < -5.0) || (r > -2.0 && r < 2.0) || (r > 5.0 && r < 9.0)
}

fn upper_gap(r: f64) -> bool {
    (-5.0..=-2.0).contains(&r)
}

fn lower_gap(r: f64) -> bool {
    (2.0..=5.0).contains(&r)
}

/// Whether the prototype of `digit` inks the centred coordinate `(r, c)`.
fn digit_covers(digit: usize, r: f64, c: f64) -> bool {
    let middle = r > -5.0 && r < 5.0;
    match digit {
        0 => r * r + c * c < 100.0,
        1 => c.abs() < 3.0 && r > -10.0 && r < 10.0,
        2 => in_bars(r) || (upper_gap(r) && c > 4.0) || (lower_gap(r) && c < -4.0),
        3 => in_bars(r) || (c > 4.0 && middle),
        4 => (c > 4.0 && r < 0.0) || (r > -2.0 && r < 2.0) || (c < -4.0 && r > -2.0),
        5 => in_bars(r) || (upper_gap(r) && c < -4.0) || (lower_gap(r) && c > 4.0),
        6 => in_bars(r) || (c < -4.0 && middle) || (lower_gap(r) && c > 4.0),
        7 => (r > -9.0 && r < -5.0) || (c > 4.0 && r > -5.0),
        8 => (r + 5.0).powi(2) + c * c < 30.0 || (r - 5.0).powi(2) + c * c < 30.0,
        9 => in_bars(r) || (c > 4.0 && middle) || (upper_gap(r) && c < -4.0),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> DatasetConfig {
        DatasetConfig {
            count: 50,
            noise_level: 0.15,
            seed: 11,
        }
    }

    #[test]
    fn test_dataset_generation() {
        let dataset = DigitDataset::generate(small_config());
        assert_eq!(dataset.len(), 50);

        for sample in &dataset.samples {
            assert_eq!(sample.pixels.len(), DIGIT_PIXELS);
            assert!(sample.pixels.iter().all(|p| (0.0..=1.0).contains(p)));
            assert_eq!(label_of(&sample.target), Some(sample.label));
        }

        for digit in 0..NUM_DIGITS {
            let count = dataset.samples.iter().filter(|s| s.label == digit).count();
            assert_eq!(count, 5);
        }
    }

    #[test]
    fn test_count_rounds_down_per_digit() {
        let dataset = DigitDataset::generate(DatasetConfig {
            count: 27,
            ..small_config()
        });
        assert_eq!(dataset.len(), 20);

        let empty = DigitDataset::generate(DatasetConfig {
            count: 9,
            ..small_config()
        });
        assert!(empty.is_empty());
    }

    #[test]
    fn test_generation_is_seeded() {
        let a = DigitDataset::generate(small_config());
        let b = DigitDataset::generate(small_config());
        assert_eq!(a.samples, b.samples);

        let c = DigitDataset::generate(DatasetConfig {
            seed: 12,
            ..small_config()
        });
        assert_ne!(a.samples, c.samples);
    }

    #[test]
    fn test_shuffle_mixes_classes() {
        let dataset = DigitDataset::generate(small_config());
        let labels: Vec<_> = dataset.samples.iter().map(|s| s.label).collect();
        let mut sorted = labels.clone();
        sorted.sort_unstable();
        assert_ne!(labels, sorted);
    }

    #[test]
    fn test_noise_free_pixels_are_binary() {
        let dataset = DigitDataset::generate(DatasetConfig {
            noise_level: 0.0,
            ..small_config()
        });
        for sample in &dataset.samples {
            assert!(sample.pixels.iter().all(|&p| p == 0.0 || p == 1.0));
            assert!(sample.pixels.iter().any(|&p| p == 1.0));
        }
    }

    #[test]
    fn test_prototypes_differ() {
        assert!(digit_covers(0, 0.0, 0.0));
        assert!(!digit_covers(0, 12.0, 0.0));
        assert!(digit_covers(1, 0.0, 1.0));
        assert!(!digit_covers(1, 0.0, 5.0));
        assert!(digit_covers(7, -7.0, -8.0));
        assert!(!digit_covers(7, 3.0, -8.0));
        assert!(digit_covers(8, -5.0, 0.0));
        assert!(digit_covers(8, 0.0, 0.0));
        assert!(!digit_covers(8, 0.0, 3.0));
        assert!(digit_covers(2, -3.0, 6.0));
        assert!(!digit_covers(5, -3.0, 6.0));
        assert!(digit_covers(5, -3.0, -6.0));
        assert!(!digit_covers(10, 0.0, 0.0));
    }

    #[test]
    fn test_dataset_split() {
        let dataset = DigitDataset::generate(small_config());
        let (train, held_out) = dataset.split(0.8);
        assert_eq!(train.len(), 40);
        assert_eq!(held_out.len(), 10);
        assert_eq!(train.inputs().len(), train.targets().len());
        assert_eq!(held_out.inputs()[0], held_out.samples[0].pixels.as_slice());
    }

    #[test]
    fn test_source_reports_widths() {
        let source = SyntheticDigitSource::new(small_config());
        assert_eq!(source.input_width(), 784);
        assert_eq!(source.num_classes(), 10);
        assert_eq!(source.generate().len(), 50);
    }
}
