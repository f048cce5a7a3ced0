//! Labeled sample generation for the digit classifier.

pub mod digit_dataset;

pub use digit_dataset::{
    label_of, DatasetConfig, DigitDataset, DigitSample, SyntheticDigitSource, DIGIT_PIXELS,
    DIGIT_SIDE, NUM_DIGITS,
};

use crate::error::{NetworkError, NetworkResult};
use crate::neural::TrainableNetwork;

/// Producer of labeled pixel vectors.
///
/// Every sample in the generated dataset has `input_width()` pixels in `[0, 1]`
/// and a one-hot target of length `num_classes()`.
pub trait SampleSource {
    fn input_width(&self) -> usize;

    fn num_classes(&self) -> usize;

    fn generate(&self) -> DigitDataset;

    /// Fails with `ShapeMismatch` unless `network` consumes exactly the
    /// vectors this source produces.
    fn check_network(&self, network: &TrainableNetwork) -> NetworkResult<()> {
        if network.input_width() != self.input_width() {
            return Err(NetworkError::shape_mismatch(
                "network input width",
                self.input_width(),
                network.input_width(),
            ));
        }
        if network.output_width() != self.num_classes() {
            return Err(NetworkError::shape_mismatch(
                "network output width",
                self.num_classes(),
                network.output_width(),
            ));
        }
        Ok(())
    }
}
