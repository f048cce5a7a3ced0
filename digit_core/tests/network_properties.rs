use digit_recognition_core::{
    evaluate, CanvasAdapter, DatasetConfig, DigitDataset, InputAdapter, NetworkError,
    TrainableNetwork, TrainingStatus,
};
use ndarray::Array2;

fn small_digits(count: usize, seed: u64) -> DigitDataset {
    DigitDataset::generate(DatasetConfig {
        count,
        noise_level: 0.15,
        seed,
    })
}

#[test]
fn parameter_shapes_follow_topology() {
    for topology in [vec![784, 128, 64, 10], vec![4, 3, 2], vec![5, 1], vec![2, 7, 7, 7, 3]] {
        let net = TrainableNetwork::new(&topology, 0.01, 1).unwrap();
        assert_eq!(net.weights().len(), topology.len() - 1);
        for (i, (w, b)) in net.weights().iter().zip(net.biases()).enumerate() {
            assert_eq!(w.shape(), (topology[i], topology[i + 1]));
            assert_eq!(b.shape(), (1, topology[i + 1]));
        }
    }
}

#[test]
fn forward_output_is_a_distribution() {
    let net = TrainableNetwork::new(&[784, 32, 10], 0.01, 3).unwrap();
    let dataset = small_digits(30, 2);
    for sample in &dataset.samples {
        let trace = net.forward(&sample.pixels).unwrap();
        let output = trace.output();
        assert_eq!(output.cols(), 10);
        let sum: f64 = output.as_slice().iter().sum();
        assert!((sum - 1.0).abs() < 1e-9);
    }
}

#[test]
fn untrained_prediction_is_a_valid_class() {
    let net = TrainableNetwork::new(&[784, 16, 10], 0.01, 9).unwrap();
    let dataset = small_digits(20, 4);
    for sample in &dataset.samples {
        let class = net.predict(&sample.pixels);
        assert!(matches!(class, Some(c) if c < 10));
    }
    assert_eq!(net.predict(&[0.5; 3]), None);
}

#[test]
fn training_reduces_loss_on_synthetic_digits() {
    let dataset = small_digits(100, 21);
    let mut net = TrainableNetwork::new(&[784, 32, 10], 0.05, 5).unwrap();

    let report = net.train(&dataset.inputs(), &dataset.targets(), 10);
    assert_eq!(report.status, TrainingStatus::Completed);
    assert_eq!(report.epoch_metrics.len(), 10);

    let first = report.epoch_metrics[0].avg_loss;
    let (last, accuracy) = report.final_metrics();
    assert!(last < first, "loss went from {first} to {last}");
    assert!(accuracy > 10.0);

    let eval = evaluate(&net, &dataset.inputs(), &dataset.targets());
    assert_eq!(eval.total, 100);
    assert!(eval.accuracy > 0.1);
}

#[test]
fn empty_training_set_changes_nothing() {
    let mut net = TrainableNetwork::new(&[4, 3, 2], 0.1, 8).unwrap();
    let before = net.clone();

    let samples: Vec<Vec<f64>> = Vec::new();
    let targets: Vec<Vec<f64>> = Vec::new();
    let report = net.train(&samples, &targets, 5);

    assert_eq!(
        report.status,
        TrainingStatus::Rejected(NetworkError::EmptyDataset)
    );
    assert!(report.epoch_metrics.is_empty());
    assert_eq!(net, before);
}

#[test]
fn target_without_hot_component_never_matches() {
    let mut net = TrainableNetwork::new(&[4, 3, 2], 0.1, 8).unwrap();
    let samples = vec![vec![1.0, 0.0, 0.0, 0.0]];
    let targets = vec![vec![0.0, 0.0]];

    let report = net.train(&samples, &targets, 3);
    assert_eq!(report.status, TrainingStatus::Completed);
    for metrics in &report.epoch_metrics {
        assert_eq!(metrics.correct, 0);
        assert_eq!(metrics.accuracy, 0.0);
        assert_eq!(metrics.skipped, 0);
    }
}

#[test]
fn single_backward_step_moves_first_layer() {
    let mut net = TrainableNetwork::new(&[4, 3, 2], 0.1, 17).unwrap();
    let before = net.weights()[0].clone();

    net.backward(&[1.0, 0.0, 0.0, 0.0], &[1.0, 0.0]).unwrap();

    let after = &net.weights()[0];
    let moved = before
        .row(0)
        .iter()
        .zip(after.row(0))
        .any(|(a, b)| (a - b).abs() > 1e-12);
    assert!(moved);
    // rows fed by zero inputs receive no gradient
    assert_eq!(before.row(1), after.row(1));

    assert!(net.predict(&[1.0, 0.0, 0.0, 0.0]).is_some());
}

#[test]
fn canvas_raster_matches_training_convention() {
    let dataset = small_digits(10, 33);
    let sample = &dataset.samples[0];

    let raster = Array2::from_shape_fn((28, 28), |(r, c)| {
        (sample.pixels[r * 28 + c] * 255.0).round() as u8
    });
    let pixels = CanvasAdapter::default().to_pixels(raster.view()).unwrap();

    assert_eq!(pixels.len(), sample.pixels.len());
    for (got, want) in pixels.iter().zip(&sample.pixels) {
        assert!((got - want).abs() <= 0.5 / 255.0 + 1e-9);
    }
}
