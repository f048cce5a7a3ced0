//! Performance benchmarks for the dense-network engine
//!
//! Run with: cargo bench --bench network_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use digit_recognition_core::neural::Matrix;
use digit_recognition_core::{DatasetConfig, DigitDataset, TrainableNetwork};

fn sample_digits() -> DigitDataset {
    DigitDataset::generate(DatasetConfig {
        count: 50,
        noise_level: 0.15,
        seed: 1,
    })
}

/// Row-vector times weight matrix at the widths of the reference network
fn bench_matrix_dot(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix_dot");

    for (rows, cols) in [(784, 128), (128, 64), (64, 10)] {
        let input = Matrix::from_fn(1, rows, |_, j| (j % 7) as f64 / 7.0);
        let weights = Matrix::from_fn(rows, cols, |i, j| ((i + j) % 11) as f64 / 11.0 - 0.5);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{rows}x{cols}")),
            &(input, weights),
            |b, (input, weights)| {
                b.iter(|| black_box(input.dot(weights).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_forward(c: &mut Criterion) {
    let net = TrainableNetwork::new(&[784, 128, 64, 10], 0.01, 42).unwrap();
    let dataset = sample_digits();
    let pixels = &dataset.samples[0].pixels;

    c.bench_function("forward_784_128_64_10", |b| {
        b.iter(|| black_box(net.forward(black_box(pixels)).unwrap()));
    });
}

fn bench_backward(c: &mut Criterion) {
    let mut net = TrainableNetwork::new(&[784, 128, 64, 10], 0.01, 42).unwrap();
    let dataset = sample_digits();
    let sample = &dataset.samples[0];

    c.bench_function("backward_784_128_64_10", |b| {
        b.iter(|| net.backward(black_box(&sample.pixels), &sample.target).unwrap());
    });
}

fn bench_epoch(c: &mut Criterion) {
    let dataset = sample_digits();
    let inputs = dataset.inputs();
    let targets = dataset.targets();

    let mut group = c.benchmark_group("train_epoch");
    group.sample_size(10);
    group.bench_function("50_samples", |b| {
        b.iter_batched(
            || TrainableNetwork::new(&[784, 128, 64, 10], 0.01, 42).unwrap(),
            |mut net| black_box(net.train(&inputs, &targets, 1)),
            criterion::BatchSize::LargeInput,
        );
    });
    group.finish();
}

criterion_group!(
    benches,
    bench_matrix_dot,
    bench_forward,
    bench_backward,
    bench_epoch
);
criterion_main!(benches);
