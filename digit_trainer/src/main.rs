//! Digit recognizer command-line driver.
//!
//! ```text
//! digit_trainer train [config.toml]
//! digit_trainer predict [--dark-on-light] <model> <image.pgm>...
//! ```
//!
//! `train` generates synthetic digits, trains the network, reports held-out
//! accuracy, saves the model, then reads raster paths from stdin and prints a
//! prediction for each (`q` quits).
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use digit_recognition_core::{
    evaluate, logging, read_pgm, render_ascii, CanvasAdapter, DigitDataset, InputAdapter,
    Polarity, SampleSource, SyntheticDigitSource, TrainableNetwork, TrainerConfig,
    TrainingStatus, NUM_DIGITS,
};
use tracing_subscriber::EnvFilter;

/// Number of leading samples re-checked after training
const SPOT_CHECK_COUNT: usize = 20;

fn main() -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => run_training(None),
        Some("train") => run_training(args.get(1).map(String::as_str)),
        Some("predict") => run_prediction(&args[1..]),
        Some("-h") | Some("--help") => {
            print_usage();
            Ok(())
        }
        Some(other) => {
            print_usage();
            bail!("unknown command '{other}'")
        }
    }
}

fn print_usage() {
    println!("Usage:");
    println!("  digit_trainer train [config.toml]");
    println!("  digit_trainer predict [--dark-on-light] <model> <image.pgm>...");
}

fn run_training(config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => TrainerConfig::load_from_file(path)
            .with_context(|| format!("loading trainer config from {path}"))?,
        None => TrainerConfig::default(),
    };

    println!("Digit Recognizer - Training");
    println!("===========================\n");
    println!("Configuration:");
    println!("  Topology: {:?}", config.network.topology);
    println!("  Learning rate: {}", config.network.learning_rate);
    println!("  Epochs: {}", config.training.epochs);
    println!("  Samples: {}", config.dataset.count);
    println!("  Train ratio: {}", config.train_ratio);
    println!();

    let source = SyntheticDigitSource::new(config.dataset.clone());
    let mut network = TrainableNetwork::new(
        &config.network.topology,
        config.network.learning_rate,
        config.network.seed,
    )?;
    source
        .check_network(&network)
        .context("network topology does not fit the digit samples")?;

    let (train, held_out) = source.generate().split(config.train_ratio);
    println!("  Training samples: {}", train.len());
    println!("  Held-out samples: {}", held_out.len());
    println!();

    let report = network.train_with_config(&train.inputs(), &train.targets(), &config.training);
    if let TrainingStatus::Rejected(err) = &report.status {
        bail!("training rejected: {err}");
    }

    let (loss, accuracy) = report.final_metrics();
    println!("\nTraining complete in {} ms", report.total_elapsed_ms);
    println!("  Final loss: {:.4}", loss);
    println!("  Final training accuracy: {:.2}%", accuracy);
    println!();

    spot_check(&network, &train);

    if !held_out.is_empty() {
        let eval = evaluate(&network, &held_out.inputs(), &held_out.targets());
        println!(
            "Held-out accuracy: {}/{} ({:.2}%)",
            eval.correct,
            eval.total,
            eval.accuracy * 100.0
        );
        for class in 0..NUM_DIGITS {
            if let Some(acc) = eval.class_accuracy(class) {
                println!("  Digit {}: {:.2}%", class, acc * 100.0);
            }
        }
        println!();

        if let Some(path) = &config.training.log_path {
            if let Err(err) = logging::log_evaluation(path, "held_out", &eval) {
                tracing::warn!("Failed to append evaluation to {}: {err}", path.display());
            }
        }
    }

    network
        .save(&config.model_path)
        .with_context(|| format!("saving model to {}", config.model_path.display()))?;

    interactive_loop(&network, CanvasAdapter::new(config.polarity))
}

/// Re-predicts the first training samples, as a quick sanity check.
fn spot_check(network: &TrainableNetwork, train: &DigitDataset) {
    let checked: Vec<_> = train.samples.iter().take(SPOT_CHECK_COUNT).collect();
    if checked.is_empty() {
        return;
    }

    let correct = checked
        .iter()
        .filter(|sample| network.predict(&sample.pixels) == Some(sample.label))
        .count();
    println!(
        "Spot check on first {} samples: {}/{} correct ({:.1}%)",
        checked.len(),
        correct,
        checked.len(),
        correct as f64 / checked.len() as f64 * 100.0
    );
}

fn run_prediction(args: &[String]) -> Result<()> {
    let mut polarity = Polarity::LightOnDark;
    let mut positional = Vec::new();
    for arg in args {
        match arg.as_str() {
            "--dark-on-light" => polarity = Polarity::DarkOnLight,
            _ => positional.push(arg.as_str()),
        }
    }

    let Some((model_path, images)) = positional.split_first() else {
        print_usage();
        bail!("predict needs a model path");
    };
    if images.is_empty() {
        bail!("predict needs at least one image");
    }

    let network = TrainableNetwork::load(model_path)
        .with_context(|| format!("loading model from {model_path}"))?;
    let adapter = CanvasAdapter::new(polarity);

    for image in images {
        match classify_file(&network, &adapter, Path::new(image)) {
            Ok((_, Some(class))) => println!("{image}: {class}"),
            Ok((_, None)) => println!("{image}: no prediction"),
            Err(err) => println!("{image}: error: {err:#}"),
        }
    }
    Ok(())
}

fn classify_file(
    network: &TrainableNetwork,
    adapter: &CanvasAdapter,
    path: &Path,
) -> Result<(Vec<f64>, Option<usize>)> {
    let raster = read_pgm(path).with_context(|| format!("reading {}", path.display()))?;
    let pixels = adapter.to_pixels(raster.view())?;
    let class = network.predict(&pixels);
    Ok((pixels, class))
}

fn interactive_loop(network: &TrainableNetwork, adapter: CanvasAdapter) -> Result<()> {
    println!("Enter a path to a PGM drawing to classify it, or 'q' to quit.");
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        match input {
            "" => continue,
            "q" | "quit" => break,
            path => match classify_file(network, &adapter, Path::new(path)) {
                Ok((pixels, prediction)) => {
                    print!("{}", render_ascii(&pixels));
                    match prediction {
                        Some(class) => println!("Predicted digit: {class}"),
                        None => println!("No prediction available"),
                    }
                }
                Err(err) => println!("Could not classify {path}: {err:#}"),
            },
        }
    }

    println!("Bye.");
    Ok(())
}
