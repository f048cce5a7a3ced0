use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;

use crate::training::{EpochMetrics, Evaluation};

fn ensure_parent<P: AsRef<Path>>(path: P) -> io::Result<()> {
    match path.as_ref().parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn append_json_line<P: AsRef<Path>, T: Serialize>(path: P, value: &T) -> io::Result<()> {
    ensure_parent(&path)?;
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    serde_json::to_writer(&mut file, value)
        .map_err(|err| io::Error::new(io::ErrorKind::Other, err))?;
    file.write_all(b"\n")
}

fn timestamp_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

#[derive(Debug, Serialize)]
pub struct EpochLogEntry {
    pub epoch: usize,
    pub avg_loss: f64,
    pub accuracy: f64,
    pub skipped: usize,
    pub elapsed_ms: u128,
    pub timestamp_ms: u128,
}

pub fn log_epoch<P: AsRef<Path>>(path: P, metrics: &EpochMetrics) -> io::Result<()> {
    let entry = EpochLogEntry {
        epoch: metrics.epoch,
        avg_loss: metrics.avg_loss,
        accuracy: metrics.accuracy,
        skipped: metrics.skipped,
        elapsed_ms: metrics.elapsed_ms,
        timestamp_ms: timestamp_ms(),
    };
    append_json_line(path, &entry)
}

#[derive(Debug, Serialize)]
pub struct EvaluationLogEntry {
    pub split: String,
    pub correct: usize,
    pub total: usize,
    pub unpredicted: usize,
    pub accuracy: f64,
    pub timestamp_ms: u128,
}

pub fn log_evaluation<P: AsRef<Path>>(
    path: P,
    split: &str,
    evaluation: &Evaluation,
) -> io::Result<()> {
    let entry = EvaluationLogEntry {
        split: split.to_string(),
        correct: evaluation.correct,
        total: evaluation.total,
        unpredicted: evaluation.unpredicted,
        accuracy: evaluation.accuracy,
        timestamp_ms: timestamp_ms(),
    };
    append_json_line(path, &entry)
}
