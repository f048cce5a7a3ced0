//! Conversion of captured rasters into network input vectors.
//!
//! Training digits are bright strokes on a dark background, scaled to
//! `[0, 1]`. A raster from any source must end up in that same convention:
//! 28×28, row-major, bright ink.

use std::fmt;
use std::fs;
use std::path::Path;

use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::data::DIGIT_SIDE;
use crate::error::{NetworkError, NetworkResult};

/// Converts a captured raster into the pixel vector the network consumes.
pub trait InputAdapter {
    fn to_pixels(&self, image: ArrayView2<u8>) -> NetworkResult<Vec<f64>>;
}

/// Ink/background convention of a raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// White strokes on a black canvas, same as the training data
    #[default]
    LightOnDark,
    /// Dark pen on white paper; inverted before use
    DarkOnLight,
}

/// Adapter for drawing canvases and scanned images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CanvasAdapter {
    pub polarity: Polarity,
}

impl CanvasAdapter {
    pub fn new(polarity: Polarity) -> Self {
        Self { polarity }
    }
}

impl InputAdapter for CanvasAdapter {
    fn to_pixels(&self, image: ArrayView2<u8>) -> NetworkResult<Vec<f64>> {
        let (height, width) = image.dim();
        if height == 0 || width == 0 {
            return Err(NetworkError::shape_mismatch(
                "canvas raster pixels",
                DIGIT_SIDE * DIGIT_SIDE,
                height * width,
            ));
        }

        let resized = area_resize(image, DIGIT_SIDE, DIGIT_SIDE);
        let pixels = resized
            .iter()
            .map(|&value| {
                let value = match self.polarity {
                    Polarity::LightOnDark => value,
                    Polarity::DarkOnLight => 255.0 - value,
                };
                (value / 255.0).clamp(0.0, 1.0)
            })
            .collect();
        Ok(pixels)
    }
}

/// Source indices and coverage weights contributing to each output index.
fn area_weights(src_len: usize, dst_len: usize) -> Vec<Vec<(usize, f64)>> {
    let step = src_len as f64 / dst_len as f64;
    (0..dst_len)
        .map(|o| {
            let start = o as f64 * step;
            let end = start + step;
            let first = start.floor() as usize;
            let last = (end.ceil() as usize).min(src_len);
            (first..last)
                .filter_map(|i| {
                    let overlap = end.min(i as f64 + 1.0) - start.max(i as f64);
                    (overlap > 0.0).then_some((i, overlap / step))
                })
                .collect()
        })
        .collect()
}

/// Area-average resize; every output pixel is the coverage-weighted mean of
/// the source pixels under it.
fn area_resize(image: ArrayView2<u8>, rows: usize, cols: usize) -> Array2<f64> {
    let (height, width) = image.dim();
    let row_weights = area_weights(height, rows);
    let col_weights = area_weights(width, cols);

    Array2::from_shape_fn((rows, cols), |(r, c)| {
        let mut acc = 0.0;
        for &(sy, wy) in &row_weights[r] {
            for &(sx, wx) in &col_weights[c] {
                acc += f64::from(image[[sy, sx]]) * wy * wx;
            }
        }
        acc
    })
}

/// Errors from reading a graymap file
#[derive(Debug)]
pub enum PgmError {
    Io(std::io::Error),
    Format(String),
}

impl fmt::Display for PgmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PgmError::Io(err) => write!(f, "IO error: {}", err),
            PgmError::Format(msg) => write!(f, "Invalid PGM: {}", msg),
        }
    }
}

impl std::error::Error for PgmError {}

impl From<std::io::Error> for PgmError {
    fn from(value: std::io::Error) -> Self {
        PgmError::Io(value)
    }
}

/// Reads an 8-bit binary (`P5`) or ASCII (`P2`) graymap, rescaled to `0..=255`.
pub fn read_pgm<P: AsRef<Path>>(path: P) -> Result<Array2<u8>, PgmError> {
    let bytes = fs::read(path)?;
    parse_pgm(&bytes)
}

/// Parses graymap bytes; see [`read_pgm`].
pub fn parse_pgm(bytes: &[u8]) -> Result<Array2<u8>, PgmError> {
    let mut cursor = HeaderCursor { bytes, pos: 0 };
    let magic = cursor.token()?;
    let binary = match magic.as_str() {
        "P5" => true,
        "P2" => false,
        other => return Err(PgmError::Format(format!("unsupported magic '{other}'"))),
    };

    let width = cursor.number("width")?;
    let height = cursor.number("height")?;
    let max_value = cursor.number("max value")?;
    if width == 0 || height == 0 {
        return Err(PgmError::Format(format!("empty image {width}x{height}")));
    }
    if max_value == 0 || max_value > 255 {
        return Err(PgmError::Format(format!(
            "max value {max_value} outside 1..=255"
        )));
    }

    let count = width
        .checked_mul(height)
        .filter(|&count| count <= bytes.len())
        .ok_or_else(|| {
            PgmError::Format(format!(
                "{width}x{height} raster does not fit in a {}-byte file",
                bytes.len()
            ))
        })?;
    let raw: Vec<usize> = if binary {
        // exactly one whitespace byte separates the header from the raster
        let start = cursor.pos + 1;
        let data = start
            .checked_add(count)
            .and_then(|end| bytes.get(start..end))
            .ok_or_else(|| PgmError::Format(format!("expected {count} raster bytes")))?;
        data.iter().map(|&b| usize::from(b)).collect()
    } else {
        (0..count)
            .map(|_| cursor.number("pixel"))
            .collect::<Result<_, _>>()?
    };

    let pixels = raw
        .into_iter()
        .map(|value| {
            if value > max_value {
                Err(PgmError::Format(format!(
                    "pixel {value} exceeds max value {max_value}"
                )))
            } else {
                Ok((value * 255 / max_value) as u8)
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Array2::from_shape_vec((height, width), pixels)
        .map_err(|err| PgmError::Format(err.to_string()))
}

struct HeaderCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl HeaderCursor<'_> {
    fn token(&mut self) -> Result<String, PgmError> {
        loop {
            match self.bytes.get(self.pos) {
                Some(b'#') => {
                    while !matches!(self.bytes.get(self.pos), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(_) => break,
                None => return Err(PgmError::Format("unexpected end of header".into())),
            }
        }

        let start = self.pos;
        while matches!(self.bytes.get(self.pos), Some(b) if !b.is_ascii_whitespace()) {
            self.pos += 1;
        }
        Ok(String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned())
    }

    fn number(&mut self, what: &str) -> Result<usize, PgmError> {
        let token = self.token()?;
        token
            .parse()
            .map_err(|_| PgmError::Format(format!("{what} '{token}' is not a number")))
    }
}

/// Draws a pixel vector as text, one line per 28-pixel row.
pub fn render_ascii(pixels: &[f64]) -> String {
    const RAMP: &[u8] = b" .:-=+*#%@";
    let mut out = String::with_capacity(pixels.len() + pixels.len() / DIGIT_SIDE);
    for row in pixels.chunks(DIGIT_SIDE) {
        for &value in row {
            let level = (value.clamp(0.0, 1.0) * (RAMP.len() - 1) as f64).round() as usize;
            out.push(RAMP[level] as char);
        }
        out.push('\n');
    }
    out
}
