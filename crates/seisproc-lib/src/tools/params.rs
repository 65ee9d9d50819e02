//! Typed arguments of every tool, deserialised from the JSON the caller sends.
//!
//! Defaults mirror the values the tools have always advertised: SEG-Y line
//! numbers at bytes 189/193, SVD cutoff 0.5, a 2×2 median window and σ = 1.

use serde::{Deserialize, Serialize};

use crate::denoise::{DEFAULT_CUTOFF_RATIO, DEFAULT_GAUSSIAN_SIGMA, DEFAULT_MEDIAN_SIZE};
use crate::segy::{TraceKeys, DEFAULT_CROSSLINE_BYTE, DEFAULT_INLINE_BYTE};

fn default_inline_byte() -> usize {
    DEFAULT_INLINE_BYTE
}

fn default_crossline_byte() -> usize {
    DEFAULT_CROSSLINE_BYTE
}

fn default_cutoff_ratio() -> f64 {
    DEFAULT_CUTOFF_RATIO
}

fn default_median_size() -> [usize; 2] {
    [DEFAULT_MEDIAN_SIZE.0, DEFAULT_MEDIAN_SIZE.1]
}

fn default_sigma() -> f64 {
    DEFAULT_GAUSSIAN_SIGMA
}

/// Directory plus file name of the dataset.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataParams {
    pub data_path: String,
    pub data: String,
}

/// SEG-Y location plus header byte positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SegyParams {
    pub data_path: String,
    pub data: String,
    #[serde(default = "default_inline_byte")]
    pub inline: usize,
    #[serde(default = "default_crossline_byte")]
    pub crossline: usize,
}

impl SegyParams {
    pub fn keys(&self) -> crate::Result<TraceKeys> {
        TraceKeys::new(self.inline, self.crossline)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSpectrumParams {
    pub data_path: String,
    pub data: String,
    pub line_number: i32,
    pub line_type: String,
    #[serde(default = "default_inline_byte")]
    pub inline: usize,
    #[serde(default = "default_crossline_byte")]
    pub crossline: usize,
    /// Overrides the interval read from the file.
    #[serde(default)]
    pub sample_interval_ms: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CubeSpectrumParams {
    pub data_path: String,
    pub data: String,
    #[serde(default = "default_inline_byte")]
    pub inline: usize,
    #[serde(default = "default_crossline_byte")]
    pub crossline: usize,
    #[serde(default)]
    pub sample_interval_ms: Option<f64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotInlineParams {
    pub data_path: String,
    pub data: String,
    pub inline: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotCrosslineParams {
    pub data_path: String,
    pub data: String,
    pub crossline: i32,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotTimeParams {
    pub data_path: String,
    pub data: String,
    /// Two-way time in ms.
    pub time: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SvdParams {
    pub data_path: String,
    pub data: String,
    pub line_number: i32,
    pub line_type: String,
    #[serde(default = "default_cutoff_ratio")]
    pub cutoff_ratio: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MedianParams {
    pub data_path: String,
    pub data: String,
    pub line_number: i32,
    pub line_type: String,
    #[serde(default = "default_median_size")]
    pub size: [usize; 2],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GaussianParams {
    pub data_path: String,
    pub data: String,
    pub line_number: i32,
    pub line_type: String,
    #[serde(default = "default_sigma")]
    pub sigma: f64,
}
