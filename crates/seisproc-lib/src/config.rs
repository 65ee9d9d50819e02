/*!
Runtime configuration for the tool layer.

Defaults match the behaviour of the original tool servers: figures land in the
current working directory, sections are clipped at ±2 standard deviations and
SEG-Y inline/crossline numbers are read from bytes 189/193.

Environment overrides (all optional):
- `SEISPROC_OUTPUT_DIR`    directory for rendered figures
- `SEISPROC_CHUNK_INLINES` inlines per chunk when converting to the chunked store
*/

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Inlines stored per chunk file.
pub const DEFAULT_CHUNK_INLINES: usize = 16;
/// Colour range half-width in units of the volume standard deviation.
pub const DEFAULT_CLIP_STD: f64 = 2.0;
/// JPEG quality used for every figure.
pub const DEFAULT_JPEG_QUALITY: u8 = 90;

/// Settings consumed by the tool handlers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Directory figures are written to (created on demand).
    pub output_dir: PathBuf,
    /// Chunk size along the inline axis for new chunked stores.
    pub chunk_inlines: usize,
    /// Display clip in standard deviations (`vmin = -clip*std`, `vmax = clip*std`).
    pub clip_std: f64,
    /// JPEG quality in 1..=100.
    pub jpeg_quality: u8,
}

impl Default for ToolConfig {
    fn default() -> Self {
        ToolConfig {
            output_dir: PathBuf::from("."),
            chunk_inlines: DEFAULT_CHUNK_INLINES,
            clip_std: DEFAULT_CLIP_STD,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ToolConfig {
    /// Defaults overlaid with `SEISPROC_*` environment variables.
    ///
    /// Unparseable values are ignored with a warning rather than failing startup.
    pub fn from_env() -> Self {
        let mut cfg = ToolConfig::default();
        if let Ok(dir) = std::env::var("SEISPROC_OUTPUT_DIR") {
            if !dir.trim().is_empty() {
                cfg.output_dir = PathBuf::from(dir);
            }
        }
        if let Ok(raw) = std::env::var("SEISPROC_CHUNK_INLINES") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => cfg.chunk_inlines = n,
                _ => tracing::warn!("ignoring SEISPROC_CHUNK_INLINES={raw:?}"),
            }
        }
        cfg
    }

    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    pub fn with_chunk_inlines(mut self, n: usize) -> Self {
        self.chunk_inlines = n.max(1);
        self
    }
}
