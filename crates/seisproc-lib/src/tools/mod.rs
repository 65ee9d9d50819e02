/*!
Seismic tools exposed to agents.

A tool takes JSON arguments, loads what it needs from disk, runs the shared
extraction/spectral/denoising pipeline and returns a short text message plus,
for figure tools, the path of the rendered image. Tools keep no state between
calls; everything they need travels in [`ToolContext`].
*/

mod basic;
mod denoising;
pub mod params;
pub mod registry;

use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::ToolConfig;
use crate::error::Result;
use crate::render::Renderer;
use crate::volume::ChunkedVolume;

pub use registry::{ParamKind, ParamSpec, ToolRegistry, ToolSpec};

/// Per-process settings handed to every tool call.
#[derive(Clone, Debug, Default)]
pub struct ToolContext {
    pub config: ToolConfig,
}

impl ToolContext {
    pub fn new(config: ToolConfig) -> Self {
        ToolContext { config }
    }

    pub fn renderer(&self) -> Renderer {
        Renderer::new(&self.config)
    }

    /// `data_path/data`.
    pub fn dataset_path(&self, data_path: &str, data: &str) -> PathBuf {
        Path::new(data_path).join(data)
    }

    /// `data_path/<data up to the first '.'>.mdio`.
    pub fn store_path(&self, data_path: &str, data: &str) -> PathBuf {
        Path::new(data_path).join(format!("{}.mdio", dataset_stem(data)))
    }

    pub fn open_store(&self, data_path: &str, data: &str) -> Result<ChunkedVolume> {
        ChunkedVolume::open(&self.store_path(data_path, data))
    }
}

/// File name up to its first dot (`survey.v2.sgy` → `survey`).
pub fn dataset_stem(data: &str) -> &str {
    data.split('.').next().unwrap_or(data)
}

/// Result of a tool call.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ToolOutput {
    pub text: String,
    pub image: Option<PathBuf>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        ToolOutput {
            text: text.into(),
            image: None,
        }
    }

    pub fn with_image(text: impl Into<String>, image: PathBuf) -> Self {
        ToolOutput {
            text: text.into(),
            image: Some(image),
        }
    }
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)?;
        if let Some(image) = &self.image {
            if !self.text.contains(&*image.to_string_lossy()) {
                write!(f, "\n{}", image.display())?;
            }
        }
        Ok(())
    }
}
