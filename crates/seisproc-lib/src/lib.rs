//! Seismic processing toolkit behind an agent tool interface.
//!
//! The crate reads legacy SEG-Y files, stores them in a chunked on-disk
//! layout, cuts inline/crossline sections and time maps, computes amplitude
//! spectra, runs SVD/median/Gaussian denoising and renders JPEG figures. All
//! of it is reachable through [`tools::ToolRegistry`], which the MCP server
//! and the chat CLI share.
//
// Public modules
pub mod config;
pub mod denoise;
pub mod error;
pub mod model;
pub mod render;
pub mod segy;
pub mod spectral;
pub mod tools;
pub mod utils;
pub mod volume;

// Re-export primary types for ergonomic use.
pub use config::ToolConfig;
pub use denoise::{DenoiseReport, DenoiseResult, Filter};
pub use error::{Error, Result};
pub use model::{Geometry, LineType, Slice, SliceAxis, TimeSlice, VolumeStats};
pub use render::{FigureName, Renderer};
pub use segy::{SegyCube, TraceKeys};
pub use spectral::{Spectrum, SpectrumConfig};
pub use tools::{ToolContext, ToolOutput, ToolRegistry, ToolSpec};
pub use volume::{ChunkedVolume, SeismicVolume, Volume};
