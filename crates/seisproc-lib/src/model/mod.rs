//! Plain data types shared by the accessor, analyzers and renderer.

pub mod geometry;
pub mod slice;
pub mod stats;

pub use geometry::{Geometry, LineType, SliceAxis};
pub use slice::{mean_over_traces, Slice, TimeSlice};
pub use stats::VolumeStats;
