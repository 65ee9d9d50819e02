use ndarray::{Array1, Array2, Axis};

use super::geometry::SliceAxis;
use crate::error::{Error, Result};

/// 2D section (trace axis × time axis) cut from a volume at a fixed inline or crossline.
#[derive(Clone, Debug)]
pub struct Slice {
    pub axis: SliceAxis,
    pub samples_ms: Vec<f64>,
    /// Shape `(n_traces, n_samples)`.
    pub data: Array2<f64>,
}

impl Slice {
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    /// Average over traces, leaving one value per time sample.
    pub fn mean_trace(&self) -> Result<Array1<f64>> {
        mean_over_traces(&self.data)
    }
}

/// Horizontal map (inline × crossline) at one two-way time.
#[derive(Clone, Debug)]
pub struct TimeSlice {
    pub time_ms: f64,
    pub inlines: Vec<i32>,
    pub crosslines: Vec<i32>,
    /// Shape `(n_inlines, n_crosslines)`.
    pub data: Array2<f64>,
}

/// Mean along axis 0 of a `(traces, samples)` array.
pub fn mean_over_traces(data: &Array2<f64>) -> Result<Array1<f64>> {
    if data.nrows() == 0 || data.ncols() == 0 {
        return Err(Error::invalid("cannot average an empty slice"));
    }
    data.mean_axis(Axis(0))
        .ok_or_else(|| Error::invalid("cannot average an empty slice"))
}
