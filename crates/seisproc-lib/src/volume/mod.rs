/*!
Volume access: the [`SeismicVolume`] seam, the in-memory [`Volume`] and the
slice/map extraction used by every tool.

Coordinates are matched exactly against the volume's axes; a value that is
not on an axis is reported as [`Error::CoordinateNotFound`] and never snapped
to the nearest line or sample.
*/

pub mod store;

use ndarray::{s, Array1, Array2, Array3, Axis};

use crate::error::{Error, Result};
use crate::model::{mean_over_traces, Geometry, LineType, Slice, SliceAxis, TimeSlice, VolumeStats};

pub use store::{convert_segy, export_segy, ChunkedVolume, ProgressCallback, StoreMetadata};

/// Read-only access to a 3D (inline, crossline, sample) amplitude cube.
///
/// Indices are positions on the geometry axes, not line numbers; use
/// [`Geometry::inline_index`] and friends to translate.
pub trait SeismicVolume {
    fn geometry(&self) -> &Geometry;
    fn stats(&self) -> &VolumeStats;

    /// Section at inline position `index`, shape `(n_crosslines, n_samples)`.
    fn read_inline(&self, index: usize) -> Result<Array2<f32>>;

    /// Section at crossline position `index`, shape `(n_inlines, n_samples)`.
    fn read_crossline(&self, index: usize) -> Result<Array2<f32>>;

    /// Map at sample position `index`, shape `(n_inlines, n_crosslines)`.
    fn read_time(&self, index: usize) -> Result<Array2<f32>>;

    /// The whole cube.
    fn read_cube(&self) -> Result<Array3<f32>>;
}

/// Fully loaded volume.
#[derive(Clone, Debug)]
pub struct Volume {
    geometry: Geometry,
    stats: VolumeStats,
    data: Array3<f32>,
}

impl Volume {
    /// Wrap `data`, computing statistics over every sample.
    pub fn new(geometry: Geometry, data: Array3<f32>) -> Result<Self> {
        let stats = VolumeStats::from_values(data.iter().copied());
        Self::with_stats(geometry, data, stats)
    }

    /// Wrap `data` with statistics computed elsewhere (e.g. over live traces only).
    pub fn with_stats(geometry: Geometry, data: Array3<f32>, stats: VolumeStats) -> Result<Self> {
        if data.dim() != geometry.shape() {
            return Err(Error::invalid(format!(
                "data shape {:?} does not match geometry {:?}",
                data.dim(),
                geometry.shape()
            )));
        }
        Ok(Volume {
            geometry,
            stats,
            data,
        })
    }

    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    pub fn stats(&self) -> &VolumeStats {
        &self.stats
    }

    pub fn data(&self) -> &Array3<f32> {
        &self.data
    }
}

fn check_index(axis: &str, index: usize, len: usize) -> Result<()> {
    if index >= len {
        return Err(Error::invalid(format!(
            "{axis} position {index} out of range (axis has {len} entries)"
        )));
    }
    Ok(())
}

impl SeismicVolume for Volume {
    fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    fn stats(&self) -> &VolumeStats {
        &self.stats
    }

    fn read_inline(&self, index: usize) -> Result<Array2<f32>> {
        check_index("inline", index, self.data.len_of(Axis(0)))?;
        Ok(self.data.index_axis(Axis(0), index).to_owned())
    }

    fn read_crossline(&self, index: usize) -> Result<Array2<f32>> {
        check_index("crossline", index, self.data.len_of(Axis(1)))?;
        Ok(self.data.index_axis(Axis(1), index).to_owned())
    }

    fn read_time(&self, index: usize) -> Result<Array2<f32>> {
        check_index("sample", index, self.data.len_of(Axis(2)))?;
        Ok(self.data.slice(s![.., .., index]).to_owned())
    }

    fn read_cube(&self) -> Result<Array3<f32>> {
        Ok(self.data.clone())
    }
}

/// Cut the inline or crossline section numbered `number`.
///
/// # Errors
///
/// [`Error::CoordinateNotFound`] if `number` is not on the requested axis.
pub fn extract_line<V>(volume: &V, line: LineType, number: i32) -> Result<Slice>
where
    V: SeismicVolume + ?Sized,
{
    let geometry = volume.geometry();
    let raw = match line {
        LineType::Inline => volume.read_inline(geometry.inline_index(number)?)?,
        LineType::Crossline => volume.read_crossline(geometry.crossline_index(number)?)?,
    };
    tracing::debug!(line = %line, number, shape = ?raw.dim(), "extracted section");
    Ok(Slice {
        axis: SliceAxis::new(line, number, geometry),
        samples_ms: geometry.samples_ms.clone(),
        data: raw.mapv(f64::from),
    })
}

/// Horizontal map at two-way time `time_ms` (exact sample match).
pub fn extract_time<V>(volume: &V, time_ms: f64) -> Result<TimeSlice>
where
    V: SeismicVolume + ?Sized,
{
    let geometry = volume.geometry();
    let raw = volume.read_time(geometry.sample_index(time_ms)?)?;
    Ok(TimeSlice {
        time_ms,
        inlines: geometry.inlines.clone(),
        crosslines: geometry.crosslines.clone(),
        data: raw.mapv(f64::from),
    })
}

/// Average trace of the whole cube (mean over inline and crossline).
pub fn volume_mean_trace<V>(volume: &V) -> Result<Array1<f64>>
where
    V: SeismicVolume + ?Sized,
{
    let cube = volume.read_cube()?;
    let (n_il, n_xl, ns) = cube.dim();
    let flat = cube
        .into_shape_with_order((n_il * n_xl, ns))
        .map_err(|e| Error::invalid(format!("cannot flatten cube: {e}")))?;
    mean_over_traces(&flat.mapv(f64::from))
}
