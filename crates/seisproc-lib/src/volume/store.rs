/*!
MDIO-style Zarr v3 store (`<stem>.mdio/`).

```text
<stem>.mdio/
  zarr.json                          root group; attributes["seisproc"] = StoreMetadata
  data/chunked_012/                  f32 (inline, crossline, sample), gzip
  metadata/text_header/              u8 [3200], as read
  metadata/binary_header/            u8 [400], as read
  metadata/chunked_012_trace_headers u8 (inline, crossline, 240), zero for dead cells
  metadata/live_mask/                u8 (inline, crossline)
```

Every array is chunked along the inline axis only, `chunk_inlines` inlines per
chunk, so reading one inline decodes a single chunk. The store is built in a
hidden sibling directory and renamed into place, so a reader never sees a
half written store.
*/

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use ndarray::{Array2, Array3, Axis};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use zarrs::array::codec::GzipCodec;
use zarrs::array::{Array, ArrayBuilder, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::filesystem::FilesystemStore;
use zarrs::group::{Group, GroupBuilder};

use super::{SeismicVolume, Volume};
use crate::error::{Error, Result};
use crate::model::{Geometry, VolumeStats};
use crate::segy::{SegyCube, SegyWriter, TraceKeys, BINARY_HEADER_LEN, TEXT_HEADER_LEN, TRACE_HEADER_LEN};
use crate::utils::fsio::write_atomic;

pub const STORE_FORMAT_VERSION: &str = "seisproc-mdio-1";

/// Root-group attribute holding [`StoreMetadata`].
const METADATA_KEY: &str = "seisproc";
const DATA_ARRAY: &str = "/data/chunked_012";
const TEXT_HEADER_ARRAY: &str = "/metadata/text_header";
const BINARY_HEADER_ARRAY: &str = "/metadata/binary_header";
const TRACE_HEADERS_ARRAY: &str = "/metadata/chunked_012_trace_headers";
const LIVE_MASK_ARRAY: &str = "/metadata/live_mask";
const GZIP_LEVEL: u32 = 5;

/// Callback receiving `(message, fraction_done)` during long operations.
pub type ProgressCallback = Arc<dyn Fn(String, f32) + Send + Sync>;

/// Survey description stored in the root group's attributes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub format_version: String,
    pub geometry: Geometry,
    pub stats: VolumeStats,
    pub chunk_inlines: usize,
    pub sample_interval_us: u16,
    pub trace_keys: TraceKeys,
    /// File name of the SEG-Y the store was converted from.
    pub source: Option<String>,
    pub live_traces: usize,
}

impl StoreMetadata {
    pub fn chunk_count(&self) -> usize {
        self.geometry.inlines.len().div_ceil(self.chunk_inlines)
    }

    /// Inline range `[start, end)` held by chunk `chunk`.
    fn chunk_span(&self, chunk: usize) -> (usize, usize) {
        let start = chunk * self.chunk_inlines;
        let end = (start + self.chunk_inlines).min(self.geometry.inlines.len());
        (start, end)
    }
}

fn read_error<E: fmt::Display>(path: &Path) -> impl FnOnce(E) -> Error + '_ {
    move |e| Error::malformed(path, e.to_string())
}

fn write_error<E: fmt::Display>(path: &Path) -> impl FnOnce(E) -> Error + '_ {
    move |e| Error::io(path, std::io::Error::other(e.to_string()))
}

fn subset(ranges: &[(usize, usize)]) -> ArraySubset {
    let ranges: Vec<std::ops::Range<u64>> = ranges
        .iter()
        .map(|&(start, end)| start as u64..end as u64)
        .collect();
    ArraySubset::new_with_ranges(&ranges)
}

/// A volume read lazily from the Zarr store.
#[derive(Clone)]
pub struct ChunkedVolume {
    root: PathBuf,
    store: Arc<FilesystemStore>,
    meta: StoreMetadata,
}

impl fmt::Debug for ChunkedVolume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChunkedVolume")
            .field("root", &self.root)
            .field("shape", &self.meta.geometry.shape())
            .field("chunk_inlines", &self.meta.chunk_inlines)
            .finish()
    }
}

impl ChunkedVolume {
    /// Open a store directory and validate its metadata.
    ///
    /// # Errors
    ///
    /// - [`Error::FileNotFound`] when `root` does not exist
    /// - [`Error::MalformedFile`] when the root group, its metadata attribute
    ///   or the amplitude array is missing or inconsistent with the geometry
    pub fn open(root: &Path) -> Result<Self> {
        if !root.exists() {
            return Err(Error::FileNotFound(root.to_path_buf()));
        }
        let store = Arc::new(FilesystemStore::new(root).map_err(read_error(root))?);
        let group = Group::open(store.clone(), "/").map_err(read_error(root))?;
        let attr = group
            .attributes()
            .get(METADATA_KEY)
            .cloned()
            .ok_or_else(|| Error::malformed(root, format!("root group has no '{METADATA_KEY}' attribute")))?;
        let meta: StoreMetadata = serde_json::from_value(attr).map_err(read_error(root))?;

        if meta.format_version != STORE_FORMAT_VERSION {
            return Err(Error::malformed(
                root,
                format!("unsupported store version '{}'", meta.format_version),
            ));
        }
        if meta.chunk_inlines == 0 {
            return Err(Error::malformed(root, "chunk_inlines is zero"));
        }
        let g = &meta.geometry;
        Geometry::new(g.inlines.clone(), g.crosslines.clone(), g.samples_ms.clone())
            .map_err(read_error(root))?;

        let volume = ChunkedVolume {
            root: root.to_path_buf(),
            store,
            meta,
        };
        let (n_il, n_xl, ns) = volume.meta.geometry.shape();
        let data = volume.array(DATA_ARRAY)?;
        if data.shape() != [n_il as u64, n_xl as u64, ns as u64].as_slice() {
            return Err(Error::malformed(
                root,
                format!("amplitude array is {:?}, geometry says {n_il}x{n_xl}x{ns}", data.shape()),
            ));
        }
        if data.data_type() != &DataType::Float32 {
            return Err(Error::malformed(root, "amplitude array is not float32"));
        }

        tracing::debug!(path = %root.display(), shape = ?volume.meta.geometry.shape(), "opened chunked volume");
        Ok(volume)
    }

    /// [`ChunkedVolume::open`] on the blocking thread pool.
    pub async fn open_async(root: PathBuf) -> Result<Self> {
        let label = root.clone();
        tokio::task::spawn_blocking(move || Self::open(&root))
            .await
            .map_err(|e| Error::io(label, std::io::Error::other(e.to_string())))?
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata(&self) -> &StoreMetadata {
        &self.meta
    }

    /// Read the whole amplitude array into an in-memory [`Volume`].
    pub fn load(&self) -> Result<Volume> {
        Volume::with_stats(self.meta.geometry.clone(), self.read_cube()?, self.meta.stats)
    }

    pub fn text_header(&self) -> Result<Vec<u8>> {
        self.read_bytes(TEXT_HEADER_ARRAY, &[(0, TEXT_HEADER_LEN)])
    }

    pub fn binary_header(&self) -> Result<[u8; BINARY_HEADER_LEN]> {
        let raw = self.read_bytes(BINARY_HEADER_ARRAY, &[(0, BINARY_HEADER_LEN)])?;
        let mut out = [0u8; BINARY_HEADER_LEN];
        out.copy_from_slice(&raw);
        Ok(out)
    }

    pub fn trace_headers(&self) -> Result<Vec<u8>> {
        let (n_il, n_xl, _) = self.meta.geometry.shape();
        self.read_bytes(TRACE_HEADERS_ARRAY, &[(0, n_il), (0, n_xl), (0, TRACE_HEADER_LEN)])
    }

    pub fn live_mask(&self) -> Result<Vec<bool>> {
        let (n_il, n_xl, _) = self.meta.geometry.shape();
        let raw = self.read_bytes(LIVE_MASK_ARRAY, &[(0, n_il), (0, n_xl)])?;
        Ok(raw.into_iter().map(|b| b != 0).collect())
    }

    fn array(&self, path: &str) -> Result<Array<FilesystemStore>> {
        Array::open(self.store.clone(), path).map_err(|e| Error::malformed(&self.root, format!("{path}: {e}")))
    }

    fn read_bytes(&self, path: &str, ranges: &[(usize, usize)]) -> Result<Vec<u8>> {
        let array = self.array(path)?;
        let expected: usize = ranges.iter().map(|(a, b)| b - a).product();
        let raw = array
            .retrieve_array_subset_elements::<u8>(&subset(ranges))
            .map_err(|e| Error::malformed(&self.root, format!("{path}: {e}")))?;
        if raw.len() != expected {
            return Err(Error::malformed(
                &self.root,
                format!("{path}: expected {expected} bytes, found {}", raw.len()),
            ));
        }
        Ok(raw)
    }

    /// Amplitudes in `[il0, il1) x [xl0, xl1) x [s0, s1)`.
    fn read_block(&self, ranges: [(usize, usize); 3]) -> Result<Array3<f32>> {
        let values = self
            .array(DATA_ARRAY)?
            .retrieve_array_subset_elements::<f32>(&subset(&ranges))
            .map_err(|e| Error::malformed(&self.root, format!("{DATA_ARRAY}: {e}")))?;
        let shape = (
            ranges[0].1 - ranges[0].0,
            ranges[1].1 - ranges[1].0,
            ranges[2].1 - ranges[2].0,
        );
        Array3::from_shape_vec(shape, values).map_err(read_error(&self.root))
    }
}

fn out_of_range(axis: &str, index: usize, len: usize) -> Error {
    Error::invalid(format!(
        "{axis} position {index} out of range (axis has {len} entries)"
    ))
}

impl SeismicVolume for ChunkedVolume {
    fn geometry(&self) -> &Geometry {
        &self.meta.geometry
    }

    fn stats(&self) -> &VolumeStats {
        &self.meta.stats
    }

    /// Decodes only the chunk holding the inline.
    fn read_inline(&self, index: usize) -> Result<Array2<f32>> {
        let (n_il, n_xl, ns) = self.meta.geometry.shape();
        if index >= n_il {
            return Err(out_of_range("inline", index, n_il));
        }
        let block = self.read_block([(index, index + 1), (0, n_xl), (0, ns)])?;
        Ok(block.index_axis_move(Axis(0), 0))
    }

    fn read_crossline(&self, index: usize) -> Result<Array2<f32>> {
        let (n_il, n_xl, ns) = self.meta.geometry.shape();
        if index >= n_xl {
            return Err(out_of_range("crossline", index, n_xl));
        }
        let block = self.read_block([(0, n_il), (index, index + 1), (0, ns)])?;
        Ok(block.index_axis_move(Axis(1), 0))
    }

    fn read_time(&self, index: usize) -> Result<Array2<f32>> {
        let (n_il, n_xl, ns) = self.meta.geometry.shape();
        if index >= ns {
            return Err(out_of_range("sample", index, ns));
        }
        let block = self.read_block([(0, n_il), (0, n_xl), (index, index + 1)])?;
        Ok(block.index_axis_move(Axis(2), 0))
    }

    fn read_cube(&self) -> Result<Array3<f32>> {
        let (n_il, n_xl, ns) = self.meta.geometry.shape();
        self.read_block([(0, n_il), (0, n_xl), (0, ns)])
    }
}

/// Element types the store writes, with their Zarr data type and fill value.
trait StoredElement: zarrs::array::Element + Copy {
    const DATA_TYPE: DataType;
    fn fill() -> FillValue;
}

impl StoredElement for u8 {
    const DATA_TYPE: DataType = DataType::UInt8;
    fn fill() -> FillValue {
        FillValue::from(0u8)
    }
}

impl StoredElement for f32 {
    const DATA_TYPE: DataType = DataType::Float32;
    fn fill() -> FillValue {
        FillValue::from(0.0f32)
    }
}

/// Layout of one array: node path, shape, chunk shape and axis names.
struct ArraySpec<'a> {
    path: &'a str,
    shape: Vec<usize>,
    chunk: Vec<usize>,
    dimension_names: Option<&'a [&'a str]>,
}

impl ArraySpec<'_> {
    /// Create the array under `staged` and fill it with `values` (row-major)
    /// unless `values` is empty.
    fn write<T: StoredElement>(
        &self,
        store: &Arc<FilesystemStore>,
        staged: &Path,
        values: &[T],
    ) -> Result<Array<FilesystemStore>> {
        let shape: Vec<u64> = self.shape.iter().map(|&n| n as u64).collect();
        let chunk: Vec<u64> = self.chunk.iter().map(|&n| n as u64).collect();
        let mut builder = ArrayBuilder::new(
            shape,
            T::DATA_TYPE,
            chunk.try_into().map_err(write_error(staged))?,
            T::fill(),
        );
        builder.bytes_to_bytes_codecs(vec![Arc::new(
            GzipCodec::new(GZIP_LEVEL).map_err(write_error(staged))?,
        )]);
        if let Some(names) = self.dimension_names {
            builder.dimension_names(Some(names.iter().copied()));
        }
        let array = builder
            .build(store.clone(), self.path)
            .map_err(write_error(staged))?;
        array.store_metadata().map_err(write_error(staged))?;
        if !values.is_empty() {
            let all: Vec<(usize, usize)> = self.shape.iter().map(|&n| (0, n)).collect();
            array
                .store_array_subset_elements::<T>(&subset(&all), values)
                .map_err(write_error(staged))?;
        }
        Ok(array)
    }
}

fn put_group(store: &Arc<FilesystemStore>, staged: &Path, path: &str, attributes: Map<String, Value>) -> Result<()> {
    GroupBuilder::new()
        .attributes(attributes)
        .build(store.clone(), path)
        .map_err(write_error(staged))?
        .store_metadata()
        .map_err(write_error(staged))
}

/// Write `cube` as an MDIO-style Zarr store at `out_dir`.
///
/// # Arguments
///
/// * `cube` - SEG-Y file already assembled into a regular cube
/// * `out_dir` - store directory to create; must not exist yet
/// * `chunk_inlines` - inlines per chunk (at least 1)
/// * `progress` - optional `(message, fraction)` callback, called once per chunk
///
/// # Errors
///
/// [`Error::InvalidInput`] when `out_dir` already exists or `chunk_inlines`
/// is zero; [`Error::Io`] on write failure, in which case nothing is left at
/// `out_dir`.
pub fn convert_segy(
    cube: &SegyCube,
    out_dir: &Path,
    chunk_inlines: usize,
    progress: Option<&ProgressCallback>,
) -> Result<StoreMetadata> {
    if chunk_inlines == 0 {
        return Err(Error::invalid("chunk_inlines must be at least 1"));
    }
    if out_dir.exists() {
        return Err(Error::invalid(format!(
            "{} already exists",
            out_dir.display()
        )));
    }

    let volume = &cube.volume;
    let meta = StoreMetadata {
        format_version: STORE_FORMAT_VERSION.to_string(),
        geometry: volume.geometry().clone(),
        stats: *volume.stats(),
        chunk_inlines,
        sample_interval_us: cube.sample_interval_us(),
        trace_keys: cube.keys,
        source: cube
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned()),
        live_traces: cube.live_traces(),
    };
    let (n_il, n_xl, ns) = meta.geometry.shape();

    write_atomic(out_dir, |staged| {
        std::fs::create_dir_all(staged).map_err(|e| Error::io(staged, e))?;
        let store = Arc::new(FilesystemStore::new(staged).map_err(write_error(staged))?);

        let mut attributes = Map::new();
        attributes.insert(
            METADATA_KEY.to_string(),
            serde_json::to_value(&meta).map_err(write_error(staged))?,
        );
        put_group(&store, staged, "/", attributes)?;
        put_group(&store, staged, "/data", Map::new())?;
        put_group(&store, staged, "/metadata", Map::new())?;

        ArraySpec {
            path: TEXT_HEADER_ARRAY,
            shape: vec![TEXT_HEADER_LEN],
            chunk: vec![TEXT_HEADER_LEN],
            dimension_names: None,
        }
        .write(&store, staged, cube.text_header.as_slice())?;
        ArraySpec {
            path: BINARY_HEADER_ARRAY,
            shape: vec![BINARY_HEADER_LEN],
            chunk: vec![BINARY_HEADER_LEN],
            dimension_names: None,
        }
        .write(&store, staged, cube.binary_header.raw().as_slice())?;
        ArraySpec {
            path: TRACE_HEADERS_ARRAY,
            shape: vec![n_il, n_xl, TRACE_HEADER_LEN],
            chunk: vec![chunk_inlines, n_xl, TRACE_HEADER_LEN],
            dimension_names: Some(&["inline", "crossline", "header_byte"]),
        }
        .write(&store, staged, cube.trace_headers.as_slice())?;
        let mask: Vec<u8> = cube.live.iter().map(|l| u8::from(*l)).collect();
        ArraySpec {
            path: LIVE_MASK_ARRAY,
            shape: vec![n_il, n_xl],
            chunk: vec![chunk_inlines, n_xl],
            dimension_names: Some(&["inline", "crossline"]),
        }
        .write(&store, staged, mask.as_slice())?;

        // amplitudes go in chunk by chunk so progress can be reported
        let data = ArraySpec {
            path: DATA_ARRAY,
            shape: vec![n_il, n_xl, ns],
            chunk: vec![chunk_inlines, n_xl, ns],
            dimension_names: Some(&["inline", "crossline", "sample"]),
        }
        .write::<f32>(&store, staged, &[])?;
        let total = meta.chunk_count();
        for chunk in 0..total {
            let (start, end) = meta.chunk_span(chunk);
            let block: Vec<f32> = volume
                .data()
                .slice(ndarray::s![start..end, .., ..])
                .iter()
                .copied()
                .collect();
            data.store_array_subset_elements::<f32>(&subset(&[(start, end), (0, n_xl), (0, ns)]), &block)
                .map_err(write_error(staged))?;
            if let Some(cb) = progress {
                cb(
                    format!("chunk {}/{total}", chunk + 1),
                    (chunk + 1) as f32 / total as f32,
                );
            }
        }
        Ok(())
    })?;

    tracing::info!(
        target = %out_dir.display(),
        chunks = meta.chunk_count(),
        live_traces = meta.live_traces,
        "converted SEG-Y to chunked store"
    );
    Ok(meta)
}

/// Write the live traces of `volume` back to SEG-Y (IEEE float samples).
///
/// Returns the number of traces written.
pub fn export_segy(volume: &ChunkedVolume, out_path: &Path) -> Result<usize> {
    let meta = volume.metadata();
    let (_, n_xl, ns) = meta.geometry.shape();
    let text = volume.text_header()?;
    let binary = volume.binary_header()?;
    let headers = volume.trace_headers()?;
    let live = volume.live_mask()?;

    let mut writer = SegyWriter::create(out_path, &text, &binary, meta.sample_interval_us, ns)?;
    for chunk in 0..meta.chunk_count() {
        let (start, end) = meta.chunk_span(chunk);
        let data = volume.read_block([(start, end), (0, n_xl), (0, ns)])?;
        for (k, trace) in data.lanes(Axis(2)).into_iter().enumerate() {
            let cell = start * n_xl + k;
            if !live[cell] {
                continue;
            }
            let mut header = [0u8; TRACE_HEADER_LEN];
            header.copy_from_slice(&headers[cell * TRACE_HEADER_LEN..(cell + 1) * TRACE_HEADER_LEN]);
            let samples: Vec<f32> = trace.iter().copied().collect();
            writer.write_trace(&header, &samples)?;
        }
    }
    let written = writer.finish()?;
    tracing::info!(path = %out_path.display(), traces = written, "exported chunked store to SEG-Y");
    Ok(written)
}
