/*!
Legacy trace format (SEG-Y rev1, big-endian) reader.

Only what the tools need is supported:

- textual header decoding (EBCDIC or ASCII)
- binary header fields: sample interval, samples per trace, format code,
  extended textual header count
- fixed-length traces keyed by inline/crossline numbers stored at configurable
  byte positions of the 240-byte trace header
- assembly of a regular (inline, crossline, sample) cube over the sorted unique
  line numbers; cells without a trace are zero-filled and marked dead

Byte positions follow the standard's 1-based convention throughout.
*/

pub mod sample;
pub mod text;
pub mod writer;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{Geometry, VolumeStats};
use crate::volume::Volume;

pub use sample::SampleFormat;
pub use text::{ascii_text_header, decode_text_header, TEXT_HEADER_LEN};
pub use writer::{build_binary_header, build_trace_header, write_segy, SegyWriter};

pub const BINARY_HEADER_LEN: usize = 400;
pub const TRACE_HEADER_LEN: usize = 240;

/// Default inline byte (standard rev1 location).
pub const DEFAULT_INLINE_BYTE: usize = 189;
/// Default crossline byte (standard rev1 location).
pub const DEFAULT_CROSSLINE_BYTE: usize = 193;

// Offsets (0-based) inside the binary header.
const BIN_SAMPLE_INTERVAL: usize = 16;
const BIN_SAMPLES_PER_TRACE: usize = 20;
const BIN_FORMAT_CODE: usize = 24;
const BIN_EXTENDED_HEADERS: usize = 304;

// Offsets (0-based) inside a trace header.
pub(crate) const TR_DELAY_MS: usize = 108;
pub(crate) const TR_SAMPLES: usize = 114;
pub(crate) const TR_SAMPLE_INTERVAL: usize = 116;

/// Byte positions of the inline and crossline numbers in each trace header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceKeys {
    pub inline_byte: usize,
    pub crossline_byte: usize,
}

impl Default for TraceKeys {
    fn default() -> Self {
        TraceKeys {
            inline_byte: DEFAULT_INLINE_BYTE,
            crossline_byte: DEFAULT_CROSSLINE_BYTE,
        }
    }
}

impl TraceKeys {
    /// Validate 1-based byte positions; each 4-byte key must fit in the trace header.
    pub fn new(inline_byte: usize, crossline_byte: usize) -> Result<Self> {
        for (name, byte) in [("inline", inline_byte), ("crossline", crossline_byte)] {
            if !(1..=TRACE_HEADER_LEN - 3).contains(&byte) {
                return Err(Error::invalid(format!(
                    "{name} byte position {byte} is outside 1..={}",
                    TRACE_HEADER_LEN - 3
                )));
            }
        }
        Ok(TraceKeys {
            inline_byte,
            crossline_byte,
        })
    }

    pub fn inline_of(&self, header: &[u8]) -> i32 {
        read_i32(header, self.inline_byte - 1)
    }

    pub fn crossline_of(&self, header: &[u8]) -> i32 {
        read_i32(header, self.crossline_byte - 1)
    }
}

pub(crate) fn read_i32(buf: &[u8], offset: usize) -> i32 {
    i32::from_be_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

pub(crate) fn read_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

pub(crate) fn read_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_be_bytes([buf[offset], buf[offset + 1]])
}

/// The fields of the 400-byte binary header that the reader relies on, plus
/// the raw bytes so they can be written back unchanged.
#[derive(Clone, Debug)]
pub struct BinaryHeader {
    pub sample_interval_us: u16,
    pub samples_per_trace: u16,
    pub format: SampleFormat,
    pub extended_headers: i16,
    raw: [u8; BINARY_HEADER_LEN],
}

impl BinaryHeader {
    pub fn parse(raw: [u8; BINARY_HEADER_LEN], path: &Path) -> Result<Self> {
        let code = read_u16(&raw, BIN_FORMAT_CODE);
        let format = SampleFormat::from_code(code).ok_or_else(|| {
            Error::malformed(path, format!("unsupported sample format code {code}"))
        })?;
        Ok(BinaryHeader {
            sample_interval_us: read_u16(&raw, BIN_SAMPLE_INTERVAL),
            samples_per_trace: read_u16(&raw, BIN_SAMPLES_PER_TRACE),
            format,
            extended_headers: read_i16(&raw, BIN_EXTENDED_HEADERS),
            raw,
        })
    }

    pub fn raw(&self) -> &[u8; BINARY_HEADER_LEN] {
        &self.raw
    }
}

/// Read and decode the textual header of a SEG-Y file.
pub fn read_text_header(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| Error::from_open(path, e))?;
    let mut raw = vec![0u8; TEXT_HEADER_LEN];
    file.read_exact(&mut raw)
        .map_err(|e| short_read(path, e, "textual header"))?;
    Ok(decode_text_header(&raw))
}

fn short_read(path: &Path, err: std::io::Error, what: &str) -> Error {
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::malformed(path, format!("file ends inside the {what}"))
    } else {
        Error::io(path, err)
    }
}

/// A SEG-Y file loaded into a regular cube.
#[derive(Clone, Debug)]
pub struct SegyCube {
    pub path: PathBuf,
    pub keys: TraceKeys,
    pub text_header: Vec<u8>,
    pub binary_header: BinaryHeader,
    pub volume: Volume,
    /// `n_inlines * n_crosslines * 240` bytes, zero for dead cells.
    pub trace_headers: Vec<u8>,
    /// One flag per (inline, crossline) cell, row-major.
    pub live: Vec<bool>,
}

struct RawTrace {
    inline: i32,
    crossline: i32,
    header: [u8; TRACE_HEADER_LEN],
    samples: Vec<f32>,
}

impl SegyCube {
    /// Read every trace of `path` and arrange them by the given keys.
    pub fn open(path: &Path, keys: TraceKeys) -> Result<Self> {
        let file = File::open(path).map_err(|e| Error::from_open(path, e))?;
        let mut reader = BufReader::new(file);

        let mut text_header = vec![0u8; TEXT_HEADER_LEN];
        reader
            .read_exact(&mut text_header)
            .map_err(|e| short_read(path, e, "textual header"))?;
        let mut bin_raw = [0u8; BINARY_HEADER_LEN];
        reader
            .read_exact(&mut bin_raw)
            .map_err(|e| short_read(path, e, "binary header"))?;
        let binary_header = BinaryHeader::parse(bin_raw, path)?;

        if binary_header.extended_headers < 0 {
            return Err(Error::malformed(
                path,
                "variable number of extended textual headers is not supported",
            ));
        }
        for _ in 0..binary_header.extended_headers {
            let mut skip = vec![0u8; TEXT_HEADER_LEN];
            reader
                .read_exact(&mut skip)
                .map_err(|e| short_read(path, e, "extended textual header"))?;
        }

        let traces = read_traces(&mut reader, path, &binary_header, keys)?;
        let first = traces
            .first()
            .ok_or_else(|| Error::malformed(path, "file contains no traces"))?;
        let n_samples = first.samples.len();

        let interval_us = match binary_header.sample_interval_us {
            0 => read_u16(&first.header, TR_SAMPLE_INTERVAL),
            dt => dt,
        };
        if interval_us == 0 {
            return Err(Error::malformed(path, "sample interval is zero"));
        }
        let delay_ms = read_i16(&first.header, TR_DELAY_MS) as f64;

        let mut inlines: Vec<i32> = traces.iter().map(|t| t.inline).collect();
        inlines.sort_unstable();
        inlines.dedup();
        let mut crosslines: Vec<i32> = traces.iter().map(|t| t.crossline).collect();
        crosslines.sort_unstable();
        crosslines.dedup();

        let geometry = Geometry::new(
            inlines,
            crosslines,
            Geometry::regular_samples(delay_ms, interval_us as f64 / 1000.0, n_samples),
        )?;
        let (n_il, n_xl, _) = geometry.shape();

        let il_pos: HashMap<i32, usize> = geometry
            .inlines
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, i))
            .collect();
        let xl_pos: HashMap<i32, usize> = geometry
            .crosslines
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, i))
            .collect();

        let mut data = Array3::<f32>::zeros((n_il, n_xl, n_samples));
        let mut live = vec![false; n_il * n_xl];
        let mut trace_headers = vec![0u8; n_il * n_xl * TRACE_HEADER_LEN];

        for trace in &traces {
            let i = il_pos[&trace.inline];
            let j = xl_pos[&trace.crossline];
            let cell = i * n_xl + j;
            if live[cell] {
                return Err(Error::malformed(
                    path,
                    format!(
                        "duplicate trace for inline {} crossline {}",
                        trace.inline, trace.crossline
                    ),
                ));
            }
            live[cell] = true;
            for (k, v) in trace.samples.iter().enumerate() {
                data[(i, j, k)] = *v;
            }
            trace_headers[cell * TRACE_HEADER_LEN..(cell + 1) * TRACE_HEADER_LEN]
                .copy_from_slice(&trace.header);
        }

        let stats = VolumeStats::from_values(
            traces.iter().flat_map(|t| t.samples.iter().copied()),
        );
        let volume = Volume::with_stats(geometry, data, stats)?;

        tracing::debug!(
            path = %path.display(),
            traces = traces.len(),
            shape = ?volume.geometry().shape(),
            "loaded SEG-Y cube"
        );

        Ok(SegyCube {
            path: path.to_path_buf(),
            keys,
            text_header,
            binary_header,
            volume,
            trace_headers,
            live,
        })
    }

    /// [`SegyCube::open`] on the blocking thread pool.
    pub async fn open_async(path: PathBuf, keys: TraceKeys) -> Result<Self> {
        let label = path.clone();
        tokio::task::spawn_blocking(move || Self::open(&path, keys))
            .await
            .map_err(|e| Error::io(label, std::io::Error::other(e.to_string())))?
    }

    /// Sample interval in microseconds as used by the cube's time axis.
    pub fn sample_interval_us(&self) -> u16 {
        let g = self.volume.geometry();
        g.sample_interval_ms()
            .map(|ms| (ms * 1000.0).round() as u16)
            .unwrap_or(self.binary_header.sample_interval_us)
    }

    pub fn live_traces(&self) -> usize {
        self.live.iter().filter(|l| **l).count()
    }
}

fn read_traces<R: BufRead>(
    reader: &mut R,
    path: &Path,
    binary: &BinaryHeader,
    keys: TraceKeys,
) -> Result<Vec<RawTrace>> {
    let width = binary.format.bytes_per_sample();
    let mut fixed_samples = binary.samples_per_trace as usize;
    let mut traces = Vec::new();

    loop {
        let at_end = reader.fill_buf().map_err(|e| Error::io(path, e))?.is_empty();
        if at_end {
            break;
        }

        let mut header = [0u8; TRACE_HEADER_LEN];
        reader
            .read_exact(&mut header)
            .map_err(|e| short_read(path, e, "trace header"))?;

        if fixed_samples == 0 {
            fixed_samples = read_u16(&header, TR_SAMPLES) as usize;
            if fixed_samples == 0 {
                return Err(Error::malformed(path, "samples per trace is zero"));
            }
        }

        let mut raw = vec![0u8; fixed_samples * width];
        reader
            .read_exact(&mut raw)
            .map_err(|e| short_read(path, e, "trace data"))?;
        let mut samples = vec![0f32; fixed_samples];
        binary.format.decode(&raw, &mut samples);

        traces.push(RawTrace {
            inline: keys.inline_of(&header),
            crossline: keys.crossline_of(&header),
            header,
            samples,
        });
    }

    Ok(traces)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_keys_validate_byte_range() {
        assert!(TraceKeys::new(189, 193).is_ok());
        assert!(TraceKeys::new(237, 1).is_ok());
        assert!(matches!(TraceKeys::new(0, 193), Err(Error::InvalidInput(_))));
        assert!(matches!(TraceKeys::new(189, 238), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn trace_keys_read_big_endian_words() {
        let keys = TraceKeys::default();
        let mut header = [0u8; TRACE_HEADER_LEN];
        header[188..192].copy_from_slice(&1234i32.to_be_bytes());
        header[192..196].copy_from_slice(&(-7i32).to_be_bytes());
        assert_eq!(keys.inline_of(&header), 1234);
        assert_eq!(keys.crossline_of(&header), -7);
    }

    #[test]
    fn missing_file_is_file_not_found() {
        let err = read_text_header(Path::new("/definitely/not/here.sgy")).unwrap_err();
        assert!(matches!(err, Error::FileNotFound(_)));
    }
}
