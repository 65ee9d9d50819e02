//! SEG-Y output: always IEEE float (format 5), fixed trace length.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::{
    SampleFormat, TraceKeys, BINARY_HEADER_LEN, TEXT_HEADER_LEN, TRACE_HEADER_LEN, TR_DELAY_MS,
    TR_SAMPLES, TR_SAMPLE_INTERVAL,
};
use crate::error::{Error, Result};
use crate::utils::fsio::{ensure_dir, partial_path};

/// Streaming writer that stages output under `.<name>.partial`.
///
/// Nothing appears at the target path until [`SegyWriter::finish`]; dropping
/// an unfinished writer removes the staging file.
pub struct SegyWriter {
    target: PathBuf,
    staged: PathBuf,
    out: Option<BufWriter<File>>,
    samples_per_trace: usize,
    written: usize,
    committed: bool,
}

impl SegyWriter {
    /// Start a file with the given textual and binary headers.
    ///
    /// The binary header is copied and patched with the sample interval, trace
    /// length and format code 5.
    pub fn create(
        target: &Path,
        text_header: &[u8],
        binary_header: &[u8; BINARY_HEADER_LEN],
        sample_interval_us: u16,
        samples_per_trace: usize,
    ) -> Result<Self> {
        if text_header.len() != TEXT_HEADER_LEN {
            return Err(Error::invalid(format!(
                "textual header must be {TEXT_HEADER_LEN} bytes, got {}",
                text_header.len()
            )));
        }
        let ns = u16::try_from(samples_per_trace).map_err(|_| {
            Error::invalid(format!("{samples_per_trace} samples do not fit a SEG-Y trace"))
        })?;
        if ns == 0 {
            return Err(Error::invalid("traces must have at least one sample"));
        }

        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        let staged = partial_path(target);
        let file = File::create(&staged).map_err(|e| Error::io(&staged, e))?;
        let mut writer = SegyWriter {
            target: target.to_path_buf(),
            staged,
            out: Some(BufWriter::new(file)),
            samples_per_trace,
            written: 0,
            committed: false,
        };

        let mut binary = *binary_header;
        patch_binary_header(&mut binary, sample_interval_us, ns, SampleFormat::IeeeFloat32);
        writer.put(text_header)?;
        writer.put(&binary)?;
        Ok(writer)
    }

    /// Append one trace. The header is written as given.
    pub fn write_trace(&mut self, header: &[u8; TRACE_HEADER_LEN], samples: &[f32]) -> Result<()> {
        if samples.len() != self.samples_per_trace {
            return Err(Error::invalid(format!(
                "trace has {} samples, expected {}",
                samples.len(),
                self.samples_per_trace
            )));
        }
        self.put(header)?;
        let mut raw = Vec::with_capacity(samples.len() * 4);
        for v in samples {
            raw.extend_from_slice(&v.to_be_bytes());
        }
        self.put(&raw)?;
        self.written += 1;
        Ok(())
    }

    pub fn traces_written(&self) -> usize {
        self.written
    }

    /// Flush and move the file into place. Returns the number of traces.
    ///
    /// On failure the staging file is removed and the target is untouched.
    pub fn finish(mut self) -> Result<usize> {
        if let Some(mut out) = self.out.take() {
            out.flush().map_err(|e| Error::io(&self.staged, e))?;
            out.get_ref()
                .sync_all()
                .map_err(|e| Error::io(&self.staged, e))?;
        }
        std::fs::rename(&self.staged, &self.target).map_err(|e| Error::io(&self.target, e))?;
        self.committed = true;
        tracing::debug!(path = %self.target.display(), traces = self.written, "wrote SEG-Y");
        Ok(self.written)
    }

    fn put(&mut self, bytes: &[u8]) -> Result<()> {
        match self.out.as_mut() {
            Some(out) => out.write_all(bytes).map_err(|e| Error::io(&self.staged, e)),
            None => Err(Error::invalid("writer already finished")),
        }
    }
}

impl Drop for SegyWriter {
    fn drop(&mut self) {
        // close the handle before unlinking
        drop(self.out.take());
        if !self.committed {
            let _ = std::fs::remove_file(&self.staged);
        }
    }
}

/// Write a whole file in one go: headers plus `(trace header, samples)` pairs.
pub fn write_segy<'a, I>(
    target: &Path,
    text_header: &[u8],
    binary_header: &[u8; BINARY_HEADER_LEN],
    sample_interval_us: u16,
    samples_per_trace: usize,
    traces: I,
) -> Result<usize>
where
    I: IntoIterator<Item = (&'a [u8; TRACE_HEADER_LEN], &'a [f32])>,
{
    let mut writer = SegyWriter::create(
        target,
        text_header,
        binary_header,
        sample_interval_us,
        samples_per_trace,
    )?;
    for (header, samples) in traces {
        writer.write_trace(header, samples)?;
    }
    writer.finish()
}

fn patch_binary_header(raw: &mut [u8; BINARY_HEADER_LEN], interval_us: u16, ns: u16, format: SampleFormat) {
    raw[16..18].copy_from_slice(&interval_us.to_be_bytes());
    raw[20..22].copy_from_slice(&ns.to_be_bytes());
    raw[24..26].copy_from_slice(&format.code().to_be_bytes());
    // no extended textual headers are written
    raw[304..306].copy_from_slice(&0i16.to_be_bytes());
}

/// Fresh binary header with the fields the reader needs.
pub fn build_binary_header(
    sample_interval_us: u16,
    samples_per_trace: u16,
    format: SampleFormat,
) -> [u8; BINARY_HEADER_LEN] {
    let mut raw = [0u8; BINARY_HEADER_LEN];
    patch_binary_header(&mut raw, sample_interval_us, samples_per_trace, format);
    raw
}

/// Minimal trace header carrying the line numbers at `keys` plus timing fields.
pub fn build_trace_header(
    keys: TraceKeys,
    inline: i32,
    crossline: i32,
    delay_ms: i16,
    samples_per_trace: u16,
    sample_interval_us: u16,
    sequence: i32,
) -> [u8; TRACE_HEADER_LEN] {
    let mut raw = [0u8; TRACE_HEADER_LEN];
    raw[0..4].copy_from_slice(&sequence.to_be_bytes());
    raw[TR_DELAY_MS..TR_DELAY_MS + 2].copy_from_slice(&delay_ms.to_be_bytes());
    raw[TR_SAMPLES..TR_SAMPLES + 2].copy_from_slice(&samples_per_trace.to_be_bytes());
    raw[TR_SAMPLE_INTERVAL..TR_SAMPLE_INTERVAL + 2]
        .copy_from_slice(&sample_interval_us.to_be_bytes());
    let il = keys.inline_byte - 1;
    raw[il..il + 4].copy_from_slice(&inline.to_be_bytes());
    let xl = keys.crossline_byte - 1;
    raw[xl..xl + 4].copy_from_slice(&crossline.to_be_bytes());
    raw
}
