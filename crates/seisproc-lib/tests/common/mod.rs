#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use seisproc::segy::{
    ascii_text_header, build_binary_header, build_trace_header, SampleFormat, SegyWriter,
    TraceKeys,
};

/// Fresh directory under the OS temp dir, unique per call.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or_default();
    let dir = std::env::temp_dir().join(format!("seisproc_it_{tag}_{stamp}"));
    std::fs::create_dir_all(&dir).expect("create scratch dir");
    dir
}

/// Deterministic amplitude for cell (inline, crossline) at sample `k`.
pub fn amplitude(inline: i32, crossline: i32, k: usize) -> f32 {
    let phase = inline as f32 * 0.37 + crossline as f32 * 0.11;
    (k as f32 * 0.8 + phase).sin() * (1.0 + (crossline % 3) as f32)
}

/// Synthetic survey description.
pub struct Survey {
    pub inlines: Vec<i32>,
    pub crosslines: Vec<i32>,
    pub samples: usize,
    pub interval_us: u16,
    pub delay_ms: i16,
    /// Cells left out of the file.
    pub missing: Vec<(i32, i32)>,
    pub keys: TraceKeys,
}

impl Default for Survey {
    fn default() -> Self {
        Survey {
            inlines: vec![100, 101, 102],
            crosslines: vec![200, 201],
            samples: 16,
            interval_us: 4000,
            delay_ms: 0,
            missing: Vec::new(),
            keys: TraceKeys::default(),
        }
    }
}

impl Survey {
    /// Write the survey as a SEG-Y file, crossline-major to exercise sorting.
    pub fn write(&self, path: &Path) -> usize {
        let text = ascii_text_header(&["C 1 SYNTHETIC SURVEY", "C 2 SEISPROC TEST DATA"]);
        let ns = self.samples as u16;
        let binary = build_binary_header(self.interval_us, ns, SampleFormat::IeeeFloat32);
        let mut writer = SegyWriter::create(path, &text, &binary, self.interval_us, self.samples)
            .expect("create SEG-Y");
        let mut seq = 0;
        for &xl in &self.crosslines {
            for &il in &self.inlines {
                if self.missing.contains(&(il, xl)) {
                    continue;
                }
                seq += 1;
                let header = build_trace_header(
                    self.keys,
                    il,
                    xl,
                    self.delay_ms,
                    ns,
                    self.interval_us,
                    seq,
                );
                let samples: Vec<f32> = (0..self.samples).map(|k| amplitude(il, xl, k)).collect();
                writer.write_trace(&header, &samples).expect("write trace");
            }
        }
        writer.finish().expect("finish SEG-Y")
    }
}
