use std::fmt;

use crate::model::LineType;

/// Structured identity of a figure; the file name is derived from it.
#[derive(Clone, Debug, PartialEq)]
pub enum FigureName {
    LineSpectrum { line: LineType, number: i32 },
    CubeSpectrum,
    Section { line: LineType, number: i32 },
    TimeMap { time_ms: f64 },
    SvdDenoise { line: LineType, number: i32, cutoff_ratio: f64 },
    MedianDenoise { line: LineType, number: i32, size: (usize, usize) },
    GaussianDenoise { line: LineType, number: i32, sigma: f64 },
}

impl FigureName {
    pub fn file_name(&self) -> String {
        match self {
            FigureName::LineSpectrum { line, number } => {
                format!("Frequency_Spectrum_{}_{number}.jpg", line.title())
            }
            FigureName::CubeSpectrum => "Frequency_Spectrum_3D.jpg".to_string(),
            FigureName::Section { line, number } => format!("{}_{number}.jpg", line.as_str()),
            FigureName::TimeMap { time_ms } => {
                format!("Two-way-time_{}ms.jpg", format_time(*time_ms))
            }
            FigureName::SvdDenoise {
                line,
                number,
                cutoff_ratio,
            } => format!("denoised_svd_{line}_{number}_{cutoff_ratio:?}.jpg"),
            FigureName::MedianDenoise {
                line,
                number,
                size: (rows, cols),
            } => format!("denoised_median_{line}_{number}_{rows}x{cols}.jpg"),
            FigureName::GaussianDenoise {
                line,
                number,
                sigma,
            } => format!("denoised_gaussian_{line}_{number}_{sigma:?}.jpg"),
        }
    }
}

impl fmt::Display for FigureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Whole milliseconds print without a fraction (`100`), others as-is (`100.5`).
fn format_time(time_ms: f64) -> String {
    if time_ms.fract() == 0.0 && time_ms.abs() < 1e15 {
        format!("{}", time_ms as i64)
    } else {
        format!("{time_ms}")
    }
}
