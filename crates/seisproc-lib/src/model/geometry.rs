use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Coordinate vectors of a 3D survey: inline numbers, crossline numbers and
/// two-way time of every sample in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub inlines: Vec<i32>,
    pub crosslines: Vec<i32>,
    pub samples_ms: Vec<f64>,
}

impl Geometry {
    /// Build a geometry, rejecting empty or duplicated axes.
    pub fn new(inlines: Vec<i32>, crosslines: Vec<i32>, samples_ms: Vec<f64>) -> Result<Self> {
        if inlines.is_empty() || crosslines.is_empty() || samples_ms.is_empty() {
            return Err(Error::invalid(format!(
                "geometry axes must be non-empty (inlines={}, crosslines={}, samples={})",
                inlines.len(),
                crosslines.len(),
                samples_ms.len()
            )));
        }
        ensure_unique("inline", &inlines)?;
        ensure_unique("crossline", &crosslines)?;
        if samples_ms.iter().any(|t| !t.is_finite()) {
            return Err(Error::invalid("sample times must be finite"));
        }
        if samples_ms.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::invalid("sample times must be strictly increasing"));
        }
        Ok(Geometry {
            inlines,
            crosslines,
            samples_ms,
        })
    }

    /// Evenly sampled time axis `start_ms + k * interval_ms`.
    pub fn regular_samples(start_ms: f64, interval_ms: f64, count: usize) -> Vec<f64> {
        (0..count).map(|k| start_ms + k as f64 * interval_ms).collect()
    }

    /// `(n_inlines, n_crosslines, n_samples)`.
    pub fn shape(&self) -> (usize, usize, usize) {
        (
            self.inlines.len(),
            self.crosslines.len(),
            self.samples_ms.len(),
        )
    }

    pub fn inline_index(&self, inline: i32) -> Result<usize> {
        exact_index(&self.inlines, &inline, "inline")
    }

    pub fn crossline_index(&self, crossline: i32) -> Result<usize> {
        exact_index(&self.crosslines, &crossline, "crossline")
    }

    /// Index of the sample whose time equals `time_ms` exactly.
    pub fn sample_index(&self, time_ms: f64) -> Result<usize> {
        exact_index(&self.samples_ms, &time_ms, "time")
    }

    /// Spacing between the first two samples, if there are at least two.
    pub fn sample_interval_ms(&self) -> Option<f64> {
        match self.samples_ms.as_slice() {
            [first, second, ..] => Some(second - first),
            _ => None,
        }
    }
}

fn ensure_unique(axis: &str, coords: &[i32]) -> Result<()> {
    let mut sorted = coords.to_vec();
    sorted.sort_unstable();
    if let Some(w) = sorted.windows(2).find(|w| w[0] == w[1]) {
        return Err(Error::invalid(format!("duplicate {axis} coordinate {}", w[0])));
    }
    Ok(())
}

fn exact_index<T>(coords: &[T], value: &T, axis: &'static str) -> Result<usize>
where
    T: PartialEq + fmt::Display,
{
    coords
        .iter()
        .position(|c| c == value)
        .ok_or_else(|| Error::CoordinateNotFound {
            axis,
            value: value.to_string(),
        })
}

/// Which horizontal axis a 2D section is taken along.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Inline,
    Crossline,
}

impl LineType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inline => "inline",
            Self::Crossline => "crossline",
        }
    }

    /// Capitalised form used in titles and some file names.
    pub fn title(self) -> &'static str {
        match self {
            Self::Inline => "Inline",
            Self::Crossline => "Crossline",
        }
    }
}

impl fmt::Display for LineType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LineType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "crossline" => Ok(Self::Crossline),
            other => Err(Error::invalid(format!(
                "unsupported line_type '{other}'; expected \"inline\" or \"crossline\""
            ))),
        }
    }
}

/// The fixed line of a section together with the coordinates of the traces
/// it contains (the complementary horizontal axis).
#[derive(Clone, Debug, PartialEq)]
pub enum SliceAxis {
    Inline { number: i32, crosslines: Vec<i32> },
    Crossline { number: i32, inlines: Vec<i32> },
}

impl SliceAxis {
    /// Section at `number` along `line`, with trace coordinates taken from `geometry`.
    pub fn new(line: LineType, number: i32, geometry: &Geometry) -> Self {
        match line {
            LineType::Inline => Self::Inline {
                number,
                crosslines: geometry.crosslines.clone(),
            },
            LineType::Crossline => Self::Crossline {
                number,
                inlines: geometry.inlines.clone(),
            },
        }
    }

    pub fn line_type(&self) -> LineType {
        match self {
            Self::Inline { .. } => LineType::Inline,
            Self::Crossline { .. } => LineType::Crossline,
        }
    }

    pub fn number(&self) -> i32 {
        match self {
            Self::Inline { number, .. } | Self::Crossline { number, .. } => *number,
        }
    }

    /// Coordinates along the trace (horizontal) axis of the section.
    pub fn trace_coords(&self) -> &[i32] {
        match self {
            Self::Inline { crosslines, .. } => crosslines,
            Self::Crossline { inlines, .. } => inlines,
        }
    }

    pub fn trace_axis_label(&self) -> &'static str {
        match self {
            Self::Inline { .. } => "Crossline Number",
            Self::Crossline { .. } => "Inline Number",
        }
    }

    /// e.g. `Inline 101`.
    pub fn title(&self) -> String {
        format!("{} {}", self.line_type().title(), self.number())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geom() -> Geometry {
        Geometry::new(
            vec![100, 101, 102],
            vec![200, 201],
            Geometry::regular_samples(0.0, 4.0, 4),
        )
        .expect("valid geometry")
    }

    #[test]
    fn exact_lookup_returns_unique_index() {
        let g = geom();
        assert_eq!(g.inline_index(101).unwrap(), 1);
        assert_eq!(g.crossline_index(200).unwrap(), 0);
        assert_eq!(g.sample_index(12.0).unwrap(), 3);
    }

    #[test]
    fn missing_coordinates_are_not_rounded() {
        let g = geom();
        assert!(matches!(
            g.inline_index(103),
            Err(Error::CoordinateNotFound { axis: "inline", .. })
        ));
        assert!(matches!(
            g.sample_index(5.0),
            Err(Error::CoordinateNotFound { axis: "time", .. })
        ));
    }

    #[test]
    fn duplicate_axis_values_are_rejected() {
        let err = Geometry::new(vec![1, 1], vec![2], vec![0.0]).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn line_type_parsing() {
        assert_eq!("Inline".parse::<LineType>().unwrap(), LineType::Inline);
        assert_eq!(" crossline ".parse::<LineType>().unwrap(), LineType::Crossline);
        assert!(matches!("time".parse::<LineType>(), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn slice_axis_carries_complementary_coords() {
        let g = geom();
        let il = SliceAxis::new(LineType::Inline, 101, &g);
        assert_eq!(il.trace_coords(), &[200, 201]);
        assert_eq!(il.trace_axis_label(), "Crossline Number");
        let xl = SliceAxis::new(LineType::Crossline, 201, &g);
        assert_eq!(xl.trace_coords(), &[100, 101, 102]);
        assert_eq!(xl.title(), "Crossline 201");
    }
}
