//! Piecewise-linear colormaps for seismic displays (`gray_r` and `seismic`).

use image::Rgb;
use palette::Srgb;

/// Colour scale used when rasterising amplitudes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Colormap {
    /// White (low) to black (high).
    GrayR,
    /// Dark blue, blue, white, red, dark red.
    Seismic,
}

const GRAY_R: &[(f32, [f32; 3])] = &[(0.0, [1.0, 1.0, 1.0]), (1.0, [0.0, 0.0, 0.0])];

const SEISMIC: &[(f32, [f32; 3])] = &[
    (0.0, [0.0, 0.0, 0.3]),
    (0.25, [0.0, 0.0, 1.0]),
    (0.5, [1.0, 1.0, 1.0]),
    (0.75, [1.0, 0.0, 0.0]),
    (1.0, [0.5, 0.0, 0.0]),
];

impl Colormap {
    fn stops(self) -> &'static [(f32, [f32; 3])] {
        match self {
            Colormap::GrayR => GRAY_R,
            Colormap::Seismic => SEISMIC,
        }
    }

    /// Colour at normalised position `t`, clamped to `[0, 1]`.
    pub fn at(self, t: f64) -> Rgb<u8> {
        let t = if t.is_nan() { 0.5 } else { t.clamp(0.0, 1.0) as f32 };
        let stops = self.stops();
        let upper = stops
            .iter()
            .position(|(pos, _)| *pos >= t)
            .unwrap_or(stops.len() - 1)
            .max(1);
        let (p0, c0) = stops[upper - 1];
        let (p1, c1) = stops[upper];
        let f = if p1 > p0 { (t - p0) / (p1 - p0) } else { 0.0 };
        let lerp = |a: f32, b: f32| a + (b - a) * f;
        let rgb: Srgb<u8> =
            Srgb::new(lerp(c0[0], c1[0]), lerp(c0[1], c1[1]), lerp(c0[2], c1[2])).into_format();
        Rgb([rgb.red, rgb.green, rgb.blue])
    }

    /// Colour of `value` on the range `[vmin, vmax]`. A degenerate range maps to the midpoint.
    pub fn map(self, value: f64, vmin: f64, vmax: f64) -> Rgb<u8> {
        let span = vmax - vmin;
        if !(span.is_finite() && span > 0.0) {
            return self.at(0.5);
        }
        self.at((value - vmin) / span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gray_r_runs_white_to_black() {
        assert_eq!(Colormap::GrayR.at(0.0), Rgb([255, 255, 255]));
        assert_eq!(Colormap::GrayR.at(1.0), Rgb([0, 0, 0]));
        assert_eq!(Colormap::GrayR.map(10.0, -1.0, 1.0), Rgb([0, 0, 0]));
    }

    #[test]
    fn seismic_stops() {
        assert_eq!(Colormap::Seismic.at(0.5), Rgb([255, 255, 255]));
        assert_eq!(Colormap::Seismic.at(0.25), Rgb([0, 0, 255]));
        assert_eq!(Colormap::Seismic.at(0.75), Rgb([255, 0, 0]));
        assert_eq!(Colormap::Seismic.map(-5.0, -1.0, 1.0), Colormap::Seismic.at(0.0));
    }

    #[test]
    fn degenerate_range_is_midpoint() {
        assert_eq!(Colormap::Seismic.map(3.0, 0.0, 0.0), Rgb([255, 255, 255]));
    }
}
