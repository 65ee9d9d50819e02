use serde::{Deserialize, Serialize};

/// Amplitude statistics of a volume, computed once at load/convert time.
///
/// `std` is the population standard deviation; the renderer uses it to set a
/// consistent colour range across figures of the same volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct VolumeStats {
    pub count: u64,
    pub mean: f64,
    pub std: f64,
    pub rms: f64,
    pub min: f64,
    pub max: f64,
}

impl VolumeStats {
    /// Single pass (Welford) over the given amplitudes.
    ///
    /// An empty input yields all-zero statistics.
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        let mut count = 0u64;
        let mut mean = 0.0f64;
        let mut m2 = 0.0f64;
        let mut sum_sq = 0.0f64;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;

        for v in values {
            let x = v as f64;
            count += 1;
            let delta = x - mean;
            mean += delta / count as f64;
            m2 += delta * (x - mean);
            sum_sq += x * x;
            min = min.min(x);
            max = max.max(x);
        }

        if count == 0 {
            return VolumeStats {
                count: 0,
                mean: 0.0,
                std: 0.0,
                rms: 0.0,
                min: 0.0,
                max: 0.0,
            };
        }

        let n = count as f64;
        VolumeStats {
            count,
            mean,
            std: (m2 / n).sqrt(),
            rms: (sum_sq / n).sqrt(),
            min,
            max,
        }
    }

    /// Symmetric colour range `(-clip*std, clip*std)`.
    pub fn display_range(&self, clip: f64) -> (f64, f64) {
        (-clip * self.std, clip * self.std)
    }
}
