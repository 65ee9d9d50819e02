/*!
Amplitude spectra of seismic traces.

A section is reduced to its mean trace, transformed with a length-N DFT
normalised by N, and truncated to the first ⌊N/2⌋ bins. The complex
half-spectrum is then smoothed with a centred moving average whose output has
the same length as its input (zero padding at both ends), and the magnitude of
the smoothed spectrum is what gets plotted.

The sample rate is always supplied by the caller; nothing here assumes a
particular acquisition interval.
*/

use ndarray::Array1;
use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

use crate::error::{Error, Result};
use crate::model::Slice;

/// Default moving-average window for spectrum smoothing.
pub const DEFAULT_SMOOTHING_WINDOW: usize = 10;

/// Parameters of the spectral analysis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpectrumConfig {
    pub sample_rate_hz: f64,
    pub smoothing_window: usize,
}

impl SpectrumConfig {
    pub fn new(sample_rate_hz: f64) -> Self {
        SpectrumConfig {
            sample_rate_hz,
            smoothing_window: DEFAULT_SMOOTHING_WINDOW,
        }
    }

    /// `Fs = 1000 / interval_ms`.
    pub fn from_interval_ms(interval_ms: f64) -> Result<Self> {
        if !interval_ms.is_finite() || interval_ms <= 0.0 {
            return Err(Error::invalid(format!(
                "sample interval must be positive, got {interval_ms} ms"
            )));
        }
        Ok(Self::new(1000.0 / interval_ms))
    }

    pub fn with_smoothing_window(mut self, window: usize) -> Self {
        self.smoothing_window = window;
        self
    }

    fn validate(&self) -> Result<()> {
        if !self.sample_rate_hz.is_finite() || self.sample_rate_hz <= 0.0 {
            return Err(Error::invalid(format!(
                "sample rate must be positive and finite, got {}",
                self.sample_rate_hz
            )));
        }
        if self.smoothing_window == 0 {
            return Err(Error::invalid("smoothing window must be at least 1"));
        }
        Ok(())
    }
}

/// Half-spectrum of a trace.
#[derive(Clone, Debug)]
pub struct Spectrum {
    /// Bin frequencies in Hz, `k * Fs / N`.
    pub frequencies: Array1<f64>,
    /// `FFT(trace) / N`, first ⌊N/2⌋ bins.
    pub raw: Array1<Complex64>,
    /// `raw` after the moving average.
    pub smoothed: Array1<Complex64>,
}

impl Spectrum {
    /// Display amplitudes, `|smoothed|`.
    pub fn amplitudes(&self) -> Array1<f64> {
        self.smoothed.mapv(|c| c.norm())
    }

    pub fn raw_amplitudes(&self) -> Array1<f64> {
        self.raw.mapv(|c| c.norm())
    }

    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }
}

/// Amplitude spectrum of a single trace.
///
/// # Arguments
///
/// * `trace` - samples along the time axis
/// * `config` - sample rate and smoothing window
///
/// # Returns
///
/// A [`Spectrum`] whose three arrays all have length ⌊N/2⌋.
///
/// # Errors
///
/// [`Error::InvalidInput`] for traces shorter than two samples or an invalid
/// configuration.
pub fn amplitude_spectrum(trace: &[f64], config: &SpectrumConfig) -> Result<Spectrum> {
    config.validate()?;
    let n = trace.len();
    if n < 2 {
        return Err(Error::invalid(format!(
            "trace must have at least 2 samples, got {n}"
        )));
    }

    let mut buffer: Vec<Complex64> = trace.iter().map(|&x| Complex64::new(x, 0.0)).collect();
    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    let half = n / 2;
    let scale = 1.0 / n as f64;
    let raw: Array1<Complex64> = buffer[..half].iter().map(|c| *c * scale).collect();
    let frequencies = Array1::from_shape_fn(half, |k| k as f64 * config.sample_rate_hz / n as f64);
    let smoothed = moving_average_same(raw.as_slice().unwrap_or(&[]), config.smoothing_window);

    Ok(Spectrum {
        frequencies,
        raw,
        smoothed: Array1::from(smoothed),
    })
}

/// Spectrum of the mean trace of `slice`.
pub fn slice_spectrum(slice: &Slice, config: &SpectrumConfig) -> Result<Spectrum> {
    let trace = slice.mean_trace()?;
    amplitude_spectrum(&trace.to_vec(), config)
}

/// Centred moving average with zero padding, same length as the input.
///
/// Output `i` averages inputs `i + (w-1)/2 - (w-1) ..= i + (w-1)/2`; for an
/// even window the extra sample falls on the left.
pub fn moving_average_same<T>(input: &[T], window: usize) -> Vec<T>
where
    T: Copy + Default + std::ops::Add<Output = T> + std::ops::Mul<f64, Output = T>,
{
    let n = input.len();
    if window == 0 || n == 0 {
        return input.to_vec();
    }
    let w = window as isize;
    let lead = (w - 1) / 2;
    let inv = 1.0 / window as f64;

    (0..n as isize)
        .map(|i| {
            let hi = (i + lead).min(n as isize - 1);
            let lo = (i + lead - (w - 1)).max(0);
            let mut acc = T::default();
            let mut j = lo;
            while j <= hi {
                acc = acc + input[j as usize];
                j += 1;
            }
            acc * inv
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn moving_average_matches_numpy_same_mode() {
        // np.convolve([1,2,3,4,5], ones(2)/2, 'same') == [0.5, 1.5, 2.5, 3.5, 4.5]
        let out = moving_average_same(&[1.0, 2.0, 3.0, 4.0, 5.0], 2);
        let expected = [0.5, 1.5, 2.5, 3.5, 4.5];
        assert!(out.iter().zip(expected).all(|(a, b)| approx(*a, b)));

        // odd window: [1,2,3,4,5] with ones(3)/3 -> [1, 2, 3, 4, 3]
        let out = moving_average_same(&[1.0, 2.0, 3.0, 4.0, 5.0], 3);
        let expected = [1.0, 2.0, 3.0, 4.0, 3.0];
        assert!(out.iter().zip(expected).all(|(a, b)| approx(*a, b)));
    }

    #[test]
    fn window_wider_than_signal_keeps_length() {
        let out = moving_average_same(&[1.0, 1.0, 1.0], 10);
        assert_eq!(out.len(), 3);
        // each output sees all three ones: 3/10
        assert!(out.iter().all(|v| approx(*v, 0.3)));
    }

    #[test]
    fn spectrum_lengths_and_dc_bin() {
        let trace = [1.0, 3.0, -2.0, 4.0, 0.5, 1.5, 2.0];
        let cfg = SpectrumConfig::from_interval_ms(4.0).unwrap();
        let spec = amplitude_spectrum(&trace, &cfg).unwrap();
        assert_eq!(spec.len(), 3);
        assert_eq!(spec.raw.len(), 3);
        assert_eq!(spec.smoothed.len(), 3);
        let mean = trace.iter().sum::<f64>() / trace.len() as f64;
        assert!(approx(spec.raw_amplitudes()[0], mean.abs()));
        assert!(approx(spec.frequencies[1], 250.0 / 7.0));
    }

    #[test]
    fn pure_tone_peaks_at_its_frequency() {
        let n = 64;
        let fs = 250.0;
        let f0 = fs * 8.0 / n as f64;
        let trace: Vec<f64> = (0..n)
            .map(|i| (2.0 * std::f64::consts::PI * f0 * i as f64 / fs).cos())
            .collect();
        let cfg = SpectrumConfig::new(fs).with_smoothing_window(1);
        let spec = amplitude_spectrum(&trace, &cfg).unwrap();
        let amps = spec.amplitudes();
        let peak = amps
            .iter()
            .enumerate()
            .fold((0, 0.0), |best, (k, a)| if *a > best.1 { (k, *a) } else { best });
        assert_eq!(peak.0, 8);
        assert!(approx(peak.1, 0.5));
    }

    #[test]
    fn short_traces_and_bad_rates_are_rejected() {
        let cfg = SpectrumConfig::new(250.0);
        assert!(matches!(amplitude_spectrum(&[], &cfg), Err(Error::InvalidInput(_))));
        assert!(matches!(amplitude_spectrum(&[1.0], &cfg), Err(Error::InvalidInput(_))));
        let bad = SpectrumConfig::new(0.0);
        assert!(matches!(amplitude_spectrum(&[1.0, 2.0], &bad), Err(Error::InvalidInput(_))));
        assert!(SpectrumConfig::from_interval_ms(-4.0).is_err());
    }
}
