/*!
Denoising filters for 2D sections.

Three independent filters share one entry point, [`Filter::apply`]:

- SVD truncation: keep singular components at or above `cutoff_ratio` times
  the largest singular value
- median: rank filter over a rectangular window
- Gaussian: separable smoothing truncated at 4σ

Every result carries the input, the filtered output and their difference,
computed as one subtraction per element so `original - denoised == residual`
holds exactly.
*/

pub mod boundary;
mod gaussian;
mod median;
mod svd;

use ndarray::Array2;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::model::Slice;

pub const DEFAULT_CUTOFF_RATIO: f64 = 0.5;
pub const DEFAULT_MEDIAN_SIZE: (usize, usize) = (2, 2);
pub const DEFAULT_GAUSSIAN_SIGMA: f64 = 1.0;

/// Largest Gaussian radius accepted, in multiples of the longer section axis.
const MAX_RADIUS_PER_SAMPLE: f64 = 4.0;

/// A denoising filter and its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "filter", rename_all = "snake_case")]
pub enum Filter {
    SvdCutoff { cutoff_ratio: f64 },
    Median { size: (usize, usize) },
    Gaussian { sigma: f64 },
}

/// What was applied, for logs and tool output.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DenoiseReport {
    pub filter: Filter,
    /// Non-zero singular values after truncation (SVD only).
    pub retained: Option<usize>,
    /// `min(rows, cols)` (SVD only).
    pub total: Option<usize>,
}

/// Input, output and residual of one filter run. All three share a shape.
#[derive(Clone, Debug)]
pub struct DenoiseResult {
    pub original: Array2<f64>,
    pub denoised: Array2<f64>,
    pub residual: Array2<f64>,
    pub report: DenoiseReport,
}

impl Filter {
    pub fn name(&self) -> &'static str {
        match self {
            Filter::SvdCutoff { .. } => "svd",
            Filter::Median { .. } => "median",
            Filter::Gaussian { .. } => "gaussian",
        }
    }

    /// Reject parameters outside the filter's domain.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Filter::SvdCutoff { cutoff_ratio } => {
                if !(0.0..=1.0).contains(&cutoff_ratio) {
                    return Err(Error::invalid(format!(
                        "cutoff_ratio must be within [0, 1], got {cutoff_ratio}"
                    )));
                }
            }
            Filter::Median { size: (rows, cols) } => {
                if rows == 0 || cols == 0 {
                    return Err(Error::invalid(format!(
                        "median window must be at least 1x1, got {rows}x{cols}"
                    )));
                }
            }
            Filter::Gaussian { sigma } => {
                if !sigma.is_finite() || sigma < 0.0 {
                    return Err(Error::invalid(format!(
                        "sigma must be finite and non-negative, got {sigma}"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Reject parameters too large for a `(rows, cols)` section: median
    /// windows bigger than the section and Gaussian kernels wider than
    /// `4 * max(rows, cols)` samples either side.
    pub fn check_shape(&self, (rows, cols): (usize, usize)) -> Result<()> {
        match *self {
            Filter::SvdCutoff { .. } => Ok(()),
            Filter::Median {
                size: (w_rows, w_cols),
            } => {
                if w_rows > rows || w_cols > cols {
                    return Err(Error::invalid(format!(
                        "median window {w_rows}x{w_cols} exceeds the {rows}x{cols} section"
                    )));
                }
                Ok(())
            }
            Filter::Gaussian { sigma } => {
                let limit = MAX_RADIUS_PER_SAMPLE * rows.max(cols) as f64;
                let radius = gaussian::radius(sigma);
                if radius > limit {
                    return Err(Error::invalid(format!(
                        "sigma {sigma} needs a {radius}-sample kernel radius, more than the \
                         {limit} allowed for a {rows}x{cols} section"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Run the filter over a `(traces, samples)` array.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidInput`] for bad parameters, parameters too large for
    /// the array (see [`Filter::check_shape`]), an empty array or non-finite
    /// samples.
    pub fn apply(&self, data: &Array2<f64>) -> Result<DenoiseResult> {
        self.validate()?;
        if data.is_empty() {
            return Err(Error::invalid("cannot denoise an empty slice"));
        }
        self.check_shape(data.dim())?;
        if data.iter().any(|v| !v.is_finite()) {
            return Err(Error::invalid("slice contains non-finite samples"));
        }

        let (denoised, retained, total) = match *self {
            Filter::SvdCutoff { cutoff_ratio } => {
                let t = svd::truncate(data, cutoff_ratio)?;
                (t.data, Some(t.retained), Some(t.total))
            }
            Filter::Median { size } => (median::median_filter(data, size)?, None, None),
            Filter::Gaussian { sigma } => (gaussian::gaussian_filter(data, sigma), None, None),
        };

        let residual = data - &denoised;
        tracing::debug!(filter = self.name(), shape = ?data.dim(), "denoised section");
        Ok(DenoiseResult {
            original: data.clone(),
            denoised,
            residual,
            report: DenoiseReport {
                filter: *self,
                retained,
                total,
            },
        })
    }
}

/// [`Filter::apply`] on the data of a section.
pub fn denoise_slice(slice: &Slice, filter: Filter) -> Result<DenoiseResult> {
    filter.apply(&slice.data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn noisy(rows: usize, cols: usize, seed: u64) -> Array2<f64> {
        let mut rng = StdRng::seed_from_u64(seed);
        Array2::from_shape_fn((rows, cols), |(i, j)| {
            (i as f64 * 0.3).sin() * (j as f64 * 0.2).cos() + rng.gen_range(-0.1..0.1)
        })
    }

    #[test]
    fn residual_is_exact_difference_for_every_filter() {
        let data = noisy(12, 20, 7);
        for filter in [
            Filter::SvdCutoff { cutoff_ratio: 0.3 },
            Filter::Median { size: (3, 2) },
            Filter::Gaussian { sigma: 1.2 },
        ] {
            let r = filter.apply(&data).unwrap();
            assert_eq!(r.denoised.dim(), data.dim());
            for ((o, d), res) in r.original.iter().zip(r.denoised.iter()).zip(r.residual.iter()) {
                assert_eq!(o - d, *res);
            }
        }
    }

    #[test]
    fn svd_retained_count_shrinks_with_cutoff() {
        let data = noisy(10, 16, 11);
        let mut previous = usize::MAX;
        for step in 0..=10 {
            let ratio = step as f64 / 10.0;
            let r = Filter::SvdCutoff { cutoff_ratio: ratio }.apply(&data).unwrap();
            let retained = r.report.retained.unwrap();
            assert!(retained <= previous);
            assert_eq!(r.report.total, Some(10));
            previous = retained;
        }
    }

    #[test]
    fn svd_zero_cutoff_reproduces_input() {
        let data = noisy(6, 9, 3);
        let r = Filter::SvdCutoff { cutoff_ratio: 0.0 }.apply(&data).unwrap();
        for (a, b) in r.denoised.iter().zip(data.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn out_of_domain_parameters_are_rejected() {
        let data = noisy(4, 4, 1);
        for filter in [
            Filter::SvdCutoff { cutoff_ratio: 1.5 },
            Filter::SvdCutoff { cutoff_ratio: f64::NAN },
            Filter::Median { size: (0, 2) },
            Filter::Gaussian { sigma: -1.0 },
            Filter::Gaussian { sigma: f64::INFINITY },
        ] {
            assert!(matches!(filter.apply(&data), Err(Error::InvalidInput(_))));
        }
        let empty = Array2::<f64>::zeros((0, 3));
        assert!(matches!(
            Filter::Median { size: (2, 2) }.apply(&empty),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn oversized_parameters_fail_before_allocating() {
        let data = noisy(4, 8, 5);
        for filter in [
            Filter::Gaussian { sigma: 1e10 },
            Filter::Gaussian { sigma: f64::MAX },
            Filter::Median {
                size: (200_000, 200_000),
            },
            Filter::Median {
                size: (usize::MAX, 2),
            },
            Filter::Median { size: (5, 2) },
            Filter::Median { size: (2, 9) },
        ] {
            assert!(
                matches!(filter.apply(&data), Err(Error::InvalidInput(_))),
                "{filter:?} should be rejected"
            );
        }

        // the largest accepted window and radius still run
        let full = Filter::Median { size: (4, 8) }.apply(&data).unwrap();
        assert_eq!(full.denoised.dim(), (4, 8));
        let wide = Filter::Gaussian { sigma: 7.0 }.apply(&data).unwrap();
        assert_eq!(wide.denoised.dim(), (4, 8));
    }
}
