//! Separable Gaussian smoothing with reflect boundaries.

use ndarray::{Array2, Axis};

use super::boundary::reflect_index;

/// Samples either side of the centre, `⌊4σ + 0.5⌋`.
pub(crate) fn radius(sigma: f64) -> f64 {
    (4.0 * sigma + 0.5).floor()
}

/// Normalised 1D kernel truncated at [`radius`] samples either side.
///
/// Callers bound `sigma` first; see [`super::Filter::check_shape`].
pub(crate) fn kernel(sigma: f64) -> Vec<f64> {
    let radius = radius(sigma) as isize;
    let weights: Vec<f64> = (-radius..=radius)
        .map(|x| (-0.5 * (x as f64 / sigma).powi(2)).exp())
        .collect();
    let sum: f64 = weights.iter().sum();
    weights.into_iter().map(|w| w / sum).collect()
}

fn convolve_axis(data: &Array2<f64>, weights: &[f64], axis: Axis) -> Array2<f64> {
    let radius = (weights.len() / 2) as isize;
    let len = data.len_of(axis);
    let mut out = Array2::<f64>::zeros(data.dim());
    for (src, mut dst) in data.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        for (k, d) in dst.iter_mut().enumerate() {
            *d = weights
                .iter()
                .enumerate()
                .map(|(t, w)| w * src[reflect_index(k as isize + t as isize - radius, len)])
                .sum();
        }
    }
    out
}

/// Gaussian filter along both axes; `sigma == 0` returns the input unchanged.
pub(crate) fn gaussian_filter(data: &Array2<f64>, sigma: f64) -> Array2<f64> {
    if sigma == 0.0 {
        return data.clone();
    }
    let weights = kernel(sigma);
    let rows_done = convolve_axis(data, &weights, Axis(0));
    convolve_axis(&rows_done, &weights, Axis(1))
}
