//! 2D median filter with reflect boundaries.

use ndarray::Array2;
use rayon::prelude::*;

use super::boundary::reflect_index;
use crate::error::{Error, Result};

/// Median over a `(rows, cols)` window placed so that its centre is at
/// offset `size / 2`; even windows take the upper median.
pub(crate) fn median_filter(data: &Array2<f64>, size: (usize, usize)) -> Result<Array2<f64>> {
    let (n_rows, n_cols) = data.dim();
    let (wr, wc) = size;
    let window_len = wr
        .checked_mul(wc)
        .ok_or_else(|| Error::invalid(format!("median window {wr}x{wc} is too large")))?;
    let (or, oc) = ((wr / 2) as isize, (wc / 2) as isize);

    let filtered: Vec<Vec<f64>> = (0..n_rows)
        .into_par_iter()
        .map(|i| {
            let mut window = Vec::with_capacity(window_len);
            (0..n_cols)
                .map(|j| {
                    window.clear();
                    for di in 0..wr as isize {
                        let r = reflect_index(i as isize + di - or, n_rows);
                        for dj in 0..wc as isize {
                            let c = reflect_index(j as isize + dj - oc, n_cols);
                            window.push(data[(r, c)]);
                        }
                    }
                    let rank = window.len() / 2;
                    *window
                        .select_nth_unstable_by(rank, |a, b| a.total_cmp(b))
                        .1
                })
                .collect()
        })
        .collect();

    Ok(Array2::from_shape_fn((n_rows, n_cols), |(i, j)| filtered[i][j]))
}
