//! Low-rank reconstruction by singular value truncation.

use nalgebra::DMatrix;
use ndarray::Array2;

use crate::error::{Error, Result};

/// Outcome of a truncated reconstruction.
pub(crate) struct Truncated {
    pub data: Array2<f64>,
    pub retained: usize,
    pub total: usize,
}

/// Zero every singular value strictly below `cutoff_ratio * s_max` and recompose.
///
/// `retained` counts the singular values that are still non-zero afterwards,
/// `total` is `min(rows, cols)`.
pub(crate) fn truncate(data: &Array2<f64>, cutoff_ratio: f64) -> Result<Truncated> {
    let (rows, cols) = data.dim();
    let matrix = DMatrix::from_fn(rows, cols, |i, j| data[(i, j)]);
    let mut svd = matrix.svd(true, true);

    let s_max = svd.singular_values.max();
    let threshold = cutoff_ratio * s_max;
    for s in svd.singular_values.iter_mut() {
        if *s < threshold {
            *s = 0.0;
        }
    }
    let retained = svd.singular_values.iter().filter(|s| **s > 0.0).count();
    let total = svd.singular_values.len();

    let rebuilt = svd
        .recompose()
        .map_err(|e| Error::invalid(format!("SVD reconstruction failed: {e}")))?;
    tracing::debug!(rows, cols, retained, total, threshold, "svd truncation");

    Ok(Truncated {
        data: Array2::from_shape_fn((rows, cols), |(i, j)| rebuilt[(i, j)]),
        retained,
        total,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn rank_one_input_survives_any_cutoff() {
        let data = array![[1.0, 2.0, 3.0], [2.0, 4.0, 6.0]];
        let t = truncate(&data, 1.0).unwrap();
        assert_eq!(t.retained, 1);
        assert_eq!(t.total, 2);
        for (a, b) in t.data.iter().zip(data.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_matrix_keeps_nothing() {
        let data = Array2::<f64>::zeros((3, 2));
        let t = truncate(&data, 0.5).unwrap();
        assert_eq!(t.retained, 0);
        assert!(t.data.iter().all(|v| *v == 0.0));
    }
}
