//! Half-sample symmetric ("reflect") boundary handling: `d c b a | a b c d | d c b a`.

/// Map a possibly out-of-range index onto `0..len` by mirroring about the edges.
///
/// `len` must be non-zero.
pub fn reflect_index(index: isize, len: usize) -> usize {
    if len <= 1 {
        return 0;
    }
    let n = len as isize;
    let period = 2 * n;
    let m = index.rem_euclid(period);
    if m >= n {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrors_about_both_edges() {
        let got: Vec<usize> = (-4..8).map(|i| reflect_index(i, 4)).collect();
        assert_eq!(got, vec![3, 2, 1, 0, 0, 1, 2, 3, 3, 2, 1, 0]);
    }

    #[test]
    fn far_indices_wrap_periodically() {
        assert_eq!(reflect_index(-9, 4), reflect_index(-1, 4));
        assert_eq!(reflect_index(17, 4), reflect_index(1, 4));
        assert_eq!(reflect_index(-5, 1), 0);
    }
}
