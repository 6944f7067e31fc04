//! # Reconstruction
//!
//! Maps the decomposition back to the caller's terms: per-mode time series (scores), the
//! fraction of variance per mode (latent) and the spatial patterns on the original grid
//! (loadings).

use crate::error::EofError;
use anyhow::bail;
use ndarray::{s, Array1, Array2, Array3, ArrayView1, ArrayView2};

/// Projects the `[time, space]` anomalies onto every right singular vector, giving
/// `[time, modes]`.
pub fn scores(x: ArrayView2<f64>, vt: ArrayView2<f64>) -> Array2<f64> {
    x.dot(&vt.t())
}

/// Eigenvalues divided by their total, so that they sum to one over all modes.
///
/// A spectrum without any variance has no meaningful fractions and comes back as zeros.
pub fn normalized_spectrum(eigenvalues: ArrayView1<f64>) -> Array1<f64> {
    let total = eigenvalues.sum();
    if total > 0.0 {
        eigenvalues.mapv(|v| v / total)
    } else {
        log::warn!("Field has no variance; every mode explains zero variance");
        Array1::zeros(eigenvalues.len())
    }
}

/// Reshapes the first `n_modes` rows of `vt` onto the `(nlat, nlon)` grid.
///
/// Modes past the rank of the decomposition are filled with NaN.
pub fn loadings(
    vt: ArrayView2<f64>,
    n_modes: usize,
    shape: (usize, usize),
) -> anyhow::Result<Array3<f64>> {
    let (nlat, nlon) = shape;
    if vt.ncols() != nlat * nlon {
        bail!(EofError::Decomposition(format!(
            "{} spatial components cannot be laid out on a {}x{} grid",
            vt.ncols(),
            nlat,
            nlon
        )));
    }

    let available = n_modes.min(vt.nrows());
    if available < n_modes {
        log::warn!(
            "Requested {} modes but the decomposition has rank {}; remaining loadings are NaN",
            n_modes,
            available
        );
    }

    let mut loading = Array3::from_elem((n_modes, nlat, nlon), f64::NAN);
    for (i, mut pattern) in loading.outer_iter_mut().take(available).enumerate() {
        for (dst, &src) in pattern.iter_mut().zip(vt.row(i)) {
            *dst = src;
        }
    }
    Ok(loading)
}

/// Rebuilds the `[time, space]` anomalies from the leading `n_modes` modes.
pub fn reconstruct(score: ArrayView2<f64>, vt: ArrayView2<f64>, n_modes: usize) -> Array2<f64> {
    let n = n_modes.min(score.ncols()).min(vt.nrows());
    score.slice(s![.., ..n]).dot(&vt.slice(s![..n, ..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_normalized_spectrum() {
        let latent = normalized_spectrum(array![6.0, 3.0, 1.0].view());
        assert_abs_diff_eq!(latent.sum(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(latent[0], 0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(latent[2], 0.1, epsilon = 1e-12);
    }

    #[test]
    fn test_normalized_spectrum_without_variance() {
        let latent = normalized_spectrum(array![0.0, 0.0, 0.0].view());
        assert_eq!(latent, array![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_scores_project_onto_modes() {
        let x = array![[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]];
        let vt = array![[1.0, 0.0], [0.0, 1.0]];
        assert_eq!(scores(x.view(), vt.view()), x);

        let swapped = array![[0.0, 1.0], [1.0, 0.0]];
        assert_eq!(
            scores(x.view(), swapped.view()),
            array![[2.0, 1.0], [4.0, 3.0], [6.0, 5.0]]
        );
    }

    #[test]
    fn test_loadings_row_major_layout() {
        let vt = array![[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [6.0, 5.0, 4.0, 3.0, 2.0, 1.0]];
        let loading = loadings(vt.view(), 2, (2, 3)).unwrap();

        assert_eq!(loading.dim(), (2, 2, 3));
        assert_eq!(loading[[0, 1, 0]], 4.0);
        assert_eq!(loading[[1, 0, 2]], 4.0);
        assert_eq!(loading[[1, 1, 2]], 1.0);
    }

    #[test]
    fn test_loadings_from_transposed_factor() {
        let v = array![[1.0, 3.0], [2.0, 4.0]];
        let vt = v.t();
        let loading = loadings(vt, 1, (1, 2)).unwrap();
        assert_eq!(loading[[0, 0, 0]], 1.0);
        assert_eq!(loading[[0, 0, 1]], 2.0);
    }

    #[test]
    fn test_loadings_beyond_rank_are_nan() {
        let vt = array![[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]];
        let loading = loadings(vt.view(), 4, (2, 2)).unwrap();

        assert_eq!(loading.dim(), (4, 2, 2));
        assert!(loading.slice(s![..2, .., ..]).iter().all(|v| v.is_finite()));
        assert!(loading.slice(s![2.., .., ..]).iter().all(|v| v.is_nan()));
    }

    #[test]
    fn test_loadings_shape_mismatch() {
        let vt = array![[1.0, 0.0, 0.0]];
        assert!(loadings(vt.view(), 1, (2, 2)).is_err());
    }

    #[test]
    fn test_truncated_reconstruction() {
        let score = array![[2.0, 1.0], [0.0, 3.0]];
        let vt = array![[1.0, 0.0], [0.0, 1.0]];
        assert_eq!(reconstruct(score.view(), vt.view(), 2), score);
        assert_eq!(
            reconstruct(score.view(), vt.view(), 1),
            array![[2.0, 0.0], [0.0, 0.0]]
        );
        assert_eq!(reconstruct(score.view(), vt.view(), 10), score);
    }
}
