//! # Singular value decomposition
//!
//! Backends implement [`SVDImplementation`] and return a thin [`Decomposition`]. The
//! default backend is nalgebra's own SVD; `faer` and `lapack` are available behind the
//! cargo features of the same name.

use crate::error::EofError;
use anyhow::bail;
use nalgebra::DMatrix;
use ndarray::{Array1, Array2, ArrayView2, Axis};
use nshare::{IntoNalgebra, IntoNdarray2};

#[cfg(feature = "faer")]
pub mod faer;
#[cfg(feature = "lapack")]
pub mod lapack;

#[cfg(feature = "faer")]
pub use self::faer::FaerSVD;
#[cfg(feature = "lapack")]
pub use self::lapack::LapackSVD;

// Trait for SVD implementations
pub trait SVDImplementation: Send + Sync {
    /// Thin decomposition of an `m x n` matrix: `u` is `m x k`, `s` has length `k` and `vt`
    /// is `k x n`, with `k = min(m, n)`. Ordering of the modes is not required.
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Decomposition>;
}

/// `matrix = u * diag(s) * vt`, mode `i` being column `i` of `u` and row `i` of `vt`.
#[derive(Debug, Clone, PartialEq)]
pub struct Decomposition {
    u: Array2<f64>,
    s: Array1<f64>,
    vt: Array2<f64>,
}

impl Decomposition {
    pub fn new(u: Array2<f64>, s: Array1<f64>, vt: Array2<f64>) -> anyhow::Result<Self> {
        if u.ncols() != s.len() || vt.nrows() != s.len() {
            bail!(EofError::Decomposition(format!(
                "inconsistent factor shapes: u {:?}, s {}, vt {:?}",
                u.dim(),
                s.len(),
                vt.dim()
            )));
        }
        Ok(Decomposition { u, s, vt })
    }

    pub fn u(&self) -> &Array2<f64> {
        &self.u
    }

    pub fn s(&self) -> &Array1<f64> {
        &self.s
    }

    pub fn vt(&self) -> &Array2<f64> {
        &self.vt
    }

    /// Number of modes, `min(m, n)` for a thin decomposition.
    pub fn n_modes(&self) -> usize {
        self.s.len()
    }

    /// Squared singular values.
    pub fn eigenvalues(&self) -> Array1<f64> {
        self.s.mapv(|s| s * s)
    }

    // Reconstruct the original matrix
    pub fn reconstruct(&self) -> Array2<f64> {
        let s_diag = Array2::from_diag(&self.s);
        self.u.dot(&s_diag).dot(&self.vt)
    }

    /// Makes every singular value non-negative and orders the modes by descending
    /// singular value.
    pub fn into_descending(self) -> Self {
        let Decomposition { mut u, mut s, vt } = self;

        for (mut u_col, s_val) in u.columns_mut().into_iter().zip(s.iter_mut()) {
            if *s_val < 0.0 {
                *s_val = -*s_val;
                u_col.mapv_inplace(|v| -v);
            }
        }

        let mut order: Vec<usize> = (0..s.len()).collect();
        order.sort_by(|&a, &b| s[b].total_cmp(&s[a]));

        Decomposition {
            u: u.select(Axis(1), &order),
            s: s.select(Axis(0), &order),
            vt: vt.select(Axis(0), &order),
        }
    }
}

/// Pure-Rust SVD from nalgebra, used unless another backend is chosen.
#[derive(Debug, Clone, Copy, Default)]
pub struct NalgebraSVD;

impl SVDImplementation for NalgebraSVD {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Decomposition> {
        let matrix: DMatrix<f64> = matrix.to_owned().into_nalgebra();

        let svd = nalgebra::SVD::try_new(matrix, true, true, f64::EPSILON, 0)
            .ok_or_else(|| EofError::Decomposition("nalgebra SVD did not converge".into()))?;

        let u = svd
            .u
            .ok_or_else(|| EofError::Decomposition("left singular vectors missing".into()))?;
        let vt = svd
            .v_t
            .ok_or_else(|| EofError::Decomposition("right singular vectors missing".into()))?;

        Decomposition::new(
            u.into_ndarray2().into_owned(),
            Array1::from(svd.singular_values.as_slice().to_vec()),
            vt.into_ndarray2().into_owned(),
        )
    }
}

/// Decomposes a preprocessed `[time, space]` matrix.
///
/// The matrix is divided by `sqrt(n_time - 1)` first, so the squared singular values are
/// the eigenvalues of the sample covariance (or correlation) matrix. The returned modes
/// are sorted by descending singular value.
pub fn decompose<S>(svd: &S, x: ArrayView2<f64>) -> anyhow::Result<Decomposition>
where
    S: SVDImplementation + ?Sized,
{
    let (n_time, n_space) = x.dim();
    if n_time < 2 {
        bail!(EofError::TooFewSamples(n_time));
    }
    if let Some(column) = x
        .columns()
        .into_iter()
        .position(|col| col.iter().any(|v| !v.is_finite()))
    {
        bail!(EofError::NonFinite { column });
    }

    let denominator = ((n_time - 1) as f64).sqrt();
    let scaled = x.mapv(|v| v / denominator);

    let decomposition = svd.compute(scaled.view())?.into_descending();

    let expected = n_time.min(n_space);
    if decomposition.n_modes() != expected
        || decomposition.u().nrows() != n_time
        || decomposition.vt().ncols() != n_space
    {
        bail!(EofError::Decomposition(format!(
            "backend returned {} modes with u {:?} and vt {:?} for a {}x{} matrix",
            decomposition.n_modes(),
            decomposition.u().dim(),
            decomposition.vt().dim(),
            n_time,
            n_space
        )));
    }

    log::debug!(
        "SVD of {}x{} matrix: {} modes, leading singular value {:.6e}",
        n_time,
        n_space,
        decomposition.n_modes(),
        decomposition.s().get(0).copied().unwrap_or(0.0)
    );

    Ok(decomposition)
}
