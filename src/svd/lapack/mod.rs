use nalgebra::DMatrix;
use ndarray::{s, Array1, ArrayView2};
use nshare::{IntoNalgebra, IntoNdarray2};

use super::{Decomposition, SVDImplementation};
use crate::error::EofError;

/// SVD through LAPACK's `gesdd`, linked against OpenBLAS.
///
/// LAPACK returns the full factorization; it is cut down to the thin one here.
#[derive(Debug, Clone, Copy, Default)]
pub struct LapackSVD;

impl SVDImplementation for LapackSVD {
    fn compute(&self, matrix: ArrayView2<f64>) -> anyhow::Result<Decomposition> {
        let (m, n) = matrix.dim();
        let k = m.min(n);
        let matrix: DMatrix<f64> = matrix.to_owned().into_nalgebra();

        let svd = nalgebra_lapack::SVD::new(matrix)
            .ok_or_else(|| EofError::Decomposition("LAPACK SVD did not converge".into()))?;

        let u = svd.u.into_ndarray2().into_owned();
        let vt = svd.vt.into_ndarray2().into_owned();
        let s = Array1::from(svd.singular_values.as_slice()[..k].to_vec());

        Decomposition::new(
            u.slice(s![.., ..k]).to_owned(),
            s,
            vt.slice(s![..k, ..]).to_owned(),
        )
    }
}
