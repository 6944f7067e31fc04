//! # EOF analysis
//!
//! Ties the stages together: preprocessing, decomposition, the North et al. criterion
//! and reconstruction onto the grid. Configure an [`Eof`] through [`EofBuilder`], or call
//! [`perform_eof_analysis`] for a one-shot analysis with integer flag semantics.
//!
//! ```no_run
//! use ndarray::{Array1, Array3};
//! use single_eof::{AnalysisMode, EofBuilder, Grid};
//!
//! let field = Array3::<f64>::zeros((120, 18, 36));
//! let lat = Array1::linspace(-85.0, 85.0, 18);
//! let lon = Array1::linspace(0.0, 350.0, 36);
//! let grid = Grid::from_axes(lat.view(), lon.view());
//!
//! let eof = EofBuilder::default()
//!     .mode(AnalysisMode::Covariance)
//!     .n_modes(4)
//!     .build()?;
//! let result = eof.compute(field.view(), &grid)?;
//! println!("leading mode explains {:.1}%", result.latent()[0] * 100.0);
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::error::EofError;
use crate::grid::Grid;
use crate::north::{north_criterion, NorthCriterion};
use crate::preprocess::{preprocess, AnalysisMode};
use crate::reconstruct::{loadings, normalized_spectrum, reconstruct, scores};
use crate::svd::{decompose, Decomposition, NalgebraSVD, SVDImplementation};
use anyhow::bail;
use ndarray::{Array1, Array2, Array3, ArrayView3, ArrayViewD, Ix3};
use std::sync::Arc;

pub const DEFAULT_N_MODES: usize = 10;

pub struct EofBuilder<S: SVDImplementation> {
    mode: AnalysisMode,
    flag: Option<i32>,
    n_modes: usize,
    svd_implementation: Arc<S>,
}

impl<S: SVDImplementation> EofBuilder<S> {
    pub fn new(svd_implementation: S) -> Self {
        EofBuilder {
            mode: AnalysisMode::default(),
            flag: None,
            n_modes: DEFAULT_N_MODES,
            svd_implementation: Arc::new(svd_implementation),
        }
    }

    pub fn mode(mut self, mode: AnalysisMode) -> Self {
        self.mode = mode;
        self.flag = None;
        self
    }

    /// Integer form of [`mode`](Self::mode): magnitude 1 is covariance, 2 is correlation.
    /// Checked in [`build`](Self::build).
    pub fn flag(mut self, flag: i32) -> Self {
        self.flag = Some(flag);
        self
    }

    /// Number of loadings returned and of North criterion rows evaluated.
    pub fn n_modes(mut self, n_modes: usize) -> Self {
        self.n_modes = n_modes;
        self
    }

    pub fn build(self) -> anyhow::Result<Eof<S>> {
        if self.n_modes == 0 {
            bail!(EofError::ZeroModes);
        }
        let mode = match self.flag {
            Some(flag) => AnalysisMode::from_flag(flag)?,
            None => self.mode,
        };

        Ok(Eof {
            mode,
            n_modes: self.n_modes,
            svd_implementation: self.svd_implementation,
        })
    }
}

impl Default for EofBuilder<NalgebraSVD> {
    fn default() -> Self {
        Self::new(NalgebraSVD)
    }
}

/// A configured EOF analysis. Holds no data; every call to
/// [`compute`](Self::compute) is independent.
pub struct Eof<S: SVDImplementation> {
    mode: AnalysisMode,
    n_modes: usize,
    svd_implementation: Arc<S>,
}

impl<S: SVDImplementation> Eof<S> {
    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    pub fn n_modes(&self) -> usize {
        self.n_modes
    }

    /// Runs the analysis on a `[time, lat, lon]` field.
    pub fn compute(&self, field: ArrayView3<f64>, grid: &Grid) -> anyhow::Result<EofResult> {
        let (n_time, nlat, nlon) = field.dim();

        let x = preprocess(field, grid, self.mode)?;
        let decomposition = decompose(self.svd_implementation.as_ref(), x.view())?;

        let eigenvalues = decomposition.eigenvalues();
        let north = north_criterion(eigenvalues.view(), n_time, self.n_modes);
        let score = scores(x.view(), decomposition.vt().view());
        let latent = normalized_spectrum(eigenvalues.view());
        let loading = loadings(decomposition.vt().view(), self.n_modes, (nlat, nlon))?;

        log::debug!(
            "EOF analysis done: {} modes available, {} leading mode(s) pass the North criterion",
            decomposition.n_modes(),
            north.significant_modes()
        );

        Ok(EofResult {
            score,
            latent,
            loading,
            north,
            decomposition,
        })
    }

    /// Like [`compute`](Self::compute), for arrays whose dimensionality is only known at
    /// runtime. Coordinates may be 1-D axes or 2-D grids.
    pub fn compute_dyn(
        &self,
        field: ArrayViewD<f64>,
        lat: ArrayViewD<f64>,
        lon: ArrayViewD<f64>,
    ) -> anyhow::Result<EofResult> {
        if field.ndim() != 3 {
            bail!(EofError::FieldDimension { ndim: field.ndim() });
        }
        let field = field.into_dimensionality::<Ix3>()?;
        let grid = Grid::from_dyn(lat, lon)?;
        self.compute(field, &grid)
    }
}

/// Runs an EOF analysis with the default backend.
///
/// `flag` selects covariance (magnitude 1) or correlation (magnitude 2) analysis;
/// `n_modes` is the number of loadings to return.
pub fn perform_eof_analysis(
    field: ArrayViewD<f64>,
    lat: ArrayViewD<f64>,
    lon: ArrayViewD<f64>,
    flag: i32,
    n_modes: usize,
) -> anyhow::Result<EofResult> {
    EofBuilder::default()
        .flag(flag)
        .n_modes(n_modes)
        .build()?
        .compute_dyn(field, lat, lon)
}

/// Output of an EOF analysis.
#[derive(Debug, Clone)]
pub struct EofResult {
    score: Array2<f64>,
    latent: Array1<f64>,
    loading: Array3<f64>,
    north: NorthCriterion,
    decomposition: Decomposition,
}

impl EofResult {
    /// Time series of every available mode, `[time, modes]`.
    pub fn score(&self) -> &Array2<f64> {
        &self.score
    }

    /// Fraction of the total variance explained by each available mode.
    pub fn latent(&self) -> &Array1<f64> {
        &self.latent
    }

    /// Spatial patterns `[n_modes, lat, lon]`; modes past the rank are NaN.
    pub fn loading(&self) -> &Array3<f64> {
        &self.loading
    }

    pub fn north(&self) -> &NorthCriterion {
        &self.north
    }

    pub fn decomposition(&self) -> &Decomposition {
        &self.decomposition
    }

    pub fn singular_values(&self) -> &Array1<f64> {
        self.decomposition.s()
    }

    pub fn eigenvalues(&self) -> Array1<f64> {
        self.decomposition.eigenvalues()
    }

    /// Flattened spatial patterns of all available modes, `[modes, lat * lon]`.
    pub fn components(&self) -> &Array2<f64> {
        self.decomposition.vt()
    }

    pub fn available_modes(&self) -> usize {
        self.decomposition.n_modes()
    }

    pub fn cumulative_latent(&self) -> Array1<f64> {
        let mut acc = 0.0;
        self.latent.mapv(|v| {
            acc += v;
            acc
        })
    }

    /// Preprocessed `[time, lat * lon]` anomalies rebuilt from the leading `n_modes`
    /// modes. Passing [`available_modes`](Self::available_modes) recovers them in full.
    pub fn reconstruct(&self, n_modes: usize) -> Array2<f64> {
        reconstruct(self.score.view(), self.decomposition.vt().view(), n_modes)
    }

    /// `(score, latent, loading, north)`, with the North criterion as a `[n_modes + 1, 4]`
    /// table.
    pub fn into_parts(self) -> (Array2<f64>, Array1<f64>, Array3<f64>, Array2<f64>) {
        let north = self.north.to_array();
        (self.score, self.latent, self.loading, north)
    }
}
