//! # Preprocessing
//!
//! Turns a `[time, lat, lon]` field into the `[time, space]` anomaly matrix that gets
//! decomposed: area weighting, flattening of the grid, removal of the temporal mean and,
//! for correlation-based analysis, division by the temporal standard deviation.
//!
//! Each step takes its input by value or by view and hands back a new array; caller-owned
//! data is never modified.

use crate::error::EofError;
use crate::grid::Grid;
use anyhow::bail;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;

/// Which second-moment structure the modes diagonalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalysisMode {
    /// Weighted anomalies as they are (flag magnitude 1).
    Covariance,
    /// Weighted anomalies divided by their temporal standard deviation (flag magnitude 2).
    #[default]
    Correlation,
}

impl AnalysisMode {
    /// Interprets the integer flag; only its magnitude matters.
    pub fn from_flag(flag: i32) -> anyhow::Result<Self> {
        Ok(Self::try_from(flag)?)
    }

    pub fn flag(&self) -> i32 {
        match self {
            AnalysisMode::Covariance => 1,
            AnalysisMode::Correlation => 2,
        }
    }
}

impl TryFrom<i32> for AnalysisMode {
    type Error = EofError;

    fn try_from(flag: i32) -> Result<Self, Self::Error> {
        match flag.unsigned_abs() {
            1 => Ok(AnalysisMode::Covariance),
            2 => Ok(AnalysisMode::Correlation),
            _ => Err(EofError::InvalidFlag(flag)),
        }
    }
}

/// Runs the full preprocessing chain and returns the `[time, lat * lon]` anomaly matrix.
///
/// Spatial points are flattened in row-major order, so column `i * nlon + j` holds cell
/// `(i, j)`.
pub fn preprocess(
    field: ArrayView3<f64>,
    grid: &Grid,
    mode: AnalysisMode,
) -> anyhow::Result<Array2<f64>> {
    let (n_time, nlat, nlon) = field.dim();
    grid.check_shape((nlat, nlon))?;
    if nlat * nlon == 0 {
        bail!(EofError::EmptyField);
    }

    log::debug!(
        "Preprocessing field of {} time steps on a {}x{} grid ({:?})",
        n_time,
        nlat,
        nlon,
        mode
    );

    let weighted = apply_weights(field, grid.weights().view());
    let flat = flatten(weighted)?;
    let anomalies = center(flat);

    Ok(match mode {
        AnalysisMode::Covariance => anomalies,
        AnalysisMode::Correlation => standardize(anomalies),
    })
}

/// Multiplies every time slice by the spatial weights.
pub fn apply_weights(field: ArrayView3<f64>, weights: ArrayView2<f64>) -> Array3<f64> {
    Array3::from_shape_fn(field.dim(), |(t, i, j)| field[[t, i, j]] * weights[[i, j]])
}

/// Collapses `[time, lat, lon]` into `[time, lat * lon]`.
pub fn flatten(field: Array3<f64>) -> anyhow::Result<Array2<f64>> {
    let (n_time, nlat, nlon) = field.dim();
    let field = field.as_standard_layout().into_owned();
    Ok(field.into_shape_with_order((n_time, nlat * nlon))?)
}

/// Removes the temporal mean of every column.
pub fn center(mut x: Array2<f64>) -> Array2<f64> {
    let Some(mean) = x.mean_axis(Axis(0)) else {
        return x;
    };

    x.axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|mut row| {
            row -= &mean;
        });
    x
}

/// Divides every column by its (population) temporal standard deviation.
///
/// Columns whose standard deviation is exactly zero are divided by 1 instead.
pub fn standardize(mut x: Array2<f64>) -> Array2<f64> {
    let mut std_dev = x.std_axis(Axis(0), 0.0);

    let n_constant = std_dev.iter().filter(|&&s| s == 0.0).count();
    if n_constant > 0 {
        log::warn!(
            "{} of {} spatial columns have zero variance and are left unscaled",
            n_constant,
            std_dev.len()
        );
        std_dev.mapv_inplace(|s| if s == 0.0 { 1.0 } else { s });
    }

    x.axis_iter_mut(Axis(0))
        .into_par_iter()
        .for_each(|mut row| {
            row /= &std_dev;
        });
    x
}
