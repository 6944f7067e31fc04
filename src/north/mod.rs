//! # North et al. criterion
//!
//! Sampling-error test for eigenvalue separation (North, Bell, Cahalan & Moeng, 1982).
//! Each eigenvalue gets an error bar `lambda * sqrt(2 / n)` with `n` the number of time
//! samples; a mode whose bar overlaps a neighbour's is not distinguishable from it and
//! its EOF may be an arbitrary mixture of the two.

use ndarray::{Array1, Array2, ArrayView1};

/// One row per evaluated mode, `n_modes + 1` rows in total.
///
/// Rows past the number of available eigenvalues hold NaN eigenvalues and errors and are
/// never distinct. The last row is never tested for distinctness and has a gap of zero.
#[derive(Debug, Clone, PartialEq)]
pub struct NorthCriterion {
    eigenvalues: Array1<f64>,
    errors: Array1<f64>,
    distinct: Vec<bool>,
    gaps: Array1<f64>,
}

/// Evaluates the criterion for the leading `n_modes` eigenvalues (plus one extra row for
/// the neighbour of the last mode).
///
/// `eigenvalues` must be sorted in descending order.
pub fn north_criterion(
    eigenvalues: ArrayView1<f64>,
    n_time: usize,
    n_modes: usize,
) -> NorthCriterion {
    let n_rows = n_modes + 1;
    if n_rows > eigenvalues.len() {
        log::warn!(
            "North criterion asked for {} rows but only {} eigenvalues exist; the rest are NaN",
            n_rows,
            eigenvalues.len()
        );
    }

    let factor = (2.0 / n_time as f64).sqrt();
    let values = Array1::from_shape_fn(n_rows, |i| eigenvalues.get(i).copied().unwrap_or(f64::NAN));
    let errors = values.mapv(|v| v * factor);
    let upper = &values + &errors;
    let lower = &values - &errors;

    let mut distinct = vec![false; n_rows];
    if n_rows > 1 {
        distinct[0] = lower[0] > upper[1];
    }
    for i in 1..n_modes {
        distinct[i] = upper[i] < lower[i - 1] && lower[i] > upper[i + 1];
    }

    let mut gaps = Array1::zeros(n_rows);
    for i in 0..n_modes {
        gaps[i] = (values[i] - values[i + 1]).abs() / errors[i];
    }

    NorthCriterion {
        eigenvalues: values,
        errors,
        distinct,
        gaps,
    }
}

impl NorthCriterion {
    pub fn len(&self) -> usize {
        self.distinct.len()
    }

    pub fn is_empty(&self) -> bool {
        self.distinct.is_empty()
    }

    pub fn eigenvalues(&self) -> &Array1<f64> {
        &self.eigenvalues
    }

    /// `eigenvalue * sqrt(2 / n_time)`
    pub fn errors(&self) -> &Array1<f64> {
        &self.errors
    }

    pub fn distinct(&self) -> &[bool] {
        &self.distinct
    }

    /// `|lambda_i - lambda_{i+1}| / error_i`
    pub fn gaps(&self) -> &Array1<f64> {
        &self.gaps
    }

    pub fn is_distinct(&self, mode: usize) -> bool {
        self.distinct.get(mode).copied().unwrap_or(false)
    }

    /// Length of the leading run of distinct modes.
    pub fn significant_modes(&self) -> usize {
        self.distinct.iter().take_while(|&&d| d).count()
    }

    /// `[n_modes + 1, 4]` table: eigenvalue, error, distinct (0/1), gap.
    pub fn to_array(&self) -> Array2<f64> {
        let mut table = Array2::zeros((self.len(), 4));
        for (i, mut row) in table.rows_mut().into_iter().enumerate() {
            row[0] = self.eigenvalues[i];
            row[1] = self.errors[i];
            row[2] = if self.distinct[i] { 1.0 } else { 0.0 };
            row[3] = self.gaps[i];
        }
        table
    }
}
