//! Failure taxonomy of an EOF analysis.
//!
//! Every public operation returns `anyhow::Result`; the errors raised by this crate are
//! [`EofError`] values, so callers can tell them apart with
//! `err.downcast_ref::<EofError>()`.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EofError {
    #[error("field must be 3-dimensional [time, lat, lon], got {ndim} dimension(s)")]
    FieldDimension { ndim: usize },

    #[error("latitude and longitude must both be 1-D or both be 2-D, got {lat}-D and {lon}-D")]
    CoordinateDimension { lat: usize, lon: usize },

    #[error("latitude grid shape {lat:?} does not match longitude grid shape {lon:?}")]
    CoordinateShape {
        lat: (usize, usize),
        lon: (usize, usize),
    },

    #[error("coordinate grid shape {grid:?} does not match field spatial shape {field:?}")]
    GridShape {
        grid: (usize, usize),
        field: (usize, usize),
    },

    #[error("field has no spatial points")]
    EmptyField,

    #[error("analysis flag must have magnitude 1 (covariance) or 2 (correlation), got {0}")]
    InvalidFlag(i32),

    #[error("number of requested modes must be positive")]
    ZeroModes,

    #[error("at least 2 time samples are required, got {0}")]
    TooFewSamples(usize),

    #[error("spatial column {column} contains non-finite values")]
    NonFinite { column: usize },

    #[error("singular value decomposition failed: {0}")]
    Decomposition(String),
}

impl EofError {
    /// Degenerate numeric input, as opposed to a violated shape contract.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            EofError::TooFewSamples(_) | EofError::NonFinite { .. } | EofError::Decomposition(_)
        )
    }
}
