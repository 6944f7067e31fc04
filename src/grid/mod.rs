//! # Coordinate grids
//!
//! Latitude and longitude of every grid cell, stored as 2-D arrays shaped like the spatial
//! part of the field. One-dimensional axes are promoted to a full mesh, the same way
//! `meshgrid` pairs a latitude row index with a longitude column index.

use crate::error::EofError;
use anyhow::bail;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewD, Ix1, Ix2};

/// Cell-centred latitude/longitude coordinates in degrees, both shaped `[lat, lon]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    lat: Array2<f64>,
    lon: Array2<f64>,
}

impl Grid {
    /// Builds the mesh of a regular grid from its two axes.
    pub fn from_axes(lat: ArrayView1<f64>, lon: ArrayView1<f64>) -> Self {
        let (nlat, nlon) = (lat.len(), lon.len());
        log::info!(
            "Converting 1-D coordinates ({} latitudes, {} longitudes) to 2-D grids",
            nlat,
            nlon
        );

        let lat = Array2::from_shape_fn((nlat, nlon), |(i, _)| lat[i]);
        let lon = Array2::from_shape_fn((nlat, nlon), |(_, j)| lon[j]);
        Grid { lat, lon }
    }

    /// Uses explicit per-cell coordinates, e.g. for curvilinear grids.
    pub fn from_grids(lat: ArrayView2<f64>, lon: ArrayView2<f64>) -> anyhow::Result<Self> {
        if lat.dim() != lon.dim() {
            bail!(EofError::CoordinateShape {
                lat: lat.dim(),
                lon: lon.dim(),
            });
        }
        Ok(Grid {
            lat: lat.to_owned(),
            lon: lon.to_owned(),
        })
    }

    /// Accepts coordinates whose dimensionality is only known at runtime.
    ///
    /// Both arrays must be 1-D axes or both must be 2-D grids.
    pub fn from_dyn(lat: ArrayViewD<f64>, lon: ArrayViewD<f64>) -> anyhow::Result<Self> {
        match (lat.ndim(), lon.ndim()) {
            (1, 1) => Ok(Self::from_axes(
                lat.into_dimensionality::<Ix1>()?,
                lon.into_dimensionality::<Ix1>()?,
            )),
            (2, 2) => Self::from_grids(
                lat.into_dimensionality::<Ix2>()?,
                lon.into_dimensionality::<Ix2>()?,
            ),
            (lat, lon) => bail!(EofError::CoordinateDimension { lat, lon }),
        }
    }

    /// `(nlat, nlon)`
    pub fn shape(&self) -> (usize, usize) {
        self.lat.dim()
    }

    pub fn lat(&self) -> &Array2<f64> {
        &self.lat
    }

    pub fn lon(&self) -> &Array2<f64> {
        &self.lon
    }

    /// Fails unless the grid covers exactly the `(nlat, nlon)` spatial extent of a field.
    pub fn check_shape(&self, field: (usize, usize)) -> anyhow::Result<()> {
        if self.shape() != field {
            bail!(EofError::GridShape {
                grid: self.shape(),
                field,
            });
        }
        Ok(())
    }

    /// Area weights `sqrt(cos(lat))`.
    ///
    /// Squaring the weighted values scales each cell's variance by `cos(lat)`, which is
    /// proportional to the cell area on a regular lat/lon grid. Latitudes outside
    /// [-90, 90] produce NaN.
    pub fn weights(&self) -> Array2<f64> {
        self.lat.mapv(|lat| lat.to_radians().cos().sqrt())
    }
}
