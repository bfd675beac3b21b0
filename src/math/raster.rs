//! Bilinear sampling of a gridded elevation model.
//!
//! ## Purpose
//!
//! A reference surface (e.g. a DEM) can be subtracted from every observation
//! before fitting so that the local model only has to describe the anomaly.
//! This module stores such a surface on a rectilinear grid in the run's
//! planar coordinate system and samples it bilinearly.
//!
//! ## Design notes
//!
//! * Axes only need to be strictly increasing, not evenly spaced.
//! * Cells are located by binary search on each axis.
//! * Samples outside the grid, or touching a non-finite node, are `None`.
//!
//! ## Invariants
//!
//! * `values.len() == xs.len() * ys.len()`, row-major with y as the row index.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::{format, vec::Vec};
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::TrendError;

/// A rectilinear grid of elevations.
#[derive(Debug, Clone, PartialEq)]
pub struct GridRaster<T> {
    xs: Vec<T>,
    ys: Vec<T>,
    values: Vec<T>,
}

impl<T: Float> GridRaster<T> {
    /// Create a raster from its axes and row-major values (`values[iy * nx + ix]`).
    pub fn new(xs: Vec<T>, ys: Vec<T>, values: Vec<T>) -> Result<Self, TrendError> {
        if xs.len() < 2 || ys.len() < 2 {
            return Err(TrendError::InvalidRaster(format!(
                "need at least 2x2 nodes, got {}x{}",
                xs.len(),
                ys.len()
            )));
        }
        if values.len() != xs.len() * ys.len() {
            return Err(TrendError::InvalidRaster(format!(
                "expected {} values, got {}",
                xs.len() * ys.len(),
                values.len()
            )));
        }
        check_axis(&xs, "x")?;
        check_axis(&ys, "y")?;

        Ok(Self { xs, ys, values })
    }

    /// Number of columns.
    pub fn nx(&self) -> usize {
        self.xs.len()
    }

    /// Number of rows.
    pub fn ny(&self) -> usize {
        self.ys.len()
    }

    /// Sample the raster bilinearly at `(x, y)`.
    pub fn sample(&self, x: T, y: T) -> Option<T> {
        let (ix, fx) = locate(&self.xs, x)?;
        let (iy, fy) = locate(&self.ys, y)?;

        let nx = self.xs.len();
        let z00 = self.values[iy * nx + ix];
        let z10 = self.values[iy * nx + ix + 1];
        let z01 = self.values[(iy + 1) * nx + ix];
        let z11 = self.values[(iy + 1) * nx + ix + 1];

        let one = T::one();
        let z = z00 * (one - fx) * (one - fy)
            + z10 * fx * (one - fy)
            + z01 * (one - fx) * fy
            + z11 * fx * fy;

        if z.is_finite() { Some(z) } else { None }
    }
}

fn check_axis<T: Float>(axis: &[T], name: &str) -> Result<(), TrendError> {
    if axis.iter().any(|v| !v.is_finite()) {
        return Err(TrendError::InvalidRaster(format!(
            "{name} axis contains non-finite values"
        )));
    }
    if axis.windows(2).any(|w| w[1] <= w[0]) {
        return Err(TrendError::InvalidRaster(format!(
            "{name} axis must be strictly increasing"
        )));
    }
    Ok(())
}

/// Lower cell index and fractional offset of `v` on `axis`.
fn locate<T: Float>(axis: &[T], v: T) -> Option<(usize, T)> {
    let n = axis.len();
    if !(v >= axis[0] && v <= axis[n - 1]) {
        return None;
    }
    // First node strictly greater than v, clamped so the last node maps to the last cell
    let upper = axis.partition_point(|&a| a <= v).clamp(1, n - 1);
    let lo = upper - 1;
    let frac = (v - axis[lo]) / (axis[upper] - axis[lo]);
    Some((lo, frac))
}
