//! Model bases and design-matrix construction.
//!
//! ## Purpose
//!
//! This module defines the four parametric surface models a run can fit and
//! builds the per-neighborhood design matrix and observation weights.
//!
//! ## Design notes
//!
//! * **Tagged variants**: Each [`ModelBasis`] knows its column generator and
//!   where its trend, acceleration, seasonal and slope terms live, so the
//!   solver and derived-quantity code never branch on a model number.
//! * **Trend last**: The linear rate is always the final column.
//! * **Row-major**: The design matrix is a flat row-major buffer.
//!
//! ## Key concepts
//!
//! * **Local origin**: `(xc, yc)` is the evaluation point (point mode) or the
//!   neighborhood median (grid mode); `tref` is the configured or mean time.
//! * **Recomposable terms**: Temporal terms added back to residuals to form
//!   the binned time series.
//!
//! ## Invariants
//!
//! * Every row has exactly `n_columns()` entries.
//! * Weights are strictly positive for positive sigma.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::f64::consts::TAU;
use num_traits::Float;

// Internal dependencies
use crate::primitives::errors::TrendError;

/// Floor added to every observation weight.
pub const WEIGHT_FLOOR: f64 = 1e-3;

// ============================================================================
// Model Basis
// ============================================================================

/// Parametric surface model fitted in each neighborhood.
///
/// | Variant | Columns |
/// |---|---|
/// | `Linear` | intercept, sin, cos, trend |
/// | `LinearAccel` | intercept, accel, sin, cos, trend |
/// | `Biplanar` | intercept, dx, dy, accel, sin, cos, trend |
/// | `Biquadratic` | intercept, dx, dy, dx·dy, dx², dy², accel, sin, cos, trend |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModelBasis {
    /// Trend and seasonal signal.
    Linear,
    /// Trend, acceleration and seasonal signal.
    LinearAccel,
    /// Planar topography plus trend, acceleration and seasonal signal.
    Biplanar,
    /// Quadratic topography plus trend, acceleration and seasonal signal.
    #[default]
    Biquadratic,
}

impl ModelBasis {
    /// Select a model by its numeric index (`0..=3`).
    pub fn from_index(index: usize) -> Result<Self, TrendError> {
        match index {
            0 => Ok(Self::Linear),
            1 => Ok(Self::LinearAccel),
            2 => Ok(Self::Biplanar),
            3 => Ok(Self::Biquadratic),
            _ => Err(TrendError::InvalidModel(index)),
        }
    }

    /// Numeric index of the model.
    pub const fn index(self) -> usize {
        match self {
            Self::Linear => 0,
            Self::LinearAccel => 1,
            Self::Biplanar => 2,
            Self::Biquadratic => 3,
        }
    }

    /// Number of design columns.
    pub const fn n_columns(self) -> usize {
        match self {
            Self::Linear => 4,
            Self::LinearAccel => 5,
            Self::Biplanar => 7,
            Self::Biquadratic => 10,
        }
    }

    /// Temporal columns added back to residuals before binning.
    pub const fn recomposable_columns(self) -> &'static [usize] {
        match self {
            Self::Linear => &[1, 2, 3],
            Self::LinearAccel => &[1, 2, 3, 4],
            Self::Biplanar => &[3, 4, 5, 6],
            Self::Biquadratic => &[6, 7, 8, 9],
        }
    }

    /// Column of the intercept.
    pub const fn intercept_column(self) -> usize {
        0
    }

    /// Column of the linear rate.
    pub const fn trend_column(self) -> usize {
        self.n_columns() - 1
    }

    /// Column of the `dt²/2` term, if the model has one.
    pub const fn acceleration_column(self) -> Option<usize> {
        match self {
            Self::Linear => None,
            Self::LinearAccel => Some(1),
            Self::Biplanar => Some(3),
            Self::Biquadratic => Some(6),
        }
    }

    /// Columns of the annual `(sin, cos)` pair.
    pub const fn seasonal_columns(self) -> (usize, usize) {
        let n = self.n_columns();
        (n - 3, n - 2)
    }

    /// Columns of the `(dx, dy)` terms, if the model has them.
    pub const fn slope_columns(self) -> Option<(usize, usize)> {
        match self {
            Self::Biplanar | Self::Biquadratic => Some((1, 2)),
            _ => None,
        }
    }

    /// Write one design row for offsets `dx`, `dy` (m) and `dt` (yr).
    ///
    /// `row` must hold at least `n_columns()` entries.
    pub fn fill_row<T: Float>(self, dx: T, dy: T, dt: T, row: &mut [T]) {
        let one = T::one();
        let half = T::from(0.5).unwrap();
        let phase = T::from(TAU).unwrap() * dt;
        let (sin, cos) = (phase.sin(), phase.cos());
        let accel = half * dt * dt;

        match self {
            Self::Linear => {
                row[..4].copy_from_slice(&[one, sin, cos, dt]);
            }
            Self::LinearAccel => {
                row[..5].copy_from_slice(&[one, accel, sin, cos, dt]);
            }
            Self::Biplanar => {
                row[..7].copy_from_slice(&[one, dx, dy, accel, sin, cos, dt]);
            }
            Self::Biquadratic => {
                row[..10].copy_from_slice(&[
                    one,
                    dx,
                    dy,
                    dx * dy,
                    dx * dx,
                    dy * dy,
                    accel,
                    sin,
                    cos,
                    dt,
                ]);
            }
        }
    }
}

// ============================================================================
// Design Matrix
// ============================================================================

/// Row-major design matrix of one neighborhood.
#[derive(Debug, Clone, Default)]
pub struct DesignMatrix<T> {
    data: Vec<T>,
    n_rows: usize,
    n_cols: usize,
}

impl<T: Float> DesignMatrix<T> {
    /// Create an empty matrix with room for `rows × cols` entries.
    pub fn with_capacity(rows: usize, cols: usize) -> Self {
        Self {
            data: Vec::with_capacity(rows * cols),
            n_rows: 0,
            n_cols: cols,
        }
    }

    /// Build a matrix from offset arrays of equal length.
    pub fn from_offsets(basis: ModelBasis, dx: &[T], dy: &[T], dt: &[T]) -> Self {
        let mut m = Self::with_capacity(dt.len(), basis.n_columns());
        m.rebuild(basis, dx, dy, dt);
        m
    }

    /// Refill the matrix in place, reusing its allocation.
    pub fn rebuild(&mut self, basis: ModelBasis, dx: &[T], dy: &[T], dt: &[T]) {
        let p = basis.n_columns();
        let n = dt.len();
        self.n_rows = n;
        self.n_cols = p;
        self.data.clear();
        self.data.resize(n * p, T::zero());
        for (i, row) in self.data.chunks_exact_mut(p).enumerate() {
            basis.fill_row(dx[i], dy[i], dt[i], row);
        }
    }

    /// Number of rows.
    #[inline]
    pub fn n_rows(&self) -> usize {
        self.n_rows
    }

    /// Number of columns.
    #[inline]
    pub fn n_cols(&self) -> usize {
        self.n_cols
    }

    /// Row `i`.
    #[inline]
    pub fn row(&self, i: usize) -> &[T] {
        &self.data[i * self.n_cols..(i + 1) * self.n_cols]
    }

    /// `A_i · c` for row `i`.
    #[inline]
    pub fn predict_row(&self, i: usize, coefficients: &[T]) -> T {
        self.row(i)
            .iter()
            .zip(coefficients)
            .fold(T::zero(), |acc, (&a, &c)| acc + a * c)
    }
}

// ============================================================================
// Weights
// ============================================================================

/// Weight of one observation: `1 / (σ² · (1 + (d/dres)²)) + 1e-3`.
#[inline]
pub fn observation_weight<T: Float>(sigma: T, distance: T, resolution: T) -> T {
    let q = distance / resolution;
    T::one() / (sigma * sigma * (T::one() + q * q)) + T::from(WEIGHT_FLOOR).unwrap()
}
