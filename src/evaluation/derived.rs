//! Physically meaningful quantities derived from a robust fit.
//!
//! ## Purpose
//!
//! This module extracts the reported quantities from fitted coefficients:
//! elevation trend, acceleration, intercept, annual amplitude and phase,
//! surface slopes and the robust residual RMS. It also recomposes the
//! residual series that is binned into a time series.
//!
//! ## Design notes
//!
//! * Column positions come from the [`ModelBasis`]; nothing here depends on
//!   a model number.
//! * Quantities a model cannot estimate are `None`.
//!
//! ## Key concepts
//!
//! * **Phase**: `atan2(cos, sin) / 2π`, in fractional years.
//! * **Slope**: `atan(c)` of the `dx`/`dy` coefficients, in degrees.
//! * **Recomposed series**: Residuals plus the temporal model terms.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::f64::consts::TAU;
use num_traits::Float;

// Internal dependencies
use crate::algorithms::basis::{DesignMatrix, ModelBasis};
use crate::algorithms::regression::FitResult;
use crate::math::mad::robust_std;

// ============================================================================
// Derived Quantities
// ============================================================================

/// Quantities reported for one accepted fit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DerivedQuantities<T> {
    /// Linear elevation rate (m/yr).
    pub trend: T,
    /// Standard error of the rate.
    pub trend_err: T,
    /// Acceleration `(value, error)` (m/yr²), for models with a `dt²/2` term.
    pub acceleration: Option<(T, T)>,
    /// Elevation at the local origin and `tref`.
    pub intercept: T,
    /// Standard error of the intercept.
    pub intercept_err: T,
    /// Annual amplitude `sqrt(sin² + cos²)`.
    pub amplitude: T,
    /// Annual phase (fractional years).
    pub phase: T,
    /// Surface slopes `(x, y)` in degrees, for models with planar terms.
    pub slope: Option<(T, T)>,
    /// Robust standard deviation of the final residuals.
    pub rms: T,
}

impl<T: Float> DerivedQuantities<T> {
    /// Extract the quantities of `fit` for `basis`.
    pub fn from_fit(basis: ModelBasis, fit: &FitResult<T>) -> Self {
        let c = &fit.coefficients;
        let e = &fit.std_errors;

        let trend_col = basis.trend_column();
        let (sin_col, cos_col) = basis.seasonal_columns();
        let (cs, cc) = (c[sin_col], c[cos_col]);

        let acceleration = basis.acceleration_column().map(|j| (c[j], e[j]));
        let slope = basis
            .slope_columns()
            .map(|(jx, jy)| (c[jx].atan().to_degrees(), c[jy].atan().to_degrees()));

        let included: Vec<T> = fit.included_residuals().collect();

        let intercept_col = basis.intercept_column();
        Self {
            trend: c[trend_col],
            trend_err: e[trend_col],
            acceleration,
            intercept: c[intercept_col],
            intercept_err: e[intercept_col],
            amplitude: (cs * cs + cc * cc).sqrt(),
            phase: cc.atan2(cs) / T::from(TAU).unwrap(),
            slope,
            rms: robust_std(&included),
        }
    }

    /// Whether the trend passes the rate limit and has a finite error.
    pub fn within_limits(&self, trend_limit: T) -> bool {
        self.trend.abs() <= trend_limit && self.trend_err.is_finite()
    }
}

// ============================================================================
// Recomposition
// ============================================================================

/// Residuals of the included observations with the temporal terms added back.
///
/// Returns `(times, values)` in snapshot order.
pub fn recompose<T: Float>(
    basis: ModelBasis,
    design: &DesignMatrix<T>,
    t: &[T],
    fit: &FitResult<T>,
) -> (Vec<T>, Vec<T>) {
    let cols = basis.recomposable_columns();
    let mut times = Vec::with_capacity(fit.n_final);
    let mut values = Vec::with_capacity(fit.n_final);

    for (i, (&r, &inc)) in fit.residuals.iter().zip(&fit.included).enumerate() {
        if !inc {
            continue;
        }
        let row = design.row(i);
        let signal = cols
            .iter()
            .fold(T::zero(), |acc, &j| acc + row[j] * fit.coefficients[j]);
        times.push(t[i]);
        values.push(r + signal);
    }

    (times, values)
}
