//! Robust weighted regression with iterative outlier rejection.
//!
//! ## Purpose
//!
//! This module fits a model basis to one neighborhood by weighted least
//! squares, rejects observations with large residuals, and refits until no
//! further observation is rejected or the fit budget is spent.
//!
//! ## Design notes
//!
//! * **Snapshot**: The neighborhood (design rows, times, heights, weights) is
//!   immutable; iterations only shrink a boolean inclusion mask.
//! * **Hard threshold**: An observation survives while
//!   `|r| < max(3.5 × robust_std(r), floor)` and `|r| < residual_limit`,
//!   where the floor is `1e-9` or `1024 ε max|h|`, whichever is larger, so
//!   rounding noise of an exact fit never counts as an outlier.
//! * **Rank handling**: Columns the backend cannot estimate are reported with
//!   a zero coefficient and a NaN standard error.
//!
//! ## Key concepts
//!
//! * **Converged**: A fit rejected nothing new.
//! * **Max iterations**: The fit budget ran out; the last fit is kept with
//!   the mask it was computed on.
//! * **Insufficient**: Too few observations or too short a time span remain.
//! * **Degenerate**: No column, or not the trend column, could be estimated.
//!
//! ## Invariants
//!
//! * The inclusion mask is monotone: an excluded observation never returns.
//! * At most `max_fits` weighted fits are performed.
//!
//! ## Non-goals
//!
//! * This module does not select neighborhoods or build design matrices.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::algorithms::basis::{DesignMatrix, ModelBasis};
use crate::math::linalg::FloatLinalg;
use crate::math::mad::robust_std_with_buffer;
use crate::primitives::buffer::FittingBuffer;

// ============================================================================
// Rejection Rule
// ============================================================================

/// Hard-threshold residual rejection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RejectionRule<T> {
    /// Multiple of the robust residual scale beyond which a point is rejected.
    pub scale_factor: T,
    /// Absolute residual limit (data units).
    pub residual_limit: T,
    /// Lower bound on the scaled threshold, so exact fits keep their points.
    pub min_threshold: T,
}

impl<T: Float> RejectionRule<T> {
    /// Default multiple of the robust scale.
    pub const DEFAULT_SCALE_FACTOR: f64 = 3.5;

    /// Minimum threshold for a zero or numerically zero residual scale.
    pub const MIN_THRESHOLD: f64 = 1e-9;

    /// Machine epsilons per unit of height magnitude added to the floor.
    pub const PRECISION_FACTOR: f64 = 1024.0;

    /// Create a rule with the default scale factor and the given absolute limit.
    pub fn new(residual_limit: T) -> Self {
        Self {
            scale_factor: T::from(Self::DEFAULT_SCALE_FACTOR).unwrap(),
            residual_limit,
            min_threshold: T::from(Self::MIN_THRESHOLD).unwrap(),
        }
    }

    /// Threshold for a robust residual scale, for heights of at most `magnitude`.
    #[inline]
    pub fn threshold(&self, scale: T, magnitude: T) -> T {
        let precision = T::from(Self::PRECISION_FACTOR).unwrap() * T::epsilon() * magnitude.abs();
        let floor = self.min_threshold.max(precision);
        let scaled = self.scale_factor * scale;
        if scaled > floor { scaled } else { floor }
    }

    /// Whether a residual survives the threshold.
    #[inline]
    pub fn keeps(&self, residual: T, threshold: T) -> bool {
        let a = residual.abs();
        a < threshold && a < self.residual_limit
    }
}

// ============================================================================
// Problem & Settings
// ============================================================================

/// Immutable snapshot of one neighborhood fit.
#[derive(Debug, Clone, Copy)]
pub struct RegressionProblem<'a, T> {
    /// Model basis the design was built with.
    pub basis: ModelBasis,
    /// Design matrix, one row per observation.
    pub design: &'a DesignMatrix<T>,
    /// Observation times (decimal years).
    pub t: &'a [T],
    /// Observation heights.
    pub h: &'a [T],
    /// Observation weights.
    pub w: &'a [T],
}

/// Settings of the robust solver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SolverSettings<T> {
    /// Minimum number of included observations to attempt a fit.
    pub min_observations: usize,
    /// Minimum time span of the included observations.
    pub min_time_span: T,
    /// Maximum number of weighted fits.
    pub max_fits: usize,
    /// Residual rejection rule.
    pub rejection: RejectionRule<T>,
}

// ============================================================================
// Fit Result
// ============================================================================

/// Terminal state of a successful solve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverState {
    /// The last fit rejected no further observation.
    Converged,
    /// The fit budget was spent; the last fit is reported.
    MaxIterations,
}

/// Why a neighborhood could not be fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolveFailure {
    /// Too few observations or too short a time span remained.
    InsufficientData,
    /// The weighted system could not estimate the trend.
    Degenerate,
}

/// Outcome of a robust fit.
#[derive(Debug, Clone, PartialEq)]
pub struct FitResult<T> {
    /// Coefficients `Cm` in basis column order.
    pub coefficients: Vec<T>,
    /// Standard errors `Ce` (NaN for inactive columns).
    pub std_errors: Vec<T>,
    /// Residuals `h − A·Cm` for every observation of the snapshot.
    pub residuals: Vec<T>,
    /// Observations used by the final fit.
    pub included: Vec<bool>,
    /// Columns estimated by the final fit.
    pub active: Vec<bool>,
    /// Rank of the final fit.
    pub rank: usize,
    /// Weighted adjusted R² of the final fit.
    pub quality: T,
    /// Number of weighted fits performed.
    pub iterations: usize,
    /// Terminal state.
    pub state: SolverState,
    /// Size of the snapshot.
    pub n_initial: usize,
    /// Number of observations in the final fit.
    pub n_final: usize,
    /// Included count at each fit.
    pub trace: Vec<usize>,
}

impl<T: Float> FitResult<T> {
    /// Number of observations rejected over all iterations.
    pub fn n_removed(&self) -> usize {
        self.n_initial - self.n_final
    }

    /// Residuals of the included observations, in snapshot order.
    pub fn included_residuals(&self) -> impl Iterator<Item = T> + '_ {
        self.residuals
            .iter()
            .zip(&self.included)
            .filter(|(_, inc)| **inc)
            .map(|(&r, _)| r)
    }
}

// ============================================================================
// Robust Solver
// ============================================================================

/// Iterative fit → reject → refit solver.
#[derive(Debug, Clone, Copy)]
pub struct RobustSolver<T> {
    settings: SolverSettings<T>,
}

impl<T: FloatLinalg> RobustSolver<T> {
    /// Create a solver.
    pub fn new(settings: SolverSettings<T>) -> Self {
        Self { settings }
    }

    /// The solver settings.
    pub fn settings(&self) -> &SolverSettings<T> {
        &self.settings
    }

    /// Run the robust fit on `problem`.
    pub fn solve(
        &self,
        problem: &RegressionProblem<'_, T>,
        buf: &mut FittingBuffer<T>,
    ) -> Result<FitResult<T>, SolveFailure> {
        let s = &self.settings;
        let n = problem.design.n_rows();
        let p = problem.design.n_cols();
        let trend_col = problem.basis.trend_column();

        buf.ensure_capacity(n, p);
        let mut included = vec![true; n];
        let mut trace = Vec::with_capacity(s.max_fits);
        let mut residuals = vec![T::zero(); n];
        let mut fits = 0usize;

        loop {
            // 1. Gather included rows
            buf.clear();
            let mut t_min = T::infinity();
            let mut t_max = T::neg_infinity();
            for i in (0..n).filter(|&i| included[i]) {
                buf.design.extend_from_slice(problem.design.row(i));
                buf.heights.push(problem.h[i]);
                buf.weights.push(problem.w[i]);
                t_min = t_min.min(problem.t[i]);
                t_max = t_max.max(problem.t[i]);
            }
            let n_inc = buf.heights.len();

            // 2. Pre-fit constraints
            if n_inc == 0 || n_inc < s.min_observations || t_max - t_min < s.min_time_span {
                return Err(SolveFailure::InsufficientData);
            }

            // 3. Weighted least squares
            let wls = T::solve_weighted(&buf.design, &buf.weights, &buf.heights, n_inc, p)
                .ok_or(SolveFailure::Degenerate)?;
            if !wls.active[trend_col] {
                return Err(SolveFailure::Degenerate);
            }
            fits += 1;
            trace.push(n_inc);

            for (i, r) in residuals.iter_mut().enumerate() {
                *r = problem.h[i] - problem.design.predict_row(i, &wls.coefficients);
            }

            // 4. Rejection on the included residuals
            buf.residuals.clear();
            buf.residuals
                .extend((0..n).filter(|&i| included[i]).map(|i| residuals[i]));
            let scale = robust_std_with_buffer(&buf.residuals, &mut buf.scratch);
            let magnitude = buf
                .heights
                .iter()
                .fold(T::zero(), |m, &h| m.max(h.abs()));
            let threshold = s.rejection.threshold(scale, magnitude);

            let mut next = included.clone();
            let mut newly_excluded = 0usize;
            for i in 0..n {
                if included[i] && !s.rejection.keeps(residuals[i], threshold) {
                    next[i] = false;
                    newly_excluded += 1;
                }
            }

            // 5. Termination
            let state = if newly_excluded == 0 {
                Some(SolverState::Converged)
            } else if fits >= s.max_fits {
                Some(SolverState::MaxIterations)
            } else {
                None
            };

            if let Some(state) = state {
                let (std_errors, quality) =
                    self.statistics(buf, &wls.inverse_diagonal, wls.rank);
                return Ok(FitResult {
                    coefficients: wls.coefficients,
                    std_errors,
                    residuals,
                    included,
                    active: wls.active,
                    rank: wls.rank,
                    quality,
                    iterations: fits,
                    state,
                    n_initial: n,
                    n_final: n_inc,
                    trace,
                });
            }

            included = next;
        }
    }

    /// Standard errors and weighted adjusted R² over the gathered rows.
    ///
    /// `buf.residuals` must hold the residuals of the gathered rows.
    fn statistics(
        &self,
        buf: &FittingBuffer<T>,
        inverse_diagonal: &[T],
        rank: usize,
    ) -> (Vec<T>, T) {
        let n = buf.heights.len();
        let one = T::one();

        let mut sw = T::zero();
        let mut swh = T::zero();
        let mut rss = T::zero();
        let rows = buf.weights.iter().zip(buf.heights.iter());
        for ((&w, &h), &r) in rows.zip(buf.residuals.iter()) {
            sw = sw + w;
            swh = swh + w * h;
            rss = rss + w * r * r;
        }
        let mean = swh / sw;
        let tss = buf
            .weights
            .iter()
            .zip(buf.heights.iter())
            .fold(T::zero(), |acc, (&w, &h)| acc + w * (h - mean) * (h - mean));

        let dof = n.saturating_sub(rank);
        let s2 = if dof == 0 {
            T::nan()
        } else {
            rss / T::from(dof).unwrap()
        };

        let std_errors = inverse_diagonal
            .iter()
            .map(|&d| if d.is_nan() { T::nan() } else { (s2 * d).sqrt() })
            .collect();

        let quality = if dof == 0 || !(tss > T::zero()) {
            T::nan()
        } else {
            let r2 = one - rss / tss;
            let n_t = T::from(n).unwrap();
            one - (n_t - one) / T::from(dof).unwrap() * (one - r2)
        };

        (std_errors, quality)
    }
}
