//! Linear algebra backend for weighted least squares.
//!
//! ## Purpose
//!
//! This module solves the weighted normal equations of one neighborhood fit
//! and reports which model columns were actually estimable. It standardizes
//! on nalgebra behind the [`FloatLinalg`] bridge trait.
//!
//! ## Design notes
//!
//! * The Gram matrix `AᵀWA` is equilibrated to unit diagonal before factoring.
//! * Columns with negligible RMS are numerically null and never admitted.
//! * Remaining columns are admitted greedily in basis order; a column whose
//!   Cholesky pivot on the equilibrated matrix falls below a tolerance is
//!   linearly dependent on earlier columns and left out.
//! * Generic over `FloatLinalg` types (f32 and f64) which delegate to nalgebra.
//!
//! ## Invariants
//!
//! * Inactive columns have coefficient 0 and a NaN inverse diagonal.
//! * `rank` equals the number of active columns.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::fmt::Debug;
use num_traits::Float;

/// RMS below which a design column is treated as numerically null.
pub const NULL_COLUMN_RMS: f64 = 1e-12;

/// Minimum squared Cholesky pivot on the equilibrated Gram matrix.
pub const PIVOT_TOLERANCE: f64 = 1e-10;

// ============================================================================
// Solution Type
// ============================================================================

/// Solution of a weighted least squares problem.
#[derive(Debug, Clone, PartialEq)]
pub struct WlsSolution<T> {
    /// Coefficients for every column (0 for inactive columns).
    pub coefficients: Vec<T>,
    /// Diagonal of `(AᵀWA)⁻¹` restricted to active columns (NaN for inactive).
    pub inverse_diagonal: Vec<T>,
    /// Which columns entered the solution.
    pub active: Vec<bool>,
    /// Number of active columns.
    pub rank: usize,
}

// ============================================================================
// FloatLinalg Trait
// ============================================================================

/// Helper trait to bridge generic Float types to the nalgebra backend.
pub trait FloatLinalg: Float + Debug + Send + Sync + 'static {
    /// Solve `min Σ w_i (b_i − A_i·c)²` for a row-major `n_rows × n_cols` design.
    ///
    /// Returns `None` if no column can be admitted.
    fn solve_weighted(
        design: &[Self],
        weights: &[Self],
        rhs: &[Self],
        n_rows: usize,
        n_cols: usize,
    ) -> Option<WlsSolution<Self>>;
}

impl FloatLinalg for f64 {
    #[inline]
    fn solve_weighted(
        design: &[Self],
        weights: &[Self],
        rhs: &[Self],
        n_rows: usize,
        n_cols: usize,
    ) -> Option<WlsSolution<Self>> {
        nalgebra_backend::solve_weighted(design, weights, rhs, n_rows, n_cols)
    }
}

impl FloatLinalg for f32 {
    #[inline]
    fn solve_weighted(
        design: &[Self],
        weights: &[Self],
        rhs: &[Self],
        n_rows: usize,
        n_cols: usize,
    ) -> Option<WlsSolution<Self>> {
        nalgebra_backend::solve_weighted(design, weights, rhs, n_rows, n_cols)
    }
}

// ============================================================================
// Nalgebra Backend Implementation
// ============================================================================

/// Nalgebra-based linear algebra operations.
pub mod nalgebra_backend {
    use super::*;
    use nalgebra::{DMatrix, DVector, RealField};

    /// Solve the weighted problem with column screening and greedy admission.
    pub fn solve_weighted<N: RealField + Copy>(
        design: &[N],
        weights: &[N],
        rhs: &[N],
        n_rows: usize,
        n_cols: usize,
    ) -> Option<WlsSolution<N>> {
        let zero = N::zero();
        let one = N::one();
        let null_rms: N = nalgebra::convert(NULL_COLUMN_RMS);
        let pivot_tol: N = nalgebra::convert(PIVOT_TOLERANCE);

        if n_rows == 0 || n_cols == 0 {
            return None;
        }

        // Accumulate AᵀWA, AᵀWb and the unweighted column sums of squares
        let mut gram = DMatrix::<N>::zeros(n_cols, n_cols);
        let mut atb = DVector::<N>::zeros(n_cols);
        let mut col_ss = vec![zero; n_cols];
        for i in 0..n_rows {
            let row = &design[i * n_cols..(i + 1) * n_cols];
            let w = weights[i];
            for j in 0..n_cols {
                let wa = w * row[j];
                atb[j] += wa * rhs[i];
                col_ss[j] += row[j] * row[j];
                for k in j..n_cols {
                    gram[(j, k)] += wa * row[k];
                }
            }
        }
        for j in 0..n_cols {
            for k in 0..j {
                gram[(j, k)] = gram[(k, j)];
            }
        }

        // Equilibration factors; null columns get 0
        let n_real: N = nalgebra::convert(n_rows as f64);
        let mut scale = vec![zero; n_cols];
        for j in 0..n_cols {
            let rms = (col_ss[j] / n_real).sqrt();
            if rms > null_rms && gram[(j, j)] > zero {
                scale[j] = one / gram[(j, j)].sqrt();
            }
        }

        // Greedy admission in basis order
        let mut active_idx: Vec<usize> = Vec::with_capacity(n_cols);
        for j in 0..n_cols {
            if scale[j] == zero {
                continue;
            }
            active_idx.push(j);
            let sub = equilibrated_submatrix(&gram, &scale, &active_idx);
            let admitted = match sub.cholesky() {
                Some(chol) => {
                    let k = active_idx.len() - 1;
                    let pivot = chol.l_dirty()[(k, k)];
                    pivot * pivot > pivot_tol
                }
                None => false,
            };
            if !admitted {
                active_idx.pop();
            }
        }

        if active_idx.is_empty() {
            return None;
        }

        let sub = equilibrated_submatrix(&gram, &scale, &active_idx);
        let chol = sub.cholesky()?;
        let scaled_rhs = DVector::<N>::from_iterator(
            active_idx.len(),
            active_idx.iter().map(|&j| atb[j] * scale[j]),
        );
        let z = chol.solve(&scaled_rhs);
        let inv = chol.inverse();

        let mut coefficients = vec![zero; n_cols];
        let nan: N = nalgebra::convert(f64::NAN);
        let mut inverse_diagonal = vec![nan; n_cols];
        let mut active = vec![false; n_cols];
        for (a, &j) in active_idx.iter().enumerate() {
            coefficients[j] = z[a] * scale[j];
            inverse_diagonal[j] = inv[(a, a)] * scale[j] * scale[j];
            active[j] = true;
        }

        Some(WlsSolution {
            coefficients,
            inverse_diagonal,
            active,
            rank: active_idx.len(),
        })
    }

    fn equilibrated_submatrix<N: RealField + Copy>(
        gram: &DMatrix<N>,
        scale: &[N],
        idx: &[usize],
    ) -> DMatrix<N> {
        let m = idx.len();
        DMatrix::from_fn(m, m, |r, c| {
            let (i, j) = (idx[r], idx[c]);
            gram[(i, j)] * scale[i] * scale[j]
        })
    }
}
