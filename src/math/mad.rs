//! Median Absolute Deviation (MAD) computation for robust scale estimation.
//!
//! ## Purpose
//!
//! This module provides the robust scale used by outlier rejection, the
//! reported fit RMS and the binned error bars: the normal-consistent MAD,
//! `1.4826 × median(|x − median(x)|)`.
//!
//! ## Design notes
//!
//! * **Algorithm**: Uses Quickselect for O(n) median finding.
//! * **Memory**: The `_with_buffer` variant reuses a caller-owned scratch vector.
//! * **Missing values**: NaN entries are skipped; an all-missing input yields NaN.
//!
//! ## Key concepts
//!
//! * **Robustness**: 50% breakdown point (safe against 50% outliers).
//! * **Consistency**: The 1.4826 factor makes the estimate match σ for Gaussian data.
//!
//! ## Invariants
//!
//! * The robust scale is >= 0 whenever at least one finite value is present.
//! * A constant sequence has scale exactly 0.
//!
//! ## Non-goals
//!
//! * This module does not provide weighted MAD variants.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::cmp::Ordering::Equal;
use num_traits::Float;

/// Scale factor converting a MAD into a Gaussian-consistent standard deviation.
pub const MAD_TO_STD: f64 = 1.4826;

// ============================================================================
// MAD Computation
// ============================================================================

/// Compute the Median Absolute Deviation (MAD) in-place, avoiding extra allocations.
///
/// # Formula
///
/// ```text
/// MAD = median(|r_i - median(r)|)
/// ```
///
/// # Safety
///
/// This function modifies the provided `vals` slice. Inputs must be finite.
#[inline]
pub fn compute_mad<T: Float>(vals: &mut [T]) -> T {
    if vals.is_empty() {
        return T::zero();
    }

    let median: T = median_inplace(vals);

    for val in vals.iter_mut() {
        *val = (*val - median).abs();
    }

    median_inplace(vals)
}

/// Compute the median in-place using Quickselect.
#[inline]
pub fn median_inplace<T: Float>(vals: &mut [T]) -> T {
    let n = vals.len();
    if n == 0 {
        return T::zero();
    }

    let mid = n / 2;
    vals.select_nth_unstable_by(mid, |a, b| a.partial_cmp(b).unwrap_or(Equal));
    let upper = vals[mid];

    if n % 2 == 0 {
        // Largest value of the lower half
        let lower = vals[..mid].iter().copied().fold(T::neg_infinity(), T::max);
        (lower + upper) / T::from(2.0).unwrap()
    } else {
        upper
    }
}

// ============================================================================
// Robust Scale
// ============================================================================

/// Robust standard deviation of `vals`, skipping NaN entries.
///
/// Returns NaN if no finite value is present.
pub fn robust_std<T: Float>(vals: &[T]) -> T {
    let mut scratch = Vec::with_capacity(vals.len());
    robust_std_with_buffer(vals, &mut scratch)
}

/// Robust standard deviation of `vals` using `scratch` as working storage.
pub fn robust_std_with_buffer<T: Float>(vals: &[T], scratch: &mut Vec<T>) -> T {
    scratch.clear();
    scratch.extend(vals.iter().copied().filter(|v| v.is_finite()));
    if scratch.is_empty() {
        return T::nan();
    }
    T::from(MAD_TO_STD).unwrap() * compute_mad(scratch)
}
