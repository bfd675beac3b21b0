//! Fixed-width time binning of residual series.
//!
//! ## Purpose
//!
//! Accepted fits are compressed into a regular time series: residuals (with
//! the temporal model terms added back) are averaged in fixed-width bins
//! spanning the run's solution window. The same bins, at monthly width,
//! measure how evenly a neighborhood samples time.
//!
//! ## Design notes
//!
//! * Bins are half-open `[t1 + k·w, t1 + (k+1)·w)` anchored at `t1`; the
//!   window itself is `[t1, t2)`, so a sample at exactly `t2` falls outside.
//! * The bin count is `ceil((t2 − t1) / w)`; the last bin may extend past `t2`.
//! * Empty bins report NaN statistics and a zero count.
//!
//! ## Invariants
//!
//! * Every sample inside the window lands in exactly one bin.
//! * Bin centers are `t1 + (k + ½)·w`.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::math::mad::robust_std_with_buffer;

/// Width of one calendar month in decimal years.
pub const MONTH: f64 = 1.0 / 12.0;

// ============================================================================
// Time Bins
// ============================================================================

/// A fixed-width partition of the window `[t1, t2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeBins<T> {
    /// Window start (decimal years).
    pub t1: T,
    /// Window end (decimal years, exclusive).
    pub t2: T,
    /// Bin width (decimal years).
    pub width: T,
}

impl<T: Float> TimeBins<T> {
    /// Create bins of `width` over `[t1, t2)`.
    pub fn new(t1: T, t2: T, width: T) -> Self {
        Self { t1, t2, width }
    }

    /// Create bins of `months` calendar months over `[t1, t2)`.
    pub fn monthly(t1: T, t2: T, months: usize) -> Self {
        let width = T::from(months as f64 * MONTH).unwrap();
        Self::new(t1, t2, width)
    }

    /// Number of bins.
    pub fn count(&self) -> usize {
        let span = self.t2 - self.t1;
        if !(span > T::zero()) || !(self.width > T::zero()) {
            return 0;
        }
        (span / self.width).ceil().to_usize().unwrap_or(0)
    }

    /// Bin holding `t`, or `None` outside `[t1, t2)`.
    #[inline]
    pub fn index_of(&self, t: T) -> Option<usize> {
        if !(t >= self.t1 && t < self.t2) {
            return None;
        }
        let n = self.count();
        let k = ((t - self.t1) / self.width).floor().to_usize()?;
        Some(k.min(n.saturating_sub(1)))
    }

    /// Center time of bin `k`.
    #[inline]
    pub fn center(&self, k: usize) -> T {
        self.t1 + (T::from(k).unwrap() + T::from(0.5).unwrap()) * self.width
    }

    /// Centers of all bins.
    pub fn centers(&self) -> Vec<T> {
        (0..self.count()).map(|k| self.center(k)).collect()
    }

    /// Share of bins holding at least one of the times `t`.
    ///
    /// `occupied` is scratch storage. Returns 0 when there are no bins.
    pub fn sampling_fraction<I>(&self, t: I, occupied: &mut Vec<bool>) -> T
    where
        I: IntoIterator<Item = T>,
    {
        let n = self.count();
        if n == 0 {
            return T::zero();
        }
        occupied.clear();
        occupied.resize(n, false);
        for ti in t {
            if let Some(k) = self.index_of(ti) {
                occupied[k] = true;
            }
        }
        let filled = occupied.iter().filter(|&&o| o).count();
        T::from(filled).unwrap() / T::from(n).unwrap()
    }

    /// Bin `values` by their times `t`.
    pub fn bin(&self, t: &[T], values: &[T]) -> BinnedSeries<T> {
        let n = self.count();
        let nan = T::nan();

        // Group sample indices per bin
        let mut members: Vec<Vec<T>> = (0..n).map(|_| Vec::new()).collect();
        for (&ti, &vi) in t.iter().zip(values) {
            if let Some(k) = self.index_of(ti) {
                members[k].push(vi);
            }
        }

        let mut series = BinnedSeries {
            centers: self.centers(),
            mean: vec![nan; n],
            scale: vec![nan; n],
            count: vec![0; n],
            sum: vec![nan; n],
        };

        let mut scratch = Vec::new();
        for (k, m) in members.iter().enumerate() {
            if m.is_empty() {
                continue;
            }
            let sum = m.iter().fold(T::zero(), |acc, &v| acc + v);
            series.count[k] = m.len();
            series.sum[k] = sum;
            series.mean[k] = sum / T::from(m.len()).unwrap();
            series.scale[k] = robust_std_with_buffer(m, &mut scratch);
        }

        series
    }
}

// ============================================================================
// Binned Series
// ============================================================================

/// Per-bin statistics of a binned series.
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedSeries<T> {
    /// Bin center times.
    pub centers: Vec<T>,
    /// Mean per bin (NaN when empty).
    pub mean: Vec<T>,
    /// Robust standard deviation per bin (NaN when empty).
    pub scale: Vec<T>,
    /// Number of samples per bin.
    pub count: Vec<usize>,
    /// Sum per bin (NaN when empty).
    pub sum: Vec<T>,
}

impl<T: Float> BinnedSeries<T> {
    /// Number of bins.
    pub fn len(&self) -> usize {
        self.centers.len()
    }

    /// Returns true if there are no bins.
    pub fn is_empty(&self) -> bool {
        self.centers.is_empty()
    }

    /// Standard error of each bin mean: `scale / sqrt(count)` (NaN when empty).
    pub fn standard_errors(&self) -> Vec<T> {
        self.scale
            .iter()
            .zip(&self.count)
            .map(|(&s, &c)| {
                if c == 0 {
                    T::nan()
                } else {
                    s / T::from(c).unwrap().sqrt()
                }
            })
            .collect()
    }
}
