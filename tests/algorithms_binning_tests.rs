//! Tests for time binning and sampling fraction.
//!
//! ## Test Organization
//!
//! 1. **Bin Geometry** - Count, indices and centers
//! 2. **Sampling Fraction** - Occupied share of bins
//! 3. **Binned Series** - Means, scales and empty bins

use approx::assert_relative_eq;

use dhdt_rs::internals::algorithms::binning::TimeBins;

// ============================================================================
// Bin Geometry Tests
// ============================================================================

/// The count rounds a partial last bin up.
#[test]
fn test_bin_count() {
    assert_eq!(TimeBins::<f64>::new(0.0, 1.0, 0.25).count(), 4);
    assert_eq!(TimeBins::<f64>::new(0.0, 1.1, 0.25).count(), 5);
    assert_eq!(TimeBins::<f64>::monthly(2000.0, 2001.0, 1).count(), 12);
    assert_eq!(TimeBins::<f64>::monthly(2000.0, 2001.0, 3).count(), 4);
}

/// A window with no length has no bins.
#[test]
fn test_empty_window() {
    let bins = TimeBins::<f64>::new(5.0, 5.0, 0.1);
    assert_eq!(bins.count(), 0);
    assert!(bins.centers().is_empty());
    assert_eq!(bins.index_of(5.0), None);
}

/// Bins are half-open `[t1, t2)`.
#[test]
fn test_index_of_half_open() {
    let bins = TimeBins::<f64>::new(0.0, 1.0, 0.25);
    assert_eq!(bins.index_of(0.0), Some(0));
    assert_eq!(bins.index_of(0.25), Some(1));
    assert_eq!(bins.index_of(0.999), Some(3));
    assert_eq!(bins.index_of(1.0), None);
    assert_eq!(bins.index_of(-0.01), None);
}

/// Centers sit mid-bin.
#[test]
fn test_centers() {
    let c = TimeBins::<f64>::new(10.0, 11.0, 0.5).centers();
    assert_eq!(c.len(), 2);
    assert_relative_eq!(c[0], 10.25);
    assert_relative_eq!(c[1], 10.75);
}

// ============================================================================
// Sampling Fraction Tests
// ============================================================================

/// Fraction of bins holding at least one time.
#[test]
fn test_sampling_fraction() {
    let bins = TimeBins::<f64>::new(0.0, 1.0, 0.25);
    let mut occupied = Vec::new();

    let f = bins.sampling_fraction([0.1, 0.12, 0.6], &mut occupied);
    assert_relative_eq!(f, 0.5);

    let full = bins.sampling_fraction([0.1, 0.3, 0.6, 0.9], &mut occupied);
    assert_relative_eq!(full, 1.0);

    let outside = bins.sampling_fraction([2.0, -1.0], &mut occupied);
    assert_relative_eq!(outside, 0.0);
}

// ============================================================================
// Binned Series Tests
// ============================================================================

/// Means, counts and sums per bin; empty bins are NaN.
#[test]
fn test_bin_values() {
    let bins = TimeBins::<f64>::new(0.0, 1.0, 0.25);
    let t = [0.05_f64, 0.1, 0.2, 0.8, 1.5];
    let v = [1.0, 2.0, 3.0, 10.0, 99.0];

    let s = bins.bin(&t, &v);
    assert_eq!(s.len(), 4);
    assert_eq!(s.count, vec![3, 0, 0, 1]);
    assert_relative_eq!(s.mean[0], 2.0);
    assert_relative_eq!(s.sum[0], 6.0);
    assert_relative_eq!(s.mean[3], 10.0);
    assert!(s.mean[1].is_nan());
    assert!(s.sum[2].is_nan());
}

/// Standard errors are `robust std / sqrt(count)`.
#[test]
fn test_standard_errors() {
    let bins = TimeBins::<f64>::new(0.0, 1.0, 0.5);
    let t = [0.1_f64, 0.2, 0.3, 0.4];
    let v = [1.0, 2.0, 3.0, 4.0];

    let s = bins.bin(&t, &v);
    let se = s.standard_errors();
    // robust std of [1, 2, 3, 4] = 1.4826
    assert_relative_eq!(s.scale[0], 1.4826);
    assert_relative_eq!(se[0], 1.4826 / 2.0);
    assert!(se[1].is_nan());
}

/// A series with one sample per bin at the bin centers bins to itself.
#[test]
fn test_binning_idempotent() {
    let bins = TimeBins::<f64>::new(0.0, 1.0, 0.25);
    let t = bins.centers();
    let v = vec![3.0_f64, -1.5, 0.25, 7.0];

    let once = bins.bin(&t, &v);
    assert_eq!(once.count, vec![1; 4]);
    assert_eq!(once.centers, t);
    for (m, e) in once.mean.iter().zip(&v) {
        assert_relative_eq!(*m, *e);
    }

    let twice = bins.bin(&once.centers, &once.mean);
    assert_eq!(twice.count, once.count);
    for (a, b) in twice.mean.iter().zip(&once.mean) {
        assert_relative_eq!(*a, *b);
    }
    for (a, b) in twice.sum.iter().zip(&once.sum) {
        assert_relative_eq!(*a, *b);
    }
}
