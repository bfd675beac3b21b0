//! Tests for bilinear raster sampling.
//!
//! ## Test Organization
//!
//! 1. **Construction** - Shape and axis checks
//! 2. **Sampling** - Nodes, interior points and bounds

use approx::assert_relative_eq;

use dhdt_rs::internals::math::raster::GridRaster;
use dhdt_rs::internals::primitives::errors::TrendError;

/// Plane `z = 1 + 2x + 3y` on a 3×3 grid over `[0, 2] × [0, 2]`.
fn plane() -> GridRaster<f64> {
    let xs = vec![0.0, 1.0, 2.0];
    let ys = vec![0.0, 1.0, 2.0];
    let mut values = Vec::new();
    for &y in &ys {
        for &x in &xs {
            values.push(1.0 + 2.0 * x + 3.0 * y);
        }
    }
    GridRaster::new(xs, ys, values).unwrap()
}

// ============================================================================
// Construction Tests
// ============================================================================

/// A well-formed raster reports its shape.
#[test]
fn test_shape() {
    let r = plane();
    assert_eq!(r.nx(), 3);
    assert_eq!(r.ny(), 3);
}

/// Too few nodes, a wrong value count or a non-increasing axis are rejected.
#[test]
fn test_malformed_rasters() {
    let single = GridRaster::new(vec![0.0], vec![0.0, 1.0], vec![0.0, 0.0]);
    assert!(matches!(single, Err(TrendError::InvalidRaster(_))));

    let short = GridRaster::new(vec![0.0, 1.0], vec![0.0, 1.0], vec![0.0; 3]);
    assert!(matches!(short, Err(TrendError::InvalidRaster(_))));

    let decreasing = GridRaster::new(vec![1.0, 0.0], vec![0.0, 1.0], vec![0.0; 4]);
    assert!(matches!(decreasing, Err(TrendError::InvalidRaster(_))));

    let nan_axis = GridRaster::new(vec![0.0, f64::NAN], vec![0.0, 1.0], vec![0.0; 4]);
    assert!(matches!(nan_axis, Err(TrendError::InvalidRaster(_))));
}

// ============================================================================
// Sampling Tests
// ============================================================================

/// Nodes return their stored values, including the far corner.
#[test]
fn test_sample_at_nodes() {
    let r = plane();
    assert_relative_eq!(r.sample(0.0, 0.0).unwrap(), 1.0);
    assert_relative_eq!(r.sample(1.0, 2.0).unwrap(), 9.0);
    assert_relative_eq!(r.sample(2.0, 2.0).unwrap(), 11.0);
}

/// Bilinear interpolation reproduces a plane exactly.
#[test]
fn test_sample_interior() {
    let r = plane();
    assert_relative_eq!(r.sample(0.25, 1.5).unwrap(), 1.0 + 0.5 + 4.5, epsilon = 1e-12);
    assert_relative_eq!(r.sample(1.9, 0.1).unwrap(), 1.0 + 3.8 + 0.3, epsilon = 1e-12);
}

/// Points outside the grid have no value.
#[test]
fn test_sample_outside() {
    let r = plane();
    assert!(r.sample(-0.1, 1.0).is_none());
    assert!(r.sample(1.0, 2.1).is_none());
}

/// Cells touching a NaN node have no value.
#[test]
fn test_sample_nan_cell() {
    let r = GridRaster::new(
        vec![0.0, 1.0, 2.0],
        vec![0.0, 1.0],
        vec![0.0, 0.0, f64::NAN, 0.0, 0.0, 0.0],
    )
    .unwrap();
    assert_relative_eq!(r.sample(0.5, 0.5).unwrap(), 0.0);
    assert!(r.sample(1.5, 0.5).is_none());
}
