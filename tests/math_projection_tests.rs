//! Tests for the polar stereographic projections.
//!
//! ## Test Organization
//!
//! 1. **Presets** - EPSG lookup
//! 2. **Forward** - Reference coordinates
//! 3. **Inverse** - Round trips

use approx::assert_relative_eq;

use dhdt_rs::internals::math::projection::{PolarStereographic, Projection};

// ============================================================================
// Preset Tests
// ============================================================================

/// Known EPSG codes resolve; others do not.
#[test]
fn test_from_epsg() {
    assert_eq!(Projection::from_epsg(3031), Some(Projection::EPSG_3031));
    assert_eq!(Projection::from_epsg(3413), Some(Projection::EPSG_3413));
    assert_eq!(Projection::from_epsg(4326), None);
}

/// The identity projection passes coordinates through.
#[test]
fn test_identity_passthrough() {
    let p = Projection::Identity;
    assert_eq!(p.forward(12.5, -3.0), (12.5, -3.0));
    assert_eq!(p.inverse(12.5, -3.0), (12.5, -3.0));
}

// ============================================================================
// Forward Tests
// ============================================================================

/// EPSG:3031 reference point on the 45° meridian.
#[test]
fn test_antarctic_forward_reference() {
    let (x, y) = Projection::EPSG_3031.forward(45.0, -75.0);
    assert_relative_eq!(x, 1_158_794.74, max_relative = 1e-6);
    assert_relative_eq!(y, 1_158_794.74, max_relative = 1e-6);
}

/// On the latitude of true scale along the central meridian.
#[test]
fn test_antarctic_true_scale_latitude() {
    let (x, y) = Projection::EPSG_3031.forward(0.0, -71.0);
    assert_relative_eq!(x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(y, 2_082_760.11, max_relative = 1e-6);
}

/// The pole maps to the origin.
#[test]
fn test_pole_maps_to_origin() {
    let (x, y) = Projection::EPSG_3031.forward(0.0, -90.0);
    assert_relative_eq!(x, 0.0, epsilon = 1e-6);
    assert_relative_eq!(y, 0.0, epsilon = 1e-6);
}

/// EPSG:3413 central meridian points along negative y.
#[test]
fn test_greenland_central_meridian() {
    let (x, y) = Projection::EPSG_3413.forward(-45.0, 72.0);
    assert_relative_eq!(x, 0.0, epsilon = 1e-6);
    assert!(y < 0.0);
}

// ============================================================================
// Inverse Tests
// ============================================================================

/// Forward then inverse returns the original coordinates.
#[test]
fn test_round_trip_both_hemispheres() {
    let cases = [
        (Projection::EPSG_3031, -120.0, -80.5),
        (Projection::EPSG_3031, 10.0, -65.0),
        (Projection::EPSG_3413, -50.0, 68.0),
        (Projection::EPSG_3413, 20.0, 81.0),
    ];
    for (p, lon, lat) in cases {
        let (x, y) = p.forward(lon, lat);
        let (lon2, lat2) = p.inverse(x, y);
        assert_relative_eq!(lon2, lon, epsilon = 1e-7);
        assert_relative_eq!(lat2, lat, epsilon = 1e-7);
    }
}

/// A custom parameter set behaves like the preset it mirrors.
#[test]
fn test_custom_parameters() {
    let custom = Projection::PolarStereographic(PolarStereographic {
        latitude_of_true_scale: -71.0,
        central_meridian: 0.0,
        ..PolarStereographic::ANTARCTIC
    });
    let a = custom.forward(30.0, -70.0);
    let b = Projection::EPSG_3031.forward(30.0, -70.0);
    assert_relative_eq!(a.0, b.0);
    assert_relative_eq!(a.1, b.1);
}
