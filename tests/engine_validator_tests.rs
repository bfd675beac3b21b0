//! Tests for input and configuration validation.
//!
//! ## Test Organization
//!
//! 1. **Observations** - Lengths, finiteness, sigma
//! 2. **Parameters** - Individual parameter bounds
//! 3. **Configuration** - Whole-config checks

use dhdt_rs::internals::engine::executor::TrendConfig;
use dhdt_rs::internals::engine::validator::Validator;
use dhdt_rs::internals::primitives::errors::TrendError;
use dhdt_rs::internals::primitives::observation::ObservationSet;

fn obs(n: usize) -> ObservationSet<f64> {
    ObservationSet::new(
        vec![0.0; n],
        vec![0.0; n],
        (0..n).map(|i| i as f64).collect(),
        vec![1.0; n],
    )
}

// ============================================================================
// Observation Tests
// ============================================================================

/// Consistent observations pass, including the empty set.
#[test]
fn test_valid_observations() {
    assert!(Validator::validate_observations(&obs(5)).is_ok());
    assert!(Validator::validate_observations(&obs(0)).is_ok());
}

/// A short array is reported by name.
#[test]
fn test_length_mismatch() {
    let mut o = obs(5);
    o.h.pop();
    assert_eq!(
        Validator::validate_observations(&o),
        Err(TrendError::MismatchedInputs {
            field: "h",
            expected: 5,
            got: 4
        })
    );

    let o = obs(3).with_missions(vec![1, 2]);
    assert!(matches!(
        Validator::validate_observations(&o),
        Err(TrendError::MismatchedInputs { field: "mission", .. })
    ));
}

/// Non-finite coordinates, times or heights are rejected.
#[test]
fn test_non_finite_values() {
    let mut o = obs(4);
    o.t[2] = f64::NAN;
    assert!(matches!(
        Validator::validate_observations(&o),
        Err(TrendError::InvalidNumericValue(_))
    ));

    let mut o = obs(4);
    o.x[0] = f64::INFINITY;
    assert!(Validator::validate_observations(&o).is_err());
}

/// Sigma must be strictly positive.
#[test]
fn test_non_positive_sigma() {
    let o = obs(3).with_sigma(vec![1.0, 0.0, 1.0]);
    assert_eq!(
        Validator::validate_observations(&o),
        Err(TrendError::NonPositiveSigma {
            index: 1,
            value: 0.0
        })
    );
}

// ============================================================================
// Parameter Tests
// ============================================================================

/// Radii must be positive and ordered.
#[test]
fn test_radius_bounds() {
    assert!(Validator::validate_radius(500.0, 1000.0).is_ok());
    assert!(Validator::validate_radius(1000.0, 1000.0).is_ok());
    assert!(Validator::validate_radius(2000.0, 1000.0).is_err());
    assert!(Validator::validate_radius(0.0, 1000.0).is_err());
    assert!(Validator::validate_radius_step(0.0).is_err());
}

/// Iterations must lie in `[1, 1000]`.
#[test]
fn test_iterations_bounds() {
    assert!(Validator::validate_iterations(1).is_ok());
    assert!(Validator::validate_iterations(1000).is_ok());
    assert_eq!(
        Validator::validate_iterations(0),
        Err(TrendError::InvalidIterations(0))
    );
    assert!(Validator::validate_iterations(1001).is_err());
}

/// Time spans and bounding boxes must be ordered.
#[test]
fn test_spans_and_boxes() {
    assert!(Validator::validate_time_span::<f64>(None).is_ok());
    assert!(Validator::validate_time_span(Some((2000.0, 2010.0))).is_ok());
    assert!(Validator::validate_time_span(Some((2010.0, 2000.0))).is_err());

    assert!(Validator::validate_bounding_box(Some([0.0, 1.0, 0.0, 1.0])).is_ok());
    assert_eq!(
        Validator::validate_bounding_box(Some([0.0, 1.0, 1.0, 1.0])),
        Err(TrendError::InvalidBoundingBox([0.0, 1.0, 1.0, 1.0]))
    );
}

/// Limits, bin width and duplicates.
#[test]
fn test_misc_parameters() {
    assert!(Validator::validate_positive_limit(0.0, "trend_limit").is_err());
    assert!(Validator::validate_non_negative_limit(0.0, "min_time_span").is_ok());
    assert!(Validator::validate_non_negative_limit(-1.0, "min_time_span").is_err());
    assert!(Validator::validate_bin_width(0).is_err());
    assert!(Validator::validate_min_observations(0).is_err());
    assert_eq!(
        Validator::validate_no_duplicates(Some("radius")),
        Err(TrendError::DuplicateParameter {
            parameter: "radius"
        })
    );
}

// ============================================================================
// Configuration Tests
// ============================================================================

/// The default configuration is valid.
#[test]
fn test_default_config_valid() {
    assert!(Validator::validate_config(&TrendConfig::<f64>::default()).is_ok());
}

/// A single bad field fails the whole configuration.
#[test]
fn test_config_reports_first_error() {
    let config = TrendConfig::<f64> {
        resolution: -1.0,
        ..TrendConfig::default()
    };
    assert_eq!(
        Validator::validate_config(&config),
        Err(TrendError::InvalidResolution(-1.0))
    );

    let config = TrendConfig::<f64> {
        reference_time: Some(f64::NAN),
        ..TrendConfig::default()
    };
    assert!(matches!(
        Validator::validate_config(&config),
        Err(TrendError::InvalidNumericValue(_))
    ));
}
