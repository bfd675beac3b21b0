//! Input validation for surface-trend configuration and data.
//!
//! ## Purpose
//!
//! This module checks configuration parameters when a processor is built and
//! observation arrays when a processor is fitted, so that per-point work only
//! ever sees consistent input.
//!
//! ## Design notes
//!
//! * **Fail-Fast**: Validation stops at the first error encountered.
//! * **Efficiency**: Checks are ordered from cheap to expensive.
//! * **Generics**: Validation is generic over `Float` types.
//!
//! ## Key concepts
//!
//! * **Parameter Bounds**: Positive radii ordered `min <= max`, positive spacing and limits.
//! * **Finite Checks**: All observation values are finite; sigma is strictly positive.
//!
//! ## Invariants
//!
//! * Validation logic is deterministic and side-effect free.
//!
//! ## Non-goals
//!
//! * This module does not filter observations (the executor does).
//! * Empty observation sets are not errors; they produce an empty result.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::format;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::engine::executor::TrendConfig;
use crate::primitives::errors::TrendError;
use crate::primitives::observation::ObservationSet;

/// Upper bound on the number of fits per evaluation point.
pub const MAX_ITERATIONS: usize = 1000;

// ============================================================================
// Validator
// ============================================================================

/// Validation utility for surface-trend configuration and input data.
///
/// All methods return `Result<(), TrendError>` and fail fast upon
/// identifying the first violation.
pub struct Validator;

impl Validator {
    // ========================================================================
    // Core Input Validation
    // ========================================================================

    /// Validate an observation set.
    pub fn validate_observations<T: Float>(obs: &ObservationSet<T>) -> Result<(), TrendError> {
        let n = obs.x.len();

        // Check 1: Matching lengths
        let lengths = [
            ("y", obs.y.len()),
            ("t", obs.t.len()),
            ("h", obs.h.len()),
            ("sigma", obs.sigma.as_ref().map_or(n, |s| s.len())),
            ("mission", obs.mission.as_ref().map_or(n, |m| m.len())),
        ];
        for (field, got) in lengths {
            if got != n {
                return Err(TrendError::MismatchedInputs {
                    field,
                    expected: n,
                    got,
                });
            }
        }

        // Check 2: All values finite
        Self::validate_finite(&obs.x, "x")?;
        Self::validate_finite(&obs.y, "y")?;
        Self::validate_finite(&obs.t, "t")?;
        Self::validate_finite(&obs.h, "h")?;

        // Check 3: Strictly positive sigma
        if let Some(sigma) = &obs.sigma {
            for (index, &s) in sigma.iter().enumerate() {
                if !(s.is_finite() && s > T::zero()) {
                    return Err(TrendError::NonPositiveSigma {
                        index,
                        value: s.to_f64().unwrap_or(f64::NAN),
                    });
                }
            }
        }

        Ok(())
    }

    /// Validate that every value of a named array is finite.
    pub fn validate_finite<T: Float>(vals: &[T], name: &str) -> Result<(), TrendError> {
        for (i, &val) in vals.iter().enumerate() {
            if !val.is_finite() {
                return Err(TrendError::InvalidNumericValue(format!(
                    "{}[{}]={}",
                    name,
                    i,
                    val.to_f64().unwrap_or(f64::NAN)
                )));
            }
        }
        Ok(())
    }

    /// Validate a single numeric value for finiteness.
    pub fn validate_scalar<T: Float>(val: T, name: &str) -> Result<(), TrendError> {
        if !val.is_finite() {
            return Err(TrendError::InvalidNumericValue(format!(
                "{}={}",
                name,
                val.to_f64().unwrap_or(f64::NAN)
            )));
        }
        Ok(())
    }

    // ========================================================================
    // Parameter Validation
    // ========================================================================

    /// Validate the search radius range.
    pub fn validate_radius<T: Float>(min: T, max: T) -> Result<(), TrendError> {
        if !(min.is_finite() && max.is_finite() && min > T::zero() && min <= max) {
            return Err(TrendError::InvalidRadius {
                min: min.to_f64().unwrap_or(f64::NAN),
                max: max.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(())
    }

    /// Validate the radius increment.
    pub fn validate_radius_step<T: Float>(step: T) -> Result<(), TrendError> {
        if !(step.is_finite() && step > T::zero()) {
            return Err(TrendError::InvalidRadiusStep(
                step.to_f64().unwrap_or(f64::NAN),
            ));
        }
        Ok(())
    }

    /// Validate the correlation length of the distance weighting.
    pub fn validate_resolution<T: Float>(resolution: T) -> Result<(), TrendError> {
        if !(resolution.is_finite() && resolution > T::zero()) {
            return Err(TrendError::InvalidResolution(
                resolution.to_f64().unwrap_or(f64::NAN),
            ));
        }
        Ok(())
    }

    /// Validate the grid spacing.
    pub fn validate_grid_spacing<T: Float>(spacing: T) -> Result<(), TrendError> {
        if !(spacing.is_finite() && spacing > T::zero()) {
            return Err(TrendError::InvalidGridSpacing(
                spacing.to_f64().unwrap_or(f64::NAN),
            ));
        }
        Ok(())
    }

    /// Validate an optional solution time span.
    pub fn validate_time_span<T: Float>(span: Option<(T, T)>) -> Result<(), TrendError> {
        if let Some((start, end)) = span {
            if !(start.is_finite() && end.is_finite() && start < end) {
                return Err(TrendError::InvalidTimeSpan {
                    start: start.to_f64().unwrap_or(f64::NAN),
                    end: end.to_f64().unwrap_or(f64::NAN),
                });
            }
        }
        Ok(())
    }

    /// Validate an optional bounding box `[xmin, xmax, ymin, ymax]`.
    pub fn validate_bounding_box<T: Float>(bbox: Option<[T; 4]>) -> Result<(), TrendError> {
        if let Some(b) = bbox {
            let finite = b.iter().all(|v| v.is_finite());
            if !(finite && b[0] < b[1] && b[2] < b[3]) {
                return Err(TrendError::InvalidBoundingBox(
                    b.map(|v| v.to_f64().unwrap_or(f64::NAN)),
                ));
            }
        }
        Ok(())
    }

    /// Validate the minimum number of observations per fit.
    pub fn validate_min_observations(n: usize) -> Result<(), TrendError> {
        if n == 0 {
            return Err(TrendError::InvalidMinObservations(n));
        }
        Ok(())
    }

    /// Validate the number of fits per point.
    ///
    /// # Notes
    ///
    /// * At least one fit is required.
    /// * Maximum of 1000 fits to prevent excessive computation.
    pub fn validate_iterations(iterations: usize) -> Result<(), TrendError> {
        if iterations == 0 || iterations > MAX_ITERATIONS {
            return Err(TrendError::InvalidIterations(iterations));
        }
        Ok(())
    }

    /// Validate the residual bin width (months).
    pub fn validate_bin_width(months: usize) -> Result<(), TrendError> {
        if months == 0 {
            return Err(TrendError::InvalidBinWidth(months));
        }
        Ok(())
    }

    /// Validate a strictly positive, finite limit.
    pub fn validate_positive_limit<T: Float>(
        value: T,
        name: &'static str,
    ) -> Result<(), TrendError> {
        if !(value.is_finite() && value > T::zero()) {
            return Err(TrendError::InvalidLimit {
                name,
                value: value.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(())
    }

    /// Validate a non-negative, finite limit.
    pub fn validate_non_negative_limit<T: Float>(
        value: T,
        name: &'static str,
    ) -> Result<(), TrendError> {
        if !(value.is_finite() && value >= T::zero()) {
            return Err(TrendError::InvalidLimit {
                name,
                value: value.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(())
    }

    /// Validate that no parameter was set multiple times.
    pub fn validate_no_duplicates(duplicate_param: Option<&'static str>) -> Result<(), TrendError> {
        if let Some(param) = duplicate_param {
            return Err(TrendError::DuplicateParameter { parameter: param });
        }
        Ok(())
    }

    // ========================================================================
    // Full Configuration
    // ========================================================================

    /// Validate a complete configuration.
    pub fn validate_config<T: Float>(config: &TrendConfig<T>) -> Result<(), TrendError> {
        Self::validate_grid_spacing(config.grid_spacing)?;
        Self::validate_radius(config.radius_min, config.radius_max)?;
        Self::validate_radius_step(config.radius_step)?;
        Self::validate_resolution(config.resolution)?;
        Self::validate_min_observations(config.min_observations)?;
        Self::validate_iterations(config.iterations)?;
        Self::validate_time_span(config.time_span)?;
        if let Some(tref) = config.reference_time {
            Self::validate_scalar(tref, "reference_time")?;
        }
        Self::validate_positive_limit(config.trend_limit, "trend_limit")?;
        Self::validate_non_negative_limit(config.min_time_span, "min_time_span")?;
        Self::validate_positive_limit(config.residual_limit, "residual_limit")?;
        Self::validate_bin_width(config.bin_width_months)?;
        Self::validate_bounding_box(config.bounding_box)?;
        Ok(())
    }
}
