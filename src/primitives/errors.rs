//! Error types for surface-trend estimation.
//!
//! ## Purpose
//!
//! This module defines the error conditions that stop a run before or at the
//! input boundary: invalid configuration and violated input contracts.
//!
//! ## Design notes
//!
//! * **Contextual**: Errors carry the offending value or index.
//! * **Deferred**: Duplicate builder parameters are recorded and reported at `build()`.
//! * **No-std**: Supports `no_std` environments by using `alloc` for dynamic messages.
//! * **Trait Implementation**: Implements `Display` and `std::error::Error` (when `std` is enabled).
//!
//! ## Key concepts
//!
//! 1. **Input validation**: Mismatched lengths, non-finite values, bad sigma.
//! 2. **Parameter validation**: Radii, spacing, limits, model selector, iterations.
//! 3. **Collaborator contracts**: Malformed detrending rasters.
//!
//! ## Invariants
//!
//! * Per-point failures (too few neighbors, rejected trend, degenerate fit)
//!   and empty inputs are never represented here; they are outcomes, not errors.
//!
//! ## Non-goals
//!
//! * This module does not perform the validation logic itself.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::string::String;
#[cfg(feature = "std")]
use std::error::Error;
#[cfg(feature = "std")]
use std::string::String;

// External dependencies
use core::fmt::{Display, Formatter, Result};

// ============================================================================
// Error Type
// ============================================================================

/// Error type for surface-trend estimation.
#[derive(Debug, Clone, PartialEq)]
pub enum TrendError {
    /// Observation arrays have different lengths.
    MismatchedInputs {
        /// Name of the offending array.
        field: &'static str,
        /// Expected number of elements (length of `x`).
        expected: usize,
        /// Actual number of elements.
        got: usize,
    },

    /// Input data contains NaN or infinite values.
    InvalidNumericValue(String),

    /// Measurement uncertainty must be strictly positive and finite.
    NonPositiveSigma {
        /// Index of the offending observation.
        index: usize,
        /// The sigma value found.
        value: f64,
    },

    /// Model selector outside `0..=3`.
    InvalidModel(usize),

    /// Search radii must be positive, finite and ordered `min <= max`.
    InvalidRadius {
        /// Smallest search radius.
        min: f64,
        /// Largest search radius.
        max: f64,
    },

    /// Radius step must be positive and finite.
    InvalidRadiusStep(f64),

    /// Correlation length of the distance weighting must be positive.
    InvalidResolution(f64),

    /// Grid spacing must be positive and finite.
    InvalidGridSpacing(f64),

    /// Time span must satisfy `start < end`.
    InvalidTimeSpan {
        /// Start of the span (decimal years).
        start: f64,
        /// End of the span (decimal years).
        end: f64,
    },

    /// Bounding box must satisfy `xmin < xmax` and `ymin < ymax`.
    InvalidBoundingBox([f64; 4]),

    /// The minimum number of observations per fit must be at least 1.
    InvalidMinObservations(usize),

    /// The outlier-rejection loop requires between 1 and 1000 fits.
    InvalidIterations(usize),

    /// Residual bin width must be at least one month.
    InvalidBinWidth(usize),

    /// A positive limit parameter (trend limit, residual limit, time span) is invalid.
    InvalidLimit {
        /// Name of the parameter.
        name: &'static str,
        /// Value provided.
        value: f64,
    },

    /// The detrending raster is malformed.
    InvalidRaster(String),

    /// No built-in projection for this EPSG code.
    UnsupportedProjection(u32),

    /// Parameter was set multiple times in the builder.
    DuplicateParameter {
        /// Name of the parameter that was set multiple times.
        parameter: &'static str,
    },
}

// ============================================================================
// Display Implementation
// ============================================================================

impl Display for TrendError {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Self::MismatchedInputs {
                field,
                expected,
                got,
            } => {
                write!(
                    f,
                    "Length mismatch: {field} has {got} elements, expected {expected}"
                )
            }
            Self::InvalidNumericValue(s) => write!(f, "Invalid numeric value: {s}"),
            Self::NonPositiveSigma { index, value } => {
                write!(f, "Invalid sigma at index {index}: {value} (must be > 0)")
            }
            Self::InvalidModel(m) => write!(f, "Invalid model: {m} (must be in [0, 3])"),
            Self::InvalidRadius { min, max } => {
                write!(
                    f,
                    "Invalid search radius: [{min}, {max}] (must be > 0 and min <= max)"
                )
            }
            Self::InvalidRadiusStep(s) => write!(f, "Invalid radius step: {s} (must be > 0)"),
            Self::InvalidResolution(r) => write!(f, "Invalid resolution: {r} (must be > 0)"),
            Self::InvalidGridSpacing(d) => write!(f, "Invalid grid spacing: {d} (must be > 0)"),
            Self::InvalidTimeSpan { start, end } => {
                write!(f, "Invalid time span: [{start}, {end}] (must have start < end)")
            }
            Self::InvalidBoundingBox(b) => {
                write!(
                    f,
                    "Invalid bounding box: [{}, {}, {}, {}] (must have xmin < xmax and ymin < ymax)",
                    b[0], b[1], b[2], b[3]
                )
            }
            Self::InvalidMinObservations(n) => {
                write!(f, "Invalid minimum observations: {n} (must be >= 1)")
            }
            Self::InvalidIterations(iter) => {
                write!(f, "Invalid iterations: {iter} (must be in [1, 1000])")
            }
            Self::InvalidBinWidth(w) => write!(f, "Invalid bin width: {w} months (must be >= 1)"),
            Self::InvalidLimit { name, value } => {
                write!(f, "Invalid {name}: {value} (must be > 0 and finite)")
            }
            Self::InvalidRaster(msg) => write!(f, "Invalid raster: {msg}"),
            Self::UnsupportedProjection(code) => {
                write!(f, "Unsupported projection: EPSG:{code} (expected 3031 or 3413)")
            }
            Self::DuplicateParameter { parameter } => {
                write!(
                    f,
                    "Parameter '{parameter}' was set multiple times. Each parameter can only be configured once."
                )
            }
        }
    }
}

// ============================================================================
// Standard Error Trait
// ============================================================================

#[cfg(feature = "std")]
impl Error for TrendError {}
