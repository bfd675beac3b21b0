//! Observation storage for altimetry point clouds.
//!
//! ## Purpose
//!
//! This module defines [`ObservationSet`], the structure-of-arrays container
//! for the point cloud a run operates on: planar coordinates, decimal-year
//! times, heights, and the optional per-point uncertainty and mission id.
//!
//! ## Design notes
//!
//! * **Structure-of-arrays**: Each attribute is a contiguous vector for cache-friendly scans.
//! * **Optional columns**: `sigma` and `mission` default to 1 and the configured
//!   reference mission when absent.
//! * **Geographic entry point**: [`ObservationSet::from_geographic`] projects
//!   longitude/latitude and converts epoch seconds to decimal years.
//!
//! ## Invariants
//!
//! * The set is read-only once handed to a processor.
//! * Lengths are validated at `fit()`, not at construction.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::math::projection::Projection;
use crate::primitives::errors::TrendError;

/// Number of seconds in a Julian year (365.25 days).
pub const SECONDS_PER_YEAR: f64 = 3600.0 * 24.0 * 365.25;

/// Convert seconds since an epoch into decimal years since the same epoch.
#[inline]
pub fn seconds_to_years<T: Float>(seconds: T) -> T {
    seconds / T::from(SECONDS_PER_YEAR).unwrap()
}

// ============================================================================
// Observation Set
// ============================================================================

/// A set of altimetry observations in a planar coordinate system.
#[derive(Debug, Clone, PartialEq)]
pub struct ObservationSet<T> {
    /// Planar x coordinate (m).
    pub x: Vec<T>,
    /// Planar y coordinate (m).
    pub y: Vec<T>,
    /// Time (decimal years).
    pub t: Vec<T>,
    /// Height (m).
    pub h: Vec<T>,
    /// Measurement uncertainty (m); `None` means 1 for every point.
    pub sigma: Option<Vec<T>>,
    /// Mission identifier; `None` means the configured reference mission.
    pub mission: Option<Vec<i64>>,
}

impl<T: Float> ObservationSet<T> {
    /// Create a set from planar coordinates, decimal-year times and heights.
    pub fn new(x: Vec<T>, y: Vec<T>, t: Vec<T>, h: Vec<T>) -> Self {
        Self {
            x,
            y,
            t,
            h,
            sigma: None,
            mission: None,
        }
    }

    /// Attach per-observation uncertainties.
    pub fn with_sigma(mut self, sigma: Vec<T>) -> Self {
        self.sigma = Some(sigma);
        self
    }

    /// Attach per-observation mission identifiers.
    pub fn with_missions(mut self, mission: Vec<i64>) -> Self {
        self.mission = Some(mission);
        self
    }

    /// Build a set from geographic coordinates and epoch seconds.
    ///
    /// Longitude and latitude (degrees) are projected with `projection`;
    /// times are converted with [`seconds_to_years`].
    pub fn from_geographic(
        lon: &[T],
        lat: &[T],
        t_seconds: &[T],
        h: Vec<T>,
        projection: &Projection,
    ) -> Result<Self, TrendError> {
        if lat.len() != lon.len() {
            return Err(TrendError::MismatchedInputs {
                field: "lat",
                expected: lon.len(),
                got: lat.len(),
            });
        }

        let mut x = Vec::with_capacity(lon.len());
        let mut y = Vec::with_capacity(lon.len());
        for (&lo, &la) in lon.iter().zip(lat.iter()) {
            let (px, py) = projection.forward(lo, la);
            x.push(px);
            y.push(py);
        }
        let t = t_seconds.iter().map(|&s| seconds_to_years(s)).collect();

        Ok(Self::new(x, y, t, h))
    }

    /// Number of observations.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Returns true if the set holds no observations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}
