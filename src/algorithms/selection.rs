//! Adaptive neighborhood selection.
//!
//! ## Purpose
//!
//! For each evaluation point the selector grows a search radius through a
//! fixed schedule and stops at the first neighborhood that is dense enough,
//! long enough in time, multi-mission enough and evenly sampled in time.
//!
//! ## Design notes
//!
//! * **Schedule**: `r_k = r_min + k·step` while `r_k <= r_max + 1e-4`.
//! * **Fallback**: If no radius qualifies, the largest non-empty neighborhood
//!   is returned with `qualified = false`; the caller decides whether to fit it.
//! * **Recentering**: With a single-radius schedule in grid mode, the query is
//!   repeated once at the median coordinate of the first neighborhood.
//!
//! ## Key concepts
//!
//! * **Time span**: `max t − min t` over the neighborhood.
//! * **Sampling fraction**: Share of monthly bins over the run window that
//!   contain at least one observation.
//!
//! ## Invariants
//!
//! * Selection is deterministic for a given tree and configuration.
//! * Empty neighborhoods are never returned.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::algorithms::binning::TimeBins;
use crate::math::mad::median_inplace;
use crate::math::neighborhood::{KDTree, Neighborhood};
use crate::primitives::buffer::{NeighborhoodSearchBuffer, SelectionBuffer};

/// Tolerance added to the largest radius when building the schedule (m).
pub const RADIUS_TOLERANCE: f64 = 1e-4;

/// Minimum sampling fraction for a neighborhood to qualify.
pub const MIN_SAMPLING_FRACTION: f64 = 0.70;

// ============================================================================
// Radius Schedule
// ============================================================================

/// Increasing sequence of search radii.
#[derive(Debug, Clone, PartialEq)]
pub struct RadiusSchedule<T> {
    radii: Vec<T>,
}

impl<T: Float> RadiusSchedule<T> {
    /// Build `r_min, r_min + step, …` up to `r_max` (inclusive within tolerance).
    pub fn new(r_min: T, r_max: T, step: T) -> Self {
        let limit = r_max + T::from(RADIUS_TOLERANCE).unwrap();
        let mut radii = Vec::new();
        let mut k = 0usize;
        loop {
            let r = r_min + T::from(k).unwrap() * step;
            if r > limit {
                break;
            }
            radii.push(r);
            k += 1;
        }
        if radii.is_empty() {
            radii.push(r_min);
        }
        Self { radii }
    }

    /// The radii, ascending.
    pub fn radii(&self) -> &[T] {
        &self.radii
    }

    /// Smallest radius.
    pub fn min(&self) -> T {
        self.radii[0]
    }

    /// Largest radius.
    pub fn max(&self) -> T {
        self.radii[self.radii.len() - 1]
    }

    /// Returns true if the schedule holds a single radius.
    pub fn is_single(&self) -> bool {
        self.radii.len() == 1
    }
}

// ============================================================================
// Selection
// ============================================================================

/// Acceptance thresholds for a neighborhood.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectionCriteria<T> {
    /// The neighborhood must hold more than this many observations.
    pub min_observations: usize,
    /// The neighborhood must span more than this many years.
    pub min_time_span: T,
    /// The neighborhood must contain at least this many distinct missions.
    pub min_missions: usize,
    /// The neighborhood must fill more than this share of monthly bins.
    pub min_sampling_fraction: T,
}

/// A selected neighborhood and its statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<T> {
    /// Indices of the observations in the neighborhood, ascending.
    pub indices: Vec<usize>,
    /// Radius the neighborhood was taken at.
    pub radius: T,
    /// Query point actually used (after recentering).
    pub center: (T, T),
    /// Time span `max t − min t`.
    pub time_span: T,
    /// Number of distinct missions.
    pub n_missions: usize,
    /// Share of occupied monthly bins.
    pub sampling_fraction: T,
    /// Whether every acceptance test passed.
    pub qualified: bool,
}

impl<T> Selection<T> {
    /// Number of observations in the neighborhood.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if the neighborhood is empty.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Read-only view of the data a selector queries.
#[derive(Debug, Clone, Copy)]
pub struct SelectionData<'a, T: Float> {
    /// Spatial index over `(x, y)`.
    pub tree: &'a KDTree<T>,
    /// Planar x coordinates.
    pub x: &'a [T],
    /// Planar y coordinates.
    pub y: &'a [T],
    /// Decimal-year times.
    pub t: &'a [T],
    /// Mission identifiers.
    pub mission: &'a [i64],
}

/// Radius-schedule neighborhood selector.
#[derive(Debug, Clone)]
pub struct NeighborhoodSelector<'a, T: Float> {
    data: SelectionData<'a, T>,
    schedule: &'a RadiusSchedule<T>,
    criteria: SelectionCriteria<T>,
    sampling_bins: TimeBins<T>,
    recenter: bool,
}

impl<'a, T: Float> NeighborhoodSelector<'a, T> {
    /// Create a selector.
    ///
    /// `recenter` enables the median re-query; it only takes effect for a
    /// single-radius schedule.
    pub fn new(
        data: SelectionData<'a, T>,
        schedule: &'a RadiusSchedule<T>,
        criteria: SelectionCriteria<T>,
        sampling_bins: TimeBins<T>,
        recenter: bool,
    ) -> Self {
        Self {
            data,
            schedule,
            criteria,
            sampling_bins,
            recenter,
        }
    }

    /// Select the neighborhood of `(qx, qy)`, or `None` if every radius is empty.
    pub fn select(
        &self,
        qx: T,
        qy: T,
        search: &mut NeighborhoodSearchBuffer,
        neighborhood: &mut Neighborhood<T>,
        scratch: &mut SelectionBuffer<T>,
    ) -> Option<Selection<T>> {
        let mut last: Option<Selection<T>> = None;

        for &r in self.schedule.radii() {
            self.data
                .tree
                .find_within_radius(qx, qy, r, search, neighborhood);
            if neighborhood.is_empty() {
                continue;
            }

            let mut center = (qx, qy);
            if self.recenter && self.schedule.is_single() {
                center = self.median_center(&neighborhood.indices, scratch);
                self.data
                    .tree
                    .find_within_radius(center.0, center.1, r, search, neighborhood);
                if neighborhood.is_empty() {
                    continue;
                }
            }

            let selection = self.evaluate(r, center, &neighborhood.indices, scratch);
            if selection.qualified {
                return Some(selection);
            }
            last = Some(selection);
        }

        last
    }

    fn evaluate(
        &self,
        radius: T,
        center: (T, T),
        indices: &[usize],
        scratch: &mut SelectionBuffer<T>,
    ) -> Selection<T> {
        let t = self.data.t;

        let (t_min, t_max) = indices
            .iter()
            .fold((T::infinity(), T::neg_infinity()), |(lo, hi), &i| {
                (lo.min(t[i]), hi.max(t[i]))
            });
        let time_span = t_max - t_min;

        scratch.missions.clear();
        scratch
            .missions
            .extend(indices.iter().map(|&i| self.data.mission[i]));
        scratch.missions.sort_unstable();
        scratch.missions.dedup();
        let n_missions = scratch.missions.len();

        let sampling_fraction = self
            .sampling_bins
            .sampling_fraction(indices.iter().map(|&i| t[i]), &mut scratch.occupied);

        let c = &self.criteria;
        let qualified = indices.len() > c.min_observations
            && time_span > c.min_time_span
            && n_missions >= c.min_missions
            && sampling_fraction > c.min_sampling_fraction;

        Selection {
            indices: indices.to_vec(),
            radius,
            center,
            time_span,
            n_missions,
            sampling_fraction,
            qualified,
        }
    }

    fn median_center(&self, indices: &[usize], scratch: &mut SelectionBuffer<T>) -> (T, T) {
        median_coordinate(self.data.x, self.data.y, indices, &mut scratch.coords)
    }
}

/// Median of the coordinates `(x[i], y[i])` over `indices`.
pub fn median_coordinate<T: Float>(
    x: &[T],
    y: &[T],
    indices: &[usize],
    scratch: &mut Vec<T>,
) -> (T, T) {
    scratch.clear();
    scratch.extend(indices.iter().map(|&i| x[i]));
    let mx = median_inplace(scratch);
    scratch.clear();
    scratch.extend(indices.iter().map(|&i| y[i]));
    let my = median_inplace(scratch);
    (mx, my)
}
