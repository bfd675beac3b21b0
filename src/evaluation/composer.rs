//! Output records and time-series tables.
//!
//! ## Purpose
//!
//! This module assembles the per-point outputs of a run: one fixed-width
//! surface-fit record per accepted evaluation point and two parallel
//! time-series rows (binned values and their standard errors) sharing a
//! common time axis.
//!
//! ## Design notes
//!
//! * **Typed records**: Fields a model cannot estimate are `None`; the flat
//!   row form writes them as [`NOT_COMPUTED`].
//! * **Shared pruning**: Records and both time-series collections are built
//!   from the same accepted points, in evaluation order.
//!
//! ## Invariants
//!
//! * Every record has a finite trend error.
//! * `values[i]` and `errors[i]` describe the same point as `records[i]`.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::algorithms::binning::{BinnedSeries, TimeBins};
use crate::algorithms::regression::FitResult;
use crate::evaluation::derived::DerivedQuantities;

/// Flat-row value of a quantity that was not computed.
pub const NOT_COMPUTED: f64 = -9999.0;

/// Number of columns of a flat surface-fit row.
pub const RECORD_WIDTH: usize = 20;

// ============================================================================
// Output Record
// ============================================================================

/// Surface-fit result of one evaluation point.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputRecord<T> {
    /// Latitude of the local origin (degrees, or planar y for identity projections).
    pub lat: T,
    /// Longitude of the local origin (degrees, or planar x for identity projections).
    pub lon: T,
    /// Elevation trend (m/yr).
    pub trend: T,
    /// Standard error of the trend.
    pub trend_err: T,
    /// Acceleration (m/yr²).
    pub acceleration: Option<T>,
    /// Standard error of the acceleration.
    pub acceleration_err: Option<T>,
    /// Intercept (m).
    pub intercept: T,
    /// Standard error of the intercept.
    pub intercept_err: T,
    /// Robust RMS of the final residuals.
    pub rms: T,
    /// Surface slope along x (degrees).
    pub slope_x: Option<T>,
    /// Surface slope along y (degrees).
    pub slope_y: Option<T>,
    /// Time span of the selected neighborhood (yr).
    pub time_span: T,
    /// Reference time of the fit (decimal years).
    pub tref: T,
    /// Annual amplitude (m).
    pub amplitude: T,
    /// Annual phase (fractional years).
    pub phase: T,
    /// Observations in the final fit.
    pub n_obs: usize,
    /// Smallest search radius of the schedule (m).
    pub r_min: T,
    /// Radius the neighborhood was taken at (m).
    pub r_used: T,
    /// Observations rejected as outliers.
    pub n_removed: usize,
    /// Weighted adjusted R².
    pub quality: T,
}

impl<T: Float> OutputRecord<T> {
    /// The record as a fixed-width row; missing fields become [`NOT_COMPUTED`].
    pub fn to_row(&self) -> [T; RECORD_WIDTH] {
        let missing = T::from(NOT_COMPUTED).unwrap();
        let or = |v: Option<T>| v.unwrap_or(missing);
        let count = |n: usize| T::from(n).unwrap_or(missing);
        [
            self.lat,
            self.lon,
            self.trend,
            self.trend_err,
            or(self.acceleration),
            or(self.acceleration_err),
            self.intercept,
            self.intercept_err,
            self.rms,
            or(self.slope_x),
            or(self.slope_y),
            self.time_span,
            self.tref,
            self.amplitude,
            self.phase,
            count(self.n_obs),
            self.r_min,
            self.r_used,
            count(self.n_removed),
            self.quality,
        ]
    }
}

// ============================================================================
// Time Series
// ============================================================================

/// One binned series of one evaluation point.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesRow<T> {
    /// Latitude of the local origin.
    pub lat: T,
    /// Longitude of the local origin.
    pub lon: T,
    /// Window start.
    pub t1: T,
    /// Window end.
    pub t2: T,
    /// One value per bin (NaN for empty bins).
    pub values: Vec<T>,
}

impl<T: Float> TimeSeriesRow<T> {
    /// The row as `lat, lon, t1, t2, n_bins, v_0 … v_{n−1}`.
    pub fn to_row(&self) -> Vec<T> {
        let mut row = Vec::with_capacity(5 + self.values.len());
        row.extend_from_slice(&[
            self.lat,
            self.lon,
            self.t1,
            self.t2,
            T::from(self.values.len()).unwrap(),
        ]);
        row.extend_from_slice(&self.values);
        row
    }
}

/// Binned values and errors of every accepted point.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesTable<T> {
    /// Bin center times shared by every row.
    pub time_axis: Vec<T>,
    /// Bin means.
    pub values: Vec<TimeSeriesRow<T>>,
    /// Standard errors of the bin means.
    pub errors: Vec<TimeSeriesRow<T>>,
}

impl<T: Float> TimeSeriesTable<T> {
    /// An empty table with the given axis.
    pub fn empty(time_axis: Vec<T>) -> Self {
        Self {
            time_axis,
            values: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ============================================================================
// Composer
// ============================================================================

/// Per-point context that does not come from the fit itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointContext<T> {
    /// Latitude of the local origin.
    pub lat: T,
    /// Longitude of the local origin.
    pub lon: T,
    /// Time span of the selected neighborhood.
    pub time_span: T,
    /// Reference time of the fit.
    pub tref: T,
    /// Smallest radius of the schedule.
    pub r_min: T,
    /// Radius the neighborhood was taken at.
    pub r_used: T,
}

/// Everything reported for one accepted point.
#[derive(Debug, Clone, PartialEq)]
pub struct PointSolution<T> {
    /// Surface-fit record.
    pub record: OutputRecord<T>,
    /// Binned means.
    pub values: Vec<T>,
    /// Standard errors of the binned means.
    pub errors: Vec<T>,
}

/// Builds records and time-series rows over a fixed output window.
#[derive(Debug, Clone, Copy)]
pub struct ResultComposer<T> {
    window: TimeBins<T>,
}

impl<T: Float> ResultComposer<T> {
    /// Create a composer for the output window.
    pub fn new(window: TimeBins<T>) -> Self {
        Self { window }
    }

    /// The output window.
    pub fn window(&self) -> &TimeBins<T> {
        &self.window
    }

    /// Compose the solution of one accepted point.
    pub fn compose(
        &self,
        ctx: PointContext<T>,
        derived: &DerivedQuantities<T>,
        fit: &FitResult<T>,
        series: &BinnedSeries<T>,
    ) -> PointSolution<T> {
        let record = OutputRecord {
            lat: ctx.lat,
            lon: ctx.lon,
            trend: derived.trend,
            trend_err: derived.trend_err,
            acceleration: derived.acceleration.map(|a| a.0),
            acceleration_err: derived.acceleration.map(|a| a.1),
            intercept: derived.intercept,
            intercept_err: derived.intercept_err,
            rms: derived.rms,
            slope_x: derived.slope.map(|s| s.0),
            slope_y: derived.slope.map(|s| s.1),
            time_span: ctx.time_span,
            tref: ctx.tref,
            amplitude: derived.amplitude,
            phase: derived.phase,
            n_obs: fit.n_final,
            r_min: ctx.r_min,
            r_used: ctx.r_used,
            n_removed: fit.n_removed(),
            quality: fit.quality,
        };

        PointSolution {
            record,
            values: series.mean.clone(),
            errors: series.standard_errors(),
        }
    }

    /// Assemble accepted solutions into the output tables, in order.
    ///
    /// Solutions whose trend error is not finite are pruned.
    pub fn assemble<I>(&self, solutions: I) -> (Vec<OutputRecord<T>>, TimeSeriesTable<T>)
    where
        I: IntoIterator<Item = PointSolution<T>>,
    {
        let mut records = Vec::new();
        let mut table = TimeSeriesTable::empty(self.window.centers());

        for s in solutions {
            if !s.record.trend_err.is_finite() {
                continue;
            }
            let (lat, lon) = (s.record.lat, s.record.lon);
            table.values.push(self.row(lat, lon, s.values));
            table.errors.push(self.row(lat, lon, s.errors));
            records.push(s.record);
        }

        (records, table)
    }

    fn row(&self, lat: T, lon: T, values: Vec<T>) -> TimeSeriesRow<T> {
        TimeSeriesRow {
            lat,
            lon,
            t1: self.window.t1,
            t2: self.window.t2,
            values,
        }
    }
}
