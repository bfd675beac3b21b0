//! Output types and result structures for surface-trend runs.
//!
//! ## Purpose
//!
//! This module defines [`TrendResult`], which bundles the surface-fit
//! records, the time-series tables, the run status and the run diagnostics.
//!
//! ## Design notes
//!
//! * **Status, not errors**: A run that produces no rows still succeeds; the
//!   reason is carried in [`RunStatus::NoResults`].
//! * **Flat rows**: `*_rows()` helpers emit the fixed-width tables.
//! * **Ergonomics**: Implements `Display` for a human-readable summary.
//!
//! ## Invariants
//!
//! * `surface_fit`, `time_series.values` and `time_series.errors` have the same length.
//! * `RunStatus::Completed` implies at least one record.
//!
//! ## Non-goals
//!
//! * This module does not perform calculations beyond summary statistics.
//! * This module does not provide serialization logic.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::fmt::{Debug, Display, Formatter, Result};
use num_traits::Float;

// Internal dependencies
use crate::algorithms::basis::ModelBasis;
use crate::engine::executor::{EvaluationMode, PointOutcome};
use crate::evaluation::composer::{OutputRecord, RECORD_WIDTH, TimeSeriesTable};

// ============================================================================
// Run Status
// ============================================================================

/// Why a run produced no rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoResultReason {
    /// The observation set was empty.
    EmptyInput,
    /// No observation fell inside the bounding box (or the detrending raster).
    NoDataInBounds,
    /// No observation fell inside the solution time span.
    NoDataInTimeSpan,
    /// No evaluation point passed every gate.
    NoAcceptedPoints,
}

/// Terminal status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// At least one evaluation point produced a row.
    Completed,
    /// The run produced no rows.
    NoResults(NoResultReason),
}

// ============================================================================
// Diagnostics
// ============================================================================

/// Counters describing what happened during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunDiagnostics {
    /// Observations supplied.
    pub n_input: usize,
    /// Observations dropped because the detrending raster had no value there.
    pub n_off_raster: usize,
    /// Observations dropped by the bounding box.
    pub n_outside_bounds: usize,
    /// Observations dropped by the solution time span.
    pub n_outside_time_span: usize,
    /// Observations available to the neighborhood search.
    pub n_used: usize,
    /// Evaluation points.
    pub n_points: usize,
    /// Points that produced a row.
    pub n_accepted: usize,
    /// Points with an empty neighborhood at every radius.
    pub n_no_neighbors: usize,
    /// Points with too few observations or too short a time span.
    pub n_insufficient: usize,
    /// Points whose weighted system could not estimate the trend.
    pub n_degenerate: usize,
    /// Points whose trend exceeded the limit or had a non-finite error.
    pub n_rejected: usize,
    /// Outliers removed across all accepted points.
    pub n_outliers_removed: usize,
}

impl RunDiagnostics {
    /// Count one point outcome.
    pub fn record<T: Float>(&mut self, outcome: &PointOutcome<T>) {
        match outcome {
            PointOutcome::Accepted(s) => {
                self.n_accepted += 1;
                self.n_outliers_removed += s.record.n_removed;
            }
            PointOutcome::NoNeighbors => self.n_no_neighbors += 1,
            PointOutcome::Insufficient => self.n_insufficient += 1,
            PointOutcome::Degenerate => self.n_degenerate += 1,
            PointOutcome::Rejected => self.n_rejected += 1,
        }
    }
}

// ============================================================================
// Result Structure
// ============================================================================

/// Output of a surface-trend run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendResult<T> {
    /// One record per accepted evaluation point.
    pub surface_fit: Vec<OutputRecord<T>>,
    /// Binned residual series and their errors.
    pub time_series: TimeSeriesTable<T>,
    /// Terminal status.
    pub status: RunStatus,
    /// Run counters.
    pub diagnostics: RunDiagnostics,
    /// Model basis the run fitted.
    pub model: ModelBasis,
    /// Evaluation mode of the run.
    pub mode: EvaluationMode,
}

/// Summary statistics of the accepted trends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSummary<T> {
    /// Mean trend.
    pub mean: T,
    /// Standard deviation of the trends.
    pub std: T,
    /// Smallest trend.
    pub min: T,
    /// Largest trend.
    pub max: T,
}

impl<T: Float> TrendResult<T> {
    /// Number of accepted evaluation points.
    pub fn len(&self) -> usize {
        self.surface_fit.len()
    }

    /// Returns true if no point was accepted.
    pub fn is_empty(&self) -> bool {
        self.surface_fit.is_empty()
    }

    /// Surface-fit records as fixed-width rows.
    pub fn surface_rows(&self) -> Vec<[T; RECORD_WIDTH]> {
        self.surface_fit.iter().map(|r| r.to_row()).collect()
    }

    /// Binned values as flat rows.
    pub fn value_rows(&self) -> Vec<Vec<T>> {
        self.time_series.values.iter().map(|r| r.to_row()).collect()
    }

    /// Binned errors as flat rows.
    pub fn error_rows(&self) -> Vec<Vec<T>> {
        self.time_series.errors.iter().map(|r| r.to_row()).collect()
    }

    /// Mean, standard deviation and range of the accepted trends.
    pub fn trend_summary(&self) -> Option<TrendSummary<T>> {
        if self.surface_fit.is_empty() {
            return None;
        }
        let n = T::from(self.surface_fit.len()).unwrap();
        let mut sum = T::zero();
        let mut min = T::infinity();
        let mut max = T::neg_infinity();
        for r in &self.surface_fit {
            sum = sum + r.trend;
            min = min.min(r.trend);
            max = max.max(r.trend);
        }
        let mean = sum / n;
        let var = self
            .surface_fit
            .iter()
            .fold(T::zero(), |acc, r| acc + (r.trend - mean) * (r.trend - mean))
            / n;
        Some(TrendSummary {
            mean,
            std: var.sqrt(),
            min,
            max,
        })
    }
}

impl<T: Float + Display + Debug> Display for TrendResult<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let d = &self.diagnostics;
        writeln!(f, "Summary:")?;
        writeln!(f, "  Model:             {:?}", self.model)?;
        writeln!(f, "  Mode:              {:?}", self.mode)?;
        writeln!(f, "  Observations:      {} ({} used)", d.n_input, d.n_used)?;
        writeln!(f, "  Evaluation points: {}", d.n_points)?;
        writeln!(f, "  Accepted:          {}", d.n_accepted)?;
        writeln!(
            f,
            "  Skipped:           {} no neighbors, {} insufficient, {} degenerate, {} rejected",
            d.n_no_neighbors, d.n_insufficient, d.n_degenerate, d.n_rejected
        )?;

        match self.status {
            RunStatus::Completed => {}
            RunStatus::NoResults(reason) => {
                writeln!(f, "  Status:            no results ({reason:?})")?;
                return Ok(());
            }
        }

        if let Some(s) = self.trend_summary() {
            writeln!(f)?;
            writeln!(f, "Trend (m/yr):")?;
            writeln!(f, "  Mean: {:.4}", s.mean)?;
            writeln!(f, "  Std:  {:.4}", s.std)?;
            writeln!(f, "  Min:  {:.4}", s.min)?;
            writeln!(f, "  Max:  {:.4}", s.max)?;
        }

        writeln!(f)?;
        writeln!(
            f,
            "{:>12} {:>12} {:>10} {:>10} {:>8} {:>6}",
            "Lat", "Lon", "Trend", "Trend_Err", "RMS", "N"
        )?;
        writeln!(f, "{}", "-".repeat(63))?;
        for r in self.surface_fit.iter().take(10) {
            writeln!(
                f,
                "{:>12.4} {:>12.4} {:>10.4} {:>10.4} {:>8.3} {:>6}",
                r.lat, r.lon, r.trend, r.trend_err, r.rms, r.n_obs
            )?;
        }
        if self.surface_fit.len() > 10 {
            writeln!(f, "  ... ({} more rows)", self.surface_fit.len() - 10)?;
        }

        Ok(())
    }
}
