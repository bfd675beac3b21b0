//! # dhdt-rs: Robust Local Surface-Elevation Trends for Rust
//!
//! Estimates the rate of surface-elevation change (dh/dt) from scattered
//! altimetry observations. At each evaluation point a neighborhood of
//! observations is selected, a local space-time model is fitted by iteratively
//! reweighted least squares with outlier rejection, and the trend, its error,
//! and a binned residual time series are reported.
//!
//! ## How it works
//!
//! 1. Observations are filtered to the bounding box (grown by the largest
//!    search radius) and the solution time span, optionally after removing a
//!    reference surface sampled from a raster.
//! 2. For each evaluation point (a grid node or an observation), radii from
//!    `r_min` to `r_max` are tried until the neighborhood has enough
//!    observations, time span, missions and temporal sampling.
//! 3. A local model (planar or quadratic topography, trend, optional
//!    acceleration, annual harmonic) is fitted with weights
//!    `1 / (sigma² (1 + (d / resolution)²))`. Residuals larger than
//!    `3.5 × robust std` or the residual limit are removed and the model is refitted.
//! 4. Trend, acceleration, seasonal amplitude and phase, and RMS are derived.
//!    The residuals with the temporal terms added back are binned in time.
//!
//! ## Quick Start
//!
//! ```rust
//! use dhdt_rs::prelude::*;
//!
//! // Twelve repeat measurements at one location, losing 2 m per year.
//! let t: Vec<f64> = (0..12).map(|i| 2000.0 + i as f64).collect();
//! let h: Vec<f64> = (0..12).map(|i| 100.0 - 2.0 * i as f64).collect();
//! let obs = ObservationSet::new(vec![0.0; 12], vec![0.0; 12], t, h);
//!
//! let model = SurfaceTrend::new()
//!     .model(Linear)
//!     .min_observations(5)
//!     .min_time_span(1.0)
//!     .adapter(Batch)
//!     .build()?;
//!
//! let result = model.fit(&obs)?;
//! assert_eq!(result.len(), 1);
//! assert!((result.surface_fit[0].trend + 2.0).abs() < 1e-6);
//! # Ok::<(), TrendError>(())
//! ```
//!
//! ## Evaluation modes
//!
//! * **Grid** (default): nodes every `grid_spacing` meters over the bounding
//!   box or the data extent. With a single search radius the neighborhood is
//!   recentered on its median coordinate before fitting.
//! * **Point**: one solution per observation, centered on the observation.
//!
//! ## Models
//!
//! | Model            | Columns                                                      |
//! |------------------|--------------------------------------------------------------|
//! | `Linear`         | 1, sin, cos, dt                                              |
//! | `LinearAccel`    | 1, dt², sin, cos, dt                                         |
//! | `Biplanar`       | 1, dx, dy, dt², sin, cos, dt                                 |
//! | `Biquadratic`    | 1, dx, dy, dx·dy, dx², dy², dt², sin, cos, dt                |
//!
//! ## Output
//!
//! [`TrendResult`](prelude::TrendResult) holds one
//! [`OutputRecord`](prelude::OutputRecord) per accepted point and a
//! [`TimeSeriesTable`](prelude::TimeSeriesTable) of binned residual series.
//! When nothing can be evaluated the status is
//! `RunStatus::NoResults(reason)` rather than an error.
//!
//! ## Features
//!
//! * `std` (default): standard library support.
//! * `parallel`: multi-threaded point evaluation via `rayon` (`Adapter::Parallel`).
//!
//! ## Logging
//!
//! Progress is reported through the [`log`] facade: `info` per run,
//! `debug` for preparation, `trace` per evaluation point. Install any
//! logger to see it.

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]

#[cfg(not(feature = "std"))]
#[macro_use]
extern crate alloc;

// ============================================================================
// Internal Modules
// ============================================================================

// Layer 1: Primitives - data structures and basic utilities.
//
// Contains the observation set, the error type and reusable buffers.
mod primitives;

// Layer 2: Math - pure mathematical functions.
//
// Contains robust statistics (MAD), the KD-tree neighborhood search,
// weighted least squares, polar stereographic projection and raster sampling.
mod math;

// Layer 3: Algorithms - core trend algorithms.
//
// Contains the model bases, time binning, radius-schedule neighborhood
// selection and the robust iterative solver.
mod algorithms;

// Layer 4: Evaluation - post-processing.
//
// Contains derived quantities (trend, amplitude, phase) and output composition.
mod evaluation;

// Layer 5: Engine - orchestration and execution control.
//
// Contains validation, per-worker workspaces, the executor and result types.
mod engine;

// Layer 6: Adapters - execution mode adapters.
//
// Contains execution adapters: batch (sequential) and parallel (rayon).
mod adapters;

// High-level fluent API.
//
// Provides the `SurfaceTrend` builder for configuring and running estimation.
mod api;

// ============================================================================
// Prelude
// ============================================================================

/// Standard prelude.
///
/// This module is intended to be wildcard-imported for convenient access
/// to the most commonly used types:
///
/// ```
/// use dhdt_rs::prelude::*;
/// ```
pub mod prelude {
    #[cfg(feature = "parallel")]
    pub use crate::api::Adapter::Parallel;
    pub use crate::api::{
        Adapter::Batch,
        BatchTrend, EvaluationMode,
        EvaluationMode::{Grid, Point},
        GridRaster,
        ModelBasis::{self, Biplanar, Biquadratic, Linear, LinearAccel},
        NoResultReason, ObservationSet, OutputRecord, PolarStereographic, Projection,
        RunDiagnostics, RunStatus, TimeSeriesRow, TimeSeriesTable, TrendBuilder as SurfaceTrend,
        TrendConfig, TrendError, TrendResult, TrendSummary, seconds_to_years,
    };
}

// ============================================================================
// Testing re-exports
// ============================================================================

/// Internal modules for development and testing.
///
/// This module re-exports internal modules for development and testing purposes.
///
/// **Warning**: These are internal implementation details and may change without notice.
/// Do not use in production code.
#[doc(hidden)]
pub mod internals {
    /// Internal primitive types and utilities.
    pub mod primitives {
        pub use crate::primitives::*;
    }
    /// Internal math functions.
    pub mod math {
        pub use crate::math::*;
    }
    /// Internal core algorithms.
    pub mod algorithms {
        pub use crate::algorithms::*;
    }
    /// Internal execution engine.
    pub mod engine {
        pub use crate::engine::*;
    }
    /// Internal evaluation.
    pub mod evaluation {
        pub use crate::evaluation::*;
    }
    /// Internal adapters.
    pub mod adapters {
        pub use crate::adapters::*;
    }
    /// Internal API.
    pub mod api {
        pub use crate::api::*;
    }
}
