//! High-level API for surface-trend estimation.
//!
//! ## Purpose
//!
//! This module provides the primary user-facing entry point. It implements a
//! fluent builder for the run parameters and the choice of an execution
//! adapter (Batch or Parallel).
//!
//! ## Design notes
//!
//! * **Ergonomic**: Fluent builder with defaults for every parameter.
//! * **Polymorphic**: Marker types transition to specialized adapter builders.
//! * **Validated**: Parameters are validated when `.build()` is called on the adapter.
//! * **Strict**: Setting a parameter twice is reported at build time.
//!
//! ## Key concepts
//!
//! ### Configuration Flow
//!
//! 1. Create a [`TrendBuilder`] via `SurfaceTrend::new()`.
//! 2. Chain configuration methods (`.radius()`, `.model()`, etc.).
//! 3. Select an adapter via `.adapter(Adapter::Batch)` to get an execution builder.
//! 4. Call `.build()?` and then `.fit(&observations)?`.

// Internal dependencies
use crate::adapters::batch::BatchTrendBuilder;
#[cfg(feature = "parallel")]
use crate::adapters::parallel::ParallelTrendBuilder;
use crate::engine::executor::TimeTransform;
use crate::math::linalg::FloatLinalg;

// Publicly re-exported types
pub use crate::adapters::batch::BatchTrend;
#[cfg(feature = "parallel")]
pub use crate::adapters::parallel::ParallelTrend;
pub use crate::algorithms::basis::ModelBasis;
pub use crate::engine::executor::{EvaluationMode, TrendConfig};
pub use crate::engine::output::{
    NoResultReason, RunDiagnostics, RunStatus, TrendResult, TrendSummary,
};
pub use crate::evaluation::composer::{OutputRecord, TimeSeriesRow, TimeSeriesTable};
pub use crate::math::projection::{PolarStereographic, Projection};
pub use crate::math::raster::GridRaster;
pub use crate::primitives::errors::TrendError;
pub use crate::primitives::observation::{ObservationSet, seconds_to_years};

/// Marker types for selecting execution adapters.
#[allow(non_snake_case)]
pub mod Adapter {
    pub use super::Batch;
    #[cfg(feature = "parallel")]
    pub use super::Parallel;
}

/// Fluent builder for configuring surface-trend parameters and execution modes.
#[derive(Debug, Clone)]
pub struct TrendBuilder<T: FloatLinalg> {
    /// Grid or point evaluation.
    pub mode: Option<EvaluationMode>,

    /// Lattice spacing (m).
    pub grid_spacing: Option<T>,

    /// Search radius range `(min, max)` (m).
    pub radius: Option<(T, T)>,

    /// Radius increment (m).
    pub radius_step: Option<T>,

    /// Correlation length of the distance weighting (m).
    pub resolution: Option<T>,

    /// Minimum observations per fit.
    pub min_observations: Option<usize>,

    /// Maximum fits per point.
    pub iterations: Option<usize>,

    /// Solution time span (decimal years).
    pub time_span: Option<(T, T)>,

    /// Fixed reference time (decimal years).
    pub reference_time: Option<T>,

    /// Largest accepted absolute trend (m/yr).
    pub trend_limit: Option<T>,

    /// Minimum neighborhood time span (yr).
    pub min_time_span: Option<T>,

    /// Minimum distinct missions.
    pub min_missions: Option<usize>,

    /// Mission id used when observations carry none.
    pub reference_mission: Option<i64>,

    /// Absolute residual limit (m).
    pub residual_limit: Option<T>,

    /// Model basis.
    pub model: Option<ModelBasis>,

    /// Residual bin width (months).
    pub bin_width_months: Option<usize>,

    /// Bounding box `[xmin, xmax, ymin, ymax]` (m).
    pub bounding_box: Option<[T; 4]>,

    /// Planar coordinate system of the observations.
    pub projection: Option<Projection>,

    /// Reference surface subtracted from heights.
    pub detrend_raster: Option<GridRaster<T>>,

    /// Observation times are seconds since the epoch.
    pub times_in_seconds: Option<bool>,

    /// Transform applied to observation times.
    pub time_transform: Option<TimeTransform<T>>,

    /// Error raised by a setter, reported at build time.
    pub deferred_error: Option<TrendError>,

    /// Tracks if any parameter was set multiple times (for validation)
    #[doc(hidden)]
    pub duplicate_param: Option<&'static str>,
}

impl<T: FloatLinalg> Default for TrendBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatLinalg> TrendBuilder<T> {
    /// Select an execution adapter to transition to an execution builder.
    pub fn adapter<A>(self, _adapter: A) -> A::Output
    where
        A: TrendAdapter<T>,
    {
        A::convert(self)
    }

    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            mode: None,
            grid_spacing: None,
            radius: None,
            radius_step: None,
            resolution: None,
            min_observations: None,
            iterations: None,
            time_span: None,
            reference_time: None,
            trend_limit: None,
            min_time_span: None,
            min_missions: None,
            reference_mission: None,
            residual_limit: None,
            model: None,
            bin_width_months: None,
            bounding_box: None,
            projection: None,
            detrend_raster: None,
            times_in_seconds: None,
            time_transform: None,
            deferred_error: None,
            duplicate_param: None,
        }
    }

    // ========================================================================
    // Evaluation Geometry
    // ========================================================================

    /// Evaluate on a grid or at every observation.
    pub fn mode(mut self, mode: EvaluationMode) -> Self {
        if self.mode.is_some() {
            self.duplicate_param = Some("mode");
        }
        self.mode = Some(mode);
        self
    }

    /// Set the grid spacing in meters (grid mode).
    pub fn grid_spacing(mut self, spacing: T) -> Self {
        if self.grid_spacing.is_some() {
            self.duplicate_param = Some("grid_spacing");
        }
        self.grid_spacing = Some(spacing);
        self
    }

    /// Set the search radius range in meters.
    ///
    /// Radii `min, min + step, ...` are tried until a neighborhood qualifies.
    pub fn radius(mut self, min: T, max: T) -> Self {
        if self.radius.is_some() {
            self.duplicate_param = Some("radius");
        }
        self.radius = Some((min, max));
        self
    }

    /// Set the radius increment in meters.
    pub fn radius_step(mut self, step: T) -> Self {
        if self.radius_step.is_some() {
            self.duplicate_param = Some("radius_step");
        }
        self.radius_step = Some(step);
        self
    }

    /// Set the correlation length of the distance weighting in meters.
    pub fn resolution(mut self, resolution: T) -> Self {
        if self.resolution.is_some() {
            self.duplicate_param = Some("resolution");
        }
        self.resolution = Some(resolution);
        self
    }

    /// Restrict evaluation to a bounding box `[xmin, xmax, ymin, ymax]`.
    pub fn bounding_box(mut self, bbox: [T; 4]) -> Self {
        if self.bounding_box.is_some() {
            self.duplicate_param = Some("bounding_box");
        }
        self.bounding_box = Some(bbox);
        self
    }

    /// Set the planar coordinate system of the observations.
    pub fn projection(mut self, projection: Projection) -> Self {
        if self.projection.is_some() {
            self.duplicate_param = Some("projection");
        }
        self.projection = Some(projection);
        self
    }

    /// Set the coordinate system by EPSG code (3031 or 3413).
    pub fn epsg(self, code: u32) -> Self {
        match Projection::from_epsg(code) {
            Some(p) => self.projection(p),
            None => {
                let mut s = self;
                s.deferred_error = Some(TrendError::UnsupportedProjection(code));
                s
            }
        }
    }

    // ========================================================================
    // Fitting
    // ========================================================================

    /// Set the model basis.
    pub fn model(mut self, model: ModelBasis) -> Self {
        if self.model.is_some() {
            self.duplicate_param = Some("model");
        }
        self.model = Some(model);
        self
    }

    /// Set the model basis by its numeric selector (0..=3).
    pub fn model_index(self, index: usize) -> Self {
        match ModelBasis::from_index(index) {
            Ok(m) => self.model(m),
            Err(e) => {
                let mut s = self;
                s.deferred_error = Some(e);
                s
            }
        }
    }

    /// Set the minimum number of observations per fit.
    pub fn min_observations(mut self, n: usize) -> Self {
        if self.min_observations.is_some() {
            self.duplicate_param = Some("min_observations");
        }
        self.min_observations = Some(n);
        self
    }

    /// Set the maximum number of fits per point (1..=1000).
    pub fn iterations(mut self, iterations: usize) -> Self {
        if self.iterations.is_some() {
            self.duplicate_param = Some("iterations");
        }
        self.iterations = Some(iterations);
        self
    }

    /// Set the absolute residual limit in meters.
    pub fn residual_limit(mut self, limit: T) -> Self {
        if self.residual_limit.is_some() {
            self.duplicate_param = Some("residual_limit");
        }
        self.residual_limit = Some(limit);
        self
    }

    /// Set the largest accepted absolute trend in m/yr.
    pub fn trend_limit(mut self, limit: T) -> Self {
        if self.trend_limit.is_some() {
            self.duplicate_param = Some("trend_limit");
        }
        self.trend_limit = Some(limit);
        self
    }

    /// Subtract a reference surface from the heights before fitting.
    ///
    /// Observations outside the raster are dropped.
    pub fn detrend_raster(mut self, raster: GridRaster<T>) -> Self {
        if self.detrend_raster.is_some() {
            self.duplicate_param = Some("detrend_raster");
        }
        self.detrend_raster = Some(raster);
        self
    }

    // ========================================================================
    // Time Handling
    // ========================================================================

    /// Restrict observations to the open interval `(t1, t2)` in decimal years.
    pub fn time_span(mut self, t1: T, t2: T) -> Self {
        if self.time_span.is_some() {
            self.duplicate_param = Some("time_span");
        }
        self.time_span = Some((t1, t2));
        self
    }

    /// Use a fixed reference time instead of the neighborhood mean.
    pub fn reference_time(mut self, tref: T) -> Self {
        if self.reference_time.is_some() {
            self.duplicate_param = Some("reference_time");
        }
        self.reference_time = Some(tref);
        self
    }

    /// Set the minimum time span of a neighborhood in years.
    pub fn min_time_span(mut self, span: T) -> Self {
        if self.min_time_span.is_some() {
            self.duplicate_param = Some("min_time_span");
        }
        self.min_time_span = Some(span);
        self
    }

    /// Set the residual bin width in months.
    pub fn bin_width_months(mut self, months: usize) -> Self {
        if self.bin_width_months.is_some() {
            self.duplicate_param = Some("bin_width_months");
        }
        self.bin_width_months = Some(months);
        self
    }

    /// Transform every observation time before processing.
    ///
    /// Combined with [`times_in_seconds`](Self::times_in_seconds), the
    /// transform receives decimal years.
    pub fn time_transform(mut self, transform: TimeTransform<T>) -> Self {
        if self.time_transform.is_some() {
            self.duplicate_param = Some("time_transform");
        }
        self.time_transform = Some(transform);
        self
    }

    /// Interpret observation times as seconds since 1970 and convert to years.
    pub fn times_in_seconds(mut self) -> Self {
        if self.times_in_seconds.is_some() {
            self.duplicate_param = Some("times_in_seconds");
        }
        self.times_in_seconds = Some(true);
        self
    }

    // ========================================================================
    // Missions
    // ========================================================================

    /// Set the minimum number of distinct missions per neighborhood.
    pub fn min_missions(mut self, n: usize) -> Self {
        if self.min_missions.is_some() {
            self.duplicate_param = Some("min_missions");
        }
        self.min_missions = Some(n);
        self
    }

    /// Set the mission id given to observations without one.
    pub fn reference_mission(mut self, id: i64) -> Self {
        if self.reference_mission.is_some() {
            self.duplicate_param = Some("reference_mission");
        }
        self.reference_mission = Some(id);
        self
    }

    /// Resolve the set parameters over the defaults.
    pub fn to_config(&self) -> TrendConfig<T> {
        let d = TrendConfig::default();
        let (radius_min, radius_max) = self.radius.unwrap_or((d.radius_min, d.radius_max));
        TrendConfig {
            mode: self.mode.unwrap_or(d.mode),
            grid_spacing: self.grid_spacing.unwrap_or(d.grid_spacing),
            radius_min,
            radius_max,
            radius_step: self.radius_step.unwrap_or(d.radius_step),
            resolution: self.resolution.unwrap_or(d.resolution),
            min_observations: self.min_observations.unwrap_or(d.min_observations),
            iterations: self.iterations.unwrap_or(d.iterations),
            time_span: self.time_span.or(d.time_span),
            reference_time: self.reference_time.or(d.reference_time),
            trend_limit: self.trend_limit.unwrap_or(d.trend_limit),
            min_time_span: self.min_time_span.unwrap_or(d.min_time_span),
            min_missions: self.min_missions.unwrap_or(d.min_missions),
            reference_mission: self.reference_mission.unwrap_or(d.reference_mission),
            residual_limit: self.residual_limit.unwrap_or(d.residual_limit),
            model: self.model.unwrap_or(d.model),
            bin_width_months: self.bin_width_months.unwrap_or(d.bin_width_months),
            bounding_box: self.bounding_box.or(d.bounding_box),
            projection: self.projection.unwrap_or(d.projection),
            detrend_raster: self.detrend_raster.clone(),
            times_in_seconds: self.times_in_seconds.unwrap_or(d.times_in_seconds),
            time_transform: self.time_transform.or(d.time_transform),
        }
    }
}

/// Trait for transitioning from a generic builder to an execution builder.
pub trait TrendAdapter<T: FloatLinalg> {
    /// The output execution builder.
    type Output;

    /// Convert a generic [`TrendBuilder`] into a specialized execution builder.
    fn convert(builder: TrendBuilder<T>) -> Self::Output;
}

/// Marker for in-memory sequential processing.
#[derive(Debug, Clone, Copy)]
pub struct Batch;

impl<T: FloatLinalg> TrendAdapter<T> for Batch {
    type Output = BatchTrendBuilder<T>;

    fn convert(builder: TrendBuilder<T>) -> Self::Output {
        let mut result = BatchTrendBuilder::default();
        result.config = builder.to_config();
        result.deferred_error = builder.deferred_error;
        result.duplicate_param = builder.duplicate_param;
        result
    }
}

/// Marker for multi-threaded processing.
#[cfg(feature = "parallel")]
#[derive(Debug, Clone, Copy)]
pub struct Parallel;

#[cfg(feature = "parallel")]
impl<T: FloatLinalg> TrendAdapter<T> for Parallel {
    type Output = ParallelTrendBuilder<T>;

    fn convert(builder: TrendBuilder<T>) -> Self::Output {
        ParallelTrendBuilder {
            base: <Batch as TrendAdapter<T>>::convert(builder),
            threads: None,
        }
    }
}
