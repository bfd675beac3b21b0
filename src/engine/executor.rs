//! Execution engine for surface-trend runs.
//!
//! ## Purpose
//!
//! This module holds the run configuration and orchestrates a run: it
//! prepares the observations (time transform, raster detrending, bounding
//! box and time-span filtering), generates the evaluation points, and runs
//! the per-point pipeline: select a neighborhood, build the snapshot, fit
//! robustly, derive quantities, bin the residual series.
//!
//! ## Design notes
//!
//! * **Scheduler-agnostic**: [`TrendExecutor::evaluate_point`] is a plain
//!   synchronous function over read-only shared state plus a per-worker
//!   workspace; adapters decide how points are scheduled.
//! * **Outcomes, not errors**: Per-point failures are [`PointOutcome`]
//!   variants counted in the run diagnostics.
//! * Generic over `Float` types to support f32 and f64.
//!
//! ## Key concepts
//!
//! * **Grid mode**: Points on a regular lattice; the local origin is the
//!   median coordinate of the selected neighborhood.
//! * **Point mode**: Every observation is an evaluation point and its own origin.
//! * **Solution window**: The configured time span, or the data's time extent.
//!
//! ## Invariants
//!
//! * The prepared run is never mutated by point evaluation.
//! * Points are reported in evaluation order.
//!
//! ## Non-goals
//!
//! * This module does not validate configuration (handled by `validator`).
//! * This module does not read or write files.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::{boxed::Box, vec::Vec};
#[cfg(feature = "std")]
use std::{boxed::Box, vec::Vec};

// External dependencies
use log::{debug, info, trace, warn};
use num_traits::Float;

// Internal dependencies
use crate::algorithms::basis::{ModelBasis, observation_weight};
use crate::algorithms::binning::TimeBins;
use crate::algorithms::regression::{
    RegressionProblem, RejectionRule, RobustSolver, SolveFailure, SolverSettings,
};
use crate::algorithms::selection::{
    MIN_SAMPLING_FRACTION, NeighborhoodSelector, RadiusSchedule, SelectionCriteria, SelectionData,
    median_coordinate,
};
use crate::engine::output::{NoResultReason, RunDiagnostics, RunStatus, TrendResult};
use crate::engine::validator::Validator;
use crate::engine::workspace::TrendWorkspace;
use crate::evaluation::composer::{PointContext, PointSolution, ResultComposer, TimeSeriesTable};
use crate::evaluation::derived::{DerivedQuantities, recompose};
use crate::math::linalg::FloatLinalg;
use crate::math::neighborhood::KDTree;
use crate::math::projection::Projection;
use crate::math::raster::GridRaster;
use crate::primitives::errors::TrendError;
use crate::primitives::observation::{ObservationSet, seconds_to_years};

/// Initial neighborhood capacity of a fresh workspace.
const DEFAULT_NEIGHBORHOOD_CAPACITY: usize = 256;

// ============================================================================
// Evaluation Mode
// ============================================================================

/// Where trends are evaluated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvaluationMode {
    /// On a regular lattice over the bounding box or data extent.
    #[default]
    Grid,

    /// At every observation.
    Point,
}

// ============================================================================
// Type Definitions
// ============================================================================

/// Transform applied to every observation time before anything else.
pub type TimeTransform<T> = fn(T) -> T;

// ============================================================================
// Configuration
// ============================================================================

/// Validated configuration of a run.
#[derive(Debug, Clone)]
pub struct TrendConfig<T> {
    /// Grid or point evaluation.
    pub mode: EvaluationMode,

    /// Lattice spacing in grid mode (m).
    pub grid_spacing: T,

    /// Smallest search radius (m).
    pub radius_min: T,

    /// Largest search radius (m).
    pub radius_max: T,

    /// Radius increment (m).
    pub radius_step: T,

    /// Correlation length of the distance weighting (m).
    pub resolution: T,

    /// Minimum observations for a fit.
    pub min_observations: usize,

    /// Maximum weighted fits per point.
    pub iterations: usize,

    /// Solution time span `(t1, t2)`; `None` uses the data extent.
    pub time_span: Option<(T, T)>,

    /// Reference time; `None` uses the neighborhood mean.
    pub reference_time: Option<T>,

    /// Largest accepted absolute trend (m/yr).
    pub trend_limit: T,

    /// Minimum time span of a neighborhood (yr).
    pub min_time_span: T,

    /// Minimum number of distinct missions.
    pub min_missions: usize,

    /// Mission id of observations without one.
    pub reference_mission: i64,

    /// Absolute residual limit (m).
    pub residual_limit: T,

    /// Model basis.
    pub model: ModelBasis,

    /// Residual bin width (months).
    pub bin_width_months: usize,

    /// Bounding box `[xmin, xmax, ymin, ymax]` (m).
    pub bounding_box: Option<[T; 4]>,

    /// Planar coordinate system, used to report geographic centroids.
    pub projection: Projection,

    /// Reference surface subtracted before fitting.
    pub detrend_raster: Option<GridRaster<T>>,

    /// Observation times are seconds since the epoch; converted to decimal years first.
    pub times_in_seconds: bool,

    /// Time expression applied to every observation time, after any seconds conversion.
    pub time_transform: Option<TimeTransform<T>>,
}

impl<T: Float> Default for TrendConfig<T> {
    fn default() -> Self {
        let c = |v: f64| T::from(v).unwrap();
        Self {
            mode: EvaluationMode::Grid,
            grid_spacing: c(1000.0),
            radius_min: c(1000.0),
            radius_max: c(1000.0),
            radius_step: c(1000.0),
            resolution: c(250.0),
            min_observations: 10,
            iterations: 5,
            time_span: None,
            reference_time: None,
            trend_limit: c(15.0),
            min_time_span: c(5.0),
            min_missions: 1,
            reference_mission: 0,
            residual_limit: c(10.0),
            model: ModelBasis::Biquadratic,
            bin_width_months: 1,
            bounding_box: None,
            projection: Projection::Identity,
            detrend_raster: None,
            times_in_seconds: false,
            time_transform: None,
        }
    }
}

impl<T: Float> TrendConfig<T> {
    /// Correlation length used in the weights: `min(resolution, radius_max)`.
    pub fn weighting_resolution(&self) -> T {
        self.resolution.min(self.radius_max)
    }

    /// Settings of the robust solver.
    pub fn solver_settings(&self) -> SolverSettings<T> {
        SolverSettings {
            min_observations: self.min_observations,
            min_time_span: self.min_time_span,
            max_fits: self.iterations,
            rejection: RejectionRule::new(self.residual_limit),
        }
    }

    /// Acceptance thresholds of the neighborhood selector.
    pub fn selection_criteria(&self) -> SelectionCriteria<T> {
        SelectionCriteria {
            min_observations: self.min_observations,
            min_time_span: self.min_time_span,
            min_missions: self.min_missions,
            min_sampling_fraction: T::from(MIN_SAMPLING_FRACTION).unwrap(),
        }
    }
}

// ============================================================================
// Prepared Run
// ============================================================================

/// Read-only state shared by every evaluation point of a run.
#[derive(Debug, Clone)]
pub struct PreparedRun<T: Float> {
    /// Planar x of the retained observations.
    pub x: Vec<T>,
    /// Planar y of the retained observations.
    pub y: Vec<T>,
    /// Times (decimal years) of the retained observations.
    pub t: Vec<T>,
    /// Heights (detrended if a raster was given).
    pub h: Vec<T>,
    /// Uncertainties.
    pub sigma: Vec<T>,
    /// Mission identifiers.
    pub mission: Vec<i64>,
    /// Spatial index over `(x, y)`.
    pub tree: KDTree<T>,
    /// Evaluation points.
    pub points: Vec<(T, T)>,
    /// Search radii.
    pub schedule: RadiusSchedule<T>,
    /// Monthly bins over the solution window.
    pub sampling_bins: TimeBins<T>,
    /// Output composer over the solution window.
    pub composer: ResultComposer<T>,
    /// Counters gathered during preparation.
    pub diagnostics: RunDiagnostics,
}

impl<T: Float> PreparedRun<T> {
    fn selection_data(&self) -> SelectionData<'_, T> {
        SelectionData {
            tree: &self.tree,
            x: &self.x,
            y: &self.y,
            t: &self.t,
            mission: &self.mission,
        }
    }
}

/// Result of run preparation.
#[derive(Debug, Clone)]
pub enum Preparation<T: Float> {
    /// Observations remain; points can be evaluated.
    Ready(PreparedRun<T>),

    /// Nothing to evaluate.
    Empty(NoResultReason, RunDiagnostics),
}

/// Outcome of one evaluation point.
#[derive(Debug, Clone, PartialEq)]
pub enum PointOutcome<T> {
    /// Every gate passed.
    Accepted(Box<PointSolution<T>>),

    /// Every radius returned an empty neighborhood.
    NoNeighbors,

    /// Too few observations or too short a time span.
    Insufficient,

    /// The weighted system could not estimate the trend.
    Degenerate,

    /// The trend exceeded the limit or had a non-finite error.
    Rejected,
}

// ============================================================================
// Executor
// ============================================================================

/// Orchestrates a surface-trend run.
#[derive(Debug, Clone)]
pub struct TrendExecutor<T> {
    config: TrendConfig<T>,
}

impl<T: FloatLinalg> TrendExecutor<T> {
    /// Create an executor from a validated configuration.
    pub fn new(config: TrendConfig<T>) -> Self {
        Self { config }
    }

    /// The run configuration.
    pub fn config(&self) -> &TrendConfig<T> {
        &self.config
    }

    // ========================================================================
    // Sequential Run
    // ========================================================================

    /// Run every evaluation point sequentially.
    pub fn run(&self, obs: &ObservationSet<T>) -> Result<TrendResult<T>, TrendError> {
        let run = match self.prepare(obs)? {
            Preparation::Ready(run) => run,
            Preparation::Empty(reason, diagnostics) => {
                return Ok(self.empty_result(reason, diagnostics));
            }
        };

        let mut ws = self.workspace(&run);
        let outcomes: Vec<PointOutcome<T>> = run
            .points
            .iter()
            .map(|&p| self.evaluate_point(&run, p, &mut ws))
            .collect();

        Ok(self.finish(&run, outcomes))
    }

    // ========================================================================
    // Preparation
    // ========================================================================

    /// Validate and filter the observations and build the shared run state.
    pub fn prepare(&self, obs: &ObservationSet<T>) -> Result<Preparation<T>, TrendError> {
        Validator::validate_observations(obs)?;
        let cfg = &self.config;

        let mut diagnostics = RunDiagnostics {
            n_input: obs.len(),
            ..RunDiagnostics::default()
        };
        if obs.is_empty() {
            return Ok(Preparation::Empty(NoResultReason::EmptyInput, diagnostics));
        }

        let n = obs.len();
        let mut x = obs.x.clone();
        let mut y = obs.y.clone();
        let mut h = obs.h.clone();
        let mut t = obs.t.clone();
        if cfg.times_in_seconds {
            t.iter_mut().for_each(|ti| *ti = seconds_to_years(*ti));
        }
        if let Some(f) = cfg.time_transform {
            t.iter_mut().for_each(|ti| *ti = f(*ti));
        }
        let mut sigma = obs.sigma.clone().unwrap_or_else(|| vec![T::one(); n]);
        let mut mission = obs
            .mission
            .clone()
            .unwrap_or_else(|| vec![cfg.reference_mission; n]);

        if cfg.time_transform.is_some() {
            Validator::validate_finite(&t, "transformed t")?;
        }

        // Raster detrending
        if let Some(raster) = &cfg.detrend_raster {
            let mut keep = vec![true; n];
            for i in 0..n {
                match raster.sample(x[i], y[i]) {
                    Some(z) => h[i] = h[i] - z,
                    None => keep[i] = false,
                }
            }
            let dropped = retain_mask(
                &keep,
                &mut [&mut x, &mut y, &mut t, &mut h, &mut sigma],
                &mut mission,
            );
            diagnostics.n_off_raster = dropped;
            if dropped > 0 {
                warn!("dropped {dropped} observations outside the detrending raster");
            }
            if x.is_empty() {
                return Ok(Preparation::Empty(NoResultReason::NoDataInBounds, diagnostics));
            }
        }

        // Bounding box grown by the largest radius
        if let Some(b) = cfg.bounding_box {
            let pad = cfg.radius_max;
            let keep: Vec<bool> = x
                .iter()
                .zip(&y)
                .map(|(&xi, &yi)| {
                    xi >= b[0] - pad && xi <= b[1] + pad && yi >= b[2] - pad && yi <= b[3] + pad
                })
                .collect();
            diagnostics.n_outside_bounds = retain_mask(
                &keep,
                &mut [&mut x, &mut y, &mut t, &mut h, &mut sigma],
                &mut mission,
            );
            debug!(
                "bounding box kept {} of {} observations",
                x.len(),
                x.len() + diagnostics.n_outside_bounds
            );
            if x.is_empty() {
                return Ok(Preparation::Empty(NoResultReason::NoDataInBounds, diagnostics));
            }
        }

        // Solution window
        let (t1, t2) = match cfg.time_span {
            Some((t1, t2)) => {
                let keep: Vec<bool> = t.iter().map(|&ti| ti > t1 && ti < t2).collect();
                diagnostics.n_outside_time_span = retain_mask(
                    &keep,
                    &mut [&mut x, &mut y, &mut t, &mut h, &mut sigma],
                    &mut mission,
                );
                (t1, t2)
            }
            None => t
                .iter()
                .fold((T::infinity(), T::neg_infinity()), |(lo, hi), &ti| {
                    (lo.min(ti), hi.max(ti))
                }),
        };
        if x.is_empty() {
            return Ok(Preparation::Empty(NoResultReason::NoDataInTimeSpan, diagnostics));
        }
        diagnostics.n_used = x.len();

        let points = self.evaluation_points(&x, &y);
        diagnostics.n_points = points.len();

        let schedule = RadiusSchedule::new(cfg.radius_min, cfg.radius_max, cfg.radius_step);
        let sampling_bins = TimeBins::monthly(t1, t2, 1);
        let window = TimeBins::monthly(t1, t2, cfg.bin_width_months);

        debug!(
            "prepared run: {} observations, {} evaluation points, {} radii, {} output bins",
            x.len(),
            points.len(),
            schedule.radii().len(),
            window.count()
        );

        let tree = KDTree::new(&x, &y);

        Ok(Preparation::Ready(PreparedRun {
            x,
            y,
            t,
            h,
            sigma,
            mission,
            tree,
            points,
            schedule,
            sampling_bins,
            composer: ResultComposer::new(window),
            diagnostics,
        }))
    }

    /// Lattice nodes (grid mode) or observation positions (point mode).
    fn evaluation_points(&self, x: &[T], y: &[T]) -> Vec<(T, T)> {
        let cfg = &self.config;
        match cfg.mode {
            EvaluationMode::Point => match cfg.bounding_box {
                Some(b) => x
                    .iter()
                    .zip(y)
                    .filter(|&(&xi, &yi)| xi >= b[0] && xi <= b[1] && yi >= b[2] && yi <= b[3])
                    .map(|(&xi, &yi)| (xi, yi))
                    .collect(),
                None => x.iter().copied().zip(y.iter().copied()).collect(),
            },
            EvaluationMode::Grid => {
                let [xmin, xmax, ymin, ymax] = cfg.bounding_box.unwrap_or_else(|| extent(x, y));
                let xs = linspace(xmin, xmax, cfg.grid_spacing);
                let ys = linspace(ymin, ymax, cfg.grid_spacing);
                let mut nodes = Vec::with_capacity(xs.len() * ys.len());
                for &yi in &ys {
                    for &xi in &xs {
                        nodes.push((xi, yi));
                    }
                }
                nodes
            }
        }
    }

    /// A fresh workspace sized for this run.
    pub fn workspace(&self, run: &PreparedRun<T>) -> TrendWorkspace<T> {
        TrendWorkspace::new(
            DEFAULT_NEIGHBORHOOD_CAPACITY.min(run.x.len()),
            self.config.model.n_columns(),
            run.sampling_bins.count(),
        )
    }

    // ========================================================================
    // Per-point Pipeline
    // ========================================================================

    /// Evaluate one point: select, snapshot, fit, derive, bin.
    pub fn evaluate_point(
        &self,
        run: &PreparedRun<T>,
        point: (T, T),
        ws: &mut TrendWorkspace<T>,
    ) -> PointOutcome<T> {
        let cfg = &self.config;

        let selector = NeighborhoodSelector::new(
            run.selection_data(),
            &run.schedule,
            cfg.selection_criteria(),
            run.sampling_bins,
            cfg.mode == EvaluationMode::Grid,
        );
        let Some(selection) = selector.select(
            point.0,
            point.1,
            &mut ws.search,
            &mut ws.neighborhood,
            &mut ws.selection,
        ) else {
            return PointOutcome::NoNeighbors;
        };

        // Pre-fit gate
        if selection.len() < cfg.min_observations || !(selection.time_span > cfg.min_time_span) {
            trace!(
                "point ({:?}, {:?}): {} observations over {:?} yr, skipped",
                point.0.to_f64(),
                point.1.to_f64(),
                selection.len(),
                selection.time_span.to_f64()
            );
            return PointOutcome::Insufficient;
        }

        let origin = match cfg.mode {
            EvaluationMode::Point => point,
            EvaluationMode::Grid => {
                median_coordinate(&run.x, &run.y, &selection.indices, &mut ws.scratch)
            }
        };
        let tref = cfg.reference_time.unwrap_or_else(|| {
            let sum = selection
                .indices
                .iter()
                .fold(T::zero(), |acc, &i| acc + run.t[i]);
            sum / T::from(selection.len()).unwrap()
        });

        // Snapshot
        let dres = cfg.weighting_resolution();
        let snap = &mut ws.snapshot;
        snap.clear();
        for &i in &selection.indices {
            let dx = run.x[i] - origin.0;
            let dy = run.y[i] - origin.1;
            let d = (dx * dx + dy * dy).sqrt();
            snap.dx.push(dx);
            snap.dy.push(dy);
            snap.dt.push(run.t[i] - tref);
            snap.t.push(run.t[i]);
            snap.h.push(run.h[i]);
            snap.w.push(observation_weight(run.sigma[i], d, dres));
        }
        ws.design.rebuild(cfg.model, &snap.dx, &snap.dy, &snap.dt);

        let problem = RegressionProblem {
            basis: cfg.model,
            design: &ws.design,
            t: &snap.t,
            h: &snap.h,
            w: &snap.w,
        };
        let fit = match RobustSolver::new(cfg.solver_settings()).solve(&problem, &mut ws.fitting) {
            Ok(fit) => fit,
            Err(SolveFailure::InsufficientData) => return PointOutcome::Insufficient,
            Err(SolveFailure::Degenerate) => return PointOutcome::Degenerate,
        };

        let derived = DerivedQuantities::from_fit(cfg.model, &fit);
        if !derived.within_limits(cfg.trend_limit) {
            trace!(
                "point ({:?}, {:?}): trend {:?} rejected",
                origin.0.to_f64(),
                origin.1.to_f64(),
                derived.trend.to_f64()
            );
            return PointOutcome::Rejected;
        }

        let (times, values) = recompose(cfg.model, &ws.design, &snap.t, &fit);
        let series = run.composer.window().bin(&times, &values);

        let (lon, lat) = cfg.projection.inverse(origin.0, origin.1);
        let ctx = PointContext {
            lat,
            lon,
            time_span: selection.time_span,
            tref,
            r_min: run.schedule.min(),
            r_used: selection.radius,
        };

        PointOutcome::Accepted(Box::new(run.composer.compose(ctx, &derived, &fit, &series)))
    }

    // ========================================================================
    // Assembly
    // ========================================================================

    /// Assemble point outcomes (in evaluation order) into the run result.
    pub fn finish(&self, run: &PreparedRun<T>, outcomes: Vec<PointOutcome<T>>) -> TrendResult<T> {
        let mut diagnostics = run.diagnostics;
        for o in &outcomes {
            diagnostics.record(o);
        }

        let accepted = outcomes.into_iter().filter_map(|o| match o {
            PointOutcome::Accepted(s) => Some(*s),
            _ => None,
        });
        let (surface_fit, time_series) = run.composer.assemble(accepted);

        let status = if surface_fit.is_empty() {
            RunStatus::NoResults(NoResultReason::NoAcceptedPoints)
        } else {
            RunStatus::Completed
        };

        info!(
            "evaluated {} points: {} accepted, {} insufficient, {} degenerate, {} rejected",
            diagnostics.n_points,
            diagnostics.n_accepted,
            diagnostics.n_insufficient + diagnostics.n_no_neighbors,
            diagnostics.n_degenerate,
            diagnostics.n_rejected
        );

        TrendResult {
            surface_fit,
            time_series,
            status,
            diagnostics,
            model: self.config.model,
            mode: self.config.mode,
        }
    }

    /// Result of a run that had nothing to evaluate.
    pub fn empty_result(
        &self,
        reason: NoResultReason,
        diagnostics: RunDiagnostics,
    ) -> TrendResult<T> {
        info!("no results: {reason:?}");
        TrendResult {
            surface_fit: Vec::new(),
            time_series: TimeSeriesTable::empty(Vec::new()),
            status: RunStatus::NoResults(reason),
            diagnostics,
            model: self.config.model,
            mode: self.config.mode,
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Keep the entries flagged in `keep`; returns the number dropped.
fn retain_mask<T: Copy>(
    keep: &[bool],
    columns: &mut [&mut Vec<T>],
    mission: &mut Vec<i64>,
) -> usize {
    let dropped = keep.iter().filter(|&&k| !k).count();
    if dropped == 0 {
        return 0;
    }
    for col in columns.iter_mut() {
        let mut it = keep.iter();
        col.retain(|_| *it.next().unwrap_or(&false));
    }
    let mut it = keep.iter();
    mission.retain(|_| *it.next().unwrap_or(&false));
    dropped
}

/// `[xmin, xmax, ymin, ymax]` of the coordinates.
fn extent<T: Float>(x: &[T], y: &[T]) -> [T; 4] {
    let (xmin, xmax) = min_max(x);
    let (ymin, ymax) = min_max(y);
    [xmin, xmax, ymin, ymax]
}

fn min_max<T: Float>(v: &[T]) -> (T, T) {
    v.iter()
        .fold((T::infinity(), T::neg_infinity()), |(lo, hi), &a| (lo.min(a), hi.max(a)))
}

/// `floor(|max − min| / spacing) + 1` evenly spaced values from `min` to `max`.
fn linspace<T: Float>(min: T, max: T, spacing: T) -> Vec<T> {
    let n = ((max - min).abs() / spacing).floor().to_usize().unwrap_or(0) + 1;
    if n == 1 {
        return vec![min];
    }
    let step = (max - min) / T::from(n - 1).unwrap();
    (0..n).map(|k| min + T::from(k).unwrap() * step).collect()
}
