//! End-to-end tests for the execution engine.
//!
//! These tests run complete surface-trend runs through the executor and
//! check the reported records, time series and diagnostics.
//!
//! ## Test Organization
//!
//! 1. **Exact Trends** - Collinear data in grid and point mode
//! 2. **Robustness** - Outlier rejection
//! 3. **Gating** - Time-span boundary, sparse nodes, trend limit
//! 4. **Preparation** - Empty input, filters, raster detrending, time transforms

use approx::assert_relative_eq;

use dhdt_rs::internals::algorithms::basis::ModelBasis;
use dhdt_rs::internals::engine::executor::{
    EvaluationMode, PointOutcome, Preparation, TrendConfig, TrendExecutor,
};
use dhdt_rs::internals::engine::output::{NoResultReason, RunStatus, TrendResult};
use dhdt_rs::internals::engine::workspace::{SnapshotBuffer, TrendWorkspace};
use dhdt_rs::internals::math::raster::GridRaster;
use dhdt_rs::internals::primitives::observation::{ObservationSet, SECONDS_PER_YEAR};

// ============================================================================
// Helper Functions
// ============================================================================

/// Linear model, permissive gates.
fn linear_config() -> TrendConfig<f64> {
    TrendConfig {
        model: ModelBasis::Linear,
        min_observations: 3,
        min_time_span: 1.0,
        ..TrendConfig::default()
    }
}

/// Series `h(t)` repeated at a single location.
fn at_origin(t: Vec<f64>, h: Vec<f64>) -> ObservationSet<f64> {
    let n = t.len();
    ObservationSet::new(vec![0.0; n], vec![0.0; n], t, h)
}

fn run(config: TrendConfig<f64>, obs: &ObservationSet<f64>) -> TrendResult<f64> {
    TrendExecutor::new(config).run(obs).unwrap()
}

// ============================================================================
// Exact Trend Tests
// ============================================================================

/// Collinear data at one location give a unit trend with zero error.
#[test]
fn test_collinear_single_node() {
    let obs = at_origin(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 2.0, 3.0]);
    let result = run(linear_config(), &obs);

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.len(), 1);

    let r = &result.surface_fit[0];
    assert_relative_eq!(r.trend, 1.0, epsilon = 1e-9);
    assert_relative_eq!(r.intercept, 1.5, epsilon = 1e-9);
    assert_relative_eq!(r.trend_err, 0.0, epsilon = 1e-6);
    assert_relative_eq!(r.rms, 0.0, epsilon = 1e-9);
    assert_relative_eq!(r.tref, 1.5);
    assert_relative_eq!(r.time_span, 3.0);
    assert_relative_eq!(r.r_used, 1000.0);
    assert_eq!(r.n_obs, 4);
    assert_eq!(r.n_removed, 0);
    assert_eq!((r.lat, r.lon), (0.0, 0.0));
    assert!(r.acceleration.is_none());

    assert_eq!(result.diagnostics.n_points, 1);
    assert_eq!(result.diagnostics.n_accepted, 1);
}

/// The binned series covers the solution window.
#[test]
fn test_time_series_shape() {
    let t: Vec<f64> = (0..24).map(|i| 2000.0 + 0.25 * i as f64).collect();
    let h: Vec<f64> = t.iter().map(|&ti| 10.0 - 0.5 * (ti - 2000.0)).collect();
    let result = run(linear_config(), &at_origin(t, h));

    assert_eq!(result.time_series.len(), 1);
    let row = &result.time_series.values[0];
    assert_eq!(row.values.len(), result.time_series.time_axis.len());
    assert_relative_eq!(row.t1, 2000.0);
    assert_relative_eq!(row.t2, 2005.75);
    assert_eq!(result.time_series.errors[0].values.len(), row.values.len());
}

/// Point mode yields one record per observation, in input order.
#[test]
fn test_point_mode_records() {
    let n = 10;
    let x: Vec<f64> = (0..n).map(|i| 10.0 * i as f64).collect();
    let t: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let h: Vec<f64> = t.iter().map(|&ti| 3.0 + 0.5 * ti).collect();
    let obs = ObservationSet::new(x.clone(), vec![0.0; n], t, h);

    let config = TrendConfig {
        mode: EvaluationMode::Point,
        ..linear_config()
    };
    let result = run(config, &obs);

    assert_eq!(result.len(), n);
    for (i, r) in result.surface_fit.iter().enumerate() {
        assert_relative_eq!(r.lon, x[i]);
        assert_relative_eq!(r.trend, 0.5, epsilon = 1e-9);
    }
}

/// In point mode a bounding box limits the evaluated observations, not the neighbors.
#[test]
fn test_point_mode_bounding_box() {
    let n = 10;
    let x: Vec<f64> = (0..n).map(|i| 100.0 * i as f64).collect();
    let t: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let h = t.clone();
    let obs = ObservationSet::new(x, vec![0.0; n], t, h);

    let config = TrendConfig {
        mode: EvaluationMode::Point,
        bounding_box: Some([250.0, 450.0, -1.0, 1.0]),
        ..linear_config()
    };
    let result = run(config, &obs);

    // Observations at x = 300 and 400 are evaluated
    assert_eq!(result.len(), 2);
    assert_relative_eq!(result.surface_fit[0].lon, 300.0);
    // Neighbors come from the padded box: all ten observations
    assert_eq!(result.surface_fit[0].n_obs, 10);
}

// ============================================================================
// Robustness Tests
// ============================================================================

/// A single gross outlier is removed and the trend recovered.
#[test]
fn test_outlier_removed() {
    let t: Vec<f64> = (0..120).map(|i| 0.1 * i as f64).collect();
    let mut h: Vec<f64> = (0..120)
        .map(|i| t[i] + 0.5 * (1.7 * i as f64 + 0.3).sin())
        .collect();
    h[60] = 100.0;

    let result = run(linear_config(), &at_origin(t, h));
    let r = &result.surface_fit[0];
    assert_eq!(r.n_removed, 1);
    assert_eq!(r.n_obs, 119);
    assert!((r.trend - 1.0).abs() < 0.01);
    assert_eq!(result.diagnostics.n_outliers_removed, 1);
}

// ============================================================================
// Gating Tests
// ============================================================================

/// A time span equal to the minimum is not enough.
#[test]
fn test_time_span_boundary() {
    let obs = at_origin(vec![0.0, 1.0, 2.0], vec![0.0, 1.0, 2.0]);
    let config = TrendConfig {
        min_time_span: 2.0,
        ..linear_config()
    };
    let result = run(config, &obs);

    assert!(result.is_empty());
    assert_eq!(
        result.status,
        RunStatus::NoResults(NoResultReason::NoAcceptedPoints)
    );
    assert_eq!(result.diagnostics.n_insufficient, 1);
}

/// A grid node with too few neighbors produces no row.
#[test]
fn test_sparse_node_skipped() {
    let mut x = vec![0.0; 10];
    x.extend([5000.0, 5000.0]);
    let mut t: Vec<f64> = (0..10).map(|i| i as f64).collect();
    t.extend([0.0, 9.0]);
    let h: Vec<f64> = t.iter().map(|&ti| 2.0 * ti).collect();
    let obs = ObservationSet::new(x, vec![0.0; 12], t, h);

    let config = TrendConfig {
        grid_spacing: 5000.0,
        min_observations: 5,
        ..linear_config()
    };
    let result = run(config, &obs);

    assert_eq!(result.diagnostics.n_points, 2);
    assert_eq!(result.len(), 1);
    assert_relative_eq!(result.surface_fit[0].lon, 0.0);
    assert_relative_eq!(result.surface_fit[0].trend, 2.0, epsilon = 1e-9);
}

/// Trends beyond the limit are rejected.
#[test]
fn test_trend_limit() {
    let t = vec![0.0, 1.0, 2.0, 3.0, 4.0];
    let h: Vec<f64> = t.iter().map(|&ti| 20.0 * ti).collect();
    let result = run(linear_config(), &at_origin(t, h));

    assert!(result.is_empty());
    assert_eq!(result.diagnostics.n_rejected, 1);
}

/// A fixed reference time moves the intercept.
#[test]
fn test_fixed_reference_time() {
    let t = vec![2000.0, 2001.0, 2002.0, 2003.0];
    let h: Vec<f64> = t.iter().map(|&ti| 50.0 - (ti - 2000.0)).collect();
    let config = TrendConfig {
        reference_time: Some(2000.0),
        ..linear_config()
    };
    let result = run(config, &at_origin(t, h));

    let r = &result.surface_fit[0];
    assert_relative_eq!(r.tref, 2000.0);
    assert_relative_eq!(r.intercept, 50.0, epsilon = 1e-9);
    assert_relative_eq!(r.trend, -1.0, epsilon = 1e-9);
}

// ============================================================================
// Preparation Tests
// ============================================================================

/// Empty input is a status, not an error.
#[test]
fn test_empty_input() {
    let obs = ObservationSet::<f64>::new(vec![], vec![], vec![], vec![]);
    let result = run(linear_config(), &obs);
    assert_eq!(result.status, RunStatus::NoResults(NoResultReason::EmptyInput));
    assert!(result.time_series.is_empty());
}

/// Filters that remove every observation report why.
#[test]
fn test_filters_remove_everything() {
    let obs = at_origin(vec![0.0, 1.0, 2.0, 3.0], vec![0.0; 4]);

    let config = TrendConfig {
        time_span: Some((10.0, 20.0)),
        ..linear_config()
    };
    let result = run(config, &obs);
    assert_eq!(
        result.status,
        RunStatus::NoResults(NoResultReason::NoDataInTimeSpan)
    );
    assert_eq!(result.diagnostics.n_outside_time_span, 4);

    let config = TrendConfig {
        bounding_box: Some([1.0e5, 2.0e5, 1.0e5, 2.0e5]),
        ..linear_config()
    };
    let result = run(config, &obs);
    assert_eq!(
        result.status,
        RunStatus::NoResults(NoResultReason::NoDataInBounds)
    );
}

/// The time span is an open interval.
#[test]
fn test_time_span_is_open() {
    let t: Vec<f64> = (0..11).map(|i| i as f64).collect();
    let obs = at_origin(t.clone(), t);

    let executor = TrendExecutor::new(TrendConfig {
        time_span: Some((0.0, 10.0)),
        ..linear_config()
    });
    match executor.prepare(&obs).unwrap() {
        Preparation::Ready(run) => {
            assert_eq!(run.t.len(), 9);
            assert_eq!(run.diagnostics.n_outside_time_span, 2);
        }
        Preparation::Empty(reason, _) => panic!("unexpected empty run: {reason:?}"),
    }
}

/// Grid nodes span the bounding box, y outer and x inner.
#[test]
fn test_grid_node_order() {
    let obs = at_origin(vec![0.0, 1.0, 2.0, 3.0], vec![0.0; 4]);
    let executor = TrendExecutor::new(TrendConfig {
        grid_spacing: 1000.0,
        bounding_box: Some([0.0, 2000.0, 0.0, 1000.0]),
        ..linear_config()
    });

    let Preparation::Ready(run) = executor.prepare(&obs).unwrap() else {
        panic!("expected a prepared run");
    };
    assert_eq!(run.points.len(), 6);
    assert_eq!(run.points[0], (0.0, 0.0));
    assert_eq!(run.points[1], (1000.0, 0.0));
    assert_eq!(run.points[3], (0.0, 1000.0));
}

/// Heights are detrended by the raster and off-raster observations dropped.
#[test]
fn test_raster_detrending() {
    // Surface z = 100 + 0.01·x on [−500, 500]²
    let xs = vec![-500.0, 500.0];
    let ys = vec![-500.0, 500.0];
    let raster = GridRaster::new(xs, ys, vec![95.0, 105.0, 95.0, 105.0]).unwrap();

    let n = 12;
    let x: Vec<f64> = (0..n).map(|i| -300.0 + 50.0 * i as f64).collect();
    let t: Vec<f64> = (0..n).map(|i| i as f64).collect();
    let h: Vec<f64> = (0..n).map(|i| 100.0 + 0.01 * x[i] - 0.2 * t[i]).collect();
    let mut obs = ObservationSet::new(x, vec![0.0; n], t, h);
    // One observation outside the raster
    obs.x.push(900.0);
    obs.y.push(0.0);
    obs.t.push(5.0);
    obs.h.push(0.0);

    let config = TrendConfig {
        detrend_raster: Some(raster),
        radius_min: 2000.0,
        radius_max: 2000.0,
        ..linear_config()
    };
    let result = run(config, &obs);

    assert_eq!(result.diagnostics.n_off_raster, 1);
    assert_eq!(result.len(), 1);
    assert_relative_eq!(result.surface_fit[0].trend, -0.2, epsilon = 1e-9);
    assert_relative_eq!(result.surface_fit[0].intercept, 0.0 - 0.2 * 5.5, epsilon = 1e-9);
}

/// A time transform converts seconds to years before anything else.
#[test]
fn test_time_transform() {
    let years = [0.0, 1.0, 2.0, 3.0, 4.0];
    let t: Vec<f64> = years.iter().map(|y| y * SECONDS_PER_YEAR).collect();
    let h: Vec<f64> = years.iter().map(|y| 3.0 * y).collect();

    let config = TrendConfig {
        time_transform: Some(|s: f64| s / SECONDS_PER_YEAR),
        ..linear_config()
    };
    let result = run(config, &at_origin(t, h));
    assert_relative_eq!(result.surface_fit[0].trend, 3.0, epsilon = 1e-9);
}

/// Missing sigma and mission arrays take their defaults; an empty neighborhood is reported.
#[test]
fn test_point_outcomes_through_workspace() {
    let obs = at_origin(vec![0.0, 1.0, 2.0, 3.0], vec![0.0, 1.0, 2.0, 3.0]);
    let executor = TrendExecutor::new(linear_config());
    let Preparation::Ready(prepared) = executor.prepare(&obs).unwrap() else {
        panic!("expected a prepared run");
    };
    assert_eq!(prepared.sigma, vec![1.0; 4]);
    assert_eq!(prepared.mission, vec![0; 4]);

    let mut ws = executor.workspace(&prepared);
    assert!(matches!(
        executor.evaluate_point(&prepared, (0.0, 0.0), &mut ws),
        PointOutcome::Accepted(_)
    ));
    assert_eq!(
        executor.evaluate_point(&prepared, (5.0e4, 0.0), &mut ws),
        PointOutcome::NoNeighbors
    );
}

/// A fresh workspace starts with empty, pre-sized snapshot columns in either precision.
#[test]
fn test_workspace_snapshot_starts_empty() {
    let ws = TrendWorkspace::<f64>::new(64, 4, 12);
    assert!(ws.snapshot.h.is_empty());
    assert!(ws.snapshot.dt.capacity() >= 64);
    assert!(ws.neighborhood.is_empty());

    let ws32 = TrendWorkspace::<f32>::new(8, 10, 12);
    assert!(ws32.snapshot.w.is_empty());
    assert!(ws32.snapshot.t.capacity() >= 8);

    let empty = SnapshotBuffer::<f32>::default();
    assert!(empty.dx.is_empty());
    assert!(empty.dy.is_empty());
}
