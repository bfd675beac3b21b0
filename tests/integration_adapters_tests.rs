use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};

use dhdt_rs::prelude::*;

// ============================================================================
// Helper Functions
// ============================================================================

/// Trend of the cluster at grid node `(i, j)`.
fn cluster_trend(i: usize, j: usize) -> f64 {
    -1.0 + 0.1 * (4 * j + i) as f64
}

/// 4×4 clusters on a 2 km lattice, 60 noisy observations each over 2010-2020.
fn synthetic_field(seed: u64) -> ObservationSet<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = Normal::new(0.0, 0.05).unwrap();

    let (mut x, mut y, mut t, mut h) = (vec![], vec![], vec![], vec![]);
    for j in 0..4 {
        for i in 0..4 {
            let rate = cluster_trend(i, j);
            for k in 0..60 {
                let dx = rng.random_range(-200.0..200.0);
                let dy = rng.random_range(-200.0..200.0);
                let tk = 2010.0 + k as f64 / 6.0 + rng.random_range(0.0..0.1);
                x.push(2000.0 * i as f64 + dx);
                y.push(2000.0 * j as f64 + dy);
                t.push(tk);
                h.push(500.0 + 0.002 * dx - 0.001 * dy + rate * (tk - 2010.0) + noise.sample(&mut rng));
            }
        }
    }
    ObservationSet::new(x, y, t, h)
}

fn field_builder() -> SurfaceTrend<f64> {
    SurfaceTrend::new()
        .model(Biplanar)
        .grid_spacing(2000.0)
        .bounding_box([0.0, 6000.0, 0.0, 6000.0])
}

// ============================================================================
// Batch Tests
// ============================================================================

#[test]
fn test_batch_recovers_cluster_trends() {
    let obs = synthetic_field(7);
    let result = field_builder()
        .adapter(Batch)
        .build()
        .unwrap()
        .fit(&obs)
        .unwrap();

    assert_eq!(result.status, RunStatus::Completed);
    assert_eq!(result.len(), 16);
    assert_eq!(result.diagnostics.n_points, 16);

    for (k, r) in result.surface_fit.iter().enumerate() {
        let expected = cluster_trend(k % 4, k / 4);
        assert!(
            (r.trend - expected).abs() < 0.05,
            "node {k}: trend {} expected {expected}",
            r.trend
        );
        assert!(r.slope_x.is_some());
        assert!(r.trend_err.is_finite());
    }
}

#[test]
fn test_batch_fit_many_tiles() {
    let tiles = vec![synthetic_field(1), synthetic_field(2)];
    let model = field_builder().adapter(Batch).build().unwrap();

    let results = model.fit_many(&tiles).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.len() == 16));
}

#[test]
fn test_batch_fit_many_stops_on_invalid_tile() {
    let mut bad = synthetic_field(3);
    bad.h.pop();
    let tiles = vec![synthetic_field(1), bad];

    let model = field_builder().adapter(Batch).build().unwrap();
    assert!(matches!(
        model.fit_many(&tiles),
        Err(TrendError::MismatchedInputs { field: "h", .. })
    ));
}

// ============================================================================
// Parallel Tests
// ============================================================================

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_matches_batch() {
    let obs = synthetic_field(11);

    let batch = field_builder()
        .adapter(Batch)
        .build()
        .unwrap()
        .fit(&obs)
        .unwrap();
    let parallel = field_builder()
        .adapter(Parallel)
        .threads(2)
        .build()
        .unwrap()
        .fit(&obs)
        .unwrap();

    assert_eq!(batch.len(), parallel.len());
    assert_eq!(batch.diagnostics, parallel.diagnostics);
    for (a, b) in batch.surface_fit.iter().zip(&parallel.surface_fit) {
        assert_eq!((a.lat, a.lon), (b.lat, b.lon));
        assert_eq!(a.n_obs, b.n_obs);
        assert_relative_eq!(a.trend, b.trend, epsilon = 1e-12);
        assert_relative_eq!(a.trend_err, b.trend_err, epsilon = 1e-12);
    }
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_fit_many_preserves_order() {
    let tiles = vec![synthetic_field(5), synthetic_field(6), synthetic_field(7)];
    let model = field_builder().adapter(Parallel).build().unwrap();
    let batch = field_builder().adapter(Batch).build().unwrap();

    let par = model.fit_many(&tiles).unwrap();
    let seq = batch.fit_many(&tiles).unwrap();
    for (p, s) in par.iter().zip(&seq) {
        assert_eq!(p.len(), s.len());
        assert_relative_eq!(
            p.surface_fit[0].trend,
            s.surface_fit[0].trend,
            epsilon = 1e-12
        );
    }
}

/// Largest pool size seen while preparing a run.
#[cfg(feature = "parallel")]
static POOL_THREADS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

#[cfg(feature = "parallel")]
fn record_pool_size(t: f64) -> f64 {
    POOL_THREADS.fetch_max(
        rayon::current_num_threads(),
        std::sync::atomic::Ordering::Relaxed,
    );
    t
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_fit_many_uses_requested_threads() {
    let tiles = vec![synthetic_field(8), synthetic_field(9)];
    let model = field_builder()
        .time_transform(record_pool_size)
        .adapter(Parallel)
        .threads(3)
        .build()
        .unwrap();
    assert_eq!(model.threads(), Some(3));

    let results = model.fit_many(&tiles).unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(
        POOL_THREADS.load(std::sync::atomic::Ordering::Relaxed),
        3
    );
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_rejects_zero_threads() {
    let err = field_builder()
        .adapter(Parallel)
        .threads(0)
        .build()
        .unwrap_err();
    assert!(matches!(err, TrendError::InvalidLimit { name: "threads", .. }));
}

// ============================================================================
// Precision Tests (f32)
// ============================================================================

#[test]
fn test_batch_f32_single_location() {
    let t: Vec<f32> = (0..12).map(|i| 2000.0 + 0.3 * i as f32).collect();
    let h: Vec<f32> = t.iter().map(|&ti| 40.0 - 0.5 * (ti - 2000.0)).collect();
    let obs = ObservationSet::new(vec![0.0; 12], vec![0.0; 12], t, h);

    let result = SurfaceTrend::<f32>::new()
        .model(Linear)
        .min_observations(5)
        .min_time_span(1.0)
        .adapter(Batch)
        .build()
        .unwrap()
        .fit(&obs)
        .unwrap();

    assert_eq!(result.len(), 1);
    assert!((result.surface_fit[0].trend + 0.5).abs() < 1e-2);
}
