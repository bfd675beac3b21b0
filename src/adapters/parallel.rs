//! Parallel adapter for surface-trend estimation.
//!
//! ## Purpose
//!
//! This module extends the batch adapter with multi-threaded evaluation.
//! Evaluation points are independent, so they are distributed across a
//! `rayon` pool, each worker owning one reusable workspace.
//!
//! ## Design notes
//!
//! * **Composition**: Wraps [`BatchTrendBuilder`] and adds thread settings.
//! * **Workspaces**: `map_init` allocates one workspace per worker split.
//! * **Determinism**: Results are collected in point order, so output
//!   matches the batch adapter exactly.
//!
//! ## Non-goals
//!
//! * This adapter does not split a single neighborhood fit across threads.

// External dependencies
use log::debug;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;

// Internal dependencies
use crate::adapters::batch::BatchTrendBuilder;
use crate::algorithms::basis::ModelBasis;
use crate::engine::executor::{
    EvaluationMode, PointOutcome, Preparation, TrendConfig, TrendExecutor,
};
use crate::engine::output::TrendResult;
use crate::math::linalg::FloatLinalg;
use crate::primitives::errors::TrendError;
use crate::primitives::observation::ObservationSet;

// ============================================================================
// Parallel Trend Builder
// ============================================================================

/// Builder for the parallel trend processor.
#[derive(Debug, Clone)]
pub struct ParallelTrendBuilder<T: FloatLinalg> {
    /// Base batch builder.
    pub base: BatchTrendBuilder<T>,

    /// Worker threads; `None` uses the global pool.
    pub threads: Option<usize>,
}

impl<T: FloatLinalg> Default for ParallelTrendBuilder<T> {
    fn default() -> Self {
        Self {
            base: BatchTrendBuilder::default(),
            threads: None,
        }
    }
}

impl<T: FloatLinalg> ParallelTrendBuilder<T> {
    /// Set the evaluation mode.
    pub fn mode(mut self, mode: EvaluationMode) -> Self {
        self.base = self.base.mode(mode);
        self
    }

    /// Set the model basis.
    pub fn model(mut self, model: ModelBasis) -> Self {
        self.base = self.base.model(model);
        self
    }

    /// Set the maximum number of fits per point.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.base = self.base.iterations(iterations);
        self
    }

    /// Run on a dedicated pool with `threads` workers.
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Build the parallel processor.
    pub fn build(self) -> Result<ParallelTrend<T>, TrendError> {
        if self.threads == Some(0) {
            return Err(TrendError::InvalidLimit {
                name: "threads",
                value: 0.0,
            });
        }
        let batch = self.base.build()?;
        Ok(ParallelTrend {
            executor: TrendExecutor::new(batch.config().clone()),
            threads: self.threads,
        })
    }
}

// ============================================================================
// Parallel Trend Processor
// ============================================================================

/// Multi-threaded surface-trend processor.
#[derive(Debug, Clone)]
pub struct ParallelTrend<T: FloatLinalg> {
    executor: TrendExecutor<T>,
    threads: Option<usize>,
}

impl<T: FloatLinalg> ParallelTrend<T> {
    /// The validated run configuration.
    pub fn config(&self) -> &TrendConfig<T> {
        self.executor.config()
    }

    /// Estimate trends over one observation set, evaluating points in parallel.
    pub fn fit(&self, obs: &ObservationSet<T>) -> Result<TrendResult<T>, TrendError> {
        self.in_pool(|| self.fit_points(obs))
    }

    /// Estimate trends over several independent observation sets in parallel.
    pub fn fit_many(&self, sets: &[ObservationSet<T>]) -> Result<Vec<TrendResult<T>>, TrendError> {
        debug!("fitting {} observation sets in parallel", sets.len());
        self.in_pool(|| sets.par_iter().map(|obs| self.fit_points(obs)).collect())
    }

    /// Run `f` on a dedicated pool when a thread count was set, else on the global pool.
    fn in_pool<R, F>(&self, f: F) -> Result<R, TrendError>
    where
        R: Send,
        F: FnOnce() -> Result<R, TrendError> + Send,
    {
        match self.threads {
            Some(n) => {
                let pool = ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|_| TrendError::InvalidLimit {
                        name: "threads",
                        value: n as f64,
                    })?;
                pool.install(f)
            }
            None => f(),
        }
    }

    /// Worker threads of a dedicated pool, if one was requested.
    pub fn threads(&self) -> Option<usize> {
        self.threads
    }

    fn fit_points(&self, obs: &ObservationSet<T>) -> Result<TrendResult<T>, TrendError> {
        let executor = &self.executor;
        let run = match executor.prepare(obs)? {
            Preparation::Ready(run) => run,
            Preparation::Empty(reason, diagnostics) => {
                return Ok(executor.empty_result(reason, diagnostics));
            }
        };

        debug!(
            "evaluating {} points on {} threads",
            run.points.len(),
            rayon::current_num_threads()
        );

        let outcomes: Vec<PointOutcome<T>> = run
            .points
            .par_iter()
            .map_init(
                || executor.workspace(&run),
                |ws, &p| executor.evaluate_point(&run, p, ws),
            )
            .collect();

        Ok(executor.finish(&run, outcomes))
    }
}
