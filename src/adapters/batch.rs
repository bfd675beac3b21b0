//! Batch adapter for surface-trend estimation.
//!
//! ## Purpose
//!
//! This module provides the sequential execution adapter. It holds a complete
//! observation set in memory and evaluates every point on the calling thread.
//!
//! ## Design notes
//!
//! * **Processing**: Validates, prepares and evaluates in a single pass.
//! * **Delegation**: Delegates computation to the execution engine.
//! * **Reusable**: A built processor can fit any number of observation sets.
//! * **Generics**: Generic over `Float` types.
//!
//! ## Invariants
//!
//! * Configuration is validated once, in `build()`.
//! * Output rows follow evaluation-point order.
//!
//! ## Non-goals
//!
//! * This adapter does not parallelize (use the parallel adapter).
//! * This adapter does not read files.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use log::debug;

// Internal dependencies
use crate::algorithms::basis::ModelBasis;
use crate::engine::executor::{EvaluationMode, TrendConfig, TrendExecutor};
use crate::engine::output::TrendResult;
use crate::engine::validator::Validator;
use crate::math::linalg::FloatLinalg;
use crate::primitives::errors::TrendError;
use crate::primitives::observation::ObservationSet;

// ============================================================================
// Batch Trend Builder
// ============================================================================

/// Builder for the batch trend processor.
#[derive(Debug, Clone)]
pub struct BatchTrendBuilder<T: FloatLinalg> {
    /// Run configuration.
    pub config: TrendConfig<T>,

    /// Deferred error from adapter conversion.
    pub deferred_error: Option<TrendError>,

    /// Tracks if any parameter was set multiple times (for validation)
    #[doc(hidden)]
    pub(crate) duplicate_param: Option<&'static str>,
}

impl<T: FloatLinalg> Default for BatchTrendBuilder<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: FloatLinalg> BatchTrendBuilder<T> {
    /// Create a new batch builder with default parameters.
    fn new() -> Self {
        Self {
            config: TrendConfig::default(),
            deferred_error: None,
            duplicate_param: None,
        }
    }

    // ========================================================================
    // Shared Setters
    // ========================================================================

    /// Set the evaluation mode.
    pub fn mode(mut self, mode: EvaluationMode) -> Self {
        self.config.mode = mode;
        self
    }

    /// Set the model basis.
    pub fn model(mut self, model: ModelBasis) -> Self {
        self.config.model = model;
        self
    }

    /// Set the maximum number of fits per point.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.config.iterations = iterations;
        self
    }

    /// Set the solution time span.
    pub fn time_span(mut self, t1: T, t2: T) -> Self {
        self.config.time_span = Some((t1, t2));
        self
    }

    /// Set the bounding box `[xmin, xmax, ymin, ymax]`.
    pub fn bounding_box(mut self, bbox: [T; 4]) -> Self {
        self.config.bounding_box = Some(bbox);
        self
    }

    // ========================================================================
    // Build Method
    // ========================================================================

    /// Build the batch processor.
    pub fn build(self) -> Result<BatchTrend<T>, TrendError> {
        if let Some(err) = self.deferred_error {
            return Err(err);
        }

        // Check for duplicate parameter configuration
        Validator::validate_no_duplicates(self.duplicate_param)?;

        // Validate every numeric parameter
        Validator::validate_config(&self.config)?;

        Ok(BatchTrend {
            executor: TrendExecutor::new(self.config),
        })
    }
}

// ============================================================================
// Batch Trend Processor
// ============================================================================

/// Sequential surface-trend processor.
#[derive(Debug, Clone)]
pub struct BatchTrend<T: FloatLinalg> {
    executor: TrendExecutor<T>,
}

impl<T: FloatLinalg> BatchTrend<T> {
    /// The validated run configuration.
    pub fn config(&self) -> &TrendConfig<T> {
        self.executor.config()
    }

    /// Estimate trends over one observation set.
    pub fn fit(&self, obs: &ObservationSet<T>) -> Result<TrendResult<T>, TrendError> {
        self.executor.run(obs)
    }

    /// Estimate trends over several independent observation sets (tiles).
    ///
    /// Stops at the first invalid set.
    pub fn fit_many(&self, sets: &[ObservationSet<T>]) -> Result<Vec<TrendResult<T>>, TrendError> {
        debug!("fitting {} observation sets", sets.len());
        sets.iter().map(|obs| self.fit(obs)).collect()
    }
}
