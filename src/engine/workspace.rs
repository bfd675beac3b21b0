//! Workspace for reusable per-point buffers.
//!
//! This module provides a pre-allocated workspace so that evaluating a point
//! (radius queries, snapshot construction, iterative fitting) does not
//! allocate on every call. Each worker thread owns one workspace.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use num_traits::Float;

// Internal dependencies
use crate::algorithms::basis::DesignMatrix;
use crate::math::neighborhood::Neighborhood;
use crate::primitives::buffer::{FittingBuffer, NeighborhoodSearchBuffer, SelectionBuffer};

/// Snapshot columns of one neighborhood.
#[derive(Debug, Clone)]
pub struct SnapshotBuffer<T> {
    /// `x − xc`.
    pub dx: Vec<T>,
    /// `y − yc`.
    pub dy: Vec<T>,
    /// `t − tref`.
    pub dt: Vec<T>,
    /// Absolute times.
    pub t: Vec<T>,
    /// Heights.
    pub h: Vec<T>,
    /// Observation weights.
    pub w: Vec<T>,
}

impl<T> Default for SnapshotBuffer<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T> SnapshotBuffer<T> {
    /// Create empty columns with room for `k` rows.
    pub fn with_capacity(k: usize) -> Self {
        Self {
            dx: Vec::with_capacity(k),
            dy: Vec::with_capacity(k),
            dt: Vec::with_capacity(k),
            t: Vec::with_capacity(k),
            h: Vec::with_capacity(k),
            w: Vec::with_capacity(k),
        }
    }

    /// Logically clear every column.
    pub fn clear(&mut self) {
        self.dx.clear();
        self.dy.clear();
        self.dt.clear();
        self.t.clear();
        self.h.clear();
        self.w.clear();
    }
}

/// A workspace containing pre-allocated buffers for one worker.
pub struct TrendWorkspace<T: Float> {
    /// Buffer for KD-tree traversal state.
    pub search: NeighborhoodSearchBuffer,
    /// Buffer for radius query results.
    pub neighborhood: Neighborhood<T>,
    /// Buffer for neighborhood statistics.
    pub selection: SelectionBuffer<T>,
    /// Snapshot columns.
    pub snapshot: SnapshotBuffer<T>,
    /// Design matrix of the current snapshot.
    pub design: DesignMatrix<T>,
    /// Buffer for the robust solver.
    pub fitting: FittingBuffer<T>,
    /// Scratch for medians.
    pub scratch: Vec<T>,
}

impl<T: Float> TrendWorkspace<T> {
    /// Create a workspace sized for about `k` neighbors, `n_coeffs` columns and `n_bins` sampling bins.
    pub fn new(k: usize, n_coeffs: usize, n_bins: usize) -> Self {
        Self {
            search: NeighborhoodSearchBuffer::new(),
            neighborhood: Neighborhood::with_capacity(k),
            selection: SelectionBuffer::new(k, n_bins),
            snapshot: SnapshotBuffer::with_capacity(k),
            design: DesignMatrix::with_capacity(k, n_coeffs),
            fitting: FittingBuffer::new(k, n_coeffs),
            scratch: Vec::with_capacity(k),
        }
    }
}
