//! Reusable scratch buffers for per-point trend estimation.
//!
//! ## Purpose
//!
//! Every evaluation point runs the same pipeline (radius query, snapshot
//! construction, iterative fitting, binning). This module provides the
//! vectors that pipeline writes into so they can be allocated once per
//! worker and recycled across points.
//!
//! ## Design notes
//!
//! * **Lazy Expansion**: Buffers grow on demand via `ensure_capacity` and are never shrunk.
//! * **Explicit Ownership**: Buffers are passed explicitly, one set per worker thread.
//!
//! ## Key concepts
//!
//! * **Slot**: A thin `Vec` wrapper with capacity management.
//! * **NeighborhoodSearchBuffer**: Traversal stack for KD-tree radius queries.
//! * **FittingBuffer**: Gathered rows and residual scratch for the robust solver.
//! * **SelectionBuffer**: Scratch for neighborhood statistics (missions, occupied bins).
//!
//! ## Invariants
//!
//! * Buffers are only logically cleared between points, never deallocated.
//!
//! ## Non-goals
//!
//! * Thread-local automatic caching.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::ops::{Deref, DerefMut};

// ============================================================================
// Slot
// ============================================================================

/// A reusable vector slot with automatic capacity management.
#[derive(Debug, Clone)]
pub struct Slot<T>(Vec<T>);

impl<T> Slot<T> {
    /// Create a new slot with the given initial capacity.
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Ensure the slot has at least the given capacity. Never shrinks.
    #[inline]
    pub fn ensure_capacity(&mut self, capacity: usize) {
        if self.0.capacity() < capacity {
            self.0.reserve(capacity - self.0.len());
        }
    }

    /// Consume the slot and return the underlying vector.
    #[inline]
    pub fn into_inner(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Deref for Slot<T> {
    type Target = Vec<T>;
    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> DerefMut for Slot<T> {
    #[inline]
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> From<Vec<T>> for Slot<T> {
    fn from(v: Vec<T>) -> Self {
        Self(v)
    }
}

// ============================================================================
// Search Buffer
// ============================================================================

/// Persistent traversal stack for KD-tree radius queries.
#[derive(Debug, Clone, Default)]
pub struct NeighborhoodSearchBuffer {
    pub(crate) stack: Vec<usize>,
}

impl NeighborhoodSearchBuffer {
    /// Create a new search buffer.
    pub fn new() -> Self {
        // Stack depth is bounded by tree height (log2(1M) ~ 20).
        Self {
            stack: Vec::with_capacity(32),
        }
    }

    /// Clear the traversal stack for reuse.
    pub fn clear(&mut self) {
        self.stack.clear();
    }
}

// ============================================================================
// Fitting Buffer
// ============================================================================

/// Persistent buffers for the robust weighted regression loop.
#[derive(Debug, Clone)]
pub struct FittingBuffer<T> {
    /// Row-major design rows of the currently included observations.
    pub design: Slot<T>,
    /// Heights of the currently included observations.
    pub heights: Slot<T>,
    /// Weights of the currently included observations.
    pub weights: Slot<T>,
    /// Residuals of the current fit over the included observations.
    pub residuals: Slot<T>,
    /// Scratch for median computations.
    pub scratch: Slot<T>,
}

impl<T> FittingBuffer<T> {
    /// Create a fitting buffer for neighborhoods of about `k` rows and `n_coeffs` columns.
    pub fn new(k: usize, n_coeffs: usize) -> Self {
        Self {
            design: Slot::new(k * n_coeffs),
            heights: Slot::new(k),
            weights: Slot::new(k),
            residuals: Slot::new(k),
            scratch: Slot::new(k),
        }
    }

    /// Ensure capacity for `k` rows and `n_coeffs` columns.
    pub fn ensure_capacity(&mut self, k: usize, n_coeffs: usize) {
        self.design.ensure_capacity(k * n_coeffs);
        self.heights.ensure_capacity(k);
        self.weights.ensure_capacity(k);
        self.residuals.ensure_capacity(k);
        self.scratch.ensure_capacity(k);
    }

    /// Logically clear all buffers.
    pub fn clear(&mut self) {
        self.design.clear();
        self.heights.clear();
        self.weights.clear();
        self.residuals.clear();
        self.scratch.clear();
    }
}

// ============================================================================
// Selection Buffer
// ============================================================================

/// Persistent buffers for neighborhood acceptance statistics.
#[derive(Debug, Clone, Default)]
pub struct SelectionBuffer<T> {
    /// Distinct mission identifiers (sorted, deduplicated in place).
    pub missions: Vec<i64>,
    /// Occupancy flags for the sampling-fraction bins.
    pub occupied: Vec<bool>,
    /// Coordinate scratch for median recentering.
    pub coords: Vec<T>,
}

impl<T> SelectionBuffer<T> {
    /// Create a selection buffer sized for `k` neighbors and `n_bins` sampling bins.
    pub fn new(k: usize, n_bins: usize) -> Self {
        Self {
            missions: Vec::with_capacity(k),
            occupied: Vec::with_capacity(n_bins),
            coords: Vec::with_capacity(k),
        }
    }
}
