//! KD-tree for planar radius queries.
//!
//! ## Purpose
//!
//! This module implements a static KD-tree over planar observation
//! coordinates. The selector grows a search radius around each evaluation
//! point, so the tree answers "every point within `r`" queries rather than
//! k-nearest ones.
//!
//! ## Design notes
//!
//! * **Static Construction**: The tree is built once per run and then only queried.
//! * **Eytzinger Layout**: Nodes are stored in a left-complete binary tree (array) layout for cache locality.
//! * **Node Compression**: Nodes only store the original point index; split axes are implicit in the depth.
//! * **Deterministic Output**: Results are returned sorted by original index.
//!
//! ## Key concepts
//!
//! * **Implicit Navigation**: Child nodes are accessed via arithmetic ($2i+1$, $2i+2$) rather than pointers.
//! * **Pruning**: Far branches are skipped when the splitting plane lies beyond the radius.
//!
//! ## Invariants
//!
//! * Tree depth is bound by O(log n).
//! * A query returns exactly the points with Euclidean distance `<= r` (inclusive).
//!
//! ## Non-goals
//!
//! * This module does not support dynamic insertions or deletions.
//! * This module does not support approximate search.

// Feature-gated imports
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;
#[cfg(feature = "std")]
use std::vec::Vec;

// External dependencies
use core::cmp::Ordering::Equal;
use num_traits::Float;

// Internal dependencies
use crate::primitives::buffer::NeighborhoodSearchBuffer;

// ============================================================================
// Neighborhood Structure
// ============================================================================

/// Result container for a radius query.
#[derive(Debug, Clone)]
pub struct Neighborhood<T> {
    /// Indices of the points inside the radius, ascending.
    pub indices: Vec<usize>,
    /// Distances to each point (aligned with `indices`).
    pub distances: Vec<T>,
}

impl<T: Float> Neighborhood<T> {
    /// Create a new empty neighborhood.
    pub fn new() -> Self {
        Self {
            indices: Vec::new(),
            distances: Vec::new(),
        }
    }

    /// Pre-allocate buffers for a neighborhood of size k.
    pub fn with_capacity(k: usize) -> Self {
        Self {
            indices: Vec::with_capacity(k),
            distances: Vec::with_capacity(k),
        }
    }

    /// Returns the number of points currently stored.
    #[inline]
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Returns true if no points are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Remove all points, keeping capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.indices.clear();
        self.distances.clear();
    }

    fn sort_by_index(&mut self) {
        if self.indices.windows(2).all(|w| w[0] < w[1]) {
            return;
        }
        let mut pairs: Vec<(usize, T)> = self
            .indices
            .iter()
            .copied()
            .zip(self.distances.iter().copied())
            .collect();
        pairs.sort_unstable_by_key(|p| p.0);
        self.indices.clear();
        self.distances.clear();
        for (i, d) in pairs {
            self.indices.push(i);
            self.distances.push(d);
        }
    }
}

impl<T: Float> Default for Neighborhood<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// KD-Tree Implementation
// ============================================================================

/// Compressed node structure for Eytzinger layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct KDNode {
    /// Index of the point in the original data arrays.
    pub index: usize,
}

/// KD-tree over planar `(x, y)` points.
#[derive(Debug, Clone)]
pub struct KDTree<T: Float> {
    /// The implicit Eytzinger tree nodes.
    nodes: Vec<KDNode>,
    /// Permuted interleaved coordinates aligned with the nodes.
    points: Vec<T>,
}

const DIMS: usize = 2;

impl<T: Float> KDTree<T> {
    // ------------------------------------------------------------------------
    // Public API
    // ------------------------------------------------------------------------

    /// Build a KD-tree from separate coordinate arrays of equal length.
    pub fn new(x: &[T], y: &[T]) -> Self {
        let n = x.len().min(y.len());
        let mut flat = Vec::with_capacity(n * DIMS);
        for i in 0..n {
            flat.push(x[i]);
            flat.push(y[i]);
        }

        let mut indices: Vec<usize> = (0..n).collect();
        let mut nodes = vec![KDNode::default(); n];
        let mut permuted_points = vec![T::zero(); n * DIMS];

        Self::build_recursive(&flat, &mut indices, 0, &mut nodes, &mut permuted_points, 0);

        Self {
            nodes,
            points: permuted_points,
        }
    }

    /// Number of indexed points.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the tree indexes no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Collect every point within `radius` of `(qx, qy)` into `neighborhood`.
    ///
    /// The comparison is inclusive: a point at exactly `radius` is returned.
    pub fn find_within_radius(
        &self,
        qx: T,
        qy: T,
        radius: T,
        buffer: &mut NeighborhoodSearchBuffer,
        neighborhood: &mut Neighborhood<T>,
    ) {
        neighborhood.clear();
        if self.nodes.is_empty() || radius < T::zero() {
            return;
        }

        buffer.clear();
        let r2 = radius * radius;
        let query = [qx, qy];
        let nodes_len = self.nodes.len();
        let stack = &mut buffer.stack;

        // Packed entry: (node_idx << 1) | axis
        stack.push(0);

        while let Some(packed) = stack.pop() {
            let axis = packed & 1;
            let node_idx = packed >> 1;

            let offset = node_idx * DIMS;
            let px = self.points[offset];
            let py = self.points[offset + 1];

            let ddx = qx - px;
            let ddy = qy - py;
            let d2 = ddx * ddx + ddy * ddy;
            if d2 <= r2 {
                neighborhood.indices.push(self.nodes[node_idx].index);
                neighborhood.distances.push(d2.sqrt());
            }

            let left_child = 2 * node_idx + 1;
            if left_child >= nodes_len {
                continue;
            }
            let right_child = left_child + 1;
            let has_right = right_child < nodes_len;
            let next_axis = axis ^ 1;

            let diff = query[axis] - self.points[offset + axis];

            // Left holds values <= split, right holds values >= split
            if diff <= T::zero() || diff * diff <= r2 {
                stack.push((left_child << 1) | next_axis);
            }
            if has_right && (diff >= T::zero() || diff * diff <= r2) {
                stack.push((right_child << 1) | next_axis);
            }
        }

        neighborhood.sort_by_index();
    }

    // ------------------------------------------------------------------------
    // Private Helpers & Algorithms
    // ------------------------------------------------------------------------

    /// Recursively builds the tree in Eytzinger layout.
    fn build_recursive(
        points: &[T],
        indices: &mut [usize],
        depth: usize,
        nodes: &mut [KDNode],
        permuted_points: &mut [T],
        curr_idx: usize,
    ) {
        if indices.is_empty() {
            return;
        }

        let axis = depth % DIMS;
        let n = indices.len();

        // Pivot rank for a left-complete tree keeps the Eytzinger property
        let median_idx = Self::calculate_left_subtree_size(n);

        indices.select_nth_unstable_by(median_idx, |&a, &b| {
            points[a * DIMS + axis]
                .partial_cmp(&points[b * DIMS + axis])
                .unwrap_or(Equal)
        });

        let point_idx = indices[median_idx];
        nodes[curr_idx] = KDNode { index: point_idx };

        let src_start = point_idx * DIMS;
        let dest_start = curr_idx * DIMS;
        permuted_points[dest_start..dest_start + DIMS]
            .copy_from_slice(&points[src_start..src_start + DIMS]);

        let (left_part, right_part_with_median) = indices.split_at_mut(median_idx);
        let right_part = &mut right_part_with_median[1..];

        Self::build_recursive(
            points,
            left_part,
            depth + 1,
            nodes,
            permuted_points,
            2 * curr_idx + 1,
        );
        Self::build_recursive(
            points,
            right_part,
            depth + 1,
            nodes,
            permuted_points,
            2 * curr_idx + 2,
        );
    }

    /// Calculate number of nodes in the left subtree of a left-complete binary tree of size N.
    pub fn calculate_left_subtree_size(n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        // Height: H = floor(log2(n))
        let h = (usize::BITS - n.leading_zeros() - 1) as usize;
        if h == 0 {
            return 0;
        }

        let max_leaf_capacity = 1 << h;
        let r = n - (max_leaf_capacity - 1);
        let left_part_leaves = r.min(max_leaf_capacity / 2);
        (max_leaf_capacity / 2) - 1 + left_part_leaves
    }
}
