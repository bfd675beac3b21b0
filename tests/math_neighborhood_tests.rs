//! Tests for the 2D KD-tree radius search.
//!
//! ## Test Organization
//!
//! 1. **Construction** - Tree size and layout helpers
//! 2. **Radius Queries** - Inclusivity, ordering and distances
//! 3. **Brute-force Agreement** - Randomized comparison

use approx::assert_relative_eq;
use rand::prelude::*;

use dhdt_rs::internals::math::neighborhood::{KDTree, Neighborhood};
use dhdt_rs::internals::primitives::buffer::NeighborhoodSearchBuffer;

fn query(tree: &KDTree<f64>, qx: f64, qy: f64, r: f64) -> Neighborhood<f64> {
    let mut buffer = NeighborhoodSearchBuffer::new();
    let mut nbh = Neighborhood::new();
    tree.find_within_radius(qx, qy, r, &mut buffer, &mut nbh);
    nbh
}

// ============================================================================
// Construction Tests
// ============================================================================

/// The tree indexes every point.
#[test]
fn test_kdtree_len() {
    let x = [0.0, 1.0, 2.0];
    let y = [0.0, 1.0, 2.0];
    let tree = KDTree::new(&x, &y);
    assert_eq!(tree.len(), 3);
    assert!(!tree.is_empty());

    let empty = KDTree::<f64>::new(&[], &[]);
    assert!(empty.is_empty());
}

/// Left subtree sizes follow the complete-tree layout.
#[test]
fn test_left_subtree_size() {
    assert_eq!(KDTree::<f64>::calculate_left_subtree_size(1), 0);
    assert_eq!(KDTree::<f64>::calculate_left_subtree_size(2), 1);
    assert_eq!(KDTree::<f64>::calculate_left_subtree_size(3), 1);
    assert_eq!(KDTree::<f64>::calculate_left_subtree_size(7), 3);
}

// ============================================================================
// Radius Query Tests
// ============================================================================

/// Points exactly on the radius are included.
#[test]
fn test_radius_is_inclusive() {
    let x = [0.0, 3.0, 0.0, 5.0];
    let y = [0.0, 4.0, 5.0, 0.1];
    let tree = KDTree::new(&x, &y);

    let nbh = query(&tree, 0.0, 0.0, 5.0);
    assert_eq!(nbh.indices, vec![0, 1, 2]);
}

/// Results are sorted by index and carry Euclidean distances.
#[test]
fn test_results_sorted_with_distances() {
    let x = [10.0, 0.0, 1.0, -1.0];
    let y = [10.0, 0.0, 0.0, 0.0];
    let tree = KDTree::new(&x, &y);

    let nbh = query(&tree, 0.0, 0.0, 2.0);
    assert_eq!(nbh.indices, vec![1, 2, 3]);
    assert_eq!(nbh.len(), nbh.distances.len());
    assert_relative_eq!(nbh.distances[0], 0.0);
    assert_relative_eq!(nbh.distances[1], 1.0);
    assert_relative_eq!(nbh.distances[2], 1.0);
}

/// Duplicate coordinates are all returned.
#[test]
fn test_duplicate_points() {
    let x = [2.0; 6];
    let y = [2.0; 6];
    let tree = KDTree::new(&x, &y);

    let nbh = query(&tree, 2.0, 2.0, 0.5);
    assert_eq!(nbh.indices, vec![0, 1, 2, 3, 4, 5]);
}

/// An empty query result clears previous contents.
#[test]
fn test_empty_result_clears_output() {
    let x = [0.0, 1.0];
    let y = [0.0, 1.0];
    let tree = KDTree::new(&x, &y);

    let mut buffer = NeighborhoodSearchBuffer::new();
    let mut nbh = Neighborhood::new();
    tree.find_within_radius(0.0, 0.0, 10.0, &mut buffer, &mut nbh);
    assert_eq!(nbh.len(), 2);

    tree.find_within_radius(100.0, 100.0, 1.0, &mut buffer, &mut nbh);
    assert!(nbh.is_empty());
}

// ============================================================================
// Brute-force Agreement
// ============================================================================

/// Radius queries match a linear scan on random data.
#[test]
fn test_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(7);
    let n = 500;
    let x: Vec<f64> = (0..n).map(|_| rng.random_range(-1000.0..1000.0)).collect();
    let y: Vec<f64> = (0..n).map(|_| rng.random_range(-1000.0..1000.0)).collect();
    let tree = KDTree::new(&x, &y);

    let mut buffer = NeighborhoodSearchBuffer::new();
    let mut nbh = Neighborhood::new();
    for _ in 0..25 {
        let qx = rng.random_range(-1000.0..1000.0);
        let qy = rng.random_range(-1000.0..1000.0);
        let r = rng.random_range(10.0..400.0);

        tree.find_within_radius(qx, qy, r, &mut buffer, &mut nbh);

        let expected: Vec<usize> = (0..n)
            .filter(|&i| (x[i] - qx).powi(2) + (y[i] - qy).powi(2) <= r * r)
            .collect();
        assert_eq!(nbh.indices, expected);
    }
}
