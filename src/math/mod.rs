//! Layer 2: Math
//!
//! # Purpose
//!
//! This layer provides pure mathematical building blocks:
//! - Robust statistics (MAD, robust standard deviation)
//! - Spatial indexing (KD-tree radius queries)
//! - Weighted least squares through nalgebra
//! - Map projections and raster sampling
//!
//! These carry no trend-specific logic.
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives
//! ```

/// Median Absolute Deviation (MAD) and robust scale.
pub mod mad;

/// KD-tree for radius queries.
pub mod neighborhood;

/// Linear algebra backend.
pub mod linalg;

/// Polar stereographic projection.
pub mod projection;

/// Bilinear raster sampling.
pub mod raster;
