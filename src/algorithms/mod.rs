//! Layer 3: Algorithms
//!
//! # Purpose
//!
//! This layer implements the per-neighborhood algorithms:
//! - Model bases and design-matrix construction
//! - Adaptive neighborhood selection
//! - Robust iterative weighted regression
//! - Residual time binning
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
//! Layer 3: Algorithms ← You are here
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Model bases and design matrices.
pub mod basis;

/// Time binning of residual series.
pub mod binning;

/// Neighborhood selection over a radius schedule.
pub mod selection;

/// Robust weighted regression solver.
pub mod regression;
