//! Layer 6: Adapters
//!
//! # Purpose
//!
//! This layer provides the execution adapters:
//! - Batch (sequential, default)
//! - Parallel (rayon thread pool, `parallel` feature)
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters ← You are here
//!   ↓
//! Layer 5: Engine
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Sequential execution.
pub mod batch;

/// Multi-threaded execution.
#[cfg(feature = "parallel")]
pub mod parallel;
