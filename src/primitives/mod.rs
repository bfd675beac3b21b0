//! Layer 1: Primitives
//!
//! # Purpose
//!
//! This layer holds the data structures every other layer builds on:
//! - Error types (`TrendError`)
//! - The observation container (`ObservationSet`)
//! - Reusable scratch buffers
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
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Error types.
pub mod errors;

/// Observation container and time conversion.
pub mod observation;

/// Reusable scratch buffers.
pub mod buffer;
