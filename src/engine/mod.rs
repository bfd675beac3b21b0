//! Layer 5: Engine
//!
//! # Purpose
//!
//! This layer orchestrates a run:
//! - Configuration and input validation
//! - Run preparation and the per-point pipeline
//! - Per-worker workspaces
//! - Result assembly
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine ← You are here
//!   ↓
//! Layer 4: Evaluation
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Configuration and input validation.
pub mod validator;

/// Per-worker scratch space.
pub mod workspace;

/// Run preparation and per-point execution.
pub mod executor;

/// Run results and diagnostics.
pub mod output;
