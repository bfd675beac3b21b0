//! Layer 4: Evaluation
//!
//! # Purpose
//!
//! This layer turns accepted fits into reportable results:
//! - Derived quantities (trend, acceleration, seasonal signal, slopes)
//! - Output records and time-series rows
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
//! Layer 4: Evaluation ← You are here
//!   ↓
//! Layer 3: Algorithms
//!   ↓
//! Layer 2: Math
//!   ↓
//! Layer 1: Primitives
//! ```

/// Derived quantities of a fit.
pub mod derived;

/// Output records and time-series composition.
pub mod composer;
