//! SIMD-accelerated, data-parallel evaluation engine for Reliability Block
//! Diagrams (RBDs): Series, Parallel, K-of-N, and Bridge blocks, each with a
//! generic (per-component matrix) and identical (shared curve) flavour.
//!
//! Callers compose arbitrary RBD topologies externally by chaining calls to
//! the eight entry points below; this crate evaluates one block at a time
//! across its full time axis.
//!
//! ```
//! use rbd_core::{series_identical, EngineConfig};
//!
//! let rel = [0.9];
//! let mut out = [0.0];
//! series_identical(&rel, 3, 1, &mut out, &EngineConfig::default()).unwrap();
//! assert!((out[0] - 0.729).abs() < 1e-9);
//! ```

mod api;
pub mod capability;
mod clamp;
pub mod combinatorics;
mod config;
mod dispatch;
pub mod error;
mod kernels;
mod partition;
mod postprocess;

pub use api::{
    bridge_generic, bridge_identical, koon_generic, koon_identical, parallel_generic,
    parallel_identical, series_generic, series_identical,
};
pub use capability::{capability, CapabilitySnapshot, SimdTier};
pub use config::EngineConfig;
pub use error::{EngineError, Result};
