use thiserror::Error;

/// Everything a public entry point can fail with.
///
/// Replaces the source's negative-integer return codes with a closed,
/// typed surface. Callers that need the legacy `0`/negative convention can
/// map `Ok(()) -> 0` and `Err(_) -> -1` at an FFI boundary; that mapping is
/// out of scope for this crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid shape: {detail}")]
    InvalidShape { detail: String },

    #[error("allocation failed: {0}")]
    Allocation(String),

    #[error("C({n}, {k}) overflows u64")]
    CombinatorialOverflow { n: usize, k: usize },

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
