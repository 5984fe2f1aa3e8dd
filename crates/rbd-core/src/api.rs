//! Public entry points (§6): eight operations, four block types times two
//! flavours. Every function validates shapes, builds a `kernels::KernelJob`,
//! runs it, then enforces monotonicity (C11) before returning.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::kernels::{self, KernelJob};
use crate::postprocess::enforce_monotone;

fn validate_generic(rel: &[f64], n: usize, t: usize, out: &[f64]) -> Result<()> {
    if n == 0 {
        return Err(EngineError::InvalidShape { detail: "N must be >= 1".to_string() });
    }
    if rel.len() != n * t {
        return Err(EngineError::InvalidShape {
            detail: format!("rel.len() = {} does not match N*T = {}", rel.len(), n * t),
        });
    }
    if out.len() != t {
        return Err(EngineError::InvalidShape { detail: format!("out.len() = {} does not match T = {}", out.len(), t) });
    }
    Ok(())
}

/// Identical-flavour shape check: `rel` is a `T`-long curve, one shared
/// value per time instant (§6), not a per-component matrix.
fn validate_identical(n: usize, t: usize, rel: &[f64], out: &[f64]) -> Result<()> {
    if n == 0 {
        return Err(EngineError::InvalidShape { detail: "N must be >= 1".to_string() });
    }
    if rel.len() != t {
        return Err(EngineError::InvalidShape { detail: format!("rel.len() = {} does not match T = {}", rel.len(), t) });
    }
    if out.len() != t {
        return Err(EngineError::InvalidShape { detail: format!("out.len() = {} does not match T = {}", out.len(), t) });
    }
    Ok(())
}

fn finish(result: Result<()>, out: &mut [f64]) -> Result<()> {
    match result {
        Ok(()) => {
            enforce_monotone(out);
            Ok(())
        }
        Err(e) => {
            tracing::warn!(error = %e, "rbd-core call failed");
            Err(e)
        }
    }
}

/// Series block (C7): every component must work. `rel` is `N` rows of `T`
/// samples each, row-major (`rel[i*T + t]`).
pub fn series_generic(rel: &[f64], n: usize, t: usize, out: &mut [f64], config: &EngineConfig) -> Result<()> {
    tracing::debug!(block = "series", flavour = "generic", n, t, "evaluating");
    validate_generic(rel, n, t, out)?;
    let result = kernels::run(KernelJob::SeriesGeneric { rel, n }, t, out, config);
    finish(result, out)
}

/// Series block, identical flavour: `rel[t]` is the reliability every one
/// of the `n` components shares at time `t`.
pub fn series_identical(rel: &[f64], n: usize, t: usize, out: &mut [f64], config: &EngineConfig) -> Result<()> {
    tracing::debug!(block = "series", flavour = "identical", n, t, "evaluating");
    validate_identical(n, t, rel, out)?;
    let result = kernels::run(KernelJob::SeriesIdentical { rel, n }, t, out, config);
    finish(result, out)
}

/// Parallel block (C8): at least one component must work.
pub fn parallel_generic(rel: &[f64], n: usize, t: usize, out: &mut [f64], config: &EngineConfig) -> Result<()> {
    tracing::debug!(block = "parallel", flavour = "generic", n, t, "evaluating");
    validate_generic(rel, n, t, out)?;
    let result = kernels::run(KernelJob::ParallelGeneric { rel, n }, t, out, config);
    finish(result, out)
}

pub fn parallel_identical(rel: &[f64], n: usize, t: usize, out: &mut [f64], config: &EngineConfig) -> Result<()> {
    tracing::debug!(block = "parallel", flavour = "identical", n, t, "evaluating");
    validate_identical(n, t, rel, out)?;
    let result = kernels::run(KernelJob::ParallelIdentical { rel, n }, t, out, config);
    finish(result, out)
}

/// K-of-N block (C10): reliable iff at least `k` of `n` components work.
pub fn koon_generic(rel: &[f64], n: usize, k: usize, t: usize, out: &mut [f64], config: &EngineConfig) -> Result<()> {
    tracing::debug!(block = "koon", flavour = "generic", n, k, t, "evaluating");
    validate_generic(rel, n, t, out)?;
    let result = kernels::run(KernelJob::KoonGeneric { rel, n, k }, t, out, config);
    finish(result, out)
}

pub fn koon_identical(rel: &[f64], n: usize, k: usize, t: usize, out: &mut [f64], config: &EngineConfig) -> Result<()> {
    tracing::debug!(block = "koon", flavour = "identical", n, k, t, "evaluating");
    validate_identical(n, t, rel, out)?;
    let result = kernels::run(KernelJob::KoonIdentical { rel, n, k }, t, out, config);
    finish(result, out)
}

/// Bridge block (C9): the fixed 5-component bridge topology.
pub fn bridge_generic(rel: &[f64], t: usize, out: &mut [f64], config: &EngineConfig) -> Result<()> {
    tracing::debug!(block = "bridge", flavour = "generic", t, "evaluating");
    if rel.len() != crate::kernels::bridge::COMPONENT_COUNT * t {
        let err = EngineError::InvalidShape {
            detail: format!("bridge requires exactly 5 components; rel.len() = {} does not match 5*T = {}", rel.len(), 5 * t),
        };
        tracing::warn!(error = %err, "rbd-core call failed");
        return Err(err);
    }
    if out.len() != t {
        let err = EngineError::InvalidShape { detail: format!("out.len() = {} does not match T = {}", out.len(), t) };
        tracing::warn!(error = %err, "rbd-core call failed");
        return Err(err);
    }
    let result = kernels::run(KernelJob::BridgeGeneric { rel }, t, out, config);
    finish(result, out)
}

/// Bridge block, identical flavour: `rel[t]` is the reliability every one
/// of the bridge's 5 components shares at time `t`.
pub fn bridge_identical(rel: &[f64], t: usize, out: &mut [f64], config: &EngineConfig) -> Result<()> {
    tracing::debug!(block = "bridge", flavour = "identical", t, "evaluating");
    if rel.len() != t {
        let err = EngineError::InvalidShape { detail: format!("rel.len() = {} does not match T = {}", rel.len(), t) };
        tracing::warn!(error = %err, "rbd-core call failed");
        return Err(err);
    }
    if out.len() != t {
        let err = EngineError::InvalidShape { detail: format!("out.len() = {} does not match T = {}", out.len(), t) };
        tracing::warn!(error = %err, "rbd-core call failed");
        return Err(err);
    }
    let result = kernels::run(KernelJob::BridgeIdentical { rel }, t, out, config);
    finish(result, out)
}
