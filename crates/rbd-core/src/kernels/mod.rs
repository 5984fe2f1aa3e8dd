//! Kernel orchestration (C7-C10): picks a SIMD tier and a work partition
//! once per call, then hands off to the block-specific kernel module.
//!
//! `KernelJob` is the tagged record §3 describes ("an immutable record
//! owned by the dispatcher... modelled in Rust as a tagged enum
//! `KernelJob<'a>`, one variant per (block type x flavour)"): each public
//! entry point in `api` builds one and passes it to `run`, which resolves
//! tier and partition once and dispatches into the matching kernel module.

pub(crate) mod bridge;
pub(crate) mod koon;
pub(crate) mod parallel;
pub(crate) mod scalar;
pub(crate) mod series;
pub(crate) mod simd;

use crate::capability::{capability, SimdTier};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::partition::plan as plan_partition;

/// Series/Parallel (C7/C8) and the identical K-of-N fast path when it
/// delegates to them (`K=1`, `K=N`) vectorise at every tier this engine
/// knows about.
const WIDE_TIERS: [SimdTier; 5] = [SimdTier::Avx512, SimdTier::Avx2Fma, SimdTier::Sse2, SimdTier::Neon, SimdTier::Scalar];

/// Bridge (C9) and the identical K-of-N fast path (C10 §4.5.1) only have
/// real vector kernels at AVX2+FMA and NEON (see `DESIGN.md`).
const NARROW_TIERS: [SimdTier; 3] = [SimdTier::Avx2Fma, SimdTier::Neon, SimdTier::Scalar];

/// One evaluation request: which block/flavour, and its arguments.
/// Generic variants borrow the caller's reliability matrix for the
/// duration of the call, per §3's "borrowing its inputs... for the
/// duration of the call".
pub(crate) enum KernelJob<'a> {
    SeriesGeneric { rel: &'a [f64], n: usize },
    SeriesIdentical { rel: &'a [f64], n: usize },
    ParallelGeneric { rel: &'a [f64], n: usize },
    ParallelIdentical { rel: &'a [f64], n: usize },
    KoonGeneric { rel: &'a [f64], n: usize, k: usize },
    KoonIdentical { rel: &'a [f64], n: usize, k: usize },
    BridgeGeneric { rel: &'a [f64] },
    BridgeIdentical { rel: &'a [f64] },
}

impl KernelJob<'_> {
    fn allowed_tiers(&self) -> &'static [SimdTier] {
        match self {
            KernelJob::SeriesGeneric { .. }
            | KernelJob::SeriesIdentical { .. }
            | KernelJob::ParallelGeneric { .. }
            | KernelJob::ParallelIdentical { .. } => &WIDE_TIERS,
            KernelJob::KoonGeneric { .. } | KernelJob::KoonIdentical { .. } | KernelJob::BridgeGeneric { .. } | KernelJob::BridgeIdentical { .. } => {
                &NARROW_TIERS
            }
        }
    }
}

/// Resolve the tier to dispatch on: the config's forced tier if it's both
/// supported by this CPU and usable by this kernel, otherwise the
/// strongest tier in `allowed` this CPU supports.
fn select_tier(allowed: &'static [SimdTier], config: &EngineConfig) -> SimdTier {
    let caps = capability();
    if let Some(forced) = config.forced_tier() {
        if allowed.contains(&forced) && caps.supports(forced) {
            return forced;
        }
        tracing::warn!(?forced, "forced SIMD tier unavailable for this kernel or unsupported by this CPU, falling back");
    }
    allowed.iter().copied().filter(|tier| caps.supports(*tier)).max().unwrap_or(SimdTier::Scalar)
}

/// Resolve capability, tier, and partition once, then run the job.
pub(crate) fn run(job: KernelJob, t_total: usize, out: &mut [f64], config: &EngineConfig) -> Result<()> {
    let caps = capability();
    let tier = select_tier(job.allowed_tiers(), config);
    let partition = plan_partition(t_total, caps.num_cores(), tier.lane_width(), config);
    tracing::trace!(workers = partition.workers, ?tier, "partition and tier selected");

    match job {
        KernelJob::SeriesGeneric { rel, n } => series::run_generic(rel, n, t_total, out, tier, partition),
        KernelJob::SeriesIdentical { rel, n } => series::run_identical(rel, n, t_total, out, tier, partition),
        KernelJob::ParallelGeneric { rel, n } => parallel::run_generic(rel, n, t_total, out, tier, partition),
        KernelJob::ParallelIdentical { rel, n } => parallel::run_identical(rel, n, t_total, out, tier, partition),
        KernelJob::KoonGeneric { rel, n, k } => koon::run_generic(rel, n, k, t_total, out, tier, partition),
        KernelJob::KoonIdentical { rel, n, k } => koon::run_identical(rel, n, k, t_total, out, tier, partition),
        KernelJob::BridgeGeneric { rel } => bridge::run_generic(rel, t_total, out, tier, partition),
        KernelJob::BridgeIdentical { rel } => bridge::run_identical(rel, t_total, out, tier, partition),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forcing_a_tier_outside_the_kernels_allowed_set_falls_back() {
        let config = EngineConfig::default().with_forced_tier(SimdTier::Avx512);
        let tier = select_tier(&NARROW_TIERS, &config);
        assert_ne!(tier, SimdTier::Avx512);
        assert!(NARROW_TIERS.contains(&tier));
    }

    #[test]
    fn forcing_scalar_always_succeeds() {
        let config = EngineConfig::default().with_forced_tier(SimdTier::Scalar);
        assert_eq!(select_tier(&WIDE_TIERS, &config), SimdTier::Scalar);
        assert_eq!(select_tier(&NARROW_TIERS, &config), SimdTier::Scalar);
    }

    #[test]
    fn no_forced_tier_picks_the_strongest_supported_one() {
        let config = EngineConfig::default();
        let tier = select_tier(&WIDE_TIERS, &config);
        assert!(capability().supports(tier));
    }
}
