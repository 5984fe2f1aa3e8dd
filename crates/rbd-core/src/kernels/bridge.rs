//! Bridge kernel (C9): the fixed 5-component bridge topology (§4.4).
//!
//! Vectorised only at AVX2+FMA and NEON (see `DESIGN.md`'s scope note) — the
//! closed-form expansion leans on `fnmadd`/`fmadd` shapes that exist at
//! those two tiers but not at SSE2 or AVX-512F without a wider rewrite
//! nothing else in this engine needs. `kernels::tier_for` never selects
//! `Sse2`/`Avx512` for bridge; the match arms below still handle them by
//! falling back to scalar, so a caller that ignores that contract still
//! gets correct (if unaccelerated) results.

use crate::capability::SimdTier;
use crate::dispatch::{dispatch, worker_groups, OutputSlice};
use crate::error::{EngineError, Result};
use crate::kernels::scalar::{bridge_generic_one, bridge_identical_one, scalar_run};
use crate::kernels::simd;
use crate::partition::Partition;

#[cfg(target_arch = "x86_64")]
use crate::kernels::simd::x86;

#[cfg(target_arch = "aarch64")]
use crate::kernels::simd::aarch64;

pub(crate) const COMPONENT_COUNT: usize = 5;

pub(crate) fn run_generic(rel: &[f64], t_total: usize, out: &mut [f64], tier: SimdTier, partition: Partition) -> Result<()> {
    if rel.len() != COMPONENT_COUNT * t_total {
        return Err(EngineError::InvalidShape {
            detail: format!("bridge requires exactly {COMPONENT_COUNT} components, got shape implying {}", rel.len() / t_total.max(1)),
        });
    }
    let slice = OutputSlice::new(out);
    dispatch(partition, |batch| {
        for (start, width) in worker_groups(partition, batch, t_total) {
            simd::cascade(tier, start, width, |lane_tier, lane_start| {
                generic_group(rel, t_total, lane_start, lane_tier, &slice);
            });
        }
    })
}

/// `rel` is the identical-flavour curve (`rel[T]`, §6): the single shared
/// component reliability at each time instant.
pub(crate) fn run_identical(rel: &[f64], t_total: usize, out: &mut [f64], tier: SimdTier, partition: Partition) -> Result<()> {
    let slice = OutputSlice::new(out);
    dispatch(partition, |batch| {
        for (start, width) in worker_groups(partition, batch, t_total) {
            simd::cascade(tier, start, width, |lane_tier, lane_start| {
                identical_group(rel, lane_start, lane_tier, &slice);
            });
        }
    })
}

#[inline]
fn generic_group(rel: &[f64], t_total: usize, start: usize, tier: SimdTier, out: &OutputSlice) {
    match tier {
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx2Fma => unsafe { x86::bridge_generic_avx2fma(rel, t_total, start, out) },
        #[cfg(target_arch = "aarch64")]
        SimdTier::Neon => unsafe { aarch64::bridge_generic_neon(rel, t_total, start, out) },
        _ => scalar_run(start, 1, out, |time| bridge_generic_one(rel, t_total, time)),
    }
}

#[inline]
fn identical_group(rel: &[f64], start: usize, tier: SimdTier, out: &OutputSlice) {
    match tier {
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx2Fma => unsafe { x86::bridge_identical_avx2fma(rel, start, out) },
        #[cfg(target_arch = "aarch64")]
        SimdTier::Neon => unsafe { aarch64::bridge_identical_neon(rel, start, out) },
        _ => scalar_run(start, 1, out, |time| bridge_identical_one(rel[time])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::partition::plan;

    #[test]
    fn generic_with_five_equal_columns_matches_identical() {
        let t = 40;
        let r = 0.92;
        let rel: Vec<f64> = std::iter::repeat(r).take(COMPONENT_COUNT * t).collect();
        let config = EngineConfig::default().with_min_batch_size(1);
        let partition = plan(t, 4, 1, &config);

        let mut generic_out = vec![0.0; t];
        run_generic(&rel, t, &mut generic_out, SimdTier::Scalar, partition).unwrap();
        let identical_rel: Vec<f64> = std::iter::repeat(r).take(t).collect();
        let mut identical_out = vec![0.0; t];
        run_identical(&identical_rel, t, &mut identical_out, SimdTier::Scalar, partition).unwrap();

        for i in 0..t {
            assert!((generic_out[i] - identical_out[i]).abs() < 1e-9);
        }
    }

    #[test]
    fn rejects_a_shape_without_five_components() {
        let t = 10;
        let rel = vec![0.9; 4 * t];
        let config = EngineConfig::default();
        let partition = plan(t, 4, 1, &config);
        let mut out = vec![0.0; t];
        let err = run_generic(&rel, t, &mut out, SimdTier::Scalar, partition).unwrap_err();
        assert!(matches!(err, EngineError::InvalidShape { .. }));
    }

    #[test]
    fn avx2fma_generic_matches_scalar() {
        if !(is_x86_feature_detected_safe()) {
            return;
        }
        let t = 33;
        let rel: Vec<f64> = (0..COMPONENT_COUNT * t).map(|i| 0.5 + (i as f64 % 9.0) * 0.04).collect();
        let config = EngineConfig::default().with_min_batch_size(1);
        let partition = plan(t, 4, 1, &config);

        let mut scalar_out = vec![0.0; t];
        run_generic(&rel, t, &mut scalar_out, SimdTier::Scalar, partition).unwrap();
        let mut avx_out = vec![0.0; t];
        run_generic(&rel, t, &mut avx_out, SimdTier::Avx2Fma, partition).unwrap();

        for i in 0..t {
            assert!((scalar_out[i] - avx_out[i]).abs() < 1e-9);
        }
    }

    #[cfg(target_arch = "x86_64")]
    fn is_x86_feature_detected_safe() -> bool {
        is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")
    }

    #[cfg(not(target_arch = "x86_64"))]
    fn is_x86_feature_detected_safe() -> bool {
        false
    }
}
