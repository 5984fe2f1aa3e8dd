//! Series kernel (C7): every component must work. Ties the scalar baseline,
//! the per-tier vector kernels, and the tail cascade together behind the
//! worker dispatcher so `api::series_generic`/`api::series_identical` stay
//! thin shape-validation wrappers.

use crate::capability::SimdTier;
use crate::dispatch::{dispatch, worker_groups, OutputSlice};
use crate::error::Result;
use crate::kernels::scalar::{scalar_run, series_generic_one, series_identical_one};
use crate::kernels::simd;
use crate::partition::Partition;

#[cfg(target_arch = "x86_64")]
use crate::kernels::simd::x86;

#[cfg(target_arch = "aarch64")]
use crate::kernels::simd::aarch64;

pub(crate) fn run_generic(
    rel: &[f64],
    n: usize,
    t_total: usize,
    out: &mut [f64],
    tier: SimdTier,
    partition: Partition,
) -> Result<()> {
    let slice = OutputSlice::new(out);
    dispatch(partition, |batch| {
        for (start, width) in worker_groups(partition, batch, t_total) {
            simd::cascade(tier, start, width, |lane_tier, lane_start| {
                generic_group(rel, n, t_total, lane_start, lane_tier, &slice);
            });
        }
    })
}

/// `rel` here is the identical-flavour curve (`rel[T]`, §6): one shared
/// reliability value per time instant, not a single constant across `T`.
pub(crate) fn run_identical(rel: &[f64], n: usize, t_total: usize, out: &mut [f64], tier: SimdTier, partition: Partition) -> Result<()> {
    let slice = OutputSlice::new(out);
    dispatch(partition, |batch| {
        for (start, width) in worker_groups(partition, batch, t_total) {
            simd::cascade(tier, start, width, |lane_tier, lane_start| {
                identical_group(rel, n, lane_start, lane_tier, &slice);
            });
        }
    })
}

#[inline]
fn generic_group(rel: &[f64], n: usize, t_total: usize, start: usize, tier: SimdTier, out: &OutputSlice) {
    match tier {
        #[cfg(target_arch = "x86_64")]
        SimdTier::Sse2 => unsafe { x86::series_generic_sse2(rel, n, t_total, start, out) },
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx2Fma => unsafe { x86::series_generic_avx2fma(rel, n, t_total, start, out) },
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx512 => unsafe { x86::series_generic_avx512(rel, n, t_total, start, out) },
        #[cfg(target_arch = "aarch64")]
        SimdTier::Neon => unsafe { aarch64::series_generic_neon(rel, n, t_total, start, out) },
        _ => scalar_run(start, 1, out, |time| series_generic_one(rel, n, t_total, time)),
    }
}

#[inline]
fn identical_group(rel: &[f64], n: usize, start: usize, tier: SimdTier, out: &OutputSlice) {
    match tier {
        #[cfg(target_arch = "x86_64")]
        SimdTier::Sse2 => unsafe { x86::series_identical_sse2(rel, n, start, out) },
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx2Fma => unsafe { x86::series_identical_avx2fma(rel, n, start, out) },
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx512 => unsafe { x86::series_identical_avx512(rel, n, start, out) },
        #[cfg(target_arch = "aarch64")]
        SimdTier::Neon => unsafe { aarch64::series_identical_neon(rel, n, start, out) },
        _ => scalar_run(start, 1, out, |time| series_identical_one(rel[time], n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::partition::plan;

    #[test]
    fn generic_and_identical_agree_on_uniform_input() {
        let t = 64;
        let n = 4;
        let p = 0.85;
        let rel: Vec<f64> = std::iter::repeat(p).take(n * t).collect();
        let config = EngineConfig::default().with_min_batch_size(1);
        let partition = plan(t, 4, 1, &config);

        let mut generic_out = vec![0.0; t];
        run_generic(&rel, n, t, &mut generic_out, SimdTier::Scalar, partition).unwrap();

        let identical_rel: Vec<f64> = std::iter::repeat(p).take(t).collect();
        let mut identical_out = vec![0.0; t];
        run_identical(&identical_rel, n, t, &mut identical_out, SimdTier::Scalar, partition).unwrap();

        for i in 0..t {
            assert!((generic_out[i] - identical_out[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn every_supported_tier_agrees_with_scalar() {
        let t = 37;
        let n = 3;
        let rel: Vec<f64> = (0..n * t).map(|i| 0.5 + (i as f64 % 7.0) * 0.05).collect();
        let config = EngineConfig::default().with_min_batch_size(1);
        let partition = plan(t, 4, 1, &config);

        let mut scalar_out = vec![0.0; t];
        run_generic(&rel, n, t, &mut scalar_out, SimdTier::Scalar, partition).unwrap();

        for &tier in &[SimdTier::Sse2, SimdTier::Avx2Fma, SimdTier::Avx512, SimdTier::Neon] {
            if !crate::capability::capability().supports(tier) {
                continue;
            }
            let mut out = vec![0.0; t];
            run_generic(&rel, n, t, &mut out, tier, partition).unwrap();
            for i in 0..t {
                assert!((scalar_out[i] - out[i]).abs() < 1e-9, "tier {tier:?} diverged at {i}");
            }
        }
    }
}
