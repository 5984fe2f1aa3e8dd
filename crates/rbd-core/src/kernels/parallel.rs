//! Parallel kernel (C8): at least one component must work. Mirrors
//! `series.rs`'s shape, swapping in the complement formulas.

use crate::capability::SimdTier;
use crate::dispatch::{dispatch, worker_groups, OutputSlice};
use crate::error::Result;
use crate::kernels::scalar::{parallel_generic_one, parallel_identical_one, scalar_run};
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

/// `rel` is the identical-flavour curve (`rel[T]`, §6), one shared value per
/// time instant.
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
        SimdTier::Sse2 => unsafe { x86::parallel_generic_sse2(rel, n, t_total, start, out) },
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx2Fma => unsafe { x86::parallel_generic_avx2fma(rel, n, t_total, start, out) },
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx512 => unsafe { x86::parallel_generic_avx512(rel, n, t_total, start, out) },
        #[cfg(target_arch = "aarch64")]
        SimdTier::Neon => unsafe { aarch64::parallel_generic_neon(rel, n, t_total, start, out) },
        _ => scalar_run(start, 1, out, |time| parallel_generic_one(rel, n, t_total, time)),
    }
}

#[inline]
fn identical_group(rel: &[f64], n: usize, start: usize, tier: SimdTier, out: &OutputSlice) {
    match tier {
        #[cfg(target_arch = "x86_64")]
        SimdTier::Sse2 => unsafe { x86::parallel_identical_sse2(rel, n, start, out) },
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx2Fma => unsafe { x86::parallel_identical_avx2fma(rel, n, start, out) },
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx512 => unsafe { x86::parallel_identical_avx512(rel, n, start, out) },
        #[cfg(target_arch = "aarch64")]
        SimdTier::Neon => unsafe { aarch64::parallel_identical_neon(rel, n, start, out) },
        _ => scalar_run(start, 1, out, |time| parallel_identical_one(rel[time], n)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::partition::plan;

    #[test]
    fn generic_and_identical_agree_on_uniform_input() {
        let t = 50;
        let n = 3;
        let p = 0.6;
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
    fn parallel_reliability_is_never_less_than_any_single_component() {
        let t = 16;
        let n = 3;
        let rel: Vec<f64> = (0..n * t).map(|i| 0.3 + (i as f64 % 5.0) * 0.1).collect();
        let config = EngineConfig::default().with_min_batch_size(1);
        let partition = plan(t, 4, 1, &config);

        let mut out = vec![0.0; t];
        run_generic(&rel, n, t, &mut out, SimdTier::Scalar, partition).unwrap();

        for time in 0..t {
            let best = (0..n).map(|i| rel[i * t + time]).fold(0.0f64, f64::max);
            assert!(out[time] >= best - 1e-12);
        }
    }
}
