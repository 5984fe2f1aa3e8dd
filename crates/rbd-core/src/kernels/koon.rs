//! K-of-N engine (C10): reliable iff at least `K` of `N` components work.
//!
//! Picks the success/fail-side optimisation (§4.5), then for the identical
//! flavour evaluates a vectorised binomial sum (§4.5.1), and for the generic
//! flavour picks between an enumerated-combinations fast path (§4.5.2) and
//! an exponential recursion (§4.5.3) depending on how many subsets there are
//! to enumerate.

use crate::capability::SimdTier;
use crate::combinatorics::{binomial_table, CombinationTable};
use crate::dispatch::{dispatch, worker_groups, OutputSlice};
use crate::error::{EngineError, Result};
use crate::kernels::parallel;
use crate::kernels::scalar::scalar_run;
use crate::kernels::series;
use crate::kernels::simd;
use crate::partition::Partition;

#[cfg(target_arch = "x86_64")]
use crate::kernels::simd::x86;

#[cfg(target_arch = "aarch64")]
use crate::kernels::simd::aarch64;

/// The outcome of §4.5's success/fail-side optimisation, or a trivial edge
/// that bypasses the K-of-N machinery entirely.
enum Plan {
    /// `K == 0`: every output is `1.0`.
    AlwaysWorks,
    /// `K > N`: every output is `0.0`.
    AlwaysFails,
    /// `K == 1`: delegate to the Parallel kernel.
    DelegateParallel,
    /// `K == N`: delegate to the Series kernel.
    DelegateSeries,
    /// Genuine K-of-N evaluation with the cheaper side chosen.
    Evaluate { k_eff: usize, unreliability_mode: bool },
}

/// §4.5's trivial-edge table and success/fail-side optimisation, shared by
/// both flavours. The standard definition is used throughout: `K=1` is
/// Parallel, `K=N` is Series (see `DESIGN.md`'s note on the reversed
/// mapping found in one source revision, which this engine does not
/// replicate).
fn plan(n: usize, k: usize) -> Plan {
    if k == 0 {
        return Plan::AlwaysWorks;
    }
    if k > n {
        return Plan::AlwaysFails;
    }
    if k == 1 {
        return Plan::DelegateParallel;
    }
    if k == n {
        return Plan::DelegateSeries;
    }

    let k_fail = n - k + 1;
    if k_fail > k {
        Plan::Evaluate { k_eff: k_fail, unreliability_mode: true }
    } else {
        Plan::Evaluate { k_eff: k, unreliability_mode: false }
    }
}

/// `rel` is the identical-flavour curve (`rel[T]`, §6): the single shared
/// component reliability at each time instant.
pub(crate) fn run_identical(
    rel: &[f64],
    n: usize,
    k: usize,
    t_total: usize,
    out: &mut [f64],
    tier: SimdTier,
    partition: Partition,
) -> Result<()> {
    match plan(n, k) {
        Plan::AlwaysWorks => {
            out.fill(1.0);
            Ok(())
        }
        Plan::AlwaysFails => {
            out.fill(0.0);
            Ok(())
        }
        Plan::DelegateParallel => parallel::run_identical(rel, n, t_total, out, tier, partition),
        Plan::DelegateSeries => series::run_identical(rel, n, t_total, out, tier, partition),
        Plan::Evaluate { k_eff, unreliability_mode } => {
            let coeffs = binomial_table(n, k_eff)
                .ok_or(EngineError::CombinatorialOverflow { n, k: k_eff })?;
            let slice = OutputSlice::new(out);
            dispatch(partition, |batch| {
                for (start, width) in worker_groups(partition, batch, t_total) {
                    simd::cascade(tier, start, width, |lane_tier, lane_start| {
                        identical_group(rel, n, k_eff, &coeffs, unreliability_mode, lane_start, lane_tier, &slice);
                    });
                }
            })
        }
    }
}

pub(crate) fn run_generic(
    rel: &[f64],
    n: usize,
    k: usize,
    t_total: usize,
    out: &mut [f64],
    tier: SimdTier,
    partition: Partition,
) -> Result<()> {
    match plan(n, k) {
        Plan::AlwaysWorks => {
            out.fill(1.0);
            Ok(())
        }
        Plan::AlwaysFails => {
            out.fill(0.0);
            Ok(())
        }
        Plan::DelegateParallel => parallel::run_generic(rel, n, t_total, out, tier, partition),
        Plan::DelegateSeries => series::run_generic(rel, n, t_total, out, tier, partition),
        Plan::Evaluate { k_eff, unreliability_mode } => {
            run_generic_evaluate(rel, n, k_eff, unreliability_mode, t_total, out, partition)
        }
    }
}

/// `S = sum_{k=k_eff..n} C(n,k)`. Returns `None` if any term overflows.
fn subset_total(n: usize, k_eff: usize) -> Option<u64> {
    let table = binomial_table(n, k_eff)?;
    table.iter().copied().try_fold(0u64, |acc, c| acc.checked_add(c))
}

fn run_generic_evaluate(
    rel: &[f64],
    n: usize,
    k_eff: usize,
    unreliability_mode: bool,
    t_total: usize,
    out: &mut [f64],
    partition: Partition,
) -> Result<()> {
    let n_squared = (n as u64).saturating_mul(n as u64);
    let use_fast_path = subset_total(n, k_eff).map(|s| s <= n_squared).unwrap_or(false);

    if use_fast_path {
        if let Some(table) = CombinationTable::build(n, k_eff..=n)? {
            let slice = OutputSlice::new(out);
            return dispatch(partition, |batch| {
                for (start, width) in worker_groups(partition, batch, t_total) {
                    scalar_run(start, width, &slice, |time| {
                        fast_path_one(rel, n, t_total, k_eff, unreliability_mode, &table, time)
                    });
                }
            });
        }
    }

    let slice = OutputSlice::new(out);
    dispatch(partition, |batch| {
        for (start, width) in worker_groups(partition, batch, t_total) {
            scalar_run(start, width, &slice, |time| {
                recursive_one(rel, n, t_total, k_eff, unreliability_mode, time)
            });
        }
    })
}

/// §4.5.2: sum (or complement-sum) the product of `rel`/`1-rel` over every
/// `k`-subset for `k` in `k_eff..=n`, at a single time instant.
fn fast_path_one(rel: &[f64], n: usize, t_total: usize, k_eff: usize, unreliability_mode: bool, table: &CombinationTable, time: usize) -> f64 {
    let mut sum = 0.0;
    for k in k_eff..=n {
        for subset in table.subsets(k) {
            let mut term = 1.0;
            let mut subset_iter = subset.iter().peekable();
            for i in 0..n {
                let in_subset = subset_iter.peek().map(|&&s| s as usize == i).unwrap_or(false);
                if in_subset {
                    subset_iter.next();
                }
                let r = rel[i * t_total + time];
                let matching = if unreliability_mode { 1.0 - r } else { r };
                let other = if unreliability_mode { r } else { 1.0 - r };
                term *= if in_subset { matching } else { other };
            }
            sum += term;
        }
    }
    let result = if unreliability_mode { 1.0 - sum } else { sum };
    crate::clamp::clamp(result)
}

/// §4.5.3: `rel(r, n, k) = (1-r[n-1])*rel(r, n-1, k) + r[n-1]*rel(r, n-1, k-1)`,
/// base cases `rel(_, n, 0) = 1`, `rel(_, n, k>n) = 0`. `r` here is the
/// success-or-failure probability selected by `unreliability_mode`.
fn recursive_one(rel: &[f64], n: usize, t_total: usize, k_eff: usize, unreliability_mode: bool, time: usize) -> f64 {
    let side: Vec<f64> = (0..n)
        .map(|i| {
            let r = rel[i * t_total + time];
            if unreliability_mode { 1.0 - r } else { r }
        })
        .collect();
    let sum = koon_recursive(&side, n, k_eff);
    let result = if unreliability_mode { 1.0 - sum } else { sum };
    crate::clamp::clamp(result)
}

fn koon_recursive(r: &[f64], n: usize, k: usize) -> f64 {
    if k == 0 {
        return 1.0;
    }
    if k > n {
        return 0.0;
    }
    if n == 0 {
        return 0.0;
    }
    let last = r[n - 1];
    (1.0 - last) * koon_recursive(r, n - 1, k) + last * koon_recursive(r, n - 1, k - 1)
}

#[inline]
fn identical_group(
    rel: &[f64],
    n: usize,
    k_eff: usize,
    coeffs: &[u64],
    unreliability_mode: bool,
    start: usize,
    tier: SimdTier,
    out: &OutputSlice,
) {
    match tier {
        #[cfg(target_arch = "x86_64")]
        SimdTier::Avx2Fma => {
            let p_values = [rel[start], rel[start + 1], rel[start + 2], rel[start + 3]];
            unsafe { x86::koon_identical_avx2fma(p_values, n, k_eff, coeffs, unreliability_mode, start, out) }
        }
        #[cfg(target_arch = "aarch64")]
        SimdTier::Neon => {
            let p_values = [rel[start], rel[start + 1]];
            unsafe { aarch64::koon_identical_neon(p_values, n, k_eff, coeffs, unreliability_mode, start, out) }
        }
        _ => scalar_run(start, 1, out, |time| identical_one(rel[time], n, k_eff, coeffs, unreliability_mode)),
    }
}

fn identical_one(p: f64, n: usize, k_eff: usize, coeffs: &[u64], unreliability_mode: bool) -> f64 {
    let (matching, other) = if unreliability_mode { (1.0 - p, p) } else { (p, 1.0 - p) };
    let mut sum = 0.0;
    for (offset, &coeff) in coeffs.iter().enumerate() {
        let i = k_eff + offset;
        sum += coeff as f64 * matching.powi(i as i32) * other.powi((n - i) as i32);
    }
    let result = if unreliability_mode { 1.0 - sum } else { sum };
    crate::clamp::clamp(result)
}
