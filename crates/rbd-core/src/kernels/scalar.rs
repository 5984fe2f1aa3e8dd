//! Scalar tier: the baseline every vector tier must agree with, and the
//! tail-cascade's final rung. Every block type's `Scalar` tier (lane width
//! 1) reuses these functions directly; vector tiers reuse them too for any
//! leftover lane that doesn't fill a full group.

use crate::clamp::clamp;
use crate::dispatch::OutputSlice;

#[inline(always)]
pub(crate) fn series_generic_one(rel: &[f64], n: usize, t_total: usize, time: usize) -> f64 {
    let mut acc = 1.0;
    for i in 0..n {
        acc *= rel[i * t_total + time];
    }
    clamp(acc)
}

#[inline(always)]
pub(crate) fn series_identical_one(p: f64, n: usize) -> f64 {
    let mut acc = 1.0;
    for _ in 0..n {
        acc *= p;
    }
    clamp(acc)
}

#[inline(always)]
pub(crate) fn parallel_generic_one(rel: &[f64], n: usize, t_total: usize, time: usize) -> f64 {
    let mut acc = 1.0;
    for i in 0..n {
        acc *= 1.0 - rel[i * t_total + time];
    }
    clamp(1.0 - acc)
}

#[inline(always)]
pub(crate) fn parallel_identical_one(p: f64, n: usize) -> f64 {
    let mut acc = 1.0;
    for _ in 0..n {
        acc *= 1.0 - p;
    }
    clamp(1.0 - acc)
}

#[inline(always)]
pub(crate) fn bridge_generic_one(rel: &[f64], t_total: usize, time: usize) -> f64 {
    let r1 = rel[time];
    let r2 = rel[t_total + time];
    let r3 = rel[2 * t_total + time];
    let r4 = rel[3 * t_total + time];
    let r5 = rel[4 * t_total + time];

    let val1 = (r1 + r3 - r1 * r3) * (r2 + r4 - r2 * r4);
    let val2 = r1 * r2 + r3 * r4 - r1 * r2 * r3 * r4;
    clamp(r5 * (val1 - val2) + val2)
}

#[inline(always)]
pub(crate) fn bridge_identical_one(r: f64) -> f64 {
    let f = 1.0 - r;
    clamp(r * (1.0 + f * (f * (f * f - 2.0) + r * (2.0 - r * r))))
}

/// Run a scalar `op` over every index in `start..start + width`, writing
/// through `out`. Shared by the `Scalar` tier and every tail cascade.
#[inline(always)]
pub(crate) fn scalar_run(start: usize, width: usize, out: &OutputSlice, mut op: impl FnMut(usize) -> f64) {
    for time in start..start + width {
        out.write(time, op(time));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_identical_matches_pow() {
        assert!((series_identical_one(0.9, 3) - 0.9f64.powi(3)).abs() < 1e-12);
    }

    #[test]
    fn parallel_identical_matches_complement_of_pow() {
        assert!((parallel_identical_one(0.5, 3) - (1.0 - 0.5f64.powi(3))).abs() < 1e-12);
    }

    #[test]
    fn bridge_identical_matches_generic_with_five_equal_inputs() {
        let r = 0.9;
        let rel = vec![r; 5];
        let generic = bridge_generic_one(&rel, 1, 0);
        let identical = bridge_identical_one(r);
        assert!((generic - identical).abs() < 1e-12);
    }
}
