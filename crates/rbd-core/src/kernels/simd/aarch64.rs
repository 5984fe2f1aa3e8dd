//! aarch64 vector kernels: NEON, 2 `f64` lanes per op. Mirrors `x86::`'s
//! structure and NaN-via-max(_, 0) clamp trick (NEON's `vmaxq_f64` has the
//! same "NaN in lane 0 -> lane 0 of the other operand" semantics AArch64
//! requires of its floating-point max, so the same zero-cost clamp applies).

use std::arch::aarch64::*;

use crate::dispatch::OutputSlice;

#[inline(always)]
unsafe fn clamp_neon(x: float64x2_t) -> float64x2_t {
    let zero = vdupq_n_f64(0.0);
    let one = vdupq_n_f64(1.0);
    vminq_f64(vmaxq_f64(x, zero), one)
}

#[inline(always)]
unsafe fn store(out: &OutputSlice, start: usize, v: float64x2_t) {
    let mut buf = [0.0f64; 2];
    vst1q_f64(buf.as_mut_ptr(), v);
    out.write(start, buf[0]);
    out.write(start + 1, buf[1]);
}

#[target_feature(enable = "neon")]
pub(crate) unsafe fn series_generic_neon(rel: &[f64], n: usize, t_total: usize, start: usize, out: &OutputSlice) {
    let mut acc = vld1q_f64(rel.as_ptr().add(start));
    for i in 1..n {
        let lane = vld1q_f64(rel.as_ptr().add(i * t_total + start));
        acc = vmulq_f64(acc, lane);
    }
    store(out, start, clamp_neon(acc));
}

// Identical-flavour inputs are a per-time-instant curve (`rel[T]`, §6), so
// each lane loads a different time instant's shared reliability value
// rather than broadcasting one scalar across the whole group.

#[target_feature(enable = "neon")]
pub(crate) unsafe fn series_identical_neon(rel: &[f64], n: usize, start: usize, out: &OutputSlice) {
    let pv = vld1q_f64(rel.as_ptr().add(start));
    let mut acc = vdupq_n_f64(1.0);
    for _ in 0..n {
        acc = vmulq_f64(acc, pv);
    }
    store(out, start, clamp_neon(acc));
}

#[target_feature(enable = "neon")]
pub(crate) unsafe fn parallel_generic_neon(rel: &[f64], n: usize, t_total: usize, start: usize, out: &OutputSlice) {
    let one = vdupq_n_f64(1.0);
    let mut acc = vsubq_f64(one, vld1q_f64(rel.as_ptr().add(start)));
    for i in 1..n {
        let lane = vld1q_f64(rel.as_ptr().add(i * t_total + start));
        acc = vmulq_f64(acc, vsubq_f64(one, lane));
    }
    store(out, start, clamp_neon(vsubq_f64(one, acc)));
}

#[target_feature(enable = "neon")]
pub(crate) unsafe fn parallel_identical_neon(rel: &[f64], n: usize, start: usize, out: &OutputSlice) {
    let one = vdupq_n_f64(1.0);
    let fv = vsubq_f64(one, vld1q_f64(rel.as_ptr().add(start)));
    let mut acc = one;
    for _ in 0..n {
        acc = vmulq_f64(acc, fv);
    }
    store(out, start, clamp_neon(vsubq_f64(one, acc)));
}

#[target_feature(enable = "neon")]
pub(crate) unsafe fn bridge_generic_neon(rel: &[f64], t_total: usize, start: usize, out: &OutputSlice) {
    let r1 = vld1q_f64(rel.as_ptr().add(start));
    let r2 = vld1q_f64(rel.as_ptr().add(t_total + start));
    let r3 = vld1q_f64(rel.as_ptr().add(2 * t_total + start));
    let r4 = vld1q_f64(rel.as_ptr().add(3 * t_total + start));
    let r5 = vld1q_f64(rel.as_ptr().add(4 * t_total + start));

    let a = vsubq_f64(vaddq_f64(r1, r3), vmulq_f64(r1, r3));
    let b = vsubq_f64(vaddq_f64(r2, r4), vmulq_f64(r2, r4));
    let val1 = vmulq_f64(a, b);

    let r1r2 = vmulq_f64(r1, r2);
    let r3r4 = vmulq_f64(r3, r4);
    let val2 = vsubq_f64(vaddq_f64(r1r2, r3r4), vmulq_f64(r1r2, r3r4));

    let result = vfmaq_f64(val2, r5, vsubq_f64(val1, val2));
    store(out, start, clamp_neon(result));
}

#[target_feature(enable = "neon")]
pub(crate) unsafe fn bridge_identical_neon(rel: &[f64], start: usize, out: &OutputSlice) {
    let rv = vld1q_f64(rel.as_ptr().add(start));
    let one = vdupq_n_f64(1.0);
    let two = vdupq_n_f64(2.0);
    let fv = vsubq_f64(one, rv);

    let f_sq_minus_2 = vsubq_f64(vmulq_f64(fv, fv), two);
    let inner_left = vmulq_f64(fv, f_sq_minus_2);
    let two_minus_r_sq = vsubq_f64(two, vmulq_f64(rv, rv));
    let inner_right = vmulq_f64(rv, two_minus_r_sq);
    let inner = vmulq_f64(fv, vaddq_f64(inner_left, inner_right));
    let result = vmulq_f64(rv, vaddq_f64(one, inner));

    store(out, start, clamp_neon(result));
}

/// Identical K-of-N fast path (§4.5.1) across 2 lanes; see `x86::koon_identical_avx2fma`.
#[target_feature(enable = "neon")]
pub(crate) unsafe fn koon_identical_neon(
    p_values: [f64; 2],
    n: usize,
    k_eff: usize,
    coeffs: &[u64],
    unreliability_mode: bool,
    start: usize,
    out: &OutputSlice,
) {
    let p = vld1q_f64(p_values.as_ptr());
    let one = vdupq_n_f64(1.0);
    let q = vsubq_f64(one, p);
    let (base_matching, base_other) = if unreliability_mode { (q, p) } else { (p, q) };

    let mut sum = vdupq_n_f64(0.0);
    for (offset, &coeff) in coeffs.iter().enumerate() {
        let i = k_eff + offset;
        let mut term = vdupq_n_f64(coeff as f64);
        for _ in 0..i {
            term = vmulq_f64(term, base_matching);
        }
        for _ in 0..(n - i) {
            term = vmulq_f64(term, base_other);
        }
        sum = vaddq_f64(sum, term);
    }

    let result = if unreliability_mode { vsubq_f64(one, sum) } else { sum };
    store(out, start, clamp_neon(result));
}
