//! x86_64 vector kernels: SSE2 (2 lanes), AVX2+FMA (4 lanes), AVX-512F
//! (8 lanes). Each function processes exactly one full-width lane group;
//! the tail cascade in `super::cascade` handles anything narrower.
//!
//! The NaN -> 0 half of `clamp` falls out of `max(x, 0.0)`: x86's
//! `*_max_pd` returns its *second* operand when the first is NaN, so
//! `max(x, zero)` already maps NaN to zero before `min(_, one)` bounds the
//! top. No branch, no compare-and-select needed.

use std::arch::x86_64::*;

use crate::dispatch::OutputSlice;

#[inline(always)]
unsafe fn clamp_sse2(x: __m128d) -> __m128d {
    let zero = _mm_setzero_pd();
    let one = _mm_set1_pd(1.0);
    _mm_min_pd(_mm_max_pd(x, zero), one)
}

#[inline(always)]
unsafe fn clamp_avx(x: __m256d) -> __m256d {
    let zero = _mm256_setzero_pd();
    let one = _mm256_set1_pd(1.0);
    _mm256_min_pd(_mm256_max_pd(x, zero), one)
}

#[inline(always)]
unsafe fn clamp_avx512(x: __m512d) -> __m512d {
    let zero = _mm512_setzero_pd();
    let one = _mm512_set1_pd(1.0);
    _mm512_min_pd(_mm512_max_pd(x, zero), one)
}

macro_rules! simd_series_generic {
    ($name:ident, $tier:literal, $width:expr, $load:ident, $mul:ident, $store:ident, $clamp:ident) => {
        #[target_feature(enable = $tier)]
        pub(crate) unsafe fn $name(rel: &[f64], n: usize, t_total: usize, start: usize, out: &OutputSlice) {
            let mut acc = $load(rel.as_ptr().add(start));
            for i in 1..n {
                let lane = $load(rel.as_ptr().add(i * t_total + start));
                acc = $mul(acc, lane);
            }
            let mut buf = [0.0f64; $width];
            $store(buf.as_mut_ptr(), $clamp(acc));
            for (lane, value) in buf.iter().enumerate() {
                out.write(start + lane, *value);
            }
        }
    };
}

macro_rules! simd_parallel_generic {
    ($name:ident, $tier:literal, $width:expr, $load:ident, $sub:ident, $mul:ident, $store:ident, $set1:ident, $clamp:ident) => {
        #[target_feature(enable = $tier)]
        pub(crate) unsafe fn $name(rel: &[f64], n: usize, t_total: usize, start: usize, out: &OutputSlice) {
            let one = $set1(1.0);
            let mut acc = $sub(one, $load(rel.as_ptr().add(start)));
            for i in 1..n {
                let lane = $load(rel.as_ptr().add(i * t_total + start));
                acc = $mul(acc, $sub(one, lane));
            }
            let mut buf = [0.0f64; $width];
            $store(buf.as_mut_ptr(), $clamp($sub(one, acc)));
            for (lane, value) in buf.iter().enumerate() {
                out.write(start + lane, *value);
            }
        }
    };
}

simd_series_generic!(series_generic_sse2, "sse2", 2, _mm_loadu_pd, _mm_mul_pd, _mm_storeu_pd, clamp_sse2);
simd_series_generic!(series_generic_avx2fma, "avx2,fma", 4, _mm256_loadu_pd, _mm256_mul_pd, _mm256_storeu_pd, clamp_avx);
simd_series_generic!(series_generic_avx512, "avx512f", 8, _mm512_loadu_pd, _mm512_mul_pd, _mm512_storeu_pd, clamp_avx512);

simd_parallel_generic!(parallel_generic_sse2, "sse2", 2, _mm_loadu_pd, _mm_sub_pd, _mm_mul_pd, _mm_storeu_pd, _mm_set1_pd, clamp_sse2);
simd_parallel_generic!(parallel_generic_avx2fma, "avx2,fma", 4, _mm256_loadu_pd, _mm256_sub_pd, _mm256_mul_pd, _mm256_storeu_pd, _mm256_set1_pd, clamp_avx);
simd_parallel_generic!(parallel_generic_avx512, "avx512f", 8, _mm512_loadu_pd, _mm512_sub_pd, _mm512_mul_pd, _mm512_storeu_pd, _mm512_set1_pd, clamp_avx512);

// Identical-flavour inputs are still a per-time-instant curve (`rel[T]`,
// §6) — every lane in a group is a *different* time instant that happens
// to share `N`, so these load `N` copies' worth of the same per-lane value
// from `rel`, exactly like the generic kernels, rather than broadcasting a
// single scalar across the whole group.

#[target_feature(enable = "sse2")]
pub(crate) unsafe fn series_identical_sse2(rel: &[f64], n: usize, start: usize, out: &OutputSlice) {
    let pv = _mm_loadu_pd(rel.as_ptr().add(start));
    let mut acc = _mm_set1_pd(1.0);
    for _ in 0..n {
        acc = _mm_mul_pd(acc, pv);
    }
    let mut buf = [0.0f64; 2];
    _mm_storeu_pd(buf.as_mut_ptr(), clamp_sse2(acc));
    out.write(start, buf[0]);
    out.write(start + 1, buf[1]);
}

#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn series_identical_avx2fma(rel: &[f64], n: usize, start: usize, out: &OutputSlice) {
    let pv = _mm256_loadu_pd(rel.as_ptr().add(start));
    let mut acc = _mm256_set1_pd(1.0);
    for _ in 0..n {
        acc = _mm256_mul_pd(acc, pv);
    }
    let mut buf = [0.0f64; 4];
    _mm256_storeu_pd(buf.as_mut_ptr(), clamp_avx(acc));
    for (lane, value) in buf.iter().enumerate() {
        out.write(start + lane, *value);
    }
}

#[target_feature(enable = "avx512f")]
pub(crate) unsafe fn series_identical_avx512(rel: &[f64], n: usize, start: usize, out: &OutputSlice) {
    let pv = _mm512_loadu_pd(rel.as_ptr().add(start));
    let mut acc = _mm512_set1_pd(1.0);
    for _ in 0..n {
        acc = _mm512_mul_pd(acc, pv);
    }
    let mut buf = [0.0f64; 8];
    _mm512_storeu_pd(buf.as_mut_ptr(), clamp_avx512(acc));
    for (lane, value) in buf.iter().enumerate() {
        out.write(start + lane, *value);
    }
}

#[target_feature(enable = "sse2")]
pub(crate) unsafe fn parallel_identical_sse2(rel: &[f64], n: usize, start: usize, out: &OutputSlice) {
    let one = _mm_set1_pd(1.0);
    let fv = _mm_sub_pd(one, _mm_loadu_pd(rel.as_ptr().add(start)));
    let mut acc = one;
    for _ in 0..n {
        acc = _mm_mul_pd(acc, fv);
    }
    let mut buf = [0.0f64; 2];
    _mm_storeu_pd(buf.as_mut_ptr(), clamp_sse2(_mm_sub_pd(one, acc)));
    out.write(start, buf[0]);
    out.write(start + 1, buf[1]);
}

#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn parallel_identical_avx2fma(rel: &[f64], n: usize, start: usize, out: &OutputSlice) {
    let one = _mm256_set1_pd(1.0);
    let fv = _mm256_sub_pd(one, _mm256_loadu_pd(rel.as_ptr().add(start)));
    let mut acc = one;
    for _ in 0..n {
        acc = _mm256_mul_pd(acc, fv);
    }
    let mut buf = [0.0f64; 4];
    _mm256_storeu_pd(buf.as_mut_ptr(), clamp_avx(_mm256_sub_pd(one, acc)));
    for (lane, value) in buf.iter().enumerate() {
        out.write(start + lane, *value);
    }
}

#[target_feature(enable = "avx512f")]
pub(crate) unsafe fn parallel_identical_avx512(rel: &[f64], n: usize, start: usize, out: &OutputSlice) {
    let one = _mm512_set1_pd(1.0);
    let fv = _mm512_sub_pd(one, _mm512_loadu_pd(rel.as_ptr().add(start)));
    let mut acc = one;
    for _ in 0..n {
        acc = _mm512_mul_pd(acc, fv);
    }
    let mut buf = [0.0f64; 8];
    _mm512_storeu_pd(buf.as_mut_ptr(), clamp_avx512(_mm512_sub_pd(one, acc)));
    for (lane, value) in buf.iter().enumerate() {
        out.write(start + lane, *value);
    }
}

/// Loads component `i`'s lane at `start` from a 5-row bridge matrix.
#[inline(always)]
unsafe fn load5_avx(rel: &[f64], t_total: usize, start: usize) -> [__m256d; 5] {
    std::array::from_fn(|i| _mm256_loadu_pd(rel.as_ptr().add(i * t_total + start)))
}

#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn bridge_generic_avx2fma(rel: &[f64], t_total: usize, start: usize, out: &OutputSlice) {
    let [r1, r2, r3, r4, r5] = load5_avx(rel, t_total, start);

    // val1 = (r1 + r3 - r1*r3) * (r2 + r4 - r2*r4)
    let a = _mm256_sub_pd(_mm256_add_pd(r1, r3), _mm256_mul_pd(r1, r3));
    let b = _mm256_sub_pd(_mm256_add_pd(r2, r4), _mm256_mul_pd(r2, r4));
    let val1 = _mm256_mul_pd(a, b);

    // val2 = r1*r2 + r3*r4 - r1*r2*r3*r4, built from two FMAs
    let r1r2 = _mm256_mul_pd(r1, r2);
    let r3r4 = _mm256_mul_pd(r3, r4);
    let val2 = _mm256_fnmadd_pd(r1r2, r3r4, _mm256_add_pd(r1r2, r3r4));

    let result = _mm256_fmadd_pd(r5, _mm256_sub_pd(val1, val2), val2);

    let mut buf = [0.0f64; 4];
    _mm256_storeu_pd(buf.as_mut_ptr(), clamp_avx(result));
    for (lane, value) in buf.iter().enumerate() {
        out.write(start + lane, *value);
    }
}

#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn bridge_identical_avx2fma(rel: &[f64], start: usize, out: &OutputSlice) {
    let rv = _mm256_loadu_pd(rel.as_ptr().add(start));
    let one = _mm256_set1_pd(1.0);
    let two = _mm256_set1_pd(2.0);
    let fv = _mm256_sub_pd(one, rv);

    let f_sq_minus_2 = _mm256_sub_pd(_mm256_mul_pd(fv, fv), two);
    let inner_left = _mm256_mul_pd(fv, f_sq_minus_2);
    let two_minus_r_sq = _mm256_sub_pd(two, _mm256_mul_pd(rv, rv));
    let inner_right = _mm256_mul_pd(rv, two_minus_r_sq);
    let inner = _mm256_mul_pd(fv, _mm256_add_pd(inner_left, inner_right));
    let result = _mm256_mul_pd(rv, _mm256_add_pd(one, inner));

    let mut buf = [0.0f64; 4];
    _mm256_storeu_pd(buf.as_mut_ptr(), clamp_avx(result));
    for (lane, value) in buf.iter().enumerate() {
        out.write(start + lane, *value);
    }
}

/// Identical K-of-N fast path (§4.5.1), vectorised for the AVX2+FMA tier
/// only (see `DESIGN.md`): evaluates `sum_{i=k_eff..n} C(n,i) p^i (1-p)^(n-i)`
/// (or its unreliability-mode complement) across 4 independent time
/// instants, sharing one binomial table across all four lanes.
#[target_feature(enable = "avx2,fma")]
pub(crate) unsafe fn koon_identical_avx2fma(
    p_values: [f64; 4],
    n: usize,
    k_eff: usize,
    coeffs: &[u64],
    unreliability_mode: bool,
    start: usize,
    out: &OutputSlice,
) {
    let p = _mm256_set_pd(p_values[3], p_values[2], p_values[1], p_values[0]);
    let one = _mm256_set1_pd(1.0);
    let q = _mm256_sub_pd(one, p); // 1 - p

    // Success mode sums C(n,i) * p^i * (1-p)^(n-i); unreliability mode sums
    // the same shape with p and (1-p) swapped (§4.5.1), complemented below.
    let (base_matching, base_other) = if unreliability_mode { (q, p) } else { (p, q) };

    let mut sum = _mm256_setzero_pd();
    for (offset, &coeff) in coeffs.iter().enumerate() {
        let i = k_eff + offset;
        let mut term = _mm256_set1_pd(coeff as f64);
        for _ in 0..i {
            term = _mm256_mul_pd(term, base_matching);
        }
        for _ in 0..(n - i) {
            term = _mm256_mul_pd(term, base_other);
        }
        sum = _mm256_add_pd(sum, term);
    }

    let result = if unreliability_mode { _mm256_sub_pd(one, sum) } else { sum };

    let mut buf = [0.0f64; 4];
    _mm256_storeu_pd(buf.as_mut_ptr(), clamp_avx(result));
    for (lane, value) in buf.iter().enumerate() {
        out.write(start + lane, *value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::OutputSlice;

    #[test]
    fn sse2_series_generic_matches_scalar() {
        if !is_x86_feature_detected!("sse2") {
            return;
        }
        let rel = [0.9, 0.8, 0.9, 0.8];
        let mut out = vec![0.0; 2];
        unsafe {
            series_generic_sse2(&rel, 2, 2, 0, &OutputSlice::new(&mut out));
        }
        assert!((out[0] - 0.81).abs() < 1e-12);
        assert!((out[1] - 0.64).abs() < 1e-12);
    }

    #[test]
    fn avx2_bridge_identical_matches_scalar_formula() {
        if !(is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma")) {
            return;
        }
        let r = 0.9;
        let f = 1.0 - r;
        let expected = r * (1.0 + f * (f * (f * f - 2.0) + r * (2.0 - r * r)));
        let rel = [r; 4];
        let mut out = vec![0.0; 4];
        unsafe {
            bridge_identical_avx2fma(&rel, 0, &OutputSlice::new(&mut out));
        }
        for v in out {
            assert!((v - expected).abs() < 1e-9);
        }
    }
}
