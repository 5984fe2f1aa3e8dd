//! Per-tier vector kernels (C7-C9, and the identical K-of-N fast path of
//! C10) plus the tail-cascade that lets a worker dispatched at a wide tier
//! still finish off a lane group that doesn't fill that width.

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86;

#[cfg(target_arch = "aarch64")]
pub(crate) mod aarch64;

use crate::capability::SimdTier;

/// Process `width` indices starting at `start`, cascading down through
/// weaker tiers as needed so every index is covered by a tier whose lane
/// width evenly divides what's left (§4.3's "L=8 -> 4-FMA -> 2-FMA ->
/// scalar" cascade, generalised to any starting tier and any tail width).
///
/// `op(tier, start)` must process exactly `tier.lane_width()` indices
/// starting at `start`.
#[inline]
pub(crate) fn cascade(mut tier: SimdTier, mut start: usize, mut width: usize, mut op: impl FnMut(SimdTier, usize)) {
    while width > 0 {
        while tier.lane_width() > width {
            tier = tier.fallback().expect("scalar's lane width is 1 and always fits");
        }
        op(tier, start);
        start += tier.lane_width();
        width -= tier.lane_width();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cascade_covers_every_index_exactly_once_for_odd_widths() {
        for width in 1..=37usize {
            let mut covered = vec![false; width];
            cascade(SimdTier::Avx512, 0, width, |tier, start| {
                for i in start..start + tier.lane_width() {
                    assert!(!covered[i], "index {i} covered twice for width {width}");
                    covered[i] = true;
                }
            });
            assert!(covered.iter().all(|&c| c), "width {width} left a gap");
        }
    }

    #[test]
    fn cascade_never_calls_op_wider_than_the_scalar_tier_when_forced() {
        cascade(SimdTier::Scalar, 0, 5, |tier, _| {
            assert_eq!(tier, SimdTier::Scalar);
        });
    }
}
