//! Capability probe (C2): process-wide, lazily-initialised, immutable
//! snapshot of core count and available SIMD tiers.
//!
//! The snapshot is queried through pure accessors; nothing here ever
//! mutates after first use. `once_cell::sync::Lazy` gives us the
//! publication guarantee the source's mutable `cpu` singleton had to earn
//! by hand.

use once_cell::sync::Lazy;

/// A specific vector width + instruction-set combination.
///
/// Ordered from weakest to strongest; `Ord` reflects "preference", not a
/// numeric width, so `max()` over a set of supported tiers picks the best
/// one to dispatch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SimdTier {
    Scalar,
    Sse2,
    Neon,
    Avx2Fma,
    Avx512,
}

impl SimdTier {
    /// f64 lanes processed per vector op at this tier.
    pub const fn lane_width(self) -> usize {
        match self {
            SimdTier::Scalar => 1,
            SimdTier::Sse2 => 2,
            SimdTier::Neon => 2,
            SimdTier::Avx2Fma => 4,
            SimdTier::Avx512 => 8,
        }
    }

    /// The tier one rung down the tail cascade, or `None` at scalar.
    ///
    /// Mirrors §4.3's cascade: 8 -> 4-FMA -> 2 -> scalar (x86_64), or
    /// 2 -> scalar (aarch64/NEON).
    pub const fn fallback(self) -> Option<SimdTier> {
        match self {
            SimdTier::Avx512 => Some(SimdTier::Avx2Fma),
            SimdTier::Avx2Fma => Some(SimdTier::Sse2),
            SimdTier::Sse2 => Some(SimdTier::Scalar),
            SimdTier::Neon => Some(SimdTier::Scalar),
            SimdTier::Scalar => None,
        }
    }

    /// Parse the `RBD_FORCE_SIMD_TIER` env var spelling (see `EngineConfig`).
    pub fn parse(name: &str) -> Option<SimdTier> {
        match name.to_ascii_lowercase().as_str() {
            "scalar" => Some(SimdTier::Scalar),
            "sse2" => Some(SimdTier::Sse2),
            "neon" => Some(SimdTier::Neon),
            "avx2fma" | "avx2_fma" | "avx2-fma" => Some(SimdTier::Avx2Fma),
            "avx512" => Some(SimdTier::Avx512),
            _ => None,
        }
    }
}

/// Process-wide, immutable-after-init capability snapshot.
#[derive(Debug, Clone)]
pub struct CapabilitySnapshot {
    num_cores: usize,
    tiers: Vec<SimdTier>,
}

impl CapabilitySnapshot {
    fn detect() -> Self {
        let num_cores = num_cpus::get().max(1);
        let mut tiers = vec![SimdTier::Scalar];

        if cfg!(feature = "simd") {
            detect_tiers(&mut tiers);
        }

        tracing::debug!(num_cores, tiers = ?tiers, "capability probe: detected hardware");
        Self { num_cores, tiers }
    }

    /// Number of logical cores, always >= 1.
    pub fn num_cores(&self) -> usize {
        self.num_cores
    }

    /// Whether the given tier is usable on this CPU (and this build).
    pub fn supports(&self, tier: SimdTier) -> bool {
        self.tiers.contains(&tier)
    }

    /// The strongest tier this CPU and build support.
    pub fn best_tier(&self) -> SimdTier {
        self.tiers.iter().copied().max().unwrap_or(SimdTier::Scalar)
    }
}

#[cfg(target_arch = "x86_64")]
fn detect_tiers(tiers: &mut Vec<SimdTier>) {
    if is_x86_feature_detected!("sse2") {
        tiers.push(SimdTier::Sse2);
    }
    if is_x86_feature_detected!("avx2") && is_x86_feature_detected!("fma") {
        tiers.push(SimdTier::Avx2Fma);
    }
    if is_x86_feature_detected!("avx512f") {
        tiers.push(SimdTier::Avx512);
    }
}

#[cfg(target_arch = "aarch64")]
fn detect_tiers(tiers: &mut Vec<SimdTier>) {
    // aarch64 NEON is part of the baseline ABI, but we still probe through
    // the feature-detection macro rather than assuming it, since this
    // function also backs the `simd` feature's off-switch.
    if std::arch::is_aarch64_feature_detected!("neon") {
        tiers.push(SimdTier::Neon);
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn detect_tiers(_tiers: &mut Vec<SimdTier>) {
    // RVV and other tiers are not exercised on stable Rust today; report
    // unsupported rather than guessing, per §4.2.
}

static SNAPSHOT: Lazy<CapabilitySnapshot> = Lazy::new(CapabilitySnapshot::detect);

/// Borrow the process-wide capability snapshot, probing hardware on first use.
pub fn capability() -> &'static CapabilitySnapshot {
    &SNAPSHOT
}
