//! Engine configuration (C13): a small, immutable-after-construction set of
//! tunables threaded through every public entry point.
//!
//! Mirrors the shape of a conventional config struct (construct via
//! `default()`/builder methods, or layer environment overrides on top with
//! `from_env()`) rather than a global mutable knob.

use crate::capability::SimdTier;

/// The partitioner's default minimum batch size (§4.3): each worker must
/// own at least this many lane-groups, or dispatch stays single-threaded.
pub const DEFAULT_MIN_BATCH_SIZE: usize = 10_000;

#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Hard cap on worker count, independent of `num_cores()`. `None` means
    /// "no cap beyond what the capability probe reports".
    max_threads: Option<usize>,

    /// Forces kernel-tier selection regardless of what the capability probe
    /// found. Used by cross-tier parity tests (§8) and troubleshooting.
    forced_tier: Option<SimdTier>,

    /// Overrides `DEFAULT_MIN_BATCH_SIZE` for the work partitioner.
    min_batch_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_threads: None,
            forced_tier: None,
            min_batch_size: DEFAULT_MIN_BATCH_SIZE,
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Layer `RBD_MAX_THREADS`, `RBD_FORCE_SIMD_TIER`, and
    /// `RBD_MIN_BATCH_SIZE` on top of the default config. Missing or
    /// unparseable variables fall back to the default for that field.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("RBD_MAX_THREADS") {
            match raw.parse::<usize>() {
                Ok(0) | Err(_) => {
                    tracing::warn!(value = %raw, "ignoring invalid RBD_MAX_THREADS");
                }
                Ok(n) => config.max_threads = Some(n),
            }
        }

        if let Ok(raw) = std::env::var("RBD_FORCE_SIMD_TIER") {
            match SimdTier::parse(&raw) {
                Some(tier) => config.forced_tier = Some(tier),
                None => tracing::warn!(value = %raw, "ignoring unknown RBD_FORCE_SIMD_TIER"),
            }
        }

        if let Ok(raw) = std::env::var("RBD_MIN_BATCH_SIZE") {
            match raw.parse::<usize>() {
                Ok(0) | Err(_) => {
                    tracing::warn!(value = %raw, "ignoring invalid RBD_MIN_BATCH_SIZE");
                }
                Ok(n) => config.min_batch_size = n,
            }
        }

        config
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = Some(max_threads.max(1));
        self
    }

    pub fn with_forced_tier(mut self, tier: SimdTier) -> Self {
        self.forced_tier = Some(tier);
        self
    }

    pub fn with_min_batch_size(mut self, min_batch_size: usize) -> Self {
        self.min_batch_size = min_batch_size.max(1);
        self
    }

    pub fn max_threads(&self) -> Option<usize> {
        self.max_threads
    }

    pub fn forced_tier(&self) -> Option<SimdTier> {
        self.forced_tier
    }

    pub fn min_batch_size(&self) -> usize {
        self.min_batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_no_overrides() {
        let config = EngineConfig::default();
        assert_eq!(config.max_threads(), None);
        assert_eq!(config.forced_tier(), None);
        assert_eq!(config.min_batch_size(), DEFAULT_MIN_BATCH_SIZE);
    }

    #[test]
    fn builder_methods_set_fields() {
        let config = EngineConfig::new()
            .with_max_threads(4)
            .with_forced_tier(SimdTier::Scalar)
            .with_min_batch_size(16);
        assert_eq!(config.max_threads(), Some(4));
        assert_eq!(config.forced_tier(), Some(SimdTier::Scalar));
        assert_eq!(config.min_batch_size(), 16);
    }

    #[test]
    fn zero_max_threads_is_clamped_to_one() {
        let config = EngineConfig::new().with_max_threads(0);
        assert_eq!(config.max_threads(), Some(1));
    }
}
