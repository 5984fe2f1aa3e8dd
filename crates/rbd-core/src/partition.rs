//! Work partitioner (C3): decide worker count and each worker's strided
//! share of the time axis.

use crate::config::EngineConfig;

/// The outcome of partitioning a `T`-long time axis at lane width `L`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Partition {
    pub workers: usize,
    pub lane_width: usize,
}

/// `W = ceil(T / max(ceil(T / num_cores), min_batch_size * L))`, capped at
/// `num_cores` and at `config.max_threads()` if set. `W == 1` means inline,
/// no threads spawned.
pub fn plan(t: usize, num_cores: usize, lane_width: usize, config: &EngineConfig) -> Partition {
    debug_assert!(t > 0);
    debug_assert!(lane_width > 0);

    let num_cores = num_cores.max(1);
    let cap = config.max_threads().unwrap_or(num_cores).min(num_cores);

    let per_core = div_ceil(t, num_cores);
    let batch = per_core.max(config.min_batch_size() * lane_width);
    let workers = div_ceil(t, batch).clamp(1, cap);

    Partition {
        workers,
        lane_width,
    }
}

fn div_ceil(a: usize, b: usize) -> usize {
    debug_assert!(b > 0);
    (a + b - 1) / b
}

/// Worker `batch`'s strided share of the `[0, t)` time axis: absolute
/// lane-group start indices `batch*L, batch*L + W*L, batch*L + 2*W*L, ...`.
///
/// Each yielded index is the start of a (possibly partial, at the tail) lane
/// group of width `lane_width`; the caller clamps the group to `t` itself.
pub fn strided_groups(partition: Partition, batch: usize, t: usize) -> impl Iterator<Item = usize> {
    debug_assert!(batch < partition.workers);
    let stride = partition.workers * partition.lane_width;
    let start = batch * partition.lane_width;
    (0..).map(move |g| start + g * stride).take_while(move |&idx| idx < t)
}
