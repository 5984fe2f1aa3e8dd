//! Worker dispatcher (C4): build a bounded `rayon` thread pool sized to
//! `partition.workers`, fan out one task per worker batch, and hand every
//! worker its disjoint strided share of the output.
//!
//! The "shared output" in §3/§9 is not truly shared mutable state: each
//! worker only ever touches indices no other worker touches. `OutputSlice`
//! encodes that as a small `Send + Sync` raw-pointer wrapper, which is the
//! idiomatic way to express disjoint-index interior mutability across
//! threads without paying for a lock nobody needs (§9's "per-worker
//! interior-mutability over disjoint indices").

use rayon::prelude::*;

use crate::error::EngineError;
use crate::partition::{strided_groups, Partition};

/// Grants disjoint-index write access to the output buffer to every worker.
///
/// # Safety invariant
/// Every write through a given `OutputSlice` must target an index that no
/// other live `OutputSlice` referring to the same buffer writes to at the
/// same time. `dispatch` upholds this by construction: it hands each
/// worker only the indices `partition::strided_groups` assigns to it, and
/// those sets are pairwise disjoint (see the `strided_groups` unit test).
#[derive(Clone, Copy)]
pub(crate) struct OutputSlice {
    ptr: *mut f64,
    len: usize,
}

// Safety: disjoint-index access only, upheld by the partition invariant above.
unsafe impl Send for OutputSlice {}
unsafe impl Sync for OutputSlice {}

impl OutputSlice {
    pub(crate) fn new(out: &mut [f64]) -> Self {
        Self { ptr: out.as_mut_ptr(), len: out.len() }
    }

    /// Write `value` to `index`. Panics in debug builds if `index` is out
    /// of bounds; relies on the caller to uphold the disjointness invariant.
    #[inline(always)]
    pub(crate) fn write(&self, index: usize, value: f64) {
        debug_assert!(index < self.len);
        unsafe { *self.ptr.add(index) = value }
    }
}

/// Run `worker(batch)` for `batch in 0..partition.workers` on a `rayon`
/// thread pool capped at `partition.workers` threads, mirroring the
/// teacher's `rayon::ThreadPoolBuilder::new().num_threads(n).build()` +
/// `pool.install(|| ...par_iter()...)` shape.
///
/// A pool-build failure (the `rayon` equivalent of a spawn failure) is
/// surfaced as `EngineError::WorkerSpawn` before any worker runs. A worker
/// panic is caught per-batch so the other, disjoint-index batches still
/// complete and write their region of the output; the panic is then
/// re-surfaced as the same error variant once every batch has finished.
pub(crate) fn dispatch<F>(partition: Partition, worker: F) -> Result<(), EngineError>
where
    F: Fn(usize) + Sync,
{
    let workers = partition.workers;
    if workers <= 1 {
        worker(0);
        return Ok(());
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(|e| EngineError::WorkerSpawn(e.to_string()))?;

    let panicked = std::sync::atomic::AtomicBool::new(false);
    pool.install(|| {
        (0..workers).into_par_iter().for_each(|batch| {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| worker(batch))).is_err() {
                tracing::warn!(batch, "worker thread panicked");
                panicked.store(true, std::sync::atomic::Ordering::SeqCst);
            }
        });
    });

    if panicked.load(std::sync::atomic::Ordering::SeqCst) {
        return Err(EngineError::WorkerSpawn("worker thread panicked".to_string()));
    }
    Ok(())
}

/// Iterate a worker's strided lane-group starts together with each group's
/// actual width (`lane_width` except possibly at the tail).
pub(crate) fn worker_groups(
    partition: Partition,
    batch: usize,
    t: usize,
) -> impl Iterator<Item = (usize, usize)> {
    strided_groups(partition, batch, t).map(move |start| (start, partition.lane_width.min(t - start)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::partition::plan;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn every_worker_runs_exactly_once() {
        let config = EngineConfig::default().with_min_batch_size(1);
        let partition = plan(1000, 8, 1, &config);
        let ran = (0..partition.workers).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>();
        dispatch(partition, |batch| {
            ran[batch].fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert!(ran.iter().all(|c| c.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn disjoint_writes_cover_the_whole_output() {
        let config = EngineConfig::default().with_min_batch_size(1);
        let t = 997; // deliberately not a multiple of any small worker count
        let partition = plan(t, 8, 2, &config);
        let mut out = vec![-1.0; t];
        {
            let slice = OutputSlice::new(&mut out);
            dispatch(partition, |batch| {
                for (start, width) in worker_groups(partition, batch, t) {
                    for i in start..start + width {
                        slice.write(i, batch as f64);
                    }
                }
            })
            .unwrap();
        }
        assert!(out.iter().all(|&v| v >= 0.0), "every index should have been written");
    }

    #[test]
    fn a_panicking_batch_is_reported_without_losing_other_batches() {
        let config = EngineConfig::default().with_min_batch_size(1);
        let partition = plan(1000, 8, 1, &config);
        let ran = (0..partition.workers).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>();
        let err = dispatch(partition, |batch| {
            if batch == 0 {
                panic!("simulated worker failure");
            }
            ran[batch].fetch_add(1, Ordering::SeqCst);
        })
        .unwrap_err();
        assert!(matches!(err, EngineError::WorkerSpawn(_)));
        assert!(ran.iter().skip(1).all(|c| c.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn single_worker_runs_inline_without_threads() {
        let config = EngineConfig::default();
        let partition = plan(10, 8, 1, &config);
        assert_eq!(partition.workers, 1);
        let ran = AtomicUsize::new(0);
        dispatch(partition, |batch| {
            assert_eq!(batch, 0);
            ran.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        assert_eq!(ran.load(Ordering::SeqCst), 1);
    }
}
