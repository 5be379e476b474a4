//! Parallel-For Service
//!
//! A fork-join `ThreadPool` built on rayon. Work is expressed as a set of
//! units that each own an exclusive `&mut` slot or chunk, so bodies never
//! need locks. Every call blocks until all units finish; without a pool, or
//! with a single-thread pool, units run inline on the calling thread.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use rayon::prelude::*;

use crate::error::{Error, Result};

/// Approximate cycles spent per byte loaded.
const LOAD_CYCLES_PER_BYTE: f64 = 0.25;

/// Approximate cycles spent per byte stored.
const STORE_CYCLES_PER_BYTE: f64 = 0.25;

/// Minimum amount of work (in cycles) worth handing to another thread.
const TARGET_TASK_CYCLES: f64 = 40_000.0;

// =============================================================================
// Cost Hint
// =============================================================================

/// Per-unit cost hint used to choose how many units a task should take.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TensorOpCost {
    /// Bytes read by one unit.
    pub bytes_loaded: f64,
    /// Bytes written by one unit.
    pub bytes_stored: f64,
    /// Arithmetic work of one unit.
    pub compute_cycles: f64,
}

impl TensorOpCost {
    /// Creates a new cost hint.
    #[must_use]
    pub const fn new(bytes_loaded: f64, bytes_stored: f64, compute_cycles: f64) -> Self {
        Self {
            bytes_loaded,
            bytes_stored,
            compute_cycles,
        }
    }

    /// Estimated cycles for one unit.
    #[must_use]
    pub fn total_cycles(&self) -> f64 {
        self.bytes_loaded * LOAD_CYCLES_PER_BYTE
            + self.bytes_stored * STORE_CYCLES_PER_BYTE
            + self.compute_cycles
    }

    /// Smallest number of consecutive units a single task should run.
    #[must_use]
    pub fn min_units_per_task(&self) -> usize {
        let per_unit = self.total_cycles();
        if per_unit <= 0.0 || !per_unit.is_finite() {
            return 1;
        }
        ((TARGET_TASK_CYCLES / per_unit).ceil() as usize).max(1)
    }
}

// =============================================================================
// Thread Pool
// =============================================================================

/// A dedicated worker pool for quantization work.
#[derive(Debug)]
pub struct ThreadPool {
    pool: rayon::ThreadPool,
}

impl ThreadPool {
    /// Creates a pool with `num_threads` workers (0 picks one per core).
    pub fn new(num_threads: usize) -> Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .thread_name(|i| format!("qlinear-worker-{i}"))
            .build()
            .map_err(|e| Error::ThreadPoolBuild {
                message: e.to_string(),
            })?;
        tracing::debug!(threads = pool.current_num_threads(), "created quantization pool");
        Ok(Self { pool })
    }

    /// Number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Whether work handed to `pool` can actually run on more than one thread.
    pub fn should_parallelize(pool: Option<&Self>) -> bool {
        pool.is_some_and(|p| p.num_threads() > 1)
    }

    /// Runs `body(index, slot)` once for every slot.
    ///
    /// Each unit receives exclusive access to its own slot. Returns once all
    /// units have completed.
    pub fn try_parallel_for<T, F>(pool: Option<&Self>, slots: &mut [T], cost: TensorOpCost, body: F)
    where
        T: Send,
        F: Fn(usize, &mut T) + Sync + Send,
    {
        match pool {
            Some(p) if slots.len() > 1 && Self::should_parallelize(pool) => {
                let min_len = cost.min_units_per_task();
                tracing::trace!(units = slots.len(), min_len, "parallel-for over slots");
                p.pool.install(|| {
                    slots
                        .par_iter_mut()
                        .with_min_len(min_len)
                        .enumerate()
                        .for_each(|(i, slot)| body(i, slot));
                });
            }
            _ => {
                for (i, slot) in slots.iter_mut().enumerate() {
                    body(i, slot);
                }
            }
        }
    }

    /// Splits `data` into `chunk_len`-sized chunks (the last may be shorter)
    /// and runs `body(chunk_index, chunk)` once per chunk.
    ///
    /// Chunks are disjoint, so no two units ever write the same element.
    pub fn try_parallel_for_chunks<T, F>(
        pool: Option<&Self>,
        data: &mut [T],
        chunk_len: usize,
        cost: TensorOpCost,
        body: F,
    ) where
        T: Send,
        F: Fn(usize, &mut [T]) + Sync + Send,
    {
        assert!(chunk_len > 0, "chunk length must be positive");
        match pool {
            Some(p) if data.len() > chunk_len && Self::should_parallelize(pool) => {
                let min_len = cost.min_units_per_task();
                tracing::trace!(
                    units = data.len().div_ceil(chunk_len),
                    chunk_len,
                    min_len,
                    "parallel-for over chunks"
                );
                p.pool.install(|| {
                    data.par_chunks_mut(chunk_len)
                        .with_min_len(min_len)
                        .enumerate()
                        .for_each(|(i, chunk)| body(i, chunk));
                });
            }
            _ => {
                for (i, chunk) in data.chunks_mut(chunk_len).enumerate() {
                    body(i, chunk);
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
