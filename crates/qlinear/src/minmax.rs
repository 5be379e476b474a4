//! Min/Max Reduction
//!
//! Finds the global (min, max) of a float buffer. The buffer is cut into at
//! most `max_minmax_blocks` blocks; each parallel unit scans one block with
//! the vector kernel and writes only its own accumulator slot, so no locks
//! are needed. Slots are merged sequentially afterwards and the result is
//! widened to contain zero.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use qlinear_core::{QuantKernel, TensorOpCost, ThreadPool};

use crate::config::QuantConfig;
use crate::context::QuantContext;
use crate::types::{BlockMinMax, BlockRange};

// =============================================================================
// Accumulator Slot
// =============================================================================

/// One accumulator per block, padded to its own cache line.
#[derive(Debug, Clone, Copy)]
#[repr(C, align(64))]
struct Slot(BlockMinMax);

// =============================================================================
// Partition Plan
// =============================================================================

/// How a reduction over `len` elements is split into blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MinMaxPlan {
    /// Elements per block (the last block may be shorter).
    pub block_size: usize,
    /// Number of blocks, never more than `max_minmax_blocks`.
    pub num_blocks: usize,
    /// Total elements covered.
    pub len: usize,
}

impl MinMaxPlan {
    /// Plans a reduction. Without parallelism, or for inputs no larger than
    /// one granule, a single block covers everything.
    pub fn new(len: usize, parallel: bool, config: &QuantConfig) -> Self {
        let granularity = config.minmax_granularity;
        if parallel && len > granularity {
            let block_size = len.div_ceil(config.max_minmax_blocks);
            let block_size = block_size.div_ceil(granularity) * granularity;
            let num_blocks = len.div_ceil(block_size);
            Self {
                block_size,
                num_blocks,
                len,
            }
        } else {
            Self {
                block_size: len,
                num_blocks: 1,
                len,
            }
        }
    }

    /// Element range of block `index`.
    pub fn range(&self, index: usize) -> BlockRange {
        BlockRange::block(index, self.block_size, self.len)
    }

    /// Cost hint for one block.
    pub fn unit_cost(&self) -> TensorOpCost {
        TensorOpCost::new(
            (self.block_size * std::mem::size_of::<f32>()) as f64,
            2.0,
            self.block_size as f64,
        )
    }
}

// =============================================================================
// Reduction
// =============================================================================

impl<K: QuantKernel> QuantContext<'_, K> {
    /// Returns the (min, max) of `data`, widened so that `min <= 0 <= max`.
    pub fn reduce_min_max(&self, data: &[f32]) -> BlockMinMax {
        let plan = MinMaxPlan::new(
            data.len(),
            ThreadPool::should_parallelize(self.pool()),
            self.config(),
        );
        debug_assert!(plan.num_blocks <= self.config().max_minmax_blocks);
        tracing::debug!(
            len = plan.len,
            block_size = plan.block_size,
            num_blocks = plan.num_blocks,
            "min/max reduction"
        );

        let mut slots = vec![Slot(BlockMinMax::EMPTY); plan.num_blocks];
        let kernel = self.kernel();
        ThreadPool::try_parallel_for(self.pool(), &mut slots, plan.unit_cost(), |index, slot| {
            let (min, max) = kernel.find_min_max(&data[plan.range(index).as_range()]);
            slot.0 = BlockMinMax { min, max };
        });

        slots
            .iter()
            .fold(BlockMinMax::EMPTY, |acc, slot| acc.merge(slot.0))
            .include_zero()
    }
}

// =============================================================================
// Tests
// =============================================================================
