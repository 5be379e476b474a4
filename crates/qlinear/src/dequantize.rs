//! Dequantization Functions
//!
//! Maps quantized values back to `f32`: `(q - zero_point) * scale` for
//! integer targets and `to_f32(q) * scale` for float8. Work is split into
//! `block_size` chunks of the output like the quantizers.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use qlinear_core::{Float8, PackedLane, QuantKernel, QuantRange, TensorOpCost, ThreadPool};

use crate::context::QuantContext;
use crate::types::{BlockRange, QuantizationParameters};

impl<K: QuantKernel> QuantContext<'_, K> {
    fn block_cost(&self, bytes_per_value: f64) -> TensorOpCost {
        let block_size = self.config().block_size as f64;
        TensorOpCost::new(block_size * bytes_per_value, block_size * 4.0, block_size * 2.0)
    }

    /// Dequantizes integer values.
    ///
    /// # Panics
    /// If `input` and `output` differ in length.
    pub fn dequantize_linear<Q: QuantRange>(
        &self,
        input: &[Q],
        output: &mut [f32],
        params: &QuantizationParameters<Q>,
    ) {
        assert_eq!(input.len(), output.len(), "input/output length mismatch");
        let n = input.len();
        let block_size = self.config().block_size;
        let scale = params.scale;
        let zero_point = params.zero_point.to_i32();
        let cost = self.block_cost(std::mem::size_of::<Q>() as f64);

        ThreadPool::try_parallel_for_chunks(self.pool(), output, block_size, cost, |index, chunk| {
            let range = BlockRange::block(index, block_size, n);
            for (out, &q) in chunk.iter_mut().zip(&input[range.as_range()]) {
                *out = (q.to_i32() - zero_point) as f32 * scale;
            }
        });
    }

    /// Dequantizes the first `output.len()` logical elements of packed data.
    ///
    /// # Panics
    /// If `input` holds fewer than `output.len()` elements.
    pub fn dequantize_packed<P: PackedLane>(
        &self,
        input: &[P],
        output: &mut [f32],
        params: &QuantizationParameters<P>,
    ) {
        let n = output.len();
        assert!(n.div_ceil(P::LANES) <= input.len(), "packed input too short");
        let block_size = self.config().block_size;
        let scale = params.scale;
        let zero_point = params.zero_point.to_i32();
        let cost = self.block_cost(0.5);

        ThreadPool::try_parallel_for_chunks(self.pool(), output, block_size, cost, |index, chunk| {
            let range = BlockRange::block(index, block_size, n);
            for (out, element) in chunk.iter_mut().zip(range.as_range()) {
                let q = input[element / P::LANES].get_lane(element % P::LANES);
                *out = (q - zero_point) as f32 * scale;
            }
        });
    }

    /// Dequantizes float8 values.
    ///
    /// # Panics
    /// If `input` and `output` differ in length.
    pub fn dequantize_float8<F: Float8>(
        &self,
        input: &[F],
        output: &mut [f32],
        params: &QuantizationParameters<F>,
    ) {
        assert_eq!(input.len(), output.len(), "input/output length mismatch");
        let n = input.len();
        let block_size = self.config().block_size;
        let scale = params.scale;
        let cost = self.block_cost(1.0);

        ThreadPool::try_parallel_for_chunks(self.pool(), output, block_size, cost, |index, chunk| {
            let range = BlockRange::block(index, block_size, n);
            for (out, &q) in chunk.iter_mut().zip(&input[range.as_range()]) {
                *out = q.to_f32() * scale;
            }
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
