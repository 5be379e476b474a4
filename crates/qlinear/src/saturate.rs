//! Float8 Quantization
//!
//! Converts float or half-precision data into a float8 format:
//! `output[i] = convert(input[i] / scale, saturate)`. There is no integer
//! zero point; the one in `QuantizationParameters` is accepted so every
//! target shares the same parameter type, and otherwise ignored.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use qlinear_core::{Float8, NarrowFloat, QuantKernel, TensorOpCost, ThreadPool};

use crate::context::QuantContext;
use crate::types::{BlockRange, QuantizationParameters};

impl<K: QuantKernel> QuantContext<'_, K> {
    /// Quantizes `input` into a float8 `output`.
    ///
    /// # Panics
    /// If `input` and `output` differ in length.
    pub fn quantize_saturate<F: Float8>(
        &self,
        input: &[f32],
        output: &mut [F],
        params: &QuantizationParameters<F>,
        saturate: bool,
    ) {
        self.convert_float8(input, output, params.scale, saturate, |x: f32| x);
    }

    /// Quantizes a half-precision `input` into a float8 `output`. Values are
    /// widened to `f32` before dividing by the scale.
    ///
    /// # Panics
    /// If `input` and `output` differ in length.
    pub fn quantize_saturate_narrow<H: NarrowFloat, F: Float8>(
        &self,
        input: &[H],
        output: &mut [F],
        params: &QuantizationParameters<F>,
        saturate: bool,
    ) {
        self.convert_float8(input, output, params.scale, saturate, H::to_working);
    }

    fn convert_float8<T, F, W>(&self, input: &[T], output: &mut [F], scale: f32, saturate: bool, widen: W)
    where
        T: Copy + Sync,
        F: Float8,
        W: Fn(T) -> f32 + Sync + Send,
    {
        assert_eq!(input.len(), output.len(), "input/output length mismatch");
        let n = input.len();
        let block_size = self.config().block_size;
        let cost = TensorOpCost::new(
            (block_size * std::mem::size_of::<T>()) as f64,
            block_size as f64,
            block_size as f64 * 2.0,
        );
        tracing::debug!(len = n, dtype = %F::DTYPE, saturate, "float8 quantization");

        ThreadPool::try_parallel_for_chunks(self.pool(), output, block_size, cost, |index, chunk| {
            let range = BlockRange::block(index, block_size, n);
            for (out, &value) in chunk.iter_mut().zip(&input[range.as_range()]) {
                *out = F::from_f32(widen(value) / scale, saturate);
            }
        });
    }
}

// =============================================================================
// Tests
// =============================================================================
