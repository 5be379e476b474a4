//! Linear Quantization
//!
//! Block-parallel quantization into 8- and 16-bit integer outputs. Each
//! parallel unit owns one `block_size` chunk of the output, so units never
//! share memory.
//!
//! Half-precision sources take a scalar path that truncates toward zero
//! after dividing by the scale, while `f32` sources go through the vector
//! kernel, which rounds half to even. The two paths can therefore differ by
//! one quantization step for the same value.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use qlinear_core::{NarrowFloat, QuantKernel, QuantRange, TensorOpCost, ThreadPool};

use crate::context::QuantContext;
use crate::types::{BlockRange, QuantizationParameters};

impl<K: QuantKernel> QuantContext<'_, K> {
    /// Quantizes `input` into `output`:
    /// `output[i] = clamp(round(input[i] / scale) + zero_point)`.
    ///
    /// # Panics
    /// If `input` and `output` differ in length.
    pub fn quantize_linear<Q: QuantRange>(
        &self,
        input: &[f32],
        output: &mut [Q],
        params: &QuantizationParameters<Q>,
    ) {
        assert_eq!(input.len(), output.len(), "input/output length mismatch");
        let n = input.len();
        let block_size = self.config().block_size;
        let cost = TensorOpCost::new(
            (block_size * std::mem::size_of::<f32>()) as f64,
            (block_size * std::mem::size_of::<Q>()) as f64,
            block_size as f64 * 2.0,
        );
        tracing::debug!(
            len = n,
            dtype = %Q::DTYPE,
            blocks = n.div_ceil(block_size),
            "linear quantization"
        );

        let kernel = self.kernel();
        let scale = params.scale;
        let zero_point = params.zero_point.to_i32();
        ThreadPool::try_parallel_for_chunks(self.pool(), output, block_size, cost, |index, chunk| {
            let range = BlockRange::block(index, block_size, n);
            kernel.quantize_linear(&input[range.as_range()], chunk, scale, zero_point);
        });
    }

    /// Quantizes a half-precision `input` into `output`.
    ///
    /// Each element is widened to `f32`, divided by the scale and truncated
    /// toward zero before the zero point is added and the result clamped.
    ///
    /// # Panics
    /// If `input` and `output` differ in length.
    pub fn quantize_linear_narrow<H: NarrowFloat, Q: QuantRange>(
        &self,
        input: &[H],
        output: &mut [Q],
        params: &QuantizationParameters<Q>,
    ) {
        assert_eq!(input.len(), output.len(), "input/output length mismatch");
        let n = input.len();
        let block_size = self.config().block_size;
        let cost = TensorOpCost::new(
            (block_size * std::mem::size_of::<H>()) as f64,
            (block_size * std::mem::size_of::<Q>()) as f64,
            block_size as f64 * 2.0,
        );
        tracing::debug!(len = n, src = %H::DTYPE, dtype = %Q::DTYPE, "linear quantization");

        let scale = params.scale;
        let zero_point = params.zero_point.to_i32();
        ThreadPool::try_parallel_for_chunks(self.pool(), output, block_size, cost, |index, chunk| {
            let range = BlockRange::block(index, block_size, n);
            for (out, &value) in chunk.iter_mut().zip(&input[range.as_range()]) {
                let truncated = (value.to_working() / scale) as i32;
                *out = Q::from_i32_clamped(truncated.saturating_add(zero_point));
            }
        });
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QuantConfig;
    use crate::params::ParamPolicy;
    use qlinear_core::{bf16, f16};

    fn reference<Q: QuantRange>(input: &[f32], params: &QuantizationParameters<Q>) -> Vec<Q> {
        input
            .iter()
            .map(|&x| {
                let q = (x / params.scale).round_ties_even() as i32 + params.zero_point.to_i32();
                Q::from_i32_clamped(q)
            })
            .collect()
    }

    #[test]
    fn test_quantize_u8_scenario() {
        let ctx = QuantContext::sequential();
        let input = [-1.0, 0.0, 2.0, 3.0];
        let params = ctx.quantization_parameters::<u8>(&input, ParamPolicy::ASYMMETRIC);
        let mut output = [0u8; 4];
        ctx.quantize_linear(&input, &mut output, &params);
        assert_eq!(output, [0, 64, 191, 255]);
    }

    #[test]
    fn test_quantize_saturates() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(0.1, 0i8);
        let mut output = [0i8; 3];
        ctx.quantize_linear(&[100.0, -100.0, 0.25], &mut output, &params);
        assert_eq!(output, [127, -128, 2]);
    }

    #[test]
    fn test_parallel_matches_reference() {
        let pool = ThreadPool::new(4).unwrap();
        let ctx = QuantContext::new(QuantConfig::default(), Some(&pool)).unwrap();
        let input: Vec<f32> = (0..10_007).map(|i| ((i % 613) as f32 - 300.0) * 0.037).collect();
        let params = ctx.quantization_parameters::<i16>(&input, ParamPolicy::ASYMMETRIC);

        let mut output = vec![0i16; input.len()];
        ctx.quantize_linear(&input, &mut output, &params);
        assert_eq!(output, reference(&input, &params));
    }

    #[test]
    fn test_narrow_input_truncates() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(1.0, 10u8);
        let input = [f16::from_f32(2.75), f16::from_f32(-2.75), f16::from_f32(0.5)];
        let mut output = [0u8; 3];
        ctx.quantize_linear_narrow(&input, &mut output, &params);
        assert_eq!(output, [12, 8, 10]);

        // the f32 path rounds the same values instead
        let mut rounded = [0u8; 3];
        ctx.quantize_linear(&[2.75, -2.75, 0.5], &mut rounded, &params);
        assert_eq!(rounded, [13, 7, 10]);
    }

    #[test]
    fn test_narrow_input_clamps() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(0.5, 0i8);
        let input = [bf16::from_f32(1000.0), bf16::from_f32(-1000.0)];
        let mut output = [0i8; 2];
        ctx.quantize_linear_narrow(&input, &mut output, &params);
        assert_eq!(output, [127, -128]);
    }

    #[test]
    #[should_panic(expected = "length mismatch")]
    fn test_length_mismatch_panics() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(1.0, 0u8);
        let mut output = [0u8; 2];
        ctx.quantize_linear(&[1.0, 2.0, 3.0], &mut output, &params);
    }
}
