//! Sub-Byte Quantization
//!
//! Quantizes a range of logical 4-bit elements into packed bytes, two lanes
//! per byte. A range may start or end in the middle of a byte; those edge
//! elements are written serially first, into the high or low nibble, so the
//! remaining range starts and ends on byte boundaries. Only that aligned
//! remainder is split across workers, in blocks of an even number of
//! elements, so every unit owns whole bytes and no byte is written by two
//! units.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use qlinear_core::{packed_len, quantize_value, PackedLane, QuantKernel, TensorOpCost, ThreadPool};

use crate::context::QuantContext;
use crate::types::{BlockRange, QuantizationParameters};

impl<K: QuantKernel> QuantContext<'_, K> {
    /// Quantizes logical elements `[out_start, out_end)` of the packed
    /// `output` from `input`, which holds exactly `out_end - out_start`
    /// values. Lanes outside the range are left untouched.
    ///
    /// # Panics
    /// If `input` has the wrong length or the range does not fit `output`.
    pub fn quantize_packed<P: PackedLane>(
        &self,
        input: &[f32],
        output: &mut [P],
        out_start: usize,
        out_end: usize,
        params: &QuantizationParameters<P>,
    ) {
        assert!(out_start <= out_end, "inverted output range");
        assert_eq!(input.len(), out_end - out_start, "input/output length mismatch");
        assert!(packed_len(out_end) <= output.len(), "output range out of bounds");

        if out_start == out_end {
            return;
        }

        let scale = params.scale;
        let zero_point = params.zero_point.to_i32();
        let (mut out_start, mut out_end) = (out_start, out_end);
        let (mut inp_start, mut inp_end) = (0, input.len());

        // starts in the middle of a byte: high nibble of the first byte
        if out_start & 1 == 1 {
            let value = quantize_value(input[inp_start], scale, zero_point, P::QMIN, P::QMAX);
            output[out_start >> 1].set_lane(1, value);
            tracing::trace!(index = out_start, value, "leading half-byte");
            out_start += 1;
            inp_start += 1;
        }

        // ends in the middle of a byte: low nibble of the last byte
        if out_start < out_end && out_end & 1 == 1 {
            let value = quantize_value(input[inp_end - 1], scale, zero_point, P::QMIN, P::QMAX);
            output[(out_end - 1) >> 1].set_lane(0, value);
            tracing::trace!(index = out_end - 1, value, "trailing half-byte");
            out_end -= 1;
            inp_end -= 1;
        }

        if out_start == out_end {
            return;
        }

        let n = out_end - out_start;
        assert_eq!(n % 2, 0, "aligned range must hold whole bytes");
        let block_size = self.config().block_size;
        assert_eq!(block_size % 2, 0, "block size must be even");

        let cost = TensorOpCost::new(
            (block_size * std::mem::size_of::<f32>()) as f64,
            block_size as f64 / 2.0,
            block_size as f64 * 2.0,
        );
        tracing::debug!(
            len = n,
            dtype = %P::DTYPE,
            blocks = n.div_ceil(block_size),
            "packed quantization"
        );

        let input = &input[inp_start..inp_end];
        let bytes = &mut output[out_start >> 1..out_end >> 1];
        let kernel = self.kernel();
        ThreadPool::try_parallel_for_chunks(self.pool(), bytes, block_size / 2, cost, |index, chunk| {
            let range = BlockRange::block(index, block_size, n);
            kernel.quantize_linear_packed(&input[range.as_range()], chunk, scale, zero_point);
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
    use qlinear_core::{Int4x2, QuantRange, UInt4x2};

    /// Element-by-element reference writer.
    fn reference<P: PackedLane>(
        input: &[f32],
        output: &mut [P],
        out_start: usize,
        params: &QuantizationParameters<P>,
    ) {
        for (offset, &x) in input.iter().enumerate() {
            let index = out_start + offset;
            let q = quantize_value(x, params.scale, params.zero_point.to_i32(), P::QMIN, P::QMAX);
            output[index >> 1].set_lane(index & 1, q);
        }
    }

    fn sample(n: usize) -> Vec<f32> {
        (0..n).map(|i| ((i * 7) % 23) as f32 * 0.5 - 4.0).collect()
    }

    #[test]
    fn test_full_aligned_range() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(1.0, Int4x2::from_i32_clamped(0));
        let input = [0.0, 1.0, -2.0, 3.0];
        let mut output = vec![Int4x2::default(); 2];
        ctx.quantize_packed(&input, &mut output, 0, 4, &params);
        assert_eq!(output[0].get_lane(0), 0);
        assert_eq!(output[0].get_lane(1), 1);
        assert_eq!(output[1].get_lane(0), -2);
        assert_eq!(output[1].get_lane(1), 3);
    }

    #[test]
    fn test_odd_start_writes_high_nibble_only() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(1.0, UInt4x2::from_i32_clamped(0));
        let mut output = vec![UInt4x2(0xAA); 2];
        ctx.quantize_packed(&[5.0], &mut output, 1, 2, &params);
        assert_eq!(output[0].bits(), 0x5A);
        assert_eq!(output[1].bits(), 0xAA);
    }

    #[test]
    fn test_odd_end_writes_low_nibble_only() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(1.0, UInt4x2::from_i32_clamped(0));
        let mut output = vec![UInt4x2(0xAA); 2];
        ctx.quantize_packed(&[3.0], &mut output, 2, 3, &params);
        assert_eq!(output[0].bits(), 0xAA);
        assert_eq!(output[1].bits(), 0xA3);
    }

    #[test]
    fn test_both_edges_misaligned() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(0.5, Int4x2::from_i32_clamped(-1));
        let input = sample(9);
        let mut output = vec![Int4x2(0x77); 6];
        let mut expected = output.clone();
        ctx.quantize_packed(&input, &mut output, 1, 10, &params);
        reference(&input, &mut expected, 1, &params);
        assert_eq!(output, expected);
        // untouched neighbours keep their original nibbles
        assert_eq!(output[0].get_lane(0), 7);
        assert_eq!(output[5], Int4x2(0x77));
    }

    #[test]
    fn test_empty_range() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(1.0, UInt4x2::default());
        let mut output = vec![UInt4x2(0x12); 2];
        ctx.quantize_packed(&[], &mut output, 3, 3, &params);
        assert_eq!(output, vec![UInt4x2(0x12); 2]);
    }

    #[test]
    fn test_empty_range_at_every_offset() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(1.0, Int4x2::from_i32_clamped(2));
        for index in 0..=6 {
            let mut output = vec![Int4x2(0x3C); 3];
            ctx.quantize_packed(&[], &mut output, index, index, &params);
            assert_eq!(output, vec![Int4x2(0x3C); 3], "empty range at {index}");
        }
    }

    #[test]
    fn test_single_odd_element_leaves_range_empty() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(1.0, UInt4x2::from_i32_clamped(0));
        let mut output = vec![UInt4x2(0x00); 3];
        ctx.quantize_packed(&[9.0], &mut output, 3, 4, &params);
        assert_eq!(output[1].bits(), 0x90);
        assert_eq!(output[0], UInt4x2(0));
        assert_eq!(output[2], UInt4x2(0));
    }

    #[test]
    fn test_parallel_misaligned_matches_reference() {
        let pool = ThreadPool::new(4).unwrap();
        let config = QuantConfig {
            block_size: 16,
            ..Default::default()
        };
        let ctx = QuantContext::new(config, Some(&pool)).unwrap();
        let params = QuantizationParameters::new(0.7, UInt4x2::from_i32_clamped(6));

        for (start, end) in [(0, 1000), (1, 1000), (0, 999), (3, 777), (5, 6), (4, 5)] {
            let input = sample(end - start);
            let mut output = vec![UInt4x2(0xC3); 501];
            let mut expected = output.clone();
            ctx.quantize_packed(&input, &mut output, start, end, &params);
            reference(&input, &mut expected, start, &params);
            assert_eq!(output, expected, "range {start}..{end}");
        }
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_range_past_output_panics() {
        let ctx = QuantContext::sequential();
        let params = QuantizationParameters::new(1.0, UInt4x2::default());
        let mut output = vec![UInt4x2::default(); 1];
        ctx.quantize_packed(&[1.0, 2.0], &mut output, 1, 3, &params);
    }
}
