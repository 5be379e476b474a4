//! CPU Backend - Portable Quantization Kernel
//!
//! Provides the CPU implementation of the vector math kernel. Loops are
//! written over chunks so the compiler can vectorize them; no intrinsics
//! are used.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use super::QuantKernel;
use crate::dtype::QuantRange;
use crate::int4::PackedLane;

/// Unrolling width of the min/max scan.
const MINMAX_LANES: usize = 8;

// =============================================================================
// CPU Kernel Struct
// =============================================================================

/// CPU kernel for quantization.
#[derive(Debug, Clone, Copy, Default)]
pub struct CpuKernel;

impl CpuKernel {
    /// Creates a new CPU kernel.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Quantizes one value: round half to even, add the zero point, clamp.
#[inline(always)]
pub fn quantize_value(value: f32, scale: f32, zero_point: i32, qmin: i32, qmax: i32) -> i32 {
    // `as` saturates and maps NaN to 0
    let rounded = (value / scale).round_ties_even() as i32;
    rounded.saturating_add(zero_point).clamp(qmin, qmax)
}

// =============================================================================
// Kernel Trait Implementation
// =============================================================================

impl QuantKernel for CpuKernel {
    fn name(&self) -> &'static str {
        "cpu"
    }

    fn find_min_max(&self, data: &[f32]) -> (f32, f32) {
        let mut mins = [f32::INFINITY; MINMAX_LANES];
        let mut maxs = [f32::NEG_INFINITY; MINMAX_LANES];

        let chunks = data.chunks_exact(MINMAX_LANES);
        let tail = chunks.remainder();
        for chunk in chunks {
            for i in 0..MINMAX_LANES {
                mins[i] = mins[i].min(chunk[i]);
                maxs[i] = maxs[i].max(chunk[i]);
            }
        }

        let mut min = mins.iter().copied().fold(f32::INFINITY, f32::min);
        let mut max = maxs.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        for &v in tail {
            min = min.min(v);
            max = max.max(v);
        }
        (min, max)
    }

    fn quantize_linear<Q: QuantRange>(&self, input: &[f32], output: &mut [Q], scale: f32, zero_point: i32) {
        debug_assert_eq!(input.len(), output.len());
        for (out, &value) in output.iter_mut().zip(input) {
            *out = Q::from_i32_clamped(quantize_value(value, scale, zero_point, Q::QMIN, Q::QMAX));
        }
    }

    fn quantize_linear_packed<P: PackedLane>(
        &self,
        input: &[f32],
        output: &mut [P],
        scale: f32,
        zero_point: i32,
    ) {
        debug_assert_eq!(input.len(), output.len() * P::LANES);
        for (out, pair) in output.iter_mut().zip(input.chunks_exact(P::LANES)) {
            let low = quantize_value(pair[0], scale, zero_point, P::QMIN, P::QMAX);
            let high = quantize_value(pair[1], scale, zero_point, P::QMIN, P::QMAX);
            *out = P::from_lanes(low, high);
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::int4::{Int4x2, UInt4x2};

    #[test]
    fn test_find_min_max() {
        let kernel = CpuKernel::new();
        let data: Vec<f32> = (0..37).map(|i| (i as f32 - 11.0) * 0.5).collect();
        assert_eq!(kernel.find_min_max(&data), (-5.5, 12.5));
        assert_eq!(kernel.find_min_max(&[3.0]), (3.0, 3.0));
    }

    #[test]
    fn test_find_min_max_empty() {
        let (min, max) = CpuKernel::new().find_min_max(&[]);
        assert_eq!(min, f32::INFINITY);
        assert_eq!(max, f32::NEG_INFINITY);
    }

    #[test]
    fn test_quantize_value_ties_to_even() {
        assert_eq!(quantize_value(0.5, 1.0, 0, -128, 127), 0);
        assert_eq!(quantize_value(1.5, 1.0, 0, -128, 127), 2);
        assert_eq!(quantize_value(2.5, 1.0, 0, -128, 127), 2);
        assert_eq!(quantize_value(-2.5, 1.0, 0, -128, 127), -2);
    }

    #[test]
    fn test_quantize_value_clamps() {
        assert_eq!(quantize_value(1e30, 1.0, 10, 0, 255), 255);
        assert_eq!(quantize_value(-1e30, 1.0, 10, 0, 255), 0);
        assert_eq!(quantize_value(f32::NAN, 1.0, 10, 0, 255), 10);
    }

    #[test]
    fn test_quantize_linear_u8() {
        let input = [-1.0, 0.0, 1.0, 2.0];
        let mut output = [0u8; 4];
        CpuKernel::new().quantize_linear(&input, &mut output, 0.5, 128);
        assert_eq!(output, [126, 128, 130, 132]);
    }

    #[test]
    fn test_quantize_linear_packed() {
        let input = [0.0, 1.0, -1.0, 100.0];
        let mut output = [Int4x2::default(); 2];
        CpuKernel::new().quantize_linear_packed(&input, &mut output, 1.0, 0);
        assert_eq!(output[0].get_lane(0), 0);
        assert_eq!(output[0].get_lane(1), 1);
        assert_eq!(output[1].get_lane(0), -1);
        assert_eq!(output[1].get_lane(1), 7);

        let mut output = [UInt4x2::default(); 2];
        CpuKernel::new().quantize_linear_packed(&input, &mut output, 1.0, 8);
        assert_eq!(output[0].bits(), 0x98);
        assert_eq!(output[1].bits(), 0xF7);
    }
}
