//! Backends - Vector Math Kernels
//!
//! The per-element work of quantization (min/max scanning and quantized
//! writes) lives behind the `QuantKernel` trait. The quantization stages
//! partition work into blocks and hand each block to a kernel; they never
//! touch individual elements on the parallel path.
//!
//! # Available Backends
//! - `cpu` - portable CPU kernel (always available)
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use crate::dtype::QuantRange;
use crate::int4::PackedLane;

// =============================================================================
// Backend Modules
// =============================================================================

pub mod cpu;

// =============================================================================
// Re-exports
// =============================================================================

pub use cpu::CpuKernel;

// =============================================================================
// Kernel Trait
// =============================================================================

/// Vector math kernel used by the quantization stages.
///
/// Kernels must round to nearest with ties to even so that block results
/// agree with the scalar boundary paths.
pub trait QuantKernel: Send + Sync {
    /// Returns the name of this kernel.
    fn name(&self) -> &'static str;

    /// Returns `(min, max)` over `data`, or `(+inf, -inf)` when empty.
    fn find_min_max(&self, data: &[f32]) -> (f32, f32);

    /// Writes `clamp(round(input[i] / scale) + zero_point)` into `output[i]`.
    fn quantize_linear<Q: QuantRange>(&self, input: &[f32], output: &mut [Q], scale: f32, zero_point: i32);

    /// Quantizes `2 * output.len()` inputs, two lanes per output byte.
    fn quantize_linear_packed<P: PackedLane>(
        &self,
        input: &[f32],
        output: &mut [P],
        scale: f32,
        zero_point: i32,
    );
}
