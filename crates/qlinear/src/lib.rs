//! qlinear - Linear Quantization Library
//!
//! Estimates linear quantization parameters (scale, zero point) from `f32`
//! tensor data and applies them in parallel. Supported outputs:
//!
//! - **U8 / I8 / U16 / I16**: integer quantization, optional symmetric and
//!   reduced-range policies for I8
//! - **UInt4 / Int4**: 4-bit quantization, two values per byte
//! - **Float8**: E4M3FN, E4M3FNUZ, E5M2 and E5M2FNUZ with optional saturation
//!
//! Every stage is a method on `QuantContext`, which carries the partitioning
//! config, an optional worker pool and the vector math kernel.
//!
//! # Example
//! ```
//! use qlinear::{ParamPolicy, QuantContext};
//!
//! let ctx = QuantContext::sequential();
//! let input = [-1.0, 0.0, 2.0, 3.0];
//! let params = ctx.quantization_parameters::<u8>(&input, ParamPolicy::ASYMMETRIC);
//! let mut output = [0u8; 4];
//! ctx.quantize_linear(&input, &mut output, &params);
//! assert_eq!(output, [0, 64, 191, 255]);
//! ```
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::should_implement_trait)]

pub mod config;
pub mod context;
pub mod dequantize;
pub mod error;
pub mod linear;
pub mod minmax;
pub mod params;
pub mod saturate;
pub mod subbyte;
pub mod tensor;
pub mod types;

pub use config::{QuantConfig, DEFAULT_BLOCK_SIZE, DEFAULT_MAX_MINMAX_BLOCKS, DEFAULT_MINMAX_GRANULARITY};
pub use context::QuantContext;
pub use error::{QuantError, QuantResult};
pub use minmax::MinMaxPlan;
pub use params::{round_half_to_even, scale_zero_point, ParamPolicy, REDUCED_RANGE_I8};
pub use tensor::{compute_quantization_stats, QuantOptions, QuantizationStats};
pub use types::{BlockMinMax, BlockRange, QuantTarget, QuantizationParameters, QuantizedData, QuantizedTensor};

pub use qlinear_core::{
    bf16, f16, DType, Float8, Float8E4M3FN, Float8E4M3FNUZ, Float8E5M2, Float8E5M2FNUZ, Int4x2,
    NarrowFloat, PackedLane, QuantRange, ThreadPool, UInt4x2,
};

// =============================================================================
// Tests
// =============================================================================
