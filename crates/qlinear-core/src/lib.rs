//! qlinear Core - Foundation Layer for Linear Quantization
//!
//! This crate provides the element types and the two collaborators that the
//! `qlinear` quantization stages are built on: a vector math kernel and a
//! fork-join parallel-for service.
//!
//! # Key Features
//! - Integer targets with clamped narrowing (u8, i8, u16, i16)
//! - Packed 4-bit lanes (`Int4x2`, `UInt4x2`) behind one `PackedLane` trait
//! - Float8 formats with saturating conversion
//! - Rayon-backed `ThreadPool` with cost hints
//! - Pluggable kernel architecture via `QuantKernel`
//!
//! # Example
//! ```rust
//! use qlinear_core::{CpuKernel, QuantKernel};
//!
//! let kernel = CpuKernel::new();
//! let (min, max) = kernel.find_min_max(&[-1.0, 0.5, 3.0]);
//! assert_eq!((min, max), (-1.0, 3.0));
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// quantization-specific allowances
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::manual_div_ceil)]

// =============================================================================
// Modules
// =============================================================================

pub mod backends;
pub mod dtype;
pub mod error;
pub mod float8;
pub mod int4;
pub mod parallel;

// =============================================================================
// Re-exports
// =============================================================================

pub use backends::{cpu::quantize_value, CpuKernel, QuantKernel};
pub use dtype::{DType, NarrowFloat, QuantRange};
pub use error::{Error, Result};
pub use float8::{Float8, Float8E4M3FN, Float8E4M3FNUZ, Float8E5M2, Float8E5M2FNUZ};
pub use half::{bf16, f16};
pub use int4::{packed_len, Int4x2, PackedLane, UInt4x2};
pub use parallel::{TensorOpCost, ThreadPool};

// =============================================================================
// Prelude
// =============================================================================

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::backends::{CpuKernel, QuantKernel};
    pub use crate::dtype::{DType, NarrowFloat, QuantRange};
    pub use crate::error::{Error, Result};
    pub use crate::float8::Float8;
    pub use crate::int4::{Int4x2, PackedLane, UInt4x2};
    pub use crate::parallel::{TensorOpCost, ThreadPool};
}
