//! Error Types - qlinear Core Error Handling
//!
//! Numerical edge cases in quantization never fail; the errors here cover
//! the few construction-time operations that can (building worker pools,
//! rejecting unusable element types).
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use thiserror::Error;

use crate::dtype::DType;

// =============================================================================
// Error Types
// =============================================================================

/// The main error type for qlinear core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Worker pool could not be created.
    #[error("Thread pool build failed: {message}")]
    ThreadPoolBuild {
        /// Description of the failure.
        message: String,
    },

    /// Element type is not supported by the requested operation.
    #[error("Unsupported dtype {dtype} for {operation}")]
    UnsupportedDType {
        /// The rejected data type.
        dtype: DType,
        /// The operation that rejected it.
        operation: &'static str,
    },
}

// =============================================================================
// Result Type
// =============================================================================

/// A specialized Result type for qlinear core operations.
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// Tests
// =============================================================================
