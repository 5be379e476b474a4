//! Quantization Error Types
//!
//! Error types for quantization operations. The numerical stages never fail
//! at runtime; these errors come from configuration and from the tensor-level
//! entry points that validate shapes and buffers.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use thiserror::Error;

/// Result type for quantization operations.
pub type QuantResult<T> = Result<T, QuantError>;

/// Errors that can occur during quantization.
#[derive(Error, Debug)]
pub enum QuantError {
    /// Invalid block size.
    #[error("Invalid block size: {0} (must be positive and even)")]
    InvalidBlockSize(usize),

    /// Invalid quantization target.
    #[error("Invalid quantization target: {0}")]
    InvalidTarget(String),

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Shape does not describe the provided data.
    #[error("Shape mismatch: shape {shape:?} holds {expected} elements, got {actual}")]
    ShapeMismatch {
        /// Declared shape.
        shape: Vec<usize>,
        /// Elements implied by the shape.
        expected: usize,
        /// Elements provided.
        actual: usize,
    },

    /// Data length mismatch.
    #[error("Data length mismatch: expected {expected}, got {actual}")]
    DataLengthMismatch {
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// Invalid quantized data.
    #[error("Invalid quantized data: {0}")]
    InvalidData(String),

    /// Error from the core crate.
    #[error(transparent)]
    Core(#[from] qlinear_core::Error),

    /// Config file could not be read or written.
    #[error("Config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file could not be parsed.
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Config could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

// =============================================================================
// Tests
// =============================================================================
