//! Quantization Types
//!
//! Data structures shared by the quantization stages.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use std::fmt;
use std::ops::Range;

use qlinear_core::{
    packed_len, DType, Float8E4M3FN, Float8E4M3FNUZ, Float8E5M2, Float8E5M2FNUZ, Int4x2, UInt4x2,
};

use crate::error::{QuantError, QuantResult};

// =============================================================================
// Block Min/Max
// =============================================================================

/// Running (min, max) of one reduction block.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockMinMax {
    /// Smallest value seen.
    pub min: f32,
    /// Largest value seen.
    pub max: f32,
}

impl BlockMinMax {
    /// Accumulator identity: merging with it changes nothing.
    pub const EMPTY: Self = Self {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    /// Combines two partial results. Associative and commutative.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Widens the range so that `min <= 0 <= max`.
    #[must_use]
    pub fn include_zero(self) -> Self {
        Self {
            min: self.min.min(0.0),
            max: self.max.max(0.0),
        }
    }
}

impl Default for BlockMinMax {
    fn default() -> Self {
        Self::EMPTY
    }
}

// =============================================================================
// Block Range
// =============================================================================

/// Element indices `[begin, end)` owned by one unit of parallel work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    /// First element index.
    pub begin: usize,
    /// One past the last element index.
    pub end: usize,
}

impl BlockRange {
    /// Range of block `index` when `total` elements are cut into `block_size` pieces.
    pub fn block(index: usize, block_size: usize, total: usize) -> Self {
        let begin = (index * block_size).min(total);
        let end = (begin + block_size).min(total);
        Self { begin, end }
    }

    /// Number of elements in the range.
    pub fn len(&self) -> usize {
        self.end - self.begin
    }

    /// Returns true if the range is empty.
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    /// As a slice index.
    pub fn as_range(&self) -> Range<usize> {
        self.begin..self.end
    }
}

// =============================================================================
// Quantization Parameters
// =============================================================================

/// Scale and zero point for one tensor.
///
/// `T` is the output element type; the zero point is stored as a value of
/// that type so it is always representable. Packed 4-bit types carry it in
/// lane 0. Float8 targets ignore the zero point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizationParameters<T> {
    /// Positive multiplier from quantized units back to real values.
    pub scale: f32,
    /// Quantized value representing real zero.
    pub zero_point: T,
}

impl<T> QuantizationParameters<T> {
    /// Creates parameters from a scale and zero point.
    pub fn new(scale: f32, zero_point: T) -> Self {
        Self { scale, zero_point }
    }
}

// =============================================================================
// Quantization Target
// =============================================================================

/// Output element type of a quantization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QuantTarget {
    /// Unsigned 8-bit integers.
    U8,
    /// Signed 8-bit integers.
    I8,
    /// Unsigned 16-bit integers.
    U16,
    /// Signed 16-bit integers.
    I16,
    /// Unsigned 4-bit integers, two per byte.
    UInt4,
    /// Signed 4-bit integers, two per byte.
    Int4,
    /// Float8 E4M3FN.
    Float8E4M3FN,
    /// Float8 E4M3FNUZ.
    Float8E4M3FNUZ,
    /// Float8 E5M2.
    Float8E5M2,
    /// Float8 E5M2FNUZ.
    Float8E5M2FNUZ,
}

impl QuantTarget {
    /// Returns the element dtype.
    pub fn dtype(&self) -> DType {
        match self {
            QuantTarget::U8 => DType::U8,
            QuantTarget::I8 => DType::I8,
            QuantTarget::U16 => DType::U16,
            QuantTarget::I16 => DType::I16,
            QuantTarget::UInt4 => DType::UInt4,
            QuantTarget::Int4 => DType::Int4,
            QuantTarget::Float8E4M3FN => DType::Float8E4M3FN,
            QuantTarget::Float8E4M3FNUZ => DType::Float8E4M3FNUZ,
            QuantTarget::Float8E5M2 => DType::Float8E5M2,
            QuantTarget::Float8E5M2FNUZ => DType::Float8E5M2FNUZ,
        }
    }

    /// Maps a dtype to a target; float sources are rejected.
    pub fn from_dtype(dtype: DType) -> QuantResult<Self> {
        Ok(match dtype {
            DType::U8 => QuantTarget::U8,
            DType::I8 => QuantTarget::I8,
            DType::U16 => QuantTarget::U16,
            DType::I16 => QuantTarget::I16,
            DType::UInt4 => QuantTarget::UInt4,
            DType::Int4 => QuantTarget::Int4,
            DType::Float8E4M3FN => QuantTarget::Float8E4M3FN,
            DType::Float8E4M3FNUZ => QuantTarget::Float8E4M3FNUZ,
            DType::Float8E5M2 => QuantTarget::Float8E5M2,
            DType::Float8E5M2FNUZ => QuantTarget::Float8E5M2FNUZ,
            DType::F32 | DType::F16 | DType::BF16 => {
                return Err(qlinear_core::Error::UnsupportedDType {
                    dtype,
                    operation: "quantize",
                }
                .into())
            }
        })
    }

    /// Returns the bits per logical element.
    pub fn bits_per_value(&self) -> usize {
        self.dtype().bits()
    }

    /// Returns the compression ratio compared to F32.
    pub fn compression_ratio(&self) -> f32 {
        32.0 / self.bits_per_value() as f32
    }

    /// Parses a quantization target from a string.
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "U8" | "UINT8" => Some(QuantTarget::U8),
            "I8" | "INT8" => Some(QuantTarget::I8),
            "U16" | "UINT16" => Some(QuantTarget::U16),
            "I16" | "INT16" => Some(QuantTarget::I16),
            "U4" | "UINT4" => Some(QuantTarget::UInt4),
            "I4" | "INT4" => Some(QuantTarget::Int4),
            "FLOAT8E4M3FN" | "E4M3FN" | "FP8" => Some(QuantTarget::Float8E4M3FN),
            "FLOAT8E4M3FNUZ" | "E4M3FNUZ" => Some(QuantTarget::Float8E4M3FNUZ),
            "FLOAT8E5M2" | "E5M2" => Some(QuantTarget::Float8E5M2),
            "FLOAT8E5M2FNUZ" | "E5M2FNUZ" => Some(QuantTarget::Float8E5M2FNUZ),
            _ => None,
        }
    }

    /// Parses a quantization target, rejecting unknown names.
    pub fn parse(s: &str) -> QuantResult<Self> {
        Self::from_str(s).ok_or_else(|| QuantError::InvalidTarget(s.to_string()))
    }
}

impl fmt::Display for QuantTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dtype())
    }
}

// =============================================================================
// Quantized Data
// =============================================================================

/// Owned output buffer of a quantization, one variant per target.
#[derive(Debug, Clone, PartialEq)]
pub enum QuantizedData {
    /// Unsigned 8-bit values.
    U8(Vec<u8>),
    /// Signed 8-bit values.
    I8(Vec<i8>),
    /// Unsigned 16-bit values.
    U16(Vec<u16>),
    /// Signed 16-bit values.
    I16(Vec<i16>),
    /// Packed unsigned 4-bit values.
    UInt4(Vec<UInt4x2>),
    /// Packed signed 4-bit values.
    Int4(Vec<Int4x2>),
    /// Float8 E4M3FN values.
    Float8E4M3FN(Vec<Float8E4M3FN>),
    /// Float8 E4M3FNUZ values.
    Float8E4M3FNUZ(Vec<Float8E4M3FNUZ>),
    /// Float8 E5M2 values.
    Float8E5M2(Vec<Float8E5M2>),
    /// Float8 E5M2FNUZ values.
    Float8E5M2FNUZ(Vec<Float8E5M2FNUZ>),
}

impl QuantizedData {
    /// Returns the target this buffer belongs to.
    pub fn target(&self) -> QuantTarget {
        match self {
            QuantizedData::U8(_) => QuantTarget::U8,
            QuantizedData::I8(_) => QuantTarget::I8,
            QuantizedData::U16(_) => QuantTarget::U16,
            QuantizedData::I16(_) => QuantTarget::I16,
            QuantizedData::UInt4(_) => QuantTarget::UInt4,
            QuantizedData::Int4(_) => QuantTarget::Int4,
            QuantizedData::Float8E4M3FN(_) => QuantTarget::Float8E4M3FN,
            QuantizedData::Float8E4M3FNUZ(_) => QuantTarget::Float8E4M3FNUZ,
            QuantizedData::Float8E5M2(_) => QuantTarget::Float8E5M2,
            QuantizedData::Float8E5M2FNUZ(_) => QuantTarget::Float8E5M2FNUZ,
        }
    }

    /// Returns the number of stored elements (bytes for packed targets).
    pub fn len(&self) -> usize {
        match self {
            QuantizedData::U8(v) => v.len(),
            QuantizedData::I8(v) => v.len(),
            QuantizedData::U16(v) => v.len(),
            QuantizedData::I16(v) => v.len(),
            QuantizedData::UInt4(v) => v.len(),
            QuantizedData::Int4(v) => v.len(),
            QuantizedData::Float8E4M3FN(v) => v.len(),
            QuantizedData::Float8E4M3FNUZ(v) => v.len(),
            QuantizedData::Float8E5M2(v) => v.len(),
            QuantizedData::Float8E5M2FNUZ(v) => v.len(),
        }
    }

    /// Returns true if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the storage size in bytes.
    pub fn size_bytes(&self) -> usize {
        match self {
            QuantizedData::U8(v) => v.len(),
            QuantizedData::I8(v) => v.len(),
            QuantizedData::U16(v) => v.len() * 2,
            QuantizedData::I16(v) => v.len() * 2,
            QuantizedData::UInt4(v) => v.len(),
            QuantizedData::Int4(v) => v.len(),
            QuantizedData::Float8E4M3FN(v) => v.len(),
            QuantizedData::Float8E4M3FNUZ(v) => v.len(),
            QuantizedData::Float8E5M2(v) => v.len(),
            QuantizedData::Float8E5M2FNUZ(v) => v.len(),
        }
    }

    /// Views the buffer as raw bytes in native byte order.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            QuantizedData::U8(v) => v.as_slice(),
            QuantizedData::I8(v) => bytemuck::cast_slice(v),
            QuantizedData::U16(v) => bytemuck::cast_slice(v),
            QuantizedData::I16(v) => bytemuck::cast_slice(v),
            QuantizedData::UInt4(v) => bytemuck::cast_slice(v),
            QuantizedData::Int4(v) => bytemuck::cast_slice(v),
            QuantizedData::Float8E4M3FN(v) => bytemuck::cast_slice(v),
            QuantizedData::Float8E4M3FNUZ(v) => bytemuck::cast_slice(v),
            QuantizedData::Float8E5M2(v) => bytemuck::cast_slice(v),
            QuantizedData::Float8E5M2FNUZ(v) => bytemuck::cast_slice(v),
        }
    }
}

// =============================================================================
// Quantized Tensor
// =============================================================================

/// A quantized tensor with the parameters needed to dequantize it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuantizedTensor {
    /// Original tensor shape.
    pub shape: Vec<usize>,
    /// Scale used for every element.
    pub scale: f32,
    /// Zero point, widened to `i32` (always 0 for float8 targets).
    pub zero_point: i32,
    /// Quantized values.
    pub data: QuantizedData,
    /// Number of logical elements.
    pub numel: usize,
}

impl QuantizedTensor {
    /// Creates a new quantized tensor.
    pub fn new(shape: Vec<usize>, scale: f32, zero_point: i32, data: QuantizedData) -> Self {
        let numel = shape.iter().product();
        Self {
            shape,
            scale,
            zero_point,
            data,
            numel,
        }
    }

    /// Returns the quantization target.
    pub fn target(&self) -> QuantTarget {
        self.data.target()
    }

    /// Returns the memory size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.data.size_bytes()
    }

    /// Number of stored elements `numel` logical values need.
    pub fn storage_len(&self) -> usize {
        if self.target().dtype().is_packed() {
            packed_len(self.numel)
        } else {
            self.numel
        }
    }

    /// Returns the compression ratio compared to F32.
    pub fn compression_ratio(&self) -> f32 {
        if self.size_bytes() == 0 {
            return 1.0;
        }
        (self.numel * 4) as f32 / self.size_bytes() as f32
    }
}

/// Rejects a shape that does not describe `len` elements.
pub(crate) fn check_shape(shape: &[usize], len: usize) -> QuantResult<()> {
    let expected: usize = shape.iter().product();
    if expected != len {
        return Err(QuantError::ShapeMismatch {
            shape: shape.to_vec(),
            expected,
            actual: len,
        });
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
