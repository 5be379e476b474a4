//! Data Types - Quantization Element Types
//!
//! Defines the element types that take part in linear quantization and the
//! capabilities the quantization stages are generic over. Integer targets
//! (u8, i8, u16, i16 and the packed 4-bit types) expose their representable
//! range through `QuantRange`; half-precision sources widen to `f32` through
//! `NarrowFloat`.
//!
//! # Key Features
//! - Runtime dtype information via `DType` enum
//! - Clamped narrowing from `i32` that never wraps
//! - Half-precision (f16, bf16) input support
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use half::{bf16, f16};

use core::fmt::Debug;

// =============================================================================
// DType Enum
// =============================================================================

/// Runtime representation of quantization element types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating point (single precision).
    F32,
    /// 16-bit floating point (half precision).
    F16,
    /// 16-bit brain floating point.
    BF16,
    /// 8-bit signed integer.
    I8,
    /// 8-bit unsigned integer.
    U8,
    /// 16-bit signed integer.
    I16,
    /// 16-bit unsigned integer.
    U16,
    /// Two signed 4-bit lanes per byte.
    Int4,
    /// Two unsigned 4-bit lanes per byte.
    UInt4,
    /// 8-bit float, 4 exponent bits, finite only.
    Float8E4M3FN,
    /// 8-bit float, 4 exponent bits, finite only, no negative zero.
    Float8E4M3FNUZ,
    /// 8-bit float, 5 exponent bits, with infinities.
    Float8E5M2,
    /// 8-bit float, 5 exponent bits, finite only, no negative zero.
    Float8E5M2FNUZ,
}

impl DType {
    /// Returns the storage size in bits of a single logical element.
    #[must_use]
    pub const fn bits(self) -> usize {
        match self {
            Self::Int4 | Self::UInt4 => 4,
            Self::I8
            | Self::U8
            | Self::Float8E4M3FN
            | Self::Float8E4M3FNUZ
            | Self::Float8E5M2
            | Self::Float8E5M2FNUZ => 8,
            Self::F16 | Self::BF16 | Self::I16 | Self::U16 => 16,
            Self::F32 => 32,
        }
    }

    /// Returns true if this is a floating point type.
    #[must_use]
    pub const fn is_float(self) -> bool {
        !self.is_integer()
    }

    /// Returns true if this is an integer type (packed or not).
    #[must_use]
    pub const fn is_integer(self) -> bool {
        matches!(
            self,
            Self::I8 | Self::U8 | Self::I16 | Self::U16 | Self::Int4 | Self::UInt4
        )
    }

    /// Returns true if elements of this type share a byte.
    #[must_use]
    pub const fn is_packed(self) -> bool {
        matches!(self, Self::Int4 | Self::UInt4)
    }

    /// Returns the name of this data type as a string.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::F32 => "f32",
            Self::F16 => "f16",
            Self::BF16 => "bf16",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::Int4 => "int4",
            Self::UInt4 => "uint4",
            Self::Float8E4M3FN => "float8e4m3fn",
            Self::Float8E4M3FNUZ => "float8e4m3fnuz",
            Self::Float8E5M2 => "float8e5m2",
            Self::Float8E5M2FNUZ => "float8e5m2fnuz",
        }
    }
}

impl core::fmt::Display for DType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// =============================================================================
// QuantRange Trait
// =============================================================================

/// Integer quantization targets with a fixed representable range.
///
/// For packed types the range is that of a single lane, and a value built by
/// `from_i32_clamped` carries the number in lane 0.
pub trait QuantRange: Copy + Debug + Default + PartialEq + Send + Sync + 'static {
    /// The runtime dtype for this type.
    const DTYPE: DType;

    /// Smallest representable quantized value.
    const QMIN: i32;

    /// Largest representable quantized value.
    const QMAX: i32;

    /// Narrows `value` after clamping it into `[QMIN, QMAX]`.
    fn from_i32_clamped(value: i32) -> Self;

    /// Widens to `i32`. Packed types return lane 0.
    fn to_i32(self) -> i32;
}

macro_rules! impl_quant_range {
    ($ty:ty, $dtype:expr) => {
        impl QuantRange for $ty {
            const DTYPE: DType = $dtype;
            const QMIN: i32 = <$ty>::MIN as i32;
            const QMAX: i32 = <$ty>::MAX as i32;

            #[inline]
            fn from_i32_clamped(value: i32) -> Self {
                value.clamp(Self::QMIN, Self::QMAX) as $ty
            }

            #[inline]
            fn to_i32(self) -> i32 {
                i32::from(self)
            }
        }
    };
}

impl_quant_range!(u8, DType::U8);
impl_quant_range!(i8, DType::I8);
impl_quant_range!(u16, DType::U16);
impl_quant_range!(i16, DType::I16);

// =============================================================================
// NarrowFloat Trait
// =============================================================================

/// Half-width floating point sources that are widened before arithmetic.
pub trait NarrowFloat: Copy + Debug + Send + Sync + 'static {
    /// The runtime dtype for this type.
    const DTYPE: DType;

    /// Widens to a working `f32`.
    fn to_working(self) -> f32;
}

impl NarrowFloat for f16 {
    const DTYPE: DType = DType::F16;

    #[inline]
    fn to_working(self) -> f32 {
        self.to_f32()
    }
}

impl NarrowFloat for bf16 {
    const DTYPE: DType = DType::BF16;

    #[inline]
    fn to_working(self) -> f32 {
        self.to_f32()
    }
}

// =============================================================================
// Tests
// =============================================================================
