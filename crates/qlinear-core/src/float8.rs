//! Float8 Types
//!
//! The four 8-bit floating point formats used as quantization targets.
//! Conversion from `f32` rounds to nearest with ties to even; what happens
//! to values beyond the largest finite magnitude is controlled by the
//! `saturate` flag:
//!
//! | input          | E4M3FN     | E4M3FNUZ | E5M2       | E5M2FNUZ |
//! |----------------|------------|----------|------------|----------|
//! | ±Inf, saturate | ±max       | NaN      | ±max       | NaN      |
//! | ±Inf           | NaN        | NaN      | ±Inf       | NaN      |
//! | overflow, sat. | ±max       | ±max     | ±max       | ±max     |
//! | overflow       | NaN        | NaN      | ±Inf       | NaN      |
//!
//! The FNUZ formats have no negative zero; their NaN is `0x80`.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use bytemuck::{Pod, Zeroable};

use crate::dtype::DType;

// =============================================================================
// Format Description
// =============================================================================

/// Bit layout and special encodings of one float8 format.
#[derive(Debug, Clone, Copy)]
struct Layout {
    mantissa_bits: u32,
    bias: i32,
    /// Largest finite magnitude code (sign bit clear).
    max_code: u32,
    /// Canonical NaN byte.
    nan: u8,
    /// Positive infinity byte, if the format has infinities.
    inf: Option<u8>,
    /// Formats without negative zero also map infinities to NaN.
    unsigned_zero: bool,
}

const E4M3FN: Layout = Layout {
    mantissa_bits: 3,
    bias: 7,
    max_code: 0x7E,
    nan: 0x7F,
    inf: None,
    unsigned_zero: false,
};

const E4M3FNUZ: Layout = Layout {
    mantissa_bits: 3,
    bias: 8,
    max_code: 0x7F,
    nan: 0x80,
    inf: None,
    unsigned_zero: true,
};

const E5M2: Layout = Layout {
    mantissa_bits: 2,
    bias: 15,
    max_code: 0x7B,
    nan: 0x7F,
    inf: Some(0x7C),
    unsigned_zero: false,
};

const E5M2FNUZ: Layout = Layout {
    mantissa_bits: 2,
    bias: 16,
    max_code: 0x7F,
    nan: 0x80,
    inf: None,
    unsigned_zero: true,
};

/// Shifts `value` right by `shift` bits, rounding to nearest even.
#[inline]
fn shift_round_even(value: u32, shift: u32) -> u32 {
    if shift == 0 {
        return value;
    }
    if shift > 31 {
        return 0;
    }
    let truncated = value >> shift;
    let remainder = value & ((1 << shift) - 1);
    let half = 1 << (shift - 1);
    if remainder > half || (remainder == half && truncated & 1 == 1) {
        truncated + 1
    } else {
        truncated
    }
}

impl Layout {
    fn encode(self, value: f32, saturate: bool) -> u8 {
        let bits = value.to_bits();
        let sign = ((bits >> 24) & 0x80) as u8;
        let magnitude = bits & 0x7FFF_FFFF;

        if value.is_nan() {
            return self.nan;
        }
        if value.is_infinite() {
            if self.unsigned_zero {
                return self.nan;
            }
            return match (saturate, self.inf) {
                (true, _) => sign | self.max_code as u8,
                (false, Some(inf)) => sign | inf,
                (false, None) => self.nan,
            };
        }

        let code = if magnitude < 0x0080_0000 {
            // f32 subnormals are far below the smallest float8 subnormal
            0
        } else {
            let exponent = (magnitude >> 23) as i32 - 127;
            let significand = (magnitude & 0x007F_FFFF) | 0x0080_0000;
            let biased = exponent + self.bias;
            if biased >= 1 {
                let mantissa = shift_round_even(significand, 23 - self.mantissa_bits);
                // a carry out of the mantissa bumps the exponent field
                ((biased as u32) << self.mantissa_bits) + mantissa
                    - (1 << self.mantissa_bits)
            } else {
                let shift = 23 - self.mantissa_bits as i32 + 1 - biased;
                shift_round_even(significand, shift as u32)
            }
        };

        if code > self.max_code {
            return match (saturate, self.inf) {
                (true, _) => sign | self.max_code as u8,
                (false, Some(inf)) => sign | inf,
                (false, None) => self.nan,
            };
        }
        if code == 0 && self.unsigned_zero {
            return 0;
        }
        sign | code as u8
    }

    fn decode(self, byte: u8) -> f32 {
        if byte == self.nan || (!self.unsigned_zero && byte & 0x7F == self.nan & 0x7F) {
            return f32::NAN;
        }
        if let Some(inf) = self.inf {
            if byte & 0x7F == inf {
                return if byte & 0x80 != 0 {
                    f32::NEG_INFINITY
                } else {
                    f32::INFINITY
                };
            }
            if byte & 0x7F > inf {
                return f32::NAN;
            }
        }
        let negative = byte & 0x80 != 0;
        let code = u32::from(byte & 0x7F);
        let exponent = (code >> self.mantissa_bits) as i32;
        let mantissa = code & ((1 << self.mantissa_bits) - 1);
        let scale = 1u32 << self.mantissa_bits;
        let magnitude = if exponent == 0 {
            mantissa as f32 / scale as f32 * 2f32.powi(1 - self.bias)
        } else {
            (scale + mantissa) as f32 / scale as f32 * 2f32.powi(exponent - self.bias)
        };
        if negative {
            -magnitude
        } else {
            magnitude
        }
    }
}

// =============================================================================
// Float8 Trait
// =============================================================================

/// An 8-bit floating point quantization target.
pub trait Float8: Copy + Default + PartialEq + Send + Sync + Pod + 'static {
    /// The runtime dtype for this type.
    const DTYPE: DType;

    /// Largest finite value of the format.
    const MAX: f32;

    /// Converts with round-to-nearest-even; `saturate` clamps overflow to
    /// the largest finite value instead of producing Inf/NaN.
    fn from_f32(value: f32, saturate: bool) -> Self;

    /// Widens to `f32`.
    fn to_f32(self) -> f32;

    /// Returns the raw byte.
    fn to_bits(self) -> u8;
}

macro_rules! float8_type {
    ($name:ident, $layout:expr, $dtype:expr, $max:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(pub u8);

        unsafe impl Zeroable for $name {}
        unsafe impl Pod for $name {}

        impl Float8 for $name {
            const DTYPE: DType = $dtype;
            const MAX: f32 = $max;

            #[inline]
            fn from_f32(value: f32, saturate: bool) -> Self {
                Self($layout.encode(value, saturate))
            }

            #[inline]
            fn to_f32(self) -> f32 {
                $layout.decode(self.0)
            }

            #[inline]
            fn to_bits(self) -> u8 {
                self.0
            }
        }
    };
}

float8_type!(
    Float8E4M3FN,
    E4M3FN,
    DType::Float8E4M3FN,
    448.0,
    "8-bit float with 4 exponent bits and 3 mantissa bits, no infinities."
);
float8_type!(
    Float8E4M3FNUZ,
    E4M3FNUZ,
    DType::Float8E4M3FNUZ,
    240.0,
    "8-bit float with 4 exponent bits, no infinities and no negative zero."
);
float8_type!(
    Float8E5M2,
    E5M2,
    DType::Float8E5M2,
    57344.0,
    "8-bit float with 5 exponent bits and 2 mantissa bits, IEEE-like."
);
float8_type!(
    Float8E5M2FNUZ,
    E5M2FNUZ,
    DType::Float8E5M2FNUZ,
    57344.0,
    "8-bit float with 5 exponent bits, no infinities and no negative zero."
);

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_values_e4m3fn() {
        for v in [0.0f32, 1.0, -1.0, 0.5, 1.5, 2.0, 3.0, 448.0, -448.0] {
            assert_eq!(Float8E4M3FN::from_f32(v, true).to_f32(), v);
        }
        assert_eq!(Float8E4M3FN::from_f32(1.0, true).to_bits(), 0x38);
        assert_eq!(Float8E4M3FN::from_f32(448.0, true).to_bits(), 0x7E);
    }

    #[test]
    fn test_exact_values_e5m2() {
        for v in [0.0f32, 1.0, -2.0, 0.75, 57344.0] {
            assert_eq!(Float8E5M2::from_f32(v, false).to_f32(), v);
        }
        assert_eq!(Float8E5M2::from_f32(1.0, false).to_bits(), 0x3C);
    }

    #[test]
    fn test_round_half_to_even() {
        // 1.0625 sits halfway between 1.0 and 1.125 in E4M3
        assert_eq!(Float8E4M3FN::from_f32(1.0625, true).to_f32(), 1.0);
        // 1.1875 sits halfway between 1.125 and 1.25; 1.25 has an even mantissa
        assert_eq!(Float8E4M3FN::from_f32(1.1875, true).to_f32(), 1.25);
    }

    #[test]
    fn test_saturation_table() {
        assert_eq!(Float8E4M3FN::from_f32(1000.0, true).to_f32(), 448.0);
        assert!(Float8E4M3FN::from_f32(1000.0, false).to_f32().is_nan());
        assert_eq!(Float8E4M3FN::from_f32(f32::NEG_INFINITY, true).to_f32(), -448.0);
        assert!(Float8E4M3FN::from_f32(f32::INFINITY, false).to_f32().is_nan());

        assert_eq!(Float8E5M2::from_f32(1e6, true).to_f32(), 57344.0);
        assert_eq!(Float8E5M2::from_f32(1e6, false).to_f32(), f32::INFINITY);
        assert_eq!(Float8E5M2::from_f32(f32::NEG_INFINITY, false).to_f32(), f32::NEG_INFINITY);

        assert!(Float8E4M3FNUZ::from_f32(f32::INFINITY, true).to_f32().is_nan());
        assert_eq!(Float8E4M3FNUZ::from_f32(1000.0, true).to_f32(), 240.0);
        assert!(Float8E5M2FNUZ::from_f32(1e6, false).to_f32().is_nan());
    }

    #[test]
    fn test_nan_and_zero() {
        assert!(Float8E5M2::from_f32(f32::NAN, true).to_f32().is_nan());
        assert_eq!(Float8E4M3FNUZ::from_f32(f32::NAN, true).to_bits(), 0x80);
        assert_eq!(Float8E4M3FNUZ::from_f32(-0.0, true).to_bits(), 0x00);
        assert_eq!(Float8E4M3FN::from_f32(-0.0, true).to_bits(), 0x80);
    }

    #[test]
    fn test_subnormals() {
        // smallest E4M3FN subnormal is 2^-9
        let tiny = 2f32.powi(-9);
        assert_eq!(Float8E4M3FN::from_f32(tiny, true).to_bits(), 0x01);
        assert_eq!(Float8E4M3FN::from_f32(tiny, true).to_f32(), tiny);
        // below half the smallest subnormal rounds to zero
        assert_eq!(Float8E4M3FN::from_f32(tiny * 0.4, true).to_bits(), 0x00);
    }
}
