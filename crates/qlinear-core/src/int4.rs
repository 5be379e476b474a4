//! Packed 4-bit Types
//!
//! `Int4x2` and `UInt4x2` hold two independent 4-bit lanes in one byte. Lane
//! 0 is the low nibble (even logical index), lane 1 the high nibble (odd
//! logical index). Both formats share one `PackedLane` capability so the
//! sub-byte quantizer is written once.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use bytemuck::{Pod, Zeroable};

use crate::dtype::{DType, QuantRange};

// =============================================================================
// PackedLane Trait
// =============================================================================

/// A byte holding `LANES` independently addressable sub-byte values.
pub trait PackedLane: QuantRange + Pod {
    /// Number of logical elements stored per byte.
    const LANES: usize;

    /// Returns the value stored in `lane`, sign-extended where applicable.
    fn get_lane(self, lane: usize) -> i32;

    /// Stores `value` (already within `[QMIN, QMAX]`) into `lane`, leaving
    /// the other lane untouched.
    fn set_lane(&mut self, lane: usize, value: i32);

    /// Builds a byte from two lane values, each clamped to the lane range.
    fn from_lanes(low: i32, high: i32) -> Self {
        let mut packed = Self::default();
        packed.set_lane(0, low.clamp(Self::QMIN, Self::QMAX));
        packed.set_lane(1, high.clamp(Self::QMIN, Self::QMAX));
        packed
    }

    /// Returns the raw byte.
    fn bits(self) -> u8;
}

/// Number of bytes needed to hold `count` packed 4-bit elements.
#[must_use]
pub const fn packed_len(count: usize) -> usize {
    (count + 1) / 2
}

// =============================================================================
// Int4x2
// =============================================================================

/// Two signed 4-bit values (range -8 to 7) packed into one byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Int4x2(pub u8);

unsafe impl Zeroable for Int4x2 {}
unsafe impl Pod for Int4x2 {}

impl QuantRange for Int4x2 {
    const DTYPE: DType = DType::Int4;
    const QMIN: i32 = -8;
    const QMAX: i32 = 7;

    fn from_i32_clamped(value: i32) -> Self {
        let mut packed = Self::default();
        packed.set_lane(0, value.clamp(Self::QMIN, Self::QMAX));
        packed
    }

    fn to_i32(self) -> i32 {
        self.get_lane(0)
    }
}

impl PackedLane for Int4x2 {
    const LANES: usize = 2;

    #[inline]
    fn get_lane(self, lane: usize) -> i32 {
        debug_assert!(lane < Self::LANES);
        let nibble = (self.0 >> (lane * 4)) & 0x0F;
        // sign-extend from bit 3
        i32::from(((nibble << 4) as i8) >> 4)
    }

    #[inline]
    fn set_lane(&mut self, lane: usize, value: i32) {
        debug_assert!(lane < Self::LANES);
        let shift = lane * 4;
        let nibble = (value as u8) & 0x0F;
        self.0 = (self.0 & !(0x0F << shift)) | (nibble << shift);
    }

    #[inline]
    fn bits(self) -> u8 {
        self.0
    }
}

// =============================================================================
// UInt4x2
// =============================================================================

/// Two unsigned 4-bit values (range 0 to 15) packed into one byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct UInt4x2(pub u8);

unsafe impl Zeroable for UInt4x2 {}
unsafe impl Pod for UInt4x2 {}

impl QuantRange for UInt4x2 {
    const DTYPE: DType = DType::UInt4;
    const QMIN: i32 = 0;
    const QMAX: i32 = 15;

    fn from_i32_clamped(value: i32) -> Self {
        let mut packed = Self::default();
        packed.set_lane(0, value.clamp(Self::QMIN, Self::QMAX));
        packed
    }

    fn to_i32(self) -> i32 {
        self.get_lane(0)
    }
}

impl PackedLane for UInt4x2 {
    const LANES: usize = 2;

    #[inline]
    fn get_lane(self, lane: usize) -> i32 {
        debug_assert!(lane < Self::LANES);
        i32::from((self.0 >> (lane * 4)) & 0x0F)
    }

    #[inline]
    fn set_lane(&mut self, lane: usize, value: i32) {
        debug_assert!(lane < Self::LANES);
        let shift = lane * 4;
        let nibble = (value as u8) & 0x0F;
        self.0 = (self.0 & !(0x0F << shift)) | (nibble << shift);
    }

    #[inline]
    fn bits(self) -> u8 {
        self.0
    }
}

// =============================================================================
// Tests
// =============================================================================
