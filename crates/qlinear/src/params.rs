//! Scale and Zero-Point Calculation
//!
//! Turns a global (min, max) into `QuantizationParameters` for an integer
//! target. Two independent policies apply to signed 8-bit outputs only:
//! reduced range narrows `[qmin, qmax]` to `[-64, 64]`, and symmetric mode
//! pins the zero point to 0.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use qlinear_core::{DType, QuantKernel, QuantRange};

use crate::context::QuantContext;
use crate::types::{BlockMinMax, QuantizationParameters};

/// Integer range used for signed 8-bit outputs under the reduced-range policy.
pub const REDUCED_RANGE_I8: (i32, i32) = (-64, 64);

// =============================================================================
// Rounding
// =============================================================================

/// Rounds to the nearest integer, choosing the even one on exact ties.
///
/// NaN and infinities are returned unchanged.
#[inline]
pub fn round_half_to_even(value: f32) -> f32 {
    if !value.is_finite() {
        return value;
    }
    value.round_ties_even()
}

// =============================================================================
// Policy
// =============================================================================

/// Optional adjustments to the parameter calculation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParamPolicy {
    /// Use `[-64, 64]` instead of the full signed 8-bit range.
    pub reduce_range: bool,
    /// Zero point fixed at 0, range mirrored around zero.
    pub symmetric: bool,
}

impl ParamPolicy {
    /// Plain asymmetric quantization over the full range.
    pub const ASYMMETRIC: Self = Self {
        reduce_range: false,
        symmetric: false,
    };

    /// Symmetric quantization over the full range.
    pub const SYMMETRIC: Self = Self {
        reduce_range: false,
        symmetric: true,
    };
}

// =============================================================================
// Calculation
// =============================================================================

/// Replaces a scale that is zero, subnormal or not finite with 1.0.
#[inline]
fn usable_scale(scale: f32) -> f32 {
    if scale.is_normal() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

/// Computes scale and zero point for a range that already contains zero.
pub fn scale_zero_point<Q: QuantRange>(
    range: BlockMinMax,
    policy: ParamPolicy,
) -> QuantizationParameters<Q> {
    let BlockMinMax { min, max } = range;
    let (mut qmin, mut qmax) = (Q::QMIN, Q::QMAX);

    if Q::DTYPE == DType::I8 {
        if policy.reduce_range {
            (qmin, qmax) = REDUCED_RANGE_I8;
        }
        if policy.symmetric {
            let magnitude = max.max(-min);
            let scale = usable_scale(magnitude / qmax as f32);
            return QuantizationParameters::new(scale, Q::from_i32_clamped(0));
        }
    }

    let scale = usable_scale((max - min) / (qmax - qmin) as f32);

    let initial_zero_point = qmin as f32 - min / scale;
    let zero_point = round_half_to_even(initial_zero_point.clamp(qmin as f32, qmax as f32));
    QuantizationParameters::new(scale, Q::from_i32_clamped(zero_point as i32))
}

impl<K: QuantKernel> QuantContext<'_, K> {
    /// Reduces `data` and derives quantization parameters for target `Q`.
    pub fn quantization_parameters<Q: QuantRange>(
        &self,
        data: &[f32],
        policy: ParamPolicy,
    ) -> QuantizationParameters<Q> {
        let range = self.reduce_min_max(data);
        let params = scale_zero_point::<Q>(range, policy);
        tracing::debug!(
            dtype = %Q::DTYPE,
            min = range.min,
            max = range.max,
            scale = params.scale,
            zero_point = params.zero_point.to_i32(),
            "quantization parameters"
        );
        params
    }
}

// =============================================================================
// Tests
// =============================================================================
