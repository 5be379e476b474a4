//! Tensor-Level Quantization
//!
//! Whole-tensor entry points: `quantize_tensor` computes parameters, picks
//! the stage for the requested `QuantTarget`, allocates the output and
//! returns a self-describing `QuantizedTensor`. `dequantize_tensor` reverses
//! it. Unlike the stage methods, these validate their inputs and return
//! `QuantError` instead of panicking.
//!
//! @version 0.1.0
//! @author AutomataNexus Development Team

use qlinear_core::{
    packed_len, DType, Float8, Float8E4M3FN, Float8E4M3FNUZ, Float8E5M2, Float8E5M2FNUZ, Int4x2,
    PackedLane, QuantKernel, QuantRange, UInt4x2,
};

use crate::context::QuantContext;
use crate::error::{QuantError, QuantResult};
use crate::params::ParamPolicy;
use crate::types::{
    check_shape, BlockMinMax, QuantTarget, QuantizationParameters, QuantizedData, QuantizedTensor,
};

// =============================================================================
// Options
// =============================================================================

/// Per-call options for `quantize_tensor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantOptions {
    /// Parameter policy for integer targets.
    pub policy: ParamPolicy,
    /// Clamp out-of-range values to the float8 maximum instead of NaN/Inf.
    pub saturate: bool,
}

impl Default for QuantOptions {
    fn default() -> Self {
        Self {
            policy: ParamPolicy::ASYMMETRIC,
            saturate: true,
        }
    }
}

// =============================================================================
// Public API
// =============================================================================

impl<K: QuantKernel> QuantContext<'_, K> {
    /// Quantizes `data` laid out as `shape` into `target`.
    ///
    /// # Example
    /// ```
    /// use qlinear::{QuantContext, QuantOptions, QuantTarget};
    ///
    /// let ctx = QuantContext::sequential();
    /// let q = ctx
    ///     .quantize_tensor(&[-1.0, 0.0, 2.0, 3.0], &[2, 2], QuantTarget::U8, QuantOptions::default())
    ///     .unwrap();
    /// assert_eq!(q.zero_point, 64);
    /// ```
    pub fn quantize_tensor(
        &self,
        data: &[f32],
        shape: &[usize],
        target: QuantTarget,
        options: QuantOptions,
    ) -> QuantResult<QuantizedTensor> {
        check_shape(shape, data.len())?;
        let shape = shape.to_vec();
        let policy = options.policy;
        let saturate = options.saturate;

        let tensor = match target {
            QuantTarget::U8 => self.linear_tensor::<u8>(data, shape, policy, QuantizedData::U8),
            QuantTarget::I8 => self.linear_tensor::<i8>(data, shape, policy, QuantizedData::I8),
            QuantTarget::U16 => self.linear_tensor::<u16>(data, shape, policy, QuantizedData::U16),
            QuantTarget::I16 => self.linear_tensor::<i16>(data, shape, policy, QuantizedData::I16),
            QuantTarget::UInt4 => {
                self.packed_tensor::<UInt4x2>(data, shape, policy, QuantizedData::UInt4)
            }
            QuantTarget::Int4 => self.packed_tensor::<Int4x2>(data, shape, policy, QuantizedData::Int4),
            QuantTarget::Float8E4M3FN => {
                self.float8_tensor::<Float8E4M3FN>(data, shape, saturate, QuantizedData::Float8E4M3FN)
            }
            QuantTarget::Float8E4M3FNUZ => self.float8_tensor::<Float8E4M3FNUZ>(
                data,
                shape,
                saturate,
                QuantizedData::Float8E4M3FNUZ,
            ),
            QuantTarget::Float8E5M2 => {
                self.float8_tensor::<Float8E5M2>(data, shape, saturate, QuantizedData::Float8E5M2)
            }
            QuantTarget::Float8E5M2FNUZ => self.float8_tensor::<Float8E5M2FNUZ>(
                data,
                shape,
                saturate,
                QuantizedData::Float8E5M2FNUZ,
            ),
        };

        tracing::debug!(
            target_type = %target,
            numel = tensor.numel,
            bytes = tensor.size_bytes(),
            "quantized tensor"
        );
        Ok(tensor)
    }

    /// Quantizes into the target named by `dtype`.
    ///
    /// Fails with `UnsupportedDType` for F32, F16 and BF16, which are
    /// sources rather than quantization targets.
    pub fn quantize_tensor_as(
        &self,
        data: &[f32],
        shape: &[usize],
        dtype: DType,
        options: QuantOptions,
    ) -> QuantResult<QuantizedTensor> {
        let target = QuantTarget::from_dtype(dtype)?;
        self.quantize_tensor(data, shape, target, options)
    }

    /// Dequantizes a tensor back to `f32`.
    pub fn dequantize_tensor(&self, tensor: &QuantizedTensor) -> QuantResult<Vec<f32>> {
        check_shape(&tensor.shape, tensor.numel)?;
        expect_len(tensor.storage_len(), tensor.data.len())?;
        if !(tensor.scale.is_finite() && tensor.scale > 0.0) {
            return Err(QuantError::InvalidData(format!(
                "scale must be positive and finite, got {}",
                tensor.scale
            )));
        }
        if tensor.target().dtype().is_float() && tensor.zero_point != 0 {
            return Err(QuantError::InvalidData(format!(
                "{} carries no zero point, got {}",
                tensor.target(),
                tensor.zero_point
            )));
        }

        match &tensor.data {
            QuantizedData::U8(values) => self.linear_values(values, tensor),
            QuantizedData::I8(values) => self.linear_values(values, tensor),
            QuantizedData::U16(values) => self.linear_values(values, tensor),
            QuantizedData::I16(values) => self.linear_values(values, tensor),
            QuantizedData::UInt4(values) => self.packed_values(values, tensor),
            QuantizedData::Int4(values) => self.packed_values(values, tensor),
            QuantizedData::Float8E4M3FN(values) => self.float8_values(values, tensor),
            QuantizedData::Float8E4M3FNUZ(values) => self.float8_values(values, tensor),
            QuantizedData::Float8E5M2(values) => self.float8_values(values, tensor),
            QuantizedData::Float8E5M2FNUZ(values) => self.float8_values(values, tensor),
        }
    }

    // =========================================================================
    // Quantize helpers
    // =========================================================================

    fn linear_tensor<Q: QuantRange>(
        &self,
        data: &[f32],
        shape: Vec<usize>,
        policy: ParamPolicy,
        wrap: fn(Vec<Q>) -> QuantizedData,
    ) -> QuantizedTensor {
        let params = self.quantization_parameters::<Q>(data, policy);
        let mut output = vec![Q::default(); data.len()];
        self.quantize_linear(data, &mut output, &params);
        QuantizedTensor::new(shape, params.scale, params.zero_point.to_i32(), wrap(output))
    }

    fn packed_tensor<P: PackedLane>(
        &self,
        data: &[f32],
        shape: Vec<usize>,
        policy: ParamPolicy,
        wrap: fn(Vec<P>) -> QuantizedData,
    ) -> QuantizedTensor {
        let params = self.quantization_parameters::<P>(data, policy);
        let mut output = vec![P::default(); packed_len(data.len())];
        self.quantize_packed(data, &mut output, 0, data.len(), &params);
        QuantizedTensor::new(shape, params.scale, params.zero_point.to_i32(), wrap(output))
    }

    fn float8_tensor<F: Float8>(
        &self,
        data: &[f32],
        shape: Vec<usize>,
        saturate: bool,
        wrap: fn(Vec<F>) -> QuantizedData,
    ) -> QuantizedTensor {
        let params = QuantizationParameters::new(float8_scale::<F>(self.reduce_min_max(data)), F::default());
        let mut output = vec![F::default(); data.len()];
        self.quantize_saturate(data, &mut output, &params, saturate);
        QuantizedTensor::new(shape, params.scale, 0, wrap(output))
    }

    // =========================================================================
    // Dequantize helpers
    // =========================================================================

    fn linear_values<Q: QuantRange>(&self, values: &[Q], tensor: &QuantizedTensor) -> QuantResult<Vec<f32>> {
        let params = QuantizationParameters::new(tensor.scale, zero_point::<Q>(tensor.zero_point)?);
        let mut output = vec![0.0; tensor.numel];
        self.dequantize_linear(values, &mut output, &params);
        Ok(output)
    }

    fn packed_values<P: PackedLane>(&self, values: &[P], tensor: &QuantizedTensor) -> QuantResult<Vec<f32>> {
        let params = QuantizationParameters::new(tensor.scale, zero_point::<P>(tensor.zero_point)?);
        let mut output = vec![0.0; tensor.numel];
        self.dequantize_packed(values, &mut output, &params);
        Ok(output)
    }

    fn float8_values<F: Float8>(&self, values: &[F], tensor: &QuantizedTensor) -> QuantResult<Vec<f32>> {
        let params = QuantizationParameters::new(tensor.scale, F::default());
        let mut output = vec![0.0; tensor.numel];
        self.dequantize_float8(values, &mut output, &params);
        Ok(output)
    }
}

/// Scale mapping the largest magnitude onto the format's largest finite value.
fn float8_scale<F: Float8>(range: BlockMinMax) -> f32 {
    let scale = range.max.max(-range.min) / F::MAX;
    if scale.is_normal() {
        scale
    } else {
        1.0
    }
}

fn expect_len(expected: usize, actual: usize) -> QuantResult<()> {
    if expected != actual {
        return Err(QuantError::DataLengthMismatch { expected, actual });
    }
    Ok(())
}

fn zero_point<Q: QuantRange>(value: i32) -> QuantResult<Q> {
    if !(Q::QMIN..=Q::QMAX).contains(&value) {
        return Err(QuantError::InvalidData(format!(
            "zero point {} outside {} range [{}, {}]",
            value,
            Q::DTYPE,
            Q::QMIN,
            Q::QMAX
        )));
    }
    Ok(Q::from_i32_clamped(value))
}

// =============================================================================
// Error Statistics
// =============================================================================

/// Statistics about quantization error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantizationStats {
    /// Root mean square error.
    pub rmse: f32,
    /// Maximum absolute error.
    pub max_error: f32,
    /// Mean absolute error.
    pub mean_error: f32,
    /// Compression ratio.
    pub compression_ratio: f32,
}

/// Compares original values with their dequantized counterparts.
pub fn compute_quantization_stats(
    original: &[f32],
    dequantized: &[f32],
    target: QuantTarget,
) -> QuantResult<QuantizationStats> {
    expect_len(original.len(), dequantized.len())?;
    if original.is_empty() {
        return Ok(QuantizationStats {
            rmse: 0.0,
            max_error: 0.0,
            mean_error: 0.0,
            compression_ratio: target.compression_ratio(),
        });
    }

    let n = original.len() as f32;
    let (sum_sq, sum_abs, max_error) = original.iter().zip(dequantized).fold(
        (0.0f32, 0.0f32, 0.0f32),
        |(sq, abs, max), (a, b)| {
            let err = (a - b).abs();
            (sq + err * err, abs + err, max.max(err))
        },
    );

    Ok(QuantizationStats {
        rmse: (sum_sq / n).sqrt(),
        max_error,
        mean_error: sum_abs / n,
        compression_ratio: target.compression_ratio(),
    })
}

// =============================================================================
// Tests
// =============================================================================
