//! Property tests for element types, kernels and the parallel-for service.
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

use proptest::prelude::*;
use qlinear_core::prelude::*;
use qlinear_core::{quantize_value, Float8E4M3FN, Float8E4M3FNUZ, Float8E5M2, Float8E5M2FNUZ};

fn is_monotonic<F: Float8>(a: f32, b: f32) -> bool {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    F::from_f32(lo, true).to_f32() <= F::from_f32(hi, true).to_f32()
}

fn saturated_is_bounded<F: Float8>(x: f32) -> bool {
    let y = F::from_f32(x, true).to_f32();
    y.is_finite() && y.abs() <= F::MAX
}

/// Every non-NaN code decodes to a value that encodes back to the same code.
fn codes_are_canonical<F: Float8>(make: fn(u8) -> F) {
    for bits in 0..=u8::MAX {
        let value = make(bits).to_f32();
        if value.is_nan() {
            continue;
        }
        assert_eq!(
            F::from_f32(value, false).to_bits(),
            bits,
            "{} code {bits:#04x} decodes to {value}",
            F::DTYPE
        );
    }
}

#[test]
fn test_float8_codes_are_canonical() {
    codes_are_canonical(Float8E4M3FN);
    codes_are_canonical(Float8E4M3FNUZ);
    codes_are_canonical(Float8E5M2);
    codes_are_canonical(Float8E5M2FNUZ);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn prop_float8_monotonic(a in -1e6f32..1e6, b in -1e6f32..1e6) {
        prop_assert!(is_monotonic::<Float8E4M3FN>(a, b));
        prop_assert!(is_monotonic::<Float8E4M3FNUZ>(a, b));
        prop_assert!(is_monotonic::<Float8E5M2>(a, b));
        prop_assert!(is_monotonic::<Float8E5M2FNUZ>(a, b));
    }

    #[test]
    fn prop_float8_saturation_bounded(x in prop::num::f32::NORMAL | prop::num::f32::ZERO) {
        prop_assert!(saturated_is_bounded::<Float8E4M3FN>(x));
        prop_assert!(saturated_is_bounded::<Float8E4M3FNUZ>(x));
        prop_assert!(saturated_is_bounded::<Float8E5M2>(x));
        prop_assert!(saturated_is_bounded::<Float8E5M2FNUZ>(x));
    }

    #[test]
    fn prop_set_lane_keeps_other_lane(byte in any::<u8>(), lane in 0usize..2, value in -8i32..=7) {
        let mut packed = Int4x2(byte);
        let other = packed.get_lane(1 - lane);
        packed.set_lane(lane, value);
        prop_assert_eq!(packed.get_lane(lane), value);
        prop_assert_eq!(packed.get_lane(1 - lane), other);

        let mut packed = UInt4x2(byte);
        let other = packed.get_lane(1 - lane);
        packed.set_lane(lane, value + 8);
        prop_assert_eq!(packed.get_lane(lane), value + 8);
        prop_assert_eq!(packed.get_lane(1 - lane), other);
    }

    #[test]
    fn prop_quantize_value_in_range(
        x in -1e9f32..1e9,
        scale in 1e-6f32..1e3,
        zero_point in -200i32..200,
    ) {
        let q = quantize_value(x, scale, zero_point, i8::QMIN, i8::QMAX);
        prop_assert!((i8::QMIN..=i8::QMAX).contains(&q));
        let q = quantize_value(x, scale, zero_point, u16::QMIN, u16::QMAX);
        prop_assert!((u16::QMIN..=u16::QMAX).contains(&q));
    }

    #[test]
    fn prop_kernel_min_max_matches_fold(data in prop::collection::vec(-1e5f32..1e5, 1..200)) {
        let (min, max) = CpuKernel::new().find_min_max(&data);
        let expected_min = data.iter().copied().fold(f32::INFINITY, f32::min);
        let expected_max = data.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        prop_assert_eq!(min, expected_min);
        prop_assert_eq!(max, expected_max);
    }

    #[test]
    fn prop_parallel_chunks_visit_each_element_once(len in 0usize..5000, chunk_len in 1usize..300) {
        let pool = ThreadPool::new(4).unwrap();
        let mut data = vec![0u32; len];
        let cost = TensorOpCost::new(4.0, 4.0, 1.0);
        ThreadPool::try_parallel_for_chunks(Some(&pool), &mut data, chunk_len, cost, |index, chunk| {
            for (offset, slot) in chunk.iter_mut().enumerate() {
                *slot += (index * chunk_len + offset) as u32 + 1;
            }
        });
        prop_assert!(data.iter().enumerate().all(|(i, &v)| v == i as u32 + 1));
    }
}
