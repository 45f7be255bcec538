//! Fixed-width lane kernels for the vectorized backend.
//!
//! `f64::exp_m1` is an opaque libm call, so a loop over it stays scalar.
//! These kernels evaluate `expm1` with straight-line arithmetic instead:
//!
//! ```text
//! x = k*ln2 + r,  |r| <= ln2/2
//! expm1(x) = 2^k * expm1(r) + (2^k - 1)
//! ```
//!
//! `k` is rounded with the 1.5*2^52 shifter, `r` uses a two-part ln2, and
//! `expm1(r)` is a degree-14 Taylor polynomial in Horner form. `2^k` is
//! assembled from its exponent bits. Every step is a select, a multiply-add
//! or an integer op on the same lane, so LLVM can vectorise a chunk of
//! [`LANES`] values. The result agrees with `exp_m1` to a few ulps.

use super::expm1::{clip_exponent, safe_expm1_scalar};

/// Lane width of the vectorized kernel (8 f64 = one AVX-512 register).
pub const LANES: usize = 8;

/// Largest clipping bound the lane kernel handles; `2^k` must stay a
/// normal `f64`. Larger bounds fall back to the scalar kernel.
pub const LANE_MAX_ARG: f64 = 709.0;

const LN2_HI: f64 = 6.931_471_803_691_238_164_90e-1;
const LN2_LO: f64 = 1.908_214_929_270_587_700_02e-10;
const INV_LN2: f64 = 1.442_695_040_888_963_387_00;
const SHIFTER: f64 = 6_755_399_441_055_744.0;

// 1/n for n = 14 down to 2
const INV_FACTORS: [f64; 13] = [
    1.0 / 14.0,
    1.0 / 13.0,
    1.0 / 12.0,
    1.0 / 11.0,
    1.0 / 10.0,
    1.0 / 9.0,
    1.0 / 8.0,
    1.0 / 7.0,
    1.0 / 6.0,
    1.0 / 5.0,
    1.0 / 4.0,
    1.0 / 3.0,
    1.0 / 2.0,
];

/// `expm1(x)` for `|x| <= LANE_MAX_ARG` or NaN.
#[inline(always)]
fn expm1_lane(x: f64) -> f64 {
    let t = x * INV_LN2 + SHIFTER;
    let kf = t - SHIFTER;
    let k = (t.to_bits() as i64).wrapping_sub(SHIFTER.to_bits() as i64);
    let r = (x - kf * LN2_HI) - kf * LN2_LO;

    let mut p = 1.0;
    for inv in INV_FACTORS {
        p = 1.0 + r * p * inv;
    }
    let em1_r = r * p;

    let scale = f64::from_bits((k.wrapping_add(1023) as u64) << 52);
    scale * em1_r + (scale - 1.0)
}

fn for_each_lane<F: Fn(f64) -> f64>(values: &mut [f64], op: F) {
    let mut chunks = values.chunks_exact_mut(LANES);
    for chunk in &mut chunks {
        for v in chunk.iter_mut() {
            *v = op(*v);
        }
    }
    for v in chunks.into_remainder() {
        *v = op(*v);
    }
}

/// `safe_expm1` over contiguous memory, in place.
pub(crate) fn expm1_in_place(values: &mut [f64], max_arg: f64) {
    let bound = max_arg.abs();
    if bound > LANE_MAX_ARG {
        for v in values.iter_mut() {
            *v = safe_expm1_scalar(*v, bound);
        }
        return;
    }
    for_each_lane(values, |x| expm1_lane(clip_exponent(x, bound)));
}

/// Ideal diode current over contiguous voltages, in place.
pub(crate) fn diode_current_in_place(values: &mut [f64], i_s: f64, v_t: f64, max_arg: f64) {
    let bound = max_arg.abs();
    if bound > LANE_MAX_ARG {
        for v in values.iter_mut() {
            *v = i_s * safe_expm1_scalar(*v / v_t, bound);
        }
        return;
    }
    for_each_lane(values, |v| i_s * expm1_lane(clip_exponent(v / v_t, bound)));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::DEFAULT_MAX_ARG;
    use proptest::prelude::*;

    fn assert_close(got: f64, expected: f64) {
        if expected == 0.0 {
            assert_eq!(got, 0.0);
        } else {
            let rel = ((got - expected) / expected).abs();
            assert!(rel < 1e-14, "expm1 lane: {got:e} vs {expected:e} (rel {rel:e})");
        }
    }

    #[test]
    fn test_matches_libm_on_grid() {
        let mut values: Vec<f64> = (-7000..=7000).map(|k| k as f64 * 0.1).collect();
        let expected: Vec<f64> = values.iter().map(|&x| safe_expm1_scalar(x, DEFAULT_MAX_ARG)).collect();
        expm1_in_place(&mut values, DEFAULT_MAX_ARG);
        for (g, e) in values.iter().zip(expected.iter()) {
            assert_close(*g, *e);
        }
    }

    #[test]
    fn test_reduction_boundaries() {
        // Around +-ln2/2, where the rounded k changes
        for x in [0.3465, 0.3466, 0.34657359, -0.3465, -0.3466, -0.34657359, 1.0397, -1.0397] {
            let mut v = [x];
            expm1_in_place(&mut v, DEFAULT_MAX_ARG);
            assert_close(v[0], x.exp_m1());
        }
    }

    #[test]
    fn test_tiny_arguments_keep_precision() {
        let mut values = [1e-300, -1e-300, 1e-12, -1e-12, 5e-324];
        let expected = values;
        expm1_in_place(&mut values, DEFAULT_MAX_ARG);
        for (g, x) in values.iter().zip(expected.iter()) {
            assert_close(*g, x.exp_m1());
        }
    }

    #[test]
    fn test_clipping_and_nan() {
        let mut values = [1e6, -1e6, f64::INFINITY, f64::NEG_INFINITY, f64::NAN];
        expm1_in_place(&mut values, DEFAULT_MAX_ARG);
        assert_close(values[0], 700f64.exp_m1());
        assert_eq!(values[1], -1.0);
        assert_close(values[2], 700f64.exp_m1());
        assert_eq!(values[3], -1.0);
        assert!(values[4].is_nan());
    }

    #[test]
    fn test_edge_of_lane_range() {
        let mut values = [LANE_MAX_ARG, -LANE_MAX_ARG];
        expm1_in_place(&mut values, LANE_MAX_ARG);
        assert!(values[0].is_finite());
        assert_close(values[0], LANE_MAX_ARG.exp_m1());
        assert_eq!(values[1], -1.0);
    }

    #[test]
    fn test_large_bound_falls_back() {
        let mut values = [709.5, 800.0];
        expm1_in_place(&mut values, 1000.0);
        assert_eq!(values[0], 709.5f64.exp_m1());
        assert!(values[1].is_infinite());
    }

    #[test]
    fn test_diode_current_lanes() {
        let mut values: Vec<f64> = (0..37).map(|k| -1.0 + 0.05 * k as f64).collect();
        let expected: Vec<f64> = values.iter().map(|&v| 1e-12 * (v / 0.026).exp_m1()).collect();
        diode_current_in_place(&mut values, 1e-12, 0.026, DEFAULT_MAX_ARG);
        for (g, e) in values.iter().zip(expected.iter()) {
            assert_close(*g, *e);
        }
    }

    proptest! {
        #[test]
        fn lane_expm1_tracks_libm(x in prop_oneof![-750.0f64..750.0, -1.0f64..1.0, -1e-8f64..1e-8]) {
            let mut v = [x];
            expm1_in_place(&mut v, DEFAULT_MAX_ARG);
            let expected = safe_expm1_scalar(x, DEFAULT_MAX_ARG);
            if expected == 0.0 {
                prop_assert_eq!(v[0], 0.0);
            } else {
                prop_assert!(((v[0] - expected) / expected).abs() < 1e-14);
            }
        }
    }
}
