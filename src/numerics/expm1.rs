//! Overflow-safe exponential primitives.
//!
//! Every junction current in the crate is built on
//!   expm1(clip(x, -max_arg, max_arg))
//!
//! `exp` overflows `f64` just above 709, so the argument is saturated at
//! [`DEFAULT_MAX_ARG`] before evaluation. `expm1` keeps full precision for
//! `|x| << 1`, where `exp(x) - 1` would cancel.

use ndarray::{Array, ArrayBase, Data, Dimension};

/// Default clipping bound for the normalized exponent.
pub const DEFAULT_MAX_ARG: f64 = 700.0;

/// Saturate `x` to `[-max_arg, max_arg]`.
///
/// NaN passes through unchanged. The bound is taken by absolute value.
#[inline]
pub fn clip_exponent(x: f64, max_arg: f64) -> f64 {
    let bound = max_arg.abs();
    if x > bound {
        bound
    } else if x < -bound {
        -bound
    } else {
        x
    }
}

/// `exp(x) - 1` for a single value, finite for every finite input.
#[inline]
pub fn safe_expm1_scalar(x: f64, max_arg: f64) -> f64 {
    clip_exponent(x, max_arg).exp_m1()
}

/// `exp(x) - 1` element-wise. The output has the shape of the input.
pub fn safe_expm1<S, D>(x: &ArrayBase<S, D>, max_arg: f64) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    x.mapv(|v| safe_expm1_scalar(v, max_arg))
}

/// Ideal diode current `I_s * (exp(V / V_T) - 1)` for a single voltage.
#[inline]
pub fn diode_current_scalar(voltage: f64, i_s: f64, v_t: f64, max_arg: f64) -> f64 {
    i_s * safe_expm1_scalar(voltage / v_t, max_arg)
}

/// Ideal diode current evaluated element-wise.
pub fn diode_current<S, D>(voltage: &ArrayBase<S, D>, i_s: f64, v_t: f64, max_arg: f64) -> Array<f64, D>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    voltage.mapv(|v| diode_current_scalar(v, i_s, v_t, max_arg))
}

/// Diode current and small-signal conductance `dI/dV` at junction voltage `v_j`.
///
/// The conductance is saturated consistently with the clipped current:
/// it holds at `I_s * exp(max_arg) / V_T` above the bound and drops to zero
/// below it, so Newton steps stay defined for any junction voltage.
#[inline]
pub fn diode_current_and_slope(v_j: f64, i_s: f64, v_t: f64, max_arg: f64) -> (f64, f64) {
    let bound = max_arg.abs();
    let x = v_j / v_t;
    let current = i_s * safe_expm1_scalar(x, bound);
    let slope = if x > bound {
        i_s * bound.exp() / v_t
    } else if x < -bound {
        0.0
    } else {
        i_s * x.exp() / v_t
    };
    (current, slope)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn finite_for_all_finite_input(x in prop_oneof![-1e308f64..1e308, -800.0f64..800.0]) {
            prop_assert!(safe_expm1_scalar(x, DEFAULT_MAX_ARG).is_finite());
        }

        #[test]
        fn first_order_taylor_near_zero(x in -1e-10f64..1e-10) {
            let y = safe_expm1_scalar(x, DEFAULT_MAX_ARG);
            if x == 0.0 {
                prop_assert_eq!(y, 0.0);
            } else {
                prop_assert!(((y - x) / x).abs() < 1e-8);
            }
        }

        #[test]
        fn bounded_below_for_negative_arguments(x in -1e300f64..-10.0) {
            let y = safe_expm1_scalar(x, DEFAULT_MAX_ARG);
            prop_assert!(y >= -1.0);
            prop_assert!(y < 0.0);
        }
    }
}
