//! Junction voltage behind a series resistance.
//!
//! For a junction in series with `R_s` the applied voltage splits as
//!   V = V_j + I_s * (exp(V_j / V_T) - 1) * R_s
//!
//! and `V_j` is found per sample by Newton-Raphson. The residual is convex
//! and increasing in `V_j`, so Newton converges from either side once the
//! starting point is within reach. For forward bias the current cannot exceed
//! `V / R_s`, which bounds the start at `V_T * ln(1 + V / (R_s * I_s))`.

use ndarray::{Array, ArrayBase, Data, Dimension, Zip};

use super::{JUNCTION_TOLERANCE, MAX_JUNCTION_ITERATIONS};
use crate::error::{JunctionError, Result};
use crate::numerics::{diode_current_and_slope, diode_current_scalar, DEFAULT_MAX_ARG};

/// Junction voltages and currents for a series-resistance junction.
#[derive(Debug, Clone, PartialEq)]
pub struct JunctionSolution<D: Dimension> {
    /// Voltage across the ideal junction
    pub junction_voltage: Array<f64, D>,
    /// Current through the junction and the resistor
    pub current: Array<f64, D>,
    /// Whether each sample met the convergence criterion
    pub converged: Array<bool, D>,
    /// Batched Newton iterations performed
    pub iterations: usize,
}

impl<D: Dimension> JunctionSolution<D> {
    pub fn all_converged(&self) -> bool {
        self.converged.iter().all(|&c| c)
    }
}

/// Solve `V = V_j + I(V_j) * R_s` for every applied voltage sample.
pub fn solve_junction_voltage<S, D>(
    voltage: &ArrayBase<S, D>,
    i_s: f64,
    v_t: f64,
    r_s: f64,
) -> Result<JunctionSolution<D>>
where
    S: Data<Elem = f64>,
    D: Dimension,
{
    if !i_s.is_finite() || i_s <= 0.0 {
        return Err(JunctionError::invalid_parameter(
            "i_s",
            format!("must be a positive finite value (A), got {}", i_s),
        ));
    }
    if !v_t.is_finite() || v_t <= 0.0 {
        return Err(JunctionError::invalid_parameter(
            "v_t",
            format!("must be a positive finite value (V), got {}", v_t),
        ));
    }
    if !r_s.is_finite() || r_s < 0.0 {
        return Err(JunctionError::invalid_parameter(
            "r_s",
            format!("must be a non-negative finite value (Ohm), got {}", r_s),
        ));
    }

    let mut junction_voltage = voltage.mapv(|v| initial_junction_voltage(v, i_s, v_t, r_s));
    let mut converged = Array::from_elem(voltage.raw_dim(), r_s == 0.0);
    let mut active = if r_s == 0.0 { 0 } else { voltage.len() };
    let mut iterations = 0;

    while active > 0 && iterations < MAX_JUNCTION_ITERATIONS {
        iterations += 1;
        Zip::from(&mut junction_voltage)
            .and(&mut converged)
            .and(voltage)
            .for_each(|v_j, done, &v| {
                if *done {
                    return;
                }
                let (i, g) = diode_current_and_slope(*v_j, i_s, v_t, DEFAULT_MAX_ARG);
                let f = *v_j + i * r_s - v;
                if f.abs() < JUNCTION_TOLERANCE {
                    *done = true;
                    active -= 1;
                    return;
                }
                *v_j -= f / (1.0 + r_s * g);
            });
    }

    if active > 0 {
        log::debug!(
            "Junction solve: {} of {} samples unconverged after {} iterations",
            active,
            voltage.len(),
            iterations
        );
    }

    let current = junction_voltage.mapv(|v_j| diode_current_scalar(v_j, i_s, v_t, DEFAULT_MAX_ARG));
    Ok(JunctionSolution {
        junction_voltage,
        current,
        converged,
        iterations,
    })
}

fn initial_junction_voltage(v: f64, i_s: f64, v_t: f64, r_s: f64) -> f64 {
    if r_s > 0.0 && v > 0.0 {
        v.min(v_t * (v / (r_s * i_s)).ln_1p())
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::{array, Array};

    #[test]
    fn test_zero_resistance_is_direct() {
        let v = array![-0.2, 0.1, 0.3];
        let sol = solve_junction_voltage(&v, 1e-8, 0.026, 0.0).unwrap();
        assert_eq!(sol.junction_voltage, v);
        assert_eq!(sol.iterations, 0);
        assert!(sol.all_converged());
    }

    #[test]
    fn test_voltage_split_is_consistent() {
        let (i_s, v_t, r_s) = (1e-8, 0.02585, 10.0);
        let v = Array::linspace(-0.5, 1.5, 41);
        let sol = solve_junction_voltage(&v, i_s, v_t, r_s).unwrap();
        assert!(sol.all_converged());
        for ((&vk, &vj), &ik) in v.iter().zip(sol.junction_voltage.iter()).zip(sol.current.iter()) {
            assert_abs_diff_eq!(vj + ik * r_s, vk, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_high_bias_approaches_resistor_limit() {
        let (i_s, v_t, r_s) = (1e-8, 0.026, 100.0);
        let v = array![10.0];
        let sol = solve_junction_voltage(&v, i_s, v_t, r_s).unwrap();
        assert!(sol.all_converged());
        let i = sol.current[0];
        assert!(i < 10.0 / r_s);
        assert_relative_eq!(i, (10.0 - sol.junction_voltage[0]) / r_s, max_relative = 1e-9);
    }

    #[test]
    fn test_invalid_parameters() {
        let v = array![0.1];
        assert!(solve_junction_voltage(&v, 0.0, 0.026, 1.0).is_err());
        assert!(solve_junction_voltage(&v, 1e-8, -0.026, 1.0).is_err());
        assert!(solve_junction_voltage(&v, 1e-8, 0.026, f64::NAN).is_err());
    }
}
