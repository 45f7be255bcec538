//! Series and shunt resistance coupling.
//!
//! With parasitics the terminal current is implicit:
//!   I = I_s * (exp((V - I*R_s) / V_T) - 1) + V / R_sh
//!
//! Each sample is solved by Newton-Raphson on
//!   f(I)  = I - I_d(V - I*R_s) - V/R_sh
//!   f'(I) = 1 + R_s * dI_d/dV_j
//!
//! All samples advance together; a sample leaves the batch once it has
//! converged or its Jacobian has degenerated.

use ndarray::{Array, ArrayBase, Data, Dimension, Zip};

use super::{
    CURRENT_FLOOR, MAX_PARASITIC_ITERATIONS, MIN_JACOBIAN, PARASITIC_RELATIVE_STEP,
};
use crate::error::{JunctionError, Result};
use crate::numerics::{diode_current_and_slope, DEFAULT_MAX_ARG};

/// Electrical parameters coupling an ideal junction to its terminals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParasiticParams {
    /// Series resistance (Ohm), finite and non-negative
    pub r_s: f64,
    /// Shunt resistance (Ohm), positive; `f64::INFINITY` for none
    pub r_sh: f64,
    /// Saturation current (A)
    pub i_s: f64,
    /// Thermal voltage including ideality factor (V)
    pub v_t: f64,
    /// Clipping bound for the normalized exponent
    pub max_arg: f64,
}

impl ParasiticParams {
    /// Create parameters with the default clipping bound.
    pub fn new(r_s: f64, r_sh: f64, i_s: f64, v_t: f64) -> Self {
        Self {
            r_s,
            r_sh,
            i_s,
            v_t,
            max_arg: DEFAULT_MAX_ARG,
        }
    }

    /// Set the clipping bound.
    pub fn with_max_arg(mut self, max_arg: f64) -> Self {
        self.max_arg = max_arg;
        self
    }

    /// True when the terminal current equals the ideal current exactly.
    pub fn is_ideal(&self) -> bool {
        self.r_s == 0.0 && self.r_sh == f64::INFINITY
    }

    /// Check that the parameters describe a physical device.
    pub fn validate(&self) -> Result<()> {
        if !self.r_s.is_finite() || self.r_s < 0.0 {
            return Err(JunctionError::invalid_parameter(
                "r_s",
                format!("must be a non-negative finite value (Ohm), got {}", self.r_s),
            ));
        }
        if self.r_sh.is_nan() || self.r_sh <= 0.0 {
            return Err(JunctionError::invalid_parameter(
                "r_sh",
                format!("must be a positive value (Ohm), got {}", self.r_sh),
            ));
        }
        if !self.v_t.is_finite() || self.v_t <= 0.0 {
            return Err(JunctionError::invalid_parameter(
                "v_t",
                format!("must be a positive finite value (V), got {}", self.v_t),
            ));
        }
        if !self.i_s.is_finite() {
            return Err(JunctionError::invalid_parameter(
                "i_s",
                format!("must be finite (A), got {}", self.i_s),
            ));
        }
        Ok(())
    }
}

/// Terminal currents together with per-sample convergence.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalSolution<D: Dimension> {
    /// Terminal current, same shape as the voltage input
    pub current: Array<f64, D>,
    /// Whether each sample met the convergence criterion
    pub converged: Array<bool, D>,
    /// Batched Newton iterations performed
    pub iterations: usize,
}

impl<D: Dimension> TerminalSolution<D> {
    pub fn all_converged(&self) -> bool {
        self.converged.iter().all(|&c| c)
    }

    pub fn unconverged_count(&self) -> usize {
        self.converged.iter().filter(|&&c| !c).count()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SampleStatus {
    Active,
    Converged,
    Stalled,
}

/// Resolve terminal currents and report which samples converged.
///
/// `current_ideal` is the parasitic-free current at each terminal voltage
/// and seeds the iteration. Samples still unconverged after
/// [`MAX_PARASITIC_ITERATIONS`] keep their last estimate.
pub fn solve_terminal_current<S1, S2, D>(
    voltage: &ArrayBase<S1, D>,
    current_ideal: &ArrayBase<S2, D>,
    params: &ParasiticParams,
) -> Result<TerminalSolution<D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    params.validate()?;
    if voltage.shape() != current_ideal.shape() {
        return Err(JunctionError::ShapeMismatch {
            voltage: voltage.shape().to_vec(),
            current: current_ideal.shape().to_vec(),
        });
    }

    if params.is_ideal() {
        return Ok(TerminalSolution {
            current: current_ideal.to_owned(),
            converged: Array::from_elem(voltage.raw_dim(), true),
            iterations: 0,
        });
    }

    let mut current = current_ideal.to_owned();
    let mut status = Array::from_elem(voltage.raw_dim(), SampleStatus::Active);
    let mut active = voltage.len();
    let mut iterations = 0;

    while active > 0 && iterations < MAX_PARASITIC_ITERATIONS {
        iterations += 1;
        Zip::from(&mut current)
            .and(&mut status)
            .and(voltage)
            .for_each(|i, st, &v| {
                if *st != SampleStatus::Active {
                    return;
                }
                let next = newton_step(v, *i, params);
                *i = next.0;
                if next.1 != SampleStatus::Active {
                    *st = next.1;
                    active -= 1;
                }
            });
    }

    let converged = status.mapv(|s| s == SampleStatus::Converged);
    let solution = TerminalSolution {
        current,
        converged,
        iterations,
    };
    log::debug!(
        "Terminal solve: {} samples, {} iterations, {} unconverged",
        voltage.len(),
        solution.iterations,
        solution.unconverged_count()
    );
    Ok(solution)
}

/// One Newton update of the terminal current for a single sample.
fn newton_step(v: f64, i: f64, params: &ParasiticParams) -> (f64, SampleStatus) {
    let v_j = v - i * params.r_s;
    let (i_d, g_d) = diode_current_and_slope(v_j, params.i_s, params.v_t, params.max_arg);
    let i_shunt = v / params.r_sh;

    let f = i - i_d - i_shunt;
    if f.abs() <= f64::EPSILON * i.abs().max(CURRENT_FLOOR) {
        return (i, SampleStatus::Converged);
    }

    let jacobian = 1.0 + params.r_s * g_d;
    // NaN also stalls here
    if !(jacobian.abs() >= MIN_JACOBIAN) {
        return (i, SampleStatus::Stalled);
    }

    let step = f / jacobian;
    let next = i - step;
    if step.abs() / i.abs().max(CURRENT_FLOOR) < PARASITIC_RELATIVE_STEP {
        (next, SampleStatus::Converged)
    } else {
        (next, SampleStatus::Active)
    }
}

/// Terminal currents with series/shunt resistance applied.
///
/// Returns `current_ideal` unchanged when `R_s == 0` and `R_sh` is infinite.
/// Use [`solve_terminal_current`] to learn whether every sample converged.
pub fn apply_parasitics<S1, S2, D>(
    voltage: &ArrayBase<S1, D>,
    current_ideal: &ArrayBase<S2, D>,
    params: &ParasiticParams,
) -> Result<Array<f64, D>>
where
    S1: Data<Elem = f64>,
    S2: Data<Elem = f64>,
    D: Dimension,
{
    solve_terminal_current(voltage, current_ideal, params).map(|s| s.current)
}
