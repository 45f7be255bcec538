//! Iterative solvers for implicit junction equations.
//!
//! This module provides the nonlinear solvers used around the ideal diode law.
//!
//! ## Per-sample Newton-Raphson
//!
//! Parasitic resistances make the terminal relation implicit:
//! ```text
//! I = I_s * (exp((V - I*R_s) / V_T) - 1) + V / R_sh      (parasitics)
//! V = V_j + I_s * (exp(V_j / V_T) - 1) * R_s             (series junction)
//! ```
//!
//! Both are solved for every voltage sample with a batched Newton-Raphson
//! loop. Samples drop out of the batch as they converge. These solvers
//! never fail on non-convergence; they report it per sample instead.
//!
//! ## Scalar root finding
//!
//! - [`robust_bracket_solve`] - Brent's method on a sign-changing bracket
//! - [`robust_open_solve`] - Newton/Halley with secant fallback
//! - [`find_voltage_for_current`], [`find_operating_point`] - IV inversion
//!   and load-line intersection built on the two above

mod analysis;
mod bracket;
mod junction;
mod open;
mod parasitics;

pub use analysis::{
    find_operating_point, find_voltage_for_current, SolveMethod, SolveOptions,
    DEFAULT_VOLTAGE_RANGE,
};
pub use bracket::{robust_bracket_solve, BracketOptions};
pub use junction::{solve_junction_voltage, JunctionSolution};
pub use open::{robust_open_solve, OpenOptions};
pub use parasitics::{apply_parasitics, solve_terminal_current, ParasiticParams, TerminalSolution};

/// Maximum Newton iterations for the parasitic terminal solve.
pub const MAX_PARASITIC_ITERATIONS: usize = 20;

/// Relative step below which a terminal current is converged.
pub const PARASITIC_RELATIVE_STEP: f64 = 1e-12;

/// Floor on |I| when forming relative steps (A).
pub const CURRENT_FLOOR: f64 = 1e-15;

/// Jacobian magnitude below which a Newton step is not attempted.
pub const MIN_JACOBIAN: f64 = 1e-15;

/// Maximum Newton iterations for the series junction solve.
pub const MAX_JUNCTION_ITERATIONS: usize = 50;

/// Voltage residual at which a junction solve is converged (V).
pub const JUNCTION_TOLERANCE: f64 = 1e-12;

/// Default absolute tolerance for Brent's method.
pub const DEFAULT_XTOL: f64 = 1e-12;

/// Default relative tolerance for Brent's method.
pub const DEFAULT_RTOL: f64 = 1e-12;

/// Default iteration limit for Brent's method.
pub const DEFAULT_BRACKET_MAXITER: usize = 100;

/// Default step tolerance for Newton/secant.
pub const DEFAULT_OPEN_TOL: f64 = 1.48e-8;

/// Default iteration limit for Newton/secant.
pub const DEFAULT_OPEN_MAXITER: usize = 50;

/// Relative/absolute offset of the secant method's second point.
pub const SECANT_PERTURBATION: f64 = 1e-4;
