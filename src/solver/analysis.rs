//! IV-curve inversion and load-line intersection.

use std::fmt;
use std::str::FromStr;

use super::bracket::{robust_bracket_solve, BracketOptions};
use super::open::{robust_open_solve, OpenOptions};
use crate::error::{JunctionError, Result};

/// Search range used when the caller has no better bound.
pub const DEFAULT_VOLTAGE_RANGE: (f64, f64) = (-2.0, 2.0);

/// Root-finding strategy for the composed solvers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolveMethod {
    /// Brent's method over the voltage range
    #[default]
    Bracket,
    /// Newton/secant from an initial guess
    Open,
}

impl SolveMethod {
    /// Parse from a string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "bracket" | "brent" => Some(Self::Bracket),
            "open" | "newton" | "secant" => Some(Self::Open),
            _ => None,
        }
    }
}

impl FromStr for SolveMethod {
    type Err = JunctionError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s).ok_or_else(|| JunctionError::UnknownMethod {
            name: s.to_string(),
        })
    }
}

impl fmt::Display for SolveMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SolveMethod::Bracket => f.write_str("bracket"),
            SolveMethod::Open => f.write_str("open"),
        }
    }
}

/// Derivative of the scalar objective, for Newton's method.
pub type Derivative<'a> = &'a dyn Fn(f64) -> f64;

/// Options forwarded to the underlying root finder.
///
/// `fprime` and `fprime2` are derivatives of the objective being zeroed:
/// `iv'(V)` for [`find_voltage_for_current`] and `iv'(V) - load'(V)` for
/// [`find_operating_point`]. They are used by [`SolveMethod::Open`] only;
/// without `fprime` the open method runs the secant method.
#[derive(Clone, Copy, Default)]
pub struct SolveOptions<'a> {
    pub bracket: BracketOptions,
    pub open: OpenOptions,
    /// Initial guess for [`SolveMethod::Open`]; defaults to the range midpoint
    pub x0: Option<f64>,
    pub fprime: Option<Derivative<'a>>,
    pub fprime2: Option<Derivative<'a>>,
}

impl fmt::Debug for SolveOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SolveOptions")
            .field("bracket", &self.bracket)
            .field("open", &self.open)
            .field("x0", &self.x0)
            .field("fprime", &self.fprime.is_some())
            .field("fprime2", &self.fprime2.is_some())
            .finish()
    }
}

impl<'a> SolveOptions<'a> {
    /// Set the open-method initial guess.
    pub fn with_x0(mut self, x0: f64) -> Self {
        self.x0 = Some(x0);
        self
    }

    /// Set the bracketed-method options.
    pub fn with_bracket(mut self, bracket: BracketOptions) -> Self {
        self.bracket = bracket;
        self
    }

    /// Set the open-method options.
    pub fn with_open(mut self, open: OpenOptions) -> Self {
        self.open = open;
        self
    }

    /// Supply the first derivative of the objective.
    pub fn with_fprime(mut self, fprime: Derivative<'a>) -> Self {
        self.fprime = Some(fprime);
        self
    }

    /// Supply the second derivative of the objective (Halley correction).
    pub fn with_fprime2(mut self, fprime2: Derivative<'a>) -> Self {
        self.fprime2 = Some(fprime2);
        self
    }
}

fn check_range(range: (f64, f64)) -> Result<()> {
    let (lo, hi) = range;
    // NaN fails the comparison too
    if !(lo < hi) {
        return Err(JunctionError::InvalidRange { lo, hi });
    }
    Ok(())
}

fn solve<F: Fn(f64) -> f64>(
    objective: F,
    range: (f64, f64),
    method: SolveMethod,
    options: &SolveOptions,
) -> Result<f64> {
    match method {
        SolveMethod::Bracket => robust_bracket_solve(objective, range.0, range.1, &options.bracket),
        SolveMethod::Open => {
            let x0 = options.x0.unwrap_or((range.0 + range.1) / 2.0);
            robust_open_solve(objective, x0, options.fprime, options.fprime2, &options.open)
        }
    }
}

/// Find the voltage at which `iv_func` delivers `target_current`.
pub fn find_voltage_for_current<F>(
    iv_func: F,
    target_current: f64,
    voltage_range: (f64, f64),
    method: SolveMethod,
    options: &SolveOptions,
) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    check_range(voltage_range)?;
    solve(|v| iv_func(v) - target_current, voltage_range, method, options)
}

/// Find where a device characteristic meets a load line.
///
/// Returns `(V_op, I_op)` with `I_op = iv_func(V_op)`.
pub fn find_operating_point<F, G>(
    iv_func: F,
    load_line: G,
    voltage_range: (f64, f64),
    method: SolveMethod,
    options: &SolveOptions,
) -> Result<(f64, f64)>
where
    F: Fn(f64) -> f64,
    G: Fn(f64) -> f64,
{
    check_range(voltage_range)?;
    let v_op = solve(|v| iv_func(v) - load_line(v), voltage_range, method, options)?;
    Ok((v_op, iv_func(v_op)))
}
