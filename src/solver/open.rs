//! Open (unbracketed) scalar root finding.
//!
//! - Newton-Raphson when a derivative is supplied, with Halley's correction
//!   when a second derivative is supplied as well
//! - Secant method otherwise
//!
//! A hand-written derivative is easy to get wrong, so a failed Newton solve
//! is retried once with the secant method before giving up.

use super::{DEFAULT_OPEN_MAXITER, DEFAULT_OPEN_TOL, SECANT_PERTURBATION};
use crate::error::{JunctionError, Result};

/// Tolerances for [`robust_open_solve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OpenOptions {
    /// Absolute tolerance on successive iterates
    pub tol: f64,
    /// Maximum iterations
    pub maxiter: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            tol: DEFAULT_OPEN_TOL,
            maxiter: DEFAULT_OPEN_MAXITER,
        }
    }
}

impl OpenOptions {
    /// Set the tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set the iteration limit.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.tol > 0.0) {
            return Err(JunctionError::invalid_tolerance(format!(
                "tol must be positive, got {}",
                self.tol
            )));
        }
        Ok(())
    }
}

/// Find a root of `f` starting from `x0`.
///
/// With `fprime`, Newton-Raphson is tried first and the secant method is the
/// fallback; if both fail the error is
/// [`JunctionError::NewtonAndSecantFailed`]. Without `fprime` the secant
/// method runs alone and failures are wrapped in
/// [`JunctionError::RootFindingFailed`].
pub fn robust_open_solve<F>(
    f: F,
    x0: f64,
    fprime: Option<&dyn Fn(f64) -> f64>,
    fprime2: Option<&dyn Fn(f64) -> f64>,
    options: &OpenOptions,
) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    options
        .validate()
        .map_err(JunctionError::root_finding_failed)?;

    let Some(fprime) = fprime else {
        return secant(&f, x0, options).map_err(JunctionError::root_finding_failed);
    };

    match newton(&f, x0, fprime, fprime2, options) {
        Ok(root) => Ok(root),
        Err(newton_err) => {
            log::warn!(
                "Newton's method failed ({}), falling back to secant method",
                newton_err
            );
            secant(&f, x0, options).map_err(|secant_err| JunctionError::NewtonAndSecantFailed {
                newton: Box::new(newton_err),
                secant: Box::new(secant_err),
            })
        }
    }
}

fn newton<F: Fn(f64) -> f64>(
    f: &F,
    x0: f64,
    fprime: &dyn Fn(f64) -> f64,
    fprime2: Option<&dyn Fn(f64) -> f64>,
    options: &OpenOptions,
) -> Result<f64> {
    let mut p0 = x0;
    for _ in 0..options.maxiter {
        let fval = f(p0);
        if fval == 0.0 {
            return Ok(p0);
        }
        let fder = fprime(p0);
        if !fval.is_finite() || !fder.is_finite() {
            return Err(JunctionError::NonFiniteValue { x: p0 });
        }
        if fder == 0.0 {
            return Err(JunctionError::ZeroDerivative { x: p0 });
        }

        let mut step = fval / fder;
        if let Some(fprime2) = fprime2 {
            let adj = step * fprime2(p0) / fder / 2.0;
            // Halley correction only while it stays a contraction
            if adj.abs() < 1.0 {
                step /= 1.0 - adj;
            }
        }

        let p = p0 - step;
        if !p.is_finite() {
            return Err(JunctionError::NonFiniteValue { x: p0 });
        }
        if (p - p0).abs() <= options.tol {
            return Ok(p);
        }
        p0 = p;
    }
    Err(JunctionError::convergence_failure(options.maxiter, f(p0).abs()))
}

fn secant<F: Fn(f64) -> f64>(f: &F, x0: f64, options: &OpenOptions) -> Result<f64> {
    let mut p0 = x0;
    let mut p1 = x0 * (1.0 + SECANT_PERTURBATION);
    p1 += if p1 >= 0.0 {
        SECANT_PERTURBATION
    } else {
        -SECANT_PERTURBATION
    };

    let mut q0 = f(p0);
    let mut q1 = f(p1);
    if q1.abs() < q0.abs() {
        std::mem::swap(&mut p0, &mut p1);
        std::mem::swap(&mut q0, &mut q1);
    }

    for _ in 0..options.maxiter {
        if !q0.is_finite() || !q1.is_finite() {
            return Err(JunctionError::NonFiniteValue { x: p1 });
        }
        if q1 == 0.0 {
            return Ok(p1);
        }
        if q1 == q0 {
            // Flat secant: accept only if the points already agree
            if (p1 - p0).abs() <= options.tol {
                return Ok((p1 + p0) / 2.0);
            }
            return Err(JunctionError::ZeroDerivative { x: p1 });
        }

        let p = if q1.abs() > q0.abs() {
            (-q0 / q1 * p1 + p0) / (1.0 - q0 / q1)
        } else {
            (-q1 / q0 * p0 + p1) / (1.0 - q1 / q0)
        };
        if (p - p1).abs() <= options.tol {
            return Ok(p);
        }
        p0 = p1;
        q0 = q1;
        p1 = p;
        q1 = f(p1);
    }
    Err(JunctionError::convergence_failure(options.maxiter, q1.abs()))
}
