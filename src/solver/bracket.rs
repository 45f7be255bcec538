//! Bracketed scalar root finding (Brent's method).
//!
//! Given `f(a)` and `f(b)` of opposite sign, each iteration tries an inverse
//! quadratic interpolation (or a secant step when only two distinct points
//! are known) and falls back to bisection whenever the interpolated step
//! would leave the bracket or shrink it too slowly. Convergence within the
//! bracket is guaranteed.

use super::{DEFAULT_BRACKET_MAXITER, DEFAULT_RTOL, DEFAULT_XTOL};
use crate::error::{JunctionError, Result};

/// Tolerances for [`robust_bracket_solve`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BracketOptions {
    /// Absolute tolerance on the root
    pub xtol: f64,
    /// Relative tolerance on the root
    pub rtol: f64,
    /// Maximum iterations
    pub maxiter: usize,
}

impl Default for BracketOptions {
    fn default() -> Self {
        Self {
            xtol: DEFAULT_XTOL,
            rtol: DEFAULT_RTOL,
            maxiter: DEFAULT_BRACKET_MAXITER,
        }
    }
}

impl BracketOptions {
    /// Set the absolute tolerance.
    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.xtol = xtol;
        self
    }

    /// Set the relative tolerance.
    pub fn with_rtol(mut self, rtol: f64) -> Self {
        self.rtol = rtol;
        self
    }

    /// Set the iteration limit.
    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = maxiter;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.xtol > 0.0) {
            return Err(JunctionError::invalid_tolerance(format!(
                "xtol must be positive, got {}",
                self.xtol
            )));
        }
        if !(self.rtol >= 4.0 * f64::EPSILON) {
            return Err(JunctionError::invalid_tolerance(format!(
                "rtol must be at least {:e}, got {}",
                4.0 * f64::EPSILON,
                self.rtol
            )));
        }
        Ok(())
    }
}

/// Find a root of `f` in `[a, b]`.
///
/// `f(a)` and `f(b)` must differ in sign (either may be zero). Every failure,
/// including a missing sign change, is reported as
/// [`JunctionError::RootFindingFailed`] wrapping the cause.
pub fn robust_bracket_solve<F>(f: F, a: f64, b: f64, options: &BracketOptions) -> Result<f64>
where
    F: Fn(f64) -> f64,
{
    brent(&f, a, b, options).map_err(JunctionError::root_finding_failed)
}

fn checked<F: Fn(f64) -> f64>(f: &F, x: f64) -> Result<f64> {
    let y = f(x);
    if y.is_finite() {
        Ok(y)
    } else {
        Err(JunctionError::NonFiniteValue { x })
    }
}

fn brent<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64, options: &BracketOptions) -> Result<f64> {
    options.validate()?;

    let mut xpre = a;
    let mut xcur = b;
    let mut fpre = checked(f, xpre)?;
    let mut fcur = checked(f, xcur)?;

    // Compare signs directly; the product of tiny values underflows to zero
    if fpre != 0.0 && fcur != 0.0 && fpre.is_sign_negative() == fcur.is_sign_negative() {
        return Err(JunctionError::NoSignChange {
            a,
            b,
            fa: fpre,
            fb: fcur,
        });
    }
    if fpre == 0.0 {
        return Ok(xpre);
    }
    if fcur == 0.0 {
        return Ok(xcur);
    }

    // Contrapoint: f(xblk) has the opposite sign of f(xcur)
    let mut xblk = 0.0;
    let mut fblk = 0.0;
    let mut spre = 0.0;
    let mut scur = 0.0;

    for iteration in 0..options.maxiter {
        if fpre != 0.0 && fcur != 0.0 && fpre.is_sign_negative() != fcur.is_sign_negative() {
            xblk = xpre;
            fblk = fpre;
            spre = xcur - xpre;
            scur = spre;
        }
        if fblk.abs() < fcur.abs() {
            xpre = xcur;
            xcur = xblk;
            xblk = xpre;

            fpre = fcur;
            fcur = fblk;
            fblk = fpre;
        }

        let delta = (options.xtol + options.rtol * xcur.abs()) / 2.0;
        let sbis = (xblk - xcur) / 2.0;
        if fcur == 0.0 || sbis.abs() < delta {
            log::debug!("Brent converged in {} iterations: x = {:e}", iteration, xcur);
            return Ok(xcur);
        }

        if spre.abs() > delta && fcur.abs() < fpre.abs() {
            let stry = if xpre == xblk {
                // Secant
                -fcur * (xcur - xpre) / (fcur - fpre)
            } else {
                // Inverse quadratic interpolation
                let dpre = (fpre - fcur) / (xpre - xcur);
                let dblk = (fblk - fcur) / (xblk - xcur);
                -fcur * (fblk * dblk - fpre * dpre) / (dblk * dpre * (fblk - fpre))
            };

            if 2.0 * stry.abs() < spre.abs().min(3.0 * sbis.abs() - delta) {
                spre = scur;
                scur = stry;
            } else {
                spre = sbis;
                scur = sbis;
            }
        } else {
            spre = sbis;
            scur = sbis;
        }

        xpre = xcur;
        fpre = fcur;
        if scur.abs() > delta {
            xcur += scur;
        } else {
            xcur += if sbis > 0.0 { delta } else { -delta };
        }
        fcur = checked(f, xcur)?;
    }

    Err(JunctionError::convergence_failure(options.maxiter, fcur.abs()))
}
