//! Error types for the junction evaluation core.
//!
//! This module provides a unified error type [`JunctionError`] that covers
//! invalid arguments, root-bracket precondition failures, and numerical
//! non-convergence. Soft degradations (a missing acceleration backend) are
//! not errors; see [`crate::numerics::BackendResolution`].

use thiserror::Error;

/// Result type alias using [`JunctionError`].
pub type Result<T> = std::result::Result<T, JunctionError>;

/// Unified error type for all junction core operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JunctionError {
    // ============ Invalid Arguments ============
    /// Backend name not recognized
    #[error("Unknown backend: '{name}'. Use 'auto', 'reference', 'vectorized', or 'parallel'")]
    UnknownBackend { name: String },

    /// Solver method name not recognized
    #[error("Unsupported method: '{name}'. Use 'bracket' or 'open'")]
    UnknownMethod { name: String },

    /// Search range is empty, inverted, or NaN
    #[error("voltage_range must be (v_min, v_max) with v_min < v_max, got ({lo}, {hi})")]
    InvalidRange { lo: f64, hi: f64 },

    /// Invalid model or solver parameter
    #[error("Invalid parameter '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    /// Voltage and current arrays disagree in shape
    #[error("Shape mismatch: voltage has shape {voltage:?}, current has shape {current:?}")]
    ShapeMismatch {
        voltage: Vec<usize>,
        current: Vec<usize>,
    },

    /// Tolerance outside the range the method can honor
    #[error("Invalid tolerance: {message}")]
    InvalidTolerance { message: String },

    // ============ Preconditions ============
    /// Bracket endpoints do not enclose a sign change
    #[error("Function values at endpoints must have opposite signs: f({a}) = {fa:e}, f({b}) = {fb:e}")]
    NoSignChange { a: f64, b: f64, fa: f64, fb: f64 },

    // ============ Non-convergence ============
    /// Iteration budget exhausted
    #[error("Failed to converge after {iterations} iterations (residual: {residual:.2e})")]
    ConvergenceFailure { iterations: usize, residual: f64 },

    /// Newton step undefined
    #[error("Derivative was zero at x = {x}")]
    ZeroDerivative { x: f64 },

    /// Objective or derivative produced NaN or infinity
    #[error("Non-finite value encountered at x = {x}")]
    NonFiniteValue { x: f64 },

    // ============ Wrapped failures ============
    /// Uniform wrapper reported by the root finders
    #[error("Root finding failed: {source}")]
    RootFindingFailed {
        #[source]
        source: Box<JunctionError>,
    },

    /// Newton and its secant fallback both failed
    #[error("Both Newton's and secant methods failed: newton: {newton}; secant: {secant}")]
    NewtonAndSecantFailed {
        newton: Box<JunctionError>,
        #[source]
        secant: Box<JunctionError>,
    },
}

impl JunctionError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidParameter {
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create an invalid tolerance error
    pub fn invalid_tolerance(message: impl Into<String>) -> Self {
        Self::InvalidTolerance {
            message: message.into(),
        }
    }

    /// Create a convergence failure error
    pub fn convergence_failure(iterations: usize, residual: f64) -> Self {
        Self::ConvergenceFailure {
            iterations,
            residual,
        }
    }

    /// Wrap a failure in the uniform root-finding error.
    pub fn root_finding_failed(source: JunctionError) -> Self {
        Self::RootFindingFailed {
            source: Box::new(source),
        }
    }

    /// True for caller-side mistakes that are reported before any numeric work.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Self::UnknownBackend { .. }
                | Self::UnknownMethod { .. }
                | Self::InvalidRange { .. }
                | Self::InvalidParameter { .. }
                | Self::ShapeMismatch { .. }
                | Self::InvalidTolerance { .. }
        )
    }

    /// The innermost cause, looking through the wrapper variants.
    pub fn root_cause(&self) -> &JunctionError {
        match self {
            Self::RootFindingFailed { source } => source.root_cause(),
            Self::NewtonAndSecantFailed { secant, .. } => secant.root_cause(),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_cause_unwraps_nested() {
        let inner = JunctionError::NoSignChange {
            a: 0.0,
            b: 1.0,
            fa: 1.0,
            fb: 2.0,
        };
        let err = JunctionError::root_finding_failed(inner.clone());
        assert_eq!(err.root_cause(), &inner);
        assert!(err.to_string().starts_with("Root finding failed"));
    }

    #[test]
    fn test_invalid_argument_classification() {
        assert!(JunctionError::InvalidRange { lo: 2.0, hi: 1.0 }.is_invalid_argument());
        assert!(!JunctionError::convergence_failure(100, 1e-3).is_invalid_argument());
    }
}
