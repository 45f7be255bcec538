//! Numerically safe evaluation primitives.
//!
//! The exponential in the ideal diode law spans hundreds of decades over a
//! normal voltage sweep. This module keeps every evaluation finite by
//! clipping the normalized exponent, and lets callers pick an evaluation
//! backend without changing results.
//!
//! - [`safe_expm1`] / [`diode_current`] - reference element-wise kernels
//! - [`AccelerationSelector`] - resolves `auto`/named backends to kernels
//! - `lanes` - the straight-line `expm1` behind the vectorized backend

mod backend;
mod expm1;
mod lanes;

pub use backend::{
    select_backend, AccelerationSelector, Backend, BackendRequest, BackendResolution,
    Capabilities, DiodeCurrentKernel, Expm1Kernel, KernelKind, Selection,
};
pub use expm1::{
    clip_exponent, diode_current, diode_current_and_slope, diode_current_scalar, safe_expm1,
    safe_expm1_scalar, DEFAULT_MAX_ARG,
};
pub use lanes::{LANES, LANE_MAX_ARG};
