//! # Junction Core
//!
//! Numerics core for simulating the current-voltage behavior of
//! semiconductor junction devices.
//!
//! This library provides:
//! - Overflow-safe evaluation of `exp(x) - 1` for diode-type equations
//! - Backend selection for the bulk kernels, with graceful degradation
//! - A batched implicit solver for series/shunt parasitic resistances
//! - Robust scalar root finding, IV inversion and load-line analysis
//!
//! ## Architecture
//!
//! - [`numerics`] - safe exponentials and evaluation backends
//! - [`solver`] - Newton-Raphson terminal solvers and root finders
//! - [`components`] - diode models built on the two above
//! - [`error`] - the crate error type
//!
//! ## Usage
//!
//! ```no_run
//! use junction_core::components::{Diode, DiodeParams, ParasiticConfig};
//! use junction_core::solver::{find_voltage_for_current, SolveMethod, SolveOptions};
//!
//! let diode = Diode::new(DiodeParams::silicon(), ParasiticConfig::new(2.0, 1e5))?;
//! let v = find_voltage_for_current(
//!     |v| diode.current(v),
//!     1e-3,
//!     (0.0, 1.0),
//!     SolveMethod::Bracket,
//!     &SolveOptions::default(),
//! )?;
//! println!("1 mA at {:.4} V", v);
//! # Ok::<(), junction_core::JunctionError>(())
//! ```
//!
//! ### Native CLI
//!
//! ```bash
//! junction iv --start -0.2 --stop 0.8 --points 101 --rs 5
//! junction op --supply 5 --load 1000
//! ```

pub mod components;
pub mod error;
pub mod numerics;
pub mod solver;

// Re-export main types for convenience
pub use components::{Diode, DiodeParams, ParasiticConfig, SchottkyDiode, SchottkyParams};
pub use error::{JunctionError, Result};
pub use numerics::{safe_expm1, select_backend, AccelerationSelector, Backend, BackendRequest, Capabilities};
pub use solver::{
    apply_parasitics, find_operating_point, find_voltage_for_current, robust_bracket_solve, robust_open_solve,
};
