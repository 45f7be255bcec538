//! End-to-end tests through the public API.
//!
//! Covers the solver entry points on textbook problems and the diode models
//! built on top of them.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use junction_core::components::{Diode, DiodeParams, ParasiticConfig, SchottkyDiode, SchottkyParams};
use junction_core::numerics::{
    safe_expm1, AccelerationSelector, Backend, BackendRequest, Capabilities, DiodeCurrentKernel, DEFAULT_MAX_ARG,
};
use junction_core::solver::{
    apply_parasitics, find_operating_point, find_voltage_for_current, robust_bracket_solve, robust_open_solve,
    BracketOptions, OpenOptions, ParasiticParams, SolveMethod, SolveOptions,
};
use junction_core::JunctionError;
use ndarray::{arr0, array, Array, Array3};

const I_S: f64 = 1e-12;
const V_T: f64 = 0.026;

fn diode_iv(v: f64) -> f64 {
    I_S * ((v / V_T).exp() - 1.0)
}

// ---------------------------------------------------------------------------
// Root finding
// ---------------------------------------------------------------------------

#[test]
fn bracketed_quadratic_root() {
    let root = robust_bracket_solve(|x| x * x - 4.0, 0.0, 5.0, &BracketOptions::default()).unwrap();
    assert_abs_diff_eq!(root, 2.0, epsilon = 1e-10);
}

#[test]
fn bracket_without_sign_change_fails() {
    let err = robust_bracket_solve(|x| x * x + 1.0, 0.0, 1.0, &BracketOptions::default()).unwrap_err();
    assert!(matches!(err, JunctionError::RootFindingFailed { .. }));
    assert!(matches!(err.root_cause(), JunctionError::NoSignChange { .. }));
}

#[test]
fn open_solve_agrees_with_bracket() {
    let f = |v: f64| diode_iv(v) - 1e-3;
    let fprime = |v: f64| I_S / V_T * (v / V_T).exp();
    let bracketed = robust_bracket_solve(f, 0.0, 1.0, &BracketOptions::default()).unwrap();
    let open = robust_open_solve(f, 0.6, Some(&fprime), None, &OpenOptions::default()).unwrap();
    assert_abs_diff_eq!(bracketed, open, epsilon = 1e-8);
}

#[test]
fn diode_voltage_for_microamp() {
    let v = find_voltage_for_current(diode_iv, 1e-6, (0.0, 1.0), SolveMethod::Bracket, &SolveOptions::default())
        .unwrap();
    assert!(v > 0.35 && v < 0.37, "v = {v}");
    assert!((diode_iv(v) - 1e-6).abs() < 1e-12);
}

#[test]
fn intersecting_lines_operating_point() {
    let (v, i) = find_operating_point(
        |v| 2.0 * v + 1.0,
        |v| -v + 4.0,
        (0.0, 5.0),
        SolveMethod::Bracket,
        &SolveOptions::default(),
    )
    .unwrap();
    assert_abs_diff_eq!(v, 1.0, epsilon = 1e-10);
    assert_abs_diff_eq!(i, 3.0, epsilon = 1e-10);
}

#[test]
fn invalid_range_fails_before_solving() {
    let err = find_operating_point(
        |_| panic!("characteristic must not be evaluated"),
        |v| v,
        (1.0, 0.0),
        SolveMethod::Bracket,
        &SolveOptions::default(),
    )
    .unwrap_err();
    assert!(matches!(err, JunctionError::InvalidRange { .. }));
}

// ---------------------------------------------------------------------------
// Parasitics
// ---------------------------------------------------------------------------

#[test]
fn series_resistance_reduces_forward_current() {
    let v = array![0.5, 0.6, 0.7];
    let ideal = v.mapv(diode_iv);
    let params = ParasiticParams::new(10.0, f64::INFINITY, I_S, V_T);
    let current = apply_parasitics(&v, &ideal, &params).unwrap();
    for k in 0..v.len() {
        assert!(current[k] < ideal[k], "V = {}", v[k]);
    }
}

#[test]
fn no_parasitics_is_identity() {
    let v = Array::linspace(-1.0, 1.0, 64);
    let ideal = v.mapv(diode_iv);
    let params = ParasiticParams::new(0.0, f64::INFINITY, I_S, V_T);
    assert_eq!(apply_parasitics(&v, &ideal, &params).unwrap(), ideal);
}

// ---------------------------------------------------------------------------
// Backends
// ---------------------------------------------------------------------------

#[test]
fn every_backend_matches_reference() {
    let v = Array3::from_shape_fn((3, 4, 5), |(a, b, c)| -1.0 + 0.04 * (a * 20 + b * 5 + c) as f64);
    let selector = AccelerationSelector::new(Capabilities::all());
    let reference = selector
        .select_request::<DiodeCurrentKernel>(BackendRequest::Explicit(Backend::Reference))
        .kernel
        .eval(&v, I_S, V_T, DEFAULT_MAX_ARG);

    for backend in [Backend::Vectorized, Backend::Parallel] {
        let selection = selector.select_request::<DiodeCurrentKernel>(BackendRequest::Explicit(backend));
        assert!(!selection.resolution.downgraded);
        let out = selection.kernel.eval(&v, I_S, V_T, DEFAULT_MAX_ARG);
        assert_eq!(out.shape(), v.shape());
        for (o, r) in out.iter().zip(reference.iter()) {
            if *r != 0.0 {
                assert!(((o - r) / r).abs() < 1e-14);
            }
        }
    }
}

#[test]
fn missing_backend_degrades_without_failing() {
    let selector = AccelerationSelector::new(Capabilities::reference_only());
    let selection = selector.select::<DiodeCurrentKernel>("vectorized").unwrap();
    assert_eq!(selection.resolution.chosen, Backend::Reference);
    assert!(selection.resolution.downgraded);

    let err = selector.select::<DiodeCurrentKernel>("gpu").unwrap_err();
    assert!(matches!(err, JunctionError::UnknownBackend { .. }));
}

#[test]
fn safe_expm1_scalar_input_keeps_shape() {
    let out = safe_expm1(&arr0(1e4), DEFAULT_MAX_ARG);
    assert_eq!(out.ndim(), 0);
    assert!(out.into_scalar().is_finite());
}

// ---------------------------------------------------------------------------
// Device models
// ---------------------------------------------------------------------------

#[test]
fn diode_load_line_with_parasitics() {
    let diode = Diode::new(DiodeParams::silicon(), ParasiticConfig::new(2.0, 1e6)).unwrap();
    let (supply, load) = (5.0, 1000.0);
    let (v, i) = find_operating_point(
        |v| diode.current(v),
        |v| (supply - v) / load,
        (0.0, supply),
        SolveMethod::Bracket,
        &SolveOptions::default(),
    )
    .unwrap();
    // Roughly 4.3 mA through a forward-biased silicon junction
    assert!(v > 0.5 && v < 0.8, "v = {v}");
    assert_relative_eq!(i, (supply - v) / load, max_relative = 1e-9);
}

#[test]
fn diode_inversion_with_open_method() {
    let diode = Diode::new(DiodeParams::germanium(), ParasiticConfig::none()).unwrap();
    let options = SolveOptions::default().with_x0(0.45);
    let v = find_voltage_for_current(|v| diode.current(v), 1e-4, (0.0, 1.0), SolveMethod::Open, &options).unwrap();
    assert_relative_eq!(diode.current(v), 1e-4, max_relative = 1e-6);
}

#[test]
fn schottky_series_resistance_consistent() {
    let diode = SchottkyDiode::new(SchottkyParams::new(0.65).with_series_resistance(20.0)).unwrap();
    let v = Array::linspace(-0.3, 1.2, 16);
    let sol = diode.junction_solution(&v).unwrap();
    assert!(sol.all_converged());
    for k in 0..v.len() {
        assert_abs_diff_eq!(sol.junction_voltage[k] + 20.0 * sol.current[k], v[k], epsilon = 1e-9);
    }
}
