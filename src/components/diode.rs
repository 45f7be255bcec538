//! Diode model.
//!
//! Uses the Shockley diode equation:
//!   I = Is * (exp(V / (n * Vt)) - 1)
//!
//! With parasitics enabled the terminal current becomes implicit:
//!   I = Is * (exp((V - I*Rs) / (n * Vt)) - 1) + V / Rsh
//!
//! and is resolved per sample by [`solve_terminal_current`].

use ndarray::{arr0, Array, ArrayBase, Data, Dimension};

use super::{thermal_voltage, DEFAULT_TEMPERATURE};
use crate::error::{JunctionError, Result};
use crate::numerics::{
    AccelerationSelector, Backend, BackendRequest, BackendResolution, DiodeCurrentKernel, DEFAULT_MAX_ARG,
};
use crate::solver::{solve_terminal_current, ParasiticParams, TerminalSolution};

/// Parameters for a diode model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiodeParams {
    /// Saturation current (Is) per unit area, typically 1e-14 to 1e-12 A
    pub is: f64,
    /// Ideality factor (n), typically 1.0 to 2.0
    pub n: f64,
    /// Junction temperature (K)
    pub temperature: f64,
    /// Relative junction area scaling `is`
    pub area: f64,
}

impl Default for DiodeParams {
    fn default() -> Self {
        Self::silicon()
    }
}

impl DiodeParams {
    /// Create parameters for a small-signal silicon diode.
    pub fn silicon() -> Self {
        Self {
            is: 1e-14,
            n: 1.0,
            temperature: DEFAULT_TEMPERATURE,
            area: 1.0,
        }
    }

    /// Create parameters for a germanium diode (lower forward voltage).
    pub fn germanium() -> Self {
        Self {
            is: 1e-9,
            n: 1.5,
            temperature: DEFAULT_TEMPERATURE,
            area: 1.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = area;
        self
    }

    /// Saturation current of the whole junction.
    pub fn saturation_current(&self) -> f64 {
        self.is * self.area
    }

    /// Thermal voltage times ideality factor.
    pub fn n_vt(&self) -> f64 {
        self.n * thermal_voltage(self.temperature)
    }

    fn validate(&self) -> Result<()> {
        let checks = [
            ("is", self.is, "saturation current (A)"),
            ("n", self.n, "ideality factor"),
            ("temperature", self.temperature, "temperature (K)"),
            ("area", self.area, "area"),
        ];
        for (param, value, what) in checks {
            if !value.is_finite() || value <= 0.0 {
                return Err(JunctionError::invalid_parameter(
                    param,
                    format!("{} must be a positive finite value, got {}", what, value),
                ));
            }
        }
        Ok(())
    }
}

/// Series and shunt resistances of a packaged diode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParasiticConfig {
    /// Series resistance (Ohm)
    pub r_s: f64,
    /// Shunt resistance (Ohm), `f64::INFINITY` for none
    pub r_sh: f64,
    /// Whether the terminal solve runs at all
    pub enabled: bool,
}

impl Default for ParasiticConfig {
    fn default() -> Self {
        Self::none()
    }
}

impl ParasiticConfig {
    /// Enabled parasitics with the given resistances.
    pub fn new(r_s: f64, r_sh: f64) -> Self {
        Self {
            r_s,
            r_sh,
            enabled: true,
        }
    }

    /// No parasitics; the ideal current is the terminal current.
    pub fn none() -> Self {
        Self {
            r_s: 0.0,
            r_sh: f64::INFINITY,
            enabled: false,
        }
    }
}

/// A diode component.
///
/// Parameters are validated on construction and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Diode {
    params: DiodeParams,
    parasitics: ParasiticConfig,
    kernel: DiodeCurrentKernel,
    resolution: BackendResolution,
}

impl Diode {
    /// Create a new diode on the best available backend.
    pub fn new(params: DiodeParams, parasitics: ParasiticConfig) -> Result<Self> {
        Self::with_backend(params, parasitics, &AccelerationSelector::global(), BackendRequest::Auto)
    }

    /// Create a new diode with an explicit backend request.
    ///
    /// An unavailable backend degrades to the reference implementation; see
    /// [`Diode::resolution`].
    pub fn with_backend(
        params: DiodeParams,
        parasitics: ParasiticConfig,
        selector: &AccelerationSelector,
        request: BackendRequest,
    ) -> Result<Self> {
        params.validate()?;
        if parasitics.enabled {
            ParasiticParams::new(parasitics.r_s, parasitics.r_sh, params.saturation_current(), params.n_vt())
                .validate()?;
        }
        let selection = selector.select_request::<DiodeCurrentKernel>(request);
        Ok(Self {
            params,
            parasitics,
            kernel: selection.kernel,
            resolution: selection.resolution,
        })
    }

    /// How the evaluation backend was chosen.
    pub fn resolution(&self) -> BackendResolution {
        self.resolution
    }

    pub fn backend(&self) -> Backend {
        self.resolution.chosen
    }

    pub fn params(&self) -> &DiodeParams {
        &self.params
    }

    pub fn parasitics(&self) -> &ParasiticConfig {
        &self.parasitics
    }

    fn parasitic_params(&self) -> ParasiticParams {
        ParasiticParams::new(
            self.parasitics.r_s,
            self.parasitics.r_sh,
            self.params.saturation_current(),
            self.params.n_vt(),
        )
    }

    /// Ideal (parasitic-free) current at every voltage sample.
    pub fn ideal_current<S, D>(&self, voltage: &ArrayBase<S, D>) -> Array<f64, D>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        self.kernel.eval(
            voltage,
            self.params.saturation_current(),
            self.params.n_vt(),
            DEFAULT_MAX_ARG,
        )
    }

    /// Terminal current together with per-sample convergence.
    pub fn iv_solution<S, D>(&self, voltage: &ArrayBase<S, D>) -> Result<TerminalSolution<D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        let ideal = self.ideal_current(voltage);
        if !self.parasitics.enabled {
            return Ok(TerminalSolution {
                converged: Array::from_elem(ideal.raw_dim(), true),
                current: ideal,
                iterations: 0,
            });
        }
        solve_terminal_current(voltage, &ideal, &self.parasitic_params())
    }

    /// Terminal current at every voltage sample.
    pub fn iv_characteristic<S, D>(&self, voltage: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        Ok(self.iv_solution(voltage)?.current)
    }

    /// Terminal current at a single voltage.
    pub fn try_current(&self, v: f64) -> Result<f64> {
        if !self.parasitics.enabled {
            return Ok(self.kernel.eval_scalar(
                v,
                self.params.saturation_current(),
                self.params.n_vt(),
                DEFAULT_MAX_ARG,
            ));
        }
        Ok(self.iv_characteristic(&arr0(v))?.into_scalar())
    }

    /// Terminal current at a single voltage, as a plain characteristic for
    /// the root finders.
    ///
    /// The parameters cannot change after validation, so [`Diode::try_current`]
    /// does not fail here. A NaN voltage gives a NaN current.
    pub fn current(&self, v: f64) -> f64 {
        self.try_current(v).unwrap_or(f64::NAN)
    }
}
