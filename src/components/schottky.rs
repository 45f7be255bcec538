//! Schottky (metal-semiconductor) diode.
//!
//! Thermionic emission with the Richardson saturation current:
//!   Is = A * A_eff * T^2 * exp(-q * (phi_B - dphi) / (k_B * T))
//!
//! A series resistance makes the junction voltage implicit; it is resolved
//! by [`solve_junction_voltage`].

use ndarray::{Array, ArrayBase, Data, Dimension};

use super::{thermal_voltage, DEFAULT_TEMPERATURE};
use crate::error::{JunctionError, Result};
use crate::numerics::{AccelerationSelector, BackendRequest, BackendResolution, DiodeCurrentKernel, DEFAULT_MAX_ARG};
use crate::solver::{solve_junction_voltage, JunctionSolution};

/// Parameters for a Schottky diode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchottkyParams {
    /// Barrier height phi_B (eV)
    pub barrier_height: f64,
    /// Contact area (cm^2)
    pub area: f64,
    /// Temperature (K)
    pub temperature: f64,
    /// Effective Richardson constant (A/(cm^2 K^2))
    pub richardson: f64,
    /// Series resistance (Ohm)
    pub series_resistance: f64,
    /// Image-force barrier lowering (eV)
    pub image_force_lowering: f64,
}

impl SchottkyParams {
    /// Parameters for the given barrier height with typical silicon defaults.
    pub fn new(barrier_height: f64) -> Self {
        Self {
            barrier_height,
            area: 1e-4,
            temperature: DEFAULT_TEMPERATURE,
            richardson: 120.0,
            series_resistance: 0.0,
            image_force_lowering: 0.0,
        }
    }

    pub fn with_area(mut self, area: f64) -> Self {
        self.area = area;
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_richardson(mut self, richardson: f64) -> Self {
        self.richardson = richardson;
        self
    }

    pub fn with_series_resistance(mut self, r_s: f64) -> Self {
        self.series_resistance = r_s;
        self
    }

    pub fn with_image_force_lowering(mut self, lowering: f64) -> Self {
        self.image_force_lowering = lowering;
        self
    }

    /// Barrier height after image-force lowering (eV).
    pub fn effective_barrier(&self) -> f64 {
        self.barrier_height - self.image_force_lowering
    }

    fn validate(&self) -> Result<()> {
        let positive = [
            ("barrier_height", self.barrier_height),
            ("area", self.area),
            ("temperature", self.temperature),
            ("richardson", self.richardson),
        ];
        for (param, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(JunctionError::invalid_parameter(
                    param,
                    format!("must be a positive finite value, got {}", value),
                ));
            }
        }
        let non_negative = [
            ("series_resistance", self.series_resistance),
            ("image_force_lowering", self.image_force_lowering),
        ];
        for (param, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(JunctionError::invalid_parameter(
                    param,
                    format!("must be a non-negative finite value, got {}", value),
                ));
            }
        }
        Ok(())
    }
}

/// A Schottky diode with its saturation current resolved.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchottkyDiode {
    params: SchottkyParams,
    saturation_current: f64,
    kernel: DiodeCurrentKernel,
    resolution: BackendResolution,
}

impl SchottkyDiode {
    /// Create a diode on the best available backend.
    pub fn new(params: SchottkyParams) -> Result<Self> {
        Self::with_backend(params, &AccelerationSelector::global(), BackendRequest::Auto)
    }

    /// Create a diode with an explicit backend request.
    pub fn with_backend(
        params: SchottkyParams,
        selector: &AccelerationSelector,
        request: BackendRequest,
    ) -> Result<Self> {
        params.validate()?;
        let selection = selector.select_request::<DiodeCurrentKernel>(request);
        Ok(Self {
            params,
            saturation_current: richardson_saturation_current(&params),
            kernel: selection.kernel,
            resolution: selection.resolution,
        })
    }

    /// The same diode at another temperature, keeping the backend.
    pub fn at_temperature(&self, temperature: f64) -> Result<Self> {
        let params = self.params.with_temperature(temperature);
        params.validate()?;
        Ok(Self {
            params,
            saturation_current: richardson_saturation_current(&params),
            ..*self
        })
    }

    pub fn params(&self) -> &SchottkyParams {
        &self.params
    }

    /// Saturation current (A).
    pub fn saturation_current(&self) -> f64 {
        self.saturation_current
    }

    pub fn thermal_voltage(&self) -> f64 {
        thermal_voltage(self.params.temperature)
    }

    pub fn resolution(&self) -> BackendResolution {
        self.resolution
    }

    /// Junction voltage and current for every applied voltage sample.
    pub fn junction_solution<S, D>(&self, voltage: &ArrayBase<S, D>) -> Result<JunctionSolution<D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        solve_junction_voltage(
            voltage,
            self.saturation_current,
            self.thermal_voltage(),
            self.params.series_resistance,
        )
    }

    /// Current at every applied voltage sample.
    pub fn iv_characteristic<S, D>(&self, voltage: &ArrayBase<S, D>) -> Result<Array<f64, D>>
    where
        S: Data<Elem = f64>,
        D: Dimension,
    {
        if self.params.series_resistance == 0.0 {
            return Ok(self.kernel.eval(
                voltage,
                self.saturation_current,
                self.thermal_voltage(),
                DEFAULT_MAX_ARG,
            ));
        }
        Ok(self.junction_solution(voltage)?.current)
    }
}

fn richardson_saturation_current(params: &SchottkyParams) -> f64 {
    let t = params.temperature;
    params.area * params.richardson * t * t * (-params.effective_barrier() / thermal_voltage(t)).exp()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::numerics::diode_current;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use ndarray::{array, Array};

    #[test]
    fn test_richardson_saturation_current() {
        let d = SchottkyDiode::new(SchottkyParams::new(0.7)).unwrap();
        let expected = 1e-4 * 120.0 * 300.0 * 300.0 * (-0.7 / thermal_voltage(300.0)).exp();
        assert_relative_eq!(d.saturation_current(), expected, max_relative = 1e-14);
        assert!(d.saturation_current() > 1e-9 && d.saturation_current() < 1e-8);
    }

    #[test]
    fn test_temperature_raises_saturation_current() {
        let d = SchottkyDiode::new(SchottkyParams::new(0.7)).unwrap();
        let hot = d.at_temperature(350.0).unwrap();
        assert!(hot.saturation_current() > 10.0 * d.saturation_current());
        assert_eq!(hot.resolution(), d.resolution());
        assert!(d.at_temperature(-1.0).is_err());
    }

    #[test]
    fn test_image_force_lowering_raises_current() {
        let plain = SchottkyDiode::new(SchottkyParams::new(0.7)).unwrap();
        let lowered = SchottkyDiode::new(SchottkyParams::new(0.7).with_image_force_lowering(0.05)).unwrap();
        assert!(lowered.saturation_current() > plain.saturation_current());
    }

    #[test]
    fn test_no_series_resistance_is_direct() {
        let d = SchottkyDiode::new(SchottkyParams::new(0.6)).unwrap();
        let v = Array::linspace(-0.5, 0.5, 11);
        let expected = diode_current(&v, d.saturation_current(), d.thermal_voltage(), DEFAULT_MAX_ARG);
        let got = d.iv_characteristic(&v).unwrap();
        for (g, e) in got.iter().zip(expected.iter()) {
            assert_relative_eq!(*g, *e, max_relative = 1e-14);
        }
    }

    #[test]
    fn test_series_resistance_limits_current() {
        let params = SchottkyParams::new(0.6);
        let ideal = SchottkyDiode::new(params).unwrap();
        let resistive = SchottkyDiode::new(params.with_series_resistance(10.0)).unwrap();

        let v = array![0.1, 0.3, 0.5];
        let i_ideal = ideal.iv_characteristic(&v).unwrap();
        let sol = resistive.junction_solution(&v).unwrap();
        assert!(sol.all_converged());
        for k in 0..v.len() {
            assert!(sol.current[k] <= i_ideal[k]);
            assert_abs_diff_eq!(sol.junction_voltage[k] + sol.current[k] * 10.0, v[k], epsilon = 1e-9);
        }
        assert_eq!(resistive.iv_characteristic(&v).unwrap(), sol.current);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(SchottkyDiode::new(SchottkyParams::new(0.0)).is_err());
        assert!(SchottkyDiode::new(SchottkyParams::new(0.7).with_richardson(-1.0)).is_err());
        assert!(SchottkyDiode::new(SchottkyParams::new(0.7).with_series_resistance(-1.0)).is_err());
        assert!(SchottkyDiode::new(SchottkyParams::new(0.7).with_image_force_lowering(f64::NAN)).is_err());
    }
}
