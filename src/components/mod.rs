//! Two-terminal junction device models.
//!
//! These are thin callers of the numerics core:
//! - [`Diode`] - Shockley diode with optional series/shunt parasitics
//! - [`SchottkyDiode`] - thermionic-emission diode with series resistance
//!
//! Each model evaluates its ideal current through a backend-selected kernel
//! and hands any implicit coupling to the [`solver`](crate::solver) module.

mod diode;
mod schottky;

pub use diode::{Diode, DiodeParams, ParasiticConfig};
pub use schottky::{SchottkyDiode, SchottkyParams};

/// Boltzmann constant (J/K).
pub const BOLTZMANN: f64 = 1.380649e-23;

/// Elementary charge (C).
pub const ELEMENTARY_CHARGE: f64 = 1.602176634e-19;

/// Default device temperature (K).
pub const DEFAULT_TEMPERATURE: f64 = 300.0;

/// Thermal voltage `k_B * T / q` at `temperature` kelvin.
pub fn thermal_voltage(temperature: f64) -> f64 {
    BOLTZMANN * temperature / ELEMENTARY_CHARGE
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_room_temperature_thermal_voltage() {
        assert_relative_eq!(thermal_voltage(DEFAULT_TEMPERATURE), 0.025852, max_relative = 1e-4);
    }

    #[test]
    fn test_thermal_voltage_scales_linearly() {
        assert_relative_eq!(thermal_voltage(600.0), 2.0 * thermal_voltage(300.0), max_relative = 1e-15);
    }
}
