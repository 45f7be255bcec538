//! Junction - diode IV evaluation from the command line.
//!
//! # Usage
//!
//! ```bash
//! # Sweep a silicon diode with 5 Ohm series resistance
//! junction iv --start -0.2 --stop 0.8 --points 101 --rs 5
//!
//! # Voltage at which the diode carries 1 mA
//! junction solve --target 1e-3 --lo 0 --hi 1
//!
//! # Operating point with a 5 V supply and 1 kOhm load
//! junction op --supply 5 --load 1000
//! ```

use clap::{Args, Parser, Subcommand};
use junction_core::{
    components::{Diode, DiodeParams, ParasiticConfig, DEFAULT_TEMPERATURE},
    error::Result,
    numerics::{AccelerationSelector, BackendRequest},
    solver::{find_operating_point, find_voltage_for_current, SolveMethod, SolveOptions, DEFAULT_VOLTAGE_RANGE},
};
use ndarray::Array1;

/// Semiconductor junction IV evaluation
#[derive(Parser, Debug)]
#[command(name = "junction", author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the IV characteristic as "voltage current" lines
    Iv {
        /// First voltage of the sweep (V)
        #[arg(long, allow_hyphen_values = true)]
        start: f64,

        /// Last voltage of the sweep (V)
        #[arg(long, allow_hyphen_values = true)]
        stop: f64,

        /// Number of sweep points
        #[arg(long, default_value_t = 101)]
        points: usize,

        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Find the voltage at which the diode carries a target current
    Solve {
        /// Target current (A)
        #[arg(long, allow_hyphen_values = true)]
        target: f64,

        #[command(flatten)]
        search: SearchArgs,

        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Operating point of the diode in series with a resistor
    Op {
        /// Supply voltage (V)
        #[arg(long, allow_hyphen_values = true)]
        supply: f64,

        /// Load resistance (Ohm)
        #[arg(long)]
        load: f64,

        #[command(flatten)]
        search: SearchArgs,

        #[command(flatten)]
        device: DeviceArgs,
    },
}

#[derive(Args, Debug)]
struct DeviceArgs {
    /// Saturation current (A)
    #[arg(long = "is", default_value_t = 1e-14)]
    saturation_current: f64,

    /// Ideality factor
    #[arg(long, default_value_t = 1.0)]
    n: f64,

    /// Temperature (K)
    #[arg(long, default_value_t = DEFAULT_TEMPERATURE)]
    temperature: f64,

    /// Series resistance (Ohm)
    #[arg(long, default_value_t = 0.0)]
    rs: f64,

    /// Shunt resistance (Ohm)
    #[arg(long, default_value_t = f64::INFINITY)]
    rsh: f64,

    /// Evaluation backend: auto, reference, vectorized or parallel
    #[arg(long, default_value = "auto")]
    backend: String,
}

#[derive(Args, Debug)]
struct SearchArgs {
    /// Lower end of the voltage search range (V)
    #[arg(long, allow_hyphen_values = true, default_value_t = DEFAULT_VOLTAGE_RANGE.0)]
    lo: f64,

    /// Upper end of the voltage search range (V)
    #[arg(long, allow_hyphen_values = true, default_value_t = DEFAULT_VOLTAGE_RANGE.1)]
    hi: f64,

    /// Root-finding method: bracket or open
    #[arg(long, default_value = "bracket")]
    method: String,
}

impl DeviceArgs {
    fn build(&self) -> Result<Diode> {
        let request: BackendRequest = self.backend.parse()?;
        let params = DiodeParams {
            is: self.saturation_current,
            n: self.n,
            temperature: self.temperature,
            area: 1.0,
        };
        let parasitics = if self.rs > 0.0 || self.rsh.is_finite() {
            ParasiticConfig::new(self.rs, self.rsh)
        } else {
            ParasiticConfig::none()
        };

        let diode = Diode::with_backend(params, parasitics, &AccelerationSelector::global(), request)?;
        let resolution = diode.resolution();
        if resolution.downgraded {
            eprintln!(
                "warning: backend '{}' unavailable, using '{}'",
                resolution.requested, resolution.chosen
            );
        }
        Ok(diode)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Iv {
            start,
            stop,
            points,
            device,
        } => {
            let diode = device.build()?;
            let voltage = Array1::linspace(start, stop, points);
            let solution = diode.iv_solution(&voltage)?;
            if !solution.all_converged() {
                eprintln!(
                    "warning: {} of {} samples did not converge",
                    solution.unconverged_count(),
                    voltage.len()
                );
            }
            for (v, i) in voltage.iter().zip(solution.current.iter()) {
                println!("{:.6} {:.6e}", v, i);
            }
        }
        Commands::Solve {
            target,
            search,
            device,
        } => {
            let diode = device.build()?;
            let method: SolveMethod = search.method.parse()?;
            let v = find_voltage_for_current(
                |v| diode.current(v),
                target,
                (search.lo, search.hi),
                method,
                &SolveOptions::default(),
            )?;
            println!("{:.9}", v);
        }
        Commands::Op {
            supply,
            load,
            search,
            device,
        } => {
            let diode = device.build()?;
            let method: SolveMethod = search.method.parse()?;
            let (v_op, i_op) = find_operating_point(
                |v| diode.current(v),
                |v| (supply - v) / load,
                (search.lo, search.hi),
                method,
                &SolveOptions::default(),
            )?;
            println!("{:.9} {:.9e}", v_op, i_op);
        }
    }

    Ok(())
}
