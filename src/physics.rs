//! Accelerator physics formula library
//!
//! Physical constants and the closed-form storage-ring formulas that derived
//! parameters may call by name. Everything here is a pure function of its
//! arguments; the constants are an explicit [`PhysicalConstants`] value rather
//! than process-wide state.
//!
//! Units follow the conventions of the parameter catalogue: energies in GeV,
//! energy loss in keV, currents in mA, periods in μs, frequencies in MHz unless
//! stated otherwise.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Physical constants used by the formula library.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Speed of light [m/s]
    pub light_speed: f64,
    /// Vacuum permeability [T.m/A]
    pub vacuum_permeability: f64,
    /// Elementary charge [C]
    pub elementary_charge: f64,
    /// Electron mass [kg]
    pub electron_mass: f64,
    /// Electron rest energy [J]
    pub electron_rest_energy: f64,
    /// Vacuum permittivity [F/m]
    pub vacuum_permittivity: f64,
    /// Classical electron radius [m]
    pub electron_radius: f64,
    /// Joule to electron-volt conversion factor
    pub joule_2_ev: f64,
    /// Reduced Planck constant [J.s]
    pub reduced_planck_constant: f64,
    /// Radiation constant C_gamma [m/GeV^3]
    pub rad_cgamma: f64,
    /// Quantum constant Cq [m]
    pub cq: f64,
    /// Damping constant Ca [m^2/(s.GeV^3)]
    pub ca: f64,
}

impl PhysicalConstants {
    /// Constants from the 2014 CODATA recommended values, with the derived
    /// quantities computed from them.
    pub fn codata_2014() -> Self {
        let light_speed: f64 = 299_792_458.0;
        let vacuum_permeability = 4.0 * PI * 1e-7;
        let elementary_charge: f64 = 1.602176565e-19;
        let electron_mass: f64 = 9.10938291e-31;
        let reduced_planck_constant = 1.054571726e-34;

        let electron_rest_energy = electron_mass * light_speed.powi(2);
        let vacuum_permittivity = 1.0 / (vacuum_permeability * light_speed.powi(2));
        let electron_radius = elementary_charge.powi(2)
            / (4.0 * PI * vacuum_permittivity * electron_rest_energy);
        let joule_2_ev = 1.0 / elementary_charge;
        let rad_cgamma = 4.0 * PI * electron_radius
            / (electron_rest_energy / elementary_charge / 1e9).powi(3)
            / 3.0;
        let cq = (55.0 / (32.0 * 3.0_f64.sqrt())) * reduced_planck_constant * light_speed
            / electron_rest_energy;
        let ca = electron_radius * light_speed
            / (3.0 * (electron_rest_energy * joule_2_ev / 1.0e9).powi(3));

        Self {
            light_speed,
            vacuum_permeability,
            elementary_charge,
            electron_mass,
            electron_rest_energy,
            vacuum_permittivity,
            electron_radius,
            joule_2_ev,
            reduced_planck_constant,
            rad_cgamma,
            cq,
            ca,
        }
    }

    /// Named constants as they may appear in expressions.
    ///
    /// `vacuum_permitticity` keeps the spelling existing expressions use.
    pub fn named(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("light_speed", self.light_speed),
            ("vacuum_permeability", self.vacuum_permeability),
            ("elementary_charge", self.elementary_charge),
            ("electron_mass", self.electron_mass),
            ("electron_rest_energy", self.electron_rest_energy),
            ("vacuum_permitticity", self.vacuum_permittivity),
            ("joule_2_eV", self.joule_2_ev),
            ("reduced_planck_constant", self.reduced_planck_constant),
            ("rad_cgamma", self.rad_cgamma),
            ("Cq", self.cq),
            ("Ca", self.ca),
        ]
    }

    /// Energy in Joules converted to eV
    pub fn joule_2_ev(&self, value_j: f64) -> f64 {
        self.joule_2_ev * value_j
    }

    /// Lorentz factor from beam energy [GeV]
    pub fn gamma(&self, energy: f64) -> f64 {
        energy * 1.0e9 / self.joule_2_ev(self.electron_rest_energy)
    }

    /// Velocity [m/s] from beta factor
    pub fn velocity(&self, beta: f64) -> f64 {
        beta * self.light_speed
    }

    /// Magnetic rigidity [T.m] from beam energy [GeV] and beta factor
    pub fn brho(&self, energy: f64, beta: f64) -> f64 {
        beta * (energy * 1e9) / self.light_speed
    }

    /// Critical energy [keV] from gamma factor and bending radius [m]
    pub fn critical_energy(&self, gamma: f64, rho: f64) -> f64 {
        (3.0 * self.joule_2_ev(self.reduced_planck_constant) * self.light_speed * gamma.powi(3)
            / (2.0 * rho))
            / 1000.0
    }

    /// Energy loss per turn U0 [keV] from beam energy [GeV] and I2 [1/m]
    pub fn u0(&self, energy: f64, i2: f64) -> f64 {
        1e6 * self.rad_cgamma * energy.powi(4) * i2 / 2.0 / PI
    }

    /// Natural emittance [nm.rad] from gamma, Jx, I2 [1/m] and I5 [1/m]
    pub fn natural_emittance(&self, gamma: f64, jx: f64, i2: f64, i5: f64) -> f64 {
        self.cq * gamma * gamma * i5 / (jx * i2) * 1e9
    }

    /// Natural energy spread [%] from gamma, I2 [1/m], I3 [1/m^2] and I4 [1/m]
    pub fn energy_spread(&self, gamma: f64, i2: f64, i3: f64, i4: f64) -> f64 {
        100.0 * (self.cq * gamma * gamma * i3 / (2.0 * i2 + i4)).sqrt()
    }

    /// Number of electrons from beam current [mA] and revolution period [μs]
    pub fn number_of_electrons(&self, current: f64, revolution_period: f64) -> f64 {
        (current / 1e3) * (revolution_period / 1e6) / self.elementary_charge
    }

    /// Radiation damping time [ms] from energy [GeV], I2 [1/m], damping
    /// partition number and circumference [m]
    pub fn damping_time(&self, energy: f64, i2: f64, j: f64, circumference: f64) -> f64 {
        1000.0 * circumference / (self.ca * energy.powi(3) * i2 * j)
    }

    /// RF wavelength [m] from RF frequency [MHz]
    pub fn rf_wavelength(&self, frequency: f64) -> f64 {
        self.light_speed / (1e6 * frequency)
    }

    /// Natural bunch length [mm] from slip factor, energy spread [%] and
    /// synchrotron frequency [kHz]
    pub fn bunch_length(&self, slip_factor: f64, energy_spread: f64, synchrotron_frequency: f64) -> f64 {
        let angular_synchrotron_frequency = 2.0 * PI * synchrotron_frequency;
        (self.light_speed * slip_factor.abs() * energy_spread / 100.0
            / (1e3 * angular_synchrotron_frequency))
            * 1000.0
    }

    /// Bunch duration [ps] from bunch length [mm] and beta factor
    pub fn bunch_duration(&self, bunch_length: f64, beta: f64) -> f64 {
        1e9 * bunch_length / beta / self.light_speed
    }

    /// Insertion device deflection parameter from peak field [T] and period [mm]
    pub fn id_deflection_parameter(&self, field: f64, period: f64) -> f64 {
        1e-9 * period * field * self.light_speed
            / (self.joule_2_ev(self.electron_rest_energy) / 1.0e6)
            / (2.0 * PI)
    }

    /// Insertion device mean power [kW] from energy [GeV], current [mA],
    /// period [mm], number of periods and deflection parameter
    pub fn id_mean_power(&self, energy: f64, _current: f64, period: f64, nr_periods: f64, k: f64) -> f64 {
        let cst = PI * 1e9 * self.rad_cgamma * (self.joule_2_ev(self.electron_rest_energy) / 1.0e9).powi(2);
        // Handbook of Accelerator Physics, eq. (14), p. 189
        (cst * energy * k * k * nr_periods / (period / 1000.0)) / 1000.0
    }
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self::codata_2014()
    }
}

/// Degrees to radians
pub fn deg2rad(degrees: f64) -> f64 {
    degrees.to_radians()
}

/// Radians to degrees
pub fn rad2deg(radians: f64) -> f64 {
    radians.to_degrees()
}

/// Beta factor from gamma
pub fn beta(gamma: f64) -> f64 {
    (((gamma + 1.0) / gamma) * ((gamma - 1.0) / gamma)).sqrt()
}

/// Synchronous phase [deg] from overvoltage
pub fn sync_phase(q: f64) -> f64 {
    180.0 - rad2deg((1.0 / q).asin())
}

/// RF energy acceptance [%] from overvoltage, energy [GeV], energy loss per
/// turn [keV], harmonic number and momentum compaction factor
pub fn rf_energy_acceptance(q: f64, energy: f64, u0: f64, h: f64, alpha: f64) -> f64 {
    let fq = if q > 1.0 {
        2.0 * ((q * q - 1.0).sqrt() - (1.0 / q).acos())
    } else {
        0.0
    };

    100.0 * ((1.0 / PI / alpha / h) * (u0 / (energy * 1e6)) * fq).sqrt()
}

/// Revolution period [μs] from circumference [m] and velocity [m/s]
pub fn revolution_period(circumference: f64, velocity: f64) -> f64 {
    1.0e6 * circumference / velocity
}

/// Revolution frequency [MHz] from revolution period [μs]
pub fn revolution_frequency(revolution_period: f64) -> f64 {
    1.0 / revolution_period
}

/// RF frequency [MHz] from revolution frequency [MHz] and harmonic number
pub fn rf_frequency(revolution_frequency: f64, harmonic_number: f64) -> f64 {
    revolution_frequency * harmonic_number
}

/// Overvoltage from RF voltage [MV] and energy loss per turn [keV]
pub fn overvoltage(rf_voltage: f64, u0: f64) -> f64 {
    1e6 * rf_voltage / (1e3 * u0)
}

/// Linear momentum compaction factor from I1 [m] and circumference [m]
pub fn alpha1(i1: f64, circumference: f64) -> f64 {
    i1 / circumference
}

/// Horizontal damping partition number from I2 [1/m] and I4 [1/m]
pub fn jx(i2: f64, i4: f64) -> f64 {
    1.0 - i4 / i2
}

/// Longitudinal damping partition number from Jx and Jy
pub fn js(jx: f64, jy: f64) -> f64 {
    4.0 - jx - jy
}

/// Frequency [kHz] from revolution frequency [MHz] and tune
pub fn frequency_from_tune(revolution_frequency: f64, tune: f64) -> f64 {
    1000.0 * revolution_frequency * (tune - tune.floor())
}

/// Radiated power [kW] from beam current [mA] and energy loss per turn [keV]
pub fn radiation_power(current: f64, u0: f64) -> f64 {
    u0 * current / 1000.0
}

/// Slip factor from momentum compaction factor and gamma
pub fn slip_factor(alpha: f64, gamma: f64) -> f64 {
    alpha - 1.0 / gamma.powi(2)
}
