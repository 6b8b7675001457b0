//! Whitelisted functions and constants available to derived expressions
//!
//! A [`FunctionLibrary`] is the complete sandbox vocabulary: any identifier an
//! expression uses must name one of its functions or constants. The standard
//! library holds the elementary math functions and the accelerator physics
//! formulas from [`crate::physics`].

use crate::parameters::expression::{EvaluationContext, ExprResult, ExpressionError};
use crate::physics::{self, PhysicalConstants};
use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;

type Builtin = Box<dyn Fn(&[f64]) -> f64 + Send + Sync>;

struct FunctionSpec {
    arity: usize,
    call: Builtin,
}

/// Dispatch table of whitelisted functions and named constants
pub struct FunctionLibrary {
    functions: HashMap<&'static str, FunctionSpec>,
    constants: HashMap<&'static str, f64>,
}

impl FunctionLibrary {
    /// The standard library built from the CODATA 2014 constants
    pub fn standard() -> Self {
        Self::with_constants(PhysicalConstants::codata_2014())
    }

    /// The standard function set over an explicit set of physical constants
    pub fn with_constants(c: PhysicalConstants) -> Self {
        let mut library = Self {
            functions: HashMap::new(),
            constants: HashMap::new(),
        };

        for (name, value) in c.named() {
            library.constants.insert(name, value);
        }

        // Elementary math
        library.register("pi", 0, |_| PI);
        library.register("sqrt", 1, |a| a[0].sqrt());
        library.register("pow", 2, |a| a[0].powf(a[1]));
        library.register("exp", 1, |a| a[0].exp());
        library.register("sin", 1, |a| a[0].sin());
        library.register("cos", 1, |a| a[0].cos());
        library.register("tan", 1, |a| a[0].tan());
        library.register("asin", 1, |a| a[0].asin());
        library.register("acos", 1, |a| a[0].acos());
        library.register("atan", 1, |a| a[0].atan());
        library.register("deg2rad", 1, |a| physics::deg2rad(a[0]));
        library.register("rad2deg", 1, |a| physics::rad2deg(a[0]));

        // Beam and ring formulas
        library.register("joule_2_ev", 1, move |a| c.joule_2_ev(a[0]));
        library.register("gamma", 1, move |a| c.gamma(a[0]));
        library.register("beta", 1, |a| physics::beta(a[0]));
        library.register("velocity", 1, move |a| c.velocity(a[0]));
        library.register("brho", 2, move |a| c.brho(a[0], a[1]));
        library.register("critical_energy", 2, move |a| c.critical_energy(a[0], a[1]));
        library.register("U0", 2, move |a| c.u0(a[0], a[1]));
        library.register("sync_phase", 1, |a| physics::sync_phase(a[0]));
        library.register("rf_energy_acceptance", 5, |a| {
            physics::rf_energy_acceptance(a[0], a[1], a[2], a[3], a[4])
        });
        library.register("natural_emittance", 4, move |a| {
            c.natural_emittance(a[0], a[1], a[2], a[3])
        });
        library.register("energy_spread", 4, move |a| c.energy_spread(a[0], a[1], a[2], a[3]));
        library.register("revolution_period", 2, |a| physics::revolution_period(a[0], a[1]));
        library.register("revolution_frequency", 1, |a| physics::revolution_frequency(a[0]));
        library.register("rf_frequency", 2, |a| physics::rf_frequency(a[0], a[1]));
        library.register("number_of_electrons", 2, move |a| c.number_of_electrons(a[0], a[1]));
        library.register("overvoltage", 2, |a| physics::overvoltage(a[0], a[1]));
        library.register("alpha1", 2, |a| physics::alpha1(a[0], a[1]));
        library.register("Jx", 2, |a| physics::jx(a[0], a[1]));
        library.register("Js", 2, |a| physics::js(a[0], a[1]));
        library.register("frequency_from_tune", 2, |a| physics::frequency_from_tune(a[0], a[1]));
        library.register("damping_time", 4, move |a| c.damping_time(a[0], a[1], a[2], a[3]));
        library.register("radiation_power", 2, |a| physics::radiation_power(a[0], a[1]));
        library.register("rf_wavelength", 1, move |a| c.rf_wavelength(a[0]));
        library.register("slip_factor", 2, |a| physics::slip_factor(a[0], a[1]));
        library.register("bunch_length", 3, move |a| c.bunch_length(a[0], a[1], a[2]));
        library.register("bunch_duration", 2, move |a| c.bunch_duration(a[0], a[1]));
        library.register("id_deflection_parameter", 2, move |a| {
            c.id_deflection_parameter(a[0], a[1])
        });
        library.register("id_mean_power", 5, move |a| {
            c.id_mean_power(a[0], a[1], a[2], a[3], a[4])
        });

        library
    }

    fn register<F>(&mut self, name: &'static str, arity: usize, call: F)
    where
        F: Fn(&[f64]) -> f64 + Send + Sync + 'static,
    {
        self.functions.insert(
            name,
            FunctionSpec {
                arity,
                call: Box::new(call),
            },
        );
    }

    /// Number of arguments the named function takes
    pub fn arity(&self, name: &str) -> Option<usize> {
        self.functions.get(name).map(|entry| entry.arity)
    }

    /// Whitelisted function names, sorted
    pub fn function_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Whitelisted constant names, sorted
    pub fn constant_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.constants.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

impl Default for FunctionLibrary {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for FunctionLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionLibrary")
            .field("functions", &self.function_names())
            .field("constants", &self.constant_names())
            .finish()
    }
}

impl EvaluationContext for FunctionLibrary {
    fn get_constant(&self, name: &str) -> ExprResult<f64> {
        self.constants
            .get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UnknownConstant {
                name: name.to_string(),
            })
    }

    fn has_constant(&self, name: &str) -> bool {
        self.constants.contains_key(name)
    }

    fn call_function(&self, name: &str, args: &[f64]) -> ExprResult<f64> {
        let entry = self
            .functions
            .get(name)
            .ok_or_else(|| ExpressionError::UndefinedFunction {
                name: name.to_string(),
            })?;

        if args.len() != entry.arity {
            return Err(ExpressionError::InvalidOperation {
                message: format!(
                    "{}() requires {} argument{}, got {}",
                    name,
                    entry.arity,
                    if entry.arity == 1 { "" } else { "s" },
                    args.len()
                ),
            });
        }

        Ok((entry.call)(args))
    }

    fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}
