//! # Parameters and Expressions
//!
//! Domain types of the catalogue and the machinery used to evaluate derived
//! parameters without handing text to a general-purpose interpreter.
//!
//! ## Core Components
//!
//! - [`Parameter`] and [`ParameterFields`]: a catalogue row and the fields a write supplies
//! - [`Expression`]: nom-based parser and evaluator for the expression grammar
//! - [`FunctionLibrary`]: the whitelisted functions and named constants
//! - [`sandbox`]: rejects any expression using identifiers outside the whitelist
//! - [`references`]: extraction and token-safe renaming of quoted references
//!
//! ## Example Usage
//!
//! ```rust
//! use param_catalog::parameters::{sandbox, Expression, FunctionLibrary};
//! use std::collections::HashMap;
//!
//! let library = FunctionLibrary::standard();
//! let expr = Expression::parse("\"SI_energy\" * 2").unwrap();
//! assert_eq!(expr.references(), vec!["SI_energy".to_string()]);
//!
//! let values: HashMap<String, f64> = [("SI_energy".to_string(), 3.0)].into_iter().collect();
//! let resolved = expr.substitute(&values);
//! sandbox::check(&resolved, &library).unwrap();
//! assert_eq!(resolved.evaluate(&library).unwrap(), 6.0);
//! ```

pub mod expression;
pub mod library;
pub mod parameter;
pub mod references;
pub mod sandbox;

// Re-export key types
pub use expression::{EvaluationContext, Expression, ExpressionError};
pub use library::FunctionLibrary;
pub use parameter::{format_value, Field, Parameter, ParameterFields};
