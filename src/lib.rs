//! # param-catalog
//!
//! `param-catalog` keeps a catalogue of named numeric parameters. Some are
//! primitive literals, others are derived from arithmetic expressions that
//! reference other parameters by quoted name (`"SI_energy" * 2`).
//!
//! The library provides:
//! - A sandboxed expression language with a fixed whitelist of functions and constants
//! - Work-list evaluation with cycle detection and a depth ceiling
//! - Automatic recomputation of every dependent when a parameter changes
//! - Atomic write, rename and erase over a transactional store
//! - An in-memory store and a SQLite store
//!
//! ## Basic Usage
//!
//! ```
//! use param_catalog::{Catalog, MemoryStore, ParameterFields};
//!
//! let mut catalog = Catalog::new(MemoryStore::new());
//! let fields = ParameterFields::new()
//!     .with_group("LI")
//!     .with_symbol("f")
//!     .with_units("MHz")
//!     .with_is_derived(false);
//!
//! catalog.write("LI_rf_frequency", fields.clone().with_value("3000")).unwrap();
//! catalog
//!     .write(
//!         "LI_rf_wavelength",
//!         fields.with_is_derived(true).with_value("rf_wavelength(\"LI_rf_frequency\")"),
//!     )
//!     .unwrap();
//!
//! let wavelength = catalog.read("LI_rf_wavelength").unwrap();
//! assert!((wavelength.numeric_value().unwrap() - 0.0999308).abs() < 1e-6);
//! assert_eq!(catalog.read_dependents("LI_rf_frequency").unwrap(), vec!["LI_rf_wavelength"]);
//! ```

// Public modules
pub mod config;
pub mod engine;
pub mod error;
pub mod parameters;
pub mod physics;
pub mod store;

// Re-exports for convenience
pub use config::CatalogConfig;
pub use engine::{Catalog, CheckOutcome};
pub use error::{CatalogError, Result};
pub use parameters::{Expression, Field, FunctionLibrary, Parameter, ParameterFields};
pub use physics::PhysicalConstants;
pub use store::{DependencyEdge, MemoryStore, ParameterStore};

#[cfg(feature = "sqlite")]
pub use store::SqliteStore;

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
