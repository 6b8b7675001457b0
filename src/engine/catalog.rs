//! The parameter catalogue
//!
//! [`Catalog`] is the public face of the engine. Every mutating operation runs
//! in exactly one store transaction: either all of its effects are committed,
//! including the recomputed values of every dependent, or the store is rolled
//! back to where it was before the call.
//!
//! # Example
//!
//! ```rust
//! use param_catalog::{Catalog, MemoryStore, ParameterFields};
//!
//! let mut catalog = Catalog::new(MemoryStore::new());
//!
//! let fields = ParameterFields::new()
//!     .with_group("SI")
//!     .with_symbol("E")
//!     .with_units("GeV")
//!     .with_is_derived(false);
//! catalog.write("SI_energy", fields.clone().with_value("3")).unwrap();
//! catalog
//!     .write("SI_double", fields.clone().with_is_derived(true).with_value("\"SI_energy\" * 2"))
//!     .unwrap();
//! assert_eq!(catalog.read("SI_double").unwrap().value, "6");
//!
//! // Dependents follow their producers
//! catalog.write("SI_energy", fields.with_value("3.5")).unwrap();
//! assert_eq!(catalog.read("SI_double").unwrap().value, "7");
//! ```

use crate::config::CatalogConfig;
use crate::engine::dependents::{find_dependents, propagation_order};
use crate::engine::evaluator::Evaluator;
use crate::error::{CatalogError, Result};
use crate::parameters::parameter::wrap_math_tags;
use crate::parameters::references::{is_valid_name, rename_references};
use crate::parameters::{format_value, FunctionLibrary, Parameter, ParameterFields};
use crate::store::ParameterStore;
use std::collections::{BTreeSet, HashMap};

/// Outcome of [`Catalog::check`]
#[derive(Debug, Clone, PartialEq)]
pub enum CheckOutcome {
    /// The fields describe a primitive parameter; nothing to evaluate
    Primitive,

    /// The expression evaluates to `value` and references `dependencies`
    Derived {
        value: f64,
        dependencies: Vec<String>,
    },
}

/// A catalogue of primitive and derived parameters over a [`ParameterStore`]
#[derive(Debug)]
pub struct Catalog<S: ParameterStore> {
    store: S,
    config: CatalogConfig,
    library: FunctionLibrary,
}

impl<S: ParameterStore> Catalog<S> {
    /// Create a catalogue with the default configuration and the standard
    /// function library
    pub fn new(store: S) -> Self {
        Self::with_config(store, CatalogConfig::default())
    }

    pub fn with_config(store: S, config: CatalogConfig) -> Self {
        Self {
            store,
            config,
            library: FunctionLibrary::standard(),
        }
    }

    /// Replace the function library used to evaluate expressions
    pub fn with_library(mut self, library: FunctionLibrary) -> Self {
        self.library = library;
        self
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn library(&self) -> &FunctionLibrary {
        &self.library
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Read a parameter. The symbol comes back wrapped in `<math>` tags.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn read(&self, name: &str) -> Result<Parameter> {
        let mut parameter = self.store.read_parameter(name)?;
        parameter.symbol = wrap_math_tags(&parameter.symbol);
        Ok(parameter)
    }

    /// The stored, un-substituted expression of a derived parameter
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn read_expression(&self, name: &str) -> Result<String> {
        let parameter = self.store.read_parameter(name)?;
        if !parameter.is_derived {
            return Err(CatalogError::expression_not_found(name));
        }
        self.store.read_expression(name)
    }

    /// Direct producers of `name`, sorted
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn read_dependencies(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.store.read_dependencies(name)?.into_iter().collect())
    }

    /// Every parameter depending on `name`, directly or not, sorted
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn read_dependents(&self, name: &str) -> Result<Vec<String>> {
        let edges = self.store.read_all_dependency_edges()?;
        Ok(find_dependents(&edges, name).into_iter().collect())
    }

    /// Sorted names of the parameters in `subsystem`
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn list(&self, subsystem: &str, primitives_only: bool) -> Result<Vec<String>> {
        if !self.config.accepts_subsystem(subsystem) {
            return Err(CatalogError::UnknownSubsystem {
                subsystem: subsystem.to_string(),
            });
        }
        self.store.list_parameters(subsystem, primitives_only)
    }

    /// Validate and evaluate a write without changing the store
    #[tracing::instrument(level = "debug", skip(self, fields))]
    pub fn check(&self, name: &str, fields: ParameterFields) -> Result<CheckOutcome> {
        let parameter = fields.into_parameter(name)?;
        if !parameter.is_derived {
            return Ok(CheckOutcome::Primitive);
        }

        let evaluation = Evaluator::new(&self.store, &self.library, self.config.max_depth)
            .evaluate(name, &parameter.value)?;

        Ok(CheckOutcome::Derived {
            value: evaluation.value,
            dependencies: evaluation.dependencies.into_iter().collect(),
        })
    }

    /// Create or update a parameter and recompute all of its dependents.
    ///
    /// For a derived parameter `fields.value` is the expression; the stored
    /// value becomes the evaluated result.
    #[tracing::instrument(level = "debug", skip(self, fields))]
    pub fn write(&mut self, name: &str, fields: ParameterFields) -> Result<()> {
        let mut parameter = fields.into_parameter(name)?;

        self.transaction("write", |store, library, max_depth| {
            store.erase_dependencies(name)?;
            store.erase_expression(name)?;

            let mut overrides = HashMap::new();
            if parameter.is_derived {
                let text = std::mem::take(&mut parameter.value);
                let evaluation =
                    Evaluator::new(&*store, library, max_depth).evaluate(name, &text)?;

                store.write_expression(name, &text)?;
                store.write_dependencies(name, &evaluation.dependencies)?;
                parameter.value = format_value(evaluation.value);
                overrides.insert(name.to_string(), evaluation.value);
            }

            store.write_parameter(&parameter)?;
            propagate(store, library, max_depth, name, overrides)
        })
    }

    /// Rename a parameter and every reference to it
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn rename(&mut self, old: &str, new: &str) -> Result<()> {
        if !is_valid_name(new) {
            return Err(CatalogError::InvalidName {
                name: new.to_string(),
            });
        }

        self.transaction("rename", |store, _, _| {
            if !store.contains_parameter(old)? {
                return Err(CatalogError::parameter_not_found(old));
            }
            if old == new {
                return Ok(());
            }
            if store.contains_parameter(new)? {
                return Err(CatalogError::ParameterExists {
                    name: new.to_string(),
                });
            }

            let consumers: BTreeSet<String> = store
                .read_all_dependency_edges()?
                .into_iter()
                .filter(|edge| edge.producer == old)
                .map(|edge| edge.consumer)
                .collect();

            for consumer in &consumers {
                let text = store.read_expression(consumer)?;
                store.write_expression(consumer, &rename_references(&text, old, new))?;
            }

            store.rename_all(old, new)
        })
    }

    /// Remove a parameter nothing depends on
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn erase(&mut self, name: &str) -> Result<()> {
        self.transaction("erase", |store, _, _| {
            if !store.contains_parameter(name)? {
                return Err(CatalogError::parameter_not_found(name));
            }

            let edges = store.read_all_dependency_edges()?;
            let dependents = find_dependents(&edges, name);
            if !dependents.is_empty() {
                return Err(CatalogError::DependentsExist {
                    name: name.to_string(),
                    dependents: dependents.into_iter().collect(),
                });
            }

            store.erase_dependencies(name)?;
            store.erase_expression(name)?;
            store.erase_parameter(name)
        })
    }

    fn transaction<T, F>(&mut self, operation: &'static str, f: F) -> Result<T>
    where
        F: FnOnce(&mut S, &FunctionLibrary, usize) -> Result<T>,
    {
        let Catalog {
            store,
            config,
            library,
        } = self;

        store.begin()?;
        let result = f(&mut *store, &*library, config.max_depth).and_then(|value| {
            store.commit()?;
            Ok(value)
        });

        if let Err(err) = &result {
            tracing::warn!(operation, error = %err, "rolling back");
            if let Err(rollback_err) = store.rollback() {
                tracing::warn!(operation, error = %rollback_err, "rollback failed");
            }
        }

        result
    }
}

/// Recompute the dependents of `name` in dependency order. Each new value is
/// written back and also handed to the evaluations that follow.
fn propagate<S: ParameterStore + ?Sized>(
    store: &mut S,
    library: &FunctionLibrary,
    max_depth: usize,
    name: &str,
    mut overrides: HashMap<String, f64>,
) -> Result<()> {
    let edges = store.read_all_dependency_edges()?;
    let order = propagation_order(&edges, name, max_depth)?;

    for dependent in order {
        let text = store.read_expression(&dependent)?;
        let evaluation = Evaluator::new(&*store, library, max_depth)
            .with_overrides(&overrides)
            .evaluate(&dependent, &text)?;

        let mut parameter = store.read_parameter(&dependent)?;
        parameter.value = format_value(evaluation.value);
        store.write_parameter(&parameter)?;

        tracing::debug!(parameter = %dependent, value = evaluation.value, "propagated");
        overrides.insert(dependent, evaluation.value);
    }

    Ok(())
}
