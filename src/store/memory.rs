//! In-memory parameter store
//!
//! Tables are kept in ordered maps. A transaction takes a snapshot of all
//! tables at `begin`; `rollback` restores it and `commit` drops it.

use crate::error::{CatalogError, Result};
use crate::parameters::Parameter;
use crate::store::{DependencyEdge, ParameterStore, StoreError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct Tables {
    parameters: BTreeMap<String, Parameter>,
    expressions: BTreeMap<String, String>,
    dependencies: BTreeSet<DependencyEdge>,
}

/// A [`ParameterStore`] held entirely in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Tables,
    snapshot: Option<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Serialize the committed contents to a JSON string
    ///
    /// # Examples
    ///
    /// ```
    /// use param_catalog::MemoryStore;
    ///
    /// let store = MemoryStore::new();
    /// let json = store.to_json().unwrap();
    /// let restored = MemoryStore::from_json(&json).unwrap();
    /// assert_eq!(restored.to_json().unwrap(), json);
    /// ```
    pub fn to_json(&self) -> Result<String> {
        let tables = self.snapshot.as_ref().unwrap_or(&self.tables);
        Ok(serde_json::to_string_pretty(tables)?)
    }

    /// Build a store from the output of [`to_json`](Self::to_json)
    pub fn from_json(json: &str) -> Result<Self> {
        let tables: Tables = serde_json::from_str(json)?;
        for (key, parameter) in &tables.parameters {
            if key != &parameter.name {
                return Err(CatalogError::StoreFailure(StoreError::CorruptRow(format!(
                    "parameter stored under \"{}\" is named \"{}\"",
                    key, parameter.name
                ))));
            }
        }
        Ok(Self {
            tables,
            snapshot: None,
        })
    }

    /// Save the committed contents to a JSON file
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Load a store from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }
}

impl ParameterStore for MemoryStore {
    fn begin(&mut self) -> Result<()> {
        if self.snapshot.is_some() {
            return Err(StoreError::TransactionActive.into());
        }
        self.snapshot = Some(self.tables.clone());
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        match self.snapshot.take() {
            Some(_) => Ok(()),
            None => Err(StoreError::NoTransaction.into()),
        }
    }

    fn rollback(&mut self) -> Result<()> {
        match self.snapshot.take() {
            Some(tables) => {
                self.tables = tables;
                Ok(())
            }
            None => Err(StoreError::NoTransaction.into()),
        }
    }

    fn read_parameter(&self, name: &str) -> Result<Parameter> {
        self.tables
            .parameters
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::parameter_not_found(name))
    }

    fn read_expression(&self, name: &str) -> Result<String> {
        self.tables
            .expressions
            .get(name)
            .cloned()
            .ok_or_else(|| CatalogError::expression_not_found(name))
    }

    fn read_dependencies(&self, name: &str) -> Result<BTreeSet<String>> {
        Ok(self
            .tables
            .dependencies
            .iter()
            .filter(|edge| edge.consumer == name)
            .map(|edge| edge.producer.clone())
            .collect())
    }

    fn read_all_dependency_edges(&self) -> Result<Vec<DependencyEdge>> {
        Ok(self.tables.dependencies.iter().cloned().collect())
    }

    fn list_parameters(&self, prefix: &str, primitives_only: bool) -> Result<Vec<String>> {
        Ok(self
            .tables
            .parameters
            .values()
            .filter(|p| p.name.starts_with(prefix))
            .filter(|p| !(primitives_only && p.is_derived))
            .map(|p| p.name.clone())
            .collect())
    }

    fn write_parameter(&mut self, parameter: &Parameter) -> Result<()> {
        self.tables
            .parameters
            .insert(parameter.name.clone(), parameter.clone());
        Ok(())
    }

    fn write_expression(&mut self, name: &str, text: &str) -> Result<()> {
        self.tables
            .expressions
            .insert(name.to_string(), text.to_string());
        Ok(())
    }

    fn write_dependencies(&mut self, name: &str, producers: &BTreeSet<String>) -> Result<()> {
        for producer in producers {
            self.tables
                .dependencies
                .insert(DependencyEdge::new(name, producer.as_str()));
        }
        Ok(())
    }

    fn erase_parameter(&mut self, name: &str) -> Result<()> {
        self.tables.parameters.remove(name);
        Ok(())
    }

    fn erase_expression(&mut self, name: &str) -> Result<()> {
        self.tables.expressions.remove(name);
        Ok(())
    }

    fn erase_dependencies(&mut self, name: &str) -> Result<()> {
        self.tables.dependencies.retain(|edge| edge.consumer != name);
        Ok(())
    }

    fn rename_all(&mut self, old: &str, new: &str) -> Result<()> {
        if let Some(mut parameter) = self.tables.parameters.remove(old) {
            parameter.name = new.to_string();
            self.tables.parameters.insert(new.to_string(), parameter);
        }

        if let Some(text) = self.tables.expressions.remove(old) {
            self.tables.expressions.insert(new.to_string(), text);
        }

        let rekey = |name: String| if name == old { new.to_string() } else { name };
        let edges = std::mem::take(&mut self.tables.dependencies);
        self.tables.dependencies = edges
            .into_iter()
            .map(|edge| DependencyEdge {
                consumer: rekey(edge.consumer),
                producer: rekey(edge.producer),
            })
            .collect();

        Ok(())
    }
}
