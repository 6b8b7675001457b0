//! Persistent store interface
//!
//! The engine talks to storage only through [`ParameterStore`]. A store holds
//! three record kinds: parameter rows, expression texts and dependency edges.
//! It must support one open transaction at a time; every catalog operation
//! runs inside `begin` .. `commit`, and calls `rollback` on failure.

pub mod memory;
#[cfg(feature = "sqlite")]
pub mod sqlite;

use crate::error::{CatalogError, Result};
use crate::parameters::Parameter;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

pub use memory::MemoryStore;
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteStore;

/// Error raised by a store backend
#[derive(Error, Debug)]
pub enum StoreError {
    #[cfg(feature = "sqlite")]
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("a transaction is already active")]
    TransactionActive,

    #[error("no active transaction")]
    NoTransaction,

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

/// `consumer`'s expression references `producer`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DependencyEdge {
    pub consumer: String,
    pub producer: String,
}

impl DependencyEdge {
    pub fn new(consumer: impl Into<String>, producer: impl Into<String>) -> Self {
        Self {
            consumer: consumer.into(),
            producer: producer.into(),
        }
    }
}

/// Transactional storage for parameters, expressions and dependency edges.
///
/// Reads of absent records fail with [`CatalogError::ParameterNotFound`] or
/// [`CatalogError::ExpressionNotFound`]. Backend failures surface as
/// [`CatalogError::StoreFailure`].
pub trait ParameterStore {
    /// Open a transaction. Nested transactions are not supported.
    fn begin(&mut self) -> Result<()>;

    /// Make every change since `begin` permanent
    fn commit(&mut self) -> Result<()>;

    /// Discard every change since `begin`
    fn rollback(&mut self) -> Result<()>;

    fn read_parameter(&self, name: &str) -> Result<Parameter>;

    fn contains_parameter(&self, name: &str) -> Result<bool> {
        match self.read_parameter(name) {
            Ok(_) => Ok(true),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Un-substituted expression text of a derived parameter
    fn read_expression(&self, name: &str) -> Result<String>;

    /// Direct producers of `name`. Empty for unknown names.
    fn read_dependencies(&self, name: &str) -> Result<BTreeSet<String>>;

    /// The whole dependency edge table
    fn read_all_dependency_edges(&self) -> Result<Vec<DependencyEdge>>;

    /// Names starting with `prefix`, sorted. With `primitives_only`, derived
    /// parameters are left out.
    fn list_parameters(&self, prefix: &str, primitives_only: bool) -> Result<Vec<String>>;

    /// Insert the row, or replace the row with the same name
    fn write_parameter(&mut self, parameter: &Parameter) -> Result<()>;

    /// Insert or replace the expression text of `name`
    fn write_expression(&mut self, name: &str, text: &str) -> Result<()>;

    /// Add an edge from `name` to each producer
    fn write_dependencies(&mut self, name: &str, producers: &BTreeSet<String>) -> Result<()>;

    fn erase_parameter(&mut self, name: &str) -> Result<()>;

    fn erase_expression(&mut self, name: &str) -> Result<()>;

    /// Remove the edges whose consumer is `name`
    fn erase_dependencies(&mut self, name: &str) -> Result<()>;

    /// Re-key every record kind from `old` to `new`, including both ends of
    /// dependency edges. Expression texts are not touched.
    fn rename_all(&mut self, old: &str, new: &str) -> Result<()>;
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::StoreFailure(StoreError::Json(err))
    }
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::StoreFailure(StoreError::Io(err))
    }
}
