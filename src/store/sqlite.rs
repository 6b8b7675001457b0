//! SQLite-backed parameter store
//!
//! Schema:
//!
//! ```text
//! parameter(name PRIMARY KEY, team, symbol, units, is_derived, value)
//! expression(name PRIMARY KEY, expression)
//! dependency(name, dependency, PRIMARY KEY (name, dependency))
//! ```
//!
//! `dependency.name` is the consumer and `dependency.dependency` the producer.
//! No foreign keys are declared: an edge to a missing producer is reported only
//! when the consumer is evaluated.

use crate::error::{CatalogError, Result};
use crate::parameters::Parameter;
use crate::store::{DependencyEdge, ParameterStore, StoreError};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

fn init(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS parameter (
          name TEXT PRIMARY KEY,
          team TEXT NOT NULL,
          symbol TEXT NOT NULL,
          units TEXT NOT NULL,
          is_derived INTEGER NOT NULL,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS expression (
          name TEXT PRIMARY KEY,
          expression TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS dependency (
          name TEXT NOT NULL,
          dependency TEXT NOT NULL,
          PRIMARY KEY (name, dependency)
        );

        CREATE INDEX IF NOT EXISTS idx_dependency_producer ON dependency(dependency);
        "#,
    )
}

/// A [`ParameterStore`] over a SQLite database
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(Duration::from_secs(5))?;
        init(&conn)?;
        Ok(Self { conn })
    }

    /// Whether a transaction is open
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }
}

impl ParameterStore for SqliteStore {
    fn begin(&mut self) -> Result<()> {
        if self.in_transaction() {
            return Err(StoreError::TransactionActive.into());
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Err(StoreError::NoTransaction.into());
        }
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction() {
            return Err(StoreError::NoTransaction.into());
        }
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn read_parameter(&self, name: &str) -> Result<Parameter> {
        let row = self
            .conn
            .query_row(
                "SELECT name, team, symbol, units, is_derived, value FROM parameter WHERE name = ?1",
                params![name],
                |r| {
                    Ok(Parameter {
                        name: r.get(0)?,
                        group: r.get(1)?,
                        symbol: r.get(2)?,
                        units: r.get(3)?,
                        is_derived: r.get(4)?,
                        value: r.get(5)?,
                    })
                },
            )
            .optional()?;

        row.ok_or_else(|| CatalogError::parameter_not_found(name))
    }

    fn read_expression(&self, name: &str) -> Result<String> {
        let text = self
            .conn
            .query_row(
                "SELECT expression FROM expression WHERE name = ?1",
                params![name],
                |r| r.get(0),
            )
            .optional()?;

        text.ok_or_else(|| CatalogError::expression_not_found(name))
    }

    fn read_dependencies(&self, name: &str) -> Result<BTreeSet<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT dependency FROM dependency WHERE name = ?1")?;
        let rows = stmt.query_map(params![name], |r| r.get::<_, String>(0))?;

        let mut producers = BTreeSet::new();
        for producer in rows {
            producers.insert(producer?);
        }
        Ok(producers)
    }

    fn read_all_dependency_edges(&self) -> Result<Vec<DependencyEdge>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, dependency FROM dependency ORDER BY name, dependency")?;
        let rows = stmt.query_map([], |r| {
            Ok(DependencyEdge {
                consumer: r.get(0)?,
                producer: r.get(1)?,
            })
        })?;

        let mut edges = Vec::new();
        for edge in rows {
            edges.push(edge?);
        }
        Ok(edges)
    }

    fn list_parameters(&self, prefix: &str, primitives_only: bool) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT name
            FROM parameter
            WHERE substr(name, 1, length(?1)) = ?1
              AND (?2 = 0 OR is_derived = 0)
            ORDER BY name
            "#,
        )?;
        let rows = stmt.query_map(params![prefix, primitives_only], |r| r.get::<_, String>(0))?;

        let mut names = Vec::new();
        for name in rows {
            names.push(name?);
        }
        Ok(names)
    }

    fn write_parameter(&mut self, parameter: &Parameter) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO parameter (name, team, symbol, units, is_derived, value)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(name) DO UPDATE SET
              team = excluded.team,
              symbol = excluded.symbol,
              units = excluded.units,
              is_derived = excluded.is_derived,
              value = excluded.value
            "#,
            params![
                &parameter.name,
                &parameter.group,
                &parameter.symbol,
                &parameter.units,
                parameter.is_derived,
                &parameter.value
            ],
        )?;
        Ok(())
    }

    fn write_expression(&mut self, name: &str, text: &str) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO expression (name, expression) VALUES (?1, ?2)
            ON CONFLICT(name) DO UPDATE SET expression = excluded.expression
            "#,
            params![name, text],
        )?;
        Ok(())
    }

    fn write_dependencies(&mut self, name: &str, producers: &BTreeSet<String>) -> Result<()> {
        let mut stmt = self
            .conn
            .prepare("INSERT OR IGNORE INTO dependency (name, dependency) VALUES (?1, ?2)")?;
        for producer in producers {
            stmt.execute(params![name, producer])?;
        }
        Ok(())
    }

    fn erase_parameter(&mut self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM parameter WHERE name = ?1", params![name])?;
        Ok(())
    }

    fn erase_expression(&mut self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM expression WHERE name = ?1", params![name])?;
        Ok(())
    }

    fn erase_dependencies(&mut self, name: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM dependency WHERE name = ?1", params![name])?;
        Ok(())
    }

    fn rename_all(&mut self, old: &str, new: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE parameter SET name = ?2 WHERE name = ?1",
            params![old, new],
        )?;
        self.conn.execute(
            "UPDATE expression SET name = ?2 WHERE name = ?1",
            params![old, new],
        )?;
        self.conn.execute(
            "UPDATE dependency SET name = ?2 WHERE name = ?1",
            params![old, new],
        )?;
        self.conn.execute(
            "UPDATE dependency SET dependency = ?2 WHERE dependency = ?1",
            params![old, new],
        )?;
        Ok(())
    }
}

impl From<rusqlite::Error> for CatalogError {
    fn from(err: rusqlite::Error) -> Self {
        CatalogError::StoreFailure(StoreError::Sqlite(err))
    }
}
