//! Configuration options for the parameter catalog.
//!
//! The configuration is an explicit value handed to [`Catalog`](crate::Catalog)
//! at construction time. It can be built in code or loaded from JSON.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Default ceiling for the dependency resolution depth.
pub const DEFAULT_MAX_DEPTH: usize = 1000;

/// Subsystem prefixes accepted by [`Catalog::list`](crate::Catalog::list) by default.
pub const DEFAULT_SUBSYSTEMS: [&str; 5] = ["LI", "TB", "BO", "TS", "SI"];

/// Error that can occur while loading a configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON deserialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

/// Configuration options for the catalog engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Maximum depth of the recursive dependency resolution. Default: 1000
    pub max_depth: usize,

    /// Subsystem prefixes that may be listed. An empty list accepts any prefix.
    /// Default: LI, TB, BO, TS, SI
    pub subsystems: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            subsystems: DEFAULT_SUBSYSTEMS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl CatalogConfig {
    /// Create the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the depth ceiling for dependency resolution
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Replace the accepted subsystem prefixes
    pub fn with_subsystems<I, S>(mut self, subsystems: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.subsystems = subsystems.into_iter().map(Into::into).collect();
        self
    }

    /// Whether `subsystem` may be listed under this configuration
    pub fn accepts_subsystem(&self, subsystem: &str) -> bool {
        self.subsystems.is_empty() || self.subsystems.iter().any(|s| s == subsystem)
    }

    /// Parse a configuration from a JSON string. Missing keys take their defaults.
    ///
    /// # Examples
    ///
    /// ```
    /// use param_catalog::CatalogConfig;
    ///
    /// let config = CatalogConfig::from_json(r#"{ "max_depth": 64 }"#).unwrap();
    /// assert_eq!(config.max_depth, 64);
    /// assert_eq!(config.subsystems.len(), 5);
    /// ```
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: CatalogConfig = serde_json::from_str(json)?;
        config.validated()
    }

    /// Load a configuration from a JSON file
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        Self::from_json(&contents)
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(self)
    }
}
