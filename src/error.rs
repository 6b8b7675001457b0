use crate::config::ConfigError;
use crate::store::StoreError;
use thiserror::Error;

/// Error types for the param-catalog library.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// No parameter row exists under this name.
    #[error("parameter \"{name}\" not found")]
    ParameterNotFound { name: String },

    /// The parameter is flagged as derived but has no stored expression.
    #[error("expression for parameter \"{name}\" not found")]
    ExpressionNotFound { name: String },

    /// An expression with an unterminated quoted reference.
    #[error("quotes in expression `{expression}` did not match")]
    MalformedExpression { expression: String },

    /// The fully substituted expression was rejected by the sandbox or failed to evaluate.
    #[error("invalid expression for {name}: {message}")]
    InvalidExpression { name: String, message: String },

    /// Resolution ran into a cycle or past the configured depth ceiling.
    #[error("dependency chain of \"{name}\" is cyclic or deeper than {max_depth} levels")]
    CyclicOrTooDeepDependency { name: String, max_depth: usize },

    /// A write was missing one or more required fields.
    #[error("missing field{}: {}", plural(.fields), .fields.join(", "))]
    MissingFields { fields: Vec<String> },

    /// Erase refused because other parameters still depend on this one.
    #[error("cannot erase parameter \"{name}\" with dependents ({})", .dependents.join(", "))]
    DependentsExist { name: String, dependents: Vec<String> },

    /// Rename target is already taken.
    #[error("cannot overwrite existing parameter \"{name}\"")]
    ParameterExists { name: String },

    /// Parameter names must be non-empty and free of the quote character.
    #[error("invalid parameter name `{name}`")]
    InvalidName { name: String },

    /// Listing requested for a subsystem outside the configured set.
    #[error("subsystem {subsystem} not found")]
    UnknownSubsystem { subsystem: String },

    /// Transaction or query failure in the underlying store.
    #[error("store failure: {0}")]
    StoreFailure(#[from] StoreError),

    /// Configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl CatalogError {
    /// Whether this error reports an absent parameter or expression.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            CatalogError::ParameterNotFound { .. } | CatalogError::ExpressionNotFound { .. }
        )
    }

    pub(crate) fn parameter_not_found(name: &str) -> Self {
        CatalogError::ParameterNotFound {
            name: name.to_string(),
        }
    }

    pub(crate) fn expression_not_found(name: &str) -> Self {
        CatalogError::ExpressionNotFound {
            name: name.to_string(),
        }
    }
}

fn plural(fields: &[String]) -> &'static str {
    if fields.len() > 1 {
        "s"
    } else {
        ""
    }
}

/// Result type alias for param-catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
