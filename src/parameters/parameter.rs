//! Parameter records and the field set accepted by writes
//!
//! A [`Parameter`] is a catalogue row. Its `value` is text: for a primitive
//! parameter it is whatever the user entered, for a derived parameter it is the
//! last computed result, formatted by [`format_value`].

use crate::error::{CatalogError, Result};
use crate::parameters::references::is_valid_name;
use serde::{Deserialize, Serialize};
use std::fmt;

const MATH_OPEN: &str = "<math>";
const MATH_CLOSE: &str = "</math>";

/// A named entry in the parameter catalogue
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Unique name of the parameter
    pub name: String,

    /// Free-text grouping label
    pub group: String,

    /// Display symbol. Stored bare, read back wrapped in `<math>` tags.
    pub symbol: String,

    /// Free-text units
    pub units: String,

    /// Whether the value is computed from an expression
    pub is_derived: bool,

    /// Literal value for primitive parameters, cached result for derived ones
    pub value: String,
}

impl Parameter {
    /// The value parsed as a number, if it is one
    pub fn numeric_value(&self) -> Option<f64> {
        self.value.trim().parse().ok()
    }
}

/// The fields a write must supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Group,
    Symbol,
    Units,
    IsDerived,
    Value,
}

impl Field {
    /// Every required field, in reporting order
    pub const ALL: [Field; 5] = [
        Field::Group,
        Field::Symbol,
        Field::Units,
        Field::IsDerived,
        Field::Value,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::Group => "group",
            Field::Symbol => "symbol",
            Field::Units => "units",
            Field::IsDerived => "is_derived",
            Field::Value => "value",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field values for a write or check request.
///
/// `None` marks an absent field. An empty string is a present value.
///
/// # Examples
///
/// ```
/// use param_catalog::ParameterFields;
///
/// let fields = ParameterFields::new()
///     .with_group("Storage ring")
///     .with_symbol("<math>E</math>")
///     .with_units("GeV")
///     .with_is_derived(false)
///     .with_value("3.0");
/// assert!(fields.missing().is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterFields {
    pub group: Option<String>,
    pub symbol: Option<String>,
    pub units: Option<String>,
    pub is_derived: Option<bool>,
    pub value: Option<String>,
}

impl ParameterFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    pub fn with_is_derived(mut self, is_derived: bool) -> Self {
        self.is_derived = Some(is_derived);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Set a field from form text. `is_derived` accepts `true` in any case,
    /// anything else is false.
    pub fn set_text(&mut self, field: Field, text: &str) {
        match field {
            Field::Group => self.group = Some(text.to_string()),
            Field::Symbol => self.symbol = Some(text.to_string()),
            Field::Units => self.units = Some(text.to_string()),
            Field::IsDerived => self.is_derived = Some(parse_flag(text)),
            Field::Value => self.value = Some(text.to_string()),
        }
    }

    /// All fields of an existing parameter, e.g. to re-write it unchanged
    pub fn from_parameter(parameter: &Parameter) -> Self {
        Self {
            group: Some(parameter.group.clone()),
            symbol: Some(parameter.symbol.clone()),
            units: Some(parameter.units.clone()),
            is_derived: Some(parameter.is_derived),
            value: Some(parameter.value.clone()),
        }
    }

    /// Required fields that are absent
    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .iter()
            .copied()
            .filter(|field| match field {
                Field::Group => self.group.is_none(),
                Field::Symbol => self.symbol.is_none(),
                Field::Units => self.units.is_none(),
                Field::IsDerived => self.is_derived.is_none(),
                Field::Value => self.value.is_none(),
            })
            .collect()
    }

    /// Validate the name and fields and build the row to store.
    pub(crate) fn into_parameter(self, name: &str) -> Result<Parameter> {
        if !is_valid_name(name) {
            return Err(CatalogError::InvalidName {
                name: name.to_string(),
            });
        }

        match (self.group, self.symbol, self.units, self.is_derived, self.value) {
            (Some(group), Some(symbol), Some(units), Some(is_derived), Some(value)) => {
                Ok(Parameter {
                    name: name.to_string(),
                    group,
                    symbol: strip_math_tags(&symbol),
                    units,
                    is_derived,
                    value,
                })
            }
            (group, symbol, units, is_derived, value) => {
                let missing = ParameterFields {
                    group,
                    symbol,
                    units,
                    is_derived,
                    value,
                }
                .missing();
                Err(CatalogError::MissingFields {
                    fields: missing.iter().map(|f| f.as_str().to_string()).collect(),
                })
            }
        }
    }
}

/// Interpret a form flag: `true` in any letter case
pub fn parse_flag(text: &str) -> bool {
    text.trim().eq_ignore_ascii_case("true")
}

/// Wrap a bare symbol in `<math>` tags
pub fn wrap_math_tags(symbol: &str) -> String {
    format!("{}{}{}", MATH_OPEN, symbol, MATH_CLOSE)
}

/// Remove every `<math>` and `</math>` tag from a symbol
pub fn strip_math_tags(symbol: &str) -> String {
    symbol.replace(MATH_OPEN, "").replace(MATH_CLOSE, "")
}

/// Text form of a computed value, readable back by the expression parser.
///
/// Plain decimal for magnitudes in `[1e-4, 1e16)` and zero, scientific otherwise.
pub fn format_value(value: f64) -> String {
    let magnitude = value.abs();
    if value == 0.0 || (1e-4..1e16).contains(&magnitude) {
        value.to_string()
    } else {
        format!("{:e}", value)
    }
}
