//! Quoted-reference handling on raw expression text
//!
//! References are written as `"NAME"`. Splitting the text on the quote
//! character puts every reference at an odd index, which is how both the
//! extractor and the renamer find them without a full parse.

use crate::error::{CatalogError, Result};
use std::collections::BTreeSet;

/// Names referenced by `expression`, sorted and deduplicated.
///
/// Fails with [`CatalogError::MalformedExpression`] when the quotes are unbalanced.
///
/// # Examples
///
/// ```
/// use param_catalog::parameters::references::extract_dependencies;
///
/// let deps = extract_dependencies(r#""A" * "B" + "A""#).unwrap();
/// assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["A", "B"]);
/// ```
pub fn extract_dependencies(expression: &str) -> Result<BTreeSet<String>> {
    let pieces: Vec<&str> = expression.split('"').collect();
    if pieces.len() % 2 == 0 {
        return Err(CatalogError::MalformedExpression {
            expression: expression.to_string(),
        });
    }

    Ok(pieces
        .iter()
        .skip(1)
        .step_by(2)
        .map(|name| name.to_string())
        .collect())
}

/// Replace every quoted reference to `old` by a reference to `new`.
///
/// Only whole reference tokens are rewritten: `"AB"` is untouched when renaming
/// `A`, and so is unquoted text that happens to contain `A`.
pub fn rename_references(expression: &str, old: &str, new: &str) -> String {
    expression
        .split('"')
        .enumerate()
        .map(|(i, piece)| if i % 2 == 1 && piece == old { new } else { piece })
        .collect::<Vec<_>>()
        .join("\"")
}

/// Wrap a parameter name as a reference token
pub fn quote(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Parameter names must be non-empty and cannot contain the quote character
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('"')
}
