//! Evaluation of derived parameters
//!
//! An expression is evaluated by resolving each quoted reference to a number,
//! substituting the numbers into the parsed AST, running the sandbox check, and
//! evaluating the result.
//!
//! Derived references are resolved on an explicit work-list of frames, one per
//! expression still waiting on its references, so the depth of a dependency
//! chain costs heap rather than call stack. Each reference is resolved once per
//! evaluation. Meeting a name that already has an open frame, or going deeper
//! than the configured ceiling, fails with
//! [`CatalogError::CyclicOrTooDeepDependency`].

use crate::error::{CatalogError, Result};
use crate::parameters::expression::{Expression, ExpressionError};
use crate::parameters::references::extract_dependencies;
use crate::parameters::{sandbox, FunctionLibrary};
use crate::store::ParameterStore;
use std::collections::{BTreeSet, HashMap};

/// Result of evaluating one expression
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// The computed value
    pub value: f64,

    /// Names the expression references directly
    pub dependencies: BTreeSet<String>,
}

/// Depth-bounded, cycle-checked evaluator reading from a store
pub struct Evaluator<'a, S: ParameterStore + ?Sized> {
    store: &'a S,
    library: &'a FunctionLibrary,
    max_depth: usize,
    resolved: HashMap<String, f64>,
}

/// A derived parameter whose references are being resolved
struct Frame {
    name: String,
    expr: Expression,
    dependencies: BTreeSet<String>,
    /// References not yet resolved, next one last
    pending: Vec<String>,
    depth: usize,
}

impl Frame {
    fn open(name: &str, text: &str, depth: usize) -> Result<Self> {
        let dependencies = extract_dependencies(text)?;
        let expr = Expression::parse(text).map_err(|e| invalid(name, e))?;
        let pending = dependencies.iter().rev().cloned().collect();

        Ok(Self {
            name: name.to_string(),
            expr,
            dependencies,
            pending,
            depth,
        })
    }
}

impl<'a, S: ParameterStore + ?Sized> Evaluator<'a, S> {
    pub fn new(store: &'a S, library: &'a FunctionLibrary, max_depth: usize) -> Self {
        Self {
            store,
            library,
            max_depth,
            resolved: HashMap::new(),
        }
    }

    /// Use these values instead of reading the named parameters from the store
    pub fn with_overrides(mut self, overrides: &HashMap<String, f64>) -> Self {
        self.resolved
            .extend(overrides.iter().map(|(name, value)| (name.clone(), *value)));
        self
    }

    /// Evaluate `text` as the expression of parameter `name`.
    ///
    /// `name` is treated as being under resolution, so any path that leads
    /// back to it is reported as a cycle.
    pub fn evaluate(&mut self, name: &str, text: &str) -> Result<Evaluation> {
        let mut root = Frame::open(name, text, 0)?;
        let mut frames: Vec<Frame> = Vec::new();

        loop {
            let frame = frames.last_mut().unwrap_or(&mut root);
            let depth = frame.depth + 1;

            let Some(dependency) = frame.pending.pop() else {
                match frames.pop() {
                    Some(done) => {
                        let value = self.finish(&done)?;
                        self.resolved.insert(done.name, value);
                        continue;
                    }
                    None => break,
                }
            };

            if self.resolved.contains_key(&dependency) {
                continue;
            }

            if depth > self.max_depth
                || root.name == dependency
                || frames.iter().any(|f| f.name == dependency)
            {
                return Err(CatalogError::CyclicOrTooDeepDependency {
                    name: dependency,
                    max_depth: self.max_depth,
                });
            }

            let parameter = self.store.read_parameter(&dependency)?;
            if parameter.is_derived {
                let text = self.store.read_expression(&dependency)?;
                frames.push(Frame::open(&dependency, &text, depth)?);
            } else {
                let value = self.evaluate_literal(&dependency, &parameter.value)?;
                self.resolved.insert(dependency, value);
            }
        }

        let value = self.finish(&root)?;
        Ok(Evaluation {
            value,
            dependencies: root.dependencies,
        })
    }

    /// Numeric value of a primitive parameter's literal text
    pub fn evaluate_literal(&self, name: &str, text: &str) -> Result<f64> {
        let expr = sandbox::sanitize(text, self.library).map_err(|e| invalid(name, e))?;
        let value = expr.evaluate(self.library).map_err(|e| invalid(name, e))?;
        finite(name, value)
    }

    /// Evaluate a frame whose references are all resolved
    fn finish(&self, frame: &Frame) -> Result<f64> {
        let name = frame.name.as_str();
        let substituted = frame.expr.substitute(&self.resolved);
        sandbox::check(&substituted, self.library).map_err(|e| invalid(name, e))?;
        let value = substituted
            .evaluate(self.library)
            .map_err(|e| invalid(name, e))?;
        let value = finite(name, value)?;

        tracing::debug!(parameter = name, depth = frame.depth, value, "evaluated expression");
        Ok(value)
    }
}

fn invalid(name: &str, err: ExpressionError) -> CatalogError {
    CatalogError::InvalidExpression {
        name: name.to_string(),
        message: err.to_string(),
    }
}

/// Cached values must read back through the parser
fn finite(name: &str, value: f64) -> Result<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(invalid(
            name,
            ExpressionError::InvalidOperation {
                message: format!("result is not a finite number: {}", value),
            },
        ))
    }
}
