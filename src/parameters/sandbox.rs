//! Sandbox check for fully substituted expressions
//!
//! After every reference has been replaced by a number, an expression may only
//! contain numeric literals, the four arithmetic operators, parentheses, and
//! identifiers known to the [`FunctionLibrary`]. The check walks the parsed
//! tree, so names such as `__import__` or `system` can never reach evaluation.

use crate::parameters::expression::{EvaluationContext, ExprResult, Expression, ExpressionError};
use crate::parameters::library::FunctionLibrary;

/// Verify that a parsed expression only uses whitelisted names.
pub fn check<C: EvaluationContext + ?Sized>(expr: &Expression, context: &C) -> ExprResult<()> {
    match expr {
        Expression::Number(_) => Ok(()),
        Expression::Constant(name) => {
            if context.has_constant(name) {
                Ok(())
            } else {
                Err(ExpressionError::UnknownConstant { name: name.clone() })
            }
        }
        Expression::Reference(name) => {
            Err(ExpressionError::UnresolvedReference { name: name.clone() })
        }
        Expression::Unary(_, inner) => check(inner, context),
        Expression::Binary(_, left, right) => {
            check(left, context)?;
            check(right, context)
        }
        Expression::Function(name, args) => {
            if !context.has_function(name) {
                return Err(ExpressionError::UndefinedFunction { name: name.clone() });
            }
            args.iter().try_for_each(|arg| check(arg, context))
        }
    }
}

/// Parse `text` and run the sandbox check over the result.
pub fn sanitize<C: EvaluationContext + ?Sized>(text: &str, context: &C) -> ExprResult<Expression> {
    let expr = Expression::parse(text)?;
    check(&expr, context)?;
    Ok(expr)
}

/// Whether `text` is an acceptable, fully substituted expression
pub fn validate(text: &str, library: &FunctionLibrary) -> bool {
    sanitize(text, library).is_ok()
}
