//! Expression parsing and evaluation for derived parameters
//!
//! Derived parameters are defined by arithmetic expressions over numeric
//! literals, named constants, whitelisted function calls and quoted references
//! to other parameters (`"SI_energy" * 2`). This module parses that grammar into
//! an AST with nom and evaluates it with native `f64` arithmetic. Nothing is ever
//! handed to a general-purpose interpreter.
//!
//! Grammar:
//!
//! ```text
//! expr     := term (('+' | '-') term)*
//! term     := unary (('*' | '/') unary)*
//! unary    := ('-' | '+') unary | primary
//! primary  := number | reference | call | constant | '(' expr ')'
//! call     := ident '(' (expr (',' expr)*)? ')'
//! constant := '$'? ident
//! reference:= '"' <any text without quotes> '"'
//! ```

use nom::{
    branch::alt,
    bytes::complete::{tag, take_till},
    character::complete::{alpha1, alphanumeric1, char, multispace0, one_of},
    combinator::{opt, recognize},
    error::ErrorKind,
    multi::many0,
    number::complete::recognize_float,
    sequence::{delimited, pair},
    IResult, Parser,
};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Error that can occur during expression parsing or evaluation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("unknown constant: {name}")]
    UnknownConstant { name: String },

    #[error("division by zero")]
    DivisionByZero,

    #[error("invalid operation: {message}")]
    InvalidOperation { message: String },

    #[error("undefined function: {name}")]
    UndefinedFunction { name: String },

    #[error("unresolved reference to \"{name}\"")]
    UnresolvedReference { name: String },
}

/// Result type for expression evaluation
pub type ExprResult<T> = Result<T, ExpressionError>;

/// Deepest accepted nesting of parentheses, call arguments and signs. The
/// height of the parsed tree, operator chains included, is held to the same
/// limit so that evaluation recursion stays shallow.
pub const MAX_NESTING: usize = 128;

/// Expression AST node
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Numeric literal
    Number(f64),

    /// Named constant (stored without the optional `$` sigil)
    Constant(String),

    /// Quoted reference to another parameter
    Reference(String),

    /// Unary operations
    Unary(UnaryOp, Box<Expression>),

    /// Binary operations
    Binary(BinaryOp, Box<Expression>, Box<Expression>),

    /// Function call
    Function(String, Vec<Expression>),
}

/// Unary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UnaryOp {
    /// Negation (-)
    Neg,
}

/// Binary operations
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinaryOp {
    /// Addition (+)
    Add,

    /// Subtraction (-)
    Sub,

    /// Multiplication (*)
    Mul,

    /// Division (/)
    Div,
}

impl BinaryOp {
    fn from_char(c: char) -> Self {
        match c {
            '+' => BinaryOp::Add,
            '-' => BinaryOp::Sub,
            '*' => BinaryOp::Mul,
            _ => BinaryOp::Div,
        }
    }

    fn symbol(self) -> char {
        match self {
            BinaryOp::Add => '+',
            BinaryOp::Sub => '-',
            BinaryOp::Mul => '*',
            BinaryOp::Div => '/',
        }
    }
}

/// Supplies named constants and functions to the evaluator
pub trait EvaluationContext {
    /// Get the value of a named constant
    fn get_constant(&self, name: &str) -> ExprResult<f64>;

    /// Check if a constant exists
    fn has_constant(&self, name: &str) -> bool;

    /// Call a named function with already evaluated arguments
    fn call_function(&self, name: &str, args: &[f64]) -> ExprResult<f64>;

    /// Check if a function exists
    fn has_function(&self, name: &str) -> bool;
}

/// Constants-only context, handy for evaluating plain arithmetic
impl EvaluationContext for HashMap<String, f64> {
    fn get_constant(&self, name: &str) -> ExprResult<f64> {
        self.get(name)
            .copied()
            .ok_or_else(|| ExpressionError::UnknownConstant {
                name: name.to_string(),
            })
    }

    fn has_constant(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn call_function(&self, name: &str, _args: &[f64]) -> ExprResult<f64> {
        Err(ExpressionError::UndefinedFunction {
            name: name.to_string(),
        })
    }

    fn has_function(&self, _name: &str) -> bool {
        false
    }
}

impl Expression {
    /// Parse an expression from a string
    pub fn parse(input: &str) -> ExprResult<Self> {
        match expr_parser(input.trim(), 0) {
            Ok((remainder, (expr, _))) => {
                // Make sure the entire input was consumed
                if remainder.trim().is_empty() {
                    Ok(expr)
                } else {
                    Err(ExpressionError::ParseError {
                        message: format!("unexpected trailing characters: '{}'", remainder),
                    })
                }
            }
            Err(e) => Err(ExpressionError::ParseError {
                message: match e {
                    nom::Err::Failure(e) if e.code == ErrorKind::TooLarge => {
                        format!("expression nests deeper than {} levels", MAX_NESTING)
                    }
                    nom::Err::Error(e) | nom::Err::Failure(e) => {
                        format!("unexpected input at '{}'", e.input)
                    }
                    nom::Err::Incomplete(_) => "incomplete input".to_string(),
                },
            }),
        }
    }

    /// Evaluate the expression with the given context
    ///
    /// References must have been substituted beforehand; a remaining reference
    /// is reported as [`ExpressionError::UnresolvedReference`].
    pub fn evaluate<C: EvaluationContext + ?Sized>(&self, context: &C) -> ExprResult<f64> {
        match self {
            Self::Number(n) => Ok(*n),

            Self::Constant(name) => context.get_constant(name),

            Self::Reference(name) => Err(ExpressionError::UnresolvedReference { name: name.clone() }),

            Self::Unary(op, expr) => {
                let value = expr.evaluate(context)?;
                match op {
                    UnaryOp::Neg => Ok(-value),
                }
            }

            Self::Binary(op, left, right) => {
                let lhs = left.evaluate(context)?;
                let rhs = right.evaluate(context)?;

                match op {
                    BinaryOp::Add => Ok(lhs + rhs),
                    BinaryOp::Sub => Ok(lhs - rhs),
                    BinaryOp::Mul => Ok(lhs * rhs),
                    BinaryOp::Div => {
                        if rhs == 0.0 {
                            Err(ExpressionError::DivisionByZero)
                        } else {
                            Ok(lhs / rhs)
                        }
                    }
                }
            }

            Self::Function(name, args) => {
                let mut evaluated_args = Vec::with_capacity(args.len());
                for arg in args {
                    evaluated_args.push(arg.evaluate(context)?);
                }
                context.call_function(name, &evaluated_args)
            }
        }
    }

    /// Distinct parameter names referenced by the expression, sorted
    pub fn references(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect_references(&mut names);
        names.sort();
        names.dedup();
        names
    }

    fn collect_references(&self, names: &mut Vec<String>) {
        match self {
            Self::Number(_) | Self::Constant(_) => {}

            Self::Reference(name) => names.push(name.clone()),

            Self::Unary(_, expr) => expr.collect_references(names),

            Self::Binary(_, left, right) => {
                left.collect_references(names);
                right.collect_references(names);
            }

            Self::Function(_, args) => {
                for arg in args {
                    arg.collect_references(names);
                }
            }
        }
    }

    /// Replace every reference found in `values` by its numeric value.
    ///
    /// All occurrences of the same reference receive the same value; references
    /// missing from `values` are left in place.
    pub fn substitute(&self, values: &HashMap<String, f64>) -> Expression {
        match self {
            Self::Reference(name) => match values.get(name) {
                Some(value) => Self::Number(*value),
                None => self.clone(),
            },
            Self::Number(_) | Self::Constant(_) => self.clone(),
            Self::Unary(op, expr) => Self::Unary(*op, Box::new(expr.substitute(values))),
            Self::Binary(op, left, right) => Self::Binary(
                *op,
                Box::new(left.substitute(values)),
                Box::new(right.substitute(values)),
            ),
            Self::Function(name, args) => Self::Function(
                name.clone(),
                args.iter().map(|arg| arg.substitute(values)).collect(),
            ),
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Constant(name) => write!(f, "{}", name),
            Self::Reference(name) => write!(f, "\"{}\"", name),
            Self::Unary(UnaryOp::Neg, expr) => write!(f, "-{}", expr),
            Self::Binary(op, left, right) => write!(f, "({} {} {})", left, op.symbol(), right),
            Self::Function(name, args) => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

// Parser functions using nom

fn ws(input: &str) -> IResult<&str, &str> {
    multispace0(input)
}

/// Parse a single punctuation character, skipping leading whitespace
fn punct(input: &str, c: char) -> IResult<&str, char> {
    let (input, _) = ws(input)?;
    char(c).parse(input)
}

/// Parse one of the operator characters in `ops`, skipping leading whitespace
fn operator<'a>(input: &'a str, ops: &str) -> IResult<&'a str, char> {
    let (input, _) = ws(input)?;
    one_of(ops).parse(input)
}

/// A parsed node together with the height of its AST
type Parsed<'a> = IResult<&'a str, (Expression, usize)>;

fn too_deep(input: &str) -> nom::Err<nom::error::Error<&str>> {
    nom::Err::Failure(nom::error::Error::new(input, ErrorKind::TooLarge))
}

/// Enter one more level of parentheses, call arguments or signs
fn nested(input: &str, depth: usize) -> Result<usize, nom::Err<nom::error::Error<&str>>> {
    if depth >= MAX_NESTING {
        Err(too_deep(input))
    } else {
        Ok(depth + 1)
    }
}

/// Height of a node whose tallest child has height `child`
fn raise(input: &str, child: usize) -> Result<usize, nom::Err<nom::error::Error<&str>>> {
    if child >= MAX_NESTING {
        Err(too_deep(input))
    } else {
        Ok(child + 1)
    }
}

/// Parse an identifier (constant or function name), with an optional `$` sigil
fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        opt(char('$')),
        pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_")))),
        ),
    ))
    .parse(input)
}

/// Parse a number
fn number(input: &str) -> IResult<&str, Expression> {
    let (rest, text) = recognize_float::<&str, nom::error::Error<&str>>(input)?;
    match text.parse::<f64>() {
        Ok(value) => Ok((rest, Expression::Number(value))),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            input,
            ErrorKind::Float,
        ))),
    }
}

fn quoted(input: &str) -> IResult<&str, &str> {
    delimited(char('"'), take_till(|c: char| c == '"'), char('"')).parse(input)
}

/// Parse a quoted parameter reference
fn reference(input: &str) -> IResult<&str, Expression> {
    let (input, name) = quoted(input)?;
    Ok((input, Expression::Reference(name.to_string())))
}

/// Parse a comma-separated list of expressions (for function arguments)
fn args_list(input: &str, depth: usize) -> IResult<&str, (Vec<Expression>, usize)> {
    let (mut input, (first, mut height)) = expr_parser(input, depth)?;
    let mut args = vec![first];

    while let Ok((after_comma, _)) = punct(input, ',') {
        let (after_arg, (arg, arg_height)) = expr_parser(after_comma, depth)?;
        args.push(arg);
        height = height.max(arg_height);
        input = after_arg;
    }

    Ok((input, (args, height)))
}

/// Parse a function call
fn function_call(input: &str, depth: usize) -> Parsed<'_> {
    let (input, name) = identifier(input)?;
    let (input, _) = punct(input, '(')?;

    // Handle empty arguments case
    if let Ok((input, _)) = punct(input, ')') {
        return Ok((input, (Expression::Function(name.to_string(), vec![]), 1)));
    }

    let depth = nested(input, depth)?;
    let (input, (args, height)) = args_list(input, depth)?;
    let (input, _) = punct(input, ')')?;
    let height = raise(input, height)?;

    Ok((input, (Expression::Function(name.to_string(), args), height)))
}

/// Parse a named constant
fn constant(input: &str) -> IResult<&str, Expression> {
    let (input, name) = identifier(input)?;
    let name = name.strip_prefix('$').unwrap_or(name);
    Ok((input, Expression::Constant(name.to_string())))
}

/// Parse a parenthesized expression
fn parens(input: &str, depth: usize) -> Parsed<'_> {
    let (input, _) = punct(input, '(')?;
    let depth = nested(input, depth)?;
    let (input, expr) = expr_parser(input, depth)?;
    let (input, _) = punct(input, ')')?;
    Ok((input, expr))
}

fn leaf(result: IResult<&str, Expression>) -> Parsed<'_> {
    result.map(|(input, expr)| (input, (expr, 1)))
}

/// Parse a primary expression.
///
/// An alternative is tried only if the previous one did not match at all; a
/// failure such as excessive nesting ends the parse.
fn primary(input: &str, depth: usize) -> Parsed<'_> {
    match leaf(number(input)) {
        Err(nom::Err::Error(_)) => {}
        result => return result,
    }

    match leaf(reference(input)) {
        Err(nom::Err::Error(_)) => {}
        result => return result,
    }

    match function_call(input, depth) {
        Err(nom::Err::Error(_)) => {}
        result => return result,
    }

    match leaf(constant(input)) {
        Err(nom::Err::Error(_)) => {}
        result => return result,
    }

    parens(input, depth)
}

/// Parse a unary expression (-expr, +expr)
fn unary(input: &str, depth: usize) -> Parsed<'_> {
    let (input, _) = ws(input)?;

    if let Ok((rest, sign)) = one_of::<_, _, nom::error::Error<&str>>("+-").parse(input) {
        let depth = nested(rest, depth)?;
        let (rest, (operand, height)) = unary(rest, depth)?;
        return Ok(match sign {
            '-' => (
                rest,
                (
                    Expression::Unary(UnaryOp::Neg, Box::new(operand)),
                    raise(rest, height)?,
                ),
            ),
            _ => (rest, (operand, height)),
        });
    }

    primary(input, depth)
}

/// Parse a multiplicative expression (expr * expr, expr / expr), left-associative
fn term(input: &str, depth: usize) -> Parsed<'_> {
    let (mut input, (mut left, mut height)) = unary(input, depth)?;

    while let Ok((after_op, op)) = operator(input, "*/") {
        let (remaining, (right, right_height)) = unary(after_op, depth)?;
        height = raise(remaining, height.max(right_height))?;
        left = Expression::Binary(BinaryOp::from_char(op), Box::new(left), Box::new(right));
        input = remaining;
    }

    Ok((input, (left, height)))
}

/// Parse an additive expression (expr + expr, expr - expr), left-associative
fn expr_parser(input: &str, depth: usize) -> Parsed<'_> {
    let (mut input, (mut left, mut height)) = term(input, depth)?;

    while let Ok((after_op, op)) = operator(input, "+-") {
        let (remaining, (right, right_height)) = term(after_op, depth)?;
        height = raise(remaining, height.max(right_height))?;
        left = Expression::Binary(BinaryOp::from_char(op), Box::new(left), Box::new(right));
        input = remaining;
    }

    Ok((input, (left, height)))
}
