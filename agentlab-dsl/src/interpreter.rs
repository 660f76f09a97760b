//! Arithmetic-only evaluator for bare expressions
//!
//! Only numeric literals and the four arithmetic operators are evaluated.
//! Anything else (strings, booleans, const references, array access) or a
//! division by zero produces `None` instead of an error.

use crate::compiler::value::{binary, unary};
use crate::compiler::Value;
use crate::parser::{parse_expression, Expr, Number};
use tracing::trace;

/// Parses and evaluates `source`. `None` when it does not parse or falls
/// outside the arithmetic subset.
pub fn interpret(source: &str) -> Option<Value> {
    let expr = match parse_expression(source) {
        Ok(expr) => expr,
        Err(e) => {
            trace!(error = %e, "expression did not parse");
            return None;
        }
    };
    interpret_expr(&expr)
}

pub fn interpret_expr(expr: &Expr) -> Option<Value> {
    match expr {
        Expr::Number(Number::Integer(v)) => Some(Value::Int(*v)),
        Expr::Number(Number::Float(v)) => Some(Value::Float(*v)),
        Expr::Unary { op, operand } => unary(*op, interpret_expr(operand)?).ok(),
        Expr::Binary { op, left, right } => binary(*op, interpret_expr(left)?, interpret_expr(right)?).ok(),
        Expr::String(_) | Expr::Bool(_) | Expr::Const(_) | Expr::ArrayAccess { .. } => None,
    }
}
