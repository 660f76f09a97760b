//! Compile-time values and constant folding

use crate::error::{SemanticError, SemanticResult};
use crate::parser::{BinaryOp, UnaryOp};
use crate::symbols::builder::unary_symbol;
use crate::symbols::BuiltinType;
use std::fmt;

/// Result of evaluating a constant expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn ty(&self) -> BuiltinType {
        match self {
            Value::Int(_) => BuiltinType::Integer,
            Value::Float(_) => BuiltinType::Float,
            Value::Bool(_) => BuiltinType::Boolean,
            Value::Str(_) => BuiltinType::String,
        }
    }

    /// Raw argument word: float bits, 0/1 for booleans, integers as unsigned.
    pub fn word(&self) -> Option<u32> {
        match self {
            Value::Int(v) => Some(*v as u32),
            Value::Float(v) => Some(v.to_bits()),
            Value::Bool(v) => Some(u32::from(*v)),
            Value::Str(_) => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match self {
            Value::Int(v) => Some(*v as f32),
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v:?}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::Str(v) => write!(f, "\"{v}\""),
        }
    }
}

pub fn unary(op: UnaryOp, value: Value) -> SemanticResult<Value> {
    match (op, value) {
        (UnaryOp::Plus, value @ (Value::Int(_) | Value::Float(_))) => Ok(value),
        (UnaryOp::Minus, Value::Int(v)) => Ok(Value::Int(v.wrapping_neg())),
        (UnaryOp::Minus, Value::Float(v)) => Ok(Value::Float(-v)),
        (op, other) => Err(SemanticError::InvalidUnaryOperand {
            op: unary_symbol(op),
            operand: other.ty().name().to_string(),
        }),
    }
}

/// Integer arithmetic wraps and divides toward zero. Mixed operands are
/// promoted to float.
pub fn binary(op: BinaryOp, left: Value, right: Value) -> SemanticResult<Value> {
    match (left, right) {
        (Value::Int(l), Value::Int(r)) => {
            let value = match op {
                BinaryOp::Add => l.wrapping_add(r),
                BinaryOp::Subtract => l.wrapping_sub(r),
                BinaryOp::Multiply => l.wrapping_mul(r),
                BinaryOp::Divide => {
                    if r == 0 {
                        return Err(SemanticError::DivisionByZero);
                    }
                    l.wrapping_div(r)
                }
            };
            Ok(Value::Int(value))
        }
        (Value::Str(l), Value::Str(r)) if op == BinaryOp::Add => Ok(Value::Str(l + &r)),
        (left, right) => match (left.as_f32(), right.as_f32()) {
            (Some(l), Some(r)) => {
                let value = match op {
                    BinaryOp::Add => l + r,
                    BinaryOp::Subtract => l - r,
                    BinaryOp::Multiply => l * r,
                    BinaryOp::Divide => {
                        if r == 0.0 {
                            return Err(SemanticError::DivisionByZero);
                        }
                        l / r
                    }
                };
                Ok(Value::Float(value))
            }
            _ => Err(SemanticError::InvalidOperands {
                op: op.symbol(),
                left: left.ty().name().to_string(),
                right: right.ty().name().to_string(),
            }),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_division_truncates() {
        assert_eq!(binary(BinaryOp::Divide, Value::Int(-7), Value::Int(2)), Ok(Value::Int(-3)));
        assert_eq!(
            binary(BinaryOp::Divide, Value::Int(1), Value::Int(0)),
            Err(SemanticError::DivisionByZero)
        );
    }

    #[test]
    fn test_mixed_operands_promote() {
        assert_eq!(binary(BinaryOp::Add, Value::Float(10.0), Value::Int(2)), Ok(Value::Float(12.0)));
        assert_eq!(binary(BinaryOp::Multiply, Value::Int(3), Value::Float(0.5)), Ok(Value::Float(1.5)));
    }

    #[test]
    fn test_string_concatenation_only() {
        assert_eq!(
            binary(BinaryOp::Add, Value::Str("a".into()), Value::Str("b".into())),
            Ok(Value::Str("ab".into()))
        );
        assert!(binary(BinaryOp::Subtract, Value::Str("a".into()), Value::Str("b".into())).is_err());
        assert!(binary(BinaryOp::Add, Value::Bool(true), Value::Int(1)).is_err());
    }

    #[test]
    fn test_words() {
        assert_eq!(Value::Int(-1).word(), Some(0xFFFF_FFFF));
        assert_eq!(Value::Float(1.0).word(), Some(0x3F80_0000));
        assert_eq!(Value::Bool(true).word(), Some(1));
        assert_eq!(Value::Str(String::new()).word(), None);
    }

    #[test]
    fn test_unary_folds() {
        assert_eq!(unary(UnaryOp::Minus, Value::Int(i32::MIN)), Ok(Value::Int(i32::MIN)));
        assert_eq!(unary(UnaryOp::Minus, Value::Float(2.5)), Ok(Value::Float(-2.5)));
        assert!(unary(UnaryOp::Minus, Value::Bool(false)).is_err());
    }
}
