//! Binary operator implementations.
//!
//! Direct enum-based dispatch over the fixed operator and value sets. The
//! short-circuit operators (`&&`, `||`) are handled by the compiler since they
//! must not evaluate their right operand eagerly.

use vela_ir::{BinaryOp, EvalError, EvalResult, Value};

/// Checked arithmetic; the only error case is overflow.
#[inline]
fn checked_arith(result: Option<i64>, op_name: &'static str) -> EvalResult {
    result
        .map(Value::Int)
        .ok_or(EvalError::Overflow { operation: op_name })
}

/// Evaluate a strict binary operation on two already evaluated operands.
pub fn evaluate_binary(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    match op {
        BinaryOp::Equal => Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => Ok(Value::Bool(left != right)),
        BinaryOp::ReferenceEqual => Ok(Value::Bool(left.same_instance(right))),
        BinaryOp::Add | BinaryOp::Subtract | BinaryOp::Multiply => eval_arith(left, right, op),
        BinaryOp::AndAlso | BinaryOp::OrElse => match (left, right) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(if op == BinaryOp::AndAlso {
                *a && *b
            } else {
                *a || *b
            })),
            (Value::Bool(_), other) | (other, _) => Err(EvalError::TypeMismatch {
                expected: "bool",
                found: other.type_name(),
            }),
        },
    }
}

fn eval_arith(left: &Value, right: &Value, op: BinaryOp) -> EvalResult {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => match op {
            BinaryOp::Add => checked_arith(a.checked_add(*b), "add"),
            BinaryOp::Subtract => checked_arith(a.checked_sub(*b), "subtract"),
            _ => checked_arith(a.checked_mul(*b), "multiply"),
        },
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Subtract => a - b,
            _ => a * b,
        })),
        (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => {
            Ok(Value::string(format!("{a}{b}")))
        }
        // Lifted arithmetic: null in, null out.
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int(_) | Value::Float(_), other) | (other, _) => Err(EvalError::TypeMismatch {
            expected: "number",
            found: other.type_name(),
        }),
    }
}
