//! Binary and unary operator evaluation.

use crate::ast::{BinaryOp, UnaryOp};
use crate::interpreter::value::Value;

use super::{fail, EvalResult, Interpreter};

impl Interpreter {
    pub(crate) fn eval_prefix(&self, operator: UnaryOp, operand: Value) -> EvalResult {
        match operator {
            UnaryOp::Not => Ok(Value::from_bool(!operand.is_truthy())),
            UnaryOp::Negate => match operand {
                Value::Integer(n) => Ok(Value::Integer(n.wrapping_neg())),
                other => fail(format!("unknown operator: -{}", other.type_name())),
            },
        }
    }

    pub(crate) fn eval_infix(&self, left: Value, operator: BinaryOp, right: Value) -> EvalResult {
        match (&left, &right) {
            (Value::Integer(a), Value::Integer(b)) => eval_integer_infix(*a, operator, *b),
            _ if left.type_name() != right.type_name() => fail(format!(
                "type mismatch: {} {} {}",
                left.type_name(),
                operator,
                right.type_name()
            )),
            (Value::String(a), Value::String(b)) => match operator {
                BinaryOp::Add => Ok(Value::string(format!("{}{}", a, b))),
                _ => fail(format!("unknown operator: STRING {} STRING", operator)),
            },
            _ => match operator {
                BinaryOp::Equal => Ok(Value::from_bool(left.is_identical(&right))),
                BinaryOp::NotEqual => Ok(Value::from_bool(!left.is_identical(&right))),
                _ => fail(format!(
                    "unknown operator: {} {} {}",
                    left.type_name(),
                    operator,
                    right.type_name()
                )),
            },
        }
    }
}

/// Integer arithmetic wraps on overflow; division truncates toward zero.
fn eval_integer_infix(a: i64, operator: BinaryOp, b: i64) -> EvalResult {
    let value = match operator {
        BinaryOp::Add => Value::Integer(a.wrapping_add(b)),
        BinaryOp::Subtract => Value::Integer(a.wrapping_sub(b)),
        BinaryOp::Multiply => Value::Integer(a.wrapping_mul(b)),
        BinaryOp::Divide => {
            if b == 0 {
                return fail("division by zero");
            }
            Value::Integer(a.wrapping_div(b))
        }
        BinaryOp::Less => Value::from_bool(a < b),
        BinaryOp::Greater => Value::from_bool(a > b),
        BinaryOp::Equal => Value::from_bool(a == b),
        BinaryOp::NotEqual => Value::from_bool(a != b),
    };
    Ok(value)
}
