//! Array builtins. None of them mutate their argument; `rest` and `push`
//! hand back a new array.

use std::rc::Rc;

use super::wrong_arguments;
use crate::interpreter::value::Value;

fn expect_array<'a>(name: &str, value: &'a Value) -> Result<&'a Rc<Vec<Value>>, Value> {
    match value {
        Value::Array(elements) => Ok(elements),
        other => Err(Value::error(format!(
            "argument to `{}` must be ARRAY, got {}",
            name,
            other.type_name()
        ))),
    }
}

pub fn first(args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_arguments(args.len(), 1);
    }
    match expect_array("first", &args[0]) {
        Ok(elements) => elements.first().cloned().unwrap_or(Value::NULL),
        Err(error) => error,
    }
}

pub fn last(args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_arguments(args.len(), 1);
    }
    match expect_array("last", &args[0]) {
        Ok(elements) => elements.last().cloned().unwrap_or(Value::NULL),
        Err(error) => error,
    }
}

pub fn rest(args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_arguments(args.len(), 1);
    }
    match expect_array("rest", &args[0]) {
        Ok(elements) if elements.is_empty() => Value::NULL,
        Ok(elements) => Value::array(elements[1..].to_vec()),
        Err(error) => error,
    }
}

pub fn push(args: &[Value]) -> Value {
    if args.len() != 2 {
        return wrong_arguments(args.len(), 2);
    }
    match expect_array("push", &args[0]) {
        Ok(elements) => {
            let mut extended = Vec::with_capacity(elements.len() + 1);
            extended.extend(elements.iter().cloned());
            extended.push(args[1].clone());
            Value::array(extended)
        }
        Err(error) => error,
    }
}
