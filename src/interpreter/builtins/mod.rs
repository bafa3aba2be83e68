//! Built-in functions.
//!
//! The table is built once per process and never mutated. Its order is part
//! of the bytecode contract: `GetBuiltin <index>` indexes straight into it.

use lazy_static::lazy_static;

use crate::interpreter::value::{Builtin, Value};

pub mod array;

lazy_static! {
    /// Every builtin, in `GetBuiltin` index order.
    pub static ref BUILTINS: Vec<Builtin> = vec![
        Builtin { name: "len", func: len },
        Builtin { name: "puts", func: puts },
        Builtin { name: "first", func: array::first },
        Builtin { name: "last", func: array::last },
        Builtin { name: "rest", func: array::rest },
        Builtin { name: "push", func: array::push },
    ];
}

/// Find a builtin by name.
pub fn lookup(name: &str) -> Option<Builtin> {
    BUILTINS.iter().find(|builtin| builtin.name == name).copied()
}

/// Fetch the builtin at `index` in table order.
pub fn get(index: usize) -> Option<Builtin> {
    BUILTINS.get(index).copied()
}

/// Shared arity failure for every builtin.
pub(crate) fn wrong_arguments(got: usize, want: usize) -> Value {
    Value::error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

// len(string|array) - byte length of a string, element count of an array
fn len(args: &[Value]) -> Value {
    if args.len() != 1 {
        return wrong_arguments(args.len(), 1);
    }

    match &args[0] {
        Value::String(s) => Value::Integer(s.len() as i64),
        Value::Array(elements) => Value::Integer(elements.len() as i64),
        other => Value::error(format!(
            "argument to `len` not supported, got {}",
            other.type_name()
        )),
    }
}

// puts(...) - print each argument on its own line
fn puts(args: &[Value]) -> Value {
    for arg in args {
        println!("{}", arg);
    }
    Value::NULL
}
