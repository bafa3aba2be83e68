//! Runtime values shared by the tree-walking evaluator and the bytecode VM.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::rc::Rc;

use ahash::RandomState;
use indexmap::IndexMap;

use crate::ast::Block;
use crate::bytecode::chunk::{Closure, CompiledFunction};
use crate::interpreter::environment::Env;

/// A hashable key type for use in IndexMap.
/// This wraps the Value types that can be used as hash keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashKey {
    Integer(i64),
    Boolean(bool),
    String(Rc<str>),
}

impl Hash for HashKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            HashKey::Integer(n) => n.hash(state),
            HashKey::Boolean(b) => b.hash(state),
            HashKey::String(s) => s.hash(state),
        }
    }
}

impl HashKey {
    /// Convert a Value to a HashKey if possible.
    pub fn from_value(value: &Value) -> Option<HashKey> {
        match value {
            Value::Integer(n) => Some(HashKey::Integer(*n)),
            Value::Boolean(b) => Some(HashKey::Boolean(*b)),
            Value::String(s) => Some(HashKey::String(s.clone())),
            _ => None,
        }
    }
}

/// A stored hash entry; the original key value is kept for display.
#[derive(Debug, Clone, PartialEq)]
pub struct HashPair {
    pub key: Value,
    pub value: Value,
}

/// Backing map of a hash value.
pub type HashPairs = IndexMap<HashKey, HashPair, RandomState>;

/// Build an empty pair map with the crate's hasher.
pub fn new_hash_pairs() -> HashPairs {
    IndexMap::with_hasher(RandomState::new())
}

/// A user-defined function closing over its defining environment.
pub struct Function {
    pub parameters: Vec<String>,
    pub body: Rc<Block>,
    pub env: Env,
}

impl Function {
    pub fn new(parameters: Vec<String>, body: Rc<Block>, env: Env) -> Self {
        Self {
            parameters,
            body,
            env,
        }
    }
}

impl fmt::Debug for Function {
    // The environment may hold this very function; never print it.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function(fn({}) {})", self.parameters.join(", "), self.body)
    }
}

/// Signature of every native builtin.
pub type BuiltinFn = fn(&[Value]) -> Value;

/// A native function from the builtin table.
#[derive(Clone, Copy)]
pub struct Builtin {
    pub name: &'static str,
    pub func: BuiltinFn,
}

impl Builtin {
    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }
}

impl fmt::Debug for Builtin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Builtin({})", self.name)
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    /// Integer value
    Integer(i64),
    /// Boolean value; `Value::TRUE` and `Value::FALSE` are the only two
    Boolean(bool),
    /// String value; the shared handle gives strings an identity
    String(Rc<str>),
    /// The null singleton
    Null,
    /// Array value, replaced rather than mutated
    Array(Rc<Vec<Value>>),
    /// Hash value keyed by integer, boolean or string
    Hash(Rc<HashPairs>),
    /// Function value (closure over an environment)
    Function(Rc<Function>),
    /// Native/builtin function
    BuiltIn(Builtin),
    /// Error raised by the evaluator or a builtin
    Error(Rc<str>),
    /// Return signal; unwrapped at call and program boundaries
    Return(Box<Value>),
    /// VM function body from the constant pool
    CompiledFunction(Rc<CompiledFunction>),
    /// VM closure (compiled function plus captured free variables)
    Closure(Rc<Closure>),
}

impl Value {
    pub const TRUE: Value = Value::Boolean(true);
    pub const FALSE: Value = Value::Boolean(false);
    pub const NULL: Value = Value::Null;

    /// Map a host boolean onto the boolean singletons.
    pub fn from_bool(b: bool) -> Value {
        if b {
            Value::TRUE
        } else {
            Value::FALSE
        }
    }

    pub fn string(s: impl Into<Rc<str>>) -> Value {
        Value::String(s.into())
    }

    pub fn array(elements: Vec<Value>) -> Value {
        Value::Array(Rc::new(elements))
    }

    pub fn hash(pairs: HashPairs) -> Value {
        Value::Hash(Rc::new(pairs))
    }

    pub fn error(message: impl Into<Rc<str>>) -> Value {
        Value::Error(message.into())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "INTEGER",
            Value::Boolean(_) => "BOOLEAN",
            Value::String(_) => "STRING",
            Value::Null => "NULL",
            Value::Array(_) => "ARRAY",
            Value::Hash(_) => "HASH",
            Value::Function(_) => "FUNCTION",
            Value::BuiltIn(_) => "BUILTIN",
            Value::Error(_) => "ERROR",
            Value::Return(_) => "RETURN_VALUE",
            Value::CompiledFunction(_) => "COMPILED_FUNCTION",
            Value::Closure(_) => "CLOSURE",
        }
    }

    /// `null` and `false` are falsy, everything else (0 and "" included)
    /// is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Boolean(false))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Convert this value to a HashKey if possible.
    pub fn to_hash_key(&self) -> Option<HashKey> {
        HashKey::from_value(self)
    }

    /// Identity comparison backing the language's `==` outside integer
    /// arithmetic: singletons compare by value, shared values by handle.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::String(a), Value::String(b)) => Rc::ptr_eq(a, b),
            (Value::Array(a), Value::Array(b)) => Rc::ptr_eq(a, b),
            (Value::Hash(a), Value::Hash(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::BuiltIn(a), Value::BuiltIn(b)) => a.name == b.name,
            (Value::Error(a), Value::Error(b)) => Rc::ptr_eq(a, b),
            (Value::Return(a), Value::Return(b)) => a.is_identical(b),
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => Rc::ptr_eq(a, b),
            (Value::Closure(a), Value::Closure(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Unwrap a return signal into the value it carries.
    pub fn unwrap_return(self) -> Value {
        match self {
            Value::Return(value) => *value,
            other => other,
        }
    }
}

/// Structural equality for host code and tests. The language's own `==`
/// goes through [`Value::is_identical`] instead.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Null, Value::Null) => true,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Hash(a), Value::Hash(b)) => {
                a.len() == b.len() && a.iter().all(|(k, pair)| b.get(k) == Some(pair))
            }
            (Value::Error(a), Value::Error(b)) => a == b,
            (Value::Return(a), Value::Return(b)) => a == b,
            (Value::CompiledFunction(a), Value::CompiledFunction(b)) => a == b,
            _ => self.is_identical(other),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Null => write!(f, "null"),
            Value::Array(elements) => {
                write!(f, "[")?;
                for (i, val) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", val)?;
                }
                write!(f, "]")
            }
            Value::Hash(pairs) => {
                write!(f, "{{")?;
                for (i, pair) in pairs.values().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {}", pair.key, pair.value)?;
                }
                write!(f, "}}")
            }
            Value::Function(func) => {
                write!(f, "fn({}) {}", func.parameters.join(", "), func.body)
            }
            Value::BuiltIn(_) => write!(f, "builtin function"),
            Value::Error(message) => write!(f, "ERROR: {}", message),
            Value::Return(value) => write!(f, "{}", value),
            Value::CompiledFunction(func) => {
                write!(f, "CompiledFunction[{:p}]", Rc::as_ptr(func))
            }
            Value::Closure(closure) => write!(f, "Closure[{:p}]", Rc::as_ptr(closure)),
        }
    }
}
