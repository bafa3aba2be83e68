//! Interpreter module: the value model shared by both engines, the
//! environment chain, the builtin table and the tree-walking evaluator.

pub mod builtins;
pub mod environment;
pub mod executor;
pub mod value;

pub use environment::{Env, Environment};
pub use executor::{evaluate, Interpreter};
pub use value::{Builtin, Function, HashKey, HashPair, Value};
