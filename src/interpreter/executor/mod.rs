//! Tree-walking interpreter.
//!
//! Errors travel in the value channel: every failure is a `Value::Error`
//! that short-circuits the enclosing statements. Internally the evaluator
//! carries them in the `Err` arm of [`EvalResult`] so `?` does the
//! propagation; the public entry points fold them back into a `Value`.

mod calls;
mod expressions;
mod objects;
mod operators;
mod statements;

use colored::Colorize;

use crate::ast::Node;
use crate::config::RuntimeConfig;
use crate::interpreter::environment::Env;
use crate::interpreter::value::Value;

/// `Err` always holds a `Value::Error`.
pub(crate) type EvalResult<T = Value> = Result<T, Value>;

/// Lift a value produced outside the evaluator (a builtin result, a function
/// body) into the error channel when it is an error.
pub(crate) fn check(value: Value) -> EvalResult {
    if value.is_error() {
        Err(value)
    } else {
        Ok(value)
    }
}

/// Build an error for the `Err` arm.
pub(crate) fn fail<T>(message: impl Into<String>) -> EvalResult<T> {
    Err(Value::error(message.into()))
}

/// The tree-walking interpreter.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    config: RuntimeConfig,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Evaluate any node against `env`.
    ///
    /// A program unwraps a top-level `return`; a bare block or statement
    /// hands the `Value::Return` signal back to the caller unchanged.
    pub fn evaluate<'a>(&self, node: impl Into<Node<'a>>, env: &Env) -> Value {
        let result = match node.into() {
            Node::Program(program) => self.eval_program(program, env),
            Node::Block(block) => self.eval_block(block, env),
            Node::Stmt(stmt) => self.eval_statement(stmt, env),
            Node::Expr(expr) => self.eval_expression(expr, env),
        };
        result.unwrap_or_else(|error| error)
    }

    pub(crate) fn trace(&self, node: Node<'_>) {
        if self.config.trace {
            eprintln!(
                "{}",
                format!("EVAL {}: {}", node.kind_name(), node).green()
            );
        }
    }
}

/// Evaluate `node` with the default configuration.
pub fn evaluate<'a>(node: impl Into<Node<'a>>, env: &Env) -> Value {
    Interpreter::new().evaluate(node, env)
}
