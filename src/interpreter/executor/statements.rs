//! Statement execution.

use crate::ast::{Block, Node, Program, Stmt};
use crate::interpreter::environment::Env;
use crate::interpreter::value::Value;

use super::{EvalResult, Interpreter};

impl Interpreter {
    /// Run a program. A `return` at the top level ends it with the returned
    /// value.
    pub(crate) fn eval_program(&self, program: &Program, env: &Env) -> EvalResult {
        self.trace(Node::Program(program));
        let mut result = Value::NULL;

        for stmt in &program.statements {
            result = self.eval_statement(stmt, env)?;
            if let Value::Return(value) = result {
                return Ok(*value);
            }
        }

        Ok(result)
    }

    /// Run a block in `env`. Blocks open no scope of their own; a `return`
    /// inside one is passed up still wrapped.
    pub(crate) fn eval_block(&self, block: &Block, env: &Env) -> EvalResult {
        self.trace(Node::Block(block));
        let mut result = Value::NULL;

        for stmt in &block.statements {
            result = self.eval_statement(stmt, env)?;
            if matches!(result, Value::Return(_)) {
                return Ok(result);
            }
        }

        Ok(result)
    }

    pub(crate) fn eval_statement(&self, stmt: &Stmt, env: &Env) -> EvalResult {
        self.trace(Node::Stmt(stmt));
        match stmt {
            Stmt::Let { name, value } => {
                let value = self.eval_expression(value, env)?;
                env.borrow_mut().set(name.as_str(), value);
                Ok(Value::NULL)
            }
            Stmt::Return(value) => {
                let value = self.eval_expression(value, env)?;
                Ok(Value::Return(Box::new(value)))
            }
            Stmt::Expression(expr) => self.eval_expression(expr, env),
        }
    }
}
