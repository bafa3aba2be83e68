//! Expression evaluation.

use std::rc::Rc;

use crate::ast::{Block, Expr, Node};
use crate::interpreter::builtins;
use crate::interpreter::environment::Env;
use crate::interpreter::value::{Function, Value};

use super::{fail, EvalResult, Interpreter};

impl Interpreter {
    pub(crate) fn eval_expression(&self, expr: &Expr, env: &Env) -> EvalResult {
        self.trace(Node::Expr(expr));
        match expr {
            Expr::IntLiteral(n) => Ok(Value::Integer(*n)),
            Expr::BoolLiteral(b) => Ok(Value::from_bool(*b)),
            Expr::StringLiteral(s) => Ok(Value::string(s.as_str())),
            Expr::Identifier(name) => self.eval_identifier(name, env),

            Expr::Unary { operator, operand } => {
                let operand = self.eval_expression(operand, env)?;
                self.eval_prefix(*operator, operand)
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => {
                let left = self.eval_expression(left, env)?;
                let right = self.eval_expression(right, env)?;
                self.eval_infix(left, *operator, right)
            }

            Expr::If {
                condition,
                consequence,
                alternative,
            } => self.eval_if(condition, consequence, alternative.as_ref(), env),

            Expr::Function { parameters, body } => Ok(Value::Function(Rc::new(Function::new(
                parameters.clone(),
                Rc::clone(body),
                Rc::clone(env),
            )))),
            Expr::Call { callee, arguments } => {
                let callee = self.eval_expression(callee, env)?;
                let arguments = self.eval_expressions(arguments, env)?;
                self.apply_function(callee, arguments)
            }

            Expr::Array(elements) => Ok(Value::array(self.eval_expressions(elements, env)?)),
            Expr::Index { object, index } => {
                let object = self.eval_expression(object, env)?;
                let index = self.eval_expression(index, env)?;
                self.eval_index(object, index)
            }
            Expr::Hash(pairs) => self.eval_hash(pairs, env),
        }
    }

    /// Evaluate left to right, stopping at the first error.
    pub(crate) fn eval_expressions(&self, exprs: &[Expr], env: &Env) -> EvalResult<Vec<Value>> {
        exprs
            .iter()
            .map(|expr| self.eval_expression(expr, env))
            .collect()
    }

    fn eval_identifier(&self, name: &str, env: &Env) -> EvalResult {
        if let Some(value) = env.borrow().get(name) {
            return Ok(value);
        }
        match builtins::lookup(name) {
            Some(builtin) => Ok(Value::BuiltIn(builtin)),
            None => fail(format!("identifier not found: {}", name)),
        }
    }

    fn eval_if(
        &self,
        condition: &Expr,
        consequence: &Block,
        alternative: Option<&Block>,
        env: &Env,
    ) -> EvalResult {
        let condition = self.eval_expression(condition, env)?;

        if condition.is_truthy() {
            self.eval_block(consequence, env)
        } else if let Some(alternative) = alternative {
            self.eval_block(alternative, env)
        } else {
            Ok(Value::NULL)
        }
    }
}
