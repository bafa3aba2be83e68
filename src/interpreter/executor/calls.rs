//! Function call evaluation.

use crate::interpreter::environment::Environment;
use crate::interpreter::value::Value;

use super::{check, fail, EvalResult, Interpreter};

impl Interpreter {
    /// Invoke `callee` with already-evaluated arguments.
    pub(crate) fn apply_function(&self, callee: Value, arguments: Vec<Value>) -> EvalResult {
        match callee {
            Value::Function(function) => {
                if function.parameters.len() != arguments.len() {
                    return fail(format!(
                        "wrong number of arguments: want={}, got={}",
                        function.parameters.len(),
                        arguments.len()
                    ));
                }

                let call_env = Environment::enclosed(&function.env);
                {
                    let mut scope = call_env.borrow_mut();
                    for (parameter, argument) in function.parameters.iter().zip(arguments) {
                        scope.set(parameter.as_str(), argument);
                    }
                }

                let result = self.eval_block(&function.body, &call_env)?;
                Ok(result.unwrap_return())
            }
            Value::BuiltIn(builtin) => check(builtin.call(&arguments)),
            other => fail(format!("not a function: {}", other.type_name())),
        }
    }
}
