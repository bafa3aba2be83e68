//! Hash literals and index access.

use crate::ast::Expr;
use crate::interpreter::environment::Env;
use crate::interpreter::value::{new_hash_pairs, HashPair, Value};

use super::{fail, EvalResult, Interpreter};

impl Interpreter {
    /// Evaluate index access: `array[index]`, `hash[key]`.
    ///
    /// Misses yield `null`; only unsupported containers and unhashable keys
    /// are errors.
    pub(crate) fn eval_index(&self, object: Value, index: Value) -> EvalResult {
        match (&object, &index) {
            (Value::Array(elements), Value::Integer(i)) => Ok(usize::try_from(*i)
                .ok()
                .and_then(|i| elements.get(i))
                .cloned()
                .unwrap_or(Value::NULL)),
            (Value::Hash(pairs), key) => match key.to_hash_key() {
                Some(hash_key) => Ok(pairs
                    .get(&hash_key)
                    .map(|pair| pair.value.clone())
                    .unwrap_or(Value::NULL)),
                None => fail(format!("unusable as hash key: {}", key.type_name())),
            },
            _ => fail(format!(
                "index operator not supported: {}",
                object.type_name()
            )),
        }
    }

    /// Pairs are evaluated in source order: key, key check, then value.
    pub(crate) fn eval_hash(&self, pairs: &[(Expr, Expr)], env: &Env) -> EvalResult {
        let mut map = new_hash_pairs();

        for (key_expr, value_expr) in pairs {
            let key = self.eval_expression(key_expr, env)?;
            let hash_key = match key.to_hash_key() {
                Some(hash_key) => hash_key,
                None => return fail(format!("unusable as hash key: {}", key.type_name())),
            };
            let value = self.eval_expression(value_expr, env)?;
            map.insert(hash_key, HashPair { key, value });
        }

        Ok(Value::hash(map))
    }
}
