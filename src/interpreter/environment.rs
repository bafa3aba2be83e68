//! Runtime environment for variable scopes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::interpreter::value::Value;

/// Shared handle to an environment frame. Closures keep their defining
/// frame alive through this handle.
pub type Env = Rc<RefCell<Environment>>;

/// A runtime environment containing variable bindings.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    store: HashMap<String, Value>,
    enclosing: Option<Env>,
}

impl Environment {
    pub fn new() -> Self {
        Self {
            store: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Env) -> Self {
        Self {
            store: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// A fresh top-level frame behind a shared handle.
    pub fn shared() -> Env {
        Rc::new(RefCell::new(Self::new()))
    }

    /// A fresh frame enclosed by `enclosing`, behind a shared handle.
    pub fn enclosed(enclosing: &Env) -> Env {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    /// Get a variable's value, searching up the scope chain.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.store.get(name) {
            return Some(value.clone());
        }
        if let Some(ref enclosing) = self.enclosing {
            return enclosing.borrow().get(name);
        }
        None
    }

    /// Bind `name` in this frame only, replacing any local binding. Outer
    /// frames are never written.
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Value {
        self.store.insert(name.into(), value.clone());
        value
    }
}
