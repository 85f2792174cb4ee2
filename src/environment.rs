use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::LoxError;
use crate::value::Value;

/// One link in the lexical environment chain.
///
/// A slot is in one of three observable states: absent (undefined),
/// `None` (declared but uninitialized) or `Some(value)`.  Reading an
/// uninitialized slot and reading an undefined name are distinct runtime
/// errors.
#[derive(Debug)]
pub struct Environment {
    values: HashMap<String, Option<Value>>,
    enclosing: Option<Rc<RefCell<Environment>>>,
}

impl Environment {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind `name` in this environment. `None` marks the variable as
    /// declared but uninitialized. Re-definition overwrites.
    pub fn define(&mut self, name: &str, value: Option<Value>) {
        self.values.insert(name.to_string(), value);
    }

    /// Dynamic lookup: search this environment, then the enclosing chain.
    pub fn get(&self, name: &str, line: usize) -> Result<Value, LoxError> {
        match self.values.get(name) {
            Some(Some(value)) => Ok(value.clone()),

            Some(None) => Err(LoxError::runtime(
                line,
                format!("Variable '{name}' has not been initialized."),
            )),

            None => match &self.enclosing {
                Some(enclosing) => enclosing.borrow().get(name, line),
                None => Err(LoxError::runtime(
                    line,
                    format!("Undefined variable '{name}'."),
                )),
            },
        }
    }

    /// Dynamic assignment: the name must already be bound somewhere on the
    /// chain.
    pub fn assign(&mut self, name: &str, value: Value, line: usize) -> Result<(), LoxError> {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), Some(value));
            return Ok(());
        }

        match &self.enclosing {
            Some(enclosing) => enclosing.borrow_mut().assign(name, value, line),
            None => Err(LoxError::runtime(
                line,
                format!("Undefined variable '{name}'."),
            )),
        }
    }

    /// Resolved lookup: walk exactly `distance` links, no searching.
    pub fn get_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        line: usize,
    ) -> Result<Value, LoxError> {
        let target = Self::ancestor(env, distance);

        match target.and_then(|env| env.borrow().values.get(name).cloned()) {
            Some(Some(value)) => Ok(value),

            Some(None) => Err(LoxError::runtime(
                line,
                format!("Variable '{name}' has not been initialized."),
            )),

            None => Err(LoxError::runtime(
                line,
                format!("Undefined variable '{name}'."),
            )),
        }
    }

    /// Resolved assignment: walk exactly `distance` links, no searching.
    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &str,
        value: Value,
        line: usize,
    ) -> Result<(), LoxError> {
        if let Some(target) = Self::ancestor(env, distance) {
            let mut target = target.borrow_mut();
            if target.values.contains_key(name) {
                target.values.insert(name.to_string(), Some(value));
                return Ok(());
            }
        }

        Err(LoxError::runtime(
            line,
            format!("Undefined variable '{name}'."),
        ))
    }

    fn ancestor(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
    ) -> Option<Rc<RefCell<Environment>>> {
        let mut current = Rc::clone(env);

        for _ in 0..distance {
            let next = current.borrow().enclosing.as_ref().map(Rc::clone)?;
            current = next;
        }

        Some(current)
    }
}
