use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::error::RuntimeError;
use crate::token::Token;
use crate::value::Value;

/// A binding's contents: either a usable value, or the sentinel left by
/// `var x;` with no initializer. The sentinel is a property of the
/// binding slot, not of `Value` itself — a variable can be "not yet
/// initialized" without any runtime value having to represent that.
#[derive(Debug, Clone)]
enum Slot {
    Value(Value),
    Uninitialized,
}

/// A single lexical scope frame: a name-to-value mapping plus an
/// optional link to its enclosing frame. Frames form a tree; closures
/// pin the chain they were defined in alive via shared ownership.
#[derive(Debug)]
pub struct Environment {
    enclosing: Option<Rc<RefCell<Environment>>>,
    values: HashMap<String, Slot>,
}

impl Environment {
    pub fn new_global() -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment { enclosing: None, values: HashMap::new() }))
    }

    pub fn new_enclosed(enclosing: Rc<RefCell<Environment>>) -> Rc<RefCell<Environment>> {
        Rc::new(RefCell::new(Environment { enclosing: Some(enclosing), values: HashMap::new() }))
    }

    /// Declares `name`, without an initializer, as `Uninitialized`.
    pub fn declare(&mut self, name: &str) {
        self.values.insert(name.to_string(), Slot::Uninitialized);
    }

    /// Declares and immediately initializes `name`.
    pub fn define(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), Slot::Value(value));
    }

    fn ancestor(start: &Rc<RefCell<Environment>>, distance: usize) -> Rc<RefCell<Environment>> {
        let mut env = Rc::clone(start);
        for _ in 0..distance {
            let parent = env
                .borrow()
                .enclosing
                .clone()
                .expect("resolver-computed distance to stay within the environment chain");
            env = parent;
        }
        env
    }

    pub fn get(env: &Rc<RefCell<Environment>>, name: &Token) -> Result<Value, RuntimeError> {
        let this = env.borrow();
        match this.values.get(&name.lexeme) {
            Some(Slot::Value(value)) => Ok(value.clone()),
            Some(Slot::Uninitialized) => Err(RuntimeError::new(
                name.clone(),
                format!("Variable '{}' used before it was initialized.", name.lexeme),
            )),
            None => match &this.enclosing {
                Some(parent) => {
                    let parent = Rc::clone(parent);
                    drop(this);
                    Environment::get(&parent, name)
                }
                None => Err(RuntimeError::new(
                    name.clone(),
                    format!("Undefined variable '{}'.", name.lexeme),
                )),
            },
        }
    }

    pub fn get_at(env: &Rc<RefCell<Environment>>, distance: usize, name: &Token) -> Result<Value, RuntimeError> {
        let ancestor = Environment::ancestor(env, distance);
        let this = ancestor.borrow();
        match this.values.get(&name.lexeme) {
            Some(Slot::Value(value)) => Ok(value.clone()),
            Some(Slot::Uninitialized) => Err(RuntimeError::new(
                name.clone(),
                format!("Variable '{}' used before it was initialized.", name.lexeme),
            )),
            None => Err(RuntimeError::new(
                name.clone(),
                format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }

    pub fn assign(env: &Rc<RefCell<Environment>>, name: &Token, value: Value) -> Result<(), RuntimeError> {
        let mut this = env.borrow_mut();
        if this.values.contains_key(&name.lexeme) {
            this.values.insert(name.lexeme.clone(), Slot::Value(value));
            return Ok(());
        }

        match &this.enclosing {
            Some(parent) => {
                let parent = Rc::clone(parent);
                drop(this);
                Environment::assign(&parent, name, value)
            }
            None => Err(RuntimeError::new(
                name.clone(),
                format!("Undefined variable '{}'.", name.lexeme),
            )),
        }
    }

    pub fn assign_at(
        env: &Rc<RefCell<Environment>>,
        distance: usize,
        name: &Token,
        value: Value,
    ) -> Result<(), RuntimeError> {
        let ancestor = Environment::ancestor(env, distance);
        ancestor.borrow_mut().values.insert(name.lexeme.clone(), Slot::Value(value));
        Ok(())
    }
}
