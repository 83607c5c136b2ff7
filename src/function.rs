use std::cell::RefCell;
use std::fmt::{self, Debug, Display};
use std::rc::Rc;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::environment::Environment;
use crate::error::RuntimeError;
use crate::interpreter::{Flow, Interpreter};
use crate::stmt::FunctionDecl;
use crate::value::{Callable, Value};

/// A user-defined function: its declaration (name, parameters, body —
/// shared with the `Stmt::Function` node it came from) plus the
/// environment it closed over at definition time. Re-declaring the same
/// `fun` statement (e.g. inside a loop body) produces a fresh
/// `LoxFunction` each time, so each closes over its own environment.
#[derive(Debug)]
pub struct LoxFunction {
    declaration: Rc<FunctionDecl>,
    closure: Rc<RefCell<Environment>>,
}

impl LoxFunction {
    pub fn new(declaration: Rc<FunctionDecl>, closure: Rc<RefCell<Environment>>) -> Self {
        LoxFunction { declaration, closure }
    }
}

impl Callable for LoxFunction {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        let call_environment = Environment::new_enclosed(Rc::clone(&self.closure));
        for (param, argument) in self.declaration.params.iter().zip(arguments) {
            call_environment.borrow_mut().define(&param.lexeme, argument);
        }

        match interpreter.execute_block(&self.declaration.body, call_environment) {
            Ok(()) => Ok(Value::Nil),
            Err(Flow::Return(value)) => Ok(value),
            Err(Flow::Error(error)) => Err(error),
            Err(Flow::Break) => {
                unreachable!("resolver guarantees break never escapes its enclosing loop into a call frame")
            }
        }
    }

    fn arity(&self) -> usize {
        self.declaration.params.len()
    }
}

impl Display for LoxFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<fn {}>", self.declaration.name.lexeme)
    }
}

/// A function implemented in Rust rather than Lox, reachable from Lox
/// code under a fixed global name. The only one this dialect defines is
/// `clock`; spec.md names no others, and the teacher's `input()` has no
/// counterpart here — adding stdin access would be new I/O surface the
/// spec never asked for.
pub struct NativeFunction {
    name: &'static str,
    arity: usize,
    function: fn(&mut Interpreter, Vec<Value>) -> Result<Value, RuntimeError>,
}

impl NativeFunction {
    /// The natives bound into every fresh global environment.
    pub fn globals() -> Vec<NativeFunction> {
        vec![NativeFunction { name: "clock", arity: 0, function: clock }]
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl Callable for NativeFunction {
    fn call(&self, interpreter: &mut Interpreter, arguments: Vec<Value>) -> Result<Value, RuntimeError> {
        (self.function)(interpreter, arguments)
    }

    fn arity(&self) -> usize {
        self.arity
    }
}

impl Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NativeFunction({})", self.name)
    }
}

impl Display for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<native fn {}>", self.name)
    }
}

/// Wall-clock seconds since the Unix epoch, as a float.
fn clock(_interpreter: &mut Interpreter, _arguments: Vec<Value>) -> Result<Value, RuntimeError> {
    let elapsed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock to read later than the Unix epoch");
    Ok(Value::Number(elapsed.as_secs_f64()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::token::{Kind, Token};

    fn token(kind: Kind, lexeme: &str) -> Token {
        Token::new(kind, lexeme.to_string(), None, 1)
    }

    #[test]
    fn clock_takes_no_arguments_and_returns_a_number() {
        let native = NativeFunction::globals().into_iter().find(|n| n.name() == "clock").unwrap();
        assert_eq!(native.arity(), 0);
        let mut interpreter = Interpreter::new();
        let value = native.call(&mut interpreter, vec![]).unwrap();
        assert!(matches!(value, Value::Number(n) if n > 0.0));
    }

    #[test]
    fn lox_function_arity_matches_param_count() {
        let declaration = Rc::new(FunctionDecl {
            name: token(Kind::Identifier, "add"),
            params: vec![token(Kind::Identifier, "a"), token(Kind::Identifier, "b")],
            body: vec![],
        });
        let function = LoxFunction::new(declaration, Environment::new_global());
        assert_eq!(function.arity(), 2);
    }

    #[test]
    fn calling_a_function_with_no_return_yields_nil() {
        let declaration = Rc::new(FunctionDecl {
            name: token(Kind::Identifier, "noop"),
            params: vec![],
            body: vec![],
        });
        let function = LoxFunction::new(declaration, Environment::new_global());
        let mut interpreter = Interpreter::new();
        let value = function.call(&mut interpreter, vec![]).unwrap();
        assert!(matches!(value, Value::Nil));
    }

    #[test]
    fn display_formats() {
        let declaration = Rc::new(FunctionDecl { name: token(Kind::Identifier, "f"), params: vec![], body: vec![] });
        let function = LoxFunction::new(declaration, Environment::new_global());
        assert_eq!(function.to_string(), "<fn f>");

        let native = NativeFunction::globals().into_iter().next().unwrap();
        assert_eq!(native.to_string(), "<native fn clock>");
    }
}
