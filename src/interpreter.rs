use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::environment::Environment;
use crate::error::{Reporter, RuntimeError};
use crate::expr::{Expr, ExprId, LiteralValue};
use crate::function::{LoxFunction, NativeFunction};
use crate::stmt::Stmt;
use crate::token::Kind;
use crate::value::Value;

/// Non-local control signals raised while executing statements: a
/// `return` unwinds to the nearest function call frame, a `break` to
/// the nearest enclosing loop. Both ride the error arm of a `Result` so
/// ordinary `?` propagation carries them up the call stack; a plain
/// runtime error rides the same arm.
pub enum Flow {
    Error(RuntimeError),
    Return(Value),
    Break,
}

impl From<RuntimeError> for Flow {
    fn from(error: RuntimeError) -> Self {
        Flow::Error(error)
    }
}

pub type ExecResult = Result<(), Flow>;

/// Executes a resolved program. Owns the root (`globals`) environment,
/// the current environment pointer, and the resolver's side table
/// mapping each variable-referring expression to a lexical distance.
pub struct Interpreter {
    pub globals: Rc<RefCell<Environment>>,
    environment: Rc<RefCell<Environment>>,
    locals: HashMap<ExprId, usize>,
}

impl Interpreter {
    pub fn new() -> Self {
        let globals = Environment::new_global();
        for native in NativeFunction::globals() {
            globals.borrow_mut().define(native.name(), Value::Native(Rc::new(native)));
        }

        Interpreter { environment: Rc::clone(&globals), globals, locals: HashMap::new() }
    }

    /// Called by the resolver: records that the expression node `id`
    /// resolves `distance` scopes above whatever environment is current
    /// at evaluation time.
    pub fn resolve(&mut self, id: ExprId, distance: usize) {
        self.locals.insert(id, distance);
    }

    pub fn interpret(&mut self, statements: &[Stmt], reporter: &mut Reporter) {
        for statement in statements {
            match self.execute(statement) {
                Ok(()) => {}
                Err(Flow::Error(error)) => {
                    reporter.runtime_error(&error);
                    return;
                }
                // A `return`/`break` that escaped every enclosing function/loop is a
                // resolver bug, not a reachable runtime state: the resolver rejects
                // top-level `return` and out-of-loop `break` before interpretation
                // ever starts.
                Err(Flow::Return(_)) | Err(Flow::Break) => {
                    unreachable!("resolver guarantees return/break never escape to top level")
                }
            }
        }
    }

    // --- statement execution -------------------------------------------------

    pub fn execute(&mut self, stmt: &Stmt) -> ExecResult {
        match stmt {
            Stmt::Expression(expr) => {
                self.evaluate(expr)?;
                Ok(())
            }
            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                println!("{value}");
                Ok(())
            }
            Stmt::Var(var) => {
                match &var.initializer {
                    Some(init) => {
                        let value = self.evaluate(init)?;
                        self.environment.borrow_mut().define(&var.name.lexeme, value);
                    }
                    None => self.environment.borrow_mut().declare(&var.name.lexeme),
                }
                Ok(())
            }
            Stmt::Block(statements) => {
                let enclosed = Environment::new_enclosed(Rc::clone(&self.environment));
                self.execute_block(statements, enclosed)
            }
            Stmt::If(data) => {
                if self.evaluate(&data.condition)?.is_truthy() {
                    self.execute(&data.then_branch)
                } else if let Some(else_branch) = &data.else_branch {
                    self.execute(else_branch)
                } else {
                    Ok(())
                }
            }
            Stmt::While(data) => {
                while self.evaluate(&data.condition)?.is_truthy() {
                    match self.execute(&data.body) {
                        Ok(()) => {}
                        Err(Flow::Break) => break,
                        err => return err,
                    }
                }
                Ok(())
            }
            Stmt::Function(declaration) => {
                let function = LoxFunction::new(Rc::clone(declaration), Rc::clone(&self.environment));
                self.environment
                    .borrow_mut()
                    .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
                Ok(())
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                Err(Flow::Return(value))
            }
            Stmt::Break(_) => Err(Flow::Break),
        }
    }

    /// Executes `statements` in `environment`, restoring the previous
    /// current environment on every exit path — normal completion, a
    /// propagating runtime error, or a `return`/`break` signal.
    pub fn execute_block(&mut self, statements: &[Stmt], environment: Rc<RefCell<Environment>>) -> ExecResult {
        let previous = std::mem::replace(&mut self.environment, environment);

        let mut result = Ok(());
        for statement in statements {
            if let Err(flow) = self.execute(statement) {
                result = Err(flow);
                break;
            }
        }

        self.environment = previous;
        result
    }

    // --- expression evaluation ------------------------------------------------

    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(literal) => Ok(match &literal.value {
                LiteralValue::Nil => Value::Nil,
                LiteralValue::Bool(b) => Value::Bool(*b),
                LiteralValue::Number(n) => Value::Number(*n),
                LiteralValue::String(s) => Value::String(Rc::new(s.clone())),
            }),
            Expr::Grouping(grouping) => self.evaluate(&grouping.inner),
            Expr::Unary(unary) => {
                let right = self.evaluate(&unary.right)?;
                match unary.operator.kind {
                    Kind::Minus => match right {
                        Value::Number(n) => Ok(Value::Number(-n)),
                        _ => Err(RuntimeError::new(unary.operator.clone(), "Operand must be a number.")),
                    },
                    Kind::Bang => Ok(Value::Bool(!right.is_truthy())),
                    _ => unreachable!("parser never produces a unary operator outside ! and -"),
                }
            }
            Expr::Binary(binary) => self.evaluate_binary(binary),
            Expr::Logical(logical) => {
                let left = self.evaluate(&logical.left)?;
                match logical.operator.kind {
                    Kind::Or if left.is_truthy() => Ok(left),
                    Kind::Or => self.evaluate(&logical.right),
                    Kind::And if !left.is_truthy() => Ok(left),
                    Kind::And => self.evaluate(&logical.right),
                    _ => unreachable!("parser never produces a logical operator outside and/or"),
                }
            }
            Expr::Conditional(conditional) => {
                if self.evaluate(&conditional.condition)?.is_truthy() {
                    self.evaluate(&conditional.then_branch)
                } else {
                    self.evaluate(&conditional.else_branch)
                }
            }
            Expr::Variable(variable) => self.lookup_variable(&variable.name, variable.id),
            Expr::Assign(assign) => {
                let value = self.evaluate(&assign.value)?;
                match self.locals.get(&assign.id) {
                    Some(&distance) => {
                        Environment::assign_at(&self.environment, distance, &assign.name, value.clone())?
                    }
                    None => Environment::assign(&self.globals, &assign.name, value.clone())?,
                }
                Ok(value)
            }
            Expr::Call(call) => self.evaluate_call(call),
            Expr::Function(function) => Ok(Value::Function(Rc::new(LoxFunction::new(
                Rc::clone(&function.declaration),
                Rc::clone(&self.environment),
            )))),
        }
    }

    fn lookup_variable(&self, name: &crate::token::Token, id: ExprId) -> Result<Value, RuntimeError> {
        match self.locals.get(&id) {
            Some(&distance) => Environment::get_at(&self.environment, distance, name),
            None => Environment::get(&self.globals, name),
        }
    }

    fn evaluate_binary(&mut self, binary: &crate::expr::Binary) -> Result<Value, RuntimeError> {
        let left = self.evaluate(&binary.left)?;
        let right = self.evaluate(&binary.right)?;
        let op = &binary.operator;

        match op.kind {
            Kind::Plus => match (&left, &right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::String(_), _) | (_, Value::String(_)) => {
                    Ok(Value::from(format!("{left}{right}")))
                }
                _ => Err(RuntimeError::new(op.clone(), "Operands must be two numbers or at least one string.")),
            },
            Kind::Minus => numeric_op(op, &left, &right, |l, r| Value::Number(l - r)),
            Kind::Star => numeric_op(op, &left, &right, |l, r| Value::Number(l * r)),
            Kind::Slash => {
                let (l, r) = as_numbers(op, &left, &right)?;
                if r == 0.0 {
                    return Err(RuntimeError::new(op.clone(), "Divisor must not be zero."));
                }
                Ok(Value::Number(l / r))
            }
            Kind::Greater => ordered_op(op, &left, &right, |ord| ord.is_gt()),
            Kind::GreaterEqual => ordered_op(op, &left, &right, |ord| ord.is_ge()),
            Kind::Less => ordered_op(op, &left, &right, |ord| ord.is_lt()),
            Kind::LessEqual => ordered_op(op, &left, &right, |ord| ord.is_le()),
            Kind::EqualEqual => Ok(Value::Bool(left.equals(&right))),
            Kind::BangEqual => Ok(Value::Bool(!left.equals(&right))),
            Kind::Comma => Ok(right),
            _ => unreachable!("parser never produces a binary operator outside the arithmetic/comparison/comma set"),
        }
    }

    fn evaluate_call(&mut self, call: &crate::expr::Call) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(&call.callee)?;

        let mut arguments = Vec::with_capacity(call.arguments.len());
        for argument in &call.arguments {
            arguments.push(self.evaluate(argument)?);
        }

        let callable = callee
            .as_callable()
            .ok_or_else(|| RuntimeError::new(call.paren.clone(), "Can only call functions and classes."))?;

        if arguments.len() != callable.arity() {
            return Err(RuntimeError::new(
                call.paren.clone(),
                format!("Expected {} arguments but got {}.", callable.arity(), arguments.len()),
            ));
        }

        callable.call(self, arguments)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

fn as_numbers(op: &crate::token::Token, left: &Value, right: &Value) -> Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
        _ => Err(RuntimeError::new(op.clone(), "Operands must be numbers.")),
    }
}

fn numeric_op(
    op: &crate::token::Token,
    left: &Value,
    right: &Value,
    f: impl Fn(f64, f64) -> Value,
) -> Result<Value, RuntimeError> {
    let (l, r) = as_numbers(op, left, right)?;
    Ok(f(l, r))
}

fn ordered_op(
    op: &crate::token::Token,
    left: &Value,
    right: &Value,
    f: impl Fn(std::cmp::Ordering) -> bool,
) -> Result<Value, RuntimeError> {
    let ordering = match (left, right) {
        (Value::Number(l), Value::Number(r)) => l.partial_cmp(r),
        (Value::String(l), Value::String(r)) => Some(l.as_str().cmp(r.as_str())),
        _ => None,
    };

    match ordering {
        Some(ord) => Ok(Value::Bool(f(ord))),
        None => Err(RuntimeError::new(op.clone(), "Operands must be two numbers or two strings.")),
    }
}
