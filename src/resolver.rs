use std::collections::HashMap;

use crate::error::Reporter;
use crate::expr::Expr;
use crate::interpreter::Interpreter;
use crate::stmt::Stmt;
use crate::token::Token;

#[derive(Clone, Copy, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum LoopType {
    None,
    Loop,
}

/// A static pass over the parsed tree that runs once, before any code
/// executes, and computes how many enclosing scopes separate each
/// variable reference from its binding. The interpreter trusts these
/// distances completely at runtime rather than searching the
/// environment chain by name.
///
/// Also rejects at compile time two things that would otherwise surface
/// as confusing runtime states: reading a local variable from its own
/// initializer, and a `break` outside any loop.
pub struct Resolver<'a> {
    interpreter: &'a mut Interpreter,
    scopes: Vec<HashMap<String, bool>>,
    current_function: FunctionType,
    current_loop: LoopType,
}

impl<'a> Resolver<'a> {
    pub fn new(interpreter: &'a mut Interpreter) -> Self {
        Resolver {
            interpreter,
            scopes: Vec::new(),
            current_function: FunctionType::None,
            current_loop: LoopType::None,
        }
    }

    pub fn resolve(&mut self, statements: &[Stmt], reporter: &mut Reporter) {
        self.resolve_statements(statements, reporter);
    }

    fn resolve_statements(&mut self, statements: &[Stmt], reporter: &mut Reporter) {
        for statement in statements {
            self.resolve_statement(statement, reporter);
        }
    }

    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Marks `name` as declared-but-not-yet-defined in the innermost
    /// scope, so that `var x = x;` can be caught: while resolving the
    /// initializer, `x` refers to the outer binding (or is undefined),
    /// never to itself.
    fn declare(&mut self, name: &Token, reporter: &mut Reporter) {
        if let Some(scope) = self.scopes.last_mut() {
            if scope.contains_key(&name.lexeme) {
                reporter.token_error(name, &format!("Already a variable with this name '{}' in this scope.", name.lexeme));
            }
            scope.insert(name.lexeme.clone(), false);
        }
    }

    fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    fn resolve_local(&mut self, expr: &Expr, name: &Token) {
        for (i, scope) in self.scopes.iter().rev().enumerate() {
            if scope.contains_key(&name.lexeme) {
                self.interpreter.resolve(expr.id(), i);
                return;
            }
        }
        // Not found in any scope: treated as global, resolved by name at runtime.
    }

    fn resolve_function(&mut self, params: &[Token], body: &[Stmt], kind: FunctionType, reporter: &mut Reporter) {
        let enclosing_function = self.current_function;
        self.current_function = kind;
        let enclosing_loop = self.current_loop;
        self.current_loop = LoopType::None;

        self.begin_scope();
        for param in params {
            self.declare(param, reporter);
            self.define(param);
        }
        self.resolve_statements(body, reporter);
        self.end_scope();

        self.current_function = enclosing_function;
        self.current_loop = enclosing_loop;
    }

    fn resolve_statement(&mut self, stmt: &Stmt, reporter: &mut Reporter) {
        match stmt {
            Stmt::Expression(expr) => self.resolve_expression(expr, reporter),
            Stmt::Print(expr) => self.resolve_expression(expr, reporter),
            Stmt::Var(var) => {
                self.declare(&var.name, reporter);
                if let Some(initializer) = &var.initializer {
                    self.resolve_expression(initializer, reporter);
                }
                self.define(&var.name);
            }
            Stmt::Block(statements) => {
                self.begin_scope();
                self.resolve_statements(statements, reporter);
                self.end_scope();
            }
            Stmt::If(data) => {
                self.resolve_expression(&data.condition, reporter);
                self.resolve_statement(&data.then_branch, reporter);
                if let Some(else_branch) = &data.else_branch {
                    self.resolve_statement(else_branch, reporter);
                }
            }
            Stmt::While(data) => {
                self.resolve_expression(&data.condition, reporter);
                let enclosing_loop = self.current_loop;
                self.current_loop = LoopType::Loop;
                self.resolve_statement(&data.body, reporter);
                self.current_loop = enclosing_loop;
            }
            Stmt::Function(declaration) => {
                self.declare(&declaration.name, reporter);
                self.define(&declaration.name);
                self.resolve_function(&declaration.params, &declaration.body, FunctionType::Function, reporter);
            }
            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    reporter.token_error(keyword, "Can't return from top-level code.");
                }
                if let Some(value) = value {
                    self.resolve_expression(value, reporter);
                }
            }
            Stmt::Break(keyword) => {
                if self.current_loop == LoopType::None {
                    reporter.token_error(keyword, "Can't use 'break' outside of a loop.");
                }
            }
        }
    }

    fn resolve_expression(&mut self, expr: &Expr, reporter: &mut Reporter) {
        match expr {
            Expr::Literal(_) => {}
            Expr::Grouping(data) => self.resolve_expression(&data.inner, reporter),
            Expr::Unary(data) => self.resolve_expression(&data.right, reporter),
            Expr::Binary(data) => {
                self.resolve_expression(&data.left, reporter);
                self.resolve_expression(&data.right, reporter);
            }
            Expr::Logical(data) => {
                self.resolve_expression(&data.left, reporter);
                self.resolve_expression(&data.right, reporter);
            }
            Expr::Conditional(data) => {
                self.resolve_expression(&data.condition, reporter);
                self.resolve_expression(&data.then_branch, reporter);
                self.resolve_expression(&data.else_branch, reporter);
            }
            Expr::Variable(data) => {
                if let Some(scope) = self.scopes.last() {
                    if scope.get(&data.name.lexeme) == Some(&false) {
                        reporter.token_error(&data.name, "Can't read local variable in its own initializer.");
                    }
                }
                self.resolve_local(expr, &data.name);
            }
            Expr::Assign(data) => {
                self.resolve_expression(&data.value, reporter);
                self.resolve_local(expr, &data.name);
            }
            Expr::Call(data) => {
                self.resolve_expression(&data.callee, reporter);
                for argument in &data.arguments {
                    self.resolve_expression(argument, reporter);
                }
            }
            Expr::Function(data) => {
                self.resolve_function(&data.declaration.params, &data.declaration.body, FunctionType::Function, reporter);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parser::Parser;
    use crate::scanner::Scanner;

    fn resolve(source: &str) -> (Interpreter, Reporter) {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        let statements = Parser::new(tokens).parse(&mut reporter);
        let mut interpreter = Interpreter::new();
        Resolver::new(&mut interpreter).resolve(&statements, &mut reporter);
        (interpreter, reporter)
    }

    #[test]
    fn self_referential_initializer_is_rejected() {
        let (_, reporter) = resolve("var a = a;");
        assert!(reporter.had_error());
    }

    #[test]
    fn shadowing_in_nested_scope_is_allowed() {
        let (_, reporter) = resolve("var a = 1; { var a = 2; print a; }");
        assert!(!reporter.had_error());
    }

    #[test]
    fn duplicate_declaration_in_same_scope_is_rejected() {
        let (_, reporter) = resolve("{ var a = 1; var a = 2; }");
        assert!(reporter.had_error());
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        let (_, reporter) = resolve("break;");
        assert!(reporter.had_error());
    }

    #[test]
    fn break_inside_function_nested_in_loop_is_rejected() {
        let (_, reporter) = resolve("while (true) { fun f() { break; } f(); }");
        assert!(reporter.had_error());
    }

    #[test]
    fn break_inside_while_is_allowed() {
        let (_, reporter) = resolve("while (true) { break; }");
        assert!(!reporter.had_error());
    }

    #[test]
    fn return_outside_function_is_rejected() {
        let (_, reporter) = resolve("return 1;");
        assert!(reporter.had_error());
    }

    #[test]
    fn return_inside_function_is_allowed() {
        let (_, reporter) = resolve("fun f() { return 1; }");
        assert!(!reporter.had_error());
    }
}
