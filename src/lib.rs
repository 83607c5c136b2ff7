//! A tree-walking interpreter for a small dynamically-typed scripting
//! language in the tradition of Lox.
//!
//! The pipeline is strictly staged and single-threaded:
//!
//! 1. [`scanner`] turns source text into a flat token stream.
//! 2. [`parser`] turns tokens into a list of statements (recursive
//!    descent, one token of lookahead, panic-mode error recovery).
//! 3. [`resolver`] walks the parsed program once and records, for every
//!    variable reference, how many enclosing scopes separate it from
//!    its binding.
//! 4. [`interpreter`] executes the program, consulting the resolver's
//!    side table instead of searching the environment chain by name.
//!
//! A [`error::Reporter`] threaded through every stage accumulates error
//! state for the caller to act on, rather than a process-wide global.

pub mod environment;
pub mod error;
pub mod expr;
pub mod function;
pub mod interpreter;
pub mod parser;
pub mod resolver;
pub mod scanner;
pub mod stmt;
pub mod token;
pub mod value;

use error::Reporter;
use interpreter::Interpreter;
use parser::Parser;
use resolver::Resolver;
use scanner::Scanner;

/// Process exit code on success.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code when scanning, parsing, or resolving failed.
pub const EXIT_DATA_ERROR: i32 = 65;
/// Process exit code when a runtime error escaped a top-level statement.
pub const EXIT_SOFTWARE_ERROR: i32 = 70;

/// Owns the one piece of state that must survive across REPL lines: the
/// globals environment and the resolution side table, both living
/// inside [`Interpreter`]. A fresh [`Reporter`] is used per run so one
/// line's error doesn't poison the next.
pub struct Lox {
    interpreter: Interpreter,
}

impl Lox {
    pub fn new() -> Self {
        Lox { interpreter: Interpreter::new() }
    }

    /// Runs a complete source string (a whole file, or one REPL line in
    /// file-mode semantics — no bare-expression convenience). Returns
    /// the exit code the caller should surface.
    pub fn run(&mut self, source: &str) -> i32 {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        let statements = Parser::new(tokens).parse(&mut reporter);

        self.run_statements(statements, &mut reporter)
    }

    /// Runs one REPL line: a bare expression with no trailing semicolon
    /// is treated as if it had been written `print <expr>;`.
    pub fn run_repl_line(&mut self, source: &str) -> i32 {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        let statements = Parser::parse_repl(tokens, &mut reporter);

        self.run_statements(statements, &mut reporter)
    }

    fn run_statements(&mut self, statements: Vec<stmt::Stmt>, reporter: &mut Reporter) -> i32 {
        if reporter.had_error() {
            return EXIT_DATA_ERROR;
        }

        Resolver::new(&mut self.interpreter).resolve(&statements, reporter);
        if reporter.had_error() {
            return EXIT_DATA_ERROR;
        }

        self.interpreter.interpret(&statements, reporter);
        if reporter.had_runtime_error() {
            return EXIT_SOFTWARE_ERROR;
        }

        EXIT_SUCCESS
    }
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn closure_over_definition_scope_not_call_site() {
        // Matches the canonical closure test: `showA` must keep printing
        // the `a` that was in scope when it was declared, even after a
        // shadowing `a` is declared alongside it.
        let mut lox = Lox::new();
        let code = r#"
            var a = "global";
            {
                fun showA() { print a; }
                showA();
                var a = "block";
                showA();
            }
        "#;
        assert_eq!(lox.run(code), EXIT_SUCCESS);
    }

    #[test]
    fn division_by_zero_is_a_runtime_error_exit_code() {
        let mut lox = Lox::new();
        assert_eq!(lox.run("print 1 / 0;"), EXIT_SOFTWARE_ERROR);
    }

    #[test]
    fn top_level_return_is_a_data_error_exit_code() {
        let mut lox = Lox::new();
        assert_eq!(lox.run("return 1;"), EXIT_DATA_ERROR);
    }

    #[test]
    fn well_formed_program_exits_zero() {
        let mut lox = Lox::new();
        assert_eq!(lox.run("for (var i = 0; i < 3; i = i + 1) print i;"), EXIT_SUCCESS);
    }

    #[test]
    fn repl_line_without_semicolon_is_treated_as_print() {
        let mut lox = Lox::new();
        assert_eq!(lox.run_repl_line("1 + 2"), EXIT_SUCCESS);
    }
}
