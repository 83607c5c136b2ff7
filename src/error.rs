use crate::token::{Kind, Token};

/// Accumulates error state across a single run and prints diagnostics.
///
/// The source material this crate is based on uses a process-wide
/// reporter (a pair of global mutable booleans). Here the reporter is an
/// explicit value threaded by `&mut` reference into the scanner, parser,
/// resolver and interpreter, so the pipeline has no hidden shared state
/// and multiple `Lox` instances (or multiple REPL lines) never interfere
/// with one another.
#[derive(Debug, Default)]
pub struct Reporter {
    had_error: bool,
    had_runtime_error: bool,
}

impl Reporter {
    pub fn new() -> Self {
        Reporter::default()
    }

    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    pub fn reset(&mut self) {
        self.had_error = false;
        self.had_runtime_error = false;
    }

    /// Reports a lexical error. Scanner errors have no "at" context.
    pub fn scan_error(&mut self, line: usize, message: &str) {
        eprintln!("[line {line}] Error: {message}");
        self.had_error = true;
    }

    /// Reports a syntactic or static-semantic error, tied to a token.
    pub fn token_error(&mut self, token: &Token, message: &str) {
        eprintln!("[line {}] Error {}: {message}", token.line, where_clause(token));
        self.had_error = true;
    }

    /// Reports a runtime error, tied to the offending token. Uses the same
    /// `[line L] Error <where>: <message>` shape as `token_error` — runtime
    /// errors carry a token (per spec §7) just like parse/resolve errors do.
    pub fn runtime_error(&mut self, error: &RuntimeError) {
        eprintln!("[line {}] Error {}: {}", error.token.line, where_clause(&error.token), error.message);
        self.had_runtime_error = true;
    }
}

/// The `<where>` clause of the error output format: `at end` at `EOF`,
/// `at '<lexeme>'` otherwise.
fn where_clause(token: &Token) -> String {
    if token.kind == Kind::Eof {
        "at end".to_string()
    } else {
        format!("at '{}'", token.lexeme)
    }
}

/// A runtime error, carrying the token whose evaluation triggered it so
/// the reporter can attribute a line number.
#[derive(Debug, Clone)]
pub struct RuntimeError {
    pub token: Token,
    pub message: String,
}

impl RuntimeError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        RuntimeError { token, message: message.into() }
    }
}

/// A syntactic error raised while parsing. Carries the token the parser
/// was looking at when it gave up, purely so `synchronize` and the
/// reporter have something to work with; it is not a panic/exception —
/// callers use it through a `Result`.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub token: Token,
    pub message: String,
}

impl ParseError {
    pub fn new(token: Token, message: impl Into<String>) -> Self {
        ParseError { token, message: message.into() }
    }
}
