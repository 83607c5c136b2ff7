use std::rc::Rc;

use crate::error::{ParseError, Reporter};
use crate::expr::Expr;
use crate::stmt::{FunctionDecl, If, Stmt, Var, While};
use crate::token::{Kind, Literal as TokenLiteral, Token};

type ParseResult<T> = Result<T, ParseError>;

const MAX_ARGS: usize = 255;

/// Recursive-descent parser, one token of lookahead. Consumes the whole
/// token stream up front (produced by the scanner) rather than pulling
/// from it lazily — the grammar never needs more lookahead than the
/// trivial backtracking `matches!`-style calls give it.
///
/// Declaration-level errors (panic-mode recovered, so parsing keeps
/// going) accumulate here rather than being reported through the whole
/// call stack immediately — that would mean threading a `&mut Reporter`
/// through every expression-parsing method, including ones nested
/// inside an anonymous function's body. They're drained into the
/// caller's reporter once, in order, when `parse`/`parse_repl` returns.
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    anonymous_count: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Parser {
        Parser { tokens, current: 0, anonymous_count: 0, errors: Vec::new() }
    }

    /// Parses a whole program: zero or more declarations up to `EOF`.
    /// A declaration that fails to parse is reported and skipped (via
    /// `synchronize`) rather than aborting the whole parse.
    pub fn parse(&mut self, reporter: &mut Reporter) -> Vec<Stmt> {
        let mut statements = Vec::new();
        while !self.check(Kind::Eof) {
            if let Some(statement) = self.declaration() {
                statements.push(statement);
            }
        }
        for error in self.errors.drain(..) {
            reporter.token_error(&error.token, &error.message);
        }
        statements
    }

    /// Interactive-mode convenience: if the whole line parses as a bare
    /// expression with nothing left over, treat it as `print <expr>;`
    /// rather than requiring the trailing semicolon an `exprStmt` needs.
    /// Tried as a trial parse over a private reporter so a failed
    /// attempt never marks the caller's reporter; on failure, falls back
    /// to ordinary statement parsing from the top.
    pub fn parse_repl(tokens: Vec<Token>, reporter: &mut Reporter) -> Vec<Stmt> {
        let mut trial = Parser::new(tokens.clone());
        if let Ok(expr) = trial.expression() {
            if trial.check(Kind::Eof) {
                return vec![Stmt::Print(expr)];
            }
        }

        let mut parser = Parser::new(tokens);
        parser.parse(reporter)
    }

    // --- declarations -----------------------------------------------------

    fn declaration(&mut self) -> Option<Stmt> {
        let result = if self.matches(Kind::Var) {
            self.var_declaration()
        } else if self.matches(Kind::Fun) {
            self.function_declaration("function")
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(error) => {
                self.errors.push(error);
                self.synchronize();
                None
            }
        }
    }

    fn var_declaration(&mut self) -> ParseResult<Stmt> {
        let name = self.consume(Kind::Identifier, "Expect variable name.")?;
        let initializer = if self.matches(Kind::Equal) { Some(self.expression()?) } else { None };
        self.consume(Kind::Semicolon, "Expect ';' after variable declaration.")?;
        Ok(Stmt::Var(Var { name, initializer }))
    }

    fn function_declaration(&mut self, kind: &str) -> ParseResult<Stmt> {
        let name = self.consume(Kind::Identifier, &format!("Expect {kind} name."))?;
        let declaration = self.finish_function(name)?;
        Ok(Stmt::Function(Rc::new(declaration)))
    }

    /// Parses `"(" params? ")" block`, given the already-consumed name
    /// token. Shared between named declarations and anonymous function
    /// expressions (which synthesize their own name before calling this).
    fn finish_function(&mut self, name: Token) -> ParseResult<FunctionDecl> {
        self.consume(Kind::LeftParen, "Expect '(' after function name.")?;
        let mut params = Vec::new();
        if !self.check(Kind::RightParen) {
            loop {
                if params.len() >= MAX_ARGS {
                    let peeked = self.peek().clone();
                    return Err(ParseError::new(peeked, format!("Can't have more than {MAX_ARGS} parameters.")));
                }
                params.push(self.consume(Kind::Identifier, "Expect parameter name.")?);
                if !self.matches(Kind::Comma) {
                    break;
                }
            }
        }
        self.consume(Kind::RightParen, "Expect ')' after parameters.")?;
        self.consume(Kind::LeftBrace, "Expect '{' before function body.")?;
        let body = self.block()?;
        Ok(FunctionDecl { name, params, body })
    }

    // --- statements ---------------------------------------------------------

    fn statement(&mut self) -> ParseResult<Stmt> {
        if self.matches(Kind::If) {
            self.if_statement()
        } else if self.matches(Kind::While) {
            self.while_statement()
        } else if self.matches(Kind::For) {
            self.for_statement()
        } else if self.matches(Kind::Return) {
            self.return_statement()
        } else if self.matches(Kind::Break) {
            self.break_statement()
        } else if self.matches(Kind::Print) {
            self.print_statement()
        } else if self.matches(Kind::LeftBrace) {
            Ok(Stmt::Block(self.block()?))
        } else {
            self.expression_statement()
        }
    }

    fn if_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'if'.")?;
        let condition = self.expression()?;
        self.consume(Kind::RightParen, "Expect ')' after if condition.")?;

        let then_branch = Box::new(self.statement()?);
        let else_branch = if self.matches(Kind::Else) { Some(Box::new(self.statement()?)) } else { None };

        Ok(Stmt::If(If { condition, then_branch, else_branch }))
    }

    fn while_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'while'.")?;
        let condition = self.expression()?;
        self.consume(Kind::RightParen, "Expect ')' after condition.")?;
        let body = Box::new(self.statement()?);
        Ok(Stmt::While(While { condition, body }))
    }

    /// Desugars into the equivalent `while`: the initializer (if any)
    /// and the increment wrap the body in nested blocks rather than
    /// introducing a distinct AST node for `for`.
    fn for_statement(&mut self) -> ParseResult<Stmt> {
        self.consume(Kind::LeftParen, "Expect '(' after 'for'.")?;

        let initializer = if self.matches(Kind::Semicolon) {
            None
        } else if self.matches(Kind::Var) {
            Some(self.var_declaration()?)
        } else {
            Some(self.expression_statement()?)
        };

        let condition = if self.check(Kind::Semicolon) {
            Expr::literal(crate::expr::LiteralValue::Bool(true))
        } else {
            self.expression()?
        };
        self.consume(Kind::Semicolon, "Expect ';' after loop condition.")?;

        let increment = if self.check(Kind::RightParen) { None } else { Some(self.expression()?) };
        self.consume(Kind::RightParen, "Expect ')' after for clauses.")?;

        let mut body = self.statement()?;

        if let Some(increment) = increment {
            body = Stmt::Block(vec![body, Stmt::Expression(increment)]);
        }

        body = Stmt::While(While { condition, body: Box::new(body) });

        if let Some(initializer) = initializer {
            body = Stmt::Block(vec![initializer, body]);
        }

        Ok(body)
    }

    fn return_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        let value = if self.check(Kind::Semicolon) { None } else { Some(self.expression()?) };
        self.consume(Kind::Semicolon, "Expect ';' after return value.")?;
        Ok(Stmt::Return { keyword, value })
    }

    fn break_statement(&mut self) -> ParseResult<Stmt> {
        let keyword = self.previous().clone();
        self.consume(Kind::Semicolon, "Expect ';' after 'break'.")?;
        Ok(Stmt::Break(keyword))
    }

    fn print_statement(&mut self) -> ParseResult<Stmt> {
        let value = self.expression()?;
        self.consume(Kind::Semicolon, "Expect ';' after value.")?;
        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> ParseResult<Stmt> {
        let value = self.expression()?;
        self.consume(Kind::Semicolon, "Expect ';' after expression.")?;
        Ok(Stmt::Expression(value))
    }

    fn block(&mut self) -> ParseResult<Vec<Stmt>> {
        let mut statements = Vec::new();
        while !self.check(Kind::RightBrace) && !self.check(Kind::Eof) {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }
        self.consume(Kind::RightBrace, "Expect '}' after block.")?;
        Ok(statements)
    }

    // --- expressions ----------------------------------------------------------

    fn expression(&mut self) -> ParseResult<Expr> {
        self.comma()
    }

    fn comma(&mut self) -> ParseResult<Expr> {
        let mut expr = self.assignment()?;
        while self.matches(Kind::Comma) {
            let operator = self.previous().clone();
            let right = self.assignment()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn assignment(&mut self) -> ParseResult<Expr> {
        let expr = self.ternary()?;

        if self.matches(Kind::Equal) {
            let equals = self.previous().clone();
            let value = self.assignment()?;

            return match expr {
                Expr::Variable(variable) => Ok(Expr::assign(variable.name, value)),
                _ => {
                    // Not raised as a `ParseError`: the parser isn't confused
                    // about structure, just rejecting a semantically invalid
                    // target, so the left side survives and parsing keeps
                    // going without synchronizing.
                    self.errors.push(ParseError::new(equals, "Invalid assignment target."));
                    Ok(expr)
                }
            };
        }

        Ok(expr)
    }

    /// `cond ? then else`, with no `:` token. A second `?` nested inside
    /// `then`/`else` is consumed by the recursive `logic_or` call, not by
    /// this loop, so chained ternaries still associate to the right.
    fn ternary(&mut self) -> ParseResult<Expr> {
        let mut expr = self.logic_or()?;

        while self.matches(Kind::Question) {
            let then_branch = self.logic_or()?;
            let else_branch = self.logic_or()?;
            expr = Expr::conditional(expr, then_branch, else_branch);
        }

        Ok(expr)
    }

    fn logic_or(&mut self) -> ParseResult<Expr> {
        let mut expr = self.logic_and()?;
        while self.matches(Kind::Or) {
            let operator = self.previous().clone();
            let right = self.logic_and()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn logic_and(&mut self) -> ParseResult<Expr> {
        let mut expr = self.equality()?;
        while self.matches(Kind::And) {
            let operator = self.previous().clone();
            let right = self.equality()?;
            expr = Expr::logical(expr, operator, right);
        }
        Ok(expr)
    }

    fn equality(&mut self) -> ParseResult<Expr> {
        let mut expr = self.comparison()?;
        while self.matches_any(&[Kind::BangEqual, Kind::EqualEqual]) {
            let operator = self.previous().clone();
            let right = self.comparison()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn comparison(&mut self) -> ParseResult<Expr> {
        let mut expr = self.term()?;
        while self.matches_any(&[Kind::Greater, Kind::GreaterEqual, Kind::Less, Kind::LessEqual]) {
            let operator = self.previous().clone();
            let right = self.term()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn term(&mut self) -> ParseResult<Expr> {
        let mut expr = self.factor()?;
        while self.matches_any(&[Kind::Minus, Kind::Plus]) {
            let operator = self.previous().clone();
            let right = self.factor()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn factor(&mut self) -> ParseResult<Expr> {
        let mut expr = self.unary()?;
        while self.matches_any(&[Kind::Star, Kind::Slash]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            expr = Expr::binary(expr, operator, right);
        }
        Ok(expr)
    }

    fn unary(&mut self) -> ParseResult<Expr> {
        if self.matches_any(&[Kind::Bang, Kind::Minus]) {
            let operator = self.previous().clone();
            let right = self.unary()?;
            return Ok(Expr::unary(operator, right));
        }
        self.call()
    }

    fn call(&mut self) -> ParseResult<Expr> {
        let mut expr = self.primary()?;

        loop {
            if self.matches(Kind::LeftParen) {
                expr = self.finish_call(expr)?;
            } else {
                break;
            }
        }

        Ok(expr)
    }

    /// Arguments parse at `ternary` precedence, never `expression` —
    /// otherwise the comma operator would swallow `f(a, b)`'s argument
    /// separator and read it as one two-element comma expression.
    fn finish_call(&mut self, callee: Expr) -> ParseResult<Expr> {
        let mut arguments = Vec::new();
        if !self.check(Kind::RightParen) {
            loop {
                if arguments.len() >= MAX_ARGS {
                    let peeked = self.peek().clone();
                    return Err(ParseError::new(peeked, format!("Can't have more than {MAX_ARGS} arguments.")));
                }
                arguments.push(self.ternary()?);
                if !self.matches(Kind::Comma) {
                    break;
                }
            }
        }
        let paren = self.consume(Kind::RightParen, "Expect ')' after arguments.")?;
        Ok(Expr::call(callee, paren, arguments))
    }

    fn primary(&mut self) -> ParseResult<Expr> {
        if self.matches(Kind::False) {
            return Ok(Expr::literal(crate::expr::LiteralValue::Bool(false)));
        }
        if self.matches(Kind::True) {
            return Ok(Expr::literal(crate::expr::LiteralValue::Bool(true)));
        }
        if self.matches(Kind::Nil) {
            return Ok(Expr::literal(crate::expr::LiteralValue::Nil));
        }
        if self.matches(Kind::Number) {
            return Ok(Expr::literal(crate::expr::LiteralValue::Number(self.previous_number())));
        }
        if self.matches(Kind::String) {
            return Ok(Expr::literal(crate::expr::LiteralValue::String(self.previous_string())));
        }
        if self.matches(Kind::Fun) {
            return self.anonymous_function();
        }
        if self.matches(Kind::Identifier) {
            return Ok(Expr::variable(self.previous().clone()));
        }
        if self.matches(Kind::LeftParen) {
            let expr = self.expression()?;
            self.consume(Kind::RightParen, "Expect ')' after expression.")?;
            return Ok(Expr::grouping(expr));
        }

        let peeked = self.peek().clone();
        Err(ParseError::new(peeked, "Expect expression."))
    }

    fn anonymous_function(&mut self) -> ParseResult<Expr> {
        self.anonymous_count += 1;
        let line = self.previous().line;
        let name = Token::new(Kind::Identifier, format!("anonymous{}", self.anonymous_count), None, line);
        let declaration = self.finish_function(name)?;
        Ok(Expr::function(Rc::new(declaration)))
    }

    fn previous_number(&self) -> f64 {
        match &self.previous().literal {
            Some(TokenLiteral::Number(n)) => *n,
            _ => unreachable!("scanner always attaches a Number literal to a Number token"),
        }
    }

    fn previous_string(&self) -> String {
        match &self.previous().literal {
            Some(TokenLiteral::String(s)) => s.clone(),
            _ => unreachable!("scanner always attaches a String literal to a String token"),
        }
    }

    // --- token stream helpers -------------------------------------------------

    fn matches(&mut self, kind: Kind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn matches_any(&mut self, kinds: &[Kind]) -> bool {
        kinds.iter().any(|&kind| self.matches(kind))
    }

    fn check(&self, kind: Kind) -> bool {
        self.peek().kind == kind
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous()
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == Kind::Eof
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current - 1]
    }

    fn consume(&mut self, kind: Kind, message: &str) -> ParseResult<Token> {
        if self.check(kind) {
            return Ok(self.advance().clone());
        }
        Err(ParseError::new(self.peek().clone(), message))
    }

    /// Panic-mode recovery: discard tokens until just past a semicolon,
    /// or until the next token starts a new declaration/statement.
    fn synchronize(&mut self) {
        self.advance();
        while !self.is_at_end() {
            if self.previous().kind == Kind::Semicolon {
                return;
            }
            match self.peek().kind {
                Kind::Class | Kind::Fun | Kind::Var | Kind::For | Kind::If | Kind::While | Kind::Print | Kind::Return => {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::scanner::Scanner;

    fn parse(source: &str) -> (Vec<Stmt>, Reporter) {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        let statements = Parser::new(tokens).parse(&mut reporter);
        (statements, reporter)
    }

    #[test]
    fn parses_print_statement() {
        let (statements, reporter) = parse("print 1 + 2;");
        assert!(!reporter.had_error());
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print(_)));
    }

    #[test]
    fn ternary_has_no_colon() {
        let (statements, reporter) = parse("print true ? 1 2;");
        assert!(!reporter.had_error());
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn call_arguments_do_not_absorb_comma_operator() {
        let (statements, reporter) = parse("print f(1, 2);");
        assert!(!reporter.had_error());
        if let Stmt::Print(Expr::Call(call)) = &statements[0] {
            assert_eq!(call.arguments.len(), 2);
        } else {
            panic!("expected a print of a call expression");
        }
    }

    #[test]
    fn invalid_assignment_target_is_reported_but_does_not_abort_parsing() {
        let (statements, reporter) = parse("1 = 2; print 3;");
        assert!(reporter.had_error());
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn missing_semicolon_is_a_parse_error() {
        let (_, reporter) = parse("var a = 1");
        assert!(reporter.had_error());
    }

    #[test]
    fn for_loop_desugars_to_while_in_blocks() {
        let (statements, reporter) = parse("for (var i = 0; i < 3; i = i + 1) print i;");
        assert!(!reporter.had_error());
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Block(_)));
    }

    #[test]
    fn anonymous_function_expression_parses() {
        let (statements, reporter) = parse("var f = fun (a) { return a; };");
        assert!(!reporter.had_error());
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn nested_block_parse_error_is_reported_and_skipped() {
        let (statements, reporter) = parse("{ 1 = 2; print 3; }");
        assert!(reporter.had_error());
        assert_eq!(statements.len(), 1);
        if let Stmt::Block(inner) = &statements[0] {
            assert_eq!(inner.len(), 1);
        } else {
            panic!("expected a block");
        }
    }

    #[test]
    fn break_statement_parses() {
        let (statements, reporter) = parse("while (true) { break; }");
        assert!(!reporter.had_error());
        assert_eq!(statements.len(), 1);
    }

    #[test]
    fn repl_bare_expression_becomes_print() {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new("1 + 2").scan_tokens(&mut reporter);
        let statements = Parser::parse_repl(tokens, &mut reporter);
        assert!(!reporter.had_error());
        assert_eq!(statements.len(), 1);
        assert!(matches!(statements[0], Stmt::Print(_)));
    }
}
