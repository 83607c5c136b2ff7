use std::str::Chars;

use peekmore::{PeekMore, PeekMoreIterator};

use crate::error::Reporter;
use crate::token::{Kind, Literal, Token};

/// Converts source text into a flat token stream.
///
/// Walks the source once as an iterator over `char`s with two-token
/// lookahead (`peekmore`), rather than indexing a byte/char vector —
/// the scanner never needs to backtrack, only to peek ahead far enough
/// to disambiguate `!`/`!=`, `/`/`//`/`/* */`, and decimal points.
pub struct Scanner<'a> {
    source: PeekMoreIterator<Chars<'a>>,
    tokens: Vec<Token>,
    lexeme: String,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source: source.chars().peekmore(),
            tokens: Vec::new(),
            lexeme: String::new(),
            line: 1,
        }
    }

    /// Scans the whole source and returns its tokens, terminated by a
    /// sentinel `Eof` token. Lexical errors are reported through
    /// `reporter` but do not stop scanning.
    pub fn scan_tokens(mut self, reporter: &mut Reporter) -> Vec<Token> {
        while self.peek().is_some() {
            self.lexeme.clear();
            self.scan_token(reporter);
        }

        self.tokens.push(Token::new(Kind::Eof, String::new(), None, self.line));
        self.tokens
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.source.next();
        if let Some(c) = c {
            self.lexeme.push(c);
        }
        c
    }

    fn peek(&mut self) -> Option<char> {
        self.source.peek().copied()
    }

    fn peek_next(&mut self) -> Option<char> {
        self.source.peek_next().copied()
    }

    /// Consumes the next character if it matches `expected`.
    fn matches(&mut self, expected: char) -> bool {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance();
                true
            }
            _ => false,
        }
    }

    fn add_token(&mut self, kind: Kind, literal: Option<Literal>) {
        self.tokens.push(Token::new(kind, self.lexeme.clone(), literal, self.line));
    }

    fn scan_token(&mut self, reporter: &mut Reporter) {
        let c = match self.advance() {
            Some(c) => c,
            None => return,
        };

        match c {
            '(' => self.add_token(Kind::LeftParen, None),
            ')' => self.add_token(Kind::RightParen, None),
            '{' => self.add_token(Kind::LeftBrace, None),
            '}' => self.add_token(Kind::RightBrace, None),
            ',' => self.add_token(Kind::Comma, None),
            '.' => self.add_token(Kind::Dot, None),
            '-' => self.add_token(Kind::Minus, None),
            '+' => self.add_token(Kind::Plus, None),
            ';' => self.add_token(Kind::Semicolon, None),
            '*' => self.add_token(Kind::Star, None),
            '?' => self.add_token(Kind::Question, None),
            ':' => self.add_token(Kind::Colon, None),

            '!' => {
                let kind = if self.matches('=') { Kind::BangEqual } else { Kind::Bang };
                self.add_token(kind, None);
            }
            '=' => {
                let kind = if self.matches('=') { Kind::EqualEqual } else { Kind::Equal };
                self.add_token(kind, None);
            }
            '<' => {
                let kind = if self.matches('=') { Kind::LessEqual } else { Kind::Less };
                self.add_token(kind, None);
            }
            '>' => {
                let kind = if self.matches('=') { Kind::GreaterEqual } else { Kind::Greater };
                self.add_token(kind, None);
            }
            '/' => {
                if self.matches('/') {
                    while !matches!(self.peek(), Some('\n') | None) {
                        self.advance();
                    }
                } else if self.matches('*') {
                    self.block_comment(reporter);
                } else {
                    self.add_token(Kind::Slash, None);
                }
            }

            ' ' | '\r' | '\t' => {}
            '\n' => self.line += 1,

            '"' => self.string(reporter),
            c if c.is_ascii_digit() => self.number(),
            c if c.is_ascii_alphabetic() || c == '_' => self.identifier(),

            c => reporter.scan_error(self.line, &format!("Unexpected character '{c}'")),
        }
    }

    /// Scans a non-nestable `/* ... */` comment. The opening `/*` has
    /// already been consumed. An unterminated comment is a scan error.
    fn block_comment(&mut self, reporter: &mut Reporter) {
        let start_line = self.line;
        loop {
            match self.peek() {
                None => {
                    reporter.scan_error(start_line, "Unterminated block comment");
                    return;
                }
                Some('*') if self.peek_next() == Some('/') => {
                    self.advance();
                    self.advance();
                    return;
                }
                Some('\n') => {
                    self.line += 1;
                    self.advance();
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn string(&mut self, reporter: &mut Reporter) {
        let start_line = self.line;
        let mut value = String::new();

        loop {
            match self.peek() {
                None => {
                    reporter.scan_error(start_line, "Unterminated string");
                    return;
                }
                Some('"') => break,
                Some(c) => {
                    if c == '\n' {
                        self.line += 1;
                    }
                    value.push(c);
                    self.advance();
                }
            }
        }

        self.advance(); // closing quote

        self.add_token(Kind::String, Some(Literal::String(value)));
    }

    fn number(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }

        if self.peek() == Some('.') && matches!(self.peek_next(), Some(c) if c.is_ascii_digit()) {
            self.advance(); // consume the '.'
            while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                self.advance();
            }
        }

        let value: f64 = self.lexeme.parse().expect("scanned number lexeme to parse as f64");
        self.add_token(Kind::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_') {
            self.advance();
        }

        let kind = match self.lexeme.as_str() {
            "and" => Kind::And,
            "class" => Kind::Class,
            "else" => Kind::Else,
            "false" => Kind::False,
            "for" => Kind::For,
            "fun" => Kind::Fun,
            "if" => Kind::If,
            "nil" => Kind::Nil,
            "or" => Kind::Or,
            "print" => Kind::Print,
            "return" => Kind::Return,
            "super" => Kind::Super,
            "this" => Kind::This,
            "true" => Kind::True,
            "var" => Kind::Var,
            "while" => Kind::While,
            "break" => Kind::Break,
            _ => Kind::Identifier,
        };

        self.add_token(kind, None);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn scan(source: &str) -> (Vec<Token>, Reporter) {
        let mut reporter = Reporter::new();
        let tokens = Scanner::new(source).scan_tokens(&mut reporter);
        (tokens, reporter)
    }

    #[test]
    fn single_and_double_char_tokens() {
        let (tokens, reporter) = scan("!= == <= >= !");
        assert!(!reporter.had_error());
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![
            Kind::BangEqual, Kind::EqualEqual, Kind::LessEqual,
            Kind::GreaterEqual, Kind::Bang, Kind::Eof,
        ]);
    }

    #[test]
    fn line_comment_is_ignored() {
        let (tokens, _) = scan("1 // a comment\n2");
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Number, Kind::Number, Kind::Eof]);
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn block_comment_tracks_lines() {
        let (tokens, reporter) = scan("1 /* spans\nlines */ 2");
        assert!(!reporter.had_error());
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn unterminated_block_comment_is_error() {
        let (_, reporter) = scan("1 /* never closes");
        assert!(reporter.had_error());
    }

    #[test]
    fn string_literal_excludes_quotes() {
        let (tokens, _) = scan("\"hello\"");
        match &tokens[0].literal {
            Some(Literal::String(s)) => assert_eq!(s, "hello"),
            other => panic!("expected string literal, got {other:?}"),
        }
    }

    #[test]
    fn unterminated_string_is_error() {
        let (_, reporter) = scan("\"hello");
        assert!(reporter.had_error());
    }

    #[test]
    fn number_literal() {
        let (tokens, _) = scan("123.45");
        match &tokens[0].literal {
            Some(Literal::Number(n)) => assert_eq!(*n, 123.45),
            other => panic!("expected number literal, got {other:?}"),
        }
    }

    #[test]
    fn trailing_dot_is_not_consumed() {
        let (tokens, _) = scan("123.");
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Number, Kind::Dot, Kind::Eof]);
    }

    #[test]
    fn keywords_and_identifiers() {
        let (tokens, _) = scan("and class fun notakeyword");
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::And, Kind::Class, Kind::Fun, Kind::Identifier, Kind::Eof]);
    }

    #[test]
    fn unexpected_character_continues_scanning() {
        let (tokens, reporter) = scan("1 | 2");
        assert!(reporter.had_error());
        let kinds: Vec<Kind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(kinds, vec![Kind::Number, Kind::Number, Kind::Eof]);
    }

    #[test]
    fn lexeme_round_trips_into_source() {
        let source = "var answer = 42;";
        let (tokens, _) = scan(source);
        for token in &tokens {
            if token.kind == Kind::Eof {
                continue;
            }
            assert!(source.contains(&token.lexeme), "lexeme {:?} not found in source", token.lexeme);
        }
    }

    #[test]
    fn line_numbers_are_non_decreasing() {
        let (tokens, _) = scan("1\n2\n\n3");
        let mut last = 0;
        for token in &tokens {
            assert!(token.line >= last);
            last = token.line;
        }
    }
}
