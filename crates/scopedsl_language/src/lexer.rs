//! Lexer for scope source.
//!
//! The lexer converts source text into a stream of tokens. Filter bodies are
//! not tokenized here: everything between a `[` and its matching `]` is kept
//! as raw JSON text for the filter compiler.

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer for scope expressions and definition files.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the full source text.
    #[must_use]
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '.' => self.single(TokenKind::Dot),
            '+' => self.single(TokenKind::Plus),
            '|' => self.single(TokenKind::Pipe),
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '!' => self.single(TokenKind::Bang),
            '[' => self.scan_brackets(),
            ']' => self.single(TokenKind::Error("unbalanced ']'".into())),
            ':' => {
                self.advance();
                if self.peek_char() == Some('=') {
                    self.advance();
                    TokenKind::Define
                } else {
                    TokenKind::Error("unexpected ':'".into())
                }
            }
            '/' if self.peek_char_n(1) == Some('/') => self.scan_comment(),
            c if is_ident_start(c) => self.scan_name(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens.
    ///
    /// Comments are included in the output.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Peeks at the next character without consuming it.
    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peeks `n` characters ahead.
    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    /// Consumes one character and yields `kind`.
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Skips whitespace characters.
    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Scans a comment starting with `//`.
    fn scan_comment(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(|c| c != '\n') {
            self.advance();
        }
        TokenKind::Comment(self.source[start..self.position].to_string())
    }

    /// Scans `[]` or a bracketed filter body.
    ///
    /// The body ends at the `]` that balances the opening bracket. Brackets
    /// inside JSON strings do not count.
    fn scan_brackets(&mut self) -> TokenKind {
        self.advance(); // consume '['
        self.skip_whitespace();
        if self.peek_char() == Some(']') {
            self.advance();
            return TokenKind::Iterate;
        }

        let body_start = self.position;
        let mut depth = 0usize;
        let mut in_string = false;
        loop {
            let Some(c) = self.peek_char() else {
                return TokenKind::Error("unbalanced '['".into());
            };
            if in_string {
                match c {
                    '\\' => self.advance(),
                    '"' => in_string = false,
                    _ => {}
                }
            } else {
                match c {
                    '"' => in_string = true,
                    '[' => depth += 1,
                    ']' if depth == 0 => break,
                    ']' => depth -= 1,
                    _ => {}
                }
            }
            self.advance();
        }

        let body = self.source[body_start..self.position].trim_end().to_string();
        self.advance(); // consume ']'
        TokenKind::Filter(body)
    }

    /// Scans an identifier with an optional `:name` suffix.
    fn scan_name(&mut self) -> TokenKind {
        let start = self.position;
        self.scan_ident();
        if self.peek_char() == Some(':') && self.peek_char_n(1) != Some('=') {
            self.advance(); // consume ':'
            if !self.peek_char().is_some_and(is_ident_start) {
                return TokenKind::Error(format!(
                    "invalid identifier: expected name after '{}'",
                    &self.source[start..self.position]
                ));
            }
            self.scan_ident();
        }
        TokenKind::Name(self.source[start..self.position].to_string())
    }

    fn scan_ident(&mut self) {
        while self.peek_char().is_some_and(is_ident_char) {
            self.advance();
        }
    }
}

/// Returns true if `c` can start an identifier.
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Returns true if `c` can appear in an identifier (not at start).
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}
