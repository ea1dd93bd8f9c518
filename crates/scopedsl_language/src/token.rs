//! Token types for scope source.
//!
//! Tokens are the output of the lexer and input to the parser.

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns the text this token covers in the given source.
    #[must_use]
    pub fn text<'a>(&self, source: &'a str) -> &'a str {
        self.span.text(source)
    }

    /// Returns true if this token can follow a term as a postfix step.
    #[must_use]
    pub const fn is_step(&self) -> bool {
        matches!(
            self.kind,
            TokenKind::Iterate | TokenKind::Filter(_) | TokenKind::Dot
        )
    }
}

/// Token types for scope source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, optionally namespaced: `actor`, `core:inventory`.
    Name(String),
    /// `.` before a path segment
    Dot,
    /// `+` union
    Plus,
    /// `|` union
    Pipe,
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `!` inside `entities(...)`
    Bang,
    /// `:=` in definition files
    Define,
    /// `[]` array iteration, whitespace allowed inside
    Iterate,
    /// `[ ... ]` with a non-empty body; holds the raw JSON text
    Filter(String),
    /// `// ...` comment text
    Comment(String),
    /// End of input
    Eof,
    /// Lexer error
    Error(String),
}

impl TokenKind {
    /// Returns true if this token kind should be ignored during parsing.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Returns true for the union operators `+` and `|`.
    #[must_use]
    pub const fn is_union(&self) -> bool {
        matches!(self, Self::Plus | Self::Pipe)
    }

    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Name(_) => "identifier",
            Self::Dot => "'.'",
            Self::Plus => "'+'",
            Self::Pipe => "'|'",
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::Bang => "'!'",
            Self::Define => "':='",
            Self::Iterate => "'[]'",
            Self::Filter(_) => "filter",
            Self::Comment(_) => "comment",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }
}
