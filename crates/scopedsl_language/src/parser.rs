//! Parser for scope expressions and definition files.
//!
//! The parser converts a stream of tokens into a [`ScopeExpr`] tree.
//! Postfix steps bind tighter than union, `+` and `|` are the same operator,
//! and a union is always a single flat node: `a:b[f] + c:d | e:f` is
//! `Union[Filter(a:b), c:d, e:f]`.

use std::sync::Arc;

use scopedsl_foundation::{Error, Result, path};

use crate::ast::{Node, ScopeDefinition, ScopeExpr, SourceRef};
use crate::filter::{CompileError, Filter};
use crate::lexer::Lexer;
use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Parser for scope source.
pub struct Parser<'src> {
    /// The lexer providing tokens.
    lexer: Lexer<'src>,
    /// Current token (lookahead).
    current: Token,
}

impl<'src> Parser<'src> {
    /// Creates a new parser for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut lexer = Lexer::new(source);
        let current = lexer.next_token();
        Self { lexer, current }
    }

    /// Parses a single scope expression; the whole input must be consumed.
    ///
    /// # Errors
    /// Returns a syntax error if the source is empty or malformed.
    pub fn parse_scope(&mut self) -> Result<ScopeExpr> {
        self.skip_trivia();
        if self.current.kind == TokenKind::Eof {
            return Err(self.error("empty scope expression"));
        }
        let expr = self.parse_expr()?;
        self.expect_eof()?;
        Ok(expr)
    }

    /// Parses a file of `id := expr` definitions.
    ///
    /// # Errors
    /// Returns a syntax error at the first malformed definition.
    pub fn parse_definitions(&mut self) -> Result<Vec<ScopeDefinition>> {
        let mut definitions = Vec::new();
        self.skip_trivia();

        while self.current.kind != TokenKind::Eof {
            definitions.push(self.parse_definition()?);
            self.skip_trivia();
        }

        Ok(definitions)
    }

    /// Parses `id := expr`.
    fn parse_definition(&mut self) -> Result<ScopeDefinition> {
        let start = self.current.span;
        let id = match &self.current.kind {
            TokenKind::Name(name) if path::is_component_id(name) => name.clone(),
            TokenKind::Name(name) => {
                return Err(self.error(&format!(
                    "scope id '{name}' must be namespaced (ns:name)"
                )));
            }
            TokenKind::Error(msg) => return Err(self.error(msg)),
            other => {
                return Err(self.error(&format!("expected scope id, found {}", other.name())));
            }
        };
        self.advance();
        self.expect(&TokenKind::Define)?;

        if self.current.kind == TokenKind::Eof {
            return Err(self.error(&format!("missing expression for scope '{id}'")));
        }
        let expr = self.parse_expr()?;
        let span = start.to(expr.span);
        Ok(ScopeDefinition { id, expr, span })
    }

    /// Parses `term (('+' | '|') term)*`.
    fn parse_expr(&mut self) -> Result<ScopeExpr> {
        let first = self.parse_term()?;
        if !self.current.kind.is_union() {
            return Ok(first);
        }

        let start = first.span;
        let mut members = vec![first];
        while self.current.kind.is_union() {
            self.advance();
            members.push(self.parse_term()?);
        }
        let end = members.last().map_or(start, |m| m.span);
        Ok(ScopeExpr::new(Node::Union(members), start.to(end)))
    }

    /// Parses `source step*`.
    fn parse_term(&mut self) -> Result<ScopeExpr> {
        let mut expr = self.parse_source()?;

        loop {
            self.skip_trivia();
            match &self.current.kind {
                TokenKind::Iterate => {
                    let span = expr.span.to(self.current.span);
                    self.advance();
                    expr = ScopeExpr::new(Node::ArrayIterate(Box::new(expr)), span);
                }
                TokenKind::Filter(body) => {
                    let filter = Filter::parse(body)
                        .map_err(|e| self.filter_error(self.current.span, &e))?;
                    let span = expr.span.to(self.current.span);
                    self.advance();
                    expr = ScopeExpr::new(
                        Node::Filter {
                            child: Box::new(expr),
                            filter: Arc::new(filter),
                        },
                        span,
                    );
                }
                TokenKind::Dot => expr = self.parse_property_access(expr)?,
                TokenKind::Error(msg) => return Err(self.error(msg)),
                _ => return Ok(expr),
            }
        }
    }

    /// Parses one or more `.segment` steps into a single node.
    fn parse_property_access(&mut self, child: ScopeExpr) -> Result<ScopeExpr> {
        let mut path = Vec::new();
        let mut end = child.span;

        while self.current.kind == TokenKind::Dot {
            self.advance();
            match &self.current.kind {
                TokenKind::Name(segment) => {
                    path.push(segment.clone());
                    end = self.current.span;
                    self.advance();
                }
                TokenKind::Error(msg) => return Err(self.error(msg)),
                other => {
                    return Err(self.error(&format!(
                        "expected path segment after '.', found {}",
                        other.name()
                    )));
                }
            }
        }

        let span = child.span.to(end);
        Ok(ScopeExpr::new(
            Node::PropertyAccess {
                child: Box::new(child),
                path,
            },
            span,
        ))
    }

    /// Parses a source: a built-in, `entities(...)`, or a scope reference.
    fn parse_source(&mut self) -> Result<ScopeExpr> {
        self.skip_trivia();
        let span = self.current.span;
        let name = match &self.current.kind {
            TokenKind::Name(name) => name.clone(),
            TokenKind::Error(msg) => return Err(self.error(msg)),
            TokenKind::Eof => return Err(self.error("unexpected end of input")),
            other => {
                return Err(self.error(&format!("expected a scope source, found {}", other.name())));
            }
        };
        self.advance();

        let source = match name.as_str() {
            "actor" => SourceRef::Actor,
            "location" => SourceRef::Location,
            "self" => SourceRef::SelfRef,
            "none" => SourceRef::Nothing,
            "entities" => return self.parse_entities(span),
            id if path::is_component_id(id) => SourceRef::Scope(name),
            other => {
                return Err(self.error_at(
                    span,
                    &format!(
                        "invalid identifier '{other}': expected a built-in source or a namespaced scope id"
                    ),
                ));
            }
        };
        Ok(ScopeExpr::source(source, span))
    }

    /// Parses `'(' '!'? componentId ')'` after `entities`.
    fn parse_entities(&mut self, start: Span) -> Result<ScopeExpr> {
        self.expect(&TokenKind::LParen)?;
        let negated = self.current.kind == TokenKind::Bang;
        if negated {
            self.advance();
        }

        let component = match &self.current.kind {
            TokenKind::Name(name) if path::is_component_id(name) => name.clone(),
            TokenKind::Name(name) => {
                return Err(self.error(&format!(
                    "component id '{name}' must be namespaced (ns:name)"
                )));
            }
            TokenKind::Error(msg) => return Err(self.error(msg)),
            other => {
                return Err(self.error(&format!(
                    "expected component id, found {}",
                    other.name()
                )));
            }
        };
        self.advance();

        let end = self.current.span;
        self.expect(&TokenKind::RParen)?;
        Ok(ScopeExpr::source(
            SourceRef::Entities { component, negated },
            start.to(end),
        ))
    }

    /// Skips comment tokens.
    fn skip_trivia(&mut self) {
        while self.current.kind.is_trivia() {
            self.advance();
        }
    }

    /// Advances to the next token.
    fn advance(&mut self) {
        self.current = self.lexer.next_token();
    }

    /// Expects the current token to be of a specific kind, then advances.
    fn expect(&mut self, expected: &TokenKind) -> Result<()> {
        if std::mem::discriminant(&self.current.kind) == std::mem::discriminant(expected) {
            self.advance();
            Ok(())
        } else if let TokenKind::Error(msg) = &self.current.kind {
            Err(self.error(msg))
        } else {
            Err(self.error(&format!(
                "expected {}, found {}",
                expected.name(),
                self.current.kind.name()
            )))
        }
    }

    /// Expects end of input, skipping trailing comments.
    fn expect_eof(&mut self) -> Result<()> {
        self.skip_trivia();
        match &self.current.kind {
            TokenKind::Eof => Ok(()),
            TokenKind::Error(msg) => Err(self.error(msg)),
            other => Err(self.error(&format!("unexpected trailing input: {}", other.name()))),
        }
    }

    /// Creates a syntax error at the current position.
    fn error(&self, message: &str) -> Error {
        self.error_at(self.current.span, message)
    }

    /// Creates a syntax error at a specific span.
    #[allow(clippy::unused_self)]
    fn error_at(&self, span: Span, message: &str) -> Error {
        Error::syntax(message, span.start, span.line, span.column)
    }

    /// Creates a syntax error for the filter token at `span`, pointing at
    /// the offending byte inside the JSON when it is known.
    fn filter_error(&self, span: Span, err: &CompileError) -> Error {
        let Some((line, column)) = err.position else {
            return self.error_at(span, &err.message);
        };
        let source = self.lexer.source();
        // The body starts after '[' and any leading whitespace.
        let after_bracket = source.get(span.start + 1..).unwrap_or_default();
        let body_start = span.start + 1 + (after_bracket.len() - after_bracket.trim_start().len());
        let body = source.get(body_start..span.end).unwrap_or_default();

        let line_start: usize = body
            .split_inclusive('\n')
            .take(line.saturating_sub(1) as usize)
            .map(str::len)
            .sum();
        let mut offset = (body_start + line_start + column.saturating_sub(1) as usize).min(span.end);
        while !source.is_char_boundary(offset) {
            offset -= 1;
        }

        let before = &source[..offset];
        let line = 1 + before.matches('\n').count();
        let column = 1 + before.rsplit('\n').next().map_or(0, |l| l.chars().count());
        Error::syntax(
            &err.message,
            offset,
            u32::try_from(line).unwrap_or(u32::MAX),
            u32::try_from(column).unwrap_or(u32::MAX),
        )
    }
}

/// Parses a single scope expression.
///
/// # Errors
/// Returns a syntax error if the source cannot be parsed.
pub fn parse_scope(source: &str) -> Result<ScopeExpr> {
    Parser::new(source).parse_scope()
}

/// Parses a definitions file (`id := expr`, one per line, `//` comments).
///
/// # Errors
/// Returns a syntax error at the first malformed definition.
pub fn parse_definitions(source: &str) -> Result<Vec<ScopeDefinition>> {
    Parser::new(source).parse_definitions()
}
