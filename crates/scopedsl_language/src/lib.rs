//! Lexer, parser, and JSON-Logic filter evaluator for ScopeDSL.
//!
//! This crate provides:
//! - [`Lexer`] - Tokenization of scope source
//! - [`parse_scope`] / [`parse_definitions`] - Parsing into [`ScopeExpr`] trees
//! - [`Filter`] / [`FilterExpr`] - JSON-Logic documents compiled at parse time
//! - [`FilterEvaluator`] - Per-candidate filter evaluation with named conditions

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod ast;
pub mod eval;
pub mod filter;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;


pub use ast::{Node, NodeKind, ScopeDefinition, ScopeExpr, SourceRef};
pub use eval::{FilterContext, FilterEvaluator, Subject, loose_eq, strict_eq, truthy};
pub use filter::{CompareOp, CompileError, Filter, FilterExpr, Quantifier, VarPath};
pub use lexer::Lexer;
pub use parser::{Parser, parse_definitions, parse_scope};
pub use span::Span;
pub use token::{Token, TokenKind};
