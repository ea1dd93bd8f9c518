//! Integration tests for Layer 2: Language
//!
//! Tests for the scope parser and the JSON-Logic filter evaluator.

mod filters;
mod parser;
