//! JSON-Logic filter compiler.
//!
//! Filter documents are compiled once, at parse time, into a typed
//! [`FilterExpr`] tree. Unknown operators and malformed arities are rejected
//! here so that evaluation only ever fails on data, never on shape.

use std::fmt;

use scopedsl_foundation::{Error, JsonValue, path};
use thiserror::Error;

/// A filter document that failed to compile.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileError {
    /// What went wrong.
    pub message: String,
    /// 1-based line and byte column inside the filter text, when the
    /// failure is in the JSON itself.
    pub position: Option<(u32, u32)>,
}

impl CompileError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            position: None,
        }
    }

    fn invalid_json(err: &serde_json::Error) -> Self {
        let line = u32::try_from(err.line()).unwrap_or(u32::MAX);
        let column = u32::try_from(err.column()).unwrap_or(u32::MAX);
        Self {
            message: format!("invalid JSON in filter: {err}"),
            // serde_json reports line 0 for errors with no location.
            position: (line > 0).then_some((line, column.max(1))),
        }
    }
}

impl From<CompileError> for Error {
    fn from(err: CompileError) -> Self {
        let (line, column) = err.position.unwrap_or((1, 1));
        Error::syntax(err.message, 0, line, column)
    }
}

/// Comparison operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompareOp {
    /// `==` (loose)
    Eq,
    /// `!=` (loose)
    Ne,
    /// `===`
    StrictEq,
    /// `!==`
    StrictNe,
    /// `<`, or "between" with three operands
    Lt,
    /// `<=`, or "between inclusive" with three operands
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

impl CompareOp {
    /// Returns the JSON-Logic operator name.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::StrictEq => "===",
            Self::StrictNe => "!==",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
        }
    }

    /// Returns true for the ordering operators.
    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Le | Self::Gt | Self::Ge)
    }
}

/// Array quantifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Quantifier {
    /// `some`: at least one element satisfies the predicate
    Some,
    /// `every`: the array is non-empty and all elements satisfy it
    Every,
    /// `none`: no element satisfies it
    None,
}

impl Quantifier {
    /// Returns the JSON-Logic operator name.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Some => "some",
            Self::Every => "every",
            Self::None => "none",
        }
    }
}

/// A pre-split `var` path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VarPath {
    raw: String,
    segments: Vec<String>,
}

impl VarPath {
    /// Parses a dotted path. `""` addresses the whole current data.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let segments = path::split(&raw);
        Self { raw, segments }
    }

    /// Returns the path as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns the path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }
}

/// A compiled filter expression.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterExpr {
    /// Constant data.
    Literal(JsonValue),
    /// Array literal with computed elements.
    Array(Vec<FilterExpr>),
    /// `{"var": path}` or `{"var": [path, default]}`
    Var {
        /// Path to look up.
        path: VarPath,
        /// Value used when the lookup yields nothing.
        default: Option<Box<FilterExpr>>,
    },
    /// `{"missing": [paths...]}`
    Missing(Vec<FilterExpr>),
    /// `{"!": x}` / `{"not": x}`
    Not(Box<FilterExpr>),
    /// `{"!!": x}`
    Truthy(Box<FilterExpr>),
    /// `{"and": [...]}`
    And(Vec<FilterExpr>),
    /// `{"or": [...]}`
    Or(Vec<FilterExpr>),
    /// `{"if": [cond, then, cond, then, ..., else]}`
    If(Vec<FilterExpr>),
    /// Equality and ordering comparisons.
    Compare {
        /// The operator.
        op: CompareOp,
        /// Two operands, or three for the between form of `<` / `<=`.
        args: Vec<FilterExpr>,
    },
    /// `{"in": [needle, haystack]}`
    In {
        /// Value searched for.
        needle: Box<FilterExpr>,
        /// Array or string searched in.
        haystack: Box<FilterExpr>,
    },
    /// `{"some"|"every"|"none": [array, predicate]}`
    Quantified {
        /// Which quantifier.
        quantifier: Quantifier,
        /// Expression producing the array.
        array: Box<FilterExpr>,
        /// Predicate evaluated with each element as data.
        predicate: Box<FilterExpr>,
    },
    /// `{"condition_ref": "ns:id"}`
    ConditionRef(String),
}

impl FilterExpr {
    /// Compiles a JSON-Logic document.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown operators, operator objects with more
    /// than one key, and wrong operand counts.
    pub fn compile(json: &JsonValue) -> Result<Self, CompileError> {
        match json {
            JsonValue::Object(map) if map.is_empty() => Ok(Self::Literal(json.clone())),
            JsonValue::Object(map) => {
                let mut entries = map.iter();
                match (entries.next(), entries.next()) {
                    (Some((op, args)), None) => compile_operator(op, args),
                    _ => Err(CompileError::new(format!(
                        "operator object must have exactly one key, found {}",
                        map.len()
                    ))),
                }
            }
            JsonValue::Array(items) => {
                let compiled = items.iter().map(Self::compile).collect::<Result<Vec<_>, _>>()?;
                if compiled.iter().all(|e| matches!(e, Self::Literal(_))) {
                    Ok(Self::Literal(json.clone()))
                } else {
                    Ok(Self::Array(compiled))
                }
            }
            _ => Ok(Self::Literal(json.clone())),
        }
    }

    /// Returns true if this expression is constant data.
    #[must_use]
    pub const fn is_literal(&self) -> bool {
        matches!(self, Self::Literal(_))
    }

    /// Collects every `condition_ref` id this expression mentions.
    #[must_use]
    pub fn condition_refs(&self) -> Vec<&str> {
        let mut refs = Vec::new();
        self.visit(&mut |expr| {
            if let Self::ConditionRef(id) = expr {
                refs.push(id.as_str());
            }
        });
        refs
    }

    fn visit<'a>(&'a self, f: &mut impl FnMut(&'a Self)) {
        f(self);
        match self {
            Self::Literal(_) | Self::ConditionRef(_) => {}
            Self::Var { default, .. } => {
                if let Some(default) = default {
                    default.visit(f);
                }
            }
            Self::Not(inner) | Self::Truthy(inner) => inner.visit(f),
            Self::Array(items)
            | Self::Missing(items)
            | Self::And(items)
            | Self::Or(items)
            | Self::If(items)
            | Self::Compare { args: items, .. } => {
                for item in items {
                    item.visit(f);
                }
            }
            Self::In { needle, haystack } => {
                needle.visit(f);
                haystack.visit(f);
            }
            Self::Quantified {
                array, predicate, ..
            } => {
                array.visit(f);
                predicate.visit(f);
            }
        }
    }
}

/// Operand list: JSON-Logic allows a bare value for unary operators.
fn operands(args: &JsonValue) -> Vec<&JsonValue> {
    match args {
        JsonValue::Array(items) => items.iter().collect(),
        other => vec![other],
    }
}

fn compile_all(args: &[&JsonValue]) -> Result<Vec<FilterExpr>, CompileError> {
    args.iter().map(|a| FilterExpr::compile(a)).collect()
}

fn arity(op: &str, args: &[&JsonValue], allowed: &[usize]) -> Result<(), CompileError> {
    if allowed.contains(&args.len()) {
        Ok(())
    } else {
        let expected = allowed
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" or ");
        Err(CompileError::new(format!(
            "operator '{op}' expects {expected} operand(s), found {}",
            args.len()
        )))
    }
}

fn compile_operator(op: &str, raw: &JsonValue) -> Result<FilterExpr, CompileError> {
    let args = operands(raw);
    let compare = |cmp: CompareOp, allowed: &[usize]| -> Result<FilterExpr, CompileError> {
        arity(op, &args, allowed)?;
        Ok(FilterExpr::Compare {
            op: cmp,
            args: compile_all(&args)?,
        })
    };

    match op {
        "var" => compile_var(raw),
        "missing" => Ok(FilterExpr::Missing(compile_all(&args)?)),
        "condition_ref" => match args.as_slice() {
            [JsonValue::String(id)] => Ok(FilterExpr::ConditionRef(id.clone())),
            _ => Err(CompileError::new(
                "operator 'condition_ref' expects a single condition id string",
            )),
        },
        "==" => compare(CompareOp::Eq, &[2]),
        "!=" => compare(CompareOp::Ne, &[2]),
        "===" => compare(CompareOp::StrictEq, &[2]),
        "!==" => compare(CompareOp::StrictNe, &[2]),
        "<" => compare(CompareOp::Lt, &[2, 3]),
        "<=" => compare(CompareOp::Le, &[2, 3]),
        ">" => compare(CompareOp::Gt, &[2]),
        ">=" => compare(CompareOp::Ge, &[2]),
        "!" | "not" | "!!" => {
            arity(op, &args, &[1])?;
            let inner = Box::new(FilterExpr::compile(args[0])?);
            Ok(if op == "!!" {
                FilterExpr::Truthy(inner)
            } else {
                FilterExpr::Not(inner)
            })
        }
        "and" | "or" => {
            if args.is_empty() {
                return Err(CompileError::new(format!(
                    "operator '{op}' expects at least one operand"
                )));
            }
            let items = compile_all(&args)?;
            Ok(if op == "and" {
                FilterExpr::And(items)
            } else {
                FilterExpr::Or(items)
            })
        }
        "if" => {
            if args.is_empty() {
                return Err(CompileError::new("operator 'if' expects at least one operand"));
            }
            Ok(FilterExpr::If(compile_all(&args)?))
        }
        "in" => {
            arity(op, &args, &[2])?;
            Ok(FilterExpr::In {
                needle: Box::new(FilterExpr::compile(args[0])?),
                haystack: Box::new(FilterExpr::compile(args[1])?),
            })
        }
        "some" | "every" | "none" => {
            arity(op, &args, &[2])?;
            let quantifier = match op {
                "some" => Quantifier::Some,
                "every" => Quantifier::Every,
                _ => Quantifier::None,
            };
            Ok(FilterExpr::Quantified {
                quantifier,
                array: Box::new(FilterExpr::compile(args[0])?),
                predicate: Box::new(FilterExpr::compile(args[1])?),
            })
        }
        other => Err(CompileError::new(format!(
            "unknown JSON-Logic operator '{other}'"
        ))),
    }
}

fn compile_var(raw: &JsonValue) -> Result<FilterExpr, CompileError> {
    let (path, default) = match raw {
        JsonValue::Array(items) => match items.as_slice() {
            [] => (&JsonValue::Null, None),
            [path] => (path, None),
            [path, default] => (path, Some(Box::new(FilterExpr::compile(default)?))),
            _ => {
                return Err(CompileError::new(format!(
                    "operator 'var' expects 1 or 2 operand(s), found {}",
                    items.len()
                )));
            }
        },
        other => (other, None),
    };

    let path = match path {
        JsonValue::Null => VarPath::new(""),
        JsonValue::String(s) => VarPath::new(s.as_str()),
        JsonValue::Number(n) => VarPath::new(n.to_string()),
        _ => {
            return Err(CompileError::new(
                "operator 'var' expects a string or number path",
            ));
        }
    };
    Ok(FilterExpr::Var { path, default })
}

// =============================================================================
// Filter (compiled + source)
// =============================================================================

/// A filter as it appears in a scope: the JSON document and its compiled form.
#[derive(Clone, Debug, PartialEq)]
pub struct Filter {
    json: JsonValue,
    expr: FilterExpr,
}

impl Filter {
    /// Compiles a JSON-Logic document into a filter.
    ///
    /// # Errors
    ///
    /// Returns an error if the document is not valid JSON-Logic.
    pub fn new(json: JsonValue) -> Result<Self, CompileError> {
        let expr = FilterExpr::compile(&json)?;
        Ok(Self { json, expr })
    }

    /// Parses and compiles filter source text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not JSON or not valid JSON-Logic.
    pub fn parse(source: &str) -> Result<Self, CompileError> {
        let json: JsonValue =
            serde_json::from_str(source).map_err(|e| CompileError::invalid_json(&e))?;
        Self::new(json)
    }

    /// Returns the JSON document.
    #[must_use]
    pub fn json(&self) -> &JsonValue {
        &self.json
    }

    /// Returns the compiled expression.
    #[must_use]
    pub fn expr(&self) -> &FilterExpr {
        &self.expr
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.json)
    }
}
