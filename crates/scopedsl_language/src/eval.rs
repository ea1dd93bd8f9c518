//! JSON-Logic filter evaluation.
//!
//! The evaluator walks a compiled [`FilterExpr`] against a [`FilterContext`]
//! holding the candidate (`entity`) and the context roots (`actor`,
//! `location`). Lookups return `Cow::Borrowed` data straight out of the
//! entity manager, so comparing a component field against a literal does not
//! allocate.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;

use scopedsl_foundation::{EntityId, EntityManager, EntityView, Error, JsonValue, Result, path};

use crate::filter::{CompareOp, FilterExpr, Quantifier};

// =============================================================================
// Subjects and Context
// =============================================================================

/// Something a `var` root can point at.
#[derive(Clone, Copy, Debug)]
pub enum Subject<'a> {
    /// A stored entity.
    Entity(EntityView<'a>),
    /// An entity id the manager does not know; only `id` resolves.
    Detached(&'a EntityId),
    /// A non-entity candidate (component data reached by property access).
    Value(&'a JsonValue),
    /// Nothing: every path is `null`.
    Absent,
}

impl<'a> Subject<'a> {
    /// Looks up an entity id, falling back to [`Subject::Detached`].
    #[must_use]
    pub fn for_id(entities: &'a dyn EntityManager, id: &'a EntityId) -> Self {
        entities.entity(id).map_or(Self::Detached(id), Self::Entity)
    }

    /// Resolves a path relative to this subject.
    #[must_use]
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> Option<Cow<'a, JsonValue>> {
        match *self {
            Self::Entity(view) => view.lookup(segments),
            Self::Detached(id) => match segments {
                [] => Some(Cow::Owned(serde_json::json!({
                    "id": id.as_str(),
                    "components": {},
                }))),
                [only] if only.as_ref() == "id" => {
                    Some(Cow::Owned(JsonValue::String(id.to_string())))
                }
                _ => None,
            },
            Self::Value(value) => path::walk(value, segments).map(Cow::Borrowed),
            Self::Absent => None,
        }
    }

    /// Returns the entity id, if this subject is an entity.
    #[must_use]
    pub fn entity_id(&self) -> Option<&'a EntityId> {
        match *self {
            Self::Entity(view) => Some(view.id()),
            Self::Detached(id) => Some(id),
            Self::Value(_) | Self::Absent => None,
        }
    }
}

/// Data a filter is evaluated against.
///
/// Build one per batch of candidates and re-point [`FilterContext::set_entity`]
/// for each.
#[derive(Clone, Copy, Debug)]
pub struct FilterContext<'a> {
    entity: Subject<'a>,
    actor: Subject<'a>,
    location: Subject<'a>,
}

impl<'a> FilterContext<'a> {
    /// Creates a context with the given roots and no current entity.
    #[must_use]
    pub const fn new(actor: Subject<'a>, location: Subject<'a>) -> Self {
        Self {
            entity: Subject::Absent,
            actor,
            location,
        }
    }

    /// Sets the current candidate.
    #[must_use]
    pub const fn with_entity(mut self, entity: Subject<'a>) -> Self {
        self.entity = entity;
        self
    }

    /// Re-points the current candidate.
    pub fn set_entity(&mut self, entity: Subject<'a>) {
        self.entity = entity;
    }

    /// Returns the current candidate.
    #[must_use]
    pub const fn entity(&self) -> Subject<'a> {
        self.entity
    }

    /// Returns a named root: `entity`, `actor`, or `location`.
    #[must_use]
    pub fn root(&self, name: &str) -> Option<Subject<'a>> {
        match name {
            "entity" => Some(self.entity),
            "actor" => Some(self.actor),
            "location" => Some(self.location),
            _ => None,
        }
    }
}

// =============================================================================
// Evaluator
// =============================================================================

/// What a `var` path is relative to.
#[derive(Clone, Copy)]
enum Data<'a> {
    /// Top level: the first segment names a root.
    Roots,
    /// Inside `some`/`every`/`none`: the current array element.
    Element(&'a JsonValue),
}

/// Chain of `condition_ref` ids being expanded, innermost first.
struct RefFrame<'c> {
    id: &'c str,
    parent: Option<&'c RefFrame<'c>>,
}

impl RefFrame<'_> {
    fn contains(frame: Option<&Self>, id: &str) -> bool {
        let mut current = frame;
        while let Some(f) = current {
            if f.id == id {
                return true;
            }
            current = f.parent;
        }
        false
    }

    fn chain(frame: Option<&Self>, closing: &str) -> String {
        let mut ids = Vec::new();
        let mut current = frame;
        while let Some(f) = current {
            ids.push(f.id);
            current = f.parent;
        }
        ids.reverse();
        ids.push(closing);
        ids.join(" -> ")
    }
}

/// Evaluates compiled filters and owns the named-condition registry.
#[derive(Clone, Debug, Default)]
pub struct FilterEvaluator {
    conditions: HashMap<String, FilterExpr>,
}

impl FilterEvaluator {
    /// Creates an evaluator with no named conditions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compiles and registers a named condition for `condition_ref`.
    ///
    /// Replaces any condition with the same id.
    ///
    /// # Errors
    ///
    /// Returns a syntax error if the document is not valid JSON-Logic.
    pub fn register_condition(&mut self, id: impl Into<String>, logic: &JsonValue) -> Result<()> {
        let id = id.into();
        let expr = FilterExpr::compile(logic).map_err(|e| Error::from(e).in_scope(&id))?;
        self.conditions.insert(id, expr);
        Ok(())
    }

    /// Returns true if a condition with this id is registered.
    #[must_use]
    pub fn has_condition(&self, id: &str) -> bool {
        self.conditions.contains_key(id)
    }

    /// Returns all condition ids, sorted.
    #[must_use]
    pub fn condition_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.conditions.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Evaluates a filter to its truthiness.
    ///
    /// # Errors
    ///
    /// Returns a filter evaluation error for operator/type mismatches and
    /// unknown or cyclic condition references.
    pub fn evaluate(&self, expr: &FilterExpr, ctx: &FilterContext<'_>) -> Result<bool> {
        let value = self.eval(expr, ctx, Data::Roots, None)?;
        Ok(truthy(&value))
    }

    /// Evaluates a filter to its JSON value.
    ///
    /// # Errors
    ///
    /// See [`FilterEvaluator::evaluate`].
    pub fn apply(&self, expr: &FilterExpr, ctx: &FilterContext<'_>) -> Result<JsonValue> {
        self.eval(expr, ctx, Data::Roots, None).map(Cow::into_owned)
    }

    #[allow(clippy::too_many_lines)]
    fn eval<'a>(
        &'a self,
        expr: &'a FilterExpr,
        ctx: &FilterContext<'a>,
        data: Data<'a>,
        refs: Option<&RefFrame<'_>>,
    ) -> Result<Cow<'a, JsonValue>> {
        match expr {
            FilterExpr::Literal(value) => Ok(Cow::Borrowed(value)),

            FilterExpr::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.eval(item, ctx, data, refs).map(Cow::into_owned))
                    .collect::<Result<Vec<_>>>()?;
                Ok(Cow::Owned(JsonValue::Array(values)))
            }

            FilterExpr::Var { path, default } => {
                let found = lookup(ctx, data, path.segments());
                match (found, default) {
                    (Some(value), _) if !value.is_null() => Ok(value),
                    (_, Some(default)) => self.eval(default, ctx, data, refs),
                    (found, None) => Ok(found.unwrap_or(Cow::Owned(JsonValue::Null))),
                }
            }

            FilterExpr::Missing(args) => {
                let mut keys = Vec::new();
                for arg in args {
                    match self.eval(arg, ctx, data, refs)?.into_owned() {
                        JsonValue::Array(items) => keys.extend(items),
                        other => keys.push(other),
                    }
                }
                let missing = keys
                    .into_iter()
                    .filter(|key| {
                        let raw = match key {
                            JsonValue::String(s) => s.clone(),
                            JsonValue::Number(n) => n.to_string(),
                            _ => return true,
                        };
                        lookup(ctx, data, &path::split(&raw)).is_none_or(|v| v.is_null())
                    })
                    .collect();
                Ok(Cow::Owned(JsonValue::Array(missing)))
            }

            FilterExpr::Not(inner) => {
                let value = self.eval(inner, ctx, data, refs)?;
                Ok(bool_value(!truthy(&value)))
            }

            FilterExpr::Truthy(inner) => {
                let value = self.eval(inner, ctx, data, refs)?;
                Ok(bool_value(truthy(&value)))
            }

            FilterExpr::And(items) | FilterExpr::Or(items) => {
                let want = matches!(expr, FilterExpr::Or(_));
                let mut last = Cow::Owned(JsonValue::Null);
                for item in items {
                    let value = self.eval(item, ctx, data, refs)?;
                    if truthy(&value) == want {
                        return Ok(value);
                    }
                    last = value;
                }
                Ok(last)
            }

            FilterExpr::If(items) => {
                for chunk in items.chunks(2) {
                    match chunk {
                        [cond, then] => {
                            if truthy(&*self.eval(cond, ctx, data, refs)?) {
                                return self.eval(then, ctx, data, refs);
                            }
                        }
                        [otherwise] => return self.eval(otherwise, ctx, data, refs),
                        _ => {}
                    }
                }
                Ok(Cow::Owned(JsonValue::Null))
            }

            FilterExpr::Compare { op, args } => {
                let result = match args.as_slice() {
                    [a, b] => {
                        let a = self.eval(a, ctx, data, refs)?;
                        let b = self.eval(b, ctx, data, refs)?;
                        match op {
                            CompareOp::Eq => loose_eq(&a, &b),
                            CompareOp::Ne => !loose_eq(&a, &b),
                            CompareOp::StrictEq => strict_eq(&a, &b),
                            CompareOp::StrictNe => !strict_eq(&a, &b),
                            op => compare(*op, &a, &b)?,
                        }
                    }
                    // Between form: `lo < x < hi`.
                    [a, b, c] if op.is_ordering() => {
                        let a = self.eval(a, ctx, data, refs)?;
                        let b = self.eval(b, ctx, data, refs)?;
                        let c = self.eval(c, ctx, data, refs)?;
                        compare(*op, &a, &b)? && compare(*op, &b, &c)?
                    }
                    _ => {
                        return Err(Error::filter_evaluation(format!(
                            "operator '{}' received {} operands",
                            op.symbol(),
                            args.len()
                        )));
                    }
                };
                Ok(bool_value(result))
            }

            FilterExpr::In { needle, haystack } => {
                let needle = self.eval(needle, ctx, data, refs)?;
                let haystack = self.eval(haystack, ctx, data, refs)?;
                Ok(bool_value(contains(&needle, &haystack)?))
            }

            FilterExpr::Quantified {
                quantifier,
                array,
                predicate,
            } => {
                let array = self.eval(array, ctx, data, refs)?;
                let JsonValue::Array(items) = &*array else {
                    return Ok(bool_value(*quantifier == Quantifier::None));
                };

                let mut matched = 0usize;
                for item in items {
                    let value = self.eval(predicate, ctx, Data::Element(item), refs)?;
                    if truthy(&value) {
                        matched += 1;
                        if *quantifier != Quantifier::Every {
                            break;
                        }
                    } else if *quantifier == Quantifier::Every {
                        break;
                    }
                }

                let result = match quantifier {
                    Quantifier::Some => matched > 0,
                    Quantifier::Every => !items.is_empty() && matched == items.len(),
                    Quantifier::None => matched == 0,
                };
                Ok(bool_value(result))
            }

            FilterExpr::ConditionRef(id) => {
                if RefFrame::contains(refs, id) {
                    return Err(Error::filter_evaluation(format!(
                        "condition_ref cycle: {}",
                        RefFrame::chain(refs, id)
                    )));
                }
                let target = self.conditions.get(id).ok_or_else(|| {
                    Error::filter_evaluation(format!("unknown condition_ref '{id}'"))
                })?;
                let frame = RefFrame { id, parent: refs };
                self.eval(target, ctx, data, Some(&frame))
            }
        }
    }
}

/// Resolves a `var` path against the current data.
fn lookup<'a>(
    ctx: &FilterContext<'a>,
    data: Data<'a>,
    segments: &[String],
) -> Option<Cow<'a, JsonValue>> {
    match data {
        Data::Element(element) => path::walk(element, segments).map(Cow::Borrowed),
        Data::Roots => {
            let (root, rest) = segments.split_first()?;
            ctx.root(root)?.lookup(rest)
        }
    }
}

// =============================================================================
// Value Semantics
// =============================================================================

fn bool_value<'a>(b: bool) -> Cow<'a, JsonValue> {
    Cow::Owned(JsonValue::Bool(b))
}

/// JSON-Logic truthiness: `null`, `false`, `0`, `""` and `[]` are falsy.
#[must_use]
pub fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(items) => !items.is_empty(),
        JsonValue::Object(_) => true,
    }
}

/// Numeric coercion used by loose equality and ordering.
fn to_number(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.trim().parse::<f64>().ok(),
        JsonValue::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

const fn is_container(value: &JsonValue) -> bool {
    matches!(value, JsonValue::Array(_) | JsonValue::Object(_))
}

/// Loose equality (`==`). `null` equals only `null`.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn loose_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Null, JsonValue::Null) => true,
        (JsonValue::Null, _) | (_, JsonValue::Null) => false,
        (JsonValue::String(x), JsonValue::String(y)) => x == y,
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x == y,
        (JsonValue::Array(_), JsonValue::Array(_)) | (JsonValue::Object(_), JsonValue::Object(_)) => {
            strict_eq(a, b)
        }
        _ if is_container(a) || is_container(b) => false,
        _ => matches!((to_number(a), to_number(b)), (Some(x), Some(y)) if x == y),
    }
}

/// Strict equality (`===`): same JSON type and value, numbers by value.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn strict_eq(a: &JsonValue, b: &JsonValue) -> bool {
    match (a, b) {
        (JsonValue::Number(x), JsonValue::Number(y)) => x.as_f64() == y.as_f64(),
        (JsonValue::Array(x), JsonValue::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(p, q)| strict_eq(p, q))
        }
        (JsonValue::Object(x), JsonValue::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|w| strict_eq(v, w)))
        }
        _ => a == b,
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Ordering comparison. `null` on either side is false; containers are errors.
fn compare(op: CompareOp, a: &JsonValue, b: &JsonValue) -> Result<bool> {
    if a.is_null() || b.is_null() {
        return Ok(false);
    }
    if let Some(bad) = [a, b].into_iter().find(|v| is_container(v)) {
        return Err(Error::filter_evaluation(format!(
            "cannot compare {} with '{}'",
            type_name(bad),
            op.symbol()
        )));
    }

    let ordering = match (a, b) {
        (JsonValue::String(x), JsonValue::String(y)) => Some(x.cmp(y)),
        _ => match (to_number(a), to_number(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    };

    Ok(ordering.is_some_and(|ord| match op {
        CompareOp::Lt => ord == Ordering::Less,
        CompareOp::Le => ord != Ordering::Greater,
        CompareOp::Gt => ord == Ordering::Greater,
        CompareOp::Ge => ord != Ordering::Less,
        CompareOp::Eq | CompareOp::StrictEq => ord == Ordering::Equal,
        CompareOp::Ne | CompareOp::StrictNe => ord != Ordering::Equal,
    }))
}

/// `in`: array membership or substring search.
fn contains(needle: &JsonValue, haystack: &JsonValue) -> Result<bool> {
    match (needle, haystack) {
        (JsonValue::Null, _) | (_, JsonValue::Null) => Ok(false),
        (_, JsonValue::Array(items)) => Ok(items.iter().any(|item| strict_eq(item, needle))),
        (JsonValue::String(n), JsonValue::String(h)) => Ok(h.contains(n.as_str())),
        (other, JsonValue::String(_)) => Err(Error::filter_evaluation(format!(
            "'in' on a string needs a string needle, found {}",
            type_name(other)
        ))),
        (_, other) => Err(Error::filter_evaluation(format!(
            "'in' needs an array or string haystack, found {}",
            type_name(other)
        ))),
    }
}
